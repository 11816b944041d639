mod avl;
mod btree;

use std::{fmt, str::FromStr};

pub use avl::BalancedIndex;
pub use btree::OrderedIndex;

use crate::error::{Result, ShelfError};

/// 索引对记录的唯一要求：以单个标识字段给出全序
pub trait Keyed {
    type Key: Ord + ?Sized;

    fn key(&self) -> &Self::Key;
}

/// 有序索引的公共接口，调用方在构造时选定实现后统一使用
pub trait Index<R: Keyed> {
    /// 插入记录，已存在相同 key 时保留旧记录
    fn insert(&mut self, record: R);

    fn search(&self, key: &R::Key) -> Option<&R>;

    /// 删除 key 对应的记录，返回该 key 是否存在
    fn delete(&mut self, key: &R::Key) -> bool;

    /// 先按旧 key 删除，再插入新记录，返回旧 key 是否存在
    ///
    /// key 未变化时同样会经历一次完整的删除与插入，结果正确但有额外的结构调整
    fn update(&mut self, old_key: &R::Key, record: R) -> bool {
        let found = self.delete(old_key);
        self.insert(record);
        found
    }

    /// 按 key 升序返回全部记录
    fn traverse(&self) -> Vec<&R>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexType {
    BTree,
    Avl,
}

impl IndexType {
    pub const ALL: [IndexType; 2] = [IndexType::BTree, IndexType::Avl];
}

impl FromStr for IndexType {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "btree" | "b-tree" => Ok(Self::BTree),
            "avl" | "balanced" => Ok(Self::Avl),
            _ => Err(ShelfError::UnknownIndexType(s.to_string())),
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BTree => f.write_str("btree"),
            Self::Avl => f.write_str("avl"),
        }
    }
}

/// 根据索引类型创建索引，`min_degree` 仅对 B 树生效
pub fn new_index<R>(index_type: IndexType, min_degree: usize) -> Box<dyn Index<R>>
where
    R: Keyed + 'static,
{
    match index_type {
        IndexType::BTree => Box::new(OrderedIndex::new(min_degree)),
        IndexType::Avl => Box::new(BalancedIndex::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Entry(u32, &'static str);

    impl Keyed for Entry {
        type Key = u32;

        fn key(&self) -> &u32 {
            &self.0
        }
    }

    #[test]
    fn parse_index_type() {
        assert_eq!("btree".parse::<IndexType>().unwrap(), IndexType::BTree);
        assert_eq!("AVL".parse::<IndexType>().unwrap(), IndexType::Avl);
        assert_eq!("balanced".parse::<IndexType>().unwrap(), IndexType::Avl);
        assert!(matches!(
            "ordinary".parse::<IndexType>(),
            Err(ShelfError::UnknownIndexType(_))
        ));
    }

    #[test]
    fn every_index_type_honours_the_contract() {
        for index_type in IndexType::ALL {
            let mut index = new_index::<Entry>(index_type, 2);
            assert!(index.is_empty());

            for id in [10, 20, 5, 6, 12, 30, 7, 17] {
                index.insert(Entry(id, "first"));
            }
            index.insert(Entry(12, "second"));
            assert_eq!(index.len(), 8);
            assert_eq!(index.search(&12).map(|e| e.1), Some("first"));

            assert!(index.update(&12, Entry(12, "third")));
            assert_eq!(index.search(&12).map(|e| e.1), Some("third"));

            assert!(index.delete(&6));
            assert!(!index.delete(&6));
            assert_eq!(index.search(&6).map(|e| e.0), None);

            let ids: Vec<u32> = index.traverse().iter().map(|e| e.0).collect();
            assert_eq!(ids, vec![5, 7, 10, 12, 17, 20, 30], "{index_type}");
        }
    }

    #[test]
    fn update_of_missing_key_still_inserts() {
        for index_type in IndexType::ALL {
            let mut index = new_index::<Entry>(index_type, 3);
            index.insert(Entry(1, "a"));
            assert!(!index.update(&2, Entry(3, "c")));
            let ids: Vec<u32> = index.traverse().iter().map(|e| e.0).collect();
            assert_eq!(ids, vec![1, 3]);
        }
    }
}
