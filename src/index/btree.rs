use std::mem;

use super::{Index, Keyed};

/// B 树节点，非根节点的记录数始终位于 `[t-1, 2t-1]`
#[derive(Debug)]
pub(crate) struct Node<R> {
    pub(crate) records: Vec<R>,
    /// 内部节点的子节点数总是 `records.len() + 1`
    pub(crate) children: Vec<Box<Node<R>>>,
    pub(crate) leaf: bool,
}

impl<R: Keyed> Node<R> {
    fn new(leaf: bool) -> Self {
        Self {
            records: Vec::new(),
            children: Vec::new(),
            leaf,
        }
    }

    /// 第一个 key >= `key` 的位置，以及该位置是否恰好相等
    fn lower_bound(&self, key: &R::Key) -> (usize, bool) {
        match self.records.binary_search_by(|r| r.key().cmp(key)) {
            Ok(idx) => (idx, true),
            Err(idx) => (idx, false),
        }
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a R>) {
        if self.leaf {
            out.extend(self.records.iter());
            return;
        }
        for (child, record) in self.children.iter().zip(&self.records) {
            child.collect(out);
            out.push(record);
        }
        // 最右侧子树
        if let Some(last) = self.children.last() {
            last.collect(out);
        }
    }
}

/// 最小度数为 `t` 的 B 树索引
#[derive(Debug)]
pub struct OrderedIndex<R> {
    pub(crate) t: usize,
    pub(crate) root: Box<Node<R>>,
    len: usize,
}

impl<R: Keyed> OrderedIndex<R> {
    /// 创建空的 B 树，`t` 必须不小于 2
    pub fn new(t: usize) -> Self {
        assert!(t >= 2, "B-tree minimum degree t must be >= 2, got {t}");
        Self {
            t,
            root: Box::new(Node::new(true)),
            len: 0,
        }
    }

    pub fn min_degree(&self) -> usize {
        self.t
    }

    /// 树高，只有根节点时为 1
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while !node.leaf {
            node = &node.children[0];
            height += 1;
        }
        height
    }

    fn max_records(&self) -> usize {
        2 * self.t - 1
    }

    /// 在非满节点中插入记录，返回是否真正插入
    fn insert_non_full(node: &mut Node<R>, t: usize, record: R) -> bool {
        let (mut idx, found) = node.lower_bound(record.key());
        if found {
            // 标识重复，保留已有记录
            return false;
        }

        if node.leaf {
            node.records.insert(idx, record);
            return true;
        }

        if node.children[idx].records.len() == 2 * t - 1 {
            Self::split_child(node, t, idx);
            match record.key().cmp(node.records[idx].key()) {
                std::cmp::Ordering::Greater => idx += 1,
                std::cmp::Ordering::Equal => return false,
                std::cmp::Ordering::Less => {}
            }
        }
        Self::insert_non_full(&mut node.children[idx], t, record)
    }

    /// 分裂 `parent.children[i]`，其中位记录上移到 `parent.records[i]`
    fn split_child(parent: &mut Node<R>, t: usize, i: usize) {
        let full = &mut parent.children[i];
        assert_eq!(full.records.len(), 2 * t - 1, "split of a non-full child");

        let mut right = Box::new(Node::new(full.leaf));
        right.records = full.records.split_off(t);
        let Some(median) = full.records.pop() else {
            unreachable!("full child has a median record");
        };
        if !full.leaf {
            right.children = full.children.split_off(t);
        }

        parent.records.insert(i, median);
        parent.children.insert(i + 1, right);
    }

    /// 从以 `node` 为根的子树中删除 `key`，调用前需保证该 key 存在
    ///
    /// 下降前保证即将进入的子节点至少有 `t` 条记录
    fn delete_internal(node: &mut Node<R>, t: usize, key: &R::Key) -> Option<R> {
        let (idx, found) = node.lower_bound(key);

        if found {
            if node.leaf {
                return Some(node.records.remove(idx));
            }
            if node.children[idx].records.len() >= t {
                // 用前驱替换
                let pred = Self::pop_max(&mut node.children[idx], t);
                return Some(mem::replace(&mut node.records[idx], pred));
            }
            if node.children[idx + 1].records.len() >= t {
                // 用后继替换
                let succ = Self::pop_min(&mut node.children[idx + 1], t);
                return Some(mem::replace(&mut node.records[idx], succ));
            }
            Self::merge_children(node, idx);
            return Self::delete_internal(&mut node.children[idx], t, key);
        }

        if node.leaf {
            return None;
        }

        Self::fill(node, t, idx);
        // 与最后一个子节点合并后，目标子节点的下标会左移一位
        let next = idx.min(node.records.len());
        Self::delete_internal(&mut node.children[next], t, key)
    }

    /// 删除并返回子树中的最大记录，即前驱
    fn pop_max(node: &mut Node<R>, t: usize) -> R {
        if node.leaf {
            let Some(record) = node.records.pop() else {
                unreachable!("non-root B-tree node has at least t-1 records");
            };
            return record;
        }
        let last = node.records.len();
        Self::fill(node, t, last);
        let last = node.records.len();
        Self::pop_max(&mut node.children[last], t)
    }

    /// 删除并返回子树中的最小记录，即后继
    fn pop_min(node: &mut Node<R>, t: usize) -> R {
        if node.leaf {
            return node.records.remove(0);
        }
        Self::fill(node, t, 0);
        Self::pop_min(&mut node.children[0], t)
    }

    /// 保证 `node.children[idx]` 至少有 `t` 条记录
    fn fill(node: &mut Node<R>, t: usize, idx: usize) {
        if node.children[idx].records.len() >= t {
            return;
        }

        if idx > 0 && node.children[idx - 1].records.len() >= t {
            Self::borrow_from_prev(node, idx);
        } else if idx + 1 < node.children.len() && node.children[idx + 1].records.len() >= t {
            Self::borrow_from_next(node, idx);
        } else if idx + 1 < node.children.len() {
            Self::merge_children(node, idx);
        } else {
            Self::merge_children(node, idx - 1);
        }
    }

    /// 经由父节点从左兄弟借一条记录
    fn borrow_from_prev(node: &mut Node<R>, idx: usize) {
        let (left_slice, right_slice) = node.children.split_at_mut(idx);
        let left = &mut left_slice[idx - 1];
        let child = &mut right_slice[0];

        let Some(moved_up) = left.records.pop() else {
            unreachable!("left sibling has at least t records");
        };
        let moved_down = mem::replace(&mut node.records[idx - 1], moved_up);
        child.records.insert(0, moved_down);

        if !left.leaf {
            let Some(moved) = left.children.pop() else {
                unreachable!("internal sibling has children");
            };
            child.children.insert(0, moved);
        }
    }

    /// 经由父节点从右兄弟借一条记录
    fn borrow_from_next(node: &mut Node<R>, idx: usize) {
        let (left_slice, right_slice) = node.children.split_at_mut(idx + 1);
        let child = &mut left_slice[idx];
        let right = &mut right_slice[0];

        let moved_up = right.records.remove(0);
        let moved_down = mem::replace(&mut node.records[idx], moved_up);
        child.records.push(moved_down);

        if !right.leaf {
            child.children.push(right.children.remove(0));
        }
    }

    /// 将 `children[idx]`、分隔记录与 `children[idx + 1]` 合并到 `children[idx]`
    fn merge_children(node: &mut Node<R>, idx: usize) {
        let mut right = node.children.remove(idx + 1);
        let separator = node.records.remove(idx);
        let left = &mut node.children[idx];

        left.records.push(separator);
        left.records.append(&mut right.records);
        if !left.leaf {
            left.children.append(&mut right.children);
        }
    }
}

impl<R: Keyed> Index<R> for OrderedIndex<R> {
    fn insert(&mut self, record: R) {
        let t = self.t;

        if self.root.records.len() == self.max_records() {
            if self.search(record.key()).is_some() {
                return;
            }
            // 根节点已满，先分裂，树高加一
            let old_root = mem::replace(&mut self.root, Box::new(Node::new(false)));
            self.root.children.push(old_root);
            Self::split_child(&mut self.root, t, 0);
            tracing::trace!(height = self.height(), "btree root split");
        }

        if Self::insert_non_full(&mut self.root, t, record) {
            self.len += 1;
        }
    }

    fn search(&self, key: &R::Key) -> Option<&R> {
        let mut node = &self.root;
        loop {
            let (idx, found) = node.lower_bound(key);
            if found {
                return Some(&node.records[idx]);
            }
            if node.leaf {
                return None;
            }
            node = &node.children[idx];
        }
    }

    fn delete(&mut self, key: &R::Key) -> bool {
        // key 不存在时不做任何结构调整
        if self.search(key).is_none() {
            return false;
        }

        let removed = Self::delete_internal(&mut self.root, self.t, key);
        assert!(removed.is_some(), "present key vanished during delete");
        self.len -= 1;

        if !self.root.leaf && self.root.records.is_empty() {
            // 根节点为空，唯一的子节点成为新根，树高减一
            self.root = self.root.children.remove(0);
            tracing::trace!(height = self.height(), "btree root collapsed");
        }
        true
    }

    fn traverse(&self) -> Vec<&R> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect(&mut out);
        out
    }

    fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Entry(u32, &'static str);

    impl Keyed for Entry {
        type Key = u32;

        fn key(&self) -> &u32 {
            &self.0
        }
    }

    fn keys(index: &OrderedIndex<Entry>) -> Vec<u32> {
        index.traverse().iter().map(|e| e.0).collect()
    }

    /// 校验记录数范围、节点内有序、子树 key 范围与叶子深度一致
    fn check_node(
        node: &Node<Entry>,
        t: usize,
        is_root: bool,
        depth: usize,
        bounds: (Option<u32>, Option<u32>),
        leaf_depth: &mut Option<usize>,
    ) {
        let n = node.records.len();
        if !is_root {
            assert!(n >= t - 1, "underfull node with {n} records");
        }
        assert!(n <= 2 * t - 1, "overfull node with {n} records");
        assert!(node.records.windows(2).all(|w| w[0].0 < w[1].0));
        if let Some(lo) = bounds.0 {
            assert!(node.records.iter().all(|e| e.0 > lo));
        }
        if let Some(hi) = bounds.1 {
            assert!(node.records.iter().all(|e| e.0 < hi));
        }

        if node.leaf {
            assert!(node.children.is_empty());
            match leaf_depth {
                Some(d) => assert_eq!(*d, depth, "leaves at different depths"),
                None => *leaf_depth = Some(depth),
            }
            return;
        }

        assert_eq!(node.children.len(), n + 1);
        for (i, child) in node.children.iter().enumerate() {
            let lo = if i == 0 { bounds.0 } else { Some(node.records[i - 1].0) };
            let hi = if i == n { bounds.1 } else { Some(node.records[i].0) };
            check_node(child, t, false, depth + 1, (lo, hi), leaf_depth);
        }
    }

    fn check_invariants(index: &OrderedIndex<Entry>) {
        let mut leaf_depth = None;
        check_node(&index.root, index.t, true, 1, (None, None), &mut leaf_depth);
        assert_eq!(leaf_depth, Some(index.height()));
        assert_eq!(index.traverse().len(), index.len());
    }

    #[test]
    fn new_index_is_an_empty_leaf() {
        let index = OrderedIndex::<Entry>::new(2);
        assert!(index.root.leaf);
        assert!(index.root.records.is_empty());
        assert_eq!(index.height(), 1);
        assert!(index.traverse().is_empty());
    }

    #[test]
    #[should_panic(expected = "minimum degree")]
    fn degree_below_two_panics() {
        let _ = OrderedIndex::<Entry>::new(1);
    }

    #[test]
    fn insert_and_delete_scenario() {
        let mut index = OrderedIndex::new(2);
        for id in [10, 20, 5, 6, 12, 30, 7, 17] {
            index.insert(Entry(id, ""));
            check_invariants(&index);
        }
        assert_eq!(keys(&index), vec![5, 6, 7, 10, 12, 17, 20, 30]);

        assert!(index.delete(&6));
        check_invariants(&index);
        assert_eq!(keys(&index), vec![5, 7, 10, 12, 17, 20, 30]);
    }

    #[test]
    fn root_split_grows_height() {
        let mut index = OrderedIndex::new(2);
        for id in [1, 2, 3] {
            index.insert(Entry(id, ""));
        }
        assert_eq!(index.height(), 1);

        index.insert(Entry(4, ""));
        assert_eq!(index.height(), 2);
        assert_eq!(index.root.records.len(), 1);
        assert_eq!(index.root.records[0].0, 2);
        check_invariants(&index);
    }

    #[test]
    fn search_hits_and_misses() {
        let mut index = OrderedIndex::new(3);
        for id in (0..100).map(|i| i * 2) {
            index.insert(Entry(id, "even"));
        }
        for id in 0..200 {
            let hit = index.search(&id);
            if id % 2 == 0 {
                assert_eq!(hit, Some(&Entry(id, "even")));
            } else {
                assert_eq!(hit, None);
            }
        }
    }

    #[test]
    fn duplicate_insert_keeps_first_record() {
        let mut index = OrderedIndex::new(2);
        for id in 0..20 {
            index.insert(Entry(id, "first"));
        }
        for id in 0..20 {
            index.insert(Entry(id, "second"));
            check_invariants(&index);
        }
        assert_eq!(index.len(), 20);
        assert!(index.traverse().iter().all(|e| e.1 == "first"));
    }

    #[test]
    fn delete_from_internal_node_uses_predecessor_and_successor() {
        let mut index = OrderedIndex::new(2);
        for id in 1..=30 {
            index.insert(Entry(id, ""));
        }
        let separators: Vec<u32> = index.root.records.iter().map(|e| e.0).collect();
        for id in separators {
            assert!(index.delete(&id));
            assert!(index.search(&id).is_none());
            check_invariants(&index);
        }
    }

    #[test]
    fn repeated_delete_leaves_tree_untouched() {
        let mut index = OrderedIndex::new(2);
        for id in 1..=12 {
            index.insert(Entry(id, ""));
        }
        assert!(index.delete(&5));
        let before = format!("{:?}", index.root);

        assert!(!index.delete(&5));
        assert!(!index.delete(&99));
        assert_eq!(format!("{:?}", index.root), before);
        assert_eq!(index.len(), 11);
    }

    #[test]
    fn deleting_everything_collapses_to_empty_leaf() {
        let mut index = OrderedIndex::new(2);
        for id in 0..64 {
            index.insert(Entry(id, ""));
        }
        assert!(index.height() > 2);
        for id in 0..64 {
            assert!(index.delete(&id));
            check_invariants(&index);
        }
        assert!(index.is_empty());
        assert!(index.root.leaf);
        assert_eq!(index.height(), 1);
    }

    #[test]
    fn randomized_workload_preserves_invariants() {
        let mut rng = StdRng::seed_from_u64(42);
        for t in 2..=5 {
            let mut ids: Vec<u32> = (0..500).collect();
            ids.shuffle(&mut rng);

            let mut index = OrderedIndex::new(t);
            for &id in &ids {
                index.insert(Entry(id, ""));
            }
            check_invariants(&index);
            assert_eq!(keys(&index), (0..500).collect::<Vec<_>>());

            ids.shuffle(&mut rng);
            let (gone, kept) = ids.split_at(250);
            for &id in gone {
                assert!(index.delete(&id));
            }
            check_invariants(&index);

            for &id in gone {
                assert!(index.search(&id).is_none());
            }
            for &id in kept {
                assert_eq!(index.search(&id).map(|e| e.0), Some(id));
            }

            let mut expected = kept.to_vec();
            expected.sort_unstable();
            assert_eq!(keys(&index), expected);
        }
    }
}
