//! 对各索引实现的批量插入、查找与删除计时

use std::{
    fmt,
    time::{Duration, Instant},
};

use crate::{
    data::book::Book,
    index::{new_index, Index, IndexType},
};

#[derive(Clone, Debug)]
pub struct BenchReport {
    pub index_type: IndexType,
    pub books: usize,
    pub insert: Duration,
    pub search: Duration,
    pub delete: Duration,
    /// 查找阶段命中的数量
    pub found: usize,
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<6} insert: {:.4}s, search: {:.4}s, delete: {:.4}s, found: {}/{}",
            self.index_type.to_string(),
            self.insert.as_secs_f64(),
            self.search.as_secs_f64(),
            self.delete.as_secs_f64(),
            self.found,
            self.books
        )
    }
}

fn fill(index_type: IndexType, min_degree: usize, books: &[Book]) -> Box<dyn Index<Book>> {
    let mut index = new_index(index_type, min_degree);
    for book in books {
        index.insert(book.clone());
    }
    index
}

/// 插入全部记录后逐条查找，再在一个新建的索引上逐条删除
pub fn run(index_type: IndexType, min_degree: usize, books: &[Book]) -> BenchReport {
    // 记录的拷贝不计入耗时
    let owned = books.to_vec();
    let mut index = new_index(index_type, min_degree);
    let start = Instant::now();
    for book in owned {
        index.insert(book);
    }
    let insert = start.elapsed();

    let start = Instant::now();
    let found = books
        .iter()
        .filter(|book| index.search(&book.isbn).is_some())
        .count();
    let search = start.elapsed();

    let mut index = fill(index_type, min_degree, books);
    let start = Instant::now();
    for book in books {
        index.delete(&book.isbn);
    }
    let delete = start.elapsed();
    assert!(index.is_empty(), "{index_type} kept records after deleting all of them");

    let report = BenchReport {
        index_type,
        books: books.len(),
        insert,
        search,
        delete,
        found,
    };
    tracing::info!("{}", report);
    report
}
