use crate::{
    config::Config,
    data::book::{isbn_from_listing, Book},
    error::{Result, ShelfError},
    index::{new_index, Index},
};

/// 图书目录，所有记录在进入索引前都经过校验
pub struct Shelf {
    pub(crate) config: Config,
    pub(crate) index: Box<dyn Index<Book>>,
}

impl Shelf {
    /// 根据配置信息创建一个空的 Shelf
    pub fn open(config: Config) -> Result<Self> {
        config.check()?;
        let index = new_index(config.index_type, config.min_degree);
        tracing::debug!(
            index = %config.index_type,
            min_degree = config.min_degree,
            "shelf opened"
        );
        Ok(Self { config, index })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 添加图书，ISBN 已存在时返回错误
    pub fn add(&mut self, book: Book) -> Result<()> {
        if let Err(e) = book.validate() {
            tracing::warn!(isbn = %book.isbn, "rejected book: {}", e);
            return Err(e);
        }
        if self.index.search(&book.isbn).is_some() {
            return Err(ShelfError::DuplicateIsbn(book.isbn));
        }

        tracing::debug!(isbn = %book.isbn, "add book");
        self.index.insert(book);
        Ok(())
    }

    /// 批量添加，重复的 ISBN 会被跳过，返回实际添加的数量
    ///
    /// 任意一本校验失败时整批都不会写入
    pub fn load<I: IntoIterator<Item = Book>>(&mut self, books: I) -> Result<usize> {
        let books: Vec<Book> = books.into_iter().collect();
        for book in &books {
            book.validate()?;
        }

        let before = self.index.len();
        for book in books {
            self.index.insert(book);
        }
        let added = self.index.len() - before;
        tracing::info!(added, total = self.index.len(), "books loaded");
        Ok(added)
    }

    /// 根据 ISBN 查找图书
    pub fn find(&self, isbn: &str) -> Result<&Book> {
        let isbn = isbn.trim();
        self.index
            .search(isbn)
            .ok_or_else(|| ShelfError::KeyNotFound(isbn.to_string()))
    }

    /// 根据 ISBN 删除图书
    pub fn remove(&mut self, isbn: &str) -> Result<()> {
        let isbn = isbn.trim();
        if !self.index.delete(isbn) {
            return Err(ShelfError::KeyNotFound(isbn.to_string()));
        }
        tracing::debug!(isbn, "remove book");
        Ok(())
    }

    /// 删除列表中某一行展示的图书
    pub fn remove_listed(&mut self, line: &str) -> Result<()> {
        let Some(isbn) = isbn_from_listing(line) else {
            return Err(ShelfError::KeyNotFound(line.to_string()));
        };
        self.remove(isbn)
    }

    /// 以同一 ISBN 的新记录替换旧记录
    pub fn update(&mut self, book: Book) -> Result<()> {
        book.validate()?;
        if self.index.search(&book.isbn).is_none() {
            return Err(ShelfError::KeyNotFound(book.isbn));
        }

        let isbn = book.isbn.clone();
        tracing::debug!(isbn = %isbn, "update book");
        self.index.update(&isbn, book);
        Ok(())
    }

    /// 按 ISBN 升序列出全部图书
    pub fn list(&self) -> Vec<&Book> {
        self.index.traverse()
    }

    /// 每本书一行的展示文本
    pub fn listing(&self) -> Vec<String> {
        self.list().into_iter().map(Book::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
