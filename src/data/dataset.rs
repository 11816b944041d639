use std::{fmt, fs, path::Path};

use bytes::{Buf, BytesMut};

use super::book::{Book, BookHeader};
use crate::{
    error::{Result, ShelfError},
    fio::{self, new_file_io},
};

const DATASET_SUFFIX: &str = "shelf";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DatasetKind {
    /// 按生成顺序保存
    Random,
    /// 按 ISBN 升序保存，用于触发顺序插入的最坏形态
    Ordered,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Ordered => f.write_str("ordered"),
        }
    }
}

/// 例如 `random_books_5000.shelf`
pub fn file_name(kind: DatasetKind, size: usize) -> String {
    format!("{kind}_books_{size}.{DATASET_SUFFIX}")
}

/// 数据集文件：依次存放编码后的图书记录
struct DatasetFile {
    fio: Box<dyn fio::FileIO>,
}

impl DatasetFile {
    fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            fio: Box::new(new_file_io(path)?),
        })
    }

    /// 读取 `offset` 处的记录并校验 crc，返回记录及其编码长度
    fn read_book(&self, offset: u64, size: u64) -> Result<(Book, usize)> {
        let mut header_buf = BytesMut::zeroed(BookHeader::MAX_LEN);
        let n = self.fio.read(&mut header_buf, offset)?;
        if n == 0 {
            return Err(ShelfError::ReadEOF);
        }
        let header = BookHeader::decode(&header_buf[..n])?;
        let header_len = header.header_len();
        // header 声明的长度超出文件剩余部分时不再分配缓冲区
        if header.encoded_len() as u64 > size - offset {
            return Err(ShelfError::ReadEOF);
        }

        // 读取 fields 与末尾 4 字节 crc
        let mut body_buf = BytesMut::zeroed(header.body_len() + 4);
        let n = self.fio.read(&mut body_buf, offset + header_len as u64)?;
        if n < body_buf.len() {
            return Err(ShelfError::ReadEOF);
        }

        let book = Book::decode_body(&header, &body_buf[..header.body_len()])?;
        body_buf.advance(header.body_len());
        let crc = body_buf.get_u32();

        if book.checksum()? != crc {
            return Err(ShelfError::InvalidCrc);
        }
        Ok((book, header.encoded_len()))
    }
}

/// 将数据集写入 `path`，已存在的同名文件会被覆盖
pub fn save(path: &Path, books: &[Book]) -> Result<()> {
    check_dataset_path(path)?;
    if path.is_file() {
        fs::remove_file(path)?;
    }

    let file = DatasetFile::open(path)?;
    let mut written = 0;
    for book in books {
        written += file.fio.write(&book.encode()?)?;
    }
    file.fio.sync()?;

    tracing::info!(path = %path.display(), books = books.len(), bytes = written, "dataset saved");
    Ok(())
}

/// 读取 `path` 中的全部记录
pub fn load(path: &Path) -> Result<Vec<Book>> {
    check_dataset_path(path)?;
    if !path.is_file() {
        return Err(ShelfError::InvalidPath);
    }

    let file = DatasetFile::open(path)?;
    let size = file.fio.size()?;
    let mut books = Vec::new();
    let mut offset = 0;
    while offset < size {
        let (book, len) = file.read_book(offset, size)?;
        books.push(book);
        offset += len as u64;
    }

    tracing::info!(path = %path.display(), books = books.len(), "dataset loaded");
    Ok(books)
}

#[inline]
fn check_dataset_path(path: &Path) -> Result<()> {
    if path.extension() != Some(DATASET_SUFFIX.as_ref()) {
        return Err(ShelfError::InvalidPath);
    }
    Ok(())
}
