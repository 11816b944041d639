use std::{cmp::Ordering, fmt, sync::OnceLock};

use bytes::{Buf, BufMut};
use prost::{decode_length_delimiter, encode_length_delimiter, length_delimiter_len};
use regex::Regex;

use crate::{
    error::{Result, ShelfError},
    index::Keyed,
};

pub const MIN_YEAR: u16 = 1000;
pub const MAX_YEAR: u16 = 2100;

/// 单个字段编码后的长度上限，超过即视为 header 已损坏
pub(crate) const MAX_FIELD_LEN: usize = u16::MAX as usize;

/// 978-7-123-45678-9 或 9787123456789
fn isbn_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:\d{3}-\d-\d{3}-\d{5}-\d|\d{13})$").expect("static isbn pattern")
    })
}

fn listing_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // 标题可能含有 `ISBN: `，只认标题结束引号之后的第一个
    PATTERN.get_or_init(|| {
        Regex::new(r#"^".*", author: .*?, ISBN: ([^,，\s]+)"#).expect("static listing pattern")
    })
}

/// 图书记录，相等与大小比较只看 ISBN
#[derive(Clone, Debug)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub publisher: String,
    pub year: u16,
}

impl Book {
    pub fn new<S: Into<String>>(title: S, author: S, isbn: S, publisher: S, year: u16) -> Self {
        let trimmed = |s: S| -> String {
            let s: String = s.into();
            s.trim().to_string()
        };
        Self {
            title: trimmed(title),
            author: trimmed(author),
            isbn: trimmed(isbn),
            publisher: trimmed(publisher),
            year,
        }
    }

    /// 校验各字段，未通过校验的记录不会进入索引
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("title", &self.title),
            ("author", &self.author),
            ("publisher", &self.publisher),
        ] {
            if value.trim().is_empty() {
                return Err(ShelfError::EmptyField(name));
            }
        }
        if !is_valid_isbn(&self.isbn) {
            return Err(ShelfError::InvalidIsbn(self.isbn.clone()));
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.year) {
            return Err(ShelfError::InvalidYear(self.year));
        }
        Ok(())
    }

    /// | title size | author size | isbn size | publisher size | year | fields | crc |
    /// | ---------- | ----------- | --------- | -------------- | ---- | ------ | --- |
    /// | 1 ~ 5      | 1 ~ 5       | 1 ~ 5     | 1 ~ 5          | 2    | dyn    | 4   |
    ///
    /// 整数均为大端字节序
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = self.encode_fields()?;
        let crc = crc32fast::hash(&buf);
        buf.put_u32(crc);
        Ok(buf)
    }

    /// 编码后除 crc 以外的部分
    fn encode_fields(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        for field in self.fields() {
            encode_length_delimiter(field.len(), &mut buf)?;
        }
        buf.put_u16(self.year);
        for field in self.fields() {
            buf.extend_from_slice(field.as_bytes());
        }
        Ok(buf)
    }

    /// 重新编码计算出的 crc，用于校验读回的数据
    pub(crate) fn checksum(&self) -> Result<u32> {
        Ok(crc32fast::hash(&self.encode_fields()?))
    }

    /// 由已解析的 header 与 fields 部分还原记录，`body` 不含 crc
    pub(crate) fn decode_body(header: &BookHeader, mut body: &[u8]) -> Result<Self> {
        if body.len() < header.body_len() {
            return Err(ShelfError::ReadEOF);
        }
        let mut take = |len: usize| -> Result<String> {
            let field = body[..len].to_vec();
            body.advance(len);
            Ok(String::from_utf8(field)?)
        };
        Ok(Self {
            title: take(header.field_sizes[0])?,
            author: take(header.field_sizes[1])?,
            isbn: take(header.field_sizes[2])?,
            publisher: take(header.field_sizes[3])?,
            year: header.year,
        })
    }

    /// 记录编码后的实际长度
    pub(crate) fn encoded_len(&self) -> usize {
        self.fields()
            .iter()
            .map(|f| length_delimiter_len(f.len()) + f.len())
            .sum::<usize>()
            + 2
            + 4
    }

    fn fields(&self) -> [&str; 4] {
        [&self.title, &self.author, &self.isbn, &self.publisher]
    }
}

pub(crate) struct BookHeader {
    pub(crate) field_sizes: [usize; 4],
    pub(crate) year: u16,
}

impl BookHeader {
    /// header 可能的最大长度：4 个 varint 加年份
    pub(crate) const MAX_LEN: usize = 4 * 5 + 2;

    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self> {
        let mut field_sizes = [0usize; 4];
        for size in field_sizes.iter_mut() {
            *size = decode_length_delimiter(&mut buf)?;
            if *size > MAX_FIELD_LEN {
                return Err(ShelfError::ReadEOF);
            }
        }
        if buf.remaining() < 2 {
            return Err(ShelfError::ReadEOF);
        }
        let year = buf.get_u16();
        Ok(Self { field_sizes, year })
    }

    pub(crate) fn header_len(&self) -> usize {
        self.field_sizes
            .iter()
            .map(|&s| length_delimiter_len(s))
            .sum::<usize>()
            + 2
    }

    /// `decode` 已限制每个字段的长度，求和不会溢出
    pub(crate) fn body_len(&self) -> usize {
        self.field_sizes.iter().sum()
    }

    /// header、fields 与 crc 的总长度
    pub(crate) fn encoded_len(&self) -> usize {
        self.header_len() + self.body_len() + 4
    }
}

impl Keyed for Book {
    type Key = str;

    fn key(&self) -> &str {
        &self.isbn
    }
}

impl PartialEq for Book {
    fn eq(&self, other: &Self) -> bool {
        self.isbn == other.isbn
    }
}

impl Eq for Book {}

impl PartialOrd for Book {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Book {
    fn cmp(&self, other: &Self) -> Ordering {
        self.isbn.cmp(&other.isbn)
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\", author: {}, ISBN: {}, publisher: {}, year: {}",
            self.title, self.author, self.isbn, self.publisher, self.year
        )
    }
}

pub fn is_valid_isbn(isbn: &str) -> bool {
    isbn_pattern().is_match(isbn.trim())
}

/// 从一行列表展示文本中取出 ISBN
pub fn isbn_from_listing(line: &str) -> Option<&str> {
    listing_pattern()
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Book {
        Book::new(
            "Rust in Action",
            "Tim McNamara",
            "978-7-123-45678-9",
            "Manning",
            2021,
        )
    }

    #[test]
    fn new_trims_fields() {
        let book = Book::new("  Dune ", " Frank Herbert", "9780441172719 ", "Ace", 1965);
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.isbn, "9780441172719");
    }

    #[test]
    fn ordering_only_looks_at_isbn() {
        let a = Book::new("A", "x", "111-1-111-11111-1", "p", 2000);
        let b = Book::new("Z", "y", "111-1-111-11111-1", "q", 1999);
        let c = Book::new("A", "x", "222-1-111-11111-1", "p", 2000);
        assert_eq!(a, b);
        assert!(a < c);
        assert!(c >= b);
        assert_eq!(a.key(), "111-1-111-11111-1");
    }

    #[test]
    fn isbn_formats() {
        assert!(is_valid_isbn("978-7-123-45678-9"));
        assert!(is_valid_isbn("9787123456789"));
        assert!(!is_valid_isbn("978-7-123-4567-89"));
        assert!(!is_valid_isbn("978712345678"));
        assert!(!is_valid_isbn("97871234567890"));
        assert!(!is_valid_isbn("978-7-123-45678-X"));
        assert!(!is_valid_isbn(""));
    }

    #[test]
    fn validate_rejects_bad_fields() {
        assert!(sample().validate().is_ok());

        let mut book = sample();
        book.author = "   ".into();
        assert!(matches!(book.validate(), Err(ShelfError::EmptyField("author"))));

        let mut book = sample();
        book.isbn = "12345".into();
        assert!(matches!(book.validate(), Err(ShelfError::InvalidIsbn(_))));

        let mut book = sample();
        book.year = 999;
        assert!(matches!(book.validate(), Err(ShelfError::InvalidYear(999))));
        book.year = 2101;
        assert!(matches!(book.validate(), Err(ShelfError::InvalidYear(2101))));
    }

    #[test]
    fn listing_line_carries_the_isbn() {
        let line = sample().to_string();
        assert_eq!(
            line,
            "\"Rust in Action\", author: Tim McNamara, ISBN: 978-7-123-45678-9, publisher: Manning, year: 2021"
        );
        assert_eq!(isbn_from_listing(&line), Some("978-7-123-45678-9"));
        assert_eq!(isbn_from_listing("no identifier here"), None);
    }

    #[test]
    fn listing_isbn_ignores_isbn_inside_title() {
        let mut book = sample();
        book.title = "Why ISBN: 000-0-000-00000-0 matters".into();
        let line = book.to_string();
        assert_eq!(isbn_from_listing(&line), Some("978-7-123-45678-9"));

        book.title = "Notes\", author: Nobody, ISBN: 111-1-111-11111-1".into();
        book.author = "Smith, John".into();
        let line = book.to_string();
        assert_eq!(isbn_from_listing(&line), Some("978-7-123-45678-9"));
    }

    #[test]
    fn header_rejects_oversized_fields() {
        let mut buf = Vec::new();
        encode_length_delimiter(MAX_FIELD_LEN + 1, &mut buf).unwrap();
        for _ in 0..3 {
            encode_length_delimiter(1, &mut buf).unwrap();
        }
        buf.put_u16(2000);
        assert!(matches!(BookHeader::decode(&buf), Err(ShelfError::ReadEOF)));
    }

    #[test]
    fn decode_encoded_book() {
        let book = Book::new("数据结构", "李四", "978-7-123-45679-6", "高等教育出版社", 2019);
        let buf = book.encode().unwrap();
        assert_eq!(buf.len(), book.encoded_len());

        let header = BookHeader::decode(&buf).unwrap();
        assert_eq!(header.encoded_len(), buf.len());
        let body_end = header.header_len() + header.body_len();
        let decoded = Book::decode_body(&header, &buf[header.header_len()..body_end]).unwrap();
        assert_eq!(decoded.title, book.title);
        assert_eq!(decoded.publisher, book.publisher);
        assert_eq!(decoded.year, 2019);

        let crc = (&buf[body_end..]).get_u32();
        assert_eq!(decoded.checksum().unwrap(), crc);
    }
}
