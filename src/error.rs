use prost::{DecodeError, EncodeError};
use std::{io, string::FromUtf8Error};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid varint: {0}")]
    DecodeError(#[from] DecodeError),

    #[error("invalid varint: {0}")]
    EncodeError(#[from] EncodeError),

    #[error("invalid utf-8 field: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("invalid crc")]
    InvalidCrc,

    #[error("read EOF")]
    ReadEOF,

    #[error("invalid file path")]
    InvalidPath,

    #[error("no book with isbn {0}")]
    KeyNotFound(String),

    #[error("a book with isbn {0} already exists")]
    DuplicateIsbn(String),

    #[error("invalid isbn: {0:?}")]
    InvalidIsbn(String),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("invalid publication year: {0}")]
    InvalidYear(u16),

    #[error("minimum degree must be at least 2, got {0}")]
    InvalidDegree(usize),

    #[error("unknown index type: {0}")]
    UnknownIndexType(String),
}

/// Result type for tinyshelf.
pub type Result<T> = std::result::Result<T, ShelfError>;
