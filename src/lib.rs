pub mod bench;
mod config;
mod data;
mod error;
mod fio;
pub mod generator;
pub mod index;
mod shelf;

pub use config::Config;
pub use data::{
    book::{is_valid_isbn, isbn_from_listing, Book},
    dataset::{self, DatasetKind},
};
pub use error::{Result, ShelfError};
pub use index::{BalancedIndex, Index, IndexType, Keyed, OrderedIndex};
pub use shelf::Shelf;
