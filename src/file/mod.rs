//! File access and page-based byte layout.
//!
//! This module provides the storage primitives the bloom layer reads through:
//! - Pages with big-endian integers and length-prefixed records
//! - Block files opened once and read through cloned, positioned streams

mod manager;
mod page;

#[doc(inline)]
pub use self::manager::BlockFile;
#[doc(inline)]
pub use self::page::{Page, PageError, PageResult};
