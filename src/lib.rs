//! Paged reads of bloom filter blocks.
//!
//! A block is a sequence of independently decodable pages. [`bloom::LazyBloomIter`] reads
//! it either by jumping to a known [`bloom::BloomOffset`] or by scanning every bloom in
//! order, loading block metadata on first use and optionally recycling page buffers
//! through a [`buffer::PagePool`].

pub mod bloom;
pub mod buffer;
pub mod error;
pub mod file;

pub use error::{BloomError, ErrorOrigin, IterError, Result};
