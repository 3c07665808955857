//! Paged bloom blocks and the cursors that read them.
//!
//! - [`BloomBlock`]: page metadata, byte streams and page materialization
//! - [`PageCursor`]: positioning and iteration within one buffered page
//! - [`LazyBloomIter`]: seek and scan across pages, with optional buffer pooling
//! - [`BloomQuerier`]: single-shot lookups by [`BloomOffset`]

mod block;
mod decoder;
mod iter;
mod offset;
mod querier;
mod record;
mod writer;

#[doc(inline)]
pub use self::block::{
    BLOCK_MAGIC, BlockMetrics, BloomBlock, FileBlock, MetricsSnapshot, PageHeader,
};
#[doc(inline)]
pub use self::decoder::{BloomPageDecoder, PageCursor};
#[doc(inline)]
pub use self::iter::{DEFAULT_MAX_PAGE_SIZE, IterOptions, LazyBloomIter};
#[doc(inline)]
pub use self::offset::BloomOffset;
#[doc(inline)]
pub use self::querier::{BloomBlockQuerier, BloomQuerier};
#[doc(inline)]
pub use self::record::Bloom;
#[doc(inline)]
pub use self::writer::BlockWriter;
