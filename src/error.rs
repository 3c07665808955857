use std::{fmt, io, sync::Arc};

use crate::file::PageError;

pub type Result<T> = std::result::Result<T, BloomError>;

/// Failures reading a bloom block.
///
/// Cloneable so a block can cache its metadata load result and hand the same error to
/// every cursor.
#[derive(thiserror::Error, Debug, Clone)]
pub enum BloomError {
    #[error("failed to load block headers: {reason}")]
    HeaderLoad {
        reason: String,
        #[source]
        source: Option<Arc<io::Error>>,
    },

    #[error("failed to acquire block stream")]
    StreamAcquisition(#[source] Arc<io::Error>),

    #[error("failed to read page {page}")]
    PageRead {
        page: usize,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to decode page {page} at byte offset {offset}")]
    PageDecode {
        page: usize,
        offset: usize,
        #[source]
        source: PageError,
    },

    #[error("page {page} is {size} bytes, larger than the {max} byte limit")]
    PageTooLarge { page: usize, size: usize, max: usize },

    #[error("page {page} out of range, block has {count} pages")]
    PageOutOfRange { page: usize, count: usize },

    #[error("no record at the cursor position")]
    NotPositioned,
}

impl BloomError {
    pub(crate) fn header(reason: impl Into<String>) -> Self {
        Self::HeaderLoad {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn header_io(reason: impl Into<String>, err: io::Error) -> Self {
        Self::HeaderLoad {
            reason: reason.into(),
            source: Some(Arc::new(err)),
        }
    }

    /// Only an oversized page can be recovered from, by seeking elsewhere.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::PageTooLarge { .. })
    }
}

/// Which channel of a cursor reported an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// Recorded by the cursor while loading metadata or acquiring pages.
    Cursor,
    /// Raised while decoding the held page.
    Page,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cursor => f.write_str("cursor"),
            Self::Page => f.write_str("page"),
        }
    }
}

/// The single error a cursor reports, tagged with where it came from.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{origin} error: {error}")]
pub struct IterError {
    pub origin: ErrorOrigin,
    #[source]
    pub error: BloomError,
}

impl IterError {
    pub fn new(origin: ErrorOrigin, error: BloomError) -> Self {
        Self { origin, error }
    }

    pub fn is_page_too_large(&self) -> bool {
        self.error.is_recoverable()
    }
}
