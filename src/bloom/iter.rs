use std::mem;

use log::{debug, trace};

use crate::{
    bloom::{block::BloomBlock, decoder::PageCursor, offset::BloomOffset, record::Bloom},
    error::{BloomError, ErrorOrigin, IterError, Result},
};

/// Largest page a cursor decodes unless told otherwise.
pub const DEFAULT_MAX_PAGE_SIZE: usize = 4 << 20;

/// Cursor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterOptions {
    /// Return page buffers to the block's pool when moving off a page.
    ///
    /// Only safe when blooms read from a page never outlive the cursor's stay on it.
    pub use_pool: bool,
    pub max_page_size: usize,
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            use_pool: false,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Cursor status. Every transition is a pure function of the previous status.
#[derive(Debug, Clone)]
enum Status {
    /// Block headers not loaded yet.
    Uninitialized,
    Ready,
    /// A scan ran off the last page.
    Exhausted,
    /// The last page requested was over the size limit; the next seek clears it.
    PageTooLarge(BloomError),
    Failed(IterError),
}

impl Status {
    fn initialized(self, loaded: Result<()>) -> Self {
        match (self, loaded) {
            (Self::Uninitialized, Ok(())) => Self::Ready,
            (Self::Uninitialized, Err(err)) => {
                Self::Failed(IterError::new(ErrorOrigin::Cursor, err))
            }
            (status, _) => status,
        }
    }

    fn begin_seek(self) -> Self {
        match self {
            Self::PageTooLarge(_) | Self::Exhausted => Self::Ready,
            status => status,
        }
    }

    fn exhausted(self) -> Self {
        match self {
            Self::Ready => Self::Exhausted,
            status => status,
        }
    }

    /// The first fatal error sticks; an oversized page only parks the cursor.
    fn record(self, origin: ErrorOrigin, err: BloomError) -> Self {
        match self {
            Self::Failed(_) => self,
            _ if err.is_recoverable() => Self::PageTooLarge(err),
            _ => Self::Failed(IterError::new(origin, err)),
        }
    }

    fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn blocks_next(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::PageTooLarge(_))
    }

    fn error(&self) -> Option<IterError> {
        match self {
            Self::PageTooLarge(err) => Some(IterError::new(ErrorOrigin::Cursor, err.clone())),
            Self::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }
}

/// Lazily reads the blooms of one block, either by seeking to known offsets or by
/// scanning every page in order.
///
/// Headers load on the first `seek` or `next`. At most one page is held at a time;
/// with pooling enabled it goes back to the pool exactly when the cursor moves off it.
/// Failures are recorded and reported through [`LazyBloomIter::err`].
pub struct LazyBloomIter<'a, B: BloomBlock> {
    block: &'a B,
    use_pool: bool,
    max_page_size: usize,

    status: Status,
    cur_page_index: usize,
    cur_page: Option<B::Page>,
}

impl<'a, B: BloomBlock> LazyBloomIter<'a, B> {
    /// With `use_pool`, page buffers are handed back to the pool on page transitions.
    pub fn new(block: &'a B, use_pool: bool, max_page_size: usize) -> Self {
        Self {
            block,
            use_pool,
            max_page_size,
            status: Status::Uninitialized,
            cur_page_index: 0,
            cur_page: None,
        }
    }

    pub fn with_options(block: &'a B, options: IterOptions) -> Self {
        Self::new(block, options.use_pool, options.max_page_size)
    }

    fn transition(&mut self, f: impl FnOnce(Status) -> Status) {
        let status = mem::replace(&mut self.status, Status::Ready);
        self.status = f(status);
    }

    fn record(&mut self, origin: ErrorOrigin, err: BloomError) {
        debug!("Recording {} error: {}", origin, err);
        self.transition(|status| status.record(origin, err));
    }

    fn ensure_init(&mut self) {
        if matches!(self.status, Status::Uninitialized) {
            let loaded = self.block.load_headers();
            self.transition(|status| status.initialized(loaded));
        }
    }

    fn acquire(&self, page: usize) -> Result<B::Page> {
        let stream = self.block.open_stream()?;
        self.block
            .page_cursor(stream, page, self.max_page_size, self.block.metrics())
    }

    fn drop_page(&mut self) {
        if let Some(page) = self.cur_page.take() {
            trace!("Moving off page {}", self.cur_page_index);
            if self.use_pool {
                page.release();
            }
        }
    }

    /// Positions on the bloom at `offset`, reusing the held page when it matches.
    ///
    /// Clears an earlier oversized page error. A byte offset that does not decode makes
    /// the cursor terminal. Any failure is only visible through [`LazyBloomIter::err`].
    pub fn seek(&mut self, offset: BloomOffset) {
        self.ensure_init();
        self.transition(Status::begin_seek);
        if self.status.is_failed() {
            return;
        }

        if self.cur_page.is_none() || self.cur_page_index != offset.page {
            self.drop_page();
            match self.acquire(offset.page) {
                Ok(page) => {
                    self.cur_page_index = offset.page;
                    self.cur_page = Some(page);
                }
                Err(err) => {
                    self.record(ErrorOrigin::Cursor, err);
                    return;
                }
            }
        }

        let page_err = self.cur_page.as_mut().and_then(|page| {
            page.seek(offset.byte_offset);
            page.err().cloned()
        });
        if let Some(err) = page_err {
            self.record(ErrorOrigin::Page, err);
        }
    }

    /// Advances to the next bloom across pages. Returns false at the end of the block
    /// or on failure; [`LazyBloomIter::err`] tells the two apart.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        self.ensure_init();
        if self.status.blocks_next() {
            return false;
        }

        while self.cur_page_index < self.block.page_count() {
            if self.cur_page.is_none() {
                match self.acquire(self.cur_page_index) {
                    Ok(page) => self.cur_page = Some(page),
                    Err(err) => {
                        self.record(ErrorOrigin::Cursor, err);
                        return false;
                    }
                }
            }

            if let Some(page) = self.cur_page.as_mut() {
                if page.advance() {
                    return true;
                }
                if let Some(err) = page.err().cloned() {
                    self.record(ErrorOrigin::Page, err);
                    return false;
                }
            }

            self.drop_page();
            self.cur_page_index += 1;
        }

        self.transition(Status::exhausted);
        false
    }

    /// The bloom the cursor is positioned on, if any.
    pub fn at(&self) -> Option<Bloom<'_>> {
        self.cur_page.as_ref().and_then(PageCursor::at)
    }

    /// The recorded cursor error, else the held page's error.
    pub fn err(&self) -> Option<IterError> {
        self.status.error().or_else(|| {
            self.cur_page
                .as_ref()
                .and_then(PageCursor::err)
                .map(|err| IterError::new(ErrorOrigin::Page, err.clone()))
        })
    }

    /// True once a scan has run off the last page without error.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.status, Status::Exhausted)
    }
}

impl<B: BloomBlock> Drop for LazyBloomIter<'_, B> {
    fn drop(&mut self) {
        self.drop_page();
    }
}
