use std::{fmt, sync::Arc};

use crate::{buffer::pool::PagePool, file::Page};

/// A page buffer checked out of a [`PagePool`].
///
/// The handle is move-only. [`PooledPage::release`] consumes it, so a buffer goes back to
/// its pool at most once and cannot be read afterwards. Dropping the handle frees the
/// buffer without returning it.
pub struct PooledPage {
    page: Page,
    pool: Arc<dyn PagePool>,
}

impl PooledPage {
    pub fn acquire(pool: Arc<dyn PagePool>, size: usize) -> Self {
        let page = pool.get(size);
        Self { page, pool }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    /// Returns the buffer to the pool it came from.
    pub fn release(self) {
        let Self { page, pool } = self;
        pool.put(page);
    }
}

impl fmt::Debug for PooledPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledPage")
            .field("len", &self.page.len())
            .finish_non_exhaustive()
    }
}
