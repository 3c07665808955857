use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use log::{trace, warn};

use crate::file::Page;

/// Source of page buffers shared by every block and cursor drawing from it.
///
/// A pool must outlive every page handed out of it; holders keep it alive through an `Arc`.
pub trait PagePool: Send + Sync {
    /// Returns a zeroed page of exactly `size` bytes.
    fn get(&self, size: usize) -> Page;

    /// Takes a page back for reuse.
    fn put(&self, page: Page);
}

/// Bounded free list of page buffers.
pub struct BufferPool {
    free: Mutex<Vec<Page>>,
    max_pooled: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl BufferPool {
    pub fn new(max_pooled: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(max_pooled)),
            max_pooled,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Number of idle buffers waiting for reuse.
    pub fn available(&self) -> usize {
        self.free.lock().map(|free| free.len()).unwrap_or(0)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn take_fitting(&self, size: usize) -> Option<Page> {
        let mut free = match self.free.lock() {
            Ok(free) => free,
            Err(_) => {
                warn!("Buffer pool lock poisoned, allocating a fresh page");
                return None;
            }
        };
        let idx = free.iter().position(|page| page.capacity() >= size)?;
        Some(free.swap_remove(idx))
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(16)
    }
}

impl PagePool for BufferPool {
    fn get(&self, size: usize) -> Page {
        match self.take_fitting(size) {
            Some(mut page) => {
                trace!("Reusing pooled buffer for {} bytes", size);
                self.hits.fetch_add(1, Ordering::Relaxed);
                page.reset(size);
                page
            }
            None => {
                trace!("Allocating buffer for {} bytes", size);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Page::with_size(size)
            }
        }
    }

    fn put(&self, page: Page) {
        let Ok(mut free) = self.free.lock() else {
            warn!("Buffer pool lock poisoned, dropping returned page");
            return;
        };
        if free.len() >= self.max_pooled {
            trace!("Buffer pool full, dropping {} byte page", page.capacity());
            return;
        }
        free.push(page);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn get_allocates_when_empty() {
        let pool = BufferPool::new(2);
        let page = pool.get(8);
        assert_eq!(page.len(), 8);
        assert_eq!(pool.misses(), 1);
        assert_eq!(pool.hits(), 0);
    }

    #[test]
    fn returned_page_is_reused_and_zeroed() {
        let pool = BufferPool::new(2);
        let mut page = pool.get(8);
        page.content_mut().fill(0xAB);
        pool.put(page);
        assert_eq!(pool.available(), 1);

        let page = pool.get(4);
        assert_eq!(page.len(), 4);
        assert!(page.content().iter().all(|&b| b == 0));
        assert_eq!(pool.hits(), 1);
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn too_small_buffers_are_skipped() {
        let pool = BufferPool::new(2);
        pool.put(Page::with_size(4));
        let page = pool.get(64);
        assert_eq!(page.len(), 64);
        assert_eq!(pool.misses(), 1);
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn pool_is_bounded() {
        let pool = BufferPool::new(1);
        pool.put(Page::with_size(4));
        pool.put(Page::with_size(4));
        assert_eq!(pool.available(), 1);
    }
}
