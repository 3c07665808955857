use std::{
    fs::File,
    io,
    path::Path,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
};

use log::debug;

use crate::{
    bloom::decoder::{BloomPageDecoder, PageCursor},
    buffer::{PagePool, PooledPage},
    error::{BloomError, Result},
    file::{BlockFile, Page},
};

/// Footer magic, "BLOM".
pub const BLOCK_MAGIC: i32 = 0x424C_4F4D;
/// `page_count: i32` followed by the magic.
pub const FOOTER_LEN: usize = 8;
/// `offset: i64` and `len: i32` per page.
pub const PAGE_HEADER_LEN: usize = 12;

/// Location of one page inside a block file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub offset: u64,
    pub len: usize,
}

impl PageHeader {
    pub(crate) fn decode(page: &Page, at: usize) -> Result<Self> {
        let offset = page
            .get_long(at)
            .map_err(|e| BloomError::header(format!("page header at {at}: {e}")))?;
        let len = page
            .get_integer(at + 8)
            .map_err(|e| BloomError::header(format!("page header at {at}: {e}")))?;
        let offset = u64::try_from(offset)
            .map_err(|_| BloomError::header(format!("negative page offset {offset}")))?;
        let len = usize::try_from(len)
            .map_err(|_| BloomError::header(format!("negative page length {len}")))?;
        Ok(Self { offset, len })
    }
}

/// Counters a block records while serving pages.
#[derive(Debug, Default)]
pub struct BlockMetrics {
    headers_loaded: AtomicU64,
    streams_opened: AtomicU64,
    pages_decoded: AtomicU64,
    bytes_decoded: AtomicU64,
    pages_too_large: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub headers_loaded: u64,
    pub streams_opened: u64,
    pub pages_decoded: u64,
    pub bytes_decoded: u64,
    pub pages_too_large: u64,
}

impl BlockMetrics {
    pub fn headers_loaded(&self) {
        self.headers_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stream_opened(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_decoded(&self, bytes: usize) {
        self.pages_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn page_too_large(&self) {
        self.pages_too_large.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            headers_loaded: self.headers_loaded.load(Ordering::Relaxed),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            pages_decoded: self.pages_decoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            pages_too_large: self.pages_too_large.load(Ordering::Relaxed),
        }
    }
}

/// A bloom block: paged storage a cursor reads through.
///
/// Implementations must make [`BloomBlock::load_headers`] idempotent and safe to call
/// from several cursors sharing the block.
pub trait BloomBlock {
    type Stream;
    type Page: PageCursor;

    fn load_headers(&self) -> Result<()>;

    /// Number of pages; zero until headers are loaded.
    fn page_count(&self) -> usize;

    fn open_stream(&self) -> Result<Self::Stream>;

    /// Materializes page `page`, failing with [`BloomError::PageTooLarge`] when it is
    /// bigger than `max_size` bytes.
    fn page_cursor(
        &self,
        stream: Self::Stream,
        page: usize,
        max_size: usize,
        metrics: &BlockMetrics,
    ) -> Result<Self::Page>;

    fn metrics(&self) -> &BlockMetrics;
}

/// A bloom block stored in a file, with page buffers drawn from a shared pool.
pub struct FileBlock {
    file: BlockFile,
    pool: Arc<dyn PagePool>,
    headers: OnceLock<Result<Vec<PageHeader>>>,
    metrics: BlockMetrics,
}

impl FileBlock {
    pub fn open(path: impl AsRef<Path>, pool: Arc<dyn PagePool>) -> io::Result<Self> {
        Ok(Self {
            file: BlockFile::open(path)?,
            pool,
            headers: OnceLock::new(),
            metrics: BlockMetrics::default(),
        })
    }

    /// Page headers, once loaded.
    pub fn headers(&self) -> Option<&[PageHeader]> {
        match self.headers.get() {
            Some(Ok(headers)) => Some(headers),
            _ => None,
        }
    }

    fn read_headers(&self) -> Result<Vec<PageHeader>> {
        debug!("Loading page headers from {:?}", self.file.path());
        self.metrics.headers_loaded();
        let stream = self
            .file
            .stream()
            .map_err(|e| BloomError::header_io("opening block", e))?;
        let file_len = self
            .file
            .len()
            .map_err(|e| BloomError::header_io("reading block size", e))?;
        let footer_len = FOOTER_LEN as u64;
        if file_len < footer_len {
            return Err(BloomError::header(format!(
                "block is {file_len} bytes, too small for a footer"
            )));
        }

        let mut footer = Page::with_size(FOOTER_LEN);
        BlockFile::read_at(&stream, file_len - footer_len, &mut footer)
            .map_err(|e| BloomError::header_io("reading footer", e))?;
        let count = footer
            .get_integer(0)
            .map_err(|e| BloomError::header(format!("footer: {e}")))?;
        let magic = footer
            .get_integer(4)
            .map_err(|e| BloomError::header(format!("footer: {e}")))?;
        if magic != BLOCK_MAGIC {
            return Err(BloomError::header(format!("bad magic {magic:#010x}")));
        }
        let count = usize::try_from(count)
            .map_err(|_| BloomError::header(format!("negative page count {count}")))?;

        let table_len = (count * PAGE_HEADER_LEN) as u64;
        let data_end = file_len
            .checked_sub(footer_len + table_len)
            .ok_or_else(|| BloomError::header(format!("{count} page headers do not fit")))?;
        let mut table = Page::with_size(count * PAGE_HEADER_LEN);
        BlockFile::read_at(&stream, data_end, &mut table)
            .map_err(|e| BloomError::header_io("reading page headers", e))?;

        let headers = (0..count)
            .map(|i| PageHeader::decode(&table, i * PAGE_HEADER_LEN))
            .collect::<Result<Vec<_>>>()?;
        if let Some(bad) = headers
            .iter()
            .find(|h| h.offset.saturating_add(h.len as u64) > data_end)
        {
            return Err(BloomError::header(format!(
                "page at {} with {} bytes runs past the page data",
                bad.offset, bad.len
            )));
        }

        debug!("Loaded {} page headers", headers.len());
        Ok(headers)
    }
}

impl BloomBlock for FileBlock {
    type Stream = File;
    type Page = BloomPageDecoder;

    fn load_headers(&self) -> Result<()> {
        self.headers
            .get_or_init(|| self.read_headers())
            .as_ref()
            .map(|_| ())
            .map_err(BloomError::clone)
    }

    fn page_count(&self) -> usize {
        self.headers().map_or(0, <[PageHeader]>::len)
    }

    fn open_stream(&self) -> Result<File> {
        let stream = self
            .file
            .stream()
            .map_err(|e| BloomError::StreamAcquisition(Arc::new(e)))?;
        self.metrics.stream_opened();
        Ok(stream)
    }

    fn page_cursor(
        &self,
        stream: File,
        page: usize,
        max_size: usize,
        metrics: &BlockMetrics,
    ) -> Result<BloomPageDecoder> {
        self.load_headers()?;
        let headers = self.headers().unwrap_or_default();
        let header = headers.get(page).ok_or(BloomError::PageOutOfRange {
            page,
            count: headers.len(),
        })?;
        if header.len > max_size {
            metrics.page_too_large();
            return Err(BloomError::PageTooLarge {
                page,
                size: header.len,
                max: max_size,
            });
        }

        debug!("Decoding page {} ({} bytes)", page, header.len);
        let mut buf = PooledPage::acquire(self.pool.clone(), header.len);
        if let Err(e) = BlockFile::read_at(&stream, header.offset, buf.page_mut()) {
            buf.release();
            return Err(BloomError::PageRead {
                page,
                source: Arc::new(e),
            });
        }
        metrics.page_decoded(header.len);
        Ok(BloomPageDecoder::new(page, buf))
    }

    fn metrics(&self) -> &BlockMetrics {
        &self.metrics
    }
}
