use std::{
    fs::File,
    io::{self, Write},
    path::Path,
};

use log::{debug, trace};

use crate::{
    bloom::{
        block::{BLOCK_MAGIC, FOOTER_LEN, PAGE_HEADER_LEN, PageHeader},
        offset::BloomOffset,
    },
    file::{BlockFile, Page},
};

/// Builds a block file: blooms are packed into pages, followed by the page header table
/// and the footer.
pub struct BlockWriter {
    file: File,
    page_size: usize,
    page: Page,
    position: usize,
    headers: Vec<PageHeader>,
    written: u64,
}

fn invalid_data(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, format!("{context}: {e}"))
}

impl BlockWriter {
    /// Pages are cut once the next bloom would push them past `page_size` bytes.
    /// A single bloom larger than that gets a page of its own.
    pub fn create(path: impl AsRef<Path>, page_size: usize) -> io::Result<Self> {
        let file = BlockFile::create(path)?;
        Ok(Self {
            file,
            page_size,
            page: Page::with_size(page_size),
            position: 0,
            headers: Vec::new(),
            written: 0,
        })
    }

    /// Appends a bloom and returns where it landed.
    pub fn append(&mut self, bloom: &[u8]) -> io::Result<BloomOffset> {
        let needed = Page::max_length(bloom);
        if self.position + needed > self.page.len() {
            self.cut_page()?;
            if needed > self.page.len() {
                self.page.reset(needed);
            }
        }

        let offset = BloomOffset::new(self.headers.len(), self.position);
        self.page
            .set_bytes(self.position, bloom)
            .map_err(|e| invalid_data("Failed to write bloom to page", e))?;
        self.position += needed;
        trace!("Appended {} byte bloom at {}", bloom.len(), offset);
        Ok(offset)
    }

    /// Closes the current page; the next bloom starts a new one. No-op on an empty page.
    pub fn cut_page(&mut self) -> io::Result<()> {
        if self.position == 0 {
            return Ok(());
        }
        self.file.write_all(&self.page.content()[..self.position])?;
        debug!(
            "Wrote page {} ({} bytes)",
            self.headers.len(),
            self.position
        );
        self.headers.push(PageHeader {
            offset: self.written,
            len: self.position,
        });
        self.written += self.position as u64;
        self.position = 0;
        self.page.reset(self.page_size);
        Ok(())
    }

    /// Flushes the last page and writes the header table and footer. Returns the page count.
    pub fn finish(mut self) -> io::Result<usize> {
        self.cut_page()?;

        let count = self.headers.len();
        let mut table = Page::with_size(count * PAGE_HEADER_LEN + FOOTER_LEN);
        for (i, header) in self.headers.iter().enumerate() {
            let at = i * PAGE_HEADER_LEN;
            let offset = i64::try_from(header.offset)
                .map_err(|e| invalid_data("Page offset does not fit", e))?;
            let len = i32::try_from(header.len)
                .map_err(|e| invalid_data("Page length does not fit", e))?;
            table
                .set_long(at, offset)
                .and_then(|_| table.set_integer(at + 8, len))
                .map_err(|e| invalid_data("Failed to write page header", e))?;
        }
        let footer = count * PAGE_HEADER_LEN;
        let count_field =
            i32::try_from(count).map_err(|e| invalid_data("Page count does not fit", e))?;
        table
            .set_integer(footer, count_field)
            .and_then(|_| table.set_integer(footer + 4, BLOCK_MAGIC))
            .map_err(|e| invalid_data("Failed to write footer", e))?;
        self.file.write_all(table.content())?;

        debug!("Finished block with {} pages", count);
        Ok(count)
    }
}
