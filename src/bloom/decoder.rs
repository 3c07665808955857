use std::ops::Range;

use log::trace;

use crate::{
    bloom::{offset::BloomOffset, record::Bloom},
    buffer::PooledPage,
    error::BloomError,
    file::PageError,
};

/// A cursor over one fully materialized page.
pub trait PageCursor {
    /// Positions on the bloom starting at `byte_offset` and decodes it.
    ///
    /// The whole page is buffered, so moves may go forward or backward.
    fn seek(&mut self, byte_offset: usize);

    /// Decodes the next bloom. Returns false at the end of the page or on a decode
    /// error; [`PageCursor::err`] tells the two apart.
    fn advance(&mut self) -> bool;

    /// The bloom decoded by the last successful `seek` or `advance`.
    fn at(&self) -> Option<Bloom<'_>>;

    fn err(&self) -> Option<&BloomError>;

    /// Hands the page buffer back to its pool.
    fn release(self);
}

/// Decodes length-prefixed blooms out of a pooled page buffer.
#[derive(Debug)]
pub struct BloomPageDecoder {
    page_index: usize,
    buf: PooledPage,
    pos: usize,
    cur: Option<(usize, Range<usize>)>,
    err: Option<BloomError>,
}

impl BloomPageDecoder {
    pub fn new(page_index: usize, buf: PooledPage) -> Self {
        Self {
            page_index,
            buf,
            pos: 0,
            cur: None,
            err: None,
        }
    }

    fn fail(&mut self, offset: usize, source: PageError) -> bool {
        trace!(
            "Decode failed on page {} at offset {}: {}",
            self.page_index, offset, source
        );
        self.cur = None;
        self.err = Some(BloomError::PageDecode {
            page: self.page_index,
            offset,
            source,
        });
        false
    }

    fn decode_at_pos(&mut self) -> bool {
        let offset = self.pos;
        match self.buf.page().get_bytes(offset) {
            Ok(bytes) => {
                let start = offset + std::mem::size_of::<i32>();
                let end = start + bytes.len();
                self.cur = Some((offset, start..end));
                self.pos = end;
                true
            }
            Err(source) => self.fail(offset, source),
        }
    }
}

impl PageCursor for BloomPageDecoder {
    fn seek(&mut self, byte_offset: usize) {
        if self.err.is_some() {
            return;
        }
        if byte_offset >= self.buf.page().len() {
            self.fail(byte_offset, PageError::OutOfBounds);
            return;
        }
        self.pos = byte_offset;
        self.decode_at_pos();
    }

    fn advance(&mut self) -> bool {
        if self.err.is_some() {
            return false;
        }
        if self.pos >= self.buf.page().len() {
            self.cur = None;
            return false;
        }
        self.decode_at_pos()
    }

    fn at(&self) -> Option<Bloom<'_>> {
        let (offset, range) = self.cur.as_ref()?;
        let data = &self.buf.page().content()[range.clone()];
        Some(Bloom::new(BloomOffset::new(self.page_index, *offset), data))
    }

    fn err(&self) -> Option<&BloomError> {
        self.err.as_ref()
    }

    fn release(self) {
        trace!("Releasing page {}", self.page_index);
        self.buf.release();
    }
}

#[cfg(test)]
mod tests {

    use std::sync::Arc;

    use super::*;
    use crate::buffer::BufferPool;

    fn decoder(records: &[&[u8]]) -> BloomPageDecoder {
        let size = records.iter().map(|r| 4 + r.len()).sum();
        let pool = Arc::new(BufferPool::new(4));
        let mut buf = PooledPage::acquire(pool, size);
        let mut pos = 0;
        for record in records {
            buf.page_mut().set_bytes(pos, record).unwrap();
            pos += 4 + record.len();
        }
        BloomPageDecoder::new(3, buf)
    }

    #[test]
    fn advance_walks_every_record() {
        let mut dec = decoder(&[b"aa", b"bbb", b"c"]);
        assert!(dec.at().is_none());

        let mut seen = Vec::new();
        while dec.advance() {
            let bloom = dec.at().unwrap();
            seen.push((bloom.offset().byte_offset, bloom.data().to_vec()));
        }
        assert!(dec.err().is_none());
        assert_eq!(
            seen,
            vec![
                (0, b"aa".to_vec()),
                (6, b"bbb".to_vec()),
                (13, b"c".to_vec())
            ]
        );
        assert!(dec.at().is_none());
    }

    #[test]
    fn seek_decodes_in_place_both_directions() {
        let mut dec = decoder(&[b"aa", b"bbb", b"c"]);
        dec.seek(13);
        assert_eq!(dec.at().unwrap().data(), b"c");
        assert_eq!(dec.at().unwrap().offset(), BloomOffset::new(3, 13));

        dec.seek(0);
        assert_eq!(dec.at().unwrap().data(), b"aa");
        assert!(dec.advance());
        assert_eq!(dec.at().unwrap().data(), b"bbb");
    }

    #[test]
    fn seek_past_end_is_a_decode_error() {
        let mut dec = decoder(&[b"aa"]);
        dec.seek(6);
        assert!(matches!(
            dec.err(),
            Some(BloomError::PageDecode {
                page: 3,
                offset: 6,
                source: PageError::OutOfBounds
            })
        ));
        assert!(!dec.advance());
    }

    #[test]
    fn corrupt_length_stops_iteration_with_error() {
        let mut dec = decoder(&[b"aa", b"bbb"]);
        dec.buf.page_mut().set_integer(6, 1000).unwrap();

        assert!(dec.advance());
        assert!(!dec.advance());
        assert!(matches!(
            dec.err(),
            Some(BloomError::PageDecode {
                offset: 6,
                source: PageError::InvalidData,
                ..
            })
        ));
        assert!(dec.at().is_none());
    }

    #[test]
    fn empty_page_has_no_records() {
        let mut dec = decoder(&[]);
        assert!(!dec.advance());
        assert!(dec.err().is_none());
    }
}
