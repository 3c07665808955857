/// A Page is a run of bytes holding big-endian integers and length-prefixed byte records.
///
/// Bloom pages are sequences of records, each an `i32` length followed by that many bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    content: Vec<u8>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Attempted to access data outside the bounds of the page")]
    OutOfBounds,

    #[error("Data format is invalid for the requested operation")]
    InvalidData,

    #[error("Requested data size exceeds available page size")]
    SizeExceeded { requested: usize, available: usize },
}

pub type PageResult<T> = Result<T, PageError>;

const INT_SIZE: usize = std::mem::size_of::<i32>();
const LONG_SIZE: usize = std::mem::size_of::<i64>();

impl Page {
    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self { content: bytes }
    }

    pub fn with_size(size: usize) -> Self {
        Self {
            content: vec![0; size],
        }
    }

    /// Resizes the page to `size` zeroed bytes, keeping the allocation when it is large enough.
    pub fn reset(&mut self, size: usize) {
        self.content.clear();
        self.content.resize(size, 0);
    }

    pub fn get_integer(&self, offset: usize) -> PageResult<i32> {
        self.assert_offset_within_bounds(offset, INT_SIZE)?;

        let bytes = &self.content[offset..offset + INT_SIZE];
        bytes
            .try_into()
            .map(i32::from_be_bytes)
            .map_err(|_| PageError::InvalidData)
    }

    pub fn set_integer(&mut self, offset: usize, value: i32) -> PageResult<()> {
        self.assert_offset_within_bounds(offset, INT_SIZE)?;

        self.content[offset..offset + INT_SIZE].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn get_long(&self, offset: usize) -> PageResult<i64> {
        self.assert_offset_within_bounds(offset, LONG_SIZE)?;

        let bytes = &self.content[offset..offset + LONG_SIZE];
        bytes
            .try_into()
            .map(i64::from_be_bytes)
            .map_err(|_| PageError::InvalidData)
    }

    pub fn set_long(&mut self, offset: usize, value: i64) -> PageResult<()> {
        self.assert_offset_within_bounds(offset, LONG_SIZE)?;

        self.content[offset..offset + LONG_SIZE].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Borrows the length-prefixed record stored at `offset`.
    pub fn get_bytes(&self, offset: usize) -> PageResult<&[u8]> {
        let length = self.get_integer(offset)?;
        let length = usize::try_from(length).map_err(|_| PageError::InvalidData)?;

        let start = offset + INT_SIZE;
        let end = start.checked_add(length).ok_or(PageError::InvalidData)?;
        if end > self.content.len() {
            return Err(PageError::InvalidData);
        }
        Ok(&self.content[start..end])
    }

    pub fn set_bytes(&mut self, offset: usize, bytes: &[u8]) -> PageResult<()> {
        self.assert_offset_within_bounds(offset, INT_SIZE)?;

        let length = i32::try_from(bytes.len()).map_err(|_| PageError::InvalidData)?;
        let needed = Self::max_length(bytes);
        if offset + needed > self.content.len() {
            return Err(PageError::SizeExceeded {
                requested: offset + needed,
                available: self.content.len(),
            });
        }
        self.set_integer(offset, length)?;
        self.content[offset + INT_SIZE..offset + needed].copy_from_slice(bytes);
        Ok(())
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut [u8] {
        &mut self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.content.capacity()
    }

    fn assert_offset_within_bounds(&self, offset: usize, size: usize) -> PageResult<()> {
        match offset.checked_add(size) {
            Some(end) if end <= self.content.len() => Ok(()),
            _ => Err(PageError::OutOfBounds),
        }
    }

    /// Bytes a record with this payload occupies on a page, length prefix included.
    pub(crate) fn max_length(bytes: &[u8]) -> usize {
        INT_SIZE + bytes.len()
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn with_size_initializes_zeroes_and_len() {
        let p = Page::with_size(8);
        assert_eq!(p.len(), 8);
        assert!(p.content().iter().all(|&b| b == 0));
    }

    #[test]
    fn with_bytes_get_integer_big_endian() {
        let p = Page::with_bytes(vec![0x00, 0x00, 0x00, 0x7F]);
        assert!(matches!(p.get_integer(0), Ok(127)));
    }

    #[test]
    fn set_get_long_big_endian() {
        let mut p = Page::with_size(12);
        assert!(matches!(p.set_long(4, 0x0102_0304_0506_0708), Ok(())));
        assert_eq!(&p.content()[4..12], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(matches!(p.get_long(4), Ok(0x0102_0304_0506_0708)));
    }

    #[test]
    fn set_get_bytes_borrows_payload() {
        let mut p = Page::with_size(16);
        assert!(matches!(p.set_bytes(0, b"abc"), Ok(())));
        assert_eq!(p.get_bytes(0), Ok(&b"abc"[..]));
        assert_eq!(&p.content()[0..4], &3i32.to_be_bytes());
    }

    #[test]
    fn consecutive_records_are_packed() {
        let mut p = Page::with_size(32);
        p.set_bytes(0, b"first!").unwrap();
        let next = Page::max_length(b"first!");
        assert_eq!(next, 10);
        p.set_bytes(next, b"second").unwrap();
        assert_eq!(p.get_bytes(0), Ok(&b"first!"[..]));
        assert_eq!(p.get_bytes(next), Ok(&b"second"[..]));
    }

    #[test]
    fn out_of_bounds_on_get_integer() {
        let p = Page::with_size(8);
        assert!(matches!(p.get_integer(6), Err(PageError::OutOfBounds)));
        assert!(matches!(p.get_integer(usize::MAX), Err(PageError::OutOfBounds)));
    }

    #[test]
    fn out_of_bounds_on_get_long() {
        let p = Page::with_size(8);
        assert!(matches!(p.get_long(1), Err(PageError::OutOfBounds)));
    }

    #[test]
    fn out_of_bounds_on_get_bytes_offset() {
        let p = Page::with_size(8);
        assert!(matches!(p.get_bytes(6), Err(PageError::OutOfBounds)));
    }

    #[test]
    fn size_exceeded_on_set_bytes() {
        let mut p = Page::with_size(5);
        match p.set_bytes(0, b"abcdef") {
            Err(PageError::SizeExceeded {
                requested,
                available,
            }) => {
                assert_eq!(requested, 10);
                assert_eq!(available, 5);
            }
            other => panic!("expected SizeExceeded error, got {other:?}"),
        }
    }

    #[test]
    fn get_bytes_length_overflow_returns_error() {
        let mut p = Page::with_size(8);
        // Length larger than the remaining space
        p.set_integer(0, 10).unwrap();
        assert!(matches!(p.get_bytes(0), Err(PageError::InvalidData)));
    }

    #[test]
    fn get_bytes_negative_length_invalid_data() {
        let mut p = Page::with_size(8);
        p.set_integer(0, -1).unwrap();
        assert!(matches!(p.get_bytes(0), Err(PageError::InvalidData)));
    }

    #[test]
    fn reset_zeroes_and_resizes() {
        let mut p = Page::with_bytes(vec![9; 16]);
        p.reset(4);
        assert_eq!(p.content(), &[0, 0, 0, 0]);
        assert!(p.capacity() >= 16);
    }
}
