use crate::bloom::offset::BloomOffset;

/// A decoded bloom, borrowed from the page buffer that holds it.
///
/// The borrow ties the bloom to its page: the cursor cannot move to another page
/// (and possibly hand that buffer back to a pool) while a `Bloom` is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bloom<'a> {
    offset: BloomOffset,
    data: &'a [u8],
}

impl<'a> Bloom<'a> {
    pub fn new(offset: BloomOffset, data: &'a [u8]) -> Self {
        Self { offset, data }
    }

    pub fn offset(&self) -> BloomOffset {
        self.offset
    }

    /// Encoded filter bytes.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
