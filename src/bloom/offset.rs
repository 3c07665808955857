use std::fmt;

/// Coordinate of a bloom inside a block: a page index and a byte offset within that page.
///
/// Ordered by page, then byte offset. Bounds are checked by the block, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BloomOffset {
    pub page: usize,
    pub byte_offset: usize,
}

impl BloomOffset {
    pub fn new(page: usize, byte_offset: usize) -> Self {
        Self { page, byte_offset }
    }
}

impl fmt::Display for BloomOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page, self.byte_offset)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn orders_by_page_then_offset() {
        let mut offsets = vec![
            BloomOffset::new(1, 0),
            BloomOffset::new(0, 20),
            BloomOffset::new(0, 10),
            BloomOffset::new(1, 15),
        ];
        offsets.sort();
        assert_eq!(
            offsets,
            vec![
                BloomOffset::new(0, 10),
                BloomOffset::new(0, 20),
                BloomOffset::new(1, 0),
                BloomOffset::new(1, 15),
            ]
        );
    }

    #[test]
    fn displays_as_pair() {
        assert_eq!(BloomOffset::new(3, 42).to_string(), "(3, 42)");
    }
}
