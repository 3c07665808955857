use crate::{
    bloom::{
        block::BloomBlock,
        iter::{IterOptions, LazyBloomIter},
        offset::BloomOffset,
        record::Bloom,
    },
    error::{BloomError, ErrorOrigin, IterError},
};

/// Point lookups of blooms by offset.
pub trait BloomQuerier {
    fn seek(&mut self, offset: BloomOffset) -> Result<Bloom<'_>, IterError>;
}

/// Answers point lookups with a [`LazyBloomIter`], turning its recorded error state into
/// a direct result.
pub struct BloomBlockQuerier<'a, B: BloomBlock> {
    iter: LazyBloomIter<'a, B>,
}

impl<'a, B: BloomBlock> BloomBlockQuerier<'a, B> {
    pub fn new(block: &'a B, options: IterOptions) -> Self {
        Self {
            iter: LazyBloomIter::with_options(block, options),
        }
    }

    /// The underlying cursor, for sequential reads.
    pub fn iter_mut(&mut self) -> &mut LazyBloomIter<'a, B> {
        &mut self.iter
    }
}

impl<B: BloomBlock> BloomQuerier for BloomBlockQuerier<'_, B> {
    fn seek(&mut self, offset: BloomOffset) -> Result<Bloom<'_>, IterError> {
        self.iter.seek(offset);
        if let Some(err) = self.iter.err() {
            return Err(err);
        }
        self.iter
            .at()
            .ok_or_else(|| IterError::new(ErrorOrigin::Cursor, BloomError::NotPositioned))
    }
}
