//! Address-ordered block sets

use std::collections::BTreeMap;

/// A span of the backing region, as an offset from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockRange {
    /// Offset from the region base
    pub offset: usize,
    /// Length in bytes
    pub len: usize,
}

impl BlockRange {
    /// Offset one past the last byte
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Ordered map from block offset to block length
#[derive(Debug, Default, Clone)]
pub(crate) struct BlockSet {
    blocks: BTreeMap<usize, usize>,
}

impl BlockSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, offset: usize, len: usize) {
        debug_assert!(len > 0);
        self.blocks.insert(offset, len);
    }

    pub(crate) fn remove(&mut self, offset: usize) -> Option<usize> {
        self.blocks.remove(&offset)
    }

    pub(crate) fn get(&self, offset: usize) -> Option<usize> {
        self.blocks.get(&offset).copied()
    }

    /// Closest entry strictly below `offset`
    pub(crate) fn predecessor(&self, offset: usize) -> Option<BlockRange> {
        self.blocks
            .range(..offset)
            .next_back()
            .map(|(&offset, &len)| BlockRange { offset, len })
    }

    /// First entry at or above `offset`
    pub(crate) fn successor(&self, offset: usize) -> Option<BlockRange> {
        self.blocks
            .range(offset..)
            .next()
            .map(|(&offset, &len)| BlockRange { offset, len })
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = BlockRange> + '_ {
        self.blocks
            .iter()
            .map(|(&offset, &len)| BlockRange { offset, len })
    }

    pub(crate) fn total(&self) -> usize {
        self.blocks.values().sum()
    }

    pub(crate) fn len(&self) -> usize {
        self.blocks.len()
    }
}
