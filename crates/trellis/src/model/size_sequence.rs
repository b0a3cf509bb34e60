//! Prefix-sum size ledger for variable row heights.
//!
//! A [`SizeSequence`] maps an ordered run of entries to pixel sizes and
//! answers two queries fast: "where does entry `i` start?" and "which
//! entry covers pixel `y`?". Positions are kept as a cached prefix sum
//! that is rebuilt after every mutation; the rebuild is O(n), lookups are
//! O(1) and O(log n).

/// Ordered sequence of entry sizes with cached positions.
#[derive(Debug, Clone, Default)]
pub struct SizeSequence {
    sizes: Vec<i32>,
    /// `positions[i]` is the offset of entry `i`; `positions[len]` is the
    /// total size.
    positions: Vec<i32>,
}

impl SizeSequence {
    pub fn new() -> Self {
        Self {
            sizes: Vec::new(),
            positions: vec![0],
        }
    }

    /// A sequence of `count` entries, each `size` pixels.
    pub fn new_uniform(count: usize, size: i32) -> Self {
        Self::from_sizes(vec![size; count])
    }

    /// A sequence with the given entry sizes.
    pub fn from_sizes(sizes: Vec<i32>) -> Self {
        let mut seq = Self {
            positions: Vec::with_capacity(sizes.len() + 1),
            sizes,
        };
        seq.rebuild_positions();
        seq
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// The size of entry `index`, or 0 when out of range.
    pub fn size(&self, index: usize) -> i32 {
        self.sizes.get(index).copied().unwrap_or(0)
    }

    /// Replaces the size of entry `index`. Out-of-range indices are
    /// ignored.
    pub fn set_size(&mut self, index: usize, size: i32) {
        if let Some(slot) = self.sizes.get_mut(index) {
            *slot = size;
            self.rebuild_positions();
        }
    }

    /// The offset of entry `index` from the start of the sequence.
    ///
    /// `index == len()` returns the total size.
    pub fn position_of(&self, index: usize) -> i32 {
        self.positions
            .get(index)
            .copied()
            .unwrap_or_else(|| self.total_size())
    }

    /// The entry covering `position`, or `None` when the position lies
    /// outside the sequence.
    pub fn index_at(&self, position: i32) -> Option<usize> {
        if position < 0 || position >= self.total_size() {
            return None;
        }
        // positions is sorted; find the last entry starting at or before
        // the queried pixel.
        match self.positions.binary_search(&position) {
            Ok(mut index) => {
                // Zero-size entries share a position; skip to the first
                // entry that actually covers the pixel.
                while index < self.sizes.len() && self.sizes[index] == 0 {
                    index += 1;
                }
                (index < self.sizes.len()).then_some(index)
            }
            Err(insert) => Some(insert - 1),
        }
    }

    /// Sum of all entry sizes.
    pub fn total_size(&self) -> i32 {
        self.positions.last().copied().unwrap_or(0)
    }

    /// Inserts `count` entries of `size` before `index`.
    pub fn insert_entries(&mut self, index: usize, count: usize, size: i32) {
        let index = index.min(self.sizes.len());
        self.sizes.splice(index..index, std::iter::repeat_n(size, count));
        self.rebuild_positions();
    }

    /// Removes `count` entries starting at `index`.
    pub fn remove_entries(&mut self, index: usize, count: usize) {
        if index >= self.sizes.len() {
            return;
        }
        let end = (index + count).min(self.sizes.len());
        self.sizes.drain(index..end);
        self.rebuild_positions();
    }

    /// All sizes in order.
    pub fn sizes(&self) -> &[i32] {
        &self.sizes
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        let mut offset = 0;
        self.positions.push(0);
        for &size in &self.sizes {
            offset += size;
            self.positions.push(offset);
        }
    }
}
