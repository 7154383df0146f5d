//! Lazy chunk planning over a blob.

/// A contiguous byte range of a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in write order, starting at 0.
    pub index: u64,
    pub offset: u64,
    pub len: usize,
}

impl Chunk {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn end(&self) -> u64 {
        self.offset + self.len as u64
    }
}

/// Ordered, finite iterator of chunk boundaries.
///
/// Only offsets are produced; no blob data is touched. A zero-length blob has
/// no chunks.
#[derive(Debug, Clone)]
pub struct Chunks {
    total: u64,
    chunk_size: usize,
    next_offset: u64,
    next_index: u64,
}

impl Chunks {
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(total: u64, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            total,
            chunk_size,
            next_offset: 0,
            next_index: 0,
        }
    }

    /// Number of chunks `total` bytes split into.
    pub fn count_for(total: u64, chunk_size: usize) -> u64 {
        total.div_ceil(chunk_size as u64)
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.next_offset >= self.total {
            return None;
        }

        let remaining = self.total - self.next_offset;
        let len = remaining.min(self.chunk_size as u64) as usize;
        let chunk = Chunk {
            index: self.next_index,
            offset: self.next_offset,
            len,
        };

        self.next_offset += len as u64;
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = Self::count_for(self.total - self.next_offset, self.chunk_size);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}
