//! Chunking — splitting a frame into datagram-sized byte ranges.
//!
//! A chunk is never allocated on its own. It is a `[start, end)` range into
//! the frame buffer, handed to the transport as a slice.
//!
//! For a frame of length `L` and chunk size `C`:
//!   - there are `ceil(L / C)` chunks (none when `L == 0`)
//!   - every chunk is `C` bytes except possibly the last
//!   - the last chunk carries `L % C` bytes, or `C` when `L % C == 0`

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Largest UDP payload that fits in a single IPv4 datagram.
pub const MAX_CHUNK_SIZE: usize = 65_507;

/// Default datagram payload size.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// A validated chunk size: `1..=MAX_CHUNK_SIZE` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ChunkSize(NonZeroUsize);

impl ChunkSize {
    pub fn new(size: usize) -> Option<Self> {
        if size > MAX_CHUNK_SIZE {
            return None;
        }
        NonZeroUsize::new(size).map(Self)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        const DEFAULT: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CHUNK_SIZE) {
            Some(n) => n,
            None => panic!("DEFAULT_CHUNK_SIZE must be non-zero"),
        };
        Self(DEFAULT)
    }
}

impl fmt::Display for ChunkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<usize> for ChunkSize {
    type Error = String;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        Self::new(size).ok_or_else(|| format!("chunk size must be 1..={MAX_CHUNK_SIZE}, got {size}"))
    }
}

impl From<ChunkSize> for usize {
    fn from(size: ChunkSize) -> usize {
        size.get()
    }
}

/// Number of chunks a buffer of `len` bytes splits into.
pub fn chunk_count(len: usize, chunk_size: ChunkSize) -> usize {
    len.div_ceil(chunk_size.get())
}

/// Iterate the chunk ranges of a buffer of `len` bytes, in offset order.
pub fn chunk_ranges(len: usize, chunk_size: ChunkSize) -> ChunkRanges {
    ChunkRanges {
        len,
        chunk_size: chunk_size.get(),
        offset: 0,
    }
}

/// Iterator over consecutive `[start, end)` ranges covering `[0, len)`.
#[derive(Debug, Clone)]
pub struct ChunkRanges {
    len: usize,
    chunk_size: usize,
    offset: usize,
}

impl Iterator for ChunkRanges {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.offset >= self.len {
            return None;
        }
        let start = self.offset;
        let end = start.saturating_add(self.chunk_size).min(self.len);
        self.offset = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.offset).div_ceil(self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChunkRanges {}

impl std::iter::FusedIterator for ChunkRanges {}
