//! # Receive Reorder Buffer (RFC 9000 Section 2.2)
//!
//! STREAM frames can arrive out of order due to network reordering, loss
//! and retransmission. Data at the stream's contiguous watermark
//! (`rx_offset`) is delivered straight to the application; anything beyond
//! it waits here until the gap before it fills.
//!
//! ## Ownership
//!
//! Unlike the send side, received bytes have no caller-retained backing
//! buffer, so every stored chunk is an owned copy (`bytes::Bytes`).
//!
//! ## Overlap
//!
//! Stored chunks never overlap. Incoming data is trimmed against the
//! watermark and against chunks already held; only the missing pieces are
//! copied.
//!
//! ```text
//! rx_offset = 10
//! held:      [20..30)        [40..50)
//! insert:         [15 .................. 45)
//! stored:    [15..20)[20..30)[30..40)[40..50)
//! ```

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::ops::Range;

use bytes::Bytes;

/// A range of stream data with offset
///
/// Represents bytes `[offset, offset + length)` in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRange {
    /// Starting offset in the stream
    pub offset: u64,

    /// Length of the data
    pub length: usize,
}

impl DataRange {
    pub const fn new(offset: u64, length: usize) -> Self {
        Self { offset, length }
    }

    /// End offset (exclusive)
    pub fn end(&self) -> u64 {
        self.offset + self.length as u64
    }

    pub fn as_range(&self) -> Range<u64> {
        self.offset..self.end()
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &DataRange) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Out-of-order received data for one stream.
#[derive(Debug, Clone, Default)]
pub struct ReorderBuffer {
    /// offset → owned bytes; keys ascending, chunks disjoint
    chunks: BTreeMap<u64, Bytes>,
}

impl ReorderBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the parts of `[offset, offset + data.len())` at or above
    /// `rx_offset` that are not already held.
    ///
    /// Returns the number of bytes newly stored.
    pub fn insert(&mut self, rx_offset: u64, offset: u64, data: &[u8]) -> usize {
        let end = offset + data.len() as u64;
        let mut off = offset.max(rx_offset);
        if off >= end {
            return 0;
        }

        if let Some((&s, chunk)) = self.chunks.range(..=off).next_back() {
            let chunk_end = s + chunk.len() as u64;
            if chunk_end > off {
                off = chunk_end;
            }
        }

        let mut stored = 0;
        while off < end {
            let next = self
                .chunks
                .range(off..)
                .next()
                .map(|(&s, chunk)| (s, s + chunk.len() as u64));

            let piece_end = match next {
                Some((s, _)) => s.min(end),
                None => end,
            };
            if piece_end > off {
                let piece = &data[(off - offset) as usize..(piece_end - offset) as usize];
                self.chunks.insert(off, Bytes::copy_from_slice(piece));
                stored += piece.len();
            }

            match next {
                Some((s, chunk_end)) if s < end => off = chunk_end,
                _ => break,
            }
        }

        stored
    }

    /// Drop every buffered byte below `rx_offset`.
    pub fn advance_to(&mut self, rx_offset: u64) {
        while let Some(entry) = self.chunks.first_entry() {
            let start = *entry.key();
            if start >= rx_offset {
                break;
            }
            let chunk = entry.remove();
            let chunk_end = start + chunk.len() as u64;
            if chunk_end > rx_offset {
                self.chunks
                    .insert(rx_offset, chunk.slice((rx_offset - start) as usize..));
                break;
            }
        }
    }

    /// Remove and return the chunk starting exactly at `rx_offset`.
    pub fn pop_ready(&mut self, rx_offset: u64) -> Option<Bytes> {
        match self.chunks.first_key_value() {
            Some((&start, _)) if start == rx_offset => self.chunks.remove(&start),
            _ => None,
        }
    }

    /// First offset at or after `rx_offset` that is not buffered.
    pub fn first_gap(&self, rx_offset: u64) -> u64 {
        let mut off = rx_offset;
        while let Some(chunk) = self.chunks.get(&off) {
            off += chunk.len() as u64;
        }
        off
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total bytes held.
    pub fn buffered_len(&self) -> usize {
        self.chunks.values().map(Bytes::len).sum()
    }

    /// Buffered ranges in offset order, adjacent chunks merged.
    pub fn ranges(&self) -> Vec<DataRange> {
        let mut merged: Vec<DataRange> = Vec::with_capacity(self.chunks.len());
        for (&offset, chunk) in &self.chunks {
            match merged.last_mut() {
                Some(last) if last.end() == offset => last.length += chunk.len(),
                _ => merged.push(DataRange::new(offset, chunk.len())),
            }
        }
        merged
    }
}
