//! # Frame-Chain
//!
//! One outgoing STREAM record: a starting offset, a FIN flag and the ordered
//! spans carrying its payload. Spans are logically contiguous: span `i` ends
//! at the stream offset where span `i + 1` begins.
//!
//! Chains come from a [`FramePool`](crate::pool::FramePool) and hold a lease
//! on it for their whole life. Up to
//! [`CHAIN_INLINE_SPANS`](crate::pool::CHAIN_INLINE_SPANS) spans live inline
//! in the record; beyond that they spill to the heap and the record moves to
//! the oversized class.

#![forbid(unsafe_code)]

use tinyvec::{ArrayVec, TinyVec};

use super::span::{merge_spans, spans_len, split_point, split_spans, Span};
use super::types::{Frame, StreamFrame};
use crate::pool::{PoolLease, SizeClass, CHAIN_INLINE_SPANS};
use crate::types::StreamId;

pub(crate) type SpanVec<'a> = TinyVec<[Span<'a>; CHAIN_INLINE_SPANS]>;

/// Outgoing stream data awaiting (re)transmission.
#[derive(Debug)]
pub struct FrameChain<'a> {
    /// Stream offset of the first payload byte
    pub offset: u64,

    /// Set on the chain that ends the stream
    pub fin: bool,

    spans: SpanVec<'a>,
    lease: PoolLease,
}

impl<'a> FrameChain<'a> {
    pub(crate) fn from_parts(spans: SpanVec<'a>, lease: PoolLease) -> Self {
        Self {
            offset: 0,
            fin: false,
            spans,
            lease,
        }
    }

    pub fn spans(&self) -> &[Span<'a>] {
        &self.spans
    }

    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        spans_len(&self.spans)
    }

    /// True if the chain carries no payload (a bare FIN).
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(Span::is_empty)
    }

    /// Stream offset one past the last payload byte.
    pub fn end(&self) -> u64 {
        self.offset + self.len() as u64
    }

    /// True if the record is pool-resident (spans stored inline).
    pub fn is_pooled(&self) -> bool {
        self.spans.is_inline()
    }

    /// Append a span. Zero-length spans are ignored.
    pub fn push_span(&mut self, span: Span<'a>) {
        if span.is_empty() {
            return;
        }
        self.spans.push(span);
        self.sync_class();
    }

    /// Copy the payload out, mostly for tests and diagnostics.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for span in self.spans.iter() {
            out.extend_from_slice(span.as_slice());
        }
        out
    }

    /// View this chain as a STREAM frame of `stream_id`.
    pub fn as_stream_frame(&self, stream_id: StreamId) -> Frame<'_> {
        Frame::Stream(StreamFrame {
            stream_id,
            offset: self.offset,
            fin: self.fin,
            data: self.spans(),
        })
    }

    /// Bring the lease's size class in line with where the spans live.
    pub(crate) fn sync_class(&mut self) {
        let class = if self.spans.is_inline() {
            SizeClass::Pooled
        } else {
            SizeClass::Oversized
        };
        self.lease.set_class(class);
    }

    /// Move heap spans back inline when they fit.
    pub(crate) fn rehome(&mut self) -> bool {
        if self.spans.is_inline() || self.spans.len() > CHAIN_INLINE_SPANS {
            return false;
        }
        let mut inline = ArrayVec::default();
        for span in self.spans.iter() {
            inline.push(*span);
        }
        self.spans = TinyVec::Inline(inline);
        self.sync_class();
        true
    }

    pub(crate) fn truncate_spans(&mut self, n: usize) {
        self.spans.truncate(n);
    }

    /// Drop the first `n` payload bytes and advance the offset past them.
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        let mut left = n;
        let mut drained = 0;
        for span in self.spans.iter_mut() {
            if left < span.len() {
                span.advance(left);
                break;
            }
            left -= span.len();
            drained += 1;
            if left == 0 {
                break;
            }
        }
        self.spans.drain(..drained);
        self.offset += n as u64;
    }

    /// Drop all payload, keeping the offset at the former end.
    pub(crate) fn clear_data(&mut self) {
        self.offset = self.end();
        self.spans.clear();
    }

    /// Spans a chain holding the bytes after `at` would need.
    pub(crate) fn tail_span_count(&self, at: usize) -> usize {
        let (idx, _) = split_point(&self.spans, at);
        self.spans.len() - idx
    }

    /// Move every payload byte after the first `at` into `rest`, together
    /// with the FIN flag. `rest` must be empty.
    pub(crate) fn split_into(&mut self, at: usize, rest: &mut FrameChain<'a>) {
        debug_assert!(rest.spans.is_empty());
        split_spans(&mut self.spans, &mut rest.spans, at);

        rest.offset = self.offset + at as u64;
        rest.fin = self.fin;
        self.fin = false;
        rest.sync_class();
    }

    /// Move up to `left` bytes from the front of `src` onto the end of this
    /// chain and return how many were moved. The caller advances
    /// `src.offset`.
    pub(crate) fn merge_from(
        &mut self,
        src: &mut FrameChain<'a>,
        left: usize,
        max_span_count: usize,
    ) -> usize {
        let merged = merge_spans(&mut self.spans, &mut src.spans, left, max_span_count);
        self.sync_class();
        merged
    }
}
