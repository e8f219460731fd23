//! # Frame-Chain Pool
//!
//! Bounded allocator for Frame-Chain records, shared by the streams of one
//! connection.
//!
//! ## Size Classes
//!
//! - **Pooled**: up to [`CHAIN_INLINE_SPANS`] spans stored inline in the
//!   record. No general allocator call.
//! - **Oversized**: larger chains keep their spans in a heap buffer sized to
//!   the requested span count.
//!
//! A queue operation that shrinks an oversized chain back to the inline
//! threshold re-homes it into a pooled record ([`FramePool::rehome`]).
//!
//! ## Ownership
//!
//! [`FramePool`] is a cheap-clone handle injected into each queue. Every
//! chain holds a lease on the pool that is returned when the chain is
//! dropped; [`FramePool::release`] is the explicit form. The pool is not
//! `Send`: one connection-processing thread drives it.

#![forbid(unsafe_code)]

use std::cell::Cell;
use std::rc::Rc;

use tinyvec::{ArrayVec, TinyVec};

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::frames::FrameChain;

/// Spans stored inline in a pooled Frame-Chain record.
pub const CHAIN_INLINE_SPANS: usize = 4;

/// Hard limit on spans per chain.
pub const MAX_STREAM_SPANS: usize = 256;

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Records currently leased
    pub live: usize,
    /// Live records in the pooled (inline) class
    pub pooled: usize,
    /// Live records in the oversized (heap) class
    pub oversized: usize,
    /// Oversized records moved back to the pooled class since creation
    pub rehomed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeClass {
    Pooled,
    Oversized,
}

impl SizeClass {
    fn for_spans(span_count: usize) -> Self {
        if span_count <= CHAIN_INLINE_SPANS {
            SizeClass::Pooled
        } else {
            SizeClass::Oversized
        }
    }
}

#[derive(Debug)]
struct PoolInner {
    capacity: usize,
    live: Cell<usize>,
    pooled: Cell<usize>,
    oversized: Cell<usize>,
    rehomed: Cell<u64>,
}

impl PoolInner {
    fn class_counter(&self, class: SizeClass) -> &Cell<usize> {
        match class {
            SizeClass::Pooled => &self.pooled,
            SizeClass::Oversized => &self.oversized,
        }
    }
}

/// One leased record slot. Returned to the pool on drop.
#[derive(Debug)]
pub(crate) struct PoolLease {
    pool: Rc<PoolInner>,
    class: SizeClass,
}

impl PoolLease {
    /// Move this lease to `class`, keeping the per-class counts exact.
    pub(crate) fn set_class(&mut self, class: SizeClass) {
        if self.class == class {
            return;
        }
        let from = self.pool.class_counter(self.class);
        from.set(from.get() - 1);
        let to = self.pool.class_counter(class);
        to.set(to.get() + 1);
        if class == SizeClass::Pooled {
            self.pool.rehomed.set(self.pool.rehomed.get() + 1);
        }
        self.class = class;
    }
}

impl Drop for PoolLease {
    fn drop(&mut self) {
        let counter = self.pool.class_counter(self.class);
        counter.set(counter.get() - 1);
        self.pool.live.set(self.pool.live.get() - 1);
    }
}

/// Shared handle to a Frame-Chain pool.
#[derive(Debug, Clone)]
pub struct FramePool {
    inner: Rc<PoolInner>,
}

impl FramePool {
    pub fn new(config: &PoolConfig) -> Self {
        Self::with_capacity(config.max_chains)
    }

    /// Pool handing out at most `max_chains` live records.
    pub fn with_capacity(max_chains: usize) -> Self {
        Self {
            inner: Rc::new(PoolInner {
                capacity: max_chains,
                live: Cell::new(0),
                pooled: Cell::new(0),
                oversized: Cell::new(0),
                rehomed: Cell::new(0),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Records that can still be leased.
    pub fn available(&self) -> usize {
        self.inner.capacity.saturating_sub(self.inner.live.get())
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live: self.inner.live.get(),
            pooled: self.inner.pooled.get(),
            oversized: self.inner.oversized.get(),
            rehomed: self.inner.rehomed.get(),
        }
    }

    /// Allocate an empty chain with room for `span_count` spans.
    ///
    /// # Errors
    ///
    /// - `TooManySpans` if `span_count` exceeds [`MAX_STREAM_SPANS`]
    /// - `PoolExhausted` if every record is leased
    pub fn allocate<'a>(&self, span_count: usize) -> Result<FrameChain<'a>> {
        if span_count > MAX_STREAM_SPANS {
            return Err(Error::TooManySpans {
                count: span_count,
                max: MAX_STREAM_SPANS,
            });
        }
        self.reserve(1)?;
        Ok(self.allocate_reserved(span_count))
    }

    /// Return `chain`'s record to the pool.
    pub fn release(&self, chain: FrameChain<'_>) {
        drop(chain);
    }

    /// Move an oversized chain whose spans now fit inline into a pooled
    /// record. Returns true if the chain was moved.
    pub fn rehome(&self, chain: &mut FrameChain<'_>) -> bool {
        chain.rehome()
    }

    /// Fail unless `n` more records can be leased.
    pub(crate) fn reserve(&self, n: usize) -> Result<()> {
        if self.available() < n {
            tracing::debug!(
                capacity = self.inner.capacity,
                live = self.inner.live.get(),
                requested = n,
                "frame chain pool exhausted"
            );
            return Err(Error::PoolExhausted {
                capacity: self.inner.capacity,
            });
        }
        Ok(())
    }

    /// Allocate after a successful [`reserve`](Self::reserve).
    pub(crate) fn allocate_reserved<'a>(&self, span_count: usize) -> FrameChain<'a> {
        debug_assert!(self.inner.live.get() < self.inner.capacity);

        let class = SizeClass::for_spans(span_count);
        let spans = match class {
            SizeClass::Pooled => TinyVec::Inline(ArrayVec::default()),
            SizeClass::Oversized => TinyVec::Heap(Vec::with_capacity(span_count)),
        };

        self.inner.live.set(self.inner.live.get() + 1);
        let counter = self.inner.class_counter(class);
        counter.set(counter.get() + 1);

        FrameChain::from_parts(
            spans,
            PoolLease {
                pool: Rc::clone(&self.inner),
                class,
            },
        )
    }
}
