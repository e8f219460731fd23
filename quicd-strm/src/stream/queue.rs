//! # Outgoing Frame Queue
//!
//! Offset-ordered index of the Frame-Chains a stream still has to send or
//! resend. Push is a plain keyed insert; all merging and splitting happens
//! in [`StreamFrameQueue::pop`], which builds exactly one frame for the
//! packet under construction.
//!
//! ## Pop
//!
//! ```text
//! queue:  [0 ...... 128)[128 ........ 272)[272 ... 400)
//! acked:       [12)
//! pop(140):       [12 ............ 152)
//! queue:                            [152 .. 272)[272 ... 400)
//! ```
//!
//! 1. Chains fully covered by the ack set are dropped from the front. The
//!    head's first unacknowledged run starts after its acknowledged prefix
//!    and ends at the next acknowledged range.
//! 2. A run larger than the budget is split only when the budget reaches
//!    the configured minimum split length; otherwise nothing is popped and
//!    the head goes back untouched. A shorter run is cut from the rest of
//!    the head.
//! 3. Following chains are merged while the first unacknowledged byte in
//!    the queue is exactly where the accumulated data ends. Physically
//!    adjacent spans coalesce. A partly merged chain goes back into the
//!    queue at its new offset.
//! 4. A bare FIN chain right after the accumulated data sets the result FIN.
//!
//! Chains left in the queue that shrank to the inline span threshold are
//! re-homed into pooled records.
//!
//! ## Failure Atomicity
//!
//! Every decision is taken on the untouched head. The only record a pop can
//! need is the one for the remainder of a head cut at the budget or at an
//! acknowledged range; merged chains are consumed in place and never cut.
//! That record is reserved before the head is trimmed, so pool exhaustion
//! puts the head back as it was. Fully acknowledged chains released on the
//! way stay released.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::ops::Range;

use tracing::trace;

use super::ack::AckRangeSet;
use crate::config::StreamConfig;
use crate::error::Result;
use crate::frames::FrameChain;
use crate::pool::FramePool;

/// Pending outgoing data of one stream, keyed by starting offset.
#[derive(Debug)]
pub struct StreamFrameQueue<'a> {
    frames: BTreeMap<u64, FrameChain<'a>>,
    pool: FramePool,
    min_split_len: usize,
    max_span_count: usize,
}

impl<'a> StreamFrameQueue<'a> {
    pub fn new(config: &StreamConfig, pool: FramePool) -> Self {
        Self {
            frames: BTreeMap::new(),
            pool,
            min_split_len: config.min_split_len,
            max_span_count: config.max_span_count,
        }
    }

    pub fn pool(&self) -> &FramePool {
        &self.pool
    }

    /// Number of enqueued chains.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Chain with the lowest offset.
    pub fn first(&self) -> Option<&FrameChain<'a>> {
        self.frames.values().next()
    }

    /// Enqueued chains in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &FrameChain<'a>> + '_ {
        self.frames.values()
    }

    /// Release every enqueued chain.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Enqueue `chain` at its starting offset.
    ///
    /// The caller guarantees it does not overlap any enqueued chain. A chain
    /// with neither payload nor FIN is released immediately.
    pub fn push(&mut self, chain: FrameChain<'a>) {
        if chain.is_empty() && !chain.fin {
            return;
        }
        debug_assert!(
            self.frames
                .range(..=chain.offset)
                .next_back()
                .map_or(true, |(_, prev)| prev.offset != chain.offset
                    && prev.end() <= chain.offset),
            "chain at {} overlaps queued data",
            chain.offset
        );
        debug_assert!(
            self.frames
                .range(chain.offset + 1..)
                .next()
                .map_or(true, |(&next, _)| chain.end() <= next),
            "chain at {} overlaps queued data",
            chain.offset
        );
        self.insert(chain);
    }

    /// Pop one frame carrying at most `left` payload bytes that are not yet
    /// acknowledged.
    ///
    /// Returns `Ok(None)` if nothing can be sent within the budget.
    ///
    /// # Errors
    ///
    /// `PoolExhausted` if the pool has no record left for the remainder of a
    /// cut head. Pending data in the queue is left unchanged.
    pub fn pop(&mut self, acks: &AckRangeSet, left: usize) -> Result<Option<FrameChain<'a>>> {
        let Some((mut head, run)) = self.pop_pending(acks) else {
            return Ok(None);
        };

        let datalen = (run.end - run.start) as usize;

        if datalen > 0 && left == 0 {
            self.insert(head);
            return Ok(None);
        }

        if datalen > left && left < self.min_split_len {
            trace!(
                offset = run.start,
                datalen,
                left,
                min_split_len = self.min_split_len,
                "budget too small to split head"
            );
            self.insert(head);
            return Ok(None);
        }

        // Cut at the budget, else at the next acknowledged range.
        let cut = if datalen > left {
            Some(left)
        } else if run.end < head.end() {
            Some(datalen)
        } else {
            None
        };

        if cut.is_some() {
            if let Err(err) = self.pool.reserve(1) {
                self.insert(head);
                return Err(err);
            }
        }

        Self::trim_acked(&mut head, &run);

        if let Some(at) = cut {
            let mut rest = self.pool.allocate_reserved(head.tail_span_count(at));
            head.split_into(at, &mut rest);
            trace!(
                offset = head.offset,
                len = at,
                rest_offset = rest.offset,
                rest_spans = rest.span_count(),
                "cut head"
            );
            self.insert(rest);
            head.rehome();
            return Ok(Some(head));
        }

        let mut left = left - datalen;

        while !head.fin && !self.frames.is_empty() {
            if self.unacked_offset(acks) != Some(head.end()) {
                break;
            }

            let Some((mut next, run)) = self.pop_pending(acks) else {
                break;
            };

            if run.is_empty() {
                // Only the FIN of `next` is pending.
                head.fin = true;
                break;
            }

            if left == 0 {
                self.insert(next);
                break;
            }

            Self::trim_acked(&mut next, &run);

            let runlen = (run.end - run.start) as usize;
            let merged = head.merge_from(&mut next, left.min(runlen), self.max_span_count);
            if merged == 0 {
                self.insert(next);
                break;
            }
            left -= merged;

            trace!(
                offset = head.offset,
                merged,
                spans = head.span_count(),
                "merged following chain"
            );

            if next.is_empty() {
                head.fin = next.fin;
                continue;
            }

            next.offset += merged as u64;
            self.insert(next);
            break;
        }

        head.rehome();
        Ok(Some(head))
    }

    /// First byte of enqueued data that still needs sending, or the FIN
    /// position if only an unacknowledged FIN remains queued.
    ///
    /// `None` when nothing queued is pending.
    pub fn unacked_offset(&self, acks: &AckRangeSet) -> Option<u64> {
        for chain in self.frames.values() {
            let offset = chain.offset;
            let end = chain.end();

            if offset < end {
                let gap = acks.gap_after(offset);
                if gap.start <= offset {
                    return Some(offset);
                }
                if gap.start < end {
                    return Some(gap.start);
                }
            }

            if chain.fin && !acks.fin_acked() {
                return Some(end);
            }
        }

        None
    }

    /// Remove the first chain that still has something to send, together
    /// with its first unacknowledged run of bytes.
    ///
    /// The chain comes back untouched. The run is empty when only its FIN is
    /// pending. Fully acknowledged chains in front of it are released.
    fn pop_pending(&mut self, acks: &AckRangeSet) -> Option<(FrameChain<'a>, Range<u64>)> {
        while let Some((_, chain)) = self.frames.pop_first() {
            let end = chain.end();
            let gap = acks.gap_after(chain.offset);
            let begin = gap.start.max(chain.offset);

            if begin >= end {
                if chain.fin && !acks.fin_acked() {
                    return Some((chain, end..end));
                }
                trace!(offset = chain.offset, end, "dropping acknowledged chain");
                continue;
            }

            return Some((chain, begin..gap.end.min(end)));
        }

        None
    }

    /// Drop the bytes of `chain` in front of `run`.
    fn trim_acked(chain: &mut FrameChain<'a>, run: &Range<u64>) {
        if run.start >= chain.end() {
            chain.clear_data();
        } else if run.start > chain.offset {
            trace!(
                offset = chain.offset,
                acked = run.start - chain.offset,
                "trimming acknowledged prefix"
            );
            chain.advance((run.start - chain.offset) as usize);
        }
    }

    fn insert(&mut self, mut chain: FrameChain<'a>) {
        if chain.rehome() {
            trace!(offset = chain.offset, spans = chain.span_count(), "re-homed chain");
        }
        let prev = self.frames.insert(chain.offset, chain);
        debug_assert!(prev.is_none(), "two queued chains share an offset");
    }
}
