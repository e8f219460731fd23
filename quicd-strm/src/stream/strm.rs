//! # Stream
//!
//! Per-stream delivery state the connection layer drives:
//!
//! - **tx**: outgoing frame queue, acknowledged ranges, FIN position
//! - **rx**: contiguous watermark and a lazily created reorder buffer
//!
//! The two directions are torn down independently. The reorder buffer only
//! exists once out-of-order data has arrived, and discarding it never moves
//! the watermark, so flow-control accounting stays exact after a reset.

#![forbid(unsafe_code)]

use bytes::Bytes;
use tracing::{debug, trace};

use super::ack::AckRangeSet;
use super::queue::StreamFrameQueue;
use super::reorder::ReorderBuffer;
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::frames::FrameChain;
use crate::pool::FramePool;
use crate::types::StreamId;

/// Stream direction, for shutdown bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Receiving side
    Read,
    /// Sending side
    Write,
}

#[derive(Debug)]
struct TxState<'a> {
    queue: StreamFrameQueue<'a>,
    acks: AckRangeSet,
    /// One past the highest byte ever pushed
    offset: u64,
    fin_offset: Option<u64>,
}

#[derive(Debug, Default)]
struct RxState {
    rob: Option<ReorderBuffer>,
    /// Contiguous delivery watermark
    offset: u64,
    final_size: Option<u64>,
}

/// One QUIC stream's reliable-delivery state.
#[derive(Debug)]
pub struct Stream<'a> {
    stream_id: StreamId,
    tx: TxState<'a>,
    rx: RxState,
    shut_read: bool,
    shut_write: bool,
    app_error_code: Option<u64>,
}

impl<'a> Stream<'a> {
    pub fn new(stream_id: StreamId, config: &StreamConfig, pool: FramePool) -> Self {
        trace!(
            stream_id = %stream_id,
            stream_type = ?stream_id.stream_type(),
            "stream created"
        );
        Self {
            stream_id,
            tx: TxState {
                queue: StreamFrameQueue::new(config, pool),
                acks: AckRangeSet::new(),
                offset: 0,
                fin_offset: None,
            },
            rx: RxState::default(),
            shut_read: false,
            shut_write: false,
            app_error_code: None,
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    // ------------------------------------------------------------------------
    // Send side
    // ------------------------------------------------------------------------

    /// Queue data for (re)transmission.
    pub fn push_frame(&mut self, chain: FrameChain<'a>) {
        self.tx.offset = self.tx.offset.max(chain.end());
        if chain.fin {
            self.tx.fin_offset = Some(chain.end());
        }
        self.tx.queue.push(chain);
    }

    /// Pop one frame of at most `budget` payload bytes.
    pub fn pop_frame(&mut self, budget: usize) -> Result<Option<FrameChain<'a>>> {
        let frame = self.tx.queue.pop(&self.tx.acks, budget)?;
        if let Some(f) = &frame {
            trace!(
                stream_id = %self.stream_id,
                offset = f.offset,
                len = f.len(),
                fin = f.fin,
                "popped stream frame"
            );
        }
        Ok(frame)
    }

    /// Record `[offset, offset + len)` as acknowledged by the peer.
    pub fn ack_data(&mut self, offset: u64, len: u64) {
        self.tx.acks.record(offset, len);
    }

    /// Record the FIN as acknowledged by the peer.
    pub fn ack_fin(&mut self) {
        self.tx.acks.mark_fin_acked();
    }

    pub fn acks(&self) -> &AckRangeSet {
        &self.tx.acks
    }

    pub fn tx_queue(&self) -> &StreamFrameQueue<'a> {
        &self.tx.queue
    }

    /// Earliest offset that still needs (re)transmission.
    ///
    /// With nothing pending in the queue this is the FIN position while the
    /// FIN is unacknowledged, and `None` otherwise.
    pub fn unacked_offset(&self) -> Option<u64> {
        self.tx.queue.unacked_offset(&self.tx.acks).or(match self.tx.fin_offset {
            Some(fin_offset) if !self.tx.acks.fin_acked() => Some(fin_offset),
            _ => None,
        })
    }

    /// Length of the acknowledged prefix of the stream.
    pub fn acked_offset(&self) -> u64 {
        self.tx.acks.acked_offset()
    }

    /// True once every byte ever pushed is acknowledged.
    pub fn is_all_tx_data_acked(&self) -> bool {
        self.tx.acks.acked_offset() >= self.tx.offset
    }

    /// True once every byte and the FIN are acknowledged.
    pub fn is_all_tx_data_fin_acked(&self) -> bool {
        self.tx.acks.fin_acked() && self.is_all_tx_data_acked()
    }

    /// Release every queued chain, as on stream abandonment.
    pub fn clear_tx_queue(&mut self) {
        if !self.tx.queue.is_empty() {
            debug!(
                stream_id = %self.stream_id,
                chains = self.tx.queue.len(),
                "clearing tx queue"
            );
        }
        self.tx.queue.clear();
    }

    /// One past the highest byte ever pushed.
    pub fn tx_offset(&self) -> u64 {
        self.tx.offset
    }

    pub fn fin_offset(&self) -> Option<u64> {
        self.tx.fin_offset
    }

    // ------------------------------------------------------------------------
    // Receive side
    // ------------------------------------------------------------------------

    /// Advance the watermark past data consumed in order.
    pub fn update_rx_offset(&mut self, offset: u64) {
        debug_assert!(offset >= self.rx.offset, "rx watermark moved backwards");
        self.rx.offset = offset;
        if let Some(rob) = &mut self.rx.rob {
            rob.advance_to(offset);
        }
    }

    /// Buffer data that arrived ahead of the watermark.
    ///
    /// # Errors
    ///
    /// `FinalSize` if the data extends past a known final size.
    pub fn recv_reordering(&mut self, data: &[u8], offset: u64) -> Result<()> {
        let end = offset + data.len() as u64;
        if let Some(final_size) = self.rx.final_size {
            if end > final_size {
                return Err(Error::FinalSize { end, final_size });
            }
        }

        let rx_offset = self.rx.offset;
        let stored = self
            .rx
            .rob
            .get_or_insert_with(ReorderBuffer::new)
            .insert(rx_offset, offset, data);

        trace!(
            stream_id = %self.stream_id,
            offset,
            len = data.len(),
            stored,
            rx_offset,
            "buffered out-of-order data"
        );
        Ok(())
    }

    /// Hand out buffered data that is now contiguous with the watermark and
    /// advance the watermark past it.
    pub fn read_ready(&mut self) -> Vec<Bytes> {
        let mut out = Vec::new();
        if let Some(rob) = &mut self.rx.rob {
            while let Some(chunk) = rob.pop_ready(self.rx.offset) {
                self.rx.offset += chunk.len() as u64;
                out.push(chunk);
            }
        }
        out
    }

    /// Drop all buffered out-of-order data. The watermark is kept.
    pub fn discard_reordered_data(&mut self) {
        if let Some(rob) = self.rx.rob.take() {
            debug!(
                stream_id = %self.stream_id,
                buffered = rob.buffered_len(),
                rx_offset = self.rx.offset,
                "discarding reordered data"
            );
        }
    }

    /// Contiguous delivery watermark.
    pub fn rx_offset(&self) -> u64 {
        self.rx.offset
    }

    pub fn has_reorder_buffer(&self) -> bool {
        self.rx.rob.is_some()
    }

    pub fn reorder_buffer(&self) -> Option<&ReorderBuffer> {
        self.rx.rob.as_ref()
    }

    /// Record the peer's final size (RFC 9000 Section 4.5).
    ///
    /// # Errors
    ///
    /// `FinalSize` if it contradicts an earlier final size or data already
    /// received beyond it.
    pub fn set_final_size(&mut self, final_size: u64) -> Result<()> {
        if let Some(known) = self.rx.final_size {
            if known != final_size {
                return Err(Error::FinalSize {
                    end: known,
                    final_size,
                });
            }
            return Ok(());
        }

        let received = self.highest_received();
        if received > final_size {
            return Err(Error::FinalSize {
                end: received,
                final_size,
            });
        }

        self.rx.final_size = Some(final_size);
        Ok(())
    }

    pub fn final_size(&self) -> Option<u64> {
        self.rx.final_size
    }

    fn highest_received(&self) -> u64 {
        let buffered = self
            .rx
            .rob
            .as_ref()
            .and_then(|rob| rob.ranges().last().map(|r| r.end()))
            .unwrap_or(0);
        self.rx.offset.max(buffered)
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    pub fn shutdown(&mut self, direction: Direction) {
        match direction {
            Direction::Read => self.shut_read = true,
            Direction::Write => self.shut_write = true,
        }
    }

    pub fn is_shut(&self, direction: Direction) -> bool {
        match direction {
            Direction::Read => self.shut_read,
            Direction::Write => self.shut_write,
        }
    }

    /// Record the application error code. The first code set wins.
    pub fn set_app_error_code(&mut self, code: u64) {
        if self.app_error_code.is_none() {
            self.app_error_code = Some(code);
        }
    }

    pub fn app_error_code(&self) -> Option<u64> {
        self.app_error_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Span;

    static DATA: [u8; 256] = [0u8; 256];

    fn stream() -> (Stream<'static>, FramePool) {
        let pool = FramePool::with_capacity(16);
        (
            Stream::new(StreamId::new(4), &StreamConfig::default(), pool.clone()),
            pool,
        )
    }

    fn push(strm: &mut Stream<'static>, pool: &FramePool, offset: u64, len: usize, fin: bool) {
        let mut c = pool.allocate(1).unwrap();
        c.offset = offset;
        c.fin = fin;
        c.push_span(Span::window(&DATA, 0..len));
        strm.push_frame(c);
    }

    #[test]
    fn test_tx_offsets_track_pushes() {
        let (mut strm, pool) = stream();
        push(&mut strm, &pool, 0, 100, false);
        push(&mut strm, &pool, 100, 20, true);
        assert_eq!(strm.tx_offset(), 120);
        assert_eq!(strm.fin_offset(), Some(120));
        assert_eq!(strm.unacked_offset(), Some(0));
    }

    #[test]
    fn test_unacked_offset_falls_back_to_fin() {
        let (mut strm, pool) = stream();
        push(&mut strm, &pool, 0, 50, true);

        let f = strm.pop_frame(1000).unwrap().unwrap();
        assert!(f.fin);
        drop(f);
        assert!(strm.tx_queue().is_empty());

        strm.ack_data(0, 50);
        assert!(strm.is_all_tx_data_acked());
        assert!(!strm.is_all_tx_data_fin_acked());
        assert_eq!(strm.unacked_offset(), Some(50));

        strm.ack_fin();
        assert!(strm.is_all_tx_data_fin_acked());
        assert_eq!(strm.unacked_offset(), None);
    }

    #[test]
    fn test_read_ready_advances_watermark() {
        let (mut strm, _pool) = stream();
        strm.recv_reordering(b"world", 5).unwrap();
        assert!(strm.read_ready().is_empty());

        strm.recv_reordering(b"hello", 0).unwrap();
        let ready = strm.read_ready();
        assert_eq!(ready.concat(), b"helloworld");
        assert_eq!(strm.rx_offset(), 10);
    }

    #[test]
    fn test_final_size_rules() {
        let (mut strm, _pool) = stream();
        strm.recv_reordering(b"abcdef", 10).unwrap();
        assert!(matches!(
            strm.set_final_size(12),
            Err(Error::FinalSize { end: 16, final_size: 12 })
        ));

        strm.set_final_size(20).unwrap();
        assert!(strm.set_final_size(20).is_ok());
        assert!(strm.set_final_size(21).is_err());
        assert!(matches!(
            strm.recv_reordering(b"xyz", 18),
            Err(Error::FinalSize { end: 21, final_size: 20 })
        ));
        assert_eq!(strm.final_size(), Some(20));
    }

    #[test]
    fn test_clear_tx_queue_releases_chains() {
        let (mut strm, pool) = stream();
        push(&mut strm, &pool, 0, 10, false);
        push(&mut strm, &pool, 10, 10, false);
        strm.clear_tx_queue();
        assert!(strm.tx_queue().is_empty());
        assert_eq!(pool.stats().live, 0);
    }

    #[test]
    fn test_lifecycle_flags() {
        let (mut strm, _pool) = stream();
        assert!(!strm.is_shut(Direction::Read));
        strm.shutdown(Direction::Write);
        assert!(strm.is_shut(Direction::Write));
        assert!(!strm.is_shut(Direction::Read));

        strm.set_app_error_code(7);
        strm.set_app_error_code(9);
        assert_eq!(strm.app_error_code(), Some(7));
    }
}
