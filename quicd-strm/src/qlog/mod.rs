//! # qlog Frame Tracing
//!
//! Serializes frame values into qlog QUIC event records
//! (draft-ietf-quic-qlog-quic-events). Output is bit-exact: external tooling
//! parses it.
//!
//! [`write_frame`] appends a single record to a caller buffer. [`Qlog`]
//! accumulates records and hands them to a [`QlogSink`] on flush.

pub mod frame;

pub use frame::write_frame;

use bytes::BytesMut;

use crate::error::Result;
use crate::frames::{Frame, FrameChain};
use crate::types::StreamId;

/// Flags passed to a [`QlogSink`] with each write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QlogWriteFlags(u32);

impl QlogWriteFlags {
    pub const NONE: Self = Self(0);

    /// Final write; the trace ends here.
    pub const FIN: Self = Self(0x01);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Destination for serialized qlog data.
pub trait QlogSink {
    fn write(&mut self, flags: QlogWriteFlags, data: &[u8]);
}

impl<F> QlogSink for F
where
    F: FnMut(QlogWriteFlags, &[u8]),
{
    fn write(&mut self, flags: QlogWriteFlags, data: &[u8]) {
        self(flags, data)
    }
}

/// Buffered qlog writer.
#[derive(Debug)]
pub struct Qlog<S: QlogSink> {
    sink: S,
    buf: BytesMut,
}

impl<S: QlogSink> Qlog<S> {
    pub fn new(sink: S) -> Self {
        Self::with_capacity(sink, 4096)
    }

    pub fn with_capacity(sink: S, capacity: usize) -> Self {
        Self {
            sink,
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append the record for `frame`.
    pub fn write_frame(&mut self, frame: &Frame<'_>) -> Result<()> {
        write_frame(&mut self.buf, frame)
    }

    /// Append the STREAM record for a popped chain.
    pub fn write_stream_chain(&mut self, stream_id: StreamId, chain: &FrameChain<'_>) -> Result<()> {
        write_frame(&mut self.buf, &chain.as_stream_frame(stream_id))
    }

    /// Records written since the last flush.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Hand buffered records to the sink.
    pub fn flush(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        self.sink.write(QlogWriteFlags::NONE, &self.buf);
        self.buf.clear();
    }

    /// Flush the remaining records with [`QlogWriteFlags::FIN`] and return
    /// the sink.
    pub fn finish(mut self) -> S {
        self.sink.write(QlogWriteFlags::FIN, &self.buf);
        self.buf.clear();
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::FramePool;
    use crate::frames::Span;

    #[test]
    fn test_flush_and_finish() {
        let mut writes: Vec<(QlogWriteFlags, Vec<u8>)> = Vec::new();
        {
            let mut qlog = Qlog::new(|flags: QlogWriteFlags, data: &[u8]| {
                writes.push((flags, data.to_vec()))
            });
            qlog.flush();
            qlog.write_frame(&Frame::Ping).unwrap();
            assert_eq!(qlog.buffered(), br#"{"frame_type":"ping"},"#);
            qlog.flush();
            assert!(qlog.buffered().is_empty());
            qlog.write_frame(&Frame::HandshakeDone).unwrap();
            qlog.finish();
        }

        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].0, QlogWriteFlags::NONE);
        assert_eq!(writes[0].1, br#"{"frame_type":"ping"},"#);
        assert!(writes[1].0.contains(QlogWriteFlags::FIN));
        assert_eq!(writes[1].1, br#"{"frame_type":"handshake_done"},"#);
    }

    #[test]
    fn test_stream_chain_record() {
        static DATA: [u8; 32] = [0u8; 32];
        let pool = FramePool::with_capacity(1);
        let mut chain = pool.allocate(2).unwrap();
        chain.offset = 100;
        chain.push_span(Span::window(&DATA, 0..10));
        chain.push_span(Span::window(&DATA, 20..25));

        let mut qlog = Qlog::new(|_: QlogWriteFlags, _: &[u8]| {});
        qlog.write_stream_chain(StreamId::new(8), &chain).unwrap();
        assert_eq!(
            qlog.buffered(),
            br#"{"frame_type":"stream","stream_id":8,"offset":100,"length":15},"#
        );
    }
}
