//! # QUIC Frame Values (RFC 9000 Section 19, RFC 9221)
//!
//! Decoded frame values as handed to the qlog serializer. Payload-carrying
//! frames (STREAM, CRYPTO, DATAGRAM) reference their data as span lists so a
//! popped Frame-Chain can be traced without copying.

#![forbid(unsafe_code)]

use core::time::Duration;

use super::span::{spans_len, Span};
use crate::types::{ConnectionId, StatelessResetToken, StreamId, Token, VarInt, PATH_CHALLENGE_DATALEN};

/// ACK Frame (RFC 9000 Section 19.3)
#[derive(Debug, Clone)]
pub struct AckFrame {
    /// Largest packet number being acknowledged
    pub largest_ack: VarInt,

    /// ACK Delay after applying the peer's ack_delay_exponent
    pub ack_delay: Duration,

    /// Packets acknowledged below largest_ack
    pub first_ack_range: VarInt,

    /// Additional ACK Ranges, walking downward from the first range
    pub ack_ranges: tinyvec::TinyVec<[AckRange; 8]>,

    /// ECN counts (only present in ACK_ECN frames)
    pub ecn_counts: Option<EcnCounts>,
}

impl AckFrame {
    pub fn new(largest_ack: VarInt, ack_delay: Duration, first_ack_range: VarInt) -> Self {
        Self {
            largest_ack,
            ack_delay,
            first_ack_range,
            ack_ranges: tinyvec::TinyVec::new(),
            ecn_counts: None,
        }
    }

    /// Acknowledged packet number ranges as inclusive `(low, high)` pairs,
    /// largest first.
    ///
    /// Each additional range lies `gap + 2` below the low end of the one
    /// before it (RFC 9000 Section 19.3.1). Malformed input that would
    /// underflow ends the walk.
    pub fn ranges(&self) -> Vec<(u64, u64)> {
        let mut out = Vec::with_capacity(1 + self.ack_ranges.len());

        let high = self.largest_ack;
        let Some(mut low) = high.checked_sub(self.first_ack_range) else {
            return out;
        };
        out.push((low, high));

        for range in self.ack_ranges.iter() {
            let Some(high) = low
                .checked_sub(range.gap)
                .and_then(|v| v.checked_sub(2))
            else {
                break;
            };
            let Some(next_low) = high.checked_sub(range.length) else {
                break;
            };
            out.push((next_low, high));
            low = next_low;
        }

        out
    }
}

/// ACK Range (RFC 9000 Section 19.3.1)
#[derive(Debug, Clone, Copy, Default)]
pub struct AckRange {
    /// Gap before this range (packet numbers NOT acknowledged)
    pub gap: VarInt,

    /// Length of this range (packet numbers acknowledged)
    pub length: VarInt,
}

/// ECN Counts (RFC 9000 Section 19.3.2)
#[derive(Debug, Clone, Copy)]
pub struct EcnCounts {
    /// ECT(0) marked packets received
    pub ect0_count: VarInt,

    /// ECT(1) marked packets received
    pub ect1_count: VarInt,

    /// ECN-CE marked packets received
    pub ce_count: VarInt,
}

/// RESET_STREAM Frame (RFC 9000 Section 19.4)
#[derive(Debug, Clone, Copy)]
pub struct ResetStreamFrame {
    pub stream_id: StreamId,

    /// Application-defined error code
    pub error_code: VarInt,

    /// Final size of the stream in bytes
    pub final_size: VarInt,
}

/// STOP_SENDING Frame (RFC 9000 Section 19.5)
#[derive(Debug, Clone, Copy)]
pub struct StopSendingFrame {
    pub stream_id: StreamId,

    /// Application-defined error code
    pub error_code: VarInt,
}

/// CRYPTO Frame (RFC 9000 Section 19.6)
#[derive(Debug, Clone)]
pub struct CryptoFrame<'a> {
    /// Byte offset in the crypto stream
    pub offset: VarInt,

    pub data: &'a [Span<'a>],
}

impl CryptoFrame<'_> {
    pub fn length(&self) -> usize {
        spans_len(self.data)
    }
}

/// NEW_TOKEN Frame (RFC 9000 Section 19.7)
#[derive(Debug, Clone)]
pub struct NewTokenFrame {
    pub token: Token,
}

/// STREAM Frame (RFC 9000 Section 19.8)
#[derive(Debug, Clone)]
pub struct StreamFrame<'a> {
    pub stream_id: StreamId,

    /// Byte offset in stream
    pub offset: VarInt,

    /// FIN bit: indicates final frame in stream
    pub fin: bool,

    pub data: &'a [Span<'a>],
}

impl StreamFrame<'_> {
    pub fn length(&self) -> usize {
        spans_len(self.data)
    }
}

/// MAX_DATA Frame (RFC 9000 Section 19.9)
#[derive(Debug, Clone, Copy)]
pub struct MaxDataFrame {
    pub maximum_data: VarInt,
}

/// MAX_STREAM_DATA Frame (RFC 9000 Section 19.10)
#[derive(Debug, Clone, Copy)]
pub struct MaxStreamDataFrame {
    pub stream_id: StreamId,
    pub maximum_stream_data: VarInt,
}

/// MAX_STREAMS Frame (RFC 9000 Section 19.11)
#[derive(Debug, Clone, Copy)]
pub struct MaxStreamsFrame {
    pub maximum_streams: VarInt,

    /// True for bidirectional, false for unidirectional
    pub bidirectional: bool,
}

/// DATA_BLOCKED Frame (RFC 9000 Section 19.12)
#[derive(Debug, Clone, Copy)]
pub struct DataBlockedFrame {
    /// Connection data limit at which blocking occurred
    pub data_limit: VarInt,
}

/// STREAM_DATA_BLOCKED Frame (RFC 9000 Section 19.13)
#[derive(Debug, Clone, Copy)]
pub struct StreamDataBlockedFrame {
    pub stream_id: StreamId,

    /// Stream data limit at which blocking occurred
    pub stream_data_limit: VarInt,
}

/// STREAMS_BLOCKED Frame (RFC 9000 Section 19.14)
#[derive(Debug, Clone, Copy)]
pub struct StreamsBlockedFrame {
    pub stream_limit: VarInt,

    /// True for bidirectional, false for unidirectional
    pub bidirectional: bool,
}

/// NEW_CONNECTION_ID Frame (RFC 9000 Section 19.15)
#[derive(Debug, Clone)]
pub struct NewConnectionIdFrame {
    pub sequence_number: VarInt,
    pub retire_prior_to: VarInt,
    pub connection_id: ConnectionId,
    pub stateless_reset_token: StatelessResetToken,
}

/// RETIRE_CONNECTION_ID Frame (RFC 9000 Section 19.16)
#[derive(Debug, Clone, Copy)]
pub struct RetireConnectionIdFrame {
    pub sequence_number: VarInt,
}

/// PATH_CHALLENGE Frame (RFC 9000 Section 19.17)
#[derive(Debug, Clone, Copy)]
pub struct PathChallengeFrame {
    pub data: [u8; PATH_CHALLENGE_DATALEN],
}

/// PATH_RESPONSE Frame (RFC 9000 Section 19.18)
#[derive(Debug, Clone, Copy)]
pub struct PathResponseFrame {
    /// Data copied from PATH_CHALLENGE
    pub data: [u8; PATH_CHALLENGE_DATALEN],
}

/// CONNECTION_CLOSE Frame (RFC 9000 Section 19.19)
#[derive(Debug, Clone, Copy)]
pub struct ConnectionCloseFrame {
    pub error_code: VarInt,

    /// True if application-level close (0x1d), false if QUIC-level (0x1c)
    pub application_close: bool,
}

/// DATAGRAM Frame (RFC 9221 Section 4)
#[derive(Debug, Clone)]
pub struct DatagramFrame<'a> {
    pub data: &'a [Span<'a>],
}

impl DatagramFrame<'_> {
    pub fn length(&self) -> usize {
        spans_len(self.data)
    }
}

/// Unified Frame Type
#[derive(Debug, Clone)]
pub enum Frame<'a> {
    /// PADDING frame (0x00)
    Padding,

    /// PING frame (0x01)
    Ping,

    /// ACK frame (0x02 or 0x03)
    Ack(AckFrame),

    /// RESET_STREAM frame (0x04)
    ResetStream(ResetStreamFrame),

    /// STOP_SENDING frame (0x05)
    StopSending(StopSendingFrame),

    /// CRYPTO frame (0x06)
    Crypto(CryptoFrame<'a>),

    /// NEW_TOKEN frame (0x07)
    NewToken(NewTokenFrame),

    /// STREAM frame (0x08-0x0f)
    Stream(StreamFrame<'a>),

    /// MAX_DATA frame (0x10)
    MaxData(MaxDataFrame),

    /// MAX_STREAM_DATA frame (0x11)
    MaxStreamData(MaxStreamDataFrame),

    /// MAX_STREAMS frame (0x12 or 0x13)
    MaxStreams(MaxStreamsFrame),

    /// DATA_BLOCKED frame (0x14)
    DataBlocked(DataBlockedFrame),

    /// STREAM_DATA_BLOCKED frame (0x15)
    StreamDataBlocked(StreamDataBlockedFrame),

    /// STREAMS_BLOCKED frame (0x16 or 0x17)
    StreamsBlocked(StreamsBlockedFrame),

    /// NEW_CONNECTION_ID frame (0x18)
    NewConnectionId(NewConnectionIdFrame),

    /// RETIRE_CONNECTION_ID frame (0x19)
    RetireConnectionId(RetireConnectionIdFrame),

    /// PATH_CHALLENGE frame (0x1a)
    PathChallenge(PathChallengeFrame),

    /// PATH_RESPONSE frame (0x1b)
    PathResponse(PathResponseFrame),

    /// CONNECTION_CLOSE frame (0x1c or 0x1d)
    ConnectionClose(ConnectionCloseFrame),

    /// HANDSHAKE_DONE frame (0x1e)
    HandshakeDone,

    /// DATAGRAM frame (0x30 or 0x31)
    Datagram(DatagramFrame<'a>),
}

impl Frame<'_> {
    /// Returns true if this frame is ACK-eliciting (RFC 9000 Section 13.2)
    pub fn is_ack_eliciting(&self) -> bool {
        !matches!(
            self,
            Frame::Padding | Frame::Ack(_) | Frame::ConnectionClose(_)
        )
    }
}
