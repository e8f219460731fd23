//! Frame-to-qlog record mapping.
//!
//! Each frame becomes one compact JSON object tagged with `frame_type`,
//! followed by a literal comma. Field order and naming follow the qlog QUIC
//! event schema; opaque bytes render as lowercase hex.

use bytes::{BufMut, BytesMut};
use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;

use crate::error::Result;
use crate::frames::Frame;

/// Append the qlog record for `frame` to `buf`.
pub fn write_frame(buf: &mut BytesMut, frame: &Frame<'_>) -> Result<()> {
    let record = FrameRecord::from(frame);
    serde_json::to_writer(BufMut::writer(&mut *buf), &record)?;
    buf.put_u8(b',');
    Ok(())
}

/// Inclusive acknowledged range; printed as `[n]` when both ends agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AckedRange {
    low: u64,
    high: u64,
}

impl Serialize for AckedRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.low == self.high {
            let mut seq = serializer.serialize_seq(Some(1))?;
            seq.serialize_element(&self.low)?;
            seq.end()
        } else {
            let mut seq = serializer.serialize_seq(Some(2))?;
            seq.serialize_element(&self.low)?;
            seq.serialize_element(&self.high)?;
            seq.end()
        }
    }
}

#[derive(Debug, Serialize)]
struct HexData {
    data: String,
}

impl HexData {
    fn new(bytes: &[u8]) -> Self {
        Self {
            data: hex::encode(bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum StreamKind {
    Bidirectional,
    Unidirectional,
}

impl StreamKind {
    fn from_bidi(bidirectional: bool) -> Self {
        if bidirectional {
            StreamKind::Bidirectional
        } else {
            StreamKind::Unidirectional
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum ErrorSpace {
    Transport,
    Application,
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Serialize)]
#[serde(tag = "frame_type", rename_all = "snake_case")]
enum FrameRecord {
    Padding,
    Ping,
    Ack {
        ack_delay: u64,
        acked_ranges: Vec<AckedRange>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ect1: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ect0: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ce: Option<u64>,
    },
    ResetStream {
        stream_id: u64,
        error_code: u64,
        final_size: u64,
    },
    StopSending {
        stream_id: u64,
        error_code: u64,
    },
    Crypto {
        offset: u64,
        length: usize,
    },
    NewToken {
        length: usize,
        token: HexData,
    },
    Stream {
        stream_id: u64,
        offset: u64,
        length: usize,
        #[serde(skip_serializing_if = "is_false")]
        fin: bool,
    },
    MaxData {
        maximum: u64,
    },
    MaxStreamData {
        stream_id: u64,
        maximum: u64,
    },
    MaxStreams {
        stream_type: StreamKind,
        maximum: u64,
    },
    DataBlocked {
        limit: u64,
    },
    StreamDataBlocked {
        stream_id: u64,
        limit: u64,
    },
    StreamsBlocked {
        stream_type: StreamKind,
        limit: u64,
    },
    NewConnectionId {
        sequence_number: u64,
        retire_prior_to: u64,
        connection_id_length: usize,
        connection_id: String,
        stateless_reset_token: HexData,
    },
    RetireConnectionId {
        sequence_number: u64,
    },
    PathChallenge {
        data: String,
    },
    PathResponse {
        data: String,
    },
    ConnectionClose {
        error_space: ErrorSpace,
        error_code: u64,
        raw_error_code: u64,
    },
    HandshakeDone,
    Datagram {
        length: usize,
    },
}

impl From<&Frame<'_>> for FrameRecord {
    fn from(frame: &Frame<'_>) -> Self {
        match frame {
            Frame::Padding => FrameRecord::Padding,
            Frame::Ping => FrameRecord::Ping,
            Frame::Ack(ack) => {
                let acked_ranges = ack
                    .ranges()
                    .into_iter()
                    .map(|(low, high)| AckedRange { low, high })
                    .collect();
                let ecn = ack.ecn_counts;
                FrameRecord::Ack {
                    ack_delay: u64::try_from(ack.ack_delay.as_millis()).unwrap_or(u64::MAX),
                    acked_ranges,
                    ect1: ecn.map(|e| e.ect1_count),
                    ect0: ecn.map(|e| e.ect0_count),
                    ce: ecn.map(|e| e.ce_count),
                }
            }
            Frame::ResetStream(f) => FrameRecord::ResetStream {
                stream_id: f.stream_id.value(),
                error_code: f.error_code,
                final_size: f.final_size,
            },
            Frame::StopSending(f) => FrameRecord::StopSending {
                stream_id: f.stream_id.value(),
                error_code: f.error_code,
            },
            Frame::Crypto(f) => FrameRecord::Crypto {
                offset: f.offset,
                length: f.length(),
            },
            Frame::NewToken(f) => FrameRecord::NewToken {
                length: f.token.len(),
                token: HexData::new(f.token.as_bytes()),
            },
            Frame::Stream(f) => FrameRecord::Stream {
                stream_id: f.stream_id.value(),
                offset: f.offset,
                length: f.length(),
                fin: f.fin,
            },
            Frame::MaxData(f) => FrameRecord::MaxData {
                maximum: f.maximum_data,
            },
            Frame::MaxStreamData(f) => FrameRecord::MaxStreamData {
                stream_id: f.stream_id.value(),
                maximum: f.maximum_stream_data,
            },
            Frame::MaxStreams(f) => FrameRecord::MaxStreams {
                stream_type: StreamKind::from_bidi(f.bidirectional),
                maximum: f.maximum_streams,
            },
            Frame::DataBlocked(f) => FrameRecord::DataBlocked {
                limit: f.data_limit,
            },
            Frame::StreamDataBlocked(f) => FrameRecord::StreamDataBlocked {
                stream_id: f.stream_id.value(),
                limit: f.stream_data_limit,
            },
            Frame::StreamsBlocked(f) => FrameRecord::StreamsBlocked {
                stream_type: StreamKind::from_bidi(f.bidirectional),
                limit: f.stream_limit,
            },
            Frame::NewConnectionId(f) => FrameRecord::NewConnectionId {
                sequence_number: f.sequence_number,
                retire_prior_to: f.retire_prior_to,
                connection_id_length: f.connection_id.len(),
                connection_id: hex::encode(f.connection_id.as_bytes()),
                stateless_reset_token: HexData::new(&f.stateless_reset_token),
            },
            Frame::RetireConnectionId(f) => FrameRecord::RetireConnectionId {
                sequence_number: f.sequence_number,
            },
            Frame::PathChallenge(f) => FrameRecord::PathChallenge {
                data: hex::encode(f.data),
            },
            Frame::PathResponse(f) => FrameRecord::PathResponse {
                data: hex::encode(f.data),
            },
            Frame::ConnectionClose(f) => FrameRecord::ConnectionClose {
                error_space: if f.application_close {
                    ErrorSpace::Application
                } else {
                    ErrorSpace::Transport
                },
                error_code: f.error_code,
                raw_error_code: f.error_code,
            },
            Frame::HandshakeDone => FrameRecord::HandshakeDone,
            Frame::Datagram(f) => FrameRecord::Datagram { length: f.length() },
        }
    }
}
