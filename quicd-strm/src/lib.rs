//! quicd-strm: QUIC Per-Stream Reliable Delivery
//!
//! Tracks outgoing stream bytes awaiting (re)transmission, merges and splits
//! them to fit packet budgets, tracks which byte ranges the peer has
//! acknowledged, and buffers out-of-order inbound bytes until they are
//! contiguous (RFC 9000 Sections 2-4, 13.3).
//!
//! # Architecture
//!
//! - **Zero-copy send path**: Frame-Chains borrow caller-owned send buffers;
//!   payload bytes are never copied on push, merge or split
//! - **Merge on pop**: push is a keyed insert, all coalescing happens when a
//!   packet is built
//! - **Bounded records**: Frame-Chains are leased from an injected pool;
//!   exhaustion is reported, never silently absorbed
//! - **Single-threaded**: one connection-processing loop drives a stream, no
//!   locks, no background tasks
//!
//! # Module Organization
//!
//! - `pool`: Frame-Chain Pool
//! - `frames`: Vector spans, Frame-Chains and frame values
//! - `stream`: Ack ranges, outgoing frame queue, reorder buffer, `Stream`
//! - `qlog`: frame trace records
//! - `config` / `telemetry`: configuration loading and logging setup
//!
//! # Example
//!
//! ```
//! use quicd_strm::{FramePool, Span, Stream, StreamConfig, StreamId};
//!
//! let data = vec![0u8; 1000];
//! let pool = FramePool::with_capacity(64);
//! let mut strm = Stream::new(StreamId::new(0), &StreamConfig::default(), pool.clone());
//!
//! let mut chain = pool.allocate(1).unwrap();
//! chain.push_span(Span::window(&data, 0..data.len()));
//! chain.fin = true;
//! strm.push_frame(chain);
//!
//! let frame = strm.pop_frame(600).unwrap().unwrap();
//! assert_eq!((frame.offset, frame.len()), (0, 600));
//!
//! strm.ack_data(0, 600);
//! assert_eq!(strm.unacked_offset(), Some(600));
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod frames;
pub mod pool;
pub mod qlog;
pub mod stream;
pub mod telemetry;
pub mod types;

// Re-export key types
pub use config::{EngineConfig, PoolConfig, StreamConfig};
pub use error::{Error, Result, TransportError};
pub use frames::{Frame, FrameChain, Span};
pub use pool::{FramePool, PoolStats, CHAIN_INLINE_SPANS, MAX_STREAM_SPANS};
pub use qlog::{Qlog, QlogSink, QlogWriteFlags};
pub use stream::{AckRangeSet, Direction, ReorderBuffer, Stream, StreamFrameQueue};
pub use types::{ConnectionId, StreamId, Token};
