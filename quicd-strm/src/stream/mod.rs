//! # Stream Delivery (RFC 9000 Sections 2-4)
//!
//! Send-side retransmission queue and acknowledgment tracking, receive-side
//! reordering, and the [`Stream`] aggregate tying them together.

pub mod ack;
pub mod queue;
pub mod reorder;
pub mod strm;

pub use ack::AckRangeSet;
pub use queue::StreamFrameQueue;
pub use reorder::{DataRange, ReorderBuffer};
pub use strm::{Direction, Stream};
