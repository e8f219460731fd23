//! # Outgoing Frame Records and Frame Values
//!
//! Vector spans and Frame-Chains carry queued stream data by reference;
//! `types` holds the frame value model consumed by qlog.

pub mod chain;
pub mod span;
pub mod types;

pub use chain::FrameChain;
pub use span::{merge_spans, spans_len, split_spans, Span};
pub use types::*;
