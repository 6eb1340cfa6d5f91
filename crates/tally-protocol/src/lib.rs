//! Batch encoding for Tally.
//!
//! A batch travels to the engine as one opaque payload and comes back as one
//! reply payload. The codec keeps the positional correspondence between the
//! two: a decoded result sequence always has exactly one entry per submitted
//! command, or decoding fails with a systemic error.

pub mod codec;
pub mod error;
pub mod reply;

pub use codec::{BatchCodec, HEADER_SIZE, MAX_BATCH_LEN, MAX_MESSAGE_SIZE};
pub use error::{ProtocolError, ProtocolResult};
pub use reply::Reply;
