//! Shared types for the AirLink channel emulator
//!
//! This crate contains the channel configuration model, block identifiers and
//! the error taxonomy used by the block controllers, the RFNoC host seam and
//! the channel-control loop.

pub mod block_id;
pub mod channel;
pub mod error;

// Re-export commonly used types
pub use block_id::*;
pub use channel::*;
pub use error::*;
