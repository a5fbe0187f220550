//! Host-side seam to the RFNoC runtime.
//!
//! The graph engine, block discovery and streaming belong to the host
//! runtime. This crate describes what the emulator needs from it
//! ([`RfnocGraph`]), the block registry custom controllers plug into, and an
//! in-memory host ([`SimGraph`]) that lets the applications run without a USRP.

pub mod args;
pub mod chain;
pub mod graph;
pub mod registry;
#[cfg(feature = "sim")]
pub mod sim;

pub use args::DeviceArgs;
pub use chain::{connect_chain, resolve_link, Endpoint, LinkHandles, LinkSpec};
pub use graph::{Edge, RfnocGraph};
pub use registry::{register_builtin_blocks, BlockFactory, BlockHandle, BlockRegistry};
#[cfg(feature = "sim")]
pub use sim::SimGraph;
