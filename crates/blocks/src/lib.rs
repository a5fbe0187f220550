pub mod types;
pub mod shiftright;
#[cfg(feature = "sim")]
pub mod sim;

// Re-export the main types that users need
pub use types::{
    BlockDescriptor, BlockKind, FirFilterControl, RadioControl, RegisterIface, ShiftrightControl,
    StreamCmd, StreamMode,
};
pub use shiftright::driver::ShiftrightBlockControl;
