//! Channel control: reads FIR and shiftright settings from CSV files and keeps
//! the emulated links in step with them.

pub mod applier;
pub mod reload;
pub mod source;

pub use applier::{apply, read_back, ChannelHandles};
pub use reload::{Cadence, Pacer, ReloadLoop, ThreadPacer, TickOutcome};
pub use source::{ManualSource, ScriptSource, EOS};
