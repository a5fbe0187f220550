//! AirLink channel emulator applications.
//!
//! The binaries in `src/bin` are thin wrappers: they parse the command line
//! into [`EmulatorOptions`](cli::EmulatorOptions) and hand over to
//! [`app::run_emulator`] or [`init_block::probe_shiftright`].

pub mod app;
pub mod cli;
pub mod init_block;
pub mod settings;
pub mod setup;
