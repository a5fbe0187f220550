//! Error types for configuration sources, devices and the RFNoC host.

use thiserror::Error;

/// Errors raised while reading channel configuration files or scripts.
///
/// None of these are fatal to the process; the reload loop keeps the last
/// applied configuration and carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("could not open the config at '{path}'")]
    Missing { path: String },

    #[error("malformed {field} field '{value}': {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("reached end of script")]
    EndOfScript,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

/// Errors raised by block controllers while talking to hardware.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("communication with {block} failed: {message}")]
    Communication { block: String, message: String },

    #[error("invalid argument for {block}: {message}")]
    InvalidArgument { block: String, message: String },
}

/// Errors raised while discovering, wiring or committing the RFNoC graph.
///
/// These are fatal at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("invalid block ID '{0}'")]
    InvalidBlockId(String),

    #[error("invalid device args '{0}'")]
    InvalidArgs(String),

    #[error("no devices found for args '{0}'")]
    NoDevice(String),

    #[error("block not found: {0}")]
    BlockNotFound(String),

    #[error("block {id} is a {actual} block, expected {expected}")]
    WrongBlockType {
        id: String,
        expected: String,
        actual: String,
    },

    #[error("cannot connect {src} -> {dst}: {message}")]
    Connect {
        src: String,
        dst: String,
        message: String,
    },

    #[error("block registry error: {0}")]
    Registry(String),

    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}
