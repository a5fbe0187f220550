//! Channel configuration types pushed into the FIR and shiftright blocks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// FIR taps loaded at startup: a single full-scale tap passes the signal through.
pub const PASSTHROUGH_COEFF: i16 = 32767;

/// Coefficients and right-shift applied to one emulated link.
///
/// The coefficient list is never empty; use [`ChannelConfig::new`] to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChannelConfig")]
pub struct ChannelConfig {
    coefficients: Vec<i16>,
    shift: u32,
}

/// Unchecked wire form, validated through [`ChannelConfig::new`].
#[derive(Deserialize)]
struct RawChannelConfig {
    coefficients: Vec<i16>,
    shift: u32,
}

impl TryFrom<RawChannelConfig> for ChannelConfig {
    type Error = ConfigError;

    fn try_from(raw: RawChannelConfig) -> Result<Self, Self::Error> {
        Self::new(raw.coefficients, raw.shift)
    }
}

impl ChannelConfig {
    pub fn new(coefficients: Vec<i16>, shift: u32) -> Result<Self, ConfigError> {
        if coefficients.is_empty() {
            return Err(ConfigError::Parse {
                field: "fir".to_string(),
                value: String::new(),
                reason: "at least one coefficient is required".to_string(),
            });
        }
        Ok(Self { coefficients, shift })
    }

    /// The configuration every link starts with.
    pub fn passthrough() -> Self {
        Self {
            coefficients: vec![PASSTHROUGH_COEFF],
            shift: 0,
        }
    }

    pub fn coefficients(&self) -> &[i16] {
        &self.coefficients
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl fmt::Display for ChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shift={} coeffs=[", self.shift)?;
        for (i, c) in self.coefficients.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "]")
    }
}

/// Position of the next scheduled step in a channel script.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Marker {
    /// Elapsed time in seconds at which the next record applies.
    At(f64),
    /// The `eos` sentinel: no further records are consumed.
    EndOfScript,
}

impl Marker {
    /// Elapsed time the loop waits for. The sentinel never arrives.
    pub fn deadline(&self) -> f64 {
        match self {
            Marker::At(t) => *t,
            Marker::EndOfScript => f64::INFINITY,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Marker::EndOfScript)
    }
}

/// One scheduled step of a channel script.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRecord {
    /// Elapsed time in seconds at which this record was scheduled.
    pub timestamp: f64,
    /// One configuration per link, in chain order.
    pub channels: Vec<ChannelConfig>,
    /// Where the script goes after this record.
    pub next: Marker,
}
