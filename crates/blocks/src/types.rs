//! Common types and traits for RFNoC block controllers

use std::fmt;
use std::sync::Arc;

use airlink_types::DeviceError;

/// Kinds of block the emulator knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Radio,
    FirFilter,
    Shiftright,
}

impl BlockKind {
    /// Block name as it appears in block IDs (`0/<name>#0`).
    pub fn block_name(&self) -> &'static str {
        match self {
            BlockKind::Radio => "Radio",
            BlockKind::FirFilter => "FIR",
            BlockKind::Shiftright => "Shiftright",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.block_name())
    }
}

/// Static registration data a block controller hands to the host registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// NoC ID burned into the FPGA image for this block.
    pub noc_id: u32,
    /// Block name used in block IDs.
    pub block_name: &'static str,
    /// Timebase clock key.
    pub timebase_clock: &'static str,
    /// Control clock key.
    pub ctrl_clock: &'static str,
}

/// 32-bit register access to one block's control space.
pub trait RegisterIface: Send + Sync {
    /// Write `value` to the register at `addr`.
    fn poke32(&self, addr: u32, value: u32) -> Result<(), DeviceError>;

    /// Read the register at `addr` back from the device.
    fn peek32(&self, addr: u32) -> Result<u32, DeviceError>;
}

impl<T: RegisterIface + ?Sized> RegisterIface for Arc<T> {
    fn poke32(&self, addr: u32, value: u32) -> Result<(), DeviceError> {
        (**self).poke32(addr, value)
    }

    fn peek32(&self, addr: u32) -> Result<u32, DeviceError> {
        (**self).peek32(addr)
    }
}

/// Control surface of the shiftright block: right shifts the signal by a fixed number of bits.
pub trait ShiftrightControl: Send + Sync {
    /// Set the shiftright bits.
    fn set_shiftright_value(&self, shiftright: u32) -> Result<(), DeviceError>;

    /// Get the current shiftright bits (read from the device).
    fn get_shiftright_value(&self) -> Result<u32, DeviceError>;
}

/// Control surface of the FIR filter block.
pub trait FirFilterControl: Send + Sync {
    /// Load a new set of taps. Fails if the list is empty or longer than
    /// [`FirFilterControl::get_max_num_coefficients`].
    fn set_coefficients(&self, coeffs: &[i16]) -> Result<(), DeviceError>;

    /// Taps currently loaded, in order.
    fn get_coefficients(&self) -> Result<Vec<i16>, DeviceError>;

    /// Number of taps the block was synthesized with.
    fn get_max_num_coefficients(&self) -> usize;
}

/// Streaming behaviour requested from a radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    StartContinuous,
    StopContinuous,
}

/// A stream command issued to a radio channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamCmd {
    pub mode: StreamMode,
    /// Start immediately instead of at `time_spec`.
    pub stream_now: bool,
    /// Device time, in seconds, at which the command takes effect.
    pub time_spec: Option<f64>,
}

impl StreamCmd {
    pub fn start_at(time_spec: f64) -> Self {
        Self {
            mode: StreamMode::StartContinuous,
            stream_now: false,
            time_spec: Some(time_spec),
        }
    }

    pub fn stop_now() -> Self {
        Self {
            mode: StreamMode::StopContinuous,
            stream_now: true,
            time_spec: None,
        }
    }
}

/// Control surface of a radio block. Setters return the value actually applied.
pub trait RadioControl: Send + Sync {
    /// Sample rate of the radio in samples per second.
    fn get_rate(&self) -> f64;

    fn set_rx_frequency(&self, freq: f64, chan: usize) -> Result<f64, DeviceError>;
    fn get_rx_frequency(&self, chan: usize) -> Result<f64, DeviceError>;
    fn set_tx_frequency(&self, freq: f64, chan: usize) -> Result<f64, DeviceError>;
    fn get_tx_frequency(&self, chan: usize) -> Result<f64, DeviceError>;

    fn set_rx_gain(&self, gain: f64, chan: usize) -> Result<f64, DeviceError>;
    fn get_rx_gain(&self, chan: usize) -> Result<f64, DeviceError>;
    fn set_tx_gain(&self, gain: f64, chan: usize) -> Result<f64, DeviceError>;
    fn get_tx_gain(&self, chan: usize) -> Result<f64, DeviceError>;

    fn set_rx_bandwidth(&self, bandwidth: f64, chan: usize) -> Result<f64, DeviceError>;
    fn get_rx_bandwidth(&self, chan: usize) -> Result<f64, DeviceError>;
    fn set_tx_bandwidth(&self, bandwidth: f64, chan: usize) -> Result<f64, DeviceError>;
    fn get_tx_bandwidth(&self, chan: usize) -> Result<f64, DeviceError>;

    fn enable_rx_timestamps(&self, enable: bool, chan: usize) -> Result<(), DeviceError>;
    fn set_rx_dc_offset(&self, enable: bool, chan: usize) -> Result<(), DeviceError>;

    /// Samples per packet (the `spp` property).
    fn set_spp(&self, spp: usize, chan: usize) -> Result<(), DeviceError>;
    fn get_spp(&self, chan: usize) -> Result<usize, DeviceError>;

    fn issue_stream_cmd(&self, cmd: &StreamCmd, chan: usize) -> Result<(), DeviceError>;
}
