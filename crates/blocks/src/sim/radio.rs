use std::sync::{Mutex, MutexGuard};

use airlink_types::{BlockId, DeviceError};
use log::{debug, info};

use super::FaultSwitch;
use crate::types::{RadioControl, StreamCmd, StreamMode};

/// Default master clock rate of the simulated radios.
pub const DEFAULT_RATE: f64 = 200e6;

const FREQ_RANGE: (f64, f64) = (10e6, 6e9);
const GAIN_RANGE: (f64, f64) = (0.0, 31.5);
const DEFAULT_SPP: usize = 364;

/// Per-channel front-end state.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub rx_freq: f64,
    pub tx_freq: f64,
    pub rx_gain: f64,
    pub tx_gain: f64,
    pub rx_bandwidth: f64,
    pub tx_bandwidth: f64,
    pub rx_timestamps: bool,
    pub rx_dc_offset: bool,
    pub spp: usize,
    pub streaming: bool,
    /// Last stream command issued to this channel.
    pub last_cmd: Option<StreamCmd>,
}

impl ChannelState {
    fn new(rate: f64) -> Self {
        Self {
            rx_freq: 1e9,
            tx_freq: 1e9,
            rx_gain: 0.0,
            tx_gain: 0.0,
            rx_bandwidth: rate,
            tx_bandwidth: rate,
            rx_timestamps: true,
            rx_dc_offset: false,
            spp: DEFAULT_SPP,
            streaming: false,
            last_cmd: None,
        }
    }
}

/// A radio block with clamped tuning ranges and no RF front end.
#[derive(Debug)]
pub struct SimRadio {
    id: BlockId,
    rate: f64,
    chans: Mutex<Vec<ChannelState>>,
    pub fault: FaultSwitch,
}

impl SimRadio {
    pub fn new(id: BlockId, rate: f64, num_chans: usize) -> Self {
        Self {
            id,
            rate,
            chans: Mutex::new(vec![ChannelState::new(rate); num_chans.max(1)]),
            fault: FaultSwitch::default(),
        }
    }

    /// Copy of one channel's state, for inspection in tests and diagnostics.
    pub fn channel_state(&self, chan: usize) -> Option<ChannelState> {
        self.chans.lock().ok().and_then(|c| c.get(chan).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<ChannelState>>, DeviceError> {
        self.fault.check(&self.id.to_string())?;
        self.chans.lock().map_err(|_| DeviceError::Communication {
            block: self.id.to_string(),
            message: "radio state lock poisoned".to_string(),
        })
    }

    fn with_chan<T>(
        &self,
        chan: usize,
        f: impl FnOnce(&mut ChannelState) -> T,
    ) -> Result<T, DeviceError> {
        let mut chans = self.lock()?;
        let count = chans.len();
        let state = chans.get_mut(chan).ok_or_else(|| DeviceError::InvalidArgument {
            block: self.id.to_string(),
            message: format!("channel {} out of range, radio has {}", chan, count),
        })?;
        Ok(f(state))
    }
}

fn clamp(value: f64, (lo, hi): (f64, f64)) -> f64 {
    value.clamp(lo, hi)
}

impl RadioControl for SimRadio {
    fn get_rate(&self) -> f64 {
        self.rate
    }

    fn set_rx_frequency(&self, freq: f64, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| {
            s.rx_freq = clamp(freq, FREQ_RANGE);
            s.rx_freq
        })
    }

    fn get_rx_frequency(&self, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| s.rx_freq)
    }

    fn set_tx_frequency(&self, freq: f64, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| {
            s.tx_freq = clamp(freq, FREQ_RANGE);
            s.tx_freq
        })
    }

    fn get_tx_frequency(&self, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| s.tx_freq)
    }

    fn set_rx_gain(&self, gain: f64, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| {
            s.rx_gain = clamp(gain, GAIN_RANGE);
            s.rx_gain
        })
    }

    fn get_rx_gain(&self, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| s.rx_gain)
    }

    fn set_tx_gain(&self, gain: f64, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| {
            s.tx_gain = clamp(gain, GAIN_RANGE);
            s.tx_gain
        })
    }

    fn get_tx_gain(&self, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| s.tx_gain)
    }

    fn set_rx_bandwidth(&self, bandwidth: f64, chan: usize) -> Result<f64, DeviceError> {
        let rate = self.rate;
        self.with_chan(chan, |s| {
            s.rx_bandwidth = clamp(bandwidth, (0.0, rate));
            s.rx_bandwidth
        })
    }

    fn get_rx_bandwidth(&self, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| s.rx_bandwidth)
    }

    fn set_tx_bandwidth(&self, bandwidth: f64, chan: usize) -> Result<f64, DeviceError> {
        let rate = self.rate;
        self.with_chan(chan, |s| {
            s.tx_bandwidth = clamp(bandwidth, (0.0, rate));
            s.tx_bandwidth
        })
    }

    fn get_tx_bandwidth(&self, chan: usize) -> Result<f64, DeviceError> {
        self.with_chan(chan, |s| s.tx_bandwidth)
    }

    fn enable_rx_timestamps(&self, enable: bool, chan: usize) -> Result<(), DeviceError> {
        self.with_chan(chan, |s| s.rx_timestamps = enable)
    }

    fn set_rx_dc_offset(&self, enable: bool, chan: usize) -> Result<(), DeviceError> {
        self.with_chan(chan, |s| s.rx_dc_offset = enable)
    }

    fn set_spp(&self, spp: usize, chan: usize) -> Result<(), DeviceError> {
        if spp == 0 {
            return Err(DeviceError::InvalidArgument {
                block: self.id.to_string(),
                message: "spp must be greater than 0".to_string(),
            });
        }
        self.with_chan(chan, |s| s.spp = spp)
    }

    fn get_spp(&self, chan: usize) -> Result<usize, DeviceError> {
        self.with_chan(chan, |s| s.spp)
    }

    fn issue_stream_cmd(&self, cmd: &StreamCmd, chan: usize) -> Result<(), DeviceError> {
        let id = self.id.to_string();
        self.with_chan(chan, |s| {
            s.streaming = cmd.mode == StreamMode::StartContinuous;
            s.last_cmd = Some(*cmd);
        })?;
        match cmd.mode {
            StreamMode::StartContinuous => info!("{}: streaming starts at {:?}", id, cmd.time_spec),
            StreamMode::StopContinuous => debug!("{}: streaming stopped", id),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn radio() -> SimRadio {
        SimRadio::new(BlockId::new(0, "Radio", 0), DEFAULT_RATE, 1)
    }

    #[test]
    fn test_tuning_is_clamped() {
        let radio = radio();
        assert_eq!(radio.set_rx_frequency(3619.2e6, 0).unwrap(), 3619.2e6);
        assert_eq!(radio.set_tx_frequency(1.0, 0).unwrap(), FREQ_RANGE.0);
        assert_eq!(radio.set_tx_gain(100.0, 0).unwrap(), GAIN_RANGE.1);
        assert_eq!(radio.set_rx_bandwidth(80e6, 0).unwrap(), 80e6);
    }

    #[test]
    fn test_channel_out_of_range() {
        let radio = radio();
        assert!(matches!(
            radio.get_rx_gain(1),
            Err(DeviceError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_stream_commands_toggle_streaming() {
        let radio = radio();
        radio.issue_stream_cmd(&StreamCmd::start_at(0.1), 0).unwrap();
        assert!(radio.channel_state(0).unwrap().streaming);
        radio.issue_stream_cmd(&StreamCmd::stop_now(), 0).unwrap();
        let state = radio.channel_state(0).unwrap();
        assert!(!state.streaming);
        assert_eq!(state.last_cmd, Some(StreamCmd::stop_now()));
    }
}
