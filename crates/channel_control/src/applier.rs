//! Pushes channel configurations into the FIR and shiftright blocks of a link.

use std::sync::Arc;

use airlink_types::{ChannelConfig, DeviceError};
use blocks::{FirFilterControl, ShiftrightControl};
use log::debug;

/// The two configurable blocks of one emulated link.
#[derive(Clone)]
pub struct ChannelHandles {
    /// Label used in logs and the console echo.
    pub name: String,
    pub fir: Arc<dyn FirFilterControl>,
    pub shiftright: Arc<dyn ShiftrightControl>,
}

impl ChannelHandles {
    pub fn new(
        name: impl Into<String>,
        fir: Arc<dyn FirFilterControl>,
        shiftright: Arc<dyn ShiftrightControl>,
    ) -> Self {
        Self {
            name: name.into(),
            fir,
            shiftright,
        }
    }
}

/// Load `config` into the link: coefficients first, then the shift amount.
///
/// Stops at the first failing call; no retry.
pub fn apply(link: &ChannelHandles, config: &ChannelConfig) -> Result<(), DeviceError> {
    debug!("{}: applying {}", link.name, config);
    link.fir.set_coefficients(config.coefficients())?;
    link.shiftright.set_shiftright_value(config.shift())?;
    Ok(())
}

/// Read the configuration currently loaded on the link.
pub fn read_back(link: &ChannelHandles) -> Result<ChannelConfig, DeviceError> {
    let coefficients = link.fir.get_coefficients()?;
    let shift = link.shiftright.get_shiftright_value()?;
    ChannelConfig::new(coefficients, shift).map_err(|_| DeviceError::Communication {
        block: link.name.clone(),
        message: "FIR block reported no coefficients".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use airlink_types::BlockId;
    use blocks::sim::{SimFirFilter, SimRegisterBank};
    use blocks::ShiftrightBlockControl;

    fn sim_link() -> (ChannelHandles, Arc<SimFirFilter>, Arc<SimRegisterBank>) {
        let fir = Arc::new(SimFirFilter::new(BlockId::new(0, "FIR", 0), 41));
        let sr_id = BlockId::new(0, "Shiftright", 0);
        let regs = Arc::new(SimRegisterBank::new(sr_id.clone()));
        let shiftright = Arc::new(ShiftrightBlockControl::new(sr_id, regs.clone()));
        let link = ChannelHandles::new("test link", fir.clone(), shiftright);
        (link, fir, regs)
    }

    #[test]
    fn test_apply_then_read_back() {
        let (link, _, regs) = sim_link();
        let config = ChannelConfig::new(vec![100, -200, 300], 7).unwrap();
        apply(&link, &config).unwrap();
        assert_eq!(read_back(&link).unwrap(), config);
        assert_eq!(regs.snapshot(0x00), 7);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (link, _, _) = sim_link();
        let config = ChannelConfig::new(vec![1, 2, 3, 4], 2).unwrap();
        apply(&link, &config).unwrap();
        let first = read_back(&link).unwrap();
        apply(&link, &config).unwrap();
        assert_eq!(read_back(&link).unwrap(), first);
    }

    #[test]
    fn test_fir_failure_leaves_shift_untouched() {
        let (link, fir, regs) = sim_link();
        apply(&link, &ChannelConfig::new(vec![5], 1).unwrap()).unwrap();

        fir.fault.set(true);
        let err = apply(&link, &ChannelConfig::new(vec![9], 4).unwrap()).unwrap_err();
        assert!(matches!(err, DeviceError::Communication { .. }));
        assert_eq!(regs.snapshot(0x00), 1);

        fir.fault.set(false);
        assert_eq!(read_back(&link).unwrap().coefficients(), &[5]);
    }
}
