use std::sync::Mutex;

use airlink_types::{BlockId, DeviceError};

use super::FaultSwitch;
use crate::types::FirFilterControl;

/// Taps the AirLink FIR blocks are built with.
pub const DEFAULT_MAX_TAPS: usize = 41;

/// A FIR filter block that keeps its taps in memory.
#[derive(Debug)]
pub struct SimFirFilter {
    id: BlockId,
    max_taps: usize,
    coeffs: Mutex<Vec<i16>>,
    pub fault: FaultSwitch,
}

impl SimFirFilter {
    pub fn new(id: BlockId, max_taps: usize) -> Self {
        Self {
            id,
            max_taps,
            coeffs: Mutex::new(vec![0; max_taps]),
            fault: FaultSwitch::default(),
        }
    }

    fn lock_error(&self) -> DeviceError {
        DeviceError::Communication {
            block: self.id.to_string(),
            message: "coefficient memory lock poisoned".to_string(),
        }
    }
}

impl FirFilterControl for SimFirFilter {
    fn set_coefficients(&self, coeffs: &[i16]) -> Result<(), DeviceError> {
        self.fault.check(&self.id.to_string())?;
        if coeffs.is_empty() || coeffs.len() > self.max_taps {
            return Err(DeviceError::InvalidArgument {
                block: self.id.to_string(),
                message: format!(
                    "{} coefficients given, block supports 1..={}",
                    coeffs.len(),
                    self.max_taps
                ),
            });
        }
        let mut current = self.coeffs.lock().map_err(|_| self.lock_error())?;
        *current = coeffs.to_vec();
        Ok(())
    }

    fn get_coefficients(&self) -> Result<Vec<i16>, DeviceError> {
        self.fault.check(&self.id.to_string())?;
        let current = self.coeffs.lock().map_err(|_| self.lock_error())?;
        Ok(current.clone())
    }

    fn get_max_num_coefficients(&self) -> usize {
        self.max_taps
    }
}
