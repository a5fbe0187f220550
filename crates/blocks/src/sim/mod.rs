//! In-memory block implementations that do not access any hardware.
//!
//! Each block carries a [`FaultSwitch`] so tests can make device calls fail
//! the way a lost control link would.

pub mod fir;
pub mod radio;
pub mod registers;

pub use fir::SimFirFilter;
pub use radio::SimRadio;
pub use registers::SimRegisterBank;

use std::sync::atomic::{AtomicBool, Ordering};

use airlink_types::DeviceError;

/// Makes every device call of one simulated block fail while tripped.
#[derive(Debug, Default)]
pub struct FaultSwitch {
    tripped: AtomicBool,
}

impl FaultSwitch {
    pub fn set(&self, faulty: bool) {
        self.tripped.store(faulty, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.tripped.load(Ordering::SeqCst)
    }

    /// Error out if the switch is tripped.
    pub fn check(&self, block: &str) -> Result<(), DeviceError> {
        if self.is_set() {
            return Err(DeviceError::Communication {
                block: block.to_string(),
                message: "control transaction timed out".to_string(),
            });
        }
        Ok(())
    }
}
