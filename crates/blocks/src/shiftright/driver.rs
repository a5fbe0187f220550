//! Block controller for the shiftright block.

use log::debug;

use airlink_types::{BlockId, DeviceError};

use super::registers::REG_SHIFTRIGHT_VALUE;
use crate::types::{RegisterIface, ShiftrightControl};

/// Drives one shiftright block through its register interface.
pub struct ShiftrightBlockControl<R: RegisterIface> {
    id: BlockId,
    regs: R,
}

impl<R: RegisterIface> ShiftrightBlockControl<R> {
    pub fn new(id: BlockId, regs: R) -> Self {
        Self { id, regs }
    }
}

impl<R: RegisterIface> ShiftrightControl for ShiftrightBlockControl<R> {
    fn set_shiftright_value(&self, shiftright: u32) -> Result<(), DeviceError> {
        debug!("{}: poke32(0x{:02X}, {})", self.id, REG_SHIFTRIGHT_VALUE, shiftright);
        self.regs.poke32(REG_SHIFTRIGHT_VALUE, shiftright)
    }

    fn get_shiftright_value(&self) -> Result<u32, DeviceError> {
        self.regs.peek32(REG_SHIFTRIGHT_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every register access.
    #[derive(Default)]
    struct RecordingRegs {
        pokes: Mutex<Vec<(u32, u32)>>,
        peeks: Mutex<Vec<u32>>,
    }

    impl RegisterIface for RecordingRegs {
        fn poke32(&self, addr: u32, value: u32) -> Result<(), DeviceError> {
            self.pokes.lock().unwrap().push((addr, value));
            Ok(())
        }

        fn peek32(&self, addr: u32) -> Result<u32, DeviceError> {
            self.peeks.lock().unwrap().push(addr);
            Ok(self
                .pokes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(a, _)| *a == addr)
                .map(|(_, v)| *v)
                .unwrap_or(0))
        }
    }

    #[test]
    fn test_set_pokes_shiftright_register() {
        let ctrl = ShiftrightBlockControl::new(BlockId::new(0, "Shiftright", 0), RecordingRegs::default());
        ctrl.set_shiftright_value(42).unwrap();
        assert_eq!(*ctrl.regs.pokes.lock().unwrap(), vec![(0x00, 42)]);
    }

    #[test]
    fn test_get_peeks_shiftright_register() {
        let ctrl = ShiftrightBlockControl::new(BlockId::new(0, "Shiftright", 1), RecordingRegs::default());
        ctrl.set_shiftright_value(7).unwrap();
        assert_eq!(ctrl.get_shiftright_value().unwrap(), 7);
        assert_eq!(*ctrl.regs.peeks.lock().unwrap(), vec![0x00]);
    }
}
