use std::collections::HashMap;
use std::sync::Mutex;

use airlink_types::{BlockId, DeviceError};

use super::FaultSwitch;
use crate::types::RegisterIface;

/// A block's register space held in memory. Unwritten registers read as zero.
#[derive(Debug)]
pub struct SimRegisterBank {
    id: BlockId,
    regs: Mutex<HashMap<u32, u32>>,
    pub fault: FaultSwitch,
}

impl SimRegisterBank {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            regs: Mutex::new(HashMap::new()),
            fault: FaultSwitch::default(),
        }
    }

    /// Inspect a register without going through the fault switch.
    pub fn snapshot(&self, addr: u32) -> u32 {
        self.regs
            .lock()
            .map(|regs| regs.get(&addr).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn lock_error(&self) -> DeviceError {
        DeviceError::Communication {
            block: self.id.to_string(),
            message: "register bank lock poisoned".to_string(),
        }
    }
}

impl RegisterIface for SimRegisterBank {
    fn poke32(&self, addr: u32, value: u32) -> Result<(), DeviceError> {
        self.fault.check(&self.id.to_string())?;
        let mut regs = self.regs.lock().map_err(|_| self.lock_error())?;
        regs.insert(addr, value);
        Ok(())
    }

    fn peek32(&self, addr: u32) -> Result<u32, DeviceError> {
        self.fault.check(&self.id.to_string())?;
        let regs = self.regs.lock().map_err(|_| self.lock_error())?;
        Ok(regs.get(&addr).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poke_then_peek() {
        let bank = SimRegisterBank::new(BlockId::new(0, "Shiftright", 0));
        assert_eq!(bank.peek32(0x00).unwrap(), 0);
        bank.poke32(0x00, 5).unwrap();
        assert_eq!(bank.peek32(0x00).unwrap(), 5);
        assert_eq!(bank.snapshot(0x00), 5);
    }

    #[test]
    fn test_fault_blocks_access() {
        let bank = SimRegisterBank::new(BlockId::new(0, "Shiftright", 0));
        bank.poke32(0x00, 5).unwrap();
        bank.fault.set(true);
        assert!(matches!(bank.poke32(0x00, 9), Err(DeviceError::Communication { .. })));
        assert!(bank.peek32(0x00).is_err());
        bank.fault.set(false);
        assert_eq!(bank.peek32(0x00).unwrap(), 5);
    }
}
