//! Register map and registry data for the shiftright block.

use crate::types::BlockDescriptor;

// Register Addresses
pub const REG_SHIFTRIGHT_VALUE: u32 = 0x00;

/// NoC ID of the shiftright block in the AirLink FPGA image.
pub const SHIFTRIGHT_NOC_ID: u32 = 0x02d024;

/// Registration entry for the host block registry.
pub const SHIFTRIGHT_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    noc_id: SHIFTRIGHT_NOC_ID,
    block_name: "Shiftright",
    timebase_clock: "graph",
    ctrl_clock: "bus_clk",
};
