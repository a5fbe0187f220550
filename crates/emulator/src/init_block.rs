//! Shiftright block bring-up check: poke a value and read it back.

use airlink_types::BlockId;
use anyhow::{anyhow, bail};
use blocks::BlockKind;
use log::info;
use rfnoc_host::RfnocGraph;

/// Value written by `init_shiftright_block`.
pub const PROBE_VALUE: u32 = 42;

/// Write `value` to the first shiftright block in the graph and check it reads back.
pub fn probe_shiftright(graph: &dyn RfnocGraph, value: u32) -> anyhow::Result<BlockId> {
    let ids = graph.find_blocks(BlockKind::Shiftright.block_name());
    let id = ids
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No shiftright block found."))?;
    let block = graph.shiftright(&id)?;
    info!("Using shiftright block {}", id);

    block.set_shiftright_value(value)?;
    let read = block.get_shiftright_value()?;
    if read != value {
        bail!("Shiftright value mismatch: wrote {}, read back {}", value, read);
    }
    info!("Shiftright value verified: {}", read);
    Ok(id)
}
