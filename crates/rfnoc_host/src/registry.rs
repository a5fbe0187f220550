//! Block registry: maps NoC IDs found in the FPGA image to block controllers.

use std::collections::HashMap;
use std::sync::Arc;

use airlink_types::{BlockId, GraphError};
use blocks::shiftright::registers::SHIFTRIGHT_DESCRIPTOR;
use blocks::{
    BlockDescriptor, BlockKind, FirFilterControl, RadioControl, RegisterIface,
    ShiftrightBlockControl, ShiftrightControl,
};
use log::debug;

/// A controller handed out by the host for one block.
#[derive(Clone)]
pub enum BlockHandle {
    Radio(Arc<dyn RadioControl>),
    FirFilter(Arc<dyn FirFilterControl>),
    Shiftright(Arc<dyn ShiftrightControl>),
}

impl BlockHandle {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockHandle::Radio(_) => BlockKind::Radio,
            BlockHandle::FirFilter(_) => BlockKind::FirFilter,
            BlockHandle::Shiftright(_) => BlockKind::Shiftright,
        }
    }
}

/// A factory for creating the controller of a specific block type.
pub trait BlockFactory: Send + Sync {
    /// Creates a controller for block `id` on top of its register interface.
    fn create(&self, id: BlockId, regs: Arc<dyn RegisterIface>) -> BlockHandle;
}

/// Builds [`ShiftrightBlockControl`] instances.
#[derive(Default)]
pub struct ShiftrightFactory;

impl BlockFactory for ShiftrightFactory {
    fn create(&self, id: BlockId, regs: Arc<dyn RegisterIface>) -> BlockHandle {
        BlockHandle::Shiftright(Arc::new(ShiftrightBlockControl::new(id, regs)))
    }
}

/// A registry for block factories, keyed by NoC ID.
#[derive(Default)]
pub struct BlockRegistry {
    factories: HashMap<u32, (BlockDescriptor, Arc<dyn BlockFactory>)>,
}

impl BlockRegistry {
    /// Creates a new, empty block registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a controller for the block described by `descriptor`.
    pub fn register<F>(&mut self, descriptor: BlockDescriptor, factory: F) -> Result<(), GraphError>
    where
        F: BlockFactory + 'static,
    {
        if let Some((existing, _)) = self.factories.get(&descriptor.noc_id) {
            return Err(GraphError::Registry(format!(
                "NoC ID 0x{:06x} already registered as {}",
                descriptor.noc_id, existing.block_name
            )));
        }
        debug!(
            "Registering block {} (NoC ID 0x{:06x}, clocks {}/{})",
            descriptor.block_name, descriptor.noc_id, descriptor.timebase_clock, descriptor.ctrl_clock
        );
        self.factories
            .insert(descriptor.noc_id, (descriptor, Arc::new(factory)));
        Ok(())
    }

    pub fn descriptor(&self, noc_id: u32) -> Option<&BlockDescriptor> {
        self.factories.get(&noc_id).map(|(d, _)| d)
    }

    /// Creates the controller for a discovered block.
    pub fn create_block(
        &self,
        noc_id: u32,
        id: BlockId,
        regs: Arc<dyn RegisterIface>,
    ) -> Result<BlockHandle, GraphError> {
        let (descriptor, factory) = self.factories.get(&noc_id).ok_or_else(|| {
            GraphError::Registry(format!("no controller registered for NoC ID 0x{:06x}", noc_id))
        })?;
        if descriptor.block_name != id.block_name() {
            return Err(GraphError::Registry(format!(
                "block {} carries NoC ID 0x{:06x}, which belongs to {}",
                id, noc_id, descriptor.block_name
            )));
        }
        Ok(factory.create(id, regs))
    }
}

/// Registers the controllers shipped with AirLink.
pub fn register_builtin_blocks(registry: &mut BlockRegistry) -> Result<(), GraphError> {
    registry.register(SHIFTRIGHT_DESCRIPTOR, ShiftrightFactory)
}
