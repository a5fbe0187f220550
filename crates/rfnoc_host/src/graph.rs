//! The RFNoC graph as seen by the emulator applications.

use std::sync::Arc;

use airlink_types::{BlockId, GraphError};
use blocks::{BlockKind, FirFilterControl, RadioControl, ShiftrightControl};

use crate::registry::BlockHandle;

/// A static connection between two block ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub src: BlockId,
    pub src_port: usize,
    pub dst: BlockId,
    pub dst_port: usize,
    /// Back edge: property propagation stops here so loops can be committed.
    pub skip_property_propagation: bool,
}

/// Operations the emulator needs from the host runtime.
pub trait RfnocGraph {
    /// IDs of every block in the image.
    fn block_ids(&self) -> Vec<BlockId>;

    /// Controller for block `id`.
    fn get_block(&self, id: &BlockId) -> Result<BlockHandle, GraphError>;

    /// Add a connection. Takes effect on [`RfnocGraph::commit`].
    fn connect(&mut self, edge: Edge) -> Result<(), GraphError>;

    /// Finalize the connections and propagate properties.
    fn commit(&mut self) -> Result<(), GraphError>;

    /// Current time of the timekeeper on motherboard `device_no`, in seconds.
    fn time_now(&self, device_no: usize) -> Result<f64, GraphError>;

    /// IDs of all blocks matching `hint`; an empty hint returns every block.
    fn find_blocks(&self, hint: &str) -> Vec<BlockId> {
        self.block_ids().into_iter().filter(|id| id.matches(hint)).collect()
    }

    fn radio(&self, id: &BlockId) -> Result<Arc<dyn RadioControl>, GraphError> {
        match self.get_block(id)? {
            BlockHandle::Radio(radio) => Ok(radio),
            other => Err(wrong_type(id, BlockKind::Radio, other.kind())),
        }
    }

    fn fir_filter(&self, id: &BlockId) -> Result<Arc<dyn FirFilterControl>, GraphError> {
        match self.get_block(id)? {
            BlockHandle::FirFilter(fir) => Ok(fir),
            other => Err(wrong_type(id, BlockKind::FirFilter, other.kind())),
        }
    }

    fn shiftright(&self, id: &BlockId) -> Result<Arc<dyn ShiftrightControl>, GraphError> {
        match self.get_block(id)? {
            BlockHandle::Shiftright(sr) => Ok(sr),
            other => Err(wrong_type(id, BlockKind::Shiftright, other.kind())),
        }
    }
}

fn wrong_type(id: &BlockId, expected: BlockKind, actual: BlockKind) -> GraphError {
    GraphError::WrongBlockType {
        id: id.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
