//! A simulated RFNoC host holding the AirLink FPGA image in memory.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;

use airlink_types::{BlockId, GraphError};
use blocks::shiftright::registers::SHIFTRIGHT_NOC_ID;
use blocks::sim::fir::DEFAULT_MAX_TAPS;
use blocks::sim::radio::DEFAULT_RATE;
use blocks::sim::{SimFirFilter, SimRadio, SimRegisterBank};
use blocks::BlockKind;
use log::{debug, info};
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;

use crate::args::DeviceArgs;
use crate::graph::{Edge, RfnocGraph};
use crate::registry::{register_builtin_blocks, BlockHandle, BlockRegistry};

/// Device type accepted by [`SimGraph::make`].
pub const SIM_DEVICE_TYPE: &str = "sim";

// Every block in the AirLink image has a single input and output port.
const PORTS_PER_BLOCK: usize = 1;

/// A block instance in the simulated image, with typed access for tests.
enum SimBlock {
    Radio(Arc<SimRadio>),
    FirFilter(Arc<SimFirFilter>),
    Shiftright {
        regs: Arc<SimRegisterBank>,
        handle: BlockHandle,
    },
}

/// In-memory stand-in for a USRP running the AirLink image.
///
/// The image carries `radios` radio blocks, `firs` FIR blocks and
/// `shiftrights` shiftright blocks on motherboard 0, all configurable
/// through the device args.
pub struct SimGraph {
    args: DeviceArgs,
    blocks: BTreeMap<BlockId, SimBlock>,
    edges: Vec<Edge>,
    committed: bool,
    started: Instant,
}

impl SimGraph {
    /// Create the simulated device described by `args`.
    ///
    /// Recognised keys: `type` (must be `sim` when present), `radios`,
    /// `firs`, `shiftrights`, `max_taps` and `rate`.
    pub fn make(args: &str) -> Result<Self, GraphError> {
        let args: DeviceArgs = args.parse()?;
        if let Some(kind) = args.get("type") {
            if kind != SIM_DEVICE_TYPE {
                return Err(GraphError::NoDevice(args.to_string()));
            }
        }

        let radios: usize = args.get_or("radios", 2)?;
        let firs: usize = args.get_or("firs", 2)?;
        let shiftrights: usize = args.get_or("shiftrights", 2)?;
        let max_taps: usize = args.get_or("max_taps", DEFAULT_MAX_TAPS)?;
        let rate: f64 = args.get_or("rate", DEFAULT_RATE)?;
        if max_taps == 0 || !rate.is_finite() || rate <= 0.0 {
            return Err(GraphError::InvalidArgs(args.to_string()));
        }

        let mut registry = BlockRegistry::new();
        register_builtin_blocks(&mut registry)?;

        let mut blocks = BTreeMap::new();
        for i in 0..radios {
            let id = BlockId::new(0, BlockKind::Radio.block_name(), i);
            blocks.insert(id.clone(), SimBlock::Radio(Arc::new(SimRadio::new(id, rate, 1))));
        }
        for i in 0..firs {
            let id = BlockId::new(0, BlockKind::FirFilter.block_name(), i);
            blocks.insert(
                id.clone(),
                SimBlock::FirFilter(Arc::new(SimFirFilter::new(id, max_taps))),
            );
        }
        for i in 0..shiftrights {
            let id = BlockId::new(0, BlockKind::Shiftright.block_name(), i);
            let regs = Arc::new(SimRegisterBank::new(id.clone()));
            let handle = registry.create_block(SHIFTRIGHT_NOC_ID, id.clone(), regs.clone())?;
            blocks.insert(id, SimBlock::Shiftright { regs, handle });
        }

        info!(
            "Simulated device ready: {} radios, {} FIR blocks, {} shiftright blocks",
            radios, firs, shiftrights
        );

        Ok(Self {
            args,
            blocks,
            edges: Vec::new(),
            committed: false,
            started: Instant::now(),
        })
    }

    pub fn args(&self) -> &DeviceArgs {
        &self.args
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn sim_radio(&self, id: &BlockId) -> Option<Arc<SimRadio>> {
        match self.blocks.get(id) {
            Some(SimBlock::Radio(radio)) => Some(radio.clone()),
            _ => None,
        }
    }

    pub fn sim_fir(&self, id: &BlockId) -> Option<Arc<SimFirFilter>> {
        match self.blocks.get(id) {
            Some(SimBlock::FirFilter(fir)) => Some(fir.clone()),
            _ => None,
        }
    }

    /// Register bank behind a shiftright block.
    pub fn shiftright_regs(&self, id: &BlockId) -> Option<Arc<SimRegisterBank>> {
        match self.blocks.get(id) {
            Some(SimBlock::Shiftright { regs, .. }) => Some(regs.clone()),
            _ => None,
        }
    }

    fn connect_error(edge: &Edge, message: impl Into<String>) -> GraphError {
        GraphError::Connect {
            src: format!("{}:{}", edge.src, edge.src_port),
            dst: format!("{}:{}", edge.dst, edge.dst_port),
            message: message.into(),
        }
    }
}

impl RfnocGraph for SimGraph {
    fn block_ids(&self) -> Vec<BlockId> {
        self.blocks.keys().cloned().collect()
    }

    fn get_block(&self, id: &BlockId) -> Result<BlockHandle, GraphError> {
        match self.blocks.get(id) {
            Some(SimBlock::Radio(radio)) => Ok(BlockHandle::Radio(radio.clone())),
            Some(SimBlock::FirFilter(fir)) => Ok(BlockHandle::FirFilter(fir.clone())),
            Some(SimBlock::Shiftright { handle, .. }) => Ok(handle.clone()),
            None => Err(GraphError::BlockNotFound(id.to_string())),
        }
    }

    fn connect(&mut self, edge: Edge) -> Result<(), GraphError> {
        for id in [&edge.src, &edge.dst] {
            if !self.blocks.contains_key(id) {
                return Err(GraphError::BlockNotFound(id.to_string()));
            }
        }
        if edge.src_port >= PORTS_PER_BLOCK || edge.dst_port >= PORTS_PER_BLOCK {
            return Err(Self::connect_error(&edge, "port out of range"));
        }
        if self
            .edges
            .iter()
            .any(|e| e.src == edge.src && e.src_port == edge.src_port)
        {
            return Err(Self::connect_error(&edge, "output port already connected"));
        }
        if self
            .edges
            .iter()
            .any(|e| e.dst == edge.dst && e.dst_port == edge.dst_port)
        {
            return Err(Self::connect_error(&edge, "input port already connected"));
        }

        debug!(
            "connect {}:{} -> {}:{}{}",
            edge.src,
            edge.src_port,
            edge.dst,
            edge.dst_port,
            if edge.skip_property_propagation { " (back edge)" } else { "" }
        );
        self.edges.push(edge);
        self.committed = false;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), GraphError> {
        // Property propagation runs along every edge except back edges, so
        // those must form a DAG.
        let mut graph = DiGraph::<&BlockId, ()>::new();
        let mut node_map = HashMap::new();
        for id in self.blocks.keys() {
            node_map.insert(id, graph.add_node(id));
        }
        for edge in self.edges.iter().filter(|e| !e.skip_property_propagation) {
            if let (Some(&from), Some(&to)) = (node_map.get(&edge.src), node_map.get(&edge.dst)) {
                graph.add_edge(from, to, ());
            }
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(GraphError::Connect {
                src: graph[cycle.node_id()].to_string(),
                dst: graph[cycle.node_id()].to_string(),
                message: "graph loops back without a back edge".to_string(),
            });
        }

        self.committed = true;
        info!("Graph committed with {} connections", self.edges.len());
        Ok(())
    }

    fn time_now(&self, device_no: usize) -> Result<f64, GraphError> {
        if device_no != 0 {
            return Err(GraphError::BlockNotFound(format!("motherboard {}", device_no)));
        }
        Ok(self.started.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_image() {
        let graph = SimGraph::make("").unwrap();
        let ids: Vec<String> = graph.block_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "0/FIR#0",
                "0/FIR#1",
                "0/Radio#0",
                "0/Radio#1",
                "0/Shiftright#0",
                "0/Shiftright#1"
            ]
        );
    }

    #[test]
    fn test_unknown_device_type() {
        assert!(matches!(SimGraph::make("type=x300"), Err(GraphError::NoDevice(_))));
        assert!(matches!(SimGraph::make("max_taps=0"), Err(GraphError::InvalidArgs(_))));
    }

    #[test]
    fn test_port_reuse_rejected() {
        let mut graph = SimGraph::make("").unwrap();
        let edge = Edge {
            src: BlockId::new(0, "Radio", 0),
            src_port: 0,
            dst: BlockId::new(0, "FIR", 0),
            dst_port: 0,
            skip_property_propagation: false,
        };
        graph.connect(edge.clone()).unwrap();
        assert!(matches!(graph.connect(edge), Err(GraphError::Connect { .. })));
    }

    #[test]
    fn test_loop_needs_back_edge() {
        let mut graph = SimGraph::make("").unwrap();
        let radio = BlockId::new(0, "Radio", 0);
        let fir = BlockId::new(0, "FIR", 0);
        graph
            .connect(Edge {
                src: radio.clone(),
                src_port: 0,
                dst: fir.clone(),
                dst_port: 0,
                skip_property_propagation: false,
            })
            .unwrap();
        graph
            .connect(Edge {
                src: fir,
                src_port: 0,
                dst: radio,
                dst_port: 0,
                skip_property_propagation: false,
            })
            .unwrap();
        assert!(graph.commit().is_err());
        assert!(!graph.is_committed());
    }
}
