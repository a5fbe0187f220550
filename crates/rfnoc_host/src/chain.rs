//! Emulated links: radio -> FIR -> shiftright -> radio, described as data.

use std::collections::HashSet;
use std::sync::Arc;

use airlink_types::{BlockId, GraphError};
use blocks::{FirFilterControl, RadioControl, ShiftrightControl};
use log::info;
use serde::{Deserialize, Serialize};

use crate::graph::{Edge, RfnocGraph};

/// A radio port at one end of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub radio: BlockId,
    #[serde(default)]
    pub chan: usize,
}

/// One emulated link through the FPGA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSpec {
    /// Label used in diagnostics, e.g. "RF A to RF B".
    pub name: String,
    pub source: Endpoint,
    pub fir: BlockId,
    pub shiftright: BlockId,
    pub sink: Endpoint,
}

/// Controllers for every block on one link.
#[derive(Clone)]
pub struct LinkHandles {
    pub spec: LinkSpec,
    pub source: Arc<dyn RadioControl>,
    pub fir: Arc<dyn FirFilterControl>,
    pub shiftright: Arc<dyn ShiftrightControl>,
    pub sink: Arc<dyn RadioControl>,
}

/// Look up the controllers for `spec`. Fails if any block is missing from the image.
pub fn resolve_link(graph: &dyn RfnocGraph, spec: &LinkSpec) -> Result<LinkHandles, GraphError> {
    let source = graph.radio(&spec.source.radio)?;
    let sink = graph.radio(&spec.sink.radio)?;
    let fir = graph.fir_filter(&spec.fir)?;
    let shiftright = graph.shiftright(&spec.shiftright)?;
    info!(
        "{}: {} ch{} -> {} -> {} -> {} ch{}",
        spec.name, spec.source.radio, spec.source.chan, spec.fir, spec.shiftright, spec.sink.radio, spec.sink.chan
    );
    Ok(LinkHandles {
        spec: spec.clone(),
        source,
        fir,
        shiftright,
        sink,
    })
}

/// Connect every link of the chain, in order.
///
/// The last hop of a link is a back edge when its sink radio already feeds
/// this or an earlier link; property propagation is skipped on it so the
/// loop can be committed.
pub fn connect_chain(graph: &mut dyn RfnocGraph, links: &[LinkSpec]) -> Result<(), GraphError> {
    let mut sources = HashSet::new();
    for link in links {
        sources.insert(link.source.radio.clone());
        let skip_pp = sources.contains(&link.sink.radio);
        connect_link(graph, link, skip_pp)?;
    }
    Ok(())
}

fn connect_link(graph: &mut dyn RfnocGraph, link: &LinkSpec, skip_pp: bool) -> Result<(), GraphError> {
    graph.connect(Edge {
        src: link.source.radio.clone(),
        src_port: link.source.chan,
        dst: link.fir.clone(),
        dst_port: 0,
        skip_property_propagation: false,
    })?;
    graph.connect(Edge {
        src: link.fir.clone(),
        src_port: 0,
        dst: link.shiftright.clone(),
        dst_port: 0,
        skip_property_propagation: false,
    })?;
    graph.connect(Edge {
        src: link.shiftright.clone(),
        src_port: 0,
        dst: link.sink.radio.clone(),
        dst_port: link.sink.chan,
        skip_property_propagation: skip_pp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_spec_from_json() {
        let json = r#"{
            "name": "RX to TX",
            "source": { "radio": "0/Radio#1" },
            "fir": "0/FIR#1",
            "shiftright": "0/Shiftright#1",
            "sink": { "radio": "0/Radio#0", "chan": 0 }
        }"#;
        let link: LinkSpec = serde_json::from_str(json).unwrap();
        assert_eq!(link.source.radio, BlockId::new(0, "Radio", 1));
        assert_eq!(link.source.chan, 0);
        assert_eq!(link.shiftright.to_string(), "0/Shiftright#1");
    }

    #[test]
    fn test_link_spec_rejects_bad_block_id() {
        let json = r#"{
            "name": "bad",
            "source": { "radio": "0/Radio#x" },
            "fir": "0/FIR#1",
            "shiftright": "0/Shiftright#1",
            "sink": { "radio": "0/Radio#0" }
        }"#;
        assert!(serde_json::from_str::<LinkSpec>(json).is_err());
    }
}
