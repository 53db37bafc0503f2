use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::road_class::RoadClassification;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeID(pub u32);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeID(pub u32);

impl EdgeID {
    /// Sentinel for "no such edge", e.g. a [`RoadGraph::find_edge`] miss.
    pub const INVALID: EdgeID = EdgeID(u32::MAX);
}

impl fmt::Display for EdgeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Edge #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    /// True when this edge models the against-flow direction of a one-way
    /// road. Such edges exist so an intersection can see incoming one-ways;
    /// they are never legal to enter.
    pub reversed: bool,
    pub classification: RoadClassification,
}

impl EdgeData {
    /// Whether a degree-two node between this edge and `other` is just an
    /// artifact of digitization rather than a real decision point.
    pub fn compatible_to(&self, other: &EdgeData) -> bool {
        self.reversed == other.reversed && self.classification == other.classification
    }
}

/// A directed road graph in compressed-sparse-row form. Edge ids are dense
/// and grouped by source node, so the edges leaving a node are a contiguous
/// id range and iteration order is fully deterministic.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoadGraph {
    // Indexed by node id, with one extra sentinel entry at the end.
    first_edge: Vec<u32>,
    targets: Vec<NodeID>,
    edge_data: Vec<EdgeData>,
}

impl RoadGraph {
    /// Builds the adjacency structure. Edges must arrive grouped by source
    /// node, sources ascending; ids are then assigned in input order, which
    /// keeps parallel edges in a predictable relative order.
    pub fn new(num_nodes: usize, edges: Vec<(NodeID, NodeID, EdgeData)>) -> Result<RoadGraph> {
        let mut first_edge = vec![0u32; num_nodes + 1];
        let mut previous_source = NodeID(0);
        for &(from, to, _) in &edges {
            if from.0 as usize >= num_nodes || to.0 as usize >= num_nodes {
                bail!("{} -> {} is out of bounds for {} nodes", from, to, num_nodes);
            }
            if from < previous_source {
                bail!("edges aren't grouped by source node ({} after {})", from, previous_source);
            }
            previous_source = from;
            first_edge[from.0 as usize + 1] += 1;
        }
        for i in 0..num_nodes {
            first_edge[i + 1] += first_edge[i];
        }

        let mut targets = Vec::with_capacity(edges.len());
        let mut edge_data = Vec::with_capacity(edges.len());
        for (_, to, data) in edges {
            targets.push(to);
            edge_data.push(data);
        }
        Ok(RoadGraph {
            first_edge,
            targets,
            edge_data,
        })
    }

    pub fn num_nodes(&self) -> usize {
        self.first_edge.len() - 1
    }

    pub fn num_edges(&self) -> usize {
        self.targets.len()
    }

    pub fn out_degree(&self, node: NodeID) -> usize {
        (self.first_edge[node.0 as usize + 1] - self.first_edge[node.0 as usize]) as usize
    }

    /// The first edge leaving `node`; the rest follow contiguously.
    pub fn begin_edges(&self, node: NodeID) -> EdgeID {
        EdgeID(self.first_edge[node.0 as usize])
    }

    pub fn adjacent_edges(&self, node: NodeID) -> impl Iterator<Item = EdgeID> {
        (self.first_edge[node.0 as usize]..self.first_edge[node.0 as usize + 1]).map(EdgeID)
    }

    pub fn target(&self, edge: EdgeID) -> NodeID {
        self.targets[edge.0 as usize]
    }

    pub fn edge_data(&self, edge: EdgeID) -> &EdgeData {
        &self.edge_data[edge.0 as usize]
    }

    /// The lowest-id edge from `from` to `to`, or [`EdgeID::INVALID`] when
    /// none exists. Parallel edges share geometry, so the first one stands
    /// in for all of them.
    pub fn find_edge(&self, from: NodeID, to: NodeID) -> EdgeID {
        self.adjacent_edges(from)
            .find(|&e| self.target(e) == to)
            .unwrap_or(EdgeID::INVALID)
    }

    /// The widest road meeting `node`, in lanes.
    pub fn lane_count_at_intersection(&self, node: NodeID) -> u8 {
        self.adjacent_edges(node)
            .map(|e| self.edge_data(e).classification.num_lanes)
            .max()
            .unwrap_or(0)
    }
}
