use crate::error::BuilderError;
use crate::fable::{
    BlockFactoryCatalogue, BlockFactoryId, BlockId, BlockInstance, FableDocument, IntoFable,
};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Canvas coordinates of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_origin(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    pub instance_id: BlockId,
    pub factory: BlockFactoryId,
}

/// A renderable block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: BlockId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub position: Position,
    pub data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub input_name: String,
}

/// A renderable connection from the block producing data to the input consuming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    pub source: BlockId,
    pub target: BlockId,
    pub target_handle: String,
    pub data: EdgeData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FableGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// One node per block whose factory is in the catalogue, all at the origin.
///
/// Blocks with an unknown factory (e.g. their plugin was uninstalled) are
/// skipped rather than reported; see [`unresolved_blocks`].
pub fn fable_to_nodes(fable: &FableDocument, catalogue: &BlockFactoryCatalogue) -> Vec<GraphNode> {
    fable
        .sorted_blocks()
        .filter_map(|(block_id, block)| {
            let Some(factory) = catalogue.get(&block.factory_id) else {
                debug!(block_id = %block_id, factory = %block.factory_id, "Skipping block with unknown factory");
                return None;
            };
            Some(GraphNode {
                id: block_id.clone(),
                node_type: factory.kind.node_type().to_string(),
                position: Position::ORIGIN,
                data: NodeData {
                    label: factory.title.clone(),
                    instance_id: block_id.clone(),
                    factory: block.factory_id.clone(),
                },
            })
        })
        .collect()
}

/// One edge per connected input whose two ends are both rendered.
pub fn fable_to_edges(fable: &FableDocument, catalogue: &BlockFactoryCatalogue) -> Vec<GraphEdge> {
    let rendered: AHashSet<&str> = fable
        .blocks
        .iter()
        .filter(|(_, block)| catalogue.get(&block.factory_id).is_some())
        .map(|(id, _)| id.as_str())
        .collect();

    fable
        .sorted_blocks()
        .filter(|(block_id, _)| rendered.contains(block_id.as_str()))
        .flat_map(|(block_id, block)| {
            block
                .connected_inputs()
                .filter(|(_, source)| rendered.contains(source))
                .map(|(input, source)| GraphEdge {
                    id: format!("{}->{}:{}", source, block_id, input),
                    source: source.to_string(),
                    target: block_id.clone(),
                    target_handle: input.to_string(),
                    data: EdgeData {
                        input_name: input.to_string(),
                    },
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub fn fable_to_graph(fable: &FableDocument, catalogue: &BlockFactoryCatalogue) -> FableGraph {
    FableGraph {
        nodes: fable_to_nodes(fable, catalogue),
        edges: fable_to_edges(fable, catalogue),
    }
}

/// Ids of blocks the graph canvas cannot render because their factory is unknown.
pub fn unresolved_blocks(fable: &FableDocument, catalogue: &BlockFactoryCatalogue) -> Vec<BlockId> {
    fable
        .sorted_blocks()
        .filter(|(_, block)| catalogue.get(&block.factory_id).is_none())
        .map(|(id, _)| id.clone())
        .collect()
}

/// Whether any node still sits at the origin.
///
/// A node the user dragged to exactly `(0, 0)` is indistinguishable from one
/// that was never laid out; that case triggers a layout pass too.
pub fn needs_layout(nodes: &[GraphNode]) -> bool {
    nodes.iter().any(|node| node.position.is_origin())
}

impl IntoFable for FableGraph {
    /// Rebuilds blocks from nodes and connections from edges. Configuration
    /// values are not part of the graph and come back empty.
    fn into_fable(self) -> Result<FableDocument, BuilderError> {
        let mut fable = FableDocument::new();
        for node in self.nodes {
            fable
                .blocks
                .insert(node.id, BlockInstance::new(node.data.factory));
        }
        for edge in self.edges {
            let target = fable
                .blocks
                .get_mut(&edge.target)
                .ok_or_else(|| BuilderError::UnknownBlock(edge.target.clone()))?;
            target.input_ids.insert(edge.data.input_name, edge.source);
        }
        Ok(fable)
    }
}
