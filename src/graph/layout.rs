use super::projection::{GraphEdge, GraphNode, Position};
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Direction in which ranks of the layout follow each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// Data flows left to right; ranks are columns.
    #[default]
    #[serde(rename = "LR")]
    LeftToRight,
    /// Data flows top to bottom; ranks are rows.
    #[serde(rename = "TB")]
    TopToBottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub direction: LayoutDirection,
    pub node_width: f64,
    pub node_height: f64,
    /// Gap between consecutive ranks.
    pub rank_separation: f64,
    /// Gap between neighbouring nodes of the same rank.
    pub node_separation: f64,
    /// Offset of the whole layout from the origin.
    pub margin: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::LeftToRight,
            node_width: 250.0,
            node_height: 100.0,
            rank_separation: 80.0,
            node_separation: 40.0,
            margin: 40.0,
        }
    }
}

/// Places nodes on a layered grid and returns them, in input order, with new positions.
///
/// Each node's rank is the length of the longest path reaching it; nodes on a
/// cycle share one rank after the last acyclic one. Within a rank nodes are
/// ordered by the mean slot of their predecessors, ties broken by id. The
/// result only depends on the input, never on map iteration order.
pub fn layout_nodes(
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    options: &LayoutOptions,
) -> Vec<GraphNode> {
    if nodes.is_empty() {
        return Vec::new();
    }

    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).sorted().dedup().collect();
    let index: AHashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    // Adjacency over known nodes only; self-loops and duplicates are dropped.
    let links: Vec<(usize, usize)> = edges
        .iter()
        .filter_map(|e| Some((*index.get(e.source.as_str())?, *index.get(e.target.as_str())?)))
        .filter(|(s, t)| s != t)
        .sorted()
        .dedup()
        .collect();
    let mut successors = vec![Vec::new(); ids.len()];
    let mut predecessors = vec![Vec::new(); ids.len()];
    for &(s, t) in &links {
        successors[s].push(t);
        predecessors[t].push(s);
    }

    let ranks = assign_ranks(&successors, &predecessors);
    let layers = order_layers(&ranks, &predecessors);
    let placed = place(&layers, options);

    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            node.position = placed[index[node.id.as_str()]];
            node
        })
        .collect()
}

/// Longest-path ranking via Kahn's algorithm.
fn assign_ranks(successors: &[Vec<usize>], predecessors: &[Vec<usize>]) -> Vec<usize> {
    let count = successors.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut rank: Vec<Option<usize>> = vec![None; count];
    let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    for &root in &queue {
        rank[root] = Some(0);
    }

    while let Some(current) = queue.pop_front() {
        let next_rank = rank[current].unwrap_or(0) + 1;
        for &succ in &successors[current] {
            rank[succ] = Some(rank[succ].map_or(next_rank, |r| r.max(next_rank)));
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    // Whatever Kahn could not reach with in-degree zero sits on a cycle.
    let cycle_rank = rank.iter().flatten().max().map_or(0, |r| r + 1);
    (0..count)
        .map(|i| if in_degree[i] == 0 { rank[i].unwrap_or(0) } else { cycle_rank })
        .collect()
}

/// Groups nodes by rank and orders each rank by predecessor barycenter.
fn order_layers(ranks: &[usize], predecessors: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let layer_count = ranks.iter().max().map_or(0, |r| r + 1);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for (node, &rank) in ranks.iter().enumerate() {
        layers[rank].push(node);
    }

    let mut slot = vec![0.0_f64; ranks.len()];
    for layer in &mut layers {
        let keyed: Vec<(f64, usize)> = layer
            .iter()
            .map(|&node| {
                let placed: Vec<f64> = predecessors[node]
                    .iter()
                    .filter(|&&p| ranks[p] < ranks[node])
                    .map(|&p| slot[p])
                    .collect();
                let barycenter = if placed.is_empty() {
                    f64::MAX
                } else {
                    placed.iter().sum::<f64>() / placed.len() as f64
                };
                (barycenter, node)
            })
            .collect();
        *layer = keyed
            .into_iter()
            .sorted_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, node)| node)
            .collect();
        for (i, &node) in layer.iter().enumerate() {
            slot[node] = i as f64;
        }
    }
    layers
}

/// Converts ranks and slots into coordinates, centering each rank on the cross axis.
fn place(layers: &[Vec<usize>], options: &LayoutOptions) -> Vec<Position> {
    let (main_size, cross_size) = match options.direction {
        LayoutDirection::LeftToRight => (options.node_width, options.node_height),
        LayoutDirection::TopToBottom => (options.node_height, options.node_width),
    };
    let extent = |n: usize| {
        n as f64 * cross_size + n.saturating_sub(1) as f64 * options.node_separation
    };
    let widest = layers.iter().map(|l| extent(l.len())).fold(0.0, f64::max);

    let total: usize = layers.iter().map(Vec::len).sum();
    let mut positions = vec![Position::ORIGIN; total];
    for (rank, layer) in layers.iter().enumerate() {
        let main = options.margin + rank as f64 * (main_size + options.rank_separation);
        let offset = (widest - extent(layer.len())) / 2.0;
        for (i, &node) in layer.iter().enumerate() {
            let cross = options.margin + offset + i as f64 * (cross_size + options.node_separation);
            positions[node] = match options.direction {
                LayoutDirection::LeftToRight => Position::new(main, cross),
                LayoutDirection::TopToBottom => Position::new(cross, main),
            };
        }
    }
    positions
}
