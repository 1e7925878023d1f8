//! petgraph-based directed graph wrapper for the visual workflow.
//!
//! The graph is built once from a workflow snapshot and never mutated. Every
//! traversal keeps its own visit state, so the validator can query it as many
//! times as it needs during a single pass.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef, Reversed};

use super::types::{NodeType, Workflow, WorkflowEdge, WorkflowNode, branch_label};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub node_type: NodeType,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    pub source_handle: Option<String>,
    pub label: Option<String>,
}

impl EdgeLabel {
    pub fn branch_label(&self) -> String {
        branch_label(self.label.as_deref(), self.source_handle.as_deref())
    }
}

/// An edge left out of the graph because an endpoint does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingEdge {
    /// Index of the edge in the workflow's edge list.
    pub position: usize,
    pub source: String,
    pub target: String,
    pub missing_source: bool,
    pub missing_target: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

pub struct WorkflowGraph {
    pub graph: DiGraph<GraphNode, EdgeLabel>,
    pub node_indices: HashMap<String, NodeIndex>,
    dangling_edges: Vec<DanglingEdge>,
    duplicate_ids: Vec<String>,
}

impl WorkflowGraph {
    pub fn build(workflow: &Workflow) -> Self {
        Self::from_parts(&workflow.nodes, &workflow.edges)
    }

    pub fn from_parts(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut dangling_edges = Vec::new();
        let mut duplicate_ids = Vec::new();

        // Add all nodes; a repeated id keeps the first node
        for node in nodes {
            if node_indices.contains_key(node.id()) {
                duplicate_ids.push(node.id().to_string());
                continue;
            }
            let idx = graph.add_node(GraphNode {
                id: node.id().to_string(),
                node_type: node.node_type(),
                label: node.display_label(),
            });
            node_indices.insert(node.id().to_string(), idx);
        }

        // Add all edges
        for (position, edge) in edges.iter().enumerate() {
            let source_idx = node_indices.get(&edge.source);
            let target_idx = node_indices.get(&edge.target);

            match (source_idx, target_idx) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(
                        s,
                        t,
                        EdgeLabel {
                            source_handle: edge.source_handle.clone(),
                            label: edge.label.clone(),
                        },
                    );
                }
                (s, t) => {
                    tracing::debug!(
                        position,
                        source = %edge.source,
                        target = %edge.target,
                        "edge references an unknown node, left out of the graph"
                    );
                    dangling_edges.push(DanglingEdge {
                        position,
                        source: edge.source.clone(),
                        target: edge.target.clone(),
                        missing_source: s.is_none(),
                        missing_target: t.is_none(),
                    });
                }
            }
        }

        WorkflowGraph {
            graph,
            node_indices,
            dangling_edges,
            duplicate_ids,
        }
    }

    pub fn dangling_edges(&self) -> &[DanglingEdge] {
        &self.dangling_edges
    }

    pub fn duplicate_ids(&self) -> &[String] {
        &self.duplicate_ids
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.node_indices.contains_key(node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&GraphNode> {
        self.node_indices.get(node_id).map(|&idx| &self.graph[idx])
    }

    pub fn node_type(&self, node_id: &str) -> Option<NodeType> {
        self.node(node_id).map(|n| n.node_type)
    }

    /// Display label of a node, or the raw id if the node is unknown.
    pub fn display_label<'a>(&'a self, node_id: &'a str) -> &'a str {
        self.node(node_id).map(|n| n.label.as_str()).unwrap_or(node_id)
    }

    /// Outgoing edges of a node in declaration order.
    pub fn successors(&self, node_id: &str) -> Vec<(&str, &EdgeLabel)> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| (self.graph[e.target()].id.as_str(), e.weight()))
            .collect()
    }

    pub fn predecessors(&self, node_id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .collect();
        edges.sort_by_key(|e| e.id());
        edges
            .into_iter()
            .map(|e| self.graph[e.source()].id.as_str())
            .collect()
    }

    pub fn outgoing_edges(&self, node_id: &str) -> Vec<(&str, &EdgeLabel)> {
        self.successors(node_id)
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        self.predecessors(node_id).len()
    }

    pub fn outgoing_count(&self, node_id: &str) -> usize {
        self.successors(node_id).len()
    }

    /// Three-colour DFS from every unvisited node, driven by an explicit
    /// stack. Returns as soon as an edge into a gray node is seen, which
    /// includes self-loops.
    pub fn has_cycle(&self) -> bool {
        let mut color = vec![Color::White; self.graph.node_count()];
        let mut stack = Vec::new();

        for root in self.graph.node_indices() {
            if color[root.index()] != Color::White {
                continue;
            }
            color[root.index()] = Color::Gray;
            stack.push((root, self.graph.neighbors(root)));

            while let Some((node, neighbors)) = stack.last_mut() {
                let node = *node;
                match neighbors.next() {
                    Some(next) => match color[next.index()] {
                        Color::Gray => return true,
                        Color::White => {
                            color[next.index()] = Color::Gray;
                            stack.push((next, self.graph.neighbors(next)));
                        }
                        Color::Black => {}
                    },
                    None => {
                        color[node.index()] = Color::Black;
                        stack.pop();
                    }
                }
            }
        }

        false
    }

    /// Ids reachable from `start_id` along edge direction, including the start
    /// itself. Empty when there is no start or it is not in the graph.
    pub fn reachable_from(&self, start_id: Option<&str>) -> HashSet<&str> {
        let mut reached = HashSet::new();
        let Some(&start) = start_id.and_then(|id| self.node_indices.get(id)) else {
            return reached;
        };

        let mut bfs = Bfs::new(&self.graph, start);
        while let Some(nx) = bfs.next(&self.graph) {
            reached.insert(self.graph[nx].id.as_str());
        }
        reached
    }

    /// Ids from which `target_id` can be reached, including the target itself.
    /// Empty when there is no target or it is not in the graph.
    pub fn reaches_target(&self, target_id: Option<&str>) -> HashSet<&str> {
        let mut reached = HashSet::new();
        let Some(&target) = target_id.and_then(|id| self.node_indices.get(id)) else {
            return reached;
        };

        let reversed = Reversed(&self.graph);
        let mut bfs = Bfs::new(reversed, target);
        while let Some(nx) = bfs.next(reversed) {
            reached.insert(self.graph[nx].id.as_str());
        }
        reached
    }
}
