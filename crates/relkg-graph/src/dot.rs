//! Graphviz DOT rendering

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use relkg_core::Result;

use crate::{GraphRenderer, GraphView, RenderedGraph};

/// Renders a view as a Graphviz `digraph`
#[derive(Debug, Clone, Copy, Default)]
pub struct DotRenderer;

impl DotRenderer {
    /// Build a petgraph graph with entity labels as node weights and
    /// relation labels as edge weights
    pub fn to_digraph(view: &GraphView) -> DiGraph<String, String> {
        let mut graph = DiGraph::with_capacity(view.nodes.len(), view.edges.len());
        let indices: Vec<NodeIndex> = view
            .nodes
            .iter()
            .map(|node| graph.add_node(node.label.clone()))
            .collect();

        for edge in &view.edges {
            graph.add_edge(indices[edge.from], indices[edge.to], edge.label.clone());
        }
        graph
    }
}

impl GraphRenderer for DotRenderer {
    fn render(&self, view: &GraphView) -> Result<RenderedGraph> {
        let graph = Self::to_digraph(view);
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Rendering DOT graph"
        );
        Ok(RenderedGraph {
            content_type: "text/vnd.graphviz",
            body: format!("{}", Dot::new(&graph)),
        })
    }

    fn name(&self) -> &str {
        "dot"
    }
}
