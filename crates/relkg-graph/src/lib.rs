//! relkg Graph - Knowledge graph views and rendering
//!
//! A [`GraphView`] is the renderer-neutral shape of a set of triplets: one
//! node per distinct entity name and one directed, labelled edge per
//! triplet. Renderers turn a view into a displayable document.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use relkg_core::{Entity, RelkgError, Result, Triplet};
use serde::{Deserialize, Serialize};

pub mod dot;
pub mod html;

pub use dot::DotRenderer;
pub use html::{HtmlRenderer, HtmlStyle};

// ============================================================================
// Graph View
// ============================================================================

/// Entity node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: usize,
    pub label: String,
    /// Hover text; the entity summary when one is known
    pub title: String,
}

/// Directed relation edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: usize,
    pub to: usize,
    pub label: String,
}

/// Nodes and edges of a knowledge graph, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphView {
    /// Build a view with one node per unique head or tail
    pub fn from_triplets(triplets: &[Triplet]) -> Self {
        let mut view = Self::default();
        let mut index: HashMap<&str, usize> = HashMap::new();

        for triplet in triplets {
            let from = view.node_id(&mut index, &triplet.head);
            let to = view.node_id(&mut index, &triplet.tail);
            view.edges.push(GraphEdge {
                from,
                to,
                label: triplet.relation.clone(),
            });
        }

        view
    }

    /// Use entity summaries as node hover text
    pub fn with_entities(mut self, entities: &BTreeMap<String, Entity>) -> Self {
        for node in &mut self.nodes {
            if let Some(entity) = entities.get(&node.label) {
                if !entity.summary.is_empty() {
                    node.title = entity.summary.clone();
                }
            }
        }
        self
    }

    fn node_id<'a>(&mut self, index: &mut HashMap<&'a str, usize>, name: &'a str) -> usize {
        *index.entry(name).or_insert_with(|| {
            let id = self.nodes.len();
            self.nodes.push(GraphNode {
                id,
                label: name.to_string(),
                title: name.to_string(),
            });
            id
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// A rendered document and its media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedGraph {
    pub content_type: &'static str,
    pub body: String,
}

/// Trait for graph renderers
pub trait GraphRenderer: Send + Sync {
    fn render(&self, view: &GraphView) -> Result<RenderedGraph>;

    /// Renderer name for logging
    fn name(&self) -> &str;
}

/// Renders the view itself as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl GraphRenderer for JsonRenderer {
    fn render(&self, view: &GraphView) -> Result<RenderedGraph> {
        let body = serde_json::to_string_pretty(view)
            .map_err(|e| RelkgError::Render(format!("JSON serialization failed: {e}")))?;
        Ok(RenderedGraph {
            content_type: "application/json",
            body,
        })
    }

    fn name(&self) -> &str {
        "json"
    }
}

/// Output formats selectable by name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    #[default]
    Json,
    Dot,
    Html,
}

impl RenderFormat {
    /// Renderer for this format with default styling
    pub fn renderer(&self) -> Box<dyn GraphRenderer> {
        match self {
            Self::Json => Box::new(JsonRenderer),
            Self::Dot => Box::new(DotRenderer),
            Self::Html => Box::new(HtmlRenderer::default()),
        }
    }
}

impl fmt::Display for RenderFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Dot => "dot",
            Self::Html => "html",
        };
        f.write_str(name)
    }
}

impl FromStr for RenderFormat {
    type Err = RelkgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "dot" | "graphviz" => Ok(Self::Dot),
            "html" => Ok(Self::Html),
            other => Err(RelkgError::InvalidInput(format!(
                "unknown output format '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Triplet> {
        vec![
            Triplet::new("Paris", "capital of", "France"),
            Triplet::new("Paris", "located in", "Europe"),
            Triplet::new("France", "part of", "Europe"),
        ]
    }

    #[test]
    fn test_view_deduplicates_nodes() {
        let view = GraphView::from_triplets(&sample());

        let labels: Vec<_> = view.nodes.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Paris", "France", "Europe"]);
        assert_eq!(view.edges.len(), 3);
        assert_eq!(
            view.edges[2],
            GraphEdge {
                from: 1,
                to: 2,
                label: "part of".to_string()
            }
        );
    }

    #[test]
    fn test_self_loop_uses_single_node() {
        let view = GraphView::from_triplets(&[Triplet::new("A", "same as", "A")]);
        assert_eq!(view.nodes.len(), 1);
        assert_eq!((view.edges[0].from, view.edges[0].to), (0, 0));
    }

    #[test]
    fn test_entity_summaries_become_titles() {
        let mut entities = BTreeMap::new();
        entities.insert(
            "Paris".to_string(),
            Entity::new("Paris", "https://en.wikipedia.org/wiki/Paris", "Capital of France."),
        );

        let view = GraphView::from_triplets(&sample()).with_entities(&entities);
        assert_eq!(view.nodes[0].title, "Capital of France.");
        assert_eq!(view.nodes[1].title, "France");
    }

    #[test]
    fn test_empty_view() {
        assert!(GraphView::from_triplets(&[]).is_empty());
    }

    #[test]
    fn test_json_renderer() {
        let rendered = JsonRenderer.render(&GraphView::from_triplets(&sample())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();

        assert_eq!(rendered.content_type, "application/json");
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["edges"][0]["label"], "capital of");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("HTML".parse::<RenderFormat>().unwrap(), RenderFormat::Html);
        assert_eq!("graphviz".parse::<RenderFormat>().unwrap(), RenderFormat::Dot);
        assert!("svg".parse::<RenderFormat>().is_err());
        assert_eq!(RenderFormat::Dot.renderer().name(), "dot");
    }
}
