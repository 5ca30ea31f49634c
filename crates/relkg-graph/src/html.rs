//! Interactive HTML rendering with vis-network
//!
//! Produces a single self-contained page that loads vis-network from a CDN
//! and embeds the graph data inline as JSON.

use relkg_core::{RelkgError, Result};
use serde_json::{json, Value};

use crate::{GraphRenderer, GraphView, RenderedGraph};

const VIS_NETWORK_URL: &str = "https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js";

/// Visual and physics settings for the rendered page
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlStyle {
    pub title: String,
    pub height: String,
    pub background: String,
    pub node_color: String,
    pub node_shape: String,
    pub node_distance: u32,
    pub central_gravity: f64,
    pub spring_length: u32,
    pub spring_constant: f64,
    pub damping: f64,
}

impl Default for HtmlStyle {
    fn default() -> Self {
        Self {
            title: "Knowledge Graph".to_string(),
            height: "700px".to_string(),
            background: "#eeeeee".to_string(),
            node_color: "#00FF00".to_string(),
            node_shape: "circle".to_string(),
            node_distance: 200,
            central_gravity: 0.2,
            spring_length: 200,
            spring_constant: 0.05,
            damping: 0.09,
        }
    }
}

/// Renders a view as an interactive HTML page
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer {
    style: HtmlStyle,
}

impl HtmlRenderer {
    pub fn new(style: HtmlStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &HtmlStyle {
        &self.style
    }

    fn nodes(&self, view: &GraphView) -> Value {
        view.nodes
            .iter()
            .map(|node| {
                json!({
                    "id": node.id,
                    "label": node.label,
                    "title": node.title,
                    "shape": self.style.node_shape,
                    "color": self.style.node_color,
                })
            })
            .collect()
    }

    fn edges(view: &GraphView) -> Value {
        view.edges
            .iter()
            .map(|edge| {
                json!({
                    "from": edge.from,
                    "to": edge.to,
                    "label": edge.label,
                    "title": edge.label,
                    "arrows": "to",
                })
            })
            .collect()
    }

    fn options(&self) -> Value {
        json!({
            "physics": {
                "solver": "repulsion",
                "repulsion": {
                    "nodeDistance": self.style.node_distance,
                    "centralGravity": self.style.central_gravity,
                    "springLength": self.style.spring_length,
                    "springConstant": self.style.spring_constant,
                    "damping": self.style.damping,
                },
            },
            "edges": { "smooth": { "type": "dynamic" } },
        })
    }
}

impl GraphRenderer for HtmlRenderer {
    fn render(&self, view: &GraphView) -> Result<RenderedGraph> {
        tracing::debug!(
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            "Rendering HTML graph"
        );
        let nodes = script_json(&self.nodes(view))?;
        let edges = script_json(&Self::edges(view))?;
        let options = script_json(&self.options())?;

        let body = format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{script}"></script>
<style>
  body {{ margin: 0; font-family: sans-serif; }}
  #graph {{ width: 100%; height: {height}; background-color: {background}; }}
  .empty {{ padding: 1em; }}
</style>
</head>
<body>
{empty}<div id="graph"></div>
<script>
  var nodes = new vis.DataSet({nodes});
  var edges = new vis.DataSet({edges});
  var container = document.getElementById("graph");
  var network = new vis.Network(container, {{ nodes: nodes, edges: edges }}, {options});
</script>
</body>
</html>
"#,
            title = escape_html(&self.style.title),
            script = VIS_NETWORK_URL,
            height = escape_html(&self.style.height),
            background = escape_html(&self.style.background),
            empty = if view.is_empty() {
                "<p class=\"empty\">No relations were extracted.</p>\n"
            } else {
                ""
            },
        );

        Ok(RenderedGraph {
            content_type: "text/html; charset=utf-8",
            body,
        })
    }

    fn name(&self) -> &str {
        "html"
    }
}

/// Serialize for embedding inside a `<script>` element
fn script_json(value: &Value) -> Result<String> {
    serde_json::to_string(value)
        .map(|s| s.replace("</", "<\\/"))
        .map_err(|e| RelkgError::Render(format!("JSON serialization failed: {e}")))
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
