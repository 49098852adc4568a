use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Number, Value};

use super::model::{GraphEdge, GraphNode, GraphSnapshot, NodeKind};

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default, alias = "links")]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: RawId,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(flatten)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(Number),
}

impl RawId {
    fn into_id(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Edge endpoints arrive either as a bare id or as the whole node object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEndpoint {
    Id(RawId),
    Node { id: RawId },
}

impl RawEndpoint {
    fn into_id(self) -> String {
        match self {
            Self::Id(id) | Self::Node { id } => id.into_id(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    source: RawEndpoint,
    target: RawEndpoint,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

pub fn parse_snapshot(raw: &str) -> Result<GraphSnapshot> {
    let parsed: RawSnapshot = serde_json::from_str(raw).context("invalid graph JSON")?;

    let nodes = parsed
        .nodes
        .into_iter()
        .map(|raw_node| GraphNode {
            id: raw_node.id.into_id(),
            kind: raw_node
                .kind
                .as_deref()
                .map(NodeKind::parse)
                .unwrap_or(NodeKind::Unknown),
            metadata: raw_node.metadata,
        })
        .collect::<Vec<_>>();

    let edges = parsed
        .edges
        .into_iter()
        .map(|raw_edge| GraphEdge {
            source: raw_edge.source.into_id(),
            target: raw_edge.target.into_id(),
            kind: raw_edge.kind.filter(|kind| !kind.is_empty()),
            context: raw_edge.context.filter(|context| !context.is_empty()),
        })
        .collect::<Vec<_>>();

    Ok(GraphSnapshot { nodes, edges })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nodes_with_metadata() {
        let snapshot = parse_snapshot(
            r#"{
                "nodes": [
                    {"id": "p1", "type": "Paper", "paper_id": "PMC1", "year": 2020},
                    {"id": "e1", "type": "Entity", "canonical_name": "NAD+", "entity_type": "molecule"}
                ],
                "edges": [{"source": "p1", "target": "e1", "type": "MENTIONS", "context": "abstract"}]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.node_count(), 2);
        assert_eq!(snapshot.nodes[0].kind, NodeKind::Paper);
        assert_eq!(snapshot.nodes[0].meta_str("paper_id"), Some("PMC1"));
        assert!(!snapshot.nodes[0].metadata.contains_key("type"));
        assert_eq!(snapshot.nodes[1].display_name(), "NAD+");
        assert_eq!(snapshot.edges[0].kind.as_deref(), Some("MENTIONS"));
        assert_eq!(snapshot.edges[0].context.as_deref(), Some("abstract"));
    }

    #[test]
    fn inline_node_endpoints_are_normalized_to_ids() {
        let snapshot = parse_snapshot(
            r#"{
                "nodes": [{"id": "a", "type": "Result"}, {"id": "b", "type": "Conclusion"}],
                "edges": [{"source": {"id": "a", "type": "Result", "x": 3.0}, "target": "b"}]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.edges[0], GraphEdge::new("a", "b"));
    }

    #[test]
    fn numeric_ids_and_links_alias_are_accepted() {
        let snapshot = parse_snapshot(
            r#"{"nodes": [{"id": 1}, {"id": 2, "type": "Gene"}], "links": [{"source": 1, "target": {"id": 2}}]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.nodes[0].id, "1");
        assert_eq!(snapshot.nodes[0].kind, NodeKind::Unknown);
        assert_eq!(snapshot.nodes[1].kind, NodeKind::Unknown);
        assert_eq!(snapshot.edges[0], GraphEdge::new("1", "2"));
    }

    #[test]
    fn missing_sections_give_an_empty_snapshot() {
        let snapshot = parse_snapshot("{}").unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_snapshot(r#"{"nodes": [{"type": "Paper"}]}"#).is_err());
        assert!(parse_snapshot("not json").is_err());
    }
}
