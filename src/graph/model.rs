use eframe::egui::{Vec2, vec2};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Paper,
    Entity,
    Result,
    Conclusion,
    Unknown,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        Self::Paper,
        Self::Entity,
        Self::Result,
        Self::Conclusion,
        Self::Unknown,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Paper" | "paper" => Self::Paper,
            "Entity" | "entity" => Self::Entity,
            "Result" | "result" => Self::Result,
            "Conclusion" | "conclusion" => Self::Conclusion,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Paper => "Paper",
            Self::Entity => "Entity",
            Self::Result => "Result",
            Self::Conclusion => "Conclusion",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub metadata: Map<String, Value>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_owned(), value.into());
        self
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Scalar metadata rendered as text; nested arrays and objects are skipped.
    pub fn meta_text(&self, key: &str) -> Option<String> {
        match self.metadata.get(key)? {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.meta_str("canonical_name") {
            return name.to_owned();
        }
        if let Some(name) = self.meta_str("name") {
            return name.to_owned();
        }
        if self.kind == NodeKind::Paper {
            return match self.meta_text("year") {
                Some(year) => format!("Paper {year}"),
                None => "Paper".to_owned(),
            };
        }
        self.kind.label().to_owned()
    }

    pub fn initial_position(&self) -> Option<Vec2> {
        let x = self.metadata.get("x").and_then(Value::as_f64)?;
        let y = self.metadata.get("y").and_then(Value::as_f64)?;
        let position = vec2(x as f32, y as f32);
        position.is_finite().then_some(position)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub kind: Option<String>,
    pub context: Option<String>,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind: None,
            context: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphSnapshot {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
