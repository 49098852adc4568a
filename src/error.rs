use thiserror::Error;

/// Engine-level failures. None of them is fatal to the host: callers degrade to a partial or
/// empty render and surface the diagnostic.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("{} edge(s) reference unknown node ids: {indices:?}", indices.len())]
    DanglingEdge { indices: Vec<usize> },

    #[error("snapshot contains no nodes")]
    EmptySnapshot,

    #[error("viewport scale {scale} is outside the allowed range")]
    InvalidTransform { scale: f32 },

    #[error("node id {id:?} appears more than once")]
    DuplicateNode { id: String },

    #[error("configuration rejected: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
