use thiserror::Error;

use crate::schema::NodeId;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown schema node: {0}")]
    UnknownNode(NodeId),

    #[error("Invalid schema graph: {0}")]
    InvalidGraph(String),

    #[error("Schema graph JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
