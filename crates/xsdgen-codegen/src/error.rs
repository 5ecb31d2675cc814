//! Error types for code generation
//!
//! The rendering algorithm itself never fails on unresolved type references; those
//! degrade to the raw reference text. Errors here cover malformed input graphs,
//! contributions that leave the context stack unbalanced, and configuration.

use thiserror::Error;
use xsdgen_core::{CoreError, NodeId};

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Code generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Unbalanced context stack after contributing {node}: {depth} frame(s) left")]
    UnbalancedStack { node: NodeId, depth: usize },

    #[error("Invalid generator config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Format error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("IR serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodegenError {
    pub fn generation(message: impl Into<String>) -> Self {
        CodegenError::Generation(message.into())
    }
}
