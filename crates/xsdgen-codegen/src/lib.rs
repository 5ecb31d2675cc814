//! Rust code generator for XML Schema graphs
//!
//! [`generate`] turns one [`SchemaGraph`] into the source text of one Rust module:
//!
//! - every schema component contributes declarations to a [`Bag`]
//! - structurally identical generated declarations collapse into one
//! - declarations render on demand, dependencies first
//! - optional `walk()` traversal methods and their handler table are synthesized
//!
//! Only import aliases that rendered code actually uses make it into the output.

pub mod assemble;
pub mod bag;
pub mod config;
pub mod contribute;
pub mod equivalence;
pub mod error;
pub mod imports;
pub mod render;
pub mod resolver;
pub mod walker;

use tracing::instrument;
use xsdgen_core::SchemaGraph;

pub use assemble::{Assembler, GeneratedSource};
pub use bag::{Bag, Frame, RecordUsage};
pub use config::GeneratorConfig;
pub use equivalence::structurally_equal;
pub use error::CodegenError;
pub use imports::ImportTable;

/// Generate the Rust module for one schema.
#[instrument(skip_all, fields(schema = %graph.schema.load_uri), level = "debug")]
pub fn generate(graph: &SchemaGraph, config: &GeneratorConfig) -> Result<GeneratedSource, CodegenError> {
    graph.validate()?;
    Assembler::new(graph, config).assemble()
}
