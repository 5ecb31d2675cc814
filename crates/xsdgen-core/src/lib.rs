//! Schema object model and declaration IR for the xsdgen code generator

pub mod decl;
pub mod error;
pub mod naming;
pub mod schema;

pub use decl::{BodySegment, DeclId, Embed, Field, Method, MethodBody, MethodKind, TypeDecl, TypeRef};
pub use error::CoreError;
pub use naming::AnonymousNames;
pub use schema::{NodeId, Schema, SchemaGraph, SchemaNode, XSD_NAMESPACE};
