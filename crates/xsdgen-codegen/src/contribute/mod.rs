//! Schema contributions
//!
//! Every schema node kind knows which declarations, members and side-table
//! entries it adds to the [`Bag`]. Contributions run once per node, top-level
//! components first, and nested nodes are contributed by their parent when it
//! needs their holder or value type.

mod attribute;
mod complex_type;
mod element;
mod model_group;
mod simple_type;

pub use simple_type::conversion_method_name;

use tracing::trace;
use xsdgen_core::naming::{field_name, safe_identifier};
use xsdgen_core::schema::module_name_for;
use xsdgen_core::{DeclId, Method, MethodBody, MethodKind, NodeId, SchemaNode, TypeRef};

use crate::bag::{Bag, RecordUsage};
use crate::resolver::import_alias;
use crate::CodegenError;

pub const ATTR_HOLDER: &str = "XsdGenHasAttr";
pub const ATT_GROUP_HOLDER: &str = "XsdGenHasAttGroup";
pub const ELEM_HOLDER: &str = "XsdGenHasElem";
pub const ELEMS_HOLDER: &str = "XsdGenHasElems";
pub const GROUP_HOLDER: &str = "XsdGenHasGroup";

/// A schema component that adds declarations to a generation pass.
pub trait Contribute {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError>;
}

impl Contribute for SchemaNode {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        match self {
            SchemaNode::Annotation(_) => Ok(()),
            SchemaNode::Attribute(a) => a.contribute(id, bag),
            SchemaNode::AttributeGroup(g) => g.contribute(id, bag),
            SchemaNode::Element(e) => e.contribute(id, bag),
            SchemaNode::Group(g) => g.contribute(id, bag),
            SchemaNode::Sequence(m) | SchemaNode::Choice(m) => m.contribute(id, bag),
            SchemaNode::ComplexType(c) => c.contribute(id, bag),
            SchemaNode::SimpleType(s) => s.contribute(id, bag),
            SchemaNode::Notation(n) => {
                bag.notation_calls.push(format!(
                    "notations.add({:?}, {:?}, {:?});",
                    n.name, n.public, n.system
                ));
                Ok(())
            }
        }
    }
}

/// Run one contribution and check that it left the context stack as it found it.
pub fn contribute_checked<C: Contribute + ?Sized>(
    bag: &mut Bag<'_>,
    id: NodeId,
    contributor: &C,
) -> Result<(), CodegenError> {
    let depth = bag.stack_depth();
    contributor.contribute(id, bag)?;
    if bag.stack_depth() != depth {
        return Err(CodegenError::UnbalancedStack {
            node: id,
            depth: bag.stack_depth(),
        });
    }
    Ok(())
}

/// Contribute a node unless that already happened.
pub fn contribute_node(bag: &mut Bag<'_>, id: NodeId) -> Result<(), CodegenError> {
    if !bag.contributed.insert(id) {
        return Ok(());
    }
    let node = bag.graph().node(id)?;
    trace!("contributing {} {}", node.kind(), id);
    contribute_checked(bag, id, node)
}

/// Contribute the whole schema: imports first, then every top-level component.
pub fn contribute_schema(bag: &mut Bag<'_>) -> Result<(), CodegenError> {
    let schema = &bag.graph().schema;

    for import in &schema.imports {
        let path = format!(
            "{}::{}",
            bag.config().base_path,
            module_name_for(&import.schema_location)
        );
        for (prefix, uri) in &schema.xml_namespaces {
            if !prefix.is_empty() && *uri == import.namespace {
                bag.register_import(import_alias(prefix), path.clone());
            }
        }
    }

    let top_level = schema
        .notations
        .iter()
        .chain(&schema.simple_types)
        .chain(&schema.attributes)
        .chain(&schema.attribute_groups)
        .chain(&schema.complex_types)
        .chain(&schema.groups)
        .chain(&schema.elements);
    for &id in top_level {
        contribute_node(bag, id)?;
    }
    Ok(())
}

/// Value type of an attribute or element: the resolved `type`, the inline
/// type, or the built-in string.
fn value_type(
    bag: &mut Bag<'_>,
    type_name: Option<&str>,
    inline: Option<NodeId>,
) -> Result<TypeRef, CodegenError> {
    if let Some(type_name) = type_name {
        return Ok(bag.resolve_type(type_name, "", RecordUsage::No));
    }
    if let Some(inline) = inline {
        contribute_node(bag, inline)?;
        if let Some(ty) = bag.value_type(inline) {
            return Ok(ty.clone());
        }
    }
    Ok(bag.builtin_type("string"))
}

/// Type name of a complex or simple type: its own name, or a fresh anonymous one
/// derived from the enclosing component.
fn type_name(bag: &mut Bag<'_>, name: Option<&str>) -> String {
    match name {
        Some(name) => safe_identifier(name),
        None => {
            let base = bag
                .current_name()
                .map(str::to_string)
                .unwrap_or_else(|| bag.full_name());
            bag.allocate_anonymous_name(&base)
        }
    }
}

/// Holder name suffix that keeps local holders of different types apart.
fn type_suffix(ty: &TypeRef) -> String {
    safe_identifier(ty.bare_name())
}

/// Contribute `ids` and embed each resulting holder into `decl`.
fn embed_holders(bag: &mut Bag<'_>, decl: DeclId, ids: &[NodeId]) -> Result<(), CodegenError> {
    for &id in ids {
        contribute_node(bag, id)?;
        if let Some(holder) = bag.holder(id).cloned() {
            bag.add_embed(decl, Some(id), holder, Vec::new());
        }
    }
    Ok(())
}

/// `<name>_default()` returning a `default` or `fixed` value.
fn default_method(
    bag: &Bag<'_>,
    receiver: &str,
    name: &str,
    ty: &TypeRef,
    value: &str,
    origin: NodeId,
) -> Method {
    let body = if bag.is_parse_type(ty) {
        MethodBody::text(format!("{:?}.parse::<", value))
            .push_return_type()
            .push_text(">().unwrap_or_default()")
    } else {
        MethodBody::new()
            .push_return_type()
            .push_text(format!("::from({:?})", value))
    };
    Method {
        name: field_name(&format!("{}_default", name)),
        receiver: receiver.to_string(),
        params: String::new(),
        return_type: ty.clone(),
        body,
        doc: format!("Returns the default value of `{}`: `{}`.", name, value),
        docs: Vec::new(),
        kind: MethodKind::Declared,
        origin: Some(origin),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use xsdgen_core::schema::{Notation, Schema};
    use xsdgen_core::SchemaGraph;

    struct Unbalanced;

    impl Contribute for Unbalanced {
        fn contribute(&self, _id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
            bag.push_name("leftover");
            Ok(())
        }
    }

    #[test]
    fn test_unbalanced_stack_is_an_error() {
        let graph = SchemaGraph::new(Schema::new("test.xsd", ""));
        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);

        let err = contribute_checked(&mut bag, NodeId(7), &Unbalanced);
        assert!(matches!(
            err,
            Err(CodegenError::UnbalancedStack { node: NodeId(7), depth: 1 })
        ));
    }

    #[test]
    fn test_nodes_contribute_once() -> Result<(), CodegenError> {
        let mut graph = SchemaGraph::new(Schema::new("test.xsd", ""));
        let id = graph.add(SchemaNode::Notation(Notation {
            name: "gif".into(),
            public: "image/gif".into(),
            system: String::new(),
            annotation: None,
        }));
        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);

        contribute_node(&mut bag, id)?;
        contribute_node(&mut bag, id)?;
        assert_eq!(bag.notation_calls, vec![r#"notations.add("gif", "image/gif", "");"#]);
        Ok(())
    }

    #[test]
    fn test_imports_are_registered_per_prefix() -> Result<(), CodegenError> {
        let mut schema = Schema::new("feed.xsd", "urn:feed");
        schema.xml_namespaces.insert("atom".into(), "urn:atom".into());
        schema.imports.push(xsdgen_core::schema::SchemaImport {
            namespace: "urn:atom".into(),
            schema_location: "atom.xsd".into(),
        });
        let graph = SchemaGraph::new(schema);
        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);

        contribute_schema(&mut bag)?;
        assert!(bag.imports().is_registered("atom"));
        assert!(!bag.imports().is_used("atom"));
        Ok(())
    }

    #[test]
    fn test_default_method_bodies() {
        let graph = SchemaGraph::new(Schema::new("test.xsd", ""));
        let config = GeneratorConfig::default();
        let bag = Bag::new(&graph, &config);

        let parsed = default_method(&bag, "H", "count", &TypeRef::named("xsdt::Int"), "3", NodeId(0));
        assert_eq!(parsed.name, "count_default");
        assert_eq!(parsed.body.render("xsdt::Int"), r#""3".parse::<xsdt::Int>().unwrap_or_default()"#);

        let text = default_method(&bag, "H", "type", &TypeRef::named("xsdt::String"), "en", NodeId(0));
        assert_eq!(text.name, "type_default");
        assert_eq!(text.body.render("xsdt::String"), r#"xsdt::String::from("en")"#);
    }
}
