//! Generation context for one schema
//!
//! The [`Bag`] owns everything a generation pass accumulates: the declaration
//! arena, the name index, per-node side tables, the naming context stack, the
//! import table and the rendered output. Contribution code only ever talks to
//! the bag; rendering and equivalence live in their own modules as further
//! `impl Bag` blocks.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;
use tracing::debug;
use xsdgen_core::naming::{safe_identifier, AnonymousNames};
use xsdgen_core::{DeclId, Method, NodeId, SchemaGraph, TypeDecl, TypeRef};

use crate::config::GeneratorConfig;
use crate::imports::ImportTable;

/// Name of the built-in character data holder.
pub const CDATA_HOLDER: &str = "XsdGenHasCdata";

/// Field of [`CDATA_HOLDER`] carrying the text content.
pub const CDATA_FIELD: &str = "xsd_gen_cdata";

/// Built-in scalar types whose default values have to be parsed from text.
const PARSE_TYPES: &[&str] = &[
    "Boolean", "Byte", "Decimal", "Double", "Float", "Int", "Integer", "Long",
    "NegativeInteger", "NonNegativeInteger", "NonPositiveInteger", "PositiveInteger", "Short",
    "UnsignedByte", "UnsignedInt", "UnsignedLong", "UnsignedShort",
];

/// One entry of the naming context stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Name of the schema component being contributed.
    Name(String),
    /// Simple type whose facets are being contributed.
    SimpleType(NodeId),
}

/// Whether resolving a reference marks its import alias as used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordUsage {
    Yes,
    No,
}

pub struct Bag<'a> {
    pub(crate) graph: &'a SchemaGraph,
    pub(crate) config: &'a GeneratorConfig,
    pub(crate) decls: Vec<TypeDecl>,
    /// name -> most recently registered declaration of that name
    pub(crate) index: HashMap<String, DeclId>,
    pub(crate) by_origin: HashMap<NodeId, Vec<DeclId>>,
    /// Declarations whose text has been emitted, in emission order.
    pub(crate) written: Vec<DeclId>,
    pub(crate) anon_names: AnonymousNames,
    pub(crate) stack: Vec<Frame>,
    pub(crate) imports: ImportTable,
    pub(crate) walker_types: IndexSet<String>,
    /// (target, implementing type) pairs in declaration order.
    pub(crate) conversions: IndexSet<(TypeRef, String)>,
    /// Holder type a node contributes to its parent's record.
    pub(crate) holders: HashMap<NodeId, TypeRef>,
    /// Value type declared by a simple or complex type node.
    pub(crate) value_types: HashMap<NodeId, TypeRef>,
    pub(crate) contributed: HashSet<NodeId>,
    /// Record that model group particles are embedded into.
    pub(crate) current_decl: Option<DeclId>,
    /// Number of enclosing model groups that repeat.
    pub(crate) repeat_depth: usize,
    pub(crate) notation_calls: Vec<String>,
    pub(crate) out: String,
}

impl<'a> Bag<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a GeneratorConfig) -> Self {
        let taken = graph.schema.xml_namespaces.keys().map(String::as_str);
        let builtin_alias = ImportTable::choose_builtin_alias(taken);
        let imports = ImportTable::new(builtin_alias, config.types_crate.clone());

        let mut bag = Self {
            graph,
            config,
            decls: Vec::new(),
            index: HashMap::new(),
            by_origin: HashMap::new(),
            written: Vec::new(),
            anon_names: AnonymousNames::new(),
            stack: Vec::new(),
            imports,
            walker_types: IndexSet::new(),
            conversions: IndexSet::new(),
            holders: HashMap::new(),
            value_types: HashMap::new(),
            contributed: HashSet::new(),
            current_decl: None,
            repeat_depth: 0,
            notation_calls: Vec::new(),
            out: String::new(),
        };

        let cdata = bag.builtin_type("String");
        let holder = bag.register_type(None, CDATA_HOLDER, None, Vec::new());
        bag.add_field(holder, None, CDATA_FIELD, cdata, "$text", Vec::new());
        bag
    }

    pub fn graph(&self) -> &'a SchemaGraph {
        self.graph
    }

    pub fn config(&self) -> &'a GeneratorConfig {
        self.config
    }

    // ---- declarations -------------------------------------------------

    /// Register a declaration. A later registration under the same name
    /// replaces the earlier one in the name index.
    pub fn register_type(
        &mut self,
        origin: Option<NodeId>,
        name: impl Into<String>,
        underlying: Option<TypeRef>,
        docs: Vec<String>,
    ) -> DeclId {
        let name = name.into();
        let id = DeclId(self.decls.len());
        if let Some(previous) = self.index.insert(name.clone(), id) {
            debug!("declaration '{}' replaces earlier {:?}", name, previous);
        }
        if let Some(node) = origin {
            self.by_origin.entry(node).or_default().push(id);
        }
        self.decls.push(TypeDecl::new(name, underlying, origin, docs));
        id
    }

    pub fn decl(&self, id: DeclId) -> &TypeDecl {
        &self.decls[id.0]
    }

    pub fn decl_mut(&mut self, id: DeclId) -> &mut TypeDecl {
        &mut self.decls[id.0]
    }

    pub fn decls(&self) -> &[TypeDecl] {
        &self.decls
    }

    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.index.get(name).copied()
    }

    pub fn decls_for_origin(&self, node: NodeId) -> &[DeclId] {
        self.by_origin.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_field(
        &mut self,
        decl: DeclId,
        origin: Option<NodeId>,
        name: impl Into<String>,
        ty: TypeRef,
        xml_tag: impl Into<String>,
        docs: Vec<String>,
    ) {
        self.decls[decl.0].add_field(origin, name, ty, xml_tag, docs);
    }

    pub fn add_embed(&mut self, decl: DeclId, origin: Option<NodeId>, ty: TypeRef, docs: Vec<String>) {
        self.decls[decl.0].add_embed(origin, ty, docs);
    }

    pub fn add_method(&mut self, decl: DeclId, method: Method) {
        self.decls[decl.0].add_method(method);
    }

    /// Fresh name for a schema type that has none.
    pub fn allocate_anonymous_name(&mut self, base: &str) -> String {
        self.anon_names.allocate(base)
    }

    // ---- context stack ------------------------------------------------

    pub fn push_name(&mut self, name: impl Into<String>) {
        self.stack.push(Frame::Name(name.into()));
    }

    pub fn push_simple_type(&mut self, node: NodeId) {
        self.stack.push(Frame::SimpleType(node));
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Innermost name on the stack.
    pub fn current_name(&self) -> Option<&str> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Name(name) => Some(name.as_str()),
            Frame::SimpleType(_) => None,
        })
    }

    /// Innermost simple type on the stack.
    pub fn current_simple_type(&self) -> Option<NodeId> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::SimpleType(node) => Some(*node),
            Frame::Name(_) => None,
        })
    }

    /// All names on the stack, outermost first, as one identifier.
    pub fn full_name(&self) -> String {
        self.stack
            .iter()
            .filter_map(|frame| match frame {
                Frame::Name(name) => Some(safe_identifier(name)),
                Frame::SimpleType(_) => None,
            })
            .collect()
    }

    // ---- imports, walkers, conversions --------------------------------

    pub fn builtin_alias(&self) -> &str {
        self.imports.builtin_alias()
    }

    /// Qualified reference to a type of the built-in scalar library.
    pub fn builtin_type(&self, local: &str) -> TypeRef {
        TypeRef::named(format!("{}::{}", self.builtin_alias(), safe_identifier(local)))
    }

    /// Whether a default value of this type has to be parsed from its text form.
    pub fn is_parse_type(&self, ty: &TypeRef) -> bool {
        match ty {
            TypeRef::Named(name) => name
                .strip_prefix(self.builtin_alias())
                .and_then(|rest| rest.strip_prefix("::"))
                .is_some_and(|local| PARSE_TYPES.contains(&local)),
            _ => false,
        }
    }

    pub fn register_import(&mut self, alias: impl Into<String>, path: impl Into<String>) {
        self.imports.register(alias, path);
    }

    pub fn imports(&self) -> &ImportTable {
        &self.imports
    }

    /// Record that `implementor` converts to `target`.
    pub fn declare_conversion(&mut self, target: &TypeRef, implementor: &str) {
        self.conversions.insert((target.clone(), implementor.to_string()));
    }

    pub fn walker_types(&self) -> &IndexSet<String> {
        &self.walker_types
    }

    pub fn is_walkable(&self, name: &str) -> bool {
        self.walker_types.contains(name)
    }

    // ---- side tables --------------------------------------------------

    pub fn holder(&self, node: NodeId) -> Option<&TypeRef> {
        self.holders.get(&node)
    }

    pub fn set_holder(&mut self, node: NodeId, holder: TypeRef) {
        self.holders.insert(node, holder);
    }

    pub fn value_type(&self, node: NodeId) -> Option<&TypeRef> {
        self.value_types.get(&node)
    }

    pub fn set_value_type(&mut self, node: NodeId, ty: TypeRef) {
        self.value_types.insert(node, ty);
    }

    /// Swap the record that particles are embedded into, returning the old one.
    pub fn set_current_decl(&mut self, decl: Option<DeclId>) -> Option<DeclId> {
        std::mem::replace(&mut self.current_decl, decl)
    }

    /// Start filling `decl` with its own content model, outside any enclosing
    /// repeated group. Hand the returned state back to `leave_decl`.
    pub fn enter_decl(&mut self, decl: DeclId) -> (Option<DeclId>, usize) {
        let depth = std::mem::replace(&mut self.repeat_depth, 0);
        (self.set_current_decl(Some(decl)), depth)
    }

    pub fn leave_decl(&mut self, (decl, depth): (Option<DeclId>, usize)) {
        self.current_decl = decl;
        self.repeat_depth = depth;
    }

    pub fn current_decl(&self) -> Option<DeclId> {
        self.current_decl
    }

    pub fn in_repeated_group(&self) -> bool {
        self.repeat_depth > 0
    }

    /// Rendered body text so far.
    pub fn output(&self) -> &str {
        &self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsdgen_core::Schema;

    fn graph() -> SchemaGraph {
        SchemaGraph::new(Schema::new("test.xsd", "urn:test"))
    }

    #[test]
    fn test_cdata_holder_is_registered() {
        let graph = graph();
        let config = GeneratorConfig::default();
        let bag = Bag::new(&graph, &config);

        let id = bag.lookup(CDATA_HOLDER).expect("cdata holder");
        let field = &bag.decl(id).fields[CDATA_FIELD];
        assert_eq!(field.ty, TypeRef::named("xsdt::String"));
        assert_eq!(field.xml_tag, "$text");
    }

    #[test]
    fn test_register_last_write_wins() {
        let graph = graph();
        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);

        let first = bag.register_type(Some(NodeId(1)), "Address", None, vec![]);
        let second = bag.register_type(Some(NodeId(2)), "Address", None, vec![]);
        assert_ne!(first, second);
        assert_eq!(bag.lookup("Address"), Some(second));
        assert_eq!(bag.decls_for_origin(NodeId(1)), &[first]);
        assert!(bag.decls_for_origin(NodeId(9)).is_empty());
    }

    #[test]
    fn test_context_stack() {
        let graph = graph();
        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);

        assert_eq!(bag.current_name(), None);
        bag.push_name("channel");
        bag.push_simple_type(NodeId(4));
        bag.push_name("item-list");

        assert_eq!(bag.current_name(), Some("item-list"));
        assert_eq!(bag.current_simple_type(), Some(NodeId(4)));
        assert_eq!(bag.full_name(), "ChannelItemList");
        assert_eq!(bag.stack_depth(), 3);

        assert_eq!(bag.pop(), Some(Frame::Name("item-list".into())));
        assert_eq!(bag.current_name(), Some("channel"));
        bag.pop();
        bag.pop();
        assert_eq!(bag.stack_depth(), 0);
        assert_eq!(bag.pop(), None);
    }

    #[test]
    fn test_parse_types() {
        let graph = graph();
        let config = GeneratorConfig::default();
        let bag = Bag::new(&graph, &config);

        assert!(bag.is_parse_type(&TypeRef::named("xsdt::Int")));
        assert!(!bag.is_parse_type(&TypeRef::named("xsdt::String")));
        assert!(!bag.is_parse_type(&TypeRef::named("Int")));
    }

    #[test]
    fn test_builtin_alias_avoids_schema_prefixes() {
        let mut schema = Schema::new("test.xsd", "urn:test");
        schema.xml_namespaces.insert("xsdt".into(), "urn:other".into());
        let graph = SchemaGraph::new(schema);
        let config = GeneratorConfig::default();
        let bag = Bag::new(&graph, &config);

        assert_eq!(bag.builtin_alias(), "xsdt0");
        assert_eq!(bag.builtin_type("dateTime"), TypeRef::named("xsdt0::DateTime"));
    }
}
