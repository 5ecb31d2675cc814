//! Declaration IR: the generated program before it is rendered to text
//!
//! A generation pass registers [`TypeDecl`]s and appends members to them while it
//! walks the schema graph. Rendering later visits every declaration once and
//! turns it into source lines. Declarations reference each other by name through
//! [`TypeRef`]s, so the reference graph may contain cycles.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::naming::is_generated_name;
use crate::schema::NodeId;

/// Index of a declaration inside one generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub usize);

/// Reference to a declared or built-in type, with container wrappers.
///
/// Only the innermost [`TypeRef::Named`] participates in lookups; the wrappers are
/// preserved verbatim when a name is rewritten to its canonical declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    /// `Name` or `alias::Name`.
    Named(String),
    /// Optional (possibly recursive) occurrence, rendered as `Option<Box<T>>`.
    Pointer(Box<TypeRef>),
    /// Repeated occurrence, rendered as `Vec<T>`.
    Repeated(Box<TypeRef>),
    /// Whitespace separated list value, rendered as `<builtin>::ListOf<T>`.
    ListOf(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn pointer(inner: TypeRef) -> Self {
        TypeRef::Pointer(Box::new(inner))
    }

    pub fn repeated(inner: TypeRef) -> Self {
        TypeRef::Repeated(Box::new(inner))
    }

    pub fn list_of(inner: TypeRef) -> Self {
        TypeRef::ListOf(Box::new(inner))
    }

    /// The bare declared name with every wrapper stripped.
    pub fn bare_name(&self) -> &str {
        match self {
            TypeRef::Named(name) => name,
            TypeRef::Pointer(inner) | TypeRef::Repeated(inner) | TypeRef::ListOf(inner) => {
                inner.bare_name()
            }
        }
    }

    /// Same wrappers, innermost name replaced.
    pub fn with_bare_name(&self, name: &str) -> TypeRef {
        match self {
            TypeRef::Named(_) => TypeRef::Named(name.to_string()),
            TypeRef::Pointer(inner) => TypeRef::pointer(inner.with_bare_name(name)),
            TypeRef::Repeated(inner) => TypeRef::repeated(inner.with_bare_name(name)),
            TypeRef::ListOf(inner) => TypeRef::list_of(inner.with_bare_name(name)),
        }
    }

    /// Import alias of a qualified bare name (`xsdt` for `xsdt::String`).
    pub fn alias(&self) -> Option<&str> {
        let (alias, _) = self.bare_name().split_once("::")?;
        let is_ident = !alias.is_empty()
            && alias.chars().all(|c| c.is_alphanumeric() || c == '_');
        is_ident.then_some(alias)
    }

    pub fn is_empty(&self) -> bool {
        self.bare_name().is_empty()
    }

    /// Rust source text. `builtin` is the import alias of the scalar type library.
    pub fn render(&self, builtin: &str) -> String {
        match self {
            TypeRef::Named(name) => name.clone(),
            TypeRef::Pointer(inner) => format!("Option<Box<{}>>", inner.render(builtin)),
            TypeRef::Repeated(inner) => format!("Vec<{}>", inner.render(builtin)),
            TypeRef::ListOf(inner) => format!("{}::ListOf<{}>", builtin, inner.render(builtin)),
        }
    }
}

/// One piece of a method body template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodySegment {
    Text(String),
    /// Filled with the method's return type after it was rewritten to its
    /// canonical name.
    ReturnType,
}

/// Method body as a value-level template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodBody {
    pub segments: Vec<BodySegment>,
}

impl MethodBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().push_text(text)
    }

    pub fn push_text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(BodySegment::Text(text.into()));
        self
    }

    pub fn push_return_type(mut self) -> Self {
        self.segments.push(BodySegment::ReturnType);
        self
    }

    pub fn render(&self, return_type: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                BodySegment::Text(text) => text.as_str(),
                BodySegment::ReturnType => return_type,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    #[default]
    Declared,
    /// Synthesized traversal method; never part of structural comparison.
    Walker,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    /// Serde rename of the field: `tag` for elements, `@tag` for attributes,
    /// `$text` for character data.
    pub xml_tag: String,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub origin: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub ty: TypeRef,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub origin: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Type the method is implemented on.
    pub receiver: String,
    /// Parameters after `&self`, as source text.
    #[serde(default)]
    pub params: String,
    pub return_type: TypeRef,
    pub body: MethodBody,
    pub doc: String,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub kind: MethodKind,
    #[serde(default)]
    pub origin: Option<NodeId>,
}

/// A declared target type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    /// Aliased type for scalar declarations; `None` for records.
    pub underlying: Option<TypeRef>,
    /// Canonical declaration this one collapsed into.
    pub equivalent_to: Option<String>,
    /// Keyed by the embedded type's bare name.
    pub embeds: IndexMap<String, Embed>,
    pub fields: IndexMap<String, Field>,
    pub methods: IndexMap<String, Method>,
    #[serde(default)]
    pub docs: Vec<String>,
    #[serde(default)]
    pub origin: Option<NodeId>,
    #[serde(skip)]
    pub rendered: bool,
    #[serde(skip)]
    pub member_written: HashSet<String>,
}

impl TypeDecl {
    pub fn new(
        name: impl Into<String>,
        underlying: Option<TypeRef>,
        origin: Option<NodeId>,
        docs: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            underlying,
            equivalent_to: None,
            embeds: IndexMap::new(),
            fields: IndexMap::new(),
            methods: IndexMap::new(),
            docs,
            origin,
            rendered: false,
            member_written: HashSet::new(),
        }
    }

    pub fn is_record(&self) -> bool {
        self.underlying.is_none()
    }

    pub fn is_alias(&self) -> bool {
        self.equivalent_to.is_some()
    }

    /// Whether the equivalence engine may collapse this declaration.
    pub fn is_dedup_candidate(&self) -> bool {
        is_generated_name(&self.name)
    }

    pub fn add_field(
        &mut self,
        origin: Option<NodeId>,
        name: impl Into<String>,
        ty: TypeRef,
        xml_tag: impl Into<String>,
        docs: Vec<String>,
    ) -> &mut Field {
        let name = name.into();
        let field = Field {
            name: name.clone(),
            ty,
            xml_tag: xml_tag.into(),
            docs,
            origin,
        };
        let (index, _) = self.fields.insert_full(name, field);
        &mut self.fields[index]
    }

    pub fn add_embed(&mut self, origin: Option<NodeId>, ty: TypeRef, docs: Vec<String>) -> &mut Embed {
        let key = ty.bare_name().to_string();
        let (index, _) = self.embeds.insert_full(key, Embed { ty, docs, origin });
        &mut self.embeds[index]
    }

    pub fn add_method(&mut self, method: Method) -> &mut Method {
        let (index, _) = self.methods.insert_full(method.name.clone(), method);
        &mut self.methods[index]
    }

    /// Every type this declaration refers to: embeds, fields, method return
    /// types and the underlying type.
    pub fn referenced_types(&self) -> Vec<TypeRef> {
        self.embeds
            .values()
            .map(|e| e.ty.clone())
            .chain(self.fields.values().map(|f| f.ty.clone()))
            .chain(self.methods.values().map(|m| m.return_type.clone()))
            .chain(self.underlying.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_ref_wrappers() {
        let ty = TypeRef::repeated(TypeRef::pointer(TypeRef::named("TxsdItem")));
        assert_eq!(ty.bare_name(), "TxsdItem");
        assert_eq!(ty.render("xsdt"), "Vec<Option<Box<TxsdItem>>>");

        let rewritten = ty.with_bare_name("Item");
        assert_eq!(rewritten.render("xsdt"), "Vec<Option<Box<Item>>>");

        let list = TypeRef::list_of(TypeRef::named("xsdt::Int"));
        assert_eq!(list.render("xsdt0"), "xsdt0::ListOf<xsdt::Int>");
        assert_eq!(list.alias(), Some("xsdt"));
    }

    #[test]
    fn test_alias_requires_identifier_prefix() {
        assert_eq!(TypeRef::named("Address").alias(), None);
        assert_eq!(TypeRef::named("ns1::Address").alias(), Some("ns1"));
        assert_eq!(TypeRef::named("Result<(), xsdt::WalkError>").alias(), None);
    }

    #[test]
    fn test_method_body_fills_return_type_slot() {
        let body = MethodBody::text("ReturnType(")
            .push_return_type()
            .push_text("::from(self.0))");
        assert_eq!(body.render("xsdt::String"), "ReturnType(xsdt::String::from(self.0))");
    }

    #[test]
    fn test_members_keyed_by_name() {
        let mut decl = TypeDecl::new("TxsdAddress", None, None, vec![]);
        decl.add_field(None, "city", TypeRef::named("xsdt::String"), "city", vec![]);
        decl.add_field(None, "city", TypeRef::named("xsdt::Token"), "city", vec![]);
        decl.add_embed(None, TypeRef::named("XsdGenHasCdata"), vec![]);
        decl.add_embed(None, TypeRef::named("XsdGenHasCdata"), vec![]);

        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.fields["city"].ty, TypeRef::named("xsdt::Token"));
        assert_eq!(decl.embeds.len(), 1);
        assert!(decl.is_record());
        assert!(decl.is_dedup_candidate());
        assert_eq!(decl.referenced_types().len(), 2);
    }
}
