//! Qualified name resolution
//!
//! Schema references are `prefix:local` strings. Resolution maps the prefix to
//! its namespace and then to one of three outcomes:
//!
//! - the built-in namespace becomes the scalar library alias (`xsdt::String`)
//! - the target namespace becomes a bare local name (`Address`)
//! - any other namespace keeps its import alias (`atom::Person`)
//!
//! The reverse direction, turning a declared name into its canonical form, is
//! [`Bag::rewrite_type_ref`].

use tracing::trace;
use xsdgen_core::naming::{field_name, safe_identifier};
use xsdgen_core::{TypeRef, XSD_NAMESPACE};

use crate::bag::{Bag, RecordUsage};

/// Import alias for a namespace prefix.
pub fn import_alias(prefix: &str) -> String {
    field_name(prefix)
}

impl Bag<'_> {
    /// Resolve a `prefix:local` reference to a target-language type name.
    ///
    /// `default_prefix` is prepended to the local name unless the reference is to
    /// a built-in type, so that `xml:lang` with prefix `XsdGenHasAttr` resolves to
    /// the holder `xml::XsdGenHasAttrLang`.
    pub fn resolve_qualified_reference(
        &mut self,
        reference: &str,
        default_prefix: &str,
        usage: RecordUsage,
    ) -> String {
        if reference.is_empty() {
            return String::new();
        }

        let (prefix, local) = match reference.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() => (Some(prefix), local),
            _ => (None, reference),
        };
        let namespace = self
            .graph
            .schema
            .namespace(prefix.unwrap_or(""))
            .unwrap_or("")
            .to_string();

        let mut alias = prefix.map(import_alias).unwrap_or_default();
        let mut default_prefix = default_prefix;
        if namespace == XSD_NAMESPACE {
            alias = self.builtin_alias().to_string();
            default_prefix = "";
        }
        if namespace == self.graph.schema.target_namespace {
            alias.clear();
        }

        let name = format!("{}{}", default_prefix, safe_identifier(local));
        if usage == RecordUsage::Yes {
            self.imports.mark_used(&alias);
        }
        trace!("resolved '{}' -> alias '{}', name '{}'", reference, alias, name);

        if alias.is_empty() {
            name
        } else {
            format!("{}::{}", alias, name)
        }
    }

    /// Resolve into a [`TypeRef`]; see [`Bag::resolve_qualified_reference`].
    pub fn resolve_type(&mut self, reference: &str, default_prefix: &str, usage: RecordUsage) -> TypeRef {
        TypeRef::named(self.resolve_qualified_reference(reference, default_prefix, usage))
    }

    /// The bare declared name of a type reference.
    pub fn normalize_type_ref<'t>(&self, ty: &'t TypeRef) -> &'t str {
        ty.bare_name()
    }

    /// Replace the bare name with the canonical declaration's name when the
    /// referenced declaration collapsed into another one.
    pub fn rewrite_type_ref(&self, ty: &TypeRef) -> TypeRef {
        let name = self.normalize_type_ref(ty);
        match self
            .lookup(name)
            .and_then(|id| self.decl(id).equivalent_to.as_deref())
        {
            Some(canonical) => ty.with_bare_name(canonical),
            None => ty.clone(),
        }
    }
}
