//! Structural deduplication of generated declarations
//!
//! Anonymous and holder declarations (names starting with `Txsd` or `XsdGen`)
//! collapse into an earlier declaration of identical shape. The collapsed one is
//! never emitted; every reference to it is rewritten to the canonical name.
//!
//! The canonical declaration is chosen by a fixed rule so that it does not
//! depend on which reference happens to trigger rendering first:
//!
//! 1. the first match among already emitted declarations, in emission order
//! 2. otherwise the first match, in registration order, among declarations not
//!    yet emitted that are either schema-named or registered before the candidate
//!
//! A match found by the second rule is emitted immediately.

use std::collections::HashSet;

use tracing::debug;
use xsdgen_core::{DeclId, MethodKind, TypeDecl};

use crate::bag::Bag;
use crate::CodegenError;

/// Whether two declarations have the same shape.
///
/// Compares the underlying type, embedded type names, `(name, type, tag)` of
/// every field and `(name, return type, body)` of every method. Walker methods
/// are ignored since they are synthesized during rendering. Member order and
/// documentation do not matter.
pub fn structurally_equal(a: &TypeDecl, b: &TypeDecl) -> bool {
    if a.underlying != b.underlying {
        return false;
    }

    let embeds = |d: &TypeDecl| d.embeds.keys().cloned().collect::<HashSet<_>>();
    if embeds(a) != embeds(b) {
        return false;
    }

    let fields = |d: &TypeDecl| {
        d.fields
            .values()
            .map(|f| (f.name.clone(), f.ty.clone(), f.xml_tag.clone()))
            .collect::<HashSet<_>>()
    };
    if fields(a) != fields(b) {
        return false;
    }

    let methods = |d: &TypeDecl| {
        d.methods
            .values()
            .filter(|m| m.kind != MethodKind::Walker)
            .map(|m| (m.name.clone(), m.return_type.clone(), m.body.clone()))
            .collect::<HashSet<_>>()
    };
    methods(a) == methods(b)
}

impl Bag<'_> {
    /// Decide whether `id` collapses into another declaration.
    ///
    /// Runs at most once per declaration, when it is first rendered.
    pub(crate) fn resolve_equivalence(&mut self, id: DeclId) -> Result<(), CodegenError> {
        let candidate = self.decl(id);
        if candidate.is_alias() || !candidate.is_dedup_candidate() {
            return Ok(());
        }

        let among_written = self.written.iter().copied().find(|&other| {
            other != id
                && !self.decl(other).is_alias()
                && structurally_equal(candidate, self.decl(other))
        });
        let canonical = among_written.or_else(|| {
            self.decls
                .iter()
                .enumerate()
                .find(|(index, other)| {
                    *index != id.0
                        && !other.rendered
                        && !other.is_alias()
                        && (!other.is_dedup_candidate() || *index < id.0)
                        && structurally_equal(candidate, other)
                })
                .map(|(index, _)| DeclId(index))
        });

        let Some(canonical) = canonical else {
            return Ok(());
        };
        let canonical_name = self.decl(canonical).name.clone();
        debug!(
            "'{}' is structurally equal to '{}'",
            self.decl(id).name,
            canonical_name
        );
        self.decl_mut(id).equivalent_to = Some(canonical_name);

        if !self.decl(canonical).rendered {
            self.render_decl(canonical)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xsdgen_core::{Method, MethodBody, TypeRef};

    fn record(name: &str) -> TypeDecl {
        TypeDecl::new(name, None, None, vec![])
    }

    fn string_field(decl: &mut TypeDecl, name: &str, tag: &str) {
        decl.add_field(None, name, TypeRef::named("xsdt::String"), tag, vec![]);
    }

    #[test]
    fn test_member_order_and_docs_do_not_matter() {
        let mut a = record("TxsdA");
        string_field(&mut a, "street", "street");
        string_field(&mut a, "city", "city");

        let mut b = record("TxsdB");
        b.docs.push("Some documentation".into());
        string_field(&mut b, "city", "city");
        string_field(&mut b, "street", "street");

        assert!(structurally_equal(&a, &b));
        assert!(structurally_equal(&b, &a));
    }

    #[test]
    fn test_tag_difference_prevents_equality() {
        let mut a = record("TxsdA");
        a.add_field(None, "lang", TypeRef::named("xsdt::String"), "lang", vec![]);
        let mut b = record("TxsdB");
        b.add_field(None, "lang", TypeRef::named("xsdt::String"), "@lang", vec![]);

        assert!(!structurally_equal(&a, &b));
    }

    #[test]
    fn test_underlying_and_embeds_compared() {
        let a = TypeDecl::new("TxsdA", Some(TypeRef::named("xsdt::String")), None, vec![]);
        let b = TypeDecl::new("TxsdB", Some(TypeRef::named("xsdt::Token")), None, vec![]);
        assert!(!structurally_equal(&a, &b));

        let mut c = record("TxsdC");
        c.add_embed(None, TypeRef::named("XsdGenHasCdata"), vec![]);
        let d = record("TxsdD");
        assert!(!structurally_equal(&c, &d));
    }

    #[test]
    fn test_walker_methods_ignored() {
        let mut a = record("TxsdA");
        let b = record("TxsdB");
        a.add_method(Method {
            name: "walk".into(),
            receiver: "TxsdA".into(),
            params: "ctx: &mut WalkContext".into(),
            return_type: TypeRef::named("Result<(), xsdt::WalkError>"),
            body: MethodBody::text("Ok(())"),
            doc: String::new(),
            docs: vec![],
            kind: MethodKind::Walker,
            origin: None,
        });
        assert!(structurally_equal(&a, &b));
    }
}
