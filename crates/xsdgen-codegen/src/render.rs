//! Declaration rendering
//!
//! Rendering is demand driven: emitting a declaration first emits everything it
//! refers to, so output order follows the reference graph from the roots the
//! assembler starts at. The `rendered` flag is set before anything else happens,
//! which makes rendering idempotent and cuts reference cycles.

use std::collections::HashSet;
use std::fmt::Write;

use indexmap::IndexMap;
use tracing::trace;
use xsdgen_core::naming::{field_name, ATTR_HOLDER_PREFIX};
use xsdgen_core::{DeclId, Method, TypeRef};

use crate::bag::Bag;
use crate::walker;
use crate::CodegenError;

const DERIVES: &str =
    "#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]";

/// Struct field name under which an embedded type is flattened. A qualified
/// type keeps its import alias as a prefix.
pub fn embed_field_name(ty: &TypeRef) -> String {
    match ty.bare_name().rsplit_once("::") {
        Some((alias, local)) => field_name(&format!("{}_{}", alias, field_name(local))),
        None => field_name(ty.bare_name()),
    }
}

/// Claim `ident` within one struct, suffixing `_2`, `_3`, ... while it is taken.
fn claim_ident(used: &mut HashSet<String>, ident: String) -> String {
    if used.insert(ident.clone()) {
        return ident;
    }
    let stem = ident.strip_prefix("r#").unwrap_or(&ident);
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", stem, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn uses_list(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Named(_) => false,
        TypeRef::ListOf(_) => true,
        TypeRef::Pointer(inner) | TypeRef::Repeated(inner) => uses_list(inner),
    }
}

fn write_docs(out: &mut String, indent: &str, docs: &[String]) -> std::fmt::Result {
    for line in docs.iter().flat_map(|doc| doc.lines()) {
        let line = line.trim();
        if line.is_empty() {
            writeln!(out, "{}///", indent)?;
        } else {
            writeln!(out, "{}/// {}", indent, line)?;
        }
    }
    Ok(())
}

impl Bag<'_> {
    /// Render the declaration a type reference names, unless already rendered.
    ///
    /// Also marks the import alias of a qualified reference as used. References
    /// to nothing known (built-in scalars, other modules) render nothing.
    pub fn ensure_rendered(&mut self, ty: &TypeRef) -> Result<(), CodegenError> {
        if uses_list(ty) {
            let builtin = self.builtin_alias().to_string();
            self.imports.mark_used(&builtin);
        }
        if let Some(alias) = ty.alias() {
            let alias = alias.to_string();
            self.imports.mark_used(&alias);
        }

        let name = self.normalize_type_ref(ty);
        let Some(mut target) = self.lookup(name) else {
            trace!("no declaration for '{}'", name);
            return Ok(());
        };
        if let Some(canonical) = self.decl(target).equivalent_to.as_deref() {
            if let Some(canonical) = self.lookup(canonical) {
                target = canonical;
            }
        }
        self.render_decl(target)
    }

    /// Emit one declaration and, first, everything it references.
    pub fn render_decl(&mut self, id: DeclId) -> Result<(), CodegenError> {
        if self.decl(id).rendered {
            return Ok(());
        }
        self.decl_mut(id).rendered = true;

        self.resolve_equivalence(id)?;
        if let Some(canonical) = &self.decl(id).equivalent_to {
            trace!("'{}' renders as '{}'", self.decl(id).name, canonical);
            return Ok(());
        }

        let name = self.decl(id).name.clone();
        let walkable = self.config.add_walkers
            && self.decl(id).is_record()
            && !name.starts_with(ATTR_HOLDER_PREFIX);
        if walkable {
            self.walker_types.insert(name.clone());
        }

        let referenced = self.decl(id).referenced_types();
        for ty in &referenced {
            self.ensure_rendered(ty)?;
        }

        let builtin = self.builtin_alias().to_string();
        let embeds: Vec<(TypeRef, Vec<String>)> = self
            .decl(id)
            .embeds
            .values()
            .map(|embed| (self.rewrite_type_ref(&embed.ty), embed.docs.clone()))
            .collect();
        let mut idents = HashSet::new();
        let fields: Vec<(String, TypeRef, String, Vec<String>)> = self
            .decl(id)
            .fields
            .values()
            .map(|f| {
                (
                    claim_ident(&mut idents, field_name(&f.name)),
                    self.rewrite_type_ref(&f.ty),
                    f.xml_tag.clone(),
                    f.docs.clone(),
                )
            })
            .collect();

        let mut unique_embeds = Vec::with_capacity(embeds.len());
        for (ty, docs) in embeds {
            let key = format!("E_{}", ty.bare_name());
            if self.decl_mut(id).member_written.insert(key) {
                let ident = claim_ident(&mut idents, embed_field_name(&ty));
                unique_embeds.push((ident, ty, docs));
            }
        }

        let mut out = String::new();
        write_docs(&mut out, "", &self.decl(id).docs)?;
        writeln!(out, "{}", DERIVES)?;
        match &self.decl(id).underlying {
            Some(underlying) => {
                let underlying = self.rewrite_type_ref(underlying);
                let parse = self.is_parse_type(&underlying);
                let underlying = underlying.render(&builtin);
                writeln!(out, "#[serde(transparent)]")?;
                writeln!(out, "pub struct {}(pub {});", name, underlying)?;
                writeln!(out)?;
                writeln!(out, "impl From<&str> for {} {{", name)?;
                writeln!(out, "    fn from(value: &str) -> Self {{")?;
                if parse {
                    writeln!(out, "        Self(value.parse().unwrap_or_default())")?;
                } else {
                    writeln!(out, "        Self(value.into())")?;
                }
                writeln!(out, "    }}")?;
                writeln!(out, "}}")?;
            }
            None => {
                writeln!(out, "#[serde(default)]")?;
                writeln!(out, "pub struct {} {{", name)?;
                for (ident, ty, tag, docs) in &fields {
                    write_docs(&mut out, "    ", docs)?;
                    writeln!(out, "    #[serde(rename = \"{}\")]", tag)?;
                    writeln!(out, "    pub {}: {},", ident, ty.render(&builtin))?;
                }
                for (ident, ty, docs) in &unique_embeds {
                    write_docs(&mut out, "    ", docs)?;
                    writeln!(out, "    #[serde(flatten)]")?;
                    writeln!(out, "    pub {}: {},", ident, ty.render(&builtin))?;
                }
                writeln!(out, "}}")?;
            }
        }
        writeln!(out)?;
        self.out.push_str(&out);

        if walkable {
            let embeds: Vec<(String, TypeRef)> = unique_embeds
                .into_iter()
                .map(|(ident, ty, _)| (ident, ty))
                .collect();
            let fields: Vec<(String, TypeRef)> = fields
                .into_iter()
                .map(|(ident, ty, _, _)| (ident, ty))
                .collect();
            let method = walker::walk_method(self, &name, &embeds, &fields);
            self.imports.mark_used(&builtin);
            self.add_method(id, method);
        }

        self.written.push(id);
        self.render_methods(id)
    }

    /// Emit the `impl` blocks of a declaration's methods, one per receiver.
    fn render_methods(&mut self, id: DeclId) -> Result<(), CodegenError> {
        let methods: Vec<Method> = self.decl(id).methods.values().cloned().collect();
        if methods.is_empty() {
            return Ok(());
        }
        let builtin = self.builtin_alias().to_string();

        let mut by_receiver: IndexMap<String, Vec<Method>> = IndexMap::new();
        for method in methods {
            self.ensure_rendered(&method.return_type)?;
            by_receiver
                .entry(method.receiver.clone())
                .or_default()
                .push(method);
        }

        let mut out = String::new();
        for (receiver, methods) in &by_receiver {
            writeln!(out, "impl {} {{", receiver)?;
            for (i, method) in methods.iter().enumerate() {
                if i > 0 {
                    writeln!(out)?;
                }
                let mut docs = vec![method.doc.clone()];
                docs.extend(method.docs.iter().cloned());
                docs.retain(|doc| !doc.is_empty());
                write_docs(&mut out, "    ", &docs)?;

                let return_type = self.rewrite_type_ref(&method.return_type).render(&builtin);
                let params = if method.params.is_empty() {
                    String::new()
                } else {
                    format!(", {}", method.params)
                };
                writeln!(
                    out,
                    "    pub fn {}(&self{}) -> {} {{",
                    method.name, params, return_type
                )?;
                for line in method.body.render(&return_type).lines() {
                    if line.is_empty() {
                        writeln!(out)?;
                    } else {
                        writeln!(out, "        {}", line)?;
                    }
                }
                writeln!(out, "    }}")?;
            }
            writeln!(out, "}}")?;
            writeln!(out)?;
        }
        self.out.push_str(&out);
        Ok(())
    }
}
