//! Module assembly
//!
//! Drives one generation pass: contribute the schema, emit the notations
//! function, render declarations starting from the top-level components, sweep
//! whatever is left, then append walker and conversion declarations and put the
//! header and import block in front.

use std::fmt::Write;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::debug;
use xsdgen_core::naming::safe_identifier;
use xsdgen_core::{DeclId, SchemaGraph, TypeDecl, TypeRef};

use crate::bag::Bag;
use crate::config::GeneratorConfig;
use crate::contribute::{contribute_schema, conversion_method_name};
use crate::walker::walker_declarations;
use crate::CodegenError;

/// Source text of one generated module.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedSource {
    /// `xsd_<stem>`, derived from the schema file name.
    pub module_name: String,
    pub text: String,
    /// Every registered declaration after rendering, including collapsed ones.
    pub declarations: Vec<TypeDecl>,
}

impl GeneratedSource {
    pub fn declarations_json(&self) -> Result<String, CodegenError> {
        Ok(serde_json::to_string_pretty(&self.declarations)?)
    }
}

pub struct Assembler<'a> {
    bag: Bag<'a>,
}

impl<'a> Assembler<'a> {
    pub fn new(graph: &'a SchemaGraph, config: &'a GeneratorConfig) -> Self {
        Self {
            bag: Bag::new(graph, config),
        }
    }

    pub fn assemble(mut self) -> Result<GeneratedSource, CodegenError> {
        contribute_schema(&mut self.bag)?;
        debug!("{} declarations registered", self.bag.decls().len());

        self.render_notations()?;
        self.render_top_level()?;
        for index in 0..self.bag.decls().len() {
            self.bag.render_decl(DeclId(index))?;
        }

        let mut trailer = String::new();
        if self.bag.config().add_walkers && !self.bag.walker_types().is_empty() {
            trailer.push_str(&walker_declarations(&self.bag)?);
            let builtin = self.bag.builtin_alias().to_string();
            self.bag.imports.mark_used(&builtin);
        }
        trailer.push_str(&self.conversion_traits()?);

        let schema = &self.bag.graph().schema;
        let module_name = schema.module_name();
        let mut text = String::new();
        writeln!(text, "// Generated by xsdgen from `{}`. DO NOT EDIT.", schema.load_uri)?;
        writeln!(text, "// Comments on types and fields (if any) are from the schema document.")?;
        writeln!(text)?;
        writeln!(text, "//! Module `{}`", module_name)?;
        writeln!(text)?;
        writeln!(text, "#![allow(clippy::all, dead_code)]")?;
        writeln!(text)?;
        let imports = self.bag.imports().render();
        if !imports.is_empty() {
            for line in &imports {
                writeln!(text, "{}", line)?;
            }
            writeln!(text)?;
        }
        text.push_str(self.bag.output());
        text.push_str(&trailer);
        let text = format!("{}\n", text.trim_end());

        Ok(GeneratedSource {
            module_name,
            text,
            declarations: self.bag.decls().to_vec(),
        })
    }

    fn render_notations(&mut self) -> Result<(), CodegenError> {
        if self.bag.notation_calls.is_empty() {
            return Ok(());
        }
        let builtin = self.bag.builtin_alias().to_string();
        let mut out = String::new();
        writeln!(out, "/// Notations declared by the schema.")?;
        writeln!(out, "pub fn xsd_gen_notations() -> {}::Notations {{", builtin)?;
        writeln!(out, "    let mut notations = {}::Notations::default();", builtin)?;
        for call in &self.bag.notation_calls {
            writeln!(out, "    {}", call)?;
        }
        writeln!(out, "    notations")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        self.bag.out.push_str(&out);
        self.bag.imports.mark_used(&builtin);
        Ok(())
    }

    /// Top-level attributes, attribute groups, elements and groups, in that order.
    fn render_top_level(&mut self) -> Result<(), CodegenError> {
        let schema = &self.bag.graph().schema;
        let roots = schema
            .attributes
            .iter()
            .chain(&schema.attribute_groups)
            .chain(&schema.elements)
            .chain(&schema.groups);
        for &node in roots {
            for id in self.bag.decls_for_origin(node).to_vec() {
                self.bag.render_decl(id)?;
            }
        }
        Ok(())
    }

    /// One trait per conversion target plus a delegating impl per implementor.
    fn conversion_traits(&mut self) -> Result<String, CodegenError> {
        let builtin = self.bag.builtin_alias().to_string();
        let mut targets: IndexSet<TypeRef> = IndexSet::new();
        let mut impls: IndexSet<(TypeRef, String)> = IndexSet::new();
        for (target, implementor) in self.bag.conversions.clone() {
            let target = self.bag.rewrite_type_ref(&target);
            let implementor = self
                .bag
                .rewrite_type_ref(&TypeRef::named(implementor))
                .bare_name()
                .to_string();
            self.bag.ensure_rendered(&target)?;
            targets.insert(target.clone());
            impls.insert((target, implementor));
        }

        let mut out = String::new();
        for target in &targets {
            let trait_name = format!("To{}", safe_identifier(target.bare_name()));
            let method = conversion_method_name(target);
            let rendered = target.render(&builtin);
            writeln!(out, "/// Implemented by every type that converts to `{}`.", rendered)?;
            writeln!(out, "pub trait {} {{", trait_name)?;
            writeln!(out, "    fn {}(&self) -> {};", method, rendered)?;
            writeln!(out, "}}")?;
            writeln!(out)?;
            for (_, implementor) in impls.iter().filter(|(t, _)| t == target) {
                writeln!(out, "impl {} for {} {{", trait_name, implementor)?;
                writeln!(out, "    fn {}(&self) -> {} {{", method, rendered)?;
                writeln!(out, "        {}::{}(self)", implementor, method)?;
                writeln!(out, "    }}")?;
                writeln!(out, "}}")?;
                writeln!(out)?;
            }
        }
        Ok(out)
    }
}
