//! Walker synthesis
//!
//! Every emitted record (except attribute holders) gets a `walk()` method. A
//! walk calls the type's handler from a `WalkHandlers` table once, then descends
//! into every embed and field whose type is itself walkable. The table and the
//! `WalkContext` that carries it plus the error policy are emitted once per
//! module by [`walker_declarations`].

use std::fmt::Write;

use xsdgen_core::naming::field_name;
use xsdgen_core::{Method, MethodBody, MethodKind, TypeRef};

use crate::bag::Bag;
use crate::CodegenError;

/// Name of the synthesized method.
pub const WALK_METHOD: &str = "walk";

/// Handler slot of a type in `WalkHandlers`.
pub fn handler_slot(type_name: &str) -> String {
    field_name(type_name)
}

/// Statement that walks `expr` of type `ty`, if anything in it is walkable.
fn walk_statement(ty: &TypeRef, expr: &str, walkable: &dyn Fn(&str) -> bool) -> Option<String> {
    match ty {
        TypeRef::Named(name) => walkable(name).then(|| format!("{}.walk(ctx)?;", expr)),
        TypeRef::Pointer(inner) => walk_statement(inner, "x", walkable)
            .map(|walk| format!("if let Some(x) = &{} {{ {} }}", expr, walk)),
        TypeRef::Repeated(inner) => walk_statement(inner, "x", walkable)
            .map(|walk| format!("for x in &{} {{ {} }}", expr, walk)),
        TypeRef::ListOf(_) => None,
    }
}

/// Build the `walk()` method for `type_name`.
///
/// `embeds` and `fields` are `(member identifier, canonical type)` pairs in
/// declaration order.
pub(crate) fn walk_method(
    bag: &Bag<'_>,
    type_name: &str,
    embeds: &[(String, TypeRef)],
    fields: &[(String, TypeRef)],
) -> Method {
    let walkable = |name: &str| bag.is_walkable(name);
    let slot = handler_slot(type_name);

    let mut body = format!(
        "if let Some(handler) = ctx.handlers.{} {{\n    if let Err(err) = handler(self) {{\n        ctx.fail(err)?;\n    }}\n}}\n",
        slot
    );
    let mut walked_embeds = 0;
    for (ident, ty) in embeds {
        if let Some(walk) = walk_statement(ty, &format!("self.{}", ident), &walkable) {
            body.push_str(&walk);
            body.push('\n');
            walked_embeds += 1;
        }
    }
    let mut walked_fields = 0;
    for (ident, ty) in fields {
        if let Some(walk) = walk_statement(ty, &format!("self.{}", ident), &walkable) {
            body.push_str(&walk);
            body.push('\n');
            walked_fields += 1;
        }
    }
    body.push_str("Ok(())");

    Method {
        name: WALK_METHOD.to_string(),
        receiver: type_name.to_string(),
        params: "ctx: &mut WalkContext".to_string(),
        return_type: TypeRef::named(format!("Result<(), {}::WalkError>", bag.builtin_alias())),
        body: MethodBody::text(body),
        doc: format!(
            "Calls `WalkHandlers::{}` on this `{}` if it is set, then walks {}/{} embed(s) and {}/{} field(s).",
            slot,
            type_name,
            walked_embeds,
            embeds.len(),
            walked_fields,
            fields.len()
        ),
        docs: Vec::new(),
        kind: MethodKind::Walker,
        origin: None,
    }
}

/// `WalkHandlers` and `WalkContext` for every walkable type seen so far.
pub(crate) fn walker_declarations(bag: &Bag<'_>) -> Result<String, CodegenError> {
    let builtin = bag.builtin_alias();
    let mut out = String::new();

    writeln!(
        out,
        "/// One optional handler per struct in this module, called when `walk()` visits an instance of that type."
    )?;
    writeln!(out, "///")?;
    writeln!(
        out,
        "/// A handler runs exactly once per visited node, before any of its children are walked. There is no exit call."
    )?;
    writeln!(out, "#[derive(Debug, Default, Clone, Copy)]")?;
    writeln!(out, "pub struct WalkHandlers {{")?;
    for name in bag.walker_types() {
        writeln!(
            out,
            "    pub {}: Option<fn(&{}) -> Result<(), {}::WalkError>>,",
            handler_slot(name),
            name,
            builtin
        )?;
    }
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "/// State threaded through every `walk()` call.")?;
    writeln!(out, "#[derive(Debug)]")?;
    writeln!(out, "pub struct WalkContext {{")?;
    writeln!(out, "    pub handlers: WalkHandlers,")?;
    writeln!(
        out,
        "    /// Keep walking after a handler error and collect it in `errors`."
    )?;
    writeln!(out, "    pub continue_on_error: bool,")?;
    writeln!(out, "    pub errors: Vec<{}::WalkError>,", builtin)?;
    writeln!(out, "    /// Called with every handler error as it happens.")?;
    writeln!(out, "    pub on_error: Option<fn(&{}::WalkError)>,", builtin)?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl Default for WalkContext {{")?;
    writeln!(out, "    fn default() -> Self {{")?;
    writeln!(out, "        Self {{")?;
    writeln!(out, "            handlers: WalkHandlers::default(),")?;
    writeln!(out, "            continue_on_error: true,")?;
    writeln!(out, "            errors: Vec::new(),")?;
    writeln!(out, "            on_error: None,")?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    writeln!(out, "impl WalkContext {{")?;
    writeln!(
        out,
        "    /// Apply the error policy to a handler error. `Err` aborts the walk."
    )?;
    writeln!(
        out,
        "    pub fn fail(&mut self, err: {b}::WalkError) -> Result<(), {b}::WalkError> {{",
        b = builtin
    )?;
    writeln!(out, "        if let Some(on_error) = self.on_error {{")?;
    writeln!(out, "            on_error(&err);")?;
    writeln!(out, "        }}")?;
    writeln!(out, "        if self.continue_on_error {{")?;
    writeln!(out, "            self.errors.push(err);")?;
    writeln!(out, "            Ok(())")?;
    writeln!(out, "        }} else {{")?;
    writeln!(out, "            Err(err)")?;
    writeln!(out, "        }}")?;
    writeln!(out, "    }}")?;
    writeln!(out, "}}")?;
    writeln!(out)?;

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walkable(name: &str) -> bool {
        name.starts_with("Txsd")
    }

    #[test]
    fn test_walk_statements() {
        let named = TypeRef::named("TxsdItem");
        assert_eq!(
            walk_statement(&named, "self.item", &walkable).as_deref(),
            Some("self.item.walk(ctx)?;")
        );

        let pointer = TypeRef::pointer(named.clone());
        assert_eq!(
            walk_statement(&pointer, "self.item", &walkable).as_deref(),
            Some("if let Some(x) = &self.item { x.walk(ctx)?; }")
        );

        let repeated = TypeRef::repeated(named.clone());
        assert_eq!(
            walk_statement(&repeated, "self.items", &walkable).as_deref(),
            Some("for x in &self.items { x.walk(ctx)?; }")
        );
    }

    #[test]
    fn test_scalars_and_lists_are_not_walked() {
        assert_eq!(walk_statement(&TypeRef::named("xsdt::String"), "self.a", &walkable), None);
        let list = TypeRef::list_of(TypeRef::named("TxsdItem"));
        assert_eq!(walk_statement(&list, "self.a", &walkable), None);
    }

    #[test]
    fn test_handler_slot() {
        assert_eq!(handler_slot("TxsdRssChannel"), "txsd_rss_channel");
        assert_eq!(handler_slot("XsdGenHasElemItem"), "xsd_gen_has_elem_item");
    }

    #[test]
    fn test_handler_table_documents_visit_order() -> Result<(), CodegenError> {
        let graph = xsdgen_core::SchemaGraph::new(xsdgen_core::Schema::new("a.xsd", ""));
        let config = crate::GeneratorConfig::default();
        let bag = Bag::new(&graph, &config);

        let text = walker_declarations(&bag)?;
        assert!(text.contains(
            "/// A handler runs exactly once per visited node, before any of its children are walked. There is no exit call.\n#[derive(Debug, Default, Clone, Copy)]\npub struct WalkHandlers {"
        ));
        Ok(())
    }
}
