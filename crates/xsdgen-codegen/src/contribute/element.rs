use tracing::debug;
use xsdgen_core::naming::safe_identifier;
use xsdgen_core::schema::Element;
use xsdgen_core::{NodeId, TypeRef};

use super::{default_method, type_suffix, value_type, Contribute, ELEMS_HOLDER, ELEM_HOLDER};
use crate::bag::{Bag, RecordUsage};
use crate::CodegenError;

/// Field type of a single occurrence: built-in scalars inline, everything else boxed.
fn single_field_type(bag: &Bag<'_>, value: &TypeRef) -> TypeRef {
    if value.alias() == Some(bag.builtin_alias()) {
        value.clone()
    } else {
        TypeRef::pointer(value.clone())
    }
}

/// Register a holder with the element's field. Returns `false` when a holder of
/// that name already exists and was reused.
fn register_holder(
    element: &Element,
    id: NodeId,
    bag: &mut Bag<'_>,
    holder_name: &str,
    name: &str,
    value: &TypeRef,
    multiple: bool,
) -> bool {
    if bag.lookup(holder_name).is_some() && !bag.graph().schema.elements.contains(&id) {
        return false;
    }
    let docs = bag.graph().documentation(element.annotation);
    let decl = bag.register_type(Some(id), holder_name, None, docs.clone());
    let field_type = if multiple {
        TypeRef::repeated(value.clone())
    } else {
        single_field_type(bag, value)
    };
    bag.add_field(decl, Some(id), name, field_type, name, docs);

    if !multiple {
        if let Some(default) = element.default.as_deref().or(element.fixed.as_deref()) {
            let method = default_method(bag, holder_name, name, value, default, id);
            bag.add_method(decl, method);
        }
    }
    true
}

impl Contribute for Element {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        let multiple = self.max_occurs.is_multiple() || bag.in_repeated_group();
        let prefix = if multiple { ELEMS_HOLDER } else { ELEM_HOLDER };

        if let Some(reference) = &self.reference {
            let holder = bag.resolve_type(reference, prefix, RecordUsage::No);
            bag.set_holder(id, holder);
            return Ok(());
        }
        let Some(name) = self.name.as_deref() else {
            debug!("skipping element {} without name or ref", id);
            return Ok(());
        };

        bag.push_name(name);
        let value = value_type(
            bag,
            self.type_name.as_deref(),
            self.complex_type.or(self.simple_type),
        );
        bag.pop();
        let value = value?;

        if bag.graph().schema.elements.contains(&id) {
            let single = format!("{}{}", ELEM_HOLDER, safe_identifier(name));
            let repeated = format!("{}{}", ELEMS_HOLDER, safe_identifier(name));
            register_holder(self, id, bag, &single, name, &value, false);
            register_holder(self, id, bag, &repeated, name, &value, true);
            bag.set_holder(id, TypeRef::named(single));
        } else {
            let holder_name = format!("{}{}{}", prefix, safe_identifier(name), type_suffix(&value));
            if !register_holder(self, id, bag, &holder_name, name, &value, multiple) {
                debug!("reusing element holder '{}'", holder_name);
            }
            bag.set_holder(id, TypeRef::named(holder_name));
        }
        Ok(())
    }
}
