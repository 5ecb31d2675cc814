use tracing::debug;
use xsdgen_core::naming::safe_identifier;
use xsdgen_core::schema::{Attribute, AttributeGroup};
use xsdgen_core::{NodeId, TypeRef};

use super::{default_method, embed_holders, type_suffix, value_type, Contribute, ATTR_HOLDER, ATT_GROUP_HOLDER};
use crate::bag::{Bag, RecordUsage};
use crate::CodegenError;

impl Contribute for Attribute {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        if let Some(reference) = &self.reference {
            let holder = bag.resolve_type(reference, ATTR_HOLDER, RecordUsage::No);
            bag.set_holder(id, holder);
            return Ok(());
        }
        let Some(name) = self.name.as_deref() else {
            debug!("skipping attribute {} without name or ref", id);
            return Ok(());
        };

        bag.push_name(name);
        let value = value_type(bag, self.type_name.as_deref(), self.simple_type);
        bag.pop();
        let value = value?;

        let top_level = bag.graph().schema.attributes.contains(&id);
        let holder_name = if top_level {
            format!("{}{}", ATTR_HOLDER, safe_identifier(name))
        } else {
            format!("{}{}{}", ATTR_HOLDER, safe_identifier(name), type_suffix(&value))
        };
        bag.set_holder(id, TypeRef::named(&holder_name));
        if !top_level && bag.lookup(&holder_name).is_some() {
            return Ok(());
        }

        let docs = bag.graph().documentation(self.annotation);
        let decl = bag.register_type(Some(id), &holder_name, None, docs.clone());
        bag.add_field(decl, Some(id), name, value.clone(), format!("@{}", name), docs);
        if let Some(default) = self.default.as_deref().or(self.fixed.as_deref()) {
            let method = default_method(bag, &holder_name, name, &value, default, id);
            bag.add_method(decl, method);
        }
        Ok(())
    }
}

impl Contribute for AttributeGroup {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        if let Some(reference) = &self.reference {
            let holder = bag.resolve_type(reference, ATT_GROUP_HOLDER, RecordUsage::No);
            bag.set_holder(id, holder);
            return Ok(());
        }
        let Some(name) = self.name.as_deref() else {
            debug!("skipping attribute group {} without name or ref", id);
            return Ok(());
        };

        let holder_name = format!("{}{}", ATT_GROUP_HOLDER, safe_identifier(name));
        let docs = bag.graph().documentation(self.annotation);
        let decl = bag.register_type(Some(id), &holder_name, None, docs);
        bag.set_holder(id, TypeRef::named(holder_name));

        embed_holders(bag, decl, &self.attributes)?;
        embed_holders(bag, decl, &self.attribute_groups)
    }
}
