use xsdgen_core::schema::ComplexType;
use xsdgen_core::{DeclId, NodeId, TypeRef};

use super::{embed_holders, type_name, Contribute};
use crate::bag::{Bag, RecordUsage, CDATA_HOLDER};
use crate::CodegenError;

fn contribute_members(
    ct: &ComplexType,
    id: NodeId,
    decl: DeclId,
    bag: &mut Bag<'_>,
) -> Result<(), CodegenError> {
    let cdata = TypeRef::named(CDATA_HOLDER);
    match &ct.base {
        Some(base) => {
            let base = bag.resolve_type(base, "", RecordUsage::No);
            if ct.simple_content {
                bag.add_field(decl, Some(id), "value", base, "$text", Vec::new());
            } else {
                bag.add_embed(decl, Some(id), base, Vec::new());
            }
        }
        None if ct.simple_content => bag.add_embed(decl, Some(id), cdata.clone(), Vec::new()),
        None => {}
    }
    if ct.mixed {
        bag.add_embed(decl, Some(id), cdata, Vec::new());
    }

    embed_holders(bag, decl, &ct.attributes)?;
    embed_holders(bag, decl, &ct.attribute_groups)?;
    if let Some(content) = ct.content {
        embed_holders(bag, decl, &[content])?;
    }
    Ok(())
}

impl Contribute for ComplexType {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        let name = type_name(bag, self.name.as_deref());
        let docs = bag.graph().documentation(self.annotation);
        let decl = bag.register_type(Some(id), &name, None, docs);
        bag.set_value_type(id, TypeRef::named(name));

        let saved = bag.enter_decl(decl);
        let result = contribute_members(self, id, decl, bag);
        bag.leave_decl(saved);
        result
    }
}
