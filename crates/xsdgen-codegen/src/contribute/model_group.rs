use tracing::debug;
use xsdgen_core::naming::safe_identifier;
use xsdgen_core::schema::{Group, ModelGroup};
use xsdgen_core::{NodeId, TypeRef};

use super::{embed_holders, Contribute, GROUP_HOLDER};
use crate::bag::{Bag, RecordUsage};
use crate::CodegenError;

impl Contribute for ModelGroup {
    /// Sequences and choices have no declaration of their own: every particle's
    /// holder goes straight into the record currently being built.
    fn contribute(&self, _id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        let repeated = self.max_occurs.is_multiple();
        if repeated {
            bag.repeat_depth += 1;
        }
        let result = match bag.current_decl() {
            Some(decl) => embed_holders(bag, decl, &self.particles),
            None => self
                .particles
                .iter()
                .try_for_each(|&particle| super::contribute_node(bag, particle)),
        };
        if repeated {
            bag.repeat_depth -= 1;
        }
        result
    }
}

impl Contribute for Group {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        if let Some(reference) = &self.reference {
            let holder = bag.resolve_type(reference, GROUP_HOLDER, RecordUsage::No);
            bag.set_holder(id, holder);
            return Ok(());
        }
        let Some(name) = self.name.as_deref() else {
            debug!("skipping group {} without name or ref", id);
            return Ok(());
        };

        let holder_name = format!("{}{}", GROUP_HOLDER, safe_identifier(name));
        let docs = bag.graph().documentation(self.annotation);
        let decl = bag.register_type(Some(id), &holder_name, None, docs);
        bag.set_holder(id, TypeRef::named(holder_name));

        let saved = bag.enter_decl(decl);
        let result = match self.content {
            Some(content) => embed_holders(bag, decl, &[content]),
            None => Ok(()),
        };
        bag.leave_decl(saved);
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::bag::Bag;
    use crate::config::GeneratorConfig;
    use crate::contribute::contribute_schema;
    use xsdgen_core::schema::{ComplexType, Element, Group, ModelGroup, Schema};
    use xsdgen_core::{SchemaGraph, SchemaNode};

    #[test]
    fn test_group_definition_and_reference() -> Result<(), crate::CodegenError> {
        let mut schema = Schema::new("a.xsd", "urn:a");
        schema.xml_namespaces.insert("a".into(), "urn:a".into());
        let mut graph = SchemaGraph::new(schema);

        let para = graph.add(SchemaNode::Element(Element {
            name: Some("para".into()),
            ..Default::default()
        }));
        let inner = graph.add(SchemaNode::Choice(ModelGroup {
            particles: vec![para],
            ..Default::default()
        }));
        let outer = graph.add(SchemaNode::Sequence(ModelGroup {
            particles: vec![inner],
            ..Default::default()
        }));
        let group = graph.add(SchemaNode::Group(Group {
            name: Some("block".into()),
            content: Some(outer),
            ..Default::default()
        }));
        let group_ref = graph.add(SchemaNode::Group(Group {
            reference: Some("a:block".into()),
            ..Default::default()
        }));
        let content = graph.add(SchemaNode::Sequence(ModelGroup {
            particles: vec![group_ref],
            ..Default::default()
        }));
        let section = graph.add(SchemaNode::ComplexType(ComplexType {
            name: Some("Section".into()),
            content: Some(content),
            ..Default::default()
        }));
        graph.schema.groups.push(group);
        graph.schema.complex_types.push(section);

        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);
        contribute_schema(&mut bag)?;

        let block = bag.decl(bag.lookup("XsdGenHasGroupBlock").expect("group holder"));
        assert!(block.embeds.contains_key("XsdGenHasElemParaXsdtString"));
        let section = bag.decl(bag.lookup("Section").expect("section"));
        assert!(section.embeds.contains_key("XsdGenHasGroupBlock"));
        assert_eq!(bag.current_decl(), None);
        Ok(())
    }
}
