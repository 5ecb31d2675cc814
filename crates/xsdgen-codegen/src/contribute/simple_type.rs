use std::collections::HashSet;

use xsdgen_core::naming::{field_name, safe_identifier};
use xsdgen_core::schema::{SimpleDerivation, SimpleType};
use xsdgen_core::{Method, MethodBody, MethodKind, NodeId, TypeRef};

use super::{type_name, value_type, Contribute};
use crate::bag::Bag;
use crate::CodegenError;

/// Name of the method converting a simple type into `target`.
pub fn conversion_method_name(target: &TypeRef) -> String {
    format!("to_{}", field_name(&safe_identifier(target.bare_name())))
}

fn underlying_type(st: &SimpleType, bag: &mut Bag<'_>) -> Result<TypeRef, CodegenError> {
    match &st.derivation {
        SimpleDerivation::Restriction { base, simple_type, .. } => {
            value_type(bag, base.as_deref(), *simple_type)
        }
        SimpleDerivation::List { item_type, simple_type } => {
            Ok(TypeRef::list_of(value_type(bag, item_type.as_deref(), *simple_type)?))
        }
        SimpleDerivation::Union { .. } => Ok(bag.builtin_type("string")),
    }
}

impl Contribute for SimpleType {
    fn contribute(&self, id: NodeId, bag: &mut Bag<'_>) -> Result<(), CodegenError> {
        let name = type_name(bag, self.name.as_deref());
        bag.set_value_type(id, TypeRef::named(&name));

        if let Some(own) = self.name.as_deref() {
            bag.push_name(own);
        }
        bag.push_simple_type(id);
        let underlying = underlying_type(self, bag);
        bag.pop();
        if self.name.is_some() {
            bag.pop();
        }
        let underlying = underlying?;

        let docs = bag.graph().documentation(self.annotation);
        let decl = bag.register_type(Some(id), &name, Some(underlying.clone()), docs);

        let SimpleDerivation::Restriction { enumerations, .. } = &self.derivation else {
            return Ok(());
        };
        let mut taken = HashSet::new();
        for value in enumerations {
            let stem = field_name(&format!("is_{}", value));
            let mut method_name = stem.clone();
            let mut n = 2;
            while !taken.insert(method_name.clone()) {
                method_name = format!("{}_{}", stem, n);
                n += 1;
            }
            bag.add_method(
                decl,
                Method {
                    name: method_name,
                    receiver: name.clone(),
                    params: String::new(),
                    return_type: TypeRef::named("bool"),
                    body: MethodBody::text(format!("self.0.to_string() == {:?}", value)),
                    doc: format!("Returns whether this value is the enumerated value `{}`.", value),
                    docs: Vec::new(),
                    kind: MethodKind::Declared,
                    origin: Some(id),
                },
            );
        }

        bag.add_method(
            decl,
            Method {
                name: conversion_method_name(&underlying),
                receiver: name.clone(),
                params: String::new(),
                return_type: underlying.clone(),
                body: MethodBody::new()
                    .push_return_type()
                    .push_text("::from(self.0.clone())"),
                doc: format!("Converts to `{}`.", underlying.bare_name()),
                docs: Vec::new(),
                kind: MethodKind::Declared,
                origin: Some(id),
            },
        );
        bag.declare_conversion(&underlying, &name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::contribute::contribute_schema;
    use pretty_assertions::assert_eq;
    use xsdgen_core::schema::{Schema, XSD_NAMESPACE};
    use xsdgen_core::{SchemaGraph, SchemaNode};

    fn schema() -> Schema {
        let mut schema = Schema::new("a.xsd", "urn:a");
        schema.xml_namespaces.insert("xs".into(), XSD_NAMESPACE.into());
        schema
    }

    #[test]
    fn test_enumeration_and_conversion_methods() -> Result<(), CodegenError> {
        let mut graph = SchemaGraph::new(schema());
        let color = graph.add(SchemaNode::SimpleType(SimpleType {
            name: Some("color".into()),
            derivation: SimpleDerivation::Restriction {
                base: Some("xs:string".into()),
                simple_type: None,
                enumerations: vec!["red".into(), "dark-blue".into()],
            },
            annotation: None,
        }));
        graph.schema.simple_types.push(color);

        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);
        contribute_schema(&mut bag)?;

        let decl = bag.decl(bag.lookup("Color").expect("color"));
        let methods: Vec<&str> = decl.methods.keys().map(String::as_str).collect();
        assert_eq!(methods, vec!["is_red", "is_dark_blue", "to_xsdt_string"]);
        assert_eq!(
            decl.methods["is_dark_blue"].body.render("bool"),
            r#"self.0.to_string() == "dark-blue""#
        );
        assert!(bag
            .conversions
            .contains(&(TypeRef::named("xsdt::String"), "Color".to_string())));
        Ok(())
    }

    #[test]
    fn test_colliding_enumeration_values_get_distinct_methods() -> Result<(), CodegenError> {
        let mut graph = SchemaGraph::new(schema());
        let mode = graph.add(SchemaNode::SimpleType(SimpleType {
            name: Some("mode".into()),
            derivation: SimpleDerivation::Restriction {
                base: Some("xs:string".into()),
                simple_type: None,
                enumerations: vec!["a-b".into(), "a_b".into(), "A B".into()],
            },
            annotation: None,
        }));
        graph.schema.simple_types.push(mode);

        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);
        contribute_schema(&mut bag)?;

        let decl = bag.decl(bag.lookup("Mode").expect("mode"));
        let methods: Vec<&str> = decl.methods.keys().map(String::as_str).collect();
        assert_eq!(methods, vec!["is_a_b", "is_a_b_2", "is_a_b_3", "to_xsdt_string"]);
        assert_eq!(
            decl.methods["is_a_b"].body.render("bool"),
            r#"self.0.to_string() == "a-b""#
        );
        assert_eq!(
            decl.methods["is_a_b_2"].body.render("bool"),
            r#"self.0.to_string() == "a_b""#
        );
        assert_eq!(
            decl.methods["is_a_b_3"].body.render("bool"),
            r#"self.0.to_string() == "A B""#
        );
        Ok(())
    }

    #[test]
    fn test_list_and_union() -> Result<(), CodegenError> {
        let mut graph = SchemaGraph::new(schema());
        let list = graph.add(SchemaNode::SimpleType(SimpleType {
            name: Some("sizes".into()),
            derivation: SimpleDerivation::List {
                item_type: Some("xs:int".into()),
                simple_type: None,
            },
            annotation: None,
        }));
        let union = graph.add(SchemaNode::SimpleType(SimpleType {
            name: Some("either".into()),
            derivation: SimpleDerivation::Union {
                member_types: vec!["xs:int".into(), "xs:date".into()],
            },
            annotation: None,
        }));
        graph.schema.simple_types.extend([list, union]);

        let config = GeneratorConfig::default();
        let mut bag = Bag::new(&graph, &config);
        contribute_schema(&mut bag)?;

        let sizes = bag.decl(bag.lookup("Sizes").expect("sizes"));
        assert_eq!(
            sizes.underlying,
            Some(TypeRef::list_of(TypeRef::named("xsdt::Int")))
        );
        assert!(sizes.methods.is_empty());
        let either = bag.decl(bag.lookup("Either").expect("either"));
        assert_eq!(either.underlying, Some(TypeRef::named("xsdt::String")));
        assert!(bag.conversions.is_empty());
        Ok(())
    }

    #[test]
    fn test_conversion_method_name() {
        assert_eq!(conversion_method_name(&TypeRef::named("xsdt::String")), "to_xsdt_string");
        assert_eq!(conversion_method_name(&TypeRef::named("Color")), "to_color");
    }
}
