use proptest::prelude::*;
use xsdgen_codegen::structurally_equal;
use xsdgen_core::{TypeDecl, TypeRef};

fn record(name: &str, fields: &[(String, String)]) -> TypeDecl {
    let mut decl = TypeDecl::new(name, None, None, Vec::new());
    for (field, tag) in fields {
        decl.add_field(None, field.as_str(), TypeRef::named("xsdt::String"), tag.as_str(), Vec::new());
    }
    decl
}

proptest! {
    #[test]
    fn member_order_does_not_matter(
        names in prop::collection::btree_set("[a-z]{1,8}", 1..6),
        rotate in 0usize..6,
    ) {
        let fields: Vec<(String, String)> = names.iter().map(|n| (n.clone(), n.clone())).collect();
        let mut rotated = fields.clone();
        let len = rotated.len();
        rotated.rotate_left(rotate % len);

        let a = record("TxsdA", &fields);
        let b = record("TxsdB", &rotated);
        prop_assert!(structurally_equal(&a, &b));
        prop_assert!(structurally_equal(&b, &a));
    }

    #[test]
    fn tags_are_part_of_the_shape(name in "[a-z]{1,8}") {
        let element = record("TxsdA", &[(name.clone(), name.clone())]);
        let attribute = record("TxsdB", &[(name.clone(), format!("@{}", name))]);
        prop_assert!(!structurally_equal(&element, &attribute));
    }
}
