//! `xsdgen generate` round trip through the file system

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use xsdgen::{handle_generate, load_config, GenerateOptions};

const ADDRESS_GRAPH: &str = r#"{
    "schema": {
        "load_uri": "address.xsd",
        "target_namespace": "urn:address",
        "xml_namespaces": {"xs": "http://www.w3.org/2001/XMLSchema", "": "urn:address"},
        "complex_types": [2],
        "elements": [6]
    },
    "nodes": [
        {"kind": "element", "name": "city", "type": "xs:string"},
        {"kind": "sequence", "particles": [0]},
        {"kind": "complex_type", "name": "Address", "content": 1},
        {"kind": "element", "name": "city", "type": "xs:string"},
        {"kind": "sequence", "particles": [3]},
        {"kind": "complex_type", "content": 4},
        {"kind": "element", "name": "home", "complex_type": 5}
    ]
}"#;

#[test]
fn test_generate_writes_module_and_ir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("address.json");
    fs::write(&input, ADDRESS_GRAPH)?;
    let output = dir.path().join("out").join("address.rs");
    let ir = dir.path().join("decls.json");

    let written = handle_generate(&GenerateOptions {
        input,
        output: Some(output.clone()),
        emit_ir: Some(ir.clone()),
        ..Default::default()
    })?;
    assert_eq!(written, output);

    let text = fs::read_to_string(&output)?;
    assert!(text.contains("//! Module `xsd_address`"));
    assert!(text.contains("pub struct Address {"));
    assert!(text.contains("pub home: Option<Box<Address>>,"));
    assert!(text.contains("pub struct WalkContext {"));

    let decls: serde_json::Value = serde_json::from_str(&fs::read_to_string(&ir)?)?;
    assert!(decls.as_array().is_some_and(|d| !d.is_empty()));
    Ok(())
}

#[test]
fn test_config_file_and_flag_disable_walkers() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let input = dir.path().join("address.json");
    fs::write(&input, ADDRESS_GRAPH)?;
    let config = dir.path().join("xsdgen.toml");
    fs::write(
        &config,
        format!("base_code_path = {:?}\n", dir.path().join("gen").display().to_string()),
    )?;

    let written = handle_generate(&GenerateOptions {
        input,
        config: Some(config),
        no_walkers: true,
        ..Default::default()
    })?;
    assert_eq!(written, dir.path().join("gen").join("xsd_address.rs"));

    let text = fs::read_to_string(&written)?;
    assert!(!text.contains("WalkContext"));
    Ok(())
}

#[test]
fn test_bad_inputs_are_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let config = dir.path().join("bad.toml");
    fs::write(&config, "add_walkers = \"maybe\"")?;
    assert!(load_config(Some(config.as_path())).is_err());

    let input = dir.path().join("dangling.json");
    fs::write(
        &input,
        r#"{"schema": {"load_uri": "a.xsd", "elements": [3]}, "nodes": []}"#,
    )?;
    let err = handle_generate(&GenerateOptions {
        input,
        output: Some(dir.path().join("a.rs")),
        ..Default::default()
    });
    assert!(err.is_err());
    Ok(())
}
