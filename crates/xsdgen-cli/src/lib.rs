//! Library interface for the xsdgen command line

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use xsdgen_codegen::{generate, GeneratorConfig};
use xsdgen_core::SchemaGraph;

/// Options of `xsdgen generate`.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub input: PathBuf,
    /// Defaults to `<base_code_path>/<module>.rs`.
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub no_walkers: bool,
    pub emit_ir: Option<PathBuf>,
}

pub fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let Some(path) = path else {
        return Ok(GeneratorConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    GeneratorConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Generate one module from a schema graph dump. Returns the path written.
pub fn handle_generate(options: &GenerateOptions) -> Result<PathBuf> {
    let mut config = load_config(options.config.as_deref())?;
    if options.no_walkers {
        config = config.with_walkers(false);
    }
    debug!("using config {:?}", config);

    info!("Generating Rust code from {:?}", options.input);
    let json = fs::read_to_string(&options.input)
        .with_context(|| format!("Failed to read schema graph: {:?}", options.input))?;
    let graph = SchemaGraph::from_json(&json)
        .with_context(|| format!("Failed to parse schema graph: {:?}", options.input))?;

    let source = generate(&graph, &config)
        .with_context(|| format!("Failed to generate code for {}", graph.schema.load_uri))?;

    let output = match &options.output {
        Some(output) => output.clone(),
        None => PathBuf::from(&config.base_code_path).join(format!("{}.rs", source.module_name)),
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    fs::write(&output, &source.text)
        .with_context(|| format!("Failed to write output: {:?}", output))?;
    info!("Module {} written to {:?}", source.module_name, output);

    if let Some(ir_path) = &options.emit_ir {
        let ir = source.declarations_json()?;
        fs::write(ir_path, ir)
            .with_context(|| format!("Failed to write declaration IR: {:?}", ir_path))?;
        info!("{} declarations written to {:?}", source.declarations.len(), ir_path);
    }

    Ok(output)
}
