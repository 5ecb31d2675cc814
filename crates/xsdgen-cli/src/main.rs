use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use xsdgen::{handle_generate, GenerateOptions};

#[derive(Parser)]
#[command(name = "xsdgen")]
#[command(about = "Generate Rust data types from XML Schema graphs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one Rust module from a schema graph
    Generate {
        /// Schema graph file (JSON format)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generator config (TOML format)
        #[arg(short, long, env = "XSDGEN_CONFIG")]
        config: Option<PathBuf>,

        /// Skip walk() methods and the walker declarations
        #[arg(long)]
        no_walkers: bool,

        /// Also write the final declaration IR as JSON
        #[arg(long)]
        emit_ir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(cli.debug)
        .init();

    match cli.command {
        Commands::Generate {
            input,
            output,
            config,
            no_walkers,
            emit_ir,
        } => {
            handle_generate(&GenerateOptions {
                input,
                output,
                config,
                no_walkers,
                emit_ir,
            })?;
            Ok(())
        }
    }
}
