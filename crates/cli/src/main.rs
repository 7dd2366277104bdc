//! uirec CLI - Main Entry Point
//!
//! Records browser sessions through the codegen tool, turns the captured
//! code into a runnable test, saves it and optionally extends it with the
//! remote service.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use uirec_common::RecorderConfig;

mod commands;
mod output;

use commands::{credentials, extend, record};

/// uirec - record browser sessions into UI test scripts
#[derive(Parser)]
#[command(name = "uirec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(long, env = "UIREC_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a browser session into a test script
    Record(record::RecordArgs),

    /// Record against the demo application
    Demo(record::DemoArgs),

    /// Update the stored service credentials
    Credentials,

    /// Extend an existing script with the remote service
    Extend(extend::ExtendArgs),

    /// Show version information
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            1
        }
    };

    // A pending stdin read would otherwise hold up runtime shutdown
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli
        .config
        .unwrap_or_else(uirec_common::default_config_path);
    let config = RecorderConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    match cli.command {
        Commands::Record(args) => record::execute(args.url, args.options, config).await?,
        Commands::Demo(args) => {
            record::execute(Some(record::DEMO_URL.to_string()), args.options, config).await?
        }
        Commands::Credentials => credentials::execute(config).await?,
        Commands::Extend(args) => extend::execute(args, config).await?,
        Commands::Version => {
            println!("uirec v{}", uirec_common::VERSION);
            println!("Record browser sessions into runnable UI test scripts");
        }
    }

    Ok(())
}
