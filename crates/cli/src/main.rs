use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "line-relay")]
#[command(about = "LINE webhook relay to Gemini", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Write a default configuration file if none exists.
    Init {
        /// Config file path (default: LINE_RELAY_CONFIG_PATH or ~/.line-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Run the webhook gateway. LINE_ACCESS_TOKEN and GEMINI_API_KEY override the config file.
    Gateway {
        /// Config file path (default: LINE_RELAY_CONFIG_PATH or ~/.line-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// HTTP port (default from config or 15152)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Run a saved gateway envelope through the processing pipeline once and print the outcome.
    Replay {
        /// File holding a gateway envelope (`{"body": "<LINE JSON>"}`)
        #[arg(value_name = "FILE")]
        envelope: PathBuf,

        /// Config file path (default: LINE_RELAY_CONFIG_PATH or ~/.line-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("line-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Replay { envelope, config }) => {
            if let Err(e) = run_replay(envelope, config).await {
                log::error!("replay failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(relay::config::default_config_path);
    if relay::config::write_default_config(&path)? {
        println!("wrote default configuration to {}", path.display());
    } else {
        println!("configuration already exists at {}", path.display());
    }
    Ok(())
}

async fn run_gateway(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let (mut config, path) = relay::config::load_config(config_path)?;
    log::debug!("loaded config from {}", path.display());
    if let Some(p) = port {
        config.gateway.port = p;
    }
    let credentials = relay::config::Credentials::resolve(&config);
    if credentials.gemini_api_key.is_none() {
        log::warn!("no Gemini API key configured; text messages will get the failure reply");
    }
    log::info!("starting gateway on {}:{}", config.gateway.bind, config.gateway.port);
    relay::gateway::run_gateway(config, credentials).await
}

async fn run_replay(envelope: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    use anyhow::Context;

    let (config, _) = relay::config::load_config(config_path)?;
    let raw = std::fs::read(&envelope)
        .with_context(|| format!("reading envelope from {}", envelope.display()))?;
    let credentials = relay::config::Credentials::resolve(&config);
    let pipeline = relay::pipeline::Pipeline::from_config(&config, &credentials);
    let outcome = pipeline.process(&raw).await;
    println!("{}", outcome);
    Ok(())
}
