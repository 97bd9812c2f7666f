use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tts_studio::config::ServerConfig;
use tts_studio::gateway::SynthesisGateway;
use tts_studio::serve;

#[derive(Parser, Debug)]
#[command(author, version, about = "Text to speech studio: synthesize, keep history, replay on demand")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Check that the speech provider is reachable with the configured key
    Status {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config, port } => {
            let mut config = ServerConfig::load(&config)?;
            if let Some(port) = port {
                config.port = port;
            }
            serve::serve(config)
        }
        Command::Status { config } => status(ServerConfig::load(&config)?),
    }
}

fn status(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let gateway = SynthesisGateway::new(serve::gateway_settings(&config)?)?;
    let rt = tokio::runtime::Runtime::new()?;
    let voices = rt.block_on(gateway.list_voices())?;
    println!(
        "Provider reachable at {} ({} voices available)",
        config.provider.base_url,
        voices.len()
    );
    Ok(())
}
