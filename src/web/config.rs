//! Configuration types and constants for the mirage web server.

use std::path::PathBuf;

use clap::Parser;

pub(crate) const MAX_WS_CONNECTIONS: usize = 8;

/// Web server for the mirage messaging simulator.
///
/// Serves a REST API + WebSocket over the locally-persisted conversation
/// store.  Configuration can be set via CLI arguments or environment
/// variables; CLI arguments take precedence.
#[derive(Parser, Debug)]
#[command(name = "mirage", version, about)]
pub struct Cli {
    /// HTTP server bind address [env: MIRAGE_BIND] [default: 127.0.0.1:3000]
    #[arg(long, short = 'b')]
    pub bind: Option<String>,

    /// Data directory for the conversation database [env: MIRAGE_HOME] [default: ~/.mirage]
    #[arg(long, short = 'd')]
    pub data_dir: Option<PathBuf>,

    /// Gemini API key; enables live auto-replies [env: MIRAGE_GEMINI_API_KEY]
    #[arg(long)]
    pub gemini_api_key: Option<String>,

    /// Gemini model used for auto-replies [env: MIRAGE_GEMINI_MODEL]
    #[arg(long)]
    pub gemini_model: Option<String>,
}

pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_cli_and_env(cli: Cli) -> Self {
        let data_dir = cli
            .data_dir
            .or_else(|| std::env::var("MIRAGE_HOME").ok().map(PathBuf::from))
            .unwrap_or_else(|| {
                std::env::var("HOME")
                    .map(|h| PathBuf::from(h).join(".mirage"))
                    .unwrap_or_else(|_| PathBuf::from(".mirage"))
            });

        let bind_addr = cli
            .bind
            .or_else(|| std::env::var("MIRAGE_BIND").ok())
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());

        let gemini_api_key = cli
            .gemini_api_key
            .or_else(|| std::env::var("MIRAGE_GEMINI_API_KEY").ok());

        let gemini_model = cli
            .gemini_model
            .or_else(|| std::env::var("MIRAGE_GEMINI_MODEL").ok())
            .unwrap_or_else(|| crate::reply::DEFAULT_GEMINI_MODEL.to_string());

        Self {
            bind_addr,
            data_dir,
            gemini_api_key,
            gemini_model,
        }
    }
}
