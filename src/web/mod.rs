//! mirage-web: REST API + WebSocket front end over the conversation store.
//!
//! Persists state in SQLite and runs the message lifecycle engine (seen
//! timers, auto-replies) as background tasks.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;

use crate::lifecycle::Engine;
use crate::reply::{GeminiGenerator, ReplyGenerator, ScriptedGenerator};
use crate::repository::ConversationRepository;
use crate::store::BlobStore;
use crate::{logging, mlog};

use config::{Cli, Config};
use state::AppState;

const DB_FILE: &str = "mirage.db";

/// Entry point: parse CLI, open the store, start the server.
pub async fn run() {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    logging::init();

    mlog!("mirage starting");
    mlog!("  data directory: {}", config.data_dir.display());

    std::fs::create_dir_all(&config.data_dir).expect("failed to create data directory");

    let db_path = config.data_dir.join(DB_FILE);
    let store = BlobStore::open(&db_path).expect("failed to open database");
    mlog!("  database: {}", db_path.display());

    let generator: Arc<dyn ReplyGenerator> = match config.gemini_api_key {
        Some(key) => {
            mlog!("  replies: gemini ({})", config.gemini_model);
            Arc::new(GeminiGenerator::new(key, config.gemini_model))
        }
        None => {
            mlog!("  replies: scripted (no API key configured)");
            Arc::new(ScriptedGenerator::default())
        }
    };

    let repository = ConversationRepository::new(store);
    let engine = Engine::shared(repository, generator);
    let state = AppState::new(engine);

    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    mlog!("mirage listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.expect("server error");
}
