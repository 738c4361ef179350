use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use studybox::config::ServerConfig;
use studybox::flashcards::FlashcardStorage;
use studybox::server::{self, AppState};

#[derive(Parser)]
#[command(
    name = "studybox-server",
    about = "Flashcard study service with Leitner-box spaced repetition",
    version
)]
struct Cli {
    /// Path to a TOML config file (default: studybox.toml in the data dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the listen address (e.g. 127.0.0.1:7151)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = ServerConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    let storage = FlashcardStorage::new(config.data_dir.clone());
    storage
        .init()
        .with_context(|| format!("Failed to initialize storage in {:?}", config.data_dir))?;
    log::info!("Using data directory {:?}", config.data_dir);

    let app = server::router(AppState {
        storage: Arc::new(storage),
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    log::info!("Study server listening on http://{}", config.bind);

    axum::serve(listener, app).await?;
    Ok(())
}
