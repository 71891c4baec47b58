//! mora-gen - Video-to-code session service
//!
//! Accepts a tutorial video URL, drives it through transcript → plan →
//! per-segment code synthesis → timeline, and streams progress over SSE.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mora_gen::config::ServiceConfig;
use mora_gen::services::{
    BibiGptClient, ChatClient, LlmCodeSynthesizer, LlmSegmentPlanner, LlmTimelineAssembler,
    PipelineDriver, SessionRepository, SqliteSessionRepository, SqliteTranscriptCache,
};
use mora_gen::session_store::{spawn_sweeper, SessionStore};
use mora_gen::AppState;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "mora-gen", version, about = "Video-to-code session service")]
struct Args {
    /// Path to the TOML config file (default: MORA_CONFIG, then ~/.config/mora/mora-gen.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root folder holding the database (default: MORA_ROOT_FOLDER, then config, then OS default)
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first so its log level can seed the filter
    let config_result = ServiceConfig::load(args.config.as_deref());
    let default_level = config_result
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize tracing (RUST_LOG overrides the configured level)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    // Build identification immediately after tracing init
    info!(
        "Starting mora-gen v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let mut config = config_result.context("Failed to load configuration")?;
    config.resolve_api_keys();

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    // Database
    let db_path = config.database_path(args.root_folder.as_deref());
    info!("Database: {}", db_path.display());
    let db_pool = mora_gen::db::init_database_pool(&db_path)
        .await
        .context("Failed to initialize database")?;
    info!("Database connection established");

    // Collaborators
    let chat = Arc::new(ChatClient::new(config.llm.clone()).context("Failed to build LLM client")?);
    info!(model = chat.model(), "LLM client initialized");
    let transcript_source = Arc::new(
        BibiGptClient::new(config.transcript.clone()).context("Failed to build transcript client")?,
    );
    let planner = Arc::new(LlmSegmentPlanner::new(
        Arc::clone(&chat),
        config.pipeline.max_segments,
    ));
    let synthesizer = Arc::new(LlmCodeSynthesizer::new(Arc::clone(&chat)));
    let assembler = Arc::new(LlmTimelineAssembler::new(Arc::clone(&chat)));

    let repository: Arc<dyn SessionRepository> =
        Arc::new(SqliteSessionRepository::new(db_pool.clone()));

    let mut driver = PipelineDriver::new(
        transcript_source,
        planner,
        synthesizer,
        assembler,
        config.pipeline.clone(),
    )
    .with_repository(Arc::clone(&repository));

    if config.cache.enabled {
        let cache = SqliteTranscriptCache::new(
            db_pool.clone(),
            std::time::Duration::from_secs(config.cache.ttl_secs),
        );
        match cache.purge_expired().await {
            Ok(purged) if purged > 0 => info!(purged, "Purged expired transcript cache entries"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge transcript cache"),
        }
        driver = driver.with_cache(Arc::new(cache));
        info!(ttl_secs = config.cache.ttl_secs, "Transcript cache enabled");
    } else {
        info!("Transcript cache disabled");
    }

    // Session store + sweeper
    let store = Arc::new(
        SessionStore::new(&config.store, config.events.subscriber_buffer)
            .with_repository(repository),
    );
    let _sweeper = spawn_sweeper(Arc::clone(&store), config.store.sweep_interval());
    info!(
        max_sessions = store.capacity(),
        ttl_secs = config.store.session_ttl_secs,
        "Session store initialized"
    );

    let state = AppState::new(store, Arc::new(driver), config.events.keep_alive());
    let app = mora_gen::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
