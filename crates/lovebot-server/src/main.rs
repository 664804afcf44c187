//! lovebot-server - HTTP shell binary.

use std::net::SocketAddr;
use std::sync::Arc;

use lovebot_core::context::persistence_from_config;
use lovebot_core::{AdvisoryOrchestrator, ContextSaveScheduler, ContextStore, Lexicon, LovebotConfig};
use lovebot_llm::LlmFactory;
use lovebot_server::{create_server, AppState};
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("lovebot_server=debug".parse()?),
        )
        .init();

    let host = std::env::var("LOVEBOT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("LOVEBOT_PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| "LOVEBOT_PORT must be a valid port number")?;

    let config = LovebotConfig::from_env()?;

    // Durable context, loaded before the first message is handled
    let persistence = persistence_from_config(&config.storage)?;
    info!(
        backend = persistence.name(),
        path = %config.storage.path.display(),
        "Context storage ready"
    );
    let store = Arc::new(ContextStore::open(persistence, &config).await);

    let lexicon = Arc::new(Lexicon::builtin()?);
    let languages: Vec<&str> = lexicon.languages().iter().map(|l| l.name()).collect();
    info!(languages = ?languages, "Lexicon loaded");

    let llm = LlmFactory::from_config(&config.llm)?;

    let mut scheduler =
        ContextSaveScheduler::new(store.clone(), config.context.save_interval_secs).await?;
    scheduler.start().await?;
    info!(
        interval_secs = scheduler.interval_secs(),
        "Context save scheduler started"
    );

    let orchestrator = Arc::new(AdvisoryOrchestrator::new(config, lexicon, store, llm));
    let app = create_server(AppState::new(orchestrator));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting lovebot-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, flushing contexts...");
        })
        .await?;

    let saved = scheduler.shutdown().await?;
    info!(saved, "Server stopped cleanly");
    Ok(())
}
