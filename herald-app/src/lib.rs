//! Herald: announces a Twitch stream on X and Bluesky when it goes live.
pub mod announce;
pub mod error;
pub mod routes;
pub mod signature;
pub mod state;

use anyhow::Context;
use herald_config::HeraldConfig;
use state::AppState;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serve until Ctrl-C or SIGTERM.
pub async fn run(cfg: HeraldConfig) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&cfg).await?);
    let router = routes::build_router(state);

    let listener = TcpListener::bind(&cfg.server.bind)
        .await
        .with_context(|| format!("binding {}", cfg.server.bind))?;
    tracing::info!(addr = %cfg.server.bind, "server.listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server.stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "server.signal.ctrl_c_failed");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "server.signal.sigterm_failed");
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
    tracing::info!("server.shutdown");
}
