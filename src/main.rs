use anyhow::Context;
use chat_relay::{
    config::Config,
    routes,
    services::completion::CompletionClient,
    state::AppState,
    telemetry,
};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing(telemetry::DEFAULT_FILTER)?;

    let config = Config::from_env().context("invalid configuration")?;

    let completion = match config.completion() {
        Some(settings) => Some(
            CompletionClient::new(settings).context("failed to build completion client")?,
        ),
        None => {
            tracing::warn!("GROQ_API_KEY is not set; /api/message will answer with a configuration error");
            None
        }
    };
    if let Some(client) = &completion {
        tracing::info!(model = client.model(), base_url = %config.base_url, "completion client ready");
    }

    let state = Arc::new(AppState::new(completion));

    let app = routes::create_router(&config.static_dir)
        .with_state(state)
        .layer(routes::cors_layer(&config));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;

    tracing::info!(environment = ?config.environment, "server is running on http://localhost:{}", config.port);
    tracing::info!("test the API at http://localhost:{}/api/message", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
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
    tracing::info!("shutdown signal received");
}
