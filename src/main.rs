use axum::http::{HeaderValue, Method};
use std::{net::SocketAddr, time::Duration};
use tokio::{signal, sync::watch};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use content_site::{build_router, services::telegram::TelegramBot, utils::config::AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "content_site=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting content site server");

    // Load configuration
    let config = AppConfig::from_env();
    tracing::info!(
        "Configuration loaded: bind={}, config_file={}, data_file={}, bot_enabled={}",
        config.bind_address(),
        config.config_file,
        config.data_file,
        config.telegram_bot_token.is_some()
    );

    let app_state = AppState::new(config.clone());

    // Run the command front-end in this process so both front-ends share
    // the same store locks.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let bot_task = match &config.telegram_bot_token {
        Some(token) => {
            let bot = TelegramBot::new(
                &config.telegram_api_base,
                token,
                config.telegram_poll_timeout,
                app_state.command_processor(),
            )?;
            Some(tokio::spawn(bot.run(shutdown_rx)))
        }
        None => {
            tracing::info!("TELEGRAM_BOT_TOKEN not set, command front-end disabled");
            None
        }
    };

    let app = build_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_seconds)))
            .layer(cors_layer(&config)),
    );

    // Parse the bind address
    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = bot_task {
        if let Err(e) = task.await {
            tracing::error!("Command front-end task failed: {}", e);
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let allow_origin = if config.allows_any_origin() {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .allow_origin(allow_origin)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
