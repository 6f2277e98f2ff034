//! Buy-watch Operator - buy detection and floor-price monitoring
//!
//! This is the main entry point for the Operator service.
//! It wires the monitor tasks and the status API, then waits for a
//! shutdown signal.

use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use buywatch_operator::config::AppConfig;
use buywatch_operator::handlers::{self, AppState, MarketState};
use buywatch_operator::metrics::MetricsState;
use buywatch_operator::monitoring::{
    start_monitors, FloorTracker, JsonRpcClient, LedgerPoller, LedgerPollerConfig, MonitorState,
    ScheduleConfig, TransactionClassifier,
};
use buywatch_operator::notifications::{AlertDispatcher, DiscordNotifier};
use buywatch_operator::price_data::{HttpPriceDataProvider, PriceDataProvider};
use buywatch_operator::price_oracle::CoinGeckoOracle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting Buy-watch Operator v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    tracing::info!(
        token = %config.ledger.token_address,
        rpc_url = %config.ledger.rpc_url,
        poll_interval_secs = config.ledger.poll_interval_secs,
        floor_interval_secs = config.floor.interval_secs,
        "Configuration loaded"
    );

    let metrics = Arc::new(MetricsState::new());

    // Outbound clients
    let rpc = Arc::new(JsonRpcClient::new(
        config.ledger.rpc_url.clone(),
        config.ledger.request_timeout(),
        metrics.clone(),
    )?);
    let oracle = Arc::new(CoinGeckoOracle::new(&config.oracle, metrics.clone())?);
    let notifier = Arc::new(DiscordNotifier::from_config(&config.discord)?);
    let provider: Option<Arc<dyn PriceDataProvider>> =
        HttpPriceDataProvider::from_config(&config.price_data)?
            .map(|p| Arc::new(p) as Arc<dyn PriceDataProvider>);
    tracing::info!(floor_tracking = provider.is_some(), "Clients initialized");

    let dispatcher = Arc::new(AlertDispatcher::new(
        notifier,
        config.discord.feed_channel_id,
        config.discord.discussion_channel_id,
        metrics.clone(),
    ));

    let poller = Arc::new(LedgerPoller::new(
        rpc,
        oracle,
        TransactionClassifier::new(config.ledger.team_wallet.clone(), config.ledger.min_buy_sol),
        dispatcher.clone(),
        LedgerPollerConfig {
            token_address: config.ledger.token_address.clone(),
            signature_limit: config.ledger.signature_limit,
            catch_up_limit: config.ledger.catch_up_limit,
        },
        metrics.clone(),
    ));

    let tracker = provider.clone().map(|provider| {
        Arc::new(FloorTracker::new(
            provider,
            dispatcher.clone(),
            config.floor.provider_timeout(),
            metrics.clone(),
        ))
    });

    let schedule = ScheduleConfig {
        ledger_interval: config.ledger.poll_interval(),
        floor_interval: config.floor.interval(),
    };

    // Spawn monitor tasks
    let cancel_token = CancellationToken::new();
    let monitors = start_monitors(
        MonitorState::new(),
        poller,
        tracker,
        schedule,
        metrics.clone(),
        cancel_token.clone(),
    );
    tracing::info!("Monitor tasks started");

    // Status server
    let server = if config.server.enabled {
        let app_state = Arc::new(AppState {
            started_at: Utc::now(),
            status: monitors.status.clone(),
            ledger_interval: schedule.ledger_interval,
            floor_interval: schedule.floor_interval,
        });
        let market_state = Arc::new(MarketState {
            provider,
            dispatcher,
        });
        let app = handlers::router(app_state, market_state, metrics);

        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "Server listening");

        let server_cancel = cancel_token.clone();
        Some(tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_cancel.cancelled().await })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Status server failed");
            }
        }))
    } else {
        tracing::info!("Status server disabled");
        None
    };

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, stopping tasks");

    cancel_token.cancel();
    monitors.join().await;
    if let Some(server) = server {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "Status server task ended abnormally");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
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

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buywatch_operator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}
