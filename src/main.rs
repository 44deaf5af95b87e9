mod api;
mod board;
mod config;
mod market;

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::interval;
use log::{info, error};
use tower_http::cors::CorsLayer;

use crate::api::{ApiState, create_router};
use crate::board::{BoardMessage, NotificationHub, QuoteStore};
use crate::config::{Config, CLIENT_CHANNEL_SIZE, HEARTBEAT_INTERVAL_SECS, STATS_INTERVAL_SECS};
use crate::market::{QuotePoller, YahooFetcher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    // Log configuration
    config.log_config();

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        return Err(e.into());
    }

    // Build the shared context: store + notification hub, passed by
    // handle to the poller and every handler
    let store = Arc::new(QuoteStore::new(config.tickers.clone()));
    let hub = NotificationHub::new(CLIENT_CHANNEL_SIZE);

    // Start the quote poller (first cycle runs immediately)
    let fetcher = Arc::new(YahooFetcher::new()?);
    QuotePoller::new(
        store.clone(),
        hub.clone(),
        fetcher,
        config.poll_interval_secs,
    )
    .spawn();

    // Start heartbeat and stats tasks
    start_background_tasks(store.clone(), hub.clone()).await;

    // Start HTTP server
    let state = ApiState { store, hub };

    let app = create_router(state).layer(CorsLayer::permissive()); // Enable CORS for web clients

    let bind_address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_address).await?;
    info!("🚀 Quote board running at http://{}", bind_address);
    info!("🔗 Event stream: http://{}/events", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn start_background_tasks(store: Arc<QuoteStore>, hub: Arc<NotificationHub>) {
    // Heartbeat task: periodic info event so the board shows liveness
    let heartbeat_hub = hub.clone();
    tokio::spawn(async move {
        let mut interval_timer = interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
        // Skip the leading tick; a heartbeat at t=0 says nothing
        interval_timer.tick().await;

        loop {
            interval_timer.tick().await;
            let stamp = chrono::Local::now().format("%H:%M:%S");
            heartbeat_hub.publish(BoardMessage::info(format!("heartbeat {}", stamp)));
        }
    });

    // Stats task
    tokio::spawn(async move {
        let mut interval_timer = interval(Duration::from_secs(STATS_INTERVAL_SECS));

        loop {
            interval_timer.tick().await;
            let clients = hub.client_count();
            let symbols = store.symbol_count();

            if clients > 0 {
                info!("Stats - Clients: {}, Symbols: {}", clients, symbols);
            }
        }
    });

    info!("💓 Started heartbeat task (every {} seconds)", HEARTBEAT_INTERVAL_SECS);
    info!("📈 Started stats monitoring task (every {} seconds)", STATS_INTERVAL_SECS);
}
