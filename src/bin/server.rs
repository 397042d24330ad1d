use chrono::{Duration, Utc};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use murmur::config::ServerConfig;
use murmur::core::RoomServer;
use murmur::handlers::routes;
use murmur::security::WordListFilter;
use murmur::storage::{MemoryMessageStore, MemoryRoomStore, MemorySessionStore, StoredRoom};

#[tokio::main]
async fn main() {
    // Initialize env
    let dotenv_result = dotenvy::dotenv();

    // Initialize logging
    env_logger::init();

    if let Err(e) = dotenv_result {
        warn!("No .env file loaded: {}", e);
    }

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, max_sends={}, rate_window={}ms, edit_window={}ms",
        config.host,
        config.port,
        config.policy.max_sends,
        config.policy.rate_window.num_milliseconds(),
        config.policy.edit_window.num_milliseconds()
    );

    let rooms = Arc::new(MemoryRoomStore::new());
    if let Some(bootstrap) = &config.bootstrap_room {
        let now = Utc::now();
        rooms
            .insert(StoredRoom::new(
                &bootstrap.code,
                bootstrap.name.clone(),
                now,
                now + Duration::hours(24),
            ))
            .await;
        info!("Bootstrap room {} ({}) open for 24h", bootstrap.code, bootstrap.name);
    }

    let server = Arc::new(RoomServer::new(
        config.policy.clone(),
        rooms,
        Arc::new(MemorySessionStore::new()),
        Arc::new(MemoryMessageStore::new()),
        Arc::new(WordListFilter::new(&config.blocked_words)),
    ));
    server.clone().start_maintenance_task(config.sweep_interval);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting Murmur server on {}", addr);
    warp::serve(routes(server)).run(addr).await;
}
