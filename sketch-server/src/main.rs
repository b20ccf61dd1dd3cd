use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use sketch_core::WordBank;
use sketch_server::{
    config::Config, create_routes, registry::RoomRegistry, room, websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting sketch server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let addr = match config.socket_addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let words = match &config.words_file {
        Some(path) => match WordBank::load(path) {
            Ok(words) => {
                info!("Loaded {} words from {}", words.len(), path);
                words
            }
            Err(e) => {
                error!("Failed to load word list: {:#}", e);
                error!("Unset WORDS_FILE to use the built-in word list.");
                std::process::exit(1);
            }
        },
        None => {
            let words = WordBank::builtin();
            info!("Using built-in word list ({} words)", words.len());
            words
        }
    };

    let connection_manager = Arc::new(ConnectionManager::new());
    let registry = Arc::new(RoomRegistry::new(config.clone(), Arc::new(words)));

    let routes = create_routes(connection_manager.clone(), registry.clone());

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let cleanup_registry = registry.clone();
    let cleanup_interval = Duration::from_secs(config.cleanup_interval_seconds.max(1));
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;

            let stale = cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
            for connection in stale {
                if let Some((room_id, _)) = connection.seat() {
                    cleanup_registry.disconnect(room_id, connection.id).await;
                }
            }

            let evicted = cleanup_registry.sweep(room::now()).await;
            if evicted > 0 {
                info!(
                    "Evicted {} rooms, {} still live",
                    evicted,
                    cleanup_registry.room_count()
                );
            }
        }
    });

    info!("Server starting on {}", addr);

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;

    registry.shutdown().await;
    info!("Server shutdown complete.");
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal as unix_signal};

        match (
            unix_signal(SignalKind::interrupt()),
            unix_signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("Received SIGINT, shutting down gracefully...");
                    }
                    _ = sigterm.recv() => {
                        info!("Received SIGTERM, shutting down gracefully...");
                    }
                }
            }
            _ => {
                error!("Failed to install signal handlers, falling back to Ctrl+C");
                let _ = signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
