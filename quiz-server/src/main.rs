use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use quiz_core::SharedStore;
use quiz_persistence::{SqlStore, connection::connect_and_migrate};
use quiz_server::{
    auth::PassphraseGate,
    config::Config,
    create_routes,
    quiz_service::{QuizService, seed_questions_from_file},
    websocket::{ConnectionManager, broadcaster::spawn_state_broadcaster},
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting quiz server...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize database connection and run migrations
    let db = match connect_and_migrate(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };

    let store: SharedStore = match SqlStore::new(db).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open quiz store: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(questions_file) = &config.questions_file {
        if let Err(e) = seed_questions_from_file(&store, Path::new(questions_file)).await {
            error!("Failed to seed questions from '{}': {:#}", questions_file, e);
            std::process::exit(1);
        }
    }

    let quiz_service = match QuizService::load(store, config.question_order).await {
        Ok(service) => {
            info!("Loaded {} questions", service.host().catalog().len());
            Arc::new(service)
        }
        Err(e) => {
            error!("Failed to load the question catalog: {}", e);
            error!("Set QUESTIONS_FILE to a JSON array of questions to seed the store.");
            std::process::exit(1);
        }
    };

    let gate = Arc::new(PassphraseGate::new(
        &config.host_password,
        config.join_code.as_deref(),
    ));
    if !gate.requires_join_code() {
        warn!("JOIN_CODE is not set; any player may join");
    }

    let connection_manager = Arc::new(ConnectionManager::new());
    let routes = create_routes(connection_manager.clone(), quiz_service.clone(), gate);

    spawn_state_broadcaster(
        quiz_service.clone(),
        connection_manager.clone(),
        config.poll_interval,
    );

    // Start cleanup task
    let cleanup_connection_manager = connection_manager.clone();
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            cleanup_connection_manager
                .cleanup_inactive_connections(connection_timeout)
                .await;
        }
    });

    let ip = match config.host.parse::<std::net::IpAddr>() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Invalid HOST '{}': {}", config.host, e);
            std::process::exit(1);
        }
    };

    info!("Server starting on {}:{}", config.host, config.port);

    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown((ip, config.port), shutdown_signal());

    info!(
        "Server started successfully on {}. Press Ctrl+C to stop.",
        addr
    );
    server.await;
    info!("Server shutdown complete.");
}

async fn shutdown_signal() {
    // Wait for SIGINT (Ctrl+C) or SIGTERM
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
                return;
            }
            _ => warn!("Failed to install signal handlers, falling back to Ctrl+C"),
        }
    }

    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down gracefully...");
}
