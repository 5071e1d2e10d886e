//! Boxoffice HTTP server.
//!
//! Wires the reservation core to Redis, PostgreSQL, and the event bus, then
//! serves the booking API with graceful shutdown.

use boxoffice_server::{build_router, AppState, ServerConfig};
use boxoffice_booking::stores::{
    KafkaEventPublisher, PostgresBookingRepository, RedisSeatCoordinator,
};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "boxoffice_server=info,boxoffice_booking=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Boxoffice booking server");

    let config = ServerConfig::from_env();
    info!(
        redis_url = %config.redis_url,
        kafka_brokers = %config.kafka_brokers,
        events_topic = %config.events_topic,
        "Configuration loaded"
    );

    info!("Connecting to PostgreSQL...");
    let repository = PostgresBookingRepository::connect(&config.database_url).await?;
    repository.migrate().await?;
    info!("Durable store ready");

    info!("Connecting to Redis...");
    let coordinator = RedisSeatCoordinator::new(&config.redis_url).await?;
    info!("Seat coordinator ready");

    let events = KafkaEventPublisher::new(&config.kafka_brokers, &config.events_topic)?;
    info!("Event publisher ready");

    let state = AppState::new(coordinator, repository, events, config.booking_config());
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
