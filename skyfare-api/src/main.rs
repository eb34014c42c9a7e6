use skyfare_api::{app, state::AppState};
use skyfare_engine::BookingEngine;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyfare_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = skyfare_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Skyfare API on port {}", config.server.port);

    // Postgres Connection
    let db = skyfare_store::DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");

    let catalog = Arc::new(skyfare_store::PgCatalog::new(db.pool.clone()));
    let store = Arc::new(skyfare_store::PgStore::new(db.pool.clone()));
    let engine = Arc::new(BookingEngine::new(catalog, store));

    let app = app(AppState::new(engine));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
