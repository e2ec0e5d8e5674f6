use std::sync::Arc;

use localserve_api::database::manager::DatabaseManager;
use localserve_api::database::store::PgStore;
use localserve_api::services::AssistClient;
use localserve_api::{app, config, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Localserve API in {:?} mode", config.environment);

    let pool = DatabaseManager::pool()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));

    let state = AppState {
        store: Arc::new(PgStore::new(pool)),
        assist: AssistClient::from_config(&config.assist),
    };

    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Localserve API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
