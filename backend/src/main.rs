use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Level};

mod domain;
mod rest;
mod storage;

use domain::{
    BudgetRuleService, ExpenseService, FinanceStore, GoalService, IncomeService,
    ReportingService, SessionManager, SettingsService,
};
use rest::AppState;
use storage::{FileDocumentStore, FileSnapshotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let data_dir = data_directory();
    info!("Setting up storage in {}", data_dir.display());
    let documents = Arc::new(FileDocumentStore::new(data_dir.join("documents"))?);
    let snapshots = Arc::new(FileSnapshotStore::new(data_dir.join("local"))?);

    // The store starts in anonymous mode; signing in through the API
    // switches it to the per-user document collections.
    let store = FinanceStore::new(documents, snapshots)?;

    let state = AppState {
        expenses: ExpenseService::new(store.clone()),
        incomes: IncomeService::new(store.clone()),
        goals: GoalService::new(store.clone()),
        budget_rules: BudgetRuleService::new(store.clone()),
        reporting: ReportingService::new(store.clone()),
        settings: SettingsService::new(store.clone()),
        sessions: SessionManager::new(store),
    };

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", rest::api_router(state))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Data directory, overridable for development and tests.
fn data_directory() -> PathBuf {
    std::env::var("FINANCE_TRACKER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("finance-data"))
}
