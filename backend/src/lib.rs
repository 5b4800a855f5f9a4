//! # Chore Tracker Backend
//!
//! Household chore and reward tracker: parents define recurring tasks, kids
//! submit them for approval and spend the points they earn on rewards.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (calculators, services)
//!     ↓
//! Storage Layer (document store on SQLite)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderName, HeaderValue, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{
    ApprovalService, Clock, Collections, FamilyService, HighscoreService, HistoryService,
    KidService, RewardService, SystemClock, TaskService, UserService,
};
use crate::storage::{DbConnection, DocumentStore, StorePaths};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub family_service: FamilyService,
    pub kid_service: KidService,
    pub task_service: TaskService,
    pub approval_service: ApprovalService,
    pub reward_service: RewardService,
    pub highscore_service: HighscoreService,
    pub history_service: HistoryService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db_conn = DbConnection::new(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;

    info!("Setting up domain model for app {}", config.app_id);
    let store: Arc<dyn DocumentStore> = Arc::new(db_conn);
    Ok(build_state(store, config, Arc::new(SystemClock)))
}

/// Wire every service onto one store and clock
pub fn build_state(store: Arc<dyn DocumentStore>, config: &AppConfig, clock: Arc<dyn Clock>) -> AppState {
    let collections = Collections::new(store, StorePaths::new(config.app_id.clone()));

    AppState {
        user_service: UserService::new(collections.clone(), clock.clone(), config.admin_emails.clone()),
        family_service: FamilyService::new(collections.clone(), clock.clone()),
        kid_service: KidService::new(collections.clone(), clock.clone()),
        task_service: TaskService::new(collections.clone(), clock.clone()),
        approval_service: ApprovalService::new(collections.clone(), clock.clone()),
        reward_service: RewardService::new(collections.clone(), clock.clone()),
        highscore_service: HighscoreService::new(collections.clone()),
        history_service: HistoryService::new(collections, clock),
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, config: &AppConfig) -> Router {
    let cors = match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(origin),
        Err(_) => {
            warn!("Invalid CORS origin '{}', allowing any origin", config.cors_origin);
            CorsLayer::new().allow_origin(Any)
        }
    }
    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
    .allow_headers([
        HeaderName::from_static("content-type"),
        HeaderName::from_static(io::rest::USER_ID_HEADER),
    ]);

    let router = Router::new()
        .nest("/api", io::rest::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    match &config.static_dir {
        Some(dir) => {
            info!("Serving static files from {:?}", dir);
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    }
}
