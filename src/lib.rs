pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod rentals;
pub mod validation;

use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AdminPrincipal, TokenService, UserPrincipal};
pub use db::{DbOperations, Store};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Registers every route. Shared by the binary and the integration tests.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    use admin::handlers::{
        admin_create_car, admin_delete_car, admin_update_car, admin_update_rental, admin_view_data,
    };
    use auth::handlers::{login_admin, login_user, register};
    use rentals::handlers::{delete_rent_car, rent_car};

    cfg.route("/health", web::get().to(health_check))
        .route("/register-User", web::post().to(register))
        .route("/login-user", web::post().to(login_user))
        .route("/rent-car", web::post().to(rent_car))
        .route("/delete-rent-car/{appointmentDate}", web::delete().to(delete_rent_car))
        .route("/login-admin", web::post().to(login_admin))
        .route("/admin-view-data", web::get().to(admin_view_data))
        .route("/admin-create-car", web::post().to(admin_create_car))
        .route("/admin-update-car/{carId}", web::patch().to(admin_update_car))
        .route("/admin-delete-car/{carId}", web::delete().to(admin_delete_car))
        .route("/admin-update-rental/{username}", web::patch().to(admin_update_rental));
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Connects to PostgreSQL and applies pending migrations.
    pub async fn new(config: Settings) -> Result<Self> {
        let db = DbOperations::connect(&config.database).await?;
        db.migrate().await?;
        Ok(Self::with_store(config, Arc::new(db)))
    }

    pub fn with_store(config: Settings, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::from_config(&config.auth);
        Self {
            config: Arc::new(config),
            store,
            tokens: Arc::new(tokens),
        }
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.store.close().await;
        Ok(())
    }
}
