pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use actix_web::{web, HttpResponse};
use std::sync::Arc;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, AuthenticatedUser, PasswordService, RequireAuth, TokenCodec};
pub use db::{CredentialStore, InMemoryCredentialStore, PgCredentialStore, User};

/// Registration and login, reachable without a token.
pub const AUTH_PREFIX: &str = "/api/auth";
/// Everything under this prefix (other than [`AUTH_PREFIX`]) needs a valid token.
pub const PROTECTED_PREFIX: &str = "/api";

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub auth_service: Arc<AuthService>,
    pub tokens: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(config: Settings, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let tokens = Arc::new(TokenCodec::from_config(&config.auth)?);
        let passwords = PasswordService::from_config(&config.auth)?;
        let auth_service = Arc::new(AuthService::new(store, passwords, tokens.clone()));

        Ok(Self {
            config: Arc::new(config),
            auth_service,
            tokens,
        })
    }
}

/// Mounts every route. The auth scope is registered first so it is matched
/// before the gated `/api` scope.
pub fn configure_routes(cfg: &mut web::ServiceConfig, state: &AppState) {
    cfg.app_data(web::Data::new(state.clone()))
        .route("/health", web::get().to(health_check))
        .service(
            web::scope(AUTH_PREFIX)
                .app_data(auth::handlers::json_config())
                .route("/register", web::post().to(auth::handlers::register))
                .route("/login", web::post().to(auth::handlers::login)),
        )
        .service(
            web::scope(PROTECTED_PREFIX)
                .wrap(RequireAuth::new(state.tokens.clone()))
                .route("/me", web::get().to(api::current_user)),
        );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let config = Settings::for_test("test_secret").expect("Failed to load test config");
        AppState::new(config, Arc::new(InMemoryCredentialStore::new()))
            .expect("Failed to build state")
    }

    #[test]
    fn test_app_state_clone() {
        let state = state();
        let cloned = state.clone();

        assert!(Arc::ptr_eq(&state.config, &cloned.config));
        assert!(Arc::ptr_eq(&state.auth_service, &cloned.auth_service));
        assert!(Arc::ptr_eq(&state.tokens, &cloned.tokens));
    }

    #[test]
    fn test_service_and_middleware_share_codec() {
        let state = state();
        assert!(Arc::ptr_eq(state.auth_service.tokens(), &state.tokens));
    }

    #[test]
    fn test_ttl_follows_config() {
        let state = state();
        assert_eq!(state.tokens.ttl(), Some(chrono::Duration::hours(1)));
    }
}
