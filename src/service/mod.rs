pub mod account_handlers;
pub mod dto;
pub mod middleware;

use account_data::repositories::AccountRepository;
use account_domain::{AccountService, AccountServiceImpl, CredentialHasher, TokenService};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountService>,
    pub token_service: Arc<dyn TokenService>,
}

impl AppState {
    pub fn new(
        account_repository: Arc<dyn AccountRepository>,
        token_service: Arc<dyn TokenService>,
        hashing_service: Arc<dyn CredentialHasher>,
    ) -> Self {
        let account_service =
            AccountServiceImpl::new(account_repository, token_service.clone(), hashing_service);

        Self {
            account_service: Arc::new(account_service),
            token_service,
        }
    }
}

/// Build the HTTP router. Register and login are public; every id-addressed
/// route requires a bearer access token.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/{id}",
            get(account_handlers::get_account)
                .put(account_handlers::update_account)
                .delete(account_handlers::delete_account),
        )
        .route(
            "/{id}/reset-password",
            post(account_handlers::reset_password),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::require_bearer,
        ));

    Router::new()
        .route("/register", post(account_handlers::register))
        .route("/login", post(account_handlers::login))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
