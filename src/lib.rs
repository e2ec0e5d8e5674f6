pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::database::store::SharedStore;
use crate::services::AssistClient;

/// Shared per-process state: the persistence boundary and the text-service
/// client. Per-request scoping happens in the handlers, not here.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub assist: AssistClient,
}

pub fn app(state: AppState) -> Router {
    use handlers::public::ops;

    let router = Router::new()
        // Public
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/ping", get(ops::ping).options(ops::preflight))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(TraceLayer::new_for_http());

    let router = if config::config().security.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::{auth, ops};

    Router::new()
        .route("/auth/signup", post(auth::signup).options(ops::preflight))
        .route("/auth/login", post(auth::login).options(ops::preflight))
}

fn api_routes() -> Router<AppState> {
    use handlers::protected::{assist, messages, method_not_allowed, profile};

    Router::new()
        .route(
            "/api/messages",
            get(messages::read)
                .post(messages::send)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/profile",
            get(profile::get).put(profile::put).fallback(method_not_allowed),
        )
        .route("/api/assist", post(assist::prompt).fallback(method_not_allowed))
        .route(
            "/api/assist/profile-summary",
            post(assist::profile_summary).fallback(method_not_allowed),
        )
        .layer(axum_middleware::from_fn(middleware::jwt_auth_middleware))
}
