mod hooks;
mod middleware;
mod public;

pub use hooks::{HOOK_SECRET_HEADER, HookState};
pub use public::PublicState;

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::cache::response_cache_layer;

use self::middleware::{log_responses, set_request_context};

#[derive(Clone)]
pub struct RouterState {
    pub public: PublicState,
    pub hooks: HookState,
}

impl FromRef<RouterState> for PublicState {
    fn from_ref(state: &RouterState) -> Self {
        state.public.clone()
    }
}

impl FromRef<RouterState> for HookState {
    fn from_ref(state: &RouterState) -> Self {
        state.hooks.clone()
    }
}

pub fn build_router(state: RouterState) -> Router {
    // Public content goes through the response cache.
    let cached_routes = Router::new()
        .route("/", get(public::public_page))
        .route("/{*path}", get(public::public_page));

    let cached_routes = if let Some(cache_state) = state.public.cache.clone() {
        cached_routes.layer(axum_middleware::from_fn_with_state(
            cache_state,
            response_cache_layer,
        ))
    } else {
        cached_routes
    };

    let service_routes = Router::new()
        .route("/_health", get(health))
        .route("/hooks/mutation", post(hooks::mutation_hook));

    cached_routes
        .merge(service_routes)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}
