use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::info;
use vellum_api_types::MutationPayload;

use crate::application::error::HttpError;
use crate::cache::InvalidationCoordinator;
use crate::domain::mutation::MutationEvent;

/// Header carrying the shared hook secret.
pub const HOOK_SECRET_HEADER: &str = "x-vellum-hook-secret";

#[derive(Clone)]
pub struct HookState {
    pub coordinator: Arc<InvalidationCoordinator>,
    pub secret: Option<Arc<str>>,
}

impl HookState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.secret.as_deref() else {
            return true;
        };
        headers
            .get(HOOK_SECRET_HEADER)
            .is_some_and(|provided| provided.as_bytes().ct_eq(expected.as_bytes()).unwrap_u8() == 1)
    }
}

/// `POST /hooks/mutation`: plan, execute and report the purge set.
pub(super) async fn mutation_hook(
    State(state): State<HookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.authorized(&headers) {
        return HttpError::new(
            "infra::http::hooks::mutation_hook",
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "hook secret missing or mismatched",
        )
        .into_response();
    }

    let payload: MutationPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return HttpError::from_error(
                "infra::http::hooks::mutation_hook",
                StatusCode::BAD_REQUEST,
                "Invalid mutation payload",
                &err,
            )
            .into_response();
        }
    };

    let coordinator = &state.coordinator;
    let event = MutationEvent::from_payload(payload, coordinator.locales());
    let targets = coordinator.on_mutation(event).await;
    let report = targets.to_report();
    info!(
        paths = report.paths.len(),
        tags = report.tags.len(),
        "Mutation hook handled"
    );
    Json(report).into_response()
}
