use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use tracing::instrument;

use crate::{
    dto::webhooks::WebhookAck,
    error::AppResult,
    response::ApiResponse,
    services::{identity_service, payment_service},
    state::AppState,
};

const PAYMENT_SIGNATURE_HEADER: &str = "Stripe-Signature";
const IDENTITY_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", post(payment_webhook))
        .route("/identity", post(identity_webhook))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Payment provider events. The raw body is needed for signature checks.
#[utoipa::path(
    post,
    path = "/api/webhooks/payments",
    request_body(content = String, description = "Raw provider event", content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Missing or invalid signature"),
        (status = 500, description = "Could not apply event; provider retries"),
    ),
    tag = "Webhooks"
)]
#[instrument(skip_all)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let response = payment_service::handle_payment_webhook(
        &state,
        header(&headers, PAYMENT_SIGNATURE_HEADER),
        &body,
    )
    .await?;
    Ok(Json(response))
}

/// Identity provider user events.
#[utoipa::path(
    post,
    path = "/api/webhooks/identity",
    request_body(content = String, description = "Raw identity event", content_type = "application/json"),
    responses(
        (status = 200, description = "Event acknowledged", body = ApiResponse<WebhookAck>),
        (status = 400, description = "Missing or invalid signature"),
    ),
    tag = "Webhooks"
)]
#[instrument(skip_all)]
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<ApiResponse<WebhookAck>>> {
    let response = identity_service::handle_identity_webhook(
        &state,
        header(&headers, IDENTITY_SIGNATURE_HEADER),
        &body,
    )
    .await?;
    Ok(Json(response))
}
