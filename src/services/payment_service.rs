use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, TransactionTrait, sea_query::Expr,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    clients::payments::{PaymentEvent, PaymentOutcome, SessionClaim},
    db::OrmConn,
    dto::webhooks::WebhookAck,
    entity::{OrderStatus, Orders, orders},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::{cart_service::clear_cart, order_service::restore_stock},
    signature::{self, DEFAULT_TOLERANCE_SECS},
    state::AppState,
};

/// Apply a settled payment to the orders of one checkout.
///
/// Returns how many orders changed. Safe under repeated delivery: paid
/// orders are never touched again and deleted orders are simply gone.
pub async fn reconcile(
    conn: &OrmConn,
    order_ids: &[Uuid],
    user_id: &str,
    outcome: PaymentOutcome,
) -> AppResult<u64> {
    let txn = conn.begin().await?;

    let changed = match outcome {
        PaymentOutcome::Succeeded => {
            let result = Orders::update_many()
                .col_expr(orders::Column::IsPaid, Expr::value(true))
                .col_expr(orders::Column::UpdatedAt, Expr::current_timestamp().into())
                .filter(orders::Column::Id.is_in(order_ids.iter().copied()))
                .filter(orders::Column::UserId.eq(user_id))
                .filter(orders::Column::IsPaid.eq(false))
                .exec(&txn)
                .await?;
            clear_cart(&txn, user_id).await?;
            result.rows_affected
        }
        PaymentOutcome::Failed => {
            let unpaid = Orders::find()
                .filter(orders::Column::Id.is_in(order_ids.iter().copied()))
                .filter(orders::Column::UserId.eq(user_id))
                .filter(orders::Column::IsPaid.eq(false))
                .all(&txn)
                .await?;

            // a cancelled order already gave its stock back
            let restock: Vec<Uuid> = unpaid
                .iter()
                .filter(|o| o.status != OrderStatus::Cancelled)
                .map(|o| o.id)
                .collect();
            restore_stock(&txn, &restock).await?;
            let unpaid: Vec<Uuid> = unpaid.into_iter().map(|o| o.id).collect();

            // order_items go with their order (ON DELETE CASCADE)
            Orders::delete_many()
                .filter(orders::Column::Id.is_in(unpaid))
                .exec(&txn)
                .await?
                .rows_affected
        }
    };

    txn.commit().await?;
    Ok(changed)
}

/// Entry point for payment provider webhooks.
///
/// Bad signatures are a 400; anything we do not act on is acknowledged so
/// the provider stops retrying. Database failures surface as 500 so it does
/// retry.
pub async fn handle_payment_webhook(
    state: &AppState,
    signature_header: Option<&str>,
    body: &[u8],
) -> AppResult<ApiResponse<WebhookAck>> {
    let signature_header =
        signature_header.ok_or_else(|| AppError::BadRequest("missing signature".into()))?;
    signature::verify_timestamped(
        state.payments.webhook_secret(),
        signature_header,
        body,
        Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )
    .map_err(|err| AppError::BadRequest(format!("invalid signature: {err}")))?;

    let event: PaymentEvent = serde_json::from_slice(body)
        .map_err(|err| AppError::BadRequest(format!("invalid event payload: {err}")))?;

    let Some(outcome) = event.outcome() else {
        tracing::debug!(event_id = %event.id, kind = %event.kind, "ignoring payment event");
        return Ok(ignored(format!("unhandled event {}", event.kind)));
    };

    let intent_id = event.data.object.id.as_str();
    let metadata = state.payments.find_session_by_intent(intent_id).await?;
    if metadata.is_none() {
        tracing::warn!(event_id = %event.id, intent_id, "no checkout session for payment intent");
    }
    apply_session(state, &event.id, outcome, metadata).await
}

/// Reconcile the checkout session behind a verified payment event.
///
/// Sessions of other applications and our own malformed sessions are
/// acknowledged without touching any order.
pub async fn apply_session(
    state: &AppState,
    event_id: &str,
    outcome: PaymentOutcome,
    metadata: Option<HashMap<String, String>>,
) -> AppResult<ApiResponse<WebhookAck>> {
    let Some(metadata) = metadata else {
        return Ok(ignored("no checkout session for payment intent"));
    };

    let session = match SessionClaim::classify(&metadata, state.payments.app_id()) {
        Ok(SessionClaim::Ours(session)) => session,
        Ok(SessionClaim::Foreign { app_id }) => {
            tracing::info!(event_id, %app_id, "payment event belongs to another application");
            return Ok(ignored("invalid app id"));
        }
        Err(reason) => {
            tracing::warn!(event_id, %reason, "malformed checkout session metadata");
            return Ok(ignored(format!("malformed session metadata: {reason}")));
        }
    };

    let changed = reconcile(&state.orm, &session.order_ids, &session.user_id, outcome).await?;
    tracing::info!(
        event_id,
        outcome = ?outcome,
        orders = session.order_ids.len(),
        changed,
        "payment reconciled"
    );

    audit::record(
        &state.pool,
        Some(&session.user_id),
        match outcome {
            PaymentOutcome::Succeeded => "payment_succeeded",
            PaymentOutcome::Failed => "payment_failed",
        },
        "orders",
        json!({ "event_id": event_id, "order_ids": session.order_ids, "changed": changed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ok",
        WebhookAck::handled(),
        Some(Meta::empty()),
    ))
}

fn ignored(note: impl Into<String>) -> ApiResponse<WebhookAck> {
    ApiResponse::success("Ignored", WebhookAck::ignored(note), Some(Meta::empty()))
}
