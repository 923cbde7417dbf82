use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use secrecy::ExposeSecret;

use crate::{
    audit,
    dto::webhooks::{IdentityEvent, WebhookAck},
    entity::{Stores, Users, stores, users},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    signature,
    state::AppState,
};

/// Make sure a row exists for a signed-in user before anything references it.
///
/// Profile fields are left at their defaults; the identity webhook fills them.
pub async fn ensure_user<C: ConnectionTrait>(conn: &C, user_id: &str) -> AppResult<()> {
    let row = users::ActiveModel {
        id: Set(user_id.to_string()),
        ..Default::default()
    };
    Users::insert(row)
        .on_conflict(OnConflict::column(users::Column::Id).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Forget a deleted account.
///
/// Sellers keep their store and its order history: the user row is blanked
/// and the store deactivated instead of being deleted.
pub async fn remove_user<C: TransactionTrait>(conn: &C, user_id: &str) -> AppResult<()> {
    let txn = conn.begin().await?;
    let owns_store = Stores::find()
        .filter(stores::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
        .is_some();

    if owns_store {
        Users::update_many()
            .col_expr(users::Column::Email, Expr::value(""))
            .col_expr(users::Column::Name, Expr::value(""))
            .col_expr(users::Column::Image, Expr::value(Option::<String>::None))
            .col_expr(users::Column::Cart, Expr::value(serde_json::json!({})))
            .filter(users::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;
        Stores::update_many()
            .col_expr(stores::Column::IsActive, Expr::value(false))
            .filter(stores::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;
        tracing::info!(user_id, "seller account anonymized, store deactivated");
    } else {
        Users::delete_by_id(user_id.to_string()).exec(&txn).await?;
    }

    txn.commit().await?;
    Ok(())
}

pub async fn handle_identity_webhook(
    state: &AppState,
    signature_header: Option<&str>,
    body: &[u8],
) -> AppResult<ApiResponse<WebhookAck>> {
    let signature_header =
        signature_header.ok_or_else(|| AppError::BadRequest("missing signature".into()))?;
    signature::verify_body(
        state.config.identity_webhook_secret.expose_secret(),
        body,
        signature_header,
    )
    .map_err(|err| AppError::BadRequest(format!("invalid signature: {err}")))?;

    let event: IdentityEvent = serde_json::from_slice(body)
        .map_err(|err| AppError::BadRequest(format!("invalid event payload: {err}")))?;
    let user_id = event.data.id.clone();

    let ack = match event.kind.as_str() {
        "user.created" | "user.updated" => {
            let mut update_columns = vec![
                users::Column::Email,
                users::Column::Name,
                users::Column::Image,
            ];
            if event.data.plan.is_some() {
                update_columns.push(users::Column::Plan);
            }
            let row = users::ActiveModel {
                id: Set(event.data.id.clone()),
                email: Set(event.data.primary_email()),
                name: Set(event.data.full_name()),
                image: Set(event.data.image_url.clone()),
                plan: event.data.plan.clone().map_or(NotSet, Set),
                cart: NotSet,
                created_at: NotSet,
            };
            Users::insert(row)
                .on_conflict(
                    OnConflict::column(users::Column::Id)
                        .update_columns(update_columns)
                        .to_owned(),
                )
                .exec_without_returning(&state.orm)
                .await?;
            WebhookAck::handled()
        }
        "user.deleted" => {
            remove_user(&state.orm, &user_id).await?;
            WebhookAck::handled()
        }
        other => {
            tracing::debug!(kind = other, "ignoring identity event");
            return Ok(ApiResponse::success(
                "Ignored",
                WebhookAck::ignored(format!("unhandled event {other}")),
                Some(Meta::empty()),
            ));
        }
    };

    tracing::info!(kind = %event.kind, user_id = %user_id, "identity event applied");
    audit::record(
        &state.pool,
        Some(&user_id),
        &event.kind,
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::success("Ok", ack, Some(Meta::empty())))
}
