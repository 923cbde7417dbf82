use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    entity::{StoreStatus, Stores, stores},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

/// Id of the caller's store if it has been approved, `None` otherwise.
pub async fn authorize_seller<C: ConnectionTrait>(conn: &C, user_id: &str) -> AppResult<Option<Uuid>> {
    let store = Stores::find()
        .filter(stores::Column::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(store
        .filter(|s| s.status == StoreStatus::Approved)
        .map(|s| s.id))
}

/// Like [`authorize_seller`] but answers 403 for anyone without an approved store.
pub async fn require_seller<C: ConnectionTrait>(conn: &C, user: &AuthUser) -> AppResult<Uuid> {
    authorize_seller(conn, &user.user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("not authorized".into()))
}
