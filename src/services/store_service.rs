use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        orders::{StoreOrder, StoreOrderList, UpdateOrderStatusRequest},
        stores::{CreateStoreRequest, StoreWithProducts},
    },
    entity::{
        OrderStatus, Orders, Products, StoreStatus, Stores, Users, orders, products, stores, users,
    },
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, seller::require_seller},
    models::{Order, Product, Store, User},
    response::{ApiResponse, Meta},
    services::{
        identity_service::ensure_user,
        order_service::{hydrate_orders, restore_stock},
    },
    state::AppState,
};

/// Store usernames are lowercase ascii letters, digits, `-` and `_`.
pub fn normalize_username(raw: &str) -> Option<String> {
    let username = raw.trim().to_lowercase();
    let valid = !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    valid.then_some(username)
}

/// Submit a store application. The store starts pending and inactive.
pub async fn create_store(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    let required = [
        &payload.name,
        &payload.username,
        &payload.email,
        &payload.contact,
        &payload.address,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(AppError::BadRequest("missing store info".into()));
    }
    let username = normalize_username(&payload.username)
        .ok_or_else(|| AppError::BadRequest("invalid store username".into()))?;

    ensure_user(&state.orm, &user.user_id).await?;

    let existing = Stores::find()
        .filter(stores::Column::UserId.eq(user.user_id.as_str()))
        .one(&state.orm)
        .await?;
    if let Some(store) = existing {
        return Err(AppError::Conflict(format!(
            "store already submitted, status: {:?}",
            store.status
        )));
    }

    let taken = Stores::find()
        .filter(stores::Column::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("username already taken".into()));
    }

    let store = stores::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id.clone()),
        name: Set(payload.name.trim().to_string()),
        username: Set(username),
        description: Set(payload.description),
        email: Set(payload.email.trim().to_string()),
        contact: Set(payload.contact.trim().to_string()),
        logo: Set(payload.logo),
        address: Set(payload.address.trim().to_string()),
        is_active: Set(false),
        status: Set(StoreStatus::Pending),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        place_id: Set(payload.place_id),
        city: Set(payload.city),
        country: Set(payload.country),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "store_create",
        "stores",
        json!({ "store_id": store.id, "username": store.username }),
    )
    .await;

    Ok(ApiResponse::success(
        "Applied, waiting for approval",
        Store::from(store),
        Some(Meta::empty()),
    ))
}

/// The caller's approved store; 403 when there is none.
pub async fn seller_store(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Store>> {
    let store_id = require_seller(&state.orm, user).await?;
    let store = Stores::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found"))?;
    Ok(ApiResponse::success("Store", Store::from(store), Some(Meta::empty())))
}

/// Public storefront page: an active store and its products.
pub async fn store_page(
    state: &AppState,
    username: Option<String>,
) -> AppResult<ApiResponse<StoreWithProducts>> {
    let username = username
        .as_deref()
        .and_then(normalize_username)
        .ok_or_else(|| AppError::BadRequest("missing username".into()))?;

    let store = Stores::find()
        .filter(stores::Column::Username.eq(username.as_str()))
        .filter(stores::Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found"))?;

    let products = Products::find()
        .filter(products::Column::StoreId.eq(store.id))
        .order_by_desc(products::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    Ok(ApiResponse::success(
        "Store",
        StoreWithProducts {
            store: Store::from(store),
            products,
        },
        Some(Meta::empty()),
    ))
}

/// Orders placed with the caller's store, newest first, with their buyers.
pub async fn list_store_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<StoreOrderList>> {
    let store_id = require_seller(&state.orm, user).await?;
    let orders = Orders::find()
        .filter(orders::Column::StoreId.eq(store_id))
        .order_by_desc(orders::Column::CreatedAt)
        .all(&state.orm)
        .await?;

    let buyer_ids: Vec<String> = orders.iter().map(|o| o.user_id.clone()).collect();
    let buyers: HashMap<String, users::Model> = Users::find()
        .filter(users::Column::Id.is_in(buyer_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let items = hydrate_orders(&state.orm, orders)
        .await?
        .into_iter()
        .map(|order| StoreOrder {
            buyer: buyers.get(&order.order.user_id).cloned().map(User::from),
            order,
        })
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        StoreOrderList { items },
        Some(Meta::empty()),
    ))
}

/// Move one of the caller's orders along its lifecycle.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let store_id = require_seller(&txn, user).await?;

    let order = Orders::find_by_id(payload.order_id)
        .filter(orders::Column::StoreId.eq(store_id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if order.status == payload.status {
        txn.commit().await?;
        return Ok(ApiResponse::success(
            "Order status unchanged",
            Order::from(order),
            Some(Meta::empty()),
        ));
    }
    if !order.status.can_transition_to(payload.status) {
        return Err(AppError::Conflict(format!(
            "cannot move order from {:?} to {:?}",
            order.status, payload.status
        )));
    }

    let previous = order.status;
    if payload.status == OrderStatus::Cancelled {
        restore_stock(&txn, &[order.id]).await?;
    }
    let mut active = order.into_active_model();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().fixed_offset());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, from = ?previous, to = ?order.status, "order status updated");
    audit::record(
        &state.pool,
        Some(&user.user_id),
        "order_status_update",
        "orders",
        json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order status updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_are_lowercased_and_restricted() {
        assert_eq!(normalize_username("  Green-Grocer_01 "), Some("green-grocer_01".into()));
        assert_eq!(normalize_username("bad name"), None);
        assert_eq!(normalize_username(""), None);
        assert_eq!(normalize_username("café"), None);
    }
}
