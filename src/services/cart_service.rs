use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, sea_query::Expr,
};
use serde_json::json;

use crate::{
    audit,
    domain::cart::Cart,
    dto::cart::{CartEntry, CartView, SetCartRequest},
    entity::{Products, Users, products, users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    services::identity_service::ensure_user,
    state::AppState,
};

/// Empty the stored cart of a user. Safe to repeat.
pub async fn clear_cart<C: ConnectionTrait>(conn: &C, user_id: &str) -> AppResult<()> {
    Users::update_many()
        .col_expr(users::Column::Cart, Expr::value(json!({})))
        .filter(users::Column::Id.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let stored = Users::find_by_id(user.user_id.clone())
        .one(&state.orm)
        .await?
        .map(|u| u.cart)
        .unwrap_or_else(|| json!({}));

    let (mut cart, malformed) = Cart::from_stored(&stored);
    let mut catalog: HashMap<_, Product> = Products::find()
        .filter(products::Column::Id.is_in(cart.product_ids()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, Product::from(p)))
        .collect();
    let pruned = cart.retain_products(|id| catalog.contains_key(id));

    if malformed + pruned > 0 {
        tracing::debug!(
            user_id = %user.user_id,
            malformed,
            pruned,
            "rewriting stale cart"
        );
        Users::update_many()
            .col_expr(users::Column::Cart, Expr::value(cart.to_value()))
            .filter(users::Column::Id.eq(user.user_id.as_str()))
            .exec(&state.orm)
            .await?;
    }

    let items = cart
        .iter()
        .filter_map(|(id, line)| {
            catalog.remove(id).map(|product| CartEntry {
                product,
                quantity: line.quantity,
            })
        })
        .collect();

    let total_quantity = cart.total_quantity();
    Ok(ApiResponse::success(
        "Cart",
        CartView {
            cart,
            items,
            total_quantity,
        },
        Some(Meta::empty()),
    ))
}

/// Replace the stored cart. Concurrent writers: the last one wins.
pub async fn set_cart(
    state: &AppState,
    user: &AuthUser,
    payload: SetCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let cart = Cart::parse(&payload.cart).map_err(|err| AppError::BadRequest(err.to_string()))?;

    ensure_user(&state.orm, &user.user_id).await?;
    Users::update_many()
        .col_expr(users::Column::Cart, Expr::value(cart.to_value()))
        .filter(users::Column::Id.eq(user.user_id.as_str()))
        .exec(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "cart_update",
        "users",
        json!({ "lines": cart.len(), "quantity": cart.total_quantity() }),
    )
    .await;

    Ok(ApiResponse::success("Cart updated", cart, Some(Meta::empty())))
}
