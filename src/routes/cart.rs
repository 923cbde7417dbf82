use axum::{Json, Router, extract::State, routing::get};

use crate::{
    domain::cart::Cart,
    dto::cart::{CartView, SetCartRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_cart).post(set_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current cart, stale entries pruned", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let response = cart_service::get_cart(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = SetCartRequest,
    responses(
        (status = 200, description = "Cart replaced", body = ApiResponse<Cart>),
        (status = 400, description = "Malformed cart"),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn set_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<SetCartRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let response = cart_service::set_cart(&state, &user, payload).await?;
    Ok(Json(response))
}
