use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::coupons::VerifyCouponRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Coupon,
    response::ApiResponse,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(verify_coupon))
}

#[utoipa::path(
    post,
    path = "/api/coupon",
    request_body = VerifyCouponRequest,
    responses(
        (status = 200, description = "Coupon usable by the current user", body = ApiResponse<Coupon>),
        (status = 404, description = "Coupon not found or expired"),
        (status = 409, description = "Coupon not valid for this user"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn verify_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let response = coupon_service::verify_coupon(&state, &user, payload).await?;
    Ok(Json(response))
}
