use chrono::Utc;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

use crate::{
    domain::coupon::{BuyerFacts, CouponRejection, evaluate, normalize_code},
    dto::coupons::VerifyCouponRequest,
    entity::{Coupons, Orders, orders},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Coupon,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Look up a coupon and check that this buyer may use it.
///
/// Returns the coupon; its `discount` is the percent to apply.
pub async fn evaluate_coupon<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    user: &AuthUser,
    member_plan: &str,
) -> AppResult<Coupon> {
    let coupon: Coupon = Coupons::find_by_id(normalize_code(code))
        .one(conn)
        .await?
        .map(Coupon::from)
        .ok_or_else(|| AppError::not_found("Coupon not found"))?;

    // History only matters for new-user coupons.
    let prior_orders = if coupon.for_new_user {
        Orders::find()
            .filter(orders::Column::UserId.eq(user.user_id.as_str()))
            .count(conn)
            .await?
    } else {
        0
    };
    let buyer = BuyerFacts {
        prior_orders,
        is_member: user.is_member(member_plan),
    };

    match evaluate(&coupon, buyer, Utc::now()) {
        Ok(_) => Ok(coupon),
        Err(CouponRejection::Expired) => Err(AppError::not_found("Coupon not found")),
        Err(rejection) => Err(AppError::Conflict(rejection.to_string())),
    }
}

pub async fn verify_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: VerifyCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    if payload.code.trim().is_empty() {
        return Err(AppError::BadRequest("coupon code is required".into()));
    }
    let coupon = evaluate_coupon(
        &state.orm,
        &payload.code,
        user,
        &state.config.checkout.member_plan,
    )
    .await?;
    Ok(ApiResponse::success("Coupon applied", coupon, Some(Meta::empty())))
}
