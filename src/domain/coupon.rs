use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::Coupon;

/// Why a coupon cannot be used by this buyer.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum CouponRejection {
    #[error("Coupon has expired")]
    Expired,
    #[error("Coupon valid for new users only")]
    NewUsersOnly,
    #[error("Coupon valid for members only")]
    MembersOnly,
}

/// What we know about the buyer when checking a coupon.
#[derive(Debug, Clone, Copy)]
pub struct BuyerFacts {
    pub prior_orders: u64,
    pub is_member: bool,
}

/// Returns the discount percent the buyer is entitled to.
pub fn evaluate(
    coupon: &Coupon,
    buyer: BuyerFacts,
    now: DateTime<Utc>,
) -> Result<i32, CouponRejection> {
    if coupon.expires_at <= now {
        return Err(CouponRejection::Expired);
    }
    if coupon.for_new_user && buyer.prior_orders > 0 {
        return Err(CouponRejection::NewUsersOnly);
    }
    if coupon.for_member && !buyer.is_member {
        return Err(CouponRejection::MembersOnly);
    }
    Ok(coupon.discount)
}

/// Coupon codes are case-insensitive and stored upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
