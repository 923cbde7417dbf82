//! Storage-free marketplace rules: cart documents, checkout pricing, coupon
//! eligibility and distance filtering.

pub mod cart;
pub mod coupon;
pub mod geo;
pub mod pricing;
