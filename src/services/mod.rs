pub mod address_service;
pub mod admin_service;
pub mod cart_service;
pub mod coupon_service;
pub mod identity_service;
pub mod location_service;
pub mod order_service;
pub mod payment_service;
pub mod product_service;
pub mod store_service;
