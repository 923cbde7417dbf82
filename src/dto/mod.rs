pub mod addresses;
pub mod admin;
pub mod cart;
pub mod coupons;
pub mod location;
pub mod orders;
pub mod products;
pub mod stores;
pub mod webhooks;
