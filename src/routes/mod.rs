use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod cart;
pub mod coupons;
pub mod doc;
pub mod health;
pub mod location;
pub mod orders;
pub mod params;
pub mod products;
pub mod stores;
pub mod webhooks;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/address", addresses::router())
        .nest("/orders", orders::router())
        .nest("/coupon", coupons::router())
        .nest("/store", stores::router())
        .nest("/admin", admin::router())
        .nest("/location", location::router())
        .nest("/webhooks", webhooks::router())
}
