use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::cart::Cart, models::Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCartRequest {
    /// `{ "<product id>": { "quantity": n } }`; bare numbers are accepted too.
    #[schema(value_type = Object)]
    pub cart: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartEntry>,
    pub total_quantity: u64,
}
