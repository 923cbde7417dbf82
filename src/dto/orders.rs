use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{OrderStatus, PaymentMethod},
    models::{Address, Order, OrderItem, Product, User},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    #[serde(alias = "id")]
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub address_id: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
    pub coupon_code: Option<String>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: Option<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub address: Option<Address>,
}

/// Seller view of an order: also names the buyer.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreOrder {
    #[serde(flatten)]
    pub order: OrderWithItems,
    pub buyer: Option<User>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreOrderList {
    pub items: Vec<StoreOrder>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub orders: Vec<OrderWithItems>,
    /// Total charged across all seller orders, in cents.
    pub grand_total: i64,
    /// Hosted payment page, present for card payments.
    pub checkout_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub order_id: Uuid,
    pub status: OrderStatus,
}
