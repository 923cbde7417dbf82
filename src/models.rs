use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{
    OrderStatus, PaymentMethod, StockStatus, StoreStatus, addresses, coupons, order_items, orders,
    products, stores, users,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
    pub place_id: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Store {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub username: String,
    pub description: String,
    pub email: String,
    pub contact: String,
    pub logo: Option<String>,
    pub address: String,
    pub is_active: bool,
    pub status: StoreStatus,
    pub location: Option<GeoLocation>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub description: String,
    /// List price in cents.
    pub mrp: i64,
    /// Selling price in cents.
    pub price: i64,
    pub stock: i32,
    pub stock_status: StockStatus,
    pub category: String,
    pub images: Vec<String>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
    pub location: Option<GeoLocation>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Coupon {
    pub code: String,
    pub description: String,
    pub discount: i32,
    pub for_new_user: bool,
    pub for_member: bool,
    pub is_public: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: String,
    pub store_id: Uuid,
    pub address_id: Uuid,
    /// Amount due in cents, after discount and shipping.
    pub total: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub is_coupon_used: bool,
    #[schema(value_type = Object)]
    pub coupon: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: i64,
    pub created_at: DateTime<Utc>,
}

fn location_of(
    latitude: Option<f64>,
    longitude: Option<f64>,
    address: Option<String>,
    place_id: Option<String>,
    city: Option<String>,
    country: Option<String>,
) -> Option<GeoLocation> {
    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Some(GeoLocation {
            latitude,
            longitude,
            address,
            place_id,
            city,
            country,
        }),
        _ => None,
    }
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            image: model.image,
            plan: model.plan,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<stores::Model> for Store {
    fn from(model: stores::Model) -> Self {
        let location = location_of(
            model.latitude,
            model.longitude,
            Some(model.address.clone()),
            model.place_id,
            model.city,
            model.country,
        );
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            username: model.username,
            description: model.description,
            email: model.email,
            contact: model.contact,
            logo: model.logo,
            address: model.address,
            is_active: model.is_active,
            status: model.status,
            location,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<products::Model> for Product {
    fn from(model: products::Model) -> Self {
        let images = serde_json::from_value(model.images).unwrap_or_default();
        Self {
            id: model.id,
            store_id: model.store_id,
            name: model.name,
            description: model.description,
            mrp: model.mrp,
            price: model.price,
            stock: model.stock,
            stock_status: model.stock_status,
            category: model.category,
            images,
            available_from: model.available_from.map(|dt| dt.with_timezone(&Utc)),
            available_to: model.available_to.map(|dt| dt.with_timezone(&Utc)),
            location: location_of(
                model.latitude,
                model.longitude,
                model.address,
                model.place_id,
                model.city,
                model.country,
            ),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<addresses::Model> for Address {
    fn from(model: addresses::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            street: model.street,
            city: model.city,
            state: model.state,
            zip: model.zip,
            country: model.country,
            phone: model.phone,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<coupons::Model> for Coupon {
    fn from(model: coupons::Model) -> Self {
        Self {
            code: model.code,
            description: model.description,
            discount: model.discount,
            for_new_user: model.for_new_user,
            for_member: model.for_member,
            is_public: model.is_public,
            expires_at: model.expires_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            store_id: model.store_id,
            address_id: model.address_id,
            total: model.total,
            status: model.status,
            payment_method: model.payment_method,
            is_paid: model.is_paid,
            is_coupon_used: model.is_coupon_used,
            coupon: model.coupon,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
