use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{entity::StockStatus, models::Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub id: Uuid,
    pub mrp: i64,
    pub price: i64,
    pub stock: i32,
    pub stock_status: StockStatus,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
}

/// Fields of the multipart product form, after parsing.
#[derive(Debug, Default)]
pub struct NewProductForm {
    pub name: String,
    pub description: String,
    pub mrp: i64,
    pub price: i64,
    pub category: String,
    pub stock: i32,
    pub stock_status: Option<StockStatus>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
    pub images: Vec<ImageUpload>,
}

#[derive(Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductLocationRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub place_id: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkLocationResult {
    pub updated_count: u64,
}
