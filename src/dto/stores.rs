use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Product, Store};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStoreRequest {
    pub name: String,
    pub username: String,
    #[serde(default)]
    pub description: String,
    pub email: String,
    pub contact: String,
    pub address: String,
    pub logo: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StoreUsernameQuery {
    pub username: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StoreWithProducts {
    pub store: Store,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StoreList {
    #[schema(value_type = Vec<Store>)]
    pub items: Vec<Store>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ToggleStoreRequest {
    pub store_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StoreDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveStoreRequest {
    pub store_id: Uuid,
    pub status: StoreDecision,
}
