use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    #[sea_orm(string_value = "available")]
    #[serde(alias = "AVAILABLE")]
    Available,
    /// Sold on behalf of another supplier; orderable like `Available`.
    #[sea_orm(string_value = "available_by_proxy")]
    #[serde(alias = "AVAILABLE_BY_PROXY")]
    AvailableByProxy,
    #[sea_orm(string_value = "unavailable")]
    #[serde(alias = "UNAVAILABLE")]
    Unavailable,
}

impl StockStatus {
    pub fn is_orderable(self) -> bool {
        match self {
            StockStatus::Available | StockStatus::AvailableByProxy => true,
            StockStatus::Unavailable => false,
        }
    }
}

impl FromStr for StockStatus {
    type Err = String;

    /// Accepts form spellings such as `Available by proxy` or `AVAILABLE_BY_PROXY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s
            .trim()
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        match normalized.as_str() {
            "available" => Ok(StockStatus::Available),
            "available_by_proxy" => Ok(StockStatus::AvailableByProxy),
            "unavailable" => Ok(StockStatus::Unavailable),
            _ => Err(format!("unknown stock status '{s}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub store_id: Uuid,
    pub name: String,
    pub description: String,
    pub mrp: i64,
    pub price: i64,
    pub stock: i32,
    pub stock_status: StockStatus,
    pub category: String,
    pub images: Json,
    pub available_from: Option<DateTimeWithTimeZone>,
    pub available_to: Option<DateTimeWithTimeZone>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub place_id: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stores::Entity",
        from = "Column::StoreId",
        to = "super::stores::Column::Id"
    )]
    Stores,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::stores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stores.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
