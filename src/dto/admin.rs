use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct RevenuePoint {
    pub created_at: DateTime<Utc>,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardData {
    pub orders: u64,
    pub stores: u64,
    pub products: u64,
    /// Sum of all order totals, in cents.
    pub revenue: i64,
    pub all_orders: Vec<RevenuePoint>,
}
