use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Order lifecycle: placed, processing, shipped, delivered. Cancellation is
/// only possible before the parcel leaves the seller.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "order_placed")]
    #[serde(alias = "ORDER_PLACED")]
    OrderPlaced,
    #[sea_orm(string_value = "processing")]
    #[serde(alias = "PROCESSING")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    #[serde(alias = "SHIPPED")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    #[serde(alias = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    #[serde(alias = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::OrderPlaced => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether a seller may move an order from `self` to `next`.
    ///
    /// Staying in the same status is allowed and treated as a no-op.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            (Some(from), None) => from < 2,
            _ => false,
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery, settled outside the payment provider.
    #[sea_orm(string_value = "cod")]
    #[serde(alias = "COD")]
    Cod,
    /// Card payment through a hosted checkout session, settled by webhook.
    #[sea_orm(string_value = "stripe")]
    #[serde(alias = "STRIPE")]
    Stripe,
}

impl PaymentMethod {
    pub fn is_deferred(self) -> bool {
        matches!(self, PaymentMethod::Stripe)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub store_id: Uuid,
    pub address_id: Uuid,
    pub total: i64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub is_paid: bool,
    pub is_coupon_used: bool,
    pub coupon: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::stores::Entity",
        from = "Column::StoreId",
        to = "super::stores::Column::Id"
    )]
    Stores,
    #[sea_orm(
        belongs_to = "super::addresses::Entity",
        from = "Column::AddressId",
        to = "super::addresses::Column::Id"
    )]
    Addresses,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::stores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stores.def()
    }
}

impl Related<super::addresses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::OrderStatus::*;

    #[test]
    fn lifecycle_only_moves_forward() {
        assert!(OrderPlaced.can_transition_to(Processing));
        assert!(OrderPlaced.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Shipped));
    }

    #[test]
    fn cancellation_only_before_shipping() {
        assert!(OrderPlaced.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(OrderPlaced));
    }

    #[test]
    fn same_status_is_allowed() {
        assert!(Delivered.can_transition_to(Delivered));
        assert!(Cancelled.can_transition_to(Cancelled));
    }
}
