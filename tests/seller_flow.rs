mod common;

use gocart_api::{
    clients::payments::PaymentOutcome,
    dto::{
        orders::{OrderLineRequest, PlaceOrderRequest, UpdateOrderStatusRequest},
        stores::{ApproveStoreRequest, StoreDecision},
    },
    entity::{OrderStatus, Orders, PaymentMethod, Products, StoreStatus, users},
    error::AppError,
    middleware::{auth::AuthUser, seller::authorize_seller},
    services::{admin_service, order_service, payment_service::reconcile, store_service},
    state::AppState,
};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, EntityTrait, Set};
use serde_json::json;
use uuid::Uuid;

async fn admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let user_id = format!("admin_{}", Uuid::new_v4().simple());
    users::ActiveModel {
        id: Set(user_id.clone()),
        email: Set(common::ADMIN_EMAIL.into()),
        name: Set("Admin".into()),
        image: Set(None),
        plan: Set("free".into()),
        cart: Set(json!({})),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id,
        plan: None,
    })
}

#[tokio::test]
async fn pending_store_is_not_a_seller_until_approved() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (owner, store) = common::store(&state, Uuid::new_v4(), StoreStatus::Pending).await?;

    assert_eq!(authorize_seller(&state.orm, &owner.user_id).await?, None);
    let denied = store_service::seller_store(&state, &owner).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let not_admin = admin_service::approve_store(
        &state,
        &owner,
        ApproveStoreRequest {
            store_id: store.id,
            status: StoreDecision::Approved,
        },
    )
    .await;
    assert!(matches!(not_admin, Err(AppError::Forbidden(_))));

    let admin = admin(&state).await?;
    let approved = admin_service::approve_store(
        &state,
        &admin,
        ApproveStoreRequest {
            store_id: store.id,
            status: StoreDecision::Approved,
        },
    )
    .await?
    .data
    .expect("store");
    assert_eq!(approved.status, StoreStatus::Approved);
    assert!(approved.is_active);
    assert_eq!(authorize_seller(&state.orm, &owner.user_id).await?, Some(store.id));

    // A decided application cannot be decided again.
    let again = admin_service::approve_store(
        &state,
        &admin,
        ApproveStoreRequest {
            store_id: store.id,
            status: StoreDecision::Rejected,
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn rejected_store_stays_locked_out() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let (owner, _) = common::store(&state, Uuid::new_v4(), StoreStatus::Rejected).await?;
    assert_eq!(authorize_seller(&state.orm, &owner.user_id).await?, None);

    let nobody = common::buyer(&state, None).await?;
    assert_eq!(authorize_seller(&state.orm, &nobody.user_id).await?, None);
    Ok(())
}

#[tokio::test]
async fn seller_moves_orders_forward_only() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let store_id = Uuid::new_v4();
    let (seller, _) = common::store(&state, store_id, StoreStatus::Approved).await?;
    let product = common::product(&state, store_id, 1000, 10).await?;
    let buyer = common::buyer(&state, None).await?;
    let address_id = common::address(&state, &buyer).await?;

    let placed = order_service::place_order(
        &state,
        &buyer,
        PlaceOrderRequest {
            address_id: Some(address_id),
            items: vec![OrderLineRequest {
                product_id: product.id,
                quantity: 1,
            }],
            coupon_code: None,
            payment_method: Some(PaymentMethod::Cod),
        },
    )
    .await?
    .data
    .expect("orders");
    let order_id = placed.orders[0].order.id;

    let update = |status| UpdateOrderStatusRequest { order_id, status };

    let processing = store_service::update_order_status(&state, &seller, update(OrderStatus::Processing))
        .await?
        .data
        .expect("order");
    assert_eq!(processing.status, OrderStatus::Processing);

    let unchanged = store_service::update_order_status(&state, &seller, update(OrderStatus::Processing))
        .await?
        .data
        .expect("order");
    assert_eq!(unchanged.status, OrderStatus::Processing);

    let backwards =
        store_service::update_order_status(&state, &seller, update(OrderStatus::OrderPlaced)).await;
    assert!(matches!(backwards, Err(AppError::Conflict(_))));

    let (other_seller, _) = common::store(&state, Uuid::new_v4(), StoreStatus::Approved).await?;
    let foreign =
        store_service::update_order_status(&state, &other_seller, update(OrderStatus::Shipped)).await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));

    let listed = store_service::list_store_orders(&state, &seller)
        .await?
        .data
        .expect("store orders");
    assert_eq!(listed.items.len(), 1);
    assert_eq!(
        listed.items[0].buyer.as_ref().map(|b| b.id.as_str()),
        Some(buyer.user_id.as_str())
    );
    Ok(())
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

#[tokio::test]
async fn cancelling_an_order_puts_its_stock_back_once() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let store_id = Uuid::new_v4();
    let (seller, _) = common::store(&state, store_id, StoreStatus::Approved).await?;
    let product = common::product(&state, store_id, 1000, 10).await?;
    let buyer = common::buyer(&state, None).await?;
    let address_id = common::address(&state, &buyer).await?;

    let placed = order_service::place_order(
        &state,
        &buyer,
        PlaceOrderRequest {
            address_id: Some(address_id),
            items: vec![OrderLineRequest {
                product_id: product.id,
                quantity: 3,
            }],
            coupon_code: None,
            payment_method: Some(PaymentMethod::Cod),
        },
    )
    .await?
    .data
    .expect("orders");
    let order_id = placed.orders[0].order.id;
    assert_eq!(stock_of(&state, product.id).await?, 7);

    let cancelled = store_service::update_order_status(
        &state,
        &seller,
        UpdateOrderStatusRequest {
            order_id,
            status: OrderStatus::Cancelled,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&state, product.id).await?, 10);

    // Repeating the cancel is a no-op, not a second restock.
    store_service::update_order_status(
        &state,
        &seller,
        UpdateOrderStatusRequest {
            order_id,
            status: OrderStatus::Cancelled,
        },
    )
    .await?;
    assert_eq!(stock_of(&state, product.id).await?, 10);

    // A failed payment later drops the order without restocking again.
    let removed = reconcile(&state.orm, &[order_id], &buyer.user_id, PaymentOutcome::Failed).await?;
    assert_eq!(removed, 1);
    assert!(Orders::find_by_id(order_id).one(&state.orm).await?.is_none());
    assert_eq!(stock_of(&state, product.id).await?, 10);
    Ok(())
}

#[tokio::test]
async fn dashboard_is_admin_only() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let buyer = common::buyer(&state, None).await?;
    let denied = admin_service::dashboard(&state, &buyer).await;
    assert!(matches!(denied, Err(AppError::Forbidden(_))));

    let admin = admin(&state).await?;
    let data = admin_service::dashboard(&state, &admin)
        .await?
        .data
        .expect("dashboard");
    assert!(data.revenue >= 0);
    assert!(data.all_orders.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    Ok(())
}
