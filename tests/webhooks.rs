mod common;

use std::collections::HashMap;

use chrono::Utc;
use gocart_api::{
    clients::payments::PaymentOutcome,
    dto::{
        cart::SetCartRequest,
        orders::{OrderLineRequest, PlaceOrderRequest},
    },
    entity::{Orders, PaymentMethod, Products, StoreStatus, Stores, Users},
    error::AppError,
    middleware::auth::AuthUser,
    services::{cart_service, identity_service, order_service, payment_service},
    state::AppState,
};
use sea_orm::EntityTrait;
use serde_json::json;
use uuid::Uuid;

use common::{APP_ID, PAYMENT_WEBHOOK_SECRET};

fn session(pairs: &[(&str, String)]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

fn joined(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

async fn place_one(
    state: &AppState,
    user: &AuthUser,
    address_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> anyhow::Result<Uuid> {
    let placed = order_service::place_order(
        state,
        user,
        PlaceOrderRequest {
            address_id: Some(address_id),
            items: vec![OrderLineRequest {
                product_id,
                quantity,
            }],
            coupon_code: None,
            payment_method: Some(PaymentMethod::Cod),
        },
    )
    .await?
    .data
    .expect("orders");
    Ok(placed.orders[0].order.id)
}

async fn stock_of(state: &AppState, product_id: Uuid) -> anyhow::Result<i32> {
    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("product {product_id} missing"))?;
    Ok(product.stock)
}

async fn cart_of(state: &AppState, user_id: &str) -> anyhow::Result<serde_json::Value> {
    let user = Users::find_by_id(user_id.to_string())
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {user_id} missing"))?;
    Ok(user.cart)
}

#[tokio::test]
async fn payment_webhook_rejects_missing_and_bad_signatures() -> anyhow::Result<()> {
    let state = common::offline_state()?;
    let body = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
    let now = Utc::now().timestamp();

    let missing = payment_service::handle_payment_webhook(&state, None, body).await;
    assert!(matches!(missing, Err(AppError::BadRequest(_))));

    let garbage = payment_service::handle_payment_webhook(&state, Some("not-a-header"), body).await;
    assert!(matches!(garbage, Err(AppError::BadRequest(_))));

    let wrong_secret = common::payment_signature("whsec_other", body, now);
    let forged = payment_service::handle_payment_webhook(&state, Some(&wrong_secret), body).await;
    assert!(matches!(forged, Err(AppError::BadRequest(_))));

    let stale = common::payment_signature(PAYMENT_WEBHOOK_SECRET, body, now - 3600);
    let replayed = payment_service::handle_payment_webhook(&state, Some(&stale), body).await;
    assert!(matches!(replayed, Err(AppError::BadRequest(_))));

    let signed = common::payment_signature(PAYMENT_WEBHOOK_SECRET, body, now);
    let tampered = br#"{"id":"evt_1","type":"payment_intent.succeeded","data":{"object":{"id":"pi_2"}}}"#;
    let result = payment_service::handle_payment_webhook(&state, Some(&signed), tampered).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn signed_event_we_do_not_act_on_is_acknowledged() -> anyhow::Result<()> {
    let state = common::offline_state()?;
    let body = br#"{"id":"evt_9","type":"charge.refunded","data":{"object":{"id":"ch_1"}}}"#;
    let signature = common::payment_signature(PAYMENT_WEBHOOK_SECRET, body, Utc::now().timestamp());

    let ack = payment_service::handle_payment_webhook(&state, Some(&signature), body)
        .await?
        .data
        .expect("ack");
    assert!(ack.received);
    assert_eq!(ack.note.as_deref(), Some("unhandled event charge.refunded"));
    Ok(())
}

#[tokio::test]
async fn sessions_without_usable_metadata_are_acknowledged() -> anyhow::Result<()> {
    let state = common::offline_state()?;

    let ack = payment_service::apply_session(&state, "evt_1", PaymentOutcome::Succeeded, None)
        .await?
        .data
        .expect("ack");
    assert_eq!(
        ack.note.as_deref(),
        Some("no checkout session for payment intent")
    );

    // Another application on the same provider account, with none of our keys.
    let ack = payment_service::apply_session(
        &state,
        "evt_2",
        PaymentOutcome::Failed,
        session(&[("appId", "other-shop".into())]),
    )
    .await?
    .data
    .expect("ack");
    assert_eq!(ack.note.as_deref(), Some("invalid app id"));

    // Our own session with a broken order list is dropped, not retried.
    let ack = payment_service::apply_session(
        &state,
        "evt_3",
        PaymentOutcome::Failed,
        session(&[
            ("appId", APP_ID.into()),
            ("userId", "user_1".into()),
            ("orderIds", "not-a-uuid".into()),
        ]),
    )
    .await?
    .data
    .expect("ack");
    assert!(ack.received);
    assert!(ack.note.is_some_and(|note| note.starts_with("malformed session metadata")));
    Ok(())
}

#[tokio::test]
async fn foreign_session_leaves_orders_and_stock_alone() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let store_id = Uuid::new_v4();
    common::store(&state, store_id, StoreStatus::Approved).await?;
    let product = common::product(&state, store_id, 1000, 5).await?;
    let buyer = common::buyer(&state, None).await?;
    let address_id = common::address(&state, &buyer).await?;
    let order_id = place_one(&state, &buyer, address_id, product.id, 2).await?;

    let ack = payment_service::apply_session(
        &state,
        "evt_foreign",
        PaymentOutcome::Failed,
        session(&[
            ("appId", "other-shop".into()),
            ("userId", buyer.user_id.clone()),
            ("orderIds", order_id.to_string()),
        ]),
    )
    .await?
    .data
    .expect("ack");
    assert_eq!(ack.note.as_deref(), Some("invalid app id"));

    let order = Orders::find_by_id(order_id).one(&state.orm).await?.expect("order");
    assert!(!order.is_paid);
    assert_eq!(stock_of(&state, product.id).await?, 3);
    Ok(())
}

#[tokio::test]
async fn repeated_success_keeps_the_cart_cleared() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let store_id = Uuid::new_v4();
    common::store(&state, store_id, StoreStatus::Approved).await?;
    let product = common::product(&state, store_id, 1000, 5).await?;
    let buyer = common::buyer(&state, None).await?;
    let address_id = common::address(&state, &buyer).await?;
    let order_id = place_one(&state, &buyer, address_id, product.id, 1).await?;

    // The buyer fills the cart again while the payment is pending.
    cart_service::set_cart(
        &state,
        &buyer,
        SetCartRequest {
            cart: json!({ product.id.to_string(): { "quantity": 2 } }),
        },
    )
    .await?;
    assert_ne!(cart_of(&state, &buyer.user_id).await?, json!({}));

    let metadata = session(&[
        ("appId", APP_ID.into()),
        ("userId", buyer.user_id.clone()),
        ("orderIds", order_id.to_string()),
    ]);
    for event_id in ["evt_ok_1", "evt_ok_1"] {
        let ack = payment_service::apply_session(
            &state,
            event_id,
            PaymentOutcome::Succeeded,
            metadata.clone(),
        )
        .await?
        .data
        .expect("ack");
        assert!(ack.note.is_none());
        assert_eq!(cart_of(&state, &buyer.user_id).await?, json!({}));
    }

    let order = Orders::find_by_id(order_id).one(&state.orm).await?.expect("order");
    assert!(order.is_paid);
    Ok(())
}

#[tokio::test]
async fn failure_removes_only_the_referenced_orders() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let store_id = Uuid::new_v4();
    common::store(&state, store_id, StoreStatus::Approved).await?;
    let first = common::product(&state, store_id, 1000, 10).await?;
    let second = common::product(&state, store_id, 1500, 10).await?;
    let buyer = common::buyer(&state, None).await?;
    let address_id = common::address(&state, &buyer).await?;
    let dropped = place_one(&state, &buyer, address_id, first.id, 4).await?;
    let kept = place_one(&state, &buyer, address_id, second.id, 3).await?;

    payment_service::apply_session(
        &state,
        "evt_fail",
        PaymentOutcome::Failed,
        session(&[
            ("appId", APP_ID.into()),
            ("userId", buyer.user_id.clone()),
            ("orderIds", joined(&[dropped])),
        ]),
    )
    .await?;

    assert!(Orders::find_by_id(dropped).one(&state.orm).await?.is_none());
    let survivor = Orders::find_by_id(kept).one(&state.orm).await?.expect("unreferenced order");
    assert!(!survivor.is_paid);
    assert_eq!(stock_of(&state, first.id).await?, 10);
    assert_eq!(stock_of(&state, second.id).await?, 7);
    Ok(())
}

#[tokio::test]
async fn deleting_a_seller_keeps_the_store_and_its_orders() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };
    let store_id = Uuid::new_v4();
    let (seller, _) = common::store(&state, store_id, StoreStatus::Approved).await?;
    let product = common::product(&state, store_id, 1000, 5).await?;
    let buyer = common::buyer(&state, None).await?;
    let address_id = common::address(&state, &buyer).await?;
    let order_id = place_one(&state, &buyer, address_id, product.id, 1).await?;

    let body = serde_json::to_vec(&json!({
        "type": "user.deleted",
        "data": { "id": seller.user_id },
    }))?;
    let unsigned = identity_service::handle_identity_webhook(&state, Some("00"), &body).await;
    assert!(matches!(unsigned, Err(AppError::BadRequest(_))));

    let signature = common::identity_signature(&body);
    identity_service::handle_identity_webhook(&state, Some(&signature), &body).await?;

    let user = Users::find_by_id(seller.user_id.clone())
        .one(&state.orm)
        .await?
        .expect("seller row kept");
    assert!(user.email.is_empty());
    assert!(user.name.is_empty());
    let store = Stores::find_by_id(store_id).one(&state.orm).await?.expect("store kept");
    assert!(!store.is_active);
    assert!(Orders::find_by_id(order_id).one(&state.orm).await?.is_some());

    // A plain account goes away entirely.
    let shopper = common::buyer(&state, None).await?;
    let body = serde_json::to_vec(&json!({
        "type": "user.deleted",
        "data": { "id": shopper.user_id },
    }))?;
    let signature = common::identity_signature(&body);
    identity_service::handle_identity_webhook(&state, Some(&signature), &body).await?;
    assert!(
        Users::find_by_id(shopper.user_id.clone())
            .one(&state.orm)
            .await?
            .is_none()
    );
    Ok(())
}
