#![allow(dead_code)]

use chrono::{Duration, Utc};
use gocart_api::{
    config::{AppConfig, AuthConfig, CheckoutConfig, ImageConfig, PaymentConfig},
    db::{create_pool, orm_from_pool, run_migrations},
    entity::{StockStatus, StoreStatus, addresses, coupons, products, stores},
    middleware::auth::AuthUser,
    services::identity_service::ensure_user,
    state::AppState,
};
use hmac::{Hmac, Mac};
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, Set};
use secrecy::SecretString;
use sha2::Sha256;
use sqlx::postgres::PgPoolOptions;
use serde_json::json;
use uuid::Uuid;

pub const SHIPPING_FEE: i64 = 500;
pub const ADMIN_EMAIL: &str = "admin@gocart.test";
pub const PAYMENT_WEBHOOK_SECRET: &str = "whsec_test";
pub const IDENTITY_WEBHOOK_SECRET: &str = "identity_test";
pub const APP_ID: &str = "gocart";

/// Connects to the test database, or returns `None` so the caller can skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url).await?;
    run_migrations(&orm_from_pool(&pool)).await?;
    let state = AppState::new(pool, test_config(database_url))?;
    Ok(Some(state))
}

/// State whose pool never connects; for paths that must not reach the database.
pub fn offline_state() -> anyhow::Result<AppState> {
    let url = "postgres://offline@127.0.0.1:9/offline".to_string();
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(1))
        .connect_lazy(&url)?;
    AppState::new(pool, test_config(url))
}

fn hmac_hex(secret: &str, parts: &[&[u8]]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    for part in parts {
        mac.update(part);
    }
    hex::encode(mac.finalize().into_bytes())
}

/// `t=<ts>,v1=<hex>` header the payment provider would send.
pub fn payment_signature(secret: &str, body: &[u8], timestamp: i64) -> String {
    let ts = timestamp.to_string();
    format!("t={ts},v1={}", hmac_hex(secret, &[ts.as_bytes(), b".", body]))
}

/// Plain hex HMAC the identity provider would send.
pub fn identity_signature(body: &[u8]) -> String {
    hmac_hex(IDENTITY_WEBHOOK_SECRET, &[body])
}

fn secret(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

fn test_config(database_url: String) -> AppConfig {
    AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        admin_email: ADMIN_EMAIL.into(),
        auth: AuthConfig::SharedSecret(secret("test-jwt-secret")),
        checkout: CheckoutConfig {
            shipping_fee: SHIPPING_FEE,
            member_plan: "plus".into(),
        },
        payments: PaymentConfig {
            secret_key: secret("sk_test_unused"),
            webhook_secret: secret(PAYMENT_WEBHOOK_SECRET),
            app_id: APP_ID.into(),
            api_base: "http://127.0.0.1:9".into(),
            currency: "usd".into(),
            return_url: "http://localhost/orders".into(),
        },
        geocoding_api_key: None,
        images: ImageConfig {
            private_key: secret("img_test_unused"),
            url_endpoint: "http://127.0.0.1:9/images".into(),
            upload_url: "http://127.0.0.1:9/upload".into(),
        },
        identity_webhook_secret: secret(IDENTITY_WEBHOOK_SECRET),
    }
}

pub async fn buyer(state: &AppState, plan: Option<&str>) -> anyhow::Result<AuthUser> {
    let user = AuthUser {
        user_id: format!("user_{}", Uuid::new_v4().simple()),
        plan: plan.map(str::to_string),
    };
    ensure_user(&state.orm, &user.user_id).await?;
    Ok(user)
}

pub async fn store(
    state: &AppState,
    id: Uuid,
    status: StoreStatus,
) -> anyhow::Result<(AuthUser, stores::Model)> {
    let owner = buyer(state, None).await?;
    let approved = status == StoreStatus::Approved;
    let store = stores::ActiveModel {
        id: Set(id),
        user_id: Set(owner.user_id.clone()),
        name: Set(format!("Store {}", &id.simple().to_string()[..8])),
        username: Set(format!("store-{}", id.simple())),
        description: Set(String::new()),
        email: Set("seller@gocart.test".into()),
        contact: Set("+1 555 0100".into()),
        logo: Set(None),
        address: Set("1 Market Street".into()),
        is_active: Set(approved),
        status: Set(status),
        latitude: Set(None),
        longitude: Set(None),
        place_id: Set(None),
        city: Set(None),
        country: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok((owner, store))
}

/// Two approved stores, the first with the lower id.
pub async fn two_stores(state: &AppState) -> anyhow::Result<(stores::Model, stores::Model)> {
    let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    let (_, first) = store(state, low, StoreStatus::Approved).await?;
    let (_, second) = store(state, high, StoreStatus::Approved).await?;
    Ok((first, second))
}

pub async fn product(
    state: &AppState,
    store_id: Uuid,
    price: i64,
    stock: i32,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        name: Set("Test product".into()),
        description: Set(String::new()),
        mrp: Set(price),
        price: Set(price),
        stock: Set(stock),
        stock_status: Set(StockStatus::Available),
        category: Set("test".into()),
        images: Set(json!([])),
        available_from: Set(None),
        available_to: Set(None),
        latitude: Set(None),
        longitude: Set(None),
        address: Set(None),
        place_id: Set(None),
        city: Set(None),
        country: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

pub async fn address(state: &AppState, user: &AuthUser) -> anyhow::Result<Uuid> {
    let address = addresses::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id.clone()),
        name: Set("Ada Buyer".into()),
        email: Set("ada@gocart.test".into()),
        street: Set("2 Side Road".into()),
        city: Set("Springfield".into()),
        state: Set("IL".into()),
        zip: Set("62701".into()),
        country: Set("US".into()),
        phone: Set("+1 555 0199".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(address.id)
}

/// A public coupon with a unique code.
pub async fn coupon(
    state: &AppState,
    discount: i32,
    for_new_user: bool,
    for_member: bool,
) -> anyhow::Result<String> {
    let code = format!("T{}", &Uuid::new_v4().simple().to_string()[..10]).to_uppercase();
    coupons::ActiveModel {
        code: Set(code.clone()),
        description: Set("test coupon".into()),
        discount: Set(discount),
        for_new_user: Set(for_new_user),
        for_member: Set(for_member),
        is_public: Set(true),
        expires_at: Set((Utc::now() + Duration::days(1)).fixed_offset()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(code)
}
