use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    domain::coupon::normalize_code,
    dto::{
        admin::{DashboardData, RevenuePoint},
        coupons::{CouponList, CreateCouponRequest},
        products::{BulkLocationResult, ProductList, ProductLocationRequest},
        stores::{ApproveStoreRequest, StoreDecision, StoreList, ToggleStoreRequest},
    },
    entity::{Coupons, Orders, Products, StoreStatus, Stores, coupons, orders, products, stores},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Coupon, Product, Store},
    response::{ApiResponse, Meta},
    routes::params::AdminProductQuery,
    state::AppState,
};

pub async fn dashboard(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<DashboardData>> {
    ensure_admin(state, user).await?;

    let orders = Orders::find().count(&state.orm).await?;
    let stores = Stores::find().count(&state.orm).await?;
    let products = Products::find().count(&state.orm).await?;

    // SUM(bigint) is numeric in Postgres.
    let revenue: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(total), 0)::BIGINT FROM orders")
        .fetch_one(&state.pool)
        .await?;

    let all_orders = Orders::find()
        .select_only()
        .column(orders::Column::CreatedAt)
        .column(orders::Column::Total)
        .order_by_asc(orders::Column::CreatedAt)
        .into_tuple::<(DateTime<FixedOffset>, i64)>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(created_at, total)| RevenuePoint {
            created_at: created_at.with_timezone(&Utc),
            total,
        })
        .collect();

    Ok(ApiResponse::success(
        "Dashboard",
        DashboardData {
            orders,
            stores,
            products,
            revenue,
            all_orders,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_stores(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<StoreList>> {
    ensure_admin(state, user).await?;
    let items = Stores::find()
        .order_by_desc(stores::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Store::from)
        .collect();
    Ok(ApiResponse::success("Stores", StoreList { items }, Some(Meta::empty())))
}

/// Decide on a pending store application. Approval also activates the store.
pub async fn approve_store(
    state: &AppState,
    user: &AuthUser,
    payload: ApproveStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    ensure_admin(state, user).await?;

    let store = Stores::find_by_id(payload.store_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found"))?;
    if store.status != StoreStatus::Pending {
        return Err(AppError::Conflict(format!(
            "store is already {:?}",
            store.status
        )));
    }

    let mut active = store.into_active_model();
    match payload.status {
        StoreDecision::Approved => {
            active.status = Set(StoreStatus::Approved);
            active.is_active = Set(true);
        }
        StoreDecision::Rejected => {
            active.status = Set(StoreStatus::Rejected);
        }
    }
    let store = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "store_review",
        "stores",
        json!({ "store_id": store.id, "status": store.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Store reviewed",
        Store::from(store),
        Some(Meta::empty()),
    ))
}

pub async fn toggle_store(
    state: &AppState,
    user: &AuthUser,
    payload: ToggleStoreRequest,
) -> AppResult<ApiResponse<Store>> {
    ensure_admin(state, user).await?;
    let store_id = payload
        .store_id
        .ok_or_else(|| AppError::BadRequest("missing store_id".into()))?;

    let store = Stores::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found"))?;
    let is_active = !store.is_active;
    let mut active = store.into_active_model();
    active.is_active = Set(is_active);
    let store = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "store_toggle",
        "stores",
        json!({ "store_id": store.id, "is_active": store.is_active }),
    )
    .await;

    Ok(ApiResponse::success(
        "Store updated successfully",
        Store::from(store),
        Some(Meta::empty()),
    ))
}

pub async fn list_coupons(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CouponList>> {
    ensure_admin(state, user).await?;
    let items = Coupons::find()
        .order_by_desc(coupons::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Coupon::from)
        .collect();
    Ok(ApiResponse::success("Coupons", CouponList { items }, Some(Meta::empty())))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(state, user).await?;

    let code = normalize_code(&payload.code);
    if code.is_empty() {
        return Err(AppError::BadRequest("coupon code is required".into()));
    }
    if !(1..=100).contains(&payload.discount) {
        return Err(AppError::BadRequest("discount must be between 1 and 100".into()));
    }
    if payload.expires_at <= Utc::now() {
        return Err(AppError::BadRequest("expiry must be in the future".into()));
    }
    if Coupons::find_by_id(code.clone()).one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(format!("coupon {code} already exists")));
    }

    let coupon = coupons::ActiveModel {
        code: Set(code),
        description: Set(payload.description),
        discount: Set(payload.discount),
        for_new_user: Set(payload.for_new_user),
        for_member: Set(payload.for_member),
        is_public: Set(payload.is_public),
        expires_at: Set(payload.expires_at.fixed_offset()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "coupon_create",
        "coupons",
        json!({ "code": coupon.code, "discount": coupon.discount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Coupon added successfully",
        Coupon::from(coupon),
        Some(Meta::empty()),
    ))
}

pub async fn delete_coupon(
    state: &AppState,
    user: &AuthUser,
    code: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(state, user).await?;
    let code = normalize_code(code);
    let result = Coupons::delete_by_id(code.clone()).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Coupon not found"));
    }

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "coupon_delete",
        "coupons",
        json!({ "code": code }),
    )
    .await;

    Ok(ApiResponse::message("Coupon deleted successfully"))
}

pub async fn filter_products(
    state: &AppState,
    user: &AuthUser,
    query: AdminProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(state, user).await?;

    let mut condition = Condition::all();
    if let Some(city) = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        condition = condition.add(Expr::col(products::Column::City).ilike(city));
    }
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        condition = condition.add(products::Column::Category.eq(category));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(products::Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(products::Column::Price.lte(max_price));
    }

    let items = Products::find()
        .filter(condition)
        .order_by_desc(products::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(Meta::empty())))
}

pub async fn products_without_location(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_admin(state, user).await?;
    let items = Products::find()
        .filter(
            Condition::any()
                .add(products::Column::Latitude.is_null())
                .add(products::Column::Longitude.is_null()),
        )
        .order_by_desc(products::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ApiResponse::success("Products", ProductList { items }, Some(Meta::empty())))
}

pub async fn set_product_location(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ProductLocationRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(state, user).await?;
    let (Some(latitude), Some(longitude)) = (payload.latitude, payload.longitude) else {
        return Err(AppError::BadRequest("latitude and longitude are required".into()));
    };
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::BadRequest("coordinates out of range".into()));
    }

    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    let mut active = product.into_active_model();
    active.latitude = Set(Some(latitude));
    active.longitude = Set(Some(longitude));
    active.address = Set(payload.address);
    active.place_id = Set(payload.place_id);
    active.city = Set(payload.city);
    active.country = Set(payload.country);
    active.updated_at = Set(Utc::now().fixed_offset());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "product_location_update",
        "products",
        json!({ "product_id": product.id, "latitude": latitude, "longitude": longitude }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product location updated",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

/// Copy each store's location onto its products that have none.
pub async fn copy_store_locations(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<BulkLocationResult>> {
    ensure_admin(state, user).await?;

    let result = sqlx::query(
        r#"
        UPDATE products AS p
        SET latitude = s.latitude,
            longitude = s.longitude,
            address = s.address,
            place_id = s.place_id,
            city = s.city,
            country = s.country,
            updated_at = NOW()
        FROM stores AS s
        WHERE p.store_id = s.id
          AND (p.latitude IS NULL OR p.longitude IS NULL)
          AND s.latitude IS NOT NULL
          AND s.longitude IS NOT NULL
        "#,
    )
    .execute(&state.pool)
    .await?;
    let updated_count = result.rows_affected();

    tracing::info!(updated_count, "copied store locations to products");
    audit::record(
        &state.pool,
        Some(&user.user_id),
        "product_location_bulk_update",
        "products",
        json!({ "updated_count": updated_count }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Successfully updated {updated_count} products with store locations"),
        BulkLocationResult { updated_count },
        Some(Meta::empty()),
    ))
}
