use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        admin::DashboardData,
        coupons::{CouponList, CreateCouponRequest},
        products::{BulkLocationResult, ProductList, ProductLocationRequest},
        stores::{ApproveStoreRequest, StoreList, ToggleStoreRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Coupon, Product, Store},
    response::ApiResponse,
    routes::params::AdminProductQuery,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/stores", get(list_stores))
        .route("/approve-store", post(approve_store))
        .route("/toggle-store", post(toggle_store))
        .route("/coupon", get(list_coupons).post(create_coupon))
        .route("/coupon/{code}", delete(delete_coupon))
        .route("/products", get(filter_products))
        .route("/products/without-location", get(products_without_location))
        .route("/products/bulk-update-locations", post(copy_store_locations))
        .route("/products/{id}/location", patch(set_product_location))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    responses(
        (status = 200, description = "Marketplace totals", body = ApiResponse<DashboardData>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardData>>> {
    let response = admin_service::dashboard(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/admin/stores",
    responses(
        (status = 200, description = "All stores", body = ApiResponse<StoreList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StoreList>>> {
    let response = admin_service::list_stores(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/admin/approve-store",
    request_body = ApproveStoreRequest,
    responses(
        (status = 200, description = "Store approved or rejected", body = ApiResponse<Store>),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Store is not pending"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ApproveStoreRequest>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let response = admin_service::approve_store(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/admin/toggle-store",
    request_body = ToggleStoreRequest,
    responses(
        (status = 200, description = "Active flag flipped", body = ApiResponse<Store>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Store not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn toggle_store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ToggleStoreRequest>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let response = admin_service::toggle_store(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/admin/coupon",
    responses(
        (status = 200, description = "All coupons", body = ApiResponse<CouponList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CouponList>>> {
    let response = admin_service::list_coupons(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/admin/coupon",
    request_body = CreateCouponRequest,
    responses(
        (status = 200, description = "Coupon created", body = ApiResponse<Coupon>),
        (status = 400, description = "Invalid coupon"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Code already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<Json<ApiResponse<Coupon>>> {
    let response = admin_service::create_coupon(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/admin/coupon/{code}",
    params(("code" = String, Path, description = "Coupon code")),
    responses(
        (status = 200, description = "Coupon deleted"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Coupon not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn delete_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(code): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let response = admin_service::delete_coupon(&state, &user, &code).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(AdminProductQuery),
    responses(
        (status = 200, description = "Products matching the filter", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn filter_products(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<AdminProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let response = admin_service::filter_products(&state, &user, query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/admin/products/without-location",
    responses(
        (status = 200, description = "Products missing coordinates", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn products_without_location(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let response = admin_service::products_without_location(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/api/admin/products/{id}/location",
    params(("id" = Uuid, Path, description = "Product id")),
    request_body = ProductLocationRequest,
    responses(
        (status = 200, description = "Location set", body = ApiResponse<Product>),
        (status = 400, description = "Missing or invalid coordinates"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_product_location(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductLocationRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let response = admin_service::set_product_location(&state, &user, id, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/admin/products/bulk-update-locations",
    responses(
        (status = 200, description = "Store locations copied to products without one", body = ApiResponse<BulkLocationResult>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn copy_store_locations(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<BulkLocationResult>>> {
    let response = admin_service::copy_store_locations(&state, &user).await?;
    Ok(Json(response))
}
