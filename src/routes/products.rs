use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    error::AppResult,
    models::Product,
    response::ApiResponse,
    routes::params::ProductFilterQuery,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/filter", get(filter_products))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products/filter",
    params(ProductFilterQuery),
    responses(
        (status = 200, description = "Products of active stores matching the filter", body = ApiResponse<ProductList>),
    ),
    tag = "Products"
)]
pub async fn filter_products(
    State(state): State<AppState>,
    Query(query): Query<ProductFilterQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let response = product_service::filter_products(&state, query).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product details", body = ApiResponse<Product>),
        (status = 404, description = "Not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let response = product_service::get_product(&state, id).await?;
    Ok(Json(response))
}
