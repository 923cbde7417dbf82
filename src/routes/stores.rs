use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
};
use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    dto::{
        orders::{StoreOrderList, UpdateOrderStatusRequest},
        products::{ImageUpload, NewProductForm, ProductList, UpdateProductRequest},
        stores::{CreateStoreRequest, StoreUsernameQuery, StoreWithProducts},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, Product, Store},
    response::ApiResponse,
    services::{product_service, store_service},
    state::AppState,
};

/// Multipart product uploads carry several images.
pub const PRODUCT_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

const SUPPORTED_IMAGE_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_store))
        .route("/is-seller", get(seller_store))
        .route("/data", get(store_page))
        .route(
            "/product",
            get(list_store_products)
                .post(create_product)
                .layer(DefaultBodyLimit::max(PRODUCT_UPLOAD_LIMIT)),
        )
        .route("/product/update", post(update_product))
        .route("/orders", get(list_store_orders).post(update_order_status))
}

fn parse_time(field: &str, raw: &str) -> AppResult<Option<DateTime<Utc>>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| AppError::BadRequest(format!("{field} is not a valid date")))
}

fn parse_number<T: std::str::FromStr>(field: &str, raw: &str) -> AppResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{field} must be a whole number")))
}

/// Apply one text field of the product form.
fn apply_text_field(form: &mut NewProductForm, name: &str, value: &str) -> AppResult<()> {
    match name {
        "name" => form.name = value.to_string(),
        "description" => form.description = value.to_string(),
        "category" => form.category = value.to_string(),
        "mrp" => form.mrp = parse_number("mrp", value)?,
        "price" => form.price = parse_number("price", value)?,
        "stock" => form.stock = parse_number("stock", value)?,
        "stock_status" | "stockStatus" => {
            form.stock_status = Some(value.parse().map_err(AppError::BadRequest)?);
        }
        "available_from" | "availableFrom" => {
            form.available_from = parse_time("available_from", value)?;
        }
        "available_to" | "availableTo" => {
            form.available_to = parse_time("available_to", value)?;
        }
        other => tracing::debug!(field = other, "ignoring unknown product form field"),
    }
    Ok(())
}

fn check_image_name(file_name: &str) -> AppResult<()> {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if SUPPORTED_IMAGE_FORMATS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "unsupported image format '{ext}'"
        )))
    }
}

async fn read_product_form(mut multipart: Multipart) -> AppResult<NewProductForm> {
    let mut form = NewProductForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "images" || name == "image" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            check_image_name(&file_name)?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Read error: {e}")))?;
            if !bytes.is_empty() {
                form.images.push(ImageUpload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Read error: {e}")))?;
            apply_text_field(&mut form, &name, &value)?;
        }
    }
    Ok(form)
}

#[utoipa::path(
    post,
    path = "/api/store/create",
    request_body = CreateStoreRequest,
    responses(
        (status = 200, description = "Store application submitted", body = ApiResponse<Store>),
        (status = 400, description = "Missing store info"),
        (status = 409, description = "Already applied or username taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn create_store(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStoreRequest>,
) -> AppResult<Json<ApiResponse<Store>>> {
    let response = store_service::create_store(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/store/is-seller",
    responses(
        (status = 200, description = "Approved store of the caller", body = ApiResponse<Store>),
        (status = 403, description = "Caller has no approved store"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn seller_store(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Store>>> {
    let response = store_service::seller_store(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/store/data",
    params(("username" = String, Query, description = "Store username")),
    responses(
        (status = 200, description = "Active store and its products", body = ApiResponse<StoreWithProducts>),
        (status = 404, description = "No active store with this username"),
    ),
    tag = "Stores"
)]
pub async fn store_page(
    State(state): State<AppState>,
    Query(query): Query<StoreUsernameQuery>,
) -> AppResult<Json<ApiResponse<StoreWithProducts>>> {
    let response = store_service::store_page(&state, query.username).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/store/product",
    responses(
        (status = 200, description = "Products of the caller's store", body = ApiResponse<ProductList>),
        (status = 403, description = "Caller has no approved store"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn list_store_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let response = product_service::list_store_products(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/store/product",
    request_body(content_type = "multipart/form-data", description = "Product fields and one or more `images`"),
    responses(
        (status = 200, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Missing or malformed fields"),
        (status = 403, description = "Caller has no approved store"),
        (status = 409, description = "Price above MRP"),
        (status = 502, description = "Image upload failed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = read_product_form(multipart).await?;
    let response = product_service::create_product(&state, &user, form).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/store/product/update",
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 403, description = "Caller has no approved store"),
        (status = 404, description = "Product not in the caller's store"),
        (status = 409, description = "Price above MRP"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let response = product_service::update_product(&state, &user, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/store/orders",
    responses(
        (status = 200, description = "Orders placed with the caller's store", body = ApiResponse<StoreOrderList>),
        (status = 403, description = "Caller has no approved store"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn list_store_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StoreOrderList>>> {
    let response = store_service::list_store_orders(&state, &user).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/store/orders",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = ApiResponse<Order>),
        (status = 403, description = "Caller has no approved store"),
        (status = 404, description = "Order not in the caller's store"),
        (status = 409, description = "Transition not allowed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Stores"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let response = store_service::update_order_status(&state, &user, payload).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::StockStatus;

    #[test]
    fn fills_form_from_text_fields() {
        let mut form = NewProductForm::default();
        for (name, value) in [
            ("name", "Ceramic mug"),
            ("mrp", "1500"),
            ("price", " 1200 "),
            ("stock", "8"),
            ("stockStatus", "Available by proxy"),
            ("available_from", "2026-01-01"),
            ("available_to", "2026-02-01T10:00:00Z"),
        ] {
            apply_text_field(&mut form, name, value).expect("field");
        }
        assert_eq!(form.name, "Ceramic mug");
        assert_eq!((form.mrp, form.price, form.stock), (1500, 1200, 8));
        assert_eq!(form.stock_status, Some(StockStatus::AvailableByProxy));
        assert!(form.available_from < form.available_to);
    }

    #[test]
    fn rejects_malformed_numbers_dates_and_statuses() {
        let mut form = NewProductForm::default();
        assert!(apply_text_field(&mut form, "price", "12.50").is_err());
        assert!(apply_text_field(&mut form, "available_to", "next week").is_err());
        assert!(apply_text_field(&mut form, "stock_status", "sold out").is_err());
        assert!(apply_text_field(&mut form, "colour", "red").is_ok());
    }

    #[test]
    fn only_image_extensions_are_accepted() {
        assert!(check_image_name("mug.JPG").is_ok());
        assert!(check_image_name("mug.webp").is_ok());
        assert!(check_image_name("notes.pdf").is_err());
        assert!(check_image_name("noext").is_err());
    }
}
