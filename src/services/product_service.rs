use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, Condition, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, Query, extension::postgres::PgExpr},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{NewProductForm, ProductList, UpdateProductRequest},
    entity::{Products, StockStatus, Stores, products, stores},
    error::{AppError, AppResult},
    middleware::{auth::AuthUser, seller::require_seller},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{ProductFilterQuery, ProductSort},
    state::AppState,
};

const IMAGE_FOLDER: &str = "products";

/// Ten million in currency units, in cents.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

fn to_db_time(value: Option<DateTime<Utc>>) -> Option<DateTime<FixedOffset>> {
    value.map(|dt| dt.fixed_offset())
}

/// Shared price and stock rules for seller edits.
fn check_pricing(
    mrp: i64,
    price: i64,
    stock: i32,
    available_from: Option<DateTime<Utc>>,
    available_to: Option<DateTime<Utc>>,
) -> AppResult<()> {
    if mrp < 0 || price < 0 {
        return Err(AppError::BadRequest("prices must not be negative".into()));
    }
    if mrp > MAX_PRICE_CENTS || price > MAX_PRICE_CENTS {
        return Err(AppError::BadRequest(format!(
            "prices must not exceed {MAX_PRICE_CENTS} cents"
        )));
    }
    if stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".into()));
    }
    if price > mrp {
        return Err(AppError::Conflict(
            "Price cannot be greater than MRP".into(),
        ));
    }
    if let (Some(from), Some(to)) = (available_from, available_to) {
        if from > to {
            return Err(AppError::BadRequest(
                "available_from must be before available_to".into(),
            ));
        }
    }
    Ok(())
}

/// Public catalog search over products of active stores.
///
/// A distance filter needs coordinates on every candidate, so it runs after
/// the query and pagination is applied to the filtered list.
pub async fn filter_products(
    state: &AppState,
    query: ProductFilterQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let active_stores = Query::select()
        .column(stores::Column::Id)
        .from(Stores)
        .and_where(stores::Column::IsActive.eq(true))
        .to_owned();
    let mut condition = Condition::all().add(products::Column::StoreId.in_subquery(active_stores));

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(products::Column::Name).ilike(format!("%{search}%")));
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

    let mut finder = Products::find().filter(condition);
    finder = match query.sort.unwrap_or(ProductSort::Newest) {
        ProductSort::PriceAsc => finder.order_by_asc(products::Column::Price),
        ProductSort::PriceDesc => finder.order_by_desc(products::Column::Price),
        ProductSort::Newest => finder.order_by_desc(products::Column::CreatedAt),
    };

    let (items, total): (Vec<Product>, i64) = match query.radius() {
        Some(radius) => {
            let nearby: Vec<products::Model> = finder
                .all(&state.orm)
                .await?
                .into_iter()
                .filter(|p| radius.contains(p.latitude, p.longitude))
                .collect();
            let total = nearby.len() as i64;
            let page_items = nearby
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .map(Product::from)
                .collect();
            (page_items, total)
        }
        None => {
            let total = finder.clone().count(&state.orm).await? as i64;
            let page_items = finder
                .limit(limit as u64)
                .offset(offset as u64)
                .all(&state.orm)
                .await?
                .into_iter()
                .map(Product::from)
                .collect();
            (page_items, total)
        }
    };

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Product::from)
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(ApiResponse::success("Product", product, Some(Meta::empty())))
}

/// Create a product for the caller's store from the parsed upload form.
pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    form: NewProductForm,
) -> AppResult<ApiResponse<Product>> {
    let store_id = require_seller(&state.orm, user).await?;

    if form.name.trim().is_empty() || form.category.trim().is_empty() {
        return Err(AppError::BadRequest("missing product details".into()));
    }
    if form.images.is_empty() {
        return Err(AppError::BadRequest("Please upload at least one image".into()));
    }
    check_pricing(
        form.mrp,
        form.price,
        form.stock,
        form.available_from,
        form.available_to,
    )?;

    let store = Stores::find_by_id(store_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Store not found"))?;

    let mut image_urls = Vec::with_capacity(form.images.len());
    for image in form.images {
        let url = state
            .images
            .upload(image.bytes, &image.file_name, IMAGE_FOLDER)
            .await?;
        image_urls.push(url);
    }

    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        store_id: Set(store_id),
        name: Set(form.name.trim().to_string()),
        description: Set(form.description),
        mrp: Set(form.mrp),
        price: Set(form.price),
        stock: Set(form.stock),
        stock_status: Set(form.stock_status.unwrap_or(StockStatus::Available)),
        category: Set(form.category.trim().to_string()),
        images: Set(json!(image_urls)),
        available_from: Set(to_db_time(form.available_from)),
        available_to: Set(to_db_time(form.available_to)),
        latitude: Set(store.latitude),
        longitude: Set(store.longitude),
        address: Set(Some(store.address.clone())),
        place_id: Set(store.place_id.clone()),
        city: Set(store.city.clone()),
        country: Set(store.country.clone()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, store_id = %store_id, "product created");
    audit::record(
        &state.pool,
        Some(&user.user_id),
        "product_create",
        "products",
        json!({ "product_id": product.id, "store_id": store_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product added successfully",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let store_id = require_seller(&state.orm, user).await?;
    check_pricing(
        payload.mrp,
        payload.price,
        payload.stock,
        payload.available_from,
        payload.available_to,
    )?;

    let existing = Products::find_by_id(payload.id)
        .filter(products::Column::StoreId.eq(store_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let mut active = existing.into_active_model();
    active.mrp = Set(payload.mrp);
    active.price = Set(payload.price);
    active.stock = Set(payload.stock);
    active.stock_status = Set(payload.stock_status);
    active.available_from = Set(to_db_time(payload.available_from));
    active.available_to = Set(to_db_time(payload.available_to));
    active.updated_at = Set(Utc::now().fixed_offset());
    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "product_update",
        "products",
        json!({ "product_id": product.id, "price": product.price, "stock": product.stock }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated successfully",
        Product::from(product),
        Some(Meta::empty()),
    ))
}

pub async fn list_store_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    let store_id = require_seller(&state.orm, user).await?;
    let items = Products::find()
        .filter(products::Column::StoreId.eq(store_id))
        .order_by_desc(products::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn price_above_mrp_is_a_conflict() {
        assert!(matches!(
            check_pricing(1000, 1200, 5, None, None),
            Err(AppError::Conflict(_))
        ));
        assert!(check_pricing(1000, 1000, 0, None, None).is_ok());
    }

    #[test]
    fn rejects_negative_values_and_inverted_windows() {
        assert!(matches!(
            check_pricing(1000, 900, -1, None, None),
            Err(AppError::BadRequest(_))
        ));
        let now = Utc::now();
        assert!(matches!(
            check_pricing(1000, 900, 1, Some(now), Some(now - Duration::days(1))),
            Err(AppError::BadRequest(_))
        ));
        assert!(check_pricing(1000, 900, 1, Some(now), Some(now + Duration::days(1))).is_ok());
    }

    #[test]
    fn prices_above_the_cap_are_refused() {
        assert!(check_pricing(MAX_PRICE_CENTS, MAX_PRICE_CENTS, 1, None, None).is_ok());
        assert!(matches!(
            check_pricing(MAX_PRICE_CENTS + 1, 100, 1, None, None),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            check_pricing(i64::MAX, i64::MAX / 2, 1, None, None),
            Err(AppError::BadRequest(_))
        ));
    }
}
