use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    audit,
    dto::addresses::{AddressList, AddressRequest},
    entity::{Addresses, Orders, addresses, orders},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    services::identity_service::ensure_user,
    state::AppState,
};

fn require_fields(payload: &AddressRequest) -> AppResult<()> {
    let missing = payload.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "missing fields: {}",
            missing.join(", ")
        )))
    }
}

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<addresses::Model> {
    Addresses::find_by_id(id)
        .filter(addresses::Column::UserId.eq(user.user_id.as_str()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Address not found"))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(addresses::Column::UserId.eq(user.user_id.as_str()))
        .order_by_desc(addresses::Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Address::from)
        .collect();
    Ok(ApiResponse::success(
        "Addresses",
        AddressList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    require_fields(&payload)?;
    ensure_user(&state.orm, &user.user_id).await?;

    let address = addresses::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id.clone()),
        name: Set(payload.name.trim().to_string()),
        email: Set(payload.email.trim().to_string()),
        street: Set(payload.street.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        zip: Set(payload.zip.trim().to_string()),
        country: Set(payload.country.trim().to_string()),
        phone: Set(payload.phone.trim().to_string()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "address_create",
        "addresses",
        json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address added successfully",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: AddressRequest,
) -> AppResult<ApiResponse<Address>> {
    require_fields(&payload)?;
    let mut active = find_owned(state, user, id).await?.into_active_model();
    active.name = Set(payload.name.trim().to_string());
    active.email = Set(payload.email.trim().to_string());
    active.street = Set(payload.street.trim().to_string());
    active.city = Set(payload.city.trim().to_string());
    active.state = Set(payload.state.trim().to_string());
    active.zip = Set(payload.zip.trim().to_string());
    active.country = Set(payload.country.trim().to_string());
    active.phone = Set(payload.phone.trim().to_string());
    let address = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "address_update",
        "addresses",
        json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address updated",
        Address::from(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let address = find_owned(state, user, id).await?;

    let in_use = Orders::find()
        .filter(orders::Column::AddressId.eq(address.id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(
            "Address is used by an existing order".into(),
        ));
    }

    Addresses::delete_by_id(address.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(&user.user_id),
        "address_delete",
        "addresses",
        json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::message("Address deleted"))
}
