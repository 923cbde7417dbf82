use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    clients::geocoding::PlaceDetails,
    dto::location::PlaceSuggestionList,
    error::AppResult,
    response::ApiResponse,
    routes::params::{AutocompleteQuery, PlaceDetailsQuery},
    services::location_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/autocomplete", get(autocomplete))
        .route("/details", get(place_details))
}

#[utoipa::path(
    get,
    path = "/api/location/autocomplete",
    params(AutocompleteQuery),
    responses(
        (status = 200, description = "Place suggestions", body = ApiResponse<PlaceSuggestionList>),
        (status = 400, description = "Missing input"),
        (status = 502, description = "Geocoder failed"),
    ),
    tag = "Location"
)]
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> AppResult<Json<ApiResponse<PlaceSuggestionList>>> {
    let response = location_service::autocomplete(&state, query.input).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/location/details",
    params(PlaceDetailsQuery),
    responses(
        (status = 200, description = "Coordinates and address of a place", body = ApiResponse<PlaceDetails>),
        (status = 404, description = "Unknown place"),
        (status = 502, description = "Geocoder failed"),
    ),
    tag = "Location"
)]
pub async fn place_details(
    State(state): State<AppState>,
    Query(query): Query<PlaceDetailsQuery>,
) -> AppResult<Json<ApiResponse<PlaceDetails>>> {
    let response = location_service::place_details(&state, query.place_id).await?;
    Ok(Json(response))
}
