use crate::{
    clients::geocoding::PlaceDetails,
    dto::location::PlaceSuggestionList,
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn autocomplete(
    state: &AppState,
    input: Option<String>,
) -> AppResult<ApiResponse<PlaceSuggestionList>> {
    let input = input
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .ok_or_else(|| AppError::BadRequest("input is required".into()))?;
    let items = state.geocoder.autocomplete(&input).await?;
    Ok(ApiResponse::success(
        "Ok",
        PlaceSuggestionList { items },
        Some(Meta::empty()),
    ))
}

pub async fn place_details(
    state: &AppState,
    place_id: Option<String>,
) -> AppResult<ApiResponse<PlaceDetails>> {
    let place_id = place_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("place_id is required".into()))?;
    let details = state
        .geocoder
        .place_details(&place_id)
        .await?
        .ok_or_else(|| AppError::not_found("Place not found"))?;
    Ok(ApiResponse::success("Ok", details, Some(Meta::empty())))
}
