use serde::Serialize;
use utoipa::ToSchema;

use crate::clients::geocoding::PlaceSuggestion;

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct PlaceSuggestionList {
    #[schema(value_type = Vec<PlaceSuggestion>)]
    pub items: Vec<PlaceSuggestion>,
}
