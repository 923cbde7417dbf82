//! Place autocomplete and place details lookups.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use super::{ClientError, ensure_success};

const PLACES_API_BASE: &str = "https://maps.googleapis.com/maps/api/place";

#[derive(Clone)]
pub struct Geocoder {
    client: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaceSuggestion {
    pub description: String,
    pub place_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: Option<String>,
    pub formatted_address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<PlaceSuggestion>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    place_id: Option<String>,
    name: Option<String>,
    formatted_address: Option<String>,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// `ZERO_RESULTS` is an empty answer, anything else but `OK` is a failure.
fn check_status(status: &str, message: Option<String>) -> Result<bool, ClientError> {
    match status {
        "OK" => Ok(true),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(false),
        other => Err(ClientError::Api(match message {
            Some(msg) => format!("{other}: {msg}"),
            None => other.to_string(),
        })),
    }
}

impl Geocoder {
    #[must_use]
    pub fn new(client: Client, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            api_key,
            base_url: PLACES_API_BASE.to_string(),
        }
    }

    fn key(&self) -> Result<&str, ClientError> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .ok_or(ClientError::NotConfigured("GOOGLE_MAPS_API_KEY"))
    }

    /// # Errors
    ///
    /// Returns error if the key is missing or the lookup fails.
    #[instrument(skip(self))]
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<PlaceSuggestion>, ClientError> {
        let key = self.key()?;
        let response = self
            .client
            .get(format!("{}/autocomplete/json", self.base_url))
            .query(&[("input", input), ("key", key)])
            .send()
            .await?;
        let body: AutocompleteResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))?;

        if check_status(&body.status, body.error_message)? {
            Ok(body.predictions)
        } else {
            Ok(Vec::new())
        }
    }

    /// # Errors
    ///
    /// Returns error if the key is missing or the lookup fails.
    #[instrument(skip(self))]
    pub async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, ClientError> {
        let key = self.key()?;
        let response = self
            .client
            .get(format!("{}/details/json", self.base_url))
            .query(&[
                ("place_id", place_id),
                ("key", key),
                ("fields", "geometry,formatted_address,name,place_id"),
            ])
            .send()
            .await?;
        let body: DetailsResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))?;

        if !check_status(&body.status, body.error_message)? {
            return Ok(None);
        }
        Ok(body.result.map(|result| PlaceDetails {
            place_id: result.place_id.unwrap_or_else(|| place_id.to_string()),
            name: result.name,
            formatted_address: result.formatted_address,
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_results_is_empty_not_failure() {
        assert!(matches!(check_status("OK", None), Ok(true)));
        assert!(matches!(check_status("ZERO_RESULTS", None), Ok(false)));
        assert!(matches!(
            check_status("REQUEST_DENIED", Some("bad key".into())),
            Err(ClientError::Api(msg)) if msg == "REQUEST_DENIED: bad key"
        ));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let geocoder = Geocoder::new(Client::new(), None);
        let result = geocoder.autocomplete("berlin").await;
        assert!(matches!(result, Err(ClientError::NotConfigured(_))));
    }
}
