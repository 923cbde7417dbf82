//! HTTP clients for the third-party services the marketplace relies on.

pub mod geocoding;
pub mod images;
pub mod payments;

use thiserror::Error;

use crate::error::AppError;

/// Errors that can occur when talking to an upstream service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(String),

    /// Failed to read or parse the response.
    #[error("unexpected response: {0}")]
    Response(String),

    /// The service answered with an error.
    #[error("service error: {0}")]
    Api(String),

    /// Required credentials are missing from the configuration.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Request(err.to_string())
    }
}

impl From<ClientError> for AppError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotConfigured(what) => {
                AppError::Internal(anyhow::anyhow!("{what} is not configured"))
            }
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// Turn a non-2xx response into `ClientError::Api` carrying the body.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api(format!("{status}: {body}")))
}
