//! Image hosting: upload product pictures and serve transformed variants.

use reqwest::{
    Client,
    multipart::{Form, Part},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::{ClientError, ensure_success};
use crate::config::ImageConfig;

/// Served variant: automatic quality, webp, 1024px wide.
const PRODUCT_TRANSFORM: &str = "tr:q-auto,f-webp,w-1024";

#[derive(Clone)]
pub struct ImageHost {
    client: Client,
    config: ImageConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    file_path: String,
}

/// Build the served URL of a stored file with a transformation applied.
pub fn transformed_url(endpoint: &str, transform: &str, file_path: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    let path = file_path.trim_start_matches('/');
    format!("{endpoint}/{transform}/{path}")
}

impl ImageHost {
    #[must_use]
    pub fn new(client: Client, config: ImageConfig) -> Self {
        Self { client, config }
    }

    /// Upload one image into `folder` and return its served product URL.
    ///
    /// # Errors
    ///
    /// Returns error if the upload is rejected or the host is unreachable.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        folder: &str,
    ) -> Result<String, ClientError> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("fileName", file_name.to_string())
            .text("folder", folder.to_string());

        let response = self
            .client
            .post(&self.config.upload_url)
            .basic_auth(self.config.private_key.expose_secret(), Some(""))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))?;

        debug!(path = %uploaded.file_path, "image uploaded");
        Ok(transformed_url(
            &self.config.url_endpoint,
            PRODUCT_TRANSFORM,
            &uploaded.file_path,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_endpoint_transform_and_path() {
        assert_eq!(
            transformed_url("https://ik.imagekit.io/shop/", PRODUCT_TRANSFORM, "/products/mug.png"),
            "https://ik.imagekit.io/shop/tr:q-auto,f-webp,w-1024/products/mug.png"
        );
    }
}
