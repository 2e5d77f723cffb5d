//! # Cloudinary Image Store
//!
//! Signed uploads and deletes against the Cloudinary upload API.
//!
//! Every request carries `api_key`, `timestamp` and `signature`, where the
//! signature is the SHA-1 hex digest of the other parameters sorted by name,
//! joined as `k=v&k=v`, with the API secret appended.

use crate::config::CloudinaryConfig;
use async_trait::async_trait;
use chrono::Utc;
use mtg_core::{ImageStore, ImageUpload, ShopError, ShopResult, UploadedImage};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

const PROVIDER: &str = "cloudinary";

/// Parameters that are sent but never signed
const UNSIGNED: [&str; 4] = ["file", "cloud_name", "resource_type", "api_key"];

/// Sign request parameters with the API secret
pub fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(key, value)| !UNSIGNED.contains(*key) && !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorResponse {
    error: CloudinaryErrorBody,
}

#[derive(Debug, Deserialize)]
struct CloudinaryErrorBody {
    message: String,
}

/// Cloudinary implementation of [`ImageStore`]
pub struct CloudinaryImageStore {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryImageStore {
    /// Create a new Cloudinary image store
    pub fn new(config: CloudinaryConfig) -> ShopResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ShopError::Configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(CloudinaryConfig::from_env()?)
    }

    /// Signed parameter set for a request made now
    fn signed_params(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = sign(&params, &self.config.api_secret);
        params.insert("api_key", self.config.api_key.clone());
        params.insert("signature", signature);
        params
    }

    /// Read the body and map non-2xx responses to `Upstream`
    async fn read_body(response: reqwest::Response) -> ShopResult<String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ShopError::upstream(PROVIDER, e))?;

        if !status.is_success() {
            error!("Cloudinary API error: status={}, body={}", status, body);

            if let Ok(error_response) = serde_json::from_str::<CloudinaryErrorResponse>(&body) {
                return Err(ShopError::upstream(PROVIDER, error_response.error.message));
            }
            return Err(ShopError::upstream(
                PROVIDER,
                format!("HTTP {}: {}", status, body),
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl ImageStore for CloudinaryImageStore {
    #[instrument(skip(self, image), fields(file = %image.file_name, size = image.size()))]
    async fn upload(&self, image: ImageUpload) -> ShopResult<UploadedImage> {
        image.ensure_within_limit()?;

        let mut params = BTreeMap::new();
        params.insert("public_id", image.public_id());
        params.insert("asset_folder", image.asset_folder());
        let params = self.signed_params(params);

        let part = Part::bytes(image.bytes).file_name(image.file_name.clone());
        let part = match part.mime_str(&image.content_type) {
            Ok(part) => part,
            Err(e) => {
                return Err(ShopError::InvalidRequest(format!(
                    "invalid content type '{}': {}",
                    image.content_type, e
                )))
            }
        };

        let mut form = Form::new().part("file", part);
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!("Uploading {} to {}", image.file_name, self.config.upload_url());
        let response = self
            .client
            .post(self.config.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| ShopError::upstream(PROVIDER, e))?;

        let body = Self::read_body(response).await?;
        let uploaded: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::upstream(PROVIDER, format!("Failed to parse upload response: {}", e))
        })?;

        info!("Uploaded image {}", uploaded.public_id);
        Ok(UploadedImage {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, public_id: &str) -> ShopResult<()> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("invalidate", "true".to_string());
        let params = self.signed_params(params);

        let response = self
            .client
            .post(self.config.destroy_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| ShopError::upstream(PROVIDER, e))?;

        let body = Self::read_body(response).await?;
        let destroyed: DestroyResponse = serde_json::from_str(&body).map_err(|e| {
            ShopError::upstream(PROVIDER, format!("Failed to parse destroy response: {}", e))
        })?;

        match destroyed.result.as_str() {
            "ok" => {
                info!("Deleted image {}", public_id);
                Ok(())
            }
            "not found" => {
                debug!("Image {} was already gone", public_id);
                Ok(())
            }
            other => Err(ShopError::upstream(
                PROVIDER,
                format!("unexpected destroy result: {}", other),
            )),
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtg_core::MAX_IMAGE_BYTES;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> CloudinaryImageStore {
        let config = CloudinaryConfig::new("demo", "123456", "abcd").with_api_base_url(server.uri());
        CloudinaryImageStore::new(config).unwrap()
    }

    fn png(name: &str) -> ImageUpload {
        ImageUpload::new("image", name, "image/png", vec![137, 80, 78, 71])
    }

    #[test]
    fn test_signature() {
        let mut params = BTreeMap::new();
        params.insert("public_id", "sample_image".to_string());
        params.insert("timestamp", "1315060510".to_string());
        params.insert("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string());

        assert_eq!(
            sign(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_signature_ignores_unsigned_params() {
        let mut params = BTreeMap::new();
        params.insert("public_id", "mh3".to_string());
        params.insert("timestamp", "1700000000".to_string());
        let expected = sign(&params, "secret");

        params.insert("api_key", "123456".to_string());
        params.insert("file", "ignored".to_string());
        assert_eq!(sign(&params, "secret"), expected);
    }

    #[tokio::test]
    async fn test_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .and(body_string_contains("mtg-store/image/"))
            .and(body_string_contains("signature"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "mh3-box",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1/mh3-box.png",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let uploaded = store_for(&server).upload(png("mh3-box.png")).await.unwrap();
        assert_eq!(uploaded.public_id, "mh3-box");
        assert!(uploaded.url.starts_with("https://"));
    }

    #[tokio::test]
    async fn test_upload_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let err = store_for(&server).upload(png("a.png")).await.unwrap_err();
        match err {
            ShopError::Upstream { service, message } => {
                assert_eq!(service, "cloudinary");
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_oversized_upload_never_reaches_host() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let big = ImageUpload::new("image", "big.png", "image/png", vec![0; MAX_IMAGE_BYTES]);
        let err = store_for(&server).upload(big).await.unwrap_err();
        assert!(matches!(err, ShopError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .and(body_string_contains("public_id=mh3-box"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "ok"
            })))
            .expect(1)
            .mount(&server)
            .await;

        store_for(&server).delete("mh3-box").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/destroy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "not found"
            })))
            .mount(&server)
            .await;

        assert!(store_for(&server).delete("gone").await.is_ok());
    }
}
