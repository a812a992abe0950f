use crate::api::ImmichApi;
use crate::asset::{Asset, AssetDetail, CreateStack, UpdateAsset};
use crate::config::AppConfig;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

/// reqwest-backed client for the Immich REST API.
pub struct ImmichClient {
    client: Client,
    base_url: Url,
}

impl ImmichClient {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Self::with_timeout(&config.host, &config.api_key, config.request_timeout())
    }

    pub fn with_timeout(host: &str, api_key: &str, timeout: Duration) -> Result<Self, AppError> {
        log::debug!("Creating Immich client for host: {}", host);
        let base_url = Url::parse(host)?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| AppError::Generic(format!("Invalid API key header: {}", e)))?;
        headers.insert(API_KEY_HEADER, key);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Generic(format!("Failed to create HTTP client: {}", e)))?;

        log::trace!("Immich client created successfully.");
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Generic(format!("Host cannot be a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, AppError> {
        log::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            log::debug!("GET {} returned 404", url);
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        decode_optional(url.as_str(), response).await
    }

    async fn send_mutation(&self, request: reqwest::RequestBuilder, what: &str) -> Result<(), AppError> {
        log::debug!("{}", what);
        let response = request.send().await?;
        let response = ensure_success(response).await?;
        // Response body is not needed, but read it so the connection can be reused.
        let body = response.text().await?;
        log::trace!("{} response: {}", what, body);
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(AppError::Status { status, url, body })
}

/// `None` for 204, an empty body or a literal `null`.
async fn decode_optional<T: DeserializeOwned>(url: &str, response: Response) -> Result<Option<T>, AppError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let text = response.text().await?;
    log::trace!("Response body from {}: {}", url, text);
    if text.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<Option<T>>(&text).map_err(|source| AppError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl ImmichApi for ImmichClient {
    async fn list_folder(&self, path: &str) -> Result<Vec<Asset>, AppError> {
        let mut url = self.endpoint(&["api", "view", "folder"])?;
        url.query_pairs_mut().append_pair("path", path);
        Ok(self.get_json::<Vec<Asset>>(url).await?.unwrap_or_default())
    }

    async fn unique_paths(&self) -> Result<Vec<String>, AppError> {
        let url = self.endpoint(&["api", "view", "folder", "unique-paths"])?;
        Ok(self.get_json::<Vec<String>>(url).await?.unwrap_or_default())
    }

    async fn asset_detail(&self, id: &str) -> Result<Option<AssetDetail>, AppError> {
        let url = self.endpoint(&["api", "assets", id])?;
        self.get_json::<AssetDetail>(url).await
    }

    async fn create_stack(&self, request: &CreateStack) -> Result<(), AppError> {
        let url = self.endpoint(&["api", "stacks"])?;
        let what = format!("POST {} ({} assets)", url, request.asset_ids.len());
        self.send_mutation(self.client.post(url).json(request), &what)
            .await
    }

    async fn update_asset(&self, id: &str, update: &UpdateAsset) -> Result<(), AppError> {
        let url = self.endpoint(&["api", "assets", id])?;
        let what = format!("PUT {}", url);
        self.send_mutation(self.client.put(url).json(update), &what)
            .await
    }
}
