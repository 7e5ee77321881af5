use super::config::ClientConfig;
use super::wire::{ExpansionResponse, StoredFable, UpsertRequest, UpsertResponse};
use crate::error::ApiError;
use crate::fable::{BlockFactoryCatalogue, FableDocument, FableId, ValidationState};
use crate::persistence::FableRepository;
use crate::validation::FableValidator;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// Header identifying a browser session that has no authenticated cookie.
pub const ANONYMOUS_ID_HEADER: &str = "X-Anonymous-ID";

const CATALOGUE_PATH: &str = "/api/v1/fable/catalogue";
const EXPAND_PATH: &str = "/api/v1/fable/expand";
const COMPILE_PATH: &str = "/api/v1/fable/compile";
const UPSERT_PATH: &str = "/api/v1/fable/upsert";
const RETRIEVE_PATH: &str = "/api/v1/fable/retrieve";

/// Typed client for the fable endpoints of the backend.
///
/// Every response is decoded into its expected shape before it is handed
/// out; anything that does not match becomes [`ApiError::Schema`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    client: Client,
    anonymous_id: String,
    catalogue: Arc<OnceCell<BlockFactoryCatalogue>>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport {
                url: config.base_url.clone(),
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        let anonymous_id = config
            .anonymous_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(Self {
            config,
            client,
            anonymous_id,
            catalogue: Arc::new(OnceCell::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The anonymous id sent with requests, or `None` when a session cookie is used.
    pub fn anonymous_id(&self) -> Option<&str> {
        match self.config.session_cookie {
            Some(_) => None,
            None => Some(&self.anonymous_id),
        }
    }

    /// The block catalogue, fetched once and cached for the client's lifetime.
    pub async fn catalogue(&self) -> Result<&BlockFactoryCatalogue, ApiError> {
        self.catalogue
            .get_or_try_init(|| self.fetch_catalogue())
            .await
    }

    /// Fetches the catalogue, bypassing the cache.
    #[instrument(skip(self))]
    pub async fn fetch_catalogue(&self) -> Result<BlockFactoryCatalogue, ApiError> {
        let url = self.config.endpoint(CATALOGUE_PATH);
        let catalogue: BlockFactoryCatalogue =
            self.send_json(self.request(Method::GET, &url), &url).await?;
        debug!(factories = catalogue.len(), "Fetched block catalogue");
        Ok(catalogue)
    }

    /// Validates a fable and annotates each of its blocks.
    #[instrument(skip(self, fable), fields(blocks = fable.len()))]
    pub async fn expand_fable(&self, fable: &FableDocument) -> Result<ValidationState, ApiError> {
        let url = self.config.endpoint(EXPAND_PATH);
        let request = with_json(self.request(Method::PUT, &url), fable)?;
        let response: ExpansionResponse = self.send_json(request, &url).await?;
        response
            .into_state(fable)
            .map_err(|message| ApiError::Schema { url, message })
    }

    /// Compiles a fable into the backend's job representation, returned untouched.
    #[instrument(skip(self, fable), fields(blocks = fable.len()))]
    pub async fn compile_fable(&self, fable: &FableDocument) -> Result<serde_json::Value, ApiError> {
        let url = self.config.endpoint(COMPILE_PATH);
        let request = with_json(self.request(Method::PUT, &url), fable)?;
        self.send_json(request, &url).await
    }

    #[instrument(skip(self, request), fields(fable_id = ?request.fable_id, name = %request.name))]
    pub async fn upsert_fable(&self, request: &UpsertRequest) -> Result<FableId, ApiError> {
        let url = self.config.endpoint(UPSERT_PATH);
        let body = with_json(self.request(Method::POST, &url), request)?;
        let response: UpsertResponse = self.send_json(body, &url).await?;
        if response.fable_id.trim().is_empty() {
            return Err(ApiError::Schema {
                url,
                message: "upsert returned an empty fable_id".to_string(),
            });
        }
        if let Some(expected) = &request.fable_id {
            if expected != &response.fable_id {
                return Err(ApiError::Schema {
                    url,
                    message: format!(
                        "update of '{}' answered with a different id '{}'",
                        expected, response.fable_id
                    ),
                });
            }
        }
        Ok(response.fable_id)
    }

    #[instrument(skip(self))]
    pub async fn retrieve_fable(&self, fable_id: &str) -> Result<StoredFable, ApiError> {
        let url = self.config.endpoint(RETRIEVE_PATH);
        let request = self
            .request(Method::GET, &url)
            .query(&[("fable_id", fable_id)]);
        let stored: StoredFable = match self.send_json(request, &url).await {
            Err(ApiError::NotFound(_)) => return Err(ApiError::NotFound(fable_id.to_string())),
            other => other?,
        };
        if stored.fable_id != fable_id {
            return Err(ApiError::Schema {
                url,
                message: format!("asked for '{}' but received '{}'", fable_id, stored.fable_id),
            });
        }
        Ok(stored)
    }

    /// Starts a request carrying the session cookie, or the anonymous id without one.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.session_cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder.header(ANONYMOUS_ID_HEADER, &self.anonymous_id),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(|e| map_http_error(url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), url, "Backend request failed: {}", body);
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| map_http_error(url, e))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Schema {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn with_json<B: Serialize + ?Sized>(
    builder: RequestBuilder,
    body: &B,
) -> Result<RequestBuilder, ApiError> {
    let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
    Ok(builder.header(CONTENT_TYPE, "application/json").body(bytes))
}

fn map_http_error(url: &str, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout(url.to_string())
    } else {
        ApiError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl FableValidator for ApiClient {
    async fn expand(&self, fable: &FableDocument) -> Result<ValidationState, ApiError> {
        self.expand_fable(fable).await
    }
}

#[async_trait]
impl FableRepository for ApiClient {
    async fn upsert(&self, request: UpsertRequest) -> Result<FableId, ApiError> {
        self.upsert_fable(&request).await
    }

    async fn retrieve(&self, fable_id: &str) -> Result<StoredFable, ApiError> {
        self.retrieve_fable(fable_id).await
    }
}
