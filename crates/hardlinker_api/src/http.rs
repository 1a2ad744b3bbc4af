//! HTTP implementation of [`RemoteApi`] for the Syncthing REST API.
//!
//! Every request carries the `X-API-Key` header. Responses are decoded from
//! JSON; a JSON object with a non-empty `error` member is reported as
//! [`ApiError::Api`] even when the status is 200.

use crate::client::{EventsRequest, RemoteApi};
use crate::error::{ApiError, ApiResult};
use crate::event::Event;
use crate::types::{ErrorList, FileInfo, FolderConfig, SystemError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Default Syncthing GUI/REST port.
pub const DEFAULT_PORT: u16 = 8384;

/// Extra time granted on top of the long-poll timeout before the client gives
/// up on an event poll.
pub const POLL_GRACE: Duration = Duration::from_secs(10);

const API_KEY_HEADER: &str = "X-API-Key";

/// Connection settings for [`SyncthingClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Use https instead of http.
    pub use_https: bool,
    /// PEM root certificate to trust in addition to the system roots.
    pub cert_file: Option<PathBuf>,
    /// Timeout for non-polling requests.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for a local instance.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            use_https: false,
            cert_file: None,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables or disables https.
    pub fn with_https(mut self, use_https: bool) -> Self {
        self.use_https = use_https;
        self
    }

    /// Trusts an additional PEM root certificate.
    pub fn with_cert_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cert_file = Some(path.into());
        self
    }

    /// Sets the timeout for non-polling requests.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns `scheme://host:port`.
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Syncthing REST client.
#[derive(Debug, Clone)]
pub struct SyncthingClient {
    base_url: String,
    client: Client,
    request_timeout: Duration,
}

impl SyncthingClient {
    /// Builds a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the API key is not a valid header value
    /// or the certificate file cannot be read or parsed.
    pub fn new(config: &ClientConfig) -> ApiResult<Self> {
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ApiError::Config("API key is not a valid header value".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, key);

        let mut builder = Client::builder().default_headers(headers);

        if let Some(path) = &config.cert_file {
            let pem = std::fs::read(path).map_err(|e| {
                ApiError::Config(format!("cannot read certificate {:?}: {}", path, e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ApiError::Config(format!("invalid certificate {:?}: {}", path, e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url(),
            client,
            request_timeout: config.request_timeout,
        })
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and returns the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::from_reqwest)?;

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(body.trim().to_string()));
        }

        if !status.is_success() {
            debug!(status = status.as_u16(), body = %body.trim(), "Remote API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let request = self
            .client
            .get(self.url(path))
            .query(query)
            .timeout(self.request_timeout);
        decode(&self.send(request).await?)
    }
}

/// Decodes a JSON body, surfacing an embedded `error` member as an error.
pub(crate) fn decode<T: DeserializeOwned>(body: &str) -> ApiResult<T> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))?;

    if let Some(message) = value
        .as_object()
        .and_then(|object| object.get("error"))
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
    {
        return Err(ApiError::Api(message.to_string()));
    }

    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Query parameters of `/rest/events`.
pub(crate) fn events_query(request: &EventsRequest) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("since", request.since.to_string()),
        ("timeout", request.timeout.as_secs().max(1).to_string()),
    ];
    if let Some(limit) = request.limit {
        query.push(("limit", limit.to_string()));
    }
    if !request.filters.is_empty() {
        query.push(("events", request.filters.join(",")));
    }
    query
}

#[async_trait]
impl RemoteApi for SyncthingClient {
    async fn poll_events(&self, request: &EventsRequest) -> ApiResult<Vec<Event>> {
        let http = self
            .client
            .get(self.url("/rest/events"))
            .query(&events_query(request))
            .timeout(request.timeout + POLL_GRACE);

        let body = self.send(http).await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let events: Vec<Event> = decode(&body)?;
        debug!(since = request.since, count = events.len(), "Polled events");
        Ok(events)
    }

    async fn folder(&self, folder_id: &str) -> ApiResult<FolderConfig> {
        // Folder ids are user-chosen and may contain any character.
        let mut url = reqwest::Url::parse(&self.url("/rest/config/folders/"))
            .map_err(|e| ApiError::Config(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Config("base URL cannot carry a path".into()))?
            .pop_if_empty()
            .push(folder_id);

        let request = self.client.get(url).timeout(self.request_timeout);
        decode(&self.send(request).await?)
    }

    async fn file(&self, folder_id: &str, item: &str) -> ApiResult<FileInfo> {
        self.get_json(
            "/rest/db/file",
            &[("folder", folder_id.to_string()), ("file", item.to_string())],
        )
        .await
    }

    async fn ping(&self) -> ApiResult<()> {
        let _: Value = self.get_json("/rest/system/ping", &[]).await?;
        Ok(())
    }

    async fn list_errors(&self) -> ApiResult<Vec<SystemError>> {
        let list: ErrorList = self.get_json("/rest/system/error", &[]).await?;
        Ok(list.errors.unwrap_or_default())
    }

    async fn clear_errors(&self) -> ApiResult<()> {
        let request = self
            .client
            .post(self.url("/rest/system/error/clear"))
            .timeout(self.request_timeout);
        self.send(request).await?;
        Ok(())
    }
}
