//! HTTP transport for Clouding REST API calls

use super::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.clouding.io";

/// API version prefix inserted between the endpoint and every resource path
pub const DEFAULT_API_VERSION: &str = "v1";

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.chars().count() > MAX_LOG_BODY_LENGTH {
        let head: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
        format!("{}... [truncated, {} bytes total]", head, body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Raw status and body of one HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the body carries anything besides whitespace.
    pub fn has_body(&self) -> bool {
        self.body.iter().any(|b| !b.is_ascii_whitespace())
    }
}

/// Issues one request against the configured endpoint and API version.
///
/// `path` is relative to `{endpoint}/{version}/`. Implementations attach the
/// API key and JSON content type; they never interpret the status code.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<TransportResponse>;
}

/// Settings for [`HttpTransport`]
#[derive(Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub api_version: String,
    pub token: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            token: String::new(),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("clouding-rs/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// Security: the token never reaches Debug output
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("token", &"***")
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// reqwest-backed [`Transport`], built once and shared by every resource client
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(config: &ClientConfig) -> Result<Self> {
        if config.token.is_empty() {
            return Err(Error::Config("empty Clouding API token".to_string()));
        }

        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| Error::Config(format!("invalid endpoint {:?}: {}", config.endpoint, e)))?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        let base_url = format!(
            "{}/{}",
            endpoint.as_str().trim_end_matches('/'),
            config.api_version.trim_matches('/')
        );

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
        })
    }

    /// Full URL for a resource path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<TransportResponse> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header(CONTENT_TYPE, "application/json")
            .header(API_KEY_HEADER, &self.token);

        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(Box::new(e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(Box::new(e)))?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&String::from_utf8_lossy(&body))
            );
        }

        Ok(TransportResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        })
    }
}
