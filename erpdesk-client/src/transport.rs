//! Request description and the shared HTTP plumbing under both clients.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::config::ApiConfig;
use tracing::debug;
use url::Url;

use crate::error::{ApiError, RequestError};

/// A replayable API request relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Request for `path`; `/`-separated parts become segments.
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append one path segment. It is percent-encoded, so ids and search
    /// terms containing `/` stay a single segment.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    /// Fails when `body` cannot be represented as JSON.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|err| ApiError::Decode(err.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Path relative to the base URL, for logs and cache keys.
    #[must_use]
    pub fn path(&self) -> String {
        self.segments.join("/")
    }

    /// Absolute URL of this request under `base`.
    ///
    /// # Errors
    /// Fails when `base` cannot carry a path.
    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(base.to_string()))?
            .pop_if_empty()
            .extend(&self.segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }
}

/// Anything that can send an [`ApiRequest`] and hand back the decoded body.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    /// Send `request`.
    ///
    /// # Errors
    /// Any [`ApiError`] the implementation cannot recover from.
    async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError>;
}

/// Sends [`ApiRequest`]s and maps responses onto the error taxonomy.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport with its own connection pool.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|err| ApiError::Transport(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Send `request`, with a bearer token when one is given.
    ///
    /// # Errors
    /// - [`ApiError::Transport`] when the server cannot be reached
    /// - [`ApiError::Unauthorized`] on 401
    /// - [`ApiError::Application`] on any other non-2xx status
    pub async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<Value, ApiError> {
        let url = request.url(&self.base_url)?;
        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let data = decode_body(&text);

        debug!(
            method = %request.method,
            path = %request.path(),
            status = status.as_u16(),
            "api response"
        );

        if status.is_success() {
            return Ok(data);
        }

        let error = RequestError {
            status: status.as_u16(),
            data,
        };
        if status == StatusCode::UNAUTHORIZED {
            Err(ApiError::Unauthorized(error))
        } else {
            Err(ApiError::Application(error))
        }
    }
}

/// Empty body is `null`, JSON is parsed, anything else is kept as a string.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
