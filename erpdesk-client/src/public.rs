//! Client for the unauthenticated endpoints: login and token refresh.
//!
//! It never attaches a bearer token and never refreshes, so a 401 from the
//! refresh endpoint cannot recurse into another refresh.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::config::ApiConfig;
use shared::models::{LoginRequest, LoginResponse, RefreshRequest, TokenPair};
use tracing::{debug, instrument};

use crate::error::{ApiError, RefreshError};
use crate::transport::{ApiRequest, HttpTransport};

pub const LOGIN_PATH: &str = "auth/login";
pub const REFRESH_PATH: &str = "auth/refresh";

/// Exchanges a refresh token for a new token pair.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Perform the exchange.
    ///
    /// # Errors
    /// Any failure is terminal for the refresh that requested it.
    async fn exchange(&self, request: RefreshRequest) -> Result<TokenPair, RefreshError>;
}

/// HTTP client without authorization.
#[derive(Debug, Clone)]
pub struct PublicClient {
    transport: HttpTransport,
}

impl PublicClient {
    /// Build a client with its own connection pool.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    #[must_use]
    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Send `request` as is.
    ///
    /// # Errors
    /// Errors are returned unchanged from the transport.
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        self.transport.send(request, None).await
    }

    /// `POST auth/login`.
    ///
    /// # Errors
    /// Bad credentials surface as [`ApiError::Unauthorized`] or
    /// [`ApiError::Application`] with the server's body.
    #[instrument(skip_all, fields(identifier = %request.identifier))]
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        let value = self
            .execute(&ApiRequest::post(LOGIN_PATH).json(request)?)
            .await?;
        let response: LoginResponse = decode(value)?;
        debug!(user_id = %response.user.id, "login succeeded");
        Ok(response)
    }

    /// `POST auth/refresh`.
    ///
    /// # Errors
    /// See [`PublicClient::execute`].
    pub async fn refresh(&self, request: &RefreshRequest) -> Result<TokenPair, ApiError> {
        let value = self
            .execute(&ApiRequest::post(REFRESH_PATH).json(request)?)
            .await?;
        decode(value)
    }
}

#[async_trait]
impl TokenExchange for PublicClient {
    async fn exchange(&self, request: RefreshRequest) -> Result<TokenPair, RefreshError> {
        self.refresh(&request).await.map_err(|err| match err {
            ApiError::Unauthorized(error) | ApiError::Application(error) => {
                RefreshError::Rejected {
                    status: error.status,
                    data: error.data,
                }
            }
            ApiError::Decode(message) => RefreshError::Decode(message),
            ApiError::Refresh(inner) => inner,
            other => RefreshError::Transport(other.to_string()),
        })
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::Decode(err.to_string()))
}
