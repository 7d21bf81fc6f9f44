//! Bearer-token client with refresh-and-replay on authorization failure.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::ApiError;
use crate::public::decode;
use crate::refresh::RefreshCoordinator;
use crate::session::SessionStore;
use crate::transport::{ApiRequest, HttpTransport, RequestExecutor};

/// Sends requests with the session's access token.
///
/// A 401 hands off to the [`RefreshCoordinator`] and the request is replayed
/// once with the refreshed token, or with the token a concurrent refresh
/// already stored. A 401 on the replay is terminal.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    transport: HttpTransport,
    session: Arc<SessionStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl AuthorizedClient {
    pub fn new(
        transport: HttpTransport,
        session: Arc<SessionStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Self {
        Self {
            transport,
            session,
            coordinator,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Send `request` and return the decoded body.
    ///
    /// # Errors
    /// - [`ApiError::Refresh`] when the refresh the request needed failed
    /// - [`ApiError::Unauthorized`] when the replayed request is rejected again
    /// - any other error from the transport, unchanged
    #[instrument(skip_all, fields(method = %request.method, path = %request.path()))]
    pub async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let token = self.session.access_token();
        match self.transport.send(request, token.as_deref()).await {
            Err(ApiError::Unauthorized(error)) => {
                debug!(status = error.status, "authorization failed; refreshing");
                let token = self.coordinator.refreshed_token(token.as_deref()).await?;
                debug!("replaying request with refreshed token");
                self.transport.send(request, Some(&token)).await
            }
            other => other,
        }
    }

    /// Send a request built from its parts.
    ///
    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let mut request = ApiRequest::new(method, path);
        if let Some(body) = body {
            request = request.json(body)?;
        }
        self.execute(&request).await
    }

    /// Send `request` and decode the body into `T`.
    ///
    /// # Errors
    /// See [`AuthorizedClient::execute`]; a body that does not match `T` is
    /// [`ApiError::Decode`].
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        decode(self.execute(request).await?)
    }
}

#[async_trait]
impl RequestExecutor for AuthorizedClient {
    async fn execute(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        AuthorizedClient::execute(self, request).await
    }
}
