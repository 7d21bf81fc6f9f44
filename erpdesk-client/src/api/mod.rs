//! Typed endpoint catalogue and the [`ErpClient`] facade.

pub mod auth;
pub mod locations;
pub mod orders;
pub mod stock;
pub mod users;

use std::sync::Arc;

use serde_json::Value;
use shared::config::Config;
use shared::models::{
    ChangePasswordRequest, CreateOrderRequest, EditUserRequest, Location, LoginRequest,
    LoginResponse, Order, OrdersResponse, StockPage, UserProfile,
};
use tracing::{info, warn};

use crate::authorized::AuthorizedClient;
use crate::cache::{CacheTag, QueryCache, TagKind};
use crate::error::ApiError;
use crate::public::PublicClient;
use crate::refresh::RefreshCoordinator;
use crate::session::{Credentials, SessionStore};
use crate::storage::CredentialStorage;
use crate::transport::HttpTransport;

pub use auth::Logout;
pub use locations::{Factories, LocationById};
pub use orders::{CreateOrder, DeleteOrder, ORDERS_PAGE_SIZE, OrderById, OrdersByLocation};
pub use stock::StockSearch;
pub use users::{ChangePassword, EditUser, UsersByLocation};

/// One handle over the whole client stack.
#[derive(Debug)]
pub struct ErpClient {
    session: Arc<SessionStore>,
    public: PublicClient,
    authorized: Arc<AuthorizedClient>,
    cache: QueryCache,
}

impl ErpClient {
    /// Restore the session from `storage` and wire the clients around it.
    ///
    /// # Errors
    /// Fails when an HTTP client cannot be constructed.
    pub fn new(config: &Config, storage: Arc<dyn CredentialStorage>) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::restore(storage));
        let public = PublicClient::new(&config.api)?;
        let coordinator = Arc::new(RefreshCoordinator::new(
            session.clone(),
            Arc::new(public.clone()),
            config.session.on_refresh_failure,
        ));
        let authorized = Arc::new(AuthorizedClient::new(
            HttpTransport::new(&config.api)?,
            session.clone(),
            coordinator,
        ));
        let cache = QueryCache::new(authorized.clone()).follow_session(session.subscribe());

        Ok(Self {
            session,
            public,
            authorized,
            cache,
        })
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn public(&self) -> &PublicClient {
        &self.public
    }

    #[must_use]
    pub fn authorized(&self) -> &Arc<AuthorizedClient> {
        &self.authorized
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn location_or_session(&self, location_id: Option<&str>) -> Result<String, ApiError> {
        location_id
            .map(str::to_string)
            .or_else(|| self.session.location_id())
            .ok_or(ApiError::NoLocation)
    }

    /// Log in and store the new session.
    ///
    /// # Errors
    /// Rejected credentials come back as the server's error; a session that
    /// cannot be persisted is [`ApiError::Storage`].
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .public
            .login(&LoginRequest {
                identifier: identifier.to_string(),
                password: password.to_string(),
            })
            .await?;

        self.session
            .set_session(Credentials::from(response.clone()))?;
        self.cache.invalidate(&[CacheTag::kind(TagKind::Auth)]);
        Ok(response)
    }

    /// Tell the server, then drop the local session and every cached entry.
    ///
    /// The server call is best effort; the local session is cleared even
    /// when it fails.
    ///
    /// # Errors
    /// Only a failure to clear the stored session.
    pub async fn logout(&self) -> Result<(), ApiError> {
        if self.session.access_token().is_some()
            && let Err(err) = self.cache.mutate(&Logout).await
        {
            warn!(error = %err, "server-side logout failed");
        }

        self.session.clear_session()?;
        self.cache.reset();
        info!("logged out");
        Ok(())
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn search_stock(&self, page: u32, search: Option<&str>) -> Result<StockPage, ApiError> {
        self.cache.query(&StockSearch::new(page, search)).await
    }

    /// Orders of `location_id`, or of the session's location.
    ///
    /// # Errors
    /// [`ApiError::NoLocation`] when neither is available.
    pub async fn orders(
        &self,
        location_id: Option<&str>,
        page: u32,
    ) -> Result<OrdersResponse, ApiError> {
        let location_id = self.location_or_session(location_id)?;
        self.cache
            .query(&OrdersByLocation { location_id, page })
            .await
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn order(&self, id: &str) -> Result<Order, ApiError> {
        self.cache.query(&OrderById { id: id.to_string() }).await
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Value, ApiError> {
        self.cache.mutate(&CreateOrder(request)).await
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn delete_order(&self, id: &str) -> Result<Value, ApiError> {
        self.cache.mutate(&DeleteOrder { id: id.to_string() }).await
    }

    /// `location_id`, or the session's location.
    ///
    /// # Errors
    /// [`ApiError::NoLocation`] when neither is available.
    pub async fn location(&self, location_id: Option<&str>) -> Result<Location, ApiError> {
        let id = self.location_or_session(location_id)?;
        self.cache.query(&LocationById { id }).await
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn factories(&self) -> Result<Vec<Location>, ApiError> {
        self.cache.query(&Factories).await
    }

    /// # Errors
    /// [`ApiError::NoLocation`] when no location is given or stored.
    pub async fn users(&self, location_id: Option<&str>) -> Result<Vec<UserProfile>, ApiError> {
        let location_id = self.location_or_session(location_id)?;
        self.cache.query(&UsersByLocation { location_id }).await
    }

    /// The logged-in user's profile: the listed user whose id matches the
    /// session, else the first user of the location.
    ///
    /// # Errors
    /// See [`ErpClient::users`].
    pub async fn current_user(&self) -> Result<Option<UserProfile>, ApiError> {
        let users = self.users(None).await?;
        let user_id = self.session.user_id();
        let position = users
            .iter()
            .position(|user| Some(&user.id) == user_id.as_ref())
            .unwrap_or(0);
        Ok(users.into_iter().nth(position))
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn edit_user(&self, id: &str, data: EditUserRequest) -> Result<Value, ApiError> {
        self.cache
            .mutate(&EditUser {
                id: id.to_string(),
                data,
            })
            .await
    }

    /// # Errors
    /// See [`AuthorizedClient::execute`].
    pub async fn change_password(
        &self,
        id: &str,
        data: ChangePasswordRequest,
    ) -> Result<Value, ApiError> {
        self.cache
            .mutate(&ChangePassword {
                id: id.to_string(),
                data,
            })
            .await
    }
}
