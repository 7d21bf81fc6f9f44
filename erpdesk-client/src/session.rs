//! The session store: the single owner of the current credentials.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use shared::models::{LoginResponse, TokenPair};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage::CredentialStorage;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const ROLE_KEY: &str = "role";
pub const LOCATION_ID_KEY: &str = "location_id";
pub const USER_ID_KEY: &str = "user_id";

/// Every key the store persists.
pub const SESSION_KEYS: [&str; 5] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    ROLE_KEY,
    LOCATION_ID_KEY,
    USER_ID_KEY,
];

/// Current credentials and identity.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub role: Option<String>,
    pub location_id: Option<String>,
    pub user_id: Option<String>,
    pub is_authenticated: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("role", &self.role)
            .field("location_id", &self.location_id)
            .field("user_id", &self.user_id)
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// Everything a successful login establishes.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub role: Option<String>,
    pub location_id: Option<String>,
    pub user_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("role", &self.role)
            .field("location_id", &self.location_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl From<LoginResponse> for Credentials {
    fn from(response: LoginResponse) -> Self {
        Self {
            access_token: response.tokens.access_token,
            refresh_token: response.tokens.refresh_token,
            role: response.user.role,
            location_id: response.user.location_id,
            user_id: response.user.id,
        }
    }
}

/// Owns the [`Session`] and keeps the credential storage in step with it.
///
/// Mutations update memory first and then write every affected key through
/// to storage before returning. A storage failure is reported but the
/// in-memory session still reflects the mutation.
pub struct SessionStore {
    state: RwLock<Session>,
    storage: Arc<dyn CredentialStorage>,
    authenticated: watch::Sender<bool>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.read())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Rehydrate the session from storage. The session counts as
    /// authenticated when an access token was stored.
    pub fn restore(storage: Arc<dyn CredentialStorage>) -> Self {
        let access_token = storage.load(ACCESS_TOKEN_KEY);
        let session = Session {
            is_authenticated: access_token.is_some(),
            access_token,
            refresh_token: storage.load(REFRESH_TOKEN_KEY),
            role: storage.load(ROLE_KEY),
            location_id: storage.load(LOCATION_ID_KEY),
            user_id: storage.load(USER_ID_KEY),
        };

        debug!(
            authenticated = session.is_authenticated,
            user_id = ?session.user_id,
            "restored session"
        );

        let (authenticated, _) = watch::channel(session.is_authenticated);
        Self {
            state: RwLock::new(session),
            storage,
            authenticated,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store credentials from a login and mark the session authenticated.
    ///
    /// # Errors
    /// Returns the first storage failure; remaining keys are still written.
    pub fn set_session(&self, credentials: Credentials) -> Result<(), StorageError> {
        let mut state = self.write();
        *state = Session {
            access_token: Some(credentials.access_token),
            refresh_token: Some(credentials.refresh_token),
            role: credentials.role,
            location_id: credentials.location_id,
            user_id: Some(credentials.user_id),
            is_authenticated: true,
        };

        let result = self.persist(&state);
        drop(state);
        self.authenticated.send_replace(true);
        info!(user_id = ?self.user_id(), "session established");
        result
    }

    /// Replace both tokens after a refresh; identity fields are kept.
    ///
    /// # Errors
    /// Returns the first storage failure.
    pub fn rotate_tokens(&self, tokens: &TokenPair) -> Result<(), StorageError> {
        let mut state = self.write();
        state.access_token = Some(tokens.access_token.clone());
        state.refresh_token = Some(tokens.refresh_token.clone());
        state.is_authenticated = true;

        let result = first_error([
            self.storage.store(ACCESS_TOKEN_KEY, &tokens.access_token),
            self.storage.store(REFRESH_TOKEN_KEY, &tokens.refresh_token),
        ]);
        drop(state);
        self.authenticated.send_replace(true);
        debug!("session tokens rotated");
        result
    }

    /// Drop every field and mark the session unauthenticated.
    ///
    /// # Errors
    /// Returns the first storage failure; remaining keys are still removed.
    pub fn clear_session(&self) -> Result<(), StorageError> {
        let mut state = self.write();
        *state = Session::default();
        let result = first_error(SESSION_KEYS.map(|key| self.storage.remove(key)));
        drop(state);

        self.authenticated.send_replace(false);
        info!("session cleared");
        result
    }

    fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let fields = [
            (ACCESS_TOKEN_KEY, &session.access_token),
            (REFRESH_TOKEN_KEY, &session.refresh_token),
            (ROLE_KEY, &session.role),
            (LOCATION_ID_KEY, &session.location_id),
            (USER_ID_KEY, &session.user_id),
        ];

        first_error(fields.map(|(key, value)| match value {
            Some(value) => self.storage.store(key, value),
            None => self.storage.remove(key),
        }))
    }

    /// Current bearer token, read fresh on every call.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.read().access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.read().refresh_token.clone()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<String> {
        self.read().user_id.clone()
    }

    #[must_use]
    pub fn location_id(&self) -> Option<String> {
        self.read().location_id.clone()
    }

    #[must_use]
    pub fn role(&self) -> Option<String> {
        self.read().role.clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    /// Copy of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    /// Watch the authenticated flag. It flips to `false` on logout and on a
    /// forced logout after a failed refresh.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }
}

fn first_error<const N: usize>(results: [Result<(), StorageError>; N]) -> Result<(), StorageError> {
    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}
