use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// E-mail or username.
    pub identifier: String,
    /// Plain-text password; only ever sent over TLS.
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Access/refresh credential pair minted by login or refresh.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Longer-lived token exchanged for a new pair.
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Identity block returned alongside the tokens at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginUser {
    /// User identifier, needed later to refresh.
    pub id: String,
    /// Role name as issued by the server.
    #[serde(default)]
    pub role: Option<String>,
    /// Location (warehouse/branch) the user operates from.
    #[serde(default)]
    pub location_id: Option<String>,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Issued credentials.
    pub tokens: TokenPair,
    /// The authenticated user.
    pub user: LoginUser,
}

/// Body of `POST /auth/refresh`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshRequest {
    /// Refresh token stored at login or by the previous refresh.
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    /// Owner of the refresh token.
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
