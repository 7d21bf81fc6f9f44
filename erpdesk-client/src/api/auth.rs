use serde_json::Value;

use crate::cache::{CacheTag, Mutation, TagKind};
use crate::error::ApiError;
use crate::transport::ApiRequest;

pub use crate::public::{LOGIN_PATH, REFRESH_PATH};

pub const LOGOUT_PATH: &str = "auth/logout";

/// Server-side logout. The local session is cleared regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logout;

impl Mutation for Logout {
    type Output = Value;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::post(LOGOUT_PATH))
    }

    fn invalidates(&self) -> Vec<CacheTag> {
        vec![CacheTag::kind(TagKind::Auth)]
    }
}
