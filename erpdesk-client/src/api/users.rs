use serde::Serialize;
use serde_json::Value;
use shared::models::{ChangePasswordRequest, EditUserRequest, UserProfile};

use crate::cache::{CacheTag, Mutation, Query, TagKind};
use crate::error::ApiError;
use crate::transport::ApiRequest;

/// Users attached to a location.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UsersByLocation {
    pub location_id: String,
}

impl Query for UsersByLocation {
    const NAME: &'static str = "users_by_location";
    type Output = Vec<UserProfile>;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        Ok(ApiRequest::get("user/locationId").segment(self.location_id.clone()))
    }

    /// Tagged by location and by every listed user, so editing one user
    /// refreshes the listing it appears in.
    fn provides(&self, users: &Vec<UserProfile>) -> Vec<CacheTag> {
        std::iter::once(CacheTag::id(TagKind::User, self.location_id.clone()))
            .chain(
                users
                    .iter()
                    .map(|user| CacheTag::id(TagKind::User, user.id.clone())),
            )
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditUser {
    pub id: String,
    pub data: EditUserRequest,
}

impl Mutation for EditUser {
    type Output = Value;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::put("user").segment(self.id.clone()).json(&self.data)
    }

    fn invalidates(&self) -> Vec<CacheTag> {
        vec![CacheTag::id(TagKind::User, self.id.clone())]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePassword {
    pub id: String,
    pub data: ChangePasswordRequest,
}

impl Mutation for ChangePassword {
    type Output = Value;

    fn request(&self) -> Result<ApiRequest, ApiError> {
        ApiRequest::post("user/change-password")
            .segment(self.id.clone())
            .json(&self.data)
    }

    fn invalidates(&self) -> Vec<CacheTag> {
        vec![CacheTag::id(TagKind::User, self.id.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_provide_location_and_user_tags() {
        let query = UsersByLocation {
            location_id: "L1".to_string(),
        };
        let users = vec![UserProfile {
            id: "u-7".to_string(),
            full_name: "Dilshod Karimov".to_string(),
            username: "dkarimov".to_string(),
            email: None,
            role: None,
            location_id: Some("L1".to_string()),
        }];

        assert_eq!(
            query.provides(&users),
            vec![
                CacheTag::id(TagKind::User, "L1"),
                CacheTag::id(TagKind::User, "u-7"),
            ]
        );
        assert_eq!(query.request().unwrap().path(), "user/locationId/L1");
    }

    #[test]
    fn test_change_password_request() {
        let mutation = ChangePassword {
            id: "u-7".to_string(),
            data: ChangePasswordRequest {
                old_password: "old-secret".to_string(),
                new_password: "new-secret".to_string(),
            },
        };
        let request = mutation.request().unwrap();
        assert_eq!(request.path(), "user/change-password/u-7");
        assert_eq!(request.body.unwrap()["new_password"], "new-secret");
        assert_eq!(
            mutation.invalidates(),
            vec![CacheTag::id(TagKind::User, "u-7")]
        );
    }
}
