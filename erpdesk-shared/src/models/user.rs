use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::ValidationErrors;

/// Minimum length accepted for a new password.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").ok());

/// A user account as listed per location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Unique identifier for the user.
    pub id: String,

    /// The user's full name.
    #[serde(default)]
    pub full_name: String,

    /// The user's login name.
    pub username: String,

    /// The user's e-mail address, if one is on file.
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub location_id: Option<String>,
}

/// Body of `PUT /user/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EditUserRequest {
    pub full_name: String,
    pub username: String,
    pub email: Option<String>,
}

impl EditUserRequest {
    /// Start an edit from the stored profile.
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
        }
    }

    /// Check the form before it is submitted.
    ///
    /// # Errors
    /// Full name and username are required; an e-mail, when given, must look
    /// like `name@domain.tld`.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.full_name.trim().is_empty() {
            errors.add("full_name", "full name is required");
        }
        if self.username.trim().is_empty() {
            errors.add("username", "username is required");
        }
        if let Some(email) = self.email.as_deref().filter(|email| !email.is_empty())
            && !EMAIL_PATTERN
                .as_ref()
                .is_none_or(|pattern| pattern.is_match(email))
        {
            errors.add("email", "e-mail address is invalid");
        }

        errors.into_result()
    }
}

/// Body of `POST /user/change-password/{id}`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl std::fmt::Debug for ChangePasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChangePasswordRequest { .. }")
    }
}

/// The three-field password form, validated into a [`ChangePasswordRequest`].
#[derive(Clone, Default)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordChangeForm {
    /// Validate the form and produce the request body.
    ///
    /// # Errors
    /// Returns every failing field: missing old password, a new password
    /// shorter than [`MIN_PASSWORD_LEN`], or a confirmation that differs.
    pub fn into_request(self) -> Result<ChangePasswordRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.old_password.is_empty() {
            errors.add("old_password", "enter the current password");
        }
        if self.new_password.is_empty() {
            errors.add("new_password", "enter a new password");
        } else if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "new_password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            );
        }
        if self.confirm_password.is_empty() {
            errors.add("confirm_password", "confirm the new password");
        } else if self.new_password != self.confirm_password {
            errors.add("confirm_password", "passwords do not match");
        }

        errors.into_result()?;
        Ok(ChangePasswordRequest {
            old_password: self.old_password,
            new_password: self.new_password,
        })
    }
}
