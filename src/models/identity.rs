//! Identity model: the application-level user profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::nullable_string;

/// Role given to profiles created from an SSO login.
pub const SSO_ROLE: &str = "student";

/// Role given to profiles created by direct sign-up.
pub const SIGNUP_ROLE: &str = "STUDENT";

/// A resolved user profile as stored in the `users` table.
///
/// Columns this client does not know about (server defaults such as
/// `created_at`) are kept in `extra` so an adopted row is stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    /// External roll number, unique per profile
    #[serde(default, deserialize_with = "nullable_string")]
    pub roll: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub department: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub degree: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub role: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    /// Build a candidate profile from SSO user data with a fresh identifier.
    pub fn from_sso(data: &SsoUserData) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: data.name.clone(),
            roll: data.roll.clone(),
            department: data.department.clone(),
            degree: data.degree.clone(),
            role: SSO_ROLE.to_string(),
            extra: Map::new(),
        }
    }

    /// Build the profile row written on direct sign-up.
    pub fn from_signup(user_id: &str, form: &SignUpForm) -> Self {
        Self {
            id: user_id.to_string(),
            name: form.name.clone(),
            roll: form.roll.clone(),
            department: form.department.clone(),
            degree: form.degree.clone(),
            role: SIGNUP_ROLE.to_string(),
            extra: Map::new(),
        }
    }
}

/// User data returned by the SSO identity endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsoUserData {
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub roll: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub department: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub degree: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body for direct sign-up.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roll: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub degree: String,
}

impl SignUpForm {
    /// True when every field holds something other than whitespace.
    pub fn is_complete(&self) -> bool {
        [
            &self.email,
            &self.password,
            &self.name,
            &self.roll,
            &self.department,
            &self.degree,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }
}

/// Request body for direct sign-in.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Session handed out by the hosted auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub user_id: String,
}
