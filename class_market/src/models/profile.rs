//! Roles and application profiles.

use super::{RecordId, identity::Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace role.
///
/// Parsing never fails: anything that is not one of the three known roles
/// (after trimming and case-folding) becomes [`Role::Unknown`], which keeps
/// the raw value for display. Code that branches on a role should go through
/// [`Role::effective`] or match exhaustively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    User,
    Instructor,
    Admin,
    Unknown(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "user" => Role::User,
            "instructor" => Role::Instructor,
            "admin" => Role::Admin,
            _ => Role::Unknown(normalized),
        }
    }

    /// One of the three enumerated roles; unknown roles act as students.
    pub fn effective(&self) -> Role {
        match self {
            Role::Unknown(_) => Role::User,
            known => known.clone(),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
            Role::Unknown(raw) => raw,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend user document.
///
/// `role` is required: a payload without a string role is malformed and the
/// profile resolver falls back to the identity instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "photoUrl", alias = "photoURL")]
    pub photo: Option<String>,
    pub role: Role,
}

impl UserRecord {
    /// Record saved for a freshly registered account.
    pub fn new_student(email: &str, name: &str, photo: Option<String>) -> Self {
        Self {
            id: None,
            email: email.to_string(),
            name: Some(name.to_string()),
            photo,
            role: Role::User,
        }
    }
}

/// Application profile: the backend's view of the signed-in user.
#[derive(Debug, Clone, PartialEq)]
pub struct AppProfile {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub photo_url: Option<String>,
    /// Synthesized from the identity because no backend record was usable.
    pub is_from_auth: bool,
}

impl AppProfile {
    pub fn from_record(record: UserRecord, identity: &Identity) -> Self {
        let name = record
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| identity.label());
        Self {
            email: record.email,
            name,
            role: record.role,
            photo_url: record.photo.or_else(|| identity.photo_url.clone()),
            is_from_auth: false,
        }
    }

    pub fn fallback(identity: &Identity) -> Self {
        Self {
            email: identity.email().unwrap_or_default().to_string(),
            name: identity.label(),
            role: Role::User,
            photo_url: identity.photo_url.clone(),
            is_from_auth: true,
        }
    }
}
