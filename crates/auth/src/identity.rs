//! Identity and role types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::AuthError;

/// ロール
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Every role, lowest privilege first
    pub const ALL: [Role; 2] = [Role::User, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Role assigned by the stub login flow: `ADMIN` iff the email mentions "admin".
    pub fn derive_from_email(email: &str) -> Self {
        if email.to_lowercase().contains("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(AuthError::ValidationError(format!("unknown role: {}", other))),
        }
    }
}

/// The signed-in principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl Identity {
    pub fn new(id: &str, username: &str, email: &str, role: Role) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role,
        }
    }

    /// Whether the record is complete enough to be trusted after a restore.
    pub(crate) fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty() && !self.email.trim().is_empty()
    }
}

/// Text before the `@` of an email address.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Minimal email shape check shared by login and registration.
pub(crate) fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    }
}
