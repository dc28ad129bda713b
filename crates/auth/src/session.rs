//! Session state and the persisted identity record

use serde::{Deserialize, Serialize};

use crate::identity::{Identity, Role};
use crate::AuthError;

/// Version written into every persisted identity record.
///
/// Records without a version field come from clients that predate
/// versioning and are read as version 0.
pub const IDENTITY_RECORD_VERSION: u32 = 1;

/// Read-only view of who is using the application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    /// The signed-in principal, `None` when anonymous
    pub identity: Option<Identity>,

    /// The opaque token issued by the authentication backend
    pub auth_token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity, token: String) -> Self {
        Self {
            identity: Some(identity),
            auth_token: Some(token),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|identity| identity.role)
    }
}

/// Internal state machine of the session manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// `restore()` has not settled yet
    Restoring,
    Anonymous,
    Authenticated { identity: Identity, token: String },
}

impl SessionState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, SessionState::Restoring)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// True iff authenticated with a role contained in `roles`.
    pub fn authorize(&self, roles: &[Role]) -> bool {
        match self {
            SessionState::Authenticated { identity, .. } => roles.contains(&identity.role),
            _ => false,
        }
    }

    /// Snapshot handed to the rest of the application. A session that is
    /// still restoring reads as anonymous.
    pub fn to_session(&self) -> Session {
        match self {
            SessionState::Authenticated { identity, token } => {
                Session::authenticated(identity.clone(), token.clone())
            }
            _ => Session::anonymous(),
        }
    }
}

/// On-disk shape of the identity record
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredIdentity {
    #[serde(default)]
    pub version: u32,

    #[serde(flatten)]
    pub identity: Identity,
}

impl StoredIdentity {
    pub fn encode(identity: &Identity) -> Result<String, AuthError> {
        let record = StoredIdentity {
            version: IDENTITY_RECORD_VERSION,
            identity: identity.clone(),
        };
        Ok(serde_json::to_string(&record)?)
    }

    pub fn decode(raw: &str) -> Result<Identity, AuthError> {
        let record: StoredIdentity = serde_json::from_str(raw)?;

        if record.version > IDENTITY_RECORD_VERSION {
            return Err(AuthError::InvalidToken(format!(
                "identity record version {} is newer than supported version {}",
                record.version, IDENTITY_RECORD_VERSION
            )));
        }

        if !record.identity.is_well_formed() {
            return Err(AuthError::InvalidToken(
                "identity record is missing id or email".to_string(),
            ));
        }

        Ok(record.identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::new("42", "boss", "boss.admin@example.com", Role::Admin)
    }

    #[test]
    fn test_state_authorize() {
        let state = SessionState::Authenticated {
            identity: admin(),
            token: "t".to_string(),
        };
        assert!(state.authorize(&[Role::Admin]));
        assert!(state.authorize(&[Role::User, Role::Admin]));
        assert!(!state.authorize(&[Role::User]));
        assert!(!state.authorize(&[]));

        assert!(!SessionState::Anonymous.authorize(&Role::ALL));
        assert!(!SessionState::Restoring.authorize(&Role::ALL));
    }

    #[test]
    fn test_restoring_reads_as_anonymous() {
        let session = SessionState::Restoring.to_session();
        assert!(!session.is_authenticated());
        assert_eq!(session.auth_token, None);
        assert!(!SessionState::Restoring.is_settled());
    }

    #[test]
    fn test_record_carries_version() {
        let raw = StoredIdentity::encode(&admin()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], IDENTITY_RECORD_VERSION);
        assert_eq!(value["role"], "ADMIN");
        assert_eq!(StoredIdentity::decode(&raw).unwrap(), admin());
    }

    #[test]
    fn test_legacy_record_without_version() {
        let raw = r#"{"id":"1","username":"guest","email":"guest@x.com","role":"USER"}"#;
        let identity = StoredIdentity::decode(raw).unwrap();
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn test_rejects_future_and_incomplete_records() {
        let future = r#"{"version":99,"id":"1","username":"g","email":"g@x.com","role":"USER"}"#;
        assert!(StoredIdentity::decode(future).is_err());

        let blank_id = r#"{"version":1,"id":"","username":"g","email":"g@x.com","role":"USER"}"#;
        assert!(StoredIdentity::decode(blank_id).is_err());

        let bad_role = r#"{"version":1,"id":"1","username":"g","email":"g@x.com","role":"ROOT"}"#;
        assert!(StoredIdentity::decode(bad_role).is_err());
    }
}
