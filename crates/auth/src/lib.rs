//! Session and authorization manager for the hotel dashboard
//!
//! This crate keeps track of who is using the dashboard, persists that
//! identity through a pluggable key-value store so it survives a restart,
//! and answers the role checks route guards make before rendering a view.

mod backend;
mod guard;
mod identity;
mod session;
mod store;

use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::Mutex;

pub use backend::*;
pub use guard::*;
pub use identity::*;
pub use session::*;
pub use store::*;

use identity::looks_like_email;

/// エラー型
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Persistence error: {0}")]
    PersistenceError(#[from] StoreError),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
}

/// クライアントオプション
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Store key holding the opaque auth token
    pub token_key: String,

    /// Store key holding the serialized identity record
    pub user_key: String,

    /// Signing secret for tokens minted by the stub backend
    pub token_secret: String,

    /// Lifetime of tokens minted by the stub backend, in seconds
    pub token_ttl_secs: i64,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            token_key: "token".to_string(),
            user_key: "user".to_string(),
            token_secret: "hotel-dashboard-dev-secret".to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

impl AuthOptions {
    pub fn with_token_key(mut self, value: &str) -> Self {
        self.token_key = value.to_string();
        self
    }

    pub fn with_user_key(mut self, value: &str) -> Self {
        self.user_key = value.to_string();
        self
    }

    pub fn with_token_secret(mut self, value: &str) -> Self {
        self.token_secret = value.to_string();
        self
    }

    pub fn with_token_ttl_secs(mut self, value: i64) -> Self {
        self.token_ttl_secs = value;
        self
    }

    /// Stub backend configured from these options
    pub fn mock_backend(&self) -> MockAuthBackend {
        MockAuthBackend::new(&self.token_secret).with_token_ttl(self.token_ttl_secs)
    }
}

/// Owner of the current session
///
/// Starts in [`SessionState::Restoring`]; call [`SessionManager::restore`]
/// once at startup before evaluating any guard. `restore`, `login`,
/// `register` and `logout` are serialized so the persisted record always
/// matches the in-memory state they leave behind.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    backend: Arc<dyn AuthenticationBackend>,
    options: AuthOptions,
    state: Arc<RwLock<SessionState>>,
    op_lock: Mutex<()>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn AuthenticationBackend>,
        options: AuthOptions,
    ) -> Self {
        Self {
            store,
            backend,
            options,
            state: Arc::new(RwLock::new(SessionState::Restoring)),
            op_lock: Mutex::new(()),
        }
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Current state machine value
    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.state().to_session()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state().identity().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().is_some()
    }

    /// Whether `restore()` has settled
    pub fn is_restored(&self) -> bool {
        self.state().is_settled()
    }

    /// True iff authenticated with one of `roles`.
    pub fn authorize(&self, roles: &[Role]) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .authorize(roles)
    }

    /// Load the persisted session, falling back to anonymous on any problem.
    ///
    /// Never writes to the store.
    pub async fn restore(&self) -> Session {
        let _op = self.op_lock.lock().await;

        let state = match self.read_persisted().await {
            Some((identity, token)) => {
                log::info!("restored session for {} ({})", identity.email, identity.role);
                SessionState::Authenticated { identity, token }
            }
            None => SessionState::Anonymous,
        };

        let session = state.to_session();
        self.replace_state(state);
        session
    }

    async fn read_persisted(&self) -> Option<(Identity, String)> {
        let token = match self.store.get(&self.options.token_key).await {
            Ok(Some(token)) if !token.trim().is_empty() => token,
            Ok(_) => return None,
            Err(err) => {
                log::warn!("could not read persisted token: {}", err);
                return None;
            }
        };

        let raw = match self.store.get(&self.options.user_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                log::warn!("persisted token has no identity record; starting anonymous");
                return None;
            }
            Err(err) => {
                log::warn!("could not read persisted identity: {}", err);
                return None;
            }
        };

        match StoredIdentity::decode(&raw) {
            Ok(identity) => Some((identity, token)),
            Err(err) => {
                log::warn!("ignoring unreadable identity record: {}", err);
                None
            }
        }
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::AuthenticationError(
                "email and password are required".to_string(),
            ));
        }
        if !looks_like_email(email) {
            return Err(AuthError::AuthenticationError(format!(
                "invalid email address: {}",
                email
            )));
        }

        let _op = self.op_lock.lock().await;
        let response = self
            .backend
            .login(&Credentials::new(email, password))
            .await?;
        self.establish(response).await
    }

    /// Create an account and sign in with it
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() {
            return Err(AuthError::ValidationError("username is required".to_string()));
        }
        if email.is_empty() {
            return Err(AuthError::ValidationError("email is required".to_string()));
        }
        if password.is_empty() {
            return Err(AuthError::ValidationError("password is required".to_string()));
        }
        if !looks_like_email(email) {
            return Err(AuthError::ValidationError(format!(
                "invalid email address: {}",
                email
            )));
        }

        let _op = self.op_lock.lock().await;
        let mut response = self
            .backend
            .register(&Registration::new(username, email, password))
            .await?;

        if response.user.role != Role::User {
            log::warn!(
                "backend granted {} on registration; downgrading to USER",
                response.user.role
            );
            response.user.role = Role::User;
        }

        self.establish(response).await
    }

    /// Persist a successful backend response, then switch the in-memory state.
    async fn establish(&self, response: AuthResponse) -> Result<Identity, AuthError> {
        let AuthResponse { token, user } = response;
        if token.trim().is_empty() || !user.is_well_formed() {
            return Err(AuthError::BackendError(
                "backend returned an incomplete session".to_string(),
            ));
        }

        let record = StoredIdentity::encode(&user)?;
        let previous_token = self.store.get(&self.options.token_key).await.ok().flatten();

        self.store.set(&self.options.token_key, &token).await?;
        if let Err(err) = self.store.set(&self.options.user_key, &record).await {
            self.rollback_token(previous_token).await;
            return Err(AuthError::PersistenceError(err));
        }

        log::info!("signed in as {} ({})", user.email, user.role);
        self.replace_state(SessionState::Authenticated {
            identity: user.clone(),
            token,
        });
        Ok(user)
    }

    async fn rollback_token(&self, previous: Option<String>) {
        let key = &self.options.token_key;
        let result = match previous {
            Some(token) => self.store.set(key, &token).await,
            None => self.store.remove(key).await,
        };
        if let Err(err) = result {
            log::warn!("could not roll back persisted token: {}", err);
        }
    }

    /// Sign out; a no-op when the session is anonymous.
    ///
    /// A logout issued while restoring still clears the persisted record.
    /// When the identity record cannot be removed the token is put back, so
    /// the store keeps matching the session that stays signed in.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _op = self.op_lock.lock().await;

        if self.state() == SessionState::Anonymous {
            log::debug!("logout without an active session");
            return Ok(());
        }

        let previous_token = self.store.get(&self.options.token_key).await.ok().flatten();
        self.store.remove(&self.options.token_key).await?;
        if let Err(err) = self.store.remove(&self.options.user_key).await {
            self.rollback_token(previous_token).await;
            return Err(AuthError::PersistenceError(err));
        }

        self.replace_state(SessionState::Anonymous);
        log::info!("signed out");
        Ok(())
    }

    fn replace_state(&self, next: SessionState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = next;
    }
}
