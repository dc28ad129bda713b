//! Authentication backends
//!
//! The session manager never decides on its own whether a login succeeds; it
//! delegates to an [`AuthenticationBackend`]. Two are provided:
//!
//! - [`MockAuthBackend`]: the stub flow. Any non-empty password is accepted
//!   and the identity is fabricated from the email. It exists so the
//!   dashboard can run without a server and must not be mistaken for a
//!   security boundary.
//! - [`HttpAuthBackend`]: posts credentials to a REST endpoint.

use async_trait::async_trait;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;
use uuid::Uuid;

use crate::identity::{email_local_part, Identity, Role};
use crate::AuthError;

/// Default lifetime of tokens minted by [`MockAuthBackend`], in seconds
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

/// サインイン認証情報
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// ユーザー登録情報
#[derive(Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(username: &str, email: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// What a backend hands back on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Identity,
}

/// Source of truth for credential checks
#[async_trait]
pub trait AuthenticationBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError>;

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, AuthError>;
}

/// Claims carried by tokens minted by [`MockAuthBackend`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Stub backend that fabricates a successful response
pub struct MockAuthBackend {
    secret: String,
    token_ttl_secs: i64,
    warned: AtomicBool,
}

impl MockAuthBackend {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            warned: AtomicBool::new(false),
        }
    }

    pub fn with_token_ttl(mut self, seconds: i64) -> Self {
        self.token_ttl_secs = seconds;
        self
    }

    /// Identity the stub flow derives for `email`: a name-based id so the
    /// same address always maps to the same principal.
    pub fn identity_for_email(email: &str) -> Identity {
        let email = email.trim();
        let id = Uuid::new_v5(&Uuid::NAMESPACE_OID, email.to_lowercase().as_bytes());
        Identity {
            id: id.to_string(),
            username: email_local_part(email).to_string(),
            email: email.to_string(),
            role: Role::derive_from_email(email),
        }
    }

    /// Decode and validate a token minted by this backend
    pub fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        Ok(data.claims)
    }

    fn mint(&self, identity: &Identity) -> Result<String, AuthError> {
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims {
            sub: identity.id.clone(),
            email: identity.email.clone(),
            role: identity.role,
            iat: now,
            exp: now + self.token_ttl_secs,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|err| AuthError::InvalidToken(err.to_string()))
    }

    fn warn_once(&self) {
        if !self.warned.swap(true, Ordering::Relaxed) {
            log::warn!("MockAuthBackend accepts any non-empty password; do not use it in production");
        }
    }
}

#[async_trait]
impl AuthenticationBackend for MockAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        self.warn_once();
        let user = Self::identity_for_email(&credentials.email);
        let token = self.mint(&user)?;
        Ok(AuthResponse { token, user })
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, AuthError> {
        self.warn_once();
        let user = Identity {
            id: Uuid::new_v4().to_string(),
            username: registration.username.trim().to_string(),
            email: registration.email.trim().to_string(),
            role: Role::User,
        };
        let token = self.mint(&user)?;
        Ok(AuthResponse { token, user })
    }
}

/// Backend talking to `POST {base}/api/login` and `POST {base}/api/register`
pub struct HttpAuthBackend {
    base_url: Url,
    http_client: Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl HttpAuthBackend {
    pub fn new(base_url: &str, http_client: Client) -> Result<Self, AuthError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Result<AuthResponse, (StatusCode, String)>, AuthError> {
        let url = self.base_url.join(path)?;
        log::debug!("POST {}", url);

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Ok(Err((status, error_message(&body))));
        }

        let parsed: AuthResponse = serde_json::from_str(&body)?;
        Ok(Ok(parsed))
    }
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            message: Some(message),
            ..
        }) => message,
        Ok(ErrorBody {
            error: Some(error), ..
        }) => error,
        _ => body.to_string(),
    }
}

#[async_trait]
impl AuthenticationBackend for HttpAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        match self.post("api/login", credentials).await? {
            Ok(response) => Ok(response),
            Err((status, message)) => match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Err(AuthError::AuthenticationError(message))
                }
                _ => Err(AuthError::BackendError(format!(
                    "login failed with status {}: {}",
                    status, message
                ))),
            },
        }
    }

    async fn register(&self, registration: &Registration) -> Result<AuthResponse, AuthError> {
        match self.post("api/register", registration).await? {
            Ok(response) => Ok(response),
            Err((status, message)) => match status {
                StatusCode::BAD_REQUEST
                | StatusCode::CONFLICT
                | StatusCode::UNPROCESSABLE_ENTITY => Err(AuthError::ValidationError(message)),
                _ => Err(AuthError::BackendError(format!(
                    "registration failed with status {}: {}",
                    status, message
                ))),
            },
        }
    }
}
