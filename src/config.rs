//! Configuration options for the dashboard

use crate::error::Error;
use hotel_dashboard_auth::{
    AuthOptions, AuthenticationBackend, FileStore, HttpAuthBackend, KeyValueStore, MemoryStore,
    RouteGuard,
};
use reqwest::Client;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Session file location
pub const ENV_STORE: &str = "HOTEL_DASHBOARD_STORE";
/// Base URL of an HTTP auth backend
pub const ENV_AUTH_URL: &str = "HOTEL_DASHBOARD_AUTH_URL";
/// Signing secret of the stub backend
pub const ENV_TOKEN_SECRET: &str = "HOTEL_DASHBOARD_TOKEN_SECRET";
/// Token lifetime of the stub backend, in seconds
pub const ENV_TOKEN_TTL: &str = "HOTEL_DASHBOARD_TOKEN_TTL";

/// Configuration options for the dashboard
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Session manager options
    pub auth: AuthOptions,

    /// Where anonymous visitors are sent
    pub login_path: String,

    /// Landing page for `USER`
    pub user_home: String,

    /// Landing page for `ADMIN`
    pub admin_home: String,

    /// Session file; the session lives in memory when unset
    pub store_path: Option<PathBuf>,

    /// HTTP auth backend; the stub backend is used when unset
    pub auth_url: Option<Url>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            auth: AuthOptions::default(),
            login_path: "/login".to_string(),
            user_home: "/user".to_string(),
            admin_home: "/admin".to_string(),
            store_path: None,
            auth_url: None,
        }
    }
}

impl DashboardOptions {
    /// Defaults overridden by the `HOTEL_DASHBOARD_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        let mut options = Self::default();

        if let Some(path) = read_env(ENV_STORE) {
            options.store_path = Some(PathBuf::from(path));
        }
        if let Some(url) = read_env(ENV_AUTH_URL) {
            options = options.with_auth_url(&url)?;
        }
        if let Some(secret) = read_env(ENV_TOKEN_SECRET) {
            options.auth = options.auth.with_token_secret(&secret);
        }
        if let Some(ttl) = read_env(ENV_TOKEN_TTL) {
            let seconds: i64 = ttl
                .parse()
                .map_err(|_| Error::config(format!("{} must be a number of seconds: {}", ENV_TOKEN_TTL, ttl)))?;
            if seconds <= 0 {
                return Err(Error::config(format!("{} must be positive", ENV_TOKEN_TTL)));
            }
            options.auth = options.auth.with_token_ttl_secs(seconds);
        }

        Ok(options)
    }

    /// Set the session manager options
    pub fn with_auth(mut self, value: AuthOptions) -> Self {
        self.auth = value;
        self
    }

    /// Set the login path
    pub fn with_login_path(mut self, value: &str) -> Self {
        self.login_path = value.to_string();
        self
    }

    /// Set the `USER` landing page
    pub fn with_user_home(mut self, value: &str) -> Self {
        self.user_home = value.to_string();
        self
    }

    /// Set the `ADMIN` landing page
    pub fn with_admin_home(mut self, value: &str) -> Self {
        self.admin_home = value.to_string();
        self
    }

    /// Persist the session to a file
    pub fn with_store_path<P: Into<PathBuf>>(mut self, value: P) -> Self {
        self.store_path = Some(value.into());
        self
    }

    /// Authenticate against an HTTP backend
    pub fn with_auth_url(mut self, value: &str) -> Result<Self, Error> {
        let url = Url::parse(value)
            .map_err(|err| Error::config(format!("invalid auth backend URL {:?}: {}", value, err)))?;
        self.auth_url = Some(url);
        Ok(self)
    }

    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(&self.login_path, &self.user_home, &self.admin_home)
    }

    /// Session store selected by these options
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        match &self.store_path {
            Some(path) => Arc::new(FileStore::new(path)),
            None => Arc::new(MemoryStore::new()),
        }
    }

    /// Auth backend selected by these options
    pub fn backend(&self) -> Result<Arc<dyn AuthenticationBackend>, Error> {
        match &self.auth_url {
            Some(url) => {
                let backend = HttpAuthBackend::new(url.as_str(), Client::new())?;
                Ok(Arc::new(backend))
            }
            None => Ok(Arc::new(self.auth.mock_backend())),
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
