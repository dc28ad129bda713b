//! Route guard decisions

use crate::identity::Role;
use crate::session::SessionState;

/// Outcome of evaluating a guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still restoring; render nothing and ask again later.
    Pending,
    /// The view may be rendered.
    Render,
    /// Navigate elsewhere instead of rendering.
    Redirect(String),
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, GuardDecision::Render)
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect(target) => Some(target),
            _ => None,
        }
    }
}

/// Login and landing paths used when a guard redirects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    login_path: String,
    user_home: String,
    admin_home: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            user_home: "/user".to_string(),
            admin_home: "/admin".to_string(),
        }
    }
}

impl RouteGuard {
    pub fn new(login_path: &str, user_home: &str, admin_home: &str) -> Self {
        Self {
            login_path: login_path.to_string(),
            user_home: user_home.to_string(),
            admin_home: admin_home.to_string(),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Role-specific home
    pub fn landing(&self, role: Role) -> &str {
        match role {
            Role::User => &self.user_home,
            Role::Admin => &self.admin_home,
        }
    }

    /// Gate a protected view reachable by `allowed` roles.
    pub fn check(&self, state: &SessionState, allowed: &[Role]) -> GuardDecision {
        let decision = match state {
            SessionState::Restoring => GuardDecision::Pending,
            SessionState::Anonymous => GuardDecision::Redirect(self.login_path.clone()),
            SessionState::Authenticated { identity, .. } => {
                if state.authorize(allowed) {
                    GuardDecision::Render
                } else {
                    GuardDecision::Redirect(self.landing(identity.role).to_string())
                }
            }
        };
        log::debug!("guard {:?} -> {:?}", allowed, decision);
        decision
    }

    /// Gate a view meant for anonymous visitors (login, register).
    pub fn check_public(&self, state: &SessionState) -> GuardDecision {
        match state {
            SessionState::Restoring => GuardDecision::Pending,
            SessionState::Anonymous => GuardDecision::Render,
            SessionState::Authenticated { identity, .. } => {
                GuardDecision::Redirect(self.landing(identity.role).to_string())
            }
        }
    }

    /// Where the application root sends the visitor.
    pub fn home(&self, state: &SessionState) -> GuardDecision {
        match state {
            SessionState::Restoring => GuardDecision::Pending,
            SessionState::Anonymous => GuardDecision::Redirect(self.login_path.clone()),
            SessionState::Authenticated { identity, .. } => {
                GuardDecision::Redirect(self.landing(identity.role).to_string())
            }
        }
    }
}
