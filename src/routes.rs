//! Route table of the dashboard

use crate::error::Error;
use hotel_dashboard_auth::{GuardDecision, Role, RouteGuard, SessionState};
use std::fmt;
use std::str::FromStr;

const ANY_ROLE: &[Role] = &[Role::User, Role::Admin];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// A dashboard page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Root,
    Login,
    Register,
    UserHome,
    UserRooms,
    UserBook,
    UserBookings,
    AdminHome,
    AdminHotels,
    AdminRooms,
    AdminBookings,
    AdminUsers,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Root,
        Route::Login,
        Route::Register,
        Route::UserHome,
        Route::UserRooms,
        Route::UserBook,
        Route::UserBookings,
        Route::AdminHome,
        Route::AdminHotels,
        Route::AdminRooms,
        Route::AdminBookings,
        Route::AdminUsers,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Root => "/",
            Route::Login => "/login",
            Route::Register => "/register",
            Route::UserHome => "/user",
            Route::UserRooms => "/user/rooms",
            Route::UserBook => "/user/book",
            Route::UserBookings => "/user/bookings",
            Route::AdminHome => "/admin",
            Route::AdminHotels => "/admin/hotels",
            Route::AdminRooms => "/admin/rooms",
            Route::AdminBookings => "/admin/bookings",
            Route::AdminUsers => "/admin/users",
        }
    }

    /// Look up a path; a trailing slash and a query string are ignored.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.trim();
        let path = path.split(|c| c == '?' || c == '#').next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Route::ALL.iter().copied().find(|route| route.path() == path)
    }

    /// Roles that may render a protected route, `None` for the public ones
    pub fn allowed_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Root | Route::Login | Route::Register => None,
            Route::UserHome | Route::UserRooms | Route::UserBook | Route::UserBookings => {
                Some(ANY_ROLE)
            }
            Route::AdminHome
            | Route::AdminHotels
            | Route::AdminRooms
            | Route::AdminBookings
            | Route::AdminUsers => Some(ADMIN_ONLY),
        }
    }

    /// Decide what visiting this route does for `state`
    pub fn resolve(&self, guard: &RouteGuard, state: &SessionState) -> GuardDecision {
        match self {
            Route::Root => guard.home(state),
            Route::Login | Route::Register => guard.check_public(state),
            protected => match protected.allowed_roles() {
                Some(roles) => guard.check(state, roles),
                None => guard.check_public(state),
            },
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Decide what visiting `path` does; unknown paths go to the root.
pub fn resolve(guard: &RouteGuard, state: &SessionState, path: &str) -> GuardDecision {
    match Route::parse(path) {
        Some(route) => route.resolve(guard, state),
        None => {
            tracing::debug!(path, "unknown route");
            GuardDecision::Redirect(Route::Root.path().to_string())
        }
    }
}

/// A list view and the route that shows it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    AdminHotels,
    AdminRooms,
    AdminBookings,
    AdminUsers,
    GuestRooms,
    GuestBookings,
}

impl View {
    pub const ALL: [View; 6] = [
        View::AdminHotels,
        View::AdminRooms,
        View::AdminBookings,
        View::AdminUsers,
        View::GuestRooms,
        View::GuestBookings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            View::AdminHotels => "admin-hotels",
            View::AdminRooms => "admin-rooms",
            View::AdminBookings => "admin-bookings",
            View::AdminUsers => "admin-users",
            View::GuestRooms => "rooms",
            View::GuestBookings => "bookings",
        }
    }

    pub fn route(&self) -> Route {
        match self {
            View::AdminHotels => Route::AdminHotels,
            View::AdminRooms => Route::AdminRooms,
            View::AdminBookings => Route::AdminBookings,
            View::AdminUsers => Route::AdminUsers,
            View::GuestRooms => Route::UserRooms,
            View::GuestBookings => Route::UserBookings,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        View::ALL
            .iter()
            .copied()
            .find(|view| view.name() == wanted || view.route().path() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = View::ALL.iter().map(View::name).collect();
                Error::validation(format!(
                    "unknown view {:?}; expected one of {}",
                    wanted,
                    known.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotel_dashboard_auth::Identity;

    fn signed_in(role: Role) -> SessionState {
        SessionState::Authenticated {
            identity: Identity::new("1", "someone", "someone@x.com", role),
            token: "t".to_string(),
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(Route::parse("/admin/rooms/"), Some(Route::AdminRooms));
        assert_eq!(Route::parse("/user/bookings?page=2"), Some(Route::UserBookings));
        assert_eq!(Route::parse(""), Some(Route::Root));
        assert_eq!(Route::parse("/admin/secrets"), None);
    }

    #[test]
    fn test_route_table() {
        let guard = RouteGuard::default();
        let user = signed_in(Role::User);
        let admin = signed_in(Role::Admin);

        assert!(resolve(&guard, &user, "/user/book").is_render());
        assert!(resolve(&guard, &admin, "/user/book").is_render());
        assert_eq!(resolve(&guard, &user, "/admin/users").redirect_target(), Some("/user"));
        assert!(resolve(&guard, &admin, "/admin/users").is_render());
        assert_eq!(resolve(&guard, &admin, "/login").redirect_target(), Some("/admin"));
        assert_eq!(resolve(&guard, &user, "/").redirect_target(), Some("/user"));
        assert_eq!(
            resolve(&guard, &SessionState::Anonymous, "/").redirect_target(),
            Some("/login")
        );
        assert!(resolve(&guard, &SessionState::Anonymous, "/register").is_render());
        assert_eq!(resolve(&guard, &admin, "/nowhere").redirect_target(), Some("/"));
    }

    #[test]
    fn test_pending_while_restoring() {
        let guard = RouteGuard::default();
        for route in Route::ALL {
            assert_eq!(
                route.resolve(&guard, &SessionState::Restoring),
                GuardDecision::Pending
            );
        }
    }

    #[test]
    fn test_view_names() {
        assert_eq!("rooms".parse::<View>().unwrap(), View::GuestRooms);
        assert_eq!("/admin/hotels".parse::<View>().unwrap(), View::AdminHotels);
        assert!("dashboards".parse::<View>().is_err());
    }
}
