//! Hotel Dashboard
//!
//! Core of a role-based hotel management dashboard: who is signed in, which
//! pages they may open, and the searchable, filterable, sortable lists of
//! hotels, rooms, bookings and user accounts those pages show.

pub mod catalog;
pub mod config;
pub mod error;
pub mod routes;

pub use hotel_dashboard_auth as auth;
pub use hotel_dashboard_query as query;

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

use crate::auth::{
    AuthenticationBackend, GuardDecision, Identity, KeyValueStore, Role, RouteGuard, Session,
    SessionManager,
};
use crate::catalog::{
    admin_bookings_schema, admin_hotels_schema, admin_rooms_schema, admin_users_schema,
    guest_bookings_schema, guest_rooms_schema, Booking, BookingRequest, BookingStatus, Catalog,
    Hotel, Room, UserAccount,
};
use crate::config::DashboardOptions;
use crate::error::Error;
use crate::query::{Outcome, QueryState, ViewSchema};
use crate::routes::{Route, View};

/// Rows of one list view
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub rows: Vec<T>,
    /// Records the view drew from before filtering
    pub total: usize,
    pub outcome: Outcome,
}

impl<T> Listing<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct Schemas {
    admin_hotels: ViewSchema<Hotel>,
    admin_rooms: ViewSchema<Room>,
    admin_bookings: ViewSchema<Booking>,
    admin_users: ViewSchema<UserAccount>,
    guest_rooms: ViewSchema<Room>,
    guest_bookings: ViewSchema<Booking>,
}

impl Schemas {
    fn new() -> Self {
        Self {
            admin_hotels: admin_hotels_schema(),
            admin_rooms: admin_rooms_schema(),
            admin_bookings: admin_bookings_schema(),
            admin_users: admin_users_schema(),
            guest_rooms: guest_rooms_schema(),
            guest_bookings: guest_bookings_schema(),
        }
    }
}

/// The main entry point of the dashboard
///
/// Call [`Dashboard::restore`] once before navigating; until then every
/// protected page resolves to [`GuardDecision::Pending`].
pub struct Dashboard {
    session: SessionManager,
    guard: RouteGuard,
    catalog: RwLock<Catalog>,
    schemas: Schemas,
}

impl Dashboard {
    /// Create a dashboard with the store and backend selected by `options`
    pub fn new(options: &DashboardOptions, catalog: Catalog) -> Result<Self, Error> {
        let store = options.store();
        let backend = options.backend()?;
        Ok(Self::with_parts(store, backend, options, catalog))
    }

    /// Create a dashboard over an explicit store and backend
    pub fn with_parts(
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn AuthenticationBackend>,
        options: &DashboardOptions,
        catalog: Catalog,
    ) -> Self {
        Self {
            session: SessionManager::new(store, backend, options.auth.clone()),
            guard: options.route_guard(),
            catalog: RwLock::new(catalog),
            schemas: Schemas::new(),
        }
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session
    }

    pub fn guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn session(&self) -> Session {
        self.session.session()
    }

    /// Load the persisted session
    pub async fn restore(&self) -> Session {
        let session = self.session.restore().await;
        tracing::info!(authenticated = session.is_authenticated(), "session restored");
        session
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, Error> {
        Ok(self.session.login(email, password).await?)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Identity, Error> {
        Ok(self.session.register(username, email, password).await?)
    }

    pub async fn logout(&self) -> Result<(), Error> {
        Ok(self.session.logout().await?)
    }

    /// What opening `path` does for the current session
    pub fn navigate(&self, path: &str) -> GuardDecision {
        let decision = routes::resolve(&self.guard, &self.session.state(), path);
        tracing::debug!(path, ?decision, "navigate");
        decision
    }

    /// Identity allowed to open `route`, or `Forbidden`
    fn require(&self, route: Route) -> Result<Identity, Error> {
        let state = self.session.state();
        match route.resolve(&self.guard, &state) {
            GuardDecision::Render => state
                .identity()
                .cloned()
                .ok_or_else(|| Error::forbidden(format!("{} requires a signed-in user", route))),
            GuardDecision::Pending => Err(Error::forbidden("the session has not been restored yet")),
            GuardDecision::Redirect(target) => Err(Error::forbidden(format!(
                "{} is not available to this session (redirects to {})",
                route, target
            ))),
        }
    }

    fn read_catalog(&self) -> std::sync::RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_catalog(&self) -> std::sync::RwLockWriteGuard<'_, Catalog> {
        self.catalog.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the whole catalog
    pub fn catalog(&self) -> Catalog {
        self.read_catalog().clone()
    }

    /// Apply an admin edit to the catalog
    pub fn edit_catalog<R, F>(&self, edit: F) -> Result<R, Error>
    where
        F: FnOnce(&mut Catalog) -> Result<R, Error>,
    {
        self.require(Route::AdminHome)?;
        let mut catalog = self.write_catalog();
        edit(&mut catalog)
    }

    /// Query state a view opens with
    pub fn default_state(&self, view: View) -> QueryState {
        match view {
            View::AdminHotels => self.schemas.admin_hotels.default_state(),
            View::AdminRooms => self.schemas.admin_rooms.default_state(),
            View::AdminBookings => self.schemas.admin_bookings.default_state(),
            View::AdminUsers => self.schemas.admin_users.default_state(),
            View::GuestRooms => self.schemas.guest_rooms.default_state(),
            View::GuestBookings => self.schemas.guest_bookings.default_state(),
        }
    }

    /// Select a sort key of `view`: the current key flips direction, another
    /// key starts in the direction the view declares for it
    pub fn sort_by(&self, view: View, state: &mut QueryState, key: &str) {
        match view {
            View::AdminHotels => self.schemas.admin_hotels.sort_by(state, key),
            View::AdminRooms => self.schemas.admin_rooms.sort_by(state, key),
            View::AdminBookings => self.schemas.admin_bookings.sort_by(state, key),
            View::AdminUsers => self.schemas.admin_users.sort_by(state, key),
            View::GuestRooms => self.schemas.guest_rooms.sort_by(state, key),
            View::GuestBookings => self.schemas.guest_bookings.sort_by(state, key),
        }
    }

    /// Number of filters in `state` that differ from the view's defaults
    pub fn active_filter_count(&self, view: View, state: &QueryState) -> usize {
        match view {
            View::AdminHotels => self.schemas.admin_hotels.active_filter_count(state),
            View::AdminRooms => self.schemas.admin_rooms.active_filter_count(state),
            View::AdminBookings => self.schemas.admin_bookings.active_filter_count(state),
            View::AdminUsers => self.schemas.admin_users.active_filter_count(state),
            View::GuestRooms => self.schemas.guest_rooms.active_filter_count(state),
            View::GuestBookings => self.schemas.guest_bookings.active_filter_count(state),
        }
    }

    /// Values a multi-select filter of `view` can take
    pub fn filter_options(&self, view: View, category: &str) -> Result<Vec<String>, Error> {
        let identity = self.require(view.route())?;
        let catalog = self.read_catalog();
        let options = match view {
            View::AdminHotels => self.schemas.admin_hotels.options(catalog.hotels.all(), category),
            View::AdminRooms => self.schemas.admin_rooms.options(catalog.rooms.all(), category),
            View::AdminBookings => self.schemas.admin_bookings.options(catalog.bookings.all(), category),
            View::AdminUsers => self.schemas.admin_users.options(catalog.users.all(), category),
            View::GuestRooms => self.schemas.guest_rooms.options(catalog.rooms.all(), category),
            View::GuestBookings => {
                let own = visible_bookings(&identity, &catalog);
                self.schemas.guest_bookings.options(&own, category)
            }
        };
        Ok(options?)
    }

    pub fn admin_hotels(&self, state: &QueryState) -> Result<Listing<Hotel>, Error> {
        self.require(Route::AdminHotels)?;
        let catalog = self.read_catalog();
        Ok(listing(&self.schemas.admin_hotels, catalog.hotels.all(), state))
    }

    pub fn admin_rooms(&self, state: &QueryState) -> Result<Listing<Room>, Error> {
        self.require(Route::AdminRooms)?;
        let catalog = self.read_catalog();
        Ok(listing(&self.schemas.admin_rooms, catalog.rooms.all(), state))
    }

    pub fn admin_bookings(&self, state: &QueryState) -> Result<Listing<Booking>, Error> {
        self.require(Route::AdminBookings)?;
        let catalog = self.read_catalog();
        Ok(listing(&self.schemas.admin_bookings, catalog.bookings.all(), state))
    }

    pub fn admin_users(&self, state: &QueryState) -> Result<Listing<UserAccount>, Error> {
        self.require(Route::AdminUsers)?;
        let catalog = self.read_catalog();
        Ok(listing(&self.schemas.admin_users, catalog.users.all(), state))
    }

    pub fn guest_rooms(&self, state: &QueryState) -> Result<Listing<Room>, Error> {
        self.require(Route::UserRooms)?;
        let catalog = self.read_catalog();
        Ok(listing(&self.schemas.guest_rooms, catalog.rooms.all(), state))
    }

    /// Bookings of the signed-in guest; admins see every booking
    pub fn guest_bookings(&self, state: &QueryState) -> Result<Listing<Booking>, Error> {
        let identity = self.require(Route::UserBookings)?;
        let catalog = self.read_catalog();
        let own = visible_bookings(&identity, &catalog);
        Ok(listing(&self.schemas.guest_bookings, &own, state))
    }

    /// Rows of any view as JSON values
    pub fn list_json(&self, view: View, state: &QueryState) -> Result<Vec<serde_json::Value>, Error> {
        match view {
            View::AdminHotels => to_json_rows(self.admin_hotels(state)?),
            View::AdminRooms => to_json_rows(self.admin_rooms(state)?),
            View::AdminBookings => to_json_rows(self.admin_bookings(state)?),
            View::AdminUsers => to_json_rows(self.admin_users(state)?),
            View::GuestRooms => to_json_rows(self.guest_rooms(state)?),
            View::GuestBookings => to_json_rows(self.guest_bookings(state)?),
        }
    }

    /// Book a room for the signed-in user
    pub fn create_booking(&self, request: &BookingRequest) -> Result<Booking, Error> {
        let identity = self.require(Route::UserBook)?;
        let mut catalog = self.write_catalog();
        catalog.create_booking(&identity.username, &identity.email, request, today())
    }

    /// Cancel a booking; guests may only cancel their own
    pub fn cancel_booking(&self, id: u64) -> Result<Booking, Error> {
        let identity = self.require(Route::UserBookings)?;
        let mut catalog = self.write_catalog();
        if identity.role != Role::Admin {
            let owned = catalog
                .bookings
                .get(id)
                .map_or(false, |booking| booking.belongs_to(&identity.email));
            if !owned {
                return Err(Error::not_found(format!("booking {}", id)));
            }
        }
        catalog.cancel_booking(id, today())
    }

    /// Set any booking's status
    pub fn update_booking_status(&self, id: u64, status: BookingStatus) -> Result<Booking, Error> {
        self.require(Route::AdminBookings)?;
        let mut catalog = self.write_catalog();
        catalog.update_booking_status(id, status, today())
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn visible_bookings(identity: &Identity, catalog: &Catalog) -> Vec<Booking> {
    match identity.role {
        Role::Admin => catalog.bookings.all().to_vec(),
        Role::User => catalog
            .bookings
            .all()
            .iter()
            .filter(|booking| booking.belongs_to(&identity.email))
            .cloned()
            .collect(),
    }
}

fn listing<T: Clone>(schema: &ViewSchema<T>, source: &[T], state: &QueryState) -> Listing<T> {
    let projection = schema.project(source, state);
    Listing {
        rows: projection.cloned(),
        total: projection.source_len(),
        outcome: projection.outcome(),
    }
}

fn to_json_rows<T: Serialize>(listing: Listing<T>) -> Result<Vec<serde_json::Value>, Error> {
    listing
        .rows
        .iter()
        .map(|row| serde_json::to_value(row).map_err(Error::from))
        .collect()
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{GuardDecision, Identity, Role, Session};
    pub use crate::catalog::{Booking, BookingRequest, BookingStatus, Catalog, Hotel, Room, UserAccount};
    pub use crate::config::DashboardOptions;
    pub use crate::error::Error;
    pub use crate::query::{QueryState, SortOrder, SortSpec};
    pub use crate::routes::{Route, View};
    pub use crate::{Dashboard, Listing};
}
