use hotel_dashboard::auth::{KeyValueStore, MemoryStore};
use hotel_dashboard::prelude::*;
use hotel_dashboard::query::Outcome;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dashboard() -> Dashboard {
    let options = DashboardOptions::default();
    Dashboard::new(&options, Catalog::sample().unwrap()).unwrap()
}

fn dashboard_over(store: Arc<dyn KeyValueStore>) -> Dashboard {
    let options = DashboardOptions::default();
    let backend = Arc::new(options.auth.mock_backend());
    Dashboard::with_parts(store, backend, &options, Catalog::sample().unwrap())
}

/// 復元前はすべてのページが保留になる
#[tokio::test]
async fn test_navigation_waits_for_restore() {
    let dashboard = dashboard();
    assert_eq!(dashboard.navigate("/admin"), GuardDecision::Pending);
    assert_eq!(dashboard.navigate("/user/rooms"), GuardDecision::Pending);
    assert!(matches!(
        dashboard.guest_rooms(&dashboard.default_state(View::GuestRooms)),
        Err(Error::Forbidden(_))
    ));

    dashboard.restore().await;
    assert_eq!(
        dashboard.navigate("/admin").redirect_target(),
        Some("/login")
    );
    assert!(dashboard.navigate("/login").is_render());
}

/// ロールごとのリダイレクト
#[tokio::test]
async fn test_role_redirects() {
    let dashboard = dashboard();
    dashboard.restore().await;

    dashboard.login("guest@x.com", "pw").await.unwrap();
    assert!(dashboard.navigate("/user/bookings").is_render());
    assert_eq!(dashboard.navigate("/admin/hotels").redirect_target(), Some("/user"));
    assert_eq!(dashboard.navigate("/login").redirect_target(), Some("/user"));
    assert_eq!(dashboard.navigate("/").redirect_target(), Some("/user"));

    dashboard.logout().await.unwrap();
    dashboard.login("boss.admin@x.com", "pw").await.unwrap();
    assert!(dashboard.navigate("/admin/hotels").is_render());
    assert!(dashboard.navigate("/user/rooms").is_render());
    assert_eq!(dashboard.navigate("/register").redirect_target(), Some("/admin"));
    assert_eq!(dashboard.navigate("/missing").redirect_target(), Some("/"));
}

#[tokio::test]
async fn test_admin_lists_are_forbidden_to_guests() {
    let dashboard = dashboard();
    dashboard.restore().await;
    dashboard.login("guest@x.com", "pw").await.unwrap();

    let state = dashboard.default_state(View::AdminHotels);
    assert!(matches!(dashboard.admin_hotels(&state), Err(Error::Forbidden(_))));
    assert!(matches!(
        dashboard.edit_catalog(|catalog| Ok(catalog.hotels.len())),
        Err(Error::Forbidden(_))
    ));

    let rooms = dashboard
        .guest_rooms(&dashboard.default_state(View::GuestRooms))
        .unwrap();
    assert_eq!(rooms.len(), 6);
    assert_eq!(rooms.rows[0].name, "Luxury Penthouse");
}

#[tokio::test]
async fn test_admin_room_filters() {
    let dashboard = dashboard();
    dashboard.restore().await;
    dashboard.login("admin@example.com", "pw").await.unwrap();

    let mut state = dashboard.default_state(View::AdminRooms);
    state.set_range("price", 100.0, 300.0).unwrap();
    state.toggle("status", "Available").unwrap();
    assert_eq!(dashboard.active_filter_count(View::AdminRooms, &state), 2);

    let listing = dashboard.admin_rooms(&state).unwrap();
    let names: Vec<_> = listing.rows.iter().map(|room| room.name.as_str()).collect();
    assert_eq!(names, vec!["Deluxe King Room", "Family Suite"]);
    assert_eq!(listing.total, 6);

    state.toggle("type", "Penthouse").unwrap();
    let listing = dashboard.admin_rooms(&state).unwrap();
    assert_eq!(listing.outcome, Outcome::NoMatches);

    assert_eq!(
        dashboard.filter_options(View::AdminRooms, "type").unwrap(),
        vec!["Deluxe", "Penthouse", "Standard", "Suite"]
    );
}

/// ゲストは自分の予約だけを見る
#[tokio::test]
async fn test_guest_bookings_are_scoped_to_the_guest() {
    let dashboard = dashboard();
    dashboard.restore().await;

    dashboard.login("john.doe@example.com", "pw").await.unwrap();
    let state = dashboard.default_state(View::GuestBookings);
    let own = dashboard.guest_bookings(&state).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own.rows[0].id, 1);

    assert!(matches!(dashboard.cancel_booking(2), Err(Error::NotFound(_))));

    dashboard.logout().await.unwrap();
    dashboard.login("admin@example.com", "pw").await.unwrap();
    let everything = dashboard.guest_bookings(&state).unwrap();
    assert_eq!(everything.len(), 6);
}

#[tokio::test]
async fn test_booking_flow() {
    let dashboard = dashboard();
    dashboard.restore().await;

    let request = BookingRequest::new(
        4,
        "2025-08-01".parse().unwrap(),
        "2025-08-05".parse().unwrap(),
    )
    .with_guests(4)
    .with_special_requests("Crib in the room");
    assert!(matches!(dashboard.create_booking(&request), Err(Error::Forbidden(_))));

    let identity = dashboard.login("sam@example.com", "pw").await.unwrap();
    let booking = dashboard.create_booking(&request).unwrap();
    assert_eq!(booking.total_price, 299.0 * 4.0);
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.email, identity.email);
    assert_eq!(booking.hotel, "Beachfront Resort");
    assert_eq!(booking.special_requests, "Crib in the room");

    let mine = dashboard
        .guest_bookings(&dashboard.default_state(View::GuestBookings))
        .unwrap();
    assert_eq!(mine.rows, vec![booking.clone()]);

    let cancelled = dashboard.cancel_booking(booking.id).unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert!(cancelled.cancellation_date.is_some());
    assert!(matches!(dashboard.cancel_booking(booking.id), Err(Error::Validation(_))));

    assert!(matches!(
        dashboard.update_booking_status(booking.id, BookingStatus::Confirmed),
        Err(Error::Forbidden(_))
    ));
}

#[tokio::test]
async fn test_admin_edits_catalog() {
    let dashboard = dashboard();
    dashboard.restore().await;
    dashboard.login("admin@example.com", "pw").await.unwrap();

    let id = dashboard
        .edit_catalog(|catalog| catalog.hotels.insert(Hotel::new("Harbor House", "Boston, MA")))
        .unwrap();
    assert_eq!(id, 7);

    let mut state = dashboard.default_state(View::AdminHotels);
    state.toggle("location", "MA").unwrap();
    let listing = dashboard.admin_hotels(&state).unwrap();
    assert_eq!(listing.rows[0].name, "Harbor House");

    let room_id = dashboard
        .edit_catalog(|catalog| {
            let room = Room::new("Garden Loft", "Harbor House", "Suite", 249.0, 3)
                .with_amenities(&["Wi-Fi", "Kitchen", "Garden View"]);
            catalog.rooms.insert(room)
        })
        .unwrap();
    assert_eq!(room_id, 7);

    let mut rooms = dashboard.default_state(View::GuestRooms);
    rooms.toggle("amenities", "Garden View").unwrap();
    rooms.toggle("amenities", "Kitchen").unwrap();
    let listing = dashboard.guest_rooms(&rooms).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing.rows[0].name, "Garden Loft");

    let updated = dashboard
        .update_booking_status(3, BookingStatus::Confirmed)
        .unwrap();
    assert_eq!(updated.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_admin_booking_sort_keys() {
    let dashboard = dashboard();
    dashboard.restore().await;
    dashboard.login("admin@example.com", "pw").await.unwrap();

    let mut state = dashboard.default_state(View::AdminBookings);
    dashboard.sort_by(View::AdminBookings, &mut state, "checkIn");
    assert_eq!(state.sort, SortSpec::ascending("checkIn"));
    let ids: Vec<u64> = dashboard
        .admin_bookings(&state)
        .unwrap()
        .rows
        .iter()
        .map(|booking| booking.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    dashboard.sort_by(View::AdminBookings, &mut state, "bookingDate");
    assert_eq!(state.sort, SortSpec::descending("bookingDate"));
    let newest = dashboard.admin_bookings(&state).unwrap();
    assert_eq!(newest.rows[0].id, 6);
}

#[tokio::test]
async fn test_list_json_rows() {
    let dashboard = dashboard();
    dashboard.restore().await;
    dashboard.login("admin@example.com", "pw").await.unwrap();

    let mut state = dashboard.default_state(View::AdminUsers);
    state.toggle("status", "Inactive").unwrap();
    let rows = dashboard.list_json(View::AdminUsers, &state).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], "robertj");
    assert_eq!(rows[0]["registrationDate"], "2025-03-05");
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let options = DashboardOptions::default().with_store_path(dir.path().join("session.json"));

    let first = Dashboard::new(&options, Catalog::sample().unwrap()).unwrap();
    first.restore().await;
    let identity = first.login("boss.admin@x.com", "pw").await.unwrap();

    let second = Dashboard::new(&options, Catalog::sample().unwrap()).unwrap();
    let restored = second.restore().await;
    assert_eq!(restored.identity, Some(identity));
    assert!(second.navigate("/admin/users").is_render());
}

#[tokio::test]
async fn test_failed_login_keeps_anonymous_session() {
    let store = Arc::new(MemoryStore::new());
    let dashboard = dashboard_over(store.clone());
    dashboard.restore().await;

    assert!(matches!(
        dashboard.login("not-an-email", "pw").await,
        Err(Error::Auth(_))
    ));
    assert!(!dashboard.session().is_authenticated());
    assert!(store.is_empty());
}

/// HTTPバックエンド経由のログイン
#[tokio::test]
async fn test_http_backend_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "server-token",
            "user": {
                "id": "42",
                "username": "hotelier",
                "email": "hotelier@example.com",
                "role": "ADMIN"
            }
        })))
        .mount(&mock_server)
        .await;

    let options = DashboardOptions::default()
        .with_auth_url(&mock_server.uri())
        .unwrap();
    let dashboard = Dashboard::new(&options, Catalog::sample().unwrap()).unwrap();
    dashboard.restore().await;

    let identity = dashboard.login("hotelier@example.com", "secret").await.unwrap();
    assert_eq!(identity.role, Role::Admin);
    assert_eq!(dashboard.session().auth_token.as_deref(), Some("server-token"));
    assert!(dashboard.navigate("/admin/bookings").is_render());
}
