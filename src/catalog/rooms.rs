use super::Record;
use hotel_dashboard_query::{SortField, SortOrder, ViewSchema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 部屋の状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomStatus {
    #[default]
    Available,
    Booked,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "Available",
            RoomStatus::Booked => "Booked",
            RoomStatus::Maintenance => "Maintenance",
        }
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 部屋
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    pub hotel: String,
    #[serde(rename = "type")]
    pub room_type: String,
    /// Nightly rate
    pub price: f64,
    pub capacity: u32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub status: RoomStatus,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub description: String,
}

impl Room {
    pub fn new(name: &str, hotel: &str, room_type: &str, price: f64, capacity: u32) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            hotel: hotel.to_string(),
            room_type: room_type.to_string(),
            price,
            capacity,
            amenities: Vec::new(),
            status: RoomStatus::Available,
            rating: 0.0,
            description: String::new(),
        }
    }

    pub fn with_amenities(mut self, amenities: &[&str]) -> Self {
        self.amenities = amenities.iter().map(|amenity| amenity.to_string()).collect();
        self
    }
}

impl Record for Room {
    const KIND: &'static str = "room";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

fn name(room: &Room) -> Cow<'_, str> {
    Cow::Borrowed(&room.name)
}

fn hotel(room: &Room) -> Cow<'_, str> {
    Cow::Borrowed(&room.hotel)
}

fn room_type(room: &Room) -> Cow<'_, str> {
    Cow::Borrowed(&room.room_type)
}

fn description(room: &Room) -> Cow<'_, str> {
    Cow::Borrowed(&room.description)
}

fn status(room: &Room) -> Cow<'_, str> {
    Cow::Borrowed(room.status.as_str())
}

fn capacity_label(room: &Room) -> Cow<'_, str> {
    Cow::Owned(room.capacity.to_string())
}

fn amenities(room: &Room) -> &[String] {
    &room.amenities
}

fn price(room: &Room) -> f64 {
    room.price
}

fn capacity(room: &Room) -> f64 {
    f64::from(room.capacity)
}

fn rating(room: &Room) -> f64 {
    room.rating
}

/// Admin room list
pub fn admin_rooms_schema() -> ViewSchema<Room> {
    ViewSchema::new("admin rooms")
        .search(name)
        .search(hotel)
        .search(room_type)
        .range("price", 0.0, 1000.0, price)
        .any_of("type", room_type)
        .any_of("hotel", hotel)
        .at_least("capacity", capacity)
        .all_of("amenities", amenities)
        .any_of("status", status)
        .sort_text("name", name)
        .sort_number("price", price)
        .sort_text("hotel", hotel)
        .sort_number("capacity", capacity)
        .sort_number("rating", rating)
        .default_sort("name", SortOrder::Ascending)
}

/// Guest room browser
///
/// Ratings list best first in the ascending direction; "recommended" is
/// best rated first, cheapest first among equals.
pub fn guest_rooms_schema() -> ViewSchema<Room> {
    ViewSchema::new("guest rooms")
        .search(name)
        .search(hotel)
        .search(description)
        .search(room_type)
        .range("price", 0.0, 500.0, price)
        .any_of("hotels", hotel)
        .all_of("amenities", amenities)
        .any_of("capacity", capacity_label)
        .any_of("type", room_type)
        .at_least("rating", rating)
        .sort_chain(
            "recommended",
            vec![
                (SortField::Number(rating), SortOrder::Descending),
                (SortField::Number(price), SortOrder::Ascending),
            ],
        )
        .sort_number("price", price)
        .sort_chain(
            "rating",
            vec![(SortField::Number(rating), SortOrder::Descending)],
        )
        .sort_text("name", name)
        .default_sort("recommended", SortOrder::Ascending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn names<'a>(rows: impl Iterator<Item = &'a Room>) -> Vec<&'a str> {
        rows.map(|room| room.name.as_str()).collect()
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&RoomStatus::Maintenance).unwrap();
        assert_eq!(json, "\"Maintenance\"");
    }

    #[test]
    fn test_admin_price_and_status() {
        let catalog = Catalog::sample().unwrap();
        let schema = admin_rooms_schema();
        let mut query = schema.default_state();
        query.set_range("price", 100.0, 300.0).unwrap();
        query.toggle("status", "Available").unwrap();

        let projection = schema.project(catalog.rooms.all(), &query);
        assert_eq!(
            names(projection.iter()),
            vec!["Deluxe King Room", "Family Suite"]
        );
    }

    #[test]
    fn test_guest_capacity_options_are_numeric() {
        let catalog = Catalog::sample().unwrap();
        let schema = guest_rooms_schema();
        assert_eq!(
            schema.options(catalog.rooms.all(), "capacity").unwrap(),
            vec!["1", "2", "4", "6"]
        );
    }

    #[test]
    fn test_guest_rating_threshold_and_default_order() {
        let catalog = Catalog::sample().unwrap();
        let schema = guest_rooms_schema();
        let mut query = schema.default_state();
        query.set_at_least("rating", Some(4.5)).unwrap();

        let projection = schema.project(catalog.rooms.all(), &query);
        assert_eq!(
            names(projection.iter()),
            vec![
                "Luxury Penthouse",
                "Executive Suite",
                "Family Suite",
                "Deluxe King Room"
            ]
        );
    }
}
