use super::Record;
use hotel_dashboard_query::{SortOrder, ViewSchema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// ホテル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    /// `"City, ST"`
    pub location: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub rooms: u32,
    #[serde(default)]
    pub image: String,
}

impl Hotel {
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            location: location.to_string(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            rating: 5.0,
            rooms: 0,
            image: String::new(),
        }
    }

    /// Text after the first comma of the location, e.g. `"NY"` for `"New York, NY"`
    pub fn state(&self) -> &str {
        match self.location.split_once(',') {
            Some((_, rest)) => rest.split(',').next().unwrap_or_default().trim(),
            None => "",
        }
    }
}

impl Record for Hotel {
    const KIND: &'static str = "hotel";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

fn name(hotel: &Hotel) -> Cow<'_, str> {
    Cow::Borrowed(&hotel.name)
}

fn location(hotel: &Hotel) -> Cow<'_, str> {
    Cow::Borrowed(&hotel.location)
}

fn state(hotel: &Hotel) -> Cow<'_, str> {
    Cow::Borrowed(hotel.state())
}

fn email(hotel: &Hotel) -> Cow<'_, str> {
    Cow::Borrowed(&hotel.email)
}

fn phone(hotel: &Hotel) -> Cow<'_, str> {
    Cow::Borrowed(&hotel.phone)
}

fn rating(hotel: &Hotel) -> f64 {
    hotel.rating
}

fn rooms(hotel: &Hotel) -> f64 {
    f64::from(hotel.rooms)
}

/// Admin hotel list
pub fn admin_hotels_schema() -> ViewSchema<Hotel> {
    ViewSchema::new("admin hotels")
        .search(name)
        .search(location)
        .search(email)
        .search(phone)
        .any_of("location", state)
        .range("rating", 0.0, 5.0, rating)
        .range("rooms", 0.0, 50.0, rooms)
        .sort_text("name", name)
        .sort_text("location", location)
        .sort_number("rating", rating)
        .sort_number("rooms", rooms)
        .default_sort("name", SortOrder::Ascending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_state() {
        assert_eq!(Hotel::new("a", "New York, NY").state(), "NY");
        assert_eq!(Hotel::new("a", "Paris").state(), "");
        assert_eq!(Hotel::new("a", "Austin, TX, USA").state(), "TX");
    }

    #[test]
    fn test_location_filter_uses_state() {
        let catalog = Catalog::sample().unwrap();
        let schema = admin_hotels_schema();
        let hotels = catalog.hotels.all();

        assert_eq!(
            schema.options(hotels, "location").unwrap(),
            vec!["CA", "CO", "FL", "IL", "NY"]
        );

        let mut query = schema.default_state();
        query.toggle("location", "CA").unwrap();
        let names: Vec<_> = schema
            .project(hotels, &query)
            .iter()
            .map(|hotel| hotel.name.as_str())
            .collect();
        assert_eq!(names, vec!["Seaside Inn", "Skyline Hotel"]);
    }

    #[test]
    fn test_rating_sort_toggles() {
        let catalog = Catalog::sample().unwrap();
        let schema = admin_hotels_schema();
        let mut query = schema.default_state();
        schema.sort_by(&mut query, "rating");
        schema.sort_by(&mut query, "rating");

        let projection = schema.project(catalog.hotels.all(), &query);
        assert_eq!(projection.rows()[0].name, "Luxury Resort");
        assert_eq!(projection.rows()[5].name, "Seaside Inn");
    }
}
