use super::{Catalog, Record};
use crate::error::Error;
use chrono::NaiveDate;
use hotel_dashboard_query::{SortOrder, ViewSchema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// 予約の状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    #[default]
    Pending,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Pending => "Pending",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(BookingStatus::Confirmed),
            "pending" => Ok(BookingStatus::Pending),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(Error::validation(format!("unknown booking status: {}", other))),
        }
    }
}

/// 予約
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(default)]
    pub id: u64,
    pub guest: String,
    pub email: String,
    pub hotel: String,
    pub room_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub total_price: f64,
    pub status: BookingStatus,
    pub booking_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_date: Option<NaiveDate>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub special_requests: String,
}

impl Booking {
    pub fn nights(&self) -> i64 {
        nights_between(self.check_in, self.check_out)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Whether the booking was made with `email`, ignoring case
    pub fn belongs_to(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim())
    }
}

impl Record for Booking {
    const KIND: &'static str = "booking";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Whole days from check-in to check-out
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days()
}

/// A guest's request to book one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub room_id: u64,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub special_requests: String,
}

impl BookingRequest {
    pub fn new(room_id: u64, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        Self {
            room_id,
            check_in,
            check_out,
            guests: 1,
            payment_method: "Credit Card".to_string(),
            special_requests: String::new(),
        }
    }

    pub fn with_guests(mut self, value: u32) -> Self {
        self.guests = value;
        self
    }

    pub fn with_payment_method(mut self, value: &str) -> Self {
        self.payment_method = value.to_string();
        self
    }

    pub fn with_special_requests(mut self, value: &str) -> Self {
        self.special_requests = value.to_string();
        self
    }
}

impl Catalog {
    /// Book a room for `guest`. The new booking is `Pending`, dated `today`
    /// and priced at the nightly rate times the number of nights.
    pub fn create_booking(
        &mut self,
        guest: &str,
        email: &str,
        request: &BookingRequest,
        today: NaiveDate,
    ) -> Result<Booking, Error> {
        let room = self
            .rooms
            .get(request.room_id)
            .ok_or_else(|| Error::not_found(format!("room {}", request.room_id)))?;

        let nights = nights_between(request.check_in, request.check_out);
        if nights < 1 {
            return Err(Error::validation("check-out must be at least one night after check-in"));
        }
        if request.guests == 0 {
            return Err(Error::validation("at least one guest is required"));
        }
        if request.guests > room.capacity {
            return Err(Error::validation(format!(
                "{} sleeps at most {} guests",
                room.name, room.capacity
            )));
        }

        let mut booking = Booking {
            id: 0,
            guest: guest.to_string(),
            email: email.to_string(),
            hotel: room.hotel.clone(),
            room_type: room.name.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guests,
            total_price: room.price * nights as f64,
            status: BookingStatus::Pending,
            booking_date: today,
            cancellation_date: None,
            payment_method: request.payment_method.clone(),
            special_requests: request.special_requests.clone(),
        };
        booking.id = self.bookings.insert(booking.clone())?;

        tracing::info!(
            booking = booking.id,
            room = request.room_id,
            nights,
            total = booking.total_price,
            "created booking"
        );
        Ok(booking)
    }

    /// Change a booking's status. Cancelling stamps the cancellation date.
    pub fn update_booking_status(
        &mut self,
        id: u64,
        status: BookingStatus,
        today: NaiveDate,
    ) -> Result<Booking, Error> {
        let booking = self.bookings.update(id, |booking| {
            booking.status = status;
            booking.cancellation_date = match status {
                BookingStatus::Cancelled => Some(today),
                _ => None,
            };
        })?;
        tracing::info!(booking = id, status = %status, "updated booking status");
        Ok(booking.clone())
    }

    /// Cancel a booking that is not already cancelled
    pub fn cancel_booking(&mut self, id: u64, today: NaiveDate) -> Result<Booking, Error> {
        let booking = self
            .bookings
            .get(id)
            .ok_or_else(|| Error::not_found(format!("booking {}", id)))?;
        if booking.is_cancelled() {
            return Err(Error::validation(format!("booking {} is already cancelled", id)));
        }
        self.update_booking_status(id, BookingStatus::Cancelled, today)
    }
}

fn guest(booking: &Booking) -> Cow<'_, str> {
    Cow::Borrowed(&booking.guest)
}

fn email(booking: &Booking) -> Cow<'_, str> {
    Cow::Borrowed(&booking.email)
}

fn hotel(booking: &Booking) -> Cow<'_, str> {
    Cow::Borrowed(&booking.hotel)
}

fn room_type(booking: &Booking) -> Cow<'_, str> {
    Cow::Borrowed(&booking.room_type)
}

fn status(booking: &Booking) -> Cow<'_, str> {
    Cow::Borrowed(booking.status.as_str())
}

fn payment_method(booking: &Booking) -> Cow<'_, str> {
    Cow::Borrowed(&booking.payment_method)
}

fn total_price(booking: &Booking) -> f64 {
    booking.total_price
}

fn check_in(booking: &Booking) -> NaiveDate {
    booking.check_in
}

fn check_out(booking: &Booking) -> NaiveDate {
    booking.check_out
}

fn booking_date(booking: &Booking) -> NaiveDate {
    booking.booking_date
}

/// Admin booking list
pub fn admin_bookings_schema() -> ViewSchema<Booking> {
    ViewSchema::new("admin bookings")
        .search(guest)
        .search(email)
        .search(hotel)
        .search(room_type)
        .search(status)
        .any_of("status", status)
        .any_of("hotels", hotel)
        .date_range("dates", check_in, check_out)
        .range("price", 0.0, 3000.0, total_price)
        .any_of("paymentMethod", payment_method)
        .sort_date("checkIn", check_in)
        .sort_date("checkOut", check_out)
        .sort_number("price", total_price)
        .sort_text("guest", guest)
        .sort_text("hotel", hotel)
        .sort_date("bookingDate", booking_date)
        .first_order("bookingDate", SortOrder::Descending)
        .default_sort("bookingDate", SortOrder::Descending)
}

/// A guest's own bookings
pub fn guest_bookings_schema() -> ViewSchema<Booking> {
    ViewSchema::new("guest bookings")
        .search(hotel)
        .search(room_type)
        .search(status)
        .any_of("status", status)
        .date_range("dates", check_in, check_out)
        .range("price", 0.0, 3000.0, total_price)
        .sort_date("checkIn", check_in)
        .sort_date("checkOut", check_out)
        .sort_number("totalPrice", total_price)
        .sort_date("bookingDate", booking_date)
        .default_sort("bookingDate", SortOrder::Descending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(text: &str) -> NaiveDate {
        NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_create_booking_prices_nights() {
        let mut catalog = Catalog::sample().unwrap();
        let request = BookingRequest::new(1, date("2025-07-01"), date("2025-07-04")).with_guests(2);

        let booking = catalog
            .create_booking("Jane Guest", "jane@x.com", &request, date("2025-06-01"))
            .unwrap();

        assert_eq!(booking.id, 7);
        assert_eq!(booking.nights(), 3);
        assert_eq!(booking.total_price, 597.0);
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.booking_date, date("2025-06-01"));
        assert_eq!(booking.room_type, "Deluxe King Room");
        assert_eq!(catalog.bookings.get(7), Some(&booking));
    }

    #[test]
    fn test_create_booking_validation() {
        let mut catalog = Catalog::sample().unwrap();
        let today = date("2025-06-01");

        let same_day = BookingRequest::new(1, date("2025-07-01"), date("2025-07-01"));
        assert!(matches!(
            catalog.create_booking("g", "g@x.com", &same_day, today),
            Err(Error::Validation(_))
        ));

        let crowded = BookingRequest::new(5, date("2025-07-01"), date("2025-07-02")).with_guests(3);
        assert!(matches!(
            catalog.create_booking("g", "g@x.com", &crowded, today),
            Err(Error::Validation(_))
        ));

        let missing = BookingRequest::new(404, date("2025-07-01"), date("2025-07-02"));
        assert!(matches!(
            catalog.create_booking("g", "g@x.com", &missing, today),
            Err(Error::NotFound(_))
        ));
        assert_eq!(catalog.bookings.len(), 6);
    }

    #[test]
    fn test_cancel_stamps_date() {
        let mut catalog = Catalog::sample().unwrap();
        let today = date("2025-06-02");

        let cancelled = catalog.cancel_booking(3, today).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.cancellation_date, Some(today));

        assert!(matches!(catalog.cancel_booking(3, today), Err(Error::Validation(_))));
        assert!(matches!(catalog.cancel_booking(99, today), Err(Error::NotFound(_))));

        let restored = catalog
            .update_booking_status(3, BookingStatus::Confirmed, today)
            .unwrap();
        assert_eq!(restored.cancellation_date, None);
    }

    #[test]
    fn test_admin_default_sort_is_newest_first() {
        let catalog = Catalog::sample().unwrap();
        let schema = admin_bookings_schema();
        let projection = schema.project(catalog.bookings.all(), &schema.default_state());
        let ids: Vec<u64> = projection.iter().map(|booking| booking.id).collect();
        assert_eq!(ids, vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_admin_date_window() {
        let catalog = Catalog::sample().unwrap();
        let schema = admin_bookings_schema();
        let mut query = schema.default_state();
        query.set_dates("dates", "2025-06-01", "2025-08-31").unwrap();
        schema.sort_by(&mut query, "checkIn");

        let ids: Vec<u64> = schema
            .project(catalog.bookings.all(), &query)
            .iter()
            .map(|booking| booking.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn test_booking_date_starts_newest_first() {
        let catalog = Catalog::sample().unwrap();
        let schema = admin_bookings_schema();
        let mut query = schema.default_state();

        schema.sort_by(&mut query, "checkIn");
        assert_eq!(query.sort.order, SortOrder::Ascending);

        schema.sort_by(&mut query, "bookingDate");
        assert_eq!(query.sort.order, SortOrder::Descending);
        let ids: Vec<u64> = schema
            .project(catalog.bookings.all(), &query)
            .iter()
            .map(|booking| booking.id)
            .collect();
        assert_eq!(ids, vec![6, 5, 4, 3, 2, 1]);

        schema.sort_by(&mut query, "bookingDate");
        assert_eq!(query.sort.order, SortOrder::Ascending);
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("canceled".parse::<BookingStatus>().unwrap(), BookingStatus::Cancelled);
        assert!("lost".parse::<BookingStatus>().is_err());
    }
}
