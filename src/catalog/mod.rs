//! Domain records shown by the dashboard and the views over them

mod bookings;
mod hotels;
mod rooms;
mod users;

pub use bookings::*;
pub use hotels::*;
pub use rooms::*;
pub use users::*;

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::Path;

const SAMPLE_CATALOG: &str = include_str!("../../data/catalog.json");

/// A catalog record with a numeric id
pub trait Record: Clone {
    /// Collection name used in messages
    const KIND: &'static str;

    fn id(&self) -> u64;

    fn set_id(&mut self, id: u64);
}

/// Ordered records of one kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn all(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Id the next inserted record receives: one past the largest id, or 1.
    /// Fails once the largest id is `u64::MAX`.
    pub fn next_id(&self) -> Result<u64, Error> {
        match self.items.iter().map(Record::id).max() {
            None => Ok(1),
            Some(max) => max
                .checked_add(1)
                .ok_or_else(|| Error::validation(format!("no {} id left after {}", T::KIND, max))),
        }
    }

    /// Append `item` under a fresh id and return that id
    pub fn insert(&mut self, mut item: T) -> Result<u64, Error> {
        let id = self.next_id()?;
        item.set_id(id);
        self.items.push(item);
        Ok(id)
    }

    /// Edit one record in place
    pub fn update<F>(&mut self, id: u64, edit: F) -> Result<&T, Error>
    where
        F: FnOnce(&mut T),
    {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Error::not_found(format!("{} {}", T::KIND, id)))?;
        edit(&mut *item);
        item.set_id(id);
        Ok(item)
    }

    pub fn remove(&mut self, id: u64) -> Result<T, Error> {
        let index = self
            .items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| Error::not_found(format!("{} {}", T::KIND, id)))?;
        Ok(self.items.remove(index))
    }
}

/// Every record the dashboard works on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub hotels: Collection<Hotel>,
    #[serde(default)]
    pub rooms: Collection<Room>,
    #[serde(default)]
    pub bookings: Collection<Booking>,
    #[serde(default)]
    pub users: Collection<UserAccount>,
}

impl Catalog {
    /// The bundled demo data set
    pub fn sample() -> Result<Self, Error> {
        Self::from_json(SAMPLE_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        let catalog = Self::from_json(&json)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            hotels = catalog.hotels.len(),
            rooms = catalog.rooms.len(),
            bookings = catalog.bookings.len(),
            users = catalog.users.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        tokio::fs::write(path.as_ref(), self.to_json()?).await?;
        Ok(())
    }
}
