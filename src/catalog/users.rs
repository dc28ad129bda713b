use super::{Catalog, Record};
use crate::error::Error;
use chrono::NaiveDate;
use hotel_dashboard_auth::Role;
use hotel_dashboard_query::{SortOrder, ViewSchema};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// アカウントの状態
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountStatus {
    #[default]
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "Active",
            AccountStatus::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account record managed from the admin user list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(default)]
    pub id: u64,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    pub registration_date: NaiveDate,
    pub last_login: NaiveDate,
    #[serde(default)]
    pub bookings_count: u32,
    #[serde(default)]
    pub avatar: String,
}

impl Record for UserAccount {
    const KIND: &'static str = "user";

    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Fields an admin fills in when adding an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccount {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
}

impl NewAccount {
    pub fn new(username: &str, name: &str, email: &str) -> Self {
        Self {
            username: username.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::User,
            status: AccountStatus::Active,
        }
    }

    pub fn with_role(mut self, value: Role) -> Self {
        self.role = value;
        self
    }

    pub fn with_status(mut self, value: AccountStatus) -> Self {
        self.status = value;
        self
    }
}

impl Catalog {
    /// Add an account registered and last seen `today`, with no bookings
    pub fn create_account(&mut self, account: NewAccount, today: NaiveDate) -> Result<UserAccount, Error> {
        if account.username.trim().is_empty() || account.email.trim().is_empty() {
            return Err(Error::validation("username and email are required"));
        }
        let taken = self
            .users
            .all()
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(account.email.trim()));
        if taken {
            return Err(Error::validation(format!("{} already has an account", account.email)));
        }

        let mut user = UserAccount {
            id: 0,
            username: account.username.trim().to_string(),
            name: account.name.trim().to_string(),
            email: account.email.trim().to_string(),
            role: account.role,
            status: account.status,
            registration_date: today,
            last_login: today,
            bookings_count: 0,
            avatar: String::new(),
        };
        user.id = self.users.insert(user.clone())?;
        tracing::info!(user = user.id, role = %user.role, "created account");
        Ok(user)
    }
}

fn username(user: &UserAccount) -> Cow<'_, str> {
    Cow::Borrowed(&user.username)
}

fn name(user: &UserAccount) -> Cow<'_, str> {
    Cow::Borrowed(&user.name)
}

fn email(user: &UserAccount) -> Cow<'_, str> {
    Cow::Borrowed(&user.email)
}

fn role(user: &UserAccount) -> Cow<'_, str> {
    Cow::Borrowed(user.role.as_str())
}

fn status(user: &UserAccount) -> Cow<'_, str> {
    Cow::Borrowed(user.status.as_str())
}

fn bookings_count(user: &UserAccount) -> f64 {
    f64::from(user.bookings_count)
}

fn registration_date(user: &UserAccount) -> NaiveDate {
    user.registration_date
}

fn last_login(user: &UserAccount) -> NaiveDate {
    user.last_login
}

/// Admin user list
pub fn admin_users_schema() -> ViewSchema<UserAccount> {
    ViewSchema::new("admin users")
        .search(username)
        .search(name)
        .search(email)
        .any_of("role", role)
        .any_of("status", status)
        .date_range("registered", registration_date, registration_date)
        .range("bookings", 0.0, 10.0, bookings_count)
        .sort_text("username", username)
        .sort_text("name", name)
        .sort_text("email", email)
        .sort_text("role", role)
        .sort_text("status", status)
        .sort_number("bookingsCount", bookings_count)
        .sort_date("lastLogin", last_login)
        .sort_date("registrationDate", registration_date)
        .default_sort("registrationDate", SortOrder::Descending)
}
