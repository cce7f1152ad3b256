//! Register aggregate and its entries.
//!
//! # Responsibility
//! - Define the in-memory shape of one register header and its entries.
//! - Provide per-call constructors so no default value is ever shared.
//!
//! # Invariants
//! - `Register::id` is the primary key of the header row.
//! - An `Entry` belongs to exactly one register; `(name, register id)` is
//!   unique within the store.
//! - `entries` are only materialized on read. Write paths take whatever the
//!   caller supplied.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Primary key of a register header row.
pub type RegisterId = i64;

/// One person's contact record inside a register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Part of the composite key together with the owning register id.
    pub name: String,
    pub surname: String,
    pub phone_number: i64,
    pub street: Option<String>,
    pub house_no: Option<String>,
    pub apartment_no: Option<String>,
    pub city: Option<String>,
}

impl Entry {
    /// Creates an entry without address fields.
    pub fn new(name: impl Into<String>, surname: impl Into<String>, phone_number: i64) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            phone_number,
            street: None,
            house_no: None,
            apartment_no: None,
            city: None,
        }
    }

    /// Sets all address fields at once.
    pub fn with_address(
        mut self,
        street: impl Into<String>,
        house_no: impl Into<String>,
        apartment_no: impl Into<String>,
        city: impl Into<String>,
    ) -> Self {
        self.street = Some(street.into());
        self.house_no = Some(house_no.into());
        self.apartment_no = Some(apartment_no.into());
        self.city = Some(city.into());
        self
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "entry(name='{}', surname='{}', phone_number={}, street='{}', house_no='{}', apartment_no='{}', city='{}')",
            self.name,
            self.surname,
            self.phone_number,
            self.street.as_deref().unwrap_or(""),
            self.house_no.as_deref().unwrap_or(""),
            self.apartment_no.as_deref().unwrap_or(""),
            self.city.as_deref().unwrap_or(""),
        )
    }
}

/// Aggregate root: one register header plus the entries it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    pub id: RegisterId,
    /// Filing date of the register.
    pub filed_date: NaiveDateTime,
    /// Short classification tag, e.g. a department name.
    pub group: String,
    /// Ordered by name when loaded from storage.
    pub entries: Vec<Entry>,
}

impl Register {
    pub fn new(
        id: RegisterId,
        filed_date: NaiveDateTime,
        group: impl Into<String>,
        entries: Vec<Entry>,
    ) -> Self {
        Self {
            id,
            filed_date,
            group: group.into(),
            entries,
        }
    }

    /// Creates a register filed at the current local time.
    ///
    /// The timestamp is taken at the call, never cached.
    pub fn filed_now(id: RegisterId, group: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self::new(id, Local::now().naive_local(), group, entries)
    }

    /// Creates an id-only register value, enough for `delete`.
    pub fn with_id(id: RegisterId) -> Self {
        Self::filed_now(id, String::new(), Vec::new())
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "register(id={}, filed_date='{}', group='{}', entries={})",
            self.id,
            self.filed_date,
            self.group,
            self.entries.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Entry, Register};
    use chrono::NaiveDate;

    #[test]
    fn with_id_builds_fresh_empty_entries_per_call() {
        let mut first = Register::with_id(1);
        first.entries.push(Entry::new("Jan", "Janowski", 111_222_333));

        let second = Register::with_id(2);
        assert!(second.entries.is_empty());
        assert!(second.group.is_empty());
    }

    #[test]
    fn with_address_sets_all_address_fields() {
        let entry = Entry::new("Adam", "Adamowski", 222_333_444).with_address(
            "biala", "1B", "2", "Slupsk",
        );
        assert_eq!(entry.street.as_deref(), Some("biala"));
        assert_eq!(entry.house_no.as_deref(), Some("1B"));
        assert_eq!(entry.apartment_no.as_deref(), Some("2"));
        assert_eq!(entry.city.as_deref(), Some("Slupsk"));
    }

    #[test]
    fn display_identifies_register_and_entry() {
        let date = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let register = Register::new(
            7,
            date,
            "Kierownicy",
            vec![Entry::new("Michal", "Janowski", 111_222_333)],
        );

        let text = register.to_string();
        assert!(text.contains("id=7"));
        assert!(text.contains("Kierownicy"));
        assert!(text.contains("entries=1"));

        let entry_text = register.entries[0].to_string();
        assert!(entry_text.contains("name='Michal'"));
        assert!(entry_text.contains("phone_number=111222333"));
    }

    #[test]
    fn register_serializes_with_snake_case_fields() {
        let date = NaiveDate::from_ymd_opt(2020, 5, 4)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let register = Register::new(3, date, "zarzad", Vec::new());

        let json = serde_json::to_value(&register).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["group"], "zarzad");
        assert_eq!(json["filed_date"], "2020-05-04T12:00:00");
        assert!(json["entries"].as_array().unwrap().is_empty());
    }
}
