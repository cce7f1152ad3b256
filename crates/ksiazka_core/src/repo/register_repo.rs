//! Register repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist the register aggregate across the `Ksiazka` and `Wpisy` tables.
//! - Map rows back to `Register`/`Entry` values.
//!
//! # Invariants
//! - Every statement runs on the borrowed connection; nothing commits here.
//!   The surrounding `RepositoryScope` owns the commit/rollback decision.
//! - Entries are deleted before their header to keep the foreign key valid.
//! - `update` is delete-then-add, never an in-place UPDATE or UPSERT.
//! - Deleting an unknown id is a no-op, not an error.

use crate::model::register::{Entry, Register, RegisterId};
use crate::repo::error::{RepoResult, RepositoryError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const REGISTER_SELECT_SQL: &str = "SELECT
    id,
    filed_date,
    \"group\"
FROM Ksiazka";

const ENTRY_SELECT_SQL: &str = "SELECT
    name,
    surname,
    phone_number,
    street,
    house_no,
    apartment_no,
    city
FROM Wpisy";

/// Repository interface for register CRUD operations.
pub trait RegisterRepository {
    /// Inserts the header and then every entry in the supplied order.
    fn add(&self, register: &Register) -> RepoResult<()>;
    /// Removes the register with `register.id` and all of its entries.
    fn delete(&self, register: &Register) -> RepoResult<()>;
    /// Loads one register with entries ordered by name.
    fn get_by_id(&self, id: RegisterId) -> RepoResult<Option<Register>>;
    /// Replaces the stored register with the same id, or adds it.
    fn update(&self, register: &Register) -> RepoResult<()>;
}

/// SQLite-backed register repository.
pub struct SqliteRegisterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegisterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RegisterRepository for SqliteRegisterRepository<'_> {
    fn add(&self, register: &Register) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO Ksiazka (id, filed_date, \"group\") VALUES (?1, ?2, ?3);",
                params![register.id, register.filed_date, register.group.as_str()],
            )
            .map_err(|err| add_error(register, err))?;

        for entry in &register.entries {
            insert_entry(self.conn, register.id, entry).map_err(|err| {
                add_error(
                    register,
                    RepositoryError::with_cause(
                        format!("error adding {entry} to register {}", register.id),
                        err,
                    ),
                )
            })?;
        }

        debug!(
            "event=register_add module=repo status=ok register_id={} entries={}",
            register.id,
            register.entries.len()
        );
        Ok(())
    }

    fn delete(&self, register: &Register) -> RepoResult<()> {
        let (entries, headers) = delete_rows(self.conn, register.id).map_err(|err| {
            RepositoryError::with_cause(format!("error deleting register {}", register.id), err)
        })?;

        debug!(
            "event=register_delete module=repo status=ok register_id={} entries={} headers={}",
            register.id, entries, headers
        );
        Ok(())
    }

    fn get_by_id(&self, id: RegisterId) -> RepoResult<Option<Register>> {
        let register = load_register(self.conn, id).map_err(|err| {
            RepositoryError::with_cause(format!("error getting register by id {id}"), err)
        })?;

        debug!(
            "event=register_get module=repo status=ok register_id={} found={}",
            id,
            register.is_some()
        );
        Ok(register)
    }

    fn update(&self, register: &Register) -> RepoResult<()> {
        let update_error = |cause: RepositoryError| {
            RepositoryError::with_cause(format!("error updating {register}"), cause)
        };

        if let Some(stored) = self.get_by_id(register.id).map_err(update_error)? {
            self.delete(&stored).map_err(update_error)?;
        }
        self.add(register).map_err(update_error)
    }
}

fn add_error(
    register: &Register,
    cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> RepositoryError {
    RepositoryError::with_cause(format!("error adding {register}"), cause)
}

fn insert_entry(conn: &Connection, register_id: RegisterId, entry: &Entry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO Wpisy (
            name,
            surname,
            phone_number,
            street,
            house_no,
            apartment_no,
            city,
            register_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            entry.name.as_str(),
            entry.surname.as_str(),
            entry.phone_number,
            entry.street.as_deref(),
            entry.house_no.as_deref(),
            entry.apartment_no.as_deref(),
            entry.city.as_deref(),
            register_id,
        ],
    )?;
    Ok(())
}

fn delete_rows(conn: &Connection, register_id: RegisterId) -> rusqlite::Result<(usize, usize)> {
    let entries = conn.execute("DELETE FROM Wpisy WHERE register_id = ?1;", [register_id])?;
    let headers = conn.execute("DELETE FROM Ksiazka WHERE id = ?1;", [register_id])?;
    Ok((entries, headers))
}

fn load_register(conn: &Connection, id: RegisterId) -> rusqlite::Result<Option<Register>> {
    let header = conn
        .query_row(
            &format!("{REGISTER_SELECT_SQL} WHERE id = ?1;"),
            [id],
            |row| {
                Ok((
                    row.get::<_, String>("filed_date")?,
                    row.get::<_, Option<String>>("group")?,
                ))
            },
        )
        .optional()?;

    let Some((filed_date, group)) = header else {
        return Ok(None);
    };
    let filed_date = parse_filed_date(&filed_date)?;

    Ok(Some(Register {
        id,
        filed_date,
        group: group.unwrap_or_default(),
        entries: load_entries(conn, id)?,
    }))
}

/// Accepts `YYYY-MM-DD HH:MM:SS[.f]`, the `T`-separated form and a bare
/// `YYYY-MM-DD` (read as midnight).
fn parse_filed_date(value: &str) -> rusqlite::Result<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, "%F %T%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%FT%T%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, "%F").map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(err)))
}

fn load_entries(conn: &Connection, register_id: RegisterId) -> rusqlite::Result<Vec<Entry>> {
    let mut stmt = conn.prepare(&format!(
        "{ENTRY_SELECT_SQL}
         WHERE register_id = ?1
         ORDER BY name ASC;"
    ))?;
    let mut rows = stmt.query([register_id])?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next()? {
        entries.push(parse_entry_row(row)?);
    }
    Ok(entries)
}

fn parse_entry_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry {
        name: row.get("name")?,
        surname: row.get::<_, Option<String>>("surname")?.unwrap_or_default(),
        phone_number: row.get("phone_number")?,
        street: row.get("street")?,
        house_no: row.get("house_no")?,
        apartment_no: row.get("apartment_no")?,
        city: row.get("city")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{RegisterRepository, SqliteRegisterRepository};
    use crate::db::open_db_in_memory;
    use crate::model::register::{Entry, Register};
    use chrono::NaiveDate;

    fn sample_register() -> Register {
        let date = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap();
        Register::new(
            1,
            date,
            "Dyrektorzy",
            vec![
                Entry::new("Jan", "Janowski", 111_222_333),
                Entry::new("Adam", "Adamowski", 222_333_444),
            ],
        )
    }

    #[test]
    fn get_by_id_orders_entries_by_name() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteRegisterRepository::new(&conn);
        repo.add(&sample_register()).unwrap();

        let loaded = repo.get_by_id(1).unwrap().unwrap();
        let names: Vec<&str> = loaded.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Adam", "Jan"]);
    }

    #[test]
    fn null_surname_and_group_read_back_as_empty() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO Ksiazka (id, filed_date, \"group\") VALUES (5, '2016-01-01 00:00:00', NULL);
             INSERT INTO Wpisy (name, surname, phone_number, register_id) VALUES ('Jan', NULL, 0, 5);",
        )
        .unwrap();

        let repo = SqliteRegisterRepository::new(&conn);
        let loaded = repo.get_by_id(5).unwrap().unwrap();
        assert_eq!(loaded.group, "");
        assert_eq!(loaded.entries[0].surname, "");
        assert_eq!(loaded.entries[0].street, None);
    }

    #[test]
    fn date_only_filed_date_loads_as_midnight() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO Ksiazka (id, filed_date, \"group\") VALUES (1, '2016-01-01', 'Dyrektorzy');",
        )
        .unwrap();

        let repo = SqliteRegisterRepository::new(&conn);
        let loaded = repo.get_by_id(1).unwrap().unwrap();
        let midnight = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(loaded.filed_date, midnight);
        assert_eq!(loaded.group, "Dyrektorzy");
        assert!(loaded.entries.is_empty());
    }

    #[test]
    fn t_separated_filed_date_keeps_fraction() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO Ksiazka (id, filed_date, \"group\") VALUES (2, '2016-01-01T09:15:00.250', 'x');",
        )
        .unwrap();

        let repo = SqliteRegisterRepository::new(&conn);
        let loaded = repo.get_by_id(2).unwrap().unwrap();
        let expected = NaiveDate::from_ymd_opt(2016, 1, 1)
            .unwrap()
            .and_hms_milli_opt(9, 15, 0, 250)
            .unwrap();
        assert_eq!(loaded.filed_date, expected);
    }

    #[test]
    fn add_entry_failure_names_entry_and_register() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteRegisterRepository::new(&conn);
        let mut register = sample_register();
        register
            .entries
            .push(Entry::new("Jan", "Duplikat", 999_999_999));

        let err = repo.add(&register).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("error adding register(id=1"));
        assert!(text.contains("name='Jan'"));
        assert!(text.contains("to register 1"));
    }

    #[test]
    fn unreadable_filed_date_is_reported_with_id() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO Ksiazka (id, filed_date, \"group\") VALUES (8, 'not a date', 'x');",
        )
        .unwrap();

        let repo = SqliteRegisterRepository::new(&conn);
        let err = repo.get_by_id(8).unwrap_err();
        assert!(err.message().contains("by id 8"));
    }
}
