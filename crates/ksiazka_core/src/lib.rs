//! Register ("ksiazka") persistence layer.
//!
//! A `RepositoryScope` owns one SQLite connection and one transaction;
//! the register repository performs add/delete/get/update inside it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{configure_db_path, db_path};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::register::{Entry, Register, RegisterId};
pub use repo::error::{RepoResult, RepositoryError};
pub use repo::register_repo::{RegisterRepository, SqliteRegisterRepository};
pub use repo::scope::RepositoryScope;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
