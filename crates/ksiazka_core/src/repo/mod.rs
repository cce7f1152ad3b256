//! Repository layer: transactional scope and register persistence.
//!
//! # Responsibility
//! - Bound every unit of work by one `RepositoryScope` transaction.
//! - Keep SQLite query details out of callers.
//!
//! # Invariants
//! - Storage-engine errors surface only as causes of `RepositoryError`.

pub mod error;
pub mod register_repo;
pub mod scope;
