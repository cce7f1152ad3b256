//! Domain model for the register store.
//!
//! # Responsibility
//! - Define plain data holders mapped to and from `Ksiazka`/`Wpisy` rows.
//!
//! # Invariants
//! - Entries are owned by exactly one register and never shared.

pub mod register;
