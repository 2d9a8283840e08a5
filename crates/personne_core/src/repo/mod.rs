//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the store contract the personne service relies on.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateTelephone`)
//!   in addition to DB transport errors.

pub mod personne_repo;
