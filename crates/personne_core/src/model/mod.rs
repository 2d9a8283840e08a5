//! Domain model for personne records.
//!
//! # Responsibility
//! - Define the stored record and the external input shape.
//! - Own the pure normalization rules applied before persistence.
//!
//! # Invariants
//! - Every stored record is identified by a store-assigned `PersonneId`.
//! - Free-text fields are normalized before they reach the store.

pub mod personne;
