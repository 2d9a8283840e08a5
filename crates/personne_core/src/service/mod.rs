//! Core use-case services.
//!
//! # Responsibility
//! - Validate and normalize caller input before it reaches the store.
//! - Keep transport layers decoupled from storage details.

pub mod personne_service;
