//! Core domain logic for the personne record service.
//! This crate is the single source of truth for validation and normalization.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::personne::{NewPersonne, Personne, PersonneId, PersonneInput};
pub use repo::personne_repo::{
    PersonneRepository, PersonneSearch, RepoError, RepoResult, SqlitePersonneRepository,
};
pub use service::personne_service::{PersonneService, PersonneServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
