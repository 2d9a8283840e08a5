//! Shared request state.
//!
//! # Responsibility
//! - Own the process-wide SQLite connection.
//! - Run service calls off the async runtime, one unit of work at a time.
//! - Enforce the admin token in front of destructive calls.

use crate::error::ApiError;
use crate::graphql::{build_schema, PersonneSchema};
use personne_core::{PersonneService, ServiceResult, SqlitePersonneRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Header carrying the admin token for table resets.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Cloneable handle over the single store connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `work` against a fresh service while holding the connection lock.
    ///
    /// # Errors
    ///
    /// Returns the mapped service error, or `Internal` when the lock is
    /// poisoned or the blocking task fails.
    pub async fn run<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: for<'c> FnOnce(&PersonneService<SqlitePersonneRepository<'c>>) -> ServiceResult<T>
            + Send
            + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))?;
            let repo = SqlitePersonneRepository::try_new(&guard)?;
            let service = PersonneService::new(repo);
            work(&service).map_err(ApiError::from)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
    }
}

/// Reset gate configured from `admin.reset_token`.
#[derive(Debug, Clone, Default)]
pub struct ResetGate {
    token: Option<String>,
}

impl ResetGate {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    /// Accepts only when a token is configured and `presented` equals it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Forbidden`] otherwise.
    pub fn check(&self, presented: Option<&str>) -> Result<(), ApiError> {
        match (self.token.as_deref(), presented) {
            (Some(expected), Some(presented)) if expected == presented => Ok(()),
            _ => Err(ApiError::Forbidden),
        }
    }
}

/// State shared by every REST handler and the GraphQL endpoint.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub reset_gate: ResetGate,
    pub schema: PersonneSchema,
}

impl AppState {
    pub fn new(conn: Connection, reset_token: Option<String>) -> Self {
        let db = Database::new(conn);
        let reset_gate = ResetGate::new(reset_token);
        let schema = build_schema(db.clone(), reset_gate.clone());
        Self {
            db,
            reset_gate,
            schema,
        }
    }
}
