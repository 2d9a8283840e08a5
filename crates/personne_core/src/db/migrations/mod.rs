//! Embedded schema migrations for the personne store.
//!
//! # Responsibility
//! - Carry every schema step as an embedded SQL script, oldest first.
//! - Bring a connection up to [`latest_version`] inside one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly 1.
//! - `PRAGMA user_version` always equals the last applied step.
//! - A store written by a newer binary is refused, never downgraded.
//!
//! # See also
//! - `0001_personne.sql` for the table and the unique phone index.
//! - `db::open` for the connection bootstrap that runs these steps.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};

/// One schema step: `sql` upgrades a store from `version - 1` to `version`.
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "personne",
    sql: include_str!("0001_personne.sql"),
}];

/// Schema version this binary writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Upgrades `conn` to [`latest_version`].
///
/// A store already at the latest version is left untouched.
///
/// # Errors
/// - [`DbError::UnsupportedSchemaVersion`] when the store is newer than this
///   binary.
/// - [`DbError::Sqlite`] when a step fails; the whole upgrade is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = current_user_version(conn)?;
    let to_version = latest_version();

    if from_version > to_version {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: to_version,
        });
    }
    if from_version == to_version {
        return Ok(());
    }

    let tx = conn.transaction()?;
    SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from_version)
        .try_for_each(|step| run_step(&tx, step))?;
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={to_version}");
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    info!(
        "event=db_migrate_step module=db status=ok version={} name={}",
        step.version, step.name
    );
    Ok(())
}

/// Schema version recorded in `PRAGMA user_version`; `0` for a fresh store.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}
