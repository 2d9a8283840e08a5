//! Personne repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide fragment lookups, combined search and CRUD over `personne`.
//! - Own the destructive reset (delete all + identifier sequence reset).
//!
//! # Invariants
//! - Name fragments match case-insensitively under Unicode case mapping
//!   (`personne_fold`), phone fragments match exactly.
//! - Fragments are matched literally; `%` and `_` carry no wildcard meaning.
//! - A unique-index violation on `telephone` surfaces as `DuplicateTelephone`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::personne::{NewPersonne, Personne, PersonneId};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use thiserror::Error;

const PERSONNE_SELECT_SQL: &str = "SELECT
    id,
    nom,
    prenom,
    adresse,
    telephone,
    date_naissance
FROM personne";

const PERSONNE_ORDER_SQL: &str = " ORDER BY id ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for personne persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("personne not found: {0}")]
    NotFound(PersonneId),
    #[error("telephone already stored: {0}")]
    DuplicateTelephone(String),
    #[error("invalid persisted personne data: {0}")]
    InvalidData(String),
    #[error("connection schema version {actual_version} does not match expected {expected_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Optional, AND-combined search predicates.
///
/// `None` skips the predicate entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonneSearch {
    /// Case-insensitive fragment of `nom`.
    pub nom: Option<String>,
    /// Case-insensitive fragment of `prenom`.
    pub prenom: Option<String>,
    /// Exact-case fragment of `telephone`.
    pub telephone: Option<String>,
}

/// Store contract for personne records.
pub trait PersonneRepository {
    /// Lists every record ordered by identifier.
    fn find_all(&self) -> RepoResult<Vec<Personne>>;
    fn find_by_nom_containing(&self, fragment: &str) -> RepoResult<Vec<Personne>>;
    fn find_by_prenom_containing(&self, fragment: &str) -> RepoResult<Vec<Personne>>;
    fn find_by_telephone_containing(&self, fragment: &str) -> RepoResult<Vec<Personne>>;
    /// Applies every present predicate of `query`, combined with AND.
    fn search(&self, query: &PersonneSearch) -> RepoResult<Vec<Personne>>;
    /// Inserts a record and returns it with its assigned identifier.
    fn insert(&self, personne: &NewPersonne) -> RepoResult<Personne>;
    /// Replaces every mutable field of an existing record.
    fn update(&self, personne: &Personne) -> RepoResult<Personne>;
    fn find_by_id(&self, id: PersonneId) -> RepoResult<Option<Personne>>;
    fn exists_by_id(&self, id: PersonneId) -> RepoResult<bool>;
    fn delete_by_id(&self, id: PersonneId) -> RepoResult<()>;
    fn delete_all(&self) -> RepoResult<()>;
    /// Restarts identifier generation so the next insert receives `1`.
    fn reset_id_sequence(&self) -> RepoResult<()>;

    /// Deletes every record and resets identifier generation.
    fn reset_table(&self) -> RepoResult<()> {
        self.delete_all()?;
        self.reset_id_sequence()
    }
}

/// SQLite-backed personne repository.
pub struct SqlitePersonneRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonneRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Rejects connections that skipped `open_db`/`open_db_in_memory`.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_table: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'personne'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_table {
            return Err(RepoError::MissingRequiredTable("personne"));
        }

        Ok(Self { conn })
    }

    fn query_list(
        &self,
        where_sql: &str,
        bind: impl rusqlite::Params,
    ) -> RepoResult<Vec<Personne>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSONNE_SELECT_SQL}{where_sql}{PERSONNE_ORDER_SQL};"))?;
        let mut rows = stmt.query(bind)?;
        let mut personnes = Vec::new();

        while let Some(row) = rows.next()? {
            personnes.push(parse_personne_row(row)?);
        }

        Ok(personnes)
    }
}

impl PersonneRepository for SqlitePersonneRepository<'_> {
    fn find_all(&self) -> RepoResult<Vec<Personne>> {
        self.query_list("", [])
    }

    fn find_by_nom_containing(&self, fragment: &str) -> RepoResult<Vec<Personne>> {
        self.query_list(
            " WHERE instr(personne_fold(nom), personne_fold(?1)) > 0",
            [fragment],
        )
    }

    fn find_by_prenom_containing(&self, fragment: &str) -> RepoResult<Vec<Personne>> {
        self.query_list(
            " WHERE instr(personne_fold(prenom), personne_fold(?1)) > 0",
            [fragment],
        )
    }

    fn find_by_telephone_containing(&self, fragment: &str) -> RepoResult<Vec<Personne>> {
        self.query_list(" WHERE instr(telephone, ?1) > 0", [fragment])
    }

    fn search(&self, query: &PersonneSearch) -> RepoResult<Vec<Personne>> {
        self.query_list(
            " WHERE (?1 IS NULL OR instr(personne_fold(nom), personne_fold(?1)) > 0)
                AND (?2 IS NULL OR instr(personne_fold(prenom), personne_fold(?2)) > 0)
                AND (?3 IS NULL OR instr(telephone, ?3) > 0)",
            params![
                query.nom.as_deref(),
                query.prenom.as_deref(),
                query.telephone.as_deref(),
            ],
        )
    }

    fn insert(&self, personne: &NewPersonne) -> RepoResult<Personne> {
        self.conn
            .execute(
                "INSERT INTO personne (
                    nom,
                    prenom,
                    adresse,
                    telephone,
                    date_naissance
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    personne.nom.as_str(),
                    personne.prenom.as_str(),
                    personne.adresse.as_deref(),
                    personne.telephone.as_deref(),
                    personne.date_naissance,
                ],
            )
            .map_err(|err| map_write_error(err, personne.telephone.as_deref()))?;

        Ok(personne.clone().with_id(self.conn.last_insert_rowid()))
    }

    fn update(&self, personne: &Personne) -> RepoResult<Personne> {
        let changed = self
            .conn
            .execute(
                "UPDATE personne
                 SET
                    nom = ?1,
                    prenom = ?2,
                    adresse = ?3,
                    telephone = ?4,
                    date_naissance = ?5
                 WHERE id = ?6;",
                params![
                    personne.nom.as_str(),
                    personne.prenom.as_str(),
                    personne.adresse.as_deref(),
                    personne.telephone.as_deref(),
                    personne.date_naissance,
                    personne.id,
                ],
            )
            .map_err(|err| map_write_error(err, personne.telephone.as_deref()))?;

        if changed == 0 {
            return Err(RepoError::NotFound(personne.id));
        }

        Ok(personne.clone())
    }

    fn find_by_id(&self, id: PersonneId) -> RepoResult<Option<Personne>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSONNE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_personne_row(row)?));
        }

        Ok(None)
    }

    fn exists_by_id(&self, id: PersonneId) -> RepoResult<bool> {
        let exists = self
            .conn
            .query_row("SELECT 1 FROM personne WHERE id = ?1;", [id], |_| Ok(()))
            .optional()?;
        Ok(exists.is_some())
    }

    fn delete_by_id(&self, id: PersonneId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM personne WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_all(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM personne;", [])?;
        Ok(())
    }

    fn reset_id_sequence(&self) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM sqlite_sequence WHERE name = 'personne';", [])?;
        Ok(())
    }

    fn reset_table(&self) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM personne;", [])?;
        tx.execute("DELETE FROM sqlite_sequence WHERE name = 'personne';", [])?;
        tx.commit()?;
        Ok(())
    }
}

fn map_write_error(err: rusqlite::Error, telephone: Option<&str>) -> RepoError {
    if let (Some(telephone), rusqlite::Error::SqliteFailure(failure, Some(message))) =
        (telephone, &err)
    {
        if failure.code == ErrorCode::ConstraintViolation && message.contains("personne.telephone")
        {
            return RepoError::DuplicateTelephone(telephone.to_string());
        }
    }
    err.into()
}

fn parse_personne_row(row: &Row<'_>) -> RepoResult<Personne> {
    let id: PersonneId = row.get("id")?;
    let nom: String = row.get("nom")?;
    let prenom: String = row.get("prenom")?;
    if nom.is_empty() || prenom.is_empty() {
        return Err(RepoError::InvalidData(format!(
            "empty nom or prenom in personne row {id}"
        )));
    }

    Ok(Personne {
        id,
        nom,
        prenom,
        adresse: row.get("adresse")?,
        telephone: row.get("telephone")?,
        date_naissance: row.get("date_naissance")?,
    })
}
