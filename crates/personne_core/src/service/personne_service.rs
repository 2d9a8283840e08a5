//! Personne use-case service.
//!
//! # Responsibility
//! - Enforce required names, birth-date sanity and phone uniqueness.
//! - Normalize free-text fields before persistence.
//! - Translate repository failures into use-case errors.
//!
//! # Invariants
//! - Every validation runs before the first store mutation.
//! - Create and update apply identical normalization rules.
//! - Keeping one's own phone on update never counts as a duplicate.

use crate::model::personne::{
    age_in_years, normalize_adresse, normalize_nom, normalize_prenom, normalize_telephone,
    NewPersonne, Personne, PersonneId, PersonneInput,
};
use crate::repo::personne_repo::{PersonneRepository, PersonneSearch, RepoError};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use thiserror::Error;

/// Minimum age, in whole years, accepted on create.
const MIN_AGE_YEARS: i32 = 1;

/// Service error for personne use-cases.
#[derive(Debug, Error)]
pub enum PersonneServiceError {
    /// Target record does not exist.
    #[error("personne not found: {0}")]
    NotFound(PersonneId),
    /// A required field is missing or blank.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Birth date lies after today.
    #[error("birth date {0} is in the future")]
    InvalidBirthDate(NaiveDate),
    /// Birth date implies an age under one year.
    #[error("birth date {0} implies an age under one year")]
    TooYoung(NaiveDate),
    /// Normalized phone is already used by another record.
    #[error("telephone already used: {0}")]
    DuplicatePhone(String),
    /// Persistence-layer failure.
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for PersonneServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::DuplicateTelephone(telephone) => Self::DuplicatePhone(telephone),
            other => Self::Repo(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, PersonneServiceError>;

/// Personne service facade over repository implementations.
pub struct PersonneService<R: PersonneRepository> {
    repo: R,
    fixed_today: Option<NaiveDate>,
}

impl<R: PersonneRepository> PersonneService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            fixed_today: None,
        }
    }

    /// Pins the date used for birth-date checks instead of the local calendar.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Creates one record from caller input.
    ///
    /// # Errors
    /// - `InvalidInput` when `nom` or `prenom` is missing or blank.
    /// - `DuplicatePhone` when the stripped phone is already stored.
    /// - `InvalidBirthDate` / `TooYoung` for out-of-range birth dates.
    pub fn create(&self, input: &PersonneInput) -> ServiceResult<Personne> {
        info!("event=personne_create module=service status=start");

        let nom = required(input.nom.as_deref(), "nom")?;
        let prenom = required(input.prenom.as_deref(), "prenom")?;

        let telephone = input.telephone.as_deref().and_then(normalize_telephone);
        if let Some(telephone) = telephone.as_deref() {
            self.ensure_telephone_free(telephone, None)?;
        }

        if let Some(birth) = input.date_naissance {
            let today = self.today();
            if birth > today {
                return Err(PersonneServiceError::InvalidBirthDate(birth));
            }
            if age_in_years(birth, today) < MIN_AGE_YEARS {
                return Err(PersonneServiceError::TooYoung(birth));
            }
        }

        let personne = NewPersonne {
            nom: normalize_nom(nom),
            prenom: normalize_prenom(prenom),
            adresse: input.adresse.as_deref().and_then(normalize_adresse),
            telephone,
            date_naissance: input.date_naissance,
        };
        let saved = self.repo.insert(&personne)?;

        info!(
            "event=personne_create module=service status=ok id={}",
            saved.id
        );
        Ok(saved)
    }

    /// Replaces every mutable field of an existing record.
    ///
    /// # Errors
    /// - `NotFound` when `id` is unknown.
    /// - `InvalidInput` when `nom` or `prenom` is missing or blank.
    /// - `InvalidBirthDate` when the birth date lies after today.
    /// - `DuplicatePhone` when a changed phone belongs to another record.
    pub fn update(&self, id: PersonneId, input: &PersonneInput) -> ServiceResult<Personne> {
        info!("event=personne_update module=service status=start id={id}");

        let existing = self
            .repo
            .find_by_id(id)?
            .ok_or(PersonneServiceError::NotFound(id))?;

        let nom = required(input.nom.as_deref(), "nom")?;
        let prenom = required(input.prenom.as_deref(), "prenom")?;

        if let Some(birth) = input.date_naissance {
            if birth > self.today() {
                return Err(PersonneServiceError::InvalidBirthDate(birth));
            }
        }

        let telephone = input.telephone.as_deref().and_then(normalize_telephone);
        if let Some(candidate) = telephone.as_deref() {
            if existing.telephone.as_deref() != Some(candidate) {
                self.ensure_telephone_free(candidate, Some(id))?;
            }
        }

        let personne = Personne {
            id: existing.id,
            nom: normalize_nom(nom),
            prenom: normalize_prenom(prenom),
            adresse: input.adresse.as_deref().and_then(normalize_adresse),
            telephone,
            date_naissance: input.date_naissance,
        };
        let updated = self.repo.update(&personne)?;

        info!("event=personne_update module=service status=ok id={id}");
        Ok(updated)
    }

    /// Permanently removes one record.
    pub fn delete(&self, id: PersonneId) -> ServiceResult<()> {
        info!("event=personne_delete module=service status=start id={id}");

        if !self.repo.exists_by_id(id)? {
            return Err(PersonneServiceError::NotFound(id));
        }
        self.repo.delete_by_id(id)?;

        info!("event=personne_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Lists every record in identifier order.
    pub fn find_all(&self) -> ServiceResult<Vec<Personne>> {
        info!("event=personne_list module=service status=start");
        Ok(self.repo.find_all()?)
    }

    /// Gets one record by identifier.
    pub fn find_by_id(&self, id: PersonneId) -> ServiceResult<Personne> {
        info!("event=personne_get module=service status=start id={id}");
        self.repo
            .find_by_id(id)?
            .ok_or(PersonneServiceError::NotFound(id))
    }

    /// Runs the combined fragment search; absent predicates match everything.
    pub fn search(&self, query: &PersonneSearch) -> ServiceResult<Vec<Personne>> {
        info!(
            "event=personne_search module=service status=start has_nom={} has_prenom={} has_telephone={}",
            query.nom.is_some(),
            query.prenom.is_some(),
            query.telephone.is_some()
        );
        Ok(self.repo.search(query)?)
    }

    /// Deletes every record and restarts identifier generation.
    ///
    /// No confirmation step; transports must gate this call.
    pub fn reset_table(&self) -> ServiceResult<()> {
        warn!("event=personne_reset module=service status=start");
        self.repo.reset_table()?;
        info!("event=personne_reset module=service status=ok");
        Ok(())
    }

    fn ensure_telephone_free(
        &self,
        telephone: &str,
        owner: Option<PersonneId>,
    ) -> ServiceResult<()> {
        let taken = self
            .repo
            .find_by_telephone_containing(telephone)?
            .iter()
            .any(|other| {
                Some(other.id) != owner && other.telephone.as_deref() == Some(telephone)
            });

        if taken {
            return Err(PersonneServiceError::DuplicatePhone(telephone.to_string()));
        }
        Ok(())
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> ServiceResult<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PersonneServiceError::InvalidInput(format!(
            "{field} must not be empty"
        ))),
    }
}
