//! Personne domain model and field normalization.
//!
//! # Responsibility
//! - Define the stored record (`Personne`), the insert shape (`NewPersonne`)
//!   and the caller-facing input (`PersonneInput`).
//! - Provide the deterministic normalization helpers shared by create/update.
//!
//! # Invariants
//! - `nom` is stored trimmed and upper-cased.
//! - `prenom` is stored trimmed with only its first character upper-cased.
//! - `telephone` is stored without any whitespace; blank values become `None`.
//! - `adresse` is stored trimmed; blank values become `None`.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Store-assigned identifier. The first row after a reset receives `1`.
pub type PersonneId = i64;

/// Canonical stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personne {
    pub id: PersonneId,
    /// Last name, upper-cased.
    pub nom: String,
    /// First name, capitalized.
    pub prenom: String,
    pub adresse: Option<String>,
    /// Whitespace-free phone number, unique across the store.
    pub telephone: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

/// Normalized record ready for insertion; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPersonne {
    pub nom: String,
    pub prenom: String,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

impl NewPersonne {
    /// Attaches the identifier assigned by the store.
    pub fn with_id(self, id: PersonneId) -> Personne {
        Personne {
            id,
            nom: self.nom,
            prenom: self.prenom,
            adresse: self.adresse,
            telephone: self.telephone,
            date_naissance: self.date_naissance,
        }
    }
}

/// Caller-provided fields for create and update.
///
/// Every field is optional at the type level; the service decides which ones
/// are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonneInput {
    pub nom: Option<String>,
    pub prenom: Option<String>,
    pub adresse: Option<String>,
    pub telephone: Option<String>,
    pub date_naissance: Option<NaiveDate>,
}

/// Trims and upper-cases a last name.
pub fn normalize_nom(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Trims a first name and capitalizes it.
pub fn normalize_prenom(value: &str) -> String {
    capitalize_first_letter(value.trim())
}

/// Upper-cases the first character and lower-cases the rest.
///
/// Empty input is returned unchanged.
pub fn capitalize_first_letter(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => {
            let mut capitalized: String = first.to_uppercase().collect();
            capitalized.push_str(&chars.as_str().to_lowercase());
            capitalized
        }
        None => String::new(),
    }
}

/// Trims an address; blank addresses are dropped.
pub fn normalize_adresse(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Removes every whitespace run from a phone number; blank numbers are dropped.
pub fn normalize_telephone(value: &str) -> Option<String> {
    let stripped = WHITESPACE_RE.replace_all(value, "");
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.into_owned())
    }
}

/// Whole years elapsed between `birth` and `today`.
///
/// A year only counts once its anniversary has been reached. Negative when
/// `birth` is after `today`.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    years
}
