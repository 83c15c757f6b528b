//! Accession parsing and validation.
//!
//! An accession is the canonical `DATABASE_IDENTIFIER` key identifying an
//! entity within a database. Construction never fails: malformed input is
//! represented as an absent accession so that downstream code can treat "no
//! valid accession" as an explicit state rather than an exception.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Accepted accession shape: non-empty database, separator underscore, and an
/// identifier that does not start with a space or another underscore.
const ACCESSION_PATTERN: &str = r"^[^_]+_[^_ ].*$";

static ACCESSION_RE: OnceLock<Regex> = OnceLock::new();

fn accession_re() -> &'static Regex {
    ACCESSION_RE.get_or_init(|| Regex::new(ACCESSION_PATTERN).expect("accession pattern compiles"))
}

/// Returns true if `candidate` is a well-formed `DATABASE_IDENTIFIER` key.
///
/// # Examples
///
/// ```
/// use cellmap::accession::is_valid_accession;
///
/// assert!(is_valid_accession("EFO_0000322"));
/// assert!(!is_valid_accession("EFO0000322"));
/// assert!(!is_valid_accession("_0000322"));
/// ```
#[must_use]
pub fn is_valid_accession(candidate: &str) -> bool {
    accession_re().is_match(candidate)
}

/// A validated `DATABASE_IDENTIFIER` key.
///
/// The database is everything before the first underscore, the identifier
/// everything after it; all three representations are derived once at
/// construction and stay mutually consistent.
///
/// # Examples
///
/// ```
/// use cellmap::accession::Accession;
///
/// let acc = Accession::parse("NCBITaxon_9606").unwrap();
/// assert_eq!(acc.database(), "NCBITaxon");
/// assert_eq!(acc.identifier(), "9606");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Accession {
    value: String,
    separator: usize,
}

impl Accession {
    /// Parses an accession string. Returns `None` on malformed input.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        if !is_valid_accession(value) {
            tracing::trace!(accession = value, "incorrect accession format");
            return None;
        }
        let separator = value.find('_').expect("validated accession has separator");
        Some(Self {
            value: value.to_string(),
            separator,
        })
    }

    /// Builds an accession from its database and identifier parts.
    ///
    /// Returns `None` when the joined form does not validate (empty database,
    /// identifier starting with a space or underscore, ...).
    #[must_use]
    pub fn from_parts(database: &str, identifier: &str) -> Option<Self> {
        Self::parse(&format!("{database}_{identifier}"))
    }

    /// The full `DATABASE_IDENTIFIER` string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The database part (before the first underscore).
    #[must_use]
    pub fn database(&self) -> &str {
        &self.value[..self.separator]
    }

    /// The identifier part (after the first underscore).
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.value[self.separator + 1..]
    }

    /// Re-derives the accession with a different database part.
    #[must_use]
    pub fn with_database(&self, database: &str) -> Option<Self> {
        Self::from_parts(database, self.identifier())
    }

    /// Re-derives the accession with a different identifier part.
    #[must_use]
    pub fn with_identifier(&self, identifier: &str) -> Option<Self> {
        Self::from_parts(self.database(), identifier)
    }
}

impl fmt::Display for Accession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<String> for Accession {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("incorrect accession format: {value}"))
    }
}

impl From<Accession> for String {
    fn from(accession: Accession) -> Self {
        accession.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_accession() {
        let acc = Accession::parse("EFO_0001200").unwrap();
        assert_eq!(acc.as_str(), "EFO_0001200");
        assert_eq!(acc.database(), "EFO");
        assert_eq!(acc.identifier(), "0001200");
    }

    #[test]
    fn splits_on_first_underscore_only() {
        let acc = Accession::parse("CLO_ABC_123").unwrap();
        assert_eq!(acc.database(), "CLO");
        assert_eq!(acc.identifier(), "ABC_123");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(Accession::parse("").is_none());
        assert!(Accession::parse("EFO").is_none());
        assert!(Accession::parse("_0001200").is_none());
        assert!(Accession::parse("EFO_ 0001200").is_none());
        assert!(Accession::parse("EFO__0001200").is_none());
    }

    #[test]
    fn from_parts_round_trips() {
        let acc = Accession::from_parts("ATCC", "CCL-2").unwrap();
        assert_eq!(acc.as_str(), "ATCC_CCL-2");
        assert!(Accession::from_parts("", "CCL-2").is_none());
    }

    #[test]
    fn rederives_parts() {
        let acc = Accession::parse("EFO_0001200").unwrap();
        let renamed = acc.with_database("CLO").unwrap();
        assert_eq!(renamed.as_str(), "CLO_0001200");
        let reid = acc.with_identifier("42").unwrap();
        assert_eq!(reid.as_str(), "EFO_42");
    }

    #[test]
    fn serde_round_trip_is_string() {
        let acc = Accession::parse("DOID_162").unwrap();
        let json = serde_json::to_string(&acc).unwrap();
        assert_eq!(json, "\"DOID_162\"");
        let back: Accession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, acc);

        let bad: Result<Accession, _> = serde_json::from_str("\"DOID162\"");
        assert!(bad.is_err());
    }
}
