//! Cross-references between databases.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::accession::Accession;

/// An assertion that an entity in one database corresponds to an identifier
/// in another database.
///
/// A cross-reference is only usable when its accession is well formed;
/// construction from malformed input yields a reference with an absent
/// accession, which equals nothing and is dropped by the validated add paths
/// on the entity types.
///
/// # Examples
///
/// ```
/// use cellmap::entity::CrossReference;
///
/// let a = CrossReference::from_accession("ATCC_CCL-2");
/// let b = CrossReference::from_parts("atcc", "ccl-2");
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossReference {
    accession: Option<Accession>,
}

impl CrossReference {
    /// Builds a cross-reference from a `SOURCE_IDENTIFIER` accession string.
    #[must_use]
    pub fn from_accession(accession: &str) -> Self {
        Self {
            accession: Accession::parse(accession),
        }
    }

    /// Builds a cross-reference from its source and identifier parts.
    #[must_use]
    pub fn from_parts(source: &str, identifier: &str) -> Self {
        Self {
            accession: Accession::from_parts(source, identifier),
        }
    }

    /// Builds a synthetic reference standing for an entity's own accession.
    #[must_use]
    pub fn self_reference(accession: &Accession) -> Self {
        Self {
            accession: Some(accession.clone()),
        }
    }

    /// The full accession, if well formed.
    #[must_use]
    pub fn accession(&self) -> Option<&Accession> {
        self.accession.as_ref()
    }

    /// The source database, if the accession is well formed.
    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.accession.as_ref().map(Accession::database)
    }

    /// The identifier within the source database, if well formed.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.accession.as_ref().map(Accession::identifier)
    }

    /// True when the accession validated at construction.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.accession.is_some()
    }
}

/// Same accession, or same source and identifier case-insensitively.
/// References without a usable accession equal nothing, themselves included.
impl PartialEq for CrossReference {
    fn eq(&self, other: &Self) -> bool {
        let (Some(a), Some(b)) = (&self.accession, &other.accession) else {
            return false;
        };
        a == b
            || (a.database().eq_ignore_ascii_case(b.database())
                && a.identifier().eq_ignore_ascii_case(b.identifier()))
    }
}

impl fmt::Display for CrossReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.accession {
            Some(acc) => f.write_str(acc.as_str()),
            None => f.write_str("<invalid>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_on_same_accession() {
        let a = CrossReference::from_accession("ATCC_CCL-2");
        let b = CrossReference::from_accession("ATCC_CCL-2");
        assert_eq!(a, b);
    }

    #[test]
    fn equal_ignoring_case_of_parts() {
        let a = CrossReference::from_parts("ATCC", "CCL-2");
        let b = CrossReference::from_parts("atcc", "ccl-2");
        assert_eq!(a, b);
        assert_eq!(b, a);
    }

    #[test]
    fn unequal_on_different_identifier() {
        let a = CrossReference::from_accession("ATCC_CCL-2");
        let b = CrossReference::from_accession("ATCC_CRL-1");
        assert_ne!(a, b);
    }

    #[test]
    fn invalid_reference_equals_nothing() {
        let bad = CrossReference::from_accession("no-separator");
        assert!(!bad.is_usable());
        assert_ne!(bad, bad.clone());
        let good = CrossReference::from_accession("ATCC_CCL-2");
        assert_ne!(bad, good);
    }

    #[test]
    fn self_reference_matches_explicit_reference() {
        let acc = crate::accession::Accession::parse("EFO_0001200").unwrap();
        let synthetic = CrossReference::self_reference(&acc);
        let explicit = CrossReference::from_accession("EFO_0001200");
        assert_eq!(synthetic, explicit);
    }
}
