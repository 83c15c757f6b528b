//! Categorical attribute terms: diseases, species, organism parts, cell types.
//!
//! The four attribute families share one shape and one equality rule, so they
//! are a single kind-tagged struct. Equality is symmetric but not guaranteed
//! transitive: two terms can each share a synonym with a third without
//! sharing one with each other.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::accession::Accession;
use crate::entity::xref::CrossReference;

/// The attribute family a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    /// A disease annotation.
    Disease,
    /// A species annotation.
    Species,
    /// An organism part annotation.
    OrganismPart,
    /// A cell type annotation.
    CellType,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disease => write!(f, "disease"),
            Self::Species => write!(f, "species"),
            Self::OrganismPart => write!(f, "organism part"),
            Self::CellType => write!(f, "cell type"),
        }
    }
}

/// A categorical attribute value attached to a cell line.
///
/// # Examples
///
/// ```
/// use cellmap::entity::{OntologyTerm, TermKind};
///
/// let mut human = OntologyTerm::from_accession(TermKind::Species, "NCBITaxon_9606");
/// human.set_name("Homo sapiens");
/// assert_eq!(human.accession().unwrap().as_str(), "NCBITaxon_9606");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyTerm {
    kind: TermKind,
    accession: Option<Accession>,
    name: Option<String>,
    synonyms: BTreeSet<String>,
    cross_references: Vec<CrossReference>,
}

impl OntologyTerm {
    /// Creates a term with no accession.
    #[must_use]
    pub fn new(kind: TermKind) -> Self {
        Self {
            kind,
            accession: None,
            name: None,
            synonyms: BTreeSet::new(),
            cross_references: Vec::new(),
        }
    }

    /// Creates a term from an accession string; malformed input leaves the
    /// accession absent.
    #[must_use]
    pub fn from_accession(kind: TermKind, accession: &str) -> Self {
        Self {
            accession: Accession::parse(accession),
            ..Self::new(kind)
        }
    }

    /// Creates a term from database and identifier parts.
    #[must_use]
    pub fn from_parts(kind: TermKind, database: &str, identifier: &str) -> Self {
        Self {
            accession: Accession::from_parts(database, identifier),
            ..Self::new(kind)
        }
    }

    /// The attribute family this term belongs to.
    #[must_use]
    pub const fn kind(&self) -> TermKind {
        self.kind
    }

    /// The term's accession, if well formed.
    #[must_use]
    pub fn accession(&self) -> Option<&Accession> {
        self.accession.as_ref()
    }

    /// Replaces the accession; malformed input clears it.
    pub fn set_accession(&mut self, accession: &str) {
        self.accession = Accession::parse(accession);
    }

    /// The primary name, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the primary name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// The synonym set (primary name not included).
    #[must_use]
    pub fn synonyms(&self) -> &BTreeSet<String> {
        &self.synonyms
    }

    /// Adds a synonym. Duplicates are dropped silently.
    pub fn add_synonym(&mut self, synonym: impl Into<String>) {
        self.synonyms.insert(synonym.into());
    }

    /// The explicit cross-references (self-reference not included).
    #[must_use]
    pub fn cross_references(&self) -> &[CrossReference] {
        &self.cross_references
    }

    /// Adds a cross-reference, silently dropping unusable references and
    /// duplicates of references already present.
    pub fn add_cross_reference(&mut self, xref: CrossReference) {
        if !xref.is_usable() {
            tracing::trace!(kind = %self.kind, xref = %xref, "dropping invalid cross reference");
            return;
        }
        if self.cross_references.contains(&xref) {
            tracing::trace!(kind = %self.kind, xref = %xref, "dropping duplicated cross reference");
            return;
        }
        self.cross_references.push(xref);
    }

    /// Adds every cross-reference in `xrefs` through the validated path.
    pub fn add_all_cross_references(&mut self, xrefs: impl IntoIterator<Item = CrossReference>) {
        for xref in xrefs {
            self.add_cross_reference(xref);
        }
    }

    /// Name and synonyms together, the unit of name-based comparison.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name
            .as_deref()
            .into_iter()
            .chain(self.synonyms.iter().map(String::as_str))
    }

    /// Explicit cross-references plus the synthetic self-reference.
    pub fn expanded_cross_references(&self) -> impl Iterator<Item = CrossReference> + '_ {
        self.accession
            .as_ref()
            .map(CrossReference::self_reference)
            .into_iter()
            .chain(self.cross_references.iter().cloned())
    }

    /// Folds an equal duplicate of this term into the receiver: the other's
    /// accession (as a synthetic cross-reference when it differs), its name
    /// (as a synonym when it differs), its synonyms, and its explicit
    /// cross-references. Non-equal terms are left untouched.
    pub fn merge(&mut self, other: &OntologyTerm) {
        if *self != *other {
            tracing::warn!(kind = %self.kind, "unable to merge two non-equal terms");
            return;
        }
        let mut incoming: Vec<CrossReference> = other.cross_references.clone();
        if let Some(other_acc) = &other.accession {
            if self.accession.as_ref() != Some(other_acc) {
                incoming.push(CrossReference::self_reference(other_acc));
            }
        }
        self.add_all_cross_references(incoming);
        if let Some(other_name) = other.name() {
            if self.name() != Some(other_name) {
                self.synonyms.insert(other_name.to_string());
            }
        }
        for synonym in &other.synonyms {
            self.synonyms.insert(synonym.clone());
        }
    }
}

/// Same kind, and: same accession, OR a shared name/synonym (case-sensitive
/// exact, names included on both sides), OR a shared cross-reference (the
/// synthetic self-reference included).
impl PartialEq for OntologyTerm {
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.accession, &other.accession) {
            if a == b {
                return true;
            }
        }
        if other.names().any(|name| self.names().any(|n| n == name)) {
            return true;
        }
        self.expanded_cross_references()
            .any(|ours| other.expanded_cross_references().any(|theirs| ours == theirs))
    }
}
