//! Cell line records.
//!
//! One struct covers all three provenances (source catalog, target catalog,
//! intermediate catalog); which catalog a record lives in is the provenance.
//! Records are constructed once during catalog loading and read-only during
//! matching.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::accession::Accession;
use crate::entity::term::{OntologyTerm, TermKind};
use crate::entity::xref::CrossReference;

/// A cell line record.
///
/// # Examples
///
/// ```
/// use cellmap::entity::CellLine;
///
/// let mut hela = CellLine::from_accession("EFO_0001185");
/// hela.set_name("HeLa");
/// hela.add_synonym("CCL-2");
/// assert_eq!(hela.database(), Some("EFO"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellLine {
    accession: Option<Accession>,
    name: Option<String>,
    synonyms: BTreeSet<String>,
    cross_references: Vec<CrossReference>,
    diseases: Vec<OntologyTerm>,
    species: Vec<OntologyTerm>,
    organism_parts: Vec<OntologyTerm>,
    cell_types: Vec<OntologyTerm>,
}

impl CellLine {
    /// Creates an empty record with no accession.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accession: None,
            name: None,
            synonyms: BTreeSet::new(),
            cross_references: Vec::new(),
            diseases: Vec::new(),
            species: Vec::new(),
            organism_parts: Vec::new(),
            cell_types: Vec::new(),
        }
    }

    /// Creates a record from an accession string; malformed input leaves the
    /// accession absent and the record survives with reduced capability.
    #[must_use]
    pub fn from_accession(accession: &str) -> Self {
        Self {
            accession: Accession::parse(accession),
            ..Self::new()
        }
    }

    /// Creates a record from database and identifier parts.
    #[must_use]
    pub fn from_parts(database: &str, identifier: &str) -> Self {
        Self {
            accession: Accession::from_parts(database, identifier),
            ..Self::new()
        }
    }

    /// The record's accession, if well formed.
    #[must_use]
    pub fn accession(&self) -> Option<&Accession> {
        self.accession.as_ref()
    }

    /// The accession as a string, if well formed.
    #[must_use]
    pub fn accession_str(&self) -> Option<&str> {
        self.accession.as_ref().map(Accession::as_str)
    }

    /// Replaces the accession, re-deriving database and identifier.
    /// Malformed input clears it.
    pub fn set_accession(&mut self, accession: &str) {
        self.accession = Accession::parse(accession);
    }

    /// The database part of the accession.
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.accession.as_ref().map(Accession::database)
    }

    /// Re-derives the accession under a different database.
    pub fn set_database(&mut self, database: &str) {
        match &self.accession {
            Some(acc) => self.accession = acc.with_database(database),
            None => tracing::warn!(database, "cannot re-derive accession without one"),
        }
    }

    /// The identifier part of the accession.
    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.accession.as_ref().map(Accession::identifier)
    }

    /// Re-derives the accession under a different identifier.
    pub fn set_identifier(&mut self, identifier: &str) {
        match &self.accession {
            Some(acc) => self.accession = acc.with_identifier(identifier),
            None => tracing::warn!(identifier, "cannot re-derive accession without one"),
        }
    }

    /// The primary name, if parsed.
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

    /// Adds a synonym, silently dropping duplicates.
    pub fn add_synonym(&mut self, synonym: impl Into<String>) {
        self.synonyms.insert(synonym.into());
    }

    /// Name and synonyms together, the unit of name-based comparison.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name
            .as_deref()
            .into_iter()
            .chain(self.synonyms.iter().map(String::as_str))
    }

    /// The explicit cross-references (self-reference not included).
    #[must_use]
    pub fn cross_references(&self) -> &[CrossReference] {
        &self.cross_references
    }

    /// Adds a cross-reference, silently dropping unusable references and
    /// duplicates.
    pub fn add_cross_reference(&mut self, xref: CrossReference) {
        if !xref.is_usable() {
            tracing::trace!(xref = %xref, "dropping invalid cross reference");
            return;
        }
        if self.cross_references.contains(&xref) {
            tracing::trace!(xref = %xref, "dropping duplicated cross reference");
            return;
        }
        self.cross_references.push(xref);
    }

    /// Explicit cross-references plus the synthetic self-reference.
    pub fn expanded_cross_references(&self) -> impl Iterator<Item = CrossReference> + '_ {
        self.accession
            .as_ref()
            .map(CrossReference::self_reference)
            .into_iter()
            .chain(self.cross_references.iter().cloned())
    }

    /// Accessions of every cross-reference whose source matches
    /// case-insensitively. Used to derive the intermediate-catalog bridge.
    #[must_use]
    pub fn cross_reference_accessions_from_source(&self, source: &str) -> BTreeSet<String> {
        self.cross_references
            .iter()
            .filter(|xref| {
                xref.source()
                    .is_some_and(|s| s.eq_ignore_ascii_case(source))
            })
            .filter_map(|xref| xref.accession().map(|acc| acc.as_str().to_string()))
            .collect()
    }

    /// The terms of one attribute family.
    #[must_use]
    pub fn terms(&self, kind: TermKind) -> &[OntologyTerm] {
        match kind {
            TermKind::Disease => &self.diseases,
            TermKind::Species => &self.species,
            TermKind::OrganismPart => &self.organism_parts,
            TermKind::CellType => &self.cell_types,
        }
    }

    fn terms_mut(&mut self, kind: TermKind) -> &mut Vec<OntologyTerm> {
        match kind {
            TermKind::Disease => &mut self.diseases,
            TermKind::Species => &mut self.species,
            TermKind::OrganismPart => &mut self.organism_parts,
            TermKind::CellType => &mut self.cell_types,
        }
    }

    /// Mutable access to one attribute family, for the pre-matching disease
    /// enrichment pass. Matching itself never mutates records.
    pub fn terms_mut_for_enrichment(&mut self, kind: TermKind) -> &mut [OntologyTerm] {
        self.terms_mut(kind).as_mut_slice()
    }

    /// Adds a term to its family, silently dropping terms whose accession is
    /// unusable and duplicates under term content equality.
    pub fn add_term(&mut self, term: OntologyTerm) {
        if term.accession().is_none() {
            tracing::trace!(kind = %term.kind(), "dropping term without valid accession");
            return;
        }
        let family = self.terms_mut(term.kind());
        if family.contains(&term) {
            tracing::trace!(kind = %term.kind(), "dropping duplicated term");
            return;
        }
        family.push(term);
    }

    /// Convenience: adds a disease term.
    pub fn add_disease(&mut self, term: OntologyTerm) {
        debug_assert_eq!(term.kind(), TermKind::Disease);
        self.add_term(term);
    }

    /// Convenience: adds a species term.
    pub fn add_species(&mut self, term: OntologyTerm) {
        debug_assert_eq!(term.kind(), TermKind::Species);
        self.add_term(term);
    }

    /// Convenience: adds an organism part term.
    pub fn add_organism_part(&mut self, term: OntologyTerm) {
        debug_assert_eq!(term.kind(), TermKind::OrganismPart);
        self.add_term(term);
    }

    /// Convenience: adds a cell type term.
    pub fn add_cell_type(&mut self, term: OntologyTerm) {
        debug_assert_eq!(term.kind(), TermKind::CellType);
        self.add_term(term);
    }
}

impl Default for CellLine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_derives_parts() {
        let line = CellLine::from_accession("CLO_0003684");
        assert_eq!(line.accession_str(), Some("CLO_0003684"));
        assert_eq!(line.database(), Some("CLO"));
        assert_eq!(line.identifier(), Some("0003684"));
    }

    #[test]
    fn malformed_accession_is_cleared_not_fatal() {
        let mut line = CellLine::from_accession("HeLa");
        assert!(line.accession().is_none());
        line.set_name("HeLa");
        assert_eq!(line.name(), Some("HeLa"));
    }

    #[test]
    fn set_database_rederives_accession() {
        let mut line = CellLine::from_parts("EFO", "0001185");
        line.set_database("CLO");
        assert_eq!(line.accession_str(), Some("CLO_0001185"));
        line.set_identifier("42");
        assert_eq!(line.accession_str(), Some("CLO_42"));
    }

    #[test]
    fn names_includes_name_and_synonyms() {
        let mut line = CellLine::from_accession("EFO_0001185");
        line.set_name("HeLa");
        line.add_synonym("CCL-2");
        line.add_synonym("CCL-2");
        let names: Vec<&str> = line.names().collect();
        assert_eq!(names, vec!["HeLa", "CCL-2"]);
    }

    #[test]
    fn duplicate_and_invalid_cross_references_dropped() {
        let mut line = CellLine::from_accession("EFO_0001185");
        line.add_cross_reference(CrossReference::from_accession("ATCC_CCL-2"));
        line.add_cross_reference(CrossReference::from_parts("atcc", "ccl-2"));
        line.add_cross_reference(CrossReference::from_accession("garbage"));
        assert_eq!(line.cross_references().len(), 1);
    }

    #[test]
    fn duplicate_terms_dropped_by_content_equality() {
        let mut line = CellLine::from_accession("EFO_0001185");
        let mut a = OntologyTerm::from_accession(TermKind::Disease, "EFO_0000311");
        a.set_name("cancer");
        let mut b = OntologyTerm::from_accession(TermKind::Disease, "DOID_162");
        b.set_name("cancer");
        line.add_disease(a);
        line.add_disease(b);
        assert_eq!(line.terms(TermKind::Disease).len(), 1);
    }

    #[test]
    fn term_without_accession_dropped() {
        let mut line = CellLine::from_accession("EFO_0001185");
        let mut term = OntologyTerm::new(TermKind::Species);
        term.set_name("Homo sapiens");
        line.add_species(term);
        assert!(line.terms(TermKind::Species).is_empty());
    }

    #[test]
    fn cross_reference_accessions_filtered_by_source() {
        let mut line = CellLine::from_accession("CVCL_0030");
        line.add_cross_reference(CrossReference::from_accession("EFO_0001185"));
        line.add_cross_reference(CrossReference::from_accession("CLO_0003684"));
        line.add_cross_reference(CrossReference::from_accession("ATCC_CCL-2"));
        let efo = line.cross_reference_accessions_from_source("efo");
        assert_eq!(efo.len(), 1);
        assert!(efo.contains("EFO_0001185"));
    }
}
