//! Ontology reasoning seams.
//!
//! The disease matcher is the one place the core depends on graph reasoning.
//! It is kept behind a narrow trait so the reasoning engine (an OWL reasoner,
//! a precomputed closure, ...) can be swapped without touching the matching
//! core. The species taxonomy traversal sits behind the same kind of seam and
//! is only consulted when explicitly enabled.

use std::collections::{BTreeSet, HashMap};

use crate::entity::{OntologyTerm, TermKind};

/// The NCBI taxonomy node at which upward traversal stops.
pub const CELLULAR_ORGANISM_ACCESSION: &str = "NCBITaxon_131567";

/// A reference disease ontology, queried for cross-reference expansion and
/// direct subclass relations.
pub trait DiseaseOntology: Send + Sync {
    /// The diseases connected to `accession`: the disease stored under that
    /// accession itself, plus every disease carrying an explicit
    /// cross-reference with exactly that accession.
    fn diseases_from_cross_reference(&self, accession: &str) -> Vec<OntologyTerm>;

    /// True when one term is an ancestor of the other within `max_distance`
    /// subclass steps, in either direction. Terms unknown to this ontology
    /// never relate.
    fn is_ancestor_or_descendant(
        &self,
        a: &OntologyTerm,
        b: &OntologyTerm,
        max_distance: u32,
    ) -> bool;
}

/// A species taxonomy with upward (parent) traversal.
pub trait SpeciesTaxonomy: Send + Sync {
    /// The direct parent of `accession`, if known.
    fn parent_of(&self, accession: &str) -> Option<&str>;

    /// True when `parent` lies on the ancestor chain of `child`, walking up
    /// to (and excluding) the cellular-organism root.
    fn is_parent(&self, child: &str, parent: &str) -> bool {
        let mut current = child;
        while let Some(next) = self.parent_of(current) {
            if next == CELLULAR_ORGANISM_ACCESSION {
                return false;
            }
            if next == parent {
                return true;
            }
            current = next;
        }
        false
    }
}

/// In-memory disease ontology: an accession-keyed disease map plus a
/// child-to-parents subclass relation.
#[derive(Debug, Default)]
pub struct InMemoryDiseaseOntology {
    diseases: HashMap<String, OntologyTerm>,
    parents: HashMap<String, BTreeSet<String>>,
}

impl InMemoryDiseaseOntology {
    /// Creates an empty ontology.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a disease term. Terms without a usable accession are dropped
    /// with a diagnostic; a re-inserted accession replaces the earlier term.
    pub fn insert_disease(&mut self, term: OntologyTerm) {
        debug_assert_eq!(term.kind(), TermKind::Disease);
        let Some(accession) = term.accession().map(|a| a.as_str().to_string()) else {
            tracing::trace!("dropping ontology disease without valid accession");
            return;
        };
        self.diseases.insert(accession, term);
    }

    /// Records `child` as a direct subclass of `parent`.
    pub fn add_subclass_relation(&mut self, child: &str, parent: &str) {
        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
    }

    /// Number of diseases loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diseases.len()
    }

    /// True when no diseases are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    /// True when `descendant` has `ancestor` among its superclasses within
    /// `max_distance` steps.
    fn ascends_to(&self, descendant: &str, ancestor: &str, max_distance: u32) -> bool {
        let mut frontier: BTreeSet<&str> = BTreeSet::new();
        frontier.insert(descendant);
        for _ in 0..max_distance {
            let mut next: BTreeSet<&str> = BTreeSet::new();
            for node in frontier {
                if let Some(parents) = self.parents.get(node) {
                    for parent in parents {
                        if parent == ancestor {
                            return true;
                        }
                        next.insert(parent.as_str());
                    }
                }
            }
            if next.is_empty() {
                return false;
            }
            frontier = next;
        }
        false
    }
}

impl DiseaseOntology for InMemoryDiseaseOntology {
    fn diseases_from_cross_reference(&self, accession: &str) -> Vec<OntologyTerm> {
        let mut found = Vec::new();
        if let Some(term) = self.diseases.get(accession) {
            found.push(term.clone());
        }
        for term in self.diseases.values() {
            let referenced = term.cross_references().iter().any(|xref| {
                xref.accession()
                    .is_some_and(|acc| acc.as_str() == accession)
            });
            if referenced && !found.iter().any(|f| f.accession() == term.accession()) {
                found.push(term.clone());
            }
        }
        found
    }

    fn is_ancestor_or_descendant(
        &self,
        a: &OntologyTerm,
        b: &OntologyTerm,
        max_distance: u32,
    ) -> bool {
        let (Some(a_acc), Some(b_acc)) = (a.accession(), b.accession()) else {
            return false;
        };
        if !self.diseases.contains_key(a_acc.as_str()) || !self.diseases.contains_key(b_acc.as_str())
        {
            return false;
        }
        self.ascends_to(a_acc.as_str(), b_acc.as_str(), max_distance)
            || self.ascends_to(b_acc.as_str(), a_acc.as_str(), max_distance)
    }
}

/// In-memory species taxonomy: accession to direct parent.
#[derive(Debug, Default)]
pub struct InMemoryTaxonomy {
    parents: HashMap<String, String>,
}

impl InMemoryTaxonomy {
    /// Creates an empty taxonomy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the direct parent of a taxon.
    pub fn add_parent(&mut self, child: &str, parent: &str) {
        self.parents.insert(child.to_string(), parent.to_string());
    }
}

impl SpeciesTaxonomy for InMemoryTaxonomy {
    fn parent_of(&self, accession: &str) -> Option<&str> {
        self.parents.get(accession).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::CrossReference;

    fn disease(accession: &str, name: &str) -> OntologyTerm {
        let mut term = OntologyTerm::from_accession(TermKind::Disease, accession);
        term.set_name(name);
        term
    }

    fn ontology() -> InMemoryDiseaseOntology {
        let mut onto = InMemoryDiseaseOntology::new();
        onto.insert_disease(disease("DOID_162", "cancer"));
        onto.insert_disease(disease("DOID_1612", "breast cancer"));
        onto.insert_disease(disease("DOID_0060075", "ductal carcinoma"));
        onto.add_subclass_relation("DOID_1612", "DOID_162");
        onto.add_subclass_relation("DOID_0060075", "DOID_1612");
        onto
    }

    #[test]
    fn direct_subclass_relates_both_directions() {
        let onto = ontology();
        let parent = disease("DOID_162", "cancer");
        let child = disease("DOID_1612", "breast cancer");
        assert!(onto.is_ancestor_or_descendant(&child, &parent, 1));
        assert!(onto.is_ancestor_or_descendant(&parent, &child, 1));
    }

    #[test]
    fn distance_bounds_the_walk() {
        let onto = ontology();
        let grandparent = disease("DOID_162", "cancer");
        let grandchild = disease("DOID_0060075", "ductal carcinoma");
        assert!(!onto.is_ancestor_or_descendant(&grandchild, &grandparent, 1));
        assert!(onto.is_ancestor_or_descendant(&grandchild, &grandparent, 2));
    }

    #[test]
    fn unknown_terms_never_relate() {
        let onto = ontology();
        let known = disease("DOID_162", "cancer");
        let unknown = disease("DOID_999999", "mystery");
        assert!(!onto.is_ancestor_or_descendant(&known, &unknown, 1));
    }

    #[test]
    fn cross_reference_lookup_finds_self_and_referencing() {
        let mut onto = ontology();
        let mut linked = disease("DOID_3459", "breast carcinoma");
        linked.add_cross_reference(CrossReference::from_accession("EFO_0000305"));
        onto.insert_disease(linked);

        let via_self = onto.diseases_from_cross_reference("DOID_162");
        assert_eq!(via_self.len(), 1);

        let via_xref = onto.diseases_from_cross_reference("EFO_0000305");
        assert_eq!(via_xref.len(), 1);
        assert_eq!(
            via_xref[0].accession().unwrap().as_str(),
            "DOID_3459"
        );

        assert!(onto.diseases_from_cross_reference("EFO_404").is_empty());
    }

    #[test]
    fn taxonomy_walk_stops_at_root() {
        let mut tax = InMemoryTaxonomy::new();
        tax.add_parent("NCBITaxon_9606", "NCBITaxon_9605");
        tax.add_parent("NCBITaxon_9605", "NCBITaxon_207598");
        tax.add_parent("NCBITaxon_207598", CELLULAR_ORGANISM_ACCESSION);

        assert!(tax.is_parent("NCBITaxon_9606", "NCBITaxon_9605"));
        assert!(tax.is_parent("NCBITaxon_9606", "NCBITaxon_207598"));
        assert!(!tax.is_parent("NCBITaxon_9606", CELLULAR_ORGANISM_ACCESSION));
        assert!(!tax.is_parent("NCBITaxon_9605", "NCBITaxon_9606"));
    }
}
