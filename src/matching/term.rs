//! Categorical attribute matchers.
//!
//! Organism parts and cell types compare by content equality only. Species
//! defaults to content equality, with an optional taxonomy-parent traversal
//! behind an explicitly enabled strategy. Diseases additionally consult the
//! reference ontologies for direct subclass relations.

use std::sync::Arc;

use crate::entity::OntologyTerm;
use crate::ontology::{DiseaseOntology, SpeciesTaxonomy};

/// Content equality, the whole predicate for organism parts and cell types.
#[must_use]
pub fn terms_match(source: &OntologyTerm, target: &OntologyTerm) -> bool {
    source == target
}

/// How species pairs are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpeciesStrategy {
    /// Content equality only (the exercised default).
    #[default]
    ContentOnly,
    /// Content equality, or a taxonomy parent relation in either direction.
    Taxonomy,
}

/// Species comparator; holds the optional taxonomy collaborator.
#[derive(Clone)]
pub struct SpeciesMatcher {
    strategy: SpeciesStrategy,
    taxonomy: Option<Arc<dyn SpeciesTaxonomy>>,
}

impl SpeciesMatcher {
    /// A matcher using content equality only.
    #[must_use]
    pub fn content_only() -> Self {
        Self {
            strategy: SpeciesStrategy::ContentOnly,
            taxonomy: None,
        }
    }

    /// A matcher for the given strategy. The taxonomy is only consulted
    /// under [`SpeciesStrategy::Taxonomy`].
    #[must_use]
    pub fn new(strategy: SpeciesStrategy, taxonomy: Option<Arc<dyn SpeciesTaxonomy>>) -> Self {
        Self { strategy, taxonomy }
    }

    /// True when the species pair matches under the configured strategy.
    #[must_use]
    pub fn matches(&self, source: &OntologyTerm, target: &OntologyTerm) -> bool {
        if terms_match(source, target) {
            return true;
        }
        if self.strategy != SpeciesStrategy::Taxonomy {
            return false;
        }
        let Some(taxonomy) = &self.taxonomy else {
            return false;
        };
        let (Some(a), Some(b)) = (source.accession(), target.accession()) else {
            return false;
        };
        taxonomy.is_parent(a.as_str(), b.as_str()) || taxonomy.is_parent(b.as_str(), a.as_str())
    }
}

/// Disease comparator; holds shared handles to the reference ontologies.
#[derive(Clone)]
pub struct DiseaseMatcher {
    ontologies: Vec<Arc<dyn DiseaseOntology>>,
    max_distance: u32,
}

impl DiseaseMatcher {
    /// Creates a matcher over the given reference ontologies, relating terms
    /// within `max_distance` subclass steps.
    #[must_use]
    pub fn new(ontologies: Vec<Arc<dyn DiseaseOntology>>, max_distance: u32) -> Self {
        Self {
            ontologies,
            max_distance,
        }
    }

    /// Content equality.
    #[must_use]
    pub fn matches_content(&self, source: &OntologyTerm, target: &OntologyTerm) -> bool {
        terms_match(source, target)
    }

    /// Semantic relation: within any one reference ontology, some disease
    /// connected to `source` is an ancestor or descendant of some disease
    /// connected to `target`.
    #[must_use]
    pub fn matches_semantic(&self, source: &OntologyTerm, target: &OntologyTerm) -> bool {
        let (Some(source_acc), Some(target_acc)) = (source.accession(), target.accession()) else {
            return false;
        };
        for ontology in &self.ontologies {
            let source_views = ontology.diseases_from_cross_reference(source_acc.as_str());
            if source_views.is_empty() {
                continue;
            }
            let target_views = ontology.diseases_from_cross_reference(target_acc.as_str());
            for ours in &source_views {
                for theirs in &target_views {
                    if ontology.is_ancestor_or_descendant(ours, theirs, self.max_distance) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// The full disease predicate: content-equal or semantically related.
    #[must_use]
    pub fn matches(&self, source: &OntologyTerm, target: &OntologyTerm) -> bool {
        self.matches_content(source, target) || self.matches_semantic(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::TermKind;
    use crate::ontology::{InMemoryDiseaseOntology, InMemoryTaxonomy};

    fn term(kind: TermKind, accession: &str, name: &str) -> OntologyTerm {
        let mut t = OntologyTerm::from_accession(kind, accession);
        t.set_name(name);
        t
    }

    #[test]
    fn organism_parts_compare_by_content_only() {
        let a = term(TermKind::OrganismPart, "UBERON_0000029", "lymph node");
        let b = term(TermKind::OrganismPart, "UBERON_0000029", "node of lymph");
        let c = term(TermKind::OrganismPart, "UBERON_0002107", "liver");
        assert!(terms_match(&a, &b));
        assert!(!terms_match(&a, &c));
    }

    #[test]
    fn species_content_only_ignores_taxonomy() {
        let mut taxonomy = InMemoryTaxonomy::new();
        taxonomy.add_parent("NCBITaxon_9606", "NCBITaxon_9605");
        let human = term(TermKind::Species, "NCBITaxon_9606", "Homo sapiens");
        let homo = term(TermKind::Species, "NCBITaxon_9605", "Homo");

        let content = SpeciesMatcher::content_only();
        assert!(!content.matches(&human, &homo));

        let semantic = SpeciesMatcher::new(SpeciesStrategy::Taxonomy, Some(Arc::new(taxonomy)));
        assert!(semantic.matches(&human, &homo));
        assert!(semantic.matches(&homo, &human));
    }

    #[test]
    fn disease_content_equality_short_circuits() {
        let matcher = DiseaseMatcher::new(Vec::new(), 1);
        let a = term(TermKind::Disease, "DOID_162", "cancer");
        let b = term(TermKind::Disease, "EFO_0000311", "cancer");
        assert!(matcher.matches(&a, &b));
    }

    #[test]
    fn disease_semantic_relation_through_ontology() {
        let mut onto = InMemoryDiseaseOntology::new();
        onto.insert_disease(term(TermKind::Disease, "DOID_162", "cancer"));
        onto.insert_disease(term(TermKind::Disease, "DOID_1612", "breast cancer"));
        onto.add_subclass_relation("DOID_1612", "DOID_162");

        let matcher = DiseaseMatcher::new(vec![Arc::new(onto)], 1);
        let parent = term(TermKind::Disease, "DOID_162", "cancer");
        let child = term(TermKind::Disease, "DOID_1612", "breast cancer");
        assert!(!matcher.matches_content(&parent, &child));
        assert!(matcher.matches_semantic(&parent, &child));
        assert!(matcher.matches(&parent, &child));
        assert!(matcher.matches(&child, &parent));
    }

    #[test]
    fn disease_without_ontology_support_does_not_relate() {
        let matcher = DiseaseMatcher::new(Vec::new(), 1);
        let a = term(TermKind::Disease, "DOID_162", "cancer");
        let b = term(TermKind::Disease, "DOID_1612", "breast cancer");
        assert!(!matcher.matches(&a, &b));
    }
}
