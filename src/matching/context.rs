//! The shared read context for match tasks.
//!
//! Catalogs, bridge, and ontologies are loaded once before dispatch and
//! passed into every task as one explicitly constructed, immutable context —
//! never as process-wide state.

use std::sync::Arc;

use crate::catalog::{CellLineCatalog, MappingBridge};
use crate::matching::term::{DiseaseMatcher, SpeciesMatcher, SpeciesStrategy};
use crate::ontology::{DiseaseOntology, SpeciesTaxonomy};

/// Tunable comparison behavior.
#[derive(Debug, Clone)]
pub struct MatchOptions {
    /// How species pairs are compared. Taxonomy traversal must be opted
    /// into; content equality is the exercised default.
    pub species_strategy: SpeciesStrategy,
    /// Subclass steps within which two diseases count as related.
    pub disease_max_distance: u32,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            species_strategy: SpeciesStrategy::ContentOnly,
            disease_max_distance: 1,
        }
    }
}

/// Everything a match task reads: both catalogs, the bridge, the reference
/// ontologies, and the options. Immutable for the duration of the job.
#[derive(Clone)]
pub struct MatchContext {
    /// The source catalog being mapped.
    pub source: Arc<dyn CellLineCatalog>,
    /// The target catalog being mapped against.
    pub target: Arc<dyn CellLineCatalog>,
    /// The already-mapped exclusion.
    pub bridge: Arc<dyn MappingBridge>,
    /// Reference disease ontologies for semantic disease matching.
    pub disease_ontologies: Vec<Arc<dyn DiseaseOntology>>,
    /// Species taxonomy, consulted only under
    /// [`SpeciesStrategy::Taxonomy`].
    pub taxonomy: Option<Arc<dyn SpeciesTaxonomy>>,
    /// Comparison options.
    pub options: MatchOptions,
}

impl MatchContext {
    /// A context with no bridge exclusions, no ontologies, and default
    /// options.
    #[must_use]
    pub fn new(
        source: Arc<dyn CellLineCatalog>,
        target: Arc<dyn CellLineCatalog>,
        bridge: Arc<dyn MappingBridge>,
    ) -> Self {
        Self {
            source,
            target,
            bridge,
            disease_ontologies: Vec::new(),
            taxonomy: None,
            options: MatchOptions::default(),
        }
    }

    /// Adds a reference disease ontology.
    #[must_use]
    pub fn with_disease_ontology(mut self, ontology: Arc<dyn DiseaseOntology>) -> Self {
        self.disease_ontologies.push(ontology);
        self
    }

    /// Installs the species taxonomy and enables taxonomy-aware species
    /// matching.
    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: Arc<dyn SpeciesTaxonomy>) -> Self {
        self.taxonomy = Some(taxonomy);
        self.options.species_strategy = SpeciesStrategy::Taxonomy;
        self
    }

    /// The disease matcher over this context's ontologies.
    #[must_use]
    pub fn disease_matcher(&self) -> DiseaseMatcher {
        DiseaseMatcher::new(
            self.disease_ontologies.clone(),
            self.options.disease_max_distance,
        )
    }

    /// The species matcher under this context's strategy.
    #[must_use]
    pub fn species_matcher(&self) -> SpeciesMatcher {
        SpeciesMatcher::new(self.options.species_strategy, self.taxonomy.clone())
    }
}
