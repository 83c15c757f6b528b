//! In-memory catalog backends.
//!
//! Thread-safe after construction: everything here is built single-threaded
//! during loading, then shared immutably across the worker pool. Intended for
//! embedded use, tests, and as the reference implementation behind the
//! catalog seams.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::catalog::{CellLineCatalog, MappingBridge};
use crate::entity::{CellLine, TermKind};
use crate::ontology::DiseaseOntology;

/// Accession-keyed catalog of cell line records with a cross-reference
/// source index.
#[derive(Debug)]
pub struct InMemoryCatalog {
    database: String,
    cell_lines: HashMap<String, CellLine>,
    // lower-cased xref source -> record accessions
    xref_source_index: HashMap<String, BTreeSet<String>>,
}

impl InMemoryCatalog {
    /// Creates an empty catalog whose native database is `database`.
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            cell_lines: HashMap::new(),
            xref_source_index: HashMap::new(),
        }
    }

    /// Inserts a record, keyed by its accession. Records without a usable
    /// accession are dropped with a diagnostic; re-inserting an accession
    /// replaces the earlier record.
    pub fn insert(&mut self, cell_line: CellLine) {
        let Some(accession) = cell_line.accession_str().map(str::to_string) else {
            tracing::debug!(
                database = %self.database,
                "dropping cell line without valid accession"
            );
            return;
        };
        for xref in cell_line.cross_references() {
            if let Some(source) = xref.source() {
                self.xref_source_index
                    .entry(source.to_ascii_lowercase())
                    .or_default()
                    .insert(accession.clone());
            }
        }
        if self.cell_lines.insert(accession.clone(), cell_line).is_some() {
            tracing::debug!(accession = %accession, "replaced duplicated cell line record");
        }
    }

    /// Iterates all records.
    pub fn iter(&self) -> impl Iterator<Item = &CellLine> {
        self.cell_lines.values()
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut CellLine> {
        self.cell_lines.values_mut()
    }
}

impl CellLineCatalog for InMemoryCatalog {
    fn database(&self) -> &str {
        &self.database
    }

    fn len(&self) -> usize {
        self.cell_lines.len()
    }

    fn accessions(&self) -> Vec<String> {
        self.cell_lines.keys().cloned().collect()
    }

    fn cell_line(&self, accession: &str) -> Option<&CellLine> {
        self.cell_lines.get(accession)
    }

    fn cell_lines_with_cross_reference_source(&self, source: &str) -> Vec<&CellLine> {
        let Some(accessions) = self.xref_source_index.get(&source.to_ascii_lowercase()) else {
            return Vec::new();
        };
        accessions
            .iter()
            .filter_map(|acc| self.cell_lines.get(acc))
            .filter(|record| !record.cross_reference_accessions_from_source(source).is_empty())
            .collect()
    }
}

/// Bridge derived from an intermediate catalog that cross-references both the
/// source and the target databases.
///
/// Only intermediate records pointing at exactly ONE accession of a side
/// contribute a mapping for that side; a record is bridged when its mapped
/// intermediate accession lies in the intersection of both sides' mappings.
#[derive(Debug, Default)]
pub struct InMemoryBridge {
    source_map: HashMap<String, String>,
    target_map: HashMap<String, String>,
    bridged: HashSet<String>,
}

impl InMemoryBridge {
    /// An empty bridge that excludes nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derives the bridge from an intermediate catalog.
    #[must_use]
    pub fn derive(
        intermediate: &dyn CellLineCatalog,
        source_database: &str,
        target_database: &str,
    ) -> Self {
        let mut source_map = HashMap::new();
        for record in intermediate.cell_lines_with_cross_reference_source(source_database) {
            let accessions = record.cross_reference_accessions_from_source(source_database);
            if accessions.len() == 1 {
                if let (Some(mapped), Some(own)) =
                    (accessions.into_iter().next(), record.accession_str())
                {
                    source_map.insert(mapped, own.to_string());
                }
            }
        }
        tracing::info!(
            count = source_map.len(),
            source = source_database,
            "found source mappings in intermediate catalog"
        );

        let mut target_map = HashMap::new();
        for record in intermediate.cell_lines_with_cross_reference_source(target_database) {
            let accessions = record.cross_reference_accessions_from_source(target_database);
            if accessions.len() == 1 {
                if let (Some(mapped), Some(own)) =
                    (accessions.into_iter().next(), record.accession_str())
                {
                    target_map.insert(mapped, own.to_string());
                }
            }
        }
        tracing::info!(
            count = target_map.len(),
            target = target_database,
            "found target mappings in intermediate catalog"
        );

        let source_values: HashSet<&String> = source_map.values().collect();
        let bridged: HashSet<String> = target_map
            .values()
            .filter(|v| source_values.contains(v))
            .map(|v| (*v).clone())
            .collect();
        tracing::info!(
            count = bridged.len(),
            "mapped records across catalogs through the intermediate"
        );

        Self {
            source_map,
            target_map,
            bridged,
        }
    }
}

impl MappingBridge for InMemoryBridge {
    fn is_source_bridged(&self, accession: &str) -> bool {
        self.source_map
            .get(accession)
            .is_some_and(|mid| self.bridged.contains(mid))
    }

    fn is_target_bridged(&self, accession: &str) -> bool {
        self.target_map
            .get(accession)
            .is_some_and(|mid| self.bridged.contains(mid))
    }

    fn bridged_count(&self) -> usize {
        self.bridged.len()
    }
}

/// Pre-matching enrichment: merges into every disease of every record each
/// ontology disease reachable through the disease's own accession as a
/// cross-reference. After this pass the matching core treats disease sets as
/// already expanded.
pub fn enrich_diseases(catalog: &mut InMemoryCatalog, ontologies: &[&dyn DiseaseOntology]) {
    let mut merged = 0usize;
    for record in catalog.iter_mut() {
        for disease in record.terms_mut_for_enrichment(TermKind::Disease) {
            let Some(accession) = disease.accession().map(|a| a.as_str().to_string()) else {
                continue;
            };
            for ontology in ontologies {
                for related in ontology.diseases_from_cross_reference(&accession) {
                    disease.merge(&related);
                    merged += 1;
                }
            }
        }
    }
    tracing::info!(merged, "expanded disease cross references before matching");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CrossReference, OntologyTerm};
    use crate::ontology::InMemoryDiseaseOntology;

    fn named(accession: &str, name: &str) -> CellLine {
        let mut line = CellLine::from_accession(accession);
        line.set_name(name);
        line
    }

    #[test]
    fn insert_requires_accession() {
        let mut catalog = InMemoryCatalog::new("EFO");
        catalog.insert(CellLine::new());
        assert!(catalog.is_empty());

        catalog.insert(named("EFO_0001185", "HeLa"));
        assert_eq!(catalog.len(), 1);
        assert!(catalog.cell_line("EFO_0001185").is_some());
    }

    #[test]
    fn xref_source_index_is_case_insensitive() {
        let mut catalog = InMemoryCatalog::new("CVCL");
        let mut record = named("CVCL_0030", "HeLa");
        record.add_cross_reference(CrossReference::from_accession("EFO_0001185"));
        catalog.insert(record);

        assert_eq!(catalog.cell_lines_with_cross_reference_source("efo").len(), 1);
        assert_eq!(catalog.cell_lines_with_cross_reference_source("EFO").len(), 1);
        assert!(catalog
            .cell_lines_with_cross_reference_source("CLO")
            .is_empty());
    }

    fn intermediate_with(records: Vec<CellLine>) -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new("CVCL");
        for record in records {
            catalog.insert(record);
        }
        catalog
    }

    #[test]
    fn bridge_requires_single_mapping_on_each_side() {
        let mut both = named("CVCL_0030", "HeLa");
        both.add_cross_reference(CrossReference::from_accession("EFO_0001185"));
        both.add_cross_reference(CrossReference::from_accession("CLO_0003684"));

        // Ambiguous on the source side: two EFO accessions.
        let mut ambiguous = named("CVCL_0031", "HeLa S3");
        ambiguous.add_cross_reference(CrossReference::from_accession("EFO_0001186"));
        ambiguous.add_cross_reference(CrossReference::from_accession("EFO_0001187"));
        ambiguous.add_cross_reference(CrossReference::from_accession("CLO_0003685"));

        // Source side only: no target mapping, so never bridged.
        let mut half = named("CVCL_0032", "HEK293");
        half.add_cross_reference(CrossReference::from_accession("EFO_0001188"));

        let catalog = intermediate_with(vec![both, ambiguous, half]);
        let bridge = InMemoryBridge::derive(&catalog, "EFO", "CLO");

        assert_eq!(bridge.bridged_count(), 1);
        assert!(bridge.is_source_bridged("EFO_0001185"));
        assert!(bridge.is_target_bridged("CLO_0003684"));
        assert!(!bridge.is_source_bridged("EFO_0001186"));
        assert!(!bridge.is_source_bridged("EFO_0001188"));
        assert!(!bridge.is_target_bridged("CLO_0003685"));
    }

    #[test]
    fn empty_bridge_excludes_nothing() {
        let bridge = InMemoryBridge::empty();
        assert!(!bridge.is_source_bridged("EFO_0001185"));
        assert_eq!(bridge.bridged_count(), 0);
    }

    #[test]
    fn enrichment_expands_disease_cross_references() {
        let mut onto = InMemoryDiseaseOntology::new();
        let mut doid = OntologyTerm::from_accession(TermKind::Disease, "DOID_162");
        doid.set_name("cancer");
        doid.add_synonym("malignant neoplasm");
        doid.add_cross_reference(CrossReference::from_accession("UMLS_C0006826"));
        // Reachable through the record disease's accession as an xref.
        doid.add_cross_reference(CrossReference::from_accession("EFO_0000311"));
        onto.insert_disease(doid);

        let mut record = named("EFO_0001185", "HeLa");
        let mut disease = OntologyTerm::from_accession(TermKind::Disease, "EFO_0000311");
        disease.set_name("cancer");
        record.add_disease(disease);

        let mut catalog = InMemoryCatalog::new("EFO");
        catalog.insert(record);
        let ontologies: [&dyn DiseaseOntology; 1] = [&onto];
        enrich_diseases(&mut catalog, &ontologies);

        let enriched = &catalog.cell_line("EFO_0001185").unwrap().terms(TermKind::Disease)[0];
        assert!(enriched.synonyms().contains("malignant neoplasm"));
        assert!(enriched
            .cross_references()
            .contains(&CrossReference::from_accession("UMLS_C0006826")));
        assert!(enriched
            .cross_references()
            .contains(&CrossReference::from_accession("DOID_162")));
    }
}
