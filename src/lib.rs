//! # cellmap - Cross-Catalog Cell Line Entity Resolution
//!
//! cellmap reconciles records describing the same biological cell line across
//! independently curated catalogs, producing a graded mapping for human
//! curators. Every (source, target) pair is scored over five attribute
//! families — name/synonym/cross-reference identity, disease, species,
//! organism part, cell type — and each source record is classified as an
//! exact-valid, exact-invalid, multi-mapped, or fuzzy match (or as failed,
//! when its scoring task did not complete).
//!
//! ## Core Concepts
//!
//! - **Accession**: the canonical `DATABASE_IDENTIFIER` key for every entity
//! - **CellLine**: an immutable-after-construction catalog record
//! - **CandidateMatch**: one scored (source, target) pair, ranked in a
//!   bounded best-of-three container
//! - **MappingReport**: the final partition of source records into outcome
//!   buckets, flushed through a pluggable report writer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cellmap::{DispatchConfig, InMemoryBridge, InMemoryCatalog, MatchContext, MatchDispatcher};
//!
//! // Catalogs are loaded by external collaborators, then frozen.
//! let source: InMemoryCatalog = load_source_catalog()?;
//! let target: InMemoryCatalog = load_target_catalog()?;
//!
//! let ctx = MatchContext::new(
//!     Arc::new(source),
//!     Arc::new(target),
//!     Arc::new(InMemoryBridge::empty()),
//! );
//! let report = MatchDispatcher::new(Arc::new(ctx), DispatchConfig::default()).run()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Entity model
pub mod accession;
pub mod entity;

// Collaborator seams
pub mod catalog;
pub mod ontology;
pub mod report;

// Matching core and dispatch
pub mod dispatch;
pub mod error;
pub mod matching;

// Re-export primary types at crate root for convenience
pub use accession::Accession;
pub use catalog::{
    enrich_diseases, CellLineCatalog, InMemoryBridge, InMemoryCatalog, MappingBridge,
};
pub use dispatch::{DispatchConfig, MatchDispatcher};
pub use entity::{CellLine, CrossReference, OntologyTerm, TermKind};
pub use error::{CellMapError, CellMapResult, DispatchError, ReportError};
pub use matching::{
    classify, is_eligible_source, BestCandidates, CandidateMatch, Classification, MatchContext,
    MatchFlag, MatchOptions, SpeciesStrategy,
};
pub use ontology::{
    DiseaseOntology, InMemoryDiseaseOntology, InMemoryTaxonomy, SpeciesTaxonomy,
};
pub use report::{Bucket, MappingReport, MappingRow, MatchFailure, MatchLabel, ReportWriter};
