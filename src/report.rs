//! Mapping report rows and the report-writer seam.
//!
//! The core exposes its output as ordered lists of fixed 22-column rows, one
//! list per outcome bucket. Serialization (delimited text, ...) belongs to
//! the [`ReportWriter`] implementor.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::{CellLine, TermKind};
use crate::error::ReportError;
use crate::matching::orchestrator::Classification;
use crate::matching::rank::{CandidateMatch, MatchFlag};

/// Outcome buckets. Every eligible source record lands in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Single exact candidate, all applicable families agree.
    ExactValid,
    /// Single exact candidate, at least one applicable family disagrees.
    ExactInvalid,
    /// Two or more exact candidates.
    Multi,
    /// No exact candidate; best-effort ranked suggestions.
    Fuzzy,
    /// The scoring task failed; the record is reported, not silently lost.
    Failed,
}

impl Bucket {
    /// The four buckets flushed to the report writer, in flush order.
    pub const WRITTEN: [Bucket; 4] = [
        Bucket::ExactValid,
        Bucket::ExactInvalid,
        Bucket::Multi,
        Bucket::Fuzzy,
    ];

    /// Stable lower-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExactValid => "exact_valid",
            Self::ExactInvalid => "exact_invalid",
            Self::Multi => "multi",
            Self::Fuzzy => "fuzzy",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The name/synonym column label: exact rows carry `exact match`, fuzzy rows
/// carry `false` plus the measured distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchLabel {
    /// An exact name/synonym/cross-reference hit.
    Exact,
    /// A fuzzy suggestion.
    Inexact,
}

impl MatchLabel {
    /// Report rendering.
    #[must_use]
    pub const fn as_report_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact match",
            Self::Inexact => "false",
        }
    }
}

fn render_name(name: Option<&str>) -> String {
    name.unwrap_or("null").to_string()
}

fn render_distance(distance: Option<u32>) -> String {
    distance.map_or_else(|| "null".to_string(), |d| d.to_string())
}

fn render_set(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

fn render_terms(record: &CellLine, kind: TermKind) -> Vec<String> {
    record
        .terms(kind)
        .iter()
        .map(|term| {
            format!(
                "{}#{}",
                term.accession().map_or("null", |acc| acc.as_str()),
                term.name().unwrap_or("null")
            )
        })
        .collect()
}

/// One emitted mapping row: the fixed 22-column shape.
#[derive(Debug, Clone, Serialize)]
pub struct MappingRow {
    /// Source record accession.
    pub source_accession: String,
    /// Accumulated candidate score.
    pub score: i64,
    /// Target record accession.
    pub target_accession: String,
    /// Exact-or-fuzzy label.
    pub label: MatchLabel,
    /// Name edit distance (0 on exact rows).
    pub name_edit_distance: Option<u32>,
    /// Source record name.
    pub source_name: Option<String>,
    /// Target record name.
    pub target_name: Option<String>,
    /// Shortest synonym edit distance (0 on exact rows).
    pub synonym_distance: u32,
    /// Source synonym set.
    pub source_synonyms: Vec<String>,
    /// Target synonym set.
    pub target_synonyms: Vec<String>,
    /// Disease family flag.
    pub disease_match: MatchFlag,
    /// Source diseases as `accession#name`.
    pub source_diseases: Vec<String>,
    /// Target diseases as `accession#name`.
    pub target_diseases: Vec<String>,
    /// Species family flag.
    pub species_match: MatchFlag,
    /// Source species as `accession#name`.
    pub source_species: Vec<String>,
    /// Target species as `accession#name`.
    pub target_species: Vec<String>,
    /// Organism part family flag.
    pub organism_part_match: MatchFlag,
    /// Source organism parts as `accession#name`.
    pub source_organism_parts: Vec<String>,
    /// Target organism parts as `accession#name`.
    pub target_organism_parts: Vec<String>,
    /// Cell type family flag.
    pub cell_type_match: MatchFlag,
    /// Source cell types as `accession#name`.
    pub source_cell_types: Vec<String>,
    /// Target cell types as `accession#name`.
    pub target_cell_types: Vec<String>,
}

impl MappingRow {
    /// Column headers, in column order.
    pub const COLUMNS: [&'static str; 22] = [
        "Source Accession",
        "Score",
        "Target Accession",
        "Name/Synonyms Match?",
        "Name Edit Distance",
        "Source Name",
        "Target Name",
        "Shortest Synonyms Edit Distance",
        "Source Synonyms",
        "Target Synonyms",
        "Disease Match?",
        "Source Diseases",
        "Target Diseases",
        "Species Match?",
        "Source Species",
        "Target Species",
        "Organism Part Match?",
        "Source Organism Parts",
        "Target Organism Parts",
        "Cell Type Match?",
        "Source Cell Types",
        "Target Cell Types",
    ];

    /// Builds a row for one retained candidate. Exact rows render both edit
    /// distances as zero; fuzzy rows carry the measured values.
    #[must_use]
    pub fn build(source: &CellLine, candidate: &CandidateMatch<'_>, label: MatchLabel) -> Self {
        let (name_edit_distance, synonym_distance) = match label {
            MatchLabel::Exact => (Some(0), 0),
            MatchLabel::Inexact => (candidate.name_edit_distance, candidate.synonym_distance),
        };
        Self {
            source_accession: source.accession_str().unwrap_or_default().to_string(),
            score: candidate.score,
            target_accession: candidate.target_accession().to_string(),
            label,
            name_edit_distance,
            source_name: source.name().map(str::to_string),
            target_name: candidate.target.name().map(str::to_string),
            synonym_distance,
            source_synonyms: source.synonyms().iter().cloned().collect(),
            target_synonyms: candidate.target.synonyms().iter().cloned().collect(),
            disease_match: candidate.disease,
            source_diseases: render_terms(source, TermKind::Disease),
            target_diseases: render_terms(candidate.target, TermKind::Disease),
            species_match: candidate.species,
            source_species: render_terms(source, TermKind::Species),
            target_species: render_terms(candidate.target, TermKind::Species),
            organism_part_match: candidate.organism_part,
            source_organism_parts: render_terms(source, TermKind::OrganismPart),
            target_organism_parts: render_terms(candidate.target, TermKind::OrganismPart),
            cell_type_match: candidate.cell_type,
            source_cell_types: render_terms(source, TermKind::CellType),
            target_cell_types: render_terms(candidate.target, TermKind::CellType),
        }
    }

    /// The row rendered as its 22 column values.
    #[must_use]
    pub fn columns(&self) -> [String; 22] {
        [
            self.source_accession.clone(),
            self.score.to_string(),
            self.target_accession.clone(),
            self.label.as_report_str().to_string(),
            render_distance(self.name_edit_distance),
            render_name(self.source_name.as_deref()),
            render_name(self.target_name.as_deref()),
            self.synonym_distance.to_string(),
            render_set(&self.source_synonyms),
            render_set(&self.target_synonyms),
            self.disease_match.as_report_str().to_string(),
            render_set(&self.source_diseases),
            render_set(&self.target_diseases),
            self.species_match.as_report_str().to_string(),
            render_set(&self.source_species),
            render_set(&self.target_species),
            self.organism_part_match.as_report_str().to_string(),
            render_set(&self.source_organism_parts),
            render_set(&self.target_organism_parts),
            self.cell_type_match.as_report_str().to_string(),
            render_set(&self.source_cell_types),
            render_set(&self.target_cell_types),
        ]
    }
}

/// One task that did not complete scoring.
#[derive(Debug, Clone, Serialize)]
pub struct MatchFailure {
    /// The source record whose task failed.
    pub accession: String,
    /// The captured failure reason.
    pub reason: String,
}

/// The output collaborator: receives each bucket's ordered rows exactly once
/// per flush. Implementors own the serialization format.
pub trait ReportWriter {
    /// Writes one bucket's rows.
    ///
    /// # Errors
    /// Any error is treated as fatal by the caller.
    fn write_bucket(&mut self, bucket: Bucket, rows: &[MappingRow]) -> Result<(), ReportError>;
}

/// The union of all task classifications: four row buckets, their accession
/// sets, and the failures.
#[derive(Debug)]
pub struct MappingReport {
    started_at: DateTime<Utc>,
    elapsed: Duration,
    timed_out: bool,
    exact_valid: Vec<MappingRow>,
    exact_invalid: Vec<MappingRow>,
    multi: Vec<MappingRow>,
    fuzzy: Vec<MappingRow>,
    exact_valid_accessions: BTreeSet<String>,
    exact_invalid_accessions: BTreeSet<String>,
    multi_accessions: BTreeSet<String>,
    fuzzy_accessions: BTreeSet<String>,
    failures: Vec<MatchFailure>,
}

impl MappingReport {
    /// An empty report stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
            timed_out: false,
            exact_valid: Vec::new(),
            exact_invalid: Vec::new(),
            multi: Vec::new(),
            fuzzy: Vec::new(),
            exact_valid_accessions: BTreeSet::new(),
            exact_invalid_accessions: BTreeSet::new(),
            multi_accessions: BTreeSet::new(),
            fuzzy_accessions: BTreeSet::new(),
            failures: Vec::new(),
        }
    }

    /// When the job started.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock time the job took.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub(crate) fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
    }

    /// True when the dispatcher gave up waiting before all tasks finished.
    #[must_use]
    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    pub(crate) fn mark_timed_out(&mut self) {
        self.timed_out = true;
    }

    /// Folds one task's classification into the report.
    pub fn record(&mut self, source_accession: &str, classification: Classification) {
        match classification {
            Classification::ExactValid(row) => {
                self.exact_valid_accessions.insert(source_accession.to_string());
                self.exact_valid.push(*row);
            }
            Classification::ExactInvalid(row) => {
                self.exact_invalid_accessions
                    .insert(source_accession.to_string());
                self.exact_invalid.push(*row);
            }
            Classification::Multi(rows) => {
                self.multi_accessions.insert(source_accession.to_string());
                self.multi.extend(rows);
            }
            Classification::Fuzzy(rows) => {
                self.fuzzy_accessions.insert(source_accession.to_string());
                self.fuzzy.extend(rows);
            }
        }
    }

    /// Records a task that failed to complete.
    pub fn record_failure(&mut self, accession: &str, reason: impl Into<String>) {
        self.failures.push(MatchFailure {
            accession: accession.to_string(),
            reason: reason.into(),
        });
    }

    /// The accession set of one bucket ([`Bucket::Failed`] accessions come
    /// from [`MappingReport::failures`]).
    #[must_use]
    pub fn accessions(&self, bucket: Bucket) -> BTreeSet<String> {
        match bucket {
            Bucket::ExactValid => self.exact_valid_accessions.clone(),
            Bucket::ExactInvalid => self.exact_invalid_accessions.clone(),
            Bucket::Multi => self.multi_accessions.clone(),
            Bucket::Fuzzy => self.fuzzy_accessions.clone(),
            Bucket::Failed => self
                .failures
                .iter()
                .map(|failure| failure.accession.clone())
                .collect(),
        }
    }

    /// The rows of one written bucket.
    #[must_use]
    pub fn rows(&self, bucket: Bucket) -> &[MappingRow] {
        match bucket {
            Bucket::ExactValid => &self.exact_valid,
            Bucket::ExactInvalid => &self.exact_invalid,
            Bucket::Multi => &self.multi,
            Bucket::Fuzzy => &self.fuzzy,
            Bucket::Failed => &[],
        }
    }

    /// The failed tasks.
    #[must_use]
    pub fn failures(&self) -> &[MatchFailure] {
        &self.failures
    }

    /// Bucket counts and timing as one JSON object, for job logs and
    /// downstream tooling.
    #[must_use]
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "started_at": self.started_at.to_rfc3339(),
            "elapsed_secs": self.elapsed.as_secs_f64(),
            "timed_out": self.timed_out,
            "exact_valid": self.exact_valid_accessions.len(),
            "exact_invalid": self.exact_invalid_accessions.len(),
            "multi": self.multi_accessions.len(),
            "fuzzy": self.fuzzy_accessions.len(),
            "failed": self.failures.len(),
        })
    }

    /// The bucket a source accession landed in, if any.
    #[must_use]
    pub fn bucket_of(&self, accession: &str) -> Option<Bucket> {
        if self.exact_valid_accessions.contains(accession) {
            Some(Bucket::ExactValid)
        } else if self.exact_invalid_accessions.contains(accession) {
            Some(Bucket::ExactInvalid)
        } else if self.multi_accessions.contains(accession) {
            Some(Bucket::Multi)
        } else if self.fuzzy_accessions.contains(accession) {
            Some(Bucket::Fuzzy)
        } else if self.failures.iter().any(|f| f.accession == accession) {
            Some(Bucket::Failed)
        } else {
            None
        }
    }

    /// Flushes the four written buckets, sorted by source accession (rows of
    /// one source keep their rank order), so output is deterministic
    /// regardless of task completion order.
    ///
    /// # Errors
    /// Propagates the first writer error; a flush failure is fatal to the
    /// job.
    pub fn flush(&self, writer: &mut dyn ReportWriter) -> Result<(), ReportError> {
        for bucket in Bucket::WRITTEN {
            let mut rows = self.rows(bucket).to_vec();
            rows.sort_by(|a, b| a.source_accession.cmp(&b.source_accession));
            tracing::info!(
                bucket = bucket.as_str(),
                records = self.accessions(bucket).len(),
                rows = rows.len(),
                "flushing mapping bucket"
            );
            writer.write_bucket(bucket, &rows)?;
        }
        for failure in &self.failures {
            tracing::warn!(
                accession = %failure.accession,
                reason = %failure.reason,
                "match task failed; record reported in no written bucket"
            );
        }
        Ok(())
    }
}

impl Default for MappingReport {
    fn default() -> Self {
        Self::new()
    }
}
