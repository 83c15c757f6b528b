//! Bounded best-candidate retention.
//!
//! Each source record keeps at most three target candidates under a fully
//! specified total order. The final tie-break is target accession order, so
//! the retained set is independent of evaluation order.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::entity::CellLine;

/// Default retention capacity.
pub const DEFAULT_CAPACITY: usize = 3;

/// Three-valued per-family match outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFlag {
    /// Both sides have entries and at least one cross-pair matches.
    Matched,
    /// Both sides have entries and no cross-pair matches.
    Mismatched,
    /// At least one side has no entries; the family contributes nothing.
    NotApplicable,
}

impl MatchFlag {
    /// Report rendering: `true`, `false`, or `null`.
    #[must_use]
    pub const fn as_report_str(&self) -> &'static str {
        match self {
            Self::Matched => "true",
            Self::Mismatched => "false",
            Self::NotApplicable => "null",
        }
    }
}

impl fmt::Display for MatchFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_report_str())
    }
}

/// One evaluated (source, target) pair.
///
/// Created per target during scoring, consumed immediately by
/// [`BestCandidates`]; not persisted beyond the orchestration task.
#[derive(Debug, Clone)]
pub struct CandidateMatch<'a> {
    /// The evaluated target record.
    pub target: &'a CellLine,
    /// Accumulated score: 8 for an exact hit or minus the synonym distance,
    /// then ±1 per applicable attribute family.
    pub score: i64,
    /// Levenshtein distance between the names, absent when either name is.
    pub name_edit_distance: Option<u32>,
    /// Shortest Levenshtein distance across the synonym cross product.
    pub synonym_distance: u32,
    /// Disease family outcome.
    pub disease: MatchFlag,
    /// Species family outcome.
    pub species: MatchFlag,
    /// Organism part family outcome.
    pub organism_part: MatchFlag,
    /// Cell type family outcome.
    pub cell_type: MatchFlag,
    /// False when any applicable family mismatched.
    pub valid: bool,
}

impl<'a> CandidateMatch<'a> {
    /// The target record's accession. Targets come out of an
    /// accession-keyed catalog, so this is present in practice.
    #[must_use]
    pub fn target_accession(&self) -> &str {
        self.target.accession_str().unwrap_or_default()
    }

    /// Total order over candidates; `Greater` means `self` ranks better.
    ///
    /// Higher score, then lower synonym distance, then valid over invalid,
    /// then lexicographically smaller target accession. The last leg replaces
    /// the reference behavior's insertion-order-dependent fallback with a
    /// deterministic one.
    #[must_use]
    pub fn rank(&self, other: &CandidateMatch<'_>) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.synonym_distance.cmp(&self.synonym_distance))
            .then_with(|| self.valid.cmp(&other.valid))
            .then_with(|| other.target_accession().cmp(self.target_accession()))
    }
}

/// Bounded container of the best candidates seen so far.
#[derive(Debug)]
pub struct BestCandidates<'a> {
    capacity: usize,
    entries: Vec<CandidateMatch<'a>>,
}

impl<'a> BestCandidates<'a> {
    /// A container with the default capacity of three.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A container retaining at most `capacity` candidates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::with_capacity(capacity.max(1) + 1),
        }
    }

    /// Inserts a candidate, evicting the lowest ranked beyond capacity. A
    /// candidate for an already retained target collapses onto the better
    /// ranked of the two; a target is never represented twice.
    pub fn insert(&mut self, candidate: CandidateMatch<'a>) {
        if let Some(position) = self
            .entries
            .iter()
            .position(|held| held.target_accession() == candidate.target_accession())
        {
            if candidate.rank(&self.entries[position]) == Ordering::Greater {
                self.entries[position] = candidate;
                self.entries.sort_by(|a, b| b.rank(a));
            }
            return;
        }
        self.entries.push(candidate);
        self.entries.sort_by(|a, b| b.rank(a));
        self.entries.truncate(self.capacity);
    }

    /// The retained candidates, best first.
    #[must_use]
    pub fn ranked(&self) -> &[CandidateMatch<'a>] {
        &self.entries
    }

    /// Number of retained candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BestCandidates<'_> {
    fn default() -> Self {
        Self::new()
    }
}
