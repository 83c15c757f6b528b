//! Per-source-record orchestration: score every eligible target, retain the
//! best candidates, classify.
//!
//! One call to [`classify`] is one task's whole job. The inner loop over
//! targets is sequential; parallelism lives one level up in the dispatcher.

use std::time::Instant;

use crate::catalog::{CellLineCatalog, MappingBridge};
use crate::entity::{CellLine, TermKind};
use crate::matching::context::MatchContext;
use crate::matching::name;
use crate::matching::rank::{BestCandidates, CandidateMatch, MatchFlag};
use crate::matching::term::{terms_match, DiseaseMatcher, SpeciesMatcher};
use crate::report::{MappingRow, MatchLabel};

/// The outcome of one source record's orchestration.
#[derive(Debug, Clone)]
pub enum Classification {
    /// One exact candidate, every applicable family agreed.
    ExactValid(Box<MappingRow>),
    /// One exact candidate, some applicable family disagreed.
    ExactInvalid(Box<MappingRow>),
    /// Several exact candidates; only distance-zero candidates are reported.
    Multi(Vec<MappingRow>),
    /// No exact candidate; all retained candidates are reported.
    Fuzzy(Vec<MappingRow>),
}

/// True when `source` takes part in the mapping at all: a native record of
/// the source catalog that the bridge has not already mapped across.
#[must_use]
pub fn is_eligible_source(ctx: &MatchContext, source: &CellLine) -> bool {
    let Some(accession) = source.accession_str() else {
        return false;
    };
    if !source
        .database()
        .is_some_and(|db| db.eq_ignore_ascii_case(ctx.source.database()))
    {
        return false;
    }
    !ctx.bridge.is_source_bridged(accession)
}

/// Scores one (source, target) pair. Returns the candidate and whether the
/// pair was an exact name/synonym/cross-reference hit.
fn score_pair<'a>(
    source: &CellLine,
    target: &'a CellLine,
    disease_matcher: &DiseaseMatcher,
    species_matcher: &SpeciesMatcher,
) -> (CandidateMatch<'a>, bool) {
    let exact = name::matches_ignore_case(source, target);
    let name_edit_distance = name::name_edit_distance_ignore_case(source, target);
    let synonym_distance = name::shortest_synonym_edit_distance_ignore_case(source, target);

    let mut score: i64 = if exact { 8 } else { -i64::from(synonym_distance) };
    let mut valid = true;

    let mut family = |kind: TermKind, pair_matches: &dyn Fn(&CellLine, &CellLine) -> bool| {
        if source.terms(kind).is_empty() || target.terms(kind).is_empty() {
            return MatchFlag::NotApplicable;
        }
        if pair_matches(source, target) {
            score += 1;
            MatchFlag::Matched
        } else {
            score -= 1;
            valid = false;
            MatchFlag::Mismatched
        }
    };

    let disease = family(TermKind::Disease, &|s, t| {
        s.terms(TermKind::Disease).iter().any(|ours| {
            t.terms(TermKind::Disease)
                .iter()
                .any(|theirs| disease_matcher.matches(ours, theirs))
        })
    });
    let species = family(TermKind::Species, &|s, t| {
        s.terms(TermKind::Species).iter().any(|ours| {
            t.terms(TermKind::Species)
                .iter()
                .any(|theirs| species_matcher.matches(ours, theirs))
        })
    });
    let organism_part = family(TermKind::OrganismPart, &|s, t| {
        s.terms(TermKind::OrganismPart).iter().any(|ours| {
            t.terms(TermKind::OrganismPart)
                .iter()
                .any(|theirs| terms_match(ours, theirs))
        })
    });
    let cell_type = family(TermKind::CellType, &|s, t| {
        s.terms(TermKind::CellType).iter().any(|ours| {
            t.terms(TermKind::CellType)
                .iter()
                .any(|theirs| terms_match(ours, theirs))
        })
    });

    (
        CandidateMatch {
            target,
            score,
            name_edit_distance,
            synonym_distance,
            disease,
            species,
            organism_part,
            cell_type,
            valid,
        },
        exact,
    )
}

/// Runs the full scoring pass for one source record and classifies it.
#[must_use]
pub fn classify(ctx: &MatchContext, source: &CellLine) -> Classification {
    let source_accession = source.accession_str().unwrap_or_default();
    let started = Instant::now();

    let disease_matcher = ctx.disease_matcher();
    let species_matcher = ctx.species_matcher();

    let mut best = BestCandidates::new();
    let mut exact_any = false;
    let mut multi = false;

    for target_accession in ctx.target.accessions() {
        if ctx.bridge.is_target_bridged(&target_accession) {
            continue;
        }
        let Some(target) = ctx.target.cell_line(&target_accession) else {
            continue;
        };
        let (candidate, exact) = score_pair(source, target, &disease_matcher, &species_matcher);
        if exact {
            tracing::debug!(
                source = source_accession,
                target = %target_accession,
                "found exact name/synonyms/cross-reference matched cell line"
            );
            if exact_any {
                multi = true;
            }
            exact_any = true;
        }
        best.insert(candidate);
    }

    let classification = decide(source, &best, exact_any, multi);
    tracing::debug!(
        source = source_accession,
        elapsed = ?started.elapsed(),
        "finished scoring pass"
    );
    classification
}

fn decide(
    source: &CellLine,
    best: &BestCandidates<'_>,
    exact_any: bool,
    multi: bool,
) -> Classification {
    if exact_any && !multi {
        // At least one target scored, so a retained best exists.
        let Some(top) = best.ranked().first() else {
            return Classification::Fuzzy(Vec::new());
        };
        let row = Box::new(MappingRow::build(source, top, MatchLabel::Exact));
        if top.valid {
            Classification::ExactValid(row)
        } else {
            Classification::ExactInvalid(row)
        }
    } else if exact_any {
        let rows = best
            .ranked()
            .iter()
            .filter(|candidate| candidate.synonym_distance == 0)
            .map(|candidate| MappingRow::build(source, candidate, MatchLabel::Exact))
            .collect();
        Classification::Multi(rows)
    } else {
        let rows = best
            .ranked()
            .iter()
            .map(|candidate| MappingRow::build(source, candidate, MatchLabel::Inexact))
            .collect();
        Classification::Fuzzy(rows)
    }
}
