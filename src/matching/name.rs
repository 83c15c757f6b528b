//! Name, synonym, and cross-reference matching between cell line records.
//!
//! Pure functions of a (source, target) pair. The comparison unit on each
//! side is the record name together with its synonyms; cross-reference
//! comparison also counts the record's own accession as a synthetic
//! reference.

use crate::entity::CellLine;
use crate::matching::distance::{levenshtein, levenshtein_ignore_case, INFINITE_DISTANCE};

/// True when any name-or-synonym of `source` exactly equals any
/// name-or-synonym of `target` (case-sensitive).
#[must_use]
pub fn synonyms_match(source: &CellLine, target: &CellLine) -> bool {
    target
        .names()
        .any(|theirs| source.names().any(|ours| ours == theirs))
}

/// True when any name-or-synonym of `source` equals any name-or-synonym of
/// `target`, ignoring ASCII case.
#[must_use]
pub fn synonyms_match_ignore_case(source: &CellLine, target: &CellLine) -> bool {
    target
        .names()
        .any(|theirs| source.names().any(|ours| ours.eq_ignore_ascii_case(theirs)))
}

/// True when any cross-reference of `source` (self-reference included) equals
/// any cross-reference of `target`, similarly expanded.
#[must_use]
pub fn cross_references_match(source: &CellLine, target: &CellLine) -> bool {
    let theirs: Vec<_> = target.expanded_cross_references().collect();
    source
        .expanded_cross_references()
        .any(|ours| theirs.iter().any(|xref| *xref == ours))
}

/// The exact-match predicate: shared name/synonym (case-sensitive) or shared
/// cross-reference.
#[must_use]
pub fn matches(source: &CellLine, target: &CellLine) -> bool {
    synonyms_match(source, target) || cross_references_match(source, target)
}

/// The exact-match predicate on the scoring path: shared name/synonym
/// ignoring case, or shared cross-reference.
#[must_use]
pub fn matches_ignore_case(source: &CellLine, target: &CellLine) -> bool {
    synonyms_match_ignore_case(source, target) || cross_references_match(source, target)
}

/// Levenshtein distance between the two record names; `None` when either
/// name is absent.
#[must_use]
pub fn name_edit_distance(source: &CellLine, target: &CellLine) -> Option<u32> {
    Some(levenshtein(source.name()?, target.name()?))
}

/// Levenshtein distance between the upper-cased record names; `None` when
/// either name is absent.
#[must_use]
pub fn name_edit_distance_ignore_case(source: &CellLine, target: &CellLine) -> Option<u32> {
    Some(levenshtein_ignore_case(source.name()?, target.name()?))
}

/// Minimum Levenshtein distance over the cross product of name-and-synonyms
/// on each side; [`INFINITE_DISTANCE`] when either side has nothing to
/// compare.
#[must_use]
pub fn shortest_synonym_edit_distance(source: &CellLine, target: &CellLine) -> u32 {
    let mut distance = INFINITE_DISTANCE;
    for theirs in target.names() {
        for ours in source.names() {
            distance = distance.min(levenshtein(ours, theirs));
        }
    }
    distance
}

/// Ignore-case variant of [`shortest_synonym_edit_distance`].
#[must_use]
pub fn shortest_synonym_edit_distance_ignore_case(source: &CellLine, target: &CellLine) -> u32 {
    let mut distance = INFINITE_DISTANCE;
    for theirs in target.names() {
        for ours in source.names() {
            distance = distance.min(levenshtein_ignore_case(ours, theirs));
        }
    }
    distance
}
