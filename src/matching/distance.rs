//! Edit distance helpers for name and synonym comparison.

/// Sentinel for "no comparable pair exists".
pub const INFINITE_DISTANCE: u32 = u32::MAX;

/// Levenshtein distance between two strings.
#[must_use]
pub fn levenshtein(a: &str, b: &str) -> u32 {
    u32::try_from(strsim::levenshtein(a, b)).unwrap_or(INFINITE_DISTANCE)
}

/// Levenshtein distance between the upper-cased forms of two strings.
#[must_use]
pub fn levenshtein_ignore_case(a: &str, b: &str) -> u32 {
    levenshtein(&a.to_uppercase(), &b.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_strings_have_zero_distance() {
        assert_eq!(levenshtein("HeLa", "HeLa"), 0);
    }

    #[test]
    fn case_only_differences_cost_under_case_sensitivity() {
        assert_eq!(levenshtein("HeLa", "HELA"), 2);
        assert_eq!(levenshtein_ignore_case("HeLa", "HELA"), 0);
    }

    #[test]
    fn insertion_costs_one_per_character() {
        assert_eq!(levenshtein_ignore_case("HeLa", "HeLa cell"), 5);
    }
}
