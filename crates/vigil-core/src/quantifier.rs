//! Match quantifiers - turn an observed hit count into a verdict

use serde::{Deserialize, Serialize};

/// Quantifier over a count of hits against a total population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Match {
    /// Zero hits
    None,
    /// Exactly one hit
    One,
    /// At least one hit
    Any,
    /// Every item is a hit (never true on an empty population)
    All,
    /// More than one hit
    Some,
}

impl Match {
    /// Evaluate this quantifier against `hits` out of `total`
    pub fn matches(&self, hits: usize, total: usize) -> bool {
        match self {
            Match::None => hits == 0,
            Match::One => hits == 1,
            Match::Any => hits >= 1,
            Match::All => total > 0 && hits == total,
            Match::Some => hits > 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Match::None => "NONE",
            Match::One => "ONE",
            Match::Any => "ANY",
            Match::All => "ALL",
            Match::Some => "SOME",
        }
    }
}

impl std::fmt::Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a list of quantifiers attached to one level is combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListPolicy {
    /// The level matches if any listed quantifier matches
    AnyOf,
    /// The level matches only if every listed quantifier matches
    AllOf,
}

/// Policy applied to every `match` list in a catalog.
pub const MATCH_LIST_POLICY: ListPolicy = ListPolicy::AnyOf;

/// Quantifier used when a level declares no `match` list
pub const DEFAULT_MATCH: Match = Match::Any;

/// Evaluate a `match` list under [`MATCH_LIST_POLICY`]
pub fn evaluate(quantifiers: &[Match], hits: usize, total: usize) -> bool {
    evaluate_with(MATCH_LIST_POLICY, quantifiers, hits, total)
}

/// Evaluate a `match` list under an explicit policy
pub fn evaluate_with(policy: ListPolicy, quantifiers: &[Match], hits: usize, total: usize) -> bool {
    if quantifiers.is_empty() {
        return DEFAULT_MATCH.matches(hits, total);
    }
    match policy {
        ListPolicy::AnyOf => quantifiers.iter().any(|q| q.matches(hits, total)),
        ListPolicy::AllOf => quantifiers.iter().all(|q| q.matches(hits, total)),
    }
}

/// Whether the verdict of a `match` list is already fixed.
///
/// `hits` of `total` votes have been observed and up to `remaining` votes are
/// still outstanding; each of them may come back true, false, or not counted.
/// Returns the verdict if every possible completion yields the same one.
pub fn decided(quantifiers: &[Match], hits: usize, total: usize, remaining: usize) -> Option<bool> {
    let current = evaluate(quantifiers, hits, total);
    for extra_hits in 0..=remaining {
        for extra_misses in 0..=(remaining - extra_hits) {
            let outcome = evaluate(
                quantifiers,
                hits + extra_hits,
                total + extra_hits + extra_misses,
            );
            if outcome != current {
                return None;
            }
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_QUANTIFIERS: [Match; 5] = [Match::None, Match::One, Match::Any, Match::All, Match::Some];

    #[test]
    fn test_truth_table() {
        for total in 0..6usize {
            for hits in 0..=total {
                for q in ALL_QUANTIFIERS {
                    let expected = match q {
                        Match::None => hits == 0,
                        Match::One => hits == 1,
                        Match::Any => hits >= 1,
                        Match::All => hits == total && total > 0,
                        Match::Some => hits > 1,
                    };
                    assert_eq!(q.matches(hits, total), expected, "{q} hits={hits} total={total}");
                }
            }
        }
    }

    #[test]
    fn test_all_is_not_vacuous() {
        assert!(!Match::All.matches(0, 0));
        assert!(Match::None.matches(0, 0));
    }

    #[test]
    fn test_list_policy_is_or() {
        assert_eq!(MATCH_LIST_POLICY, ListPolicy::AnyOf);
        assert!(evaluate(&[Match::None, Match::Some], 0, 3));
        assert!(evaluate(&[Match::None, Match::Some], 2, 3));
        assert!(!evaluate(&[Match::None, Match::Some], 1, 3));
    }

    #[test]
    fn test_all_of_policy() {
        assert!(evaluate_with(ListPolicy::AllOf, &[Match::Any, Match::All], 2, 2));
        assert!(!evaluate_with(ListPolicy::AllOf, &[Match::Any, Match::All], 1, 2));
    }

    #[test]
    fn test_empty_list_defaults_to_any() {
        assert!(evaluate(&[], 1, 1));
        assert!(!evaluate(&[], 0, 1));
    }

    #[test]
    fn test_decided() {
        // ANY is fixed once a single hit is seen
        assert_eq!(decided(&[Match::Any], 1, 1, 3), Some(true));
        // ...but not before
        assert_eq!(decided(&[Match::Any], 0, 1, 3), None);
        // nothing outstanding
        assert_eq!(decided(&[Match::Any], 0, 1, 0), Some(false));
        // NONE is lost after the first hit
        assert_eq!(decided(&[Match::None], 1, 2, 5), Some(false));
        // ONE can still flip from true to false
        assert_eq!(decided(&[Match::One], 1, 1, 1), None);
        // ALL is lost after the first miss
        assert_eq!(decided(&[Match::All], 1, 2, 4), Some(false));
    }

    #[test]
    fn test_serde_names() {
        let parsed: Vec<Match> = serde_json::from_str(r#"["NONE","ONE","ANY","ALL","SOME"]"#).unwrap();
        assert_eq!(parsed, ALL_QUANTIFIERS.to_vec());
    }
}
