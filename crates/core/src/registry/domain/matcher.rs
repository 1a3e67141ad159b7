use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::domain::registry_error::ConfigError;
use crate::registry::domain::registry_state::IdentityId;
use crate::shared::constants::DEFAULT_MATCH_THRESHOLD;
use crate::shared::encoding::Encoding;

/// How to choose among several known encodings that are all within threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Lowest id within threshold wins, regardless of distance.
    #[default]
    First,
    /// Closest encoding within threshold wins; ties go to the lower id.
    Nearest,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPolicy::First => write!(f, "first"),
            MatchPolicy::Nearest => write!(f, "nearest"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(MatchPolicy::First),
            "nearest" => Ok(MatchPolicy::Nearest),
            other => Err(ConfigError::UnknownMatchPolicy(other.to_string())),
        }
    }
}

/// Stateless decision: which known identity, if any, a candidate belongs to.
///
/// Distances are Euclidean and the threshold is inclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matcher {
    threshold: f64,
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(threshold: f64, policy: MatchPolicy) -> Self {
        Self { threshold, policy }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    pub fn find_match(
        &self,
        candidate: &Encoding,
        known: &BTreeMap<IdentityId, Encoding>,
    ) -> Option<IdentityId> {
        match self.policy {
            MatchPolicy::First => first_within_threshold(candidate, known, self.threshold),
            MatchPolicy::Nearest => nearest_within_threshold(candidate, known, self.threshold),
        }
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD, MatchPolicy::First)
    }
}

/// First id in ascending order whose encoding is within `threshold`.
pub fn first_within_threshold(
    candidate: &Encoding,
    known: &BTreeMap<IdentityId, Encoding>,
    threshold: f64,
) -> Option<IdentityId> {
    known
        .iter()
        .find(|(_, encoding)| candidate.distance(encoding) <= threshold)
        .map(|(&id, _)| id)
}

/// Id of the closest encoding within `threshold`.
pub fn nearest_within_threshold(
    candidate: &Encoding,
    known: &BTreeMap<IdentityId, Encoding>,
    threshold: f64,
) -> Option<IdentityId> {
    let mut best: Option<(IdentityId, f64)> = None;
    for (&id, encoding) in known {
        let distance = candidate.distance(encoding);
        if distance > threshold {
            continue;
        }
        if best.map_or(true, |(_, best_distance)| distance < best_distance) {
            best = Some((id, distance));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const DIM: usize = 128;

    /// 128-d encoding that is zero except for the first component.
    fn along_axis(x: f64) -> Encoding {
        let mut values = vec![0.0; DIM];
        values[0] = x;
        Encoding::new(values)
    }

    fn known(entries: &[(IdentityId, f64)]) -> BTreeMap<IdentityId, Encoding> {
        entries
            .iter()
            .map(|&(id, x)| (id, along_axis(x)))
            .collect()
    }

    #[test]
    fn test_empty_known_never_matches() {
        let matcher = Matcher::default();
        assert_eq!(matcher.find_match(&along_axis(0.0), &BTreeMap::new()), None);
    }

    #[rstest]
    #[case::identical(0.0, Some(1))]
    #[case::well_inside(0.3, Some(1))]
    #[case::exactly_on_threshold(0.6, Some(1))]
    #[case::just_outside(0.6 + 1e-9, None)]
    #[case::far_away(0.9, None)]
    fn test_threshold_is_inclusive(#[case] x: f64, #[case] expected: Option<IdentityId>) {
        let matcher = Matcher::new(0.6, MatchPolicy::First);
        assert_eq!(matcher.find_match(&along_axis(x), &known(&[(1, 0.0)])), expected);
    }

    #[test]
    fn test_first_policy_prefers_lowest_id_over_closest() {
        // Candidate at 0.5: id 1 is 0.5 away, id 2 only 0.1 away.
        let known = known(&[(1, 0.0), (2, 0.6)]);
        let matcher = Matcher::new(0.6, MatchPolicy::First);
        assert_eq!(matcher.find_match(&along_axis(0.5), &known), Some(1));
    }

    #[test]
    fn test_nearest_policy_prefers_closest() {
        let known = known(&[(1, 0.0), (2, 0.6)]);
        let matcher = Matcher::new(0.6, MatchPolicy::Nearest);
        assert_eq!(matcher.find_match(&along_axis(0.5), &known), Some(2));
    }

    #[test]
    fn test_nearest_policy_breaks_ties_towards_lower_id() {
        let known = known(&[(4, 0.0), (7, 1.0)]);
        let matcher = Matcher::new(0.6, MatchPolicy::Nearest);
        assert_eq!(matcher.find_match(&along_axis(0.5), &known), Some(4));
    }

    #[test]
    fn test_first_policy_skips_ids_outside_threshold() {
        let known = known(&[(1, -1.0), (2, 0.2), (3, 0.1)]);
        let matcher = Matcher::new(0.6, MatchPolicy::First);
        assert_eq!(matcher.find_match(&along_axis(0.0), &known), Some(2));
    }

    #[test]
    fn test_match_is_deterministic() {
        let known = known(&[(1, 0.0), (2, 0.4), (3, 0.8)]);
        let candidate = along_axis(0.45);
        for policy in [MatchPolicy::First, MatchPolicy::Nearest] {
            let matcher = Matcher::new(0.6, policy);
            let first = matcher.find_match(&candidate, &known);
            for _ in 0..10 {
                assert_eq!(matcher.find_match(&candidate, &known), first);
            }
        }
    }

    #[test]
    fn test_zero_threshold_requires_exact_match() {
        let matcher = Matcher::new(0.0, MatchPolicy::First);
        let known = known(&[(1, 0.25)]);
        assert_eq!(matcher.find_match(&along_axis(0.25), &known), Some(1));
        assert_eq!(matcher.find_match(&along_axis(0.26), &known), None);
    }

    #[rstest]
    #[case::first("first", MatchPolicy::First)]
    #[case::nearest("nearest", MatchPolicy::Nearest)]
    fn test_policy_parses_and_displays(#[case] text: &str, #[case] policy: MatchPolicy) {
        assert_eq!(text.parse::<MatchPolicy>().unwrap(), policy);
        assert_eq!(policy.to_string(), text);
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(matches!(
            "closest".parse::<MatchPolicy>(),
            Err(ConfigError::UnknownMatchPolicy(_))
        ));
    }
}
