// Candidate admission.
//
// Ballot entry happens through free-text forms, so a newly proposed
// candidate whose name is a near-miss of an existing one is far more
// likely a typo than a distinct contender. Admission refuses such names
// and reports the candidate they collide with; the tabulator itself never
// sees them.

use snafu::prelude::*;

use crate::tally::{AlreadyRegisteredSnafu, CliResult, EmptyCandidateSnafu, NearDuplicateSnafu};

/// Names whose normalized edit distance falls below this threshold are
/// treated as near-duplicates of each other.
const NEAR_DUPLICATE_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct CandidateRegistry {
    names: Vec<String>,
}

impl CandidateRegistry {
    pub fn new() -> CandidateRegistry {
        CandidateRegistry { names: Vec::new() }
    }

    /// The admitted candidates, in admission order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn admit(&mut self, name: &str) -> CliResult<()> {
        ensure!(!name.is_empty(), EmptyCandidateSnafu);
        ensure!(
            !self.names.iter().any(|n| n == name),
            AlreadyRegisteredSnafu { name }
        );
        if let Some(existing) = self
            .names
            .iter()
            .find(|n| normalized_distance(n, name) < NEAR_DUPLICATE_THRESHOLD)
        {
            return NearDuplicateSnafu {
                name,
                existing: existing.clone(),
            }
            .fail();
        }
        self.names.push(name.to_string());
        Ok(())
    }
}

/// Levenshtein distance between two strings, normalized by the length of
/// the longer one.
pub fn normalized_distance(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (longer, shorter) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    if longer.is_empty() {
        return 0.0;
    }

    // Two-row dynamic program over the shorter string.
    let mut prev: Vec<usize> = (0..=shorter.len()).collect();
    let mut cur: Vec<usize> = vec![0; shorter.len() + 1];
    for (i, &ca) in longer.iter().enumerate() {
        cur[0] = i + 1;
        for (j, &cb) in shorter.iter().enumerate() {
            let cost = usize::from(ca != cb);
            cur[j + 1] = (prev[j + 1] + 1)
                .min(cur[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[shorter.len()] as f64 / longer.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally::CliError;

    #[test]
    fn distances_are_normalized_by_the_longer_string() {
        assert_eq!(normalized_distance("kitten", "sitting"), 3.0 / 7.0);
        assert_eq!(normalized_distance("Tabasco", "Tobasco"), 1.0 / 7.0);
        assert_eq!(normalized_distance("same", "same"), 0.0);
        assert_eq!(normalized_distance("", ""), 0.0);
        assert_eq!(normalized_distance("abc", ""), 1.0);
    }

    #[test]
    fn distinct_names_are_admitted() {
        let mut registry = CandidateRegistry::new();
        registry.admit("Yellow Bird").unwrap();
        registry.admit("Chipotle Cholula").unwrap();
        registry.admit("Tabasco").unwrap();
        assert_eq!(registry.names().len(), 3);
    }

    #[test]
    fn near_misses_are_refused_with_the_existing_name() {
        let mut registry = CandidateRegistry::new();
        registry.admit("Tabasco").unwrap();
        let err = registry.admit("Tobasco").unwrap_err();
        match err {
            CliError::NearDuplicate { name, existing } => {
                assert_eq!(name, "Tobasco");
                assert_eq!(existing, "Tabasco");
            }
            x => panic!("unexpected error {:?}", x),
        }
    }

    #[test]
    fn exact_duplicates_and_empty_names_are_refused() {
        let mut registry = CandidateRegistry::new();
        registry.admit("Tabasco").unwrap();
        assert!(matches!(
            registry.admit("Tabasco").unwrap_err(),
            CliError::AlreadyRegistered { .. }
        ));
        assert!(matches!(
            registry.admit("").unwrap_err(),
            CliError::EmptyCandidate { .. }
        ));
    }
}
