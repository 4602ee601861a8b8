pub use crate::config::*;
use crate::run_tally;

use std::collections::HashSet;

/// A builder for collecting candidates and ballots.
///
/// The builder is the validation layer the tabulator relies on: it rejects
/// the rank shapes the core assumes away (duplicate or non-sequential
/// ranks, unregistered candidates) and implements the one-ballot-per-voter
/// rule, where casting again replaces the earlier ballot.
///
/// ```
/// use instant_runoff::builder::Builder;
/// # use instant_runoff::TallyError;
///
/// let mut builder = Builder::new().candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.cast("voter-1", &[("Anna", 1), ("Bob", 2)])?;
/// builder.cast("voter-2", &[("Anna", 1), ("Bob", 0)])?;
///
/// let result = builder.tally()?;
/// assert_eq!(result.winners, vec!["Anna".to_string()]);
///
/// # Ok::<(), TallyError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    candidates: Vec<String>,
    ballots: Vec<RawBallot>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder {
            candidates: Vec::new(),
            ballots: Vec::new(),
        }
    }

    /// Registers the candidates, in the order they will be reported.
    pub fn candidates(self, names: &[String]) -> Result<Builder, TallyError> {
        let mut seen: HashSet<&str> = HashSet::new();
        for name in names.iter() {
            if name.is_empty() {
                return Err(TallyError::EmptyCandidateName);
            }
            if !seen.insert(name.as_str()) {
                return Err(TallyError::DuplicateCandidate { name: name.clone() });
            }
        }
        Ok(Builder {
            candidates: names.to_vec(),
            ballots: self.ballots,
        })
    }

    /// Records one voter's ballot as (candidate, rank) pairs, where rank 0
    /// means "do not rank".
    ///
    /// Nonzero ranks must be unique and form a dense sequence starting at
    /// 1. A voter who casts again replaces their earlier ballot.
    pub fn cast(&mut self, voter: &str, rankings: &[(&str, u32)]) -> Result<(), TallyError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut ranked: Vec<u32> = Vec::new();
        for &(candidate, rank) in rankings.iter() {
            if !self.candidates.iter().any(|c| c == candidate) {
                return Err(TallyError::UnknownCandidate {
                    voter: voter.to_string(),
                    candidate: candidate.to_string(),
                });
            }
            if !seen.insert(candidate) {
                return Err(TallyError::RepeatedCandidate {
                    voter: voter.to_string(),
                    candidate: candidate.to_string(),
                });
            }
            if rank > 0 {
                ranked.push(rank);
            }
        }
        ranked.sort_unstable();
        for (idx, &rank) in ranked.iter().enumerate() {
            let expected = idx as u32 + 1;
            if rank == expected {
                continue;
            }
            if idx > 0 && rank == ranked[idx - 1] {
                return Err(TallyError::DuplicateRank {
                    voter: voter.to_string(),
                    rank,
                });
            }
            return Err(TallyError::SkippedRank {
                voter: voter.to_string(),
                rank: expected,
            });
        }

        let ballot = RawBallot {
            voter: voter.to_string(),
            rankings: rankings
                .iter()
                .map(|&(candidate, rank)| RankEntry {
                    candidate: candidate.to_string(),
                    rank,
                })
                .collect(),
        };
        match self.ballots.iter_mut().find(|b| b.voter == voter) {
            Some(existing) => *existing = ballot,
            None => self.ballots.push(ballot),
        }
        Ok(())
    }

    /// Runs the tabulation over everything collected so far.
    pub fn tally(&self) -> Result<TallyResult, TallyError> {
        run_tally(&self.candidates, &self.ballots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_candidates() -> Builder {
        Builder::new()
            .candidates(&["Anna".to_string(), "Bob".to_string()])
            .unwrap()
    }

    #[test]
    fn recasting_replaces_the_earlier_ballot() {
        let mut builder = two_candidates();
        builder.cast("v1", &[("Anna", 1), ("Bob", 2)]).unwrap();
        builder.cast("v1", &[("Bob", 1), ("Anna", 2)]).unwrap();
        let result = builder.tally().unwrap();
        assert_eq!(result.winners, vec!["Bob".to_string()]);
        assert_eq!(result.rounds[0].total_active_ballots, 1);
    }

    #[test]
    fn duplicate_ranks_are_rejected() {
        let mut builder = two_candidates();
        let err = builder.cast("v1", &[("Anna", 1), ("Bob", 1)]).unwrap_err();
        assert_eq!(
            err,
            TallyError::DuplicateRank {
                voter: "v1".to_string(),
                rank: 1
            }
        );
    }

    #[test]
    fn rank_gaps_are_rejected() {
        let mut builder = two_candidates();
        let err = builder.cast("v1", &[("Anna", 1), ("Bob", 3)]).unwrap_err();
        assert_eq!(
            err,
            TallyError::SkippedRank {
                voter: "v1".to_string(),
                rank: 2
            }
        );
    }

    #[test]
    fn ranks_must_start_at_one() {
        let mut builder = two_candidates();
        let err = builder.cast("v1", &[("Anna", 2), ("Bob", 3)]).unwrap_err();
        assert_eq!(
            err,
            TallyError::SkippedRank {
                voter: "v1".to_string(),
                rank: 1
            }
        );
    }

    #[test]
    fn a_candidate_may_only_appear_once_per_ballot() {
        let mut builder = two_candidates();
        let err = builder.cast("v1", &[("Anna", 1), ("Anna", 2)]).unwrap_err();
        assert_eq!(
            err,
            TallyError::RepeatedCandidate {
                voter: "v1".to_string(),
                candidate: "Anna".to_string()
            }
        );
    }

    #[test]
    fn all_do_not_rank_is_a_valid_ballot() {
        let mut builder = two_candidates();
        builder.cast("v1", &[("Anna", 0), ("Bob", 0)]).unwrap();
        let result = builder.tally().unwrap();
        assert!(result.winners.is_empty());
    }

    #[test]
    fn unknown_candidates_are_rejected_at_cast_time() {
        let mut builder = two_candidates();
        let err = builder.cast("v1", &[("Zoe", 1)]).unwrap_err();
        assert_eq!(
            err,
            TallyError::UnknownCandidate {
                voter: "v1".to_string(),
                candidate: "Zoe".to_string()
            }
        );
    }
}
