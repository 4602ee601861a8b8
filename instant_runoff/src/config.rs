// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// One entry on a raw ballot: a candidate and the rank the voter gave it.
///
/// A rank of `0` means "do not rank": the voter explicitly declined to
/// support this candidate and the ballot can never transfer to it.
/// Nonzero ranks must be unique within a ballot and form a dense sequence
/// starting at 1. The tabulator assumes this invariant holds; it is
/// enforced by the [`Builder`](crate::builder::Builder) or by whatever
/// collection layer sits upstream.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct RankEntry {
    pub candidate: String,
    pub rank: u32,
}

/// A full ballot as collected from one voter, in no particular order.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawBallot {
    pub voter: String,
    pub rankings: Vec<RankEntry>,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CandidateStatus {
    Active,
    /// Once a candidate is eliminated it never comes back within a run.
    Eliminated,
}

/// Final snapshot of one candidate after the last tabulated round.
///
/// The round in which a candidate was eliminated is not stored here: it is
/// the first round in which its tally drops to zero in
/// [`TallyResult::rounds`].
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub status: CandidateStatus,
    pub current_round_votes: u64,
    pub current_round_percentage: u32,
}

/// Votes and share of the active ballots for one candidate in one round.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CandidateTally {
    pub count: u64,
    /// Integer percentage of the round's active ballots, rounded half-up.
    pub percentage: u32,
}

/// Statistics for one round.
///
/// Every registered candidate appears in `candidate_results`, including the
/// ones eliminated in earlier rounds (reported as 0/0), so that callers can
/// render stable cross-round tables.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RoundResult {
    pub round: u32,
    /// Count of ballots that were still active when the round started. The
    /// denominator does not shrink for ballots exhausted mid-round.
    pub total_active_ballots: u64,
    pub candidate_results: BTreeMap<String, CandidateTally>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyResult {
    pub rounds: Vec<RoundResult>,
    /// Sorted by name. Empty when no candidate ever reaches the majority
    /// threshold; more than one only when several candidates cross it in
    /// the same round.
    pub winners: Vec<String>,
    pub candidates: Vec<Candidate>,
}

// ******** Errors *********

/// Contract violations detected while collecting or tabulating ballots.
///
/// Degenerate elections (no candidates, no ballots, a tie across the whole
/// field) are not errors: they resolve to a [`TallyResult`] with no
/// winners. These variants only flag programming errors in the caller,
/// which would silently corrupt round totals if tolerated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyError {
    EmptyCandidateName,
    DuplicateCandidate { name: String },
    UnknownCandidate { voter: String, candidate: String },
    RepeatedCandidate { voter: String, candidate: String },
    DuplicateRank { voter: String, rank: u32 },
    SkippedRank { voter: String, rank: u32 },
}

impl Error for TallyError {}

impl Display for TallyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyError::EmptyCandidateName => {
                write!(f, "candidate names may not be empty")
            }
            TallyError::DuplicateCandidate { name } => {
                write!(f, "candidate {:?} is registered more than once", name)
            }
            TallyError::UnknownCandidate { voter, candidate } => {
                write!(
                    f,
                    "ballot {:?} references unregistered candidate {:?}",
                    voter, candidate
                )
            }
            TallyError::RepeatedCandidate { voter, candidate } => {
                write!(
                    f,
                    "ballot {:?} ranks candidate {:?} more than once",
                    voter, candidate
                )
            }
            TallyError::DuplicateRank { voter, rank } => {
                write!(f, "ballot {:?} uses rank {} more than once", voter, rank)
            }
            TallyError::SkippedRank { voter, rank } => {
                write!(f, "ballot {:?} skips rank {}", voter, rank)
            }
        }
    }
}
