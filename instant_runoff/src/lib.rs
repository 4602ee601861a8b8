//! Instant-runoff (ranked-choice) vote tabulation.
//!
//! The crate takes a registered candidate list and a pile of ranked
//! ballots, runs elimination rounds until a candidate holds a majority of
//! the active ballots (or no progress can be made), and returns the full
//! round-by-round history. Ballot collection and validation live in
//! [`builder::Builder`]; the tabulation itself is a pure computation over
//! already-validated data.

mod config;
pub mod builder;

use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

/// Position of one candidate within a normalized ballot.
///
/// The derived ordering is the normalizer's sort comparator: `Ranked`
/// entries ascend by rank and every `DoNotRank` entry sorts after all of
/// them, so "do not rank" never has to be re-inferred at allocation time.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
enum Preference {
    Ranked(u32),
    DoNotRank,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum BallotStatus {
    Active,
    Exhausted,
}

// A ballot after normalization: ranked entries first in ascending rank
// order, do-not-rank entries last.
#[derive(Eq, PartialEq, Debug, Clone)]
struct BallotState {
    voter: String,
    status: BallotStatus,
    prefs: Vec<(CandidateId, Preference)>,
    // Resume pointer. Everything before it is eliminated for good, so no
    // later round re-scans the prefix this ballot has already burned.
    cursor: usize,
}

#[derive(Eq, PartialEq, Debug, Clone)]
struct CandidateState {
    id: CandidateId,
    name: String,
    status: CandidateStatus,
    votes: u64,
    percentage: u32,
}

/// A candidate wins outright when it holds at least this share of the
/// round's active ballots.
const MAJORITY_PERCENT: u32 = 50;

/// Tabulates one election and returns the complete round history.
///
/// Arguments:
/// * `candidate_names` the registered candidates, in registration order
/// * `ballots` the collected ballots. Nonzero ranks are assumed to be
///   unique and densely sequential within each ballot; the
///   [`builder::Builder`] enforces this upstream.
///
/// Degenerate inputs (no candidates, no ballots, a tie spanning the whole
/// field) are not errors and resolve to an empty winner list. Errors are
/// only returned for caller-side contract violations that would otherwise
/// corrupt the totals.
pub fn run_tally(
    candidate_names: &[String],
    ballots: &[RawBallot],
) -> Result<TallyResult, TallyError> {
    info!(
        "run_tally: processing {} ballots over {} candidates",
        ballots.len(),
        candidate_names.len()
    );
    let mut candidates = register_candidates(candidate_names)?;
    for c in candidates.iter() {
        info!("Candidate {}: {}", c.id.0, c.name);
    }
    let mut prepared = prepare_ballots(ballots, &candidates)?;
    let (rounds, winners) = reduce(&mut candidates, &mut prepared);
    Ok(assemble_result(rounds, winners, candidates))
}

fn register_candidates(names: &[String]) -> Result<Vec<CandidateState>, TallyError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<CandidateState> = Vec::with_capacity(names.len());
    for (idx, name) in names.iter().enumerate() {
        if name.is_empty() {
            return Err(TallyError::EmptyCandidateName);
        }
        if !seen.insert(name.as_str()) {
            return Err(TallyError::DuplicateCandidate { name: name.clone() });
        }
        res.push(CandidateState {
            id: CandidateId(idx as u32),
            name: name.clone(),
            status: CandidateStatus::Active,
            votes: 0,
            percentage: 0,
        });
    }
    Ok(res)
}

/// Canonicalizes the raw ballots: ranked entries sorted ascending by rank,
/// do-not-rank entries appended last, resume pointer at the start.
///
/// Malformed rank sequences are a caller invariant and are not checked
/// here, but a ballot naming an unregistered candidate is rejected loudly.
fn prepare_ballots(
    raw: &[RawBallot],
    candidates: &[CandidateState],
) -> Result<Vec<BallotState>, TallyError> {
    let ids: HashMap<&str, CandidateId> = candidates
        .iter()
        .map(|c| (c.name.as_str(), c.id))
        .collect();
    let mut res: Vec<BallotState> = Vec::with_capacity(raw.len());
    for ballot in raw.iter() {
        let mut prefs: Vec<(CandidateId, Preference)> = Vec::with_capacity(ballot.rankings.len());
        for entry in ballot.rankings.iter() {
            let cid = *ids
                .get(entry.candidate.as_str())
                .ok_or_else(|| TallyError::UnknownCandidate {
                    voter: ballot.voter.clone(),
                    candidate: entry.candidate.clone(),
                })?;
            let pref = match entry.rank {
                0 => Preference::DoNotRank,
                r => Preference::Ranked(r),
            };
            prefs.push((cid, pref));
        }
        prefs.sort_by_key(|&(_, pref)| pref);
        res.push(BallotState {
            voter: ballot.voter.clone(),
            status: BallotStatus::Active,
            prefs,
            cursor: 0,
        });
    }
    Ok(res)
}

/// Finds the highest-ranked still-active candidate on a ballot, resuming
/// from the cursor. Marks the ballot exhausted when only do-not-rank
/// entries remain or the list runs out.
fn allocate(ballot: &mut BallotState, active: &HashSet<CandidateId>) -> Option<CandidateId> {
    while let Some(&(cid, pref)) = ballot.prefs.get(ballot.cursor) {
        if pref == Preference::DoNotRank {
            break;
        }
        if active.contains(&cid) {
            return Some(cid);
        }
        ballot.cursor += 1;
    }
    debug!("allocate: ballot {:?} is exhausted", ballot.voter);
    ballot.status = BallotStatus::Exhausted;
    None
}

/// Integer round-half-up of `votes * 100 / total`.
fn percentage(votes: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        ((200 * votes + total) / (2 * total)) as u32
    }
}

/// Runs one allocation and tally pass over all active ballots.
///
/// The allocation is a pure function of the candidate status set and each
/// ballot's resume pointer: re-running the round with unchanged inputs
/// yields the identical result.
fn count_round(
    round: u32,
    candidates: &mut [CandidateState],
    ballots: &mut [BallotState],
) -> RoundResult {
    for c in candidates.iter_mut() {
        c.votes = 0;
        c.percentage = 0;
    }
    let active_ids: HashSet<CandidateId> = candidates
        .iter()
        .filter(|c| c.status == CandidateStatus::Active)
        .map(|c| c.id)
        .collect();

    // The denominator is frozen here: ballots exhausted during this round
    // still count towards the round's totals.
    let total_active_ballots = ballots
        .iter()
        .filter(|b| b.status == BallotStatus::Active)
        .count() as u64;

    for ballot in ballots
        .iter_mut()
        .filter(|b| b.status == BallotStatus::Active)
    {
        if let Some(cid) = allocate(ballot, &active_ids) {
            candidates[cid.0 as usize].votes += 1;
        }
    }

    for c in candidates.iter_mut() {
        c.percentage = percentage(c.votes, total_active_ballots);
    }

    let candidate_results = candidates
        .iter()
        .map(|c| {
            (
                c.name.clone(),
                CandidateTally {
                    count: c.votes,
                    percentage: c.percentage,
                },
            )
        })
        .collect();
    RoundResult {
        round,
        total_active_ballots,
        candidate_results,
    }
}

/// The round loop: tabulate, check for winners, batch-eliminate the
/// candidates tied at the minimum, repeat.
///
/// Every non-terminal round removes at least one candidate from the active
/// set, so the loop is bounded by the size of the initial field. This
/// never errors: empty input, all-exhausted ballots and a tie spanning the
/// whole field all resolve to an empty winner list.
fn reduce(
    candidates: &mut [CandidateState],
    ballots: &mut [BallotState],
) -> (Vec<RoundResult>, Vec<String>) {
    let mut rounds: Vec<RoundResult> = Vec::new();
    let max_rounds = candidates.len();
    while rounds.len() < max_rounds {
        let round_id = rounds.len() as u32 + 1;
        let round = count_round(round_id, candidates, ballots);
        info!(
            "Round {} ({} active ballots)",
            round_id, round.total_active_ballots
        );
        for c in candidates.iter() {
            debug!("    {} {} ({}%)", c.votes, c.name, c.percentage);
        }
        rounds.push(round);

        // Majority check. Several candidates can cross the threshold in
        // the same round and all of them win.
        let mut winners: Vec<String> = candidates
            .iter()
            .filter(|c| {
                c.status == CandidateStatus::Active
                    && c.percentage >= MAJORITY_PERCENT
                    && c.votes > 0
            })
            .map(|c| c.name.clone())
            .collect();
        if !winners.is_empty() {
            winners.sort();
            return (rounds, winners);
        }

        let active: Vec<CandidateId> = candidates
            .iter()
            .filter(|c| c.status == CandidateStatus::Active)
            .map(|c| c.id)
            .collect();

        // Single-candidate collapse: the last one standing wins only if
        // some ballot still supports it.
        if let [lone] = active.as_slice() {
            let c = &candidates[lone.0 as usize];
            if c.votes > 0 {
                return (rounds, vec![c.name.clone()]);
            }
            debug!("reduce: last candidate {:?} has no votes", c.name);
            return (rounds, Vec::new());
        }

        let min_votes = match active
            .iter()
            .map(|cid| candidates[cid.0 as usize].votes)
            .min()
        {
            Some(v) => v,
            None => return (rounds, Vec::new()),
        };

        // Batch elimination: every candidate tied at the minimum goes in
        // one step. Deterministic by construction, no secondary tie-break.
        let mut eliminated = 0usize;
        for c in candidates.iter_mut() {
            if c.status == CandidateStatus::Active && c.votes == min_votes {
                info!(
                    "Round {}: eliminating {} with {} votes",
                    round_id, c.name, c.votes
                );
                c.status = CandidateStatus::Eliminated;
                eliminated += 1;
            }
        }

        // Termination backstop: a round that eliminates nobody cannot make
        // progress.
        if eliminated == 0 {
            break;
        }
        // The batch may have covered the whole remaining field. Nobody is
        // left to win.
        if active.len() == eliminated {
            break;
        }
    }
    (rounds, Vec::new())
}

/// Assembles the immutable result from the round history, the winner set
/// and the final candidate records. Nothing is mutated past this point.
fn assemble_result(
    rounds: Vec<RoundResult>,
    winners: Vec<String>,
    candidates: Vec<CandidateState>,
) -> TallyResult {
    TallyResult {
        rounds,
        winners,
        candidates: candidates
            .into_iter()
            .map(|c| Candidate {
                name: c.name,
                status: c.status,
                current_round_votes: c.votes,
                current_round_percentage: c.percentage,
            })
            .collect(),
    }
}
