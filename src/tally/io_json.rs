// Reader for ballots in the JSON exchange format.
//
// The file is an array of ballots:
// `[ { "voterId": "...", "rankings": [ { "candidate": "...", "rank": 1 }, ... ] }, ... ]`
// where rank 0 denotes "do not rank". A candidate that does not appear in
// a ballot's rankings is simply never reachable from that ballot.

use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;

use crate::tally::{CliResult, OpeningFileSnafu, ParsedBallot, ParsingJsonSnafu};

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankingRecord {
    pub candidate: String,
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct BallotRecord {
    #[serde(rename = "voterId")]
    pub voter_id: String,
    pub rankings: Vec<RankingRecord>,
}

pub fn read_json_ballots(path: &str) -> CliResult<Vec<ParsedBallot>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let records: Vec<BallotRecord> =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    Ok(records
        .into_iter()
        .map(|record| ParsedBallot {
            voter: record.voter_id,
            rankings: record
                .rankings
                .into_iter()
                .map(|entry| (entry.candidate, entry.rank))
                .collect(),
        })
        .collect())
}
