// Primitives for reading CSV ballot files.
//
// The first row names the candidates: `voter,<candidate>,<candidate>,...`.
// Every later row carries one voter id followed by the rank that voter
// gave each candidate, an empty cell meaning "do not rank".

use log::debug;
use snafu::prelude::*;

use crate::tally::{
    CliResult, CsvLineParseSnafu, CsvLineTooShortSnafu, CsvOpenSnafu, CsvRankSnafu, ParsedBallot,
};

pub fn read_csv_ballots(path: &str) -> CliResult<Vec<ParsedBallot>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();
    let header = match records.next() {
        Some(line) => line.context(CsvLineParseSnafu {})?,
        None => whatever!("CSV file {:?} has no header row", path),
    };
    let candidates: Vec<String> = header
        .iter()
        .skip(1)
        .map(|s| s.trim().to_string())
        .collect();

    let mut res: Vec<ParsedBallot> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        // The header occupies line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu {})?;
        debug!("read_csv_ballots: line {}: {:?}", lineno, line);
        let voter = line
            .get(0)
            .context(CsvLineTooShortSnafu { lineno })?
            .to_string();
        let mut rankings: Vec<(String, u32)> = Vec::with_capacity(candidates.len());
        for (col, candidate) in candidates.iter().enumerate() {
            let cell = line
                .get(col + 1)
                .context(CsvLineTooShortSnafu { lineno })?
                .trim();
            let rank: u32 = if cell.is_empty() {
                0
            } else {
                cell.parse()
                    .ok()
                    .context(CsvRankSnafu { lineno, value: cell })?
            };
            rankings.push((candidate.clone(), rank));
        }
        res.push(ParsedBallot { voter, rankings });
    }
    Ok(res)
}
