use log::{info, warn};

use instant_runoff::builder::Builder;
use instant_runoff::*;
use snafu::{prelude::*, Snafu};

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;

pub mod config_reader;
pub mod io_csv;
pub mod io_json;
pub mod registry;

use crate::tally::config_reader::{read_config, read_summary};
use crate::tally::registry::CandidateRegistry;

// A ballot as it comes out of a file reader, before any validation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedBallot {
    pub voter: String,
    pub rankings: Vec<(String, u32)>,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON content in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading a CSV record"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("CSV line {lineno} is too short"))]
    CsvLineTooShort { lineno: usize },
    #[snafu(display("CSV line {lineno}: {value:?} is not a rank"))]
    CsvRank { lineno: usize, value: String },
    #[snafu(display("Candidate name may not be empty"))]
    EmptyCandidate {},
    #[snafu(display("Candidate {name:?} is already registered"))]
    AlreadyRegistered { name: String },
    #[snafu(display(
        "Candidate {name:?} is suspiciously close to the registered candidate {existing:?}"
    ))]
    NearDuplicate { name: String, existing: String },
    #[snafu(display("Invalid candidate registration: {source}"))]
    Registration { source: TallyError },
    #[snafu(display("Invalid ballot: {source}"))]
    InvalidBallot { source: TallyError },
    #[snafu(display("Tabulation failed: {source}"))]
    Tabulation { source: TallyError },
    #[snafu(display("The tabulated summary differs from the reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CliResult<T> = Result<T, CliError>;

/// Admits the candidates into the registry, validates every ballot through
/// the library builder and runs the tabulation.
fn tabulate(candidates: &[String], ballots: &[ParsedBallot]) -> CliResult<TallyResult> {
    let mut registry = CandidateRegistry::new();
    for name in candidates.iter() {
        registry.admit(name)?;
    }

    let mut builder = Builder::new()
        .candidates(registry.names())
        .context(RegistrationSnafu)?;
    let mut seen: HashSet<&str> = HashSet::new();
    for pb in ballots.iter() {
        if !seen.insert(pb.voter.as_str()) {
            warn!(
                "voter {:?} cast more than once, replacing the earlier ballot",
                pb.voter
            );
        }
        let rankings: Vec<(&str, u32)> = pb
            .rankings
            .iter()
            .map(|(candidate, rank)| (candidate.as_str(), *rank))
            .collect();
        builder.cast(&pb.voter, &rankings).context(InvalidBallotSnafu)?;
    }
    builder.tally().context(TabulationSnafu)
}

// Candidates listed in order of first appearance across the ballots. Used
// when tabulating a bare ballot file without a configuration.
fn infer_candidates(ballots: &[ParsedBallot]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for pb in ballots.iter() {
        for (candidate, _) in pb.rankings.iter() {
            if seen.insert(candidate.as_str()) {
                res.push(candidate.clone());
            }
        }
    }
    res
}

fn status_label(status: CandidateStatus) -> &'static str {
    match status {
        CandidateStatus::Active => "active",
        CandidateStatus::Eliminated => "eliminated",
    }
}

/// Renders the tally in the JSON exchange format consumed by the results
/// renderer.
fn result_to_json(result: &TallyResult) -> JSValue {
    let rounds: Vec<JSValue> = result
        .rounds
        .iter()
        .map(|round| {
            let mut table: JSMap<String, JSValue> = JSMap::new();
            for (name, tally) in round.candidate_results.iter() {
                table.insert(
                    name.clone(),
                    json!({"count": tally.count, "percentage": tally.percentage}),
                );
            }
            json!({
                "roundNumber": round.round,
                "totalActiveBallots": round.total_active_ballots,
                "candidateResults": table,
            })
        })
        .collect();
    let candidates: Vec<JSValue> = result
        .candidates
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "status": status_label(c.status),
                "currentRoundVotes": c.current_round_votes,
                "currentRoundPercentage": c.current_round_percentage,
            })
        })
        .collect();
    json!({
        "rounds": rounds,
        "winners": result.winners,
        "candidates": candidates,
    })
}

fn gather_election(args: &Args) -> CliResult<(Vec<String>, Vec<ParsedBallot>, Option<String>)> {
    if let Some(config_path) = &args.config {
        let config = read_config(config_path)?;
        info!("config: {:?}", config);
        info!("Tabulating contest {:?}", config.output_settings.contest_name);
        let root = Path::new(config_path.as_str())
            .parent()
            .unwrap_or_else(|| Path::new("."));
        let mut ballots: Vec<ParsedBallot> = Vec::new();
        for source in config.ballot_sources.iter() {
            let path = root.join(&source.file_path).display().to_string();
            info!("Attempting to read ballot file {:?}", path);
            let mut file_ballots = match source.provider.as_str() {
                "json" => io_json::read_json_ballots(&path)?,
                "csv" => io_csv::read_csv_ballots(&path)?,
                x => whatever!("Ballot provider {:?} is not supported", x),
            };
            ballots.append(&mut file_ballots);
        }
        Ok((
            config.candidates,
            ballots,
            config.output_settings.output_path,
        ))
    } else if let Some(input) = &args.input {
        let ballots = match args.input_type.as_deref().unwrap_or("json") {
            "json" => io_json::read_json_ballots(input)?,
            "csv" => io_csv::read_csv_ballots(input)?,
            x => whatever!("Input type {:?} is not supported", x),
        };
        let candidates = infer_candidates(&ballots);
        Ok((candidates, ballots, None))
    } else {
        whatever!("One of --config or --input must be provided")
    }
}

pub fn run_election(args: &Args) -> CliResult<()> {
    let (candidates, ballots, config_out) = gather_election(args)?;
    let result = tabulate(&candidates, &ballots)?;

    let summary = result_to_json(&result);
    let pretty = serde_json::to_string_pretty(&summary)
        .whatever_context("Could not serialize the summary")?;

    let out_path = args.out.clone().or(config_out);
    match out_path.as_deref() {
        None | Some("stdout") => println!("{}", pretty),
        Some(path) => {
            fs::write(path, &pretty).context(WritingSummarySnafu { path })?;
            info!("Summary written to {:?}", path);
        }
    }

    // The reference summary, if provided for comparison.
    if let Some(reference_path) = &args.reference {
        let reference = read_summary(reference_path)?;
        let pretty_reference = serde_json::to_string_pretty(&reference)
            .whatever_context("Could not serialize the reference summary")?;
        if pretty_reference != pretty {
            warn!("Found differences with the reference summary");
            print_diff(pretty_reference.as_str(), pretty.as_str(), "\n");
            return ReferenceMismatchSnafu {}.fail();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args(test_name: &str) -> Args {
        let dir = format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), test_name);
        Args {
            config: Some(format!("{}/config.json", dir)),
            input: None,
            input_type: None,
            out: Some("stdout".to_string()),
            reference: Some(format!("{}/expected_summary.json", dir)),
            verbose: false,
        }
    }

    fn test_wrapper(test_name: &str) -> CliResult<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        run_election(&test_args(test_name))
    }

    #[test]
    fn hot_sauce_first_round_majority() {
        test_wrapper("hot_sauce_majority").unwrap();
    }

    #[test]
    fn four_way_runoff_takes_three_rounds() {
        test_wrapper("four_way_runoff").unwrap();
    }

    #[test]
    fn csv_three_way_draw_has_no_winner() {
        test_wrapper("csv_three_way_draw").unwrap();
    }

    #[test]
    fn near_duplicate_candidate_is_refused() {
        let err = test_wrapper("near_duplicate_candidates").unwrap_err();
        assert!(matches!(err, CliError::NearDuplicate { .. }));
    }

    #[test]
    fn candidates_are_inferred_in_first_appearance_order() {
        let ballots = vec![
            ParsedBallot {
                voter: "v1".to_string(),
                rankings: vec![("Bob".to_string(), 1), ("Anna".to_string(), 2)],
            },
            ParsedBallot {
                voter: "v2".to_string(),
                rankings: vec![("Clara".to_string(), 1), ("Anna".to_string(), 2)],
            },
        ];
        assert_eq!(
            infer_candidates(&ballots),
            vec!["Bob".to_string(), "Anna".to_string(), "Clara".to_string()]
        );
    }

    #[test]
    fn recast_ballots_replace_earlier_ones() {
        let ballots = vec![
            ParsedBallot {
                voter: "v1".to_string(),
                rankings: vec![("Anna".to_string(), 1)],
            },
            ParsedBallot {
                voter: "v1".to_string(),
                rankings: vec![("Bob".to_string(), 1)],
            },
        ];
        let result = tabulate(&["Anna".to_string(), "Bob".to_string()], &ballots).unwrap();
        assert_eq!(result.winners, vec!["Bob".to_string()]);
        assert_eq!(result.rounds[0].total_active_ballots, 1);
    }
}
