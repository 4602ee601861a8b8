use clap::Parser;

/// This is an instant-runoff (ranked-choice) vote tabulation program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) A JSON election description: contest settings, the candidate list and
    /// the ballot sources. For the file format, read the documentation.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A ballot file to tabulate directly, without a configuration file. The
    /// candidates are inferred from the ballots in order of first appearance.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The format of the --input file: json or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be
    /// written in JSON format to the given location. Setting this option overrides the
    /// path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format.
    /// If provided, irvtally will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
