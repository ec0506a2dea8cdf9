use clap::Parser;

/// Household and survey progress rollups for booth voter rosters.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the booth: roster sources, survey list and output settings.
    /// Relative paths inside it are resolved against its directory.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference summary in JSON format. If provided, boothroll will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The roster to read. Setting this option overrides the roster sources of the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json, csv or xlsx) The type of the input. Guessed from the file extension if not provided.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// The booth identifier, used as the booth name in the summary.
    #[clap(short, long, value_parser)]
    pub booth: Option<String>,

    /// (file path) The list of survey forms, in JSON format. Active forms are counted to estimate the pending visits.
    #[clap(long, value_parser)]
    pub surveys: Option<String>,

    /// The number of active survey forms. Takes precedence over --surveys.
    #[clap(long, value_parser)]
    pub active_forms: Option<u32>,

    /// Only list the households matching this text (name, EPIC number, address, mobile or household id).
    /// The statistics always cover the whole booth.
    #[clap(short, long, value_parser)]
    pub search: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use. Defaults to the first one.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging. Logs go to the standard error, the summary to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
