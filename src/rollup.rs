use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use voter_households::roster::fetch_full_roster;
use voter_households::*;

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Reader, Xlsx};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::rollup::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_json;
mod io_surveys;
mod io_xlsx;

#[derive(Debug, Snafu)]
pub enum BoothError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The spreadsheet is empty or the worksheet is missing"))]
    EmptyExcel {},
    #[snafu(display("Unexpected cell at line {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a positive integer"))]
    ParsingJsonNumber {},
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error parsing CSV line"))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Could not load the roster of booth {booth}"))]
    FetchRoster { source: RosterError, booth: String },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type BoothResult<T> = Result<T, BoothError>;

fn household_to_json(h: &Household, list_members: bool) -> BoothResult<JSValue> {
    let mut js = json!({
        "id": h.id,
        "kind": h.kind,
        "totalMembers": h.total_members(),
        "verifiedMembers": h.verified_members(),
        "surveyedMembers": h.surveyed_members(),
        "verifiedPercentage": h.verified_percentage(),
        "fullyVerified": h.is_fully_verified(),
        "headOfFamily": h.head_of_family().map(|m| m.name.clone()),
    });
    if let Some(k) = &h.address_key {
        js["addressKey"] = json!(k);
    }
    if list_members {
        js["members"] = serde_json::to_value(&h.members).context(ParsingJsonSnafu {})?;
    }
    Ok(js)
}

fn build_summary_js(
    settings: &OutputSettings,
    res: &RollupResult,
    search: Option<&str>,
) -> BoothResult<JSValue> {
    let c = OutputConfig {
        booth: settings.booth_name.clone(),
        assembly: settings.assembly_name.clone(),
        date: settings.date.clone(),
    };
    let list_members = settings.list_members.unwrap_or(true);
    let listed = search_households(&res.households, search.unwrap_or(""));
    if let Some(q) = search {
        info!(
            "{} households out of {} match {:?}",
            listed.len(),
            res.households.len(),
            q
        );
    }
    let mut households: Vec<JSValue> = Vec::new();
    for h in listed {
        households.push(household_to_json(h, list_members)?);
    }
    let ungrouped: Vec<String> = res.ungrouped.iter().map(|nv| nv.label()).collect();
    Ok(json!({
        "config": c,
        "stats": res.stats,
        "households": households,
        "ungrouped": ungrouped,
    }))
}

fn read_roster_data(
    root_path: &Path,
    cfs: &FileSource,
    booth_id: &str,
) -> BoothResult<(Vec<VoterRecord>, Option<u64>)> {
    let p: PathBuf = root_path.join(&cfs.file_path);
    let p2 = p.as_path().display().to_string();
    info!("Attempting to read roster {:?} for booth {}", p2, booth_id);
    match cfs.provider.as_str() {
        "json" => {
            let mut src = io_json::JsonFileRoster::new(&p2);
            let full = fetch_full_roster(&mut src, booth_id).context(FetchRosterSnafu {
                booth: booth_id.to_string(),
            })?;
            Ok((full.voters, Some(full.total_voters as u64)))
        }
        "csv" => Ok((io_csv::read_csv_roster(p2, cfs)?, None)),
        "xlsx" => Ok((io_xlsx::read_excel_roster(p2, cfs)?, None)),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn input_source(args: &Args, input: &str) -> BoothResult<FileSource> {
    let provider = match (&args.input_type, io_common::provider_from_extension(input)) {
        (Some(t), _) => t.clone(),
        (None, Some(t)) => t.to_string(),
        (None, None) => whatever!(
            "Cannot guess the type of {:?}, use --input-type (json, csv or xlsx)",
            input
        ),
    };
    let mut cfs = FileSource::new(&provider, input);
    cfs.booth_id = args.booth.clone();
    cfs.worksheet_name = args.excel_worksheet_name.clone();
    Ok(cfs)
}

/// Reads the configuration file, if any, and applies the command line overrides.
/// Returns the configuration and the directory relative paths are resolved against.
fn resolve_config(args: &Args) -> BoothResult<(BoothConfig, PathBuf)> {
    let (mut config, root) = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path.as_str())
                .parent()
                .context(MissingParentDirSnafu {})?
                .to_path_buf();
            (config, root)
        }
        (None, Some(input)) => {
            let config = BoothConfig {
                output_settings: OutputSettings {
                    booth_name: args
                        .booth
                        .clone()
                        .unwrap_or_else(|| io_common::simplify_file_name(input)),
                    assembly_name: None,
                    date: None,
                    output_directory: None,
                    list_members: None,
                },
                roster_sources: vec![],
                survey_source: None,
                rules: BoothRules::default(),
            };
            (config, PathBuf::from("."))
        }
        (None, None) => whatever!("Either --config or --input must be provided"),
    };

    if let Some(input) = &args.input {
        // Given on the command line: relative to the working directory.
        let input_abs = std::env::current_dir()
            .map(|d| d.join(input))
            .unwrap_or_else(|_| PathBuf::from(input));
        let mut cfs = input_source(args, input)?;
        cfs.file_path = input_abs.display().to_string();
        config.roster_sources = vec![cfs];
    }
    if let Some(booth) = &args.booth {
        config.output_settings.booth_name = booth.clone();
    }
    if let Some(surveys) = &args.surveys {
        let abs = std::env::current_dir()
            .map(|d| d.join(surveys))
            .unwrap_or_else(|_| PathBuf::from(surveys));
        config.survey_source = Some(SurveySource {
            file_path: abs.display().to_string(),
        });
    }
    Ok((config, root))
}

fn active_forms(args: &Args, config: &BoothConfig, root: &Path) -> u32 {
    if let Some(n) = args.active_forms {
        return n;
    }
    if let Some(ss) = &config.survey_source {
        let p = root.join(&ss.file_path).display().to_string();
        match io_surveys::read_active_forms(&p) {
            Ok(n) => return n,
            Err(e) => {
                // Same as an empty survey list.
                warn!("Could not load the survey list {:?}: {}", p, e);
                return 0;
            }
        }
    }
    config
        .rules
        .active_survey_forms
        .unwrap_or(RollupRules::DEFAULT_RULES.active_survey_forms)
}

fn write_output(
    args: &Args,
    config: &BoothConfig,
    root: &Path,
    pretty_js: &str,
) -> BoothResult<()> {
    let dest: Option<PathBuf> = match (&args.out, &config.output_settings.output_directory) {
        (Some(o), _) if o == "stdout" => None,
        (Some(o), _) => Some(PathBuf::from(o)),
        (None, Some(dir)) => {
            let file_name: String = config
                .output_settings
                .booth_name
                .chars()
                .map(|c| if c.is_alphanumeric() { c } else { '_' })
                .collect();
            Some(root.join(dir).join(format!("{}_summary.json", file_name)))
        }
        (None, None) => None,
    };
    match dest {
        Some(p) => {
            let path = p.display().to_string();
            info!("Writing summary to {:?}", path);
            fs::write(&p, pretty_js).context(WritingOutputSnafu { path })?;
        }
        None => println!("{}", pretty_js),
    }
    Ok(())
}

/// Loads the rosters, computes the rollup and writes the summary.
pub fn run_rollup(args: &Args) -> BoothResult<JSValue> {
    let (config, root) = resolve_config(args)?;
    info!("config: {:?}", config);

    if config.roster_sources.is_empty() {
        whatever!("No roster source detected");
    }

    // The rosters are always loaded before the survey list.
    let mut voters: Vec<VoterRecord> = Vec::new();
    let mut reported_total: Option<u64> = Some(0);
    for cfs in config.roster_sources.iter() {
        let booth_id = cfs
            .booth_id
            .clone()
            .unwrap_or_else(|| config.output_settings.booth_name.clone());
        let (mut file_data, total) = read_roster_data(&root, cfs, &booth_id)?;
        debug!("{} voters read from {:?}", file_data.len(), cfs.file_path);
        reported_total = match (reported_total, total) {
            (Some(a), Some(b)) => Some(a + b),
            _ => None,
        };
        voters.append(&mut file_data);
    }

    let rules = RollupRules {
        active_survey_forms: active_forms(args, &config, &root),
        reported_total: if config.rules.use_reported_total.unwrap_or(false) {
            reported_total
        } else {
            None
        },
    };

    let res = rollup(&voters, &rules);
    if !res.ungrouped.is_empty() {
        warn!(
            "{} voter(s) have neither a family id nor an address",
            res.ungrouped.len()
        );
    }

    let result_js = build_summary_js(&config.output_settings, &res, args.search.as_deref())?;
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;
    write_output(args, &config, &root, &pretty_js_stats)?;

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &args.reference {
        let summary_ref = read_summary(summary_p.clone())?;
        let mut computed = result_js.clone();
        normalize_summary(&mut computed);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty_computed =
            serde_json::to_string_pretty(&computed).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_computed {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_computed.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!("The summary matches the reference {:?}", summary_p);
    }

    Ok(result_js)
}
