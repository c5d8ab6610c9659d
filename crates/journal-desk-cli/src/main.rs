use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use journal_desk_api::{FilterRequest, JournalDesk};
use journal_desk_core::{
    classify_status, recommendation_affordance, JournalRecord, JournalStatus,
    RecommendationAffordance, RecommendationRecord, StatusBadge,
};
use serde::Serialize;
use time::macros::format_description;
use time::Date;

const CLI_CONTRACT_VERSION: &str = "jd.v1";

#[derive(Debug, Parser)]
#[command(name = "jd")]
#[command(about = "Journal Desk CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Filter a journal list with search, status, category, and date-range
    /// criteria.
    Filter(FilterArgs),
    /// Distinct-value facet lists for filter controls.
    Facets(JournalsArgs),
    /// Per-status journal tallies.
    StatusCounts(JournalsArgs),
    /// Display label and badge color for a status value.
    Classify(ClassifyArgs),
    /// Editorial affordance for one journal's recommendation.
    Affordance(AffordanceArgs),
}

#[derive(Debug, Args)]
struct JournalsArgs {
    #[arg(long)]
    journals: PathBuf,
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(long)]
    journals: PathBuf,
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long)]
    status: Option<String>,
    #[arg(long)]
    subject_area: Option<String>,
    #[arg(long)]
    section: Option<String>,
    #[arg(long)]
    within: Option<String>,
    /// Evaluation date for range filters (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    as_of: Option<String>,
}

#[derive(Debug, Args)]
struct ClassifyArgs {
    #[arg(long)]
    status: String,
}

#[derive(Debug, Args)]
struct AffordanceArgs {
    #[arg(long)]
    recommendations: PathBuf,
    #[arg(long)]
    journal_id: u64,
}

#[derive(Debug, Serialize)]
struct FilterOutput<'a> {
    cli_version: &'static str,
    as_of: String,
    total: usize,
    matched: usize,
    journals: Vec<&'a JournalRecord>,
}

#[derive(Debug, Serialize)]
struct FacetsOutput {
    cli_version: &'static str,
    facets: journal_desk_core::Facets,
}

#[derive(Debug, Serialize)]
struct StatusCountsOutput {
    cli_version: &'static str,
    total: usize,
    counts: BTreeMap<JournalStatus, usize>,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    cli_version: &'static str,
    status: String,
    badge: StatusBadge,
}

#[derive(Debug, Serialize)]
struct AffordanceOutput {
    cli_version: &'static str,
    journal_id: u64,
    affordance: RecommendationAffordance,
    recommendation: Option<RecommendationRecord>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Filter(args) => run_filter(&args),
        Command::Facets(args) => run_facets(&args),
        Command::StatusCounts(args) => run_status_counts(&args),
        Command::Classify(args) => run_classify(&args),
        Command::Affordance(args) => run_affordance(&args),
    }
}

fn load_journals(path: &Path) -> Result<Vec<JournalRecord>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("failed to read journals file {}", path.display()))?;
    let journals: Vec<JournalRecord> = serde_json::from_str(&body)
        .with_context(|| format!("journals file {} is not valid JSON", path.display()))?;
    Ok(journals)
}

fn parse_as_of(value: Option<&str>) -> Result<Date> {
    let format = format_description!("[year]-[month]-[day]");
    match value {
        Some(value) => Date::parse(value, &format)
            .with_context(|| format!("invalid --as-of date: {value} (expected YYYY-MM-DD)")),
        None => Ok(today()),
    }
}

// The engine takes the evaluation date as a parameter; the local calendar
// is consulted only here, at the process boundary.
fn today() -> Date {
    time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc()).date()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_filter(args: &FilterArgs) -> Result<()> {
    let journals = load_journals(&args.journals)?;
    let desk = JournalDesk::load(journals, vec![])?;
    let as_of = parse_as_of(args.as_of.as_deref())?;

    let request = FilterRequest {
        search_term: args.search.clone(),
        status: args.status.clone(),
        subject_area: args.subject_area.clone(),
        journal_section: args.section.clone(),
        submitted_within: args.within.clone(),
        as_of: Some(as_of),
    };
    let matched = desk.filter(&request, as_of)?;

    let format = format_description!("[year]-[month]-[day]");
    print_json(&FilterOutput {
        cli_version: CLI_CONTRACT_VERSION,
        as_of: as_of.format(&format).context("failed to format as_of date")?,
        total: desk.journals().len(),
        matched: matched.len(),
        journals: matched,
    })
}

fn run_facets(args: &JournalsArgs) -> Result<()> {
    let journals = load_journals(&args.journals)?;
    let desk = JournalDesk::load(journals, vec![])?;
    print_json(&FacetsOutput { cli_version: CLI_CONTRACT_VERSION, facets: desk.facets() })
}

fn run_status_counts(args: &JournalsArgs) -> Result<()> {
    let journals = load_journals(&args.journals)?;
    let desk = JournalDesk::load(journals, vec![])?;
    let counts = desk.status_counts();
    print_json(&StatusCountsOutput {
        cli_version: CLI_CONTRACT_VERSION,
        total: desk.journals().len(),
        counts,
    })
}

fn run_classify(args: &ClassifyArgs) -> Result<()> {
    print_json(&ClassifyOutput {
        cli_version: CLI_CONTRACT_VERSION,
        status: args.status.clone(),
        badge: classify_status(&args.status),
    })
}

fn run_affordance(args: &AffordanceArgs) -> Result<()> {
    let body = fs::read_to_string(&args.recommendations).with_context(|| {
        format!("failed to read recommendations file {}", args.recommendations.display())
    })?;
    let recommendations: Vec<RecommendationRecord> =
        serde_json::from_str(&body).with_context(|| {
            format!("recommendations file {} is not valid JSON", args.recommendations.display())
        })?;
    for recommendation in &recommendations {
        recommendation.validate()?;
    }

    // Keyed merge, last write per journal id winning, like the board.
    let mut keyed = BTreeMap::new();
    for recommendation in recommendations {
        keyed.insert(recommendation.journal_id, recommendation);
    }

    let record = keyed.get(&args.journal_id);
    print_json(&AffordanceOutput {
        cli_version: CLI_CONTRACT_VERSION,
        journal_id: args.journal_id,
        affordance: recommendation_affordance(record),
        recommendation: record.cloned(),
    })
}
