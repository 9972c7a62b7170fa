use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::api::{
    self, AppState, ApiError, DEFAULT_ANNUAL_RATE, DEFAULT_SUGGESTION_MONTHS, EventPayload,
    MAX_HORIZON_YEAR, ProjectionPayload, SuggestionPayload, SuggestionResponse,
    build_suggestion_response, projection_request_from_payload, suggestion_request_from_payload,
};
use crate::core::{Alignment, YearSnapshot, alignment, current_year, project, required_monthly};

#[derive(Parser, Debug)]
#[command(
    name = "wealthcurve",
    about = "Year-by-year wealth projection with cash-flow events and required-contribution suggestions"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Enable debug logging for this crate")]
    pub verbose: bool,
    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API
    Serve(ServeArgs),
    /// Print a projection as JSON
    Project(ProjectArgs),
    /// Solve the monthly contribution needed to reach a target
    Suggest(SuggestArgs),
    /// Compare goal targets against current wealth
    Align(AlignArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
    #[arg(long, help = "Pin the calendar year used as the projection start")]
    pub current_year: Option<i16>,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[arg(long)]
    pub initial_wealth: f64,
    #[arg(
        long,
        help = "Annual rate; values above 1 are percent (e.g. 5), defaults to 4%"
    )]
    pub rate: Option<String>,
    #[arg(long, default_value_t = MAX_HORIZON_YEAR)]
    pub horizon_year: i16,
    #[arg(long, help = "Projection start year, defaults to the clock year")]
    pub current_year: Option<i16>,
    #[arg(long, help = "JSON file holding an array of events")]
    pub events: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SuggestArgs {
    #[arg(long)]
    pub present_value: f64,
    #[arg(long)]
    pub target_sum: f64,
    #[arg(long, default_value_t = DEFAULT_SUGGESTION_MONTHS)]
    pub months: u32,
    #[arg(long, default_value_t = DEFAULT_ANNUAL_RATE)]
    pub rate_annual: f64,
}

#[derive(Args, Debug)]
pub struct AlignArgs {
    #[arg(long)]
    pub wealth: f64,
    #[arg(long = "goal", help = "Goal target; repeat for several goals")]
    pub goals: Vec<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Input(#[from] ApiError),

    #[error("server error: {0}")]
    Server(std::io::Error),
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Serve(args) => {
            let addr = SocketAddr::new(args.host, args.port);
            api::run_http_server(addr, AppState::new(args.current_year))
                .await
                .map_err(CliError::Server)
        }
        Command::Project(args) => print_json(&run_projection(&args)?),
        Command::Suggest(args) => print_json(&run_suggestion(&args)?),
        Command::Align(args) => print_json(&run_alignment(&args)?),
    }
}

pub fn run_projection(args: &ProjectArgs) -> Result<Vec<YearSnapshot>, CliError> {
    let events = match &args.events {
        Some(path) => read_events(path)?,
        None => Vec::new(),
    };
    let request = projection_request_from_payload(ProjectionPayload {
        initial_wealth: Some(args.initial_wealth),
        rate: args.rate.clone().map(Value::String),
        horizon_year: Some(args.horizon_year),
        events,
    })?;

    let year = args.current_year.unwrap_or_else(current_year);
    info!(
        year,
        horizon_year = request.run.horizon_year,
        annual_rate = request.run.annual_rate,
        "projecting"
    );
    Ok(project(&request.run, year))
}

pub fn run_suggestion(args: &SuggestArgs) -> Result<SuggestionResponse, CliError> {
    let request = suggestion_request_from_payload(SuggestionPayload {
        present_value: Some(args.present_value),
        target_sum: Some(args.target_sum),
        goal_targets: None,
        months: Some(args.months),
        rate_annual: Some(args.rate_annual),
    })?;
    Ok(build_suggestion_response(
        request.query,
        required_monthly(request.query),
    ))
}

pub fn run_alignment(args: &AlignArgs) -> Result<Alignment, CliError> {
    alignment(args.wealth, &args.goals)
        .ok_or_else(|| ApiError::validation("current wealth is 0").into())
}

fn read_events(path: &Path) -> Result<Vec<EventPayload>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let events: Vec<EventPayload> = serde_json::from_str(&text)?;
    debug!(path = %path.display(), count = events.len(), "loaded events");
    Ok(events)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
