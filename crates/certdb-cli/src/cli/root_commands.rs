use clap::{Args, Subcommand, ValueEnum};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the pipeline for the configured states and write every report.
    Run(RunArgs),
    /// Re-emit the JSONL, CSV and Markdown reports from the store.
    Report,
    /// List stored states with test and objective counts.
    States,
    /// All tests and objectives of one state.
    State(StateArgs),
    /// Totals and average confidence for one state.
    Summary(StateArgs),
    /// Search objective text.
    Search(SearchArgs),
    /// Store-wide totals and the confidence histogram.
    Stats,
    /// Preview the objectives the fallback generator would produce for a test.
    Generate(GenerateArgs),
    /// Run the quality checks on one objective statement.
    Validate(ValidateArgs),
    /// Dump the JSON schema of an exported record type.
    Schema(SchemaArgs),
    /// Serve the read-only HTTP API.
    Serve(ServeArgs),
    /// Print the effective configuration as TOML.
    Config,
}

/// Arguments for `certdb run`.
#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// State name or abbreviation; repeat for several. Replaces `run.states`.
    #[arg(long = "state", value_name = "STATE")]
    pub states: Vec<String>,
    /// Process all 50 states.
    #[arg(long, conflicts_with = "states")]
    pub all_states: bool,
    /// Reuse tests already stored under the same natural key.
    #[arg(long)]
    pub dedupe: bool,
}

/// A single state, by name or abbreviation.
#[derive(Clone, Debug, Args)]
pub struct StateArgs {
    pub name: String,
}

/// Arguments for `certdb search`.
#[derive(Clone, Debug, Args)]
pub struct SearchArgs {
    /// Case-insensitive substring of the objective text.
    pub query: String,
    #[arg(long)]
    pub state: Option<String>,
    /// Substring of the test's subject area.
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long, value_parser = parse_confidence)]
    pub min_confidence: Option<f64>,
}

fn parse_confidence(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| (0.0..=1.0).contains(value))
        .ok_or_else(|| format!("expected a number between 0 and 1, got {raw:?}"))
}

/// Arguments for `certdb generate`.
#[derive(Clone, Debug, Args)]
pub struct GenerateArgs {
    #[arg(long, default_value = "")]
    pub subject: String,
    #[arg(long, default_value = "")]
    pub system: String,
    #[arg(long, default_value = "")]
    pub name: String,
    /// Confidence floor; defaults to `run.confidence_floor`.
    #[arg(long)]
    pub floor: Option<f64>,
}

/// Arguments for `certdb validate`.
#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    pub text: String,
    /// Treat the statement as inferred with this rationale.
    #[arg(long)]
    pub rationale: Option<String>,
    /// Treat the statement as inferred with this confidence.
    #[arg(long)]
    pub confidence: Option<f64>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaType {
    StateTestRecord,
    State,
    Test,
    Objective,
    Audit,
    StateSummary,
    SearchResponse,
    Overview,
}

/// Arguments for `certdb schema`.
#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    #[arg(value_enum)]
    pub type_name: SchemaType,
}

/// Arguments for `certdb serve`.
#[derive(Clone, Debug, Args)]
pub struct ServeArgs {
    /// Listen address; overrides `server.bind`.
    #[arg(long)]
    pub bind: Option<String>,
    /// CORS origin; overrides `server.allowed_origin`.
    #[arg(long)]
    pub origin: Option<String>,
}
