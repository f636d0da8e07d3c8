use crate::commands::{run_batch, run_rates, run_score, run_summary};
use admission_risk::error::AppError;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "admission-risk",
    about = "Score university applicants against historical admission outcomes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score one applicant stored as a JSON object of column -> value
    Score(ScoreArgs),
    /// Score every applicant in a CSV upload on the background worker
    Batch(BatchArgs),
    /// Describe the columns of the historical dataset
    Summary(SummaryArgs),
    /// List historical approval rates per institution
    Rates(RatesArgs),
}

/// Overrides for the environment-driven configuration.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct EngineArgs {
    /// Historical dataset CSV (overrides ADMISSION_HISTORY_PATH)
    #[arg(long)]
    pub(crate) history: Option<PathBuf>,
    /// Linear model artifact JSON (overrides ADMISSION_MODEL_PATH)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Evaluation year for records without ANIO (overrides ADMISSION_EVALUATION_YEAR)
    #[arg(long, value_parser = crate::infra::parse_year)]
    pub(crate) year: Option<i32>,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// JSON file holding the applicant record
    pub(crate) record: PathBuf,
    /// Print the full profile as JSON instead of a report
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV upload with one applicant per row
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the scored CSV (defaults to <input>_evaluado.csv)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

#[derive(Args, Debug)]
pub(crate) struct RatesArgs {
    /// Only list institutions whose name contains this text (case-insensitive)
    pub(crate) filter: Option<String>,
    /// Print the rates as JSON
    #[arg(long)]
    pub(crate) json: bool,
    #[command(flatten)]
    pub(crate) engine: EngineArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Score(args) => run_score(args),
        Command::Batch(args) => run_batch(args).await,
        Command::Summary(args) => run_summary(args),
        Command::Rates(args) => run_rates(args),
    }
}
