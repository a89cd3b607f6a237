use crate::core::editor::EditOp;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "gradecalc",
    version,
    about = "Grade calculator with test averages and custom grading scales"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a default gradecalc.toml in the current directory
    Init,
    /// Grade a test from its question and wrong-answer counts
    Calc(CalcArgs),
    /// Show the last successful calculation
    Last(OutputArgs),
    /// Table of grades for every possible number of wrong answers
    Chart(ChartArgs),
    Average {
        #[command(subcommand)]
        command: AverageSubcommand,
    },
    Scale {
        #[command(subcommand)]
        command: ScaleSubcommand,
    },
}

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long)]
    pub json: bool,
    /// Print percentages with two decimals instead of rounding
    #[arg(long)]
    pub decimals: bool,
}

#[derive(Debug, Args, Clone)]
pub struct CalcArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub total: String,
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub wrong: String,
    /// Also print the grade chart for this number of questions
    #[arg(long)]
    pub chart: bool,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct ChartArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub total: String,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Subcommand)]
pub enum AverageSubcommand {
    Show(OutputArgs),
    Add(AddTestArgs),
    Update(UpdateTestArgs),
    Remove(RemoveTestArgs),
    /// Forget all saved tests
    Clear,
    /// Write the tests, their percentages and the average to a JSON file
    Export(ExportArgs),
    /// Keep a copy of the current tests under a separate store key
    Backup,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Defaults to grade-average-<date>.json in the current directory
    #[arg(long = "output", value_name = "PATH")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct AddTestArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub score: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub max: Option<f64>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateTestArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub score: Option<f64>,
    #[arg(long, allow_hyphen_values = true)]
    pub max: Option<f64>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RemoveTestArgs {
    pub id: String,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Subcommand)]
pub enum ScaleSubcommand {
    Show(OutputArgs),
    /// Look up the grade for a percentage on the active scale
    Classify(ClassifyArgs),
    /// Apply edits like `--set 1:max:95` and save if the result is valid
    Edit(EditArgs),
    /// Go back to the default scale
    Reset,
}

#[derive(Debug, Args, Clone)]
pub struct ClassifyArgs {
    #[arg(allow_negative_numbers = true)]
    pub percentage: f64,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    #[arg(long = "set", value_name = "INDEX:FIELD:VALUE", required = true)]
    pub edits: Vec<EditOp>,
    /// Show the edited scale without saving it
    #[arg(long)]
    pub dry_run: bool,
    /// Also show which grade this percentage gets on the edited scale
    #[arg(long, allow_negative_numbers = true)]
    pub preview: Option<f64>,
    #[command(flatten)]
    pub output: OutputArgs,
}
