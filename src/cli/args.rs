//! Command line argument parsing for the triage CLI using clap.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Triage - multi-label classification of disaster-response messages
#[derive(Parser, Debug, Clone)]
#[command(name = "triage")]
#[command(about = "Train and apply a multi-label classifier for disaster-response messages")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TriageArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TriageArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n + 1,
            }
        }
    }

    /// Whether progress lines should be printed.
    pub fn show_progress(&self) -> bool {
        self.verbosity() > 0 && matches!(self.output_format, OutputFormat::Human)
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Join, clean and store the raw message and category tables
    Prepare(PrepareArgs),

    /// Train, evaluate and save a classifier
    Train(TrainArgs),

    /// Predict the categories of messages with a saved classifier
    Classify(ClassifyArgs),
}

/// Arguments for data preparation
#[derive(Parser, Debug, Clone)]
pub struct PrepareArgs {
    /// Raw messages CSV (id, message, original, genre)
    #[arg(value_name = "MESSAGES")]
    pub messages: PathBuf,

    /// Raw categories CSV (id, categories)
    #[arg(value_name = "CATEGORIES")]
    pub categories: PathBuf,

    /// Output path of the cleaned table
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Cleaned table written by `prepare`
    #[arg(value_name = "DATABASE")]
    pub database: PathBuf,

    /// Output path of the model file
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Run the hyperparameter grid search (true/false, 1/0, yes/no)
    #[arg(
        value_name = "GRID_SEARCH",
        value_parser = parse_flag,
        action = ArgAction::Set,
        required = true
    )]
    pub grid_search: bool,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Worker threads for the grid search (default: all CPUs)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Write the evaluation report to this file as JSON
    #[arg(long, value_name = "REPORT_FILE")]
    pub report: Option<PathBuf>,
}

/// Arguments for classification
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Model file written by `train`
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Messages to classify
    #[arg(value_name = "TEXT", required = true)]
    pub texts: Vec<String>,

    /// Also print the positive probability of every category
    #[arg(long)]
    pub probabilities: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Parse a boolean command line flag.
pub fn parse_flag(value: &str) -> std::result::Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Ok(true),
        "false" | "0" | "no" | "n" | "off" => Ok(false),
        other => Err(format!("expected true/false, 1/0 or yes/no, got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_command() {
        let args = TriageArgs::try_parse_from([
            "triage",
            "prepare",
            "messages.csv",
            "categories.csv",
            "clean.csv",
        ])
        .unwrap();

        if let Command::Prepare(prepare) = args.command {
            assert_eq!(prepare.messages, PathBuf::from("messages.csv"));
            assert_eq!(prepare.categories, PathBuf::from("categories.csv"));
            assert_eq!(prepare.database, PathBuf::from("clean.csv"));
        } else {
            panic!("Expected prepare command");
        }
    }

    #[test]
    fn test_train_command() {
        let args = TriageArgs::try_parse_from([
            "triage",
            "train",
            "clean.csv",
            "model.bin",
            "no",
            "--config",
            "train.json",
            "-j",
            "4",
        ])
        .unwrap();

        if let Command::Train(train) = args.command {
            assert!(!train.grid_search);
            assert_eq!(train.config, Some(PathBuf::from("train.json")));
            assert_eq!(train.jobs, Some(4));
        } else {
            panic!("Expected train command");
        }
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(TriageArgs::try_parse_from(["triage", "train", "clean.csv"]).is_err());
        assert!(TriageArgs::try_parse_from(["triage", "classify", "model.bin"]).is_err());
        assert!(TriageArgs::try_parse_from(["triage"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        TriageArgs::command().debug_assert();
    }

    #[test]
    fn test_grid_search_flag_is_required_positional() {
        let parse = |flag: &str| {
            TriageArgs::try_parse_from(["triage", "train", "clean.csv", "model.bin", flag])
        };

        match parse("true").unwrap().command {
            Command::Train(train) => assert!(train.grid_search),
            _ => panic!("Expected train command"),
        }
        match parse("0").unwrap().command {
            Command::Train(train) => assert!(!train.grid_search),
            _ => panic!("Expected train command"),
        }
        assert!(parse("maybe").is_err());
        assert!(TriageArgs::try_parse_from(["triage", "train", "clean.csv", "model.bin"]).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("True"), Ok(true));
        assert_eq!(parse_flag("1"), Ok(true));
        assert_eq!(parse_flag("yes"), Ok(true));
        assert_eq!(parse_flag("0"), Ok(false));
        assert_eq!(parse_flag("False"), Ok(false));
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_verbosity_levels() {
        let args = TriageArgs::try_parse_from(["triage", "classify", "m.bin", "help"]).unwrap();
        assert_eq!(args.verbosity(), 1);
        assert!(args.show_progress());

        let args =
            TriageArgs::try_parse_from(["triage", "-vv", "classify", "m.bin", "help"]).unwrap();
        assert_eq!(args.verbosity(), 3);

        let args =
            TriageArgs::try_parse_from(["triage", "classify", "m.bin", "help", "-q"]).unwrap();
        assert_eq!(args.verbosity(), 0);
        assert!(!args.show_progress());
    }

    #[test]
    fn test_json_format_hides_progress() {
        let args = TriageArgs::try_parse_from([
            "triage", "--format", "json", "classify", "m.bin", "help",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(!args.show_progress());
    }
}
