//! Output formatting for CLI commands.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, TriageArgs};
use crate::error::Result;
use crate::ml::metrics::EvaluationReport;
use crate::ml::search::SearchReport;

/// Result of data preparation.
#[derive(Debug, Serialize, Deserialize)]
pub struct PrepareResult {
    pub database: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub unmatched_messages: usize,
    pub duplicates_dropped: usize,
    pub coerced_values: usize,
    pub categories: usize,
}

/// Result of a training run. The evaluation is printed as progress, so the
/// human rendering only summarizes the run.
#[derive(Debug, Serialize, Deserialize)]
pub struct TrainResult {
    pub model: String,
    pub model_id: String,
    pub training_rows: usize,
    pub test_rows: usize,
    pub vocabulary_size: usize,
    pub degenerate_categories: Vec<String>,
    pub search: Option<SearchReport>,
    pub evaluation: EvaluationReport,
}

/// Predicted categories of one message.
#[derive(Debug, Serialize, Deserialize)]
pub struct Classification {
    pub text: String,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<Vec<(String, f64)>>,
}

/// Result of classification.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassifyResult {
    pub model_id: Option<String>,
    pub messages: Vec<Classification>,
}

impl fmt::Display for PrepareResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows: {} in, {} out", self.rows_in, self.rows_out)?;
        writeln!(f, "categories: {}", self.categories)?;
        writeln!(f, "unmatched messages: {}", self.unmatched_messages)?;
        writeln!(f, "duplicates dropped: {}", self.duplicates_dropped)?;
        write!(f, "coerced values: {}", self.coerced_values)
    }
}

impl fmt::Display for TrainResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(search) = &self.search {
            let best = search.best();
            writeln!(
                f,
                "best of {} candidates ({} {:.4}): {}",
                search.scores.len(),
                search.scoring,
                best.mean_score,
                best.candidate
            )?;
        }
        if !self.degenerate_categories.is_empty() {
            writeln!(
                f,
                "single-valued in training: {}",
                self.degenerate_categories.join(", ")
            )?;
        }
        write!(
            f,
            "model {}: {} training rows, {} test rows, {} terms",
            self.model_id, self.training_rows, self.test_rows, self.vocabulary_size
        )
    }
}

impl fmt::Display for ClassifyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", message.text)?;
            if message.categories.is_empty() {
                write!(f, "    (none)")?;
            } else {
                write!(f, "    {}", message.categories.join(", "))?;
            }
            if let Some(probabilities) = &message.probabilities {
                for (name, p) in probabilities {
                    write!(f, "\n    {name:<24} {p:.3}")?;
                }
            }
        }
        Ok(())
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + fmt::Display>(result: &T, args: &TriageArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(result, args),
        OutputFormat::Json => output_json(result, args),
    }
}

/// Print a progress line in human mode.
pub fn progress(args: &TriageArgs, message: &str) {
    if args.show_progress() {
        println!("{message}");
    }
}

fn output_human<T: fmt::Display>(result: &T, args: &TriageArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{result}");
    }
    Ok(())
}

fn output_json<T: Serialize>(result: &T, args: &TriageArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}
