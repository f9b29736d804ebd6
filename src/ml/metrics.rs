//! Per-category evaluation of a fitted pipeline.
//!
//! Every ratio with a zero denominator is reported as 0.0.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::error::{Result, TriageError};
use crate::ml::pipeline::TextPipeline;

/// Precision, recall and F1 of one class of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(tp: usize, fp: usize, fn_: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassMetrics {
            precision,
            recall,
            f1,
            support: tp + fn_,
        }
    }
}

/// Confusion counts of one category, positive class = 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
}

impl ConfusionCounts {
    /// Count outcomes of one column.
    pub fn from_columns(truth: &[u8], predicted: &[u8]) -> Self {
        let mut counts = ConfusionCounts::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t, p) {
                (1, 1) => counts.true_positives += 1,
                (0, 1) => counts.false_positives += 1,
                (1, 0) => counts.false_negatives += 1,
                _ => counts.true_negatives += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

/// Evaluation of a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub category: String,
    /// Metrics of class 0.
    pub negative: ClassMetrics,
    /// Metrics of class 1.
    pub positive: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
    pub confusion: ConfusionCounts,
    /// The category had a single value in the training data.
    pub degenerate: bool,
}

impl CategoryReport {
    /// Score one category column.
    pub fn new<S: Into<String>>(category: S, truth: &[u8], predicted: &[u8], degenerate: bool) -> Self {
        let confusion = ConfusionCounts::from_columns(truth, predicted);
        let ConfusionCounts {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            true_negatives: tn,
        } = confusion;

        let positive = ClassMetrics::from_counts(tp, fp, fn_);
        let negative = ClassMetrics::from_counts(tn, fn_, fp);
        let total = confusion.total();

        let macro_avg = ClassMetrics {
            precision: (negative.precision + positive.precision) / 2.0,
            recall: (negative.recall + positive.recall) / 2.0,
            f1: (negative.f1 + positive.f1) / 2.0,
            support: total,
        };
        let weight = |neg: f64, pos: f64| {
            if total == 0 {
                0.0
            } else {
                (neg * negative.support as f64 + pos * positive.support as f64) / total as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weight(negative.precision, positive.precision),
            recall: weight(negative.recall, positive.recall),
            f1: weight(negative.f1, positive.f1),
            support: total,
        };

        CategoryReport {
            category: category.into(),
            negative,
            positive,
            accuracy: ratio(tp + tn, total),
            macro_avg,
            weighted_avg,
            confusion,
            degenerate,
        }
    }

    /// Render in the layout of a classification report.
    pub fn to_text(&self) -> String {
        const WIDTH: usize = 12;
        let row = |name: &str, m: &ClassMetrics| {
            format!(
                "{name:>width$}  {:>9.2} {:>9.2} {:>9.2} {:>9}\n",
                m.precision,
                m.recall,
                m.f1,
                m.support,
                width = WIDTH
            )
        };

        let mut text = format!("{} |------------------------------>\n", self.category);
        if self.degenerate {
            text.push_str("(single value in training data)\n");
        }
        text.push_str(&format!(
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
            "",
            "precision",
            "recall",
            "f1-score",
            "support",
            width = WIDTH
        ));
        text.push_str(&row("0", &self.negative));
        text.push_str(&row("1", &self.positive));
        text.push('\n');
        text.push_str(&format!(
            "{:>width$}  {:>9} {:>9} {:>9.2} {:>9}\n",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.confusion.total(),
            width = WIDTH
        ));
        text.push_str(&row("macro avg", &self.macro_avg));
        text.push_str(&row("weighted avg", &self.weighted_avg));
        text
    }
}

/// Evaluation of a whole label matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// One report per category, in category order.
    pub categories: Vec<CategoryReport>,
    pub n_samples: usize,
    pub subset_accuracy: f64,
    pub hamming_accuracy: f64,
    pub micro_f1: f64,
    pub macro_f1: f64,
}

impl EvaluationReport {
    /// Score predictions against the truth.
    pub fn from_predictions(
        truth: &LabelMatrix,
        predicted: &LabelMatrix,
        categories: &CategorySet,
        degenerate: &[&str],
    ) -> Result<Self> {
        truth.check_same_shape(predicted)?;
        if truth.n_cols() != categories.len() {
            return Err(TriageError::shape_mismatch(format!(
                "{} label columns but {} categories",
                truth.n_cols(),
                categories.len()
            )));
        }

        let reports = categories
            .iter()
            .enumerate()
            .map(|(col, name)| {
                CategoryReport::new(
                    name,
                    &truth.column(col),
                    &predicted.column(col),
                    degenerate.contains(&name),
                )
            })
            .collect();

        Ok(EvaluationReport {
            categories: reports,
            n_samples: truth.n_rows(),
            subset_accuracy: subset_accuracy(truth, predicted),
            hamming_accuracy: hamming_accuracy(truth, predicted),
            micro_f1: micro_f1(truth, predicted),
            macro_f1: macro_f1(truth, predicted),
        })
    }

    /// Report of one category, by name.
    pub fn category(&self, name: &str) -> Option<&CategoryReport> {
        self.categories.iter().find(|r| r.category == name)
    }

    /// Render all category blocks followed by the overall scores.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for report in &self.categories {
            text.push_str(&report.to_text());
            text.push('\n');
        }
        text.push_str(&format!(
            "overall ({} samples): subset accuracy {:.4}, hamming accuracy {:.4}, micro f1 {:.4}, macro f1 {:.4}\n",
            self.n_samples, self.subset_accuracy, self.hamming_accuracy, self.micro_f1, self.macro_f1
        ));
        text
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Evaluate a fitted pipeline on held-out messages.
pub fn evaluate<S: AsRef<str> + Sync>(
    pipeline: &TextPipeline,
    messages: &[S],
    truth: &LabelMatrix,
    categories: &CategorySet,
) -> Result<EvaluationReport> {
    if truth.n_rows() != messages.len() {
        return Err(TriageError::shape_mismatch(format!(
            "{} messages but {} label rows",
            messages.len(),
            truth.n_rows()
        )));
    }
    if let Some(fitted) = pipeline.categories() {
        if fitted != categories {
            return Err(TriageError::shape_mismatch(
                "evaluation categories differ from the fitted categories",
            ));
        }
    }

    let predicted = pipeline.predict(messages)?;
    EvaluationReport::from_predictions(truth, &predicted, categories, &pipeline.degenerate_labels())
}

/// Fraction of rows whose whole label row is predicted exactly.
pub fn subset_accuracy(truth: &LabelMatrix, predicted: &LabelMatrix) -> f64 {
    let exact = truth
        .rows()
        .zip(predicted.rows())
        .filter(|(t, p)| t == p)
        .count();
    ratio(exact, truth.n_rows())
}

/// Fraction of individual label cells predicted correctly.
pub fn hamming_accuracy(truth: &LabelMatrix, predicted: &LabelMatrix) -> f64 {
    let correct = truth
        .rows()
        .zip(predicted.rows())
        .map(|(t, p)| t.iter().zip(p).filter(|(a, b)| a == b).count())
        .sum();
    ratio(correct, truth.n_rows() * truth.n_cols())
}

/// F1 of the positive class over all cells pooled.
pub fn micro_f1(truth: &LabelMatrix, predicted: &LabelMatrix) -> f64 {
    let mut pooled = ConfusionCounts::default();
    for col in 0..truth.n_cols() {
        let counts = ConfusionCounts::from_columns(&truth.column(col), &predicted.column(col));
        pooled.true_positives += counts.true_positives;
        pooled.false_positives += counts.false_positives;
        pooled.false_negatives += counts.false_negatives;
    }
    ClassMetrics::from_counts(
        pooled.true_positives,
        pooled.false_positives,
        pooled.false_negatives,
    )
    .f1
}

/// Unweighted mean of the per-category positive-class F1.
pub fn macro_f1(truth: &LabelMatrix, predicted: &LabelMatrix) -> f64 {
    if truth.n_cols() == 0 {
        return 0.0;
    }
    let sum: f64 = (0..truth.n_cols())
        .map(|col| {
            let c = ConfusionCounts::from_columns(&truth.column(col), &predicted.column(col));
            ClassMetrics::from_counts(c.true_positives, c.false_positives, c.false_negatives).f1
        })
        .sum();
    sum / truth.n_cols() as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
