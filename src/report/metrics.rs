//! Classification metrics, the metrics text file and the JSON export

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Table};
use serde::Serialize;

use crate::pipeline::PriceBucket;

/// Default location of the four-line metrics report
pub const DEFAULT_METRICS_PATH: &str = "model_metrics.txt";

/// Rows are true labels, columns predicted labels, both in [`PriceBucket::ALL`] order
pub type ConfusionMatrix = [[usize; 3]; 3];

/// Per-class figures of the classification report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: PriceBucket,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    /// Support-weighted averages
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub confusion: ConfusionMatrix,
    pub per_class: Vec<ClassMetrics>,
    pub n_samples: usize,
}

/// Count (true, predicted) pairs.
pub fn confusion_matrix(y_true: &[PriceBucket], y_pred: &[PriceBucket]) -> ConfusionMatrix {
    let mut matrix = [[0usize; 3]; 3];
    for (t, p) in y_true.iter().zip(y_pred) {
        matrix[t.index()][p.index()] += 1;
    }
    matrix
}

/// Ratio that falls back to 0 when the denominator is empty
fn safe_div(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl EvaluationMetrics {
    pub fn compute(y_true: &[PriceBucket], y_pred: &[PriceBucket]) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            anyhow::bail!(
                "Label count mismatch: {} true labels, {} predictions",
                y_true.len(),
                y_pred.len()
            );
        }
        if y_true.is_empty() {
            anyhow::bail!("Cannot evaluate an empty label set");
        }

        let confusion = confusion_matrix(y_true, y_pred);
        let n = y_true.len();

        let per_class: Vec<ClassMetrics> = PriceBucket::ALL
            .iter()
            .map(|&label| {
                let k = label.index();
                let tp = confusion[k][k];
                let support: usize = confusion[k].iter().sum();
                let predicted: usize = confusion.iter().map(|row| row[k]).sum();

                let precision = safe_div(tp, predicted);
                let recall = safe_div(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            per_class.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / n as f64
        };
        let macro_avg = |f: fn(&ClassMetrics) -> f64| {
            per_class.iter().map(f).sum::<f64>() / per_class.len() as f64
        };

        let correct: usize = (0..3).map(|k| confusion[k][k]).sum();

        Ok(Self {
            accuracy: safe_div(correct, n),
            precision: weighted(|c| c.precision),
            recall: weighted(|c| c.recall),
            f1: weighted(|c| c.f1),
            macro_precision: macro_avg(|c| c.precision),
            macro_recall: macro_avg(|c| c.recall),
            macro_f1: macro_avg(|c| c.f1),
            confusion,
            per_class,
            n_samples: n,
        })
    }

    /// The four `Key: value` lines of the metrics file
    pub fn metrics_text(&self) -> String {
        format!(
            "Accuracy: {:.4}\nPrecision: {:.4}\nRecall: {:.4}\nF1 Score: {:.4}\n",
            self.accuracy, self.precision, self.recall, self.f1
        )
    }

    pub fn save_text(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        std::fs::write(path, self.metrics_text())
            .with_context(|| format!("Failed to write metrics to {}", path.display()))
    }

    /// Per-class precision/recall/F1/support followed by accuracy and the
    /// macro and weighted averages
    pub fn classification_report(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("").add_attribute(Attribute::Bold),
            Cell::new("precision").add_attribute(Attribute::Bold),
            Cell::new("recall").add_attribute(Attribute::Bold),
            Cell::new("f1-score").add_attribute(Attribute::Bold),
            Cell::new("support").add_attribute(Attribute::Bold),
        ]);

        let num = |v: f64| Cell::new(format!("{:.2}", v)).set_alignment(CellAlignment::Right);
        let count = |v: usize| Cell::new(v).set_alignment(CellAlignment::Right);

        for class in &self.per_class {
            table.add_row(vec![
                Cell::new(class.label.as_str()),
                num(class.precision),
                num(class.recall),
                num(class.f1),
                count(class.support),
            ]);
        }

        table.add_row(vec![
            Cell::new("accuracy").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            num(self.accuracy),
            count(self.n_samples),
        ]);
        table.add_row(vec![
            Cell::new("macro avg"),
            num(self.macro_precision),
            num(self.macro_recall),
            num(self.macro_f1),
            count(self.n_samples),
        ]);
        table.add_row(vec![
            Cell::new("weighted avg"),
            num(self.precision),
            num(self.recall),
            num(self.f1),
            count(self.n_samples),
        ]);
        table
    }

    /// Confusion matrix as a labeled table
    pub fn confusion_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);

        let mut header = vec![Cell::new("true \\ predicted").add_attribute(Attribute::Bold)];
        header.extend(
            PriceBucket::ALL
                .iter()
                .map(|b| Cell::new(b.as_str()).add_attribute(Attribute::Bold)),
        );
        table.set_header(header);

        for bucket in PriceBucket::ALL {
            let mut row = vec![Cell::new(bucket.as_str())];
            row.extend(
                self.confusion[bucket.index()]
                    .iter()
                    .map(|&v| Cell::new(v).set_alignment(CellAlignment::Right)),
            );
            table.add_row(row);
        }
        table
    }
}

/// Run parameters recorded alongside exported metrics
pub struct ExportParams<'a> {
    pub model_path: &'a str,
    pub data_path: &'a str,
    /// True when only the held-out split was evaluated
    pub held_out_only: bool,
}

#[derive(Serialize)]
pub struct EvaluationMetadata {
    /// ISO 8601
    pub timestamp: String,
    pub houseprice_version: String,
    pub model_file: String,
    pub data_file: String,
    pub held_out_only: bool,
}

#[derive(Serialize)]
pub struct EvaluationExport<'a> {
    pub metadata: EvaluationMetadata,
    pub labels: [&'static str; 3],
    pub metrics: &'a EvaluationMetrics,
}

/// Write the metrics and run metadata as pretty JSON
pub fn export_metrics_json(metrics: &EvaluationMetrics, output_path: &Path, params: &ExportParams) -> Result<()> {
    let export = EvaluationExport {
        metadata: EvaluationMetadata {
            timestamp: Utc::now().to_rfc3339(),
            houseprice_version: env!("CARGO_PKG_VERSION").to_string(),
            model_file: params.model_path.to_string(),
            data_file: params.data_path.to_string(),
            held_out_only: params.held_out_only,
        },
        labels: PriceBucket::ALL.map(|b| b.as_str()),
        metrics,
    };

    let json = serde_json::to_string_pretty(&export).context("Failed to serialize metrics to JSON")?;

    ensure_parent(output_path)?;
    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write metrics JSON to {}", output_path.display()))
}

pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}
