//! Stage summary tables printed at the end of each offline stage

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::model::{ModelBundle, TrainReport};
use crate::pipeline::{CleanedDataset, PriceBucket};
use crate::utils::format_duration;

/// Outcome of the cleaning stage
#[derive(Debug, Default)]
pub struct CleaningSummary {
    pub rows: usize,
    pub initial_columns: usize,
    pub final_columns: usize,
    pub dropped: Vec<String>,
    pub imputed: Vec<String>,
    pub load_time: Option<Duration>,
    pub clean_time: Option<Duration>,
}

impl CleaningSummary {
    pub fn new(initial_columns: usize, cleaned: &CleanedDataset) -> Self {
        Self {
            rows: cleaned.df.height(),
            initial_columns,
            final_columns: cleaned.df.width(),
            dropped: cleaned.dropped.clone(),
            imputed: cleaned.fills.iter().map(|(name, _)| name.clone()).collect(),
            ..Default::default()
        }
    }

    pub fn set_load_time(&mut self, duration: Duration) {
        self.load_time = Some(duration);
    }

    pub fn set_clean_time(&mut self, duration: Duration) {
        self.clean_time = Some(duration);
    }

    pub fn display(&self) {
        print_section_title("📋", "CLEANING SUMMARY");

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("Rows"), Cell::new(self.rows)]);
        table.add_row(vec![Cell::new("📁 Initial Columns"), Cell::new(self.initial_columns)]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped (Missing)"),
            Cell::new(self.dropped.len()).fg(if self.dropped.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![Cell::new("🩹 Imputed Columns"), Cell::new(self.imputed.len())]);
        table.add_row(vec![
            Cell::new("✅ Final Columns"),
            Cell::new(self.final_columns)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        if let Some(t) = self.load_time {
            table.add_row(vec![Cell::new("⏱  Load"), Cell::new(format_duration(t))]);
        }
        if let Some(t) = self.clean_time {
            table.add_row(vec![Cell::new("⏱  Clean"), Cell::new(format_duration(t))]);
        }

        print_indented(&table);

        if !self.dropped.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("High Missing Values").yellow(),
                style(format!("({})", self.dropped.len())).dim()
            );
            for feature in &self.dropped {
                println!("        {} {}", style("•").dim(), feature);
            }
        }
    }
}

/// Outcome of the training stage
#[derive(Debug)]
pub struct TrainingSummary<'a> {
    pub bundle: &'a ModelBundle,
    pub report: &'a TrainReport,
    pub train_time: Option<Duration>,
}

impl<'a> TrainingSummary<'a> {
    pub fn new(bundle: &'a ModelBundle, report: &'a TrainReport) -> Self {
        Self {
            bundle,
            report,
            train_time: None,
        }
    }

    pub fn display(&self) {
        let info = &self.bundle.training;
        let edges = &self.bundle.buckets.edges;

        print_section_title("🏷️ ", "PRICE BUCKETS");
        let mut buckets = Table::new();
        buckets.load_preset(UTF8_FULL_CONDENSED);
        buckets.set_header(vec![
            Cell::new("Bucket").add_attribute(Attribute::Bold),
            Cell::new("Range").add_attribute(Attribute::Bold),
            Cell::new("Rows").add_attribute(Attribute::Bold),
            Cell::new("Train").add_attribute(Attribute::Bold),
            Cell::new("Balanced").add_attribute(Attribute::Bold),
        ]);
        for bucket in PriceBucket::ALL {
            let k = bucket.index();
            let class = self.bundle.labels.classes.iter().position(|c| *c == bucket);
            let at = |counts: &[usize]| class.and_then(|c| counts.get(c).copied()).unwrap_or(0);
            buckets.add_row(vec![
                Cell::new(bucket.as_str()),
                Cell::new(format!("{:.0} - {:.0}", edges[k], edges[k + 1])),
                Cell::new(self.report.bucket_counts[k]),
                Cell::new(at(&self.report.train_counts)),
                Cell::new(at(&self.report.balanced_counts)),
            ]);
        }
        print_indented(&buckets);

        print_section_title("📋", "TRAINING SUMMARY");
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("Rows (train / test)"),
            Cell::new(format!("{} / {}", info.n_train, info.n_test)),
        ]);
        table.add_row(vec![Cell::new("Rows after oversampling"), Cell::new(info.n_balanced)]);
        table.add_row(vec![
            Cell::new("Features (expanded → PCA)"),
            Cell::new(format!("{} → {}", self.report.n_expanded_features, info.n_components)),
        ]);
        table.add_row(vec![
            Cell::new("Hidden layers"),
            Cell::new(format!("{:?}", self.bundle.model.config.hidden_layers)),
        ]);
        table.add_row(vec![
            Cell::new("Epochs"),
            Cell::new(format!(
                "{}{}",
                info.n_iter,
                if info.converged { "" } else { " (max_iter reached)" }
            ))
            .fg(if info.converged { Color::White } else { Color::Yellow }),
        ]);
        table.add_row(vec![Cell::new("Final loss"), Cell::new(format!("{:.5}", info.final_loss))]);

        let color = if info.test_accuracy >= 0.75 {
            Color::Green
        } else if info.test_accuracy >= 0.5 {
            Color::Yellow
        } else {
            Color::Red
        };
        table.add_row(vec![
            Cell::new("🎯 Held-out accuracy"),
            Cell::new(format!("{:.4}", info.test_accuracy))
                .fg(color)
                .add_attribute(Attribute::Bold),
        ]);

        if let Some(t) = self.train_time {
            table.add_row(vec![Cell::new("⏱  Train"), Cell::new(format_duration(t))]);
        }

        print_indented(&table);
    }
}

fn print_section_title(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

/// Indent every line of a table to align with the step output
pub fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
