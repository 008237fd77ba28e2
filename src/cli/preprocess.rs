//! `preprocess` stage: load, clean and save the training data

use std::time::Instant;

use anyhow::Result;

use super::args::PreprocessArgs;
use crate::pipeline::{clean_dataset, get_column_names, load_dataset_with_progress, save_dataset};
use crate::report::CleaningSummary;
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_count, print_info,
    print_step_header, print_step_time, print_success, print_warning, ConfigEntry,
};

pub fn run_preprocess(args: &PreprocessArgs) -> Result<()> {
    print_banner(env!("CARGO_PKG_VERSION"), "preprocess");
    let threshold = format!("{:.1}%", args.missing_threshold * 100.0);
    print_config(&[
        ConfigEntry::Path("📂 Input:", &args.input),
        ConfigEntry::Path("📂 Test:", &args.test),
        ConfigEntry::Path("💾 Output:", &args.output),
        ConfigEntry::Rule,
        ConfigEntry::Text("🎯 Target:", &args.target),
        ConfigEntry::Text("📊 Missing >", &threshold),
    ]);

    // Step 1: Load
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let (df, rows, cols, memory_mb) = load_dataset_with_progress(&args.input, args.infer_schema_length)?;
    print_info(&format!("{} rows, {} columns, {:.2} MB", rows, cols, memory_mb));

    if df.column(&args.target).is_err() {
        anyhow::bail!(
            "Target column '{}' not found in {}",
            args.target,
            args.input.display()
        );
    }
    let load_elapsed = step_start.elapsed();
    print_step_time(load_elapsed);

    // Step 2: Clean
    print_step_header(2, "Missing Value Handling");
    let step_start = Instant::now();
    let spinner = create_spinner("Analyzing missing values...");
    let cleaned = clean_dataset(&df, args.missing_threshold, &args.target)?;
    finish_with_success(&spinner, "Missing value analysis complete");

    if cleaned.dropped.is_empty() {
        print_info("No columns exceed the missing value threshold");
    } else {
        print_count(
            "column(s) with high missing values",
            cleaned.dropped.len(),
            Some(&format!("(>{})", threshold)),
        );
        print_success("Dropped columns with high missing values");
    }
    if !cleaned.fills.is_empty() {
        print_count("column(s) imputed with their most frequent value", cleaned.fills.len(), None);
    }
    let clean_elapsed = step_start.elapsed();
    print_step_time(clean_elapsed);

    // Step 3: Compare against the test file
    print_step_header(3, "Test Data Check");
    if args.test.exists() {
        let test_columns = get_column_names(&args.test)?;
        let missing: Vec<&str> = cleaned
            .df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .filter(|name| *name != args.target && !test_columns.iter().any(|c| c.as_str() == *name))
            .collect();
        if missing.is_empty() {
            print_success("Test data carries every cleaned feature column");
        } else {
            print_warning(&format!(
                "Test data lacks {} column(s), defaults will be used at inference: {}",
                missing.len(),
                missing.join(", ")
            ));
        }
    } else {
        print_info(&format!("{} not found, skipping", args.test.display()));
    }

    // Step 4: Save
    print_step_header(4, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing cleaned data...");
    let mut out = cleaned.df.clone();
    save_dataset(&mut out, &args.output)?;
    finish_with_success(&spinner, &format!("Saved to {}", args.output.display()));
    print_step_time(step_start.elapsed());

    let mut summary = CleaningSummary::new(cols, &cleaned);
    summary.set_load_time(load_elapsed);
    summary.set_clean_time(clean_elapsed);
    summary.display();

    print_completion("Preprocessing complete!");
    Ok(())
}
