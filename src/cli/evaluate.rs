//! `evaluate` stage: score the bundle and write the reports

use std::time::Instant;

use anyhow::Result;

use super::args::EvaluateArgs;
use crate::model::{evaluate_bundle, EvaluationRows, ModelBundle};
use crate::pipeline::load_dataset_with_progress;
use crate::report::{export_metrics_json, print_indented, write_heatmap, ExportParams};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config, print_info,
    print_step_header, print_step_time, ConfigEntry,
};

pub fn run_evaluate(args: &EvaluateArgs) -> Result<()> {
    let rows = if args.all_rows {
        EvaluationRows::All
    } else {
        EvaluationRows::HeldOut
    };

    print_banner(env!("CARGO_PKG_VERSION"), "evaluate");
    print_config(&[
        ConfigEntry::Path("💾 Model:", &args.model),
        ConfigEntry::Path("📂 Data:", &args.data),
        ConfigEntry::Rule,
        ConfigEntry::Path("📊 Metrics:", &args.metrics),
        ConfigEntry::Path("📊 Heatmap:", &args.heatmap),
        ConfigEntry::Text(
            "🎯 Rows:",
            if args.all_rows { "all" } else { "held-out split" },
        ),
    ]);

    print_step_header(1, "Load Model and Data");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading model bundle...");
    let bundle = ModelBundle::load(&args.model)?;
    finish_with_success(&spinner, &format!("Loaded {}", args.model.display()));
    let (df, rows_loaded, _, _) = load_dataset_with_progress(&args.data, args.infer_schema_length)?;
    print_step_time(step_start.elapsed());

    print_step_header(2, "Predict");
    let step_start = Instant::now();
    let evaluation = evaluate_bundle(&bundle, &df, rows)?;
    print_info(&format!(
        "Scored {} of {} rows",
        evaluation.y_true.len(),
        rows_loaded
    ));
    print_step_time(step_start.elapsed());

    print_step_header(3, "Write Reports");
    let metrics = &evaluation.metrics;
    metrics.save_text(&args.metrics)?;
    print_info(&format!("Metrics saved to {}", args.metrics.display()));
    write_heatmap(&metrics.confusion, &args.heatmap)?;
    print_info(&format!("Confusion matrix saved to {}", args.heatmap.display()));

    if let Some(json_path) = &args.json_output {
        let model_path = args.model.display().to_string();
        let data_path = args.data.display().to_string();
        export_metrics_json(
            metrics,
            json_path,
            &ExportParams {
                model_path: &model_path,
                data_path: &data_path,
                held_out_only: !args.all_rows,
            },
        )?;
        print_info(&format!("Metrics JSON saved to {}", json_path.display()));
    }

    println!();
    for line in metrics.metrics_text().lines() {
        println!("      {}", line);
    }
    println!();
    print_indented(&metrics.confusion_table());
    println!();
    print_indented(&metrics.classification_report());

    print_completion("Evaluation complete!");
    Ok(())
}
