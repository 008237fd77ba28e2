//! `train` stage: fit the classifier and write the bundle

use std::time::Instant;

use anyhow::Result;

use super::args::TrainArgs;
use crate::model::{train_bundle, MlpConfig, TrainOptions};
use crate::pipeline::{load_dataset_with_progress, parse_column_defaults, SplitConfig};
use crate::report::TrainingSummary;
use crate::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion, print_config,
    print_info, print_step_header, print_step_time, ConfigEntry,
};

/// Training options from the command line, on top of the built-in defaults
pub fn train_options(args: &TrainArgs) -> Result<TrainOptions> {
    let mut options = TrainOptions {
        target: args.target.clone(),
        split: SplitConfig {
            test_size: args.test_size,
            seed: args.seed,
        },
        variance: args.variance,
        balance_seed: args.seed,
        mlp: MlpConfig {
            hidden_layers: args.hidden_layers.clone(),
            max_iter: args.max_iter,
            learning_rate: args.learning_rate,
            random_state: args.seed,
            ..MlpConfig::default()
        },
        ..TrainOptions::default()
    };

    for (column, value) in parse_column_defaults(&args.column_defaults)? {
        options.column_defaults.retain(|(c, _)| *c != column);
        options.column_defaults.push((column, value));
    }
    Ok(options)
}

pub fn run_train(args: &TrainArgs) -> Result<()> {
    let options = train_options(args)?;

    print_banner(env!("CARGO_PKG_VERSION"), "train");
    let layers = format!("{:?}", options.mlp.hidden_layers);
    let split = format!("{:.0}% test, seed {}", options.split.test_size * 100.0, options.split.seed);
    print_config(&[
        ConfigEntry::Path("📂 Data:", &args.data),
        ConfigEntry::Path("💾 Model:", &args.model),
        ConfigEntry::Rule,
        ConfigEntry::Text("🎯 Target:", &options.target),
        ConfigEntry::Text("📊 Split:", &split),
        ConfigEntry::Text("🧠 Layers:", &layers),
    ]);

    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let (df, rows, cols, _) = load_dataset_with_progress(&args.data, args.infer_schema_length)?;
    print_info(&format!("{} rows, {} columns", rows, cols));
    print_step_time(step_start.elapsed());

    print_step_header(2, "Train Classifier");
    let step_start = Instant::now();
    let spinner = create_spinner("Reducing features and training...");
    let (bundle, report) = train_bundle(&df, &options)?;
    if bundle.training.converged {
        finish_with_success(&spinner, &format!("Converged after {} epochs", bundle.training.n_iter));
    } else {
        finish_with_warning(
            &spinner,
            &format!("Stopped at max_iter ({}) before converging", bundle.training.n_iter),
        );
    }
    let train_elapsed = step_start.elapsed();
    print_step_time(train_elapsed);

    print_step_header(3, "Save Model");
    let step_start = Instant::now();
    bundle.save(&args.model)?;
    print_info(&format!("Model saved to {}", args.model.display()));
    print_step_time(step_start.elapsed());

    let mut summary = TrainingSummary::new(&bundle, &report);
    summary.train_time = Some(train_elapsed);
    summary.display();

    print_completion("Training complete!");
    Ok(())
}
