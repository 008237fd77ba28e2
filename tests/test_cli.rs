//! Tests for CLI argument parsing and the binary's stages

use assert_cmd::Command;
use clap::Parser;
use houseprice::cli::{Cli, Commands};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

#[test]
fn test_preprocess_default_values() {
    let cli = Cli::parse_from(["houseprice", "preprocess"]);

    let Commands::Preprocess(args) = cli.command else {
        panic!("expected preprocess");
    };
    assert_eq!(args.input, PathBuf::from("train.csv"));
    assert_eq!(args.test, PathBuf::from("test.csv"));
    assert_eq!(args.output, PathBuf::from("cleaned_data.csv"));
    assert_eq!(args.target, "SalePrice");
    assert_eq!(args.missing_threshold, 0.5, "Default missing threshold should be 0.5");
    assert_eq!(args.infer_schema_length, 10000);
}

#[test]
fn test_train_default_values() {
    let cli = Cli::parse_from(["houseprice", "train"]);

    let Commands::Train(args) = cli.command else {
        panic!("expected train");
    };
    assert_eq!(args.data, PathBuf::from("cleaned_data.csv"));
    assert_eq!(args.model, PathBuf::from("mlp_classifier_model.json"));
    assert_eq!(args.test_size, 0.2);
    assert_eq!(args.seed, 42);
    assert_eq!(args.variance, 0.95);
    assert_eq!(args.hidden_layers, vec![100, 50]);
    assert!(args.column_defaults.is_empty());
}

#[test]
fn test_underscore_path_aliases() {
    let cli = Cli::parse_from([
        "houseprice",
        "evaluate",
        "--model_path",
        "/app/models/m.json",
        "--data_path",
        "/app/data/d.csv",
        "--metrics_path",
        "/app/metrics/m.txt",
    ]);

    let Commands::Evaluate(args) = cli.command else {
        panic!("expected evaluate");
    };
    assert_eq!(args.model, PathBuf::from("/app/models/m.json"));
    assert_eq!(args.data, PathBuf::from("/app/data/d.csv"));
    assert_eq!(args.metrics, PathBuf::from("/app/metrics/m.txt"));
    assert!(!args.all_rows);
}

#[test]
fn test_train_custom_network() {
    let cli = Cli::parse_from([
        "houseprice",
        "train",
        "--hidden-layers",
        "32,16,8",
        "--column-default",
        "GarageType=Attchd",
        "--column-default",
        "FireplaceQu=Gd",
    ]);

    let Commands::Train(args) = cli.command else {
        panic!("expected train");
    };
    assert_eq!(args.hidden_layers, vec![32, 16, 8]);
    assert_eq!(args.column_defaults, vec!["GarageType=Attchd", "FireplaceQu=Gd"]);
}

#[test]
fn test_threshold_out_of_range_rejected() {
    let result = Cli::try_parse_from(["houseprice", "preprocess", "--missing-threshold", "1.5"]);
    assert!(result.is_err());

    // The split fraction must leave rows on both sides
    let result = Cli::try_parse_from(["houseprice", "train", "--test-size", "0"]);
    assert!(result.is_err());
}

#[test]
fn test_serve_flags_are_optional() {
    let cli = Cli::parse_from(["houseprice", "serve"]);

    let Commands::Serve(args) = cli.command else {
        panic!("expected serve");
    };
    assert!(args.host.is_none());
    assert!(args.port.is_none());
    assert!(args.model.is_none());

    let cli = Cli::parse_from(["houseprice", "gateway", "--model-url", "http://localhost:5001"]);
    let Commands::Gateway(args) = cli.command else {
        panic!("expected gateway");
    };
    assert_eq!(args.model_url.as_deref(), Some("http://localhost:5001"));
}

#[test]
fn test_subcommand_required() {
    assert!(Cli::try_parse_from(["houseprice"]).is_err());
}

#[test]
fn test_binary_help() {
    Command::cargo_bin("houseprice")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("preprocess"))
        .stdout(predicate::str::contains("gateway"));
}

#[test]
fn test_binary_writes_pipeline_descriptor() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("pipeline.json");

    Command::cargo_bin("houseprice")
        .unwrap()
        .args(["pipeline", "--output"])
        .arg(&out)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["stages"].as_array().unwrap().len(), 3);
    assert_eq!(json["stages"][1]["after"][0], "preprocess-data");
}

#[test]
fn test_binary_missing_input_fails() {
    let temp_dir = TempDir::new().unwrap();

    Command::cargo_bin("houseprice")
        .unwrap()
        .args(["preprocess", "--input"])
        .arg(temp_dir.path().join("missing.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_binary_offline_stages() {
    let temp_dir = TempDir::new().unwrap();
    let mut raw = common::create_house_dataframe(150, 9);
    let train_csv = common::write_csv(temp_dir.path(), "train.csv", &mut raw);
    let cleaned = temp_dir.path().join("cleaned_data.csv");
    let model = temp_dir.path().join("models").join("model.json");
    let metrics = temp_dir.path().join("model_metrics.txt");
    let heatmap = temp_dir.path().join("confusion_matrix.png");

    Command::cargo_bin("houseprice")
        .unwrap()
        .args(["preprocess", "--input"])
        .arg(&train_csv)
        .arg("--test")
        .arg(temp_dir.path().join("test.csv"))
        .arg("--data_path")
        .arg(&cleaned)
        .assert()
        .success();

    Command::cargo_bin("houseprice")
        .unwrap()
        .args(["train", "--hidden-layers", "16,8", "--max-iter", "100", "--data_path"])
        .arg(&cleaned)
        .arg("--model_path")
        .arg(&model)
        .assert()
        .success();

    Command::cargo_bin("houseprice")
        .unwrap()
        .args(["evaluate", "--model_path"])
        .arg(&model)
        .arg("--data_path")
        .arg(&cleaned)
        .arg("--metrics_path")
        .arg(&metrics)
        .arg("--heatmap")
        .arg(&heatmap)
        .assert()
        .success();

    let report = std::fs::read_to_string(&metrics).unwrap();
    assert_eq!(report.lines().count(), 4);
    assert!(report.starts_with("Accuracy: "));
    let image = std::fs::read(&heatmap).unwrap();
    assert_eq!(image[..8], [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

    Command::cargo_bin("houseprice")
        .unwrap()
        .args(["predict", "--model"])
        .arg(&model)
        .arg("--input")
        .arg(&train_csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("The prediction for the first row of"));
}
