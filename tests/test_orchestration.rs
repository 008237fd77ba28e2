//! Tests for the pipeline descriptor

use houseprice::orchestration::*;
use tempfile::TempDir;

fn descriptor() -> PipelineDescriptor {
    PipelineDescriptor::house_price(PipelinePaths::default(), DEFAULT_IMAGE)
}

#[test]
fn test_stage_order() {
    let d = descriptor();

    let names: Vec<&str> = d.execution_order().unwrap().iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, vec![PREPROCESS_STAGE, TRAIN_STAGE, EVALUATE_STAGE]);
}

#[test]
fn test_stages_share_image_and_paths() {
    let paths = PipelinePaths {
        data_path: "/data/clean.csv".to_string(),
        model_path: "/models/m.json".to_string(),
        metrics_path: "/metrics/m.txt".to_string(),
    };

    let d = PipelineDescriptor::house_price(paths.clone(), "registry.local/houseprice:1.0");

    assert!(d.stages.iter().all(|s| s.image == "registry.local/houseprice:1.0"));
    assert_eq!(d.parameters, paths);
    let evaluate = d.stages.iter().find(|s| s.name == EVALUATE_STAGE).unwrap();
    assert_eq!(evaluate.command, vec!["houseprice", "evaluate"]);
    assert!(evaluate.arguments.contains(&"/metrics/m.txt".to_string()));
    assert!(evaluate.arguments.contains(&"--model_path".to_string()));
}

#[test]
fn test_declaration_order_does_not_matter() {
    let mut d = descriptor();
    d.stages.reverse();

    let names: Vec<&str> = d.execution_order().unwrap().iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, vec![PREPROCESS_STAGE, TRAIN_STAGE, EVALUATE_STAGE]);
}

#[test]
fn test_undeclared_dependency_rejected() {
    let mut d = descriptor();
    d.stages[2].after.push("deploy-model".to_string());

    let err = d.execution_order().unwrap_err().to_string();

    assert!(err.contains("deploy-model"), "unexpected error: {}", err);
}

#[test]
fn test_duplicate_stage_rejected() {
    let mut d = descriptor();
    let copy = d.stages[0].clone();
    d.stages.push(copy);

    assert!(d.execution_order().is_err());
}

#[test]
fn test_save_and_load() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out").join(DEFAULT_DESCRIPTOR_PATH);
    let d = descriptor();

    d.save(&path).unwrap();
    let loaded = PipelineDescriptor::load(&path).unwrap();

    assert_eq!(loaded, d);
}

#[test]
fn test_invalid_descriptor_not_saved() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pipeline.json");
    let mut d = descriptor();
    d.stages[0].after.push(TRAIN_STAGE.to_string());

    assert!(d.save(&path).is_err());
    assert!(!path.exists());
}

#[test]
fn test_missing_after_defaults_to_empty() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("pipeline.json");
    std::fs::write(
        &path,
        r#"{
            "name": "p",
            "description": "",
            "parameters": {"data_path": "a", "model_path": "b", "metrics_path": "c"},
            "stages": [{"name": "only", "image": "i", "command": ["houseprice"], "arguments": []}]
        }"#,
    )
    .unwrap();

    let d = PipelineDescriptor::load(&path).unwrap();

    assert!(d.stages[0].after.is_empty());
    assert_eq!(d.execution_order().unwrap().len(), 1);
}
