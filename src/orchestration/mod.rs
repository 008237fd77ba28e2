//! Pipeline descriptor for an external container runner
//!
//! Declares the three offline stages as container invocations with explicit
//! `after` dependencies. Only the file paths are parameterized.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const PREPROCESS_STAGE: &str = "preprocess-data";
pub const TRAIN_STAGE: &str = "train-model";
pub const EVALUATE_STAGE: &str = "evaluate-model";

pub const DEFAULT_IMAGE: &str = "houseprice:latest";
pub const DEFAULT_DESCRIPTOR_PATH: &str = "pipeline.json";

/// Paths passed to every stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelinePaths {
    pub data_path: String,
    pub model_path: String,
    pub metrics_path: String,
}

impl Default for PipelinePaths {
    fn default() -> Self {
        Self {
            data_path: "/app/data/cleaned_data.csv".to_string(),
            model_path: "/app/models/mlp_classifier_model.json".to_string(),
            metrics_path: "/app/metrics/model_metrics.txt".to_string(),
        }
    }
}

/// One container invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub arguments: Vec<String>,
    /// Stages that must finish first
    #[serde(default)]
    pub after: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: PipelinePaths,
    pub stages: Vec<Stage>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PipelineDescriptor {
    /// preprocess → train → evaluate, each running one subcommand of this binary
    pub fn house_price(paths: PipelinePaths, image: &str) -> Self {
        let stage = |name: &str, subcommand: &str, arguments: Vec<String>, after: &[&str]| Stage {
            name: name.to_string(),
            image: image.to_string(),
            command: strings(&["houseprice", subcommand]),
            arguments,
            after: strings(after),
        };

        let stages = vec![
            stage(
                PREPROCESS_STAGE,
                "preprocess",
                strings(&["--data_path", &paths.data_path]),
                &[],
            ),
            stage(
                TRAIN_STAGE,
                "train",
                strings(&["--data_path", &paths.data_path, "--model_path", &paths.model_path]),
                &[PREPROCESS_STAGE],
            ),
            stage(
                EVALUATE_STAGE,
                "evaluate",
                strings(&[
                    "--model_path",
                    &paths.model_path,
                    "--data_path",
                    &paths.data_path,
                    "--metrics_path",
                    &paths.metrics_path,
                ]),
                &[TRAIN_STAGE],
            ),
        ];

        Self {
            name: "houseprice-pipeline".to_string(),
            description: "Preprocessing, training and evaluation of the house price classifier".to_string(),
            parameters: paths,
            stages,
        }
    }

    /// Stages in an order that honors every `after` edge.
    ///
    /// Ties keep declaration order. Fails on duplicate stage names, on a
    /// dependency naming an undeclared stage, and on cycles.
    pub fn execution_order(&self) -> Result<Vec<&Stage>> {
        let mut index = BTreeMap::new();
        for (i, stage) in self.stages.iter().enumerate() {
            if index.insert(stage.name.as_str(), i).is_some() {
                anyhow::bail!("Duplicate stage name '{}'", stage.name);
            }
        }

        let mut pending: Vec<usize> = vec![0; self.stages.len()];
        for (i, stage) in self.stages.iter().enumerate() {
            for dep in &stage.after {
                if !index.contains_key(dep.as_str()) {
                    anyhow::bail!("Stage '{}' depends on undeclared stage '{}'", stage.name, dep);
                }
            }
            let unique: BTreeSet<&str> = stage.after.iter().map(String::as_str).collect();
            pending[i] = unique.len();
        }

        let mut order = Vec::with_capacity(self.stages.len());
        let mut done = vec![false; self.stages.len()];
        while order.len() < self.stages.len() {
            let Some(next) = (0..self.stages.len()).find(|&i| !done[i] && pending[i] == 0) else {
                let blocked: Vec<&str> = (0..self.stages.len())
                    .filter(|&i| !done[i])
                    .map(|i| self.stages[i].name.as_str())
                    .collect();
                anyhow::bail!("Dependency cycle between stages: {}", blocked.join(", "));
            };

            done[next] = true;
            order.push(&self.stages[next]);
            let finished = self.stages[next].name.as_str();
            for (i, stage) in self.stages.iter().enumerate() {
                if !done[i] && stage.after.iter().any(|d| d == finished) {
                    pending[i] -= 1;
                }
            }
        }
        Ok(order)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline descriptor")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.execution_order()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write pipeline descriptor: {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline descriptor: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid pipeline descriptor: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_dependency_counts_once() {
        let mut descriptor = PipelineDescriptor::house_price(PipelinePaths::default(), DEFAULT_IMAGE);
        descriptor.stages[1].after.push(PREPROCESS_STAGE.to_string());

        let names: Vec<&str> = descriptor
            .execution_order()
            .unwrap()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec![PREPROCESS_STAGE, TRAIN_STAGE, EVALUATE_STAGE]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut descriptor = PipelineDescriptor::house_price(PipelinePaths::default(), DEFAULT_IMAGE);
        descriptor.stages[0].after.push(EVALUATE_STAGE.to_string());

        let err = descriptor.execution_order().unwrap_err().to_string();
        assert!(err.contains("cycle"));
    }
}
