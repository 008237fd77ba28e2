//! Multi-layer perceptron classifier
//!
//! Feed-forward network with ReLU hidden layers and a softmax output,
//! trained on cross-entropy with L2 regularization and the Adam optimizer
//! over shuffled minibatches.

use anyhow::Result;
use ndarray::{Array, Array1, Array2, Axis, Dimension, Zip};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Probabilities are clipped away from 0 before taking the log
const PROB_EPSILON: f64 = f64::EPSILON;

/// Network and optimizer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpConfig {
    /// Hidden layer sizes
    pub hidden_layers: Vec<usize>,
    /// Adam step size
    pub learning_rate: f64,
    /// Maximum number of epochs
    pub max_iter: usize,
    /// Minibatch size; `None` means `min(200, n_samples)`
    pub batch_size: Option<usize>,
    /// L2 penalty
    pub alpha: f64,
    pub beta_1: f64,
    pub beta_2: f64,
    pub epsilon: f64,
    /// Minimum loss improvement that counts as progress
    pub tol: f64,
    /// Epochs without progress tolerated before stopping
    pub n_iter_no_change: usize,
    pub random_state: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![100, 50],
            learning_rate: 0.001,
            max_iter: 500,
            batch_size: None,
            alpha: 0.0001,
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
            tol: 1e-4,
            n_iter_no_change: 10,
            random_state: 42,
        }
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    /// Epochs actually run
    pub n_iter: usize,
    pub final_loss: f64,
    /// False when training stopped at `max_iter`
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MlpClassifier {
    pub config: MlpConfig,
    /// `(n_in, n_out)` per layer
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    n_features: usize,
    n_classes: usize,
    /// Mean training loss per epoch
    loss_curve: Vec<f64>,
}

impl MlpClassifier {
    pub fn new(config: MlpConfig) -> Self {
        Self {
            config,
            weights: Vec::new(),
            biases: Vec::new(),
            n_features: 0,
            n_classes: 0,
            loss_curve: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.weights.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn loss_curve(&self) -> &[f64] {
        &self.loss_curve
    }

    /// Fit on `x` with class indices `y` in `0..n_classes`
    pub fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> Result<FitSummary> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            anyhow::bail!("Cannot fit a classifier on zero samples");
        }
        if y.len() != n_samples {
            anyhow::bail!("Got {} labels for {} samples", y.len(), n_samples);
        }
        if n_classes < 2 {
            anyhow::bail!("Need at least 2 classes, got {}", n_classes);
        }
        if let Some(&bad) = y.iter().find(|&&label| label >= n_classes) {
            anyhow::bail!("Label {} is out of range for {} classes", bad, n_classes);
        }
        if self.config.hidden_layers.iter().any(|&size| size == 0) {
            anyhow::bail!("Hidden layer sizes must be positive: {:?}", self.config.hidden_layers);
        }

        self.n_features = x.ncols();
        self.n_classes = n_classes;
        self.loss_curve.clear();

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.random_state);
        self.initialize_weights(&mut rng);

        let y_onehot = one_hot(y, n_classes);
        let batch_size = self
            .config
            .batch_size
            .unwrap_or(200)
            .clamp(1, n_samples);

        let mut m_w: Vec<Array2<f64>> = self.weights.iter().map(|w| Array2::zeros(w.raw_dim())).collect();
        let mut v_w = m_w.clone();
        let mut m_b: Vec<Array1<f64>> = self.biases.iter().map(|b| Array1::zeros(b.raw_dim())).collect();
        let mut v_b = m_b.clone();
        let mut step: i32 = 0;

        let mut best_loss = f64::INFINITY;
        let mut no_improvement = 0usize;
        let mut converged = false;
        let mut indices: Vec<usize> = (0..n_samples).collect();

        for _epoch in 0..self.config.max_iter {
            indices.shuffle(&mut rng);
            let mut accumulated = 0.0;

            for batch in indices.chunks(batch_size) {
                let x_batch = x.select(Axis(0), batch);
                let y_batch = y_onehot.select(Axis(0), batch);

                let activations = self.forward(&x_batch);
                let (loss, gradients) = self.backward(&y_batch, &activations);
                accumulated += loss * batch.len() as f64;

                step += 1;
                let lr = self.config.learning_rate
                    * (1.0 - self.config.beta_2.powi(step)).sqrt()
                    / (1.0 - self.config.beta_1.powi(step));

                let adam = AdamStep {
                    lr,
                    beta_1: self.config.beta_1,
                    beta_2: self.config.beta_2,
                    epsilon: self.config.epsilon,
                };
                for (i, (grad_w, grad_b)) in gradients.into_iter().enumerate() {
                    adam.apply(&mut self.weights[i], &grad_w, &mut m_w[i], &mut v_w[i]);
                    adam.apply(&mut self.biases[i], &grad_b, &mut m_b[i], &mut v_b[i]);
                }
            }

            let epoch_loss = accumulated / n_samples as f64;
            self.loss_curve.push(epoch_loss);

            if epoch_loss > best_loss - self.config.tol {
                no_improvement += 1;
            } else {
                no_improvement = 0;
            }
            if epoch_loss < best_loss {
                best_loss = epoch_loss;
            }
            if no_improvement > self.config.n_iter_no_change {
                converged = true;
                break;
            }
        }

        Ok(FitSummary {
            n_iter: self.loss_curve.len(),
            final_loss: self.loss_curve.last().copied().unwrap_or(f64::NAN),
            converged,
        })
    }

    /// Class probabilities, `rows x n_classes`
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted() {
            anyhow::bail!("Classifier has not been fitted");
        }
        if x.ncols() != self.n_features {
            anyhow::bail!(
                "Classifier expects {} features, got {}",
                self.n_features,
                x.ncols()
            );
        }
        let mut activations = self.forward(x);
        Ok(activations.pop().unwrap_or_else(|| Array2::zeros((x.nrows(), self.n_classes))))
    }

    /// Most probable class index per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.rows().into_iter().map(|row| argmax(row.iter().copied())).collect())
    }

    fn initialize_weights(&mut self, rng: &mut ChaCha8Rng) {
        self.weights.clear();
        self.biases.clear();

        let mut layer_sizes = vec![self.n_features];
        layer_sizes.extend(&self.config.hidden_layers);
        layer_sizes.push(self.n_classes);

        for pair in layer_sizes.windows(2) {
            let (n_in, n_out) = (pair[0], pair[1]);
            // Glorot uniform
            let bound = (6.0 / (n_in + n_out) as f64).sqrt();
            self.weights
                .push(Array2::from_shape_simple_fn((n_in, n_out), || rng.gen_range(-bound..bound)));
            self.biases
                .push(Array1::from_shape_simple_fn(n_out, || rng.gen_range(-bound..bound)));
        }
    }

    /// Layer outputs, starting with the input itself and ending with the
    /// softmax probabilities
    fn forward(&self, x: &Array2<f64>) -> Vec<Array2<f64>> {
        let mut activations = Vec::with_capacity(self.weights.len() + 1);
        activations.push(x.to_owned());

        let last = self.weights.len().saturating_sub(1);
        for (i, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let z = activations[i].dot(w) + b;
            let a = if i == last {
                softmax(z)
            } else {
                z.mapv_into(|v| v.max(0.0))
            };
            activations.push(a);
        }

        activations
    }

    /// Regularized cross-entropy of the batch and the gradient of every layer
    fn backward(
        &self,
        y: &Array2<f64>,
        activations: &[Array2<f64>],
    ) -> (f64, Vec<(Array2<f64>, Array1<f64>)>) {
        let n = y.nrows() as f64;
        let layers = self.weights.len();
        let output = &activations[layers];

        let log_loss = -Zip::from(y)
            .and(output)
            .fold(0.0, |acc, &t, &p| acc + t * p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON).ln())
            / n;
        let penalty: f64 = self.weights.iter().map(|w| w.iter().map(|v| v * v).sum::<f64>()).sum();
        let loss = log_loss + 0.5 * self.config.alpha * penalty / n;

        let mut gradients = Vec::with_capacity(layers);
        let mut delta = output - y;

        for i in (0..layers).rev() {
            let grad_w = (activations[i].t().dot(&delta) + &self.weights[i] * self.config.alpha) / n;
            let grad_b = delta.sum_axis(Axis(0)) / n;

            if i > 0 {
                let relu_grad = activations[i].mapv(|a| if a > 0.0 { 1.0 } else { 0.0 });
                delta = delta.dot(&self.weights[i].t()) * relu_grad;
            }

            gradients.push((grad_w, grad_b));
        }

        gradients.reverse();
        (loss, gradients)
    }
}

/// One bias-corrected Adam update
struct AdamStep {
    lr: f64,
    beta_1: f64,
    beta_2: f64,
    epsilon: f64,
}

impl AdamStep {
    fn apply<D: Dimension>(
        &self,
        param: &mut Array<f64, D>,
        grad: &Array<f64, D>,
        m: &mut Array<f64, D>,
        v: &mut Array<f64, D>,
    ) {
        let (b1, b2) = (self.beta_1, self.beta_2);
        Zip::from(param)
            .and(grad)
            .and(m)
            .and(v)
            .for_each(|p, &g, m, v| {
                *m = b1 * *m + (1.0 - b1) * g;
                *v = b2 * *v + (1.0 - b2) * g * g;
                *p -= self.lr * *m / (v.sqrt() + self.epsilon);
            });
    }
}

fn one_hot(y: &[usize], n_classes: usize) -> Array2<f64> {
    let mut encoded = Array2::zeros((y.len(), n_classes));
    for (row, &label) in y.iter().enumerate() {
        encoded[[row, label]] = 1.0;
    }
    encoded
}

fn softmax(mut z: Array2<f64>) -> Array2<f64> {
    for mut row in z.rows_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    z
}

/// Index of the largest value; the first one wins ties
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    values
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best_v), (i, v)| {
            if v > best_v {
                (i, v)
            } else {
                (best_i, best_v)
            }
        })
        .0
}
