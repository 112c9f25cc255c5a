//! Feed-forward scorer over (user embedding, post embedding) pairs.
//!
//! ```text
//! [user 100] ‖ [post 100] -> Dense 128 ReLU -> Dense 64 ReLU -> Dense 1 sigmoid
//! ```
//! Trained with binary cross-entropy and Adam.

pub mod dense;
pub mod optim;

use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::RecommenderConfig,
    error::{RecommendError, Result},
    recommender::{embedding::EMBEDDING_DIM, sampler::TrainingExample},
};
use dense::{Activation, Dense, DenseGrad};
use optim::Adam;

pub const INPUT_DIM: usize = 2 * EMBEDDING_DIM;
pub const HIDDEN_UNITS: [usize; 2] = [128, 64];

/// predictions are clipped to [EPSILON, 1 - EPSILON] inside the loss
const EPSILON: f32 = 1e-7;

/// Hyperparameters of one `fit`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub batch_size: usize,
    pub validation_split: f32,
    pub learning_rate: f32,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self::from(&RecommenderConfig::default())
    }
}

impl From<&RecommenderConfig> for TrainingOptions {
    fn from(config: &RecommenderConfig) -> Self {
        Self {
            epochs: config.epochs,
            batch_size: config.batch_size.max(1),
            validation_split: config.validation_split,
            learning_rate: config.learning_rate,
        }
    }
}

/// Loss and accuracy of one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub val_loss: Option<f32>,
    pub val_accuracy: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochMetrics>,
    pub train_examples: usize,
    pub validation_examples: usize,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScorerNetwork {
    layers: Vec<Dense>,
}

impl ScorerNetwork {
    /// Fresh, untrained network with weights drawn from `seed`
    pub fn new(seed: u64) -> Self {
        Self::with_rng(&mut StdRng::seed_from_u64(seed))
    }

    pub fn with_rng<R: Rng>(rng: &mut R) -> Self {
        let layers = vec![
            Dense::glorot(INPUT_DIM, HIDDEN_UNITS[0], Activation::Relu, rng),
            Dense::glorot(HIDDEN_UNITS[0], HIDDEN_UNITS[1], Activation::Relu, rng),
            Dense::glorot(HIDDEN_UNITS[1], 1, Activation::Sigmoid, rng),
        ];
        Self { layers }
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Check that a deserialized network has the expected shape
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.layers.first() else {
            return Err(RecommendError::ModelFormat("network has no layers".into()));
        };
        if first.in_features() != INPUT_DIM {
            return Err(RecommendError::ModelFormat(format!(
                "network expects {} inputs, found {}",
                INPUT_DIM,
                first.in_features()
            )));
        }
        for (idx, layer) in self.layers.iter().enumerate() {
            if !layer.is_consistent() {
                return Err(RecommendError::ModelFormat(format!(
                    "layer {} bias does not match its weights",
                    idx
                )));
            }
            if let Some(next) = self.layers.get(idx + 1) {
                if next.in_features() != layer.out_features() {
                    return Err(RecommendError::ModelFormat(format!(
                        "layer {} outputs {} units but layer {} expects {}",
                        idx,
                        layer.out_features(),
                        idx + 1,
                        next.in_features()
                    )));
                }
                if layer.activation != Activation::Relu {
                    return Err(RecommendError::ModelFormat(format!(
                        "hidden layer {} must use ReLU",
                        idx
                    )));
                }
            }
        }
        let last = &self.layers[self.layers.len() - 1];
        if last.out_features() != 1 || last.activation != Activation::Sigmoid {
            return Err(RecommendError::ModelFormat(
                "output layer must be a single sigmoid unit".into(),
            ));
        }
        Ok(())
    }

    /// Activations of every layer for a `[batch, INPUT_DIM]` input, input first, output last
    fn forward_cached(&self, inputs: Array2<f32>) -> Vec<Array2<f32>> {
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(inputs);
        for layer in &self.layers {
            let out = layer.forward(acts[acts.len() - 1].view());
            acts.push(out);
        }
        acts
    }

    /// One score per input row
    fn forward_batch(&self, inputs: Array2<f32>) -> Array1<f32> {
        self.layers
            .iter()
            .fold(inputs, |x, layer| layer.forward(x.view()))
            .index_axis_move(Axis(1), 0)
    }

    /// Interaction likelihood of one (user, post) pair, in [0, 1]
    pub fn predict(&self, user: &[f32], post: &[f32]) -> Result<f32> {
        check_dim(user)?;
        check_dim(post)?;
        Ok(self.forward_batch(pair_batch([(user, post)].into_iter()))[0])
    }

    /// Score many posts for one user in a single batch
    pub fn predict_batch(&self, user: &[f32], posts: &[&[f32]]) -> Result<Vec<f32>> {
        check_dim(user)?;
        for post in posts {
            check_dim(post)?;
        }
        if posts.is_empty() {
            return Ok(Vec::new());
        }
        let inputs = pair_batch(posts.iter().map(|&post| (user, post)));
        Ok(self.forward_batch(inputs).to_vec())
    }

    /// Train on `examples`.
    ///
    /// The last `validation_split` share of the examples is held out; the rest is reshuffled
    /// every epoch and fed in mini-batches.
    pub fn fit<R: Rng>(
        &mut self,
        examples: &[TrainingExample],
        options: &TrainingOptions,
        rng: &mut R,
    ) -> TrainingHistory {
        let keep = (1.0 - options.validation_split as f64).clamp(0.0, 1.0);
        let mut split = ((examples.len() as f64 * keep) as usize).min(examples.len());
        if split == 0 && !examples.is_empty() {
            warn!(examples = examples.len(), "too few examples to hold out validation data");
            split = examples.len();
        }
        let (train, validation) = examples.split_at(split);
        let mut history = TrainingHistory {
            epochs: Vec::with_capacity(options.epochs),
            train_examples: train.len(),
            validation_examples: validation.len(),
        };
        if train.is_empty() {
            return history;
        }

        let batch_size = options.batch_size.max(1);
        let mut adam = Adam::new(options.learning_rate);
        let mut order: Vec<usize> = (0..train.len()).collect();

        for epoch in 1..=options.epochs {
            order.shuffle(rng);
            let mut loss_sum = 0.0f64;
            let mut correct = 0usize;
            for batch in order.chunks(batch_size) {
                let inputs = pair_batch(
                    batch
                        .iter()
                        .map(|&idx| (train[idx].user.as_slice(), train[idx].post.as_slice())),
                );
                let labels: Array1<f32> = batch.iter().map(|&idx| train[idx].label).collect();
                let (grads, outputs) = self.backward(inputs, labels.view());
                let (loss, hits) = batch_metrics(&outputs, &labels);
                loss_sum += loss;
                correct += hits;
                adam.step(&mut self.layers, &grads);
            }

            let (val_loss, val_accuracy) = match self.evaluate(validation) {
                Some((loss, accuracy)) => (Some(loss), Some(accuracy)),
                None => (None, None),
            };
            let metrics = EpochMetrics {
                epoch,
                loss: (loss_sum / train.len() as f64) as f32,
                accuracy: correct as f32 / train.len() as f32,
                val_loss,
                val_accuracy,
            };
            info!(
                epoch,
                epochs = options.epochs,
                loss = metrics.loss,
                accuracy = metrics.accuracy,
                val_loss = ?metrics.val_loss,
                val_accuracy = ?metrics.val_accuracy,
                "epoch finished"
            );
            history.epochs.push(metrics);
        }
        history
    }

    /// Mean loss and accuracy, `None` for an empty set
    pub fn evaluate(&self, examples: &[TrainingExample]) -> Option<(f32, f32)> {
        if examples.is_empty() {
            return None;
        }
        let inputs = pair_batch(examples.iter().map(|ex| (ex.user.as_slice(), ex.post.as_slice())));
        let labels: Array1<f32> = examples.iter().map(|ex| ex.label).collect();
        let (loss_sum, correct) = batch_metrics(&self.forward_batch(inputs), &labels);
        let n = examples.len();
        Some(((loss_sum / n as f64) as f32, correct as f32 / n as f32))
    }

    /// Gradients of the mean batch loss for every layer, plus the batch predictions
    fn backward(&self, inputs: Array2<f32>, labels: ArrayView1<f32>) -> (Vec<DenseGrad>, Array1<f32>) {
        let acts = self.forward_cached(inputs);
        let output = &acts[acts.len() - 1];
        let predictions = output.column(0).to_owned();

        // sigmoid output with cross-entropy
        let mut delta = (output - &labels.insert_axis(Axis(1))) / labels.len() as f32;
        let mut grads = Vec::with_capacity(self.layers.len());
        for l in (0..self.layers.len()).rev() {
            let input = &acts[l];
            grads.push(DenseGrad {
                weight: delta.t().dot(input),
                bias: delta.sum_axis(Axis(0)),
            });
            if l == 0 {
                break;
            }
            let below = self.layers[l - 1].activation;
            let mut prev = delta.dot(&self.layers[l].weight);
            prev.zip_mut_with(input, |p, &a| *p *= below.derivative_from_output(a));
            delta = prev;
        }
        grads.reverse();
        (grads, predictions)
    }
}

/// Stack (user, post) pairs into a `[pairs, INPUT_DIM]` batch
fn pair_batch<'a, I>(pairs: I) -> Array2<f32>
where
    I: ExactSizeIterator<Item = (&'a [f32], &'a [f32])>,
{
    let mut batch = Array2::zeros((pairs.len(), INPUT_DIM));
    for (mut row, (user, post)) in batch.rows_mut().into_iter().zip(pairs) {
        row.slice_mut(s![..EMBEDDING_DIM]).assign(&ArrayView1::from(user));
        row.slice_mut(s![EMBEDDING_DIM..]).assign(&ArrayView1::from(post));
    }
    batch
}

/// Summed loss and number of correct predictions
fn batch_metrics(predictions: &Array1<f32>, labels: &Array1<f32>) -> (f64, usize) {
    predictions
        .iter()
        .zip(labels)
        .fold((0.0, 0), |(loss, hits), (&y, &t)| {
            (loss + bce(y, t) as f64, hits + is_hit(y, t) as usize)
        })
}

#[inline]
fn check_dim(embedding: &[f32]) -> Result<()> {
    if embedding.len() != EMBEDDING_DIM {
        return Err(RecommendError::DimensionMismatch {
            expected: EMBEDDING_DIM,
            got: embedding.len(),
        });
    }
    Ok(())
}

#[inline]
fn bce(y: f32, label: f32) -> f32 {
    let y = y.clamp(EPSILON, 1.0 - EPSILON);
    -(label * y.ln() + (1.0 - label) * (1.0 - y).ln())
}

#[inline]
fn is_hit(y: f32, label: f32) -> bool {
    (y > 0.5) == (label > 0.5)
}
