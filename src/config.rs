use std::{env, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{RecommendError, Result};

pub const DEFAULT_MODEL_PATH: &str = "models/recommendation_model";

/// Training and persistence settings of a `RecommendationModel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// prefix of the three model artifacts
    pub model_path: PathBuf,
    pub epochs: usize,
    pub batch_size: usize,
    /// fraction of the examples (taken from the end) held out for validation
    pub validation_split: f32,
    pub learning_rate: f32,
    pub negatives_per_positive: usize,
    /// redraws allowed when a negative sample hits the positive post
    pub max_negative_attempts: usize,
    /// seed for weight init, negative sampling and shuffling
    pub seed: u64,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            epochs: 10,
            batch_size: 32,
            validation_split: 0.2,
            learning_rate: 0.001,
            negatives_per_positive: 3,
            max_negative_attempts: 10,
            seed: 42,
        }
    }
}

impl RecommenderConfig {
    /// Same as `default()` with a different artifact prefix
    pub fn with_model_path(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }

    /// Build from `RECOMMENDER_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            model_path: env::var("RECOMMENDER_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            epochs: env_or("RECOMMENDER_EPOCHS", defaults.epochs)?,
            batch_size: env_or("RECOMMENDER_BATCH_SIZE", defaults.batch_size)?,
            validation_split: env_or("RECOMMENDER_VALIDATION_SPLIT", defaults.validation_split)?,
            learning_rate: env_or("RECOMMENDER_LEARNING_RATE", defaults.learning_rate)?,
            negatives_per_positive: env_or(
                "RECOMMENDER_NEGATIVES_PER_POSITIVE",
                defaults.negatives_per_positive,
            )?,
            max_negative_attempts: env_or(
                "RECOMMENDER_MAX_NEGATIVE_ATTEMPTS",
                defaults.max_negative_attempts,
            )?,
            seed: env_or("RECOMMENDER_SEED", defaults.seed)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(RecommendError::Config("batch_size must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(RecommendError::Config(format!(
                "validation_split must be in [0, 1), got {}",
                self.validation_split
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(RecommendError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RecommendError::Config(format!("{} has an invalid value: {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}
