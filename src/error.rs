use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("model artifact encoding error: {0}")]
    Codec(#[from] serde_cbor::Error),

    #[error("record parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// No post content was given to the vectorizer
    #[error("cannot fit the content vectorizer on an empty corpus")]
    EmptyCorpus,

    /// Every token of the corpus was filtered out
    #[error("empty vocabulary; the posts may only contain stop words")]
    EmptyVocabulary,

    /// None of the interactions resolved to a known user and post
    #[error("no training examples could be built from the interactions")]
    EmptyTrainingSet,

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("unexpected model format: {0}")]
    ModelFormat(String),
}

pub type Result<T> = std::result::Result<T, RecommendError>;
