/// This crate is a post recommendation engine built on TF-IDF content embeddings
/// and a small feed-forward scorer.
pub mod config;
pub mod error;
pub mod records;
pub mod recommender;
pub mod utils;
pub mod vectorizer;

/// Recommendation Model
/// The top-level struct of this crate.
/// It trains on interactions and post contents, ranks posts for a user and
/// persists itself under a path prefix.
///
/// Internally, it holds:
/// - A fitted content vectorizer
/// - User and post embeddings
/// - The scorer network
///
/// Users without any known interaction are served the most engaging posts.
///
/// # Serialization
/// Through `save_model` / `load_model`, as three CBOR artifacts.
pub use recommender::RecommendationModel;

/// Result of one training run: sampling counts and per-epoch metrics
pub use recommender::TrainingReport;

/// TF-IDF Content Vectorizer
/// Turns post text into dense TF-IDF vectors over a sorted vocabulary.
///
/// `ContentVectorizer<N, E>` has the following generic parameters:
/// - `N`: Vector element type (f32, f64)
/// - `E`: TF-IDF calculation engine type (e.g., DefaultTFIDFEngine)
///
/// # Serialization
/// Supported. The analyzer is not stored.
pub use vectorizer::ContentVectorizer;

/// Term Frequency
/// Counts of each term in one document.
pub use vectorizer::token::TermFrequency;

/// Corpus
/// The number of documents and the number of documents each term appears in.
/// It is the base data for IDF calculation.
pub use vectorizer::corpus::Corpus;

/// TF-IDF Calculation Engine Trait
///
/// `idf_vec` builds the IDF weights of a fitted corpus and `tf_idf_vec` weights one document.
/// Implement it to change the weighting scheme of a `ContentVectorizer`.
pub use vectorizer::tfidf::{DefaultTFIDFEngine, TFIDFEngine};

/// Post and user embeddings
pub use recommender::embedding::EmbeddingStore;

/// Feed-forward (user, post) scorer
pub use recommender::network::ScorerNetwork;

/// Input records
pub use records::{Interaction, Post, RecordId};

pub use config::RecommenderConfig;

pub use error::{RecommendError, Result};
