pub mod embedding;
pub mod network;
pub mod persistence;
pub mod ranker;
pub mod sampler;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::{
    config::RecommenderConfig,
    error::{RecommendError, Result},
    records::{Interaction, Post, RecordId},
    vectorizer::ContentVectorizer,
};
use embedding::EmbeddingStore;
use network::{ScorerNetwork, TrainingHistory, TrainingOptions};
use persistence::{ArtifactPaths, ModelSnapshot};
use ranker::DEFAULT_TOP_N;
use sampler::{InteractionSampler, SamplingStats};

/// Outcome of one training run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingReport {
    pub sampling: SamplingStats,
    pub history: TrainingHistory,
}

/// Post recommendation model.
///
/// Owns the content vectorizer, the user/post embeddings and the scorer network, and keeps the
/// three in step: `train` replaces all of them and writes them to disk, `load_model` swaps all
/// of them in from disk.
///
/// ```no_run
/// use post_recommender::{Interaction, Post, RecommendationModel, RecommenderConfig};
///
/// let posts = vec![Post::new(1, "cats are great", 5.0), Post::new(2, "dogs are great", 10.0)];
/// let interactions = vec![Interaction::new("u1", 1)];
///
/// let mut model = RecommendationModel::new(RecommenderConfig::with_model_path("models/demo"));
/// model.train(&interactions, &posts)?;
/// let top = model.get_recommendations(&"u1".into(), &posts, 1)?;
/// assert_eq!(top.len(), 1);
/// # Ok::<(), post_recommender::RecommendError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RecommendationModel {
    config: RecommenderConfig,
    vectorizer: ContentVectorizer,
    embeddings: EmbeddingStore,
    network: ScorerNetwork,
}

impl Default for RecommendationModel {
    fn default() -> Self {
        Self::new(RecommenderConfig::default())
    }
}

impl RecommendationModel {
    /// Untrained model; nothing is read from disk until `load_model`
    pub fn new(config: RecommenderConfig) -> Self {
        let network = ScorerNetwork::new(config.seed);
        Self {
            config,
            vectorizer: ContentVectorizer::new(),
            embeddings: EmbeddingStore::new(),
            network,
        }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    pub fn vectorizer(&self) -> &ContentVectorizer {
        &self.vectorizer
    }

    pub fn embeddings(&self) -> &EmbeddingStore {
        &self.embeddings
    }

    pub fn network(&self) -> &ScorerNetwork {
        &self.network
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(&self.config.model_path)
    }

    /// Fit the whole pipeline on `interactions` and `posts`, then save the model.
    ///
    /// Prior embeddings and weights are discarded. Nothing is changed when the posts or the
    /// interactions cannot produce a training set.
    pub fn train(&mut self, interactions: &[Interaction], posts: &[Post]) -> Result<TrainingReport> {
        self.config.validate()?;
        if posts.is_empty() {
            return Err(RecommendError::EmptyCorpus);
        }
        info!(posts = posts.len(), interactions = interactions.len(), "training started");

        let mut vectorizer: ContentVectorizer = ContentVectorizer::new();
        let contents: Vec<&str> = posts.iter().map(|post| post.content.as_str()).collect();
        let content_vectors = vectorizer.fit_transform(&contents)?;
        let embeddings = EmbeddingStore::build(interactions, posts, &content_vectors);

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let sampler = InteractionSampler::new(
            self.config.negatives_per_positive,
            self.config.max_negative_attempts,
        );
        let (examples, sampling) = sampler.sample(interactions, &embeddings, &mut rng);
        if examples.is_empty() {
            return Err(RecommendError::EmptyTrainingSet);
        }

        let mut network = ScorerNetwork::with_rng(&mut rng);
        let history = network.fit(&examples, &TrainingOptions::from(&self.config), &mut rng);

        self.vectorizer = vectorizer;
        self.embeddings = embeddings;
        self.network = network;
        if let Some(last) = history.last() {
            info!(
                examples = examples.len(),
                loss = last.loss,
                accuracy = last.accuracy,
                "training finished"
            );
        }
        self.save_model()?;
        Ok(TrainingReport { sampling, history })
    }

    /// Best `n` posts of `posts` for `user_id`, best first.
    ///
    /// Users the model has no embedding for get the most engaging posts instead.
    pub fn get_recommendations<'a>(
        &self,
        user_id: &RecordId,
        posts: &'a [Post],
        n: usize,
    ) -> Result<Vec<&'a Post>> {
        ranker::rank(&self.network, &self.embeddings, user_id, posts, n)
    }

    /// `get_recommendations` with the default of 10 results
    pub fn recommend<'a>(&self, user_id: &RecordId, posts: &'a [Post]) -> Result<Vec<&'a Post>> {
        self.get_recommendations(user_id, posts, DEFAULT_TOP_N)
    }

    /// Interaction likelihood for one known user and post, `None` if either has no embedding
    pub fn score(&self, user_id: &RecordId, post_id: &RecordId) -> Result<Option<f32>> {
        match (self.embeddings.user(user_id), self.embeddings.post(post_id)) {
            (Some(user), Some(post)) => self.network.predict(user, post).map(Some),
            _ => Ok(None),
        }
    }

    pub fn save_model(&self) -> Result<()> {
        persistence::save(
            &self.artifact_paths(),
            &self.network,
            &self.vectorizer,
            &self.embeddings,
        )
    }

    /// Replace the in-memory model with the saved one.
    /// Returns `Ok(false)` and keeps the current state when nothing has been saved yet.
    pub fn load_model(&mut self) -> Result<bool> {
        let Some(ModelSnapshot {
            network,
            vectorizer,
            embeddings,
        }) = persistence::load(&self.artifact_paths())?
        else {
            return Ok(false);
        };
        self.network = network;
        self.vectorizer = vectorizer;
        self.embeddings = embeddings;
        Ok(true)
    }
}
