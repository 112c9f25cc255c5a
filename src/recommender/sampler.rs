use rand::Rng;
use tracing::{debug, warn};

use crate::{recommender::embedding::EmbeddingStore, records::Interaction};

/// One labelled (user, post) pair
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub user: Vec<f32>,
    pub post: Vec<f32>,
    /// 1.0 for an observed interaction, 0.0 for a sampled negative
    pub label: f32,
}

/// What the sampler had to leave out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplingStats {
    pub positives: usize,
    pub negatives: usize,
    /// interactions whose user or post has no embedding
    pub dropped_interactions: usize,
    /// negatives abandoned after every redraw hit the positive post
    pub skipped_negatives: usize,
}

/// Expands interactions into positives plus uniformly drawn negatives
#[derive(Debug, Clone, Copy)]
pub struct InteractionSampler {
    pub negatives_per_positive: usize,
    pub max_attempts: usize,
}

impl Default for InteractionSampler {
    fn default() -> Self {
        Self {
            negatives_per_positive: 3,
            max_attempts: 10,
        }
    }
}

impl InteractionSampler {
    pub fn new(negatives_per_positive: usize, max_attempts: usize) -> Self {
        Self {
            negatives_per_positive,
            max_attempts,
        }
    }

    /// Build the training set.
    ///
    /// Each resolvable interaction yields its positive example directly followed by its
    /// negatives. A negative draws a post uniformly from all known posts and redraws when it
    /// hits the positive post, at most `max_attempts` times; then it is skipped.
    pub fn sample<R: Rng>(
        &self,
        interactions: &[Interaction],
        store: &EmbeddingStore,
        rng: &mut R,
    ) -> (Vec<TrainingExample>, SamplingStats) {
        let mut stats = SamplingStats::default();
        let mut examples =
            Vec::with_capacity(interactions.len() * (1 + self.negatives_per_positive));
        let post_count = store.post_embeddings.len();

        for interaction in interactions {
            let (Some(user), Some(post)) = (
                store.user(&interaction.user_id),
                store.post(&interaction.post_id),
            ) else {
                stats.dropped_interactions += 1;
                continue;
            };
            examples.push(TrainingExample {
                user: user.to_vec(),
                post: post.to_vec(),
                label: 1.0,
            });
            stats.positives += 1;

            for _ in 0..self.negatives_per_positive {
                let negative = (0..self.max_attempts)
                    .map(|_| rng.gen_range(0..post_count))
                    .filter_map(|idx| store.post_embeddings.get_index(idx))
                    .find(|(post_id, _)| **post_id != interaction.post_id);
                match negative {
                    Some((_, embedding)) => {
                        examples.push(TrainingExample {
                            user: user.to_vec(),
                            post: embedding.clone(),
                            label: 0.0,
                        });
                        stats.negatives += 1;
                    }
                    None => stats.skipped_negatives += 1,
                }
            }
        }

        if stats.dropped_interactions > 0 {
            warn!(
                dropped = stats.dropped_interactions,
                "interactions without a user or post embedding were dropped"
            );
        }
        if stats.skipped_negatives > 0 {
            warn!(
                skipped = stats.skipped_negatives,
                "negative samples skipped after exhausting redraws"
            );
        }
        debug!(
            positives = stats.positives,
            negatives = stats.negatives,
            "sampled training examples"
        );
        (examples, stats)
    }
}
