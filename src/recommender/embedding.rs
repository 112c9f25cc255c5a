use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    records::{Interaction, Post, RecordId},
    utils::math::{mean, truncate_or_pad},
};

/// Dimension of post and user embeddings
pub const EMBEDDING_DIM: usize = 100;

/// Post and user embeddings of one training run.
///
/// Both maps keep insertion order, so iterating them (and sampling from them with a seeded
/// RNG) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingStore {
    #[serde(with = "indexmap::map::serde_seq")]
    pub user_embeddings: IndexMap<RecordId, Vec<f32>>,
    #[serde(with = "indexmap::map::serde_seq")]
    pub post_embeddings: IndexMap<RecordId, Vec<f32>>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the embeddings of `posts` from their content vectors
    /// (index aligned with `posts`), then the embeddings of every user in `interactions`.
    pub fn build(interactions: &[Interaction], posts: &[Post], content_vectors: &[Vec<f32>]) -> Self {
        debug_assert_eq!(posts.len(), content_vectors.len());
        let mut store = Self::new();
        for (post, vector) in posts.iter().zip(content_vectors) {
            // a repeated id keeps its first position and the last vector
            store
                .post_embeddings
                .insert(post.id.clone(), truncate_or_pad(vector, EMBEDDING_DIM));
        }
        store.build_user_embeddings(interactions);
        debug!(
            posts = store.post_embeddings.len(),
            users = store.user_embeddings.len(),
            "built embeddings"
        );
        store
    }

    /// A user embedding is the mean of the embeddings of the posts the user interacted with.
    /// Interactions with unknown posts are skipped; a user left with none gets no entry.
    fn build_user_embeddings(&mut self, interactions: &[Interaction]) {
        let mut history: IndexMap<&RecordId, Vec<&[f32]>> = IndexMap::new();
        for interaction in interactions {
            let seen = history.entry(&interaction.user_id).or_default();
            if let Some(embedding) = self.post_embeddings.get(&interaction.post_id) {
                seen.push(embedding.as_slice());
            }
        }

        let user_embeddings = history
            .into_iter()
            .filter_map(|(user_id, embeddings)| {
                mean(embeddings).map(|embedding| (user_id.clone(), embedding))
            })
            .collect();
        self.user_embeddings = user_embeddings;
    }

    #[inline]
    pub fn user(&self, user_id: &RecordId) -> Option<&[f32]> {
        self.user_embeddings.get(user_id).map(Vec::as_slice)
    }

    #[inline]
    pub fn post(&self, post_id: &RecordId) -> Option<&[f32]> {
        self.post_embeddings.get(post_id).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.post_embeddings.is_empty() && self.user_embeddings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> Vec<Post> {
        vec![Post::new(1, "a", 1.0), Post::new(2, "b", 2.0), Post::new(3, "c", 3.0)]
    }

    fn vectors() -> Vec<Vec<f32>> {
        vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            (0..150).map(|i| i as f32).collect(),
        ]
    }

    #[test]
    fn post_embeddings_have_fixed_dimension() {
        let store = EmbeddingStore::build(&[], &posts(), &vectors());
        assert_eq!(store.post_embeddings.len(), 3);
        for embedding in store.post_embeddings.values() {
            assert_eq!(embedding.len(), EMBEDDING_DIM);
        }
        let first = store.post(&RecordId::Int(1)).unwrap();
        assert_eq!(first[0], 1.0);
        assert!(first[1..].iter().all(|&x| x == 0.0));
        let third = store.post(&RecordId::Int(3)).unwrap();
        assert_eq!(third[99], 99.0);
    }

    #[test]
    fn user_embedding_is_mean_of_their_posts() {
        let interactions = vec![
            Interaction::new("u1", 1),
            Interaction::new("u1", 2),
            Interaction::new("u2", 2),
        ];
        let store = EmbeddingStore::build(&interactions, &posts(), &vectors());
        let u1 = store.user(&"u1".into()).unwrap();
        assert_eq!(u1.len(), EMBEDDING_DIM);
        assert_eq!(&u1[..3], &[0.5f32, 0.5, 0.0]);
        let u2 = store.user(&"u2".into()).unwrap();
        assert_eq!(u2, store.post(&RecordId::Int(2)).unwrap());
    }

    #[test]
    fn unknown_posts_are_skipped_and_unresolved_users_absent() {
        let interactions = vec![
            Interaction::new("u1", 1),
            Interaction::new("u1", 404),
            Interaction::new("ghost", 404),
        ];
        let store = EmbeddingStore::build(&interactions, &posts(), &vectors());
        assert_eq!(store.user(&"u1".into()), store.post(&RecordId::Int(1)));
        assert!(store.user(&"ghost".into()).is_none());
        assert_eq!(store.user_embeddings.len(), 1);
    }

    #[test]
    fn users_keep_first_appearance_order() {
        let interactions = vec![
            Interaction::new("b", 1),
            Interaction::new("a", 2),
            Interaction::new("b", 3),
        ];
        let store = EmbeddingStore::build(&interactions, &posts(), &vectors());
        let users: Vec<_> = store.user_embeddings.keys().cloned().collect();
        assert_eq!(users, vec![RecordId::from("b"), RecordId::from("a")]);
    }
}
