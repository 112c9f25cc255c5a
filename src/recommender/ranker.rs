use tracing::{debug, warn};

use crate::{
    error::Result,
    recommender::{embedding::EmbeddingStore, network::ScorerNetwork},
    records::{Post, RecordId},
    utils::sort::top_n_desc_by_key,
};

pub const DEFAULT_TOP_N: usize = 10;

/// Top `n` posts by engagement score, ties in input order
pub fn popular_posts(posts: &[Post], n: usize) -> Vec<&Post> {
    top_n_desc_by_key(posts.iter().collect(), n, |post| post.engagement_score)
}

/// Rank `posts` for `user_id`.
///
/// Users without an embedding fall back to [`popular_posts`]. Otherwise every post with an
/// embedding is scored by the network and the best `n` are returned; posts the model has no
/// embedding for are left out.
pub fn rank<'a>(
    network: &ScorerNetwork,
    store: &EmbeddingStore,
    user_id: &RecordId,
    posts: &'a [Post],
    n: usize,
) -> Result<Vec<&'a Post>> {
    let Some(user) = store.user(user_id) else {
        warn!(user = %user_id, "no embedding for user, falling back to popular posts");
        return Ok(popular_posts(posts, n));
    };

    let (candidates, embeddings): (Vec<&Post>, Vec<&[f32]>) = posts
        .iter()
        .filter_map(|post| store.post(&post.id).map(|embedding| (post, embedding)))
        .unzip();
    if candidates.len() < posts.len() {
        debug!(
            skipped = posts.len() - candidates.len(),
            "posts without an embedding are not ranked"
        );
    }

    let scores = network.predict_batch(user, &embeddings)?;
    let scored: Vec<(&Post, f32)> = candidates.into_iter().zip(scores).collect();
    Ok(top_n_desc_by_key(scored, n, |(_, score)| *score as f64)
        .into_iter()
        .map(|(post, _)| post)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::embedding::EMBEDDING_DIM;
    use crate::records::Interaction;

    fn posts() -> Vec<Post> {
        vec![
            Post::new(1, "a", 5.0),
            Post::new(2, "b", 10.0),
            Post::new(3, "c", 10.0),
            Post::new(4, "d", 1.0),
        ]
    }

    fn store() -> EmbeddingStore {
        let posts = posts();
        let vectors: Vec<Vec<f32>> = (0..posts.len())
            .map(|i| {
                let mut v = vec![0.0; EMBEDDING_DIM];
                v[i] = 1.0;
                v
            })
            .collect();
        EmbeddingStore::build(&[Interaction::new("u1", 1)], &posts[..3], &vectors[..3])
    }

    #[test]
    fn popularity_fallback_is_stable() {
        let posts = posts();
        let ids: Vec<_> = popular_posts(&posts, 3).iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::Int(2), RecordId::Int(3), RecordId::Int(1)]);
        assert!(popular_posts(&posts, 0).is_empty());
        assert_eq!(popular_posts(&posts, 99).len(), 4);
    }

    #[test]
    fn cold_start_user_gets_popular_posts() {
        let posts = posts();
        let network = ScorerNetwork::new(1);
        let ranked = rank(&network, &store(), &"nobody".into(), &posts, 2).unwrap();
        assert_eq!(ranked, popular_posts(&posts, 2));
    }

    #[test]
    fn ranking_skips_posts_without_embedding_and_sorts_by_score() {
        let posts = posts();
        let store = store();
        let network = ScorerNetwork::new(1);
        let ranked = rank(&network, &store, &"u1".into(), &posts, 10).unwrap();
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|p| p.id != RecordId::Int(4)));

        let user = store.user(&"u1".into()).unwrap();
        let scores: Vec<f32> = ranked
            .iter()
            .map(|p| network.predict(user, store.post(&p.id).unwrap()).unwrap())
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        assert_eq!(rank(&network, &store, &"u1".into(), &posts, 1).unwrap().len(), 1);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let posts = vec![
            Post::new(3, "c", 0.0),
            Post::new(1, "a", 0.0),
            Post::new(4, "d", 0.0),
            Post::new(2, "b", 0.0),
        ];
        let mut shared = vec![0.0; EMBEDDING_DIM];
        shared[0] = 1.0;
        let vectors = vec![shared; posts.len()];
        let store = EmbeddingStore::build(&[Interaction::new("u1", 1)], &posts, &vectors);

        let ranked = rank(&ScorerNetwork::new(9), &store, &"u1".into(), &posts, 10).unwrap();
        let ids: Vec<_> = ranked.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, vec![RecordId::Int(3), RecordId::Int(1), RecordId::Int(4), RecordId::Int(2)]);
    }
}
