use post_recommender::{
    records::load_posts, Interaction, Post, RecommendError, RecommendationModel, RecommenderConfig,
    RecordId,
};
use tempfile::tempdir;

fn posts() -> Vec<Post> {
    serde_json::from_str(
        r#"[
            {"id": 1, "content": "Rust borrow checker deep dive", "engagement_score": 12},
            {"id": 2, "content": "Async Rust runtimes compared", "engagement_score": 30},
            {"id": 3, "content": "Growing tomatoes on a balcony", "engagement_score": 8},
            {"id": 4, "content": "Balcony garden watering tips", "engagement_score": 21},
            {"id": 5, "content": "Weekend pasta sauce recipe", "engagement_score": 30},
            {"id": "p-6", "content": "Fresh tomato pasta for summer", "engagement_score": 2}
        ]"#,
    )
    .unwrap()
}

fn interactions() -> Vec<Interaction> {
    serde_json::from_str(
        r#"[
            {"userId": "alice", "postId": 1},
            {"userId": "alice", "postId": 2},
            {"userId": "bob", "postId": 3},
            {"userId": "bob", "postId": 4},
            {"userId": 77, "postId": 5},
            {"userId": 77, "postId": "p-6"},
            {"userId": "carol", "postId": 999}
        ]"#,
    )
    .unwrap()
}

fn ids(posts: &[&Post]) -> Vec<RecordId> {
    posts.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn saved_model_ranks_like_the_trained_one() {
    let dir = tempdir().unwrap();
    let config = RecommenderConfig::with_model_path(dir.path().join("models/recommendation_model"));
    let posts = posts();

    let mut trained = RecommendationModel::new(config.clone());
    let report = trained.train(&interactions(), &posts).unwrap();
    assert_eq!(report.sampling.positives, 6);
    assert_eq!(report.sampling.dropped_interactions, 1);
    assert!(dir.path().join("models/recommendation_model_vectorizer.pkl").is_file());
    assert!(dir.path().join("models/recommendation_model_embeddings.pkl").is_file());

    let mut restored = RecommendationModel::new(config);
    assert!(restored.load_model().unwrap());

    for user in [RecordId::from("alice"), RecordId::from("bob"), RecordId::Int(77)] {
        let before = trained.recommend(&user, &posts).unwrap();
        let after = restored.recommend(&user, &posts).unwrap();
        assert_eq!(ids(&before), ids(&after));
        assert_eq!(before.len(), posts.len());
    }
}

#[test]
fn unknown_users_get_popular_posts() {
    let dir = tempdir().unwrap();
    let posts = posts();
    let mut model = RecommendationModel::new(RecommenderConfig::with_model_path(dir.path().join("m")));
    model.train(&interactions(), &posts).unwrap();

    // carol only interacted with a post that does not exist
    let top = model.get_recommendations(&"carol".into(), &posts, 3).unwrap();
    assert_eq!(ids(&top), vec![RecordId::Int(2), RecordId::Int(5), RecordId::Int(4)]);
}

#[test]
fn posts_unknown_to_the_model_are_not_recommended() {
    let dir = tempdir().unwrap();
    let posts = posts();
    let mut model = RecommendationModel::new(RecommenderConfig::with_model_path(dir.path().join("m")));
    model.train(&interactions(), &posts).unwrap();

    let mut candidates = posts.clone();
    candidates.push(Post::new(100, "brand new rust post", 1000.0));
    let top = model.recommend(&"alice".into(), &candidates).unwrap();
    assert_eq!(top.len(), posts.len());
    assert!(top.iter().all(|p| p.id != RecordId::Int(100)));
}

#[test]
fn loading_nothing_keeps_the_model() {
    let dir = tempdir().unwrap();
    let posts = posts();
    let mut model = RecommendationModel::new(RecommenderConfig::with_model_path(dir.path().join("m")));
    model.train(&interactions(), &posts).unwrap();
    let before = ids(&model.recommend(&"alice".into(), &posts).unwrap());

    let mut config = model.config().clone();
    config.model_path = dir.path().join("never-saved");
    let mut elsewhere = RecommendationModel::new(config);
    assert!(!elsewhere.load_model().unwrap());
    assert!(elsewhere.embeddings().is_empty());

    assert!(model.load_model().unwrap());
    assert_eq!(ids(&model.recommend(&"alice".into(), &posts).unwrap()), before);
}

#[test]
fn malformed_records_are_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("posts.json");
    std::fs::write(&path, r#"[{"id": 1, "engagement_score": 3}]"#).unwrap();
    assert!(matches!(load_posts(&path), Err(RecommendError::Json(_))));
}
