use std::{env, process::ExitCode, time::Instant};

use post_recommender::{
    records::{load_interactions, load_posts},
    RecommendError, RecommendationModel, RecommenderConfig, RecordId, Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_N: usize = 10;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let res = match args.first().map(String::as_str) {
        Some("train") => run_train(&args[1..]),
        Some("recommend") => run_recommend(&args[1..]),
        Some("-h") | Some("--help") => {
            print_usage();
            Ok(())
        }
        _ => {
            print_usage();
            return ExitCode::from(2);
        }
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  post-recommender train <interactions.json> <posts.json>");
    eprintln!("  post-recommender recommend <user-id> <posts.json> [n]");
    eprintln!("Settings are read from RECOMMENDER_* environment variables.");
}

fn run_train(args: &[String]) -> Result<()> {
    let [interactions_path, posts_path] = args else {
        return Err(usage("train expects <interactions.json> <posts.json>"));
    };
    let config = RecommenderConfig::from_env()?;
    let interactions = load_interactions(interactions_path)?;
    let posts = load_posts(posts_path)?;

    let start = Instant::now();
    let mut model = RecommendationModel::new(config);
    let report = model.train(&interactions, &posts)?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        dropped = report.sampling.dropped_interactions,
        path = %model.config().model_path.display(),
        "model trained"
    );
    println!("{}", serde_json::to_string_pretty(&report.history)?);
    Ok(())
}

fn run_recommend(args: &[String]) -> Result<()> {
    let (user, posts_path, n) = match args {
        [user, posts] => (user, posts, DEFAULT_N),
        [user, posts, n] => {
            let n = n
                .parse::<usize>()
                .map_err(|_| usage(&format!("invalid result count: {}", n)))?;
            (user, posts, n)
        }
        _ => return Err(usage("recommend expects <user-id> <posts.json> [n]")),
    };
    let config = RecommenderConfig::from_env()?;
    let posts = load_posts(posts_path)?;

    let mut model = RecommendationModel::new(config);
    if !model.load_model()? {
        warn!(
            path = %model.config().model_path.display(),
            "no trained model found, serving popular posts"
        );
    }
    let user_id = parse_user_id(user);
    let recommended = model.get_recommendations(&user_id, &posts, n)?;
    println!("{}", serde_json::to_string_pretty(&recommended)?);
    Ok(())
}

/// Numeric arguments are taken as numeric ids, anything else as a text id
fn parse_user_id(raw: &str) -> RecordId {
    raw.parse::<i64>()
        .map(RecordId::Int)
        .unwrap_or_else(|_| RecordId::from(raw))
}

fn usage(msg: &str) -> RecommendError {
    print_usage();
    RecommendError::Config(msg.to_string())
}
