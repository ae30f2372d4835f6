use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use autorec::{
    config::Config,
    data,
    models::{ScoredTitle, UserId},
    services::HybridRecommender,
};

/// Everything the demo prints, in one serializable value
#[derive(Debug, Serialize)]
struct Report {
    seed_car: String,
    seed_user: UserId,
    alpha: f64,
    content: Vec<ScoredTitle>,
    collaborative: Vec<ScoredTitle>,
    hybrid: Vec<ScoredTitle>,
    titles: Vec<String>,
}

fn print_section(heading: &str, rows: &[ScoredTitle]) {
    println!("{}:", heading);
    if rows.is_empty() {
        println!("  (none)");
    }
    for row in rows {
        println!("  {:>8}  {:<45} {:.4}", row.id.0, row.title, row.score);
    }
    println!();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let catalog = data::load_catalog(&config.cars_data_path)
        .with_context(|| format!("Failed to load cars from {}", config.cars_data_path))?;
    let ratings = data::load_ratings(&config.ratings_data_path)
        .with_context(|| format!("Failed to load ratings from {}", config.ratings_data_path))?;

    // Fitting is CPU-bound; keep it off the async workers
    let params = config.nmf_params();
    let hybrid = tokio::task::spawn_blocking(move || {
        let mut hybrid = HybridRecommender::new(catalog, ratings, params);
        hybrid.fit().map(|_| hybrid)
    })
    .await??;
    let hybrid = Arc::new(hybrid);

    let user = UserId(config.seed_user);
    let n = config.top_n;
    let alpha = config.alpha;

    // The fitted model is read-only, so the three queries run side by side
    let content_task = {
        let hybrid = Arc::clone(&hybrid);
        let seed = config.seed_car.clone();
        tokio::task::spawn_blocking(move || hybrid.content_model().query(&seed, n))
    };
    let collaborative_task = {
        let hybrid = Arc::clone(&hybrid);
        tokio::task::spawn_blocking(move || hybrid.collaborative_model().recommend(user, n))
    };
    let hybrid_task = {
        let hybrid = Arc::clone(&hybrid);
        let seed = config.seed_car.clone();
        tokio::task::spawn_blocking(move || hybrid.recommend_scores(user, &seed, alpha))
    };
    let (content, collaborative, blended) =
        tokio::try_join!(content_task, collaborative_task, hybrid_task)?;

    let report = Report {
        seed_car: config.seed_car.clone(),
        seed_user: user,
        alpha,
        content: hybrid.id_to_title(&content?, Some(n)),
        collaborative: hybrid.id_to_title(&collaborative?, Some(n)),
        hybrid: hybrid.id_to_title(&blended?, Some(n)),
        titles: hybrid.recommend(user, &config.seed_car, n, alpha)?,
    };

    if config.output_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Seed car: {} | user: {} | alpha: {}\n", report.seed_car, report.seed_user, alpha);
    print_section("Content-based recommendations", &report.content);
    print_section("Collaborative recommendations", &report.collaborative);
    print_section("Hybrid recommendations", &report.hybrid);
    println!("Recommended titles:");
    for (rank, title) in report.titles.iter().enumerate() {
        println!("  {:>2}. {}", rank + 1, title);
    }

    Ok(())
}
