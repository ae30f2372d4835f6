use std::collections::HashSet;
use std::io::Write;
use std::sync::Arc;

use autorec::{
    data, Catalog, ContentRecommender, CollaborativeRecommender, HybridRecommender,
    InteractionLog, Item, ItemId, NmfParams, Rating, RecommendError, UserId,
};

fn params() -> NmfParams {
    NmfParams {
        n_components: 3,
        ..NmfParams::default()
    }
}

fn catalog() -> Catalog {
    Catalog::new(vec![
        Item::new(1, "toyota camry 2020", "engine v6 sedan automatic"),
        Item::new(2, "toyota camry 2021", "engine v6 sedan automatic"),
        Item::new(3, "honda civic 2020", "engine i4 sedan manual"),
        Item::new(4, "ford f150 2019", "engine v8 truck towing"),
        Item::new(5, "ram 1500 2019", "engine v8 truck towing"),
        Item::new(6, "tesla model 3 2021", "electric sedan autopilot"),
        Item::new(7, "honda accord 2020", "engine i4 sedan automatic"),
        Item::new(8, "chevy bolt 2021", ""),
    ])
}

fn ratings() -> InteractionLog {
    InteractionLog::new(vec![
        Rating::new(10, 1, 5.0),
        Rating::new(10, 2, 4.0),
        Rating::new(10, 7, 4.0),
        Rating::new(20, 4, 5.0),
        Rating::new(20, 5, 4.0),
        Rating::new(20, 1, 1.0),
        Rating::new(30, 6, 5.0),
        Rating::new(30, 8, 4.0),
        Rating::new(30, 3, 2.0),
        Rating::new(40, 1, 4.0),
        Rating::new(40, 3, 5.0),
        Rating::new(40, 6, 3.0),
        Rating::new(40, 4, 1.0),
    ])
}

fn fitted() -> HybridRecommender {
    let mut hybrid = HybridRecommender::new(catalog(), ratings(), params());
    hybrid.fit().unwrap();
    hybrid
}

#[test]
fn test_content_example_ranks_shared_tokens_first() {
    let catalog = Catalog::new(vec![
        Item::new(1, "toyota camry 2020", "engine v6"),
        Item::new(2, "toyota camry 2021", "engine v6"),
        Item::new(3, "honda civic 2020", "engine i4"),
    ]);
    let mut model = ContentRecommender::new();
    model.fit(&catalog).unwrap();

    let ids: Vec<ItemId> = model.query("toyota camry 2020", 2).unwrap().ids().collect();
    assert_eq!(ids, vec![ItemId(2), ItemId(3)]);
}

#[test]
fn test_seed_never_in_own_results() {
    let catalog = catalog();
    let mut model = ContentRecommender::new();
    model.fit(&catalog).unwrap();

    for item in catalog.items() {
        let scores = model.query(&item.title, catalog.len()).unwrap();
        assert!(!scores.contains(item.id), "{} returned itself", item.title);
    }
}

#[test]
fn test_fitting_is_deterministic() {
    let mut first = HybridRecommender::new(catalog(), ratings(), params());
    let mut second = HybridRecommender::new(catalog(), ratings(), params());
    first.fit().unwrap();
    second.fit().unwrap();

    assert_eq!(
        first.content_model().term_weights().unwrap(),
        second.content_model().term_weights().unwrap()
    );
    assert_eq!(
        first.collaborative_model().user_factors().unwrap(),
        second.collaborative_model().user_factors().unwrap()
    );
    assert_eq!(
        first.collaborative_model().item_factors().unwrap(),
        second.collaborative_model().item_factors().unwrap()
    );
}

#[test]
fn test_scores_are_normalized() {
    let hybrid = fitted();
    for user in [10, 20, 30, 40] {
        let cf = hybrid.collaborative_model().predict_all(UserId(user)).unwrap();
        assert!(cf.iter().all(|e| (0.0..=1.0).contains(&e.score)));
    }
    for item in catalog().items() {
        let cb = hybrid.content_model().query(&item.title, 10).unwrap();
        assert!(cb.iter().all(|e| (0.0..=1.0).contains(&e.score)));
    }
}

#[test]
fn test_alpha_one_matches_collaborative_ranking() {
    let hybrid = fitted();
    let user = UserId(40);

    let cf = hybrid.collaborative_model().predict_all(user).unwrap();
    let blended = hybrid.recommend_scores(user, "ford f150 2019", 1.0).unwrap();

    for entry in blended.iter() {
        assert_eq!(Some(entry.score), cf.get(entry.id).or(Some(0.0)));
    }
    let top_cf = cf.top_k(1).ids().next();
    assert_eq!(blended.ids().next(), top_cf);
}

#[test]
fn test_alpha_zero_matches_content_ranking() {
    let hybrid = fitted();
    let user = UserId(10);
    let seed = "honda civic 2020";

    let rated: HashSet<ItemId> = [ItemId(1), ItemId(2), ItemId(7)].into_iter().collect();
    let content: Vec<ItemId> = hybrid
        .content_model()
        .query(seed, 10)
        .unwrap()
        .ids()
        .filter(|id| !rated.contains(id))
        .collect();
    // The seed car is not a content candidate; it only enters through the
    // collaborative side, with a blended score of 0
    let blended: Vec<ItemId> = hybrid
        .recommend_scores(user, seed, 0.0)
        .unwrap()
        .ids()
        .filter(|id| *id != ItemId(3))
        .collect();

    assert_eq!(blended, content);
}

#[test]
fn test_unknown_user_gets_content_only_output() {
    let hybrid = fitted();
    let seed = "toyota camry 2020";

    let content: Vec<String> = hybrid
        .content_model()
        .query(seed, 4)
        .unwrap()
        .ids()
        .map(|id| hybrid.catalog().title_of(id).unwrap().to_string())
        .collect();
    let titles = hybrid.recommend(UserId(9999), seed, 4, 0.5).unwrap();

    assert_eq!(titles, content);
}

#[test]
fn test_never_recommends_rated_cars() {
    let hybrid = fitted();
    let catalog = catalog();
    for user in [10, 20, 30, 40] {
        let rated: HashSet<&str> = ratings()
            .items_rated_by(UserId(user))
            .filter_map(|id| catalog.title_of(id))
            .collect();
        let titles = hybrid.recommend(UserId(user), "toyota camry 2020", 10, 0.5).unwrap();
        assert!(titles.iter().all(|t| !rated.contains(t.as_str())));
    }
}

#[test]
fn test_length_bounded_by_n_and_candidates() {
    let hybrid = fitted();
    let titles = hybrid.recommend(UserId(10), "ford f150 2019", 2, 0.5).unwrap();
    assert_eq!(titles.len(), 2);

    // 8 cars, 3 rated by user 10 -> at most 5 candidates
    let titles = hybrid.recommend(UserId(10), "ford f150 2019", 50, 0.5).unwrap();
    assert_eq!(titles.len(), 5);
}

#[test]
fn test_empty_log_is_insufficient_data() {
    let mut model = CollaborativeRecommender::new(params());
    assert!(matches!(
        model.fit(&InteractionLog::default()),
        Err(RecommendError::InsufficientData(_))
    ));
}

#[test]
fn test_query_before_fit_is_not_fitted() {
    let hybrid = HybridRecommender::new(catalog(), ratings(), params());
    assert!(matches!(
        hybrid.recommend_scores(UserId(10), "toyota camry 2020", 0.5),
        Err(RecommendError::NotFitted { .. })
    ));
}

#[test]
fn test_pipeline_from_csv_files() {
    let mut cars = tempfile::NamedTempFile::new().unwrap();
    writeln!(cars, "carID,Make Model Year,Features").unwrap();
    writeln!(cars, "1,volkswagen passat 2.0 tdi sel 2012,diesel sedan leather").unwrap();
    writeln!(cars, "2,volkswagen jetta 2.0 tdi 2012,diesel sedan").unwrap();
    writeln!(cars, "3,bmw 328d 2014,diesel sedan leather navigation").unwrap();
    writeln!(cars, "4,mazda mx-5 2016,").unwrap();

    let mut ratings = tempfile::NamedTempFile::new().unwrap();
    writeln!(ratings, "userID,carID,Rating").unwrap();
    writeln!(ratings, "27583,1,5").unwrap();
    writeln!(ratings, "27583,4,2").unwrap();
    writeln!(ratings, "100,2,4").unwrap();
    writeln!(ratings, "100,3,5").unwrap();

    let catalog = data::load_catalog(cars.path()).unwrap();
    let log = data::load_ratings(ratings.path()).unwrap();
    assert_eq!(catalog.len(), 4);
    assert_eq!(log.len(), 4);

    let mut hybrid = HybridRecommender::new(catalog, log, params());
    hybrid.fit().unwrap();

    let titles = hybrid
        .recommend(UserId(27583), "volkswagen passat 2.0 tdi sel 2012", 10, 0.5)
        .unwrap();
    assert_eq!(titles.len(), 2);
    assert!(titles.iter().all(|t| t != "mazda mx-5 2016"));
}

#[tokio::test]
async fn test_concurrent_queries_on_shared_model() {
    let hybrid = Arc::new(fitted());
    let expected = hybrid.recommend(UserId(40), "tesla model 3 2021", 3, 0.5).unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let hybrid = Arc::clone(&hybrid);
        tasks.push(tokio::task::spawn_blocking(move || {
            hybrid.recommend(UserId(40), "tesla model 3 2021", 3, 0.5)
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), expected);
    }
}
