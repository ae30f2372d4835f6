use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::{
    error::{RecResult, RecommendError},
    models::{blend, Catalog, InteractionLog, ScoreSeries, ScoredTitle, UserId},
    services::{
        collaborative::{CollaborativeRecommender, NmfParams},
        content::ContentRecommender,
    },
};

const COMPONENT: &str = "HybridRecommender";

/// Blends collaborative and content-based scores into one ranked list
///
/// Fitting is one-shot. Afterwards every query takes `&self` and touches no
/// shared mutable state, so a fitted recommender can be shared across
/// threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct HybridRecommender {
    catalog: Arc<Catalog>,
    ratings: Arc<InteractionLog>,
    params: NmfParams,
    cb_model: ContentRecommender,
    cf_model: CollaborativeRecommender,
}

impl HybridRecommender {
    pub fn new(catalog: Catalog, ratings: InteractionLog, params: NmfParams) -> Self {
        Self {
            catalog: Arc::new(catalog),
            ratings: Arc::new(ratings),
            cb_model: ContentRecommender::new(),
            cf_model: CollaborativeRecommender::new(params.clone()),
            params,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn content_model(&self) -> &ContentRecommender {
        &self.cb_model
    }

    pub fn collaborative_model(&self) -> &CollaborativeRecommender {
        &self.cf_model
    }

    pub fn is_fitted(&self) -> bool {
        self.cb_model.is_fitted() && self.cf_model.is_fitted()
    }

    /// Fits both models; on error neither is kept
    pub fn fit(&mut self) -> RecResult<()> {
        self.fit_inner(None)
    }

    /// Same as [`fit`](Self::fit), polling `cancel` during the factorization
    pub fn fit_with_cancel(&mut self, cancel: &AtomicBool) -> RecResult<()> {
        self.fit_inner(Some(cancel))
    }

    fn fit_inner(&mut self, cancel: Option<&AtomicBool>) -> RecResult<()> {
        if self.is_fitted() {
            return Err(RecommendError::AlreadyFitted {
                component: COMPONENT,
            });
        }

        let mut cb_model = ContentRecommender::new();
        cb_model.fit(&self.catalog)?;

        let mut cf_model = CollaborativeRecommender::new(self.params.clone());
        match cancel {
            Some(flag) => cf_model.fit_with_cancel(&self.ratings, flag)?,
            None => cf_model.fit(&self.ratings)?,
        }

        self.cb_model = cb_model;
        self.cf_model = cf_model;
        Ok(())
    }

    /// Blended scores for every eligible car, best first
    ///
    /// Cars the user already rated and cars missing from the catalog are
    /// dropped. For a user without ratings the content scores are used as-is.
    pub fn recommend_scores(&self, user_id: UserId, seed: &str, alpha: f64) -> RecResult<ScoreSeries> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RecommendError::InvalidInput(format!(
                "alpha must be within [0, 1], got {}",
                alpha
            )));
        }

        let cf_scores = self.cf_model.predict_all(user_id)?;
        let cb_scores = self.cb_model.query(seed, self.catalog.len())?;

        let mut scores = if cf_scores.is_empty() {
            tracing::debug!(user_id = %user_id, "Cold start, ranking by content only");
            cb_scores
        } else {
            blend(alpha, &cf_scores, &cb_scores)
        };

        let rated = self.cf_model.rated_items(user_id)?;
        scores.retain(|e| {
            self.catalog.position(e.id).is_some() && !rated.is_some_and(|r| r.contains(&e.id))
        });

        let ranked = scores
            .order_by(|id| self.catalog.position(id))
            .top_k(usize::MAX);

        tracing::debug!(
            user_id = %user_id,
            seed = %seed,
            alpha,
            cf = cf_scores.len(),
            candidates = ranked.len(),
            "Hybrid scores computed"
        );
        Ok(ranked)
    }

    /// Top `n` distinct titles for a user and a seed car
    ///
    /// Titles are deduplicated in rank order, so fewer than `n` come back only
    /// when the distinct candidates run out. Rated cars are excluded by id, not
    /// by title: an unrated car sharing a title with a rated one is still
    /// returned under that title.
    pub fn recommend(&self, user_id: UserId, seed: &str, n: usize, alpha: f64) -> RecResult<Vec<String>> {
        let ranked = self.recommend_scores(user_id, seed, alpha)?;

        let mut seen: HashSet<&str> = HashSet::new();
        let titles: Vec<String> = ranked
            .iter()
            .filter_map(|e| self.catalog.title_of(e.id))
            .filter(|title| seen.insert(*title))
            .take(n)
            .map(str::to_string)
            .collect();

        tracing::info!(
            user_id = %user_id,
            seed = %seed,
            returned = titles.len(),
            "Hybrid recommendations ready"
        );
        Ok(titles)
    }

    /// Maps a score series to readable rows
    ///
    /// Ids missing from the catalog are skipped. With `top_n`, rows are sorted
    /// by descending score and truncated; otherwise series order is kept.
    pub fn id_to_title(&self, scores: &ScoreSeries, top_n: Option<usize>) -> Vec<ScoredTitle> {
        let mut rows: Vec<ScoredTitle> = scores
            .iter()
            .filter_map(|e| {
                self.catalog.title_of(e.id).map(|title| ScoredTitle {
                    id: e.id,
                    title: title.to_string(),
                    score: e.score,
                })
            })
            .collect();

        if let Some(n) = top_n {
            rows.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
            rows.truncate(n);
        }
        rows
    }
}
