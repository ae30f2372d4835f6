use ndarray::Array2;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;

use crate::{
    error::{RecResult, RecommendError},
    models::{InteractionLog, ItemId, ScoreSeries, UserId},
    services::nmf::{self, Factorization},
};

const COMPONENT: &str = "CollaborativeRecommender";

/// Factorization hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct NmfParams {
    /// Rank `k` of the latent factors
    pub n_components: usize,
    pub max_iter: usize,
    /// Seed for factor initialization
    pub random_state: u64,
    pub tolerance: f64,
}

impl Default for NmfParams {
    fn default() -> Self {
        Self {
            n_components: 20,
            max_iter: 500,
            random_state: 42,
            tolerance: 1e-4,
        }
    }
}

/// Dense user x car rating matrix
///
/// Rows are users and columns are cars, both in order of first appearance in
/// the log. When a (user, car) pair is rated more than once, the last rating
/// in table order is kept. A 0 cell means either "not rated" or "rated 0";
/// the matrix cannot tell these apart, which is why rated sets are tracked
/// separately.
#[derive(Debug, Clone, PartialEq)]
pub struct UserItemMatrix {
    pub users: Vec<UserId>,
    pub items: Vec<ItemId>,
    pub values: Array2<f64>,
}

impl UserItemMatrix {
    /// Builds the matrix, rejecting negative or non-finite ratings
    pub fn from_log(log: &InteractionLog) -> RecResult<Self> {
        let mut user_index: HashMap<UserId, usize> = HashMap::new();
        let mut item_index: HashMap<ItemId, usize> = HashMap::new();
        let mut users = Vec::new();
        let mut items = Vec::new();

        for rating in log.ratings() {
            if !rating.value.is_finite() || rating.value < 0.0 {
                return Err(RecommendError::InvalidInput(format!(
                    "rating {} by user {} for car {} must be a non-negative number",
                    rating.value, rating.user_id, rating.item_id
                )));
            }
            user_index.entry(rating.user_id).or_insert_with(|| {
                users.push(rating.user_id);
                users.len() - 1
            });
            item_index.entry(rating.item_id).or_insert_with(|| {
                items.push(rating.item_id);
                items.len() - 1
            });
        }

        let mut values = Array2::<f64>::zeros((users.len(), items.len()));
        for rating in log.ratings() {
            values[[user_index[&rating.user_id], item_index[&rating.item_id]]] = rating.value;
        }

        Ok(Self {
            users,
            items,
            values,
        })
    }
}

/// State derived from the interaction log at fit time
#[derive(Debug, Clone)]
struct LatentModel {
    user_index: HashMap<UserId, usize>,
    item_ids: Vec<ItemId>,
    factors: Factorization,
    rated: HashMap<UserId, HashSet<ItemId>>,
}

/// Latent-factor recommender trained with NMF on the rating matrix
#[derive(Debug, Clone, Default)]
pub struct CollaborativeRecommender {
    params: NmfParams,
    model: Option<LatentModel>,
}

impl CollaborativeRecommender {
    pub fn new(params: NmfParams) -> Self {
        Self {
            params,
            model: None,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Trains the factorization on the user-item matrix
    pub fn fit(&mut self, log: &InteractionLog) -> RecResult<()> {
        self.fit_inner(log, None)
    }

    /// Same as [`fit`](Self::fit), stopping with `Cancelled` once `cancel` is set.
    /// A cancelled fit leaves the model unfitted.
    pub fn fit_with_cancel(&mut self, log: &InteractionLog, cancel: &AtomicBool) -> RecResult<()> {
        self.fit_inner(log, Some(cancel))
    }

    fn fit_inner(&mut self, log: &InteractionLog, cancel: Option<&AtomicBool>) -> RecResult<()> {
        if self.model.is_some() {
            return Err(RecommendError::AlreadyFitted {
                component: COMPONENT,
            });
        }
        if log.is_empty() {
            return Err(RecommendError::InsufficientData(
                "interaction log has no ratings".to_string(),
            ));
        }
        if self.params.n_components == 0 {
            return Err(RecommendError::InvalidInput(
                "n_components must be at least 1".to_string(),
            ));
        }

        let matrix = UserItemMatrix::from_log(log)?;
        tracing::info!(
            users = matrix.users.len(),
            cars = matrix.items.len(),
            ratings = log.len(),
            n_components = self.params.n_components,
            "Training collaborative model"
        );

        let factors = nmf::factorize(&matrix.values, &self.params, cancel)?;

        let mut rated: HashMap<UserId, HashSet<ItemId>> = HashMap::new();
        for rating in log.ratings() {
            rated.entry(rating.user_id).or_default().insert(rating.item_id);
        }

        tracing::info!(
            n_iter = factors.n_iter,
            converged = factors.converged,
            reconstruction_err = factors.reconstruction_err,
            "Collaborative model fitted"
        );

        self.model = Some(LatentModel {
            user_index: matrix
                .users
                .iter()
                .enumerate()
                .map(|(idx, user)| (*user, idx))
                .collect(),
            item_ids: matrix.items,
            factors,
            rated,
        });
        Ok(())
    }

    fn model(&self) -> RecResult<&LatentModel> {
        self.model.as_ref().ok_or(RecommendError::NotFitted {
            component: COMPONENT,
        })
    }

    /// User latent factors `P` (users x k)
    pub fn user_factors(&self) -> RecResult<&Array2<f64>> {
        Ok(&self.model()?.factors.row_factors)
    }

    /// Car latent factors `Q` (k x cars)
    pub fn item_factors(&self) -> RecResult<&Array2<f64>> {
        Ok(&self.model()?.factors.column_factors)
    }

    /// Iterations run and final Frobenius reconstruction error
    pub fn training_summary(&self) -> RecResult<(usize, f64)> {
        let factors = &self.model()?.factors;
        Ok((factors.n_iter, factors.reconstruction_err))
    }

    /// Cars the user rated in the log; `None` for an unknown user
    pub fn rated_items(&self, user_id: UserId) -> RecResult<Option<&HashSet<ItemId>>> {
        Ok(self.model()?.rated.get(&user_id))
    }

    /// Predicted, min-max normalized scores for every car the user has not rated
    ///
    /// Scores follow the matrix column order. Unknown users get an empty series.
    pub fn predict_all(&self, user_id: UserId) -> RecResult<ScoreSeries> {
        let model = self.model()?;
        let Some(&row) = model.user_index.get(&user_id) else {
            tracing::debug!(user_id = %user_id, "User has no ratings");
            return Ok(ScoreSeries::new());
        };

        let predicted = model
            .factors
            .row_factors
            .row(row)
            .dot(&model.factors.column_factors);
        let rated = model.rated.get(&user_id);

        let scores: ScoreSeries = model
            .item_ids
            .iter()
            .zip(predicted.iter())
            .filter(|(id, _)| !rated.is_some_and(|r| r.contains(*id)))
            .map(|(id, score)| (*id, *score))
            .collect();

        Ok(scores.min_max_normalize())
    }

    /// The `n` best unrated cars for a user
    pub fn recommend(&self, user_id: UserId, n: usize) -> RecResult<ScoreSeries> {
        Ok(self.predict_all(user_id)?.top_k(n))
    }
}
