use ndarray::{Array2, ArrayView1};
use std::collections::HashMap;

use crate::{
    error::{RecResult, RecommendError},
    models::{normalize_title_key, Catalog, ItemId, ScoreSeries},
    services::text::TfidfVectorizer,
};

const COMPONENT: &str = "ContentRecommender";

/// Cosine of the angle between two vectors; 0 when either is all-zero
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}

/// State derived from the catalog at fit time
#[derive(Debug, Clone)]
struct ContentIndex {
    item_ids: Vec<ItemId>,
    title_index: HashMap<String, usize>,
    term_weights: Array2<f64>,
}

/// Item-to-item recommender over TF-IDF vectors of the `Features` text
#[derive(Debug, Clone, Default)]
pub struct ContentRecommender {
    index: Option<ContentIndex>,
}

impl ContentRecommender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.index.is_some()
    }

    /// Builds the term-weight matrix and the title lookup
    ///
    /// When several cars share a title key, the first one in catalog order
    /// answers queries for it.
    pub fn fit(&mut self, catalog: &Catalog) -> RecResult<()> {
        if self.index.is_some() {
            return Err(RecommendError::AlreadyFitted {
                component: COMPONENT,
            });
        }
        if catalog.is_empty() {
            return Err(RecommendError::EmptyCatalog);
        }

        let documents: Vec<&str> = catalog
            .items()
            .iter()
            .map(|item| item.features.as_str())
            .collect();
        let term_weights = TfidfVectorizer::new().fit_transform(&documents);

        let mut title_index = HashMap::with_capacity(catalog.len());
        for (idx, item) in catalog.items().iter().enumerate() {
            title_index.entry(normalize_title_key(&item.title)).or_insert(idx);
        }

        tracing::info!(
            items = catalog.len(),
            titles = title_index.len(),
            vocabulary = term_weights.ncols(),
            "Content model fitted"
        );

        self.index = Some(ContentIndex {
            item_ids: catalog.items().iter().map(|item| item.id).collect(),
            title_index,
            term_weights,
        });
        Ok(())
    }

    fn index(&self) -> RecResult<&ContentIndex> {
        self.index.as_ref().ok_or(RecommendError::NotFitted {
            component: COMPONENT,
        })
    }

    /// The fitted term-weight matrix (catalog rows x vocabulary columns)
    pub fn term_weights(&self) -> RecResult<&Array2<f64>> {
        Ok(&self.index()?.term_weights)
    }

    /// Returns the `n` cars most similar to `seed`, scores min-max normalized
    ///
    /// `seed` is a title ("toyota sienna 2020"); case and spacing are ignored.
    /// An unknown seed gives an empty series. The seed car itself is never
    /// returned, and ties keep catalog order.
    pub fn query(&self, seed: &str, n: usize) -> RecResult<ScoreSeries> {
        let index = self.index()?;
        let key = normalize_title_key(seed);

        let Some(&seed_row) = index.title_index.get(&key) else {
            tracing::debug!(seed = %key, "Seed car not in catalog");
            return Ok(ScoreSeries::new());
        };

        let seed_id = index.item_ids[seed_row];
        let seed_vector = index.term_weights.row(seed_row);
        let scores: ScoreSeries = index
            .term_weights
            .rows()
            .into_iter()
            .zip(index.item_ids.iter())
            .filter(|(_, id)| **id != seed_id)
            .map(|(row, id)| (*id, cosine_similarity(seed_vector, row)))
            .collect();

        let top = scores.min_max_normalize().top_k(n);
        tracing::debug!(seed = %key, returned = top.len(), "Content query");
        Ok(top)
    }
}
