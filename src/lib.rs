//! Hybrid car recommender.
//!
//! Blends a TF-IDF content model over car feature text with an NMF
//! latent-factor model over user ratings. Both are fitted once from in-memory
//! tables; fitted models are read-only and can serve concurrent queries.

pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;

pub use error::{RecResult, RecommendError};
pub use models::{Catalog, InteractionLog, Item, ItemId, Rating, ScoreSeries, UserId};
pub use services::{CollaborativeRecommender, ContentRecommender, HybridRecommender, NmfParams};
