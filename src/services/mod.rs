pub mod collaborative;
pub mod content;
pub mod hybrid;
pub mod nmf;
pub mod text;

pub use collaborative::{CollaborativeRecommender, NmfParams, UserItemMatrix};
pub use content::ContentRecommender;
pub use hybrid::HybridRecommender;
