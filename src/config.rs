use serde::Deserialize;

use crate::services::collaborative::NmfParams;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the cars CSV (`carID`, `Make Model Year`, `Features`)
    #[serde(default = "default_cars_data_path")]
    pub cars_data_path: String,

    /// Path to the ratings CSV (`userID`, `carID`, `Rating`)
    #[serde(default = "default_ratings_data_path")]
    pub ratings_data_path: String,

    /// Rank of the matrix factorization
    #[serde(default = "default_n_components")]
    pub n_components: usize,

    /// Iteration cap for the factorization
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Seed for factor initialization
    #[serde(default = "default_random_state")]
    pub random_state: u64,

    /// Relative error decrease below which the factorization stops
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Weight of the collaborative signal in hybrid scores
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Number of recommendations to print
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Seed car for the demo (make, model and year, lower-case)
    #[serde(default = "default_seed_car")]
    pub seed_car: String,

    /// Seed user for the demo
    #[serde(default = "default_seed_user")]
    pub seed_user: i64,

    /// Print results as JSON instead of tables
    #[serde(default)]
    pub output_json: bool,
}

fn default_cars_data_path() -> String {
    "./data/df_cars_clean.csv".to_string()
}

fn default_ratings_data_path() -> String {
    "./data/df_ratings_clean.csv".to_string()
}

fn default_n_components() -> usize {
    20
}

fn default_max_iter() -> usize {
    500
}

fn default_random_state() -> u64 {
    42
}

fn default_tolerance() -> f64 {
    1e-4
}

fn default_alpha() -> f64 {
    0.5
}

fn default_top_n() -> usize {
    10
}

fn default_seed_car() -> String {
    "volkswagen passat 2.0 tdi sel 2012".to_string()
}

fn default_seed_user() -> i64 {
    27583
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Factorization settings for the collaborative model
    pub fn nmf_params(&self) -> NmfParams {
        NmfParams {
            n_components: self.n_components,
            max_iter: self.max_iter,
            random_state: self.random_state,
            tolerance: self.tolerance,
        }
    }
}
