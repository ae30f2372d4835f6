/// Recommender errors
///
/// Unknown users and unknown seed cars are not errors; they produce empty or
/// degraded results. Everything here means the pipeline was misused or fed
/// unusable input.
#[derive(thiserror::Error, Debug)]
pub enum RecommendError {
    #[error("{component} is not fitted; call fit() before querying")]
    NotFitted { component: &'static str },

    #[error("{component} is already fitted; incremental retraining is not supported")]
    AlreadyFitted { component: &'static str },

    #[error("Cannot fit content model on an empty catalog")]
    EmptyCatalog,

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Fit cancelled")]
    Cancelled,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RecResult<T> = Result<T, RecommendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_fitted_message_names_component() {
        let err = RecommendError::NotFitted {
            component: "ContentRecommender",
        };
        assert!(err.to_string().contains("ContentRecommender"));
        assert!(err.to_string().contains("not fitted"));
    }

    #[test]
    fn test_io_error_converts() {
        fn open() -> RecResult<()> {
            std::fs::File::open("/definitely/not/here.csv")?;
            Ok(())
        }
        assert!(matches!(open(), Err(RecommendError::Io(_))));
    }
}
