use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;
use crate::extract::ExtractError;
pub use crate::validation::ValidationError;

/// Message returned for any generation failure. Details only go to the log.
pub const GENERIC_GENERATION_FAILURE: &str = "Failed to generate recipe";
pub const MISSING_CREDENTIAL: &str = "API key not configured";
pub const INVALID_OPTION: &str = "Invalid recipe option";

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid recipe option: {0}")]
    InvalidOption(String),
    #[error("model credential missing: {0} is not set")]
    Configuration(String),
    #[error("recipe generation failed: {0}")]
    Upstream(#[source] ApiConnectionError),
    #[error("malformed generator response: {0}")]
    MalformedResponse(#[from] ExtractError),
}

impl SuggestionError {
    /// Caller mistakes, as opposed to configuration or upstream trouble.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SuggestionError::Validation(_) | SuggestionError::InvalidOption(_)
        )
    }

    /// What the end user gets to see. Upstream and malformed-output failures
    /// collapse into one retryable message.
    pub fn public_message(&self) -> String {
        match self {
            SuggestionError::Validation(e) => e.to_string(),
            SuggestionError::InvalidOption(_) => INVALID_OPTION.to_string(),
            SuggestionError::Configuration(_) => MISSING_CREDENTIAL.to_string(),
            SuggestionError::Upstream(_) | SuggestionError::MalformedResponse(_) => {
                GENERIC_GENERATION_FAILURE.to_string()
            }
        }
    }
}

impl From<ApiConnectionError> for SuggestionError {
    fn from(err: ApiConnectionError) -> Self {
        match err {
            ApiConnectionError::MissingApiKey(var) => SuggestionError::Configuration(var),
            other => SuggestionError::Upstream(other),
        }
    }
}

/// Durable store failures. Never fatal: the in-memory plan stays
/// authoritative for the session.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("blob store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored meal plan could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("stored meal plan has unsupported version {0}")]
    UnsupportedVersion(u32),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no meal at index {0}")]
    MealNotFound(usize),
    #[error("no ingredient at index {ingredient} in meal {meal}")]
    IngredientNotFound { meal: usize, ingredient: usize },
}
