use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Transport failure or undecodable response body
    #[error("PayPal request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// PayPal answered with a non-2xx status (bad credentials included)
    #[error("PayPal API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// An expected key was absent from a PayPal response
    #[error("PayPal response is missing `{0}`")]
    MissingField(&'static str),

    /// A PayPal response value could not be interpreted
    #[error("Invalid PayPal response: {0}")]
    InvalidResponse(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Status code for `Api` errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
