use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram api error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("invalid response: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TelegramError>;
