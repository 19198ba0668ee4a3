use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeraiError {
    #[error("unknown stall: {0}")]
    UnknownStall(String),

    #[error("not authorized: '{0}' is not in the admin allow-list")]
    NotAuthorized(String),

    #[error("invalid stall id '{0}': must be lowercase alphanumeric with '-' or '_'")]
    InvalidStallId(String),

    #[error("duplicate stall id: {0}")]
    DuplicateStall(String),

    #[error("invalid recipient id: {0:?}")]
    InvalidRecipient(String),

    #[error("config not found: {0} (run 'gerai init')")]
    ConfigNotFound(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeraiError>;
