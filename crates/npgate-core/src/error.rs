use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("not initialized: run 'npgate init'")]
    NotInitialized,

    #[error("taxonomy entry not found: {0}")]
    TagNotFound(String),

    #[error("malformed taxonomy: {0}")]
    MalformedTaxonomy(String),

    #[error("display name '{name}' is ambiguous: shared by {}", slugs.join(", "))]
    AmbiguousDisplayName { name: String, slugs: Vec<String> },

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid language '{0}': expected 'ja' or 'en'")]
    InvalidLanguage(String),

    #[error("invalid category '{0}': expected 'genre', 'event' or 'dynamics'")]
    InvalidCategory(String),

    #[error("corpus source error: {0}")]
    Corpus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GateError>;
