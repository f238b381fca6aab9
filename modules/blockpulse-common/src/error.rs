use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
