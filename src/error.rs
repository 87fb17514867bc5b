use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtelierError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Import file is not valid JSON: {0}")]
    ImportParse(#[source] serde_json::Error),

    #[error("Import file is not valid UTF-8: {0}")]
    ImportEncoding(#[source] std::string::FromUtf8Error),

    #[error("Unrecognized import format: {0}")]
    ImportFormat(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown payment: {0}")]
    UnknownPayment(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, AtelierError>;
