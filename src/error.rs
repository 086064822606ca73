use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required source tables: {}", .tables.join(", "))]
    MissingTables { tables: Vec<String> },

    #[error("Malformed row in '{table}' at line {line}: {reason}")]
    MalformedRow {
        table: String,
        line: usize,
        reason: String,
    },

    #[error("Unknown deal status '{label}' (declared: {declared})")]
    UnknownDealStatus { label: String, declared: String },

    #[error("Settings are sealed once row import has started")]
    SettingsSealed,

    #[error("Sanity check failed: {0}")]
    Sanity(String),

    #[error("Export does not conform to the schema: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
