//! Error types for Crosscast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CrosscastError>;

#[derive(Error, Debug)]
pub enum CrosscastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Media probe error: {0}")]
    Probe(#[from] ProbeError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CrosscastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CrosscastError::InvalidInput(_) => 3,
            CrosscastError::Gateway(GatewayError::Auth(_)) => 2,
            CrosscastError::Gateway(_) => 1,
            CrosscastError::Probe(_) => 1,
            CrosscastError::Config(_) => 1,
            CrosscastError::Database(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown platform: '{0}'")]
    UnknownPlatform(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Errors from the external distribution gateway.
///
/// An API rejection can still carry a partial remote post id; it is
/// kept so the settlement poller can resolve the record later.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway rejected request: {message}")]
    Api {
        message: String,
        remote_post_id: Option<String>,
    },
}

/// Errors raised while probing a remote media URL.
///
/// All variants are user-correctable and surface as validation
/// failures naming the offending URL (fail closed: an unmeasurable
/// asset never passes a size or dimension check).
#[derive(Error, Debug, Clone)]
pub enum ProbeError {
    #[error("media unreachable: {0}")]
    Unreachable(String),

    #[error("unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("unsupported video format: {0}")]
    UnsupportedVideo(String),
}
