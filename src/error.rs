use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("extended json error: {0}")]
    ExtendedJson(#[from] mongodb::bson::extjson::de::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("authentication failed: {0}")]
    AuthenticationFailure(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("tenant '{0}' is already registered")]
    DuplicateTenant(String),

    #[error("duplicate key in {collection}: {message}")]
    DuplicateKey { collection: String, message: String },

    #[error("schema conflict on {collection}: {message}")]
    SchemaConflict { collection: String, message: String },

    #[error("user '{user}' already exists on database '{db}'")]
    CredentialConflict { user: String, db: String },

    #[error("invalid tenant name: {0}")]
    InvalidTenantName(String),

    #[error("missing secret: {0}")]
    MissingSecret(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
