//! The document database the provisioning procedure drives.
//!
//! Collection storage, index enforcement, authentication and role checks
//! all belong to the engine; the provisioner only issues declarative
//! requests and interprets the engine's errors.

mod mongo;
mod sqlite;

pub use mongo::{MongoConnector, MongoEngine};
pub use sqlite::{SqliteConnector, SqliteEngine};

use std::future::Future;

use serde_json::Value;

use crate::config::Login;
use crate::error::Result;
use crate::schema::IndexSpec;
use crate::types::{UserInfo, UserSpec};

/// Engine defines the database operations provisioning relies on. Every
/// call runs with the privileges of the principal the handle was opened as.
pub trait Engine: Send + Sync {
    /// Users defined on `db`.
    fn list_users(&self, db: &str) -> impl Future<Output = Result<Vec<UserInfo>>> + Send;

    /// Creates a principal on `db`. Fails with `CredentialConflict` if it
    /// already exists.
    fn create_user(&self, db: &str, user: &UserSpec) -> impl Future<Output = Result<()>> + Send;

    /// Creates a collection. An existing collection is left untouched.
    fn create_collection(&self, db: &str, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Creates a unique index. Re-creating an identical index is a no-op;
    /// a same-named index with other keys fails with `SchemaConflict`.
    fn create_index(&self, db: &str, index: &IndexSpec) -> impl Future<Output = Result<()>> + Send;

    /// Inserts one JSON object. Unique violations surface as `DuplicateKey`.
    fn insert_one(
        &self,
        db: &str,
        collection: &str,
        document: &Value,
    ) -> impl Future<Output = Result<()>> + Send;

    fn list_collections(&self, db: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Every document of a collection; empty when the collection is absent.
    fn find_all(&self, db: &str, collection: &str) -> impl Future<Output = Result<Vec<Value>>> + Send;
}

/// Opens engine handles bound to a principal.
pub trait Connector: Send + Sync {
    type Engine: Engine;

    /// Authenticates `login` against `auth_db`, or opens an unauthenticated
    /// handle when `login` is `None`.
    fn connect(
        &self,
        login: Option<&Login>,
        auth_db: &str,
    ) -> impl Future<Output = Result<Self::Engine>> + Send;
}
