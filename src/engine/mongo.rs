use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, IndexModel};
use serde_json::Value;
use tracing::debug;

use super::{Connector, Engine};
use crate::config::Login;
use crate::error::{Error, Result};
use crate::schema::IndexSpec;
use crate::types::{Role, RoleGrant, UserInfo, UserSpec};

// Server error codes the provisioner distinguishes.
const UNAUTHORIZED: i32 = 13;
const AUTHENTICATION_FAILED: i32 = 18;
const NAMESPACE_EXISTS: i32 = 48;
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const DUPLICATE_KEY: i32 = 11000;
const USER_ALREADY_EXISTS: i32 = 51003;

fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => Some(command.code),
        ErrorKind::Write(WriteFailure::WriteError(write)) => Some(write.code),
        _ => None,
    }
}

/// Maps the driver's failures onto the provisioning taxonomy. Codes that
/// mean something specific for `collection` are handled by the callers.
fn classify(err: mongodb::error::Error) -> Error {
    if matches!(err.kind.as_ref(), ErrorKind::Authentication { .. }) {
        return Error::AuthenticationFailure(err.to_string());
    }
    match server_code(&err) {
        Some(AUTHENTICATION_FAILED) => Error::AuthenticationFailure(err.to_string()),
        Some(UNAUTHORIZED) => Error::Unauthorized(err.to_string()),
        _ => Error::Mongo(err),
    }
}

/// Builds a connection string for `host`, embedding percent-encoded
/// credentials when a login is given.
pub(crate) fn connection_uri(host: &str, login: Option<&Login>, auth_db: &str) -> String {
    match login {
        Some(login) => format!(
            "mongodb://{}:{}@{host}/?authSource={}",
            urlencoding::encode(&login.user),
            urlencoding::encode(&login.password),
            urlencoding::encode(auth_db),
        ),
        None => format!("mongodb://{host}/"),
    }
}

/// Converts a JSON object to BSON, honouring extended JSON wrappers such
/// as `{"$date": ..}` so they land as native BSON types.
fn to_bson_document(collection: &str, value: &Value) -> Result<Document> {
    match Bson::try_from(value.clone())? {
        Bson::Document(document) => Ok(document),
        other => Err(Error::Config(format!(
            "documents inserted into '{collection}' must be objects, got {:?}",
            other.element_type()
        ))),
    }
}

fn role_from_bson(value: &Bson) -> Option<RoleGrant> {
    let grant = value.as_document()?;
    let role = Role::parse(grant.get_str("role").ok()?)?;
    let db = grant.get_str("db").ok()?;
    Some(RoleGrant::new(role, db))
}

fn user_from_bson(value: &Bson) -> Option<UserInfo> {
    let user = value.as_document()?;
    let roles = user
        .get_array("roles")
        .map(|roles| roles.iter().filter_map(role_from_bson).collect())
        .unwrap_or_default();
    Some(UserInfo {
        user: user.get_str("user").ok()?.to_string(),
        db: user.get_str("db").ok()?.to_string(),
        roles,
    })
}

/// Opens authenticated clients against a MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    host: String,
}

impl MongoConnector {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Connector for MongoConnector {
    type Engine = MongoEngine;

    async fn connect(&self, login: Option<&Login>, auth_db: &str) -> Result<MongoEngine> {
        let uri = connection_uri(&self.host, login, auth_db);
        let client = Client::with_uri_str(&uri).await.map_err(classify)?;

        // The driver authenticates lazily; force a round trip so bad
        // credentials abort before any provisioning step runs.
        client
            .database(auth_db)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(classify)?;

        debug!(host = %self.host, authenticated = login.is_some(), "Connected to MongoDB");
        Ok(MongoEngine { client })
    }
}

pub struct MongoEngine {
    client: Client,
}

impl Engine for MongoEngine {
    async fn list_users(&self, db: &str) -> Result<Vec<UserInfo>> {
        let reply = self
            .client
            .database(db)
            .run_command(doc! { "usersInfo": 1 })
            .await
            .map_err(classify)?;

        let users = reply
            .get_array("users")
            .map(|users| users.iter().filter_map(user_from_bson).collect())
            .unwrap_or_default();
        Ok(users)
    }

    async fn create_user(&self, db: &str, user: &UserSpec) -> Result<()> {
        let roles: Vec<Bson> = user
            .roles
            .iter()
            .map(|grant| Bson::Document(doc! { "role": grant.role.as_str(), "db": grant.db.as_str() }))
            .collect();

        let result = self
            .client
            .database(db)
            .run_command(doc! {
                "createUser": user.user.as_str(),
                "pwd": user.password.as_str(),
                "roles": roles,
            })
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if server_code(&e) == Some(USER_ALREADY_EXISTS) => {
                Err(Error::CredentialConflict {
                    user: user.user.clone(),
                    db: db.to_string(),
                })
            }
            Err(e) => Err(classify(e)),
        }
    }

    async fn create_collection(&self, db: &str, name: &str) -> Result<()> {
        match self.client.database(db).create_collection(name).await {
            Ok(()) => Ok(()),
            Err(e) if server_code(&e) == Some(NAMESPACE_EXISTS) => {
                debug!(db, collection = name, "Collection already exists");
                Ok(())
            }
            Err(e) => Err(classify(e)),
        }
    }

    async fn create_index(&self, db: &str, index: &IndexSpec) -> Result<()> {
        let keys: Document = index
            .keys
            .iter()
            .map(|key| (key.to_string(), Bson::Int32(1)))
            .collect();
        let model = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).name(index.name()).build())
            .build();

        let result = self
            .client
            .database(db)
            .collection::<Document>(index.collection)
            .create_index(model)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match server_code(&e) {
                Some(INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT) => {
                    Err(Error::SchemaConflict {
                        collection: index.collection.to_string(),
                        message: e.to_string(),
                    })
                }
                Some(DUPLICATE_KEY) => Err(Error::DuplicateKey {
                    collection: index.collection.to_string(),
                    message: e.to_string(),
                }),
                _ => Err(classify(e)),
            },
        }
    }

    async fn insert_one(&self, db: &str, collection: &str, document: &Value) -> Result<()> {
        let document = to_bson_document(collection, document)?;

        let result = self
            .client
            .database(db)
            .collection::<Document>(collection)
            .insert_one(document)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if server_code(&e) == Some(DUPLICATE_KEY) => Err(Error::DuplicateKey {
                collection: collection.to_string(),
                message: e.to_string(),
            }),
            Err(e) => Err(classify(e)),
        }
    }

    async fn list_collections(&self, db: &str) -> Result<Vec<String>> {
        let mut names = self
            .client
            .database(db)
            .list_collection_names()
            .await
            .map_err(classify)?;
        names.sort();
        Ok(names)
    }

    async fn find_all(&self, db: &str, collection: &str) -> Result<Vec<Value>> {
        let mut cursor = self
            .client
            .database(db)
            .collection::<Document>(collection)
            .find(doc! {})
            .await
            .map_err(classify)?;

        let mut documents = Vec::new();
        while cursor.advance().await.map_err(classify)? {
            let document = cursor.deserialize_current().map_err(classify)?;
            documents.push(Bson::Document(document).into_relaxed_extjson());
        }
        Ok(documents)
    }
}
