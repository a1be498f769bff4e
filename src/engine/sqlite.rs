use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::debug;

use super::{Connector, Engine};
use crate::auth::CredentialHasher;
use crate::config::Login;
use crate::error::{Error, Result};
use crate::schema::IndexSpec;
use crate::types::{Privilege, RoleGrant, UserInfo, UserSpec, effective_privileges};

const SYSTEM_FILE: &str = "_system.sqlite3";

const SYSTEM_SCHEMA: &str = r#"
-- Principals are unique per (user, database), like the document engine's own
CREATE TABLE IF NOT EXISTS users (
    user TEXT NOT NULL,
    db TEXT NOT NULL,
    password_hash TEXT NOT NULL,   -- argon2id hash with embedded salt
    roles TEXT NOT NULL,           -- JSON array of {role, db}
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (user, db)
);
"#;

const DATABASE_SCHEMA: &str = r#"
-- Catalogue of declared indexes, consulted to detect conflicting definitions
CREATE TABLE IF NOT EXISTS _indexes (
    collection TEXT NOT NULL,
    name TEXT NOT NULL,
    keys TEXT NOT NULL,            -- JSON array of field names
    is_unique INTEGER NOT NULL DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (collection, name)
);
"#;

struct Storage {
    data_dir: PathBuf,
    system: Mutex<Connection>,
    databases: Mutex<HashMap<String, Connection>>,
    hasher: CredentialHasher,
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _)
        if e.code == rusqlite::ErrorCode::ConstraintViolation)
}

/// Database and collection names become file and table names, so they are
/// held to a conservative character set. Leading underscores are reserved
/// for the engine's own bookkeeping.
fn validate_identifier(kind: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && !name.starts_with('_')
        && !name.starts_with("sqlite")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Config(format!("invalid {kind} name '{name}'")))
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn ensure_collection(conn: &Connection, collection: &str) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (id INTEGER PRIMARY KEY, doc TEXT NOT NULL)",
        quote(collection)
    ))?;
    Ok(())
}

fn table_exists(conn: &Connection, collection: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![collection],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Missing fields index as JSON `null`, so two documents lacking the same
/// key still collide, matching document-database semantics.
fn index_sql(index: &IndexSpec) -> String {
    let columns = index
        .keys
        .iter()
        .map(|key| format!("json_quote(json_extract(doc, '$.{key}'))"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE UNIQUE INDEX {} ON {} ({columns})",
        quote(&format!("{}.{}", index.collection, index.name())),
        quote(index.collection),
    )
}

impl Storage {
    fn with_db<T>(&self, db: &str, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        validate_identifier("database", db)?;
        let mut databases = lock(&self.databases);
        let conn = match databases.entry(db.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let conn = open_connection(&self.data_dir.join(format!("{db}.sqlite3")))?;
                conn.execute_batch(DATABASE_SCHEMA)?;
                entry.insert(conn)
            }
        };
        f(conn)
    }

    fn has_users(&self) -> Result<bool> {
        let count: i64 = lock(&self.system).query_row("SELECT COUNT(*) FROM users", [], |row| {
            row.get(0)
        })?;
        Ok(count > 0)
    }

    fn authenticate(&self, login: &Login, auth_db: &str) -> Result<Principal> {
        let row: Option<(String, String)> = lock(&self.system)
            .query_row(
                "SELECT password_hash, roles FROM users WHERE user = ?1 AND db = ?2",
                params![login.user, auth_db],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((hash, roles)) = row else {
            return Err(Error::AuthenticationFailure(format!(
                "no user '{}' on '{auth_db}'",
                login.user
            )));
        };
        if !self.hasher.verify(&login.password, &hash)? {
            return Err(Error::AuthenticationFailure(format!(
                "wrong password for '{}' on '{auth_db}'",
                login.user
            )));
        }

        Ok(Principal::User {
            name: login.user.clone(),
            roles: serde_json::from_str(&roles)?,
        })
    }
}

#[derive(Debug, Clone)]
enum Principal {
    /// No principal exists yet; the deployment accepts any request so the
    /// first service accounts can be created.
    Open,
    Anonymous,
    User { name: String, roles: Vec<RoleGrant> },
}

impl Principal {
    fn require(&self, db: &str, required: Privilege) -> Result<()> {
        match self {
            Self::Open => Ok(()),
            Self::Anonymous => Err(Error::Unauthorized(format!(
                "authentication required to access '{db}'"
            ))),
            Self::User { name, roles } => {
                if effective_privileges(roles, db).has(required) {
                    Ok(())
                } else {
                    Err(Error::Unauthorized(format!(
                        "user '{name}' lacks {required} on '{db}'"
                    )))
                }
            }
        }
    }
}

/// Opens handles onto an embedded engine stored as one SQLite file per
/// database under a data directory.
#[derive(Clone)]
pub struct SqliteConnector {
    storage: Arc<Storage>,
}

impl SqliteConnector {
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)?;

        let system = open_connection(&data_dir.join(SYSTEM_FILE))?;
        system.execute_batch(SYSTEM_SCHEMA)?;

        Ok(Self {
            storage: Arc::new(Storage {
                data_dir: data_dir.to_path_buf(),
                system: Mutex::new(system),
                databases: Mutex::new(HashMap::new()),
                hasher: CredentialHasher::new(),
            }),
        })
    }
}

impl Connector for SqliteConnector {
    type Engine = SqliteEngine;

    async fn connect(&self, login: Option<&Login>, auth_db: &str) -> Result<SqliteEngine> {
        let principal = match login {
            Some(login) => self.storage.authenticate(login, auth_db)?,
            None if self.storage.has_users()? => Principal::Anonymous,
            None => Principal::Open,
        };
        debug!(?principal, "Opened embedded engine handle");
        Ok(SqliteEngine {
            storage: Arc::clone(&self.storage),
            principal,
        })
    }
}

pub struct SqliteEngine {
    storage: Arc<Storage>,
    principal: Principal,
}

impl Engine for SqliteEngine {
    async fn list_users(&self, db: &str) -> Result<Vec<UserInfo>> {
        self.principal.require(db, Privilege::USER_ADMIN)?;

        let conn = lock(&self.storage.system);
        let mut stmt = conn.prepare("SELECT user, db, roles FROM users WHERE db = ?1 ORDER BY user")?;
        let rows = stmt.query_map(params![db], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (user, db, roles) = row?;
            users.push(UserInfo {
                user,
                db,
                roles: serde_json::from_str(&roles)?,
            });
        }
        Ok(users)
    }

    async fn create_user(&self, db: &str, user: &UserSpec) -> Result<()> {
        self.principal.require(db, Privilege::USER_ADMIN)?;
        validate_identifier("database", db)?;

        let hash = self.storage.hasher.hash(&user.password)?;
        let roles = serde_json::to_string(&user.roles)?;

        let result = lock(&self.storage.system).execute(
            "INSERT INTO users (user, db, password_hash, roles) VALUES (?1, ?2, ?3, ?4)",
            params![user.user, db, hash, roles],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::CredentialConflict {
                user: user.user.clone(),
                db: db.to_string(),
            }),
            Err(e) => Err(Error::from(e)),
        }
    }

    async fn create_collection(&self, db: &str, name: &str) -> Result<()> {
        self.principal.require(db, Privilege::WRITE)?;
        validate_identifier("collection", name)?;
        self.storage.with_db(db, |conn| ensure_collection(conn, name))
    }

    async fn create_index(&self, db: &str, index: &IndexSpec) -> Result<()> {
        self.principal.require(db, Privilege::WRITE)?;
        validate_identifier("collection", index.collection)?;

        let name = index.name();
        let keys = serde_json::to_string(index.keys)?;

        self.storage.with_db(db, |conn| {
            let existing: Option<(String, bool)> = conn
                .query_row(
                    "SELECT keys, is_unique FROM _indexes WHERE collection = ?1 AND name = ?2",
                    params![index.collection, name],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            if let Some((existing_keys, is_unique)) = existing {
                if existing_keys == keys && is_unique {
                    debug!(collection = index.collection, %name, "Index already present");
                    return Ok(());
                }
                return Err(Error::SchemaConflict {
                    collection: index.collection.to_string(),
                    message: format!(
                        "index '{name}' exists with keys {existing_keys} (unique: {is_unique})"
                    ),
                });
            }

            let tx = conn.unchecked_transaction()?;
            ensure_collection(&tx, index.collection)?;
            if let Err(e) = tx.execute_batch(&index_sql(index)) {
                if is_unique_violation(&e) {
                    return Err(Error::DuplicateKey {
                        collection: index.collection.to_string(),
                        message: format!("existing documents violate index '{name}'"),
                    });
                }
                return Err(e.into());
            }
            tx.execute(
                "INSERT INTO _indexes (collection, name, keys, is_unique) VALUES (?1, ?2, ?3, 1)",
                params![index.collection, name, keys],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    async fn insert_one(&self, db: &str, collection: &str, document: &Value) -> Result<()> {
        self.principal.require(db, Privilege::WRITE)?;
        validate_identifier("collection", collection)?;

        if !document.is_object() {
            return Err(Error::Config(format!(
                "documents inserted into '{collection}' must be JSON objects"
            )));
        }
        let body = serde_json::to_string(document)?;

        self.storage.with_db(db, |conn| {
            ensure_collection(conn, collection)?;
            let result = conn.execute(
                &format!("INSERT INTO {} (doc) VALUES (?1)", quote(collection)),
                params![body],
            );
            match result {
                Ok(_) => Ok(()),
                Err(e) if is_unique_violation(&e) => Err(Error::DuplicateKey {
                    collection: collection.to_string(),
                    message: e.to_string(),
                }),
                Err(e) => Err(Error::from(e)),
            }
        })
    }

    async fn list_collections(&self, db: &str) -> Result<Vec<String>> {
        self.principal.require(db, Privilege::READ)?;

        self.storage.with_db(db, |conn| {
            let mut stmt = conn.prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND substr(name, 1, 1) != '_' AND name NOT LIKE 'sqlite%'
                 ORDER BY name",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<std::result::Result<Vec<String>, _>>()
                .map_err(Error::from)
        })
    }

    async fn find_all(&self, db: &str, collection: &str) -> Result<Vec<Value>> {
        self.principal.require(db, Privilege::READ)?;
        validate_identifier("collection", collection)?;

        self.storage.with_db(db, |conn| {
            if !table_exists(conn, collection)? {
                return Ok(Vec::new());
            }
            let mut stmt =
                conn.prepare(&format!("SELECT doc FROM {} ORDER BY id", quote(collection)))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut documents = Vec::new();
            for row in rows {
                documents.push(serde_json::from_str(&row?)?);
            }
            Ok(documents)
        })
    }
}
