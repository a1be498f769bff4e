use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RoleGrant;

/// A database principal to be created.
#[derive(Debug, Clone)]
pub struct UserSpec {
    pub user: String,
    pub password: String,
    pub roles: Vec<RoleGrant>,
}

/// A principal as reported by the engine's user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub user: String,
    pub db: String,
    pub roles: Vec<RoleGrant>,
}

/// Record in the registry's customer collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub color: String,
}

/// Top-level hierarchy node inserted into a fresh tenant database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootNode {
    pub name: String,
    pub hierarchy_name: String,
    pub category: String,
    pub attributes: NodeAttributes,
    pub description: Vec<String>,
    #[serde(with = "extended_json_date")]
    pub created_date: DateTime<Utc>,
    #[serde(with = "extended_json_date")]
    pub last_updated: DateTime<Utc>,
}

/// Timestamps travel as `{"$date": "<rfc3339>"}` so the document engine
/// stores them as native dates rather than strings.
mod extended_json_date {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    struct ExtendedDate {
        #[serde(rename = "$date")]
        date: DateTime<Utc>,
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Millis {
            #[serde(rename = "$date")]
            date: String,
        }
        Millis {
            date: value.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        ExtendedDate::deserialize(deserializer).map(|wrapped| wrapped.date)
    }
}

impl RootNode {
    pub fn new(name: &str, category: &str) -> Self {
        let now = Utc::now();
        Self {
            name: name.to_string(),
            hierarchy_name: name.to_string(),
            category: category.to_string(),
            attributes: NodeAttributes {
                color: "ffffff".to_string(),
            },
            description: Vec::new(),
            created_date: now,
            last_updated: now,
        }
    }
}

/// Application-level account seeded into the tenant's account collection.
/// `password` holds a bcrypt hash, except for the well-known default
/// account the application recognises in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerAccount {
    pub email: String,
    pub password: String,
    /// Domain pattern to application role, `*` meaning every domain.
    pub roles: BTreeMap<String, String>,
}

impl ManagerAccount {
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.to_string(),
            password: password.to_string(),
            roles: BTreeMap::from([("*".to_string(), "manager".to_string())]),
        }
    }
}
