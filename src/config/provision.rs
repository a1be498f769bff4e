use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::SchemaVersion;
use crate::types::TenantName;

/// Which engine the provisioning procedure talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mongodb,
    Sqlite,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mongodb => f.write_str("mongodb"),
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "mongodb" | "mongo" => Ok(Self::Mongodb),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("unknown backend '{other}' (expected mongodb or sqlite)")),
        }
    }
}

/// Connection and naming parameters for a deployment.
///
/// Passwords are deliberately absent: they come from flags, the environment
/// or a prompt, never from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    pub backend: Backend,
    /// `host:port` of the document database.
    pub host: String,
    /// Directory holding the embedded engine's database files.
    pub data_dir: PathBuf,
    /// Database the service accounts are defined on.
    pub admin_db: String,
    /// Database holding the tenant registry.
    pub registry_db: String,
    /// Prefix joined to the tenant name to form its database name.
    pub db_prefix: String,
    /// Suffix appended to the tenant database name to form the API username.
    pub api_user_suffix: String,
    pub admin_user: String,
    pub super_user: String,
    pub guard_user: String,
    pub schema_version: SchemaVersion,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            host: "localhost:27017".to_string(),
            data_dir: PathBuf::from("./data"),
            admin_db: "admin".to_string(),
            registry_db: "ogree".to_string(),
            db_prefix: "ogree".to_string(),
            api_user_suffix: "Admin".to_string(),
            admin_user: "admin".to_string(),
            super_user: "super".to_string(),
            guard_user: "guard".to_string(),
            schema_version: SchemaVersion::default(),
        }
    }
}

impl ProvisionConfig {
    /// Loads a TOML configuration file. Missing keys fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("admin_db", &self.admin_db),
            ("registry_db", &self.registry_db),
            ("db_prefix", &self.db_prefix),
            ("admin_user", &self.admin_user),
            ("super_user", &self.super_user),
            ("guard_user", &self.guard_user),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{key} cannot be empty")));
            }
        }
        if self.backend == Backend::Mongodb && self.host.trim().is_empty() {
            return Err(Error::Config("host cannot be empty".to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn tenant_db(&self, tenant: &TenantName) -> String {
        format!("{}{}", self.db_prefix, tenant)
    }

    /// Refuses a tenant whose database would be the administrative or
    /// registry database.
    pub fn check_tenant_db(&self, tenant: &TenantName) -> Result<()> {
        let db = self.tenant_db(tenant);
        if db == self.admin_db || db == self.registry_db {
            return Err(Error::InvalidTenantName(format!(
                "tenant '{tenant}' maps to reserved database '{db}'"
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn api_user(&self, tenant: &TenantName) -> String {
        format!("{}{}", self.tenant_db(tenant), self.api_user_suffix)
    }
}
