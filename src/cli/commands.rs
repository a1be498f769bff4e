use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::config::{Backend, ProvisionConfig};
use crate::schema::SchemaVersion;

/// Where the deployment lives and how it is named. Flags override values
/// from the configuration file, which override built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// TOML configuration file
    #[arg(long, env = "TENANTCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database engine: mongodb or sqlite
    #[arg(long, env = "TENANTCTL_BACKEND")]
    pub backend: Option<Backend>,

    /// MongoDB host:port
    #[arg(long, env = "TENANTCTL_HOST")]
    pub host: Option<String>,

    /// Data directory for the embedded sqlite engine
    #[arg(long, env = "TENANTCTL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Database the service accounts authenticate against
    #[arg(long)]
    pub admin_db: Option<String>,

    /// Database holding the tenant registry
    #[arg(long)]
    pub registry_db: Option<String>,

    /// Username of the administrative account
    #[arg(long)]
    pub admin_user: Option<String>,
}

impl ConnectionArgs {
    /// Resolves the effective configuration.
    pub fn resolve(&self) -> anyhow::Result<ProvisionConfig> {
        let mut config = match &self.config {
            Some(path) => ProvisionConfig::load(path)?,
            None => ProvisionConfig::default(),
        };

        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(data_dir) = &self.data_dir {
            config.data_dir.clone_from(data_dir);
        }
        if let Some(admin_db) = &self.admin_db {
            config.admin_db.clone_from(admin_db);
        }
        if let Some(registry_db) = &self.registry_db {
            config.registry_db.clone_from(registry_db);
        }
        if let Some(admin_user) = &self.admin_user {
            config.admin_user.clone_from(admin_user);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create the service accounts and the tenant registry
    Bootstrap {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Password of the administrative account
        #[arg(long, env = "TENANTCTL_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,

        /// Password of the superuser account
        #[arg(long, env = "TENANTCTL_SUPER_PASSWORD", hide_env_values = true)]
        super_password: Option<String>,

        /// Password of the backup/restore account
        #[arg(long, env = "TENANTCTL_GUARD_PASSWORD", hide_env_values = true)]
        guard_password: Option<String>,

        /// Skip interactive prompts (passwords must come from flags or the environment)
        #[arg(long)]
        non_interactive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum RegistryCommands {
    /// List registered tenants
    List {
        #[command(flatten)]
        connection: ConnectionArgs,

        /// Password of the administrative account
        #[arg(long, env = "TENANTCTL_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Tenant name (lowercase letters, digits, '-' and '_')
    #[arg(long)]
    pub name: Option<String>,

    /// Schema version to materialize (defaults to the configured one)
    #[arg(long)]
    pub schema_version: Option<SchemaVersion>,

    /// Password of the administrative account
    #[arg(long, env = "TENANTCTL_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Password for the tenant's API account
    #[arg(long, env = "TENANTCTL_API_PASSWORD", hide_env_values = true)]
    pub api_password: Option<String>,

    /// Generate a random API password and print it once
    #[arg(long, conflicts_with = "api_password")]
    pub generate_password: bool,

    /// Email of the tenant's manager account
    #[arg(long, conflicts_with = "allow_default_manager")]
    pub manager_email: Option<String>,

    /// Password of the tenant's manager account
    #[arg(long, env = "TENANTCTL_MANAGER_PASSWORD", hide_env_values = true)]
    pub manager_password: Option<String>,

    /// Seed the well-known admin/admin manager account (insecure)
    #[arg(long)]
    pub allow_default_manager: bool,

    /// Skip interactive prompts (requires --name)
    #[arg(long)]
    pub non_interactive: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum TenantCommands {
    /// Register a tenant, create its database and issue its API credential
    Provision(ProvisionArgs),
}

#[derive(Subcommand)]
pub enum SchemaCommands {
    /// Show the collections and unique indexes of a schema version
    Show {
        /// Schema version (defaults to the current one)
        #[arg(long)]
        schema_version: Option<SchemaVersion>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = ConnectionArgs {
            backend: Some(Backend::Sqlite),
            data_dir: Some(PathBuf::from("/tmp/tenants")),
            registry_db: Some("registry".to_string()),
            ..ConnectionArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tenants"));
        assert_eq!(config.registry_db, "registry");
        assert_eq!(config.admin_db, "admin");
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("tenantctl.toml");
        std::fs::write(&path, "backend = \"sqlite\"\nadmin_user = \"root\"\n").unwrap();

        let args = ConnectionArgs {
            config: Some(path),
            admin_user: Some("ops".to_string()),
            ..ConnectionArgs::default()
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.admin_user, "ops");
    }

    #[test]
    fn test_empty_override_is_rejected() {
        let args = ConnectionArgs {
            admin_db: Some(String::new()),
            ..ConnectionArgs::default()
        };
        assert!(args.resolve().is_err());
    }
}
