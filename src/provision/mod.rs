//! The tenant provisioning procedure.
//!
//! A run is strictly sequential: register the tenant, create the schema's
//! collections, then its indexes, seed the root node and manager account,
//! and finally issue the tenant's API credential. Any failure stops the run
//! where it is; the database's unique constraints are the only guard
//! against concurrent runs for the same tenant.

mod bootstrap;
mod registry;
mod report;

pub use bootstrap::{BootstrapOutcome, bootstrap, ensure_service_accounts, service_account_specs};
pub use registry::{ensure_registry, list_tenants, register_tenant};
pub use report::{ProvisionError, ProvisionReport, Step};

use tracing::{error, info, warn};

use crate::auth::hash_account_password;
use crate::config::{Login, ProvisionConfig};
use crate::engine::{Connector, Engine};
use crate::error::{Error, Result};
use crate::schema::{Schema, SchemaVersion};
use crate::types::{ManagerAccount, Role, RoleGrant, RootNode, TenantName, UserSpec};

const DEFAULT_MANAGER_EMAIL: &str = "admin";
const DEFAULT_MANAGER_PASSWORD: &str = "admin";

/// Credentials of the application account seeded into a new tenant.
#[derive(Debug, Clone)]
pub enum ManagerSeed {
    Supplied(Login),
    /// The well-known `admin`/`admin` account. Only for throwaway
    /// deployments; must be rotated before the tenant is exposed.
    InsecureDefault,
}

/// Everything a single provisioning run needs from its caller.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub tenant: TenantName,
    api_password: String,
    pub schema_version: SchemaVersion,
    pub manager: ManagerSeed,
}

impl ProvisionRequest {
    /// Builds a request. The API password has no fallback: an absent or
    /// empty one is refused.
    pub fn new(
        tenant: TenantName,
        api_password: Option<String>,
        schema_version: SchemaVersion,
        manager: ManagerSeed,
    ) -> Result<Self> {
        let api_password = match api_password {
            Some(password) if !password.is_empty() => password,
            _ => {
                return Err(Error::MissingSecret(format!(
                    "API password for tenant '{tenant}'"
                )));
            }
        };
        Ok(Self {
            tenant,
            api_password,
            schema_version,
            manager,
        })
    }
}

pub struct Provisioner<'a, E: Engine> {
    engine: &'a E,
    config: &'a ProvisionConfig,
}

impl<'a, E: Engine> Provisioner<'a, E> {
    pub fn new(engine: &'a E, config: &'a ProvisionConfig) -> Self {
        Self { engine, config }
    }

    pub async fn create_collections(&self, db: &str, schema: &Schema) -> Result<()> {
        for collection in schema.collections {
            self.engine.create_collection(db, collection.name).await?;
        }
        info!(db, count = schema.collections.len(), "Created collections");
        Ok(())
    }

    pub async fn create_indexes(&self, db: &str, schema: &Schema) -> Result<()> {
        for index in schema.indexes {
            self.engine.create_index(db, index).await?;
        }
        info!(db, count = schema.indexes.len(), "Created unique indexes");
        Ok(())
    }

    /// Inserts the root hierarchy node and the manager account. Returns the
    /// manager's email and whether the insecure default was used.
    pub async fn seed_tenant(
        &self,
        db: &str,
        schema: &Schema,
        tenant: &TenantName,
        manager: &ManagerSeed,
    ) -> Result<(String, bool)> {
        let category = if schema.root_collection == "domain" {
            "domain"
        } else {
            "tenant"
        };
        let root = serde_json::to_value(RootNode::new(tenant.as_str(), category))?;
        self.engine
            .insert_one(db, schema.root_collection, &root)
            .await?;

        let (account, is_default) = match manager {
            ManagerSeed::Supplied(login) => {
                let hash = hash_account_password(&login.password)?;
                (ManagerAccount::new(&login.user, &hash), false)
            }
            // Stored in plaintext: the application accepts this exact pair unhashed
            ManagerSeed::InsecureDefault => {
                warn!(
                    tenant = %tenant,
                    email = DEFAULT_MANAGER_EMAIL,
                    "Seeding the well-known default manager account; rotate its password before exposing this tenant"
                );
                (
                    ManagerAccount::new(DEFAULT_MANAGER_EMAIL, DEFAULT_MANAGER_PASSWORD),
                    true,
                )
            }
        };
        let document = serde_json::to_value(&account)?;
        self.engine
            .insert_one(db, Schema::ACCOUNT_COLLECTION, &document)
            .await?;

        info!(db, root = schema.root_collection, "Seeded root node and manager account");
        Ok((account.email, is_default))
    }

    /// Creates the tenant's API principal with read-write on its own
    /// database and nothing else.
    pub async fn issue_credential(&self, tenant: &TenantName, password: &str) -> Result<String> {
        let db = self.config.tenant_db(tenant);
        let spec = UserSpec {
            user: self.config.api_user(tenant),
            password: password.to_string(),
            roles: vec![RoleGrant::new(Role::ReadWrite, db.clone())],
        };
        self.engine.create_user(&db, &spec).await?;
        info!(user = %spec.user, db = %db, "Issued tenant API credential");
        Ok(spec.user)
    }

    fn failed(&self, tenant: &TenantName, step: Step, registered: bool, source: Error) -> ProvisionError {
        if registered {
            error!(
                tenant = %tenant,
                %step,
                error = %source,
                "Provisioning stopped after registration; registry record may be orphaned"
            );
        } else {
            error!(tenant = %tenant, %step, error = %source, "Provisioning failed");
        }
        ProvisionError {
            tenant: tenant.to_string(),
            step,
            registered,
            source,
        }
    }

    /// Runs the full procedure for one tenant.
    pub async fn provision(
        &self,
        request: &ProvisionRequest,
    ) -> std::result::Result<ProvisionReport, ProvisionError> {
        let tenant = &request.tenant;
        let db = self.config.tenant_db(tenant);
        let schema = request.schema_version.schema();
        let mut steps = Vec::new();

        info!(tenant = %tenant, db = %db, version = %schema.version, "Provisioning tenant");

        self.config
            .check_tenant_db(tenant)
            .map_err(|e| self.failed(tenant, Step::RegisterTenant, false, e))?;

        register_tenant(self.engine, self.config, tenant)
            .await
            .map_err(|e| self.failed(tenant, Step::RegisterTenant, false, e))?;
        steps.push(Step::RegisterTenant);

        self.create_collections(&db, &schema)
            .await
            .map_err(|e| self.failed(tenant, Step::CreateCollections, true, e))?;
        steps.push(Step::CreateCollections);

        self.create_indexes(&db, &schema)
            .await
            .map_err(|e| self.failed(tenant, Step::CreateIndexes, true, e))?;
        steps.push(Step::CreateIndexes);

        let (manager_email, default_manager_credentials) = self
            .seed_tenant(&db, &schema, tenant, &request.manager)
            .await
            .map_err(|e| self.failed(tenant, Step::SeedRecords, true, e))?;
        steps.push(Step::SeedRecords);

        let api_user = self
            .issue_credential(tenant, &request.api_password)
            .await
            .map_err(|e| self.failed(tenant, Step::IssueCredential, true, e))?;
        steps.push(Step::IssueCredential);

        info!(tenant = %tenant, db = %db, "Tenant provisioned");

        Ok(ProvisionReport {
            tenant: tenant.to_string(),
            database: db,
            schema_version: schema.version,
            registry: self.config.registry_db.clone(),
            collections: schema.collection_names().collect(),
            indexes: schema
                .indexes
                .iter()
                .map(|idx| format!("{}.{}", idx.collection, idx.name()))
                .collect(),
            root_collection: schema.root_collection,
            manager_email,
            default_manager_credentials,
            api_user,
            steps,
        })
    }
}

/// Authenticates as the administrator and provisions one tenant.
pub async fn provision_tenant<C: Connector>(
    connector: &C,
    config: &ProvisionConfig,
    admin: &Login,
    request: &ProvisionRequest,
) -> std::result::Result<ProvisionReport, ProvisionError> {
    let engine = connector
        .connect(Some(admin), &config.admin_db)
        .await
        .map_err(|source| ProvisionError {
            tenant: request.tenant.to_string(),
            step: Step::Authenticate,
            registered: false,
            source,
        })?;

    Provisioner::new(&engine, config).provision(request).await
}
