use serde::Serialize;
use tracing::{info, warn};

use super::registry::ensure_registry;
use crate::config::{Login, ProvisionConfig, ServiceAccounts};
use crate::engine::{Connector, Engine};
use crate::error::{Error, Result};
use crate::types::{Role, RoleGrant, UserSpec};

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapOutcome {
    /// False when the admin account already existed and creation was skipped.
    pub accounts_created: bool,
    /// Service accounts absent from an already-bootstrapped deployment.
    pub missing_accounts: Vec<String>,
    pub registry: String,
}

fn user_spec(login: &Login, roles: Vec<RoleGrant>) -> UserSpec {
    UserSpec {
        user: login.user.clone(),
        password: login.password.clone(),
        roles,
    }
}

/// The three service accounts in creation order, with their fixed roles.
pub fn service_account_specs(config: &ProvisionConfig, accounts: &ServiceAccounts) -> [UserSpec; 3] {
    let db = config.admin_db.as_str();
    [
        user_spec(
            &accounts.admin,
            vec![
                RoleGrant::new(Role::UserAdminAnyDatabase, db),
                RoleGrant::new(Role::ReadWriteAnyDatabase, db),
            ],
        ),
        user_spec(&accounts.root, vec![RoleGrant::new(Role::Root, db)]),
        user_spec(
            &accounts.guard,
            vec![
                RoleGrant::new(Role::Backup, db),
                RoleGrant::new(Role::Restore, db),
            ],
        ),
    ]
}

/// Creates the service accounts unless the admin account already exists.
///
/// Only the admin username is checked, so a deployment holding the admin
/// account but missing the others is treated as bootstrapped. The missing
/// names are returned and logged rather than created.
pub async fn ensure_service_accounts<E: Engine>(
    engine: &E,
    config: &ProvisionConfig,
    accounts: &ServiceAccounts,
) -> Result<(bool, Vec<String>)> {
    let users = engine.list_users(&config.admin_db).await?;
    let exists = |name: &str| users.iter().any(|u| u.user == name);

    if exists(&accounts.admin.user) {
        info!(user = %accounts.admin.user, "User already exists, skip user creation");
        let missing: Vec<String> = [&accounts.root.user, &accounts.guard.user]
            .into_iter()
            .filter(|name| !exists(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            warn!(
                missing = ?missing,
                "Deployment is partially bootstrapped; these service accounts were not created"
            );
        }
        return Ok((false, missing));
    }

    for spec in service_account_specs(config, accounts) {
        engine.create_user(&config.admin_db, &spec).await?;
        info!(user = %spec.user, db = %config.admin_db, "Created service account");
    }
    Ok((true, Vec::new()))
}

/// Runs the administrative bootstrap: service accounts, then the registry.
///
/// The admin login is tried first. If it is rejected, an unauthenticated
/// handle is used instead, which only succeeds on a deployment that has no
/// principals yet; otherwise the original authentication failure is
/// returned and nothing is created.
pub async fn bootstrap<C: Connector>(
    connector: &C,
    config: &ProvisionConfig,
    accounts: &ServiceAccounts,
) -> Result<BootstrapOutcome> {
    let (accounts_created, missing_accounts) =
        match connector.connect(Some(&accounts.admin), &config.admin_db).await {
            Ok(engine) => ensure_service_accounts(&engine, config, accounts).await?,
            Err(Error::AuthenticationFailure(reason)) => {
                let engine = connector.connect(None, &config.admin_db).await?;
                match ensure_service_accounts(&engine, config, accounts).await {
                    Err(Error::Unauthorized(_)) => return Err(Error::AuthenticationFailure(reason)),
                    other => other?,
                }
            }
            Err(e) => return Err(e),
        };

    let admin = connector
        .connect(Some(&accounts.admin), &config.admin_db)
        .await?;
    ensure_registry(&admin, config).await?;

    Ok(BootstrapOutcome {
        accounts_created,
        missing_accounts,
        registry: config.registry_db.clone(),
    })
}
