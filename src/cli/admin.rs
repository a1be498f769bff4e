use crate::config::{Backend, Login, ServiceAccounts};
use crate::engine::{MongoConnector, SqliteConnector};
use crate::provision::bootstrap;

use super::commands::ConnectionArgs;
use super::prompts::new_password;

pub async fn run_admin_bootstrap(
    connection: ConnectionArgs,
    admin_password: Option<String>,
    super_password: Option<String>,
    guard_password: Option<String>,
    non_interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = connection.resolve()?;

    let accounts = ServiceAccounts {
        admin: Login::new(
            &config.admin_user,
            new_password(admin_password, "Admin password:", non_interactive)?,
        )?,
        root: Login::new(
            &config.super_user,
            new_password(super_password, "Superuser password:", non_interactive)?,
        )?,
        guard: Login::new(
            &config.guard_user,
            new_password(guard_password, "Guard password:", non_interactive)?,
        )?,
    };

    let outcome = match config.backend {
        Backend::Mongodb => bootstrap(&MongoConnector::new(&config.host), &config, &accounts).await?,
        Backend::Sqlite => {
            bootstrap(&SqliteConnector::open(&config.data_dir)?, &config, &accounts).await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!();
    if outcome.accounts_created {
        println!(
            "Created service accounts '{}', '{}' and '{}' on '{}'",
            accounts.admin.user, accounts.root.user, accounts.guard.user, config.admin_db
        );
    } else {
        println!(
            "Service account '{}' already exists, skipped account creation",
            accounts.admin.user
        );
        for name in &outcome.missing_accounts {
            println!("  warning: service account '{name}' is missing");
        }
    }
    println!("Tenant registry ready in '{}'", outcome.registry);
    println!();

    Ok(())
}
