use crate::config::{Backend, Login, ProvisionConfig};
use crate::engine::{Connector, MongoConnector, SqliteConnector};
use crate::provision::list_tenants;

use super::commands::ConnectionArgs;
use super::prompts::existing_password;

async fn registered_tenants<C: Connector>(
    connector: &C,
    config: &ProvisionConfig,
    admin: &Login,
) -> crate::error::Result<Vec<String>> {
    let engine = connector.connect(Some(admin), &config.admin_db).await?;
    list_tenants(&engine, config).await
}

pub async fn run_registry_list(
    connection: ConnectionArgs,
    admin_password: Option<String>,
    non_interactive: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = connection.resolve()?;
    let admin = Login::new(
        &config.admin_user,
        existing_password(admin_password, "Admin password:", non_interactive)?,
    )?;

    let tenants = match config.backend {
        Backend::Mongodb => {
            registered_tenants(&MongoConnector::new(&config.host), &config, &admin).await?
        }
        Backend::Sqlite => {
            registered_tenants(&SqliteConnector::open(&config.data_dir)?, &config, &admin).await?
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&tenants)?);
        return Ok(());
    }

    if tenants.is_empty() {
        println!("No tenants registered.");
        return Ok(());
    }
    println!();
    for tenant in &tenants {
        println!("  {tenant}");
    }
    println!();

    Ok(())
}
