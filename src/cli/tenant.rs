use serde::Serialize;

use crate::auth::generate_password;
use crate::config::{Backend, Login};
use crate::engine::{MongoConnector, SqliteConnector};
use crate::provision::{ManagerSeed, ProvisionReport, ProvisionRequest, provision_tenant};
use crate::types::TenantName;

use super::commands::ProvisionArgs;
use super::prompts::{existing_password, manager_email, new_password, tenant_name};

#[derive(Serialize)]
struct ProvisionOutput<'a> {
    #[serde(flatten)]
    report: &'a ProvisionReport,
    /// Only present when the password was generated by this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    generated_api_password: Option<&'a str>,
}

fn print_report(report: &ProvisionReport, generated: Option<&str>) {
    println!();
    println!(
        "Provisioned tenant '{}' (schema {})",
        report.tenant, report.schema_version
    );
    println!();
    println!("  registry   {}", report.registry);
    println!("  database   {}", report.database);
    println!(
        "  schema     {} collections, {} unique indexes",
        report.collections.len(),
        report.indexes.len()
    );
    println!("  root       {}.{}", report.root_collection, report.tenant);
    println!("  manager    {}", report.manager_email);
    println!("  api user   {}", report.api_user);
    println!();
    println!(
        "Completed steps: {}",
        report
            .steps
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    if report.default_manager_credentials {
        println!();
        println!("WARNING: the manager account uses the default admin/admin credentials.");
        println!("Change its password before exposing this tenant.");
    }

    if let Some(password) = generated {
        println!();
        println!("========================================");
        println!("API password (save this, it won't be shown again):");
        println!();
        println!("  {password}");
        println!();
        println!("========================================");
    }
    println!();
}

pub async fn run_tenant_provision(args: ProvisionArgs) -> anyhow::Result<()> {
    let config = args.connection.resolve()?;
    let tenant = TenantName::parse(&tenant_name(args.name, args.non_interactive)?)?;
    let schema_version = args.schema_version.unwrap_or(config.schema_version);

    let admin = Login::new(
        &config.admin_user,
        existing_password(args.admin_password, "Admin password:", args.non_interactive)?,
    )?;

    let generated = args.generate_password.then(generate_password);
    let api_password = match &generated {
        Some(password) => Some(password.clone()),
        None => new_password(
            args.api_password,
            &format!("API password for '{tenant}':"),
            args.non_interactive,
        )?,
    };

    let manager = if args.allow_default_manager {
        ManagerSeed::InsecureDefault
    } else {
        let email = manager_email(args.manager_email, args.non_interactive)?;
        let password = new_password(
            args.manager_password,
            "Manager password:",
            args.non_interactive,
        )?;
        ManagerSeed::Supplied(Login::new(email, password)?)
    };

    let request = ProvisionRequest::new(tenant, api_password, schema_version, manager)?;

    let report = match config.backend {
        Backend::Mongodb => {
            let connector = MongoConnector::new(&config.host);
            provision_tenant(&connector, &config, &admin, &request).await?
        }
        Backend::Sqlite => {
            let connector = SqliteConnector::open(&config.data_dir)?;
            provision_tenant(&connector, &config, &admin, &request).await?
        }
    };

    if args.json {
        let output = ProvisionOutput {
            report: &report,
            generated_api_password: generated.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&report, generated.as_deref());
    }

    Ok(())
}
