use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tenantctl::cli::{
    AdminCommands, RegistryCommands, SchemaCommands, TenantCommands, run_admin_bootstrap,
    run_registry_list, run_schema_show, run_tenant_provision,
};

#[derive(Parser)]
#[command(name = "tenantctl")]
#[command(about = "Provision tenants of a multi-tenant document database", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Inspect the tenant registry
    Registry {
        #[command(subcommand)]
        command: RegistryCommands,
    },

    /// Manage tenants
    Tenant {
        #[command(subcommand)]
        command: TenantCommands,
    },

    /// Inspect schema versions
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Admin { command } => match command {
            AdminCommands::Bootstrap {
                connection,
                admin_password,
                super_password,
                guard_password,
                non_interactive,
                json,
            } => {
                run_admin_bootstrap(
                    connection,
                    admin_password,
                    super_password,
                    guard_password,
                    non_interactive,
                    json,
                )
                .await
            }
        },
        Commands::Registry { command } => match command {
            RegistryCommands::List {
                connection,
                admin_password,
                non_interactive,
                json,
            } => run_registry_list(connection, admin_password, non_interactive, json).await,
        },
        Commands::Tenant { command } => match command {
            TenantCommands::Provision(args) => run_tenant_provision(args).await,
        },
        Commands::Schema { command } => match command {
            SchemaCommands::Show {
                schema_version,
                json,
            } => run_schema_show(schema_version, json),
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tenantctl=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    tokio::select! {
        result = run(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            bail!("Interrupted; a provisioning run may have stopped partway, check the registry before retrying")
        }
    }
}
