mod admin;
mod commands;
mod prompts;
mod registry;
mod schema;
mod tenant;

pub use admin::run_admin_bootstrap;
pub use commands::{
    AdminCommands, ConnectionArgs, ProvisionArgs, RegistryCommands, SchemaCommands,
    TenantCommands,
};
pub use registry::run_registry_list;
pub use schema::run_schema_show;
pub use tenant::run_tenant_provision;
