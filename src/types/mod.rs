mod models;
mod role;
mod tenant;

pub use models::*;
pub use role::{Privilege, Role, RoleGrant, effective_privileges};
pub use tenant::{TenantName, validate_tenant_name};
