//! # tenantctl
//!
//! Provisions tenants of a multi-tenant document database, usable both as
//! a standalone binary and as a library.
//!
//! A deployment is bootstrapped once (service accounts plus the tenant
//! registry). Each tenant is then registered, gets its own database
//! materialized from a versioned schema table, is seeded with a root node
//! and a manager account, and receives an API credential scoped to its
//! database alone.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! tenantctl = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use tenantctl::config::{Login, ProvisionConfig};
//! use tenantctl::engine::SqliteConnector;
//! use tenantctl::provision::{ManagerSeed, ProvisionRequest, provision_tenant};
//! use tenantctl::schema::SchemaVersion;
//! use tenantctl::types::TenantName;
//!
//! let config = ProvisionConfig::default();
//! let connector = SqliteConnector::open("./data")?;
//! let admin = Login::new("admin", Some(admin_password))?;
//! let request = ProvisionRequest::new(
//!     TenantName::parse("acme")?,
//!     Some(api_password),
//!     SchemaVersion::V3,
//!     ManagerSeed::Supplied(Login::new("ops@acme.test", Some(manager_password))?),
//! )?;
//! let report = provision_tenant(&connector, &config, &admin, &request).await?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod provision;
pub mod schema;
pub mod types;
