use std::fmt;

use serde::Serialize;

use crate::error::Error;
use crate::schema::SchemaVersion;

/// The stages of a tenant provisioning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Authenticate,
    RegisterTenant,
    CreateCollections,
    CreateIndexes,
    SeedRecords,
    IssueCredential,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authenticate => "authenticate",
            Self::RegisterTenant => "register tenant",
            Self::CreateCollections => "create collections",
            Self::CreateIndexes => "create indexes",
            Self::SeedRecords => "seed records",
            Self::IssueCredential => "issue credential",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn orphan_note(registered: &bool) -> &'static str {
    if *registered {
        "; the registry record now exists but the tenant database may be incomplete and needs manual attention"
    } else {
        ""
    }
}

/// A provisioning run that stopped partway. Nothing is rolled back.
#[derive(Debug, thiserror::Error)]
#[error("step '{step}' failed for tenant '{tenant}'{}", orphan_note(.registered))]
pub struct ProvisionError {
    pub tenant: String,
    pub step: Step,
    /// Whether the registry insert had already succeeded.
    pub registered: bool,
    #[source]
    pub source: Error,
}

/// What a successful run created.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub tenant: String,
    pub database: String,
    pub schema_version: SchemaVersion,
    pub registry: String,
    pub collections: Vec<&'static str>,
    pub indexes: Vec<String>,
    pub root_collection: &'static str,
    pub manager_email: String,
    pub default_manager_credentials: bool,
    pub api_user: String,
    pub steps: Vec<Step>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mentions_orphaned_registry_record() {
        let err = ProvisionError {
            tenant: "acme".to_string(),
            step: Step::CreateIndexes,
            registered: true,
            source: Error::Unauthorized("no".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("create indexes"));
        assert!(message.contains("registry record now exists"));
    }

    #[test]
    fn test_error_before_registration_has_no_orphan_note() {
        let err = ProvisionError {
            tenant: "acme".to_string(),
            step: Step::RegisterTenant,
            registered: false,
            source: Error::DuplicateTenant("acme".to_string()),
        };
        assert!(!err.to_string().contains("registry record"));
    }

    #[test]
    fn test_cause_is_reported_once_through_the_source_chain() {
        let err = ProvisionError {
            tenant: "acme".to_string(),
            step: Step::RegisterTenant,
            registered: false,
            source: Error::DuplicateTenant("acme".to_string()),
        };
        assert!(!err.to_string().contains("already registered"));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "tenant 'acme' is already registered");
    }
}
