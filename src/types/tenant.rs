use std::fmt;

use crate::error::{Error, Result};

const MAX_TENANT_NAME_LEN: usize = 48;

/// A tenant identifier that is safe to embed in database and user names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TenantName(String);

impl TenantName {
    pub fn parse(name: &str) -> Result<Self> {
        validate_tenant_name(name).map_err(Error::InvalidTenantName)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TenantName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

pub fn validate_tenant_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("tenant name cannot be empty".to_string());
    }
    if name.len() > MAX_TENANT_NAME_LEN {
        return Err(format!(
            "tenant name cannot exceed {MAX_TENANT_NAME_LEN} characters"
        ));
    }
    if !name.chars().all(is_valid_name_char) {
        return Err(
            "tenant name can only contain lowercase letters, digits, hyphens, and underscores"
                .to_string(),
        );
    }
    if name.starts_with('-') || name.starts_with('_') {
        return Err("tenant name cannot start with a hyphen or underscore".to_string());
    }
    Ok(())
}
