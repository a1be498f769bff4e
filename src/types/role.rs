use std::fmt;

use serde::{Deserialize, Serialize};

/// Privilege is a bitmask of actions a principal may perform on a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Privilege(u32);

impl Privilege {
    pub const READ: Privilege = Privilege(1 << 0); // 1
    pub const WRITE: Privilege = Privilege(1 << 1); // 2
    pub const USER_ADMIN: Privilege = Privilege(1 << 2); // 4

    /// Returns true if this bitmask contains the required privilege.
    #[must_use]
    pub const fn has(self, required: Privilege) -> bool {
        self.0 & required.0 == required.0
    }

    #[must_use]
    pub const fn union(self, other: Privilege) -> Privilege {
        Privilege(self.0 | other.0)
    }

    #[must_use]
    pub fn to_strings(self) -> Vec<&'static str> {
        let mut privileges = Vec::new();
        if self.has(Self::READ) {
            privileges.push("read");
        }
        if self.has(Self::WRITE) {
            privileges.push("write");
        }
        if self.has(Self::USER_ADMIN) {
            privileges.push("userAdmin");
        }
        privileges
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_strings().join(", "))
    }
}

/// Built-in database roles, named as the document database names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Root,
    UserAdminAnyDatabase,
    ReadWriteAnyDatabase,
    ReadWrite,
    Backup,
    Restore,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::UserAdminAnyDatabase => "userAdminAnyDatabase",
            Self::ReadWriteAnyDatabase => "readWriteAnyDatabase",
            Self::ReadWrite => "readWrite",
            Self::Backup => "backup",
            Self::Restore => "restore",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "root" => Some(Self::Root),
            "userAdminAnyDatabase" => Some(Self::UserAdminAnyDatabase),
            "readWriteAnyDatabase" => Some(Self::ReadWriteAnyDatabase),
            "readWrite" => Some(Self::ReadWrite),
            "backup" => Some(Self::Backup),
            "restore" => Some(Self::Restore),
            _ => None,
        }
    }

    /// Whether the role applies to every database rather than only the one
    /// it was granted on.
    pub const fn is_cluster_wide(self) -> bool {
        !matches!(self, Self::ReadWrite)
    }

    pub const fn privileges(self) -> Privilege {
        match self {
            Self::Root => Privilege::READ
                .union(Privilege::WRITE)
                .union(Privilege::USER_ADMIN),
            Self::UserAdminAnyDatabase => Privilege::USER_ADMIN,
            Self::ReadWriteAnyDatabase | Self::ReadWrite => Privilege::READ.union(Privilege::WRITE),
            Self::Backup => Privilege::READ,
            Self::Restore => Privilege::WRITE,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role granted on a specific database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: Role,
    pub db: String,
}

impl RoleGrant {
    pub fn new(role: Role, db: impl Into<String>) -> Self {
        Self {
            role,
            db: db.into(),
        }
    }

    /// Returns the privileges this grant gives on `db`.
    #[must_use]
    pub fn privileges_on(&self, db: &str) -> Privilege {
        if self.role.is_cluster_wide() || self.db == db {
            self.role.privileges()
        } else {
            Privilege::default()
        }
    }
}

/// Combines the privileges of every grant for one target database.
pub fn effective_privileges(grants: &[RoleGrant], db: &str) -> Privilege {
    grants
        .iter()
        .fold(Privilege::default(), |acc, grant| acc.union(grant.privileges_on(db)))
}
