//! Collection and index tables for tenant databases.
//!
//! Every schema version is a self-contained table: collections are created
//! first, then the unique indexes declared on them. Parent existence is not
//! enforced here; uniqueness is the only constraint the database carries.

mod tables;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Collection holding one record per registered tenant.
pub const REGISTRY_COLLECTION: &str = "customer";

/// Unique tenant names in the registry.
pub const REGISTRY_INDEX: IndexSpec = IndexSpec {
    collection: REGISTRY_COLLECTION,
    keys: &["name"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Account,
    Hierarchy,
    Template,
    Group,
    NonHierarchical,
    Sensor,
    Stray,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Hierarchy => "hierarchy",
            Self::Template => "template",
            Self::Group => "group",
            Self::NonHierarchical => "nonhierarchical",
            Self::Sensor => "sensor",
            Self::Stray => "stray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionSpec {
    pub name: &'static str,
    pub category: Category,
}

/// A unique ascending index over one or more document fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub collection: &'static str,
    pub keys: &'static [&'static str],
}

impl IndexSpec {
    /// Index name in the `<field>_1_<field>_1` form document databases
    /// derive from ascending key patterns.
    #[must_use]
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{k}_1"))
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    V1,
    V2,
    #[default]
    V3,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [Self::V1, Self::V2, Self::V3];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    #[must_use]
    pub fn schema(self) -> Schema {
        match self {
            Self::V1 => Schema {
                version: self,
                collections: tables::V1_COLLECTIONS,
                indexes: tables::V1_INDEXES,
                root_collection: "tenant",
            },
            Self::V2 => Schema {
                version: self,
                collections: tables::V2_COLLECTIONS,
                indexes: tables::V2_INDEXES,
                root_collection: "tenant",
            },
            Self::V3 => Schema {
                version: self,
                collections: tables::V3_COLLECTIONS,
                indexes: tables::V3_INDEXES,
                root_collection: "domain",
            },
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            "v3" | "3" => Ok(Self::V3),
            other => Err(format!("unknown schema version '{other}' (expected v1, v2 or v3)")),
        }
    }
}

/// The full table for one schema version.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Schema {
    pub version: SchemaVersion,
    pub collections: &'static [CollectionSpec],
    pub indexes: &'static [IndexSpec],
    /// Collection receiving the seeded root hierarchy node.
    pub root_collection: &'static str,
}

impl Schema {
    pub const ACCOUNT_COLLECTION: &'static str = "account";

    pub fn collection_names(&self) -> impl Iterator<Item = &'static str> {
        self.collections.iter().map(|c| c.name)
    }

    pub fn contains(&self, collection: &str) -> bool {
        self.collections.iter().any(|c| c.name == collection)
    }

    pub fn indexes_for<'a>(&'a self, collection: &'a str) -> impl Iterator<Item = &'a IndexSpec> {
        self.indexes
            .iter()
            .filter(move |idx| idx.collection == collection)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_every_index_targets_a_declared_collection() {
        for version in SchemaVersion::ALL {
            let schema = version.schema();
            for idx in schema.indexes {
                assert!(
                    schema.contains(idx.collection),
                    "{version}: index on undeclared collection {}",
                    idx.collection
                );
            }
        }
    }

    #[test]
    fn test_collection_names_are_unique_per_version() {
        for version in SchemaVersion::ALL {
            let schema = version.schema();
            let names: HashSet<_> = schema.collection_names().collect();
            assert_eq!(names.len(), schema.collections.len(), "{version}");
        }
    }

    #[test]
    fn test_root_and_account_collections_exist() {
        for version in SchemaVersion::ALL {
            let schema = version.schema();
            assert!(schema.contains(schema.root_collection), "{version}");
            assert!(schema.contains(Schema::ACCOUNT_COLLECTION), "{version}");
        }
    }

    #[test]
    fn test_current_version_does_not_mix_legacy_collections() {
        let schema = SchemaVersion::V3.schema();
        for legacy in ["tenant", "subdevice", "subdevice1", "row", "aisle", "rack_sensor"] {
            assert!(!schema.contains(legacy), "v3 must not contain {legacy}");
        }
        assert!(schema.contains("domain"));
        assert!(schema.contains("stray_sensor"));
    }

    #[test]
    fn test_legacy_version_splits_sensors() {
        let schema = SchemaVersion::V1.schema();
        assert!(!schema.contains("sensor"));
        for sensor in ["room_sensor", "rack_sensor", "device_sensor"] {
            let idx: Vec<_> = schema.indexes_for(sensor).collect();
            assert_eq!(idx.len(), 1);
            assert_eq!(idx[0].keys, &["parentId", "type", "name"]);
        }
    }

    #[test]
    fn test_templates_are_keyed_by_slug() {
        for version in SchemaVersion::ALL {
            let schema = version.schema();
            for template in schema
                .collections
                .iter()
                .filter(|c| c.category == Category::Template)
            {
                let keys: Vec<_> = schema
                    .indexes_for(template.name)
                    .map(|idx| idx.keys)
                    .collect();
                assert_eq!(keys, vec![&["slug"][..]], "{version}: {}", template.name);
            }
        }
    }

    #[test]
    fn test_index_name() {
        assert_eq!(REGISTRY_INDEX.name(), "name_1");
        let idx = IndexSpec {
            collection: "sensor",
            keys: &["parentId", "type", "name"],
        };
        assert_eq!(idx.name(), "parentId_1_type_1_name_1");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!("v2".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2);
        assert_eq!("V3".parse::<SchemaVersion>().unwrap(), SchemaVersion::V3);
        assert!("v9".parse::<SchemaVersion>().is_err());
        assert_eq!(SchemaVersion::default(), SchemaVersion::V3);
    }
}
