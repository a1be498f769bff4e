use super::{Category, CollectionSpec, IndexSpec};

use Category::*;

const NAME: &[&str] = &["name"];
const PARENT_NAME: &[&str] = &["parentId", "name"];
const PARENT_TYPE_NAME: &[&str] = &["parentId", "type", "name"];
const SLUG: &[&str] = &["slug"];
const EMAIL: &[&str] = &["email"];

const fn coll(name: &'static str, category: Category) -> CollectionSpec {
    CollectionSpec { name, category }
}

const fn unique(collection: &'static str, keys: &'static [&'static str]) -> IndexSpec {
    IndexSpec { collection, keys }
}

// -----------------------------------------------------------------------
// V1: shared layout with a tenant root and split sensor collections
// -----------------------------------------------------------------------

pub(super) static V1_COLLECTIONS: &[CollectionSpec] = &[
    coll("account", Account),
    coll("tenant", Hierarchy),
    coll("site", Hierarchy),
    coll("building", Hierarchy),
    coll("room", Hierarchy),
    coll("rack", Hierarchy),
    coll("device", Hierarchy),
    coll("subdevice", Hierarchy),
    coll("subdevice1", Hierarchy),
    coll("room_template", Template),
    coll("obj_template", Template),
    coll("group", Group),
    coll("ac", NonHierarchical),
    coll("panel", NonHierarchical),
    coll("separator", NonHierarchical),
    coll("row", NonHierarchical),
    coll("aisle", NonHierarchical),
    coll("tile", NonHierarchical),
    coll("cabinet", NonHierarchical),
    coll("corridor", NonHierarchical),
    coll("room_sensor", Sensor),
    coll("rack_sensor", Sensor),
    coll("device_sensor", Sensor),
    coll("stray_device", Stray),
];

pub(super) static V1_INDEXES: &[IndexSpec] = &[
    unique("tenant", NAME),
    unique("site", PARENT_NAME),
    unique("building", PARENT_NAME),
    unique("room", PARENT_NAME),
    unique("rack", PARENT_NAME),
    unique("device", PARENT_NAME),
    unique("subdevice", PARENT_NAME),
    unique("subdevice1", PARENT_NAME),
    unique("room_template", SLUG),
    unique("obj_template", SLUG),
    unique("group", PARENT_NAME),
    unique("ac", PARENT_NAME),
    unique("panel", PARENT_NAME),
    unique("separator", PARENT_NAME),
    unique("row", PARENT_NAME),
    unique("aisle", PARENT_NAME),
    unique("tile", PARENT_NAME),
    unique("cabinet", PARENT_NAME),
    unique("corridor", PARENT_NAME),
    unique("room_sensor", PARENT_TYPE_NAME),
    unique("rack_sensor", PARENT_TYPE_NAME),
    unique("device_sensor", PARENT_TYPE_NAME),
    unique("stray_device", PARENT_NAME),
];

// -----------------------------------------------------------------------
// V2: per-tenant database, tenant root, unified sensors
// -----------------------------------------------------------------------

pub(super) static V2_COLLECTIONS: &[CollectionSpec] = &[
    coll("account", Account),
    coll("tenant", Hierarchy),
    coll("site", Hierarchy),
    coll("building", Hierarchy),
    coll("room", Hierarchy),
    coll("rack", Hierarchy),
    coll("device", Hierarchy),
    coll("room_template", Template),
    coll("obj_template", Template),
    coll("bldg_template", Template),
    coll("group", Group),
    coll("ac", NonHierarchical),
    coll("panel", NonHierarchical),
    coll("cabinet", NonHierarchical),
    coll("corridor", NonHierarchical),
    coll("sensor", Sensor),
    coll("stray_device", Stray),
    coll("stray_sensor", Stray),
];

pub(super) static V2_INDEXES: &[IndexSpec] = &[
    unique("tenant", NAME),
    unique("site", PARENT_NAME),
    unique("building", PARENT_NAME),
    unique("room", PARENT_NAME),
    unique("rack", PARENT_NAME),
    unique("device", PARENT_NAME),
    unique("room_template", SLUG),
    unique("obj_template", SLUG),
    unique("bldg_template", SLUG),
    unique("ac", PARENT_NAME),
    unique("panel", PARENT_NAME),
    unique("cabinet", PARENT_NAME),
    unique("corridor", PARENT_NAME),
    unique("sensor", PARENT_TYPE_NAME),
    unique("group", PARENT_NAME),
    unique("stray_device", PARENT_NAME),
    unique("stray_sensor", NAME),
];

// -----------------------------------------------------------------------
// V3: per-tenant database with a domain root
// -----------------------------------------------------------------------

pub(super) static V3_COLLECTIONS: &[CollectionSpec] = &[
    coll("account", Account),
    coll("domain", Hierarchy),
    coll("site", Hierarchy),
    coll("building", Hierarchy),
    coll("room", Hierarchy),
    coll("rack", Hierarchy),
    coll("device", Hierarchy),
    coll("room_template", Template),
    coll("obj_template", Template),
    coll("bldg_template", Template),
    coll("group", Group),
    coll("ac", NonHierarchical),
    coll("panel", NonHierarchical),
    coll("cabinet", NonHierarchical),
    coll("corridor", NonHierarchical),
    coll("sensor", Sensor),
    coll("stray_device", Stray),
    coll("stray_sensor", Stray),
];

pub(super) static V3_INDEXES: &[IndexSpec] = &[
    unique("account", EMAIL),
    unique("domain", PARENT_NAME),
    // Sites are top level once the database itself is the tenant boundary.
    unique("site", NAME),
    unique("building", PARENT_NAME),
    unique("room", PARENT_NAME),
    unique("rack", PARENT_NAME),
    unique("device", PARENT_NAME),
    unique("room_template", SLUG),
    unique("obj_template", SLUG),
    unique("bldg_template", SLUG),
    unique("ac", PARENT_NAME),
    unique("panel", PARENT_NAME),
    unique("cabinet", PARENT_NAME),
    unique("corridor", PARENT_NAME),
    unique("sensor", PARENT_TYPE_NAME),
    unique("group", PARENT_NAME),
    unique("stray_device", PARENT_NAME),
    unique("stray_sensor", NAME),
];
