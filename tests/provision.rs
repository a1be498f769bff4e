//! End-to-end provisioning against the embedded engine.
//!
//! Each test bootstraps a fresh deployment in its own temp directory.

use serde_json::json;
use tempfile::TempDir;

use tenantctl::config::{Login, ProvisionConfig, ServiceAccounts};
use tenantctl::engine::{Connector, Engine, SqliteConnector, SqliteEngine};
use tenantctl::error::Error;
use tenantctl::provision::{
    ManagerSeed, ProvisionRequest, Step, bootstrap, list_tenants, provision_tenant,
};
use tenantctl::schema::{REGISTRY_COLLECTION, SchemaVersion};
use tenantctl::types::{Role, RoleGrant, TenantName, UserSpec};

struct Deployment {
    _temp_dir: TempDir,
    connector: SqliteConnector,
    config: ProvisionConfig,
    accounts: ServiceAccounts,
}

fn login(user: &str, password: &str) -> Login {
    Login::new(user, Some(password.to_string())).unwrap()
}

impl Deployment {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let connector = SqliteConnector::open(temp_dir.path()).unwrap();
        Self {
            _temp_dir: temp_dir,
            connector,
            config: ProvisionConfig::default(),
            accounts: ServiceAccounts {
                admin: login("admin", "admin-secret"),
                root: login("super", "super-secret"),
                guard: login("guard", "guard-secret"),
            },
        }
    }

    async fn bootstrapped() -> Self {
        let deployment = Self::new();
        bootstrap(&deployment.connector, &deployment.config, &deployment.accounts)
            .await
            .unwrap();
        deployment
    }

    fn request(&self, tenant: &str, version: SchemaVersion) -> ProvisionRequest {
        ProvisionRequest::new(
            TenantName::parse(tenant).unwrap(),
            Some(format!("{tenant}-api-secret")),
            version,
            ManagerSeed::Supplied(login(&format!("ops@{tenant}.test"), "manager-secret")),
        )
        .unwrap()
    }

    async fn admin(&self) -> SqliteEngine {
        self.connector
            .connect(Some(&self.accounts.admin), &self.config.admin_db)
            .await
            .unwrap()
    }

    async fn api(&self, tenant: &str) -> SqliteEngine {
        let tenant = TenantName::parse(tenant).unwrap();
        let db = self.config.tenant_db(&tenant);
        let user = self.config.api_user(&tenant);
        self.connector
            .connect(Some(&login(&user, &format!("{tenant}-api-secret"))), &db)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_provision_fresh_tenant_for_every_version() {
    for (i, version) in SchemaVersion::ALL.into_iter().enumerate() {
        let deployment = Deployment::bootstrapped().await;
        let tenant = format!("tenant{i}");
        let request = deployment.request(&tenant, version);

        let report = provision_tenant(
            &deployment.connector,
            &deployment.config,
            &deployment.accounts.admin,
            &request,
        )
        .await
        .unwrap();

        assert_eq!(report.database, format!("ogree{tenant}"));
        assert_eq!(report.api_user, format!("ogree{tenant}Admin"));
        assert_eq!(report.schema_version, version);
        assert_eq!(report.steps.len(), 5);
        assert!(!report.default_manager_credentials);

        let admin = deployment.admin().await;
        let mut expected: Vec<String> = version
            .schema()
            .collection_names()
            .map(String::from)
            .collect();
        expected.sort();
        assert_eq!(
            admin.list_collections(&report.database).await.unwrap(),
            expected
        );

        let tenants = list_tenants(&admin, &deployment.config).await.unwrap();
        assert_eq!(tenants, vec![tenant.clone()]);

        let roots = admin
            .find_all(&report.database, version.schema().root_collection)
            .await
            .unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0]["name"], json!(tenant));
        assert_eq!(roots[0]["attributes"]["color"], json!("ffffff"));

        let accounts = admin.find_all(&report.database, "account").await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0]["email"], json!(format!("ops@{tenant}.test")));
        assert_eq!(accounts[0]["roles"]["*"], json!("manager"));

        let stored = accounts[0]["password"].as_str().unwrap();
        assert!(stored.starts_with("$2"), "{stored}");
        assert!(bcrypt::verify("manager-secret", stored).unwrap());

        assert!(roots[0]["lastUpdated"]["$date"].is_string());
    }
}

#[tokio::test]
async fn test_v3_root_is_a_domain() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V3);
    let report = provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap();

    assert_eq!(report.root_collection, "domain");
    let roots = deployment
        .admin()
        .await
        .find_all(&report.database, "domain")
        .await
        .unwrap();
    assert_eq!(roots[0]["category"], json!("domain"));
}

#[tokio::test]
async fn test_duplicate_tenant_is_rejected_and_registry_unchanged() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V3);

    provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap();

    let err = provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap_err();

    assert_eq!(err.step, Step::RegisterTenant);
    assert!(!err.registered);
    assert!(matches!(err.source, Error::DuplicateTenant(ref name) if name == "acme"));

    let admin = deployment.admin().await;
    let records = admin
        .find_all(&deployment.config.registry_db, REGISTRY_COLLECTION)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let deployment = Deployment::bootstrapped().await;
    for tenant in ["acme", "globex"] {
        let request = deployment.request(tenant, SchemaVersion::V3);
        provision_tenant(
            &deployment.connector,
            &deployment.config,
            &deployment.accounts.admin,
            &request,
        )
        .await
        .unwrap();
    }

    let acme = deployment.api("acme").await;
    let site = json!({"name": "paris", "category": "site"});

    acme.insert_one("ogreeacme", "site", &site).await.unwrap();

    let err = acme
        .insert_one("ogreeglobex", "site", &site)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let err = acme
        .find_all("ogree", REGISTRY_COLLECTION)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized(_)));

    let admin = deployment.admin().await;
    assert!(admin.find_all("ogreeglobex", "site").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hierarchy_names_are_unique_per_parent() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V3);
    provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap();

    let api = deployment.api("acme").await;
    let db = "ogreeacme";

    api.insert_one(db, "building", &json!({"parentId": "site1", "name": "b1"}))
        .await
        .unwrap();
    api.insert_one(db, "building", &json!({"parentId": "site2", "name": "b1"}))
        .await
        .unwrap();
    api.insert_one(db, "building", &json!({"parentId": "site1", "name": "b2"}))
        .await
        .unwrap();

    let err = api
        .insert_one(db, "building", &json!({"parentId": "site1", "name": "b1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
}

#[tokio::test]
async fn test_template_slugs_are_unique() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V2);
    provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap();

    let api = deployment.api("acme").await;
    api.insert_one(
        "ogreeacme",
        "obj_template",
        &json!({"slug": "rack-42u", "category": "rack"}),
    )
    .await
    .unwrap();

    let err = api
        .insert_one(
            "ogreeacme",
            "obj_template",
            &json!({"slug": "rack-42u", "category": "device"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { .. }));
}

#[tokio::test]
async fn test_bootstrap_twice_creates_accounts_once() {
    let deployment = Deployment::new();

    let first = bootstrap(&deployment.connector, &deployment.config, &deployment.accounts)
        .await
        .unwrap();
    assert!(first.accounts_created);

    let second = bootstrap(&deployment.connector, &deployment.config, &deployment.accounts)
        .await
        .unwrap();
    assert!(!second.accounts_created);
    assert!(second.missing_accounts.is_empty());

    let users = deployment
        .admin()
        .await
        .list_users(&deployment.config.admin_db)
        .await
        .unwrap();
    let names: Vec<&str> = users.iter().map(|u| u.user.as_str()).collect();
    assert_eq!(names, vec!["admin", "guard", "super"]);
}

#[tokio::test]
async fn test_bootstrap_with_wrong_password_creates_nothing() {
    let deployment = Deployment::bootstrapped().await;

    let mut accounts = deployment.accounts.clone();
    accounts.admin = login("admin", "wrong");

    let err = bootstrap(&deployment.connector, &deployment.config, &accounts)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthenticationFailure(_)));

    let users = deployment
        .admin()
        .await
        .list_users(&deployment.config.admin_db)
        .await
        .unwrap();
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn test_authentication_failure_aborts_before_registration() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V3);

    let err = provision_tenant(
        &deployment.connector,
        &deployment.config,
        &login("admin", "wrong"),
        &request,
    )
    .await
    .unwrap_err();

    assert_eq!(err.step, Step::Authenticate);
    assert!(!err.registered);
    assert!(matches!(err.source, Error::AuthenticationFailure(_)));

    let admin = deployment.admin().await;
    assert!(
        list_tenants(&admin, &deployment.config)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_existing_api_user_leaves_orphaned_registration() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V3);

    deployment
        .admin()
        .await
        .create_user(
            "ogreeacme",
            &UserSpec {
                user: "ogreeacmeAdmin".to_string(),
                password: "stale".to_string(),
                roles: vec![RoleGrant::new(Role::ReadWrite, "ogreeacme")],
            },
        )
        .await
        .unwrap();

    let err = provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap_err();

    assert_eq!(err.step, Step::IssueCredential);
    assert!(err.registered);
    assert!(matches!(err.source, Error::CredentialConflict { .. }));
    assert!(err.to_string().contains("registry record now exists"));

    let admin = deployment.admin().await;
    assert_eq!(
        list_tenants(&admin, &deployment.config).await.unwrap(),
        vec!["acme".to_string()]
    );
}

#[tokio::test]
async fn test_default_manager_requires_opt_in() {
    let deployment = Deployment::bootstrapped().await;
    let request = ProvisionRequest::new(
        TenantName::parse("acme").unwrap(),
        Some("acme-api-secret".to_string()),
        SchemaVersion::V3,
        ManagerSeed::InsecureDefault,
    )
    .unwrap();

    let report = provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap();

    assert!(report.default_manager_credentials);
    assert_eq!(report.manager_email, "admin");

    let accounts = deployment
        .admin()
        .await
        .find_all(&report.database, "account")
        .await
        .unwrap();
    assert_eq!(accounts[0]["password"], json!("admin"));
}

#[tokio::test]
async fn test_tenant_database_cannot_shadow_reserved_databases() {
    let deployment = Deployment::bootstrapped().await;

    for (prefix, tenant) in [("ad", "min"), ("og", "ree")] {
        let mut config = deployment.config.clone();
        config.db_prefix = prefix.to_string();

        let request = deployment.request(tenant, SchemaVersion::V3);
        let err = provision_tenant(
            &deployment.connector,
            &config,
            &deployment.accounts.admin,
            &request,
        )
        .await
        .unwrap_err();

        assert_eq!(err.step, Step::RegisterTenant);
        assert!(!err.registered);
        assert!(matches!(err.source, Error::InvalidTenantName(_)));
    }

    let admin = deployment.admin().await;
    assert!(
        list_tenants(&admin, &deployment.config)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        admin
            .find_all(&deployment.config.admin_db, "domain")
            .await
            .unwrap()
            .is_empty()
    );
    let users = admin.list_users(&deployment.config.admin_db).await.unwrap();
    assert_eq!(users.len(), 3);
}

#[tokio::test]
async fn test_case_variant_of_registered_tenant_is_refused() {
    let deployment = Deployment::bootstrapped().await;
    let request = deployment.request("acme", SchemaVersion::V3);
    provision_tenant(
        &deployment.connector,
        &deployment.config,
        &deployment.accounts.admin,
        &request,
    )
    .await
    .unwrap();

    assert!(matches!(
        TenantName::parse("Acme"),
        Err(Error::InvalidTenantName(_))
    ));

    let admin = deployment.admin().await;
    assert_eq!(
        list_tenants(&admin, &deployment.config).await.unwrap(),
        vec!["acme".to_string()]
    );
}

#[tokio::test]
async fn test_partially_bootstrapped_deployment_is_reported() {
    let deployment = Deployment::new();

    let open = deployment
        .connector
        .connect(None, &deployment.config.admin_db)
        .await
        .unwrap();
    open.create_user(
        &deployment.config.admin_db,
        &UserSpec {
            user: "admin".to_string(),
            password: "admin-secret".to_string(),
            roles: vec![
                RoleGrant::new(Role::UserAdminAnyDatabase, "admin"),
                RoleGrant::new(Role::ReadWriteAnyDatabase, "admin"),
            ],
        },
    )
    .await
    .unwrap();

    let outcome = bootstrap(&deployment.connector, &deployment.config, &deployment.accounts)
        .await
        .unwrap();

    assert!(!outcome.accounts_created);
    assert_eq!(
        outcome.missing_accounts,
        vec!["super".to_string(), "guard".to_string()]
    );

    let admin = deployment.admin().await;
    let users = admin.list_users(&deployment.config.admin_db).await.unwrap();
    assert_eq!(users.len(), 1);
    assert!(
        list_tenants(&admin, &deployment.config)
            .await
            .unwrap()
            .is_empty()
    );
}
