//! Live-directory tests
//!
//! 需要设置 ADLDAP_URL / ADLDAP_BIND_ACCOUNT / ADLDAP_BIND_PASSWORD，
//! 可选 ADLDAP_SEARCH_BASE 与 ADLDAP_TEST_OU（默认 OU=adldap-tests,<search base>）。
//!
//! Run with `cargo test -p adldap-resources --test live_test -- --ignored`.

mod common;

use adldap_resources::{
    OrganizationalUnitConfig, OrganizationalUnitService, ServicePrincipalConfig,
    ServicePrincipalService, UserConfig, UserService,
};

use common::{generate_test_name, live_context};

#[tokio::test]
#[ignore = "integration test: requires a reachable directory and ADLDAP_* credentials"]
async fn live_user_lifecycle() {
    skip_if_no_credentials!("ADLDAP_URL", "ADLDAP_BIND_ACCOUNT", "ADLDAP_BIND_PASSWORD");
    let ctx = require_some!(live_context().await, "failed to connect to directory");

    let test_ou = std::env::var("ADLDAP_TEST_OU")
        .unwrap_or_else(|_| format!("OU=adldap-tests,{}", ctx.client().search_base()));
    let ous = OrganizationalUnitService::new(ctx.clone());
    if ous.read(&test_ou).await.ok().flatten().is_none() {
        require_ok!(
            ous.create(&OrganizationalUnitConfig::new(&test_ou).with_create_parents(true))
                .await
        );
    }

    let users = UserService::new(ctx.clone());
    let name = generate_test_name();
    let config = UserConfig::new(&name, "Adldap-Test-9f3!xQ", &test_ou);
    let state = require_ok!(users.create(&config).await);
    assert!(state.enabled);

    let spns = ServicePrincipalService::new(ctx);
    let spn = format!("HTTP/{name}.example.com");
    let spn_state = require_ok!(spns.create(&ServicePrincipalConfig::new(&name, &spn)).await);
    assert!(spns.read(&spn_state.id).await.ok().flatten().is_some());

    let _ = spns.delete(&spn_state.id).await;
    require_ok!(users.delete(&name).await);
    assert!(users.read(&name).await.ok().flatten().is_none());
}

#[tokio::test]
#[ignore = "integration test: requires a reachable directory and ADLDAP_* credentials"]
async fn live_nested_ou_lifecycle() {
    skip_if_no_credentials!("ADLDAP_URL", "ADLDAP_BIND_ACCOUNT", "ADLDAP_BIND_PASSWORD");
    let ctx = require_some!(live_context().await, "failed to connect to directory");

    let base = ctx.client().search_base().to_string();
    let parent = format!("OU={},{base}", generate_test_name());
    let child = format!("OU=child,{parent}");

    let ous = OrganizationalUnitService::new(ctx);
    require_ok!(
        ous.create(&OrganizationalUnitConfig::new(&child).with_create_parents(true))
            .await
    );
    assert!(ous.delete(&parent).await.is_err(), "non-empty OU must not be deleted");

    require_ok!(ous.delete(&child).await);
    require_ok!(ous.delete(&parent).await);
}
