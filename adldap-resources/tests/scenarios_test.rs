//! End-to-end flows through the handlers and the directory layer

mod common;

use adldap_directory::test_utils::RecordedCall;
use adldap_directory::{
    ANY_CLASS, AccountClass, DirectoryError, DistinguishedName, Modification, encode_password,
};
use adldap_resources::{
    OrganizationalUnitConfig, OrganizationalUnitService, ResourceError, ServicePrincipalConfig,
    ServicePrincipalService, UserConfig, UserService,
};

use common::{BASE, GADGETS, WIDGETS, memory_context, memory_context_with_ous};

fn dn(text: &str) -> DistinguishedName {
    DistinguishedName::parse(text).unwrap()
}

#[tokio::test]
async fn create_ou_under_search_base() {
    let (_directory, ctx) = memory_context().await;
    let service = OrganizationalUnitService::new(ctx.clone());

    let state = require_ok!(service.create(&OrganizationalUnitConfig::new(WIDGETS)).await);
    assert_eq!(state.id, WIDGETS);

    let entry = ctx
        .client()
        .get_object_by_dn(&dn(WIDGETS), "organizationalUnit", &[])
        .await
        .unwrap();
    assert_eq!(entry.parent_dn().unwrap(), dn(BASE));
}

#[tokio::test]
async fn create_enabled_user_with_password() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx.clone());

    let state = require_ok!(
        users
            .create(&UserConfig::new("alice", "Secret123!", WIDGETS))
            .await
    );
    assert!(state.enabled);
    assert_eq!(state.distinguished_name, "CN=alice,OU=Widgets,DC=example,DC=com");

    let mut alice = ctx
        .client()
        .get_account("alice", AccountClass::User)
        .await
        .unwrap();
    assert!(alice.is_enabled().await.unwrap());

    directory.reset_calls().await;
    alice.set_password("Secret123!").await.unwrap();

    let writes: Vec<RecordedCall> = directory
        .calls()
        .await
        .into_iter()
        .filter(RecordedCall::is_write)
        .collect();
    assert_eq!(writes.len(), 1);
    assert_eq!(
        directory
            .last_modification("CN=alice,OU=Widgets,DC=example,DC=com")
            .await,
        vec![Modification::Replace(
            "unicodePwd".to_string(),
            vec![encode_password("Secret123!")]
        )]
    );
    // "Secret123!" 加引号后按 UTF-16LE 编码
    assert_eq!(&encode_password("Secret123!")[..4], &[b'"', 0, b'S', 0]);
}

#[tokio::test]
async fn move_user_between_ous() {
    let (_directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx.clone());

    let previous = UserConfig::new("alice", "Secret123!", WIDGETS);
    require_ok!(users.create(&previous).await);

    let mut desired = previous.clone();
    desired.container = GADGETS.to_string();
    let state = require_ok!(users.update("alice", &previous, &desired).await);
    assert_eq!(state.container, GADGETS);

    let alice = ctx
        .client()
        .get_account("alice", AccountClass::User)
        .await
        .unwrap();
    assert_eq!(alice.entry().parent_dn().unwrap(), dn(GADGETS));

    let old = ctx
        .client()
        .get_object_by_dn(
            &dn("CN=alice,OU=Widgets,DC=example,DC=com"),
            ANY_CLASS,
            &[],
        )
        .await;
    assert!(matches!(old, Err(DirectoryError::NotFound { .. })));
}

#[tokio::test]
async fn non_empty_ou_is_not_deleted() {
    let (directory, ctx) = memory_context_with_ous().await;
    let ous = OrganizationalUnitService::new(ctx.clone());
    let users = UserService::new(ctx);

    require_ok!(
        users
            .create(&UserConfig::new("alice", "Secret123!", WIDGETS))
            .await
    );

    let err = ous.delete(WIDGETS).await.unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Directory(DirectoryError::NotEmpty { .. })
    ));
    assert!(directory.contains(WIDGETS).await);

    users.delete("alice").await.unwrap();
    ous.delete(WIDGETS).await.unwrap();
    assert!(!directory.contains(WIDGETS).await);
}

#[tokio::test]
async fn spn_added_once() {
    let (_directory, ctx) = memory_context_with_ous().await;
    require_ok!(
        UserService::new(ctx.clone())
            .create(&UserConfig::new("alice", "Secret123!", WIDGETS))
            .await
    );
    let spns = ServicePrincipalService::new(ctx.clone());
    let config = ServicePrincipalConfig::new("alice", "HTTP/alice.example.com");

    let state = require_ok!(spns.create(&config).await);
    assert_eq!(state.id, "HTTP/alice.example.com---alice");

    let mut alice = ctx
        .client()
        .get_account("alice", AccountClass::User)
        .await
        .unwrap();
    assert!(
        alice
            .has_service_principal("HTTP/alice.example.com")
            .await
            .unwrap()
    );

    let err = spns.create(&config).await.unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Directory(DirectoryError::AlreadyHasValue { .. })
    ));
}

// ===== Properties =====

#[tokio::test]
async fn same_attributes_written_once() {
    let (directory, ctx) = memory_context_with_ous().await;
    require_ok!(
        UserService::new(ctx.clone())
            .create(&UserConfig::new("alice", "Secret123!", WIDGETS))
            .await
    );
    let mut alice = ctx
        .client()
        .get_account("alice", AccountClass::User)
        .await
        .unwrap();

    let mut attributes = adldap_directory::AttributeMap::new();
    attributes.insert("description".into(), vec!["Widget engineer".into()]);

    directory.reset_calls().await;
    assert!(alice.entry_mut().update_attributes(&attributes).await.unwrap());
    assert!(!alice.entry_mut().update_attributes(&attributes).await.unwrap());
    assert_eq!(directory.write_count().await, 1);
}

#[tokio::test]
async fn duplicate_names_are_ambiguous() {
    let (directory, ctx) = memory_context_with_ous().await;
    directory
        .with_entry(
            "CN=dup,OU=Widgets,DC=example,DC=com",
            &["user"],
            &[("sAMAccountName", &["dup"])],
        )
        .await
        .with_entry(
            "CN=dup,OU=Gadgets,DC=example,DC=com",
            &["user"],
            &[("sAMAccountName", &["dup"])],
        )
        .await;

    let err = ctx.client().object_exists("dup", "user").await.unwrap_err();
    assert!(matches!(
        err,
        DirectoryError::AmbiguousResult { count: 2, .. }
    ));
}

#[tokio::test]
async fn ou_emptiness() {
    let (directory, ctx) = memory_context_with_ous().await;
    let ou = ctx
        .client()
        .get_organizational_unit(&dn(WIDGETS))
        .await
        .unwrap();
    assert!(ou.is_empty().await.unwrap());

    directory
        .with_entry("CN=x,OU=Widgets,DC=example,DC=com", &["user"], &[])
        .await;
    assert!(!ou.is_empty().await.unwrap());
}

#[tokio::test]
async fn removing_absent_spn_is_silent() {
    let (directory, ctx) = memory_context_with_ous().await;
    require_ok!(
        UserService::new(ctx.clone())
            .create(&UserConfig::new("alice", "Secret123!", WIDGETS))
            .await
    );
    let spns = ServicePrincipalService::new(ctx);

    directory.reset_calls().await;
    spns.delete("HTTP/nothing.example.com---alice").await.unwrap();
    assert_eq!(directory.write_count().await, 0);
}

#[tokio::test]
async fn recursive_ou_creation_stops_at_existing_ancestor() {
    let (directory, ctx) = memory_context_with_ous().await;
    let ous = OrganizationalUnitService::new(ctx);

    let deep = "OU=Team,OU=Platform,OU=Widgets,DC=example,DC=com";
    let err = ous
        .create(&OrganizationalUnitConfig::new(deep))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Directory(DirectoryError::ContainerNotFound { .. })
    ));

    directory.reset_calls().await;
    require_ok!(
        ous.create(&OrganizationalUnitConfig::new(deep).with_create_parents(true))
            .await
    );
    assert_eq!(
        directory.added_dns().await,
        vec![
            "OU=Platform,OU=Widgets,DC=example,DC=com".to_string(),
            deep.to_string()
        ]
    );
}
