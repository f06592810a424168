//! User handler against the in-memory directory

mod common;

use adldap_directory::test_utils::RecordedCall;
use adldap_directory::{AccountControl, DirectoryError, Modification, encode_password};
use adldap_resources::{ResourceError, UserConfig, UserService};

use common::{GADGETS, WIDGETS, memory_context_with_ous};

const ALICE: &str = "CN=alice,OU=Widgets,DC=example,DC=com";

fn alice() -> UserConfig {
    UserConfig::new("alice", "Secret123!", WIDGETS)
}

#[tokio::test]
async fn create_follows_disabled_password_enable_order() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);

    require_ok!(users.create(&alice()).await);

    let writes: Vec<RecordedCall> = directory
        .calls()
        .await
        .into_iter()
        .filter(RecordedCall::is_write)
        .collect();
    assert_eq!(writes.len(), 3, "{writes:#?}");

    let RecordedCall::Add { attributes, .. } = &writes[0] else {
        panic!("expected add first, got {:?}", writes[0]);
    };
    let uac = attributes
        .iter()
        .find(|(name, _)| name == "userAccountControl")
        .map(|(_, values)| values[0].clone());
    assert_eq!(uac, Some(b"514".to_vec()));
    assert!(
        attributes
            .iter()
            .any(|(name, values)| name == "accountExpires" && values[0] == b"0")
    );

    assert_eq!(
        writes[1],
        RecordedCall::Modify {
            dn: ALICE.to_string(),
            changes: vec![Modification::Replace(
                "unicodePwd".to_string(),
                vec![encode_password("Secret123!")]
            )],
        }
    );
    assert_eq!(
        directory.values(ALICE, "userAccountControl").await,
        vec!["512".to_string()]
    );
}

#[tokio::test]
async fn create_disabled_with_flags_and_attributes() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);

    let mut config = alice();
    config.name = Some("Alice Liddell".to_string());
    config.display_name = Some("Alice L.".to_string());
    config.user_principal_name = Some("alice@example.com".to_string());
    config.enabled = false;
    config.password_never_expires = true;
    config.service_principal_names = vec!["HTTP/alice.example.com".to_string()];
    config
        .attributes
        .insert("department".to_string(), vec!["R&D".to_string()]);

    let state = require_ok!(users.create(&config).await);
    assert_eq!(
        state.distinguished_name,
        "CN=Alice Liddell,OU=Widgets,DC=example,DC=com"
    );
    assert_eq!(state.name, "Alice Liddell");
    assert!(!state.enabled);
    assert!(state.password_never_expires);
    assert_eq!(state.display_name.as_deref(), Some("Alice L."));
    assert_eq!(state.user_principal_name.as_deref(), Some("alice@example.com"));
    assert_eq!(state.service_principal_names, vec!["HTTP/alice.example.com"]);
    assert_eq!(state.attributes["department"], vec!["R&D".to_string()]);

    let uac = directory
        .values(
            "CN=Alice Liddell,OU=Widgets,DC=example,DC=com",
            "userAccountControl",
        )
        .await;
    let flags = AccountControl::parse(&uac[0]).unwrap();
    assert!(flags.contains(AccountControl::ACCOUNTDISABLE | AccountControl::DONT_EXPIRE_PASSWORD));
}

#[tokio::test]
async fn create_existing_account_fails() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    require_ok!(users.create(&alice()).await);

    let mut again = alice();
    again.container = GADGETS.to_string();
    let err = users.create(&again).await.unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Directory(DirectoryError::AlreadyExists { .. })
    ));
    assert!(!directory.contains("CN=alice,OU=Gadgets,DC=example,DC=com").await);
}

#[tokio::test]
async fn create_in_missing_container_fails() {
    let (_directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);

    let mut config = alice();
    config.container = "OU=Missing,DC=example,DC=com".to_string();
    let err = users.create(&config).await.unwrap_err();
    assert!(matches!(
        err,
        ResourceError::Directory(DirectoryError::ContainerNotFound { .. })
    ));
}

#[tokio::test]
async fn create_validates_input() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);

    let mut no_password = alice();
    no_password.password = String::new();
    assert!(matches!(
        users.create(&no_password).await,
        Err(ResourceError::Validation(_))
    ));

    let mut bad_spn = alice();
    bad_spn.service_principal_names = vec!["alice".to_string()];
    assert!(matches!(
        users.create(&bad_spn).await,
        Err(ResourceError::Validation(_))
    ));
    assert_eq!(directory.write_count().await, 0);
}

#[tokio::test]
async fn read_reflects_out_of_band_changes() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    require_ok!(users.create(&alice()).await);

    directory
        .set_values(ALICE, "userAccountControl", &["66050"])
        .await;
    let state = require_some!(users.read("alice").await.unwrap());
    assert!(!state.enabled);
    assert!(state.password_never_expires);
    assert_eq!(state.container, WIDGETS);

    directory.remove(ALICE).await;
    assert!(users.read("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn update_renames_and_resets_password_only_when_changed() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    let previous = alice();
    require_ok!(users.create(&previous).await);

    let mut desired = previous.clone();
    desired.name = Some("Alice Liddell".to_string());
    directory.reset_calls().await;
    let state = require_ok!(users.update("alice", &previous, &desired).await);
    assert_eq!(
        state.distinguished_name,
        "CN=Alice Liddell,OU=Widgets,DC=example,DC=com"
    );
    let password_writes = directory
        .calls()
        .await
        .iter()
        .filter(|c| matches!(c, RecordedCall::Modify { changes, .. } if changes.iter().any(|m| m.attribute() == "unicodePwd")))
        .count();
    assert_eq!(password_writes, 0);

    let mut rotated = desired.clone();
    rotated.password = "Another456!".to_string();
    directory.reset_calls().await;
    require_ok!(users.update("alice", &desired, &rotated).await);
    assert_eq!(
        directory
            .last_modification("CN=Alice Liddell,OU=Widgets,DC=example,DC=com")
            .await,
        vec![Modification::Replace(
            "unicodePwd".to_string(),
            vec![encode_password("Another456!")]
        )]
    );
}

#[tokio::test]
async fn update_is_idempotent() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    let mut config = alice();
    config.display_name = Some("Alice".to_string());
    config.service_principal_names = vec!["HTTP/alice.example.com".to_string()];
    require_ok!(users.create(&config).await);

    directory.reset_calls().await;
    require_ok!(users.update("alice", &config, &config).await);
    assert_eq!(directory.write_count().await, 0);
}

#[tokio::test]
async fn unchanged_update_keeps_names_declared_as_attributes() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    let mut config = alice();
    config
        .attributes
        .insert("displayName".to_string(), vec!["Alice A".to_string()]);
    config.attributes.insert(
        "userPrincipalName".to_string(),
        vec!["alice@example.com".to_string()],
    );
    require_ok!(users.create(&config).await);
    assert_eq!(
        directory.values(ALICE, "displayName").await,
        vec!["Alice A".to_string()]
    );

    directory.reset_calls().await;
    let state = require_ok!(users.update("alice", &config, &config).await);
    assert_eq!(directory.write_count().await, 0);
    assert_eq!(state.display_name.as_deref(), Some("Alice A"));
    assert_eq!(
        directory.values(ALICE, "userPrincipalName").await,
        vec!["alice@example.com".to_string()]
    );
}

#[tokio::test]
async fn update_toggles_flags_and_reconciles_spns() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    let mut previous = alice();
    previous.service_principal_names = vec![
        "HTTP/a.example.com".to_string(),
        "HTTP/b.example.com".to_string(),
    ];
    require_ok!(users.create(&previous).await);
    // managed by a separate service-principal resource
    directory
        .set_values(
            ALICE,
            "servicePrincipalName",
            &["HTTP/a.example.com", "HTTP/b.example.com", "HTTP/other.example.com"],
        )
        .await;

    let mut desired = previous.clone();
    desired.enabled = false;
    desired.password_never_expires = true;
    desired.service_principal_names = vec![
        "HTTP/b.example.com".to_string(),
        "HTTP/c.example.com".to_string(),
    ];
    let state = require_ok!(users.update("alice", &previous, &desired).await);

    assert!(!state.enabled);
    assert!(state.password_never_expires);
    let mut spns = state.service_principal_names.clone();
    spns.sort();
    assert_eq!(
        spns,
        vec![
            "HTTP/b.example.com".to_string(),
            "HTTP/c.example.com".to_string(),
            "HTTP/other.example.com".to_string(),
        ]
    );
}

#[tokio::test]
async fn update_cannot_change_account_name() {
    let (_directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    let previous = alice();
    require_ok!(users.create(&previous).await);

    let mut desired = previous.clone();
    desired.sam_account_name = "bob".to_string();
    assert!(matches!(
        users.update("alice", &previous, &desired).await,
        Err(ResourceError::Validation(_))
    ));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (directory, ctx) = memory_context_with_ous().await;
    let users = UserService::new(ctx);
    require_ok!(users.create(&alice()).await);

    users.delete("alice").await.unwrap();
    assert!(!directory.contains(ALICE).await);
    users.delete("alice").await.unwrap();
}
