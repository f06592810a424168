//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::sync::Arc;

use adldap_directory::DirectoryClient;
use adldap_directory::test_utils::MemoryDirectory;
use adldap_resources::{ProviderConfig, ProviderContext};

pub const BASE: &str = "DC=example,DC=com";
pub const WIDGETS: &str = "OU=Widgets,DC=example,DC=com";
pub const GADGETS: &str = "OU=Gadgets,DC=example,DC=com";

/// 跳过测试的宏（当环境变量缺失时）
#[macro_export]
macro_rules! skip_if_no_credentials {
    ($($var:expr),+) => {
        $(
            if std::env::var($var).is_err() {
                eprintln!("跳过测试: 缺少环境变量 {}", $var);
                return;
            }
        )+
    };
}

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// In-memory directory holding `DC=example,DC=com` plus a context bound to it.
pub async fn memory_context() -> (MemoryDirectory, Arc<ProviderContext>) {
    let directory = MemoryDirectory::new(BASE);
    let client = DirectoryClient::with_connection(directory.clone(), Some(BASE))
        .await
        .unwrap();
    (directory, Arc::new(ProviderContext::new(client)))
}

/// Like [`memory_context`], with `OU=Widgets` and `OU=Gadgets` already present.
pub async fn memory_context_with_ous() -> (MemoryDirectory, Arc<ProviderContext>) {
    let (directory, ctx) = memory_context().await;
    directory
        .with_entry(WIDGETS, &["organizationalUnit"], &[])
        .await
        .with_entry(GADGETS, &["organizationalUnit"], &[])
        .await;
    (directory, ctx)
}

/// Live-directory context from the `ADLDAP_*` variables.
pub async fn live_context() -> Option<Arc<ProviderContext>> {
    let config = ProviderConfig::from_env().ok()?;
    let ctx = ProviderContext::connect(&config).await.ok()?;
    Some(Arc::new(ctx))
}

/// 生成唯一的测试对象名称
pub fn generate_test_name() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("tst{}", &uuid.simple().to_string()[..8])
}
