//! Organizational units.

use crate::cache::NO_ATTRIBUTES;
use crate::dn::DistinguishedName;
use crate::entry::Entry;
use crate::error::{DirectoryError, Result};
use crate::types::{SearchRequest, SearchScope};

/// An `organizationalUnit` object.
#[derive(Debug, Clone)]
pub struct OrganizationalUnit {
    entry: Entry,
}

impl OrganizationalUnit {
    pub fn new(entry: Entry) -> Self {
        Self { entry }
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn entry_mut(&mut self) -> &mut Entry {
        &mut self.entry
    }

    pub fn into_entry(self) -> Entry {
        self.entry
    }

    pub fn dn(&self) -> &DistinguishedName {
        self.entry.dn()
    }

    /// Whether the unit has no children.
    ///
    /// A subtree search under the unit always returns the unit itself, so it is
    /// empty exactly when that search returns a single entry.
    pub async fn is_empty(&self) -> Result<bool> {
        let request = SearchRequest::new(
            self.dn().to_string(),
            SearchScope::Subtree,
            "(objectClass=*)",
            vec![NO_ATTRIBUTES.to_string()],
        );
        let entries = self.entry.client().connection().search(&request).await?;
        Ok(entries.len() == 1)
    }

    /// Delete the unit; fails with [`DirectoryError::NotEmpty`] while it has children.
    pub async fn delete(&self) -> Result<()> {
        if !self.is_empty().await? {
            log::warn!("Refusing to delete non-empty organizational unit \"{}\"", self.dn());
            return Err(DirectoryError::NotEmpty {
                dn: self.dn().to_string(),
            });
        }
        self.entry.delete().await
    }

    /// Move and/or rename to `new_dn`. The new parent must already exist; no
    /// ancestors are created.
    pub async fn rename(&mut self, new_dn: &DistinguishedName) -> Result<()> {
        if !new_dn.leaf_type_is("OU") {
            return Err(DirectoryError::UnexpectedObjectType {
                dn: new_dn.to_string(),
                expected: "OU".to_string(),
            });
        }
        self.entry.change_dn(new_dn).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DirectoryClient;
    use crate::test_utils::MemoryDirectory;

    const BASE: &str = "DC=example,DC=com";

    fn dn(s: &str) -> DistinguishedName {
        DistinguishedName::parse(s).unwrap()
    }

    async fn setup() -> (MemoryDirectory, DirectoryClient, OrganizationalUnit) {
        let directory = MemoryDirectory::new(BASE);
        let client = DirectoryClient::with_connection(directory.clone(), Some(BASE))
            .await
            .unwrap();
        let ou = client
            .create_organizational_unit(&dn("OU=Widgets,DC=example,DC=com"))
            .await
            .unwrap();
        (directory, client, ou)
    }

    #[tokio::test]
    async fn emptiness_counts_children() {
        let (directory, _client, ou) = setup().await;
        assert!(ou.is_empty().await.unwrap());

        directory
            .with_entry("CN=x,OU=Widgets,DC=example,DC=com", &["user"], &[])
            .await;
        assert!(!ou.is_empty().await.unwrap());
    }

    /// Answers every search with no entries.
    struct NoEntries;

    #[async_trait::async_trait]
    impl crate::traits::DirectoryConnection for NoEntries {
        async fn search(&self, _request: &SearchRequest) -> Result<Vec<crate::types::RawEntry>> {
            Ok(Vec::new())
        }
        async fn add(&self, _dn: &str, _attributes: &[(String, Vec<Vec<u8>>)]) -> Result<()> {
            Ok(())
        }
        async fn modify(&self, _dn: &str, _changes: &[crate::types::Modification]) -> Result<()> {
            Ok(())
        }
        async fn modify_dn(
            &self,
            _dn: &str,
            _new_rdn: &str,
            _delete_old_rdn: bool,
            _new_superior: Option<&str>,
        ) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _dn: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn only_a_single_self_entry_means_empty() {
        let client = DirectoryClient::with_connection(NoEntries, Some(BASE))
            .await
            .unwrap();
        let raw = crate::types::RawEntry {
            dn: "OU=Widgets,DC=example,DC=com".to_string(),
            attributes: std::collections::HashMap::new(),
        };
        let ou = OrganizationalUnit::new(Entry::from_search(client, raw, &[]).unwrap());

        assert!(!ou.is_empty().await.unwrap());
        let err = ou.delete().await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotEmpty { .. }));
    }

    #[tokio::test]
    async fn delete_guards_children() {
        let (directory, _client, ou) = setup().await;
        directory
            .with_entry("CN=x,OU=Widgets,DC=example,DC=com", &["user"], &[])
            .await;

        let err = ou.delete().await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotEmpty { .. }));

        directory.remove("CN=x,OU=Widgets,DC=example,DC=com").await;
        ou.delete().await.unwrap();
        assert!(!directory.contains("OU=Widgets,DC=example,DC=com").await);
    }

    #[tokio::test]
    async fn rename_requires_existing_parent() {
        let (_directory, _client, mut ou) = setup().await;
        let err = ou
            .rename(&dn("OU=Widgets,OU=Missing,DC=example,DC=com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::ContainerNotFound { .. }));

        ou.rename(&dn("OU=Sprockets,DC=example,DC=com")).await.unwrap();
        assert_eq!(ou.dn(), &dn("OU=Sprockets,DC=example,DC=com"));
    }

    #[tokio::test]
    async fn rename_moves_children_along() {
        let (directory, client, mut ou) = setup().await;
        client
            .create_organizational_unit(&dn("OU=Parent,DC=example,DC=com"))
            .await
            .unwrap();
        directory
            .with_entry("CN=x,OU=Widgets,DC=example,DC=com", &["user"], &[])
            .await;

        ou.rename(&dn("OU=Widgets,OU=Parent,DC=example,DC=com"))
            .await
            .unwrap();
        assert!(
            directory
                .contains("CN=x,OU=Widgets,OU=Parent,DC=example,DC=com")
                .await
        );
        assert!(!ou.is_empty().await.unwrap());
    }
}
