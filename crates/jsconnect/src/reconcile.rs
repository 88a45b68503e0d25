//! Username Reconciliation
//!
//! Maps an identity onto a forum username. A linked account keeps the name
//! the forum already has. A new account gets the normalized proposed name,
//! suffixed `1`, `2`, ... until the forum reports the name as free.
//!
//! Probing is sequential and not atomic with account creation on the forum:
//! two concurrent sign-ups can both see the same name as free.

use crate::config::UsernamePolicy;
use crate::directory::{DirectoryResult, UserDirectory, UserSelector};
use crate::normalize::normalize;
use crate::DirectoryError;
use std::sync::Arc;

/// Resolves forum usernames against a directory
pub struct UsernameResolver {
    directory: Arc<dyn UserDirectory>,
    policy: UsernamePolicy,
}

impl UsernameResolver {
    pub fn new(directory: Arc<dyn UserDirectory>, policy: UsernamePolicy) -> Self {
        Self { directory, policy }
    }

    /// Resolves the username of the identity with `unique_id`
    pub async fn resolve_username(&self, unique_id: &str, full_name: &str) -> DirectoryResult<String> {
        self.resolve(&UserSelector::Id(unique_id.to_string()), full_name).await
    }

    /// Resolves the username of the account linked through `link`
    pub async fn resolve(&self, link: &UserSelector, full_name: &str) -> DirectoryResult<String> {
        if let Some(existing) = self.directory.find_user(link).await? {
            tracing::debug!(%link, name = %existing.profile.name, "Linked forum account found");
            return Ok(existing.profile.name);
        }

        let name = normalize(full_name, self.policy.allow_whitespace, self.policy.allow_accents);
        if name.is_empty() {
            return Err(DirectoryError::InvalidArgument(
                "the proposed user name is empty".to_string(),
            ));
        }

        if self.policy.allow_duplicates {
            return Ok(name);
        }

        self.first_free_name(&name).await
    }

    async fn first_free_name(&self, name: &str) -> DirectoryResult<String> {
        let mut candidate = name.to_string();
        let mut suffix: u64 = 0;

        loop {
            let probe = UserSelector::Name(candidate.clone());
            if self.directory.find_user(&probe).await?.is_none() {
                tracing::debug!(name = %candidate, probes = suffix + 1, "Free forum username found");
                return Ok(candidate);
            }

            suffix += 1;
            candidate = format!("{}{}", name, suffix);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryDirectory, RemoteUser};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    fn resolver(users: Vec<RemoteUser>, policy: UsernamePolicy) -> UsernameResolver {
        UsernameResolver::new(Arc::new(InMemoryDirectory::with_users(users)), policy)
    }

    fn strict() -> UsernamePolicy {
        UsernamePolicy::default()
    }

    #[tokio::test]
    async fn test_existing_account_keeps_name() {
        let policies = [
            strict(),
            UsernamePolicy { allow_whitespace: true, allow_accents: true, allow_duplicates: true },
        ];

        for policy in policies {
            let resolver = resolver(vec![RemoteUser::new(4, "PetrSvihlik")], policy);
            let name = resolver.resolve_username("4", "PetrSvihlik").await.unwrap();
            assert_eq!(name, "PetrSvihlik");
        }
    }

    #[tokio::test]
    async fn test_existing_name_is_not_renormalized() {
        let resolver = resolver(vec![RemoteUser::new(7, "Jméno Příjmení")], strict());
        let name = resolver.resolve_username("7", "Someone Else").await.unwrap();
        assert_eq!(name, "Jméno Příjmení");
    }

    #[tokio::test]
    async fn test_taken_name_gets_suffix() {
        let resolver = resolver(vec![RemoteUser::new(12, "JanLenoch")], strict());
        let name = resolver.resolve_username("21", "JanLenoch").await.unwrap();
        assert_eq!(name, "JanLenoch1");
    }

    #[tokio::test]
    async fn test_first_free_suffix_wins() {
        let resolver = resolver(
            vec![
                RemoteUser::new(1, "JanLenoch"),
                RemoteUser::new(2, "JanLenoch1"),
                RemoteUser::new(3, "JanLenoch2"),
                RemoteUser::new(4, "JanLenoch4"),
            ],
            strict(),
        );
        let name = resolver.resolve_username("21", "Jan Lenoch").await.unwrap();
        assert_eq!(name, "JanLenoch3");
    }

    #[tokio::test]
    async fn test_new_name_is_normalized() {
        let resolver = resolver(vec![], strict());
        let name = resolver.resolve_username("99", "Jméno Příjmení 01").await.unwrap();
        assert_eq!(name, "JmenoPrijmeni01");
    }

    #[tokio::test]
    async fn test_duplicates_allowed_skips_probe() {
        let policy = UsernamePolicy { allow_duplicates: true, ..strict() };
        let resolver = resolver(vec![RemoteUser::new(12, "JanLenoch")], policy);
        let name = resolver.resolve_username("21", "Jan Lenoch").await.unwrap();
        assert_eq!(name, "JanLenoch");
    }

    #[tokio::test]
    async fn test_link_by_email() {
        let resolver = resolver(
            vec![RemoteUser::new(12, "JanLenoch").with_email("jan@example.com")],
            strict(),
        );
        let link = UserSelector::Email("jan@example.com".into());
        assert_eq!(resolver.resolve(&link, "Jan L.").await.unwrap(), "JanLenoch");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let resolver = resolver(vec![], strict());
        let result = resolver.resolve_username("99", "   ").await;
        assert!(matches!(result, Err(DirectoryError::InvalidArgument(_))));
    }

    /// Records probes and fails once a given number of lookups happened
    struct FlakyDirectory {
        inner: InMemoryDirectory,
        fail_after: usize,
        probes: Mutex<Vec<UserSelector>>,
    }

    #[async_trait]
    impl UserDirectory for FlakyDirectory {
        async fn find_user(&self, selector: &UserSelector) -> DirectoryResult<Option<RemoteUser>> {
            let count = {
                let mut probes = self.probes.lock();
                probes.push(selector.clone());
                probes.len()
            };
            if count > self.fail_after {
                return Err(DirectoryError::InvalidResponse("connection reset".into()));
            }
            self.inner.find_user(selector).await
        }
    }

    #[tokio::test]
    async fn test_probe_order_and_failure_propagates() {
        let directory = Arc::new(FlakyDirectory {
            inner: InMemoryDirectory::with_users(vec![
                RemoteUser::new(1, "Ann"),
                RemoteUser::new(2, "Ann1"),
            ]),
            fail_after: 3,
            probes: Mutex::new(Vec::new()),
        });
        let resolver = UsernameResolver::new(directory.clone(), strict());

        let result = resolver.resolve_username("9", "Ann").await;
        assert!(matches!(result, Err(DirectoryError::InvalidResponse(_))));

        let probes = directory.probes.lock().clone();
        assert_eq!(
            probes,
            vec![
                UserSelector::Id("9".into()),
                UserSelector::Name("Ann".into()),
                UserSelector::Name("Ann1".into()),
                UserSelector::Name("Ann2".into()),
            ]
        );
    }
}
