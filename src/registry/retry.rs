//! Retrying registry wrapper
//!
//! Retries network errors, timeouts and rate limiting with exponential
//! backoff (max 3 retries). "Not found" and malformed responses fail at
//! once.

use super::RegistryClient;
use crate::domain::{Dependency, Release};
use crate::error::RegistryError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// Wraps a registry and retries its transient failures
pub struct RetryingRegistry<R> {
    inner: R,
    max_retries: u32,
    base_delay: Duration,
}

impl<R: RegistryClient> RetryingRegistry<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(BASE_DELAY_MS),
        }
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the first backoff delay; later delays double
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    async fn retry<T, F, Fut>(&self, package: &str, mut call: F) -> Result<T, RegistryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RegistryError>>,
    {
        let mut delay = self.base_delay;
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    debug!(package = %package, attempt, "retrying after registry error: {}", e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl<R: RegistryClient> RegistryClient for RetryingRegistry<R> {
    fn registry_name(&self) -> &'static str {
        self.inner.registry_name()
    }

    async fn list_releases(&self, dependency: &Dependency) -> Result<Vec<Release>, RegistryError> {
        self.retry(&dependency.name, || self.inner.list_releases(dependency))
            .await
    }

    async fn release_metadata(
        &self,
        dependency: &Dependency,
        version: &str,
    ) -> Result<Option<Release>, RegistryError> {
        self.retry(&dependency.name, || {
            self.inner.release_metadata(dependency, version)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PackageManager;
    use crate::registry::MockRegistryClient;
    use mockall::Sequence;

    fn lodash() -> Dependency {
        Dependency::new("lodash", Some("4.17.20"), PackageManager::Npm)
    }

    fn fast<R: RegistryClient>(inner: R) -> RetryingRegistry<R> {
        RetryingRegistry::new(inner).with_base_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_transient_errors() {
        let mut mock = MockRegistryClient::new();
        let mut seq = Sequence::new();
        mock.expect_list_releases()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(RegistryError::timeout("lodash", "npm")));
        mock.expect_list_releases()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![Release::new("4.17.21")]));

        let releases = fast(mock).list_releases(&lodash()).await.unwrap();
        assert_eq!(releases, vec![Release::new("4.17.21")]);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let mut mock = MockRegistryClient::new();
        mock.expect_list_releases()
            .times(1)
            .returning(|_| Err(RegistryError::package_not_found("lodash", "npm")));

        let err = fast(mock).list_releases(&lodash()).await.unwrap_err();
        assert!(matches!(err, RegistryError::PackageNotFound { .. }));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let mut mock = MockRegistryClient::new();
        mock.expect_release_metadata()
            .times(3)
            .returning(|_, _| Err(RegistryError::rate_limit_exceeded("npm")));

        let err = fast(mock)
            .with_max_retries(2)
            .release_metadata(&lodash(), "4.17.21")
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::RateLimitExceeded { .. }));
    }

    #[test]
    fn test_default_constants() {
        assert_eq!(MAX_RETRIES, 3);
        assert_eq!(BASE_DELAY_MS, 100);
    }
}
