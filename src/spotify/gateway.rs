//! Rate-limited access to the catalog.
//!
//! Every logical request goes through [`Gateway::call`] (or [`Gateway::send`],
//! which adds credential refresh on top):
//!
//! ```text
//! Pending ─► throttle ─► request ─┬─► Done
//!    ▲                            ├─► 429 ─► backoff (hint × attempt) ─► Pending
//!    │                            ├─► 429 past the ceiling ─► Exhausted
//!    └── refresh (send only) ◄────┼─► 401 ─► CredentialExpired
//!                                 └─► other ─► error
//! ```
//!
//! Waits are plain `tokio::time::sleep` calls. The job issues one request at a
//! time because the quota is the bottleneck, not latency.

use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

use super::{
    catalog::{Catalog, CatalogError},
    ops::Operation,
};
use crate::{Res, info, warning};

/// Pacing and retry limits applied to every logical request.
///
/// The defaults pause 500 ms before each request, allow three rate-limit
/// retries and refuse to wait out hints above two minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed pause before every physical request.
    pub throttle: Duration,
    /// Rate-limit retries allowed per logical request.
    pub max_retries: u32,
    /// Hint used when a 429 response carries no `Retry-After` header.
    pub default_retry_after: u64,
    /// Hints above this many seconds are not waited out.
    pub max_retry_after: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(500),
            max_retries: 3,
            default_retry_after: 1,
            max_retry_after: 120,
        }
    }
}

impl RetryPolicy {
    /// Linear backoff: `hint × attempt`, attempts counted from 1.
    ///
    /// # Arguments
    ///
    /// * `retry_after` - Server hint in seconds, [`RetryPolicy::default_retry_after`]
    ///   when absent
    /// * `attempt` - Number of the retry about to be made
    ///
    /// # Example
    ///
    /// ```
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.backoff(Some(2), 3), Duration::from_secs(6));
    /// assert_eq!(policy.backoff(None, 2), Duration::from_secs(2));
    /// ```
    pub fn backoff(&self, retry_after: Option<u64>, attempt: u32) -> Duration {
        let hint = retry_after.unwrap_or(self.default_retry_after);
        Duration::from_secs(hint.saturating_mul(u64::from(attempt)))
    }
}

/// Result of a logical request that did not fail outright.
///
/// `Exhausted` is deliberately not an error: callers decide per stage whether
/// an abandoned request means "skip" or "keep".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Exhausted { attempts: u32 },
}

impl<T> Outcome<T> {
    /// The value of a completed request, `None` when it was abandoned.
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Exhausted { .. } => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Outcome::Exhausted { .. })
    }
}

/// Failure of a logical request that no retry can fix.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("access token expired")]
    CredentialExpired,
    #[error("cannot refresh access token: {0}")]
    Refresh(String),
    #[error(transparent)]
    Catalog(CatalogError),
}

/// Source of the bearer token used by the gateway.
#[allow(async_fn_in_trait)]
pub trait CredentialStore {
    /// Token attached to the next request.
    fn access_token(&self) -> String;

    /// Obtains a new access token and returns it. Subsequent calls to
    /// [`CredentialStore::access_token`] must return the new value.
    async fn refresh(&mut self) -> Res<String>;
}

/// Single entry point for catalog traffic.
///
/// Owns the catalog client, the credential store and the retry policy. All
/// pipeline stages borrow the same gateway, so requests of the whole job are
/// paced by one throttle.
pub struct Gateway<C, S> {
    catalog: C,
    store: S,
    policy: RetryPolicy,
}

impl<C: Catalog, S: CredentialStore> Gateway<C, S> {
    /// Creates a gateway over `catalog`, authenticating with the tokens
    /// handed out by `store`.
    ///
    /// # Example
    ///
    /// ```
    /// let mut gateway = Gateway::new(
    ///     SpotifyCatalog::new(config::spotify_apiurl()),
    ///     token_manager,
    ///     RetryPolicy::default(),
    /// );
    /// let user = gateway.send(&CurrentUser).await?;
    /// ```
    pub fn new(catalog: C, store: S, policy: RetryPolicy) -> Self {
        Self {
            catalog,
            store,
            policy,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends one logical request with throttling and rate-limit retries.
    ///
    /// A 401 is not retried here; it surfaces as
    /// [`GatewayError::CredentialExpired`] so the caller can refresh and
    /// resubmit the same operation.
    ///
    /// # Returns
    ///
    /// - `Ok(Outcome::Done(value))` once a request succeeds
    /// - `Ok(Outcome::Exhausted { .. })` after more than
    ///   [`RetryPolicy::max_retries`] rate limits, or right away when the hint
    ///   exceeds [`RetryPolicy::max_retry_after`]
    ///
    /// # Errors
    ///
    /// [`GatewayError::CredentialExpired`] on a 401 and
    /// [`GatewayError::Catalog`] for every other failed request.
    pub async fn call<O: Operation<C>>(&self, op: &O) -> Result<Outcome<O::Output>, GatewayError> {
        let token = self.store.access_token();
        let max = self.policy.max_retries;
        let mut retries: u32 = 0;

        loop {
            sleep(self.policy.throttle).await;

            match op.send(&self.catalog, &token).await {
                Ok(value) => return Ok(Outcome::Done(value)),
                Err(CatalogError::RateLimited { retry_after }) => {
                    retries += 1;
                    if retries > max {
                        warning!(
                            "Maximum retries ({}) exceeded for {}. Skipping...",
                            max,
                            op.describe()
                        );
                        return Ok(Outcome::Exhausted { attempts: retries });
                    }

                    let hint = retry_after.unwrap_or(self.policy.default_retry_after);
                    if hint > self.policy.max_retry_after {
                        warning!(
                            "Retry after has reached an abnormal high of {} seconds for {}. Skipping...",
                            hint,
                            op.describe()
                        );
                        return Ok(Outcome::Exhausted { attempts: retries });
                    }

                    let backoff = self.policy.backoff(retry_after, retries);
                    warning!(
                        "Rate limit exceeded (attempt {}/{}). Retrying after {} seconds...",
                        retries,
                        max,
                        backoff.as_secs()
                    );
                    sleep(backoff).await;
                }
                Err(CatalogError::Unauthorized) => return Err(GatewayError::CredentialExpired),
                Err(e) => return Err(GatewayError::Catalog(e)),
            }
        }
    }

    /// Like [`Gateway::call`], but answers an expired credential with one
    /// refresh and exactly one resubmission of the same operation. The
    /// refresh does not count against the retry ceiling.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Refresh`] when the store cannot obtain a new token,
    /// [`GatewayError::CredentialExpired`] when the fresh token is rejected
    /// too, and otherwise whatever [`Gateway::call`] reports.
    pub async fn send<O: Operation<C>>(
        &mut self,
        op: &O,
    ) -> Result<Outcome<O::Output>, GatewayError> {
        match self.call(op).await {
            Err(GatewayError::CredentialExpired) => {
                info!("Access token expired. Refreshing token...");
                self.store
                    .refresh()
                    .await
                    .map_err(|e| GatewayError::Refresh(e.to_string()))?;
                info!("Token refreshed. Retrying...");
                self.call(op).await
            }
            other => other,
        }
    }
}
