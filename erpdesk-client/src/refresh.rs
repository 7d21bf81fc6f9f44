//! Single-flight token refresh.
//!
//! The coordinator is either idle or refreshing. The first caller that
//! finds it idle becomes the leader and performs the exchange; callers
//! arriving while a refresh is in flight queue a oneshot and wait. When
//! the exchange settles the leader applies the outcome to the session and
//! then releases the queue in arrival order, so every waiter gets the same
//! result. The phase lock is never held across an await.

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::config::RefreshFailurePolicy;
use shared::models::RefreshRequest;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::RefreshError;
use crate::public::TokenExchange;
use crate::session::SessionStore;

type Outcome = Result<String, RefreshError>;

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<Outcome>>,
    },
}

enum Role {
    Current(String),
    Leader,
    Waiter(oneshot::Receiver<Outcome>),
}

/// Ensures at most one refresh call is outstanding.
pub struct RefreshCoordinator {
    session: Arc<SessionStore>,
    exchange: Arc<dyn TokenExchange>,
    policy: RefreshFailurePolicy,
    phase: Mutex<Phase>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("policy", &self.policy)
            .field("refreshing", &self.is_refreshing())
            .field("queued", &self.queued())
            .finish_non_exhaustive()
    }
}

/// Resets the phase if the leader is dropped before it settles, so queued
/// callers are rejected instead of waiting forever.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("refresh abandoned before completion");
            self.coordinator.release(&Err(RefreshError::Abandoned));
        }
    }
}

impl RefreshCoordinator {
    pub fn new(
        session: Arc<SessionStore>,
        exchange: Arc<dyn TokenExchange>,
        policy: RefreshFailurePolicy,
    ) -> Self {
        Self {
            session,
            exchange,
            policy,
            phase: Mutex::new(Phase::Idle),
        }
    }

    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh is in flight.
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.phase(), Phase::Refreshing { .. })
    }

    /// Callers waiting on the in-flight refresh.
    #[must_use]
    pub fn queued(&self) -> usize {
        match &*self.phase() {
            Phase::Idle => 0,
            Phase::Refreshing { waiters } => waiters.len(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> RefreshFailurePolicy {
        self.policy
    }

    /// Obtain a fresh access token to replace `rejected`, the token the
    /// failed request was sent with.
    ///
    /// Waits for the running refresh and shares its outcome. When none is
    /// running and the session already holds a different token, a refresh
    /// settled after the request was sent and that token is returned as is.
    /// Otherwise a new refresh starts.
    ///
    /// # Errors
    /// The refresh failure, identical for the leader and every waiter.
    pub async fn refreshed_token(&self, rejected: Option<&str>) -> Result<String, RefreshError> {
        let role = {
            let mut phase = self.phase();
            if let Phase::Refreshing { waiters } = &mut *phase {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                debug!(waiters = waiters.len(), "queued behind in-flight refresh");
                Role::Waiter(rx)
            } else if let Some(current) = self
                .session
                .access_token()
                .filter(|current| Some(current.as_str()) != rejected)
            {
                debug!("token already rotated since the request was sent");
                Role::Current(current)
            } else {
                *phase = Phase::Refreshing {
                    waiters: Vec::new(),
                };
                Role::Leader
            }
        };

        match role {
            Role::Current(token) => Ok(token),
            Role::Waiter(rx) => rx.await.unwrap_or(Err(RefreshError::Abandoned)),
            Role::Leader => self.lead().await,
        }
    }

    async fn lead(&self) -> Outcome {
        let mut guard = LeaderGuard {
            coordinator: self,
            settled: false,
        };

        let outcome = self.perform().await;
        if let Err(error) = &outcome {
            self.on_failure(error);
        }

        guard.settled = true;
        self.release(&outcome);
        outcome
    }

    async fn perform(&self) -> Outcome {
        let (Some(refresh_token), Some(user_id)) =
            (self.session.refresh_token(), self.session.user_id())
        else {
            warn!("refresh needed but no refresh token or user id is stored");
            return Err(RefreshError::MissingCredentials);
        };

        info!(user_id = %user_id, "refreshing access token");
        let tokens = self
            .exchange
            .exchange(RefreshRequest {
                refresh_token,
                user_id,
            })
            .await?;

        if let Err(err) = self.session.rotate_tokens(&tokens) {
            warn!(error = %err, "refreshed tokens could not be persisted");
        }
        Ok(tokens.access_token)
    }

    fn on_failure(&self, error: &RefreshError) {
        match self.policy {
            RefreshFailurePolicy::Logout => {
                warn!(error = %error, policy = %self.policy, "refresh failed; clearing session");
                if let Err(err) = self.session.clear_session() {
                    warn!(error = %err, "failed to clear persisted session");
                }
            }
            RefreshFailurePolicy::Retain => {
                warn!(error = %error, policy = %self.policy, "refresh failed; keeping session");
            }
        }
    }

    /// Return to idle and hand `outcome` to every queued caller in arrival
    /// order.
    fn release(&self, outcome: &Outcome) {
        let waiters = match mem::take(&mut *self.phase()) {
            Phase::Idle => Vec::new(),
            Phase::Refreshing { waiters } => waiters,
        };

        debug!(waiters = waiters.len(), ok = outcome.is_ok(), "refresh settled");
        for waiter in waiters {
            // A waiter whose caller went away is skipped.
            let _ = waiter.send(outcome.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Credentials;
    use crate::storage::{CredentialStorage, MemoryStorage};
    use async_trait::async_trait;
    use serde_json::json;
    use shared::models::TokenPair;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Exchange that blocks until the test opens the gate.
    struct GatedExchange {
        calls: AtomicUsize,
        gate: Notify,
        outcome: Result<TokenPair, RefreshError>,
        seen: Mutex<Vec<RefreshRequest>>,
    }

    impl GatedExchange {
        fn new(outcome: Result<TokenPair, RefreshError>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Notify::new(),
                outcome,
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TokenExchange for GatedExchange {
        async fn exchange(&self, request: RefreshRequest) -> Result<TokenPair, RefreshError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request);
            self.gate.notified().await;
            self.outcome.clone()
        }
    }

    fn tokens(access: &str) -> TokenPair {
        TokenPair {
            access_token: access.to_string(),
            refresh_token: format!("{access}-refresh"),
        }
    }

    fn logged_in_session() -> Arc<SessionStore> {
        let session = SessionStore::restore(Arc::new(MemoryStorage::new()));
        session
            .set_session(Credentials {
                access_token: "expired".to_string(),
                refresh_token: "r1".to_string(),
                role: Some("admin".to_string()),
                location_id: Some("L1".to_string()),
                user_id: "u-7".to_string(),
            })
            .unwrap();
        Arc::new(session)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let session = logged_in_session();
        let exchange = GatedExchange::new(Ok(tokens("fresh")));
        let coordinator = Arc::new(RefreshCoordinator::new(
            session.clone(),
            exchange.clone(),
            RefreshFailurePolicy::Logout,
        ));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move { coordinator.refreshed_token(Some("expired")).await })
            })
            .collect();

        settle().await;
        assert!(coordinator.is_refreshing());
        assert_eq!(coordinator.queued(), 4);
        assert_eq!(exchange.calls(), 1);

        exchange.gate.notify_one();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("fresh".to_string()));
        }

        assert_eq!(exchange.calls(), 1);
        assert!(!coordinator.is_refreshing());
        assert_eq!(session.access_token().as_deref(), Some("fresh"));
        assert_eq!(session.refresh_token().as_deref(), Some("fresh-refresh"));
        assert_eq!(session.user_id().as_deref(), Some("u-7"));

        let seen = exchange.seen.lock().unwrap();
        assert_eq!(seen[0].refresh_token, "r1");
        assert_eq!(seen[0].user_id, "u-7");
    }

    #[tokio::test]
    async fn test_failure_rejects_every_caller_and_logs_out() {
        let session = logged_in_session();
        let rejected = RefreshError::Rejected {
            status: 401,
            data: json!({"message": "Invalid refresh token"}),
        };
        let exchange = GatedExchange::new(Err(rejected.clone()));
        let coordinator = Arc::new(RefreshCoordinator::new(
            session.clone(),
            exchange.clone(),
            RefreshFailurePolicy::Logout,
        ));
        let mut watcher = session.subscribe();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let coordinator = coordinator.clone();
                tokio::spawn(async move { coordinator.refreshed_token(Some("expired")).await })
            })
            .collect();

        settle().await;
        exchange.gate.notify_one();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err(rejected.clone()));
        }

        assert_eq!(exchange.calls(), 1);
        assert!(!session.is_authenticated());
        assert_eq!(session.refresh_token(), None);
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
    }

    #[tokio::test]
    async fn test_retain_policy_keeps_session() {
        let session = logged_in_session();
        let exchange = GatedExchange::new(Err(RefreshError::Transport("down".to_string())));
        let coordinator =
            RefreshCoordinator::new(session.clone(), exchange.clone(), RefreshFailurePolicy::Retain);

        exchange.gate.notify_one();
        let outcome = coordinator.refreshed_token(Some("expired")).await;

        assert_eq!(outcome, Err(RefreshError::Transport("down".to_string())));
        assert!(session.is_authenticated());
        assert_eq!(session.refresh_token().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_missing_credentials_skip_network() {
        let session = Arc::new(SessionStore::restore(Arc::new(MemoryStorage::new())));
        let exchange = GatedExchange::new(Ok(tokens("never")));
        let coordinator =
            RefreshCoordinator::new(session.clone(), exchange.clone(), RefreshFailurePolicy::Logout);

        let outcome = coordinator.refreshed_token(Some("expired")).await;

        assert_eq!(outcome, Err(RefreshError::MissingCredentials));
        assert_eq!(exchange.calls(), 0);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn test_missing_user_id_clears_partial_session() {
        let storage = Arc::new(MemoryStorage::new());
        storage.store("access_token", "expired").unwrap();
        storage.store("refresh_token", "r1").unwrap();
        let session = Arc::new(SessionStore::restore(storage.clone()));
        let exchange = GatedExchange::new(Ok(tokens("never")));
        let coordinator =
            RefreshCoordinator::new(session.clone(), exchange.clone(), RefreshFailurePolicy::Logout);

        assert_eq!(
            coordinator.refreshed_token(Some("expired")).await,
            Err(RefreshError::MissingCredentials)
        );
        assert_eq!(exchange.calls(), 0);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_new_cycle_after_settling() {
        let session = logged_in_session();
        let exchange = GatedExchange::new(Ok(tokens("fresh")));
        let coordinator =
            RefreshCoordinator::new(session, exchange.clone(), RefreshFailurePolicy::Logout);

        exchange.gate.notify_one();
        assert!(coordinator.refreshed_token(Some("expired")).await.is_ok());
        exchange.gate.notify_one();
        assert!(coordinator.refreshed_token(Some("fresh")).await.is_ok());

        assert_eq!(exchange.calls(), 2);
    }

    #[tokio::test]
    async fn test_late_rejection_reuses_rotated_token() {
        let session = logged_in_session();
        let exchange = GatedExchange::new(Ok(tokens("fresh")));
        let coordinator =
            RefreshCoordinator::new(session.clone(), exchange.clone(), RefreshFailurePolicy::Logout);

        exchange.gate.notify_one();
        assert_eq!(
            coordinator.refreshed_token(Some("expired")).await,
            Ok("fresh".to_string())
        );

        // A request sent with the old token is rejected after the refresh settled.
        assert_eq!(
            coordinator.refreshed_token(Some("expired")).await,
            Ok("fresh".to_string())
        );
        assert_eq!(exchange.calls(), 1);
        assert!(!coordinator.is_refreshing());
        assert_eq!(session.refresh_token().as_deref(), Some("fresh-refresh"));
    }

    #[tokio::test]
    async fn test_dropped_leader_releases_waiters() {
        let session = logged_in_session();
        let exchange = GatedExchange::new(Ok(tokens("fresh")));
        let coordinator = Arc::new(RefreshCoordinator::new(
            session,
            exchange.clone(),
            RefreshFailurePolicy::Logout,
        ));

        let leader = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refreshed_token(Some("expired")).await })
        };
        settle().await;
        let waiter = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refreshed_token(Some("expired")).await })
        };
        settle().await;
        assert_eq!(coordinator.queued(), 1);

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        assert_eq!(waiter.await.unwrap(), Err(RefreshError::Abandoned));
        assert!(!coordinator.is_refreshing());
    }
}
