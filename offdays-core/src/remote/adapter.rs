//! The calendar mirroring capability used by the ledger.
//!
//! All three operations are best-effort: a failure is logged by the caller,
//! never rolled back, and never blocks the ledger mutation that triggered it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::error::{LedgerError, LedgerResult};
use crate::remote::auth::{Credential, GoogleAuth};

/// Bound on every external calendar call. A timeout is handled like any
/// other sync failure.
pub const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// All-day event payload mirrored into the external calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorEvent {
    pub summary: String,
    pub description: String,
    pub start_date: NaiveDate,
    /// Inclusive end date; adapters convert to their provider's convention.
    pub end_date: NaiveDate,
}

impl MirrorEvent {
    /// Event payload for one person's vacation interval.
    pub fn vacation(person_name: &str, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        MirrorEvent {
            summary: format!("{person_name} - Vacation"),
            description: format!("Vacation for {person_name}"),
            start_date,
            end_date,
        }
    }
}

/// Calendar provider capability: create/update/delete keyed by an opaque
/// external event id. Every operation may fail (network, auth, not-found).
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Create the event remotely, returning its external id.
    async fn create_event(
        &self,
        credential: &Credential,
        event: &MirrorEvent,
    ) -> LedgerResult<String>;

    async fn update_event(
        &self,
        credential: &Credential,
        event_id: &str,
        event: &MirrorEvent,
    ) -> LedgerResult<()>;

    /// Delete the event remotely. A missing remote object is not an error.
    async fn delete_event(&self, credential: &Credential, event_id: &str) -> LedgerResult<()>;
}

/// Wrapper that owns the credential lifecycle (absent, obtained, revoked).
///
/// With no credential installed every operation is a silent no-op, so ledger
/// behavior is identical whether or not calendar sync is configured.
#[derive(Clone)]
pub struct CalendarMirror {
    adapter: Arc<dyn CalendarSync>,
    credential: Arc<RwLock<Option<Credential>>>,
    auth: Option<Arc<GoogleAuth>>,
}

impl CalendarMirror {
    pub fn new(adapter: Arc<dyn CalendarSync>) -> Self {
        CalendarMirror {
            adapter,
            credential: Arc::new(RwLock::new(None)),
            auth: None,
        }
    }

    /// Attach an OAuth client so expired access tokens get refreshed before
    /// calendar calls.
    pub fn with_auth(mut self, auth: Arc<GoogleAuth>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Install a freshly obtained credential.
    pub async fn connect(&self, credential: Credential) {
        *self.credential.write().await = Some(credential);
    }

    /// Revoke the credential; subsequent operations become no-ops.
    pub async fn disconnect(&self) {
        *self.credential.write().await = None;
    }

    pub async fn is_connected(&self) -> bool {
        self.credential.read().await.is_some()
    }

    /// Create the mirrored event, returning its external id, or `None` when
    /// sync is not configured.
    pub async fn create_event(&self, event: &MirrorEvent) -> LedgerResult<Option<String>> {
        let Some(credential) = self.current_credential().await else {
            return Ok(None);
        };
        bounded(self.adapter.create_event(&credential, event))
            .await
            .map(Some)
    }

    pub async fn update_event(&self, event_id: &str, event: &MirrorEvent) -> LedgerResult<()> {
        let Some(credential) = self.current_credential().await else {
            return Ok(());
        };
        bounded(self.adapter.update_event(&credential, event_id, event)).await
    }

    pub async fn delete_event(&self, event_id: &str) -> LedgerResult<()> {
        let Some(credential) = self.current_credential().await else {
            return Ok(());
        };
        bounded(self.adapter.delete_event(&credential, event_id)).await
    }

    /// Current credential, refreshed in place when expired and an OAuth
    /// client is attached. A failed refresh falls through to the stale
    /// token; the calendar call will then fail and be logged as usual.
    async fn current_credential(&self) -> Option<Credential> {
        let mut guard = self.credential.write().await;
        let credential = guard.as_mut()?;

        if credential.is_expired() {
            if let (Some(auth), Some(refresh_token)) =
                (self.auth.as_ref(), credential.refresh_token.clone())
            {
                match auth.refresh(&refresh_token).await {
                    Ok(fresh) => *credential = fresh,
                    Err(e) => tracing::warn!("failed to refresh calendar credential: {e}"),
                }
            }
        }

        Some(credential.clone())
    }
}

async fn bounded<T>(call: impl Future<Output = LedgerResult<T>>) -> LedgerResult<T> {
    timeout(SYNC_TIMEOUT, call)
        .await
        .map_err(|_| LedgerError::SyncTimeout(SYNC_TIMEOUT.as_secs()))?
}
