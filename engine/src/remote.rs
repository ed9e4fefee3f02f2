//! Collaborator interfaces toward the remote accounting system.
//!
//! The engine performs no I/O of its own. Transport lives behind [`Session`];
//! snapshot reads live behind [`Fetcher`]. [`SessionFetcher`] derives a
//! fetcher from any session.

use crate::error::Result;
use crate::protocol::{records_from_query, BatchRequest, BatchResponse};
use crate::Record;
use async_trait::async_trait;

/// A request/response channel to the remote system.
///
/// A handle returned by [`Session::open`] must be passed back to
/// [`Session::close`] exactly once, even when [`Session::submit`] failed.
#[async_trait]
pub trait Session: Send + Sync {
    /// Opaque per-session state (connection ticket, cookie, ...).
    type Handle: Send + Sync;

    /// Connect and authenticate as `app_name`.
    async fn open(&self, app_name: &str) -> Result<Self::Handle>;

    /// Send one batch and wait for its response.
    async fn submit(&self, handle: &Self::Handle, request: &BatchRequest) -> Result<BatchResponse>;

    /// End the session.
    async fn close(&self, handle: Self::Handle) -> Result<()>;
}

/// Source of the current remote record set.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Read every remote record.
    async fn fetch_all(&self) -> Result<Vec<Record>>;
}

/// Reads the remote snapshot with a single query batch over a [`Session`].
pub struct SessionFetcher<S> {
    session: S,
    app_name: String,
}

impl<S: Session> SessionFetcher<S> {
    pub fn new(session: S, app_name: impl Into<String>) -> Self {
        Self {
            session,
            app_name: app_name.into(),
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

#[async_trait]
impl<S: Session> Fetcher for SessionFetcher<S> {
    async fn fetch_all(&self) -> Result<Vec<Record>> {
        let handle = self.session.open(&self.app_name).await?;

        let submitted = self
            .session
            .submit(&handle, &BatchRequest::query_terms())
            .await;

        if let Err(e) = self.session.close(handle).await {
            tracing::warn!(error = %e, "failed to close query session");
        }

        let records = records_from_query(&submitted?)?;
        tracing::info!(count = records.len(), "fetched remote terms");
        Ok(records)
    }
}

// Shared references delegate, so one session can back both fetcher and propagator.
#[async_trait]
impl<'a, S: Session> Session for &'a S {
    type Handle = S::Handle;

    async fn open(&self, app_name: &str) -> Result<Self::Handle> {
        (**self).open(app_name).await
    }

    async fn submit(&self, handle: &Self::Handle, request: &BatchRequest) -> Result<BatchResponse> {
        (**self).submit(handle, request).await
    }

    async fn close(&self, handle: Self::Handle) -> Result<()> {
        (**self).close(handle).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRemote;
    use crate::Error;

    #[tokio::test]
    async fn fetch_reads_seeded_terms() {
        let remote = InMemoryRemote::new();
        remote.seed("Net30", Some(100));
        remote.seed("Due on receipt", None);

        let fetcher = SessionFetcher::new(&remote, "TermSync");
        let mut records = fetcher.fetch_all().await.unwrap();
        records.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Due on receipt");
        assert!(!records[0].is_tagged());
        assert_eq!(records[1].external_key, 100);
        assert_eq!(remote.closes(), 1);
    }

    #[tokio::test]
    async fn fetch_closes_session_when_submit_fails() {
        let remote = InMemoryRemote::new();
        remote.fail_submit("connection reset");

        let fetcher = SessionFetcher::new(&remote, "TermSync");
        let err = fetcher.fetch_all().await.unwrap_err();

        assert_eq!(err, Error::Submit("connection reset".into()));
        assert_eq!(remote.opens(), 1);
        assert_eq!(remote.closes(), 1);
    }

    #[tokio::test]
    async fn fetch_open_failure_skips_close() {
        let remote = InMemoryRemote::new();
        remote.fail_open("QuickBooks not running");

        let fetcher = SessionFetcher::new(&remote, "TermSync");
        let err = fetcher.fetch_all().await.unwrap_err();

        assert!(matches!(err, Error::SessionOpen(_)));
        assert_eq!(remote.closes(), 0);
    }
}
