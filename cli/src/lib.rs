//! TermSync CLI library: configuration, reference loading and the HTTP
//! transport used by the `termsync` binary.

pub mod config;
pub mod error;
pub mod http;
pub mod reference;
pub mod report;
pub mod telemetry;

use crate::config::Config;
use crate::error::Result;
use termsync_engine::{Propagator, ReconcileResult, Reconciler, Record, Session, SessionFetcher};
use tracing::Instrument;
use uuid::Uuid;

/// Reconcile `reference` against the remote reached through `session`.
///
/// The same session client serves the snapshot query and the creation batch.
pub async fn reconcile_with<S: Session>(
    session: &S,
    config: &Config,
    reference: Vec<Record>,
) -> Result<ReconcileResult> {
    let reconciler = Reconciler::new(
        SessionFetcher::new(session, config.app_name.as_str()),
        Propagator::new(session, config.app_name.as_str()),
    )
    .with_options(config.options());

    let span = tracing::info_span!("reconcile", run_id = %Uuid::new_v4());
    let result = reconciler.reconcile(reference).instrument(span).await?;
    Ok(result)
}
