//! Batch creation of records missing from the remote system.
//!
//! # Algorithm
//!
//! 1. Open a session
//! 2. Build one `TermAdd` per candidate, in candidate order
//! 3. Submit the whole batch in a single round trip
//! 4. Close the session, whatever the submit outcome
//! 5. Attribute each response item to a candidate and update it in place
//!
//! Failures never propagate to the caller. A transport failure leaves every
//! candidate untouched (`Added` with an empty `remote_id`); a rejected item
//! that can be attributed demotes its candidate to `FailedToAdd`.

use crate::protocol::{BatchRequest, BatchResponse};
use crate::record::RecordStatus;
use crate::remote::Session;
use crate::Record;
use serde::{Deserialize, Serialize};

/// How response items are matched back to submitted candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Correlation {
    /// Item `i` answers candidate `i` when the response is complete (default).
    /// Falls back to name matching otherwise.
    #[default]
    Positional,
    /// Each success item resolves the first candidate with that name that is
    /// neither resolved nor already marked `FailedToAdd`. Repeated names thus
    /// land on distinct candidates instead of all hitting the first one.
    ByName,
}

/// Sends creation batches over a [`Session`].
pub struct Propagator<S> {
    session: S,
    app_name: String,
    correlation: Correlation,
}

impl<S: Session> Propagator<S> {
    /// Create a propagator identifying itself as `app_name`.
    pub fn new(session: S, app_name: impl Into<String>) -> Self {
        Self {
            session,
            app_name: app_name.into(),
            correlation: Correlation::default(),
        }
    }

    pub fn with_correlation(mut self, correlation: Correlation) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn correlation(&self) -> Correlation {
        self.correlation
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Create every candidate remotely, updating `status`/`remote_id` in place.
    pub async fn propagate(&self, candidates: &mut [Record]) {
        if candidates.is_empty() {
            return;
        }

        let handle = match self.session.open(&self.app_name).await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "error adding terms: could not open session");
                return;
            }
        };

        let request = BatchRequest::add_terms(candidates);
        tracing::info!(count = request.len(), "sending terms to remote");

        let submitted = self.session.submit(&handle, &request).await;

        if let Err(e) = self.session.close(handle).await {
            tracing::warn!(error = %e, "failed to close session");
        }

        match submitted {
            Ok(response) => apply_response(&response, candidates, self.correlation),
            Err(e) => tracing::error!(error = %e, "error adding terms"),
        }
    }
}

/// Update candidates from the response to [`BatchRequest::add_terms`].
pub fn apply_response(
    response: &BatchResponse,
    candidates: &mut [Record],
    correlation: Correlation,
) {
    let positional = correlation == Correlation::Positional && response.len() == candidates.len();
    if correlation == Correlation::Positional && !positional {
        tracing::warn!(
            submitted = candidates.len(),
            received = response.len(),
            "response length differs from request, correlating by name"
        );
    }

    for (index, item) in response.items.iter().enumerate() {
        let Some(term) = item.added_term() else {
            tracing::warn!(
                status_code = item.status_code,
                status_message = %item.status_message,
                "remote returned error"
            );
            if positional && !candidates[index].is_resolved() {
                candidates[index].mark_failed();
            }
            continue;
        };

        tracing::info!(
            name = %term.name,
            remote_id = %term.remote_id,
            created_at = %term.created_at,
            "successfully added term"
        );

        let target = if positional && candidates[index].name == term.name {
            Some(index)
        } else {
            first_unresolved_named(candidates, &term.name)
        };

        match target {
            Some(i) => candidates[i].mark_added(term.remote_id.clone()),
            None => tracing::warn!(name = %term.name, "added term matches no submitted candidate"),
        }
    }
}

fn first_unresolved_named(candidates: &[Record], name: &str) -> Option<usize> {
    candidates.iter().position(|candidate| {
        candidate.name == name
            && !candidate.is_resolved()
            && candidate.status != RecordStatus::FailedToAdd
    })
}
