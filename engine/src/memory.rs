//! An in-process stand-in for the accounting system.
//!
//! [`InMemoryRemote`] answers the same batch protocol as the real gateway:
//! it assigns remote identifiers, rejects names already in use and reports
//! per-item status codes. Faults can be injected on open, submit and close,
//! and every session call is counted.

use crate::error::{Error, Result};
use crate::protocol::{
    BatchRequest, BatchResponse, RequestItem, ResponseItem, ResponseType, TermRet,
    STATUS_NAME_IN_USE,
};
use crate::remote::Session;
use crate::ExternalKey;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Longest term name the remote accepts.
pub const MAX_NAME_LEN: usize = 31;

const STATUS_REQUIRED_FIELD: i32 = 3020;
const STATUS_STRING_TOO_LONG: i32 = 3070;
const FIRST_SEQUENCE: u64 = 0x8000_0000;

/// Handle of an open in-memory session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct RemoteState {
    terms: Vec<TermRet>,
    next_sequence: u64,
    next_ticket: u64,
    open_tickets: HashSet<Ticket>,
    opens: usize,
    closes: usize,
    requests: Vec<BatchRequest>,
    open_failure: Option<String>,
    submit_failure: Option<String>,
    close_failure: Option<String>,
}

impl RemoteState {
    fn create_term(&mut self, name: &str, external_key: Option<ExternalKey>) -> TermRet {
        let created_at = Utc::now();
        let sequence = FIRST_SEQUENCE + self.next_sequence;
        self.next_sequence += 1;

        let term = TermRet {
            remote_id: format!("{:X}-{}", sequence, created_at.timestamp()),
            name: name.to_string(),
            external_key,
            created_at,
        };
        self.terms.push(term.clone());
        term
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.terms
            .iter()
            .any(|term| term.name.eq_ignore_ascii_case(name))
    }

    fn handle(&mut self, item: &RequestItem) -> ResponseItem {
        match item {
            RequestItem::TermAdd { name, .. } => {
                if name.is_empty() {
                    return ResponseItem::error(
                        ResponseType::TermAdd,
                        STATUS_REQUIRED_FIELD,
                        "There is a missing element: \"Name\".",
                    );
                }
                if name.chars().count() > MAX_NAME_LEN {
                    return ResponseItem::error(
                        ResponseType::TermAdd,
                        STATUS_STRING_TOO_LONG,
                        format!("String \"{name}\" is too long."),
                    );
                }
                if self.name_in_use(name) {
                    return ResponseItem::error(
                        ResponseType::TermAdd,
                        STATUS_NAME_IN_USE,
                        format!("The name \"{name}\" of the list element is already in use."),
                    );
                }
                ResponseItem::term_added(self.create_term(name, None))
            }
            RequestItem::TermQuery => ResponseItem::term_list(self.terms.clone()),
        }
    }
}

/// Accounting system held in memory.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an existing term, bypassing validation. Returns its remote id.
    pub fn seed(&self, name: &str, external_key: Option<ExternalKey>) -> String {
        self.state().create_term(name, external_key).remote_id
    }

    /// Every term currently held, in creation order.
    pub fn terms(&self) -> Vec<TermRet> {
        self.state().terms.clone()
    }

    /// Every batch accepted by `submit`, in arrival order.
    pub fn requests(&self) -> Vec<BatchRequest> {
        self.state().requests.clone()
    }

    pub fn opens(&self) -> usize {
        self.state().opens
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    /// Sessions opened and not yet closed.
    pub fn open_sessions(&self) -> usize {
        self.state().open_tickets.len()
    }

    /// Make every following `open` fail with `reason`.
    pub fn fail_open(&self, reason: impl Into<String>) {
        self.state().open_failure = Some(reason.into());
    }

    /// Make every following `submit` fail with `reason`.
    pub fn fail_submit(&self, reason: impl Into<String>) {
        self.state().submit_failure = Some(reason.into());
    }

    /// Make every following `close` fail with `reason` (the session still ends).
    pub fn fail_close(&self, reason: impl Into<String>) {
        self.state().close_failure = Some(reason.into());
    }

    /// Clear injected faults.
    pub fn heal(&self) {
        let mut state = self.state();
        state.open_failure = None;
        state.submit_failure = None;
        state.close_failure = None;
    }
}

#[async_trait]
impl Session for InMemoryRemote {
    type Handle = Ticket;

    async fn open(&self, app_name: &str) -> Result<Ticket> {
        let mut state = self.state();
        state.opens += 1;
        if let Some(reason) = &state.open_failure {
            return Err(Error::SessionOpen(reason.clone()));
        }

        let ticket = Ticket(state.next_ticket);
        state.next_ticket += 1;
        state.open_tickets.insert(ticket);
        tracing::debug!(app_name, ticket = ticket.0, "opened in-memory session");
        Ok(ticket)
    }

    async fn submit(&self, handle: &Ticket, request: &BatchRequest) -> Result<BatchResponse> {
        let mut state = self.state();
        if !state.open_tickets.contains(handle) {
            return Err(Error::Submit(format!("unknown session ticket {}", handle.0)));
        }
        if let Some(reason) = &state.submit_failure {
            return Err(Error::Submit(reason.clone()));
        }

        state.requests.push(request.clone());
        let items = request.items.iter().map(|item| state.handle(item)).collect();
        Ok(BatchResponse { items })
    }

    async fn close(&self, handle: Ticket) -> Result<()> {
        let mut state = self.state();
        state.closes += 1;
        state.open_tickets.remove(&handle);
        match &state.close_failure {
            Some(reason) => Err(Error::SessionClose(reason.clone())),
            None => Ok(()),
        }
    }
}
