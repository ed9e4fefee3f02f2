//! Batch request/response envelope spoken with the accounting system.
//!
//! A batch carries an ordered list of request items. The remote answers with
//! one outcome item per request item, in the same order. All messages are
//! JSON-encoded; request and response kinds are tagged with snake_case names.

use crate::error::{Error, Result};
use crate::record::{Record, UNTAGGED_KEY};
use crate::{ExternalKey, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status code of a fully successful item.
pub const STATUS_OK: i32 = 0;
/// Status code of a query that matched nothing.
pub const STATUS_NO_MATCH: i32 = 1;
/// Status code returned when a list element name is already in use.
pub const STATUS_NAME_IN_USE: i32 = 3100;

/// A single request inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestItem {
    /// Create a term.
    TermAdd { name: String, active: bool },
    /// List every term.
    TermQuery,
}

/// An ordered batch of requests submitted in one round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub items: Vec<RequestItem>,
}

impl BatchRequest {
    /// One active `TermAdd` per candidate, in candidate order.
    pub fn add_terms(candidates: &[Record]) -> Self {
        let items = candidates
            .iter()
            .map(|record| RequestItem::TermAdd {
                name: record.name.clone(),
                active: true,
            })
            .collect();
        Self { items }
    }

    /// A single query for every term.
    pub fn query_terms() -> Self {
        Self {
            items: vec![RequestItem::TermQuery],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Kind of a response item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    TermAdd,
    TermQuery,
    /// Any kind this engine does not consume
    #[serde(other)]
    Other,
}

/// A term as returned by the remote system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermRet {
    pub remote_id: RemoteId,
    pub name: String,
    /// Company identifier stored on the remote term, if it was ever tagged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_key: Option<ExternalKey>,
    pub created_at: DateTime<Utc>,
}

impl TermRet {
    /// Convert to an unclassified remote record.
    pub fn to_record(&self) -> Record {
        Record::remote(
            self.remote_id.clone(),
            self.name.clone(),
            self.external_key.unwrap_or(UNTAGGED_KEY),
        )
    }
}

/// Payload of a successful response item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseDetail {
    /// A single created term
    Term(TermRet),
    /// Every term matching a query
    Terms(Vec<TermRet>),
    /// Anything else, kept as raw JSON so one odd item does not sink the batch
    Other(serde_json::Value),
}

/// Outcome of one request item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseItem {
    pub status_code: i32,
    #[serde(default)]
    pub status_message: String,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<ResponseDetail>,
}

impl ResponseItem {
    /// Successful creation of `term`.
    pub fn term_added(term: TermRet) -> Self {
        Self {
            status_code: STATUS_OK,
            status_message: "Status OK".to_string(),
            response_type: ResponseType::TermAdd,
            detail: Some(ResponseDetail::Term(term)),
        }
    }

    /// Query result. An empty list is reported with [`STATUS_NO_MATCH`].
    pub fn term_list(terms: Vec<TermRet>) -> Self {
        let (status_code, status_message) = if terms.is_empty() {
            (STATUS_NO_MATCH, "A query request did not find a matching object")
        } else {
            (STATUS_OK, "Status OK")
        };
        Self {
            status_code,
            status_message: status_message.to_string(),
            response_type: ResponseType::TermQuery,
            detail: Some(ResponseDetail::Terms(terms)),
        }
    }

    /// Failed item without detail.
    pub fn error(
        response_type: ResponseType,
        status_code: i32,
        status_message: impl Into<String>,
    ) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
            response_type,
            detail: None,
        }
    }

    /// The created term, only for the success shape of a `TermAdd` response.
    ///
    /// Any other combination of status, type and detail is a per-item failure.
    pub fn added_term(&self) -> Option<&TermRet> {
        if self.status_code != STATUS_OK || self.response_type != ResponseType::TermAdd {
            return None;
        }
        match &self.detail {
            Some(ResponseDetail::Term(term)) => Some(term),
            _ => None,
        }
    }
}

/// Ordered outcomes of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub items: Vec<ResponseItem>,
}

impl BatchResponse {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Extract remote records from the response to [`BatchRequest::query_terms`].
///
/// Status 0 and 1 are accepted; the first query item carrying a term list
/// provides the records. Any other status fails the whole query.
pub fn records_from_query(response: &BatchResponse) -> Result<Vec<Record>> {
    for item in &response.items {
        if item.status_code != STATUS_OK && item.status_code != STATUS_NO_MATCH {
            return Err(Error::Remote {
                status_code: item.status_code,
                message: item.status_message.clone(),
            });
        }

        if item.response_type != ResponseType::TermQuery {
            continue;
        }

        match &item.detail {
            Some(ResponseDetail::Terms(terms)) => {
                let records: Vec<Record> = terms.iter().map(TermRet::to_record).collect();
                for record in &records {
                    tracing::debug!(
                        name = %record.name,
                        external_key = record.external_key,
                        "read remote term"
                    );
                }
                return Ok(records);
            }
            Some(ResponseDetail::Term(_)) => {
                return Err(Error::UnexpectedResponse(
                    "query returned a single term instead of a list".into(),
                ));
            }
            // A malformed term would otherwise be reported as absent and re-added
            Some(ResponseDetail::Other(_)) => {
                return Err(Error::UnexpectedResponse(
                    "query detail is not a list of terms".into(),
                ));
            }
            None => {}
        }
    }
    Ok(Vec::new())
}
