//! # TermSync Engine
//!
//! Reconciles a company's reference list of payment terms against the
//! authoritative list held by a remote accounting system, and creates the
//! terms the remote system is missing.
//!
//! ## Design Principles
//!
//! - **No IO**: transport is injected through the [`Session`] and [`Fetcher`] traits
//! - **One-way**: the reference dataset is never written back; remote terms are
//!   never renamed or deleted
//! - **Always completes**: failures surface as record statuses and log events,
//!   not as errors, unless the caller opts into [`FetchFailurePolicy::Abort`]
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! A [`Record`] has a name, an external key (the company identifier used as the
//! join key), the remote identifier once the remote system knows it, and a
//! [`RecordStatus`].
//!
//! ### Reconciliation
//!
//! The [`Reconciler`] fetches the remote snapshot, classifies every record as
//! `Unchanged`, `Different`, `Added` or `Missing`, propagates the `Added` ones
//! and returns one record per external key. When a key repeats within one
//! side, the last occurrence wins.
//!
//! ### Propagation
//!
//! The [`Propagator`] sends all new records in a single batch and matches each
//! response item back to its candidate (see [`Correlation`]).
//!
//! ## Quick Start
//!
//! ```rust
//! use termsync_engine::{
//!     InMemoryRemote, Propagator, Reconciler, Record, RecordStatus, SessionFetcher,
//! };
//!
//! # tokio_test_block(async {
//! let remote = InMemoryRemote::new();
//! remote.seed("Net30", Some(100));
//!
//! let reconciler = Reconciler::new(
//!     SessionFetcher::new(&remote, "TermSync"),
//!     Propagator::new(&remote, "TermSync"),
//! );
//!
//! let result = reconciler
//!     .reconcile(vec![Record::reference("Net30", 100), Record::reference("Net60", 200)])
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.get(100).unwrap().status, RecordStatus::Unchanged);
//! assert_eq!(result.get(200).unwrap().status, RecordStatus::Added);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod error;
pub mod memory;
pub mod propagate;
pub mod protocol;
pub mod reconcile;
pub mod record;
pub mod remote;

// Re-export main types at crate root
pub use error::Error;
pub use memory::InMemoryRemote;
pub use propagate::{Correlation, Propagator};
pub use protocol::{BatchRequest, BatchResponse, RequestItem, ResponseItem, ResponseType, TermRet};
pub use reconcile::{
    classify, Classification, FetchFailurePolicy, ReconcileOptions, ReconcileResult, Reconciler,
    StatusSummary,
};
pub use record::{Record, RecordStatus, UNTAGGED_KEY};
pub use remote::{Fetcher, Session, SessionFetcher};

/// Type aliases for clarity
pub type ExternalKey = i64;
pub type RemoteId = String;
