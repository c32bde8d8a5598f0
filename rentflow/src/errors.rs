//! Error types for the Rentflow workflow engine.
//!
//! Two layers, mirroring the split between business logic and storage:
//!
//! - [`WorkflowError`]: caller-facing failures from engine operations.
//! - [`StoreError`]: failures from the [`WorkflowStore`](crate::store::WorkflowStore)
//!   and [`BookingDirectory`](crate::booking::BookingDirectory) ports.
//!
//! All failures are synchronous and caller-visible; nothing is retried
//! internally. Subscriber failures during notification fan-out are isolated
//! by the dispatcher and never surface here.

use crate::step::WorkflowStep;
use crate::types::BookingId;
use thiserror::Error;

/// Result type for engine operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Errors that can occur while driving a booking's workflow.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// The referenced booking has no registered workflow.
    #[error("no workflow registered for booking '{0}'")]
    BookingNotFound(BookingId),

    /// `register` was called twice for the same booking id.
    #[error("workflow for booking '{0}' is already registered")]
    DuplicateBooking(BookingId),

    /// A step identifier outside the known step table was supplied.
    #[error("unknown workflow step '{0}'")]
    UnknownStep(String),

    /// The step is not legal from the workflow's current position.
    #[error("step '{step}' is not allowed after '{current}' (legal next steps: {allowed:?})")]
    StepNotAllowed {
        /// The step the caller attempted.
        step: WorkflowStep,
        /// The most recently processed step.
        current: WorkflowStep,
        /// The steps that would have been accepted.
        allowed: Vec<WorkflowStep>,
    },

    /// `host_approval` was processed without an approve/decline decision.
    #[error("host approval requires an approve or decline decision")]
    MissingDecision,

    /// An admin override was attempted without a reason.
    #[error("admin override requires a non-empty reason")]
    EmptyReason,

    /// The workflow already reached a terminal status.
    #[error("workflow for booking '{0}' already reached a terminal status")]
    TerminalState(BookingId),

    /// A port implementation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result type for store and directory port operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by [`WorkflowStore`](crate::store::WorkflowStore) and
/// [`BookingDirectory`](crate::booking::BookingDirectory) implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The booking id is not present in the store.
    #[error("booking '{0}' not found in store")]
    NotFound(BookingId),

    /// The booking id is already present in the store.
    #[error("booking '{0}' already present in store")]
    Duplicate(BookingId),

    /// The backing implementation failed (connection loss, I/O, ...).
    #[error("backing store failure: {0}")]
    Backend(String),
}
