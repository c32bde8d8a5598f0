//! The workflow store port.
//!
//! The store holds the single authoritative [`WorkflowState`] per booking
//! for the life of the process. It is a plain keyed collection behind a
//! trait so a persistent, transactionally-consistent backend can be swapped
//! in without touching the engine; per-booking transition serialization is
//! layered on top by the engine itself.

use crate::errors::StoreResult;
use crate::state::WorkflowState;
use crate::types::BookingId;
use async_trait::async_trait;

/// Backend-independent storage for workflow states.
///
/// Reads must observe a consistent snapshot of a booking's state, never a
/// torn view of the event log mid-append.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Stores the state for a newly registered booking.
    ///
    /// Fails with [`StoreError::Duplicate`](crate::errors::StoreError::Duplicate)
    /// if the booking id is already registered.
    async fn insert(&self, state: WorkflowState) -> StoreResult<()>;

    /// Returns a snapshot of the state for `id`, if registered.
    async fn get(&self, id: &BookingId) -> StoreResult<Option<WorkflowState>>;

    /// Replaces the state of an already-registered booking.
    ///
    /// Fails with [`StoreError::NotFound`](crate::errors::StoreError::NotFound)
    /// if the booking was never registered.
    async fn put(&self, state: WorkflowState) -> StoreResult<()>;

    /// Whether a workflow is registered for `id`.
    async fn contains(&self, id: &BookingId) -> StoreResult<bool>;
}
