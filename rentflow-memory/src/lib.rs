//! In-memory adapters for the Rentflow workflow engine.
//!
//! This crate provides process-memory implementations of the
//! `WorkflowStore` and `BookingDirectory` ports, useful for testing,
//! demos, and single-process deployments where persistence is not
//! required. State lives exactly as long as the process; a production
//! deployment would back the same ports with persistent storage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use rentflow::booking::{Booking, BookingDirectory, PartyRole};
use rentflow::errors::{StoreError, StoreResult};
use rentflow::state::WorkflowState;
use rentflow::store::WorkflowStore;
use rentflow::types::{BookingId, PartyId};

/// Thread-safe in-memory workflow store.
///
/// Clones share the same underlying storage.
#[derive(Clone, Default)]
pub struct InMemoryWorkflowStore {
    states: Arc<RwLock<HashMap<BookingId, WorkflowState>>>,
}

impl InMemoryWorkflowStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of registered workflows.
    pub fn len(&self) -> usize {
        self.states.read().len()
    }

    /// Whether the store holds no workflows.
    pub fn is_empty(&self) -> bool {
        self.states.read().is_empty()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert(&self, state: WorkflowState) -> StoreResult<()> {
        let mut states = self.states.write();
        if states.contains_key(&state.booking_id) {
            return Err(StoreError::Duplicate(state.booking_id));
        }
        states.insert(state.booking_id.clone(), state);
        Ok(())
    }

    async fn get(&self, id: &BookingId) -> StoreResult<Option<WorkflowState>> {
        Ok(self.states.read().get(id).cloned())
    }

    async fn put(&self, state: WorkflowState) -> StoreResult<()> {
        let mut states = self.states.write();
        if !states.contains_key(&state.booking_id) {
            return Err(StoreError::NotFound(state.booking_id));
        }
        states.insert(state.booking_id.clone(), state);
        Ok(())
    }

    async fn contains(&self, id: &BookingId) -> StoreResult<bool> {
        Ok(self.states.read().contains_key(id))
    }
}

/// Thread-safe in-memory booking directory.
///
/// Stands in for the external booking service: tests and demos add the
/// bookings they care about, and the engine reads them back for party
/// filtering and notification enrichment.
#[derive(Clone, Default)]
pub struct InMemoryBookingDirectory {
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
}

impl InMemoryBookingDirectory {
    /// Creates a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a booking record.
    pub fn add(&self, booking: Booking) {
        self.bookings.write().insert(booking.id.clone(), booking);
    }
}

#[async_trait]
impl BookingDirectory for InMemoryBookingDirectory {
    async fn booking(&self, id: &BookingId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().get(id).cloned())
    }

    async fn bookings_for_party(
        &self,
        party: &PartyId,
        role: PartyRole,
    ) -> StoreResult<Vec<BookingId>> {
        let bookings = self.bookings.read();
        let mut ids: Vec<BookingId> = bookings
            .values()
            .filter(|booking| match role {
                PartyRole::Renter => booking.renter.id == *party,
                PartyRole::Host => booking.host.id == *party,
            })
            .map(|booking| booking.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rentflow::booking::Party;
    use rentflow::state::BookingStatus;
    use rentflow::step::WorkflowStep;
    use rentflow::types::Timestamp;
    use std::collections::BTreeSet;

    fn booking(id: &str, renter: &str, host: &str) -> Booking {
        Booking {
            id: BookingId::try_new(id).unwrap(),
            status: BookingStatus::Pending,
            renter: Party {
                id: PartyId::try_new(renter).unwrap(),
                name: renter.to_string(),
            },
            host: Party {
                id: PartyId::try_new(host).unwrap(),
                name: host.to_string(),
            },
            vehicle_title: "Test Van".to_string(),
            total_amount_cents: 10_000,
        }
    }

    // Seeding goes through the engine in integration tests; the store only
    // needs a value to hold.
    fn state(id: &str) -> WorkflowState {
        WorkflowState {
            booking_id: BookingId::try_new(id).unwrap(),
            current_step: WorkflowStep::BookingCreated,
            status: BookingStatus::Pending,
            progress: 0,
            last_updated: Timestamp::now(),
            events: Vec::new(),
            next_actions: BTreeSet::from([WorkflowStep::HostApproval]),
            blockers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn new_store_is_empty() {
        let store = InMemoryWorkflowStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn clone_shares_storage() {
        let store1 = InMemoryWorkflowStore::new();
        let store2 = store1.clone();
        assert!(Arc::ptr_eq(&store1.states, &store2.states));
    }

    #[tokio::test]
    async fn insert_rejects_duplicates() {
        let store = InMemoryWorkflowStore::new();
        store.insert(state("bk-1")).await.unwrap();
        let err = store.insert(state("bk-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn put_requires_prior_registration() {
        let store = InMemoryWorkflowStore::new();
        let err = store.put(state("bk-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));

        store.insert(state("bk-1")).await.unwrap();
        store.put(state("bk-1")).await.unwrap();
    }

    #[tokio::test]
    async fn contains_tracks_registration() {
        let store = InMemoryWorkflowStore::new();
        let id = BookingId::try_new("bk-1").unwrap();

        assert!(!store.contains(&id).await.unwrap());
        store.insert(state("bk-1")).await.unwrap();
        assert!(store.contains(&id).await.unwrap());
    }

    #[tokio::test]
    async fn get_returns_a_snapshot() {
        let store = InMemoryWorkflowStore::new();
        store.insert(state("bk-1")).await.unwrap();

        let id = BookingId::try_new("bk-1").unwrap();
        let mut snapshot = store.get(&id).await.unwrap().unwrap();
        snapshot.progress = 99;

        // mutating the snapshot does not touch the stored state
        assert_eq!(store.get(&id).await.unwrap().unwrap().progress, 0);
    }

    #[tokio::test]
    async fn directory_filters_by_party_and_role() {
        let directory = InMemoryBookingDirectory::new();
        directory.add(booking("bk-1", "alice", "bob"));
        directory.add(booking("bk-2", "alice", "carol"));
        directory.add(booking("bk-3", "dave", "bob"));

        let alice = PartyId::try_new("alice").unwrap();
        let bob = PartyId::try_new("bob").unwrap();

        let as_renter = directory
            .bookings_for_party(&alice, PartyRole::Renter)
            .await
            .unwrap();
        assert_eq!(as_renter.len(), 2);

        let as_host = directory
            .bookings_for_party(&bob, PartyRole::Host)
            .await
            .unwrap();
        assert_eq!(as_host.len(), 2);

        let as_host_alice = directory
            .bookings_for_party(&alice, PartyRole::Host)
            .await
            .unwrap();
        assert!(as_host_alice.is_empty());
    }
}
