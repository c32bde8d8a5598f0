//! The booking collaborator contract.
//!
//! Bookings are created, validated, and persisted by a service outside this
//! engine. The engine only echoes a booking's identity into the workflow it
//! registers and reads booking data back through the [`BookingDirectory`]
//! port for party filtering and notification enrichment.

use crate::errors::StoreResult;
use crate::state::BookingStatus;
use crate::types::{BookingId, PartyId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One side of a rental: a renter or a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Stable identifier of the party.
    pub id: PartyId,
    /// Display name, used when synthesizing notifications.
    pub name: String,
}

/// Which side of the rental a party is on, for `list_for_party` filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyRole {
    /// The customer renting the vehicle.
    Renter,
    /// The vehicle owner.
    Host,
}

/// A booking record as supplied by the external booking-creation service.
///
/// The engine does not validate or persist bookings beyond echoing their
/// identity into the initial workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: BookingId,
    /// Status as reported by the booking service at registration time.
    pub status: BookingStatus,
    /// The renting party.
    pub renter: Party,
    /// The vehicle owner.
    pub host: Party,
    /// Listing title of the booked vehicle.
    pub vehicle_title: String,
    /// Total rental amount, in cents.
    pub total_amount_cents: u64,
}

/// Read access to booking data owned by the external booking service.
///
/// Ownership filtering is deliberately delegated here: the workflow store
/// itself has no notion of ownership beyond the booking id.
#[async_trait]
pub trait BookingDirectory: Send + Sync {
    /// Looks up one booking by id.
    async fn booking(&self, id: &BookingId) -> StoreResult<Option<Booking>>;

    /// The ids of all bookings in which `party` participates as `role`.
    async fn bookings_for_party(
        &self,
        party: &PartyId,
        role: PartyRole,
    ) -> StoreResult<Vec<BookingId>>;
}
