//! Shared fixtures for the Rentflow integration test suites.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use rentflow::booking::{Booking, Party};
use rentflow::engine::{EngineOptions, WorkflowEngine};
use rentflow::state::BookingStatus;
use rentflow::types::{BookingId, PartyId};
use rentflow_memory::{InMemoryBookingDirectory, InMemoryWorkflowStore};

/// The engine type every suite drives.
pub type TestEngine = WorkflowEngine<InMemoryWorkflowStore, InMemoryBookingDirectory>;

/// A booking between Ada (renter) and Grace (host) for a camper van.
pub fn sample_booking(id: &str) -> Booking {
    booking_between(id, "renter-ada", "Ada", "host-grace", "Grace")
}

/// A booking with explicit parties.
pub fn booking_between(
    id: &str,
    renter_id: &str,
    renter_name: &str,
    host_id: &str,
    host_name: &str,
) -> Booking {
    Booking {
        id: BookingId::try_new(id).unwrap(),
        status: BookingStatus::Pending,
        renter: Party {
            id: PartyId::try_new(renter_id).unwrap(),
            name: renter_name.to_string(),
        },
        host: Party {
            id: PartyId::try_new(host_id).unwrap(),
            name: host_name.to_string(),
        },
        vehicle_title: "2019 Camper Van".to_string(),
        total_amount_cents: 42_000,
    }
}

/// An engine wired to fresh in-memory adapters, with the given bookings
/// known to the directory (none of them registered yet).
pub fn engine_with(bookings: &[Booking]) -> TestEngine {
    engine_with_options(bookings, EngineOptions::new())
}

/// Same as [`engine_with`] but with step-order enforcement disabled, so
/// `next_actions` is advisory only.
pub fn lenient_engine_with(bookings: &[Booking]) -> TestEngine {
    engine_with_options(
        bookings,
        EngineOptions::new().with_step_order_enforcement(false),
    )
}

fn engine_with_options(bookings: &[Booking], options: EngineOptions) -> TestEngine {
    let directory = InMemoryBookingDirectory::new();
    for booking in bookings {
        directory.add(booking.clone());
    }
    WorkflowEngine::with_options(InMemoryWorkflowStore::new(), directory, options)
}
