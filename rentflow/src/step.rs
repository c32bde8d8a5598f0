//! The workflow step table.
//!
//! A booking advances through seven canonical lifecycle milestones, from
//! creation to completion. `payment_processed` sits outside that sequence:
//! it may be recorded at any point without moving the lifecycle forward.
//!
//! Progress derivation and the legal-successor table both read from the one
//! [`LIFECYCLE`] constant so numerator and denominator can never drift apart.

use crate::errors::WorkflowError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One milestone in a booking's workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStep {
    /// The booking request was created by the renter.
    BookingCreated,
    /// The host approved or declined the request.
    HostApproval,
    /// The host prepared the vehicle for handover.
    VehiclePreparation,
    /// The vehicle was handed over to the renter.
    PickupHandover,
    /// The rental period is underway.
    RentalPeriod,
    /// The vehicle was returned to the host.
    ReturnHandover,
    /// The booking reached completion.
    BookingComplete,
    /// A payment was processed; out-of-band, does not advance the lifecycle.
    PaymentProcessed,
}

/// The canonical lifecycle sequence, in order.
///
/// Progress is measured against this list and only this list.
pub const LIFECYCLE: [WorkflowStep; 7] = [
    WorkflowStep::BookingCreated,
    WorkflowStep::HostApproval,
    WorkflowStep::VehiclePreparation,
    WorkflowStep::PickupHandover,
    WorkflowStep::RentalPeriod,
    WorkflowStep::ReturnHandover,
    WorkflowStep::BookingComplete,
];

impl WorkflowStep {
    /// The step's wire name, as external callers spell it.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::BookingCreated => "booking_created",
            Self::HostApproval => "host_approval",
            Self::VehiclePreparation => "vehicle_preparation",
            Self::PickupHandover => "pickup_handover",
            Self::RentalPeriod => "rental_period",
            Self::ReturnHandover => "return_handover",
            Self::BookingComplete => "booking_complete",
            Self::PaymentProcessed => "payment_processed",
        }
    }

    /// Whether this step belongs to the canonical lifecycle sequence.
    pub fn is_lifecycle(self) -> bool {
        LIFECYCLE.contains(&self)
    }

    /// The lifecycle step that follows this one, if any.
    pub const fn following(self) -> Option<Self> {
        match self {
            Self::BookingCreated => Some(Self::HostApproval),
            Self::HostApproval => Some(Self::VehiclePreparation),
            Self::VehiclePreparation => Some(Self::PickupHandover),
            Self::PickupHandover => Some(Self::RentalPeriod),
            Self::RentalPeriod => Some(Self::ReturnHandover),
            Self::ReturnHandover => Some(Self::BookingComplete),
            Self::BookingComplete | Self::PaymentProcessed => None,
        }
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for WorkflowStep {
    type Err = WorkflowError;

    /// Parses a wire name. Anything outside the step table fails with
    /// [`WorkflowError::UnknownStep`] rather than being silently mis-tagged.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booking_created" => Ok(Self::BookingCreated),
            "host_approval" => Ok(Self::HostApproval),
            "vehicle_preparation" => Ok(Self::VehiclePreparation),
            "pickup_handover" => Ok(Self::PickupHandover),
            "rental_period" => Ok(Self::RentalPeriod),
            "return_handover" => Ok(Self::ReturnHandover),
            "booking_complete" => Ok(Self::BookingComplete),
            "payment_processed" => Ok(Self::PaymentProcessed),
            other => Err(WorkflowError::UnknownStep(other.to_string())),
        }
    }
}
