//! Workflow events: the immutable, append-only record of every transition.
//!
//! Events are the single source of truth for a booking's workflow. Once a
//! [`WorkflowEvent`] has been appended to a state's log it is never mutated
//! or removed; progress, next actions, and blockers are all derived from it.

use crate::step::WorkflowStep;
use crate::types::{BookingId, EventId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The party responsible for triggering a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// The customer renting the vehicle.
    Renter,
    /// The vehicle owner.
    Host,
    /// A privileged operator acting outside the normal step graph.
    Admin,
    /// Automated steps performed by the platform itself.
    System,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Renter => "renter",
            Self::Host => "host",
            Self::Admin => "admin",
            Self::System => "system",
        })
    }
}

/// The host's decision on a pending booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    /// Accept the booking request.
    Approve,
    /// Reject the booking request.
    Decline,
}

/// The closed set of event types a workflow can log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A booking request was created.
    BookingCreated,
    /// The host (or an admin) approved the request.
    BookingApproved,
    /// The host declined the request.
    BookingDeclined,
    /// The booking was cancelled by an admin override.
    BookingCancelled,
    /// The booking ran to completion.
    BookingCompleted,
    /// A payment was processed for the booking.
    PaymentProcessed,
    /// The vehicle was prepared for handover.
    VehiclePreparation,
    /// The vehicle was handed over to the renter.
    PickupHandover,
    /// The rental period started.
    RentalPeriod,
    /// The vehicle was returned to the host.
    ReturnHandover,
}

impl EventType {
    /// The canonical lifecycle step this event type was produced by, if any.
    ///
    /// Both approval outcomes credit the `host_approval` milestone;
    /// cancellations and payments credit none.
    pub const fn lifecycle_step(self) -> Option<WorkflowStep> {
        match self {
            Self::BookingCreated => Some(WorkflowStep::BookingCreated),
            Self::BookingApproved | Self::BookingDeclined => Some(WorkflowStep::HostApproval),
            Self::VehiclePreparation => Some(WorkflowStep::VehiclePreparation),
            Self::PickupHandover => Some(WorkflowStep::PickupHandover),
            Self::RentalPeriod => Some(WorkflowStep::RentalPeriod),
            Self::ReturnHandover => Some(WorkflowStep::ReturnHandover),
            Self::BookingCompleted => Some(WorkflowStep::BookingComplete),
            Self::BookingCancelled | Self::PaymentProcessed => None,
        }
    }
}

/// Optional payload attached to a transition.
///
/// The typed fields cover what the engine itself inspects (the approval
/// decision, the override reason); anything else rides along in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepData {
    /// The host's approve/decline decision, required for `host_approval`.
    pub action: Option<ApprovalAction>,
    /// Human-readable reason for a decline, cancellation, or override.
    pub reason: Option<String>,
    /// Marks events appended by the admin override path.
    #[serde(default)]
    pub admin_override: bool,
    /// Free-form payload supplied by the caller.
    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl StepData {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// A payload carrying an approve decision.
    pub fn approve() -> Self {
        Self::new().with_action(ApprovalAction::Approve)
    }

    /// A payload carrying a decline decision.
    pub fn decline() -> Self {
        Self::new().with_action(ApprovalAction::Decline)
    }

    /// Sets the approval decision.
    #[must_use]
    pub const fn with_action(mut self, action: ApprovalAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the human-readable reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds a free-form payload entry.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Payload for an admin override event: the mandatory reason plus the
    /// audit marker.
    pub(crate) fn admin(reason: &str) -> Self {
        Self {
            reason: Some(reason.to_string()),
            admin_override: true,
            ..Self::default()
        }
    }
}

/// One immutable entry in a booking's workflow event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    /// Unique identifier; UUIDv7, so log order matches id order.
    pub id: EventId,
    /// The booking this event belongs to.
    pub booking_id: BookingId,
    /// What happened.
    pub event_type: EventType,
    /// Who made it happen.
    pub actor: Actor,
    /// When it was recorded.
    pub timestamp: Timestamp,
    /// Optional payload supplied with the transition.
    pub data: Option<StepData>,
    /// Human-readable summary for audit trails and activity feeds.
    pub message: String,
}

impl WorkflowEvent {
    /// Records a new event with a fresh id, the current time, and the
    /// standard summary line for its type and actor.
    pub(crate) fn record(
        booking_id: BookingId,
        event_type: EventType,
        actor: Actor,
        data: Option<StepData>,
    ) -> Self {
        Self {
            id: EventId::new(),
            booking_id,
            event_type,
            actor,
            timestamp: Timestamp::now(),
            data,
            message: summary(event_type, actor),
        }
    }
}

fn summary(event_type: EventType, actor: Actor) -> String {
    match event_type {
        EventType::BookingCreated => format!("Booking request created by {actor}"),
        EventType::BookingApproved => format!("Booking approved by {actor}"),
        EventType::BookingDeclined => format!("Booking declined by {actor}"),
        EventType::BookingCancelled => format!("Booking cancelled by {actor}"),
        EventType::BookingCompleted => format!("Booking completed by {actor}"),
        EventType::PaymentProcessed => "Payment processed".to_string(),
        EventType::VehiclePreparation => "Vehicle prepared for handover".to_string(),
        EventType::PickupHandover => "Vehicle handed over to renter".to_string(),
        EventType::RentalPeriod => "Rental period underway".to_string(),
        EventType::ReturnHandover => "Vehicle returned to host".to_string(),
    }
}
