//! Notification synthesis.
//!
//! Key workflow event types map to at most one [`NotificationData`] record,
//! which is handed off to an external delivery channel (push, email, SMS,
//! UI). This engine only constructs the record; rendering and read/unread
//! tracking belong to the delivery collaborator, so `read` is always false
//! at creation and never updated here.

use crate::booking::Booking;
use crate::event::{EventType, WorkflowEvent};
use crate::types::{BookingId, NotificationId, Timestamp};
use serde::{Deserialize, Serialize};

/// Delivery urgency of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Informational; may be batched.
    Low,
    /// Normal delivery.
    Medium,
    /// Should be seen promptly.
    High,
    /// Deliver immediately on every channel.
    Urgent,
}

/// The kinds of notification this engine synthesizes, mirroring the key
/// workflow event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new booking request needs the host's decision.
    BookingCreated,
    /// The request was approved.
    BookingApproved,
    /// The request was declined.
    BookingDeclined,
    /// The booking was cancelled.
    BookingCancelled,
    /// The rental ran to completion.
    BookingCompleted,
    /// A payment was processed.
    PaymentProcessed,
}

/// A user-facing notification synthesized from one workflow event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Unique identifier.
    pub id: NotificationId,
    /// What kind of notification this is.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// The booking the notification concerns.
    pub booking_id: BookingId,
    /// Listing title of the booked vehicle.
    pub vehicle_title: String,
    /// Renter display name, when booking data was available.
    pub renter_name: Option<String>,
    /// Host display name, when booking data was available.
    pub host_name: Option<String>,
    /// Monetary amount relevant to the notification, in cents.
    pub amount_cents: Option<u64>,
    /// When the notification was created.
    pub timestamp: Timestamp,
    /// Read marker; always false at creation, owned by the delivery channel
    /// afterwards.
    pub read: bool,
    /// Delivery urgency.
    pub priority: Priority,
    /// Whether the recipient is expected to act.
    pub action_required: bool,
    /// Where to act, when action is required.
    pub action_url: Option<String>,
}

impl NotificationData {
    /// Synthesizes the notification for `event`, if its type has a mapping.
    ///
    /// Custom mid-rental event types produce none. `booking` enriches the
    /// record with vehicle and party details; when absent the notification
    /// degrades to a placeholder title and no names.
    pub fn from_event(event: &WorkflowEvent, booking: Option<&Booking>) -> Option<Self> {
        let kind = match event.event_type {
            EventType::BookingCreated => NotificationKind::BookingCreated,
            EventType::BookingApproved => NotificationKind::BookingApproved,
            EventType::BookingDeclined => NotificationKind::BookingDeclined,
            EventType::BookingCancelled => NotificationKind::BookingCancelled,
            EventType::BookingCompleted => NotificationKind::BookingCompleted,
            EventType::PaymentProcessed => NotificationKind::PaymentProcessed,
            EventType::VehiclePreparation
            | EventType::PickupHandover
            | EventType::RentalPeriod
            | EventType::ReturnHandover => return None,
        };

        let vehicle_title = booking.map_or_else(
            || format!("booking {}", event.booking_id),
            |b| b.vehicle_title.clone(),
        );
        let reason = event
            .data
            .as_ref()
            .and_then(|data| data.reason.as_deref())
            .unwrap_or("no reason given");

        let (title, message, priority, action_required) = match kind {
            NotificationKind::BookingCreated => (
                "New booking request",
                format!(
                    "{} requested {vehicle_title}",
                    booking.map_or("A renter", |b| b.renter.name.as_str())
                ),
                Priority::High,
                true,
            ),
            NotificationKind::BookingApproved => (
                "Booking approved",
                format!("Your booking for {vehicle_title} was approved. Arrange the pickup handover."),
                Priority::High,
                true,
            ),
            NotificationKind::BookingDeclined => (
                "Booking declined",
                format!("Your request for {vehicle_title} was declined ({reason})"),
                Priority::Medium,
                false,
            ),
            NotificationKind::BookingCancelled => (
                "Booking cancelled",
                format!("Your booking for {vehicle_title} was cancelled ({reason})"),
                Priority::Urgent,
                false,
            ),
            NotificationKind::BookingCompleted => (
                "Rental complete",
                format!("Your rental of {vehicle_title} is complete. Thanks for riding with us."),
                Priority::Low,
                false,
            ),
            NotificationKind::PaymentProcessed => (
                "Payment received",
                format!("Payment for {vehicle_title} was processed"),
                Priority::Medium,
                false,
            ),
        };

        let amount_cents = match kind {
            NotificationKind::BookingCreated | NotificationKind::PaymentProcessed => {
                booking.map(|b| b.total_amount_cents)
            }
            _ => None,
        };
        let action_url = action_required.then(|| format!("/bookings/{}", event.booking_id));

        Some(Self {
            id: NotificationId::new(),
            kind,
            title: title.to_string(),
            message,
            booking_id: event.booking_id.clone(),
            vehicle_title,
            renter_name: booking.map(|b| b.renter.name.clone()),
            host_name: booking.map(|b| b.host.name.clone()),
            amount_cents,
            timestamp: Timestamp::now(),
            read: false,
            priority,
            action_required,
            action_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Party;
    use crate::event::{Actor, StepData};
    use crate::state::BookingStatus;
    use crate::types::PartyId;

    fn booking() -> Booking {
        Booking {
            id: BookingId::try_new("bk-9").unwrap(),
            status: BookingStatus::Pending,
            renter: Party {
                id: PartyId::try_new("renter-9").unwrap(),
                name: "Mara".to_string(),
            },
            host: Party {
                id: PartyId::try_new("host-9").unwrap(),
                name: "Theo".to_string(),
            },
            vehicle_title: "1987 Land Cruiser".to_string(),
            total_amount_cents: 120_000,
        }
    }

    fn event(event_type: EventType, data: Option<StepData>) -> WorkflowEvent {
        WorkflowEvent::record(BookingId::try_new("bk-9").unwrap(), event_type, Actor::Host, data)
    }

    #[test]
    fn approval_maps_to_an_actionable_high_priority_notice() {
        let booking = booking();
        let n = NotificationData::from_event(
            &event(EventType::BookingApproved, Some(StepData::approve())),
            Some(&booking),
        )
        .unwrap();
        assert_eq!(n.kind, NotificationKind::BookingApproved);
        assert_eq!(n.priority, Priority::High);
        assert!(n.action_required);
        assert_eq!(n.action_url.as_deref(), Some("/bookings/bk-9"));
        assert_eq!(n.vehicle_title, "1987 Land Cruiser");
        assert_eq!(n.renter_name.as_deref(), Some("Mara"));
        assert_eq!(n.host_name.as_deref(), Some("Theo"));
        assert!(!n.read);
    }

    #[test]
    fn cancellation_carries_the_reason_at_urgent_priority() {
        let booking = booking();
        let n = NotificationData::from_event(
            &event(
                EventType::BookingCancelled,
                Some(StepData::new().with_reason("fraud suspected")),
            ),
            Some(&booking),
        )
        .unwrap();
        assert_eq!(n.priority, Priority::Urgent);
        assert!(n.message.contains("fraud suspected"));
        assert!(!n.action_required);
        assert_eq!(n.action_url, None);
    }

    #[test]
    fn mid_rental_event_types_produce_no_notification() {
        for ty in [
            EventType::VehiclePreparation,
            EventType::PickupHandover,
            EventType::RentalPeriod,
            EventType::ReturnHandover,
        ] {
            assert!(NotificationData::from_event(&event(ty, None), None).is_none());
        }
    }

    #[test]
    fn missing_booking_degrades_to_placeholder_title() {
        let n = NotificationData::from_event(&event(EventType::BookingCreated, None), None).unwrap();
        assert_eq!(n.vehicle_title, "booking bk-9");
        assert_eq!(n.renter_name, None);
        assert_eq!(n.amount_cents, None);
        assert!(n.message.starts_with("A renter requested"));
    }

    #[test]
    fn payment_notice_carries_the_amount() {
        let booking = booking();
        let n = NotificationData::from_event(
            &event(EventType::PaymentProcessed, None),
            Some(&booking),
        )
        .unwrap();
        assert_eq!(n.amount_cents, Some(120_000));
        assert_eq!(n.priority, Priority::Medium);
    }
}
