//! Synchronous publish/subscribe fan-out for workflow events.
//!
//! The dispatcher decouples workflow transitions from whatever external
//! channel consumes them. Emission is synchronous and in subscription
//! order: a transition does not return until every subscriber for the
//! triggered channel has run. State update therefore happens-before
//! notification delivery, at the cost that a slow subscriber delays the
//! transition's caller. Genuinely slow work (sending email, push fan-out)
//! belongs on a queue fed from a fast subscriber callback.
//!
//! A panicking subscriber is isolated: the panic is caught and logged, and
//! remaining subscribers still run. The transition that triggered the
//! emission has already committed by then and is unaffected.

use crate::booking::Booking;
use crate::event::WorkflowEvent;
use crate::notification::NotificationData;
use crate::state::WorkflowState;
use crate::types::BookingId;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// The typed channels the engine emits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// A booking was registered and its workflow seeded.
    WorkflowInitialized,
    /// A transition advanced a workflow.
    WorkflowUpdated,
    /// A privileged override was applied.
    AdminOverride,
    /// A notification record was synthesized for delivery.
    NotificationCreated,
}

/// Payload delivered to subscribers, one variant per channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// Seed state for a newly registered booking.
    WorkflowInitialized {
        /// The registered booking.
        booking_id: BookingId,
        /// The freshly seeded state.
        state: WorkflowState,
    },
    /// State and event for a processed transition.
    WorkflowUpdated {
        /// The transitioned booking.
        booking_id: BookingId,
        /// State after the transition.
        state: WorkflowState,
        /// The event the transition appended.
        event: WorkflowEvent,
    },
    /// State and event for an applied admin override.
    AdminOverride {
        /// The overridden booking.
        booking_id: BookingId,
        /// State after the override.
        state: WorkflowState,
        /// The override event, always carrying `actor = admin`.
        event: WorkflowEvent,
    },
    /// A notification ready for the delivery collaborator.
    NotificationCreated {
        /// The booking the notification concerns.
        booking_id: BookingId,
        /// The synthesized notification.
        notification: NotificationData,
    },
}

impl ChannelEvent {
    /// The channel this payload is delivered on.
    pub const fn channel(&self) -> Channel {
        match self {
            Self::WorkflowInitialized { .. } => Channel::WorkflowInitialized,
            Self::WorkflowUpdated { .. } => Channel::WorkflowUpdated,
            Self::AdminOverride { .. } => Channel::AdminOverride,
            Self::NotificationCreated { .. } => Channel::NotificationCreated,
        }
    }
}

/// Handle identifying one subscription, returned by [`Dispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&ChannelEvent) + Send + Sync>;

/// In-process publish/subscribe registry.
pub struct Dispatcher {
    subscribers: RwLock<HashMap<Channel, Vec<(SubscriptionId, Subscriber)>>>,
    next_id: AtomicU64,
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers `callback` on `channel` and returns its handle.
    ///
    /// Multiple callbacks per channel are invoked in subscription order.
    pub fn subscribe<F>(&self, channel: Channel, callback: F) -> SubscriptionId
    where
        F: Fn(&ChannelEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(channel)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Removes exactly the registration identified by `id`.
    ///
    /// Returns whether a registration was removed.
    pub fn unsubscribe(&self, channel: Channel, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let Some(entries) = subscribers.get_mut(&channel) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        before != entries.len()
    }

    /// The number of live subscriptions on `channel`.
    pub fn subscriber_count(&self, channel: Channel) -> usize {
        self.subscribers
            .read()
            .get(&channel)
            .map_or(0, Vec::len)
    }

    /// Synchronously invokes every current subscriber for the event's
    /// channel, in subscription order.
    ///
    /// The subscriber list is snapshotted first, so callbacks may themselves
    /// subscribe or unsubscribe without deadlocking; such changes take
    /// effect from the next emission.
    pub fn emit(&self, event: &ChannelEvent) {
        let snapshot: Vec<(SubscriptionId, Subscriber)> = self
            .subscribers
            .read()
            .get(&event.channel())
            .cloned()
            .unwrap_or_default();

        debug!(
            channel = ?event.channel(),
            subscribers = snapshot.len(),
            "emitting channel event"
        );

        for (id, callback) in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                error!(
                    channel = ?event.channel(),
                    subscription = ?id,
                    "subscriber panicked; continuing with remaining subscribers"
                );
            }
        }
    }

    /// Synthesizes the notification for `event` (if its type has a mapping)
    /// and emits it on [`Channel::NotificationCreated`].
    pub fn dispatch_notifications(&self, booking: Option<&Booking>, event: &WorkflowEvent) {
        if let Some(notification) = NotificationData::from_event(event, booking) {
            self.emit(&ChannelEvent::NotificationCreated {
                booking_id: event.booking_id.clone(),
                notification,
            });
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
