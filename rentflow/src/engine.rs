//! The workflow engine: the single entry point through which all workflow
//! state changes occur.
//!
//! One engine is constructed per process (or per test) and handed its
//! collaborators explicitly: a [`WorkflowStore`] for state, a
//! [`BookingDirectory`] for booking data, and an owned [`Dispatcher`] for
//! fan-out. There is no hidden global instance.
//!
//! Transitions on the same booking are serialized through a per-booking
//! async mutex: at most one transition is in flight per booking id at a
//! time, while transitions on different bookings proceed in parallel.

use crate::booking::{Booking, BookingDirectory, PartyRole};
use crate::dispatcher::{ChannelEvent, Dispatcher};
use crate::errors::{StoreError, WorkflowError, WorkflowResult};
use crate::event::{Actor, ApprovalAction, EventType, StepData, WorkflowEvent};
use crate::state::{BookingStatus, WorkflowState};
use crate::step::WorkflowStep;
use crate::store::WorkflowStore;
use crate::types::{BookingId, PartyId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The outcome a privileged operator forces outside the normal step graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideAction {
    /// Force the booking into `confirmed`.
    Approve,
    /// Force the booking into `cancelled`, recorded as a decline.
    Decline,
    /// Force the booking into `cancelled`.
    Cancel,
}

/// Engine policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    enforce_step_order: bool,
}

impl EngineOptions {
    /// Default policy: lifecycle steps are validated against `next_actions`.
    pub const fn new() -> Self {
        Self {
            enforce_step_order: true,
        }
    }

    /// Controls whether lifecycle steps are validated against the state's
    /// `next_actions` set.
    ///
    /// With enforcement off, `next_actions` is advisory only; the caller's
    /// UI layer is trusted to send only legal steps.
    #[must_use]
    pub const fn with_step_order_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_step_order = enforce;
        self
    }

    /// Whether lifecycle steps are validated against `next_actions`.
    pub const fn enforces_step_order(&self) -> bool {
        self.enforce_step_order
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Coordinates workflow state, the event log, and notification fan-out for
/// every registered booking.
pub struct WorkflowEngine<S, B> {
    store: S,
    directory: B,
    dispatcher: Dispatcher,
    options: EngineOptions,
    // Per-booking transition guards; entries live as long as the process,
    // like the workflow states they serialize.
    locks: Mutex<HashMap<BookingId, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S, B> WorkflowEngine<S, B>
where
    S: WorkflowStore,
    B: BookingDirectory,
{
    /// Creates an engine with default options.
    pub fn new(store: S, directory: B) -> Self {
        Self::with_options(store, directory, EngineOptions::new())
    }

    /// Creates an engine with explicit options.
    pub fn with_options(store: S, directory: B, options: EngineOptions) -> Self {
        Self {
            store,
            directory,
            dispatcher: Dispatcher::new(),
            options,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// The engine's dispatcher, for subscribing to channel events.
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Registers a booking and seeds its workflow.
    ///
    /// Emits `workflow_initialized` and the seed event's notification.
    /// Fails with [`WorkflowError::DuplicateBooking`] if the booking id is
    /// already registered.
    #[instrument(skip(self, booking), fields(booking_id = %booking.id))]
    pub async fn register(&self, booking: &Booking) -> WorkflowResult<WorkflowState> {
        let guard = self.transition_lock(&booking.id);
        let _held = guard.lock().await;

        let state = WorkflowState::seed(booking);
        self.store
            .insert(state.clone())
            .await
            .map_err(|err| match err {
                StoreError::Duplicate(id) => WorkflowError::DuplicateBooking(id),
                other => WorkflowError::Store(other),
            })?;

        info!(status = %state.status, "workflow registered");

        self.dispatcher.emit(&ChannelEvent::WorkflowInitialized {
            booking_id: booking.id.clone(),
            state: state.clone(),
        });
        let seed = state
            .latest_event()
            .expect("seeded state always carries its seed event");
        self.dispatcher.dispatch_notifications(Some(booking), seed);

        Ok(state)
    }

    /// Processes one workflow step for a registered booking.
    ///
    /// Appends the event, applies the status rule, recomputes the derived
    /// views, persists the state, and emits `workflow_updated` followed by
    /// any notification the event maps to.
    #[instrument(skip(self, data), fields(booking_id = %booking_id))]
    pub async fn process_step(
        &self,
        booking_id: &BookingId,
        step: WorkflowStep,
        actor: Actor,
        data: Option<StepData>,
    ) -> WorkflowResult<WorkflowState> {
        let guard = self.transition_lock(booking_id);
        let _held = guard.lock().await;

        let mut state = self
            .store
            .get(booking_id)
            .await?
            .ok_or_else(|| WorkflowError::BookingNotFound(booking_id.clone()))?;

        if step.is_lifecycle()
            && self.options.enforce_step_order
            && !state.next_actions.contains(&step)
        {
            return Err(WorkflowError::StepNotAllowed {
                step,
                current: state.current_step,
                allowed: state.next_actions.iter().copied().collect(),
            });
        }

        let event_type = event_type_for(step, data.as_ref())?;
        let event = WorkflowEvent::record(booking_id.clone(), event_type, actor, data);

        state.append(event.clone());
        state.current_step = step;
        match event_type {
            EventType::BookingApproved => state.status = BookingStatus::Confirmed,
            EventType::BookingDeclined => state.status = BookingStatus::Cancelled,
            EventType::BookingCompleted => state.status = BookingStatus::Completed,
            _ => {}
        }
        state.derive();

        self.store.put(state.clone()).await?;

        info!(
            step = %step,
            status = %state.status,
            progress = state.progress,
            "workflow step processed"
        );

        self.dispatcher.emit(&ChannelEvent::WorkflowUpdated {
            booking_id: booking_id.clone(),
            state: state.clone(),
            event: event.clone(),
        });
        let booking = self.enriched_booking(booking_id).await;
        self.dispatcher
            .dispatch_notifications(booking.as_ref(), &event);

        Ok(state)
    }

    /// Forces a terminal-ish outcome outside the normal step graph.
    ///
    /// Always audited: the appended event carries `actor = admin`, the
    /// mandatory reason, and the override marker. Legal from any
    /// non-terminal state regardless of the current step.
    #[instrument(skip(self, reason), fields(booking_id = %booking_id))]
    pub async fn admin_override(
        &self,
        booking_id: &BookingId,
        action: OverrideAction,
        reason: &str,
    ) -> WorkflowResult<WorkflowState> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(WorkflowError::EmptyReason);
        }

        let guard = self.transition_lock(booking_id);
        let _held = guard.lock().await;

        let mut state = self
            .store
            .get(booking_id)
            .await?
            .ok_or_else(|| WorkflowError::BookingNotFound(booking_id.clone()))?;

        if state.status.is_terminal() {
            return Err(WorkflowError::TerminalState(booking_id.clone()));
        }

        let event_type = match action {
            OverrideAction::Approve => EventType::BookingApproved,
            OverrideAction::Decline => EventType::BookingDeclined,
            OverrideAction::Cancel => EventType::BookingCancelled,
        };
        let event = WorkflowEvent::record(
            booking_id.clone(),
            event_type,
            Actor::Admin,
            Some(StepData::admin(reason)),
        );

        state.append(event.clone());
        state.status = match action {
            OverrideAction::Approve => BookingStatus::Confirmed,
            OverrideAction::Decline | OverrideAction::Cancel => BookingStatus::Cancelled,
        };
        state.derive();

        self.store.put(state.clone()).await?;

        info!(?action, reason, status = %state.status, "admin override applied");

        self.dispatcher.emit(&ChannelEvent::AdminOverride {
            booking_id: booking_id.clone(),
            state: state.clone(),
            event,
        });

        Ok(state)
    }

    /// Returns a snapshot of the workflow state for `booking_id`.
    pub async fn get(&self, booking_id: &BookingId) -> WorkflowResult<WorkflowState> {
        self.store
            .get(booking_id)
            .await?
            .ok_or_else(|| WorkflowError::BookingNotFound(booking_id.clone()))
    }

    /// Returns the workflow states of every booking in which `party`
    /// participates as `role`.
    ///
    /// Party filtering is delegated to the booking directory; ids it reports
    /// that have no registered workflow are skipped.
    pub async fn list_for_party(
        &self,
        party: &PartyId,
        role: PartyRole,
    ) -> WorkflowResult<Vec<WorkflowState>> {
        let ids = self.directory.bookings_for_party(party, role).await?;
        let mut states = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(state) = self.store.get(&id).await? {
                states.push(state);
            }
        }
        Ok(states)
    }

    fn transition_lock(&self, booking_id: &BookingId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(
            locks
                .entry(booking_id.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Booking data for notification enrichment. Lookup failures are logged
    /// and degrade to an unenriched notification: the transition has already
    /// committed and must not fail on delivery-side problems.
    async fn enriched_booking(&self, booking_id: &BookingId) -> Option<Booking> {
        match self.directory.booking(booking_id).await {
            Ok(booking) => booking,
            Err(err) => {
                warn!(%err, "booking lookup failed; notification will not be enriched");
                None
            }
        }
    }
}

/// The step-to-event-type mapping from the transition table.
fn event_type_for(step: WorkflowStep, data: Option<&StepData>) -> WorkflowResult<EventType> {
    match step {
        WorkflowStep::BookingCreated => Ok(EventType::BookingCreated),
        WorkflowStep::HostApproval => match data.and_then(|d| d.action) {
            Some(ApprovalAction::Approve) => Ok(EventType::BookingApproved),
            Some(ApprovalAction::Decline) => Ok(EventType::BookingDeclined),
            None => Err(WorkflowError::MissingDecision),
        },
        WorkflowStep::VehiclePreparation => Ok(EventType::VehiclePreparation),
        WorkflowStep::PickupHandover => Ok(EventType::PickupHandover),
        WorkflowStep::RentalPeriod => Ok(EventType::RentalPeriod),
        WorkflowStep::ReturnHandover => Ok(EventType::ReturnHandover),
        WorkflowStep::BookingComplete => Ok(EventType::BookingCompleted),
        WorkflowStep::PaymentProcessed => Ok(EventType::PaymentProcessed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_enforce_step_order_by_default() {
        assert!(EngineOptions::new().enforces_step_order());
        assert!(!EngineOptions::new()
            .with_step_order_enforcement(false)
            .enforces_step_order());
    }

    #[test]
    fn host_approval_requires_a_decision() {
        let err = event_type_for(WorkflowStep::HostApproval, None).unwrap_err();
        assert!(matches!(err, WorkflowError::MissingDecision));

        let approved =
            event_type_for(WorkflowStep::HostApproval, Some(&StepData::approve())).unwrap();
        assert_eq!(approved, EventType::BookingApproved);
        let declined =
            event_type_for(WorkflowStep::HostApproval, Some(&StepData::decline())).unwrap();
        assert_eq!(declined, EventType::BookingDeclined);
    }
}
