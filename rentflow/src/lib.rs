//! Rentflow - booking workflow engine for peer-to-peer vehicle rentals.
//!
//! Rentflow tracks the lifecycle of a single rental transaction from
//! creation through approval, vehicle handover, the active rental period,
//! return, and completion or cancellation. Each booking owns an append-only
//! event log from which its status, progress, next actions, and blockers
//! are derived; a synchronous publish/subscribe dispatcher fans transitions
//! out to external consumers such as notification delivery.
//!
//! The engine is deliberately small at its boundaries: booking creation,
//! persistence, and transport belong to surrounding services, reached
//! through the [`WorkflowStore`] and [`BookingDirectory`] ports.
//!
//! ```rust,ignore
//! use rentflow::{Actor, StepData, WorkflowEngine, WorkflowStep};
//!
//! let engine = WorkflowEngine::new(store, directory);
//! engine.register(&booking).await?;
//! engine
//!     .process_step(&booking.id, WorkflowStep::HostApproval, Actor::Host,
//!         Some(StepData::approve()))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod booking;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod event;
pub mod notification;
pub mod state;
pub mod step;
pub mod store;
pub mod types;

pub use booking::{Booking, BookingDirectory, Party, PartyRole};
pub use dispatcher::{Channel, ChannelEvent, Dispatcher, SubscriptionId};
pub use engine::{EngineOptions, OverrideAction, WorkflowEngine};
pub use errors::{StoreError, StoreResult, WorkflowError, WorkflowResult};
pub use event::{Actor, ApprovalAction, EventType, StepData, WorkflowEvent};
pub use notification::{NotificationData, NotificationKind, Priority};
pub use state::{BookingStatus, WorkflowState};
pub use step::{WorkflowStep, LIFECYCLE};
pub use store::WorkflowStore;
pub use types::{BookingId, EventId, NotificationId, PartyId, Timestamp};
