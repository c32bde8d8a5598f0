//! Concurrency tests: transitions on one booking are serialized, while
//! distinct bookings proceed in parallel.

use rentflow::event::{Actor, StepData};
use rentflow::state::BookingStatus;
use rentflow::step::WorkflowStep;
use rentflow_integration_tests::{engine_with, sample_booking};
use std::collections::BTreeSet;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_on_one_booking_all_land() {
    let booking = sample_booking("bk-1");
    let engine = Arc::new(engine_with(&[booking.clone()]));
    engine.register(&booking).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let id = booking.id.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .process_step(&id, WorkflowStep::PaymentProcessed, Actor::System, None)
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let state = engine.get(&booking.id).await.unwrap();
    // seed plus eight payments: none lost, none duplicated
    assert_eq!(state.events.len(), 9);

    let ids: BTreeSet<_> = state.events.iter().map(|event| event.id).collect();
    assert_eq!(ids.len(), 9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_concurrent_approval_and_payment_both_commit() {
    let booking = sample_booking("bk-1");
    let engine = Arc::new(engine_with(&[booking.clone()]));
    engine.register(&booking).await.unwrap();

    let approve = {
        let engine = Arc::clone(&engine);
        let id = booking.id.clone();
        tokio::spawn(async move {
            engine
                .process_step(
                    &id,
                    WorkflowStep::HostApproval,
                    Actor::Host,
                    Some(StepData::approve()),
                )
                .await
                .unwrap();
        })
    };
    let pay = {
        let engine = Arc::clone(&engine);
        let id = booking.id.clone();
        tokio::spawn(async move {
            engine
                .process_step(&id, WorkflowStep::PaymentProcessed, Actor::System, None)
                .await
                .unwrap();
        })
    };
    approve.await.unwrap();
    pay.await.unwrap();

    let state = engine.get(&booking.id).await.unwrap();
    assert_eq!(state.events.len(), 3);
    assert_eq!(state.status, BookingStatus::Confirmed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn distinct_bookings_advance_independently_in_parallel() {
    let bookings: Vec<_> = (0..6).map(|i| sample_booking(&format!("bk-{i}"))).collect();
    let engine = Arc::new(engine_with(&bookings));

    let mut tasks = Vec::new();
    for booking in &bookings {
        let engine = Arc::clone(&engine);
        let booking = booking.clone();
        tasks.push(tokio::spawn(async move {
            engine.register(&booking).await.unwrap();
            engine
                .process_step(
                    &booking.id,
                    WorkflowStep::HostApproval,
                    Actor::Host,
                    Some(StepData::approve()),
                )
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for booking in &bookings {
        let state = engine.get(&booking.id).await.unwrap();
        assert_eq!(state.status, BookingStatus::Confirmed);
        assert_eq!(state.events.len(), 2);
    }
}
