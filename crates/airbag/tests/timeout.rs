// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the timeout strategy using only the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use airbag::timeout::TimeoutOptions;
use airbag::{ExecutionCanceled, Outcome, PipelineBuilder, TimeoutRejected};
use tick::{Clock, ClockControl};
use tokio_util::sync::CancellationToken;

fn auto_clock() -> (ClockControl, Clock) {
    let control = ClockControl::new().auto_advance_timers(true);
    let clock = control.to_clock();
    (control, clock)
}

async fn wait_for_cancellation(token: CancellationToken) -> Outcome<String> {
    token.cancelled().await;
    Outcome::from_error(ExecutionCanceled)
}

#[tokio::test]
async fn hanging_callback_is_rejected() {
    let (_control, clock) = auto_clock();
    let timeouts = Arc::new(AtomicU32::new(0));
    let pipeline = PipelineBuilder::new(&clock)
        .add_timeout(TimeoutOptions::with_timeout(Duration::from_secs(3)).on_timeout({
            let timeouts = Arc::clone(&timeouts);
            move |args| {
                assert_eq!(args.timeout(), Duration::from_secs(3));
                timeouts.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .build()
        .unwrap();
    let stopwatch = clock.stopwatch();

    let outcome = pipeline
        .execute(|context, _: &()| wait_for_cancellation(context.cancellation_token().clone()), &())
        .await;

    let failure = outcome.failure().unwrap();
    assert_eq!(failure.downcast_ref::<TimeoutRejected>().unwrap().timeout(), Duration::from_secs(3));
    assert!(!failure.is_cancellation());
    assert_eq!(stopwatch.elapsed(), Duration::from_secs(3));
    assert_eq!(timeouts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn caller_cancellation_is_not_a_timeout() {
    let (_control, clock) = auto_clock();
    let timeouts = Arc::new(AtomicU32::new(0));
    let pipeline = PipelineBuilder::new(&clock)
        .add_timeout(TimeoutOptions::with_timeout(Duration::from_secs(3)).on_timeout({
            let timeouts = Arc::clone(&timeouts);
            move |_| {
                timeouts.fetch_add(1, Ordering::SeqCst);
            }
        }))
        .build()
        .unwrap();
    let caller = CancellationToken::new();
    let mut context = pipeline.context_pool().get_with(caller.clone());

    let outcome = pipeline
        .execute_with_context(|context, caller: &CancellationToken| {
            caller.cancel();
            wait_for_cancellation(context.cancellation_token().clone())
        }, &mut context, &caller)
        .await;

    assert!(outcome.failure().unwrap().is::<ExecutionCanceled>());
    assert_eq!(timeouts.load(Ordering::SeqCst), 0);
    // the caller token is back in place once the strategy completes
    assert!(context.cancellation_token().is_cancelled());
}

#[tokio::test]
async fn generator_picks_timeout_per_operation() {
    let (_control, clock) = auto_clock();
    let pipeline = PipelineBuilder::new(&clock)
        .add_timeout(TimeoutOptions::new().timeout_generator(|args| match args.context().operation_key() {
            Some("slow") => Duration::from_secs(20),
            _ => Duration::from_secs(1),
        }))
        .build()
        .unwrap();

    for (key, expected) in [("slow", Duration::from_secs(20)), ("fast", Duration::from_secs(1))] {
        let mut context = pipeline.context_pool().get();
        context.set_operation_key(key);

        let outcome = pipeline
            .execute_with_context(|context, _: &()| wait_for_cancellation(context.cancellation_token().clone()), &mut context, &())
            .await;

        let rejected = outcome.failure().unwrap().downcast_ref::<TimeoutRejected>().copied();
        assert_eq!(rejected.map(|rejected| rejected.timeout()), Some(expected));
    }
}

#[tokio::test]
async fn fast_callback_keeps_value() {
    let pipeline = PipelineBuilder::new(&Clock::new_frozen())
        .add_timeout(TimeoutOptions::with_timeout(Duration::from_millis(10)))
        .build()
        .unwrap();

    let outcome = pipeline
        .execute(|_, _: &()| async { Outcome::from_value("done".to_owned()) }, &())
        .await;

    assert_eq!(outcome.into_value().as_deref(), Some("done"));
}
