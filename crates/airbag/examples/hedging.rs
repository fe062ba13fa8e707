// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hedging example demonstrating how a slow primary request is hedged
//! with a faster secondary request that completes first.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use airbag::hedging::HedgingOptions;
use airbag::{Outcome, PipelineBuilder};
use tick::Clock;

static CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::new_tokio();

    // If the primary request hasn't completed after 200ms, launch a hedged one.
    // The first acceptable response wins and the other one is cancelled.
    let pipeline = PipelineBuilder::new(&clock)
        .add_hedging(
            HedgingOptions::new()
                .max_hedged_attempts(2)
                .delay(Duration::from_millis(200))
                .on_hedging(|args| println!("[hedge] launching attempt {}", args.attempt_number())),
        )
        .build()?;

    println!("[main] sending request...");
    let stopwatch = clock.stopwatch();

    let outcome = pipeline
        .execute(|context, input: &str| {
            let input = input.to_owned();
            let clock = context.clock().clone();
            async move { Outcome::from_value(slow_then_fast_operation(&clock, input).await) }
        }, "hello")
        .await;

    println!("[main] result: {:?} (took {:?})", outcome.into_value(), stopwatch.elapsed());

    Ok(())
}

/// Simulates a service where the first call is slow (500ms) and the second
/// call (the hedge) is fast (50ms).
async fn slow_then_fast_operation(clock: &Clock, input: String) -> String {
    let call = CALL_COUNT.fetch_add(1, Ordering::Relaxed);

    if call == 0 {
        println!("[service] attempt 0: slow path (500ms)");
        clock.delay(Duration::from_millis(500)).await;
        format!("{input} - slow response")
    } else {
        println!("[service] attempt {call}: fast path (50ms)");
        clock.delay(Duration::from_millis(50)).await;
        format!("{input} - fast response")
    }
}
