// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Circuit breaker example that simulates a major service outage and tripping of the
//! circuit breaker by:
//!
//! 1. Monitoring failure rates over a rolling window
//! 2. Opening the circuit when the failure ratio is exceeded
//! 3. Letting a probe request through once the break elapsed
//! 4. Closing the circuit when the service recovers

use std::time::Duration;

use airbag::breaker::{CircuitBreakerOptions, CircuitBreakerStateProvider, SamplingWindow};
use airbag::{Outcome, PipelineBuilder};
use tick::Clock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).init();

    let clock = Clock::new_tokio();
    let state = CircuitBreakerStateProvider::new();

    let pipeline = PipelineBuilder::new(&clock)
        .name("my_pipeline")
        .add_circuit_breaker(
            CircuitBreakerOptions::new()
                // Decrease the following values to see the circuit breaker trip faster
                .failure_ratio(0.5)
                .minimum_throughput(5)
                .sampling(SamplingWindow::Time(Duration::from_secs(2)))
                .break_duration(Duration::from_secs(1))
                .state_provider(&state)
                .on_half_opened(|_| println!("probing request let in to see if the service has recovered"))
                .on_opened(|args| println!("circuit opened for {}ms", args.break_duration().as_millis()))
                .on_closed(|_| println!("circuit closed because probing succeeded")),
        )
        .enable_logs()
        .build()?;

    // The service recovers after request 100, increase the number of requests to see the
    // circuit close for good.
    for request in 0..60_u32 {
        clock.delay(Duration::from_millis(50)).await;

        let outcome = pipeline
            .execute(|_, request: &u32| execute_operation(*request), &request)
            .await;

        match outcome.into_result() {
            Ok(output) => println!("{request}: {output} (circuit {})", state.circuit_state().as_str()),
            Err(e) => println!("{request}: {e} (circuit {})", state.circuit_state().as_str()),
        }
    }

    Ok(())
}

// Simulate major service outage, 50% chance of failing
async fn execute_operation(input: u32) -> Outcome<String> {
    if input > 100 || fastrand::u8(0..10) < 5 {
        Outcome::from_value(format!("output-{input}"))
    } else {
        Outcome::from_error(std::io::Error::other(format!("transient error for '{input}'")))
    }
}
