// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! This example demonstrates how to combine multiple resilience strategies into a
//! single pipeline with logs and metrics enabled.

use std::io::Error;
use std::time::Duration;

use airbag::breaker::CircuitBreakerOptions;
use airbag::retry::RetryOptions;
use airbag::timeout::TimeoutOptions;
use airbag::{Outcome, PipelineBuilder};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_stdout::MetricExporter;
use tick::Clock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let meter_provider = configure_telemetry();
    let clock = Clock::new_tokio();

    // Strategies run in the order they are added: the retry wraps the circuit breaker,
    // which wraps the timeout of each single attempt.
    let pipeline = PipelineBuilder::new(&clock)
        .name("my_pipeline")
        .instance_name("example")
        .add_retry(
            RetryOptions::new()
                .max_retry_attempts(3)
                .base_delay(Duration::from_millis(100)),
        )
        .add_circuit_breaker(CircuitBreakerOptions::new().minimum_throughput(10))
        .add_timeout(TimeoutOptions::with_timeout(Duration::from_millis(200)))
        .enable_logs()
        .enable_metrics(&meter_provider)
        .build()?;

    for strategy in pipeline.descriptor().strategies() {
        println!("strategy '{}' of type {}", strategy.name(), strategy.type_name());
    }

    let mut context = pipeline.context_pool().get();
    context.set_operation_key("read_value");

    let outcome = pipeline
        .execute_with_context(|context, input: &str| {
            let input = input.to_owned();
            let clock = context.clock().clone();
            async move { Outcome::from_result(execute_operation(&clock, input).await) }
        }, &mut context, "value")
        .await;

    pipeline.context_pool().put(context);

    match outcome.into_result() {
        Ok(output) => println!("execution succeeded, result: {output}"),
        Err(e) => println!("execution failed, error: {e}"),
    }

    // Flush metrics to stdout before exiting
    meter_provider.force_flush()?;

    Ok(())
}

// Half of the calls fail, a fifth of them are too slow
async fn execute_operation(clock: &Clock, input: String) -> Result<String, Error> {
    match fastrand::u8(0..10) {
        0..5 => Err(Error::other("transient execution error")),
        5..7 => {
            clock.delay(Duration::from_secs(1)).await;
            Ok(input)
        }
        _ => Ok(input),
    }
}

fn configure_telemetry() -> SdkMeterProvider {
    tracing_subscriber::registry().with(tracing_subscriber::fmt::layer()).init();

    SdkMeterProvider::builder()
        .with_periodic_exporter(MetricExporter::default())
        .build()
}
