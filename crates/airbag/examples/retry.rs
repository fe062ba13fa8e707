// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Basic retry example: a flaky operation is retried with exponential backoff.

use std::io::Error;
use std::time::Duration;

use airbag::retry::RetryOptions;
use airbag::{Backoff, Outcome, PipelineBuilder};
use tick::Clock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let clock = Clock::new_tokio();

    let pipeline = PipelineBuilder::new(&clock)
        .name("my_pipeline")
        .add_retry(
            RetryOptions::new()
                .max_retry_attempts(4)
                .backoff(Backoff::Exponential)
                .base_delay(Duration::from_millis(100))
                // only transient errors are worth another attempt
                .handle_error::<Error>()
                .on_retry(|args| {
                    println!(
                        "attempt {} failed, retrying in {}ms",
                        args.attempt_number(),
                        args.retry_delay().as_millis()
                    );
                }),
        )
        .build()?;

    let outcome = pipeline
        .execute(|_, input: &str| {
            let input = input.to_owned();
            async move { Outcome::from_result(execute_operation(input).await) }
        }, "value")
        .await;

    match outcome.into_result() {
        Ok(output) => println!("execution succeeded, result: {output}"),
        Err(e) => println!("execution failed, error: {e}"),
    }

    Ok(())
}

// 40% chance of failing with a transient error
async fn execute_operation(input: String) -> Result<String, Error> {
    if fastrand::u8(0..10) < 4 {
        Err(Error::other("transient execution error"))
    } else {
        Ok(input)
    }
}
