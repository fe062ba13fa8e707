// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Retry strategy.
//!
//! Re-executes a callback while its outcome is handled by the configured predicate, waiting
//! between attempts according to a backoff schedule or a custom delay generator.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use airbag::retry::RetryOptions;
//! use airbag::{Outcome, PipelineBuilder};
//! use tick::Clock;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = Clock::new_frozen();
//! let pipeline = PipelineBuilder::new(&clock)
//!     .name("orders")
//!     .add_retry(RetryOptions::new().max_retry_attempts(2).base_delay(Duration::ZERO))
//!     .build()?;
//!
//! let outcome = pipeline
//!     .execute(|_, id: &u32| {
//!         let id = *id;
//!         async move { Outcome::from_value(id * 2) }
//!     }, &21)
//!     .await;
//!
//! assert_eq!(outcome.into_value(), Some(42));
//! # Ok(())
//! # }
//! ```
//!
//! # Retry Delay
//!
//! The delay before each retry is determined in this order:
//!
//! 1. **Delay generator**: when [`RetryOptions::delay_generator`] returns `Some`, that delay is used.
//! 2. **Backoff**: otherwise the configured [`Backoff`][crate::Backoff] computes the delay,
//!    clamped to the optional min and max delay.
//!
//! A zero delay retries immediately without touching the clock. Cancellation during the delay
//! ends the execution with [`ExecutionCanceled`][crate::ExecutionCanceled].
//!
//! # Defaults
//!
//! | Parameter | Default Value | Configured By |
//! |-----------|---------------|---------------|
//! | Max retry attempts | `3` (4 total) | [`max_retry_attempts`][RetryOptions::max_retry_attempts], [`infinite_retry_attempts`][RetryOptions::infinite_retry_attempts] |
//! | Base delay | `2` seconds | [`base_delay`][RetryOptions::base_delay] |
//! | Backoff | `Exponential` | [`backoff`][RetryOptions::backoff] |
//! | Jitter | `Enabled` | [`use_jitter`][RetryOptions::use_jitter] |
//! | Handled outcomes | every failure except cancellation | [`should_handle`][RetryOptions::should_handle], [`should_handle_any`][RetryOptions::should_handle_any] |
//!
//! # Telemetry
//!
//! Every attempt reports [`ExecutionAttempt`][crate::telemetry::EventKind::ExecutionAttempt]
//! and every retry reports [`OnRetry`][crate::telemetry::EventKind::OnRetry].

mod args;
mod backoff;
mod callbacks;
mod constants;
mod options;
mod strategy;

pub use args::{OnRetryArgs, RetryDelayArgs};
pub(crate) use callbacks::{DelayGenerator, OnRetry};
pub use options::RetryOptions;
pub use strategy::RetryStrategy;
