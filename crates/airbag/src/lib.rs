// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(
    not(all(feature = "logs", feature = "metrics", feature = "serde")),
    expect(
        rustdoc::broken_intra_doc_links,
        reason = "feature gated items are only linked when all features are enabled"
    )
)]

//! Composable resilience pipelines.
//!
//! This crate wraps an arbitrary unit of work with fault handling strategies: retries with
//! backoff, circuit breaking, hedged execution and cooperative timeouts. Strategies are
//! combined into a [`Pipeline`] that preserves the result type of the wrapped callback and
//! propagates cancellation and timing uniformly.
//!
//! # Core Types
//!
//! - [`Outcome`]: the result of an execution, either a value or a captured [`Failure`].
//! - [`ExecutionContext`]: per-call state with a cancellation token, an operation key,
//!   custom properties and the [`Clock`][tick::Clock] used for all timing.
//! - [`Strategy`]: a resilience strategy. Implement it to add custom behavior to a pipeline.
//! - [`PipelineBuilder`] and [`Pipeline`]: composition of strategies and execution of callbacks.
//!
//! # Strategies
//!
//! - [`retry`]: re-executes handled outcomes with constant, linear or exponential backoff.
//! - [`breaker`]: stops calling a failing dependency until it had time to recover.
//! - [`hedging`]: races concurrent attempts to cut tail latency.
//! - [`timeout`]: bounds the duration of an execution.
//!
//! # Quick Start
//!
//! ```rust
//! use std::time::Duration;
//!
//! use airbag::breaker::CircuitBreakerOptions;
//! use airbag::retry::RetryOptions;
//! use airbag::timeout::TimeoutOptions;
//! use airbag::{Outcome, PipelineBuilder};
//! use tick::Clock;
//!
//! # async fn example(clock: Clock) -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PipelineBuilder::new(&clock)
//!     .name("inventory")
//!     // outermost: retries whatever the inner strategies return
//!     .add_retry(RetryOptions::new().handle_error::<std::io::Error>())
//!     .add_circuit_breaker(CircuitBreakerOptions::new())
//!     // innermost: bounds every single attempt
//!     .add_timeout(TimeoutOptions::with_timeout(Duration::from_secs(2)))
//!     .build()?;
//!
//! let stock = pipeline
//!     .execute(|_context, item: &str| {
//!         let item = item.to_owned();
//!         async move { Outcome::from_result(query_stock(&item).await) }
//!     }, "widget")
//!     .await
//!     .into_result()?;
//! # let _ = stock;
//! # Ok(())
//! # }
//! # async fn query_stock(_item: &str) -> Result<u32, std::io::Error> { Ok(3) }
//! ```
//!
//! # Cancellation
//!
//! Every execution observes the cancellation token of its context. Cancellation is checked
//! between strategies and at every suspension point, and always ends the execution with
//! [`ExecutionCanceled`]. Cancelled outcomes are never retried, hedged or recorded by a
//! circuit breaker.
//!
//! # Time
//!
//! All delays and measurements go through the [`Clock`][tick::Clock] passed to
//! [`PipelineBuilder::new`]. Tests substitute a controlled clock to run without waiting.
//!
//! # Features
//!
//! - `logs`: [`PipelineBuilder::enable_logs`] reports telemetry events with `tracing`.
//! - `metrics`: [`PipelineBuilder::enable_metrics`] counts telemetry events with `OpenTelemetry`.
//! - `serde`: [`config`] describes pipelines in configuration documents.

mod constants;
mod context;
mod errors;
mod outcome;
mod pipeline;
mod predicate;
mod rnd;
mod strategy;

pub(crate) mod options;

pub mod breaker;
pub mod hedging;
pub mod retry;
pub mod telemetry;
pub mod timeout;

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
pub mod config;

pub use context::{ContextPool, ExecutionContext, ResilienceProperties, ResiliencePropertyKey};
pub use errors::{BrokenCircuit, BuildError, ControlError, ExecutionCanceled, IsolatedCircuit, TimeoutRejected};
pub use options::Backoff;
pub use outcome::{AnyResult, Failure, Outcome};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineDescriptor, StrategyDescriptor};
pub use predicate::PredicateArgs;
pub use strategy::{Callback, ExecutionFuture, ResultType, Strategy};

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
pub(crate) mod testing;
