// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Circuit breaker strategy.
//!
//! Samples the outcomes of the protected callback and stops calling it once too many of them
//! are handled, giving the callback's dependency time to recover.
//!
//! # States
//!
//! - [`Closed`][CircuitState::Closed]: executions flow and their outcomes are sampled. When the
//!   ratio of handled outcomes reaches the failure ratio while the sample holds at least the
//!   minimum throughput, the circuit opens.
//! - [`Open`][CircuitState::Open]: executions are rejected with [`BrokenCircuit`][crate::BrokenCircuit],
//!   which carries the time until a trial is allowed and the last handled failure.
//! - [`HalfOpen`][CircuitState::HalfOpen]: once the break duration elapsed, exactly one trial
//!   execution is let through per break duration. Its outcome closes the circuit or opens it again.
//! - [`Isolated`][CircuitState::Isolated]: opened by [`CircuitBreakerManualControl::isolate`].
//!   Executions are rejected with [`IsolatedCircuit`][crate::IsolatedCircuit] until the circuit
//!   is closed manually.
//!
//! Cancelled executions are neither successes nor failures and are not sampled.
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//!
//! use airbag::breaker::{CircuitBreakerOptions, CircuitBreakerStateProvider, CircuitState, SamplingWindow};
//! use airbag::{BrokenCircuit, Outcome, PipelineBuilder};
//! use tick::Clock;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let state = CircuitBreakerStateProvider::new();
//! let pipeline = PipelineBuilder::new(&Clock::new_frozen())
//!     .add_circuit_breaker(
//!         CircuitBreakerOptions::new()
//!             .failure_ratio(0.5)
//!             .minimum_throughput(2)
//!             .sampling(SamplingWindow::Count(10))
//!             .state_provider(&state),
//!     )
//!     .build()?;
//!
//! for _ in 0..3 {
//!     let outcome = pipeline
//!         .execute(|_, _: &()| async { Outcome::<u32>::from_error(std::io::Error::other("down")) }, &())
//!         .await;
//!     assert!(outcome.is_failure());
//! }
//!
//! assert_eq!(state.circuit_state(), CircuitState::Open);
//! # Ok(())
//! # }
//! ```
//!
//! # Defaults
//!
//! | Parameter | Default Value | Configured By |
//! |-----------|---------------|---------------|
//! | Failure ratio | `0.1` | [`failure_ratio`][CircuitBreakerOptions::failure_ratio] |
//! | Minimum throughput | `100` | [`minimum_throughput`][CircuitBreakerOptions::minimum_throughput] |
//! | Sampling | `30` second time window | [`sampling`][CircuitBreakerOptions::sampling] |
//! | Break duration | `5` seconds | [`break_duration`][CircuitBreakerOptions::break_duration], [`break_duration_generator`][CircuitBreakerOptions::break_duration_generator] |
//! | Handled outcomes | every failure except cancellation | [`should_handle`][CircuitBreakerOptions::should_handle], [`should_handle_any`][CircuitBreakerOptions::should_handle_any] |
//!
//! # Telemetry
//!
//! Transitions report [`OnCircuitOpened`][crate::telemetry::EventKind::OnCircuitOpened],
//! [`OnCircuitHalfOpened`][crate::telemetry::EventKind::OnCircuitHalfOpened] and
//! [`OnCircuitClosed`][crate::telemetry::EventKind::OnCircuitClosed]. Each transition is
//! reported once, by the execution or manual call that caused it.

mod args;
mod callbacks;
mod circuit_state;
mod constants;
mod controller;
mod engine;
mod health;
mod manual_control;
mod options;
mod state_provider;
mod strategy;

pub use args::{BreakDurationGeneratorArgs, OnCircuitClosedArgs, OnCircuitHalfOpenedArgs, OnCircuitOpenedArgs};
pub(crate) use callbacks::{BreakDurationGenerator, OnClosed, OnHalfOpened, OnOpened};
pub use circuit_state::CircuitState;
pub use health::SamplingWindow;
pub use manual_control::CircuitBreakerManualControl;
pub use options::CircuitBreakerOptions;
pub use state_provider::CircuitBreakerStateProvider;
pub use strategy::CircuitBreakerStrategy;
