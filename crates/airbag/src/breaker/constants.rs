// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

pub(super) const DEFAULT_NAME: &str = "CircuitBreaker";

/// Default ratio of handled outcomes within the sampling window that opens the circuit.
///
/// The defaults taken from Polly V8:
/// <https://www.pollydocs.org/strategies/circuit-breaker.html#defaults>
pub(super) const DEFAULT_FAILURE_RATIO: f32 = 0.1;

/// Default number of executions within the sampling window required before the circuit can open.
pub(super) const DEFAULT_MINIMUM_THROUGHPUT: u32 = 100;

pub(super) const MIN_MINIMUM_THROUGHPUT: u32 = 2;

/// Default duration of the time based sampling window.
pub(super) const DEFAULT_SAMPLING_DURATION: Duration = Duration::from_secs(30);

pub(super) const MIN_SAMPLING_DURATION: Duration = Duration::from_secs(1);

pub(super) const MIN_SAMPLING_COUNT: u32 = 2;

pub(super) const MAX_SAMPLING_COUNT: u32 = 100_000;

/// Default duration the circuit stays open before a trial execution is allowed.
pub(super) const DEFAULT_BREAK_DURATION: Duration = Duration::from_secs(5);

pub(super) const MIN_BREAK_DURATION: Duration = Duration::from_millis(500);

pub(super) const MAX_BREAK_DURATION: Duration = Duration::from_secs(24 * 60 * 60);
