// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

const BUCKET_COUNT: u32 = 10;

/// How a circuit breaker samples the outcomes it bases its decisions on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingWindow {
    /// Samples the outcomes of the given rolling time period. The period is split into ten
    /// buckets that expire one at a time.
    Time(Duration),

    /// Samples the given number of most recent outcomes.
    Count(u32),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum ExecutionResult {
    Success,
    Failure,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(super) enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Failure rate and throughput of the sampled executions.
#[must_use]
#[derive(Debug, Copy, Clone)]
pub(super) struct HealthInfo {
    throughput: u32,
    failures: u32,
    failure_rate: f32,
    status: HealthStatus,
}

impl HealthInfo {
    pub fn new(successes: u32, failures: u32, failure_ratio: f32, minimum_throughput: u32) -> Self {
        let throughput = successes.saturating_add(failures);

        if throughput == 0 {
            return Self {
                throughput: 0,
                failures: 0,
                failure_rate: 0.0,
                status: HealthStatus::Healthy,
            };
        }

        #[expect(clippy::cast_possible_truncation, reason = "Acceptable")]
        let failure_rate = (f64::from(failures) / f64::from(throughput)) as f32;

        Self {
            throughput,
            failures,
            failure_rate,
            status: if failure_rate >= failure_ratio && throughput >= minimum_throughput {
                HealthStatus::Unhealthy
            } else {
                HealthStatus::Healthy
            },
        }
    }

    pub fn throughput(&self) -> u32 {
        self.throughput
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn failure_rate(&self) -> f32 {
        self.failure_rate
    }

    pub fn status(&self) -> HealthStatus {
        self.status
    }
}

/// Settings shared by every health sample created for one circuit breaker.
#[derive(Debug, Clone, Copy)]
pub(super) struct HealthSettings {
    pub sampling: SamplingWindow,
    pub failure_ratio: f32,
    pub minimum_throughput: u32,
}

impl HealthSettings {
    pub fn build(&self) -> HealthMetrics {
        let window = match self.sampling {
            SamplingWindow::Time(duration) => Window::Time(TimeWindow::new(duration)),
            SamplingWindow::Count(count) => Window::Count(CountWindow::new(count)),
        };

        HealthMetrics { settings: *self, window }
    }
}

/// Rolling sample of execution results.
#[derive(Debug)]
pub(super) struct HealthMetrics {
    settings: HealthSettings,
    window: Window,
}

impl HealthMetrics {
    pub fn record(&mut self, result: ExecutionResult, now: Instant) {
        match &mut self.window {
            Window::Time(window) => window.record(result, now),
            Window::Count(window) => window.record(result),
        }
    }

    pub fn health_info(&self, now: Instant) -> HealthInfo {
        let (successes, failures) = match &self.window {
            Window::Time(window) => window.totals(now),
            Window::Count(window) => window.totals(),
        };

        HealthInfo::new(successes, failures, self.settings.failure_ratio, self.settings.minimum_throughput)
    }

    pub fn reset(&mut self) {
        *self = self.settings.build();
    }
}

#[derive(Debug)]
enum Window {
    Time(TimeWindow),
    Count(CountWindow),
}

#[derive(Debug)]
struct TimeWindow {
    sampling_duration: Duration,
    bucket_duration: Duration,
    buckets: VecDeque<Bucket>,
}

impl TimeWindow {
    fn new(sampling_duration: Duration) -> Self {
        Self {
            sampling_duration,
            bucket_duration: sampling_duration / BUCKET_COUNT,
            buckets: VecDeque::with_capacity(BUCKET_COUNT as usize),
        }
    }

    fn record(&mut self, result: ExecutionResult, now: Instant) {
        self.expire(now);

        if let Some(back) = self.buckets.back_mut()
            && now.saturating_duration_since(back.started_at) < self.bucket_duration
        {
            back.update(result);
        } else {
            let mut bucket = Bucket::new(now);
            bucket.update(result);
            self.buckets.push_back(bucket);
        }
    }

    fn expire(&mut self, now: Instant) {
        while let Some(front) = self.buckets.front()
            && now.saturating_duration_since(front.started_at) > self.sampling_duration
        {
            self.buckets.pop_front();
        }
    }

    fn totals(&self, now: Instant) -> (u32, u32) {
        self.buckets
            .iter()
            .filter(|bucket| now.saturating_duration_since(bucket.started_at) <= self.sampling_duration)
            .fold((0_u32, 0_u32), |(successes, failures), bucket| {
                (successes.saturating_add(bucket.successes), failures.saturating_add(bucket.failures))
            })
    }
}

#[derive(Debug)]
struct Bucket {
    successes: u32,
    failures: u32,
    started_at: Instant,
}

impl Bucket {
    fn new(started_at: Instant) -> Self {
        Self {
            successes: 0,
            failures: 0,
            started_at,
        }
    }

    fn update(&mut self, result: ExecutionResult) {
        match result {
            ExecutionResult::Success => self.successes = self.successes.saturating_add(1),
            ExecutionResult::Failure => self.failures = self.failures.saturating_add(1),
        }
    }
}

#[derive(Debug)]
struct CountWindow {
    capacity: usize,
    results: VecDeque<ExecutionResult>,
    failures: u32,
}

impl CountWindow {
    fn new(capacity: u32) -> Self {
        let capacity = capacity as usize;

        Self {
            capacity,
            results: VecDeque::with_capacity(capacity),
            failures: 0,
        }
    }

    fn record(&mut self, result: ExecutionResult) {
        if self.results.len() == self.capacity
            && let Some(ExecutionResult::Failure) = self.results.pop_front()
        {
            self.failures -= 1;
        }

        if result == ExecutionResult::Failure {
            self.failures += 1;
        }

        self.results.push_back(result);
    }

    fn totals(&self) -> (u32, u32) {
        let total = u32::try_from(self.results.len()).unwrap_or(u32::MAX);
        (total - self.failures, self.failures)
    }
}
