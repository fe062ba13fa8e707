// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::constants::{DEFAULT_BACKOFF, DEFAULT_BASE_DELAY, DEFAULT_USE_JITTER};
use crate::Backoff;
use crate::rnd::Rnd;

/// Width of the jitter window relative to the delay; the jittered delay lies in `[0.75d, 1.25d]`.
const JITTER_FACTOR: f64 = 0.5;

/// Multiplier of exponential backoff when jitter is disabled.
const EXPONENTIAL_FACTOR: f64 = 2.0;

/// Smooths the first delay of the decorrelated jitter curve.
const P_FACTOR: f64 = 4.0;

/// Scales medians of the decorrelated jitter curve to land near whole multiples of the base delay.
const RP_SCALING: f64 = 1.0 / 1.4;

/// Computes the delay hint for each retry.
///
/// The schedule follows the Polly v8 delay generation.
#[derive(Debug, Clone)]
pub(crate) struct BackoffSchedule {
    pub backoff: Backoff,
    pub base_delay: Duration,
    pub min_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub use_jitter: bool,
    pub rnd: Rnd,
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_BACKOFF,
            base_delay: DEFAULT_BASE_DELAY,
            min_delay: None,
            max_delay: None,
            use_jitter: DEFAULT_USE_JITTER,
            rnd: Rnd::default(),
        }
    }
}

impl BackoffSchedule {
    /// Returns an endless sequence of delays; the n-th item is the delay after attempt `n`.
    pub fn delays(&self) -> Delays<'_> {
        Delays {
            schedule: self,
            attempt: 0,
            position: 0.0,
        }
    }

    fn clamp(&self, delay: Duration) -> Duration {
        let delay = self.max_delay.map_or(delay, |max| delay.min(max));
        self.min_delay.map_or(delay, |min| delay.max(min))
    }
}

#[derive(Debug)]
pub(crate) struct Delays<'a> {
    schedule: &'a BackoffSchedule,
    attempt: u32,
    // position on the decorrelated jitter curve reached by the previous delay
    position: f64,
}

impl Iterator for Delays<'_> {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        let schedule = self.schedule;
        if schedule.base_delay.is_zero() {
            return Some(Duration::ZERO);
        }

        let attempt = self.attempt;
        self.attempt = attempt.saturating_add(1);

        let delay = match schedule.backoff {
            Backoff::Constant => schedule.base_delay,
            Backoff::Linear => schedule.base_delay.saturating_mul(self.attempt),
            Backoff::Exponential if schedule.use_jitter => {
                decorrelated_jitter(attempt, schedule.base_delay, &mut self.position, &schedule.rnd)
            }
            Backoff::Exponential => exponential(schedule.base_delay, attempt),
        };

        let delay = match schedule.backoff {
            Backoff::Constant | Backoff::Linear if schedule.use_jitter => jitter(delay, &schedule.rnd),
            _ => delay,
        };

        Some(schedule.clamp(delay))
    }
}

fn exponential(base: Duration, attempt: u32) -> Duration {
    let factor = EXPONENTIAL_FACTOR.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
    secs_saturating(base.as_secs_f64() * factor)
}

/// Symmetric uniform jitter centered on `delay`.
fn jitter(delay: Duration, rnd: &Rnd) -> Duration {
    let ms = delay.as_secs_f64() * 1000.0;
    let offset = (ms * JITTER_FACTOR) / 2.0;
    let random_delay = (ms * JITTER_FACTOR).mul_add(rnd.next_f64(), -offset);

    secs_saturating((ms + random_delay) / 1000.0)
}

/// Decorrelated jitter v2 from `Polly.Contrib.WaitAndRetry`.
///
/// Each step samples a random phase `t = attempt + U[0, 1)` on the curve
/// `2^t * tanh(sqrt(p * t))` and yields the distance travelled since the previous step. The
/// expected delay grows exponentially while consecutive samples stay weakly correlated.
///
/// The formula is credited to @george-polevoy, with the `P_FACTOR` and `RP_SCALING`
/// adaptations by @reisenberger; see <https://github.com/App-vNext/Polly/issues/530>.
fn decorrelated_jitter(attempt: u32, base_delay: Duration, position: &mut f64, rnd: &Rnd) -> Duration {
    let t = f64::from(attempt) + rnd.next_f64();
    let next = t.exp2() * (P_FACTOR * t).sqrt().tanh();

    let previous = std::mem::replace(position, next);
    if !next.is_finite() {
        return Duration::MAX;
    }

    secs_saturating((next - previous) * RP_SCALING * base_delay.as_secs_f64())
}

fn secs_saturating(secs: f64) -> Duration {
    if secs <= 0.0 {
        return Duration::ZERO;
    }

    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}
