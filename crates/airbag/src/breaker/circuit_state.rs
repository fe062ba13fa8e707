// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::{self, Display};

/// The state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Executions flow normally and their outcomes are sampled.
    Closed,

    /// Executions are rejected with [`BrokenCircuit`][crate::BrokenCircuit] until the break
    /// duration elapses.
    Open,

    /// A single trial execution decides whether the circuit closes or opens again.
    HalfOpen,

    /// The circuit was opened manually and stays open until it is closed manually.
    Isolated,
}

impl CircuitState {
    /// Returns the name of the state as used in telemetry.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
            Self::Isolated => "isolated",
        }
    }
}

impl Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_as_str() {
        for state in [CircuitState::Closed, CircuitState::Open, CircuitState::HalfOpen, CircuitState::Isolated] {
            assert_eq!(state.to_string(), state.as_str());
        }
        assert_eq!(CircuitState::HalfOpen.as_str(), "half_open");
    }
}
