// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::sync::Arc;

/// Non-cryptographic random number source used for jitter.
///
/// This source is **NOT cryptographically secure**. Jitter does not need cryptographic
/// guarantees, so `fastrand` is used by default. A custom source can be injected through
/// the retry options to make delays deterministic.
#[derive(Clone, Default)]
pub(crate) enum Rnd {
    #[default]
    Real,

    Custom(Arc<dyn Fn() -> f64 + Send + Sync>),
}

impl Debug for Rnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Real => write!(f, "Real"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

impl Rnd {
    pub fn new_function<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    #[cfg(test)]
    pub fn new_fixed(value: f64) -> Self {
        Self::new_function(move || value)
    }

    pub fn next_f64(&self) -> f64 {
        match self {
            Self::Real => fastrand::f64(),
            Self::Custom(generator) => generator(),
        }
    }
}
