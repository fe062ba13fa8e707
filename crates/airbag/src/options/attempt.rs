// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// A single attempt of a retried or hedged execution.
///
/// Indexing is zero-based: the initial execution is attempt `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Attempt {
    index: u32,
    is_last: bool,
}

impl Attempt {
    pub fn new(index: u32, is_last: bool) -> Self {
        Self { index, is_last }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn is_last(self) -> bool {
        self.is_last
    }

    /// Returns the following attempt, or `None` when `self` was the last one.
    #[cfg_attr(test, mutants::skip)] // causes test timeouts
    pub fn increment(self, max_attempts: MaxAttempts) -> Option<Self> {
        let next = self.index.saturating_add(1);

        match max_attempts {
            MaxAttempts::Finite(total) => {
                if next >= total {
                    return None;
                }

                Some(Self::new(next, next == total.saturating_sub(1)))
            }
            MaxAttempts::Infinite => Some(Self::new(next, false)),
        }
    }
}

/// The total number of attempts allowed, including the initial one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MaxAttempts {
    Finite(u32),
    Infinite,
}

impl MaxAttempts {
    pub fn first_attempt(self) -> Attempt {
        Attempt::new(0, matches!(self, Self::Finite(0 | 1)))
    }
}
