// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::ExecutionContext;

/// Arguments for the [`timeout_generator`][super::TimeoutOptions::timeout_generator] callback.
#[derive(Debug)]
pub struct TimeoutGeneratorArgs<'a> {
    pub(super) context: &'a ExecutionContext,
}

impl TimeoutGeneratorArgs<'_> {
    /// The context of the execution.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }
}

/// Arguments for the [`on_timeout`][super::TimeoutOptions::on_timeout] callback.
#[derive(Debug)]
pub struct OnTimeoutArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) timeout: Duration,
}

impl OnTimeoutArgs<'_> {
    /// The context of the execution that timed out.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// The timeout that elapsed.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
