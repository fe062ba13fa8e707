// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use crate::Backoff;

pub(super) const DEFAULT_NAME: &str = "Retry";

/// Exponential backoff quickly reduces pressure on a struggling dependency and pairs well
/// with jitter.
pub(super) const DEFAULT_BACKOFF: Backoff = Backoff::Exponential;

/// A 2 second starting delay avoids retry storms during partial outages while still
/// recovering quickly from short-lived failures.
pub(super) const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(2);

/// Jitter desynchronizes clients. See [Exponential Backoff and Jitter](https://aws.amazon.com/blogs/architecture/exponential-backoff-and-jitter).
pub(super) const DEFAULT_USE_JITTER: bool = true;

pub(super) const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

pub(super) const MAX_RETRY_ATTEMPTS: u32 = 100;

pub(super) const MAX_BASE_DELAY: Duration = Duration::from_secs(24 * 60 * 60);
