// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

pub(super) const DEFAULT_NAME: &str = "Timeout";

pub(super) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(super) const MIN_TIMEOUT: Duration = Duration::from_millis(10);

pub(super) const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
