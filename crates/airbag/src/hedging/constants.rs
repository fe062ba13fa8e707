// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

pub(super) const DEFAULT_NAME: &str = "Hedging";
pub(super) const DEFAULT_MAX_HEDGED_ATTEMPTS: u32 = 2;
pub(super) const MIN_MAX_HEDGED_ATTEMPTS: u32 = 2;
pub(super) const MAX_MAX_HEDGED_ATTEMPTS: u32 = 10;
pub(super) const DEFAULT_HEDGING_DELAY: Duration = Duration::from_secs(2);
