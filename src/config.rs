// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Runtime settings.

use crate::inventory::DEFAULT_REORDER_THRESHOLD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid [`BillingConfig`] values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("first bill serial must be at least 1")]
    ZeroSerial,
}

/// Settings for a billing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Threads in the submitter pool.
    pub workers: usize,
    /// Items strictly below this quantity are reported for reorder.
    pub reorder_threshold: u32,
    /// Serial assigned to the first bill.
    pub first_serial: u64,
}

impl BillingConfig {
    pub const DEFAULT_WORKERS: usize = 5;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.first_serial == 0 {
            return Err(ConfigError::ZeroSerial);
        }
        Ok(())
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            workers: Self::DEFAULT_WORKERS,
            reorder_threshold: DEFAULT_REORDER_THRESHOLD,
            first_serial: 1,
        }
    }
}
