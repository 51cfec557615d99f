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

//! Bill sequencer and append-only bill history.
//!
//! Serials come from a single atomic counter, so concurrent callers never
//! receive the same value. Bills are indexed by serial for O(1) lookup and
//! kept in append order for snapshots.

use crate::base::SerialNumber;
use crate::bill::Bill;
use crate::error::BillingError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe serial issuer and bill log.
///
/// Append order may differ from serial order when transactions race; serials
/// themselves never repeat and never go backwards.
#[derive(Debug)]
pub struct BillLog {
    /// Next serial to hand out.
    next_serial: AtomicU64,

    /// Bills indexed by serial for duplicate detection and lookup.
    index: DashMap<SerialNumber, Arc<Bill>>,

    /// Bills in append order.
    history: RwLock<Vec<Arc<Bill>>>,
}

impl BillLog {
    /// Creates an empty log whose first serial is 1.
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an empty log whose first serial is `first_serial`.
    pub fn starting_at(first_serial: u64) -> Self {
        Self {
            next_serial: AtomicU64::new(first_serial),
            index: DashMap::new(),
            history: RwLock::new(Vec::new()),
        }
    }

    /// Issues a serial strictly greater than every serial issued before.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::SerialsExhausted`] once the counter reaches
    /// `u64::MAX`; the counter never wraps.
    pub fn next_serial(&self) -> Result<SerialNumber, BillingError> {
        // A single read-modify-write; no other memory depends on this counter.
        self.next_serial
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| next.checked_add(1))
            .map(SerialNumber)
            .map_err(|_| BillingError::SerialsExhausted)
    }

    /// Appends a bill to the log.
    ///
    /// Only the coordinator appends, with serials from [`BillLog::next_serial`].
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::DuplicateBill`] if a bill with the same serial
    /// was already appended.
    pub(crate) fn append(&self, bill: Arc<Bill>) -> Result<(), BillingError> {
        let serial = bill.serial_number();

        // Entry API makes the check-and-insert atomic per serial.
        match self.index.entry(serial) {
            Entry::Occupied(_) => Err(BillingError::DuplicateBill { serial }),
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&bill));
                self.history.write().push(bill);
                Ok(())
            }
        }
    }

    /// Returns a snapshot of every bill in append order.
    pub fn all_bills(&self) -> Vec<Arc<Bill>> {
        self.history.read().clone()
    }

    pub fn get(&self, serial: SerialNumber) -> Option<Arc<Bill>> {
        self.index.get(&serial).map(|entry| Arc::clone(entry.value()))
    }

    /// Sum of the amount due across every bill, saturating at [`Decimal::MAX`].
    pub fn total_revenue(&self) -> Decimal {
        self.history
            .read()
            .iter()
            .fold(Decimal::ZERO, |total, bill| total.saturating_add(bill.amount_due()))
    }

    pub fn len(&self) -> usize {
        self.history.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.read().is_empty()
    }
}

impl Default for BillLog {
    fn default() -> Self {
        Self::new()
    }
}
