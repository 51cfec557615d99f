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

//! Inventory ledger.
//!
//! The [`Inventory`] is the single source of truth for stock quantities. All
//! items live in one map behind a ledger-wide [`RwLock`]:
//!
//! - Decrements take the write lock for the whole validate-then-apply
//!   sequence, so a batch is applied entirely or not at all.
//! - Reads take the read lock and clone, so snapshots never see a
//!   half-applied batch.
//!
//! A single lock means there is no per-item acquisition order to get wrong.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use syos_billing::{Inventory, StockItem};
//!
//! let inventory = Inventory::new();
//! let expiry = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
//! inventory.add_item(StockItem::new("ITEM001", "Milk", dec!(100), 200, expiry)).unwrap();
//!
//! inventory.check_and_decrement("ITEM001", 2).unwrap();
//! assert_eq!(inventory.get("ITEM001").unwrap().quantity, 198);
//! ```

use crate::base::ItemCode;
use crate::error::BillingError;
use crate::item::StockItem;
use chrono::NaiveDate;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::collections::HashMap;

/// Items below this quantity are due for reorder.
pub const DEFAULT_REORDER_THRESHOLD: u32 = 50;

#[derive(Debug, Default)]
struct LedgerData {
    /// Items indexed by code; `BTreeMap` keeps snapshots sorted by code.
    items: BTreeMap<ItemCode, StockItem>,
}

impl LedgerData {
    fn insert(&mut self, item: StockItem) -> Result<(), BillingError> {
        if item.unit_price < Decimal::ZERO {
            return Err(BillingError::InvalidPrice { code: item.code });
        }
        match self.items.entry(item.code.clone()) {
            Entry::Occupied(_) => Err(BillingError::DuplicateItem { code: item.code }),
            Entry::Vacant(entry) => {
                entry.insert(item);
                Ok(())
            }
        }
    }

    fn restock(&mut self, code: &str, quantity: u32) -> Result<u32, BillingError> {
        let item = self
            .items
            .get_mut(code)
            .ok_or_else(|| BillingError::ItemNotFound { code: code.into() })?;
        if quantity == 0 {
            return Err(BillingError::InvalidQuantity { code: item.code.clone() });
        }
        item.quantity = item
            .quantity
            .checked_add(quantity)
            .ok_or_else(|| BillingError::QuantityOverflow { code: item.code.clone() })?;
        Ok(item.quantity)
    }

    /// Checks every request against current stock without mutating anything.
    ///
    /// Repeated codes are summed, so `[(A, 3), (A, 3)]` needs six units of `A`.
    /// The first offending entry in request order determines the error.
    fn validate(&self, requests: &[(ItemCode, u32)]) -> Result<(), BillingError> {
        let mut demand: HashMap<&ItemCode, u64> = HashMap::with_capacity(requests.len());
        for (code, quantity) in requests {
            if *quantity == 0 {
                return Err(BillingError::InvalidQuantity { code: code.clone() });
            }
            let item = self
                .items
                .get(code)
                .ok_or_else(|| BillingError::ItemNotFound { code: code.clone() })?;
            let wanted = demand.entry(code).or_insert(0);
            *wanted += u64::from(*quantity);
            if *wanted > u64::from(item.quantity) {
                return Err(BillingError::InsufficientStock {
                    code: code.clone(),
                    requested: *wanted,
                    available: item.quantity,
                });
            }
        }
        Ok(())
    }

    /// Subtracts every request. Must only run after [`LedgerData::validate`]
    /// succeeded under the same lock guard.
    fn apply(&mut self, requests: &[(ItemCode, u32)]) {
        for (code, quantity) in requests {
            if let Some(item) = self.items.get_mut(code) {
                debug_assert!(
                    item.quantity >= *quantity,
                    "Invariant violated: decrement of {} below zero",
                    code
                );
                item.quantity -= quantity;
            }
        }
    }

    fn decrement_batch(&mut self, requests: &[(ItemCode, u32)]) -> Result<(), BillingError> {
        self.validate(requests)?;
        self.apply(requests);
        Ok(())
    }

    fn select(&self, predicate: impl Fn(&StockItem) -> bool) -> Vec<StockItem> {
        self.items.values().filter(|item| predicate(*item)).cloned().collect()
    }
}

/// Thread-safe stock ledger shared by every concurrent transaction.
#[derive(Debug, Default)]
pub struct Inventory {
    inner: RwLock<LedgerData>,
}

impl Inventory {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new item.
    ///
    /// # Errors
    ///
    /// - [`BillingError::DuplicateItem`] - the code is already stocked. The
    ///   existing item is left untouched; use [`Inventory::restock`] to add units.
    /// - [`BillingError::InvalidPrice`] - the unit price is negative.
    pub fn add_item(&self, item: StockItem) -> Result<(), BillingError> {
        tracing::debug!(code = %item.code, quantity = item.quantity, "adding stock item");
        self.inner.write().insert(item)
    }

    /// Adds `quantity` units to an existing item and returns the new quantity.
    pub fn restock(&self, code: &str, quantity: u32) -> Result<u32, BillingError> {
        let remaining = self.inner.write().restock(code, quantity)?;
        tracing::debug!(code, added = quantity, remaining, "restocked item");
        Ok(remaining)
    }

    /// Atomically removes `quantity` units of `code` and returns what is left.
    ///
    /// # Errors
    ///
    /// - [`BillingError::ItemNotFound`] - unknown code.
    /// - [`BillingError::InvalidQuantity`] - `quantity` is zero.
    /// - [`BillingError::InsufficientStock`] - not enough units; nothing changes.
    pub fn check_and_decrement(&self, code: &str, quantity: u32) -> Result<u32, BillingError> {
        let mut data = self.inner.write();
        data.decrement_batch(&[(ItemCode::from(code), quantity)])?;
        Ok(data.items.get(code).map_or(0, |item| item.quantity))
    }

    /// Atomically removes every `(code, quantity)` pair, or none of them.
    ///
    /// The whole batch is validated before the first unit is subtracted, all
    /// under one write lock. An empty batch succeeds without effect.
    ///
    /// # Errors
    ///
    /// Same as [`Inventory::check_and_decrement`], reported for the first
    /// offending entry. On error the ledger is unchanged.
    pub fn check_and_decrement_batch(&self, requests: &[(ItemCode, u32)]) -> Result<(), BillingError> {
        self.commit_batch(requests, || Ok(()))
    }

    /// Validates `requests`, then runs `reserve`, then applies the batch, all
    /// under one write guard.
    ///
    /// If either validation or `reserve` fails the ledger is unchanged.
    pub(crate) fn commit_batch<T>(
        &self,
        requests: &[(ItemCode, u32)],
        reserve: impl FnOnce() -> Result<T, BillingError>,
    ) -> Result<T, BillingError> {
        let mut data = self.inner.write();
        data.validate(requests)?;
        let reserved = reserve()?;
        data.apply(requests);
        drop(data);

        tracing::trace!(lines = requests.len(), "batch decrement applied");
        Ok(reserved)
    }

    /// Returns items whose quantity is strictly below `threshold`.
    pub fn reorder_levels(&self, threshold: u32) -> Vec<StockItem> {
        self.inner.read().select(|item| item.quantity < threshold)
    }

    /// Returns items whose expiry date is before `date`.
    pub fn expired_as_of(&self, date: NaiveDate) -> Vec<StockItem> {
        self.inner.read().select(|item| item.expiry_date < date)
    }

    /// Returns a copy of every item, sorted by code.
    pub fn current_stock(&self) -> Vec<StockItem> {
        self.inner.read().items.values().cloned().collect()
    }

    /// Returns a copy of a single item.
    pub fn get(&self, code: &str) -> Option<StockItem> {
        self.inner.read().items.get(code).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }
}
