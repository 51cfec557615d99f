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

//! Transaction coordinator.
//!
//! The [`BillingSystem`] turns a list of purchase lines into a committed
//! [`Bill`]:
//!
//! 1. Reject empty requests, negative prices and totals that overflow.
//! 2. Compute the total and check the tendered cash covers it.
//! 3. Validate every line against the [`Inventory`], issue a serial from the
//!    [`BillLog`], then decrement the whole batch, under one ledger guard.
//! 4. Build the bill and append it.
//!
//! Steps 1 and 2 never touch shared state. If validation fails no serial is
//! consumed; if no serial can be issued the stock is left alone. Serial
//! issuance is a single atomic operation, and the log's own locks are never
//! taken while the ledger guard is held.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//! use syos_billing::{BillLog, BillingSystem, Inventory, StockItem};
//!
//! let inventory = Arc::new(Inventory::new());
//! let expiry = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
//! inventory.add_item(StockItem::new("ITEM001", "Milk", dec!(100), 200, expiry)).unwrap();
//!
//! let system = BillingSystem::new(Arc::clone(&inventory), Arc::new(BillLog::new()));
//! let milk = inventory.get("ITEM001").unwrap();
//! let bill = system.process_transaction(&[milk.line_item(2)], dec!(250)).unwrap();
//!
//! assert_eq!(bill.total_price(), dec!(200));
//! assert_eq!(bill.change(), dec!(50));
//! assert_eq!(inventory.get("ITEM001").unwrap().quantity, 198);
//! ```

use crate::base::ItemCode;
use crate::bill::Bill;
use crate::bill_log::BillLog;
use crate::error::BillingError;
use crate::inventory::Inventory;
use crate::item::LineItem;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

type DateSource = Box<dyn Fn() -> NaiveDate + Send + Sync>;

/// Coordinates purchases against a shared ledger and bill log.
///
/// Cheap to share: wrap in an [`Arc`] and call from any number of threads.
pub struct BillingSystem {
    inventory: Arc<Inventory>,
    bills: Arc<BillLog>,
    today: DateSource,
}

impl BillingSystem {
    /// Creates a coordinator that dates bills with the local calendar date.
    pub fn new(inventory: Arc<Inventory>, bills: Arc<BillLog>) -> Self {
        Self::with_date_source(inventory, bills, || Local::now().date_naive())
    }

    /// Creates a coordinator that dates bills using `today`.
    pub fn with_date_source(
        inventory: Arc<Inventory>,
        bills: Arc<BillLog>,
        today: impl Fn() -> NaiveDate + Send + Sync + 'static,
    ) -> Self {
        Self {
            inventory,
            bills,
            today: Box::new(today),
        }
    }

    pub fn inventory(&self) -> &Arc<Inventory> {
        &self.inventory
    }

    pub fn bills(&self) -> &Arc<BillLog> {
        &self.bills
    }

    /// Processes an undiscounted purchase.
    ///
    /// See [`BillingSystem::process_discounted`].
    pub fn process_transaction(
        &self,
        lines: &[LineItem],
        cash_tendered: Decimal,
    ) -> Result<Arc<Bill>, BillingError> {
        self.process_discounted(lines, Decimal::ZERO, cash_tendered)
    }

    /// Processes a purchase, subtracting `discount` from the total.
    ///
    /// # Errors
    ///
    /// | Error | Raised before touching stock? |
    /// |-------|-------------------------------|
    /// | [`BillingError::EmptyTransaction`] | yes |
    /// | [`BillingError::InvalidPrice`] | yes |
    /// | [`BillingError::AmountOverflow`] | yes |
    /// | [`BillingError::InvalidDiscount`] | yes |
    /// | [`BillingError::InsufficientPayment`] | yes |
    /// | [`BillingError::InvalidQuantity`] | rejected by the ledger, no change |
    /// | [`BillingError::ItemNotFound`] | rejected by the ledger, no change |
    /// | [`BillingError::InsufficientStock`] | rejected by the ledger, no change |
    /// | [`BillingError::SerialsExhausted`] | rejected under the ledger guard, no change |
    ///
    /// Nothing is retried; the caller decides what to do with a failure.
    pub fn process_discounted(
        &self,
        lines: &[LineItem],
        discount: Decimal,
        cash_tendered: Decimal,
    ) -> Result<Arc<Bill>, BillingError> {
        let total_price = price_lines(lines)?;
        if discount < Decimal::ZERO || discount > total_price {
            return Err(BillingError::InvalidDiscount { discount });
        }

        let total_due = total_price
            .checked_sub(discount)
            .ok_or(BillingError::AmountOverflow)?;
        if cash_tendered < total_due {
            tracing::debug!(%total_due, %cash_tendered, "rejecting underpaid transaction");
            return Err(BillingError::InsufficientPayment {
                total_due,
                tendered: cash_tendered,
            });
        }

        let date = (self.today)();
        let requests: Vec<(ItemCode, u32)> = lines
            .iter()
            .map(|line| (line.code.clone(), line.quantity))
            .collect();
        let serial = match self.inventory.commit_batch(&requests, || self.bills.next_serial()) {
            Ok(serial) => serial,
            Err(e) => {
                tracing::debug!(error = %e, "transaction aborted by inventory");
                return Err(e);
            }
        };

        let bill = Arc::new(Bill::new(
            serial,
            date,
            lines.to_vec(),
            total_price,
            discount,
            cash_tendered,
        ));
        self.bills.append(Arc::clone(&bill))?;

        tracing::debug!(
            serial = %bill.serial_number(),
            total = %bill.total_price(),
            change = %bill.change(),
            "transaction committed"
        );
        Ok(bill)
    }
}

impl fmt::Debug for BillingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingSystem")
            .field("inventory", &self.inventory)
            .field("bills", &self.bills)
            .finish_non_exhaustive()
    }
}

/// Returns the gross total of `lines`.
fn price_lines(lines: &[LineItem]) -> Result<Decimal, BillingError> {
    if lines.is_empty() {
        return Err(BillingError::EmptyTransaction);
    }
    lines.iter().try_fold(Decimal::ZERO, |total, line| {
        if line.unit_price < Decimal::ZERO {
            return Err(BillingError::InvalidPrice { code: line.code.clone() });
        }
        line.subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(BillingError::AmountOverflow)
    })
}
