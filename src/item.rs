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

//! Stock items and purchase line items.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use syos_billing::StockItem;
//!
//! let milk = StockItem::new(
//!     "ITEM001",
//!     "Milk",
//!     dec!(100),
//!     200,
//!     NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
//! );
//! let line = milk.line_item(2);
//! assert_eq!(line.subtotal(), Some(dec!(200)));
//! ```

use crate::base::ItemCode;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An item held by the inventory ledger.
///
/// `quantity` is the remaining stock. Once inserted, only the ledger mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub code: ItemCode,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub expiry_date: NaiveDate,
}

impl StockItem {
    pub fn new(
        code: impl Into<ItemCode>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
        expiry_date: NaiveDate,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            unit_price,
            quantity,
            expiry_date,
        }
    }

    /// Builds a purchase line for `quantity` units of this item at its current price.
    pub fn line_item(&self, quantity: u32) -> LineItem {
        LineItem {
            code: self.code.clone(),
            name: self.name.clone(),
            unit_price: self.unit_price,
            quantity,
        }
    }
}

/// A requested or sold amount of one item.
///
/// Bills keep these as snapshots, so later stock changes never alter bill history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: ItemCode,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(
        code: impl Into<ItemCode>,
        name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            unit_price,
            quantity,
        }
    }

    /// Returns `unit_price * quantity`, or `None` if it overflows.
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}
