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

//! Error types for billing and stock operations.

use crate::base::{ItemCode, SerialNumber};
use rust_decimal::Decimal;
use thiserror::Error;

/// Billing and inventory errors.
///
/// Every variant other than [`BillingError::TransactionPanicked`] leaves the
/// ledger and the bill log exactly as they were before the failing call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// Referenced item code is not in the ledger
    #[error("item {code} not found")]
    ItemNotFound { code: ItemCode },

    /// Requested quantity exceeds the quantity in stock
    #[error("insufficient stock for {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: ItemCode,
        requested: u64,
        available: u32,
    },

    /// Cash tendered does not cover the amount due
    #[error("insufficient payment: due {total_due}, tendered {tendered}")]
    InsufficientPayment { total_due: Decimal, tendered: Decimal },

    /// Item code already present in the ledger
    #[error("item {code} already exists")]
    DuplicateItem { code: ItemCode },

    /// Quantity is zero where a positive amount is required
    #[error("quantity for {code} must be positive")]
    InvalidQuantity { code: ItemCode },

    /// Unit price is negative
    #[error("price for {code} must not be negative")]
    InvalidPrice { code: ItemCode },

    /// Discount is negative or larger than the total
    #[error("invalid discount {discount}")]
    InvalidDiscount { discount: Decimal },

    /// Transaction has no line items
    #[error("transaction has no line items")]
    EmptyTransaction,

    /// Restock would overflow the stored quantity
    #[error("quantity overflow for {code}")]
    QuantityOverflow { code: ItemCode },

    /// Bill serial already present in the log
    #[error("duplicate bill serial {serial}")]
    DuplicateBill { serial: SerialNumber },

    /// A subtotal, total or amount due exceeds the decimal range
    #[error("amount overflow")]
    AmountOverflow,

    /// The serial counter has no values left
    #[error("bill serials exhausted")]
    SerialsExhausted,

    /// The coordinator panicked while processing an order
    #[error("transaction panicked: {message}")]
    TransactionPanicked { message: String },
}
