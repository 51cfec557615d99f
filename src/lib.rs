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

//! # SYOS Billing
//!
//! This library provides a point-of-sale billing engine: a shared stock
//! ledger that many transactions decrement concurrently, and an append-only
//! log of the bills those transactions produce.
//!
//! ## Core Components
//!
//! - [`Inventory`]: Stock ledger with atomic all-or-nothing batch decrements
//! - [`BillLog`]: Serial issuer and append-only bill history
//! - [`BillingSystem`]: Coordinator turning purchase lines into a [`Bill`]
//! - [`Submitter`]: Worker pool that runs orders against a shared coordinator
//! - [`BillingError`]: Error types for rejected operations
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//! use syos_billing::{BillLog, BillingSystem, Inventory, StockItem};
//!
//! let inventory = Arc::new(Inventory::new());
//! let bills = Arc::new(BillLog::new());
//! inventory
//!     .add_item(StockItem::new(
//!         "ITEM001",
//!         "Milk",
//!         dec!(100),
//!         200,
//!         NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
//!     ))
//!     .unwrap();
//!
//! let system = BillingSystem::new(Arc::clone(&inventory), Arc::clone(&bills));
//! let line = inventory.get("ITEM001").unwrap().line_item(2);
//! let bill = system.process_transaction(&[line], dec!(200)).unwrap();
//!
//! assert_eq!(bill.serial_number().0, 1);
//! assert_eq!(inventory.get("ITEM001").unwrap().quantity, 198);
//! assert_eq!(bills.len(), 1);
//! ```
//!
//! ## Thread Safety
//!
//! One [`Inventory`] and one [`BillLog`] are created at startup and shared
//! through [`Arc`](std::sync::Arc). The ledger guards its items with a single
//! lock; the log issues serials from an atomic counter. Neither component
//! ever holds the other's lock.

mod base;
mod bill;
mod bill_log;
mod billing;
pub mod config;
pub mod error;
mod inventory;
mod item;
pub mod report;
mod submitter;

pub use base::{ItemCode, SerialNumber};
pub use bill::Bill;
pub use bill_log::BillLog;
pub use billing::BillingSystem;
pub use config::BillingConfig;
pub use error::BillingError;
pub use inventory::{DEFAULT_REORDER_THRESHOLD, Inventory};
pub use item::{LineItem, StockItem};
pub use report::SalesSummary;
pub use submitter::{Order, Outcome, Submitter};
