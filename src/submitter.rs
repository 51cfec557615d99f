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

//! Fixed-size worker pool that submits orders to a [`BillingSystem`].
//!
//! Orders are queued on a [`crossbeam`] channel and picked up by whichever
//! worker is free. Each worker calls the coordinator directly, so any number
//! of transactions run concurrently against the same ledger and bill log.
//!
//! A panic inside the coordinator is caught per order and reported as
//! [`BillingError::TransactionPanicked`]; the worker keeps serving the queue.
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//! use std::sync::Arc;
//! use syos_billing::{BillLog, BillingSystem, Inventory, Order, StockItem, Submitter};
//!
//! let inventory = Arc::new(Inventory::new());
//! let expiry = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
//! inventory.add_item(StockItem::new("ITEM002", "Bread", dec!(50), 150, expiry)).unwrap();
//! let bread = inventory.get("ITEM002").unwrap();
//!
//! let system = Arc::new(BillingSystem::new(inventory, Arc::new(BillLog::new())));
//! let submitter = Submitter::new(system, 2);
//! submitter.submit(Order::new(1, vec![bread.line_item(1)], dec!(50)));
//! submitter.submit(Order::new(2, vec![bread.line_item(2)], dec!(100)));
//!
//! let outcomes = submitter.finish();
//! assert!(outcomes.iter().all(|outcome| outcome.result.is_ok()));
//! ```

use crate::billing::BillingSystem;
use crate::bill::Bill;
use crate::error::BillingError;
use crate::item::LineItem;
use crossbeam::channel::{self, Receiver, Sender};
use rust_decimal::Decimal;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A purchase waiting to be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// Caller-chosen identifier, echoed back in the [`Outcome`].
    pub id: u64,
    pub lines: Vec<LineItem>,
    pub discount: Decimal,
    pub cash_tendered: Decimal,
}

impl Order {
    pub fn new(id: u64, lines: Vec<LineItem>, cash_tendered: Decimal) -> Self {
        Self {
            id,
            lines,
            discount: Decimal::ZERO,
            cash_tendered,
        }
    }

    pub fn with_discount(mut self, discount: Decimal) -> Self {
        self.discount = discount;
        self
    }
}

/// Result of one processed [`Order`].
#[derive(Debug, Clone)]
pub struct Outcome {
    pub order_id: u64,
    pub result: Result<Arc<Bill>, BillingError>,
}

/// Worker pool feeding orders to a shared coordinator.
#[derive(Debug)]
pub struct Submitter {
    orders: Sender<Order>,
    outcomes: Receiver<Outcome>,
    workers: Vec<JoinHandle<()>>,
}

impl Submitter {
    /// Spawns `workers` threads (at least one).
    pub fn new(system: Arc<BillingSystem>, workers: usize) -> Self {
        let (orders, order_rx) = channel::unbounded::<Order>();
        let (outcome_tx, outcomes) = channel::unbounded();

        let workers = (0..workers.max(1))
            .map(|worker| {
                let system = Arc::clone(&system);
                let order_rx = order_rx.clone();
                let outcome_tx = outcome_tx.clone();
                thread::spawn(move || run_worker(worker, &system, order_rx, outcome_tx))
            })
            .collect::<Vec<_>>();
        tracing::info!(workers = workers.len(), "submitter started");

        Self {
            orders,
            outcomes,
            workers,
        }
    }

    /// Queues an order for the next free worker.
    pub fn submit(&self, order: Order) {
        let order_id = order.id;
        if self.orders.send(order).is_err() {
            tracing::error!(order_id, "no billing worker left to accept order");
        }
    }

    /// Stops accepting orders, waits for the queue to drain and returns every
    /// outcome sorted by order id.
    pub fn finish(self) -> Vec<Outcome> {
        drop(self.orders);
        for handle in self.workers {
            if handle.join().is_err() {
                tracing::error!("billing worker panicked");
            }
        }

        let mut outcomes: Vec<Outcome> = self.outcomes.try_iter().collect();
        outcomes.sort_by_key(|outcome| outcome.order_id);
        tracing::info!(processed = outcomes.len(), "submitter finished");
        outcomes
    }
}

fn run_worker(
    worker: usize,
    system: &BillingSystem,
    orders: Receiver<Order>,
    outcomes: Sender<Outcome>,
) {
    for order in orders {
        // The ledger applies a batch under one guard and parking_lot locks do
        // not poison, so shared state stays consistent across an unwind.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            system.process_discounted(&order.lines, order.discount, order.cash_tendered)
        }))
        .unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            tracing::error!(worker, order_id = order.id, %message, "billing worker recovered from panic");
            Err(BillingError::TransactionPanicked { message })
        });
        match &result {
            Ok(bill) => tracing::debug!(worker, order_id = order.id, serial = %bill.serial_number(), "order billed"),
            Err(e) => tracing::debug!(worker, order_id = order.id, error = %e, "order rejected"),
        }
        // The receiver lives in the Submitter, which outlives every worker.
        let _ = outcomes.send(Outcome {
            order_id: order.id,
            result,
        });
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
