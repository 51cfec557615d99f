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

//! Property-based tests for the billing engine.
//!
//! These tests verify invariants that should hold for any stock level and
//! any sequence of purchase requests.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use syos_billing::{BillLog, BillingSystem, Inventory, ItemCode, LineItem, StockItem};

// =============================================================================
// Arbitrary Strategies
// =============================================================================

const CODES: [&str; 4] = ["ITEM001", "ITEM002", "ITEM003", "ITEM004"];

/// Generate a unit price (0.01 to 100.00).
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1i64..=10_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate initial stock quantities for every code.
fn arb_stock() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..50, CODES.len())
}

/// Generate a batch of (code index, quantity) requests, possibly repeating codes.
fn arb_batch() -> impl Strategy<Value = Vec<(usize, u32)>> {
    prop::collection::vec((0..CODES.len(), 1u32..20), 1..6)
}

fn make_inventory(quantities: &[u32], price: Decimal) -> Arc<Inventory> {
    let inventory = Arc::new(Inventory::new());
    let expiry = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    for (code, quantity) in CODES.iter().zip(quantities) {
        inventory
            .add_item(StockItem::new(*code, *code, price, *quantity, expiry))
            .unwrap();
    }
    inventory
}

fn to_requests(batch: &[(usize, u32)]) -> Vec<(ItemCode, u32)> {
    batch
        .iter()
        .map(|(index, quantity)| (ItemCode::from(CODES[*index]), *quantity))
        .collect()
}

fn quantities(inventory: &Inventory) -> BTreeMap<String, u32> {
    inventory
        .current_stock()
        .into_iter()
        .map(|item| (item.code.to_string(), item.quantity))
        .collect()
}

// =============================================================================
// Ledger Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// A batch either applies every entry exactly or changes nothing.
    #[test]
    fn batch_is_all_or_nothing(stock in arb_stock(), batch in arb_batch()) {
        let inventory = make_inventory(&stock, Decimal::ONE);
        let before = quantities(&inventory);

        let mut demand: BTreeMap<String, u32> = BTreeMap::new();
        for (index, quantity) in &batch {
            *demand.entry(CODES[*index].to_string()).or_insert(0) += quantity;
        }
        let satisfiable = demand.iter().all(|(code, wanted)| before[code] >= *wanted);

        let result = inventory.check_and_decrement_batch(&to_requests(&batch));
        let after = quantities(&inventory);

        prop_assert_eq!(result.is_ok(), satisfiable);
        for (code, quantity) in &before {
            let expected = if satisfiable {
                quantity - demand.get(code).copied().unwrap_or(0)
            } else {
                *quantity
            };
            prop_assert_eq!(after[code], expected);
        }
    }

    /// Stock plus billed units always equals initial stock, whatever mix of
    /// transactions succeeds or fails.
    #[test]
    fn billed_units_conserve_stock(
        stock in arb_stock(),
        price in arb_price(),
        batches in prop::collection::vec(arb_batch(), 1..15),
    ) {
        let inventory = make_inventory(&stock, price);
        let system = BillingSystem::new(Arc::clone(&inventory), Arc::new(BillLog::new()));

        for batch in &batches {
            let lines: Vec<LineItem> = batch
                .iter()
                .map(|(index, quantity)| LineItem::new(CODES[*index], CODES[*index], price, *quantity))
                .collect();
            let total: Decimal = lines.iter().map(|line| line.subtotal().unwrap()).sum();
            let _ = system.process_transaction(&lines, total);
        }

        let bills = system.bills().all_bills();
        for (index, code) in CODES.iter().enumerate() {
            let billed: u64 = bills
                .iter()
                .flat_map(|bill| bill.line_items())
                .filter(|line| line.code.as_str() == *code)
                .map(|line| u64::from(line.quantity))
                .sum();
            let remaining = inventory.get(code).unwrap().quantity;
            prop_assert_eq!(billed + u64::from(remaining), u64::from(stock[index]));
        }
    }

    /// Sequential commits receive consecutive serials starting at 1, and a
    /// failure never consumes one.
    #[test]
    fn serials_consecutive_across_failures(
        stock in arb_stock(),
        batches in prop::collection::vec(arb_batch(), 1..15),
    ) {
        let inventory = make_inventory(&stock, Decimal::ONE);
        let system = BillingSystem::new(inventory, Arc::new(BillLog::new()));

        let mut committed = 0u64;
        for batch in &batches {
            let lines: Vec<LineItem> = batch
                .iter()
                .map(|(index, quantity)| LineItem::new(CODES[*index], CODES[*index], Decimal::ONE, *quantity))
                .collect();
            if let Ok(bill) = system.process_transaction(&lines, Decimal::from(1_000)) {
                committed += 1;
                prop_assert_eq!(bill.serial_number().0, committed);
            }
        }
        prop_assert_eq!(system.bills().len() as u64, committed);
    }

    /// Change is always cash minus total, and never negative.
    #[test]
    fn change_is_cash_minus_total(
        price in arb_price(),
        quantity in 1u32..10,
        extra in 0i64..100_000,
    ) {
        let inventory = make_inventory(&[100, 0, 0, 0], price);
        let system = BillingSystem::new(inventory, Arc::new(BillLog::new()));

        let line = LineItem::new(CODES[0], CODES[0], price, quantity);
        let total = line.subtotal().unwrap();
        let cash = total + Decimal::new(extra, 2);

        let bill = system.process_transaction(&[line], cash).unwrap();
        prop_assert_eq!(bill.total_price(), total);
        prop_assert_eq!(bill.change(), cash - total);
        prop_assert!(bill.change() >= Decimal::ZERO);
    }

    /// Any cash below the total is rejected and leaves stock untouched.
    #[test]
    fn underpayment_never_touches_stock(
        price in arb_price(),
        quantity in 1u32..10,
        short in 1i64..1_000,
    ) {
        let inventory = make_inventory(&[100, 0, 0, 0], price);
        let system = BillingSystem::new(Arc::clone(&inventory), Arc::new(BillLog::new()));

        let line = LineItem::new(CODES[0], CODES[0], price, quantity);
        let cash = line.subtotal().unwrap() - Decimal::new(short, 2);

        prop_assert!(system.process_transaction(&[line], cash).is_err());
        prop_assert_eq!(inventory.get(CODES[0]).unwrap().quantity, 100);
        prop_assert!(system.bills().is_empty());
    }
}
