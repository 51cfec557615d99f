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

//! Sales aggregates over the bill log.

use crate::base::ItemCode;
use crate::bill::Bill;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Totals across a set of bills.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub bill_count: usize,
    /// Sum of the amount due on every bill, saturating at `Decimal::MAX`.
    pub total_revenue: Decimal,
    pub units_sold: BTreeMap<ItemCode, u64>,
}

impl SalesSummary {
    pub fn from_bills(bills: &[Arc<Bill>]) -> Self {
        let mut summary = Self {
            bill_count: bills.len(),
            ..Self::default()
        };
        for bill in bills {
            summary.total_revenue = summary.total_revenue.saturating_add(bill.amount_due());
            for line in bill.line_items() {
                *summary.units_sold.entry(line.code.clone()).or_insert(0) += u64::from(line.quantity);
            }
        }
        summary
    }
}
