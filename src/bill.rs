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

//! Immutable sales records.

use crate::base::SerialNumber;
use crate::item::LineItem;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// A committed sale.
///
/// Fields are private and a bill is only built by the coordinator, so it
/// cannot change or be forged after the fact. `total_price` is the gross total of the line items and `change` is
/// `cash_tendered - (total_price - discount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    serial_number: SerialNumber,
    date: NaiveDate,
    line_items: Vec<LineItem>,
    total_price: Decimal,
    discount: Decimal,
    cash_tendered: Decimal,
    change: Decimal,
}

impl Bill {
    pub(crate) fn new(
        serial_number: SerialNumber,
        date: NaiveDate,
        line_items: Vec<LineItem>,
        total_price: Decimal,
        discount: Decimal,
        cash_tendered: Decimal,
    ) -> Self {
        Self {
            serial_number,
            date,
            line_items,
            total_price,
            discount,
            cash_tendered,
            change: cash_tendered - (total_price - discount),
        }
    }

    pub fn serial_number(&self) -> SerialNumber {
        self.serial_number
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    pub fn discount(&self) -> Decimal {
        self.discount
    }

    /// Returns `total_price - discount`.
    pub fn amount_due(&self) -> Decimal {
        self.total_price - self.discount
    }

    pub fn cash_tendered(&self) -> Decimal {
        self.cash_tendered
    }

    pub fn change(&self) -> Decimal {
        self.change
    }

    /// Total number of units sold on this bill.
    pub fn units(&self) -> u64 {
        self.line_items.iter().map(|line| u64::from(line.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample(discount: Decimal) -> Bill {
        Bill::new(
            SerialNumber(1),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            vec![
                LineItem::new("ITEM001", "Milk", dec!(100), 2),
                LineItem::new("ITEM002", "Bread", dec!(50), 3),
            ],
            dec!(350),
            discount,
            dec!(400),
        )
    }

    #[test]
    fn change_is_cash_minus_amount_due() {
        let bill = sample(Decimal::ZERO);
        assert_eq!(bill.amount_due(), dec!(350));
        assert_eq!(bill.change(), dec!(50));
    }

    #[test]
    fn discount_reduces_amount_due_not_total() {
        let bill = sample(dec!(25));
        assert_eq!(bill.total_price(), dec!(350));
        assert_eq!(bill.amount_due(), dec!(325));
        assert_eq!(bill.change(), dec!(75));
    }

    #[test]
    fn units_sums_line_quantities() {
        assert_eq!(sample(Decimal::ZERO).units(), 5);
    }

    #[test]
    fn bill_serializes_money_as_strings() {
        let json: serde_json::Value = serde_json::to_value(sample(Decimal::ZERO)).unwrap();
        assert_eq!(json["serial_number"], 1);
        assert_eq!(json["total_price"], "350");
        assert_eq!(json["change"], "50");
        assert_eq!(json["line_items"].as_array().unwrap().len(), 2);
    }
}
