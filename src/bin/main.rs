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

use chrono::NaiveDate;
use clap::Parser;
use csv::{ReaderBuilder, Trim};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use syos_billing::{
    Bill, BillLog, BillingConfig, BillingError, BillingSystem, DEFAULT_REORDER_THRESHOLD,
    Inventory, LineItem, Order, SalesSummary, StockItem, Submitter,
};
use tracing_subscriber::EnvFilter;

/// SYOS Billing - Run concurrent point-of-sale transactions
///
/// Loads stock and sales CSV files, bills every sale on a worker pool and
/// prints a JSON report to stdout. Without files, runs the built-in demo.
#[derive(Parser, Debug)]
#[command(name = "syos-billing")]
#[command(about = "A billing engine that processes concurrent sales against shared stock", long_about = None)]
struct Args {
    /// Path to CSV file with initial stock
    ///
    /// Expected format: code,name,price,quantity,expiry
    #[arg(long, value_name = "FILE", requires = "sales")]
    stock: Option<PathBuf>,

    /// Path to CSV file with sales lines
    ///
    /// Expected format: tx,code,quantity,cash
    /// Rows sharing a `tx` form one transaction.
    #[arg(long, value_name = "FILE", requires = "stock")]
    sales: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, env = "SYOS_WORKERS", default_value_t = BillingConfig::DEFAULT_WORKERS)]
    workers: usize,

    /// Items below this quantity are listed for reorder
    #[arg(long, env = "SYOS_REORDER_THRESHOLD", default_value_t = DEFAULT_REORDER_THRESHOLD)]
    reorder_threshold: u32,

    /// Serial number of the first bill
    #[arg(long, default_value_t = 1)]
    first_serial: u64,
}

impl Args {
    fn config(&self) -> BillingConfig {
        BillingConfig {
            workers: self.workers,
            reorder_threshold: self.reorder_threshold,
            first_serial: self.first_serial,
        }
    }
}

fn main() {
    init_tracing();
    let args = Args::parse();

    let config = args.config();
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        process::exit(1);
    }

    let inventory = Arc::new(Inventory::new());
    let bills = Arc::new(BillLog::starting_at(config.first_serial));

    let orders = match (&args.stock, &args.sales) {
        (Some(stock), Some(sales)) => match load_files(&inventory, stock, sales) {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "error loading input files");
                process::exit(1);
            }
        },
        _ => match demo_orders(&inventory) {
            Ok(orders) => orders,
            Err(e) => {
                tracing::error!(error = %e, "error seeding demo stock");
                process::exit(1);
            }
        },
    };

    let system = Arc::new(BillingSystem::new(Arc::clone(&inventory), Arc::clone(&bills)));
    let submitter = Submitter::new(system, config.workers);
    for order in orders {
        submitter.submit(order);
    }

    for outcome in submitter.finish() {
        match outcome.result {
            Ok(bill) => tracing::info!(
                order = outcome.order_id,
                serial = %bill.serial_number(),
                change = %bill.change(),
                "transaction completed"
            ),
            Err(e) => tracing::warn!(order = outcome.order_id, error = %e, "transaction failed"),
        }
    }

    let all_bills = bills.all_bills();
    let report = Report {
        bills: all_bills.iter().map(Arc::as_ref).collect(),
        summary: SalesSummary::from_bills(&all_bills),
        stock: inventory.current_stock(),
        reorder: inventory.reorder_levels(config.reorder_threshold),
    };
    if let Err(e) = write_report(&report, io::stdout()) {
        tracing::error!(error = %e, "error writing report");
        process::exit(1);
    }
}

/// Logs go to stderr so the JSON report on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_files(inventory: &Inventory, stock: &Path, sales: &Path) -> Result<Vec<Order>, csv::Error> {
    let stock = File::open(stock)?;
    let loaded = load_stock(inventory, BufReader::new(stock))?;
    tracing::info!(items = loaded, "stock loaded");

    let sales = File::open(sales)?;
    load_orders(inventory, BufReader::new(sales))
}

/// Seeds the two demo items and returns two overlapping purchases.
fn demo_orders(inventory: &Inventory) -> Result<Vec<Order>, BillingError> {
    let milk = StockItem::new("ITEM001", "Milk", dec!(100), 200, MILK_EXPIRY);
    let bread = StockItem::new("ITEM002", "Bread", dec!(50), 150, BREAD_EXPIRY);
    inventory.add_item(milk.clone())?;
    inventory.add_item(bread.clone())?;

    Ok(vec![
        Order::new(1, vec![milk.line_item(2), bread.line_item(3)], dec!(400)),
        Order::new(2, vec![milk.line_item(1), bread.line_item(1)], dec!(200)),
    ])
}

const MILK_EXPIRY: NaiveDate = demo_date(2024, 12, 1);
const BREAD_EXPIRY: NaiveDate = demo_date(2024, 6, 1);

/// Evaluated in const context, so an invalid literal fails the build.
const fn demo_date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => date,
        None => panic!("invalid demo date"),
    }
}

/// Raw stock CSV record.
///
/// Fields: `code, name, price, quantity, expiry`
#[derive(Debug, Deserialize)]
struct StockRecord {
    code: String,
    name: String,
    price: Decimal,
    quantity: u32,
    expiry: NaiveDate,
}

impl From<StockRecord> for StockItem {
    fn from(record: StockRecord) -> Self {
        StockItem::new(record.code, record.name, record.price, record.quantity, record.expiry)
    }
}

/// Raw sales CSV record.
///
/// Fields: `tx, code, quantity, cash`. Only `tx` must parse for the row to
/// be attributed; a bad `quantity` sinks its transaction.
#[derive(Debug, Deserialize)]
struct SaleRecord {
    tx: u64,
    code: String,
    #[serde(deserialize_with = "csv::invalid_option")]
    quantity: Option<u32>,
    #[serde(deserialize_with = "csv::invalid_option")]
    cash: Option<Decimal>,
}

#[derive(Debug, Default)]
struct PendingOrder {
    lines: Vec<LineItem>,
    cash: Option<Decimal>,
    /// Set once any row of the transaction is unusable.
    invalid: bool,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .has_headers(true)
        .from_reader(reader)
}

/// Adds every well-formed stock row to the ledger and returns how many were added.
///
/// Malformed rows and duplicate codes are skipped with a warning.
fn load_stock<R: Read>(inventory: &Inventory, reader: R) -> Result<usize, csv::Error> {
    let mut added = 0;
    for result in csv_reader(reader).deserialize::<StockRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed stock row");
                continue;
            }
        };
        match inventory.add_item(record.into()) {
            Ok(()) => added += 1,
            Err(e) => tracing::warn!(error = %e, "skipping stock row"),
        }
    }
    Ok(added)
}

/// Groups sales rows into orders by `tx`, in ascending `tx` order.
///
/// Names and prices come from the ledger. A transaction is all or nothing:
/// if any of its rows has an unknown code or a bad quantity, or no row
/// carries `cash`, the whole transaction is skipped with a warning. Rows
/// whose `tx` cannot be read are skipped on their own.
fn load_orders<R: Read>(inventory: &Inventory, reader: R) -> Result<Vec<Order>, csv::Error> {
    let mut pending: BTreeMap<u64, PendingOrder> = BTreeMap::new();

    for result in csv_reader(reader).deserialize::<SaleRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "skipping sales row without a transaction id");
                continue;
            }
        };

        let order = pending.entry(record.tx).or_default();
        if order.cash.is_none() {
            order.cash = record.cash;
        }
        let Some(quantity) = record.quantity else {
            tracing::warn!(tx = record.tx, code = %record.code, "invalid quantity, dropping transaction");
            order.invalid = true;
            continue;
        };
        let Some(item) = inventory.get(&record.code) else {
            tracing::warn!(tx = record.tx, code = %record.code, "unknown item, dropping transaction");
            order.invalid = true;
            continue;
        };
        order.lines.push(item.line_item(quantity));
    }

    Ok(pending
        .into_iter()
        .filter_map(|(tx, order)| match order.cash {
            _ if order.invalid => None,
            Some(cash) => Some(Order::new(tx, order.lines, cash)),
            None => {
                tracing::warn!(tx, "skipping transaction without cash tendered");
                None
            }
        })
        .collect())
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    bills: Vec<&'a Bill>,
    summary: SalesSummary,
    stock: Vec<StockItem>,
    reorder: Vec<StockItem>,
}

fn write_report<W: Write>(report: &Report<'_>, mut writer: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer).map_err(serde_json::Error::io)
}
