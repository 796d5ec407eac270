//! Aggregator: turns accepted line items into the final item table.

use rust_decimal::Decimal;
use tracing::warn;

use crate::models::table::{ItemTable, LineItem, TableRow};

/// Build the item table from accepted items, in encounter order.
///
/// An empty input yields the "No items detected" placeholder. Every table
/// ends with exactly one grand total row summing the rows above it. An item
/// whose amount would overflow the running total is left out, so the total
/// always matches the rows kept.
pub fn build_table(items: Vec<LineItem>) -> ItemTable {
    let mut rows = Vec::with_capacity(items.len() + 1);
    let mut total = Decimal::ZERO;

    for item in &items {
        match total.checked_add(item.net_amount()) {
            Some(sum) => {
                total = sum;
                rows.push(TableRow::from(item));
            }
            None => warn!(
                "Dropping {:?}: grand total would overflow",
                item.product_name()
            ),
        }
    }

    if rows.is_empty() {
        rows.push(TableRow::no_items());
    }

    rows.push(TableRow::grand_total(total.round_dp(2)));

    ItemTable::from_rows(rows)
}
