//! Line items and the exported item table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product name of the placeholder row used when nothing was extracted.
pub const NO_ITEMS_NAME: &str = "No items detected";

/// Product name of the trailing total row.
pub const GRAND_TOTAL_NAME: &str = "Grand Total";

/// A purchased product or service entry.
///
/// The net amount is computed once in [`LineItem::new`] and cannot be changed
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    product_name: String,
    quantity: u32,
    unit_price: Decimal,
    net_amount: Decimal,
}

impl LineItem {
    /// Create a line item, rounding `quantity * unit_price` to two places.
    ///
    /// Returns `None` when the product does not fit in a [`Decimal`].
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price: Decimal) -> Option<Self> {
        let net_amount = Decimal::from(quantity).checked_mul(unit_price)?.round_dp(2);
        Some(Self {
            product_name: product_name.into(),
            quantity,
            unit_price,
            net_amount,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn net_amount(&self) -> Decimal {
        self.net_amount
    }
}

/// A uniform export record.
///
/// Field names match the column headers of the exported table. Money values
/// serialize as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Product/service name.
    #[serde(rename = "Product Name")]
    pub product_name: String,

    /// Quantity (`None` on the grand total row).
    #[serde(rename = "Quantity")]
    pub quantity: Option<u32>,

    /// Unit price (`None` on the grand total row).
    #[serde(rename = "Unit Price", with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,

    /// Net amount for the row.
    #[serde(rename = "Net Amount", with = "rust_decimal::serde::float")]
    pub net_amount: Decimal,
}

impl TableRow {
    /// The placeholder row inserted when no items survive filtering.
    pub fn no_items() -> Self {
        Self {
            product_name: NO_ITEMS_NAME.to_string(),
            quantity: Some(0),
            unit_price: Some(Decimal::ZERO),
            net_amount: Decimal::ZERO,
        }
    }

    /// The trailing grand total row.
    pub fn grand_total(net_amount: Decimal) -> Self {
        Self {
            product_name: GRAND_TOTAL_NAME.to_string(),
            quantity: None,
            unit_price: None,
            net_amount,
        }
    }

    /// Check if this is the grand total row.
    pub fn is_grand_total(&self) -> bool {
        self.product_name == GRAND_TOTAL_NAME && self.quantity.is_none()
    }
}

impl From<&LineItem> for TableRow {
    fn from(item: &LineItem) -> Self {
        Self {
            product_name: item.product_name.clone(),
            quantity: Some(item.quantity),
            unit_price: Some(item.unit_price),
            net_amount: item.net_amount,
        }
    }
}

/// Ordered table of extracted rows, always terminated by one grand total row.
///
/// Built by [`crate::extract::aggregate::build_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemTable {
    rows: Vec<TableRow>,
}

impl ItemTable {
    pub(crate) fn from_rows(rows: Vec<TableRow>) -> Self {
        debug_assert!(rows.last().is_some_and(TableRow::is_grand_total));
        Self { rows }
    }

    /// All rows, grand total last.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Rows preceding the grand total.
    pub fn body(&self) -> &[TableRow] {
        &self.rows[..self.rows.len() - 1]
    }

    /// The grand total row.
    pub fn grand_total(&self) -> &TableRow {
        &self.rows[self.rows.len() - 1]
    }

    /// Number of rows including the grand total.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Never true; a table always holds at least the grand total.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether extraction found nothing and the placeholder row was used.
    pub fn has_no_items(&self) -> bool {
        matches!(self.body(), [row] if *row == TableRow::no_items())
    }
}
