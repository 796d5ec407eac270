//! Table serialization for the presentation layer.
//!
//! Every format writes one flat table: rows in extraction order, grand total
//! last, with the columns `Product Name`, `Quantity`, `Unit Price` and
//! `Net Amount`.

use std::fmt::Write as _;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ExportError;
use crate::models::table::{ItemTable, TableRow};

/// Column headers, in order.
pub const COLUMNS: [&str; 4] = ["Product Name", "Quantity", "Unit Price", "Net Amount"];

/// Output format for an item table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableFormat {
    /// `{ "<sheet>": [ rows ] }`
    Json,
    /// Header line plus one record per row.
    Csv,
    /// Aligned plain-text table.
    Text,
}

impl TableFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Json => "json",
            TableFormat::Csv => "csv",
            TableFormat::Text => "txt",
        }
    }
}

/// Serialize a table in the given format under a single named section.
pub fn write_table(
    table: &ItemTable,
    format: TableFormat,
    sheet_name: &str,
) -> Result<String, ExportError> {
    match format {
        TableFormat::Json => write_json(table, sheet_name),
        TableFormat::Csv => write_csv(table),
        TableFormat::Text => Ok(write_text(table, sheet_name)),
    }
}

/// Wrap the rows in a JSON object keyed by the sheet name.
pub fn table_to_json(table: &ItemTable, sheet_name: &str) -> Result<Value, ExportError> {
    let mut sheet = Map::new();
    sheet.insert(sheet_name.to_string(), serde_json::to_value(table)?);
    Ok(Value::Object(sheet))
}

fn write_json(table: &ItemTable, sheet_name: &str) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&table_to_json(table, sheet_name)?)?)
}

fn write_csv(table: &ItemTable) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(COLUMNS)?;
    for row in table.rows() {
        wtr.write_record(cells(row))?;
    }

    let data = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(data)?)
}

fn write_text(table: &ItemTable, sheet_name: &str) -> String {
    let rows: Vec<[String; 4]> = table.rows().iter().map(cells).collect();

    let mut widths = COLUMNS.map(|c| c.chars().count());
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", sheet_name);
    push_text_row(&mut output, &COLUMNS.map(String::from), &widths);

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(output, "{}", rule.join("-+-"));

    for row in &rows {
        push_text_row(&mut output, row, &widths);
    }

    output
}

fn push_text_row(output: &mut String, row: &[String; 4], widths: &[usize; 4]) {
    // Name left-aligned, numbers right-aligned.
    let _ = writeln!(
        output,
        "{:<w0$} | {:>w1$} | {:>w2$} | {:>w3$}",
        row[0],
        row[1],
        row[2],
        row[3],
        w0 = widths[0],
        w1 = widths[1],
        w2 = widths[2],
        w3 = widths[3],
    );
}

fn cells(row: &TableRow) -> [String; 4] {
    [
        row.product_name.clone(),
        row.quantity.map(|q| q.to_string()).unwrap_or_default(),
        row.unit_price.map(format_money).unwrap_or_default(),
        format_money(row.net_amount),
    ]
}

/// Format a money value with two decimal places.
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_table;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_export() {
        let table = extract_table("3 x Widget 10.00\nGadget $5");
        let csv = write_table(&table, TableFormat::Csv, "Line_Items").unwrap();

        assert_eq!(
            csv,
            "Product Name,Quantity,Unit Price,Net Amount\n\
             Widget,3,10.00,30.00\n\
             Gadget,1,5.00,5.00\n\
             Grand Total,,,35.00\n"
        );
    }

    #[test]
    fn test_csv_export_empty() {
        let table = extract_table("");
        let csv = write_table(&table, TableFormat::Csv, "Line_Items").unwrap();

        assert_eq!(
            csv,
            "Product Name,Quantity,Unit Price,Net Amount\n\
             No items detected,0,0.00,0.00\n\
             Grand Total,,,0.00\n"
        );
    }

    #[test]
    fn test_json_export_uses_sheet_name() {
        let table = extract_table("Widget 10.00");
        let json: Value =
            serde_json::from_str(&write_table(&table, TableFormat::Json, "Line_Items").unwrap())
                .unwrap();

        let rows = json["Line_Items"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Product Name"], "Widget");
        assert_eq!(rows[0]["Quantity"], 1);
        assert_eq!(rows[1]["Product Name"], "Grand Total");
        assert!(rows[1]["Quantity"].is_null());
        assert!(rows[1]["Unit Price"].is_null());

        let back: Vec<TableRow> = serde_json::from_value(json["Line_Items"].clone()).unwrap();
        assert_eq!(back, table.rows());
    }

    #[test]
    fn test_text_export_alignment() {
        let table = extract_table("Widget 10.00");
        let text = write_table(&table, TableFormat::Text, "Line_Items").unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Line_Items");
        assert_eq!(lines[1], "Product Name | Quantity | Unit Price | Net Amount");
        assert_eq!(lines[3], "Widget       |        1 |      10.00 |      10.00");
        assert_eq!(lines[4], "Grand Total  |          |            |      10.00");
    }

    #[test]
    fn test_extension() {
        assert_eq!(TableFormat::Csv.extension(), "csv");
        assert_eq!(TableFormat::Json.extension(), "json");
        assert_eq!(TableFormat::Text.extension(), "txt");
    }
}
