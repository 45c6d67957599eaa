//! Tables nested inside cells, plus merging a second payload into a dataset.
//!
//! Run with: cargo run --example nested_tables

use serde_dataset::{from_str, merge_from_str, row, to_string, Dataset, Table, Value};
use std::error::Error;

fn lines(order: i64, items: &[(&str, i64)]) -> Result<Table, serde_dataset::Error> {
    let mut table = Table::new("Lines");
    for (sku, qty) in items {
        table.insert_row(row! { "IdOrder" => order, "Sku" => *sku, "Qty" => *qty })?;
    }
    Ok(table)
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut orders = Table::new("Orders");
    orders.insert_row(row! {
        "IdOrder" => 1,
        "Customer" => "Alice",
        "Lines" => lines(1, &[("PEN", 3), ("INK", 1)])?,
    })?;
    orders.insert_row(row! {
        "IdOrder" => 2,
        "Customer" => "Bob",
        "Lines" => lines(2, &[])?,
    })?;

    let dataset: Dataset = [orders].into_iter().collect();
    let json = to_string(&dataset)?;
    println!("Orders with lines:\n{}\n", json);

    let mut back = from_str(&json)?;
    assert_eq!(back, dataset);

    let first = back
        .get("Orders")
        .and_then(|t| t.row(0))
        .and_then(|r| r.get("Lines"))
        .and_then(Value::as_table)
        .map_or(0, Table::len);
    println!("✓ Order 1 came back with {} lines", first);

    // A second payload appends rows to the existing table
    merge_from_str(
        r#"{"Orders":[{"Props":{"RowState":"Added"},"Data":{"Original":{},"Current":{"IdOrder":3,"Customer":"Carol","Lines":[]}}}]}"#,
        &mut back,
    )?;
    println!("✓ {} orders after merge", back.get("Orders").map_or(0, Table::len));

    Ok(())
}
