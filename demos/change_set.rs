//! Sending a change set between two copies of a table.
//!
//! Run with: cargo run --example change_set

use serde_dataset::{from_str, row, to_string_pretty, Change, Dataset, Table};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let mut customers = Table::new("Customers");
    customers.append_row(row! { "IdCustomer" => 1, "Name" => "Alice", "Active" => true })?;
    customers.append_row(row! { "IdCustomer" => 2, "Name" => "Bob", "Active" => true })?;
    customers.append_row(row! { "IdCustomer" => 3, "Name" => "Carol", "Active" => false })?;
    customers.set_primary_key(["IdCustomer"])?;

    // Edit locally: renumber Bob, drop Carol, add Dave
    customers.modify_row(1, row! { "IdCustomer" => 20, "Name" => "Robert" })?;
    customers.delete_row(2)?;
    customers.insert_row(row! { "IdCustomer" => 4, "Name" => "Dave", "Active" => true })?;

    let dataset: Dataset = [customers].into_iter().collect();
    let json = to_string_pretty(&dataset)?;
    println!("Change set:\n{}\n", json);

    // The receiving side sees the same states and original keys
    let received = from_str(&json)?;
    assert_eq!(received, dataset);

    for change in received.changes() {
        match change {
            Change::Insert { table, values, .. } => {
                println!("INSERT INTO {} {:?}", table, values.keys().collect::<Vec<_>>());
            }
            Change::Update { table, key, .. } => {
                println!("UPDATE {} WHERE {:?}", table, key);
            }
            Change::Delete { table, key, .. } => {
                println!("DELETE FROM {} WHERE {:?}", table, key);
            }
        }
    }

    let mut applied = received;
    applied.accept_changes();
    println!("\n✓ {} rows after accepting changes", applied.get("Customers").map_or(0, Table::len));

    Ok(())
}
