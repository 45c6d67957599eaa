use chrono::{TimeZone, Utc};
use serde_dataset::{row, ColumnKind, ScalarKind, Table, Value, ValueMap};

#[test]
fn test_row_macro_empty() {
    let cells = row! {};
    assert!(cells.is_empty());
}

#[test]
fn test_row_macro_scalars() {
    let cells = row! {
        "Int" => 42,
        "Neg" => -7,
        "Float" => 3.5,
        "Bool" => false,
        "Text" => "hello",
    };
    assert_eq!(cells.get("Int"), Some(&Value::Integer(42)));
    assert_eq!(cells.get("Neg"), Some(&Value::Integer(-7)));
    assert_eq!(cells.get("Float"), Some(&Value::Float(3.5)));
    assert_eq!(cells.get("Bool"), Some(&Value::Boolean(false)));
    assert_eq!(cells.get("Text"), Some(&Value::Text("hello".to_string())));
}

#[test]
fn test_row_macro_null() {
    let cells = row! { "Name" => null };
    assert_eq!(cells.get("Name"), Some(&Value::Null));
}

#[test]
fn test_row_macro_arrays() {
    let cells = row! { "Empty" => [], "Nums" => [1, 2, 3], "Mixed" => ["a", null] };
    assert_eq!(cells.get("Empty"), Some(&Value::Array(vec![])));
    assert_eq!(
        cells.get("Nums"),
        Some(&Value::Array(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]))
    );
    assert_eq!(
        cells.get("Mixed"),
        Some(&Value::Array(vec![Value::from("a"), Value::Null]))
    );
}

#[test]
fn test_row_macro_expressions() {
    let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    let name = "Y".to_string();
    let cells = row! {
        "At" => ts,
        "Name" => name,
        "Blob" => vec![1u8, 2],
        "Maybe" => Some(5),
        "Nothing" => None::<&str>,
    };
    assert_eq!(cells.get("At"), Some(&Value::Timestamp(ts)));
    assert_eq!(cells.get("Name"), Some(&Value::from("Y")));
    assert_eq!(cells.get("Blob"), Some(&Value::Bytes(vec![1, 2])));
    assert_eq!(cells.get("Maybe"), Some(&Value::Integer(5)));
    assert_eq!(cells.get("Nothing"), Some(&Value::Null));
}

#[test]
fn test_row_macro_nested_table() {
    let mut lines = Table::new("Lines");
    lines.append_row(row! { "Sku" => "A" }).unwrap();
    let cells = row! { "Lines" => lines.clone() };
    assert_eq!(cells.get("Lines").and_then(Value::as_table), Some(&lines));
}

#[test]
fn test_row_macro_preserves_order() {
    let cells = row! { "z" => 1, "a" => 2, "m" => 3 };
    let keys: Vec<&str> = cells.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

#[test]
fn test_row_macro_feeds_tables() {
    let mut table = Table::new("Test");
    table
        .append_row(row! { "IdTest" => 1, "Tags" => ["x"], "Note" => null })
        .unwrap();

    assert_eq!(table.column("IdTest").unwrap().kind(), ColumnKind::Integer);
    assert_eq!(
        table.column("Tags").unwrap().kind(),
        ColumnKind::Array(ScalarKind::Text)
    );
    assert_eq!(table.column("Note").unwrap().kind(), ColumnKind::Text);
}

#[test]
fn test_row_macro_equals_manual_map() {
    let mut manual = ValueMap::new();
    manual.insert("IdTest".to_string(), Value::Integer(2));
    manual.insert("Name".to_string(), Value::from("X"));
    assert_eq!(row! { "IdTest" => 2, "Name" => "X" }, manual);
}
