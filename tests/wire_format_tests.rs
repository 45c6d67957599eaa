//! Wire format conformance tests.
//!
//! These tests pin the exact bytes written for each row state and the exact property
//! order the reader requires.

use serde_dataset::{
    from_str, from_str_with_options, row, table_from_str, table_to_string,
    table_to_string_with_options, to_string, ColumnKind, CodecOptions, Dataset, ErrorKind, RowState, Table, WireFormat,
};

fn row_element(state: &str, original: &str, current: &str) -> String {
    format!(
        r#"{{"Props":{{"RowState":"{}"}},"Data":{{"Original":{},"Current":{}}}}}"#,
        state, original, current
    )
}

fn change_set() -> Table {
    let mut table = Table::new("Test");
    table.append_row(row! { "IdTest" => 1, "Name" => "U" }).unwrap();
    table.append_row(row! { "IdTest" => 2, "Name" => "X" }).unwrap();
    table.append_row(row! { "IdTest" => 5, "Name" => "Z" }).unwrap();
    table.set_primary_key(["IdTest"]).unwrap();
    table.modify_row(1, row! { "IdTest" => 3, "Name" => "Y" }).unwrap();
    table.delete_row(2).unwrap();
    table.insert_row(row! { "IdTest" => 4, "Name" => "A" }).unwrap();
    table
}

// Row elements

#[test]
fn test_each_state_literal() {
    let expected = format!(
        "[{},{},{},{}]",
        row_element("Unchanged", "{}", r#"{"IdTest":1,"Name":"U"}"#),
        row_element("Modified", r#"{"IdTest":2}"#, r#"{"IdTest":3,"Name":"Y"}"#),
        row_element("Deleted", "{}", r#"{"IdTest":5,"Name":"Z"}"#),
        row_element("Added", "{}", r#"{"IdTest":4,"Name":"A"}"#),
    );
    assert_eq!(table_to_string(&change_set()).unwrap(), expected);
}

#[test]
fn test_original_follows_primary_key_order() {
    let mut table = Table::new("T");
    table
        .append_row(row! { "B" => 1, "A" => 2, "V" => "x" })
        .unwrap();
    table.set_primary_key(["A", "B"]).unwrap();
    table.modify_row(0, row! { "V" => "y" }).unwrap();

    assert_eq!(
        table_to_string(&table).unwrap(),
        format!(
            "[{}]",
            row_element("Modified", r#"{"A":2,"B":1}"#, r#"{"B":1,"A":2,"V":"y"}"#)
        )
    );
}

#[test]
fn test_floats_keep_their_kind() {
    let mut table = Table::new("T");
    table.append_row(row! { "Price" => 3.0, "Qty" => 3 }).unwrap();
    assert!(table_to_string(&table)
        .unwrap()
        .contains(r#""Current":{"Price":3.0,"Qty":3}"#));
}

#[test]
fn test_pretty_output() {
    let mut table = Table::new("Test");
    table.insert_row(row! { "IdTest" => 4 }).unwrap();
    let json = table_to_string_with_options(&table, CodecOptions::pretty()).unwrap();
    assert_eq!(
        json,
        r#"[
  {
    "Props": {
      "RowState": "Added"
    },
    "Data": {
      "Original": {},
      "Current": {
        "IdTest": 4
      }
    }
  }
]"#
    );
}

// Datasets

#[test]
fn test_dataset_object() {
    let mut dataset = Dataset::new();
    dataset.insert(Table::new("Empty"));
    dataset.insert(change_set());
    let json = to_string(&dataset).unwrap();
    assert!(json.starts_with(r#"{"Empty":[],"Test":[{"Props""#));
    assert!(json.ends_with("]}"));
}

// Property order

fn decode_err(element: &str) -> ErrorKind {
    from_str(&format!(r#"{{"Test":[{}]}}"#, element))
        .unwrap_err()
        .kind()
}

#[test]
fn test_data_before_props() {
    assert_eq!(
        decode_err(r#"{"Data":{"Original":{},"Current":{}},"Props":{"RowState":"Added"}}"#),
        ErrorKind::MissingField
    );
}

#[test]
fn test_props_without_row_state() {
    assert_eq!(
        decode_err(r#"{"Props":{"State":"Added"},"Data":{"Original":{},"Current":{}}}"#),
        ErrorKind::MissingField
    );
    assert_eq!(
        decode_err(r#"{"Props":{},"Data":{"Original":{},"Current":{}}}"#),
        ErrorKind::MissingField
    );
}

#[test]
fn test_row_state_must_be_text() {
    assert_eq!(
        decode_err(r#"{"Props":{"RowState":1},"Data":{"Original":{},"Current":{}}}"#),
        ErrorKind::Protocol
    );
}

#[test]
fn test_extra_properties_are_rejected() {
    assert_eq!(
        decode_err(r#"{"Props":{"RowState":"Added","Version":2},"Data":{"Original":{},"Current":{}}}"#),
        ErrorKind::Protocol
    );
    assert_eq!(
        decode_err(r#"{"Props":{"RowState":"Added"},"Data":{"Original":{},"Current":{}},"Extra":1}"#),
        ErrorKind::Protocol
    );
}

#[test]
fn test_missing_data() {
    assert_eq!(
        decode_err(r#"{"Props":{"RowState":"Added"}}"#),
        ErrorKind::MissingField
    );
}

#[test]
fn test_missing_current() {
    assert_eq!(
        decode_err(r#"{"Props":{"RowState":"Added"},"Data":{"Original":{}}}"#),
        ErrorKind::MissingField
    );
}

#[test]
fn test_row_element_must_be_object() {
    assert_eq!(decode_err("42"), ErrorKind::Protocol);
}

#[test]
fn test_deleted_row_decodes_values() {
    let json = format!(
        r#"{{"Test":[{}]}}"#,
        row_element("Deleted", "{}", r#"{"IdTest":5,"Name":"Z"}"#)
    );
    let dataset = from_str(&json).unwrap();
    let row = dataset.get("Test").unwrap().row(0).unwrap();
    assert_eq!(row.state(), RowState::Deleted);
    assert_eq!(row.get("IdTest").and_then(|v| v.as_i64()), Some(5));
}

// Column names shaped like value envelopes

#[test]
fn test_envelope_named_column_round_trip() {
    let mut table = Table::new("Test");
    table.append_row(row! { "$f64" => "NaN" }).unwrap();
    table.append_row(row! { "$f64" => "+Inf" }).unwrap();
    table.set_primary_key(["$f64"]).unwrap();
    table.modify_row(1, row! { "$f64" => "-Inf" }).unwrap();
    table.insert_row(row! { "$f64" => "x" }).unwrap();
    let dataset: Dataset = [table].into_iter().collect();

    let json = to_string(&dataset).unwrap();
    let expected = format!(
        r#"{{"Test":[{},{},{}]}}"#,
        row_element("Unchanged", "{}", r#"{"$f64":"NaN"}"#),
        row_element("Modified", r#"{"$f64":"+Inf"}"#, r#"{"$f64":"-Inf"}"#),
        row_element("Added", "{}", r#"{"$f64":"x"}"#),
    );
    assert_eq!(json, expected);

    let back = from_str(&json).unwrap();
    assert_eq!(back, dataset);
    let table = back.get("Test").unwrap();
    assert_eq!(table.column("$f64").unwrap().kind(), ColumnKind::Text);
    let original = table.row(1).unwrap().original_key().unwrap();
    assert_eq!(original.get("$f64").and_then(|v| v.as_str()), Some("+Inf"));

    let options = CodecOptions::new().with_wire_format(WireFormat::Legacy);
    let legacy = serde_dataset::to_string_with_options(&dataset, options.clone()).unwrap();
    assert_eq!(from_str_with_options(&legacy, options).unwrap(), dataset);
}

#[test]
fn test_envelope_shaped_cell_objects_stay_columns() {
    let json = format!(
        r#"[{},{}]"#,
        row_element("Unchanged", "{}", r#"{"$bytes":"AQI="}"#),
        row_element("Unchanged", "{}", r#"{"$bytes":{"$bytes":"AQI="}}"#),
    );
    let err = table_from_str("Blobs", &json).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let json = format!(
        r#"[{},{}]"#,
        row_element("Unchanged", "{}", r#"{"$timestamp":{"$bytes":"AQI="}}"#),
        row_element("Unchanged", "{}", r#"{"$timestamp":{"$bytes":"AwQ="}}"#),
    );
    let table = table_from_str("Blobs", &json).unwrap();
    assert_eq!(table.column("$timestamp").unwrap().kind(), ColumnKind::Bytes);
    assert_eq!(
        table.row(1).unwrap().get("$timestamp").and_then(|v| v.as_bytes()),
        Some(&[3u8, 4][..])
    );
    assert_eq!(table_to_string(&table).unwrap(), json);
}

// Legacy layout

#[test]
fn test_legacy_dataset_round_trip() {
    let options = CodecOptions::new().with_wire_format(WireFormat::Legacy);
    let dataset: Dataset = [change_set()].into_iter().collect();

    let json = serde_dataset::to_string_with_options(&dataset, options.clone()).unwrap();
    assert!(json.starts_with(r#"{"Test":[{"RowState":"Unchanged"},{"IdTest":1,"Name":"U"},{"RowState":"Modified"},{"OriginalKey":{"IdTest":2}}"#));

    assert_eq!(from_str_with_options(&json, options).unwrap(), dataset);
}

#[test]
fn test_legacy_input_is_not_read_as_nested() {
    let json = r#"{"Test":[{"RowState":"Added"},{"IdTest":4}]}"#;
    assert_eq!(from_str(json).unwrap_err().kind(), ErrorKind::Protocol);
}
