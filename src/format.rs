//! Wire Format Reference
//!
//! This module documents the change-set wire format read and written by
//! [`TableCodec`](crate::TableCodec) and [`DatasetCodec`](crate::DatasetCodec).
//!
//! # Overview
//!
//! A change set carries table snapshots together with the mutation state of every row, so
//! that a receiver can apply exactly the inserts, updates and deletes the sender made.
//! Modified rows also carry the primary-key values they had before the change, which is
//! what lets a receiver find a row whose key itself was edited.
//!
//! # Datasets
//!
//! A dataset is an object with one property per table, in table order:
//!
//! ```json
//! {"Orders": [ ...row elements... ], "Customers": [ ...row elements... ]}
//! ```
//!
//! A table with no rows is written as `[]`; `null` is also accepted when reading.
//!
//! # Row Elements
//!
//! Each row is one object with two properties, always in this order:
//!
//! ```json
//! {
//!   "Props": {"RowState": "Modified"},
//!   "Data": {
//!     "Original": {"IdTest": 2},
//!     "Current": {"IdTest": 3, "Name": "Y"}
//!   }
//! }
//! ```
//!
//! | Property           | Content                                                     |
//! |--------------------|-------------------------------------------------------------|
//! | `Props.RowState`   | `Added`, `Modified`, `Unchanged` or `Deleted` (exact case)  |
//! | `Data.Original`    | primary-key values before the change; `{}` unless Modified  |
//! | `Data.Current`     | every column of the row, in column order                   |
//!
//! Deleted rows keep their last-known values in `Current`. With
//! [`skip_nulls`](crate::CodecOptions::skip_nulls), null cells are left out of `Current`;
//! the reader fills them back in as nulls.
//!
//! # Cell Values
//!
//! | Column kind        | JSON                                          |
//! |--------------------|-----------------------------------------------|
//! | integer            | `42`                                          |
//! | float              | `3.0`, `1e16` (always a fraction or exponent) |
//! | boolean            | `true`                                        |
//! | text               | `"abc"`                                       |
//! | timestamp          | `{"$timestamp":"2024-01-15T10:30:00Z"}`       |
//! | bytes              | `{"$bytes":"AAH/"}` (standard base64)         |
//! | array of a scalar  | `[1, 2, null]`                                |
//! | nested table       | an array of row elements                      |
//! | any, when absent   | `null`                                        |
//!
//! Non-finite floats are written as `{"$f64":"NaN"}`, `{"$f64":"+Inf"}` and
//! `{"$f64":"-Inf"}`.
//!
//! These envelopes are only recognised where a cell value or array element is read. The
//! `Original` and `Current` objects are always plain objects, so `{"$f64":"NaN"}` there is a
//! text column named `$f64`.
//!
//! # Column Inference
//!
//! Columns are not declared on the wire. The first value read for a column decides its
//! kind (see [`infer`](crate::infer)); later values must fit that kind. A column first seen
//! as `null` or `[]` has no evidence yet: it starts out as text (or an array of text) and
//! takes the kind of the first concrete value read for it in the same decode. An empty nested
//! table is written as `[]` too, so a column holding only empty nested tables reads back as
//! an array of text.
//!
//! # Primary Keys
//!
//! A table read without a declared primary key takes the property names of the first
//! non-empty `Original` object as its key. From then on every `Original` must name exactly
//! those columns.
//!
//! # Legacy Layout
//!
//! With [`WireFormat::Legacy`](crate::WireFormat::Legacy) each row is spread over sibling
//! objects instead:
//!
//! ```json
//! [{"RowState":"Modified"}, {"OriginalKey":{"IdTest":2}}, {"IdTest":3,"Name":"Y"},
//!  {"RowState":"Added"}, {"IdTest":4,"Name":"A"}]
//! ```
//!
//! The `OriginalKey` object is present for Modified rows only, and names are matched without
//! regard to case. The layout must be selected explicitly; it is never detected.
//!
//! # Limitations
//!
//! - **Nesting**: nested tables deeper than
//!   [`max_depth`](crate::CodecOptions::max_depth) are rejected
//! - **Arrays**: array elements are scalars of one kind; arrays of arrays are not supported
//! - **Column order**: round trips with `skip_nulls` may reorder columns, and drop columns
//!   that are null in every row

// This module contains only documentation; no implementation code
