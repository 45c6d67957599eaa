//! Configuration options for encoding and decoding.
//!
//! This module provides:
//!
//! - [`CodecOptions`]: main configuration struct
//! - [`WireFormat`]: which row layout to read and write
//!
//! ## Examples
//!
//! ```rust
//! use serde_dataset::{CodecOptions, WireFormat};
//!
//! // Omit null cells from `Current`
//! let options = CodecOptions::new().with_skip_nulls(true);
//!
//! // Read the legacy flat layout, allowing at most 8 nested table levels
//! let options = CodecOptions::new()
//!     .with_wire_format(WireFormat::Legacy)
//!     .with_max_depth(8);
//! assert_eq!(options.max_depth, 8);
//! ```

/// Default limit on nested-table recursion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Row layout on the wire.
///
/// The layout is always chosen explicitly; the decoder never guesses it from the shape of
/// the input.
///
/// - **Nested** (default): one object per row,
///   `{"Props":{"RowState":..},"Data":{"Original":{..},"Current":{..}}}`
/// - **Legacy**: up to three sibling objects per row,
///   `{"RowState":..}`, `{"OriginalKey":{..}}` (Modified rows only), then the cells
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WireFormat {
    #[default]
    Nested,
    Legacy,
}

/// Configuration options for the table and dataset codecs.
///
/// # Examples
///
/// ```rust
/// use serde_dataset::CodecOptions;
///
/// let options = CodecOptions::new();
/// assert!(!options.skip_nulls);
/// assert!(options.require_original_key);
///
/// let options = CodecOptions::pretty().with_indent(4);
/// assert!(options.pretty);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CodecOptions {
    /// Omit null cells from `Current` when encoding.
    pub skip_nulls: bool,
    /// Maximum nested-table depth accepted when decoding.
    pub max_depth: usize,
    /// Reject Modified rows whose `Original` object is empty.
    pub require_original_key: bool,
    pub wire_format: WireFormat,
    /// Newlines and indentation in JSON text output.
    pub pretty: bool,
    pub indent: usize,
    /// Read bare RFC 3339 strings as timestamps rather than text.
    pub detect_timestamps: bool,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecOptions {
            skip_nulls: false,
            max_depth: DEFAULT_MAX_DEPTH,
            require_original_key: true,
            wire_format: WireFormat::default(),
            pretty: false,
            indent: 2,
            detect_timestamps: false,
        }
    }
}

impl CodecOptions {
    /// Creates default options: nested layout, nulls written, compact output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for pretty-printed JSON output.
    #[must_use]
    pub fn pretty() -> Self {
        CodecOptions {
            pretty: true,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_skip_nulls(mut self, skip_nulls: bool) -> Self {
        self.skip_nulls = skip_nulls;
        self
    }

    /// Sets the nested-table depth limit.
    ///
    /// A top-level table is depth 0; each nested table adds one.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Allows Modified rows with an empty `Original` when the table has no primary key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_dataset::CodecOptions;
    ///
    /// let options = CodecOptions::new().with_require_original_key(false);
    /// assert!(!options.require_original_key);
    /// ```
    #[must_use]
    pub fn with_require_original_key(mut self, require: bool) -> Self {
        self.require_original_key = require;
        self
    }

    #[must_use]
    pub fn with_wire_format(mut self, wire_format: WireFormat) -> Self {
        self.wire_format = wire_format;
        self
    }

    /// Sets the indentation size (spaces per level). Only affects pretty output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_detect_timestamps(mut self, detect: bool) -> Self {
        self.detect_timestamps = detect;
        self
    }
}
