//! Schema-directed JSON to Avro conversion.
//!
//! Two halves share one declared schema, a JSON list of column descriptors:
//!
//! - The **schema compiler** turns the declaration into an Avro schema
//!   (`.avsc` JSON), synthesizing names and namespaces for records, enums,
//!   and fixed types, and tagging every node with its declared `source.type`.
//! - The **record transformer** walks loosely typed JSON records alongside
//!   the same declaration and produces normalized records: declared columns
//!   in order, missing columns as `null`, unions resolved by ordered trial,
//!   and enum symbols and fixed lengths checked.
//!
//! [`JsonConverter`] is the entry point for both. It is a non-consuming
//! builder that can be reused across schemas.
//!
//! # Converting records
//!
//! ```
//! use json2avro::JsonConverter;
//!
//! let schema = JsonConverter::new().table("orders").convert_schema(r#"[
//!     {"columnName": "id", "dataType": {"type": "long"}},
//!     {"columnName": "tags", "dataType": {"type": "array", "items": "string"}, "isNullable": true}
//! ]"#)?;
//! println!("{}", schema.to_string_pretty()?);
//!
//! let record = JsonConverter::new().convert_record(&schema, r#"{"id": 7}"#)?;
//! assert_eq!(record, serde_json::json!({"id": 7, "tags": null}));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Error handling
//!
//! Malformed declarations fail with [`SchemaConversionError`], records that
//! cannot be reconciled with their schema with [`DataConversionError`]. Both
//! implement [`miette::Diagnostic`]; printing them through a miette report
//! shows the source span of JSON syntax errors and "did you mean" hints.

pub(crate) mod compiler;
pub(crate) mod converter;
pub(crate) mod error;
pub mod model;
pub(crate) mod reader;
pub(crate) mod resolve;
pub(crate) mod suggest;
pub(crate) mod transform;

pub use compiler::{SchemaContext, compile, compile_root};
pub use converter::{ConvertedSchema, JsonConverter};
pub use error::{DataConversionError, SchemaConversionError};
pub use reader::{parse_schema, schema_from_json};
pub use transform::NormalizedValue;
