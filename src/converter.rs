// ==============================================================================
// Library API: `JsonConverter` Builder
// ==============================================================================
//
// Ties the pieces together for callers:
//
//   schema text -> reader -> SchemaNode list -> compiler -> OutputSchema -> JSON
//   record text -> serde_json::Value -> transformer (same SchemaNode list)
//
// The builder holds only context metadata (table name, namespace, unpack
// toggle). Every call builds its state fresh, so one converter can be reused
// for any number of schemas, and a `ConvertedSchema` can be shared across
// threads while records are converted against it.

use serde_json::Value;
use tracing::{debug, info};

use crate::compiler::{SchemaContext, compile_root};
use crate::error::{DataConversionError, SchemaConversionError};
use crate::model::json::output_schema_to_json;
use crate::model::node::SchemaNode;
use crate::model::schema::OutputSchema;
use crate::reader::{json_kind, parse_schema};
use crate::transform::{NormalizedValue, transform_columns};

/// Builder for compiling column-descriptor schemas and converting records
/// against them.
///
/// Follows the non-consuming builder pattern: configuration methods take
/// `&mut self` and return `&mut Self`, so the converter can be set up in one
/// chain or over several statements, and then reused.
///
/// # Examples
///
/// ```
/// use json2avro::JsonConverter;
///
/// let mut converter = JsonConverter::new();
/// converter.table("events").namespace("org.example");
///
/// let schema = converter.convert_schema(
///     r#"[{"columnName": "kind", "dataType": {"type": "enum", "symbols": ["OPEN", "CLOSE"]}}]"#,
/// )?;
/// let record = converter.convert_record(&schema, r#"{"kind": "OPEN", "extra": 1}"#)?;
/// assert_eq!(record, serde_json::json!({"kind": "OPEN"}));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct JsonConverter {
    context: SchemaContext,
    unpack: bool,
}

impl Default for JsonConverter {
    fn default() -> Self {
        JsonConverter {
            context: SchemaContext::default(),
            unpack: true,
        }
    }
}

impl JsonConverter {
    #[must_use]
    pub fn new() -> Self {
        JsonConverter::default()
    }

    /// Name given to the outermost record when the schema does not declare
    /// one. Characters Avro disallows in names are replaced with `_`.
    pub fn table(&mut self, name: impl Into<String>) -> &mut Self {
        self.context.table_name = name.into();
        self
    }

    /// Namespace for named types that do not declare their own.
    pub fn namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.context.namespace = Some(namespace.into());
        self
    }

    /// When disabled, records are checked to be JSON objects and otherwise
    /// passed through untouched.
    pub fn unpack(&mut self, enabled: bool) -> &mut Self {
        self.unpack = enabled;
        self
    }

    /// Compile schema text into an Avro schema.
    pub fn convert_schema(&self, schema: &str) -> Result<ConvertedSchema, SchemaConversionError> {
        self.convert_schema_named(schema, "<schema>")
    }

    /// Like [`convert_schema`](Self::convert_schema), labelling the text with
    /// `source_name` (typically a file path) in diagnostics.
    pub fn convert_schema_named(
        &self,
        schema: &str,
        source_name: &str,
    ) -> Result<ConvertedSchema, SchemaConversionError> {
        info!(table = %self.context.table_name, source = source_name, %schema, "converting schema");
        let columns = parse_schema(schema, source_name)?;
        let output = compile_root(&columns, &self.context)?;
        let json = output_schema_to_json(&output);
        let compact = json.to_string();
        debug!(schema = %compact, "converted schema");
        Ok(ConvertedSchema {
            columns,
            output,
            json,
            compact,
        })
    }

    /// Convert one record given as JSON text.
    ///
    /// With unpacking on (the default), the record is normalized against the
    /// schema: declared columns come out in schema order, missing ones as
    /// `null`, and undeclared keys are dropped. With unpacking off, the
    /// parsed object is returned as is.
    pub fn convert_record(
        &self,
        schema: &ConvertedSchema,
        record: &str,
    ) -> Result<Value, DataConversionError> {
        debug!(%record, schema = %schema.compact, "converting record");
        let value: Value = serde_json::from_str(record)
            .map_err(|e| data_error(schema, record, format!("invalid record JSON: {e}"), None))?;
        if !self.unpack {
            return match value {
                Value::Object(_) => Ok(value),
                other => Err(not_an_object(schema, record, &other)),
            };
        }
        normalize(schema, &value, record).map(NormalizedValue::into_value)
    }

    /// Normalize an already-parsed record against the schema. Always performs
    /// the deep transformation, regardless of the unpack setting.
    pub fn transform(
        &self,
        schema: &ConvertedSchema,
        record: &Value,
    ) -> Result<NormalizedValue, DataConversionError> {
        normalize(schema, record, &record.to_string())
    }
}

/// Deep transformation of a parsed record. `text` is what errors report as
/// the offending record.
fn normalize(
    schema: &ConvertedSchema,
    record: &Value,
    text: &str,
) -> Result<NormalizedValue, DataConversionError> {
    let Value::Object(entries) = record else {
        return Err(not_an_object(schema, text, record));
    };
    transform_columns(entries, &schema.columns).map_err(|e| {
        let help = e.help();
        data_error(schema, text, e.to_string(), help)
    })
}

fn data_error(
    schema: &ConvertedSchema,
    record: &str,
    detail: String,
    help: Option<String>,
) -> DataConversionError {
    DataConversionError {
        record: record.to_string(),
        schema: schema.compact.clone(),
        detail,
        help,
    }
}

fn not_an_object(schema: &ConvertedSchema, record: &str, value: &Value) -> DataConversionError {
    data_error(
        schema,
        record,
        format!("expected a JSON object, found {}", json_kind(value)),
        None,
    )
}

/// A compiled schema: the declared columns the transformer walks, and the
/// Avro schema handed to writers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedSchema {
    columns: Vec<SchemaNode>,
    output: OutputSchema,
    json: Value,
    /// Single-line rendering, used in log lines and error messages.
    compact: String,
}

impl ConvertedSchema {
    /// Declared top-level columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[SchemaNode] {
        &self.columns
    }

    #[must_use]
    pub fn output(&self) -> &OutputSchema {
        &self.output
    }

    /// The Avro schema as JSON (`.avsc` content).
    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    /// The Avro schema as pretty-printed JSON text.
    pub fn to_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const PERSON: &str = r#"[
        {"columnName": "name", "dataType": {"type": "string"}},
        {"columnName": "status", "dataType": {"type": "enum", "symbols": ["ACTIVE", "INACTIVE"]}}
    ]"#;

    fn person() -> (JsonConverter, ConvertedSchema) {
        let mut converter = JsonConverter::new();
        converter.table("person").namespace("org.example");
        let schema = converter.convert_schema(PERSON).unwrap();
        (converter, schema)
    }

    #[test]
    fn defaults() {
        let converter = JsonConverter::new();
        assert_eq!(converter.context.table_name, "Record");
        assert_eq!(converter.context.namespace, None);
        assert!(converter.unpack);
    }

    #[test]
    fn schema_uses_table_and_namespace() {
        let (_, schema) = person();
        assert_eq!(schema.json()["name"], json!("person"));
        assert_eq!(schema.json()["namespace"], json!("org.example"));
        assert_eq!(schema.columns().len(), 2);
        assert_eq!(schema.output().full_name().as_deref(), Some("org.example.person"));
    }

    #[test]
    fn record_is_normalized() {
        let (converter, schema) = person();
        let out = converter
            .convert_record(&schema, r#"{"status": "ACTIVE", "age": 3}"#)
            .unwrap();
        assert_eq!(serde_json::to_string(&out).unwrap(), r#"{"name":null,"status":"ACTIVE"}"#);
    }

    #[test]
    fn failure_carries_record_schema_and_help() {
        let (converter, schema) = person();
        let err = converter
            .convert_record(&schema, r#"{"status": "active"}"#)
            .unwrap_err();
        assert_eq!(err.record, r#"{"status": "active"}"#);
        assert_eq!(err.schema, schema.json().to_string());
        assert_eq!(
            err.detail,
            r#"at `status`: invalid symbol "active", allowed values: [ACTIVE, INACTIVE]"#
        );
        assert_eq!(err.help.as_deref(), Some("did you mean `ACTIVE`?"));
    }

    #[test]
    fn transform_reports_the_parsed_record() {
        let (converter, schema) = person();
        let err = converter
            .transform(&schema, &json!({"status": "active"}))
            .unwrap_err();
        assert_eq!(err.record, r#"{"status":"active"}"#);
        assert_eq!(err.help.as_deref(), Some("did you mean `ACTIVE`?"));
    }

    #[test]
    fn pretty_schema_parses_back() {
        let (_, schema) = person();
        let text = schema.to_string_pretty().unwrap();
        assert!(text.contains('\n'));
        assert_eq!(&serde_json::from_str::<Value>(&text).unwrap(), schema.json());
    }

    #[test]
    fn record_must_be_an_object() {
        let (converter, schema) = person();
        let err = converter.convert_record(&schema, "[1, 2]").unwrap_err();
        assert_eq!(err.detail, "expected a JSON object, found an array");

        let err = converter.convert_record(&schema, "{not json").unwrap_err();
        assert!(err.detail.starts_with("invalid record JSON"), "{}", err.detail);
    }

    #[test]
    fn passthrough_when_unpacking_is_off() {
        let (mut converter, schema) = person();
        converter.unpack(false);
        let out = converter
            .convert_record(&schema, r#"{"status": "bogus", "age": 3}"#)
            .unwrap();
        assert_eq!(out, json!({"status": "bogus", "age": 3}));
        assert!(converter.convert_record(&schema, "42").is_err());
    }

    #[test]
    fn converter_is_reusable() {
        let (converter, first) = person();
        let second = converter.convert_schema(PERSON).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn compiled_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConvertedSchema>();
        assert_send_sync::<JsonConverter>();
    }
}
