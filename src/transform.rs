// ==============================================================================
// Record Transformer: Raw JSON + SchemaNode -> Normalized JSON
// ==============================================================================
//
// Walks a raw value tree alongside the declared schema. Dispatch order for a
// value under a node:
//
//   1. UNION nodes try each alternative in order (first success wins, the
//      last failure is reported).
//   2. ENUM nodes require the value to be one of the declared symbols.
//   3. Everything else dispatches on the runtime shape of the value: arrays,
//      objects, and scalars each have their own handler, which then looks at
//      the declared kind.
//
// Inside a record, a column missing from the input becomes `null` and input
// keys the schema does not declare are dropped. A top-level node that is not
// a record is handled exactly as the single column of a synthetic record
// would be: `transform_value` is that per-column step.
//
// Nothing here mutates the input. Output records are assembled in a
// `RecordBuilder` that only becomes a value once every column converted, so
// an error never leaves a half-built record behind.

use std::fmt;

use serde_json::{Map, Value};
use tracing::trace;

use crate::model::node::{DataType, SchemaNode, TypeKind};
use crate::suggest::closest_match;

type Result<T> = std::result::Result<T, TransformError>;

/// A value tree that conformed to the schema it was transformed against.
///
/// Only the transformer constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedValue(Value);

impl NormalizedValue {
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Why a value was rejected, and where.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TransformError {
    /// Column names and element indices from the innermost outwards.
    path: Vec<String>,
    reason: Reason,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Reason {
    TypeMismatch { value: Value, expected: TypeKind },
    FixedLengthMismatch { expected: i64, actual: usize },
    InvalidSymbol { value: Value, allowed: Vec<String> },
}

impl TransformError {
    fn new(reason: Reason) -> Self {
        TransformError {
            path: Vec::new(),
            reason,
        }
    }

    fn type_mismatch(value: &Value, expected: TypeKind) -> Self {
        TransformError::new(Reason::TypeMismatch {
            value: value.clone(),
            expected,
        })
    }

    fn within(mut self, segment: impl Into<String>) -> Self {
        self.path.push(segment.into());
        self
    }

    /// Dotted location of the failure, e.g. `orders[2].status`.
    pub(crate) fn location(&self) -> String {
        let mut location = String::new();
        for segment in self.path.iter().rev() {
            if !location.is_empty() && !segment.starts_with('[') {
                location.push('.');
            }
            location.push_str(segment);
        }
        location
    }

    /// A "did you mean" hint for symbols one typo away from a declared one.
    pub(crate) fn help(&self) -> Option<String> {
        let Reason::InvalidSymbol {
            value: Value::String(value),
            allowed,
        } = &self.reason
        else {
            return None;
        };
        closest_match(value, allowed.iter().map(String::as_str))
            .map(|symbol| format!("did you mean `{symbol}`?"))
    }

    #[cfg(test)]
    pub(crate) fn reason(&self) -> &Reason {
        &self.reason
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::TypeMismatch { value, expected } => {
                write!(f, "type mismatch for {value} of type {expected}")
            }
            Reason::FixedLengthMismatch { expected, actual } => write!(
                f,
                "fixed value has length {actual}, expected exactly {expected}"
            ),
            Reason::InvalidSymbol { value, allowed } => write!(
                f,
                "invalid symbol {value}, allowed values: [{}]",
                allowed.join(", ")
            ),
        }
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "at `{}`: {}", self.location(), self.reason)
        }
    }
}

/// Transform a record-shaped value against the top-level column list.
pub(crate) fn transform_columns(
    record: &Map<String, Value>,
    columns: &[SchemaNode],
) -> Result<NormalizedValue> {
    transform_record(record, columns).map(NormalizedValue)
}

// ==============================================================================
// Dispatch
// ==============================================================================

fn transform_value(value: &Value, node: &SchemaNode) -> Result<Value> {
    match &node.data_type {
        DataType::Union { alternatives } => resolve_union(value, alternatives),
        DataType::Enum { symbols, .. } => resolve_enum(value, symbols),
        _ => match value {
            Value::Array(elements) => transform_array(elements, value, node),
            Value::Object(entries) => transform_object(entries, node),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                transform_scalar(value, node)
            }
        },
    }
}

/// Try the alternatives in declaration order. The first one that accepts the
/// value wins; if none does, the last rejection is the result.
fn resolve_union(value: &Value, alternatives: &[SchemaNode; 2]) -> Result<Value> {
    let [first, rest @ ..] = alternatives;
    rest.iter()
        .fold(transform_value(value, first), |attempt, alternative| {
            attempt.or_else(|rejected| {
                trace!(%rejected, next = %alternative.kind(), "union alternative rejected");
                transform_value(value, alternative)
            })
        })
}

fn resolve_enum(value: &Value, symbols: &[String]) -> Result<Value> {
    match value {
        Value::String(symbol) if symbols.contains(symbol) => Ok(value.clone()),
        _ => Err(TransformError::new(Reason::InvalidSymbol {
            value: value.clone(),
            allowed: symbols.to_vec(),
        })),
    }
}

// ==============================================================================
// Shape Handlers
// ==============================================================================

fn transform_array(elements: &[Value], value: &Value, node: &SchemaNode) -> Result<Value> {
    let DataType::Array { items } = &node.data_type else {
        return Err(TransformError::type_mismatch(value, node.kind()));
    };
    // Arrays of primitives pass through without per-element checks.
    if items.kind().is_primitive() {
        return Ok(value.clone());
    }
    // Every element is checked against the one shared item schema.
    elements
        .iter()
        .enumerate()
        .map(|(i, element)| {
            transform_value(element, items).map_err(|e| e.within(format!("[{i}]")))
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

fn transform_object(entries: &Map<String, Value>, node: &SchemaNode) -> Result<Value> {
    match &node.data_type {
        DataType::Map { values } if values.kind().is_primitive() => {
            Ok(Value::Object(entries.clone()))
        }
        DataType::Map { values } => entries
            .iter()
            .map(|(key, entry)| {
                transform_value(entry, values)
                    .map(|converted| (key.clone(), converted))
                    .map_err(|e| e.within(key.as_str()))
            })
            .collect::<Result<Map<_, _>>>()
            .map(Value::Object),
        DataType::Record { fields, .. } => transform_record(entries, fields),
        _ => Ok(Value::Null),
    }
}

fn transform_record(entries: &Map<String, Value>, fields: &[SchemaNode]) -> Result<Value> {
    let mut record = RecordBuilder::with_capacity(fields.len());
    for field in fields {
        let converted = match entries.get(&field.column_name) {
            None => Value::Null,
            Some(value) => {
                transform_value(value, field).map_err(|e| e.within(field.column_name.as_str()))?
            }
        };
        record.push(&field.column_name, converted);
    }
    Ok(record.finish())
}

fn transform_scalar(value: &Value, node: &SchemaNode) -> Result<Value> {
    match (&node.data_type, value) {
        (DataType::Null, Value::Null) => Ok(Value::Null),
        (DataType::Null, _) | (_, Value::Null) => {
            Err(TransformError::type_mismatch(value, node.kind()))
        }
        (DataType::Fixed { size, .. }, _) => {
            let actual = textual_length(value);
            if i64::try_from(actual).is_ok_and(|len| len == *size) {
                Ok(value.clone())
            } else {
                Err(TransformError::new(Reason::FixedLengthMismatch {
                    expected: *size,
                    actual,
                }))
            }
        }
        (DataType::Array { .. } | DataType::Map { .. } | DataType::Record { .. }, _) => {
            Err(TransformError::type_mismatch(value, node.kind()))
        }
        // No numeric coercion or range checking.
        _ => Ok(value.clone()),
    }
}

/// Character count of a string, or of the JSON text of any other scalar.
fn textual_length(value: &Value) -> usize {
    match value {
        Value::String(s) => s.chars().count(),
        other => other.to_string().chars().count(),
    }
}

/// Accumulates converted columns; the record exists as a value only after
/// `finish`.
struct RecordBuilder {
    columns: Map<String, Value>,
}

impl RecordBuilder {
    fn with_capacity(capacity: usize) -> Self {
        RecordBuilder {
            columns: Map::with_capacity(capacity),
        }
    }

    fn push(&mut self, column: &str, value: Value) {
        self.columns.insert(column.to_string(), value);
    }

    fn finish(self) -> Value {
        Value::Object(self.columns)
    }
}
