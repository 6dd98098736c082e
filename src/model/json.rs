// ==============================================================================
// JSON Serialization for Compiled Avro Schemas
// ==============================================================================
//
// This module renders an `OutputSchema` as Avro schema JSON (`.avsc`). Key
// rules:
//
// - Named types (record, enum, fixed) are serialized inline on FIRST
//   occurrence, then as bare string names afterward. Avro rejects a second
//   inline definition of the same full name.
// - Every non-union node is an object carrying `source.type`, the declared
//   type it was compiled from. Primitives are therefore never bare strings.
// - Unions serialize as JSON arrays of their two branches.
// - JSON object key order is fixed: `type`, `name`, `namespace`, `doc`, then
//   the kind-specific payload, then `source.type`.

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use super::schema::{OutputField, OutputSchema, make_full_name};

/// Property key carrying the declared type of a node.
pub const SOURCE_TYPE_KEY: &str = "source.type";

/// Serialize a compiled schema with no enclosing namespace and no previously
/// emitted named types.
pub fn output_schema_to_json(schema: &OutputSchema) -> Value {
    schema_to_json(schema, &mut IndexSet::new(), None)
}

/// Serialize an `OutputSchema` to JSON. For named types, the first occurrence
/// is serialized inline; subsequent occurrences are bare name strings.
pub fn schema_to_json(
    schema: &OutputSchema,
    known_names: &mut IndexSet<String>,
    enclosing_namespace: Option<&str>,
) -> Value {
    match schema {
        OutputSchema::Primitive { kind, source_type } => {
            let mut obj = IndexMap::new();
            obj.insert("type".to_string(), Value::String(kind.as_str().to_string()));
            obj.insert(
                SOURCE_TYPE_KEY.to_string(),
                Value::String(source_type.as_str().to_string()),
            );
            indexmap_to_value(obj)
        }

        // =====================================================================
        // Record: key order is type, name, namespace (if different), doc,
        // fields, then source.type.
        // =====================================================================
        OutputSchema::Record {
            name,
            namespace,
            doc,
            fields,
            source_type,
        } => {
            if let Some(reference) =
                known_reference(name, namespace.as_deref(), known_names, enclosing_namespace)
            {
                return reference;
            }

            let mut obj = named_header("record", name, namespace.as_deref(), enclosing_namespace);
            obj.insert("doc".to_string(), Value::String(doc.clone()));
            let fields_json: Vec<Value> = fields
                .iter()
                .map(|f| {
                    field_to_json(
                        f,
                        known_names,
                        namespace.as_deref().or(enclosing_namespace),
                    )
                })
                .collect();
            obj.insert("fields".to_string(), Value::Array(fields_json));
            obj.insert(
                SOURCE_TYPE_KEY.to_string(),
                Value::String(source_type.as_str().to_string()),
            );
            indexmap_to_value(obj)
        }

        // =====================================================================
        // Enum: key order is type, name, namespace (if different), doc,
        // symbols, then source.type.
        // =====================================================================
        OutputSchema::Enum {
            name,
            namespace,
            doc,
            symbols,
            source_type,
        } => {
            if let Some(reference) =
                known_reference(name, namespace.as_deref(), known_names, enclosing_namespace)
            {
                return reference;
            }

            let mut obj = named_header("enum", name, namespace.as_deref(), enclosing_namespace);
            obj.insert("doc".to_string(), Value::String(doc.clone()));
            let symbols_json: Vec<Value> =
                symbols.iter().map(|s| Value::String(s.clone())).collect();
            obj.insert("symbols".to_string(), Value::Array(symbols_json));
            obj.insert(
                SOURCE_TYPE_KEY.to_string(),
                Value::String(source_type.as_str().to_string()),
            );
            indexmap_to_value(obj)
        }

        // =====================================================================
        // Fixed: key order is type, name, namespace (if different), size,
        // then source.type.
        // =====================================================================
        OutputSchema::Fixed {
            name,
            namespace,
            size,
            source_type,
        } => {
            if let Some(reference) =
                known_reference(name, namespace.as_deref(), known_names, enclosing_namespace)
            {
                return reference;
            }

            let mut obj = named_header("fixed", name, namespace.as_deref(), enclosing_namespace);
            obj.insert("size".to_string(), Value::Number((*size).into()));
            obj.insert(
                SOURCE_TYPE_KEY.to_string(),
                Value::String(source_type.as_str().to_string()),
            );
            indexmap_to_value(obj)
        }

        OutputSchema::Array { items, source_type } => {
            let mut obj = IndexMap::new();
            obj.insert("type".to_string(), Value::String("array".to_string()));
            obj.insert(
                "items".to_string(),
                schema_to_json(items, known_names, enclosing_namespace),
            );
            obj.insert(
                SOURCE_TYPE_KEY.to_string(),
                Value::String(source_type.as_str().to_string()),
            );
            indexmap_to_value(obj)
        }

        OutputSchema::Map {
            values,
            source_type,
        } => {
            let mut obj = IndexMap::new();
            obj.insert("type".to_string(), Value::String("map".to_string()));
            obj.insert(
                "values".to_string(),
                schema_to_json(values, known_names, enclosing_namespace),
            );
            obj.insert(
                SOURCE_TYPE_KEY.to_string(),
                Value::String(source_type.as_str().to_string()),
            );
            indexmap_to_value(obj)
        }

        OutputSchema::Union { branches } => Value::Array(
            branches
                .iter()
                .map(|b| schema_to_json(b, known_names, enclosing_namespace))
                .collect(),
        ),
    }
}

// =============================================================================
// Helper: serialize a record field to JSON.
// Key order: name, type, doc, source.type.
// =============================================================================

fn field_to_json(
    field: &OutputField,
    known_names: &mut IndexSet<String>,
    enclosing_namespace: Option<&str>,
) -> Value {
    let mut obj = IndexMap::new();
    obj.insert("name".to_string(), Value::String(field.name.clone()));
    obj.insert(
        "type".to_string(),
        schema_to_json(&field.schema, known_names, enclosing_namespace),
    );
    obj.insert("doc".to_string(), Value::String(field.doc.clone()));
    obj.insert(
        SOURCE_TYPE_KEY.to_string(),
        Value::String(field.source_type.as_str().to_string()),
    );
    indexmap_to_value(obj)
}

/// Record a named type as emitted, or return the bare-name reference if it
/// already was.
fn known_reference(
    name: &str,
    namespace: Option<&str>,
    known_names: &mut IndexSet<String>,
    enclosing_namespace: Option<&str>,
) -> Option<Value> {
    let full_name = make_full_name(name, namespace).into_owned();
    if known_names.contains(&full_name) {
        return Some(Value::String(schema_ref_name(
            name,
            namespace,
            enclosing_namespace,
        )));
    }
    known_names.insert(full_name);
    None
}

/// Start a named type object with its `type` and `name`, plus `namespace`
/// when it differs from the enclosing context.
fn named_header(
    type_name: &str,
    name: &str,
    namespace: Option<&str>,
    enclosing_namespace: Option<&str>,
) -> IndexMap<String, Value> {
    let mut obj = IndexMap::new();
    obj.insert("type".to_string(), Value::String(type_name.to_string()));
    obj.insert("name".to_string(), Value::String(name.to_string()));
    let namespace = non_empty(namespace);
    if namespace != non_empty(enclosing_namespace) {
        // An explicit "" resets to the null namespace inside a named one.
        obj.insert(
            "namespace".to_string(),
            Value::String(namespace.unwrap_or_default().to_string()),
        );
    }
    obj
}

/// `Some("")` and `None` both mean the null namespace.
fn non_empty(namespace: Option<&str>) -> Option<&str> {
    namespace.filter(|ns| !ns.is_empty())
}

/// When referencing a named type, use just the simple name if it shares the same
/// namespace as the enclosing context; otherwise use the fully qualified name.
fn schema_ref_name(name: &str, namespace: Option<&str>, enclosing_namespace: Option<&str>) -> String {
    if non_empty(namespace) == non_empty(enclosing_namespace) {
        name.to_string()
    } else {
        make_full_name(name, namespace).into_owned()
    }
}

/// Convert an `IndexMap` to a `serde_json::Value::Object`, preserving insertion order.
fn indexmap_to_value(map: IndexMap<String, Value>) -> Value {
    let json_map: Map<String, Value> = map.into_iter().collect();
    Value::Object(json_map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::TypeKind;
    use crate::model::schema::PrimitiveType;
    use serde_json::json;

    fn prim(kind: PrimitiveType, source_type: TypeKind) -> OutputSchema {
        OutputSchema::Primitive { kind, source_type }
    }

    fn choice_enum(namespace: Option<&str>) -> OutputSchema {
        OutputSchema::Enum {
            name: "choice".to_string(),
            namespace: namespace.map(str::to_string),
            doc: String::new(),
            symbols: vec!["YES".to_string(), "NO".to_string()],
            source_type: TypeKind::Enum,
        }
    }

    #[test]
    fn primitives_carry_source_type() {
        assert_eq!(
            output_schema_to_json(&prim(PrimitiveType::Int, TypeKind::Int)),
            json!({"type": "int", "source.type": "int"})
        );
    }

    #[test]
    fn record_serializes_with_correct_key_order() {
        let schema = OutputSchema::Record {
            name: "dummy_table".to_string(),
            namespace: Some("namespace".to_string()),
            doc: String::new(),
            fields: vec![OutputField {
                name: "c".to_string(),
                schema: prim(PrimitiveType::String, TypeKind::String),
                doc: String::new(),
                source_type: TypeKind::String,
            }],
            source_type: TypeKind::Record,
        };

        let rendered = serde_json::to_string(&output_schema_to_json(&schema)).unwrap();
        assert_eq!(
            rendered,
            r#"{"type":"record","name":"dummy_table","namespace":"namespace","doc":"","fields":[{"name":"c","type":{"type":"string","source.type":"string"},"doc":"","source.type":"string"}],"source.type":"record"}"#
        );
    }

    #[test]
    fn enum_omits_namespace_when_same_as_enclosing() {
        let result = schema_to_json(&choice_enum(Some("org.foo")), &mut IndexSet::new(), Some("org.foo"));
        assert!(result.get("namespace").is_none());

        let result = schema_to_json(&choice_enum(Some("org.bar")), &mut IndexSet::new(), Some("org.foo"));
        assert_eq!(result["namespace"], json!("org.bar"));
    }

    #[test]
    fn empty_namespace_inside_named_one_is_kept() {
        let result = schema_to_json(&choice_enum(Some("")), &mut IndexSet::new(), Some("org.x"));
        assert_eq!(result["namespace"], json!(""));

        let result = schema_to_json(&choice_enum(Some("")), &mut IndexSet::new(), None);
        assert!(result.get("namespace").is_none());

        let result = schema_to_json(&choice_enum(None), &mut IndexSet::new(), Some(""));
        assert!(result.get("namespace").is_none());
    }

    #[test]
    fn repeated_named_type_becomes_reference() {
        let mut known = IndexSet::new();
        let first = schema_to_json(&choice_enum(Some("org.foo")), &mut known, None);
        assert!(first.is_object());
        let second = schema_to_json(&choice_enum(Some("org.foo")), &mut known, None);
        assert_eq!(second, json!("org.foo.choice"));
        let third = schema_to_json(&choice_enum(Some("org.foo")), &mut known, Some("org.foo"));
        assert_eq!(third, json!("choice"));
    }

    #[test]
    fn union_serializes_as_array() {
        let schema = OutputSchema::Union {
            branches: Box::new([
                prim(PrimitiveType::String, TypeKind::String),
                prim(PrimitiveType::Null, TypeKind::Null),
            ]),
        };
        assert_eq!(
            output_schema_to_json(&schema),
            json!([
                {"type": "string", "source.type": "string"},
                {"type": "null", "source.type": "null"}
            ])
        );
    }

    #[test]
    fn fixed_serializes_size() {
        let schema = OutputSchema::Fixed {
            name: "md5".to_string(),
            namespace: None,
            size: 16,
            source_type: TypeKind::Fixed,
        };
        assert_eq!(
            output_schema_to_json(&schema),
            json!({"type": "fixed", "name": "md5", "size": 16, "source.type": "fixed"})
        );
    }
}
