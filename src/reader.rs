// ==============================================================================
// Schema Reader: Column-Descriptor JSON -> SchemaNode Tree
// ==============================================================================
//
// The declarative schema is a JSON array of column descriptors:
//
//     [
//       {"columnName": "id", "dataType": {"type": "long"}},
//       {"columnName": "tags", "dataType": {"type": "array", "items": "string"},
//        "isNullable": true, "comment": "free-form labels"}
//     ]
//
// Nested types (`items` of an array, `values` of a map, union alternatives)
// are written either as a bare primitive type name, as `{"dataType": {...}}`,
// or as a bare `{"type": ...}` object. Records nest a descriptor array under
// `values`. Unions are spelled as a two-element `type` array.
//
// The reader checks shape only: every key a payload needs is present and of
// the right JSON type. Semantic checks (empty symbol lists, fixed sizes, Avro
// naming rules) belong to the compiler.

use miette::NamedSource;
use serde_json::{Map, Value};

use crate::error::{SchemaConversionError, json_error_span};
use crate::model::node::{DataType, SchemaNode, TypeKind};
use crate::suggest::closest_match;

type Result<T> = std::result::Result<T, SchemaConversionError>;

/// Parse JSON with C-style comment stripping (`//` and `/* */`).
///
/// Schemas are often kept as hand-edited files next to job configuration, so
/// comments are accepted.
fn parse_json_with_comments(input: &str) -> std::result::Result<Value, serde_json::Error> {
    serde_json::from_reader(
        json_comments::CommentSettings::c_style().strip_comments(input.as_bytes()),
    )
}

/// Parse schema text into its top-level column nodes, in declaration order.
///
/// `source_name` labels the text in diagnostics (a file path or `"<input>"`).
pub fn parse_schema(source: &str, source_name: &str) -> Result<Vec<SchemaNode>> {
    let json = parse_json_with_comments(source).map_err(|e| {
        // Comment stripping replaces comments with whitespace, so positions
        // in the stripped text are valid positions in the original.
        let span = json_error_span(source, &e);
        SchemaConversionError::new("", format!("invalid schema JSON: {e}"))
            .with_source(NamedSource::new(source_name, source.to_string()), span)
    })?;
    schema_from_json(&json)
}

/// Read top-level column nodes from an already-parsed JSON document. A single
/// descriptor object is treated as a one-column schema.
pub fn schema_from_json(json: &Value) -> Result<Vec<SchemaNode>> {
    match json {
        Value::Array(descriptors) => parse_fields(descriptors, ""),
        Value::Object(_) => Ok(vec![parse_field(json, "", 0)?]),
        other => Err(SchemaConversionError::new(
            "",
            format!(
                "schema must be a JSON array of column descriptors, found {}",
                json_kind(other)
            ),
        )),
    }
}

fn parse_fields(descriptors: &[Value], parent_path: &str) -> Result<Vec<SchemaNode>> {
    descriptors
        .iter()
        .enumerate()
        .map(|(i, d)| parse_field(d, parent_path, i))
        .collect()
}

// ==============================================================================
// Column Descriptors
// ==============================================================================

fn parse_field(json: &Value, parent_path: &str, index: usize) -> Result<SchemaNode> {
    let positional = join_path(parent_path, &format!("[{index}]"));
    let obj = json.as_object().ok_or_else(|| {
        SchemaConversionError::new(
            &positional,
            format!("column descriptor must be an object, found {}", json_kind(json)),
        )
    })?;

    let column_name = match obj.get("columnName") {
        Some(Value::String(name)) => name.clone(),
        Some(other) => {
            return Err(SchemaConversionError::new(
                &positional,
                format!("`columnName` must be a string, found {}", json_kind(other)),
            ));
        }
        None => {
            return Err(SchemaConversionError::new(
                &positional,
                "column descriptor missing `columnName`",
            ));
        }
    };
    let path = join_path(parent_path, &column_name);

    let data_type = match obj.get("dataType") {
        Some(Value::Object(data_type)) => parse_data_type(data_type, &column_name, &path)?,
        Some(other) => {
            return Err(SchemaConversionError::new(
                &path,
                format!("`dataType` must be an object, found {}", json_kind(other)),
            ));
        }
        None => {
            return Err(SchemaConversionError::new(
                &path,
                "column descriptor missing `dataType`",
            ));
        }
    };

    let nullable = match obj.get("isNullable") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(SchemaConversionError::new(
                &path,
                format!("`isNullable` must be a boolean, found {}", json_kind(other)),
            ));
        }
    };

    let mut node = SchemaNode {
        column_name,
        doc: optional_str(obj, "comment", &path)?,
        data_type,
    };
    if nullable {
        node.data_type = make_nullable(&node, &path)?;
    }
    Ok(node)
}

/// Desugar `"isNullable": true` into a union with `null` as the second
/// alternative, so the declared type is tried first.
fn make_nullable(node: &SchemaNode, path: &str) -> Result<DataType> {
    match &node.data_type {
        DataType::Null => Ok(DataType::Null),
        DataType::Union { alternatives } => {
            if alternatives.iter().any(|a| a.kind() == TypeKind::Null) {
                Ok(node.data_type.clone())
            } else {
                Err(SchemaConversionError::new(
                    path,
                    "`isNullable` cannot be combined with a union of two non-null types",
                ))
            }
        }
        concrete => Ok(DataType::Union {
            alternatives: Box::new([
                SchemaNode::new(node.column_name.clone(), concrete.clone()),
                SchemaNode::new(node.column_name.clone(), DataType::Null),
            ]),
        }),
    }
}

// ==============================================================================
// Data Types
// ==============================================================================

fn parse_data_type(obj: &Map<String, Value>, column: &str, path: &str) -> Result<DataType> {
    match obj.get("type") {
        Some(Value::String(type_name)) => {
            let kind = lookup_kind(type_name, path)?;
            match kind {
                TypeKind::Array => Ok(DataType::Array {
                    items: Box::new(parse_child(obj, "items", "array", column, path)?),
                }),
                TypeKind::Map => Ok(DataType::Map {
                    values: Box::new(parse_child(obj, "values", "map", column, path)?),
                }),
                TypeKind::Record => parse_record(obj, path),
                TypeKind::Enum => parse_enum(obj, path),
                TypeKind::Fixed => parse_fixed(obj, path),
                primitive => DataType::primitive(primitive).ok_or_else(|| {
                    SchemaConversionError::new(path, format!("unsupported type `{primitive}`"))
                }),
            }
        }
        Some(Value::Array(alternatives)) => parse_union(alternatives, column, path),
        Some(other) => Err(SchemaConversionError::new(
            path,
            format!(
                "`type` must be a type name or a two-element union array, found {}",
                json_kind(other)
            ),
        )),
        None => Err(SchemaConversionError::new(path, "`dataType` missing `type`")),
    }
}

fn lookup_kind(type_name: &str, path: &str) -> Result<TypeKind> {
    TypeKind::from_declared(type_name).ok_or_else(|| {
        let err = SchemaConversionError::new(path, format!("unknown type `{type_name}`"));
        match closest_match(type_name, TypeKind::DECLARABLE.iter().map(|k| k.as_str())) {
            Some(suggestion) => err.with_help(format!("did you mean `{suggestion}`?")),
            None => err,
        }
    })
}

/// Parse the nested type stored under `key` (array `items`, map `values`).
fn parse_child(
    obj: &Map<String, Value>,
    key: &str,
    owner: &str,
    column: &str,
    path: &str,
) -> Result<SchemaNode> {
    let value = obj.get(key).ok_or_else(|| {
        SchemaConversionError::new(path, format!("{owner} `dataType` missing `{key}`"))
    })?;
    nested_type(value, &format!("{owner} `{key}`"), column, path)
}

/// Interpret one nested type reference: a primitive name, a `{"dataType":
/// {...}}` wrapper, or a bare `{"type": ...}` object. The node inherits the
/// declaring column's name.
fn nested_type(value: &Value, what: &str, column: &str, path: &str) -> Result<SchemaNode> {
    let data_type = match value {
        Value::String(type_name) => {
            let kind = lookup_kind(type_name, path)?;
            DataType::primitive(kind).ok_or_else(|| {
                SchemaConversionError::new(
                    path,
                    format!(
                        "{what} names type `{kind}`, which needs a `dataType` object \
                         rather than a bare type name"
                    ),
                )
            })?
        }
        Value::Object(obj) => match obj.get("dataType") {
            Some(Value::Object(inner)) => parse_data_type(inner, column, path)?,
            Some(other) => {
                return Err(SchemaConversionError::new(
                    path,
                    format!(
                        "{what} `dataType` must be an object, found {}",
                        json_kind(other)
                    ),
                ));
            }
            None if obj.contains_key("type") => parse_data_type(obj, column, path)?,
            None => {
                return Err(SchemaConversionError::new(
                    path,
                    format!("{what} object needs a `dataType` or `type` key"),
                ));
            }
        },
        Value::Null => {
            return Err(SchemaConversionError::new(
                path,
                format!("{what} must not be null"),
            ));
        }
        other => {
            return Err(SchemaConversionError::new(
                path,
                format!(
                    "{what} must be a type name or a `dataType` object, found {}",
                    json_kind(other)
                ),
            ));
        }
    };
    Ok(SchemaNode::new(column, data_type))
}

fn parse_union(alternatives: &[Value], column: &str, path: &str) -> Result<DataType> {
    let [first, second] = alternatives else {
        return Err(SchemaConversionError::new(
            path,
            format!(
                "a union must have exactly two alternatives, found {}",
                alternatives.len()
            ),
        ));
    };
    Ok(DataType::Union {
        alternatives: Box::new([
            nested_type(first, "first union alternative", column, path)?,
            nested_type(second, "second union alternative", column, path)?,
        ]),
    })
}

fn parse_record(obj: &Map<String, Value>, path: &str) -> Result<DataType> {
    let fields = match obj.get("values") {
        Some(Value::Array(descriptors)) => parse_fields(descriptors, path)?,
        Some(other) => {
            return Err(SchemaConversionError::new(
                path,
                format!(
                    "record `values` must be an array of column descriptors, found {}",
                    json_kind(other)
                ),
            ));
        }
        None => {
            return Err(SchemaConversionError::new(
                path,
                "record `dataType` missing `values`",
            ));
        }
    };
    Ok(DataType::Record {
        name: optional_str(obj, "name", path)?,
        namespace: optional_str(obj, "namespace", path)?,
        fields,
    })
}

/// Enums take `name`, `namespace`, and `symbols` from the data type itself,
/// falling back to a nested `dataType` object, which older schemas use.
fn parse_enum(obj: &Map<String, Value>, path: &str) -> Result<DataType> {
    let nested = obj.get("dataType").and_then(Value::as_object);
    let lookup = |key: &str| obj.get(key).or_else(|| nested.and_then(|n| n.get(key)));

    let symbols = match lookup("symbols") {
        Some(Value::Array(symbols)) => symbols
            .iter()
            .map(|s| {
                s.as_str().map(str::to_string).ok_or_else(|| {
                    SchemaConversionError::new(
                        path,
                        format!("enum symbols must be strings, found {}", json_kind(s)),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Some(other) => {
            return Err(SchemaConversionError::new(
                path,
                format!("enum `symbols` must be an array, found {}", json_kind(other)),
            ));
        }
        None => {
            return Err(SchemaConversionError::new(
                path,
                "enum `dataType` missing `symbols`",
            ));
        }
    };

    let name = match lookup("name") {
        Some(value) => Some(expect_str(value, "name", path)?),
        None => None,
    };
    let namespace = match lookup("namespace") {
        Some(value) => Some(expect_str(value, "namespace", path)?),
        None => None,
    };
    Ok(DataType::Enum {
        name,
        namespace,
        symbols,
    })
}

fn parse_fixed(obj: &Map<String, Value>, path: &str) -> Result<DataType> {
    let size = match obj.get("size") {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            SchemaConversionError::new(path, format!("fixed `size` must be an integer, found {n}"))
        })?,
        Some(other) => {
            return Err(SchemaConversionError::new(
                path,
                format!("fixed `size` must be an integer, found {}", json_kind(other)),
            ));
        }
        None => {
            return Err(SchemaConversionError::new(
                path,
                "fixed `dataType` missing `size`",
            ));
        }
    };
    Ok(DataType::Fixed {
        name: optional_str(obj, "name", path)?,
        namespace: optional_str(obj, "namespace", path)?,
        size,
    })
}

// ==============================================================================
// Helpers
// ==============================================================================

fn optional_str(obj: &Map<String, Value>, key: &str, path: &str) -> Result<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => expect_str(value, key, path).map(Some),
    }
}

fn expect_str(value: &Value, key: &str, path: &str) -> Result<String> {
    value.as_str().map(str::to_string).ok_or_else(|| {
        SchemaConversionError::new(
            path,
            format!("`{key}` must be a string, found {}", json_kind(value)),
        )
    })
}

pub(crate) fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.starts_with('[') {
        format!("{parent}{child}")
    } else {
        format!("{parent}.{child}")
    }
}

/// Human-readable JSON kind for error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_one(descriptor: Value) -> SchemaNode {
        let mut nodes = schema_from_json(&descriptor).expect("descriptor should parse");
        assert_eq!(nodes.len(), 1);
        nodes.remove(0)
    }

    fn read_err(descriptor: Value) -> SchemaConversionError {
        schema_from_json(&descriptor).expect_err("descriptor should be rejected")
    }

    #[test]
    fn reads_array_of_ints() {
        let node = read_one(json!({"columnName": "b", "dataType": {"type": "array", "items": "int"}}));
        assert_eq!(node.column_name, "b");
        let DataType::Array { items } = &node.data_type else {
            panic!("expected array, got {:?}", node.data_type);
        };
        assert_eq!(items.data_type, DataType::Int);
        assert_eq!(items.column_name, "b");
    }

    #[test]
    fn reads_array_of_maps_via_data_type_wrapper() {
        let node = read_one(json!({
            "columnName": "b",
            "dataType": {"type": "array", "items": {"dataType": {"type": "map", "values": "string"}}}
        }));
        let DataType::Array { items } = &node.data_type else {
            panic!("expected array");
        };
        let DataType::Map { values } = &items.data_type else {
            panic!("expected map items");
        };
        assert_eq!(values.data_type, DataType::String);
    }

    #[test]
    fn reads_nested_record_in_order() {
        let node = read_one(json!({
            "columnName": "persons",
            "dataType": {"type": "record", "namespace": "org.foo", "values": [
                {"columnName": "name", "dataType": {"type": "string"}},
                {"columnName": "age", "dataType": {"type": "int"}}
            ]}
        }));
        let DataType::Record { name, namespace, fields } = &node.data_type else {
            panic!("expected record");
        };
        assert_eq!(name, &None);
        assert_eq!(namespace.as_deref(), Some("org.foo"));
        let names: Vec<_> = fields.iter().map(|f| f.column_name.as_str()).collect();
        assert_eq!(names, ["name", "age"]);
    }

    #[test]
    fn reads_enum_from_nested_data_type() {
        let node = read_one(json!({
            "columnName": "b",
            "dataType": {"type": "enum", "namespace": "org.foo",
                         "dataType": {"name": "choice", "symbols": ["YES", "NO"]}}
        }));
        assert_eq!(
            node.data_type,
            DataType::Enum {
                name: Some("choice".to_string()),
                namespace: Some("org.foo".to_string()),
                symbols: vec!["YES".to_string(), "NO".to_string()],
            }
        );
    }

    #[test]
    fn reads_union_alternatives_in_order() {
        let node = read_one(json!({
            "columnName": "u",
            "dataType": {"type": [{"dataType": {"type": "array", "items": "int"}}, "null"]}
        }));
        let DataType::Union { alternatives } = &node.data_type else {
            panic!("expected union");
        };
        assert_eq!(alternatives[0].kind(), TypeKind::Array);
        assert_eq!(alternatives[1].kind(), TypeKind::Null);
    }

    #[test]
    fn nullable_column_becomes_union_with_null_last() {
        let node = read_one(json!({
            "columnName": "s", "isNullable": true, "comment": "a note",
            "dataType": {"type": "string"}
        }));
        assert_eq!(node.doc.as_deref(), Some("a note"));
        let DataType::Union { alternatives } = &node.data_type else {
            panic!("expected union");
        };
        assert_eq!(alternatives[0].data_type, DataType::String);
        assert_eq!(alternatives[1].data_type, DataType::Null);
    }

    #[test]
    fn comments_are_allowed() {
        let nodes = parse_schema(
            "[ // the id\n {\"columnName\": \"id\", /* inline */ \"dataType\": {\"type\": \"long\"}} ]",
            "<test>",
        )
        .expect("commented schema should parse");
        assert_eq!(nodes[0].data_type, DataType::Long);
    }

    #[test]
    fn map_values_null_is_rejected() {
        let err = read_err(json!({
            "columnName": "persons",
            "dataType": {"type": "record", "values": [
                {"columnName": "someperson", "dataType": {"type": "map", "values": null}}
            ]}
        }));
        assert_eq!(err.path, "persons.someperson");
        assert_eq!(err.message, "map `values` must not be null");
    }

    #[test]
    fn map_values_array_is_rejected() {
        let err = read_err(json!({
            "columnName": "m",
            "dataType": {"type": "map", "values": ["string"]}
        }));
        assert_eq!(
            err.message,
            "map `values` must be a type name or a `dataType` object, found an array"
        );
    }

    #[test]
    fn unknown_type_suggests_closest() {
        let err = read_err(json!({"columnName": "x", "dataType": {"type": "strng"}}));
        assert_eq!(err.message, "unknown type `strng`");
        assert_eq!(err.help.as_deref(), Some("did you mean `string`?"));
    }

    #[test]
    fn missing_column_name_reports_position() {
        let err = read_err(json!([
            {"columnName": "a", "dataType": {"type": "int"}},
            {"dataType": {"type": "int"}}
        ]));
        assert_eq!(err.path, "[1]");
    }

    #[test]
    fn three_way_union_is_rejected() {
        let err = read_err(json!({"columnName": "u", "dataType": {"type": ["int", "long", "null"]}}));
        assert_eq!(err.message, "a union must have exactly two alternatives, found 3");
    }

    #[test]
    fn bare_complex_type_name_is_rejected() {
        let err = read_err(json!({"columnName": "a", "dataType": {"type": "array", "items": "record"}}));
        assert!(err.message.contains("needs a `dataType` object"), "{err}");
    }

    #[test]
    fn invalid_json_carries_span() {
        let err = parse_schema("[{\"columnName\": }]", "schema.json").unwrap_err();
        assert!(err.message.starts_with("invalid schema JSON"), "{err}");
        let labels: Vec<_> = miette::Diagnostic::labels(&err).expect("labels").collect();
        assert_eq!(labels[0].offset(), 16);
    }
}
