use std::borrow::Cow;

use super::node::TypeKind;

/// The primitive Avro type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

impl PrimitiveType {
    /// Return the Avro type name string for this primitive.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimitiveType::Null => "null",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Bytes => "bytes",
            PrimitiveType::String => "string",
        }
    }

    /// The Avro primitive a declared primitive kind maps onto, 1:1.
    pub fn from_kind(kind: TypeKind) -> Option<PrimitiveType> {
        Some(match kind {
            TypeKind::Null => PrimitiveType::Null,
            TypeKind::Boolean => PrimitiveType::Boolean,
            TypeKind::Int => PrimitiveType::Int,
            TypeKind::Long => PrimitiveType::Long,
            TypeKind::Float => PrimitiveType::Float,
            TypeKind::Double => PrimitiveType::Double,
            TypeKind::Bytes => PrimitiveType::Bytes,
            TypeKind::String => PrimitiveType::String,
            _ => return None,
        })
    }
}

/// A compiled Avro schema.
///
/// Every node except a union remembers the declared type it was compiled
/// from (`source_type`), which is serialized as the `source.type` property.
/// Avro unions are bare JSON arrays with nowhere to put a property, so their
/// provenance lives on the declaring field and on each branch.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSchema {
    Primitive {
        kind: PrimitiveType,
        source_type: TypeKind,
    },

    // =========================================================================
    // Named types
    // =========================================================================
    Record {
        name: String,
        namespace: Option<String>,
        doc: String,
        fields: Vec<OutputField>,
        source_type: TypeKind,
    },
    Enum {
        name: String,
        namespace: Option<String>,
        doc: String,
        symbols: Vec<String>,
        source_type: TypeKind,
    },
    Fixed {
        name: String,
        namespace: Option<String>,
        size: u32,
        source_type: TypeKind,
    },

    // =========================================================================
    // Complex types
    // =========================================================================
    Array {
        items: Box<OutputSchema>,
        source_type: TypeKind,
    },
    Map {
        values: Box<OutputSchema>,
        source_type: TypeKind,
    },
    Union {
        branches: Box<[OutputSchema; 2]>,
    },
}

/// A field in a record schema.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    pub name: String,
    pub schema: OutputSchema,
    /// Always present in the output; empty when the column had no comment.
    pub doc: String,
    pub source_type: TypeKind,
}

/// Join a name with its namespace, borrowing when there is no namespace.
pub fn make_full_name<'a>(name: &'a str, namespace: Option<&str>) -> Cow<'a, str> {
    match namespace {
        Some(ns) if !ns.is_empty() => Cow::Owned(format!("{ns}.{name}")),
        _ => Cow::Borrowed(name),
    }
}

impl OutputSchema {
    /// Returns the full name of a named type (namespace.name), or `None` if not a named type.
    pub fn full_name(&self) -> Option<Cow<'_, str>> {
        match self {
            OutputSchema::Record {
                name, namespace, ..
            }
            | OutputSchema::Enum {
                name, namespace, ..
            }
            | OutputSchema::Fixed {
                name, namespace, ..
            } => Some(make_full_name(name, namespace.as_deref())),
            _ => None,
        }
    }

    /// The declared type this node was compiled from. For unions, which keep
    /// no tag of their own, this is always `union`.
    pub fn source_type(&self) -> TypeKind {
        match self {
            OutputSchema::Primitive { source_type, .. }
            | OutputSchema::Record { source_type, .. }
            | OutputSchema::Enum { source_type, .. }
            | OutputSchema::Fixed { source_type, .. }
            | OutputSchema::Array { source_type, .. }
            | OutputSchema::Map { source_type, .. } => *source_type,
            OutputSchema::Union { .. } => TypeKind::Union,
        }
    }

    /// The Avro type this node serializes as. Two union branches may not
    /// share an unnamed type; named types are told apart by full name.
    pub fn avro_type(&self) -> Cow<'_, str> {
        match self {
            OutputSchema::Primitive { kind, .. } => Cow::Borrowed(kind.as_str()),
            OutputSchema::Array { .. } => Cow::Borrowed("array"),
            OutputSchema::Map { .. } => Cow::Borrowed("map"),
            OutputSchema::Union { .. } => Cow::Borrowed("union"),
            named => named.full_name().unwrap_or(Cow::Borrowed("")),
        }
    }

    /// Returns true if this is a named type (record, enum, or fixed).
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            OutputSchema::Record { .. } | OutputSchema::Enum { .. } | OutputSchema::Fixed { .. }
        )
    }
}
