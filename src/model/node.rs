// ==============================================================================
// Declared Schema Model
// ==============================================================================
//
// The in-memory form of a column-descriptor schema. A `SchemaNode` is built
// once by the reader and is read-only afterwards; both the compiler and the
// record transformer walk the same tree.

use std::fmt;

/// The closed set of type kinds a column descriptor may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Fixed,
    Array,
    Map,
    Record,
    Enum,
    Union,
}

impl TypeKind {
    /// Every kind that may appear as a `type` string in a descriptor. `union`
    /// is absent because unions are spelled as a two-element array.
    pub const DECLARABLE: [TypeKind; 13] = [
        TypeKind::Null,
        TypeKind::Boolean,
        TypeKind::Int,
        TypeKind::Long,
        TypeKind::Float,
        TypeKind::Double,
        TypeKind::String,
        TypeKind::Bytes,
        TypeKind::Fixed,
        TypeKind::Array,
        TypeKind::Map,
        TypeKind::Record,
        TypeKind::Enum,
    ];

    /// The declared type string, also used as the `source.type` provenance tag.
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Null => "null",
            TypeKind::Boolean => "boolean",
            TypeKind::Int => "int",
            TypeKind::Long => "long",
            TypeKind::Float => "float",
            TypeKind::Double => "double",
            TypeKind::String => "string",
            TypeKind::Bytes => "bytes",
            TypeKind::Fixed => "fixed",
            TypeKind::Array => "array",
            TypeKind::Map => "map",
            TypeKind::Record => "record",
            TypeKind::Enum => "enum",
            TypeKind::Union => "union",
        }
    }

    /// Look up a declarable kind by its type string.
    pub fn from_declared(name: &str) -> Option<TypeKind> {
        Self::DECLARABLE.into_iter().find(|k| k.as_str() == name)
    }

    /// Primitive kinds are leaves that pass through the transformer without
    /// structural work. `fixed` is not one of them: its length is checked.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            TypeKind::Null
                | TypeKind::Boolean
                | TypeKind::Int
                | TypeKind::Long
                | TypeKind::Float
                | TypeKind::Double
                | TypeKind::String
                | TypeKind::Bytes
        )
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared column: its name, optional comment, and type.
///
/// Item and value nodes of arrays and maps, and union alternatives, reuse the
/// column name of the field that declares them.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub column_name: String,
    pub doc: Option<String>,
    pub data_type: DataType,
}

/// The kind-specific payload of a [`SchemaNode`].
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    Fixed {
        name: Option<String>,
        namespace: Option<String>,
        /// Kept signed so that a declared `0` or negative size reaches the
        /// compiler, which owns that check.
        size: i64,
    },
    Array {
        items: Box<SchemaNode>,
    },
    Map {
        values: Box<SchemaNode>,
    },
    Record {
        name: Option<String>,
        namespace: Option<String>,
        fields: Vec<SchemaNode>,
    },
    Enum {
        name: Option<String>,
        namespace: Option<String>,
        symbols: Vec<String>,
    },
    Union {
        alternatives: Box<[SchemaNode; 2]>,
    },
}

impl DataType {
    pub fn kind(&self) -> TypeKind {
        match self {
            DataType::Null => TypeKind::Null,
            DataType::Boolean => TypeKind::Boolean,
            DataType::Int => TypeKind::Int,
            DataType::Long => TypeKind::Long,
            DataType::Float => TypeKind::Float,
            DataType::Double => TypeKind::Double,
            DataType::String => TypeKind::String,
            DataType::Bytes => TypeKind::Bytes,
            DataType::Fixed { .. } => TypeKind::Fixed,
            DataType::Array { .. } => TypeKind::Array,
            DataType::Map { .. } => TypeKind::Map,
            DataType::Record { .. } => TypeKind::Record,
            DataType::Enum { .. } => TypeKind::Enum,
            DataType::Union { .. } => TypeKind::Union,
        }
    }

    /// The payload-free data type for a primitive kind, or `None` for kinds
    /// that need more than a type name.
    pub fn primitive(kind: TypeKind) -> Option<DataType> {
        Some(match kind {
            TypeKind::Null => DataType::Null,
            TypeKind::Boolean => DataType::Boolean,
            TypeKind::Int => DataType::Int,
            TypeKind::Long => DataType::Long,
            TypeKind::Float => DataType::Float,
            TypeKind::Double => DataType::Double,
            TypeKind::String => DataType::String,
            TypeKind::Bytes => DataType::Bytes,
            _ => return None,
        })
    }
}

impl SchemaNode {
    pub fn new(column_name: impl Into<String>, data_type: DataType) -> Self {
        SchemaNode {
            column_name: column_name.into(),
            doc: None,
            data_type,
        }
    }

    pub fn kind(&self) -> TypeKind {
        self.data_type.kind()
    }

    /// Wrap a list of field nodes in an anonymous record, the shape every
    /// top-level conversion operates on.
    pub fn record(column_name: impl Into<String>, fields: Vec<SchemaNode>) -> Self {
        SchemaNode::new(
            column_name,
            DataType::Record {
                name: None,
                namespace: None,
                fields,
            },
        )
    }
}
