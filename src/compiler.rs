// ==============================================================================
// Schema Compiler: SchemaNode Tree -> Avro OutputSchema
// ==============================================================================
//
// A recursive descent over the declared schema that dispatches on the type
// kind. Primitives map 1:1; arrays, maps, and unions recurse; records, enums,
// and fixed types additionally get a name and namespace synthesized from the
// declaring context:
//
//   - A record without a declared `name` is named after the table when it is
//     the outermost record being compiled, and after its declaring column
//     when it is nested inside another record.
//   - Enums and fixed types without a declared `name` take the declaring
//     column's name.
//   - Namespaces default to the enclosing record's namespace, and at the top
//     to the configured one.
//
// Everything the target format insists on is checked here: non-empty symbol
// lists, positive fixed sizes, unique field names, valid Avro names, and
// at most one definition per full name.

use std::collections::HashSet;

use tracing::debug;

use crate::error::SchemaConversionError;
use crate::model::node::{DataType, SchemaNode, TypeKind};
use crate::model::schema::{OutputField, OutputSchema, PrimitiveType, make_full_name};
use crate::reader::join_path;
use crate::resolve::{NamedTypes, is_valid_avro_name, sanitize_name, validate_schema_name};

type Result<T> = std::result::Result<T, SchemaConversionError>;

/// Context metadata the compiler synthesizes names from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaContext {
    /// Name given to the outermost record. Sanitized into a valid Avro name.
    pub table_name: String,
    pub namespace: Option<String>,
}

impl Default for SchemaContext {
    fn default() -> Self {
        SchemaContext {
            table_name: "Record".to_string(),
            namespace: None,
        }
    }
}

/// Compile the top-level column list into a record named after the table.
pub fn compile_root(fields: &[SchemaNode], context: &SchemaContext) -> Result<OutputSchema> {
    let root = SchemaNode::record("", fields.to_vec());
    compile(&root, context)
}

/// Compile one declared node. Pure and deterministic: the same node and
/// context always produce structurally equal output.
pub fn compile(node: &SchemaNode, context: &SchemaContext) -> Result<OutputSchema> {
    // The outermost record's full name is reserved before its fields are
    // compiled, so nested types cannot claim it.
    let root_name = match &node.data_type {
        DataType::Record {
            name, namespace, ..
        } => {
            let name = name
                .clone()
                .unwrap_or_else(|| sanitize_name(&context.table_name));
            let namespace = namespace.as_deref().or(context.namespace.as_deref());
            Some(make_full_name(&name, namespace).into_owned())
        }
        _ => None,
    };
    let mut compiler = Compiler {
        context,
        root_name,
        named: NamedTypes::new(),
    };
    let scope = Scope {
        path: node.column_name.clone(),
        namespace: context.namespace.clone(),
        inside_record: false,
        branch_suffix: None,
    };
    let schema = compiler.compile_node(node, &scope)?;
    debug!(
        table = %context.table_name,
        named_types = ?compiler.named.names().collect::<Vec<_>>(),
        "compiled schema"
    );
    Ok(schema)
}

/// Where in the declaration tree a node sits.
struct Scope {
    /// Dotted column path, used in error messages.
    path: String,
    /// Namespace inherited by unnamespaced named types.
    namespace: Option<String>,
    /// Whether an enclosing record exists; decides how anonymous records are
    /// named.
    inside_record: bool,
    /// Appended to synthesized names inside a union branch, so that both
    /// alternatives of one column never derive the same name.
    branch_suffix: Option<String>,
}

impl Scope {
    fn for_branch(&self, suffix: Option<String>) -> Scope {
        Scope {
            path: self.path.clone(),
            namespace: self.namespace.clone(),
            inside_record: self.inside_record,
            branch_suffix: suffix.or_else(|| self.branch_suffix.clone()),
        }
    }
}

struct Compiler<'a> {
    context: &'a SchemaContext,
    /// Full name of the outermost record, when compiling one.
    root_name: Option<String>,
    named: NamedTypes,
}

impl Compiler<'_> {
    fn compile_node(&mut self, node: &SchemaNode, scope: &Scope) -> Result<OutputSchema> {
        let source_type = node.kind();
        let schema = match &node.data_type {
            DataType::Array { items } => OutputSchema::Array {
                items: Box::new(self.compile_node(items, scope)?),
                source_type,
            },
            DataType::Map { values } => OutputSchema::Map {
                values: Box::new(self.compile_node(values, scope)?),
                source_type,
            },
            DataType::Record {
                name,
                namespace,
                fields,
            } => self.compile_record(node, name.as_deref(), namespace.as_deref(), fields, scope)?,
            DataType::Enum {
                name,
                namespace,
                symbols,
            } => {
                let (name, namespace) =
                    self.derive_name(node, "enum", name.as_deref(), namespace.as_deref(), scope)?;
                validate_symbols(symbols, &scope.path)?;
                OutputSchema::Enum {
                    name,
                    namespace,
                    doc: String::new(),
                    symbols: symbols.clone(),
                    source_type,
                }
            }
            DataType::Fixed {
                name,
                namespace,
                size,
            } => {
                if *size <= 0 {
                    return Err(SchemaConversionError::new(
                        &scope.path,
                        format!("fixed size must be positive, found {size}"),
                    ));
                }
                let size = u32::try_from(*size).map_err(|_| {
                    SchemaConversionError::new(
                        &scope.path,
                        format!("fixed size {size} exceeds maximum ({})", u32::MAX),
                    )
                })?;
                let (name, namespace) =
                    self.derive_name(node, "fixed", name.as_deref(), namespace.as_deref(), scope)?;
                OutputSchema::Fixed {
                    name,
                    namespace,
                    size,
                    source_type,
                }
            }
            DataType::Union { alternatives } => {
                let [first, second] = &**alternatives;
                let [first_suffix, second_suffix] = branch_suffixes(first, second);
                let branches = [
                    self.compile_node(first, &scope.for_branch(first_suffix))?,
                    self.compile_node(second, &scope.for_branch(second_suffix))?,
                ];
                validate_union(&branches, &scope.path)?;
                OutputSchema::Union {
                    branches: Box::new(branches),
                }
            }
            primitive => {
                let kind = PrimitiveType::from_kind(primitive.kind()).ok_or_else(|| {
                    SchemaConversionError::new(
                        &scope.path,
                        format!("type `{}` has no Avro primitive", primitive.kind()),
                    )
                })?;
                OutputSchema::Primitive { kind, source_type }
            }
        };

        self.named
            .register(&schema)
            .map_err(|msg| SchemaConversionError::new(&scope.path, msg))?;
        Ok(schema)
    }

    fn compile_record(
        &mut self,
        node: &SchemaNode,
        declared_name: Option<&str>,
        declared_namespace: Option<&str>,
        fields: &[SchemaNode],
        scope: &Scope,
    ) -> Result<OutputSchema> {
        let namespace = declared_namespace
            .map(str::to_string)
            .or_else(|| scope.namespace.clone());
        let name = match declared_name {
            Some(name) => name.to_string(),
            None if !scope.inside_record => self.synthesize_name(
                &sanitize_name(&self.context.table_name),
                TypeKind::Record,
                namespace.as_deref(),
                scope,
            ),
            None => self.synthesize_name(
                &node.column_name,
                TypeKind::Record,
                namespace.as_deref(),
                scope,
            ),
        };
        validate_schema_name(&name, namespace.as_deref())
            .map_err(|msg| SchemaConversionError::new(&scope.path, format!("record {msg}")))?;

        if fields.is_empty() {
            return Err(SchemaConversionError::new(
                &scope.path,
                "record must declare at least one column",
            ));
        }

        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(fields.len());
        for field in fields {
            let path = join_path(&scope.path, &field.column_name);
            if !is_valid_avro_name(&field.column_name) {
                return Err(SchemaConversionError::new(
                    &path,
                    format!(
                        "invalid column name `{}` (names must start with a letter or \
                         underscore, followed by letters, digits, or underscores)",
                        field.column_name
                    ),
                ));
            }
            if !seen.insert(field.column_name.as_str()) {
                return Err(SchemaConversionError::new(
                    &path,
                    format!("duplicate column `{}`", field.column_name),
                ));
            }

            let field_scope = Scope {
                path,
                namespace: namespace.clone(),
                inside_record: true,
                branch_suffix: None,
            };
            compiled.push(OutputField {
                name: field.column_name.clone(),
                schema: self.compile_node(field, &field_scope)?,
                doc: field.doc.clone().unwrap_or_default(),
                source_type: field.kind(),
            });
        }

        Ok(OutputSchema::Record {
            name,
            namespace,
            doc: String::new(),
            fields: compiled,
            source_type: TypeKind::Record,
        })
    }

    /// Name an enum or fixed type: the declared name, or else the declaring
    /// column's name.
    fn derive_name(
        &self,
        node: &SchemaNode,
        what: &str,
        declared_name: Option<&str>,
        declared_namespace: Option<&str>,
        scope: &Scope,
    ) -> Result<(String, Option<String>)> {
        let namespace = declared_namespace
            .map(str::to_string)
            .or_else(|| scope.namespace.clone());
        let name = match declared_name {
            Some(name) => name.to_string(),
            None if is_valid_avro_name(&node.column_name) => {
                self.synthesize_name(&node.column_name, node.kind(), namespace.as_deref(), scope)
            }
            None => {
                return Err(SchemaConversionError::new(
                    &scope.path,
                    format!("{what} has no `name` and none can be derived from its column"),
                ));
            }
        };
        validate_schema_name(&name, namespace.as_deref())
            .map_err(|msg| SchemaConversionError::new(&scope.path, format!("{what} {msg}")))?;
        Ok((name, namespace))
    }

    /// Name a type declared without one, starting from `base` (the column or
    /// table name). Inside a union branch the branch suffix is appended. A
    /// nested type whose name would equal the outermost record's gets its
    /// kind appended instead of colliding with it.
    fn synthesize_name(
        &self,
        base: &str,
        kind: TypeKind,
        namespace: Option<&str>,
        scope: &Scope,
    ) -> String {
        let name = match &scope.branch_suffix {
            Some(suffix) => format!("{base}_{suffix}"),
            None => base.to_string(),
        };
        let claims_root = scope.inside_record
            && self.root_name.as_deref() == Some(make_full_name(&name, namespace).as_ref());
        if claims_root {
            format!("{name}_{kind}")
        } else {
            name
        }
    }
}

/// Branch suffixes for a union. Only needed when neither alternative is a
/// primitive, since only then can both derive a name from the same column.
fn branch_suffixes(first: &SchemaNode, second: &SchemaNode) -> [Option<String>; 2] {
    let (first_kind, second_kind) = (first.kind(), second.kind());
    if first_kind.is_primitive() || second_kind.is_primitive() {
        [None, None]
    } else if first_kind == second_kind {
        [Some(format!("{first_kind}1")), Some(format!("{second_kind}2"))]
    } else {
        [Some(first_kind.to_string()), Some(second_kind.to_string())]
    }
}

fn validate_symbols(symbols: &[String], path: &str) -> Result<()> {
    if symbols.is_empty() {
        return Err(SchemaConversionError::new(
            path,
            "enum must declare at least one symbol",
        ));
    }
    let mut seen = HashSet::new();
    for symbol in symbols {
        if !is_valid_avro_name(symbol) {
            return Err(SchemaConversionError::new(
                path,
                format!("invalid enum symbol `{symbol}`"),
            ));
        }
        if !seen.insert(symbol.as_str()) {
            return Err(SchemaConversionError::new(
                path,
                format!("duplicate enum symbol `{symbol}`"),
            ));
        }
    }
    Ok(())
}

/// Avro forbids nested unions and two branches of the same unnamed type.
fn validate_union(branches: &[OutputSchema; 2], path: &str) -> Result<()> {
    if branches
        .iter()
        .any(|b| matches!(b, OutputSchema::Union { .. }))
    {
        return Err(SchemaConversionError::new(
            path,
            "a union alternative cannot itself be a union",
        ));
    }
    let [first, second] = branches;
    if first.avro_type() == second.avro_type() {
        return Err(SchemaConversionError::new(
            path,
            format!(
                "union alternatives must be distinct types, both are `{}`",
                first.avro_type()
            ),
        ));
    }
    Ok(())
}
