use indexmap::IndexMap;

use crate::model::schema::OutputSchema;

// ==============================================================================
// Avro Name Validation
// ==============================================================================
//
// Avro names are `[A-Za-z_][A-Za-z0-9_]*` in the letter of the format, but
// mainstream Avro libraries accept the Unicode-aware `[_\p{L}][_\p{LD}]*`,
// and column names in the wild lean on that. Rust's Unicode-aware `char`
// methods express the same rule.

/// Check whether a single name segment is a valid Avro name.
pub(crate) fn is_valid_avro_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Validate a name and the dot-separated segments of its namespace. Returns
/// an error message describing which part is invalid.
pub(crate) fn validate_schema_name(name: &str, namespace: Option<&str>) -> Result<(), String> {
    if !is_valid_avro_name(name) {
        return Err(format!(
            "invalid Avro name: `{name}` \
             (names must start with a letter or underscore, \
             followed by letters, digits, or underscores)"
        ));
    }
    if let Some(ns) = namespace
        && !ns.is_empty()
    {
        for segment in ns.split('.') {
            if !is_valid_avro_name(segment) {
                return Err(format!(
                    "invalid Avro namespace segment: `{segment}` in `{ns}` \
                     (each segment must start with a letter or underscore, \
                     followed by letters, digits, or underscores)"
                ));
            }
        }
    }
    Ok(())
}

/// Turn a free-form identifier (a table name) into a valid Avro name by
/// replacing every disallowed character with `_`.
pub(crate) fn sanitize_name(raw: &str) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if !name.starts_with(|c: char| c.is_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}

/// Registry of named Avro types emitted while compiling one schema.
///
/// A full name may be produced more than once (the same enum declared in two
/// columns, say) as long as every definition is identical; the serializer
/// then emits the later ones as references. Conflicting definitions are
/// rejected, since Avro resolves names globally.
#[derive(Debug, Default)]
pub struct NamedTypes {
    /// Named schemas indexed by full name (namespace.name), in registration order.
    schemas: IndexMap<String, OutputSchema>,
}

impl NamedTypes {
    pub fn new() -> Self {
        NamedTypes::default()
    }

    /// Register a named schema. Non-named schemas are ignored.
    pub fn register(&mut self, schema: &OutputSchema) -> Result<(), String> {
        let Some(full_name) = schema.full_name() else {
            return Ok(());
        };
        match self.schemas.get(full_name.as_ref()) {
            Some(existing) if existing == schema => Ok(()),
            Some(_) => Err(format!(
                "named type `{full_name}` is defined twice with different shapes; \
                 give one of them an explicit `name`"
            )),
            None => {
                self.schemas.insert(full_name.into_owned(), schema.clone());
                Ok(())
            }
        }
    }

    /// Return all registered full names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|k| k.as_str())
    }
}
