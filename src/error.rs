use std::fmt;

use miette::{LabeledSpan, NamedSource, SourceSpan};

/// A malformed schema declaration. Fatal for the schema it came from.
///
/// Carries the dotted path of the offending column (empty when the problem
/// is with the document as a whole), and, for JSON syntax errors, the source
/// location.
#[derive(Debug)]
pub struct SchemaConversionError {
    pub path: String,
    pub message: String,
    pub help: Option<String>,
    source_location: Option<(NamedSource<String>, SourceSpan)>,
}

impl SchemaConversionError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        SchemaConversionError {
            path: path.into(),
            message: message.into(),
            help: None,
            source_location: None,
        }
    }

    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    #[must_use]
    pub(crate) fn with_source(mut self, src: NamedSource<String>, span: SourceSpan) -> Self {
        self.source_location = Some((src, span));
        self
    }
}

impl fmt::Display for SchemaConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "column `{}`: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for SchemaConversionError {}

impl miette::Diagnostic for SchemaConversionError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("json2avro::schema"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_location
            .as_ref()
            .map(|(src, _)| src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (_, span) = self.source_location.as_ref()?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(
            Some(self.message.clone()),
            *span,
        ))))
    }
}

/// A record that could not be reconciled with its schema.
///
/// Raised once per record at the top of the conversion. The nested cause
/// (type mismatch, invalid symbol, fixed length, exhausted union) survives
/// only as the `detail` text.
#[derive(Debug)]
pub struct DataConversionError {
    pub record: String,
    pub schema: String,
    pub detail: String,
    pub help: Option<String>,
}

impl fmt::Display for DataConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unable to convert {} with schema {}: {}",
            self.record, self.schema, self.detail
        )
    }
}

impl std::error::Error for DataConversionError {}

impl miette::Diagnostic for DataConversionError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("json2avro::data"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }
}

/// Translate a `serde_json` line/column position into a byte span for
/// diagnostics. Columns are 1-based; a zero column (EOF errors) points at the
/// start of the line.
pub(crate) fn json_error_span(source: &str, err: &serde_json::Error) -> SourceSpan {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(err.line().saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = (line_start + err.column().saturating_sub(1)).min(source.len());
    let len = usize::from(offset < source.len());
    (offset, len).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_display_includes_path() {
        let err = SchemaConversionError::new("persons.someperson", "map `values` must not be null");
        assert_eq!(
            err.to_string(),
            "column `persons.someperson`: map `values` must not be null"
        );
        let err = SchemaConversionError::new("", "schema must be a JSON array");
        assert_eq!(err.to_string(), "schema must be a JSON array");
    }

    #[test]
    fn json_error_span_points_at_offending_byte() {
        let source = "[\n  {\"columnName\": }\n]";
        let err = serde_json::from_str::<serde_json::Value>(source).unwrap_err();
        let span = json_error_span(source, &err);
        assert_eq!(&source[span.offset()..span.offset() + 1], "}");
    }
}
