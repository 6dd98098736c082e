// ==============================================================================
// CLI for the JSON to Avro Converter
// ==============================================================================
//
// Two subcommands, one per half of the library:
//   - `json2avro schema  <SCHEMA> [OUTPUT]`          -- compile to .avsc JSON
//   - `json2avro convert <SCHEMA> [INPUT] [OUTPUT]`  -- normalize NDJSON records

use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use miette::{Context, IntoDiagnostic};
use tracing::info;
use tracing_subscriber::EnvFilter;

use json2avro::{ConvertedSchema, JsonConverter};

const USAGE: &str = "\
Usage:
  json2avro schema  [--table NAME] [--namespace NS] <SCHEMA> [OUTPUT]
  json2avro convert [--table NAME] [--namespace NS] [--no-unpack] <SCHEMA> [INPUT] [OUTPUT]

INPUT and OUTPUT default to stdin and stdout; `-` means the same.
`--table` defaults to the schema file name without its extension.
Set JSON2AVRO_LOG (e.g. `debug`) to see what the converter is doing.";

// ==============================================================================
// Argument Parsing
// ==============================================================================

#[derive(Debug, PartialEq)]
enum Command {
    Schema {
        options: Options,
        schema: PathBuf,
        output: Option<String>,
    },
    Convert {
        options: Options,
        schema: PathBuf,
        input: Option<String>,
        output: Option<String>,
    },
    Help,
}

#[derive(Debug, PartialEq)]
struct Options {
    table: Option<String>,
    namespace: Option<String>,
    unpack: bool,
}

fn parse_args(mut parser: lexopt::Parser) -> Result<Command, lexopt::Error> {
    use lexopt::prelude::*;

    let subcommand = match parser.next()? {
        Some(Short('h') | Long("help")) | None => return Ok(Command::Help),
        Some(Value(value)) => value.string()?,
        Some(arg) => return Err(arg.unexpected()),
    };
    if subcommand != "schema" && subcommand != "convert" {
        return Err(format!("unknown subcommand `{subcommand}`").into());
    }

    let mut options = Options {
        table: None,
        namespace: None,
        unpack: true,
    };
    let mut positional = Vec::new();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => return Ok(Command::Help),
            Long("table") => options.table = Some(parser.value()?.string()?),
            Long("namespace") => options.namespace = Some(parser.value()?.string()?),
            Long("no-unpack") if subcommand == "convert" => options.unpack = false,
            Value(value) => positional.push(value.string()?),
            _ => return Err(arg.unexpected()),
        }
    }

    let mut positional = positional.into_iter();
    let schema = positional
        .next()
        .map(PathBuf::from)
        .ok_or("missing <SCHEMA> argument")?;
    let command = if subcommand == "schema" {
        Command::Schema {
            options,
            schema,
            output: positional.next(),
        }
    } else {
        Command::Convert {
            options,
            schema,
            input: positional.next(),
            output: positional.next(),
        }
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument `{extra}`").into());
    }
    Ok(command)
}

// ==============================================================================
// Entry Point
// ==============================================================================

fn main() -> miette::Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(miette::MietteHandlerOpts::new().build())
    }))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("JSON2AVRO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let command = parse_args(lexopt::Parser::from_env())
        .map_err(|e| miette::miette!(help = USAGE, "{e}"))?;

    match command {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Schema {
            options,
            schema,
            output,
        } => run_schema(&options, &schema, output.as_deref()),
        Command::Convert {
            options,
            schema,
            input,
            output,
        } => run_convert(&options, &schema, input.as_deref(), output.as_deref()),
    }
}

fn run_schema(options: &Options, schema_path: &Path, output: Option<&str>) -> miette::Result<()> {
    let schema = load_schema(options, schema_path)?;
    let text = schema
        .to_string_pretty()
        .into_diagnostic()
        .wrap_err("serialize schema")?;
    let mut out = open_output(output)?;
    writeln!(out, "{text}")
        .and_then(|()| out.flush())
        .into_diagnostic()
        .wrap_err("write schema")
}

fn run_convert(
    options: &Options,
    schema_path: &Path,
    input: Option<&str>,
    output: Option<&str>,
) -> miette::Result<()> {
    let schema = load_schema(options, schema_path)?;
    let converter = converter_for(options, schema_path);
    let reader = open_input(input)?;
    let mut out = open_output(output)?;

    let mut converted = 0usize;
    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line
            .into_diagnostic()
            .wrap_err_with(|| format!("read line {line_number}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = converter
            .convert_record(&schema, &line)
            .map_err(miette::Report::new)
            .wrap_err_with(|| format!("record on line {line_number}"))?;
        writeln!(out, "{record}")
            .into_diagnostic()
            .wrap_err("write record")?;
        converted += 1;
    }
    out.flush().into_diagnostic().wrap_err("write records")?;
    info!(records = converted, "conversion finished");
    Ok(())
}

// ==============================================================================
// Helpers
// ==============================================================================

fn converter_for(options: &Options, schema_path: &Path) -> JsonConverter {
    let mut converter = JsonConverter::new();
    let table = options.table.clone().or_else(|| {
        schema_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::to_string)
    });
    if let Some(table) = table {
        converter.table(table);
    }
    if let Some(namespace) = &options.namespace {
        converter.namespace(namespace.clone());
    }
    converter.unpack(options.unpack);
    converter
}

fn load_schema(options: &Options, schema_path: &Path) -> miette::Result<ConvertedSchema> {
    let source = fs::read_to_string(schema_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("read {}", schema_path.display()))?;
    converter_for(options, schema_path)
        .convert_schema_named(&source, &schema_path.display().to_string())
        .map_err(miette::Report::new)
}

fn open_input(input: Option<&str>) -> miette::Result<Box<dyn BufRead>> {
    match input {
        None | Some("-") => Ok(Box::new(io::stdin().lock())),
        Some(path) => {
            let file = fs::File::open(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("open {path}"))?;
            Ok(Box::new(BufReader::new(file)))
        }
    }
}

fn open_output(output: Option<&str>) -> miette::Result<Box<dyn Write>> {
    match output {
        None | Some("-") => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
        Some(path) => {
            let file = fs::File::create(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("create {path}"))?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}
