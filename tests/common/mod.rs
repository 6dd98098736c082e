// ==============================================================================
// Shared Test Helpers
// ==============================================================================
//
// Each test file that imports this module compiles its own copy, so not every
// function is used in every binary. Suppress the resulting dead_code warnings.
#![allow(dead_code)]
// Import this module in each test file with:
//
//     mod common;
//     use common::{fixture, render_diagnostic};

use std::path::PathBuf;

use miette::{GraphicalReportHandler, GraphicalTheme};

pub const FIXTURE_DIR: &str = "tests/fixtures";

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(FIXTURE_DIR).join(name)
}

/// Read a fixture file to a string, panicking with the path on failure.
pub fn read_fixture(name: &str) -> String {
    let path = fixture(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
}

/// Render a single diagnostic to a deterministic string. Uses the plain
/// theme (no color, no Unicode) at 80 columns.
pub fn render_diagnostic(diagnostic: &dyn miette::Diagnostic) -> String {
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none()).with_width(80);
    let mut buf = String::new();
    handler
        .render_report(&mut buf, diagnostic)
        .expect("render to String is infallible");
    buf
}
