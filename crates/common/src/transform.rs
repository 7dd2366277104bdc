//! Script transformation: raw codegen output to a runnable test
//!
//! Two stages run on every accepted change:
//!
//! 1. enhancement, delegated to a [`WaitAnalyzer`] and skipped entirely when
//!    disabled
//! 2. wrapping, which embeds the captured statements in a named test
//!
//! Wrapping is a line scanner, not a parser. Starting in
//! [`ScanState::BeforeBody`], lines that look like imports, declarations or
//! `test`/`browser`/`context` bindings are hoisted above the synthesized test
//! header. The first line that does not match moves the scanner to
//! [`ScanState::InBody`] and every remaining line, setup-looking or not, is
//! indented into the test body.

use std::sync::Arc;

use tracing::debug;

use crate::analyzer::WaitAnalyzer;

/// Substrings that mark code as already declaring a test or suite
const TEST_MARKERS: &[&str] = &["test(", "test.describe(", "describe("];

/// Line prefixes treated as imports or declarations
const SETUP_PREFIXES: &[&str] = &[
    "import ",
    "const ",
    "let ",
    "var ",
    "require(",
    "'use strict'",
    "\"use strict\"",
];

/// Bindings treated as setup wherever they appear on a line
const SETUP_BINDINGS: &[&str] = &["test =", "browser =", "context ="];

const TEST_RUNNER_MODULE: &str = "@playwright/test";
const TEST_IMPORT: &str = "const { test, expect } = require('@playwright/test');";
const TEST_HEADER: &str = "test('recorded session', async ({ page }) => {";
const TEST_FOOTER: &str = "});";
const INDENT: &str = "  ";

/// Output of the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedScript {
    /// Runnable test code
    pub code: String,
    /// Hints from the analyzer; empty when enhancement is disabled
    pub suggestions: Vec<String>,
}

/// Enhance-then-wrap pipeline
#[derive(Clone)]
pub struct ScriptTransformer {
    analyzer: Arc<dyn WaitAnalyzer>,
    enhance: bool,
}

impl ScriptTransformer {
    pub fn new(analyzer: Arc<dyn WaitAnalyzer>, enhance: bool) -> Self {
        Self { analyzer, enhance }
    }

    /// Run both stages on raw captured code
    pub fn transform(&self, raw: &str) -> TransformedScript {
        if !self.enhance {
            return TransformedScript {
                code: wrap(raw),
                suggestions: Vec::new(),
            };
        }

        let suggestions = self.analyzer.suggest_waits(raw);
        let enhanced = self.analyzer.enhance(raw);
        debug!(
            "Enhanced {} -> {} bytes, {} suggestion(s)",
            raw.len(),
            enhanced.len(),
            suggestions.len()
        );

        TransformedScript {
            code: wrap(&enhanced),
            suggestions,
        }
    }
}

/// Whether the code already declares a test or suite
pub fn has_test_marker(code: &str) -> bool {
    TEST_MARKERS.iter().any(|marker| code.contains(marker))
}

/// Whether a line is hoisted while still before the body
pub fn is_setup_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || SETUP_PREFIXES.iter().any(|prefix| trimmed.starts_with(prefix))
        || SETUP_BINDINGS.iter().any(|binding| trimmed.contains(binding))
}

/// Scanner position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    BeforeBody,
    InBody,
}

/// Embed code in a test, unless it already declares one
pub fn wrap(code: &str) -> String {
    if has_test_marker(code) {
        return code.to_string();
    }

    let mut state = ScanState::BeforeBody;
    let mut hoisted: Vec<&str> = Vec::new();
    let mut body: Vec<&str> = Vec::new();

    for line in code.lines() {
        if state == ScanState::BeforeBody && !is_setup_line(line) {
            state = ScanState::InBody;
        }
        match state {
            ScanState::BeforeBody => hoisted.push(line),
            ScanState::InBody => body.push(line),
        }
    }

    trim_trailing_blank(&mut hoisted);
    trim_trailing_blank(&mut body);

    let mut out = String::with_capacity(code.len() + 128);
    if !hoisted.iter().any(|line| line.contains(TEST_RUNNER_MODULE)) {
        out.push_str(TEST_IMPORT);
        out.push('\n');
    }
    for line in &hoisted {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(TEST_HEADER);
    out.push('\n');
    for line in &body {
        if !line.trim().is_empty() {
            out.push_str(INDENT);
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push_str(TEST_FOOTER);
    out.push('\n');
    out
}

fn trim_trailing_blank(lines: &mut Vec<&str>) {
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
}
