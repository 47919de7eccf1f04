// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! JSON diagnostic output for machine consumption.
//!
//! Each diagnostic carries its source context, 1-based line/column
//! locations and any replacement suggestion. The CLI emits this with
//! `--format json`.

use fortran_syntax::{LineMap, Span};
use serde::Serialize;

use crate::{codes::ErrorCodeRegistry, Diagnostic, LabelStyle, Severity};

/// A complete JSON diagnostic report for one file.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    /// Schema version for forward compatibility.
    pub version: u32,
    /// The file that was analysed.
    pub file: String,
    /// No error-severity diagnostics.
    pub success: bool,
    /// The command that produced these diagnostics.
    pub phase: String,
    pub diagnostics: Vec<JsonDiagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
}

/// A single diagnostic in JSON form, enriched with source context.
#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Category of the code ("Syntax", "Resolution", "Type").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
    /// Primary source location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    pub labels: Vec<JsonLabel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<JsonSuggestion>,
}

/// A source location with line/column (1-based).
#[derive(Debug, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
    /// The source line text for context.
    pub source_line: String,
}

/// A labeled span in JSON form.
#[derive(Debug, Serialize)]
pub struct JsonLabel {
    pub style: LabelStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub start: LineCol,
    pub end: LineCol,
}

/// Line/column pair (1-based).
#[derive(Debug, Serialize)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
    pub byte_offset: usize,
}

/// A concrete code replacement suggestion.
#[derive(Debug, Serialize)]
pub struct JsonSuggestion {
    pub span: Span,
    pub replacement: String,
    /// The full line after applying the fix.
    pub result_line: String,
}

/// Convert diagnostics to a structured JSON report.
pub fn to_json_report(diagnostics: &[Diagnostic], source: &str, file: &str, phase: &str) -> DiagnosticReport {
    let registry = ErrorCodeRegistry::default();
    let lines = SourceLines {
        source,
        map: LineMap::new(source),
    };

    let json_diags: Vec<JsonDiagnostic> = diagnostics
        .iter()
        .map(|d| to_json_diagnostic(d, &lines, &registry))
        .collect();
    let error_count = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warning_count = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();

    DiagnosticReport {
        version: 1,
        file: file.to_string(),
        success: error_count == 0,
        phase: phase.to_string(),
        diagnostics: json_diags,
        error_count,
        warning_count,
    }
}

/// Serialize a diagnostic report to pretty JSON.
pub fn to_json_string(report: &DiagnosticReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

struct SourceLines<'a> {
    source: &'a str,
    map: LineMap,
}

impl SourceLines<'_> {
    fn line_col(&self, offset: usize) -> LineCol {
        let (line, column) = self.map.offset_to_line_col(offset);
        LineCol {
            line: line as usize,
            column: column as usize,
            byte_offset: offset,
        }
    }

    fn text(&self, line: usize) -> &str {
        self.map.line_text(self.source, line as u32).unwrap_or("")
    }
}

fn to_json_diagnostic(diag: &Diagnostic, lines: &SourceLines<'_>, registry: &ErrorCodeRegistry) -> JsonDiagnostic {
    let code = diag.code.as_ref().map(|c| c.0.clone());
    let category = code
        .as_ref()
        .and_then(|c| registry.get(c))
        .map(|info| info.category.to_string());

    let location = diag.primary_span().map(|span| {
        let at = lines.line_col(span.start);
        SourceLocation {
            source_line: lines.text(at.line).to_string(),
            line: at.line,
            column: at.column,
            byte_offset: at.byte_offset,
        }
    });

    let labels = diag
        .labels
        .iter()
        .map(|l| JsonLabel {
            style: l.style,
            message: l.message.clone(),
            start: lines.line_col(l.span.start),
            end: lines.line_col(l.span.end),
        })
        .collect();

    let suggestion = diag.help.as_ref().and_then(|h| h.suggestion.as_ref()).map(|s| {
        let at = lines.line_col(s.span.start);
        let original_line = lines.text(at.line);
        let prefix_end = (at.column - 1).min(original_line.len());
        let suffix_start = (prefix_end + s.span.len()).min(original_line.len());
        let result_line = format!(
            "{}{}{}",
            original_line.get(..prefix_end).unwrap_or(""),
            s.replacement,
            original_line.get(suffix_start..).unwrap_or("")
        );
        JsonSuggestion {
            span: s.span,
            replacement: s.replacement.clone(),
            result_line,
        }
    });

    JsonDiagnostic {
        severity: diag.severity,
        code,
        category,
        message: diag.message.clone(),
        location,
        labels,
        notes: diag.notes.clone(),
        help: diag.help.as_ref().map(|h| h.message.clone()),
        suggestion,
    }
}
