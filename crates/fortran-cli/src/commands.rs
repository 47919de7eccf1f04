// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Subcommand implementations.
//!
//! Every command returns `Ok(true)` when the file is free of errors and
//! `Ok(false)` when it reported some. Tool failures are `Err`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fortran_analysis::{analyze, AnalysisOptions};
use fortran_diagnostics::formatter::DiagnosticFormatter;
use fortran_diagnostics::json::{to_json_report, to_json_string};
use fortran_diagnostics::{Diagnostic, Severity, ToDiagnostic};
use fortran_lexer::{tokenize, LexOptions};
use fortran_resolve::ResolvedProgram;
use fortran_syntax::{to_sexpr, SexprOptions, SourceForm, TokenKind};
use log::{debug, info};

use crate::output;
use crate::Format;

/// Options shared by every command.
pub struct Settings {
    pub form: Option<SourceForm>,
    pub fixed_line_length: usize,
    pub format: Format,
}

impl Settings {
    /// The `--form` flag wins, then the file extension, then free form.
    fn lex_options(&self, path: &Path) -> LexOptions {
        let form = self
            .form
            .or_else(|| SourceForm::from_path(path))
            .unwrap_or_default();
        debug!("{}: {} form", path.display(), form);
        LexOptions {
            form,
            fixed_line_length: self.fixed_line_length,
        }
    }

    fn analysis_options(&self, path: &Path, check_types: bool) -> AnalysisOptions {
        AnalysisOptions {
            lex: self.lex_options(path),
            check_types,
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    let source = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    info!("read {} ({} bytes)", path.display(), source.len());
    Ok(source)
}

pub fn lex(path: &Path, settings: &Settings, trivia: bool) -> Result<bool> {
    let source = read_source(path)?;
    let mut clean = true;
    for token in tokenize(&source, settings.lex_options(path)) {
        if token.kind == TokenKind::Unknown {
            clean = false;
        }
        if token.kind.is_trivia() && !trivia {
            continue;
        }
        println!("{}:{} {} {:?}", token.line, token.col, token.kind.display_name(), token.text.as_str());
    }
    Ok(clean)
}

pub fn parse(path: &Path, settings: &Settings, trivia: bool, spans: bool) -> Result<bool> {
    let source = read_source(path)?;
    let parsed = fortran_parser::parse(tokenize(&source, settings.lex_options(path)));
    let diagnostics: Vec<Diagnostic> = parsed.errors.iter().map(|e| e.to_diagnostic()).collect();
    if settings.format == Format::Human {
        print!("{}", to_sexpr(&parsed.tree, SexprOptions { trivia, spans }));
    }
    show_diagnostics(&diagnostics, &source, path, "Parse", settings.format)
}

pub fn resolve(path: &Path, settings: &Settings) -> Result<bool> {
    let source = read_source(path)?;
    let analysis = analyze(&source, &settings.analysis_options(path, false))
        .context("analysis was cancelled")?;
    if settings.format == Format::Human {
        print!("{}", dump_scopes(analysis.resolved()));
    }
    show_diagnostics(analysis.diagnostics(), &source, path, "Resolve", settings.format)
}

pub fn check(path: &Path, settings: &Settings) -> Result<bool> {
    let source = read_source(path)?;
    let analysis = analyze(&source, &settings.analysis_options(path, true))
        .context("analysis was cancelled")?;
    show_diagnostics(analysis.diagnostics(), &source, path, "Check", settings.format)
}

/// Scopes in creation order, each with its bindings sorted by name.
fn dump_scopes(resolved: &ResolvedProgram) -> String {
    let mut out = String::new();
    for scope in resolved.scopes.iter() {
        let parent = scope.parent.map_or_else(|| "-".to_string(), |p| p.0.to_string());
        out.push_str(&format!("scope {} {:?} (parent {})\n", scope.id.0, scope.kind, parent));
        let mut bindings: Vec<_> = scope.bindings.iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        for (_, id) in bindings {
            let Some(symbol) = resolved.symbol(*id) else {
                continue;
            };
            out.push_str(&format!("  {} {}", symbol.kind.describe(), symbol.name));
            if let Some(ty) = &symbol.ty {
                out.push_str(&format!(": {}", ty));
            }
            if let Some(dims) = &symbol.dims {
                let dims: Vec<String> = dims
                    .iter()
                    .map(|d| d.map_or_else(|| ":".to_string(), |n| n.to_string()))
                    .collect();
                out.push_str(&format!("({})", dims.join(", ")));
            }
            if symbol.implicit {
                out.push_str(" [implicit]");
            }
            out.push_str(&format!(" @{}..{}\n", symbol.span.start, symbol.span.end));
        }
    }
    out
}

/// Print diagnostics in the requested format. Human output ends with a
/// banner on stderr; JSON mode prints only the report.
fn show_diagnostics(diagnostics: &[Diagnostic], source: &str, path: &Path, phase: &str, format: Format) -> Result<bool> {
    let file = path.display().to_string();
    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    let warnings = diagnostics.iter().filter(|d| d.severity == Severity::Warning).count();

    match format {
        Format::Json => {
            let report = to_json_report(diagnostics, source, &file, phase);
            println!("{}", to_json_string(&report).context("serializing diagnostics")?);
        }
        Format::Human => {
            if !diagnostics.is_empty() {
                let formatter = DiagnosticFormatter::new(source).with_file_name(&file);
                print!("{}", formatter.format_all(diagnostics));
            }
            let banner = if errors > 0 {
                output::banner_fail(phase, errors, warnings)
            } else if warnings > 0 {
                output::banner_warn(phase, warnings)
            } else {
                output::banner_ok(phase)
            };
            eprintln!("{} {}", output::file_path(&file), banner);
        }
    }
    Ok(errors == 0)
}
