// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Fortran front-end CLI.
//!
//! ```bash
//! fortran parse solver.f90
//! fortran check legacy.f --form fixed --format json
//! ```
//!
//! Exit codes: 0 when no error was reported, 1 when the file has errors,
//! 2 when the tool itself failed (unreadable file, bad arguments).

mod commands;
mod logger;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fortran_syntax::SourceForm;
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "fortran", version, about = "Lex, parse, resolve and check Fortran sources")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Source form (fixed, free). Guessed from the file extension when
    /// omitted.
    #[arg(long, global = true)]
    form: Option<SourceForm>,

    /// Width of the fixed form statement field
    #[arg(long, global = true, default_value_t = fortran_lexer::DEFAULT_FIXED_LINE_LENGTH)]
    fixed_line_length: usize,

    /// Diagnostic output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, env = "FORTRAN_LOG", default_value_t = LevelFilter::Warn)]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream
    Lex {
        file: PathBuf,
        /// Include whitespace, comments and continuations
        #[arg(long)]
        trivia: bool,
    },
    /// Print the syntax tree and the syntax errors
    Parse {
        file: PathBuf,
        /// Include whitespace, comments and continuations
        #[arg(long)]
        trivia: bool,
        /// Append byte ranges to every node
        #[arg(long)]
        spans: bool,
    },
    /// Print scopes, symbols and name bindings
    Resolve { file: PathBuf },
    /// Report every diagnostic, type warnings included
    Check { file: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Human,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    output::init();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{}: {:#}", output::error_label(), err);
            ExitCode::from(2)
        }
    }
}

/// Run a command. `Ok(false)` means the file has errors.
fn run(cli: Cli) -> Result<bool> {
    logger::init(cli.log_level).context("installing the logger")?;
    let settings = commands::Settings {
        form: cli.form,
        fixed_line_length: cli.fixed_line_length,
        format: cli.format,
    };
    match cli.command {
        Command::Lex { file, trivia } => commands::lex(&file, &settings, trivia),
        Command::Parse { file, trivia, spans } => commands::parse(&file, &settings, trivia, spans),
        Command::Resolve { file } => commands::resolve(&file, &settings),
        Command::Check { file } => commands::check(&file, &settings),
    }
}
