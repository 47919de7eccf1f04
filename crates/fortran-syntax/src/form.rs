// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source form selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The two Fortran source layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceForm {
    /// Column-significant layout: comment and continuation columns, a
    /// five-column label field and a statement field ending at a fixed
    /// line length.
    Fixed,
    /// `!` comments and `&` continuations anywhere on the line.
    #[default]
    Free,
}

impl SourceForm {
    /// Conventional form for a file extension. Only a default for tools
    /// that read files; the core never guesses.
    pub fn from_path(path: &Path) -> Option<SourceForm> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "f" | "for" | "f77" | "ftn" | "fpp" => Some(SourceForm::Fixed),
            "f90" | "f95" | "f03" | "f08" | "f18" => Some(SourceForm::Free),
            _ => None,
        }
    }
}

impl fmt::Display for SourceForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceForm::Fixed => write!(f, "fixed"),
            SourceForm::Free => write!(f, "free"),
        }
    }
}

impl FromStr for SourceForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(SourceForm::Fixed),
            "free" => Ok(SourceForm::Free),
            other => Err(format!("unknown source form `{}` (expected `fixed` or `free`)", other)),
        }
    }
}
