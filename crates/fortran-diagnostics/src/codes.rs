// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Diagnostic code registry.
//!
//! Maps codes (E0001, E0200, W0301, ...) to titles and categories.

use std::collections::HashMap;

/// Registry of all known codes.
pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

/// Information about a single code.
pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

/// Category for grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Resolution,
    Type,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax"),
            ErrorCategory::Resolution => write!(f, "Resolution"),
            ErrorCategory::Type => write!(f, "Type"),
        }
    }
}

macro_rules! register_codes {
    ($($code:literal => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                // Lexical errors (E00xx)
                "E0001" => ("unexpected character", Syntax),
                "E0002" => ("unterminated character literal", Syntax),

                // Parser errors (E01xx)
                "E0100" => ("expected token not found", Syntax),
                "E0101" => ("missing end statement", Syntax),
                "E0102" => ("mismatched end statement", Syntax),
                "E0103" => ("misplaced statement", Syntax),
                "E0104" => ("chained comparison", Syntax),
                "E0105" => ("unsupported construct", Syntax),
                "E0106" => ("unrecognised statement", Syntax),
                "E0107" => ("nesting too deep", Syntax),

                // Resolver errors (E02xx)
                "E0200" => ("undefined name", Resolution),
                "E0201" => ("duplicate declaration", Resolution),
                "E0202" => ("unknown module", Resolution),
                "E0203" => ("entity not exported", Resolution),
                "E0204" => ("no implicit type", Resolution),
                "E0205" => ("undefined construct name", Resolution),
                "E0206" => ("undefined label", Resolution),
                "E0207" => ("duplicate label", Resolution),
                "W0208" => ("undeclared procedure", Resolution),

                // Type warnings (W03xx)
                "W0301" => ("mismatched types", Type),
                "W0302" => ("malformed binary expression", Type),
                "W0303" => ("malformed unary expression", Type),
                "W0304" => ("array constructor element", Type),
                "W0305" => ("non-integer implied do bound", Type),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }

    pub fn all(&self) -> impl Iterator<Item = &ErrorCodeInfo> {
        self.codes.values()
    }
}
