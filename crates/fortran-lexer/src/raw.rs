// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Raw logos scanner for one line of statement text.
//!
//! Line structure (comment lines, continuation markers, the fixed-form
//! column fields) is handled by [`crate::Lexer`]; this module only turns a
//! slice of statement text into classified pieces.

use fortran_syntax::TokenKind;
use logos::Logos;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DotWord {
    Logical,
    Operator,
}

/// Raw token type for logos. Nothing is skipped: whitespace and comments
/// become trivia tokens.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum RawToken {
    #[regex(r"[ \t\r\x0c]+")]
    Whitespace,

    #[regex(r"![^\n]*")]
    Comment,

    #[regex(r"[A-Za-z][A-Za-z0-9_$]*")]
    Name,

    // Digits with an optional kind parameter, and BOZ constants.
    #[regex(r"[0-9]+(_[A-Za-z0-9_]+)?")]
    #[regex(r"[BbOoZz]'[0-9A-Fa-f]+'")]
    #[regex(r#"[BbOoZz]"[0-9A-Fa-f]+""#)]
    Int,

    #[regex(r"[0-9]+\.[0-9]*([EeDdQq][+-]?[0-9]+)?(_[A-Za-z0-9_]+)?")]
    #[regex(r"\.[0-9]+([EeDdQq][+-]?[0-9]+)?(_[A-Za-z0-9_]+)?")]
    #[regex(r"[0-9]+[EeDdQq][+-]?[0-9]+(_[A-Za-z0-9_]+)?")]
    Real,

    // A doubled delimiter stands for itself inside the literal.
    #[regex(r"'([^']|'')*'")]
    #[regex(r#""([^"]|"")*""#)]
    String,

    // No closing delimiter on this line.
    #[regex(r"'[^']*")]
    #[regex(r#""[^"]*"#)]
    UnterminatedString,

    #[regex(r"\.[A-Za-z]+\.", dot_word)]
    Dot(DotWord),

    #[token("**")]
    Power,
    #[token("//")]
    Concat,
    #[token("==")]
    EqEq,
    #[token("/=")]
    SlashEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("=>")]
    Arrow,
    #[token("::")]
    ColonColon,
    #[token("(/")]
    LArrayParen,
    #[token("/)")]
    RArrayParen,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("%")]
    Percent,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token("&")]
    Amp,
}

/// `.true.` and `.false.` may carry a `_kind` suffix, which is folded into
/// the literal.
fn dot_word(lex: &mut logos::Lexer<RawToken>) -> DotWord {
    let slice = lex.slice();
    let word = &slice[1..slice.len() - 1];
    if !(word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false")) {
        return DotWord::Operator;
    }
    let rest = lex.remainder().as_bytes();
    if rest.first() == Some(&b'_') {
        let suffix = rest[1..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count();
        if suffix > 0 {
            lex.bump(suffix + 1);
        }
    }
    DotWord::Logical
}

fn convert(raw: RawToken) -> TokenKind {
    match raw {
        RawToken::Whitespace => TokenKind::Whitespace,
        RawToken::Comment => TokenKind::Comment,
        RawToken::Name => TokenKind::Name,
        RawToken::Int => TokenKind::IntLiteral,
        RawToken::Real => TokenKind::RealLiteral,
        RawToken::String => TokenKind::StringLiteral,
        RawToken::UnterminatedString => TokenKind::Unknown,
        RawToken::Dot(DotWord::Logical) => TokenKind::LogicalLiteral,
        RawToken::Dot(DotWord::Operator) => TokenKind::DotOperator,
        RawToken::Power => TokenKind::Power,
        RawToken::Concat => TokenKind::Concat,
        RawToken::EqEq => TokenKind::EqEq,
        RawToken::SlashEq => TokenKind::SlashEq,
        RawToken::LtEq => TokenKind::LtEq,
        RawToken::GtEq => TokenKind::GtEq,
        RawToken::Arrow => TokenKind::Arrow,
        RawToken::ColonColon => TokenKind::ColonColon,
        RawToken::LArrayParen => TokenKind::LArrayParen,
        RawToken::RArrayParen => TokenKind::RArrayParen,
        RawToken::Plus => TokenKind::Plus,
        RawToken::Minus => TokenKind::Minus,
        RawToken::Star => TokenKind::Star,
        RawToken::Slash => TokenKind::Slash,
        RawToken::Eq => TokenKind::Eq,
        RawToken::Lt => TokenKind::Lt,
        RawToken::Gt => TokenKind::Gt,
        RawToken::Percent => TokenKind::Percent,
        RawToken::LParen => TokenKind::LParen,
        RawToken::RParen => TokenKind::RParen,
        RawToken::LBracket => TokenKind::LBracket,
        RawToken::RBracket => TokenKind::RBracket,
        RawToken::Comma => TokenKind::Comma,
        RawToken::Colon => TokenKind::Colon,
        RawToken::Semi => TokenKind::Semi,
        // Free-form line handling decides what an ampersand means.
        RawToken::Amp => TokenKind::Continuation,
    }
}

/// A classified piece of a line: kind and absolute byte range.
pub(crate) type Piece = (TokenKind, usize, usize);

/// Scan `source[start..end]` into pieces that tile the range exactly.
pub(crate) fn scan(source: &str, start: usize, end: usize) -> Vec<Piece> {
    let text = &source[start..end];
    let mut pieces = Vec::new();
    let mut base = 0;
    let mut lex = RawToken::lexer(text);

    while let Some(result) = lex.next() {
        let span = lex.span();
        let (s, e) = (base + span.start, base + span.end);
        match result {
            // `1.eq.2`: the dot belongs to the operator, not the number.
            Ok(RawToken::Real) if text[s..e].ends_with('.') && starts_with_dot_word(&text[e - 1..]) => {
                pieces.push((TokenKind::IntLiteral, start + s, start + e - 1));
                base = e - 1;
                lex = RawToken::lexer(&text[base..]);
            }
            Ok(raw) => pieces.push((convert(raw), start + s, start + e)),
            Err(()) => {
                let width = text[s..].chars().next().map_or(1, char::len_utf8);
                pieces.push((TokenKind::Unknown, start + s, start + s + width));
                if s + width != e {
                    base = s + width;
                    lex = RawToken::lexer(&text[base..]);
                }
            }
        }
    }
    pieces
}

/// `.word.` at the start of `s`.
fn starts_with_dot_word(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('.') else {
        return false;
    };
    let letters = rest.bytes().take_while(u8::is_ascii_alphabetic).count();
    letters > 0 && rest.as_bytes().get(letters) == Some(&b'.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, &str)> {
        scan(text, 0, text.len())
            .into_iter()
            .map(|(k, s, e)| (k, &text[s..e]))
            .collect()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 2.5 .5e3 1d0 3_8 1.0_dp"),
            vec![
                (TokenKind::IntLiteral, "1"),
                (TokenKind::Whitespace, " "),
                (TokenKind::RealLiteral, "2.5"),
                (TokenKind::Whitespace, " "),
                (TokenKind::RealLiteral, ".5e3"),
                (TokenKind::Whitespace, " "),
                (TokenKind::RealLiteral, "1d0"),
                (TokenKind::Whitespace, " "),
                (TokenKind::IntLiteral, "3_8"),
                (TokenKind::Whitespace, " "),
                (TokenKind::RealLiteral, "1.0_dp"),
            ]
        );
    }

    #[test]
    fn digit_dot_letter_splits_before_operator() {
        assert_eq!(
            kinds("1.eq.2"),
            vec![
                (TokenKind::IntLiteral, "1"),
                (TokenKind::DotOperator, ".eq."),
                (TokenKind::IntLiteral, "2"),
            ]
        );
        assert_eq!(kinds("1."), vec![(TokenKind::RealLiteral, "1.")]);
    }

    #[test]
    fn logical_literals_take_kind_suffix() {
        assert_eq!(
            kinds(".TRUE._lk .and. .false."),
            vec![
                (TokenKind::LogicalLiteral, ".TRUE._lk"),
                (TokenKind::Whitespace, " "),
                (TokenKind::DotOperator, ".and."),
                (TokenKind::Whitespace, " "),
                (TokenKind::LogicalLiteral, ".false."),
            ]
        );
    }

    #[test]
    fn strings_with_doubled_quotes() {
        assert_eq!(kinds("'it''s'"), vec![(TokenKind::StringLiteral, "'it''s'")]);
        assert_eq!(kinds(r#""say ""hi""""#), vec![(TokenKind::StringLiteral, r#""say ""hi""""#)]);
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert_eq!(
            kinds("x = 'abc, d"),
            vec![
                (TokenKind::Name, "x"),
                (TokenKind::Whitespace, " "),
                (TokenKind::Eq, "="),
                (TokenKind::Whitespace, " "),
                (TokenKind::Unknown, "'abc, d"),
            ]
        );
    }

    #[test]
    fn operators_prefer_longest() {
        let got: Vec<_> = kinds("a**b//c/=d=>e::(/1/)").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            got,
            vec![
                TokenKind::Name,
                TokenKind::Power,
                TokenKind::Name,
                TokenKind::Concat,
                TokenKind::Name,
                TokenKind::SlashEq,
                TokenKind::Name,
                TokenKind::Arrow,
                TokenKind::Name,
                TokenKind::ColonColon,
                TokenKind::LArrayParen,
                TokenKind::IntLiteral,
                TokenKind::RArrayParen,
            ]
        );
    }

    #[test]
    fn unknown_characters_keep_coverage() {
        let text = "a @ é b";
        let pieces = scan(text, 0, text.len());
        let mut at = 0;
        for (_, s, e) in &pieces {
            assert_eq!(*s, at);
            at = *e;
        }
        assert_eq!(at, text.len());
        assert!(pieces.iter().any(|(k, s, e)| *k == TokenKind::Unknown && &text[*s..*e] == "@"));
        assert!(pieces.iter().any(|(k, s, e)| *k == TokenKind::Unknown && &text[*s..*e] == "é"));
    }
}
