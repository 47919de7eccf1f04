// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Line-oriented lexer for fixed and free form sources.

use std::collections::VecDeque;

use fortran_syntax::{SourceForm, Span, Token, TokenKind};
use log::debug;

use crate::raw::{scan, Piece};

/// Default statement field width for fixed form.
pub const DEFAULT_FIXED_LINE_LENGTH: usize = 72;

/// Lexer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexOptions {
    pub form: SourceForm,
    /// Fixed form only: columns past this width are comment trivia.
    /// Usually 72, 80 or 132.
    pub fixed_line_length: usize,
}

impl Default for LexOptions {
    fn default() -> Self {
        Self { form: SourceForm::Free, fixed_line_length: DEFAULT_FIXED_LINE_LENGTH }
    }
}

impl LexOptions {
    pub fn new(form: SourceForm) -> Self {
        Self { form, ..Self::default() }
    }
}

/// Tokenize `source`. The returned lexer produces tokens lazily, one source
/// line at a time, and ends with a single [`TokenKind::Eof`].
pub fn tokenize(source: &str, options: LexOptions) -> Lexer<'_> {
    Lexer::new(source, options)
}

/// A restartable token stream over one source text.
///
/// The lexer never fails: input it cannot classify becomes
/// [`TokenKind::Unknown`] and is reported later by the parser. Concatenating
/// the text of every token reproduces the source.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    options: LexOptions,
    /// Start of the next unlexed line.
    pos: usize,
    /// 1-based number of the next unlexed line.
    line: u32,
    pending: VecDeque<Token>,
    /// The statement on the previous code line continues onto the next
    /// code line.
    continuing: bool,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, options: LexOptions) -> Self {
        Self {
            source,
            options,
            pos: 0,
            line: 1,
            pending: VecDeque::new(),
            continuing: false,
            finished: false,
        }
    }

    pub fn options(&self) -> LexOptions {
        self.options
    }

    /// Rewind to the start of the source.
    pub fn restart(&mut self) {
        self.pos = 0;
        self.line = 1;
        self.pending.clear();
        self.continuing = false;
        self.finished = false;
    }

    fn lex_line(&mut self) {
        let start = self.pos;
        let (end, has_newline) = match self.source[start..].find('\n') {
            Some(i) => (start + i, true),
            None => (self.source.len(), false),
        };

        let pieces = match self.options.form {
            SourceForm::Free => self.free_line(start, end),
            SourceForm::Fixed => self.fixed_line(start, end),
        };
        for (kind, s, e) in pieces {
            self.push(kind, s, e, start);
        }

        if has_newline {
            let kind = if self.continuing { TokenKind::Continuation } else { TokenKind::Newline };
            self.push(kind, end, end + 1, start);
            self.pos = end + 1;
        } else {
            self.pos = end;
        }
        self.line += 1;
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize, line_start: usize) {
        let col = (start - line_start) as u32 + 1;
        self.pending.push_back(Token::new(
            kind,
            &self.source[start..end],
            Span::new(start, end),
            self.line,
            col,
        ));
    }

    fn push_eof(&mut self) {
        let len = self.source.len();
        let line_start = self.source.rfind('\n').map_or(0, |i| i + 1);
        // `line` already points past the last line unless the source ended
        // without a newline.
        let line = if self.source.ends_with('\n') || len == 0 { self.line } else { self.line - 1 };
        let col = (len - line_start) as u32 + 1;
        self.pending.push_back(Token::new(TokenKind::Eof, "", Span::empty(len), line.max(1), col));
        debug!("lexed {} lines of {} form source", line.max(1), self.options.form);
    }

    // ------------------------------------------------------------------
    // Free form
    // ------------------------------------------------------------------

    /// A trailing `&` continues the statement; on the next line a leading
    /// `&` is optional. Comment and blank lines in between keep the
    /// statement open.
    fn free_line(&mut self, start: usize, end: usize) -> Vec<Piece> {
        let mut pieces = scan(self.source, start, end);
        let significant: Vec<usize> = pieces
            .iter()
            .enumerate()
            .filter(|(_, (kind, _, _))| !matches!(kind, TokenKind::Whitespace | TokenKind::Comment))
            .map(|(i, _)| i)
            .collect();

        let is_amp = |pieces: &[Piece], i: usize| pieces[i].0 == TokenKind::Continuation;
        let leading = self.continuing && significant.first().is_some_and(|&i| is_amp(&pieces, i));
        let trailing = significant.last().is_some_and(|&i| is_amp(&pieces, i));

        for (n, &i) in significant.iter().enumerate() {
            let keep = (leading && n == 0) || (trailing && n == significant.len() - 1);
            if pieces[i].0 == TokenKind::Continuation && !keep {
                pieces[i].0 = TokenKind::Unknown;
            }
        }

        let blank = significant.is_empty();
        self.continuing = trailing || (self.continuing && blank);
        pieces
    }

    // ------------------------------------------------------------------
    // Fixed form
    // ------------------------------------------------------------------

    fn fixed_line(&mut self, start: usize, end: usize) -> Vec<Piece> {
        let line = &self.source[start..end];
        let limit = floor_char_boundary(line, self.options.fixed_line_length);
        let mut pieces = Vec::new();

        match classify_fixed(line, limit) {
            FixedLine::Comment => {
                if starts_with_comment_char(line) {
                    pieces.push((TokenKind::Comment, start, end));
                } else {
                    pieces.extend(scan(self.source, start, end));
                }
                // Comment lines do not end the statement.
                return pieces;
            }
            FixedLine::Blank => {
                if limit > 0 {
                    pieces.push((TokenKind::Whitespace, start, start + limit));
                }
                if limit < line.len() {
                    pieces.push((TokenKind::Comment, start + limit, end));
                }
                return pieces;
            }
            FixedLine::Continuation => {
                pieces.push((TokenKind::Continuation, start, start + 6));
                self.fixed_statement_field(&mut pieces, start + 6, start + limit);
            }
            FixedLine::Tabbed(tab) => {
                self.fixed_label_field(&mut pieces, start, start + tab);
                self.fixed_statement_field(&mut pieces, start + tab, start + limit);
            }
            FixedLine::Initial => {
                let label_end = floor_char_boundary(line, 5.min(limit));
                self.fixed_label_field(&mut pieces, start, start + label_end);
                let mut field_start = start + label_end;
                if label_end == 5 && limit > 5 && line.as_bytes()[5] == b'0' {
                    // A zero in the continuation column marks an initial line.
                    pieces.push((TokenKind::Whitespace, start + 5, start + 6));
                    field_start = start + 6;
                }
                self.fixed_statement_field(&mut pieces, field_start, start + limit);
            }
        }

        if limit < line.len() {
            pieces.push((TokenKind::Comment, start + limit, end));
        }
        self.continuing = self.next_code_line_continues(end);
        pieces
    }

    /// Columns 1-5: digits form the statement label.
    fn fixed_label_field(&self, pieces: &mut Vec<Piece>, start: usize, end: usize) {
        for (kind, s, e) in scan(self.source, start, end) {
            let kind = match kind {
                TokenKind::Whitespace | TokenKind::IntLiteral => kind,
                _ => TokenKind::Unknown,
            };
            pieces.push((kind, s, e));
        }
    }

    fn fixed_statement_field(&self, pieces: &mut Vec<Piece>, start: usize, end: usize) {
        if start >= end {
            return;
        }
        for (kind, s, e) in scan(self.source, start, end) {
            // `&` has no meaning outside the continuation column.
            let kind = if kind == TokenKind::Continuation { TokenKind::Unknown } else { kind };
            pieces.push((kind, s, e));
        }
    }

    /// Whether the next code line after the newline at `newline` is a
    /// continuation line. Comment and blank lines are skipped.
    fn next_code_line_continues(&self, newline: usize) -> bool {
        let mut pos = newline + 1;
        while pos < self.source.len() {
            let end = self.source[pos..].find('\n').map_or(self.source.len(), |i| pos + i);
            let line = &self.source[pos..end];
            let limit = floor_char_boundary(line, self.options.fixed_line_length);
            match classify_fixed(line, limit) {
                FixedLine::Comment | FixedLine::Blank => pos = end + 1,
                FixedLine::Continuation => return true,
                FixedLine::Initial | FixedLine::Tabbed(_) => return false,
            }
        }
        false
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(token);
            }
            if self.finished {
                return None;
            }
            if self.pos >= self.source.len() {
                self.push_eof();
                self.finished = true;
            } else {
                self.lex_line();
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FixedLine {
    Comment,
    Blank,
    /// Non-blank, non-zero character in column 6.
    Continuation,
    /// A tab inside the label field starts the statement field.
    Tabbed(usize),
    Initial,
}

fn classify_fixed(line: &str, limit: usize) -> FixedLine {
    if starts_with_comment_char(line) {
        return FixedLine::Comment;
    }
    let field = &line[..limit];
    let first = field.find(|c: char| !matches!(c, ' ' | '\t' | '\r'));
    let Some(first) = first else {
        return FixedLine::Blank;
    };
    if field[first..].starts_with('!') && first != 5 {
        return FixedLine::Comment;
    }
    if let Some(tab) = field.as_bytes()[..field.len().min(6)].iter().position(|&b| b == b'\t') {
        return FixedLine::Tabbed(tab);
    }
    let bytes = field.as_bytes();
    if bytes.len() >= 6 && field.is_char_boundary(6) && !matches!(bytes[5], b' ' | b'0') {
        return FixedLine::Continuation;
    }
    FixedLine::Initial
}

fn starts_with_comment_char(line: &str) -> bool {
    matches!(line.as_bytes().first(), Some(b'C' | b'c' | b'*' | b'!'))
}

fn floor_char_boundary(s: &str, at: usize) -> usize {
    if at >= s.len() {
        return s.len();
    }
    let mut at = at;
    while !s.is_char_boundary(at) {
        at -= 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str, form: SourceForm) -> Vec<Token> {
        tokenize(source, LexOptions::new(form)).collect()
    }

    fn kinds(source: &str, form: SourceForm) -> Vec<(TokenKind, String)> {
        lex(source, form).into_iter().map(|t| (t.kind, t.text.to_string())).collect()
    }

    fn significant(source: &str, form: SourceForm) -> Vec<(TokenKind, String)> {
        kinds(source, form).into_iter().filter(|(k, _)| !k.is_trivia()).collect()
    }

    fn assert_tiles(source: &str, form: SourceForm) {
        let tokens = lex(source, form);
        let mut at = 0;
        for t in &tokens {
            assert_eq!(t.span.start, at, "gap or overlap before {:?}", t);
            at = t.span.end;
        }
        assert_eq!(at, source.len());
        let text: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(text, source);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn empty_source_is_just_eof() {
        let tokens = lex("", SourceForm::Free);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
        assert_eq!((tokens[0].line, tokens[0].col), (1, 1));
    }

    #[test]
    fn free_form_statement() {
        let src = "x = y + 1 ! add\n";
        assert_eq!(
            significant(src, SourceForm::Free),
            vec![
                (TokenKind::Name, "x".into()),
                (TokenKind::Eq, "=".into()),
                (TokenKind::Name, "y".into()),
                (TokenKind::Plus, "+".into()),
                (TokenKind::IntLiteral, "1".into()),
                (TokenKind::Newline, "\n".into()),
                (TokenKind::Eof, "".into()),
            ]
        );
        assert_tiles(src, SourceForm::Free);
    }

    #[test]
    fn free_form_continuation_joins_lines() {
        let src = "call f(a, & ! first\n  ! interlude\n\n      & b)\n";
        let sig = significant(src, SourceForm::Free);
        assert_eq!(sig.iter().filter(|(k, _)| *k == TokenKind::Newline).count(), 1);
        let conts = kinds(src, SourceForm::Free)
            .into_iter()
            .filter(|(k, _)| *k == TokenKind::Continuation)
            .count();
        // trailing &, three joined line breaks, leading &
        assert_eq!(conts, 5);
        assert_tiles(src, SourceForm::Free);
    }

    #[test]
    fn stray_ampersand_is_unknown() {
        let sig = significant("a = b & c\n", SourceForm::Free);
        assert!(sig.contains(&(TokenKind::Unknown, "&".into())));
    }

    #[test]
    fn token_positions_are_one_based() {
        let tokens = lex("a\n  bc = 1\n", SourceForm::Free);
        let bc = tokens.iter().find(|t| t.text == "bc").unwrap();
        assert_eq!((bc.line, bc.col), (2, 3));
        let eof = tokens.last().unwrap();
        assert_eq!((eof.line, eof.col), (3, 1));
    }

    #[test]
    fn fixed_form_comment_and_label() {
        let src = "C a comment line\n   10 CONTINUE\n";
        let all = kinds(src, SourceForm::Fixed);
        assert_eq!(all[0], (TokenKind::Comment, "C a comment line".into()));
        assert_eq!(all[1], (TokenKind::Newline, "\n".into()));
        let sig = significant(src, SourceForm::Fixed);
        assert_eq!(sig[0], (TokenKind::Newline, "\n".into()));
        assert_eq!(sig[1], (TokenKind::IntLiteral, "10".into()));
        assert_eq!(sig[2], (TokenKind::Name, "CONTINUE".into()));
        assert_tiles(src, SourceForm::Fixed);
    }

    #[test]
    fn fixed_form_continuation_column() {
        let src = "      X = 1 +\n*comment\n     &    2\n      Y = 3\n";
        let sig = significant(src, SourceForm::Fixed);
        let names: Vec<_> = sig.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(names, vec!["X", "=", "1", "+", "2", "\n", "Y", "=", "3", "\n", ""]);
        let all = kinds(src, SourceForm::Fixed);
        assert!(all.contains(&(TokenKind::Continuation, "     &".into())));
        assert_tiles(src, SourceForm::Fixed);
    }

    #[test]
    fn fixed_form_sequence_field_is_comment() {
        let mut src = String::from("      X = 1");
        src.push_str(&" ".repeat(72 - src.len()));
        src.push_str("SEQ00010\n");
        let all = kinds(&src, SourceForm::Fixed);
        assert!(all.contains(&(TokenKind::Comment, "SEQ00010".into())));
        assert_tiles(&src, SourceForm::Fixed);

        let wide = LexOptions { form: SourceForm::Fixed, fixed_line_length: 132 };
        let tokens: Vec<_> = tokenize(&src, wide).collect();
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Name && t.text == "SEQ00010"));
    }

    #[test]
    fn fixed_form_tab_starts_statement_field() {
        let src = "10\tX = 1\n";
        let sig = significant(src, SourceForm::Fixed);
        assert_eq!(sig[0], (TokenKind::IntLiteral, "10".into()));
        assert_eq!(sig[1], (TokenKind::Name, "X".into()));
        assert_tiles(src, SourceForm::Fixed);
    }

    #[test]
    fn restart_replays_the_same_tokens() {
        let mut lexer = tokenize("a = 1\nb = 2", LexOptions::default());
        let first: Vec<_> = lexer.by_ref().collect();
        lexer.restart();
        let second: Vec<_> = lexer.collect();
        assert_eq!(first, second);
        assert_eq!(first.last().map(|t| (t.line, t.col)), Some((2, 6)));
    }

    #[test]
    fn coverage_on_odd_input() {
        for src in ["'open", "x = 1 &", "\u{feff}program p\r\nend\r\n", "@#$\n\n", "a(1.and.2)"] {
            assert_tiles(src, SourceForm::Free);
            assert_tiles(src, SourceForm::Fixed);
        }
    }
}
