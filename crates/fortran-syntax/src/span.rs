// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

/// A half-open byte range `start..end` in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `offset` falls inside the half-open range.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// Precomputed line-start offsets for O(log n) byte-offset → line:col lookup.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line. line_starts[0] is always 0.
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map by scanning source for newlines. O(n).
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    /// Convert byte offset to (line, col), both 1-based. O(log n).
    pub fn offset_to_line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset as u32;
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line = (line_idx + 1) as u32;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Byte offset of a 1-based (line, col) pair, if the line exists.
    pub fn line_col_to_offset(&self, line: u32, col: u32) -> Option<usize> {
        let start = *self.line_starts.get((line as usize).checked_sub(1)?)?;
        Some((start + col.saturating_sub(1)) as usize)
    }

    /// Get the source text of a 1-based line number, without its line break.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| (s as usize).saturating_sub(1))
            .unwrap_or(source.len());
        source.get(start..end).map(|l| l.strip_suffix('\r').unwrap_or(l))
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source() {
        let lm = LineMap::new("");
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.line_count(), 1);
    }

    #[test]
    fn fortran_lines() {
        let src = "program p\n  x = 1\nend\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_count(), 4);
        assert_eq!(lm.offset_to_line_col(0), (1, 1));
        assert_eq!(lm.offset_to_line_col(12), (2, 3)); // 'x'
        assert_eq!(lm.line_text(src, 2), Some("  x = 1"));
        assert_eq!(lm.line_text(src, 3), Some("end"));
        assert_eq!(lm.line_text(src, 4), Some(""));
        assert_eq!(lm.line_text(src, 5), None);
    }

    #[test]
    fn offset_at_newline_belongs_to_its_line() {
        let src = "ab\ncd\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.offset_to_line_col(2), (1, 3));
        assert_eq!(lm.offset_to_line_col(3), (2, 1));
        assert_eq!(lm.line_col_to_offset(2, 2), Some(4));
        assert_eq!(lm.line_col_to_offset(9, 1), None);
    }

    #[test]
    fn crlf_line_text() {
        let src = "a = 1\r\nb = 2\r\n";
        let lm = LineMap::new(src);
        assert_eq!(lm.line_text(src, 1), Some("a = 1"));
        assert_eq!(lm.line_text(src, 2), Some("b = 2"));
    }

    #[test]
    fn span_helpers() {
        let s = Span::new(4, 9);
        assert!(s.contains(4));
        assert!(!s.contains(9));
        assert_eq!(s.len(), 5);
        assert_eq!(s.cover(Span::new(1, 5)), Span::new(1, 9));
        assert!(Span::empty(3).is_empty());
    }
}
