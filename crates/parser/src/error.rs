use thiserror::Error;

use crate::ast::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagKind {
    Lex,
    Parse,
}

/// A located diagnostic produced while lexing or parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    pub kind: DiagKind,
    pub span: Span,
    pub message: String,
}

impl Diag {
    #[inline]
    pub fn parse(span: Span, message: impl Into<String>) -> Self {
        Self {
            kind: DiagKind::Parse,
            span,
            message: message.into(),
        }
    }
}

/// Parsing stopped. `diags` holds every lexer diagnostic, or the single
/// syntax error that aborted the parse.
#[derive(Debug, Error)]
#[error("{}", .diags.first().map(|d| d.message.as_str()).unwrap_or("parse failed"))]
pub struct ParseFailure {
    pub diags: Vec<Diag>,
}

impl ParseFailure {
    /// The diagnostic reported to users: the earliest one in the source.
    pub fn primary(&self) -> Option<&Diag> {
        self.diags.iter().min_by_key(|d| d.span.start)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid numeric literal")]
    InvalidNumber,
    #[error("invalid escape")]
    InvalidEscape,
    #[error("unterminated comment")]
    UnterminatedComment,
}

impl Default for LexErrorKind {
    #[inline]
    fn default() -> Self {
        LexErrorKind::InvalidToken
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {span:?}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    #[inline]
    pub fn diag(&self) -> Diag {
        Diag {
            kind: DiagKind::Lex,
            span: self.span,
            message: self.kind.to_string(),
        }
    }
}

/// 1-based line and column (in bytes) of `offset` within `src`.
///
/// Offsets past the end clamp to the end of the input.
pub fn line_col(src: &str, offset: u32) -> (u32, u32) {
    let offset = (offset as usize).min(src.len());
    let before = &src.as_bytes()[..offset];
    let line = memchr::memchr_iter(b'\n', before).count() + 1;
    let line_start = memchr::memrchr(b'\n', before).map_or(0, |i| i + 1);
    (line as u32, (offset - line_start) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_counts_from_one() {
        let src = "package p\n\ntype T struct{}\n";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 11), (3, 1));
        assert_eq!(line_col(src, 16), (3, 6));
    }

    #[test]
    fn line_col_clamps_past_end() {
        assert_eq!(line_col("ab\ncd", 99), (2, 3));
    }
}
