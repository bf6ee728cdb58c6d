use crate::ast::Span;
use crate::error::{Diag, LexError, LexErrorKind};
use logos::{Lexer as LogosLexer, Logos};
use std::ops::Range;

// =============================================================================
// 1. Trivia scanners
// =============================================================================

#[inline]
fn lex_block_comment(lex: &mut LogosLexer<'_, RawTok>) -> Result<(), LexErrorKind> {
    let rem = lex.remainder().as_bytes();
    let mut from = 0;

    while let Some(star) = memchr::memchr(b'*', &rem[from..]) {
        let at = from + star;
        if rem.get(at + 1) == Some(&b'/') {
            lex.bump(at + 2);
            return Ok(());
        }
        from = at + 1;
    }

    lex.bump(rem.len());
    Err(LexErrorKind::UnterminatedComment)
}

// =============================================================================
// 2. Literal validation
// =============================================================================

mod lit {
    use crate::error::LexErrorKind;

    fn hex_run(bytes: &[u8], n: usize) -> Result<u32, LexErrorKind> {
        let run = bytes.get(..n).ok_or(LexErrorKind::InvalidEscape)?;
        run.iter().try_fold(0u32, |acc, &b| {
            let d = (b as char).to_digit(16).ok_or(LexErrorKind::InvalidEscape)?;
            Ok(acc << 4 | d)
        })
    }

    fn scalar(v: u32) -> Result<(), LexErrorKind> {
        if char::from_u32(v).is_some() {
            Ok(())
        } else {
            Err(LexErrorKind::InvalidEscape)
        }
    }

    /// Validates one escape sequence starting right after the backslash and
    /// returns how many bytes it spans.
    fn escape(rest: &[u8], quote: u8) -> Result<usize, LexErrorKind> {
        let Some(&c) = rest.first() else {
            return Err(LexErrorKind::InvalidEscape);
        };
        match c {
            b'a' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' | b'\\' => Ok(1),
            c if c == quote => Ok(1),
            b'x' => hex_run(&rest[1..], 2).map(|_| 3),
            b'u' => scalar(hex_run(&rest[1..], 4)?).map(|_| 5),
            b'U' => scalar(hex_run(&rest[1..], 8)?).map(|_| 9),
            b'0'..=b'7' => {
                let run = rest.get(..3).ok_or(LexErrorKind::InvalidEscape)?;
                let mut v = 0u32;
                for &b in run {
                    if !(b'0'..=b'7').contains(&b) {
                        return Err(LexErrorKind::InvalidEscape);
                    }
                    v = v * 8 + u32::from(b - b'0');
                }
                if v > 255 {
                    return Err(LexErrorKind::InvalidEscape);
                }
                Ok(3)
            }
            _ => Err(LexErrorKind::InvalidEscape),
        }
    }

    pub(super) fn interpreted_string(slice: &str) -> Result<(), LexErrorKind> {
        let body = &slice.as_bytes()[1..slice.len() - 1];
        let mut i = 0;
        while let Some(off) = memchr::memchr(b'\\', &body[i..]) {
            i += off + 1;
            i += escape(&body[i..], b'"')?;
        }
        Ok(())
    }

    pub(super) fn rune(slice: &str) -> Result<(), LexErrorKind> {
        let body = &slice[1..slice.len() - 1];
        if let Some(rest) = body.strip_prefix('\\') {
            let used = escape(rest.as_bytes(), b'\'')?;
            return if used == rest.len() {
                Ok(())
            } else {
                Err(LexErrorKind::InvalidToken)
            };
        }
        if body.chars().count() == 1 {
            Ok(())
        } else {
            Err(LexErrorKind::InvalidToken)
        }
    }
}

// =============================================================================
// 3. Numbers: maximal munch in the callback, classification in the wrapper
// =============================================================================

mod num {
    use crate::error::LexErrorKind;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum NumKind {
        Int,
        Float,
        Imag,
    }

    /// Length of the numeric literal that starts with `head` and continues
    /// into `rem`. Signs are only taken right after an exponent marker.
    pub(super) fn munch(head: &[u8], rem: &[u8]) -> usize {
        let hex = head == b"0" && matches!(rem.first(), Some(b'x' | b'X'));
        let mut prev = head[head.len() - 1];
        let mut n = 0;

        for &b in rem {
            let after_exp = if hex {
                matches!(prev, b'p' | b'P')
            } else {
                matches!(prev, b'e' | b'E' | b'p' | b'P')
            };
            let takes = b.is_ascii_alphanumeric()
                || b == b'_'
                || b == b'.'
                || (after_exp && matches!(b, b'+' | b'-'));
            if !takes {
                break;
            }
            prev = b;
            n += 1;
        }
        n
    }

    fn digits(run: &[u8], is_digit: fn(&u8) -> bool) -> Result<(), LexErrorKind> {
        let ok = run.iter().all(|b| *b == b'_' || is_digit(b))
            && run.iter().any(is_digit)
            && run.last() != Some(&b'_')
            && !run.windows(2).any(|w| w == b"__");
        if ok {
            Ok(())
        } else {
            Err(LexErrorKind::InvalidNumber)
        }
    }

    /// Validates `int[.frac][exp]`; returns whether the literal is a float.
    fn mantissa(
        bytes: &[u8],
        is_digit: fn(&u8) -> bool,
        exp_markers: &[u8],
        hex: bool,
    ) -> Result<bool, LexErrorKind> {
        let (mant, exp) = match bytes.iter().position(|b| exp_markers.contains(b)) {
            Some(at) => (&bytes[..at], Some(&bytes[at + 1..])),
            None => (bytes, None),
        };

        let dot = mant.iter().position(|b| *b == b'.');
        match dot {
            Some(at) => {
                let (int, frac) = (&mant[..at], &mant[at + 1..]);
                if int.is_empty() && frac.is_empty() {
                    return Err(LexErrorKind::InvalidNumber);
                }
                if !int.is_empty() {
                    digits(int, is_digit)?;
                }
                if !frac.is_empty() {
                    digits(frac, is_digit)?;
                }
            }
            None => digits(mant, is_digit)?,
        }

        if let Some(exp) = exp {
            let exp = exp.strip_prefix(b"+").or_else(|| exp.strip_prefix(b"-")).unwrap_or(exp);
            digits(exp, u8::is_ascii_digit)?;
        } else if hex && dot.is_some() {
            // Hex floats need a `p` exponent.
            return Err(LexErrorKind::InvalidNumber);
        }

        Ok(dot.is_some() || exp.is_some())
    }

    pub(super) fn classify(text: &str) -> Result<NumKind, LexErrorKind> {
        let (body, imag) = match text.strip_suffix('i') {
            Some(body) => (body, true),
            None => (text, false),
        };

        let float = match body.as_bytes() {
            [b'0', b'x' | b'X', rest @ ..] => mantissa(rest, u8::is_ascii_hexdigit, b"pP", true)?,
            [b'0', b'b' | b'B', rest @ ..] => {
                digits(rest, |b: &u8| matches!(*b, b'0' | b'1'))?;
                false
            }
            [b'0', b'o' | b'O', rest @ ..] => {
                digits(rest, |b: &u8| matches!(*b, b'0'..=b'7'))?;
                false
            }
            bytes => mantissa(bytes, u8::is_ascii_digit, b"eE", false)?,
        };

        Ok(match (imag, float) {
            (true, _) => NumKind::Imag,
            (false, true) => NumKind::Float,
            (false, false) => NumKind::Int,
        })
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn classifies_go_literals() {
            assert_eq!(classify("42"), Ok(NumKind::Int));
            assert_eq!(classify("1_000"), Ok(NumKind::Int));
            assert_eq!(classify("0x_1F"), Ok(NumKind::Int));
            assert_eq!(classify("0b1011"), Ok(NumKind::Int));
            assert_eq!(classify("0o17"), Ok(NumKind::Int));
            assert_eq!(classify("1.5e-3"), Ok(NumKind::Float));
            assert_eq!(classify(".5"), Ok(NumKind::Float));
            assert_eq!(classify("0x1.8p3"), Ok(NumKind::Float));
            assert_eq!(classify("2i"), Ok(NumKind::Imag));
        }

        #[test]
        fn rejects_malformed_literals() {
            assert!(classify("1__0").is_err());
            assert!(classify("0b102").is_err());
            assert!(classify("0x1.8").is_err());
            assert!(classify("1e").is_err());
            assert!(classify("12abc").is_err());
        }

        #[test]
        fn munch_stops_at_hex_plus() {
            // `0xe+2` is `0xe` `+` `2`.
            assert_eq!(munch(b"0", b"xe+2"), 2);
            assert_eq!(munch(b"1", b"e+2)"), 3);
            assert_eq!(munch(b"1", b":2]"), 0);
        }
    }
}

fn lex_number(lex: &mut LogosLexer<'_, RawTok>) {
    let n = num::munch(lex.slice().as_bytes(), lex.remainder().as_bytes());
    lex.bump(n);
}

// =============================================================================
// 4. Raw tokens
// =============================================================================

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(error = LexErrorKind)]
#[logos(skip r"[ \t]+")]
#[rustfmt::skip]
enum RawTok {
    #[token("\u{FEFF}")] Bom,

    #[regex(r"\r\n|\n|\r")] Newline,
    #[regex(r"//[^\n\r]*", logos::skip, allow_greedy = true)] _LineComment,
    #[token("/*", lex_block_comment)] BlockComment,

    #[token("break")] KwBreak,
    #[token("case")] KwCase,
    #[token("chan")] KwChan,
    #[token("const")] KwConst,
    #[token("continue")] KwContinue,
    #[token("default")] KwDefault,
    #[token("defer")] KwDefer,
    #[token("else")] KwElse,
    #[token("fallthrough")] KwFallthrough,
    #[token("for")] KwFor,
    #[token("func")] KwFunc,
    #[token("go")] KwGo,
    #[token("goto")] KwGoto,
    #[token("if")] KwIf,
    #[token("import")] KwImport,
    #[token("interface")] KwInterface,
    #[token("map")] KwMap,
    #[token("package")] KwPackage,
    #[token("range")] KwRange,
    #[token("return")] KwReturn,
    #[token("select")] KwSelect,
    #[token("struct")] KwStruct,
    #[token("switch")] KwSwitch,
    #[token("type")] KwType,
    #[token("var")] KwVar,

    #[regex(r"[_\p{L}][_\p{L}\p{Nd}]*")] Ident,
    #[regex(r"[0-9]|\.[0-9]", lex_number)] Number,
    #[regex(r"`[^`]*`")] RawString,
    #[regex(r#""([^"\\\n\r]|\\.)*""#, |lex| lit::interpreted_string(lex.slice()))] String,
    #[regex(r"'([^'\\\n\r]|\\.)+'", |lex| lit::rune(lex.slice()))] Rune,

    #[token("...")] Ellipsis,
    #[token("<<=")] ShlAssign,
    #[token(">>=")] ShrAssign,
    #[token("&^=")] AndNotAssign,
    #[token("+=")] AddAssign,
    #[token("-=")] SubAssign,
    #[token("*=")] MulAssign,
    #[token("/=")] DivAssign,
    #[token("%=")] ModAssign,
    #[token("&=")] AndAssign,
    #[token("|=")] OrAssign,
    #[token("^=")] XorAssign,
    #[token("<<")] Shl,
    #[token(">>")] Shr,
    #[token("&^")] AndNot,
    #[token("&&")] LAnd,
    #[token("||")] LOr,
    #[token("==")] EqEq,
    #[token("!=")] NotEq,
    #[token("<=")] Le,
    #[token(">=")] Ge,
    #[token("++")] Inc,
    #[token("--")] Dec,
    #[token(":=")] Define,
    #[token("<-")] Arrow,
    #[token("=")] Assign,
    #[token("+")] Plus,
    #[token("-")] Minus,
    #[token("*")] Star,
    #[token("/")] Slash,
    #[token("%")] Percent,
    #[token("&")] Amp,
    #[token("|")] Pipe,
    #[token("^")] Caret,
    #[token("~")] Tilde,
    #[token("!")] Bang,
    #[token("<")] Lt,
    #[token(">")] Gt,

    #[token("(")] LParen,
    #[token(")")] RParen,
    #[token("[")] LBrack,
    #[token("]")] RBrack,
    #[token("{")] LBrace,
    #[token("}")] RBrace,
    #[token(",")] Comma,
    #[token(";")] Semi,
    #[token(":")] Colon,
    #[token(".")] Dot,

    #[regex(r".", priority = 0)] Error,
}

impl RawTok {
    /// Tokens after which a newline terminates the statement.
    #[inline]
    const fn ends_statement(self) -> bool {
        matches!(
            self,
            Self::Ident
                | Self::Number
                | Self::Rune
                | Self::String
                | Self::RawString
                | Self::KwBreak
                | Self::KwContinue
                | Self::KwFallthrough
                | Self::KwReturn
                | Self::Inc
                | Self::Dec
                | Self::RParen
                | Self::RBrack
                | Self::RBrace
        )
    }

    /// Maps a non-numeric, non-trivia raw token to its public form.
    #[rustfmt::skip]
    fn to_token(self, slice: &str) -> Tok<'_> {
        match self {
            Self::Ident => Tok::Ident(slice),
            Self::Rune => Tok::RuneLit(slice),
            Self::String => Tok::StringLit(slice),
            Self::RawString => Tok::RawStringLit(slice),

            Self::KwBreak => Tok::KwBreak, Self::KwCase => Tok::KwCase, Self::KwChan => Tok::KwChan,
            Self::KwConst => Tok::KwConst, Self::KwContinue => Tok::KwContinue,
            Self::KwDefault => Tok::KwDefault, Self::KwDefer => Tok::KwDefer, Self::KwElse => Tok::KwElse,
            Self::KwFallthrough => Tok::KwFallthrough, Self::KwFor => Tok::KwFor, Self::KwFunc => Tok::KwFunc,
            Self::KwGo => Tok::KwGo, Self::KwGoto => Tok::KwGoto, Self::KwIf => Tok::KwIf,
            Self::KwImport => Tok::KwImport, Self::KwInterface => Tok::KwInterface, Self::KwMap => Tok::KwMap,
            Self::KwPackage => Tok::KwPackage, Self::KwRange => Tok::KwRange, Self::KwReturn => Tok::KwReturn,
            Self::KwSelect => Tok::KwSelect, Self::KwStruct => Tok::KwStruct, Self::KwSwitch => Tok::KwSwitch,
            Self::KwType => Tok::KwType, Self::KwVar => Tok::KwVar,

            Self::Ellipsis => Tok::Ellipsis, Self::ShlAssign => Tok::ShlAssign, Self::ShrAssign => Tok::ShrAssign,
            Self::AndNotAssign => Tok::AndNotAssign, Self::AddAssign => Tok::AddAssign,
            Self::SubAssign => Tok::SubAssign, Self::MulAssign => Tok::MulAssign, Self::DivAssign => Tok::DivAssign,
            Self::ModAssign => Tok::ModAssign, Self::AndAssign => Tok::AndAssign, Self::OrAssign => Tok::OrAssign,
            Self::XorAssign => Tok::XorAssign, Self::Shl => Tok::Shl, Self::Shr => Tok::Shr,
            Self::AndNot => Tok::AndNot, Self::LAnd => Tok::LAnd, Self::LOr => Tok::LOr, Self::EqEq => Tok::EqEq,
            Self::NotEq => Tok::NotEq, Self::Le => Tok::Le, Self::Ge => Tok::Ge, Self::Inc => Tok::Inc,
            Self::Dec => Tok::Dec, Self::Define => Tok::Define, Self::Arrow => Tok::Arrow,
            Self::Assign => Tok::Assign, Self::Plus => Tok::Plus, Self::Minus => Tok::Minus, Self::Star => Tok::Star,
            Self::Slash => Tok::Slash, Self::Percent => Tok::Percent, Self::Amp => Tok::Amp, Self::Pipe => Tok::Pipe,
            Self::Caret => Tok::Caret, Self::Tilde => Tok::Tilde, Self::Bang => Tok::Bang, Self::Lt => Tok::Lt,
            Self::Gt => Tok::Gt,

            Self::LParen => Tok::LParen, Self::RParen => Tok::RParen, Self::LBrack => Tok::LBrack,
            Self::RBrack => Tok::RBrack, Self::LBrace => Tok::LBrace, Self::RBrace => Tok::RBrace,
            Self::Comma => Tok::Comma, Self::Semi => Tok::Semi, Self::Colon => Tok::Colon, Self::Dot => Tok::Dot,

            Self::Number | Self::Bom | Self::Newline | Self::_LineComment | Self::BlockComment
            | Self::Error => Tok::Error,
        }
    }
}

// =============================================================================
// 5. Public tokens (zero-copy)
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Tok<'input> {
    Ident(&'input str),
    IntLit(&'input str),
    FloatLit(&'input str),
    ImagLit(&'input str),
    RuneLit(&'input str),
    StringLit(&'input str),
    RawStringLit(&'input str),

    // Keywords
    KwBreak,
    KwCase,
    KwChan,
    KwConst,
    KwContinue,
    KwDefault,
    KwDefer,
    KwElse,
    KwFallthrough,
    KwFor,
    KwFunc,
    KwGo,
    KwGoto,
    KwIf,
    KwImport,
    KwInterface,
    KwMap,
    KwPackage,
    KwRange,
    KwReturn,
    KwSelect,
    KwStruct,
    KwSwitch,
    KwType,
    KwVar,

    // Operators / Delimiters
    Ellipsis,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    EqEq,
    NotEq,
    Le,
    Ge,
    Inc,
    Dec,
    Define,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Bang,
    Lt,
    Gt,
    LParen,
    RParen,
    LBrack,
    RBrack,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Colon,
    Dot,

    Error,
}

impl<'input> std::fmt::Display for Tok<'input> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tok::Ident(s)
            | Tok::IntLit(s)
            | Tok::FloatLit(s)
            | Tok::ImagLit(s)
            | Tok::RuneLit(s)
            | Tok::StringLit(s)
            | Tok::RawStringLit(s) => write!(f, "`{s}`"),
            Tok::Semi => f.write_str("';'"),
            other => write!(f, "{other:?}"),
        }
    }
}

// =============================================================================
// 6. Lexer wrapper: semicolon insertion + diagnostics
// =============================================================================

/// Iterator of `(start, token, end)` triples over Go source.
///
/// Inserted semicolons are zero-width (`start == end`).
pub struct Lexer<'src> {
    logos: LogosLexer<'src, RawTok>,
    pending: Option<(usize, Tok<'src>, usize)>,
    diags: Vec<Diag>,
    semi_armed: bool,
    eof_done: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(input: &'src str) -> Self {
        Self {
            logos: RawTok::lexer(input),
            pending: None,
            diags: Vec::new(),
            semi_armed: false,
            eof_done: false,
        }
    }

    pub fn take_diags(&mut self) -> Vec<Diag> {
        std::mem::take(&mut self.diags)
    }

    fn error_token(&mut self, kind: LexErrorKind, span: Range<usize>) -> (usize, Tok<'src>, usize) {
        self.diags.push(
            LexError {
                kind,
                span: Span::new(span.start, span.end),
            }
            .diag(),
        );
        self.semi_armed = false;
        (span.start, Tok::Error, span.end)
    }

    /// Disarms semicolon insertion and returns the zero-width `;` at `pos`
    /// if it was armed.
    fn take_semi(&mut self, pos: usize) -> Option<(usize, Tok<'src>, usize)> {
        std::mem::take(&mut self.semi_armed).then_some((pos, Tok::Semi, pos))
    }

    fn number(&mut self, span: Range<usize>, slice: &'src str) -> (usize, Tok<'src>, usize) {
        match num::classify(slice) {
            Ok(kind) => {
                self.semi_armed = true;
                let tok = match kind {
                    num::NumKind::Int => Tok::IntLit(slice),
                    num::NumKind::Float => Tok::FloatLit(slice),
                    num::NumKind::Imag => Tok::ImagLit(slice),
                };
                (span.start, tok, span.end)
            }
            Err(kind) => self.error_token(kind, span),
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = (usize, Tok<'src>, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.take() {
                return Some(tok);
            }
            if self.eof_done {
                return None;
            }

            let raw = match self.logos.next() {
                None => {
                    self.eof_done = true;
                    let end = self.logos.source().len();
                    self.pending = self.take_semi(end);
                    continue;
                }
                Some(Err(kind)) => {
                    let span = self.logos.span();
                    return Some(self.error_token(kind, span));
                }
                Some(Ok(raw)) => raw,
            };

            let span = self.logos.span();
            let slice = self.logos.slice();

            match raw {
                RawTok::Bom if span.start == 0 => continue,
                RawTok::Bom | RawTok::Error => {
                    return Some(self.error_token(LexErrorKind::InvalidToken, span));
                }
                RawTok::Newline => {
                    if let Some(semi) = self.take_semi(span.start) {
                        return Some(semi);
                    }
                }
                RawTok::BlockComment => {
                    let newline = memchr::memchr2(b'\n', b'\r', slice.as_bytes());
                    if let Some(off) = newline {
                        if let Some(semi) = self.take_semi(span.start + off) {
                            return Some(semi);
                        }
                    }
                }
                RawTok::Number => return Some(self.number(span, slice)),
                _ => {
                    self.semi_armed = raw.ends_statement();
                    return Some((span.start, raw.to_token(slice), span.end));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(src: &str) -> Vec<Tok<'_>> {
        Lexer::new(src).map(|(_, t, _)| t).collect()
    }

    #[test]
    fn inserts_semicolon_after_closing_brace() {
        assert_eq!(
            toks("struct {\n}\n"),
            vec![Tok::KwStruct, Tok::LBrace, Tok::RBrace, Tok::Semi]
        );
    }

    #[test]
    fn block_comment_with_newline_terminates_statement() {
        assert_eq!(toks("x /*\n*/ y"), vec![
            Tok::Ident("x"),
            Tok::Semi,
            Tok::Ident("y"),
            Tok::Semi,
        ]);
        assert_eq!(toks("x /* */ y"), vec![Tok::Ident("x"), Tok::Ident("y"), Tok::Semi]);
    }

    #[test]
    fn bom_only_at_start() {
        let mut lx = Lexer::new("\u{FEFF}a \u{FEFF}");
        let out: Vec<_> = lx.by_ref().map(|(_, t, _)| t).collect();
        assert_eq!(out, vec![Tok::Ident("a"), Tok::Error]);
        assert_eq!(lx.take_diags().len(), 1);
    }

    #[test]
    fn unterminated_comment_reports_diag() {
        let mut lx = Lexer::new("a /* never closed");
        let _ = lx.by_ref().count();
        let diags = lx.take_diags();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "unterminated comment");
    }

    #[test]
    fn validates_string_escapes() {
        assert_eq!(toks(r#""a\tb\x41é\101""#)[0], Tok::StringLit(r#""a\tb\x41é\101""#));
        assert_eq!(toks(r#""\q""#)[0], Tok::Error);
        assert_eq!(toks(r"'\n'")[0], Tok::RuneLit(r"'\n'"));
        assert_eq!(toks("'ab'")[0], Tok::Error);
    }
}
