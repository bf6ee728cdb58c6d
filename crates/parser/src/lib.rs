//! Go lexer (Logos) and declaration-level parser.
//!
//! - The lexer implements Go semicolon insertion and collects diagnostics
//!   instead of stopping at the first bad token.
//! - The parser builds an arena AST of package, import, const, var, type and
//!   func declarations with the full type grammar; statement and expression
//!   regions are skipped but keep any type declarations found inside them.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod walk;

pub use error::{Diag, ParseFailure};
pub use lexer::Lexer;
pub use parser::{parse_source, ParsedFile};
