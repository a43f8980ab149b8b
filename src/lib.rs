//! Error-tolerant Java parser with precise positions and rich diagnostics.
//!
//! The parser turns a token stream into a syntax tree for a whole
//! compilation unit. Malformed input never stops it: unparseable regions
//! become [`TreeKind::Erroneous`] nodes holding every skipped token, and each
//! independent mistake is reported once. Node positions live in a side table
//! queried through [`ParseResult`], and diagnostics render through miette.
//!
//! # Example
//!
//! ```
//! use javelin_syntax::{parse_source, render, DiagnosticCode};
//!
//! let result = parse_source("class C { int m() }");
//!
//! assert_eq!(result.diagnostics.len(), 1);
//! assert_eq!(result.diagnostics[0].code, DiagnosticCode::ExpectedOneOf);
//! assert_eq!(render(&result.unit), "class C {\n    int m();\n}\n");
//! ```

pub mod ast;
pub mod config;
pub mod diag;
pub mod lexer;
pub mod parser;
pub mod pool;
pub mod printer;

// Re-export syntax span primitives.
pub use ast::{PositionTable, Span, Spanned, Tree, TreeKind};

pub use config::ParserConfig;
pub use diag::{Diag, DiagLabel, DiagSeverity, DiagnosticCode, LabelRole, SourceFile};
pub use lexer::token::{Token, TokenKind};
pub use lexer::{Lexer, LexerResult, tokenize};
pub use parser::{ParseContext, ParseResult, parse, parse_source};
pub use pool::ParserPool;
pub use printer::render;
