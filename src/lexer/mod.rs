//! Lexical analysis for Java sources.
//!
//! The lexer is built on a `logos` token enum and never fails: malformed input
//! becomes [`TokenKind::Error`] tokens which the parser wraps into recovery
//! nodes. Doc comments survive as [`TokenKind::DocComment`] tokens so the parser
//! can attach them to declarations; every other comment is dropped.

pub mod token;

use crate::diag::{Diag, DiagnosticCode};
use logos::Logos;
use token::{Token, TokenKind};

/// Result of lexical analysis.
///
/// Contains both the tokens produced and any diagnostics encountered during scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens produced, including an EOF token at the end.
    pub tokens: Vec<Token>,
    /// Diagnostics for input that produced no token at all (unterminated comments).
    pub diagnostics: Vec<Diag>,
}

/// A lexical analyzer for Java source text.
pub struct Lexer<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    diagnostics: Vec<Diag>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenizes the source text and returns the result.
    pub fn tokenize(mut self) -> LexerResult {
        let mut lex = TokenKind::lexer(self.source);

        while let Some(result) = lex.next() {
            let span = lex.span();
            match result {
                Ok(TokenKind::BlockComment) => {
                    let text = lex.slice();
                    if text.starts_with("/**") && text != "/**/" {
                        self.tokens
                            .push(Token::new(TokenKind::DocComment, span, text));
                    }
                }
                // Only an unterminated comment can leave `/*` unmatched; logos
                // reports it as an error over the rest of the input.
                _ if self.source[span.start..].starts_with("/*") => {
                    self.diagnostics.push(
                        Diag::error(DiagnosticCode::UnclosedComment, span.start..self.source.len())
                            .with_primary_label(span.start..span.start + 2, "comment opened here"),
                    );
                    break;
                }
                Ok(kind) => self.tokens.push(Token::new(kind, span, lex.slice())),
                Err(()) => {
                    let end = self.malformed_end(span.start).max(span.end);
                    if end > span.end {
                        lex.bump(end - span.end);
                    }
                    let text = &self.source[span.start..end];
                    self.tokens
                        .push(Token::new(TokenKind::Error, span.start..end, text));
                }
            }
        }

        // Always add EOF token
        let eof_pos = self.source.len();
        self.tokens
            .push(Token::new(TokenKind::Eof, eof_pos..eof_pos, ""));

        LexerResult {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    /// Finds where a malformed token starting at `start` ends.
    ///
    /// Broken literals extend to their closing quote (or the end of the line), a
    /// broken `\u` escape swallows its hex digits, anything else is one character.
    fn malformed_end(&self, start: usize) -> usize {
        let rest = &self.source[start..];
        let mut chars = rest.char_indices();
        let Some((_, first)) = chars.next() else {
            return start;
        };

        match first {
            '"' | '\'' => {
                let mut escaped = false;
                for (offset, ch) in chars {
                    match ch {
                        '\r' | '\n' => return start + offset,
                        '\\' if !escaped => {
                            escaped = true;
                            continue;
                        }
                        c if c == first && !escaped => return start + offset + 1,
                        _ => {}
                    }
                    escaped = false;
                }
                self.source.len()
            }
            '\\' => {
                let mut end = start + 1;
                let mut saw_u = false;
                let mut hex = 0;
                for (offset, ch) in chars {
                    if ch == 'u' && hex == 0 {
                        saw_u = true;
                    } else if saw_u && ch.is_ascii_hexdigit() && hex < 4 {
                        hex += 1;
                    } else {
                        break;
                    }
                    end = start + offset + ch.len_utf8();
                }
                end
            }
            other => start + other.len_utf8(),
        }
    }
}

/// Picks the diagnostic code describing a malformed token's text.
pub fn classify_malformed(text: &str) -> DiagnosticCode {
    if text.contains("\\u") {
        DiagnosticCode::IllegalUnicodeEscape
    } else if text.starts_with('"') {
        if text.len() > 1 && text.ends_with('"') {
            DiagnosticCode::IllegalEscapeChar
        } else {
            DiagnosticCode::UnclosedStringLiteral
        }
    } else if text.starts_with('\'') {
        DiagnosticCode::UnclosedCharLiteral
    } else {
        DiagnosticCode::IllegalChar
    }
}

/// Convenience function to tokenize source text.
///
/// This is the main entry point for lexical analysis.
pub fn tokenize(source: &str) -> LexerResult {
    Lexer::new(source).tokenize()
}
