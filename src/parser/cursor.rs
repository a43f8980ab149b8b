//! Token stream navigation with lookahead and backtracking.
//!
//! The cursor owns the significant tokens of one parse. Doc comment tokens are
//! taken out of the stream at construction and remembered against the token
//! that follows them, so grammar code never sees them.

use crate::ast::Span;
use crate::lexer::token::{Token, TokenKind};
use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CursorError {
    #[error("cannot advance past the end of the token stream (offset {offset})")]
    EndOfStream { offset: usize },
}

/// A saved cursor position, valid for the cursor that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

#[derive(Debug, Clone)]
pub struct TokenCursor {
    tokens: Vec<Token>,
    /// Raw doc comment preceding each token, parallel to `tokens`.
    docs: Vec<Option<SmolStr>>,
    pos: usize,
}

impl TokenCursor {
    /// Builds a cursor over `tokens`.
    ///
    /// Doc comments are split off, everything after the first EOF is dropped,
    /// and a missing EOF is synthesized at the end of the last token.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut significant = Vec::with_capacity(tokens.len() + 1);
        let mut docs = Vec::with_capacity(tokens.len() + 1);
        let mut pending_doc: Option<SmolStr> = None;

        for token in tokens {
            match token.kind {
                TokenKind::DocComment => pending_doc = Some(token.text),
                TokenKind::BlockComment => {}
                TokenKind::Eof => {
                    significant.push(token);
                    docs.push(pending_doc.take());
                    break;
                }
                _ => {
                    significant.push(token);
                    docs.push(pending_doc.take());
                }
            }
        }

        if significant.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = significant.last().map_or(0, |t| t.span.end);
            significant.push(Token::new(TokenKind::Eof, end..end, ""));
            docs.push(pending_doc.take());
        }

        Self {
            tokens: significant,
            docs,
            pos: 0,
        }
    }

    fn eof_index(&self) -> usize {
        self.tokens.len() - 1
    }

    /// The token `k` places ahead of the current one; EOF once past the end.
    pub fn peek(&self, k: usize) -> &Token {
        let index = self.pos.saturating_add(k).min(self.eof_index());
        &self.tokens[index]
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    pub fn kind(&self, k: usize) -> TokenKind {
        self.peek(k).kind
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.eof_index()
    }

    /// Consumes the current token.
    ///
    /// EOF can be consumed once; advancing again is an error.
    pub fn advance(&mut self) -> Result<Token, CursorError> {
        if self.pos > self.eof_index() {
            return Err(CursorError::EndOfStream {
                offset: self.tokens[self.eof_index()].span.end,
            });
        }
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        Ok(token)
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0.min(self.tokens.len());
    }

    /// Index of the current token among significant tokens.
    pub fn index(&self) -> usize {
        self.pos
    }

    /// Tokens consumed since `mark`, in order. Empty if the cursor has been
    /// reset to before it.
    pub fn consumed_since(&self, mark: Mark) -> &[Token] {
        let from = mark.0.min(self.pos);
        &self.tokens[from..self.pos.min(self.tokens.len())]
    }

    pub fn position_of(&self, token: &Token) -> Span {
        token.span.clone()
    }

    /// End offset of the most recently consumed token, 0 before the first.
    pub fn prev_end(&self) -> usize {
        match self.pos.checked_sub(1) {
            Some(index) => self.tokens[index.min(self.eof_index())].span.end,
            None => 0,
        }
    }

    pub fn prev(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|index| self.tokens.get(index))
    }

    /// Raw doc comment immediately preceding the current token.
    pub fn doc_before_current(&self) -> Option<&SmolStr> {
        self.docs.get(self.pos).and_then(Option::as_ref)
    }

    /// Number of significant tokens, EOF included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.len() <= 1
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
