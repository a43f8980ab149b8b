//! Parser infrastructure for Java sources.
//!
//! The parser consumes a token stream and builds a [`Tree`] for a whole
//! compilation unit. It never gives up: malformed input produces
//! [`TreeKind::Erroneous`] nodes plus diagnostics, and parsing resumes at the
//! next point where the grammar can be trusted again.

pub mod cursor;
mod declaration;
mod expression;
pub mod recovery;
mod statement;
mod types;

pub use cursor::{CursorError, Mark, TokenCursor};
pub use recovery::{RecoveryEvent, RecoverySet, Rule};

use crate::ast::positions::{clean_doc_comment, next_unit};
use crate::ast::visitors::erroneous_nodes;
use crate::ast::{PositionTable, Span, Tree, TreeKind};
use crate::config::ParserConfig;
use crate::diag::{Diag, DiagSeverity, DiagnosticSink, SourceFile, convert_diagnostics_to_reports};
use crate::lexer::token::{Token, TokenKind};
use crate::lexer::tokenize;
use log::trace;
use miette::Report;
use recovery::RecoveryState;
use smol_str::SmolStr;

/// Result type of rules that hand failures to their caller.
pub(crate) type PResult<T> = Result<T, RecoveryEvent>;

/// Everything one parse produced.
#[derive(Debug)]
pub struct ParseResult {
    /// The compilation unit. Always present, however broken the input.
    pub unit: Tree,
    /// Positions and doc comments of every node in `unit`.
    pub positions: PositionTable,
    /// Diagnostics in the order they were reported.
    pub diagnostics: Vec<Diag>,
}

impl ParseResult {
    pub fn start_of(&self, node: &Tree) -> Option<usize> {
        self.positions.start_of(node)
    }

    pub fn end_of(&self, node: &Tree) -> Option<usize> {
        self.positions.end_of(node)
    }

    pub fn preferred_of(&self, node: &Tree) -> Option<usize> {
        self.positions.preferred_of(node)
    }

    pub fn span_of(&self, node: &Tree) -> Option<Span> {
        self.positions.span_of(node)
    }

    pub fn doc_comment_of(&self, node: &Tree) -> Option<&str> {
        self.positions.doc_comment_of(node)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == DiagSeverity::Error)
    }

    /// All erroneous nodes of the unit, in pre-order.
    pub fn erroneous_nodes(&self) -> Vec<&Tree> {
        erroneous_nodes(&self.unit)
    }

    /// Diagnostics rendered as miette reports against `source`.
    pub fn reports(&self, source: &SourceFile) -> Vec<Report> {
        convert_diagnostics_to_reports(&self.diagnostics, source)
    }

    /// Diagnostics as `line:column:code` strings.
    pub fn raw_diagnostics(&self, source: &SourceFile) -> Vec<String> {
        self.diagnostics.iter().map(|diag| diag.raw(source)).collect()
    }
}

/// Reusable parsing state.
///
/// Each [`ParseContext::parse`] starts from a clean diagnostic sink and a
/// position table bound to a fresh parse identity, so nothing leaks between
/// parses run on the same context.
#[derive(Debug, Default)]
pub struct ParseContext {
    config: ParserConfig,
    sink: DiagnosticSink,
    positions: PositionTable,
    parses: u64,
}

impl ParseContext {
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            sink: DiagnosticSink::new(),
            positions: PositionTable::default(),
            parses: 0,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Number of parses run on this context.
    pub fn parses(&self) -> u64 {
        self.parses
    }

    pub fn parse(&mut self, tokens: Vec<Token>) -> ParseResult {
        self.parse_with_lexer_diagnostics(tokens, Vec::new())
    }

    /// Lexes and parses `source`; lexer diagnostics come first.
    pub fn parse_source(&mut self, source: &str) -> ParseResult {
        let lexed = tokenize(source);
        self.parse_with_lexer_diagnostics(lexed.tokens, lexed.diagnostics)
    }

    fn parse_with_lexer_diagnostics(&mut self, tokens: Vec<Token>, lexer: Vec<Diag>) -> ParseResult {
        self.sink.reset();
        let capacity = self.positions.len();
        self.positions.reset(next_unit());
        self.parses += 1;

        let unit = {
            let mut parser = Parser::new(tokens, &self.config, &mut self.sink, &mut self.positions);
            parser.parse_compilation_unit()
        };
        self.sink.prepend(lexer);

        let fresh = PositionTable::new(self.positions.unit());
        let positions = std::mem::replace(&mut self.positions, fresh);
        let mut diagnostics = self.sink.take();
        diagnostics.shrink_to_fit();
        trace!(
            "parse #{} finished: {} nodes (previous {}), {} diagnostics",
            self.parses,
            positions.len(),
            capacity,
            diagnostics.len()
        );

        ParseResult {
            unit,
            positions,
            diagnostics,
        }
    }
}

/// Parses a token stream with the default configuration.
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    ParseContext::default().parse(tokens)
}

/// Lexes and parses `source` with the default configuration.
pub fn parse_source(source: &str) -> ParseResult {
    ParseContext::default().parse_source(source)
}

/// Saved parser state for speculative sub-parses.
struct Checkpoint {
    mark: Mark,
    nodes: usize,
    recovery: RecoveryState,
}

/// Recursive-descent parser over one token stream.
pub(crate) struct Parser<'a> {
    cursor: TokenCursor,
    config: &'a ParserConfig,
    sink: &'a mut DiagnosticSink,
    positions: &'a mut PositionTable,
    recovery: RecoveryState,
    depth: u32,
    speculation_depth: u32,
    speculation_failed: bool,
    /// Set while parsing case labels, where `x ->` is not a lambda.
    no_lambda: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: Vec<Token>,
        config: &'a ParserConfig,
        sink: &'a mut DiagnosticSink,
        positions: &'a mut PositionTable,
    ) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            config,
            sink,
            positions,
            recovery: RecoveryState::default(),
            depth: 0,
            speculation_depth: 0,
            speculation_failed: false,
            no_lambda: false,
        }
    }

    // Token access

    pub(crate) fn kind(&self) -> TokenKind {
        self.cursor.kind(0)
    }

    pub(crate) fn peek_kind(&self, k: usize) -> TokenKind {
        self.cursor.kind(k)
    }

    pub(crate) fn token(&self) -> &Token {
        self.cursor.current()
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(crate) fn at_word(&self, word: &str) -> bool {
        self.token().is_word(word)
    }

    pub(crate) fn peek_is_word(&self, k: usize, word: &str) -> bool {
        self.cursor.peek(k).is_word(word)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.cursor.is_eof()
    }

    /// True if tokens `k - 1` and `k` touch with no whitespace between.
    pub(crate) fn adjacent(&self, k: usize) -> bool {
        k > 0 && self.cursor.peek(k - 1).span.end == self.cursor.peek(k).span.start
    }

    pub(crate) fn start(&self) -> usize {
        self.token().span.start
    }

    pub(crate) fn prev_end(&self) -> usize {
        self.cursor.prev_end()
    }

    pub(crate) fn index(&self) -> usize {
        self.cursor.index()
    }

    /// Consumes the current token; at EOF, returns EOF without moving.
    pub(crate) fn bump(&mut self) -> Token {
        if self.at_eof() {
            return self.token().clone();
        }
        match self.cursor.advance() {
            Ok(token) => token,
            Err(_) => self.token().clone(),
        }
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) && !self.at_eof() {
            Some(self.bump())
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind, rule: Rule) -> PResult<Token> {
        match self.eat(kind) {
            Some(token) => Ok(token),
            None => Err(self.expected_event(rule, &[kind])),
        }
    }

    // Node construction

    /// Allocates a node spanning from `start` to the end of the last consumed
    /// token, widened to cover any child placed at an unconsumed token.
    pub(crate) fn finish(&mut self, kind: TreeKind, start: usize, preferred: usize) -> Tree {
        let id = self.positions.alloc(None, Some(preferred));
        let tree = Tree::new(id, kind);
        let mut span = start..self.prev_end().max(start);
        for child in tree.children() {
            if let Some(covered) = self.span_of(child) {
                span = span.start.min(covered.start)..span.end.max(covered.end);
            }
        }
        self.positions.set_span(id, span);
        tree
    }

    pub(crate) fn finish_at(&mut self, kind: TreeKind, start: usize) -> Tree {
        self.finish(kind, start, start)
    }

    pub(crate) fn spanned(&mut self, kind: TreeKind, span: Span, preferred: usize) -> Tree {
        let id = self.positions.alloc(Some(span), Some(preferred));
        Tree::new(id, kind)
    }

    /// A node with no source extent.
    pub(crate) fn synthetic(&mut self, kind: TreeKind) -> Tree {
        let id = self.positions.alloc(None, None);
        Tree::new(id, kind)
    }

    pub(crate) fn span_of(&self, tree: &Tree) -> Option<Span> {
        self.positions.try_span_of(tree.id).ok().flatten()
    }

    /// Start of `tree`, or `fallback` if it has no span.
    pub(crate) fn start_of(&self, tree: &Tree, fallback: usize) -> usize {
        self.span_of(tree).map_or(fallback, |span| span.start)
    }

    pub(crate) fn attach_doc(&mut self, tree: &Tree, raw: Option<SmolStr>) {
        if !self.config.collect_doc_comments {
            return;
        }
        if let Some(raw) = raw {
            self.positions.attach_doc(tree.id, clean_doc_comment(&raw));
        }
    }

    pub(crate) fn doc_before_current(&self) -> Option<SmolStr> {
        self.cursor.doc_before_current().cloned()
    }

    // Speculation and nesting

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            mark: self.cursor.mark(),
            nodes: self.positions.len(),
            recovery: self.recovery.clone(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        self.cursor.reset(checkpoint.mark);
        self.positions.truncate(checkpoint.nodes);
        self.recovery = checkpoint.recovery;
    }

    /// Runs `rule` speculatively.
    ///
    /// Diagnostics are suppressed while it runs. If it fails, or reports any
    /// error along the way, every effect is undone and `None` is returned;
    /// otherwise its result is kept as if parsed normally.
    pub(crate) fn speculate<T>(&mut self, rule: impl FnOnce(&mut Self) -> PResult<T>) -> Option<T> {
        if self.speculation_depth >= self.config.max_speculation_depth {
            return None;
        }
        let checkpoint = self.checkpoint();
        let outer_failed = std::mem::replace(&mut self.speculation_failed, false);
        self.speculation_depth += 1;
        self.sink.enter_speculation();

        let result = rule(self);

        self.sink.exit_speculation();
        self.speculation_depth -= 1;
        let failed = std::mem::replace(&mut self.speculation_failed, outer_failed);

        match result {
            Ok(value) if !failed => Some(value),
            _ => {
                trace!("speculation at offset {} abandoned", self.start());
                self.restore(checkpoint);
                None
            }
        }
    }

    /// Re-parses from `mark` to build a second copy of an already parsed
    /// construct, then returns to the current position. Diagnostics from the
    /// replay are suppressed.
    pub(crate) fn replay<T>(&mut self, mark: Mark, rule: impl FnOnce(&mut Self) -> T) -> T {
        let resume = self.cursor.mark();
        let recovery = self.recovery.clone();
        let outer_failed = self.speculation_failed;
        self.sink.enter_speculation();
        self.cursor.reset(mark);

        let value = rule(self);

        self.cursor.reset(resume);
        self.sink.exit_speculation();
        self.recovery = recovery;
        self.speculation_failed = outer_failed;
        value
    }

    pub(crate) fn mark(&self) -> Mark {
        self.cursor.mark()
    }

    /// Enters one nesting level; false once the configured limit is exceeded.
    pub(crate) fn enter(&mut self) -> bool {
        self.depth += 1;
        self.depth <= self.config.max_nesting_depth
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
