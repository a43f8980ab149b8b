//! Error recovery strategies and synchronization.
//!
//! A failed rule either returns a [`RecoveryEvent`] to its caller or, where
//! the grammar has an obvious place to resume, reports and keeps going inline.
//! Either way the caller ends up with exactly one reported diagnostic and a
//! [`TreeKind::Erroneous`] node holding whatever was salvaged, plus any tokens
//! skipped to reach a synchronization point.
//!
//! Reporting follows two rules that keep cascades down:
//! - an error is only reported if it lies strictly after the last reported
//!   syntax error;
//! - an error reported while the parser sits on EOF is reported as premature
//!   end of input instead.

use crate::ast::{Span, Tree, TreeKind};
use crate::diag::{Diag, DiagnosticCode};
use crate::lexer::classify_malformed;
use crate::lexer::token::{Token, TokenKind};
use crate::parser::{Mark, Parser};
use log::{debug, warn};
use smol_str::SmolStr;

/// Grammar rule in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    CompilationUnit,
    Import,
    TypeDeclaration,
    ClassBody,
    EnumBody,
    Member,
    Parameters,
    Block,
    Statement,
    Expression,
    Arguments,
    Type,
    TypeArguments,
    Annotation,
    Switch,
}

/// Failure signal raised by a rule and handled by the nearest enclosing rule
/// that can resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEvent {
    pub rule: Rule,
    pub code: DiagnosticCode,
    pub expected: Vec<TokenKind>,
    pub found: TokenKind,
    /// Offset the diagnostic points at.
    pub position: usize,
    /// Extent the diagnostic covers; empty for a missing token.
    pub span: Span,
}

impl RecoveryEvent {
    pub fn args(&self) -> Vec<SmolStr> {
        self.expected
            .iter()
            .map(|kind| SmolStr::new(kind.to_string()))
            .collect()
    }
}

/// Where [`Parser::skip`] stops.
///
/// A `;` is always consumed and ends the skip. The tokens in `ALWAYS` (type
/// declaration starters and EOF) always stop it; the flags add more stop
/// tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverySet {
    pub stop_at_import: bool,
    pub stop_at_member: bool,
    pub stop_at_identifier: bool,
    pub stop_at_statement: bool,
}

const ALWAYS: &[TokenKind] = &[
    TokenKind::Public,
    TokenKind::Final,
    TokenKind::Abstract,
    TokenKind::At,
    TokenKind::Eof,
    TokenKind::Class,
    TokenKind::Interface,
    TokenKind::Enum,
];

const MEMBER: &[TokenKind] = &[
    TokenKind::LBrace,
    TokenKind::RBrace,
    TokenKind::Private,
    TokenKind::Protected,
    TokenKind::Static,
    TokenKind::Transient,
    TokenKind::Native,
    TokenKind::Volatile,
    TokenKind::Synchronized,
    TokenKind::Strictfp,
    TokenKind::Lt,
    TokenKind::Byte,
    TokenKind::Short,
    TokenKind::Char,
    TokenKind::Int,
    TokenKind::Long,
    TokenKind::Float,
    TokenKind::Double,
    TokenKind::Boolean,
    TokenKind::Void,
];

const STATEMENT: &[TokenKind] = &[
    TokenKind::Case,
    TokenKind::Default,
    TokenKind::If,
    TokenKind::For,
    TokenKind::While,
    TokenKind::Do,
    TokenKind::Try,
    TokenKind::Switch,
    TokenKind::Return,
    TokenKind::Throw,
    TokenKind::Break,
    TokenKind::Continue,
    TokenKind::Else,
    TokenKind::Finally,
    TokenKind::Catch,
    TokenKind::This,
    TokenKind::Super,
    TokenKind::New,
    TokenKind::Assert,
];

impl RecoverySet {
    /// Between type declarations, before any has been seen.
    pub const IMPORTS: Self = Self {
        stop_at_import: true,
        stop_at_member: false,
        stop_at_identifier: false,
        stop_at_statement: false,
    };
    /// Between type declarations.
    pub const TOP_LEVEL: Self = Self {
        stop_at_import: false,
        stop_at_member: false,
        stop_at_identifier: false,
        stop_at_statement: false,
    };
    pub const CLASS_BODY: Self = Self {
        stop_at_import: false,
        stop_at_member: true,
        stop_at_identifier: false,
        stop_at_statement: false,
    };
    pub const ENUM_BODY: Self = Self {
        stop_at_import: false,
        stop_at_member: true,
        stop_at_identifier: true,
        stop_at_statement: false,
    };
    pub const BLOCK: Self = Self {
        stop_at_import: false,
        stop_at_member: true,
        stop_at_identifier: true,
        stop_at_statement: true,
    };

    pub fn stops_at(&self, kind: TokenKind) -> bool {
        ALWAYS.contains(&kind)
            || (self.stop_at_import && kind == TokenKind::Import)
            || (self.stop_at_member && MEMBER.contains(&kind))
            || (self.stop_at_identifier && kind == TokenKind::Identifier)
            || (self.stop_at_statement && STATEMENT.contains(&kind))
    }
}

/// Bookkeeping for cascade suppression and the retry bound.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RecoveryState {
    /// Offset of the last reported syntax error.
    last_error_pos: Option<usize>,
    /// Furthest offset known to be covered by an error.
    error_end: Option<usize>,
    /// Token index of the last reported error and how often it repeated.
    retry_index: Option<usize>,
    retries: u32,
    force_progress: bool,
    /// Premature end of input is reported once per parse.
    eof_reported: bool,
}

/// What a region skipped at the nesting limit extends over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeepRegion {
    /// A leading bracketed group, or up to `;`, `,` or an unbalanced closer.
    Nested,
    /// Up to `;`, `,` or an unbalanced closer, past any parenthesized groups.
    Operand,
    /// As `Operand`, with `<` and `>` nesting as well.
    TypeArgument,
    /// A whole statement, together with the `else` branches that follow it.
    Statement,
}

impl Parser<'_> {
    /// True if an error has been recorded at or beyond the current token.
    pub(crate) fn in_error_region(&self) -> bool {
        self.recovery
            .error_end
            .is_some_and(|end| self.start() <= end)
    }

    pub(crate) fn set_error_end(&mut self, pos: usize) {
        let end = self.recovery.error_end.map_or(pos, |end| end.max(pos));
        self.recovery.error_end = Some(end);
    }

    pub(crate) fn last_error_pos(&self) -> Option<usize> {
        self.recovery.last_error_pos
    }

    /// Resets cascade suppression to an earlier point, so an error found
    /// after parsing what follows it can still be reported.
    pub(crate) fn restore_last_error_pos(&mut self, pos: Option<usize>) {
        self.recovery.last_error_pos = pos;
    }

    /// Reports a syntax error unless it cascades from the previous one.
    pub(crate) fn report_syntax_error(&mut self, span: Span, code: DiagnosticCode, args: Vec<SmolStr>) {
        self.report_syntax_diag(Diag::syntax(code, span, args));
    }

    /// [`Parser::report_syntax_error`] for a diagnostic built by the caller.
    /// At end of input it is replaced by a premature EOF error.
    fn report_syntax_diag(&mut self, diag: Diag) {
        let pos = diag.span.start;
        if self.sink.is_speculating() {
            self.speculation_failed = true;
        }

        let is_new = self.recovery.last_error_pos.is_none_or(|last| pos > last)
            && !(self.at_eof() && self.recovery.eof_reported);
        if is_new {
            let diag = if self.at_eof() {
                self.recovery.eof_reported = true;
                Diag::syntax(DiagnosticCode::PrematureEof, diag.span, Vec::new())
            } else {
                diag
            };
            debug!("syntax error {} at {}", diag.code, pos);
            self.sink.push(diag);
        }
        let last = self.recovery.last_error_pos;
        self.recovery.last_error_pos = Some(last.map_or(pos, |last| last.max(pos)));

        let index = self.cursor.index();
        if self.recovery.retry_index == Some(index) && !self.at_eof() {
            self.recovery.retries += 1;
            if self.recovery.retries > self.config.recovery_threshold {
                warn!(
                    "{} errors at offset {}, forcing the token to be consumed",
                    self.recovery.retries,
                    self.start()
                );
                self.recovery.force_progress = true;
                self.recovery.retries = 0;
            }
        } else {
            self.recovery.retry_index = Some(index);
            self.recovery.retries = 0;
        }
    }

    /// Reports a diagnostic that is not subject to cascade suppression:
    /// structural errors found after the construct was parsed successfully.
    pub(crate) fn report_direct(&mut self, span: Span, code: DiagnosticCode, args: Vec<SmolStr>) {
        if self.sink.is_speculating() {
            self.speculation_failed = true;
        }
        debug!("structural error {} at {}", code, span.start);
        self.sink.push(Diag::syntax(code, span, args));
    }

    /// Event for a missing token, pointing just past the previous token.
    pub(crate) fn expected_event(&self, rule: Rule, expected: &[TokenKind]) -> RecoveryEvent {
        let position = self.prev_end();
        let code = if expected.len() == 1 {
            DiagnosticCode::Expected
        } else {
            DiagnosticCode::ExpectedOneOf
        };
        RecoveryEvent {
            rule,
            code,
            expected: expected.to_vec(),
            found: self.kind(),
            position,
            span: position..position,
        }
    }

    /// Event for a token that cannot start the construct at hand.
    pub(crate) fn illegal_event(&self, rule: Rule, code: DiagnosticCode) -> RecoveryEvent {
        let span = self.token().span.clone();
        RecoveryEvent {
            rule,
            code,
            expected: Vec::new(),
            found: self.kind(),
            position: span.start,
            span,
        }
    }

    /// Reports an event and marks the current token as inside the error region.
    pub(crate) fn report_event(&mut self, event: &RecoveryEvent) {
        let args = event.args();
        self.report_syntax_error(event.span.clone(), event.code, args);
        let here = self.start();
        self.set_error_end(here.max(event.position));
    }

    /// Consumes `kind` or reports it missing just past the previous token.
    pub(crate) fn accept(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind).is_some() {
            return true;
        }
        let event = self.expected_event(self.rule_hint(kind), &[kind]);
        self.report_event(&event);
        false
    }

    /// Like [`Parser::accept`] with several acceptable tokens named in the diagnostic.
    pub(crate) fn accept_one_of(&mut self, kind: TokenKind, named: &[TokenKind]) -> bool {
        if self.eat(kind).is_some() {
            return true;
        }
        let event = self.expected_event(self.rule_hint(kind), named);
        self.report_event(&event);
        false
    }

    fn rule_hint(&self, kind: TokenKind) -> Rule {
        match kind {
            TokenKind::RBrace => Rule::Block,
            TokenKind::RParen => Rule::Arguments,
            TokenKind::Gt => Rule::TypeArguments,
            TokenKind::Identifier => Rule::Type,
            _ => Rule::Statement,
        }
    }

    /// Consumes the current token into a [`TreeKind::Skipped`] leaf. EOF is
    /// never consumed.
    pub(crate) fn skip_token(&mut self) -> Option<Tree> {
        if self.at_eof() {
            return None;
        }
        let token = self.bump();
        Some(self.skipped_leaf(token))
    }

    fn skipped_leaf(&mut self, token: Token) -> Tree {
        let start = token.span.start;
        self.spanned(
            TreeKind::Skipped {
                token: token.kind,
                text: token.text,
            },
            token.span,
            start,
        )
    }

    /// Skips to the next synchronization point of `set`.
    ///
    /// A `;` is consumed and ends the skip. The skipped tokens are returned as
    /// leaves, in order.
    pub(crate) fn skip(&mut self, set: RecoverySet) -> Vec<Tree> {
        let mut skipped = Vec::new();
        loop {
            let kind = self.kind();
            if kind == TokenKind::Semicolon {
                skipped.extend(self.skip_token());
                break;
            }
            if set.stops_at(kind) {
                break;
            }
            match self.skip_token() {
                Some(leaf) => skipped.push(leaf),
                None => break,
            }
        }
        if !skipped.is_empty() {
            debug!("skipped {} tokens to resynchronize", skipped.len());
        }
        skipped
    }

    /// Skips to `set` and wraps what was skipped into one erroneous node.
    ///
    /// No diagnostic is reported: the error that put the parser out of sync
    /// already was.
    pub(crate) fn skip_to_erroneous(&mut self, set: RecoverySet) -> Option<Tree> {
        let skipped = self.skip(set);
        if skipped.is_empty() {
            None
        } else {
            Some(self.wrap_erroneous(skipped))
        }
    }

    /// Wraps salvaged nodes into an erroneous node spanning all of them.
    pub(crate) fn wrap_erroneous(&mut self, children: Vec<Tree>) -> Tree {
        let span = self.children_span(&children).unwrap_or_else(|| {
            let here = self.start();
            here..here
        });
        let start = span.start;
        self.spanned(TreeKind::Erroneous { children }, span, start)
    }

    fn children_span(&self, children: &[Tree]) -> Option<Span> {
        children
            .iter()
            .filter_map(|child| self.span_of(child))
            .reduce(|a, b| a.start.min(b.start)..a.end.max(b.end))
    }

    /// Reports `code` at `pos` and returns an erroneous node holding `children`.
    ///
    /// If the retry bound has been hit, the current token is consumed into the
    /// node as well so the parse is guaranteed to move.
    pub(crate) fn syntax_error(
        &mut self,
        pos: usize,
        children: Vec<Tree>,
        code: DiagnosticCode,
        args: Vec<SmolStr>,
    ) -> Tree {
        let diag = Diag::syntax(code, self.error_span(pos), args);
        self.erroneous_with(pos, children, diag)
    }

    /// The current token's span if it starts at `pos`, else an empty span.
    fn error_span(&self, pos: usize) -> Span {
        if pos == self.start() {
            self.token().span.clone()
        } else {
            pos..pos
        }
    }

    fn erroneous_with(&mut self, pos: usize, mut children: Vec<Tree>, diag: Diag) -> Tree {
        self.set_error_end(pos);
        self.report_syntax_diag(diag);

        if std::mem::take(&mut self.recovery.force_progress) {
            children.extend(self.skip_token());
        }

        let span = match self.children_span(&children) {
            Some(covered) => covered.start.min(pos)..covered.end.max(pos),
            None => pos..pos,
        };
        self.spanned(TreeKind::Erroneous { children }, span, pos)
    }

    /// Erroneous node for a token that cannot start an expression or type.
    ///
    /// Lexically malformed tokens are consumed into the node and reported with
    /// their lexical diagnostic; anything else is left for the caller's
    /// synchronization.
    pub(crate) fn illegal(&mut self, code: DiagnosticCode) -> Tree {
        let pos = self.start();
        if self.at(TokenKind::Error) {
            let text = self.token().text.clone();
            let code = classify_malformed(&text);
            let args = vec![
                text.chars()
                    .next()
                    .map(|c| SmolStr::new(c.to_string()))
                    .unwrap_or_default(),
            ];
            // Reported before the token is consumed, or a literal running to
            // the end of input would read as premature EOF.
            let span = self.token().span.clone();
            self.set_error_end(pos);
            self.report_syntax_error(span, code, args);
            self.recovery.force_progress = false;
            let leaf = self.skip_token().into_iter().collect();
            return self.wrap_erroneous(leaf);
        }
        self.syntax_error(pos, Vec::new(), code, Vec::new())
    }

    /// Recovers from `event` by reporting it and returning an erroneous node
    /// around `salvaged`.
    pub(crate) fn recover(&mut self, event: RecoveryEvent, salvaged: Vec<Tree>) -> Tree {
        if event.found == TokenKind::Error && event.code != DiagnosticCode::Expected {
            let mut node = self.illegal(event.code);
            if let TreeKind::Erroneous { children } = &mut node.kind {
                let mut all = salvaged;
                all.append(children);
                *children = all;
            }
            return node;
        }
        let args = event.args();
        let pos = event.position;
        self.syntax_error(pos, salvaged, event.code, args)
    }

    /// [`Parser::recover`] for a rule that consumed tokens since `from` before
    /// failing. Consumed tokens not already inside `salvaged` are kept as
    /// skipped leaves, in source order.
    pub(crate) fn recover_from(&mut self, from: Mark, event: RecoveryEvent, salvaged: Vec<Tree>) -> Tree {
        let kept: Vec<Span> = salvaged.iter().filter_map(|tree| self.span_of(tree)).collect();
        let lost: Vec<Token> = self
            .cursor
            .consumed_since(from)
            .iter()
            .filter(|token| token.kind != TokenKind::Eof)
            .filter(|token| {
                !kept
                    .iter()
                    .any(|span| span.start <= token.span.start && token.span.end <= span.end)
            })
            .cloned()
            .collect();
        if !lost.is_empty() {
            debug!("keeping {} consumed tokens in the recovery node", lost.len());
        }
        let mut children = salvaged;
        for token in lost {
            let leaf = self.skipped_leaf(token);
            children.push(leaf);
        }
        children.sort_by_key(|child| self.span_of(child).map_or(0, |span| span.start));
        self.recover(event, children)
    }

    /// Consumes a region that nests too deeply to parse recursively.
    ///
    /// Tokens are consumed up to the first unbalanced closer or `;` at the
    /// starting level. A region that starts with an opener ends with its
    /// matching closer.
    pub(crate) fn skip_too_deep(&mut self) -> Tree {
        self.skip_too_deep_in(DeepRegion::Nested)
    }

    /// [`Parser::skip_too_deep`] over the kind of region the caller parses.
    pub(crate) fn skip_too_deep_in(&mut self, region: DeepRegion) -> Tree {
        let pos = self.start();
        let opened = region == DeepRegion::Nested
            && matches!(
                self.kind(),
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket
            );
        let angles = region == DeepRegion::TypeArgument;
        let mut leaves = Vec::new();
        let mut depth = 0usize;
        let mut angle_depth = 0usize;
        loop {
            let kind = self.kind();
            match kind {
                TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::Lt if angles => angle_depth += 1,
                TokenKind::Gt if angles => {
                    if angle_depth == 0 {
                        break;
                    }
                    angle_depth -= 1;
                }
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    if depth == 0 && opened {
                        leaves.extend(self.skip_token());
                        break;
                    }
                    if depth == 0 && region == DeepRegion::Statement && kind == TokenKind::RBrace {
                        leaves.extend(self.skip_token());
                        if self.at(TokenKind::Else) {
                            continue;
                        }
                        break;
                    }
                }
                TokenKind::Semicolon if depth == 0 && region == DeepRegion::Statement => {
                    leaves.extend(self.skip_token());
                    if self.at(TokenKind::Else) {
                        continue;
                    }
                    break;
                }
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::Comma
                    if depth == 0 && angle_depth == 0 && region != DeepRegion::Statement =>
                {
                    break;
                }
                _ => {}
            }
            leaves.extend(self.skip_token());
        }
        warn!("nesting limit reached at offset {pos}");
        let mut diag = Diag::syntax(DiagnosticCode::TooDeeplyNested, self.error_span(pos), Vec::new())
            .with_note(format!(
                "the nesting limit is {}; raise it with `ParserConfig::with_max_nesting_depth`",
                self.config.max_nesting_depth
            ));
        if let Some(region) = self.children_span(&leaves) {
            diag = diag.with_secondary_label(region, "skipped without parsing");
        }
        self.erroneous_with(pos, leaves, diag)
    }
}
