//! Blocks and statements.

use crate::ast::{CaseKind, ERROR_NAME, Name, PrimitiveKind, Tree, TreeKind, UnaryOp, VarKind};
use crate::diag::DiagnosticCode;
use crate::lexer::token::TokenKind;
use crate::parser::declaration::DeclHead;
use crate::parser::recovery::DeepRegion;
use crate::parser::{PResult, Parser, RecoverySet, Rule};
use smol_str::SmolStr;

impl Parser<'_> {
    /// `{ ... }`; reports a missing `{` and returns an erroneous node.
    pub(crate) fn parse_block(&mut self) -> Tree {
        let start = self.start();
        self.parse_block_from(false, start)
    }

    /// A block whose node starts at `start`, which precedes the `{` for
    /// `static` initializers.
    pub(crate) fn parse_block_from(&mut self, is_static: bool, start: usize) -> Tree {
        if !self.at(TokenKind::LBrace) {
            let event = self.expected_event(Rule::Block, &[TokenKind::LBrace]);
            return self.recover(event, Vec::new());
        }
        if !self.enter() {
            let tree = self.skip_too_deep();
            self.leave();
            return tree;
        }
        self.bump();
        let mut stats = self.parse_block_statements();

        while self.at(TokenKind::Case) || self.at(TokenKind::Default) {
            let keyword = SmolStr::new_static(self.kind().spelling());
            let span = self.token().span.clone();
            self.set_error_end(span.start);
            self.report_syntax_error(span, DiagnosticCode::Orphaned, vec![keyword]);
            let cases = self.parse_switch_cases();
            stats.push(self.wrap_erroneous(cases));
        }

        self.accept(TokenKind::RBrace);
        self.leave();
        self.finish_at(TreeKind::Block { is_static, stats }, start)
    }

    /// Statements up to a `}`, `case`, `default` or the end of input.
    pub(crate) fn parse_block_statements(&mut self) -> Vec<Tree> {
        let mut stats = Vec::new();
        let mut last_error_index = None;
        loop {
            if matches!(
                self.kind(),
                TokenKind::RBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof
            ) {
                return stats;
            }
            let before = self.index();
            stats.extend(self.parse_block_statement());
            if last_error_index == Some(self.index()) {
                return stats;
            }
            if self.index() == before && !self.in_error_region() {
                let here = self.start();
                self.set_error_end(here);
            }
            if self.in_error_region() {
                stats.extend(self.skip_to_erroneous(RecoverySet::BLOCK));
                last_error_index = Some(self.index());
            }
        }
    }

    /// One block statement. Local variable declarations with several
    /// declarators produce several nodes; a `}` produces none.
    pub(crate) fn parse_block_statement(&mut self) -> Vec<Tree> {
        match self.kind() {
            TokenKind::RBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof => Vec::new(),
            TokenKind::Class | TokenKind::Interface | TokenKind::Enum => {
                let doc = self.doc_before_current();
                let modifiers = self.empty_modifiers();
                vec![self.parse_class_declaration(modifiers, doc)]
            }
            TokenKind::Final | TokenKind::Abstract | TokenKind::Strictfp | TokenKind::At => {
                let doc = self.doc_before_current();
                let modifiers_mark = self.mark();
                let modifiers = self.parse_modifiers();
                if self.at_class_start() {
                    return vec![self.parse_class_declaration(modifiers, doc)];
                }
                let type_mark = self.mark();
                let var_type = self.type_or_error();
                let head = DeclHead {
                    modifiers,
                    modifiers_mark: Some(modifiers_mark),
                    var_type,
                    type_mark,
                    doc,
                };
                self.parse_variable_declarators(head, VarKind::Local, true)
            }
            kind if kind == TokenKind::Identifier || PrimitiveKind::from_token(kind).is_some() => {
                self.parse_declaration_or_expression_statement()
            }
            _ if self.at_statement_keyword() => vec![self.parse_statement()],
            _ => vec![self.parse_expression_statement()],
        }
    }

    fn at_statement_keyword(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::LBrace
                | TokenKind::Semicolon
                | TokenKind::If
                | TokenKind::For
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Try
                | TokenKind::Switch
                | TokenKind::Synchronized
                | TokenKind::Return
                | TokenKind::Throw
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Assert
                | TokenKind::Else
                | TokenKind::Finally
                | TokenKind::Catch
        )
    }

    /// Statements that start with an identifier or a primitive type: yield,
    /// local records, labels, local variables, or expressions.
    fn parse_declaration_or_expression_statement(&mut self) -> Vec<Tree> {
        if self.at_yield_statement() {
            return vec![self.parse_yield()];
        }
        if self.at_class_start() {
            let doc = self.doc_before_current();
            let modifiers = self.empty_modifiers();
            return vec![self.parse_class_declaration(modifiers, doc)];
        }
        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Colon {
            return vec![self.parse_labeled()];
        }

        let doc = self.doc_before_current();
        let type_mark = self.mark();
        if let Some(var_type) = self.speculate(Self::parse_local_variable_type) {
            let modifiers = self.empty_modifiers();
            let head = DeclHead {
                modifiers,
                modifiers_mark: None,
                var_type,
                type_mark,
                doc,
            };
            return self.parse_variable_declarators(head, VarKind::Local, true);
        }
        vec![self.parse_expression_statement()]
    }

    /// A type followed by the name of a variable being declared.
    fn parse_local_variable_type(&mut self) -> PResult<Tree> {
        let var_type = self.parse_type()?;
        if self.at(TokenKind::Identifier) {
            Ok(var_type)
        } else {
            Err(self.expected_event(Rule::Statement, &[TokenKind::Identifier]))
        }
    }

    fn at_yield_statement(&self) -> bool {
        if !self.at_word("yield") {
            return false;
        }
        let next = self.peek_kind(1);
        match next {
            TokenKind::Identifier
            | TokenKind::New
            | TokenKind::Switch
            | TokenKind::This
            | TokenKind::Super
            | TokenKind::LParen
            | TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Plus
            | TokenKind::Minus => true,
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.peek_kind(2) != TokenKind::Semicolon
            }
            kind => kind.is_literal() || PrimitiveKind::from_token(kind).is_some(),
        }
    }

    fn parse_yield(&mut self) -> Tree {
        let start = self.bump().span.start;
        let value = self.parse_expression();
        self.accept(TokenKind::Semicolon);
        self.finish_at(TreeKind::Yield { value: Box::new(value) }, start)
    }

    fn parse_labeled(&mut self) -> Tree {
        let label = self.bump();
        let start = label.span.start;
        self.bump();
        let body = self.parse_statement_as_sub();
        self.finish_at(
            TreeKind::Labeled {
                label: label.text,
                body: Box::new(body),
            },
            start,
        )
    }

    /// An expression followed by `;`. Expressions that cannot stand alone
    /// are wrapped in an erroneous node.
    fn parse_expression_statement(&mut self) -> Tree {
        let start = self.start();
        let expr = self.parse_expression();
        let expr = self.check_statement_expression(expr);
        self.accept(TokenKind::Semicolon);
        self.finish_at(TreeKind::ExpressionStatement { expr: Box::new(expr) }, start)
    }

    fn check_statement_expression(&mut self, expr: Tree) -> Tree {
        if is_statement_expression(&expr) {
            return expr;
        }
        let span = self.span_of(&expr).unwrap_or_else(|| {
            let here = self.prev_end();
            here..here
        });
        self.report_direct(span, DiagnosticCode::NotStmt, Vec::new());
        self.wrap_erroneous(vec![expr])
    }

    /// The body of `if`, `while`, `for`, `do` and labels, where declarations
    /// are not allowed.
    pub(crate) fn parse_statement_as_sub(&mut self) -> Tree {
        if !self.enter() {
            let tree = self.skip_too_deep_in(DeepRegion::Statement);
            self.leave();
            return tree;
        }
        let tree = self.parse_sub_statement();
        self.leave();
        tree
    }

    fn parse_sub_statement(&mut self) -> Tree {
        let pos = self.start();
        let mut stats = self.parse_block_statement();
        let declared = match stats.first().map(|stat| &stat.kind) {
            None => {
                let error = self.syntax_error(
                    pos,
                    Vec::new(),
                    DiagnosticCode::IllegalStartOfStmt,
                    Vec::new(),
                );
                return self.spanned(
                    TreeKind::ExpressionStatement {
                        expr: Box::new(error),
                    },
                    pos..pos,
                    pos,
                );
            }
            Some(TreeKind::ClassDecl(_)) => Some(DiagnosticCode::ClassNotAllowed),
            Some(TreeKind::VariableDecl { .. }) => Some(DiagnosticCode::VariableNotAllowed),
            Some(_) => None,
        };
        let code = match declared {
            Some(code) => code,
            None if stats.len() == 1 => match stats.pop() {
                Some(stmt) => return stmt,
                None => DiagnosticCode::IllegalStartOfStmt,
            },
            None => DiagnosticCode::IllegalStartOfStmt,
        };
        let span = stats
            .first()
            .and_then(|first| self.span_of(first))
            .unwrap_or(pos..pos);
        self.report_direct(span, code, Vec::new());
        let error = self.wrap_erroneous(stats);
        let span = self.span_of(&error).unwrap_or(pos..pos);
        self.spanned(
            TreeKind::ExpressionStatement {
                expr: Box::new(error),
            },
            span,
            pos,
        )
    }

    /// Statements introduced by a keyword, plus blocks and `;`.
    pub(crate) fn parse_statement(&mut self) -> Tree {
        let start = self.start();
        match self.kind() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::Semicolon => {
                self.bump();
                self.finish_at(TreeKind::EmptyStatement, start)
            }
            TokenKind::If => {
                self.bump();
                let cond = self.parse_par_expression();
                let then_stmt = self.parse_statement_as_sub();
                let else_stmt = if self.eat(TokenKind::Else).is_some() {
                    Some(Box::new(self.parse_statement_as_sub()))
                } else {
                    None
                };
                self.finish_at(
                    TreeKind::If {
                        cond: Box::new(cond),
                        then_stmt: Box::new(then_stmt),
                        else_stmt,
                    },
                    start,
                )
            }
            TokenKind::While => {
                self.bump();
                let cond = self.parse_par_expression();
                let body = self.parse_statement_as_sub();
                self.finish_at(
                    TreeKind::While {
                        cond: Box::new(cond),
                        body: Box::new(body),
                    },
                    start,
                )
            }
            TokenKind::Do => {
                self.bump();
                let body = self.parse_statement_as_sub();
                self.accept(TokenKind::While);
                let cond = self.parse_par_expression();
                self.accept(TokenKind::Semicolon);
                self.finish_at(
                    TreeKind::DoWhile {
                        body: Box::new(body),
                        cond: Box::new(cond),
                    },
                    start,
                )
            }
            TokenKind::For => self.parse_for(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Switch => {
                self.bump();
                let selector = self.parse_par_expression();
                let cases = self.parse_switch_body();
                self.finish_at(
                    TreeKind::Switch {
                        selector: Box::new(selector),
                        cases,
                    },
                    start,
                )
            }
            TokenKind::Synchronized => {
                self.bump();
                let lock = self.parse_par_expression();
                let body = self.parse_block();
                self.finish_at(
                    TreeKind::Synchronized {
                        lock: Box::new(lock),
                        body: Box::new(body),
                    },
                    start,
                )
            }
            TokenKind::Return => {
                self.bump();
                let expr = if self.at(TokenKind::Semicolon) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()))
                };
                self.accept(TokenKind::Semicolon);
                self.finish_at(TreeKind::Return { expr }, start)
            }
            TokenKind::Throw => {
                self.bump();
                let expr = self.parse_expression();
                self.accept(TokenKind::Semicolon);
                self.finish_at(TreeKind::Throw { expr: Box::new(expr) }, start)
            }
            TokenKind::Break | TokenKind::Continue => {
                let keyword = self.bump().kind;
                let label = self.eat(TokenKind::Identifier).map(|token| token.text);
                self.accept(TokenKind::Semicolon);
                let kind = if keyword == TokenKind::Break {
                    TreeKind::Break { label }
                } else {
                    TreeKind::Continue { label }
                };
                self.finish_at(kind, start)
            }
            TokenKind::Assert => {
                self.bump();
                let cond = self.parse_expression();
                let detail = if self.eat(TokenKind::Colon).is_some() {
                    Some(Box::new(self.parse_expression()))
                } else {
                    None
                };
                self.accept(TokenKind::Semicolon);
                self.finish_at(
                    TreeKind::Assert {
                        cond: Box::new(cond),
                        detail,
                    },
                    start,
                )
            }
            TokenKind::Else => {
                let keyword = self.skip_token();
                self.misplaced_clause(start, keyword, DiagnosticCode::ElseWithoutIf, Self::parse_statement_as_sub)
            }
            TokenKind::Finally => {
                let keyword = self.skip_token();
                self.misplaced_clause(start, keyword, DiagnosticCode::FinallyWithoutTry, Self::parse_statement_as_sub)
            }
            TokenKind::Catch => {
                self.misplaced_clause(start, None, DiagnosticCode::CatchWithoutTry, Self::parse_catch_clause)
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Parses what follows a clause keyword that has no statement to attach
    /// to, and reports the keyword once that is done. A consumed `keyword`
    /// stays in the erroneous node as a skipped leaf.
    fn misplaced_clause(
        &mut self,
        pos: usize,
        keyword: Option<Tree>,
        code: DiagnosticCode,
        parse: impl FnOnce(&mut Self) -> Tree,
    ) -> Tree {
        let last_error = self.last_error_pos();
        let mut children: Vec<Tree> = keyword.into_iter().collect();
        children.push(parse(self));
        self.restore_last_error_pos(last_error);
        let error = self.syntax_error(pos, children, code, Vec::new());
        let span = self.span_of(&error).unwrap_or(pos..pos);
        self.spanned(
            TreeKind::ExpressionStatement {
                expr: Box::new(error),
            },
            span,
            pos,
        )
    }

    /// `( expr )` as a [`TreeKind::Parens`] node.
    pub(crate) fn parse_par_expression(&mut self) -> Tree {
        let start = self.start();
        self.accept(TokenKind::LParen);
        let expr = self.parse_expression();
        self.accept(TokenKind::RParen);
        self.finish_at(TreeKind::Parens { expr: Box::new(expr) }, start)
    }

    fn parse_for(&mut self) -> Tree {
        let start = self.bump().span.start;
        self.accept(TokenKind::LParen);
        let init = if self.at(TokenKind::Semicolon) {
            Vec::new()
        } else {
            self.parse_for_init()
        };

        if self.at(TokenKind::Colon) && init.len() == 1 {
            let is_plain_declaration = matches!(
                init[0].kind,
                TreeKind::VariableDecl { init: None, .. }
            );
            let var = if is_plain_declaration {
                init.into_iter().next()
            } else {
                self.bad_foreach_variable(init)
            };
            if let Some(var) = var {
                self.bump();
                let expr = self.parse_expression();
                self.accept(TokenKind::RParen);
                let body = self.parse_statement_as_sub();
                return self.finish_at(
                    TreeKind::ForEach {
                        var: Box::new(var),
                        expr: Box::new(expr),
                        body: Box::new(body),
                    },
                    start,
                );
            }
            return self.finish_at(TreeKind::EmptyStatement, start);
        }

        self.accept(TokenKind::Semicolon);
        let cond = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.parse_expression()))
        };
        self.accept(TokenKind::Semicolon);
        let update = if self.at(TokenKind::RParen) {
            Vec::new()
        } else {
            self.parse_statement_expressions()
        };
        self.accept(TokenKind::RParen);
        let body = self.parse_statement_as_sub();
        self.finish_at(
            TreeKind::For {
                init,
                cond,
                update,
                body: Box::new(body),
            },
            start,
        )
    }

    /// `for (x : xs)` where `x` is not a declaration: reported, and replaced
    /// by a variable named `<error>` whose type holds what was written.
    fn bad_foreach_variable(&mut self, init: Vec<Tree>) -> Option<Tree> {
        let written = init.into_iter().next()?;
        let span = self.span_of(&written);
        let pos = span.as_ref().map_or(self.start(), |span| span.start);
        self.report_direct(
            span.unwrap_or(pos..pos),
            DiagnosticCode::BadInitializer,
            Vec::new(),
        );
        let modifiers = self.empty_modifiers();
        let var_type = self.wrap_erroneous(vec![written]);
        let span = self.span_of(&var_type).unwrap_or(pos..pos);
        Some(self.spanned(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: Some(Box::new(var_type)),
                name: Name::new_static(ERROR_NAME),
                init: None,
                kind: VarKind::Local,
            },
            span,
            pos,
        ))
    }

    fn parse_for_init(&mut self) -> Vec<Tree> {
        let doc = None;
        if matches!(self.kind(), TokenKind::Final | TokenKind::At) {
            let modifiers_mark = self.mark();
            let modifiers = self.parse_modifiers();
            let type_mark = self.mark();
            let var_type = self.type_or_error();
            let head = DeclHead {
                modifiers,
                modifiers_mark: Some(modifiers_mark),
                var_type,
                type_mark,
                doc,
            };
            return self.parse_variable_declarators(head, VarKind::Local, false);
        }
        let type_mark = self.mark();
        if let Some(var_type) = self.speculate(Self::parse_local_variable_type) {
            let modifiers = self.empty_modifiers();
            let head = DeclHead {
                modifiers,
                modifiers_mark: None,
                var_type,
                type_mark,
                doc,
            };
            return self.parse_variable_declarators(head, VarKind::Local, false);
        }
        if let Some(var_type) = self.speculate(Self::parse_foreach_type) {
            return vec![self.unnamed_foreach_variable(var_type)];
        }
        self.parse_statement_expressions()
    }

    /// A type directly followed by `:`, as in `for (n : ns)`.
    fn parse_foreach_type(&mut self) -> PResult<Tree> {
        let var_type = self.parse_type()?;
        if self.at(TokenKind::Colon) {
            Ok(var_type)
        } else {
            Err(self.expected_event(Rule::Statement, &[TokenKind::Identifier]))
        }
    }

    fn unnamed_foreach_variable(&mut self, var_type: Tree) -> Tree {
        let pos = self.start_of(&var_type, self.start());
        let span = self.span_of(&var_type).unwrap_or(pos..pos);
        self.report_direct(span.clone(), DiagnosticCode::BadInitializer, Vec::new());
        let modifiers = self.empty_modifiers();
        self.spanned(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: Some(Box::new(var_type)),
                name: Name::new_static(ERROR_NAME),
                init: None,
                kind: VarKind::Local,
            },
            span,
            pos,
        )
    }

    /// Comma-separated statement expressions of a `for` header.
    fn parse_statement_expressions(&mut self) -> Vec<Tree> {
        let mut stats = Vec::new();
        loop {
            let start = self.start();
            let expr = self.parse_expression();
            let expr = self.check_statement_expression(expr);
            stats.push(self.finish_at(TreeKind::ExpressionStatement { expr: Box::new(expr) }, start));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        stats
    }

    fn parse_try(&mut self) -> Tree {
        let keyword = self.bump().span;
        let start = keyword.start;
        let resources = if self.at(TokenKind::LParen) {
            self.parse_resources()
        } else {
            Vec::new()
        };
        let body = self.parse_block();
        let mut catches = Vec::new();
        while self.at(TokenKind::Catch) {
            catches.push(self.parse_catch_clause());
        }
        let finalizer = if self.eat(TokenKind::Finally).is_some() {
            Some(Box::new(self.parse_block()))
        } else {
            None
        };
        if catches.is_empty() && finalizer.is_none() && resources.is_empty() {
            self.report_direct(keyword, DiagnosticCode::TryWithoutCatchOrFinally, Vec::new());
        }
        self.finish_at(
            TreeKind::Try {
                resources,
                body: Box::new(body),
                catches,
                finalizer,
            },
            start,
        )
    }

    /// `( resource ; ... )`; a trailing `;` is allowed.
    fn parse_resources(&mut self) -> Vec<Tree> {
        self.bump();
        let mut resources = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let before = self.index();
            resources.extend(self.parse_resource());
            if self.eat(TokenKind::Semicolon).is_none() || self.index() == before {
                break;
            }
        }
        self.accept(TokenKind::RParen);
        resources
    }

    fn parse_resource(&mut self) -> Vec<Tree> {
        if matches!(self.kind(), TokenKind::Final | TokenKind::At) {
            let modifiers_mark = self.mark();
            let modifiers = self.parse_modifiers();
            let type_mark = self.mark();
            let var_type = self.type_or_error();
            let head = DeclHead {
                modifiers,
                modifiers_mark: Some(modifiers_mark),
                var_type,
                type_mark,
                doc: None,
            };
            return self.parse_variable_declarators(head, VarKind::Resource, false);
        }
        let type_mark = self.mark();
        if let Some(var_type) = self.speculate(Self::parse_local_variable_type) {
            let modifiers = self.empty_modifiers();
            let head = DeclHead {
                modifiers,
                modifiers_mark: None,
                var_type,
                type_mark,
                doc: None,
            };
            return self.parse_variable_declarators(head, VarKind::Resource, false);
        }
        vec![self.parse_expression()]
    }

    fn parse_catch_clause(&mut self) -> Tree {
        let start = self.bump().span.start;
        self.accept(TokenKind::LParen);
        let modifiers = self.parse_modifiers();
        let first = self.type_or_error();
        let param_type = if self.at(TokenKind::Pipe) {
            let union_start = self.start_of(&first, start);
            let mut alternatives = vec![first];
            while self.eat(TokenKind::Pipe).is_some() {
                alternatives.push(self.type_or_error());
            }
            self.finish_at(TreeKind::UnionType { alternatives }, union_start)
        } else {
            first
        };
        let type_start = self.start_of(&param_type, start);
        let param_start = self.start_of(&modifiers, type_start);
        let name = self.ident_or_error(Rule::Statement);
        let param = self.finish(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: Some(Box::new(param_type)),
                name: name.node,
                init: None,
                kind: VarKind::CatchParameter,
            },
            param_start,
            name.span.start,
        );
        self.accept(TokenKind::RParen);
        let body = self.parse_block();
        self.finish_at(
            TreeKind::Catch {
                param: Box::new(param),
                body: Box::new(body),
            },
            start,
        )
    }

    pub(crate) fn parse_switch_expression(&mut self) -> Tree {
        let start = self.bump().span.start;
        let selector = self.parse_par_expression();
        let cases = self.parse_switch_body();
        self.finish_at(
            TreeKind::SwitchExpression {
                selector: Box::new(selector),
                cases,
            },
            start,
        )
    }

    /// `{ case ... }` of a switch statement or expression.
    fn parse_switch_body(&mut self) -> Vec<Tree> {
        if !self.accept(TokenKind::LBrace) {
            return Vec::new();
        }
        if !self.enter() {
            let tree = self.skip_too_deep();
            self.leave();
            self.accept(TokenKind::RBrace);
            return vec![tree];
        }
        let cases = self.parse_switch_cases();
        self.leave();
        self.accept(TokenKind::RBrace);
        cases
    }

    /// Case groups and rules up to the closing `}`. Anything else is skipped
    /// up to the next `case`, `default` or `}` and reported once.
    fn parse_switch_cases(&mut self) -> Vec<Tree> {
        let mut cases = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Case | TokenKind::Default => cases.push(self.parse_case()),
                TokenKind::RBrace | TokenKind::Eof => break,
                _ => {
                    let pos = self.start();
                    let mut skipped = Vec::new();
                    while !matches!(
                        self.kind(),
                        TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof
                    ) {
                        skipped.extend(self.skip_token());
                    }
                    let expected = [TokenKind::Case, TokenKind::Default, TokenKind::RBrace]
                        .iter()
                        .map(|kind| SmolStr::new(kind.to_string()))
                        .collect();
                    cases.push(self.syntax_error(pos, skipped, DiagnosticCode::ExpectedOneOf, expected));
                }
            }
        }
        cases
    }

    fn parse_case(&mut self) -> Tree {
        let start = self.start();
        let mut labels = Vec::new();
        if self.at(TokenKind::Default) {
            let token = self.bump();
            labels.push(self.spanned(TreeKind::DefaultCaseLabel, token.span, start));
        } else {
            self.bump();
            loop {
                labels.push(self.parse_case_label());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }

        let guard = if self.at_word("when") {
            self.bump();
            let guard = self.parse_expression_no_lambda();
            let guarded_pattern = matches!(
                labels.last().map(|label| &label.kind),
                Some(TreeKind::PatternCaseLabel { .. })
            );
            if !guarded_pattern {
                let span = self.span_of(&guard).unwrap_or(start..start);
                self.report_direct(span, DiagnosticCode::GuardNotAllowed, Vec::new());
            }
            Some(Box::new(guard))
        } else {
            None
        };

        let (kind, stats, body) = if self.eat(TokenKind::Arrow).is_some() {
            let body = self.parse_case_rule_body();
            (CaseKind::Rule, Vec::new(), Some(Box::new(body)))
        } else {
            self.accept_one_of(TokenKind::Colon, &[TokenKind::Colon, TokenKind::Arrow]);
            (CaseKind::Statement, self.parse_block_statements(), None)
        };

        self.finish_at(
            TreeKind::Case {
                labels,
                guard,
                kind,
                stats,
                body,
            },
            start,
        )
    }

    fn parse_case_label(&mut self) -> Tree {
        let start = self.start();
        if self.at(TokenKind::Default) {
            let token = self.bump();
            return self.spanned(TreeKind::DefaultCaseLabel, token.span, start);
        }
        if matches!(self.kind(), TokenKind::Final | TokenKind::At) {
            let pattern_mark = self.mark();
            let pattern = match self.parse_pattern() {
                Ok(pattern) => pattern,
                Err(event) => self.recover_from(pattern_mark, event, Vec::new()),
            };
            return self.finish_at(TreeKind::PatternCaseLabel { pattern: Box::new(pattern) }, start);
        }
        if let Some(pattern) = self.speculate(Self::parse_pattern) {
            return self.finish_at(TreeKind::PatternCaseLabel { pattern: Box::new(pattern) }, start);
        }
        let expr = self.parse_expression_no_lambda();
        self.finish_at(TreeKind::ConstantCaseLabel { expr: Box::new(expr) }, start)
    }

    /// What follows `->`: a block, a `throw`, or an expression and `;`.
    fn parse_case_rule_body(&mut self) -> Tree {
        match self.kind() {
            TokenKind::LBrace | TokenKind::Throw => self.parse_statement(),
            TokenKind::If
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Try
            | TokenKind::Return
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Synchronized
            | TokenKind::Assert => {
                let statement = self.parse_statement();
                let pos = self.start_of(&statement, self.prev_end());
                let span = self.span_of(&statement).unwrap_or(pos..pos);
                self.report_direct(span, DiagnosticCode::SwitchCaseUnexpectedStatement, Vec::new());
                self.wrap_erroneous(vec![statement])
            }
            _ => {
                let start = self.start();
                let expr = self.parse_expression();
                self.accept(TokenKind::Semicolon);
                self.finish_at(TreeKind::ExpressionStatement { expr: Box::new(expr) }, start)
            }
        }
    }
}

/// Expressions that may stand alone as statements.
fn is_statement_expression(expr: &Tree) -> bool {
    match &expr.kind {
        TreeKind::Assignment { .. }
        | TreeKind::CompoundAssignment { .. }
        | TreeKind::MethodInvocation { .. }
        | TreeKind::NewClass { .. }
        | TreeKind::Erroneous { .. } => true,
        TreeKind::Unary { op, .. } => matches!(
            op,
            UnaryOp::PreIncrement
                | UnaryOp::PreDecrement
                | UnaryOp::PostIncrement
                | UnaryOp::PostDecrement
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Tree, TreeKind};
    use crate::diag::DiagnosticCode;
    use crate::parse_source;
    use crate::parser::ParseResult;

    /// Parses `body` as the body of a method and returns its statements.
    fn parse_body(body: &str) -> (ParseResult, Vec<Tree>) {
        let result = parse_source(&format!("class T {{ void m() {{ {body} }} }}"));
        let stats = {
            let TreeKind::CompilationUnit { decls, .. } = &result.unit.kind else {
                panic!("not a unit");
            };
            let TreeKind::ClassDecl(class) = &decls[0].kind else {
                panic!("not a class");
            };
            let TreeKind::MethodDecl(method) = &class.members[0].kind else {
                panic!("not a method: {}", class.members[0].shape());
            };
            let Some(TreeKind::Block { stats, .. }) = method.body.as_ref().map(|b| &b.kind) else {
                panic!("no body");
            };
            stats.clone()
        };
        (result, stats)
    }

    #[test]
    fn control_flow() {
        let (result, stats) = parse_body(
            "if (a) b(); else { c(); } while (x) x--; do { } while (y); \
             for (int i = 0, j = 1; i < j; i++, j--) ; for (String s : list) use(s);",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let tags: Vec<_> = stats.iter().map(Tree::tag).collect();
        assert_eq!(tags, vec!["If", "While", "DoWhile", "For", "ForEach"]);
        let TreeKind::For { init, update, .. } = &stats[3].kind else {
            panic!("not a for loop");
        };
        assert_eq!(init.len(), 2);
        assert_eq!(update.len(), 2);
    }

    #[test]
    fn local_variables_with_several_declarators() {
        let (result, stats) = parse_body("int a = 1, b[] = {2}; List<String> xs; var v = x;");
        assert!(result.diagnostics.is_empty());
        assert_eq!(stats.len(), 4);
        let spans: Vec<_> = stats.iter().map(|s| result.span_of(s)).collect();
        // Each declarator has its own copy of the shared type, at the same position.
        let type_of = |tree: &Tree| match &tree.kind {
            TreeKind::VariableDecl { var_type, .. } => var_type.as_deref().cloned(),
            _ => None,
        };
        let (a, b) = (type_of(&stats[0]), type_of(&stats[1]));
        assert!(a.is_some() && b.is_some());
        assert!(spans.iter().all(Option::is_some));
        assert_ne!(a.map(|t| t.id), b.map(|t| t.id));
    }

    #[test]
    fn try_catch_finally() {
        let (result, stats) = parse_body(
            "try (var in = open(); out) { run(); } catch (IOException | RuntimeException e) { } finally { }",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let TreeKind::Try { resources, catches, finalizer, .. } = &stats[0].kind else {
            panic!("not a try");
        };
        assert_eq!(resources.len(), 2);
        assert_eq!(catches.len(), 1);
        assert!(finalizer.is_some());
    }

    #[test]
    fn try_without_handlers() {
        let (result, _) = parse_body("try { }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::TryWithoutCatchOrFinally);
    }

    #[test]
    fn switch_rules_and_groups() {
        let (result, stats) = parse_body(
            "switch (k) { case 1, 2 -> a(); case String s when s.isEmpty() -> { } default -> throw e; } \
             switch (k) { case A: x(); break; default: }",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert_eq!(stats.len(), 2);
        let TreeKind::Switch { cases, .. } = &stats[0].kind else {
            panic!("not a switch");
        };
        assert_eq!(cases.len(), 3);
        assert!(cases[1].shape().contains("PatternCaseLabel"));
    }

    #[test]
    fn switch_expression_with_yield() {
        let (result, _) = parse_body("int x = switch (k) { case 1: yield 2; default: yield 3; };");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        assert!(result.unit.shape().contains("(Yield (Literal 2))"));
    }

    #[test]
    fn guard_on_constant_label() {
        let (result, _) = parse_body("switch (k) { case 1 when b -> a(); }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::GuardNotAllowed);
    }

    #[test]
    fn declaration_as_if_body() {
        let (result, stats) = parse_body("if (a) int x = 1;");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::VariableNotAllowed);
        assert!(stats[0].contains_errors());
    }

    #[test]
    fn expression_that_is_not_a_statement() {
        let (result, stats) = parse_body("a + b;");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::NotStmt);
        assert!(stats[0].contains_errors());
    }

    #[test]
    fn catch_without_try() {
        let (result, stats) = parse_body("catch (Exception e) { }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::CatchWithoutTry);
        assert!(stats[0].shape().contains("(Catch"));
    }

    #[test]
    fn labels_and_jumps() {
        let (result, stats) = parse_body("outer: for (;;) { break outer; }");
        assert!(result.diagnostics.is_empty());
        assert!(matches!(&stats[0].kind, TreeKind::Labeled { label, .. } if label == "outer"));
    }
}
