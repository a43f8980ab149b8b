//! Expression parsing.
//!
//! Binary operators are parsed by precedence climbing over
//! [`BinaryOp::precedence`]; `instanceof` sits on the relational level. The
//! lexer emits every `>` on its own, so shift operators are recognized here as
//! runs of adjacent `>` tokens.
//!
//! A `(` is ambiguous between a parenthesized expression, a cast and a lambda
//! parameter list. Lambdas are recognized by scanning for the matching `)`
//! followed by `->`; casts by speculatively parsing a type followed by `)`.

use crate::ast::{
    BinaryOp, LambdaParams, LiteralKind, Name, PrimitiveKind, ReferenceMode, Tree, TreeKind,
    UnaryOp, VarKind,
};
use crate::diag::DiagnosticCode;
use crate::lexer::token::TokenKind;
use crate::parser::recovery::DeepRegion;
use crate::parser::{PResult, Parser, Rule};
use smol_str::SmolStr;

/// What a `(` at the current position opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParenKind {
    Parens,
    Cast,
    ImplicitLambda,
    ExplicitLambda,
}

impl Parser<'_> {
    /// A full expression: assignment, conditional, or lambda.
    pub(crate) fn parse_expression(&mut self) -> Tree {
        if !self.enter() {
            let tree = self.skip_too_deep();
            self.leave();
            return tree;
        }
        let tree = self.parse_assignment();
        self.leave();
        tree
    }

    /// A conditional expression in which `x ->` is not read as a lambda, for
    /// case labels.
    pub(crate) fn parse_expression_no_lambda(&mut self) -> Tree {
        let saved = std::mem::replace(&mut self.no_lambda, true);
        let tree = self.parse_ternary();
        self.no_lambda = saved;
        tree
    }

    /// An expression or a `{...}` array initializer.
    pub(crate) fn parse_variable_initializer(&mut self) -> Tree {
        if self.at(TokenKind::LBrace) {
            self.parse_array_initializer()
        } else {
            self.parse_expression()
        }
    }

    fn parse_assignment(&mut self) -> Tree {
        let lhs = self.parse_ternary();
        let Some((op, width)) = self.assignment_operator() else {
            return lhs;
        };
        let op_pos = self.start();
        for _ in 0..width {
            self.bump();
        }
        let rhs = self.parse_expression();
        let start = self.start_of(&lhs, op_pos);
        let kind = match op {
            None => TreeKind::Assignment {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Some(op) => TreeKind::CompoundAssignment {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        };
        self.finish(kind, start, op_pos)
    }

    /// The assignment operator at the current token and how many tokens it
    /// spans. `None` inside means plain `=`.
    fn assignment_operator(&self) -> Option<(Option<BinaryOp>, usize)> {
        let op = match self.kind() {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            TokenKind::PercentEq => Some(BinaryOp::Rem),
            TokenKind::AmpEq => Some(BinaryOp::BitAnd),
            TokenKind::PipeEq => Some(BinaryOp::BitOr),
            TokenKind::CaretEq => Some(BinaryOp::BitXor),
            TokenKind::LtLtEq => Some(BinaryOp::Shl),
            TokenKind::Gt => {
                if self.adjacent(1) && self.peek_kind(1) == TokenKind::GtEq {
                    return Some((Some(BinaryOp::Shr), 2));
                }
                if self.adjacent(1)
                    && self.adjacent(2)
                    && self.peek_kind(1) == TokenKind::Gt
                    && self.peek_kind(2) == TokenKind::GtEq
                {
                    return Some((Some(BinaryOp::UShr), 3));
                }
                return None;
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_ternary(&mut self) -> Tree {
        let cond = self.parse_binary(1);
        if !self.at(TokenKind::Question) {
            return cond;
        }
        let question = self.bump().span.start;
        let then_expr = self.parse_expression();
        self.accept(TokenKind::Colon);
        let else_expr = if self.enter() {
            self.parse_ternary()
        } else {
            self.skip_too_deep_in(DeepRegion::Operand)
        };
        self.leave();
        let start = self.start_of(&cond, question);
        self.finish(
            TreeKind::Conditional {
                cond: Box::new(cond),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            start,
            question,
        )
    }

    fn parse_binary(&mut self, min_prec: u8) -> Tree {
        let mut lhs = self.parse_unary();
        loop {
            if self.at(TokenKind::Instanceof) {
                if BinaryOp::Lt.precedence() < min_prec {
                    break;
                }
                lhs = self.parse_instanceof(lhs);
                continue;
            }
            let Some((op, width)) = self.binary_operator() else {
                break;
            };
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            let op_pos = self.start();
            for _ in 0..width {
                self.bump();
            }
            let rhs = self.parse_binary(prec + 1);
            let start = self.start_of(&lhs, op_pos);
            lhs = self.finish(
                TreeKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                start,
                op_pos,
            );
        }
        lhs
    }

    /// The binary operator at the current token and how many tokens it spans.
    fn binary_operator(&self) -> Option<(BinaryOp, usize)> {
        let op = match self.kind() {
            TokenKind::PipePipe => BinaryOp::Or,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::EqEq => BinaryOp::Eq,
            TokenKind::BangEq => BinaryOp::Ne,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::LtEq => BinaryOp::Le,
            TokenKind::GtEq => BinaryOp::Ge,
            TokenKind::LtLt => BinaryOp::Shl,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Gt => {
                if !self.adjacent(1) {
                    return Some((BinaryOp::Gt, 1));
                }
                return match (self.peek_kind(1), self.peek_kind(2)) {
                    (TokenKind::GtEq, _) => None,
                    (TokenKind::Gt, TokenKind::GtEq) if self.adjacent(2) => None,
                    (TokenKind::Gt, TokenKind::Gt) if self.adjacent(2) => Some((BinaryOp::UShr, 3)),
                    (TokenKind::Gt, _) => Some((BinaryOp::Shr, 2)),
                    _ => Some((BinaryOp::Gt, 1)),
                };
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_instanceof(&mut self, expr: Tree) -> Tree {
        let keyword = self.bump().span.start;
        let start = self.start_of(&expr, keyword);
        let pattern = if self.at(TokenKind::Final) || self.at(TokenKind::At) {
            let pattern_mark = self.mark();
            match self.parse_pattern() {
                Ok(pattern) => pattern,
                Err(event) => self.recover_from(pattern_mark, event, Vec::new()),
            }
        } else {
            let target = self.type_or_error();
            if self.at(TokenKind::Identifier) {
                self.finish_binding(target, None)
            } else {
                target
            }
        };
        self.finish(
            TreeKind::InstanceOf {
                expr: Box::new(expr),
                pattern: Box::new(pattern),
            },
            start,
            keyword,
        )
    }

    /// `[final] Type name` as a binding pattern.
    pub(crate) fn parse_pattern(&mut self) -> PResult<Tree> {
        let modifiers = self.parse_modifiers();
        let var_type = self.parse_type()?;
        if !self.at(TokenKind::Identifier) {
            return Err(self.expected_event(Rule::Expression, &[TokenKind::Identifier]));
        }
        Ok(self.finish_binding(var_type, Some(modifiers)))
    }

    /// Completes a binding pattern whose type has been parsed; the current
    /// token is its name.
    fn finish_binding(&mut self, var_type: Tree, modifiers: Option<Tree>) -> Tree {
        let type_start = self.start_of(&var_type, self.start());
        let modifiers = match modifiers {
            Some(modifiers) => modifiers,
            None => self.empty_modifiers(),
        };
        let start = self.start_of(&modifiers, type_start);
        let name = self.ident_or_error(Rule::Expression);
        let var = self.finish(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: Some(Box::new(var_type)),
                name: name.node,
                init: None,
                kind: VarKind::Binding,
            },
            start,
            name.span.start,
        );
        self.finish_at(TreeKind::BindingPattern { var: Box::new(var) }, start)
    }

    fn parse_unary(&mut self) -> Tree {
        let op = match self.kind() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::Complement,
            TokenKind::PlusPlus => UnaryOp::PreIncrement,
            TokenKind::MinusMinus => UnaryOp::PreDecrement,
            TokenKind::LParen => return self.parse_paren_start(),
            _ => return self.parse_postfix_expression(),
        };
        if !self.enter() {
            let tree = self.skip_too_deep();
            self.leave();
            return tree;
        }
        let op_pos = self.bump().span.start;
        let arg = self.parse_unary();
        self.leave();
        self.finish(
            TreeKind::Unary {
                op,
                arg: Box::new(arg),
            },
            op_pos,
            op_pos,
        )
    }

    /// Casts and lambdas bind looser than selectors, so they are handled here
    /// rather than as primaries.
    fn parse_paren_start(&mut self) -> Tree {
        let open = self.start();
        match self.analyze_parens() {
            ParenKind::ImplicitLambda => self.parse_lambda(LambdaParams::Implicit),
            ParenKind::ExplicitLambda => self.parse_lambda(LambdaParams::Explicit),
            // A candidate only; anything that fails as a cast is re-read as parens.
            ParenKind::Cast => match self.speculate(Self::parse_cast_header) {
                Some(target) => {
                    let expr = if self.enter() {
                        self.parse_unary()
                    } else {
                        self.skip_too_deep_in(DeepRegion::Operand)
                    };
                    self.leave();
                    self.finish_at(
                        TreeKind::TypeCast {
                            target: Box::new(target),
                            expr: Box::new(expr),
                        },
                        open,
                    )
                }
                None => self.parse_postfix_expression(),
            },
            ParenKind::Parens => self.parse_postfix_expression(),
        }
    }

    fn analyze_parens(&mut self) -> ParenKind {
        let next = self.peek_kind(1);
        if !self.no_lambda {
            match (next, self.peek_kind(2), self.peek_kind(3)) {
                (TokenKind::RParen, _, _) => return ParenKind::ImplicitLambda,
                (TokenKind::Identifier, TokenKind::Comma, _) => return ParenKind::ImplicitLambda,
                (TokenKind::Identifier, TokenKind::RParen, TokenKind::Arrow) => {
                    return ParenKind::ImplicitLambda;
                }
                _ => {}
            }
            if let Some(close) = self.matching_paren() {
                if self.peek_kind(close + 1) == TokenKind::Arrow {
                    return ParenKind::ExplicitLambda;
                }
            }
        }
        if next == TokenKind::Identifier || PrimitiveKind::from_token(next).is_some() {
            return ParenKind::Cast;
        }
        ParenKind::Parens
    }

    /// Lookahead distance of the `)` matching the current `(`, if it closes
    /// before the end of the statement.
    fn matching_paren(&self) -> Option<usize> {
        let mut depth = 0usize;
        let mut k = 0usize;
        loop {
            match self.peek_kind(k) {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(k);
                    }
                }
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace | TokenKind::Eof => {
                    return None;
                }
                _ => {}
            }
            k += 1;
        }
    }

    /// `( Type )` followed by something a cast can apply to.
    fn parse_cast_header(&mut self) -> PResult<Tree> {
        let open = self.expect(TokenKind::LParen, Rule::Expression)?.span.start;
        let first = self.parse_type()?;
        let target = if self.at(TokenKind::Amp) {
            let mut bounds = vec![first];
            while self.eat(TokenKind::Amp).is_some() {
                bounds.push(self.parse_type()?);
            }
            let start = self.start_of(&bounds[0], open);
            self.finish_at(TreeKind::IntersectionType { bounds }, start)
        } else {
            first
        };
        self.expect(TokenKind::RParen, Rule::Expression)?;
        let primitive = matches!(target.kind, TreeKind::PrimitiveType { .. });
        if primitive || self.at_cast_operand_start() {
            Ok(target)
        } else {
            Err(self.illegal_event(Rule::Expression, DiagnosticCode::IllegalStartOfExpr))
        }
    }

    fn at_cast_operand_start(&self) -> bool {
        let kind = self.kind();
        kind.is_literal()
            || PrimitiveKind::from_token(kind).is_some()
            || matches!(
                kind,
                TokenKind::Identifier
                    | TokenKind::LParen
                    | TokenKind::Bang
                    | TokenKind::Tilde
                    | TokenKind::This
                    | TokenKind::Super
                    | TokenKind::New
                    | TokenKind::Switch
            )
    }

    fn parse_lambda(&mut self, param_kind: LambdaParams) -> Tree {
        let start = self.start();
        let params = match param_kind {
            LambdaParams::Explicit => self.parse_formal_parameters(VarKind::LambdaParameter),
            LambdaParams::Implicit if self.at(TokenKind::Identifier) => {
                vec![self.implicit_lambda_param()]
            }
            LambdaParams::Implicit => {
                self.bump();
                let mut params = Vec::new();
                if !self.at(TokenKind::RParen) {
                    loop {
                        params.push(self.implicit_lambda_param());
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.accept(TokenKind::RParen);
                params
            }
        };
        let arrow = self.start();
        self.accept(TokenKind::Arrow);
        let body = if self.at(TokenKind::LBrace) {
            self.parse_block()
        } else {
            self.parse_expression()
        };
        self.finish(
            TreeKind::Lambda {
                params,
                param_kind,
                body: Box::new(body),
            },
            start,
            arrow,
        )
    }

    fn implicit_lambda_param(&mut self) -> Tree {
        let name = self.ident_or_error(Rule::Parameters);
        let modifiers = self.empty_modifiers();
        self.spanned(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: None,
                name: name.node,
                init: None,
                kind: VarKind::LambdaParameter,
            },
            name.span.clone(),
            name.span.start,
        )
    }

    fn parse_postfix_expression(&mut self) -> Tree {
        let primary = self.parse_primary();
        self.parse_selectors(primary)
    }

    fn parse_primary(&mut self) -> Tree {
        let start = self.start();
        let kind = self.kind();

        if let Some(literal) = LiteralKind::from_token(kind) {
            let token = self.bump();
            return self.spanned(
                TreeKind::Literal {
                    kind: literal,
                    text: token.text,
                },
                token.span,
                start,
            );
        }
        if PrimitiveKind::from_token(kind).is_some() {
            return self.parse_primitive_class_literal();
        }

        match kind {
            TokenKind::Identifier => {
                if !self.no_lambda && self.peek_kind(1) == TokenKind::Arrow {
                    return self.parse_lambda(LambdaParams::Implicit);
                }
                let token = self.bump();
                self.spanned(TreeKind::Identifier { name: token.text }, token.span, start)
            }
            TokenKind::This | TokenKind::Super => {
                let token = self.bump();
                let name = Name::new_static(kind.spelling());
                self.spanned(TreeKind::Identifier { name }, token.span, start)
            }
            TokenKind::LParen => {
                if !self.enter() {
                    let tree = self.skip_too_deep();
                    self.leave();
                    return tree;
                }
                self.bump();
                let saved = std::mem::replace(&mut self.no_lambda, false);
                let expr = self.parse_expression();
                self.no_lambda = saved;
                self.accept(TokenKind::RParen);
                self.leave();
                self.finish_at(TreeKind::Parens { expr: Box::new(expr) }, start)
            }
            TokenKind::New => self.parse_creator(None),
            TokenKind::Switch => self.parse_switch_expression(),
            _ => self.illegal(DiagnosticCode::IllegalStartOfExpr),
        }
    }

    /// `int.class`, `int[].class`, `int[]::new`.
    fn parse_primitive_class_literal(&mut self) -> Tree {
        let start = self.start();
        let ty = self.type_or_error();
        if self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Class {
            let dot = self.bump().span.start;
            self.bump();
            return self.finish(
                TreeKind::MemberSelect {
                    expr: Box::new(ty),
                    name: Name::new_static("class"),
                },
                start,
                dot,
            );
        }
        if self.at(TokenKind::ColonColon) {
            return ty;
        }
        self.syntax_error(start, vec![ty], DiagnosticCode::IllegalStartOfExpr, Vec::new())
    }

    fn parse_selectors(&mut self, mut expr: Tree) -> Tree {
        loop {
            let start = self.start_of(&expr, self.start());
            match self.kind() {
                TokenKind::Dot => {
                    let dot = self.start();
                    match self.peek_kind(1) {
                        TokenKind::Identifier | TokenKind::Class | TokenKind::This | TokenKind::Super => {
                            self.bump();
                            let token = self.bump();
                            expr = self.finish(
                                TreeKind::MemberSelect {
                                    expr: Box::new(expr),
                                    name: token.text,
                                },
                                start,
                                dot,
                            );
                        }
                        TokenKind::New => {
                            self.bump();
                            expr = self.parse_creator(Some(expr));
                        }
                        TokenKind::Lt => {
                            let args_mark = self.mark();
                            self.bump();
                            let type_args = match self.parse_type_arguments(false) {
                                Ok(args) => args,
                                Err(event) => return self.recover_from(args_mark, event, vec![expr]),
                            };
                            let name = self.ident_or_error(Rule::Expression);
                            let method = self.finish(
                                TreeKind::MemberSelect {
                                    expr: Box::new(expr),
                                    name: name.node,
                                },
                                start,
                                dot,
                            );
                            if !self.at(TokenKind::LParen) {
                                let pos = self.prev_end();
                                return self.syntax_error(
                                    pos,
                                    vec![method],
                                    DiagnosticCode::Expected,
                                    vec![SmolStr::new(TokenKind::LParen.to_string())],
                                );
                            }
                            expr = self.parse_invocation(method, type_args);
                        }
                        _ => {
                            let mut children = vec![expr];
                            children.extend(self.skip_token());
                            let after_dot = self.prev_end();
                            return self.syntax_error(
                                after_dot,
                                children,
                                DiagnosticCode::Expected,
                                vec![SmolStr::new(TokenKind::Identifier.to_string())],
                            );
                        }
                    }
                }
                TokenKind::LParen
                    if matches!(
                        expr.kind,
                        TreeKind::Identifier { .. } | TreeKind::MemberSelect { .. }
                    ) =>
                {
                    expr = self.parse_invocation(expr, Vec::new());
                }
                TokenKind::LBracket => {
                    if self.peek_kind(1) == TokenKind::RBracket {
                        expr = self.parse_dims(expr);
                        continue;
                    }
                    let open = self.bump().span.start;
                    let index = self.parse_expression();
                    self.accept(TokenKind::RBracket);
                    expr = self.finish(
                        TreeKind::ArrayAccess {
                            expr: Box::new(expr),
                            index: Box::new(index),
                        },
                        start,
                        open,
                    );
                }
                TokenKind::ColonColon => {
                    let op = self.bump().span.start;
                    let (mode, name) = if self.eat(TokenKind::New).is_some() {
                        (ReferenceMode::New, Name::new_static("new"))
                    } else {
                        (ReferenceMode::Invoke, self.ident_or_error(Rule::Expression).node)
                    };
                    expr = self.finish(
                        TreeKind::MemberReference {
                            expr: Box::new(expr),
                            mode,
                            name,
                        },
                        start,
                        op,
                    );
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.at(TokenKind::PlusPlus) {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    let op_pos = self.bump().span.start;
                    expr = self.finish(
                        TreeKind::Unary {
                            op,
                            arg: Box::new(expr),
                        },
                        start,
                        op_pos,
                    );
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_invocation(&mut self, method: Tree, type_args: Vec<Tree>) -> Tree {
        let open = self.start();
        let start = self.start_of(&method, open);
        let args = self.parse_arguments();
        self.finish(
            TreeKind::MethodInvocation {
                type_args,
                method: Box::new(method),
                args,
            },
            start,
            open,
        )
    }

    /// `( expr, ... )`; the current token is `(`.
    pub(crate) fn parse_arguments(&mut self) -> Vec<Tree> {
        self.bump();
        let saved = std::mem::replace(&mut self.no_lambda, false);
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_expression());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.no_lambda = saved;
        self.accept(TokenKind::RParen);
        args
    }

    /// `new ...`; the current token is `new`. `enclosing` is the qualifier of
    /// `outer.new Inner()`.
    fn parse_creator(&mut self, enclosing: Option<Tree>) -> Tree {
        let new_mark = self.mark();
        let new_pos = self.bump().span.start;
        let start = match &enclosing {
            Some(outer) => self.start_of(outer, new_pos),
            None => new_pos,
        };

        let type_args = if self.at(TokenKind::Lt) {
            match self.parse_type_arguments(false) {
                Ok(args) => args,
                Err(event) => return self.recover_from(new_mark, event, enclosing.into_iter().collect()),
            }
        } else {
            Vec::new()
        };

        let class = if PrimitiveKind::from_token(self.kind()).is_some() {
            self.parse_type_no_dims()
        } else {
            self.parse_class_type(true)
        };
        let class = match class {
            Ok(class) => class,
            Err(event) => return self.recover_from(new_mark, event, enclosing.into_iter().collect()),
        };

        if self.at(TokenKind::LBracket) {
            return self.parse_array_creator(start, new_pos, class);
        }

        if self.at(TokenKind::LParen) {
            let args = self.parse_arguments();
            let body = if self.at(TokenKind::LBrace) {
                Some(Box::new(self.parse_anonymous_body()))
            } else {
                None
            };
            return self.finish(
                TreeKind::NewClass {
                    enclosing: enclosing.map(Box::new),
                    type_args,
                    class: Box::new(class),
                    args,
                    body,
                },
                start,
                new_pos,
            );
        }

        let partial = self.finish(
            TreeKind::NewClass {
                enclosing: enclosing.map(Box::new),
                type_args,
                class: Box::new(class),
                args: Vec::new(),
                body: None,
            },
            start,
            new_pos,
        );
        let pos = self.prev_end();
        self.syntax_error(
            pos,
            vec![partial],
            DiagnosticCode::ExpectedOneOf,
            vec![
                SmolStr::new(TokenKind::LParen.to_string()),
                SmolStr::new(TokenKind::LBracket.to_string()),
            ],
        )
    }

    /// Dimensions and initializer of `new T[...]`. The first `[]` of a
    /// creation without dimension expressions is the creation itself; every
    /// further `[]` is part of the element type.
    fn parse_array_creator(&mut self, start: usize, new_pos: usize, class: Tree) -> Tree {
        let elem_start = self.start_of(&class, new_pos);
        let mut elem = class;
        let mut dims = Vec::new();
        let mut empty_pairs = 0usize;

        while self.at(TokenKind::LBracket) {
            if self.peek_kind(1) == TokenKind::RBracket {
                let open = self.bump().span.start;
                self.bump();
                if !dims.is_empty() || empty_pairs > 0 {
                    elem = self.finish(
                        TreeKind::ArrayType {
                            elem: Box::new(elem),
                            varargs: false,
                        },
                        elem_start,
                        open,
                    );
                }
                empty_pairs += 1;
            } else if empty_pairs == 0 {
                self.bump();
                dims.push(self.parse_expression());
                self.accept(TokenKind::RBracket);
            } else {
                break;
            }
        }

        if dims.is_empty() {
            if self.at(TokenKind::LBrace) {
                let init = self.parse_array_initializer_elements();
                return self.finish(
                    TreeKind::NewArray {
                        elem_type: Some(Box::new(elem)),
                        dims,
                        init: Some(init),
                    },
                    start,
                    new_pos,
                );
            }
            let partial = self.finish(
                TreeKind::NewArray {
                    elem_type: Some(Box::new(elem)),
                    dims,
                    init: None,
                },
                start,
                new_pos,
            );
            let pos = self.prev_end();
            return self.syntax_error(
                pos,
                vec![partial],
                DiagnosticCode::ArrayDimensionMissing,
                Vec::new(),
            );
        }

        self.finish(
            TreeKind::NewArray {
                elem_type: Some(Box::new(elem)),
                dims,
                init: None,
            },
            start,
            new_pos,
        )
    }

    /// `{ a, b, }` as an array creation without a type.
    pub(crate) fn parse_array_initializer(&mut self) -> Tree {
        if !self.enter() {
            let tree = self.skip_too_deep();
            self.leave();
            return tree;
        }
        let start = self.start();
        let init = self.parse_array_initializer_elements();
        self.leave();
        self.finish_at(
            TreeKind::NewArray {
                elem_type: None,
                dims: Vec::new(),
                init: Some(init),
            },
            start,
        )
    }

    fn parse_array_initializer_elements(&mut self) -> Vec<Tree> {
        self.bump();
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.index();
            elements.push(self.parse_variable_initializer());
            if self.eat(TokenKind::Comma).is_none() || self.index() == before {
                break;
            }
        }
        self.accept(TokenKind::RBrace);
        elements
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, Tree, TreeKind};
    use crate::parse_source;
    use crate::parser::ParseResult;

    /// Parses `expr` as the initializer of a field and returns it.
    fn parse_expr(expr: &str) -> (ParseResult, Tree) {
        let result = parse_source(&format!("class T {{ Object f = {expr}; }}"));
        let tree = {
            let TreeKind::CompilationUnit { decls, .. } = &result.unit.kind else {
                panic!("not a unit");
            };
            let TreeKind::ClassDecl(class) = &decls[0].kind else {
                panic!("not a class");
            };
            let TreeKind::VariableDecl { init, .. } = &class.members[0].kind else {
                panic!("not a field");
            };
            init.as_deref().cloned().expect("initializer")
        };
        (result, tree)
    }

    const OFFSET: usize = "class T { Object f = ".len();

    #[test]
    fn logical_and_prefers_operator_position() {
        let (result, tree) = parse_expr("a != null && a instanceof String");
        assert!(result.diagnostics.is_empty());
        let TreeKind::Binary { op, lhs, rhs } = &tree.kind else {
            panic!("expected binary, got {}", tree.shape());
        };
        assert_eq!(*op, BinaryOp::And);
        assert!(matches!(lhs.kind, TreeKind::Binary { op: BinaryOp::Ne, .. }));
        assert!(matches!(rhs.kind, TreeKind::InstanceOf { .. }));
        assert_eq!(result.preferred_of(&tree), Some(OFFSET + 10));
        assert_eq!(result.start_of(&tree), Some(OFFSET));
        assert_eq!(result.end_of(&tree), Some(OFFSET + 32));
    }

    #[test]
    fn multiplication_binds_tighter() {
        let (_, tree) = parse_expr("1 + 2 * 3");
        assert_eq!(
            tree.shape(),
            "(Binary + (Literal 1) (Binary * (Literal 2) (Literal 3)))"
        );
    }

    #[test]
    fn shifts_from_adjacent_angles() {
        let (result, tree) = parse_expr("a >> 2 >>> 1");
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            tree.shape(),
            "(Binary >>> (Binary >> (Identifier \"a\") (Literal 2)) (Literal 1))"
        );
        let (_, tree) = parse_expr("a > > 2");
        assert!(tree.contains_errors());
    }

    #[test]
    fn compound_shift_assignment() {
        let (result, tree) = parse_expr("x >>>= 3");
        assert!(result.diagnostics.is_empty());
        assert!(matches!(
            tree.kind,
            TreeKind::CompoundAssignment { op: BinaryOp::UShr, .. }
        ));
    }

    #[test]
    fn casts_and_parens() {
        let (_, tree) = parse_expr("(String) o");
        assert!(matches!(tree.kind, TreeKind::TypeCast { .. }));
        let (_, tree) = parse_expr("(a) + b");
        assert!(matches!(tree.kind, TreeKind::Binary { op: BinaryOp::Add, .. }));
        let (_, tree) = parse_expr("(int) -x");
        assert!(matches!(tree.kind, TreeKind::TypeCast { .. }));
        let (_, tree) = parse_expr("(List<String>) (Object) x");
        assert!(matches!(tree.kind, TreeKind::TypeCast { .. }));
    }

    #[test]
    fn lambda_forms() {
        let (result, tree) = parse_expr("(a, b) -> a + b");
        assert!(result.diagnostics.is_empty());
        assert!(tree.shape().starts_with("(Lambda Implicit"));
        let (_, tree) = parse_expr("(int a, String b) -> { return; }");
        assert!(tree.shape().starts_with("(Lambda Explicit"));
        let (_, tree) = parse_expr("x -> x");
        assert!(tree.shape().starts_with("(Lambda Implicit"));
        let (result, tree) = parse_expr("() -> 42");
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.preferred_of(&tree), Some(OFFSET + 3));
    }

    #[test]
    fn selectors_and_invocations() {
        let (result, tree) = parse_expr("a.b(1)[2].c::d");
        assert!(result.diagnostics.is_empty());
        assert!(matches!(tree.kind, TreeKind::MemberReference { .. }));
        let (result, tree) = parse_expr("foo.bar()");
        let TreeKind::MethodInvocation { method, .. } = &tree.kind else {
            panic!("not an invocation");
        };
        assert_eq!(result.preferred_of(method), Some(OFFSET + 3));
        assert_eq!(result.preferred_of(&tree), Some(OFFSET + 7));
    }

    #[test]
    fn creators() {
        let (result, tree) = parse_expr("new int[3][]");
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            tree.shape(),
            "(NewArray init=false (ArrayType varargs=false (PrimitiveType int)) (Literal 3))"
        );
        let (result, tree) = parse_expr("new java.util.ArrayList<>()");
        assert!(result.diagnostics.is_empty());
        assert!(matches!(tree.kind, TreeKind::NewClass { .. }));
        let (result, _) = parse_expr("new Runnable() { public void run() {} }");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn missing_parens_after_new() {
        let (result, tree) = parse_expr("new String");
        assert_eq!(result.diagnostics.len(), 1);
        let TreeKind::Erroneous { children } = &tree.kind else {
            panic!("expected erroneous, got {}", tree.shape());
        };
        assert!(matches!(children[0].kind, TreeKind::NewClass { .. }));
    }

    #[test]
    fn conditional_prefers_question_mark() {
        let (result, tree) = parse_expr("c ? 1 : 2");
        assert!(matches!(tree.kind, TreeKind::Conditional { .. }));
        assert_eq!(result.preferred_of(&tree), Some(OFFSET + 2));
    }
}
