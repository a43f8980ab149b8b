//! Names, types, type arguments and type parameters.

use crate::ast::{
    ERROR_NAME, Name, PrimitiveKind, Spanned, Tree, TreeKind, WildcardBound,
};
use crate::diag::DiagnosticCode;
use crate::lexer::token::TokenKind;
use crate::parser::recovery::DeepRegion;
use crate::parser::{PResult, Parser, Rule};

impl Parser<'_> {
    /// True if the current token can begin a type.
    pub(crate) fn at_type_start(&self) -> bool {
        self.at(TokenKind::Identifier) || PrimitiveKind::from_token(self.kind()).is_some()
    }

    pub(crate) fn ident(&mut self, rule: Rule) -> PResult<Spanned<Name>> {
        if self.at(TokenKind::Identifier) {
            let token = self.bump();
            Ok(Spanned::new(token.text, token.span))
        } else {
            Err(self.expected_event(rule, &[TokenKind::Identifier]))
        }
    }

    /// An identifier, or `<error>` with a reported diagnostic if there is none.
    pub(crate) fn ident_or_error(&mut self, rule: Rule) -> Spanned<Name> {
        match self.ident(rule) {
            Ok(name) => name,
            Err(event) => {
                self.report_event(&event);
                let pos = event.position;
                Spanned::new(Name::new_static(ERROR_NAME), pos..pos)
            }
        }
    }

    /// `a.b.c` as a chain of selects over an identifier.
    pub(crate) fn qualident(&mut self, rule: Rule) -> PResult<Tree> {
        let first = self.ident(rule)?;
        let start = first.span.start;
        let mut tree = self.spanned(TreeKind::Identifier { name: first.node }, first.span, start);
        while self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Identifier {
            let dot = self.bump().span.start;
            let name = self.ident(rule)?;
            tree = self.finish(
                TreeKind::MemberSelect {
                    expr: Box::new(tree),
                    name: name.node,
                },
                start,
                dot,
            );
        }
        Ok(tree)
    }

    /// A type, including trailing `[]` dimensions.
    pub(crate) fn parse_type(&mut self) -> PResult<Tree> {
        let elem = self.parse_type_no_dims()?;
        Ok(self.parse_dims(elem))
    }

    /// A type, or an erroneous node with a reported diagnostic.
    pub(crate) fn type_or_error(&mut self) -> Tree {
        let mark = self.mark();
        match self.parse_type() {
            Ok(tree) => tree,
            Err(event) => self.recover_from(mark, event, Vec::new()),
        }
    }

    pub(crate) fn parse_type_no_dims(&mut self) -> PResult<Tree> {
        if let Some(kind) = PrimitiveKind::from_token(self.kind()) {
            let token = self.bump();
            let start = token.span.start;
            return Ok(self.spanned(TreeKind::PrimitiveType { kind }, token.span, start));
        }
        if self.at(TokenKind::Identifier) {
            return self.parse_class_type(false);
        }
        Err(self.illegal_event(Rule::Type, DiagnosticCode::IllegalStartOfType))
    }

    /// `Outer<A>.Inner<B>`. With `allow_diamond`, `<>` is accepted as type
    /// arguments.
    pub(crate) fn parse_class_type(&mut self, allow_diamond: bool) -> PResult<Tree> {
        let first = self.ident(Rule::Type)?;
        let start = first.span.start;
        let mut tree = self.spanned(TreeKind::Identifier { name: first.node }, first.span, start);
        tree = self.parse_type_arguments_opt(tree, start, allow_diamond)?;

        while self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Identifier {
            let dot = self.bump().span.start;
            let name = self.ident(Rule::Type)?;
            tree = self.finish(
                TreeKind::MemberSelect {
                    expr: Box::new(tree),
                    name: name.node,
                },
                start,
                dot,
            );
            tree = self.parse_type_arguments_opt(tree, start, allow_diamond)?;
        }
        Ok(tree)
    }

    fn parse_type_arguments_opt(&mut self, base: Tree, start: usize, allow_diamond: bool) -> PResult<Tree> {
        if !self.at(TokenKind::Lt) {
            return Ok(base);
        }
        let open = self.start();
        let args = self.parse_type_arguments(allow_diamond)?;
        Ok(self.finish(
            TreeKind::ParameterizedType {
                base: Box::new(base),
                args,
            },
            start,
            open,
        ))
    }

    /// `<T, U>`; each `>` closes one level, so `>>` closes two.
    pub(crate) fn parse_type_arguments(&mut self, allow_diamond: bool) -> PResult<Vec<Tree>> {
        self.expect(TokenKind::Lt, Rule::TypeArguments)?;
        if allow_diamond && self.at(TokenKind::Gt) {
            self.bump();
            return Ok(Vec::new());
        }
        let mut args = vec![self.parse_type_argument()?];
        while self.eat(TokenKind::Comma).is_some() {
            args.push(self.parse_type_argument()?);
        }
        if self.eat(TokenKind::Gt).is_none() {
            return Err(self.expected_event(Rule::TypeArguments, &[TokenKind::Gt]));
        }
        Ok(args)
    }

    fn parse_type_argument(&mut self) -> PResult<Tree> {
        if !self.enter() {
            let tree = self.skip_too_deep_in(DeepRegion::TypeArgument);
            self.leave();
            return Ok(tree);
        }
        let tree = self.parse_type_argument_inner();
        self.leave();
        tree
    }

    fn parse_type_argument_inner(&mut self) -> PResult<Tree> {
        if !self.at(TokenKind::Question) {
            return self.parse_type();
        }
        let start = self.bump().span.start;
        let bound = if self.eat(TokenKind::Extends).is_some() {
            WildcardBound::Extends
        } else if self.eat(TokenKind::Super).is_some() {
            WildcardBound::Super
        } else {
            return Ok(self.finish_at(
                TreeKind::Wildcard {
                    bound: WildcardBound::Unbound,
                    inner: None,
                },
                start,
            ));
        };
        let inner = self.parse_type()?;
        Ok(self.finish_at(
            TreeKind::Wildcard {
                bound,
                inner: Some(Box::new(inner)),
            },
            start,
        ))
    }

    /// Wraps `elem` in one array type per `[]` pair.
    pub(crate) fn parse_dims(&mut self, elem: Tree) -> Tree {
        let start = self.start_of(&elem, self.start());
        let mut tree = elem;
        while self.at(TokenKind::LBracket) && self.peek_kind(1) == TokenKind::RBracket {
            let open = self.bump().span.start;
            self.bump();
            tree = self.finish(
                TreeKind::ArrayType {
                    elem: Box::new(tree),
                    varargs: false,
                },
                start,
                open,
            );
        }
        tree
    }

    /// Declared type parameters `<T extends A & B, U>`, or nothing.
    pub(crate) fn parse_type_parameters(&mut self) -> Vec<Tree> {
        if !self.at(TokenKind::Lt) {
            return Vec::new();
        }
        self.bump();
        let mut params = Vec::new();
        loop {
            let start = self.start();
            match self.ident(Rule::TypeArguments) {
                Ok(name) => {
                    let mut bounds = Vec::new();
                    if self.eat(TokenKind::Extends).is_some() {
                        loop {
                            bounds.push(self.type_or_error());
                            if self.eat(TokenKind::Amp).is_none() {
                                break;
                            }
                        }
                    }
                    params.push(self.finish(
                        TreeKind::TypeParameter {
                            name: name.node,
                            bounds,
                        },
                        start,
                        name.span.start,
                    ));
                }
                Err(event) => {
                    params.push(self.recover(event, Vec::new()));
                    break;
                }
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.accept(TokenKind::Gt);
        params
    }

    /// Comma-separated types, as in `implements` and `throws` clauses.
    pub(crate) fn parse_type_list(&mut self) -> Vec<Tree> {
        let mut types = vec![self.type_or_error()];
        while self.eat(TokenKind::Comma).is_some() {
            types.push(self.type_or_error());
        }
        types
    }
}
