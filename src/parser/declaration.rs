//! Compilation units, type declarations and their members.

use crate::ast::{
    ClassDecl, ClassKind, MethodDecl, Modifier, Name, Spanned, Tree, TreeKind, VarKind,
};
use crate::diag::DiagnosticCode;
use crate::lexer::token::TokenKind;
use crate::parser::cursor::Mark;
use crate::parser::{Parser, RecoverySet, Rule};
use smol_str::SmolStr;

/// What precedes the declarators of a field or local variable declaration.
///
/// The marks let later declarators re-parse the shared modifiers and type so
/// that every declaration owns its own copy.
pub(crate) struct DeclHead {
    pub(crate) modifiers: Tree,
    pub(crate) modifiers_mark: Option<Mark>,
    pub(crate) var_type: Tree,
    pub(crate) type_mark: Mark,
    pub(crate) doc: Option<SmolStr>,
}

/// Everything of a method declaration up to its parameter list.
struct MethodHead {
    start: usize,
    modifiers: Tree,
    type_params: Vec<Tree>,
    result: Option<Tree>,
    name: Spanned<Name>,
    doc: Option<SmolStr>,
}

/// How an enum body entry looks from its first tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumEntry {
    Constant,
    Member,
    Unknown,
}

impl Parser<'_> {
    pub(crate) fn parse_compilation_unit(&mut self) -> Tree {
        let start = self.start();
        let mut package = None;
        let mut imports = Vec::new();
        let mut decls = Vec::new();
        let mut has_members = false;
        let mut seen_type_decl = false;

        // Annotations may belong to the package declaration or to the first type.
        let mut pending = None;
        if self.at(TokenKind::At) && self.peek_kind(1) != TokenKind::Interface {
            let doc = self.doc_before_current();
            let mark = self.mark();
            let modifiers = self.parse_modifiers();
            pending = Some((modifiers, mark, doc));
        }
        if self.at(TokenKind::Package) {
            let annotations = match pending.take() {
                Some((
                    Tree {
                        kind: TreeKind::Modifiers { annotations, .. },
                        ..
                    },
                    _,
                    _,
                )) => annotations,
                _ => Vec::new(),
            };
            package = Some(Box::new(self.parse_package(annotations)));
        }

        loop {
            let set = if seen_type_decl {
                RecoverySet::TOP_LEVEL
            } else {
                RecoverySet::IMPORTS
            };
            if pending.is_none() && self.in_error_region() {
                decls.extend(self.skip_to_erroneous(set));
            }
            if self.at_eof() && pending.is_none() {
                break;
            }

            let before = self.index();
            if pending.is_none() && !seen_type_decl && self.at(TokenKind::Import) {
                imports.push(self.parse_import());
            } else if pending.is_none() && self.at(TokenKind::Semicolon) {
                self.bump();
            } else {
                seen_type_decl = true;
                let (modifiers, mark, doc) = match pending.take() {
                    Some(pending) => pending,
                    None => {
                        let doc = self.doc_before_current();
                        let mark = self.mark();
                        (self.parse_modifiers(), mark, doc)
                    }
                };
                if self.at_class_start() {
                    decls.push(self.parse_class_declaration(modifiers, doc));
                } else if self.config.allow_implicit_classes && self.at_member_start() {
                    has_members = true;
                    let class_name = self.config.implicit_class_name.clone();
                    decls.extend(self.parse_member_rest(
                        modifiers,
                        mark,
                        doc,
                        &class_name,
                        ClassKind::Class,
                    ));
                } else {
                    let pos = self.start();
                    decls.push(self.syntax_error(
                        pos,
                        vec![modifiers],
                        DiagnosticCode::ClassMethodOrFieldExpected,
                        Vec::new(),
                    ));
                }
            }

            if self.index() == before {
                if self.at_eof() {
                    break;
                }
                let resynced = if self.in_error_region() {
                    self.skip_to_erroneous(set)
                } else {
                    None
                };
                match resynced {
                    Some(skipped) => decls.push(skipped),
                    None => {
                        if let Some(leaf) = self.skip_token() {
                            decls.push(self.wrap_erroneous(vec![leaf]));
                        }
                    }
                }
            }
        }

        if has_members {
            let class = self.implicit_class(decls);
            decls = vec![class];
        }

        self.finish_at(
            TreeKind::CompilationUnit {
                package,
                imports,
                decls,
            },
            start,
        )
    }

    /// Gathers top-level members, and any types declared beside them, into
    /// one unnamed final class.
    fn implicit_class(&mut self, members: Vec<Tree>) -> Tree {
        let start = members
            .iter()
            .find_map(|member| self.span_of(member))
            .map_or(self.prev_end(), |span| span.start);
        let modifiers = self.synthetic(TreeKind::Modifiers {
            flags: vec![Modifier::Final],
            annotations: Vec::new(),
        });
        let class = ClassDecl {
            modifiers: Box::new(modifiers),
            kind: ClassKind::Class,
            name: self.config.implicit_class_name.clone(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            permits: Vec::new(),
            record_components: Vec::new(),
            members,
        };
        self.finish_at(TreeKind::ClassDecl(Box::new(class)), start)
    }

    fn parse_package(&mut self, annotations: Vec<Tree>) -> Tree {
        let keyword = self.bump().span.start;
        let start = annotations
            .first()
            .map_or(keyword, |first| self.start_of(first, keyword));
        let name_mark = self.mark();
        let name = match self.qualident(Rule::CompilationUnit) {
            Ok(name) => name,
            Err(event) => self.recover_from(name_mark, event, Vec::new()),
        };
        self.accept(TokenKind::Semicolon);
        self.finish_at(
            TreeKind::PackageDecl {
                annotations,
                name: Box::new(name),
            },
            start,
        )
    }

    /// `import [static] a.b.c;` or `import a.b.*;`.
    fn parse_import(&mut self) -> Tree {
        let start = self.bump().span.start;
        let is_static = self.eat(TokenKind::Static).is_some();
        let mut name = match self.ident(Rule::Import) {
            Ok(first) => {
                let pos = first.span.start;
                self.spanned(TreeKind::Identifier { name: first.node }, first.span, pos)
            }
            Err(event) => self.recover(event, Vec::new()),
        };
        let name_start = self.start_of(&name, start);
        while !name.is_erroneous() && self.at(TokenKind::Dot) {
            let dot_mark = self.mark();
            let dot = self.bump().span.start;
            if self.eat(TokenKind::Star).is_some() {
                name = self.finish(
                    TreeKind::MemberSelect {
                        expr: Box::new(name),
                        name: Name::new_static("*"),
                    },
                    name_start,
                    dot,
                );
                break;
            }
            name = match self.ident(Rule::Import) {
                Ok(part) => self.finish(
                    TreeKind::MemberSelect {
                        expr: Box::new(name),
                        name: part.node,
                    },
                    name_start,
                    dot,
                ),
                Err(event) => self.recover_from(dot_mark, event, vec![name]),
            };
        }
        self.accept(TokenKind::Semicolon);
        self.finish_at(
            TreeKind::Import {
                is_static,
                name: Box::new(name),
            },
            start,
        )
    }

    /// A modifiers node with nothing in it and no position.
    pub(crate) fn empty_modifiers(&mut self) -> Tree {
        self.synthetic(TreeKind::Modifiers {
            flags: Vec::new(),
            annotations: Vec::new(),
        })
    }

    /// Modifier keywords, `sealed`, `non-sealed` and annotations, in any order.
    pub(crate) fn parse_modifiers(&mut self) -> Tree {
        let start = self.start();
        let mut flags = Vec::new();
        let mut annotations = Vec::new();
        loop {
            if let Some(flag) = Modifier::from_token(self.kind()) {
                self.bump();
                flags.push(flag);
            } else if self.at_word("sealed") && self.at_modifier_follower(1) {
                self.bump();
                flags.push(Modifier::Sealed);
            } else if self.at_word("non")
                && self.peek_kind(1) == TokenKind::Minus
                && self.peek_is_word(2, "sealed")
                && self.adjacent(1)
                && self.adjacent(2)
            {
                for _ in 0..3 {
                    self.bump();
                }
                flags.push(Modifier::NonSealed);
            } else if self.at(TokenKind::At) && self.peek_kind(1) != TokenKind::Interface {
                annotations.push(self.parse_annotation());
            } else {
                break;
            }
        }
        if flags.is_empty() && annotations.is_empty() {
            return self.empty_modifiers();
        }
        self.finish_at(TreeKind::Modifiers { flags, annotations }, start)
    }

    fn at_modifier_follower(&self, k: usize) -> bool {
        let kind = self.peek_kind(k);
        kind.is_modifier()
            || matches!(kind, TokenKind::Class | TokenKind::Interface | TokenKind::At)
    }

    fn parse_annotation(&mut self) -> Tree {
        let at = self.mark();
        let start = self.bump().span.start;
        let annotation_type = match self.qualident(Rule::Annotation) {
            Ok(name) => name,
            Err(event) => return self.recover_from(at, event, Vec::new()),
        };
        let args = if self.at(TokenKind::LParen) {
            self.parse_annotation_arguments()
        } else {
            Vec::new()
        };
        self.finish_at(
            TreeKind::Annotation {
                annotation_type: Box::new(annotation_type),
                args,
            },
            start,
        )
    }

    fn parse_annotation_arguments(&mut self) -> Vec<Tree> {
        self.bump();
        let mut args = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                args.push(self.parse_annotation_argument());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
        }
        self.accept(TokenKind::RParen);
        args
    }

    /// `name = value` as an assignment, or a bare value.
    fn parse_annotation_argument(&mut self) -> Tree {
        if !(self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::Eq) {
            return self.parse_annotation_value();
        }
        let name = self.bump();
        let start = name.span.start;
        let lhs = self.spanned(TreeKind::Identifier { name: name.text }, name.span, start);
        let eq = self.bump().span.start;
        let rhs = self.parse_annotation_value();
        self.finish(
            TreeKind::Assignment {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            start,
            eq,
        )
    }

    fn parse_annotation_value(&mut self) -> Tree {
        if !self.enter() {
            let tree = self.skip_too_deep();
            self.leave();
            return tree;
        }
        let tree = self.parse_annotation_value_inner();
        self.leave();
        tree
    }

    fn parse_annotation_value_inner(&mut self) -> Tree {
        match self.kind() {
            TokenKind::At => self.parse_annotation(),
            TokenKind::LBrace => {
                let start = self.bump().span.start;
                let mut values = Vec::new();
                while !self.at(TokenKind::RBrace) && !self.at_eof() {
                    let before = self.index();
                    values.push(self.parse_annotation_value());
                    if self.eat(TokenKind::Comma).is_none() || self.index() == before {
                        break;
                    }
                }
                self.accept(TokenKind::RBrace);
                self.finish_at(
                    TreeKind::NewArray {
                        elem_type: None,
                        dims: Vec::new(),
                        init: Some(values),
                    },
                    start,
                )
            }
            _ => self.parse_expression_no_lambda(),
        }
    }

    /// True at `class`, `interface`, `enum`, `@interface` or `record Name`.
    pub(crate) fn at_class_start(&self) -> bool {
        match self.kind() {
            TokenKind::Class | TokenKind::Interface | TokenKind::Enum => true,
            TokenKind::At => self.peek_kind(1) == TokenKind::Interface,
            _ => self.at_word("record") && self.peek_kind(1) == TokenKind::Identifier,
        }
    }

    /// True where a method or field declaration can begin after its modifiers.
    fn at_member_start(&self) -> bool {
        self.at_type_start() || self.at(TokenKind::Lt)
    }

    /// A type declaration whose modifiers have been parsed; the current token
    /// is the keyword.
    pub(crate) fn parse_class_declaration(&mut self, modifiers: Tree, doc: Option<SmolStr>) -> Tree {
        let keyword = self.start();
        let start = self.start_of(&modifiers, keyword);
        let kind = match self.kind() {
            TokenKind::Class => ClassKind::Class,
            TokenKind::Interface => ClassKind::Interface,
            TokenKind::Enum => ClassKind::Enum,
            TokenKind::At => {
                self.bump();
                ClassKind::Annotation
            }
            _ => ClassKind::Record,
        };
        self.bump();

        let name = self.ident_or_error(Rule::TypeDeclaration);
        let type_params = match kind {
            ClassKind::Enum | ClassKind::Annotation => Vec::new(),
            _ => self.parse_type_parameters(),
        };
        let record_components = if kind == ClassKind::Record {
            self.parse_formal_parameters(VarKind::RecordComponent)
        } else {
            Vec::new()
        };

        let mut extends = None;
        let mut implements = Vec::new();
        if self.eat(TokenKind::Extends).is_some() {
            if kind == ClassKind::Interface {
                implements = self.parse_type_list();
            } else {
                extends = Some(Box::new(self.type_or_error()));
            }
        }
        if self.eat(TokenKind::Implements).is_some() {
            implements.extend(self.parse_type_list());
        }
        let permits = if self.at_word("permits") {
            self.bump();
            self.parse_type_list()
        } else {
            Vec::new()
        };

        let members = if kind == ClassKind::Enum {
            self.parse_enum_body(&name.node)
        } else {
            self.parse_class_body(&name.node, kind)
        };

        let class = ClassDecl {
            modifiers: Box::new(modifiers),
            kind,
            name: name.node,
            type_params,
            extends,
            implements,
            permits,
            record_components,
            members,
        };
        let tree = self.finish(TreeKind::ClassDecl(Box::new(class)), start, name.span.start);
        self.attach_doc(&tree, doc);
        tree
    }

    /// The body of an anonymous class, as a nameless class declaration.
    pub(crate) fn parse_anonymous_body(&mut self) -> Tree {
        let start = self.start();
        let modifiers = self.empty_modifiers();
        let members = self.parse_class_body("", ClassKind::Class);
        let class = ClassDecl {
            modifiers: Box::new(modifiers),
            kind: ClassKind::Class,
            name: Name::default(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            permits: Vec::new(),
            record_components: Vec::new(),
            members,
        };
        self.finish_at(TreeKind::ClassDecl(Box::new(class)), start)
    }

    /// `{ members }` of a class, interface, record or annotation type.
    fn parse_class_body(&mut self, class_name: &str, kind: ClassKind) -> Vec<Tree> {
        let mut members = Vec::new();
        if !self.accept(TokenKind::LBrace) {
            members.extend(self.skip_to_erroneous(RecoverySet::CLASS_BODY));
            if self.eat(TokenKind::LBrace).is_none() {
                return members;
            }
        }
        if !self.enter() {
            members.push(self.skip_too_deep());
            self.leave();
            self.accept(TokenKind::RBrace);
            return members;
        }

        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.index();
            members.extend(self.parse_class_member(class_name, kind));
            if self.in_error_region() {
                members.extend(self.skip_to_erroneous(RecoverySet::CLASS_BODY));
            }
            if self.index() == before {
                if let Some(leaf) = self.skip_token() {
                    members.push(self.wrap_erroneous(vec![leaf]));
                }
            }
        }
        self.leave();
        self.accept(TokenKind::RBrace);
        members
    }

    fn parse_class_member(&mut self, class_name: &str, kind: ClassKind) -> Vec<Tree> {
        let start = self.start();
        match self.kind() {
            TokenKind::Semicolon => {
                self.bump();
                return Vec::new();
            }
            TokenKind::LBrace => return vec![self.parse_block_from(false, start)],
            TokenKind::Static if self.peek_kind(1) == TokenKind::LBrace => {
                self.bump();
                return vec![self.parse_block_from(true, start)];
            }
            _ if self.at_definite_statement_start() => {
                let stats = self.parse_block_statement();
                return vec![self.syntax_error(
                    start,
                    stats,
                    DiagnosticCode::StatementNotExpected,
                    Vec::new(),
                )];
            }
            _ => {}
        }

        let doc = self.doc_before_current();
        let mark = self.mark();
        let modifiers = self.parse_modifiers();
        if self.at_class_start() {
            return vec![self.parse_class_declaration(modifiers, doc)];
        }
        self.parse_member_rest(modifiers, mark, doc, class_name, kind)
    }

    fn at_definite_statement_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::Switch
                | TokenKind::Return
                | TokenKind::Try
                | TokenKind::For
                | TokenKind::Assert
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Throw
        )
    }

    /// A method, constructor or field whose modifiers have been parsed.
    fn parse_member_rest(
        &mut self,
        modifiers: Tree,
        modifiers_mark: Mark,
        doc: Option<SmolStr>,
        class_name: &str,
        class_kind: ClassKind,
    ) -> Vec<Tree> {
        let here = self.start();
        let start = self.start_of(&modifiers, here);
        let type_params = self.parse_type_parameters();

        // Compact canonical constructor of a record.
        if class_kind == ClassKind::Record
            && self.at(TokenKind::Identifier)
            && self.token().text == class_name
            && self.peek_kind(1) == TokenKind::LBrace
        {
            let name = self.bump();
            let body = self.parse_block();
            let method = MethodDecl {
                modifiers: Box::new(modifiers),
                type_params,
                result: None,
                name: name.text,
                params: Vec::new(),
                thrown: Vec::new(),
                body: Some(Box::new(body)),
                default_value: None,
            };
            let tree = self.finish(TreeKind::MethodDecl(Box::new(method)), start, name.span.start);
            self.attach_doc(&tree, doc);
            return vec![tree];
        }

        let is_void = self.at(TokenKind::Void);
        let type_mark = self.mark();
        let result = match self.parse_type() {
            Ok(result) => result,
            Err(event) if type_params.is_empty() => {
                return vec![self.recover_from(type_mark, event, vec![modifiers])];
            }
            Err(event) => self.recover_from(type_mark, event, Vec::new()),
        };

        // No result type: a constructor, or a method missing its result type.
        if self.at(TokenKind::LParen) {
            if let TreeKind::Identifier { name } = &result.kind {
                let name = name.clone();
                let span = self.span_of(&result).unwrap_or(here..here);
                if class_kind == ClassKind::Interface || name != class_name {
                    self.report_direct(
                        span.clone(),
                        DiagnosticCode::InvalidMethodDeclaration,
                        Vec::new(),
                    );
                }
                let head = MethodHead {
                    start,
                    modifiers,
                    type_params,
                    result: None,
                    name: Spanned::new(name, span),
                    doc,
                };
                return vec![self.parse_method_rest(head)];
            }
        }

        if self.at(TokenKind::Identifier) && self.peek_kind(1) == TokenKind::LParen {
            let name = self.ident_or_error(Rule::Member);
            let head = MethodHead {
                start,
                modifiers,
                type_params,
                result: Some(result),
                name,
                doc,
            };
            return vec![self.parse_method_rest(head)];
        }

        if !is_void && type_params.is_empty() {
            let head = DeclHead {
                modifiers,
                modifiers_mark: Some(modifiers_mark),
                var_type: result,
                type_mark,
                doc,
            };
            return self.parse_variable_declarators(head, VarKind::Field, true);
        }

        // `void x;` or `<T> }`: what was read becomes a method with no
        // parameter list.
        let name = self.ident_or_error(Rule::Member);
        let method = MethodDecl {
            modifiers: Box::new(modifiers),
            type_params,
            result: Some(Box::new(result)),
            name: name.node,
            params: Vec::new(),
            thrown: Vec::new(),
            body: None,
            default_value: None,
        };
        let tree = self.finish(TreeKind::MethodDecl(Box::new(method)), start, name.span.start);
        self.attach_doc(&tree, doc);
        let pos = self.start();
        vec![self.syntax_error(
            pos,
            vec![tree],
            DiagnosticCode::Expected,
            vec![SmolStr::new(TokenKind::LParen.to_string())],
        )]
    }

    /// Parameters, `throws`, and body or `default` value of a method.
    fn parse_method_rest(&mut self, head: MethodHead) -> Tree {
        let MethodHead {
            start,
            modifiers,
            type_params,
            result,
            name,
            doc,
        } = head;
        let params = self.parse_formal_parameters(VarKind::Parameter);
        let result = result.map(|result| self.parse_dims(result));
        let thrown = if self.eat(TokenKind::Throws).is_some() {
            self.parse_type_list()
        } else {
            Vec::new()
        };

        let mut default_value = None;
        let body = if self.at(TokenKind::LBrace) {
            Some(self.parse_block())
        } else {
            if self.eat(TokenKind::Default).is_some() {
                default_value = Some(Box::new(self.parse_annotation_value()));
            }
            let terminated = self.accept_one_of(
                TokenKind::Semicolon,
                &[TokenKind::LBrace, TokenKind::Semicolon],
            );
            if !terminated && self.in_error_region() && self.at_missing_body_start() {
                Some(self.parse_unopened_body())
            } else {
                None
            }
        };

        let method = MethodDecl {
            modifiers: Box::new(modifiers),
            type_params,
            result: result.map(Box::new),
            name: name.node,
            params,
            thrown,
            body: body.map(Box::new),
            default_value,
        };
        let tree = self.finish(TreeKind::MethodDecl(Box::new(method)), start, name.span.start);
        self.attach_doc(&tree, doc);
        tree
    }

    /// True if what follows a method header looks like statements whose
    /// opening brace was forgotten.
    fn at_missing_body_start(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Return
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Do
                | TokenKind::Try
                | TokenKind::Switch
                | TokenKind::Throw
                | TokenKind::Synchronized
        )
    }

    /// Statements up to a `}` read as a method body whose `{` is missing.
    fn parse_unopened_body(&mut self) -> Tree {
        let start = self.start();
        let stats = self.parse_block_statements();
        self.accept(TokenKind::RBrace);
        self.finish_at(
            TreeKind::Block {
                is_static: false,
                stats,
            },
            start,
        )
    }

    /// `( params )` of a method, lambda or record header.
    pub(crate) fn parse_formal_parameters(&mut self, kind: VarKind) -> Vec<Tree> {
        let mut params = Vec::new();
        if !self.accept(TokenKind::LParen) {
            return params;
        }
        if self.eat(TokenKind::RParen).is_some() {
            return params;
        }

        let mut last = self.parse_formal_parameter(kind);
        while self.at(TokenKind::Comma) {
            if is_varargs(&last) {
                let pos = self.prev_end();
                let span = self.span_of(&last).unwrap_or(pos..pos);
                self.report_direct(span, DiagnosticCode::VarargsMustBeLast, Vec::new());
            }
            self.bump();
            params.push(last);
            last = self.parse_formal_parameter(kind);
        }
        params.push(last);

        if self.eat(TokenKind::RParen).is_none() {
            let here = self.start();
            self.set_error_end(here);
            let pos = self.prev_end();
            let expected = [TokenKind::Comma, TokenKind::RParen, TokenKind::LBracket]
                .iter()
                .map(|kind| SmolStr::new(kind.to_string()))
                .collect();
            self.report_syntax_error(pos..pos, DiagnosticCode::ExpectedOneOf, expected);
        }
        params
    }

    fn parse_formal_parameter(&mut self, kind: VarKind) -> Tree {
        let modifiers = self.parse_modifiers();
        let here = self.start();
        let mut var_type = self.type_or_error();
        let type_start = self.start_of(&var_type, here);
        if let Some(dots) = self.eat(TokenKind::Ellipsis) {
            var_type = self.finish(
                TreeKind::ArrayType {
                    elem: Box::new(var_type),
                    varargs: true,
                },
                type_start,
                dots.span.start,
            );
        }
        let start = self.start_of(&modifiers, type_start);
        let name = self.ident_or_error(Rule::Parameters);
        let var_type = self.parse_dims(var_type);
        self.finish(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: Some(Box::new(var_type)),
                name: name.node,
                init: None,
                kind,
            },
            start,
            name.span.start,
        )
    }

    /// One declaration per declarator of `Type a = 1, b[];`. With
    /// `terminated`, the closing `;` is required and belongs to the last
    /// declaration.
    pub(crate) fn parse_variable_declarators(
        &mut self,
        head: DeclHead,
        kind: VarKind,
        terminated: bool,
    ) -> Vec<Tree> {
        let DeclHead {
            mut modifiers,
            modifiers_mark,
            mut var_type,
            type_mark,
            doc,
        } = head;
        let rule = if kind == VarKind::Field {
            Rule::Member
        } else {
            Rule::Statement
        };

        let mut decls = Vec::new();
        loop {
            let here = self.start();
            let type_start = self.start_of(&var_type, here);
            let start = self.start_of(&modifiers, type_start);
            let name = self.ident_or_error(rule);
            let full_type = self.parse_dims(var_type);
            let init = if self.eat(TokenKind::Eq).is_some() {
                Some(Box::new(self.parse_variable_initializer()))
            } else {
                None
            };
            let more = self.at(TokenKind::Comma);
            if !more && terminated {
                self.accept(TokenKind::Semicolon);
            }
            let decl = self.finish(
                TreeKind::VariableDecl {
                    modifiers: Box::new(modifiers),
                    var_type: Some(Box::new(full_type)),
                    name: name.node,
                    init,
                    kind,
                },
                start,
                name.span.start,
            );
            self.attach_doc(&decl, doc.clone());
            decls.push(decl);
            if !more {
                break;
            }

            self.bump();
            var_type = self.replay(type_mark, Self::type_or_error);
            modifiers = match modifiers_mark {
                Some(mark) => self.replay(mark, Self::parse_modifiers),
                None => self.empty_modifiers(),
            };
        }
        decls
    }

    /// `{ constants ; members }` of an enum.
    fn parse_enum_body(&mut self, enum_name: &Name) -> Vec<Tree> {
        let mut members = Vec::new();
        if !self.accept(TokenKind::LBrace) {
            members.extend(self.skip_to_erroneous(RecoverySet::CLASS_BODY));
            if self.eat(TokenKind::LBrace).is_none() {
                return members;
            }
        }
        if !self.enter() {
            members.push(self.skip_too_deep());
            self.leave();
            self.accept(TokenKind::RBrace);
            return members;
        }

        let mut was_semi = false;
        let mut has_structural_errors = false;
        let mut was_error = false;

        if self.eat(TokenKind::Comma).is_some() {
            if self.eat(TokenKind::Semicolon).is_some() {
                was_semi = true;
            } else if !self.at(TokenKind::RBrace) {
                let event = self.expected_event(
                    Rule::EnumBody,
                    &[TokenKind::RBrace, TokenKind::Semicolon],
                );
                self.report_event(&event);
            }
        }

        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.index();
            if self.at(TokenKind::Semicolon) {
                self.bump();
                was_semi = true;
                continue;
            }

            let entry = match self.estimate_enum_entry(enum_name) {
                EnumEntry::Unknown if was_semi => EnumEntry::Member,
                EnumEntry::Unknown => EnumEntry::Constant,
                entry => entry,
            };

            if entry == EnumEntry::Constant {
                was_error = false;
                if was_semi && !has_structural_errors {
                    let span = self.token().span.clone();
                    self.set_error_end(span.start);
                    self.report_syntax_error(span, DiagnosticCode::EnumConstantNotExpected, Vec::new());
                    has_structural_errors = true;
                }
                members.push(self.parse_enum_constant(enum_name));
                if self.in_error_region() {
                    members.extend(self.skip_to_erroneous(RecoverySet::ENUM_BODY));
                } else if !matches!(
                    self.kind(),
                    TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof
                ) {
                    if self.eat(TokenKind::Comma).is_none() {
                        let here = self.start();
                        self.set_error_end(here);
                        let event = self.expected_event(
                            Rule::EnumBody,
                            &[TokenKind::Comma, TokenKind::RBrace, TokenKind::Semicolon],
                        );
                        self.report_event(&event);
                        was_error = true;
                    }
                }
            } else {
                if !was_semi && !has_structural_errors && !was_error {
                    let span = self.token().span.clone();
                    self.set_error_end(span.start);
                    self.report_syntax_error(span, DiagnosticCode::EnumConstantExpected, Vec::new());
                    has_structural_errors = true;
                }
                was_error = false;
                members.extend(self.parse_class_member(enum_name, ClassKind::Enum));
                if self.in_error_region() {
                    members.extend(self.skip_to_erroneous(RecoverySet::ENUM_BODY));
                }
            }

            if self.index() == before {
                if let Some(leaf) = self.skip_token() {
                    members.push(self.wrap_erroneous(vec![leaf]));
                }
            }
        }
        self.leave();
        self.accept(TokenKind::RBrace);
        members
    }

    /// Decides from the first tokens whether an enum body entry is a
    /// constant or a member.
    fn estimate_enum_entry(&self, enum_name: &Name) -> EnumEntry {
        let record_start = self.at_word("record") && self.peek_kind(1) == TokenKind::Identifier;
        if self.at(TokenKind::Identifier) && self.token().text != *enum_name && !record_start {
            if matches!(
                self.peek_kind(1),
                TokenKind::LParen | TokenKind::LBrace | TokenKind::Comma | TokenKind::Semicolon
            ) {
                return EnumEntry::Constant;
            }
        }
        match self.kind() {
            TokenKind::Identifier if record_start => EnumEntry::Member,
            TokenKind::Identifier | TokenKind::At | TokenKind::Lt => EnumEntry::Unknown,
            _ => EnumEntry::Member,
        }
    }

    /// `NAME`, `NAME(args)` or `NAME { body }`. The constant is initialized
    /// by an instance creation of the enum type itself.
    fn parse_enum_constant(&mut self, enum_name: &Name) -> Tree {
        let doc = self.doc_before_current();
        let modifiers = self.parse_modifiers();
        let here = self.start();
        let start = self.start_of(&modifiers, here);
        let name = self.ident_or_error(Rule::EnumBody);
        let ident_start = name.span.start;

        let args = if self.at(TokenKind::LParen) {
            self.parse_arguments()
        } else {
            Vec::new()
        };
        let body = if self.at(TokenKind::LBrace) {
            Some(Box::new(self.parse_anonymous_body()))
        } else {
            None
        };
        let class = self.synthetic(TreeKind::Identifier {
            name: enum_name.clone(),
        });
        let init = self.finish(
            TreeKind::NewClass {
                enclosing: None,
                type_args: Vec::new(),
                class: Box::new(class),
                args,
                body,
            },
            ident_start,
            ident_start,
        );
        let decl = self.finish(
            TreeKind::VariableDecl {
                modifiers: Box::new(modifiers),
                var_type: None,
                name: name.node,
                init: Some(Box::new(init)),
                kind: VarKind::EnumConstant,
            },
            start,
            ident_start,
        );
        self.attach_doc(&decl, doc);
        decl
    }
}

fn is_varargs(param: &Tree) -> bool {
    matches!(
        &param.kind,
        TreeKind::VariableDecl { var_type: Some(var_type), .. }
            if matches!(var_type.kind, TreeKind::ArrayType { varargs: true, .. })
    )
}

#[cfg(test)]
mod tests {
    use crate::ast::{ClassKind, Modifier, Tree, TreeKind, VarKind};
    use crate::config::ParserConfig;
    use crate::diag::DiagnosticCode;
    use crate::parse_source;
    use crate::parser::ParseContext;

    fn top_level(unit: &Tree) -> &[Tree] {
        match &unit.kind {
            TreeKind::CompilationUnit { decls, .. } => decls,
            _ => panic!("not a unit"),
        }
    }

    fn members(class: &Tree) -> &[Tree] {
        match &class.kind {
            TreeKind::ClassDecl(class) => &class.members,
            _ => panic!("not a class: {}", class.shape()),
        }
    }

    #[test]
    fn package_imports_and_classes() {
        let result = parse_source(
            "package com.example;\nimport java.util.*;\nimport static java.lang.Math.max;\n\
             public final class A extends B implements C, D {}\ninterface I extends J {}",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let TreeKind::CompilationUnit { package, imports, decls } = &result.unit.kind else {
            panic!("not a unit");
        };
        assert!(package.is_some());
        assert_eq!(imports.len(), 2);
        assert!(imports[0].shape().contains("(MemberSelect \"*\""));
        assert!(imports[1].shape().starts_with("(Import static=true"));
        assert_eq!(decls.len(), 2);
        let TreeKind::ClassDecl(class) = &decls[0].kind else {
            panic!("not a class");
        };
        assert!(class.extends.is_some());
        assert_eq!(class.implements.len(), 2);
    }

    #[test]
    fn missing_method_body() {
        let source = "class C { int m() }";
        let result = parse_source(source);
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.code, DiagnosticCode::ExpectedOneOf);
        assert_eq!(diag.span.start, source.find(')').map(|p| p + 1).unwrap_or_default());
        let class = &top_level(&result.unit)[0];
        let TreeKind::MethodDecl(method) = &members(class)[0].kind else {
            panic!("not a method");
        };
        assert_eq!(method.name, "m");
        assert!(method.body.is_none());
    }

    #[test]
    fn enum_constant_missing_separator() {
        let source = "enum E { A, B, C void t() {} }";
        let result = parse_source(source);
        assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.code, DiagnosticCode::ExpectedOneOf);
        assert_eq!(diag.args, vec!["','", "'}'", "';'"]);
        assert_eq!(diag.span.start, source.find("C ").map(|p| p + 1).unwrap_or_default());

        let class = &top_level(&result.unit)[0];
        let names: Vec<_> = members(class).iter().filter_map(Tree::name).collect();
        assert_eq!(names, vec!["A", "B", "C", "t"]);
        assert!(members(class)[..3].iter().all(|member| matches!(
            member.kind,
            TreeKind::VariableDecl { kind: VarKind::EnumConstant, .. }
        )));
    }

    #[test]
    fn enum_constants_with_bodies_and_members() {
        let result = parse_source(
            "enum Op { PLUS(\"+\") { int apply(int a, int b) { return a + b; } }, MINUS(\"-\"); \
             private final String symbol; Op(String symbol) { this.symbol = symbol; } }",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let class = &top_level(&result.unit)[0];
        assert_eq!(members(class).len(), 4);
        let TreeKind::MethodDecl(ctor) = &members(class)[3].kind else {
            panic!("not a constructor");
        };
        assert!(ctor.result.is_none());
    }

    #[test]
    fn records_and_sealed_types() {
        let result = parse_source(
            "public sealed interface Shape permits Circle, Square {}\n\
             record Circle(double r) implements Shape { Circle { if (r < 0) throw new E(); } }\n\
             non-sealed class Square implements Shape {}",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let decls = top_level(&result.unit);
        let TreeKind::ClassDecl(shape) = &decls[0].kind else {
            panic!("not a class");
        };
        assert_eq!(shape.permits.len(), 2);
        assert!(shape.modifiers.shape().contains("sealed"));

        let TreeKind::ClassDecl(circle) = &decls[1].kind else {
            panic!("not a record");
        };
        assert_eq!(circle.kind, ClassKind::Record);
        assert_eq!(circle.record_components.len(), 1);
        assert!(matches!(
            circle.record_components[0].kind,
            TreeKind::VariableDecl { kind: VarKind::RecordComponent, .. }
        ));
        let TreeKind::MethodDecl(compact) = &circle.members[0].kind else {
            panic!("not a compact constructor");
        };
        assert!(compact.params.is_empty() && compact.body.is_some());

        let TreeKind::ClassDecl(square) = &decls[2].kind else {
            panic!("not a class");
        };
        assert!(square.modifiers.shape().contains("non-sealed"));
    }

    #[test]
    fn implicit_class_gathers_top_level_members() {
        let result = parse_source("int counter = 0;\nvoid main() { counter++; }\nclass Helper {}");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let decls = top_level(&result.unit);
        assert_eq!(decls.len(), 1);
        let TreeKind::ClassDecl(class) = &decls[0].kind else {
            panic!("not a class");
        };
        assert_eq!(class.name, "Main");
        assert_eq!(class.members.len(), 3);
        let TreeKind::Modifiers { flags, .. } = &class.modifiers.kind else {
            panic!("no modifiers");
        };
        assert_eq!(flags, &vec![Modifier::Final]);
        assert_eq!(result.span_of(&class.modifiers), None);
    }

    #[test]
    fn top_level_members_rejected_without_implicit_classes() {
        let mut context = ParseContext::new(ParserConfig::default().with_implicit_classes(false));
        let result = context.parse_source("void main() {}");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::ClassMethodOrFieldExpected);
    }

    #[test]
    fn dangling_type_parameters() {
        let result = parse_source("class A { public <T> }");
        assert_eq!(result.diagnostics.len(), 1, "{:?}", result.diagnostics);
        let class = &top_level(&result.unit)[0];
        let TreeKind::Erroneous { children } = &members(class)[0].kind else {
            panic!("expected erroneous member");
        };
        assert!(matches!(&children[0].kind, TreeKind::MethodDecl(m) if m.name == "<error>"));
    }

    #[test]
    fn statement_in_class_body() {
        let result = parse_source("class A { return 1; int x; }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::StatementNotExpected);
        let class = &top_level(&result.unit)[0];
        assert_eq!(members(class).len(), 2);
    }

    #[test]
    fn annotations_and_varargs() {
        let result = parse_source(
            "@Deprecated(since = \"9\", forRemoval = true) class A { \
             @SuppressWarnings({\"a\", \"b\"}) void m(final int x, String... rest) {} }\n\
             @interface Marker { int value() default 1; }",
        );
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let decls = top_level(&result.unit);
        let TreeKind::ClassDecl(marker) = &decls[1].kind else {
            panic!("not an annotation type");
        };
        assert_eq!(marker.kind, ClassKind::Annotation);

        let result = parse_source("class A { void m(String... a, int b) {} }");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::VarargsMustBeLast);
    }

    #[test]
    fn doc_comments_attach_to_declarations() {
        let result = parse_source("/** The class. */\nclass A {\n  /**\n   * A field.\n   */\n  int x;\n}");
        let class = &top_level(&result.unit)[0];
        assert_eq!(result.doc_comment_of(class), Some("The class."));
        assert_eq!(result.doc_comment_of(&members(class)[0]), Some("A field."));
    }

    #[test]
    fn nested_unclosed_classes_report_once() {
        let source: String = (0..100).map(|i| format!("class A{i} {{ ")).collect();
        let result = parse_source(&source);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::PrematureEof);
    }
}
