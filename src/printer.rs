//! Renders syntax trees back to source text.
//!
//! Output is canonical: one statement or member per line, four spaces per
//! indentation level, single spaces around binary operators. Erroneous nodes
//! render as `(ERROR: ...)` around whatever they salvaged, so rendering never
//! fails on a tree produced from malformed input.

use crate::ast::{ClassDecl, ClassKind, LambdaParams, MethodDecl, ReferenceMode, Tree, TreeKind, VarKind, WildcardBound};

/// Renders `tree` as source text.
///
/// ```
/// let result = javelin_syntax::parse_source("class A{int x=1+2;}");
/// assert_eq!(javelin_syntax::render(&result.unit), "class A {\n    int x = 1 + 2;\n}\n");
/// ```
pub fn render(tree: &Tree) -> String {
    let mut printer = TreePrinter::new();
    printer.top(tree);
    printer.finish()
}

struct TreePrinter {
    indent_level: usize,
    output: String,
}

impl TreePrinter {
    fn new() -> Self {
        Self {
            indent_level: 0,
            output: String::new(),
        }
    }

    fn finish(mut self) -> String {
        if !self.output.ends_with('\n') {
            self.output.push('\n');
        }
        self.output
    }

    fn push(&mut self, text: &str) {
        self.output.push_str(text);
    }

    fn newline(&mut self) {
        self.output.push('\n');
        for _ in 0..self.indent_level {
            self.output.push_str("    ");
        }
    }

    fn top(&mut self, tree: &Tree) {
        let TreeKind::CompilationUnit {
            package,
            imports,
            decls,
        } = &tree.kind
        else {
            self.stmt(tree);
            return;
        };
        let mut first = true;
        if let Some(package) = package {
            self.node(package);
            first = false;
        }
        for import in imports {
            if !first {
                self.newline();
            }
            self.node(import);
            first = false;
        }
        for decl in decls {
            if !first {
                self.newline();
            }
            self.member(decl, None);
            first = false;
        }
    }

    fn list(&mut self, trees: &[Tree], separator: &str) {
        for (i, tree) in trees.iter().enumerate() {
            if i > 0 {
                self.push(separator);
            }
            self.node(tree);
        }
    }

    fn type_params(&mut self, params: &[Tree]) {
        if !params.is_empty() {
            self.push("<");
            self.list(params, ", ");
            self.push(">");
        }
    }

    fn args(&mut self, args: &[Tree]) {
        self.push("(");
        self.list(args, ", ");
        self.push(")");
    }

    fn modifiers(&mut self, modifiers: &Tree) {
        if let TreeKind::Modifiers { flags, annotations } = &modifiers.kind {
            for annotation in annotations {
                self.node(annotation);
                self.push(" ");
            }
            for flag in flags {
                self.push(flag.keyword());
                self.push(" ");
            }
        } else {
            self.node(modifiers);
            self.push(" ");
        }
    }

    /// A braced list of statements.
    fn block(&mut self, stats: &[Tree]) {
        if stats.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{");
        self.indent_level += 1;
        for stat in stats {
            self.newline();
            self.stmt(stat);
        }
        self.indent_level -= 1;
        self.newline();
        self.push("}");
    }

    fn stmt(&mut self, tree: &Tree) {
        match &tree.kind {
            TreeKind::VariableDecl { .. } => {
                self.node(tree);
                self.push(";");
            }
            TreeKind::ClassDecl(class) => self.class(class),
            _ => self.node(tree),
        }
    }

    fn member(&mut self, tree: &Tree, record_name: Option<&str>) {
        match &tree.kind {
            TreeKind::MethodDecl(method) => self.method(method, record_name),
            _ => self.stmt(tree),
        }
    }

    fn class(&mut self, class: &ClassDecl) {
        self.modifiers(&class.modifiers);
        self.push(class.kind.keyword());
        self.push(" ");
        self.push(&class.name);
        self.type_params(&class.type_params);
        if class.kind == ClassKind::Record {
            self.push("(");
            self.list(&class.record_components, ", ");
            self.push(")");
        }
        if let Some(extends) = &class.extends {
            self.push(" extends ");
            self.node(extends);
        }
        if !class.implements.is_empty() {
            self.push(if class.kind == ClassKind::Interface {
                " extends "
            } else {
                " implements "
            });
            self.list(&class.implements, ", ");
        }
        if !class.permits.is_empty() {
            self.push(" permits ");
            self.list(&class.permits, ", ");
        }
        self.push(" ");
        self.class_body(class);
    }

    fn class_body(&mut self, class: &ClassDecl) {
        let constants = class
            .members
            .iter()
            .take_while(|member| is_enum_constant(member))
            .count();
        if class.members.is_empty() {
            self.push("{}");
            return;
        }
        let record_name = (class.kind == ClassKind::Record).then_some(class.name.as_str());

        self.push("{");
        self.indent_level += 1;
        if class.kind == ClassKind::Enum && constants < class.members.len() && constants == 0 {
            self.newline();
            self.push(";");
        }
        for (i, member) in class.members.iter().enumerate() {
            self.newline();
            if i < constants {
                self.enum_constant(member);
                self.push(if i + 1 == constants { ";" } else { "," });
            } else {
                self.member(member, record_name);
            }
        }
        self.indent_level -= 1;
        self.newline();
        self.push("}");
    }

    fn enum_constant(&mut self, tree: &Tree) {
        let TreeKind::VariableDecl {
            modifiers,
            name,
            init,
            ..
        } = &tree.kind
        else {
            return;
        };
        self.modifiers(modifiers);
        self.push(name);
        if let Some(TreeKind::NewClass { args, body, .. }) = init.as_deref().map(|init| &init.kind) {
            if !args.is_empty() {
                self.args(args);
            }
            if let Some(body) = body {
                self.push(" ");
                self.node(body);
            }
        }
    }

    fn method(&mut self, method: &MethodDecl, record_name: Option<&str>) {
        self.modifiers(&method.modifiers);
        if !method.type_params.is_empty() {
            self.type_params(&method.type_params);
            self.push(" ");
        }
        if let Some(result) = &method.result {
            self.node(result);
            self.push(" ");
        }
        self.push(&method.name);
        let compact = method.result.is_none()
            && method.params.is_empty()
            && record_name == Some(method.name.as_str());
        if !compact {
            self.args(&method.params);
        }
        if !method.thrown.is_empty() {
            self.push(" throws ");
            self.list(&method.thrown, ", ");
        }
        if let Some(value) = &method.default_value {
            self.push(" default ");
            self.node(value);
        }
        match &method.body {
            Some(body) => {
                self.push(" ");
                self.node(body);
            }
            None => self.push(";"),
        }
    }

    /// A variable declaration without its terminating `;`.
    fn variable(&mut self, tree: &Tree) {
        let TreeKind::VariableDecl {
            modifiers,
            var_type,
            name,
            init,
            ..
        } = &tree.kind
        else {
            return;
        };
        self.modifiers(modifiers);
        if let Some(var_type) = var_type {
            self.node(var_type);
            self.push(" ");
        }
        self.push(name);
        if let Some(init) = init {
            self.push(" = ");
            self.node(init);
        }
    }

    /// Declarators after the first of a `for` header share its type; only
    /// extra dimensions are written.
    fn for_init(&mut self, init: &[Tree]) {
        let Some(first) = init.first() else {
            return;
        };
        if !matches!(first.kind, TreeKind::VariableDecl { .. }) {
            for (i, stat) in init.iter().enumerate() {
                if i > 0 {
                    self.push(", ");
                }
                self.statement_expression(stat);
            }
            return;
        }
        self.variable(first);
        let base_dims = declared_dims(first);
        for decl in &init[1..] {
            self.push(", ");
            if let TreeKind::VariableDecl { name, init, .. } = &decl.kind {
                self.push(name);
                for _ in base_dims..declared_dims(decl) {
                    self.push("[]");
                }
                if let Some(init) = init {
                    self.push(" = ");
                    self.node(init);
                }
            } else {
                self.node(decl);
            }
        }
    }

    fn statement_expression(&mut self, tree: &Tree) {
        match &tree.kind {
            TreeKind::ExpressionStatement { expr } => self.node(expr),
            _ => self.node(tree),
        }
    }

    fn case(&mut self, labels: &[Tree], guard: Option<&Tree>, body: Option<&Tree>, stats: &[Tree]) {
        match labels {
            [only] if matches!(only.kind, TreeKind::DefaultCaseLabel) => self.push("default"),
            _ => {
                self.push("case ");
                self.list(labels, ", ");
            }
        }
        if let Some(guard) = guard {
            self.push(" when ");
            self.node(guard);
        }
        match body {
            Some(body) => {
                self.push(" -> ");
                self.stmt(body);
            }
            None => {
                self.push(":");
                self.indent_level += 1;
                for stat in stats {
                    self.newline();
                    self.stmt(stat);
                }
                self.indent_level -= 1;
            }
        }
    }

    fn switch(&mut self, selector: &Tree, cases: &[Tree]) {
        self.push("switch ");
        self.node(selector);
        if cases.is_empty() {
            self.push(" {}");
            return;
        }
        self.push(" {");
        self.indent_level += 1;
        for case in cases {
            self.newline();
            self.node(case);
        }
        self.indent_level -= 1;
        self.newline();
        self.push("}");
    }

    fn node(&mut self, tree: &Tree) {
        use TreeKind::*;
        match &tree.kind {
            CompilationUnit { .. } => self.top(tree),
            PackageDecl { annotations, name } => {
                for annotation in annotations {
                    self.node(annotation);
                    self.push(" ");
                }
                self.push("package ");
                self.node(name);
                self.push(";");
            }
            Import { is_static, name } => {
                self.push(if *is_static { "import static " } else { "import " });
                self.node(name);
                self.push(";");
            }
            ClassDecl(class) if class.name.is_empty() && class.kind == ClassKind::Class => {
                self.class_body(class);
            }
            ClassDecl(class) => self.class(class),
            MethodDecl(method) => self.method(method, None),
            VariableDecl { .. } => self.variable(tree),
            Modifiers { .. } => self.modifiers(tree),
            Annotation {
                annotation_type,
                args,
            } => {
                self.push("@");
                self.node(annotation_type);
                if !args.is_empty() {
                    self.args(args);
                }
            }
            TypeParameter { name, bounds } => {
                self.push(name);
                if !bounds.is_empty() {
                    self.push(" extends ");
                    self.list(bounds, " & ");
                }
            }
            Block { is_static, stats } => {
                if *is_static {
                    self.push("static ");
                }
                self.block(stats);
            }
            EmptyStatement => self.push(";"),
            ExpressionStatement { expr } => {
                self.node(expr);
                self.push(";");
            }
            If {
                cond,
                then_stmt,
                else_stmt,
            } => {
                self.push("if ");
                self.node(cond);
                self.push(" ");
                self.stmt(then_stmt);
                if let Some(else_stmt) = else_stmt {
                    self.push(" else ");
                    self.stmt(else_stmt);
                }
            }
            While { cond, body } => {
                self.push("while ");
                self.node(cond);
                self.push(" ");
                self.stmt(body);
            }
            DoWhile { body, cond } => {
                self.push("do ");
                self.stmt(body);
                self.push(" while ");
                self.node(cond);
                self.push(";");
            }
            For {
                init,
                cond,
                update,
                body,
            } => {
                self.push("for (");
                self.for_init(init);
                self.push(";");
                if let Some(cond) = cond {
                    self.push(" ");
                    self.node(cond);
                }
                self.push(";");
                if !update.is_empty() {
                    self.push(" ");
                    self.for_init(update);
                }
                self.push(") ");
                self.stmt(body);
            }
            ForEach { var, expr, body } => {
                self.push("for (");
                self.node(var);
                self.push(" : ");
                self.node(expr);
                self.push(") ");
                self.stmt(body);
            }
            Labeled { label, body } => {
                self.push(label);
                self.push(": ");
                self.stmt(body);
            }
            Switch { selector, cases } | SwitchExpression { selector, cases } => {
                self.switch(selector, cases);
            }
            Case {
                labels,
                guard,
                stats,
                body,
                ..
            } => self.case(labels, guard.as_deref(), body.as_deref(), stats),
            ConstantCaseLabel { expr } => self.node(expr),
            PatternCaseLabel { pattern } => self.node(pattern),
            DefaultCaseLabel => self.push("default"),
            BindingPattern { var } => self.node(var),
            Yield { value } => {
                self.push("yield ");
                self.node(value);
                self.push(";");
            }
            Synchronized { lock, body } => {
                self.push("synchronized ");
                self.node(lock);
                self.push(" ");
                self.node(body);
            }
            Try {
                resources,
                body,
                catches,
                finalizer,
            } => {
                self.push("try ");
                if !resources.is_empty() {
                    self.push("(");
                    self.list(resources, "; ");
                    self.push(") ");
                }
                self.node(body);
                for catch in catches {
                    self.push(" ");
                    self.node(catch);
                }
                if let Some(finalizer) = finalizer {
                    self.push(" finally ");
                    self.node(finalizer);
                }
            }
            Catch { param, body } => {
                self.push("catch (");
                self.node(param);
                self.push(") ");
                self.node(body);
            }
            Throw { expr } => {
                self.push("throw ");
                self.node(expr);
                self.push(";");
            }
            Return { expr } => {
                self.push("return");
                if let Some(expr) = expr {
                    self.push(" ");
                    self.node(expr);
                }
                self.push(";");
            }
            Break { label } | Continue { label } => {
                self.push(if matches!(tree.kind, Break { .. }) {
                    "break"
                } else {
                    "continue"
                });
                if let Some(label) = label {
                    self.push(" ");
                    self.push(label);
                }
                self.push(";");
            }
            Assert { cond, detail } => {
                self.push("assert ");
                self.node(cond);
                if let Some(detail) = detail {
                    self.push(" : ");
                    self.node(detail);
                }
                self.push(";");
            }
            Assignment { lhs, rhs } => {
                self.node(lhs);
                self.push(" = ");
                self.node(rhs);
            }
            CompoundAssignment { op, lhs, rhs } => {
                self.node(lhs);
                self.push(" ");
                self.push(op.symbol());
                self.push("= ");
                self.node(rhs);
            }
            Binary { op, lhs, rhs } => {
                self.node(lhs);
                self.push(" ");
                self.push(op.symbol());
                self.push(" ");
                self.node(rhs);
            }
            Unary { op, arg } if op.is_postfix() => {
                self.node(arg);
                self.push(op.symbol());
            }
            Unary { op, arg } => {
                self.push(op.symbol());
                let mark = self.output.len();
                self.node(arg);
                // `- -x` must not become `--x`.
                let last = op.symbol().chars().last();
                if self.output[mark..].chars().next() == last && matches!(last, Some('+' | '-')) {
                    self.output.insert(mark, ' ');
                }
            }
            Conditional {
                cond,
                then_expr,
                else_expr,
            } => {
                self.node(cond);
                self.push(" ? ");
                self.node(then_expr);
                self.push(" : ");
                self.node(else_expr);
            }
            InstanceOf { expr, pattern } => {
                self.node(expr);
                self.push(" instanceof ");
                self.node(pattern);
            }
            TypeCast { target, expr } => {
                self.push("(");
                self.node(target);
                self.push(") ");
                self.node(expr);
            }
            Parens { expr } => {
                self.push("(");
                self.node(expr);
                self.push(")");
            }
            MethodInvocation {
                type_args,
                method,
                args,
            } => {
                match (&method.kind, type_args.is_empty()) {
                    (MemberSelect { expr, name }, false) => {
                        self.node(expr);
                        self.push(".");
                        self.type_params(type_args);
                        self.push(name);
                    }
                    _ => {
                        self.type_params(type_args);
                        self.node(method);
                    }
                }
                self.args(args);
            }
            NewClass {
                enclosing,
                type_args,
                class,
                args,
                body,
            } => {
                if let Some(enclosing) = enclosing {
                    self.node(enclosing);
                    self.push(".");
                }
                self.push("new ");
                self.type_params(type_args);
                self.node(class);
                self.args(args);
                if let Some(body) = body {
                    self.push(" ");
                    self.node(body);
                }
            }
            NewArray {
                elem_type,
                dims,
                init,
            } => self.new_array(elem_type.as_deref(), dims, init.as_deref()),
            Lambda {
                params,
                param_kind,
                body,
            } => {
                self.push("(");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    match (param_kind, &param.kind) {
                        (LambdaParams::Implicit, VariableDecl { name, .. }) => self.push(name),
                        _ => self.node(param),
                    }
                }
                self.push(") -> ");
                self.node(body);
            }
            MemberReference { expr, mode, name } => {
                self.node(expr);
                self.push("::");
                match mode {
                    ReferenceMode::New => self.push("new"),
                    ReferenceMode::Invoke => self.push(name),
                }
            }
            MemberSelect { expr, name } => {
                self.node(expr);
                self.push(".");
                self.push(name);
            }
            Identifier { name } => self.push(name),
            Literal { text, .. } => self.push(text),
            ArrayAccess { expr, index } => {
                self.node(expr);
                self.push("[");
                self.node(index);
                self.push("]");
            }
            PrimitiveType { kind } => self.push(kind.keyword()),
            ArrayType { elem, varargs } => {
                self.node(elem);
                self.push(if *varargs { "..." } else { "[]" });
            }
            ParameterizedType { base, args } => {
                self.node(base);
                self.push("<");
                self.list(args, ", ");
                self.push(">");
            }
            Wildcard { bound, inner } => {
                self.push("?");
                match bound {
                    WildcardBound::Unbound => {}
                    WildcardBound::Extends => self.push(" extends "),
                    WildcardBound::Super => self.push(" super "),
                }
                if let Some(inner) = inner {
                    self.node(inner);
                }
            }
            IntersectionType { bounds } => self.list(bounds, " & "),
            UnionType { alternatives } => self.list(alternatives, " | "),
            Erroneous { children } => {
                self.push("(ERROR:");
                for (i, child) in children.iter().enumerate() {
                    self.push(if i == 0 { " " } else { ", " });
                    self.node(child);
                }
                self.push(")");
            }
            Skipped { text, .. } => self.push(text),
        }
    }

    /// `new T[d]...[]...` or `new T[]... { ... }`. The element type carries
    /// one array layer per trailing `[]` beyond the creation's own.
    fn new_array(&mut self, elem_type: Option<&Tree>, dims: &[Tree], init: Option<&[Tree]>) {
        let Some(elem_type) = elem_type else {
            self.push("{");
            if let Some(init) = init {
                self.list(init, ", ");
            }
            self.push("}");
            return;
        };

        let mut base = elem_type;
        let mut extra = 0;
        while let TreeKind::ArrayType {
            elem,
            varargs: false,
        } = &base.kind
        {
            base = elem;
            extra += 1;
        }
        self.push("new ");
        self.node(base);
        for dim in dims {
            self.push("[");
            self.node(dim);
            self.push("]");
        }
        if dims.is_empty() {
            extra += 1;
        }
        for _ in 0..extra {
            self.push("[]");
        }
        if let Some(init) = init {
            self.push(" {");
            self.list(init, ", ");
            self.push("}");
        }
    }
}

fn is_enum_constant(tree: &Tree) -> bool {
    matches!(
        tree.kind,
        TreeKind::VariableDecl {
            kind: VarKind::EnumConstant,
            ..
        }
    )
}

/// Number of array layers on a declaration's type.
fn declared_dims(decl: &Tree) -> usize {
    let TreeKind::VariableDecl {
        var_type: Some(var_type),
        ..
    } = &decl.kind
    else {
        return 0;
    };
    let mut dims = 0;
    let mut current = var_type.as_ref();
    while let TreeKind::ArrayType { elem, .. } = &current.kind {
        dims += 1;
        current = elem;
    }
    dims
}
