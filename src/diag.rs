//! Diagnostic model for lexical and syntax errors, warnings, and notes.
//!
//! Every diagnostic carries a [`DiagnosticCode`] plus structured arguments, so
//! callers can match on codes instead of message text. Rendering through
//! `miette` happens only on request via [`convert_diagnostics_to_reports`].

use crate::ast::Span;
use miette::{Diagnostic, LabeledSpan, Report, Severity};
use smol_str::SmolStr;
use std::fmt;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagSeverity {
    /// A malformed construct; the tree contains a recovery node or a synthetic piece.
    Error,
    /// A suspicious but well-formed construct.
    Warning,
    /// An informational note or advice.
    Note,
}

impl fmt::Display for DiagSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagSeverity::Error => write!(f, "error"),
            DiagSeverity::Warning => write!(f, "warning"),
            DiagSeverity::Note => write!(f, "note"),
        }
    }
}

/// Stable identity of a diagnostic.
///
/// `as_str` gives the key used in raw output; `message` renders English text
/// from the structured arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// One token expected: args `[token]`.
    Expected,
    /// One of several tokens expected: args `[token, token, ...]`.
    ExpectedOneOf,
    /// The input ended inside a construct.
    PrematureEof,
    IllegalStartOfExpr,
    IllegalStartOfType,
    IllegalStartOfStmt,
    NotStmt,
    ElseWithoutIf,
    CatchWithoutTry,
    FinallyWithoutTry,
    TryWithoutCatchOrFinally,
    /// `case` or `default` outside a switch: args `[keyword]`.
    Orphaned,
    ClassMethodOrFieldExpected,
    StatementNotExpected,
    EnumConstantExpected,
    EnumConstantNotExpected,
    VariableNotAllowed,
    ClassNotAllowed,
    BadInitializer,
    SwitchCaseUnexpectedStatement,
    GuardNotAllowed,
    InvalidMethodDeclaration,
    ArrayDimensionMissing,
    VarargsMustBeLast,
    TooDeeplyNested,
    IllegalUnicodeEscape,
    IllegalEscapeChar,
    UnclosedStringLiteral,
    UnclosedCharLiteral,
    UnclosedComment,
    /// args `[character]`.
    IllegalChar,
}

impl DiagnosticCode {
    /// The stable kebab-case key of this code.
    pub fn as_str(self) -> &'static str {
        use DiagnosticCode::*;
        match self {
            Expected => "expected",
            ExpectedOneOf => "expected-one-of",
            PrematureEof => "premature-eof",
            IllegalStartOfExpr => "illegal-start-of-expr",
            IllegalStartOfType => "illegal-start-of-type",
            IllegalStartOfStmt => "illegal-start-of-stmt",
            NotStmt => "not-a-statement",
            ElseWithoutIf => "else-without-if",
            CatchWithoutTry => "catch-without-try",
            FinallyWithoutTry => "finally-without-try",
            TryWithoutCatchOrFinally => "try-without-catch-or-finally",
            Orphaned => "orphaned",
            ClassMethodOrFieldExpected => "class-method-or-field-expected",
            StatementNotExpected => "statement-not-expected",
            EnumConstantExpected => "enum-constant-expected",
            EnumConstantNotExpected => "enum-constant-not-expected",
            VariableNotAllowed => "variable-not-allowed",
            ClassNotAllowed => "class-not-allowed",
            BadInitializer => "bad-initializer",
            SwitchCaseUnexpectedStatement => "switch-case-unexpected-statement",
            GuardNotAllowed => "guard-not-allowed",
            InvalidMethodDeclaration => "invalid-method-declaration",
            ArrayDimensionMissing => "array-dimension-missing",
            VarargsMustBeLast => "varargs-must-be-last",
            TooDeeplyNested => "too-deeply-nested",
            IllegalUnicodeEscape => "illegal-unicode-escape",
            IllegalEscapeChar => "illegal-escape-char",
            UnclosedStringLiteral => "unclosed-string-literal",
            UnclosedCharLiteral => "unclosed-char-literal",
            UnclosedComment => "unclosed-comment",
            IllegalChar => "illegal-char",
        }
    }

    /// Renders the English message for this code.
    pub fn message(self, args: &[SmolStr]) -> String {
        use DiagnosticCode::*;
        let arg = |index: usize| args.get(index).map(SmolStr::as_str).unwrap_or("?");
        match self {
            Expected => format!("{} expected", arg(0)),
            ExpectedOneOf => match args {
                [] => "token expected".to_string(),
                [only] => format!("{only} expected"),
                [first, second] => format!("{first} or {second} expected"),
                [init @ .., last] => {
                    let init: Vec<&str> = init.iter().map(SmolStr::as_str).collect();
                    format!("{}, or {last} expected", init.join(", "))
                }
            },
            PrematureEof => "reached end of file while parsing".to_string(),
            IllegalStartOfExpr => "illegal start of expression".to_string(),
            IllegalStartOfType => "illegal start of type".to_string(),
            IllegalStartOfStmt => "illegal start of statement".to_string(),
            NotStmt => "not a statement".to_string(),
            ElseWithoutIf => "'else' without 'if'".to_string(),
            CatchWithoutTry => "'catch' without 'try'".to_string(),
            FinallyWithoutTry => "'finally' without 'try'".to_string(),
            TryWithoutCatchOrFinally => {
                "'try' without 'catch', 'finally' or resource declarations".to_string()
            }
            Orphaned => format!("orphaned {}", arg(0)),
            ClassMethodOrFieldExpected => {
                "class, interface, enum, record, method or field expected".to_string()
            }
            StatementNotExpected => {
                "statements not expected outside of methods and initializers".to_string()
            }
            EnumConstantExpected => "enum constant expected here".to_string(),
            EnumConstantNotExpected => "enum constant not expected here".to_string(),
            VariableNotAllowed => "variable declaration not allowed here".to_string(),
            ClassNotAllowed => "class, interface or enum declaration not allowed here".to_string(),
            BadInitializer => "bad initializer for for-loop".to_string(),
            SwitchCaseUnexpectedStatement => {
                "unexpected statement in case, expected is an expression, a block or a throw statement"
                    .to_string()
            }
            GuardNotAllowed => "guards are only allowed for case with a pattern".to_string(),
            InvalidMethodDeclaration => {
                "invalid method declaration; return type required".to_string()
            }
            ArrayDimensionMissing => "array dimension missing".to_string(),
            VarargsMustBeLast => "varargs parameter must be the last parameter".to_string(),
            TooDeeplyNested => "construct nested too deeply".to_string(),
            IllegalUnicodeEscape => "illegal unicode escape".to_string(),
            IllegalEscapeChar => "illegal escape character".to_string(),
            UnclosedStringLiteral => "unclosed string literal".to_string(),
            UnclosedCharLiteral => "unclosed character literal".to_string(),
            UnclosedComment => "unclosed comment".to_string(),
            IllegalChar => format!("illegal character: '{}'", arg(0)),
        }
    }
}

impl DiagnosticCode {
    /// Short text for the primary label of a parse diagnostic.
    pub fn label(self) -> &'static str {
        use DiagnosticCode::*;
        match self {
            Expected | ExpectedOneOf => "expected here",
            PrematureEof => "file ends here",
            ElseWithoutIf | CatchWithoutTry | FinallyWithoutTry | Orphaned => {
                "no enclosing statement"
            }
            VariableNotAllowed
            | ClassNotAllowed
            | GuardNotAllowed
            | StatementNotExpected
            | EnumConstantNotExpected
            | SwitchCaseUnexpectedStatement => "not allowed here",
            TooDeeplyNested => "nesting limit reached here",
            _ => "found here",
        }
    }

    /// Suggested fix, for codes where one applies regardless of context.
    pub fn help(self) -> Option<&'static str> {
        use DiagnosticCode::*;
        match self {
            VariableNotAllowed | ClassNotAllowed => Some("wrap the declaration in a block"),
            InvalidMethodDeclaration => Some("add a return type, or `void`"),
            TryWithoutCatchOrFinally => Some("add a `catch` or `finally` clause"),
            VarargsMustBeLast => Some("move the `...` parameter to the end"),
            GuardNotAllowed => Some("use a type or record pattern before `when`"),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a diagnostic label in the overall diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// The primary location related to this diagnostic.
    Primary,
    /// A secondary or supporting location.
    Secondary,
}

/// A labeled span within a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagLabel {
    /// The span this label refers to.
    pub span: Span,
    /// The label text explaining this span's relevance.
    pub message: String,
    /// Whether this is a primary or secondary label.
    pub role: LabelRole,
}

impl DiagLabel {
    /// Creates a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role: LabelRole::Primary,
        }
    }

    /// Creates a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            role: LabelRole::Secondary,
        }
    }
}

/// A structured diagnostic.
///
/// `position` is the offset the diagnostic points at (for a missing token, the
/// end of the last consumed token); `span` is the source range it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diag {
    /// The severity level of this diagnostic.
    pub severity: DiagSeverity,
    /// What went wrong.
    pub code: DiagnosticCode,
    /// Structured arguments of `code`, already spelled for display.
    pub args: Vec<SmolStr>,
    /// The offset this diagnostic points at.
    pub position: usize,
    /// The source range this diagnostic concerns.
    pub span: Span,
    /// The rendered message.
    pub message: String,
    /// Extra labeled spans for rendering.
    pub labels: Vec<DiagLabel>,
    /// Optional help text suggesting how to fix the issue.
    pub help: Option<String>,
    /// Additional notes providing context or related information.
    pub notes: Vec<String>,
}

impl Diag {
    /// Creates a new diagnostic pointing at the start of `span`.
    pub fn new(severity: DiagSeverity, code: DiagnosticCode, span: Span) -> Self {
        Self {
            severity,
            code,
            args: Vec::new(),
            position: span.start,
            span,
            message: code.message(&[]),
            labels: Vec::new(),
            help: None,
            notes: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(code: DiagnosticCode, span: Span) -> Self {
        Self::new(DiagSeverity::Error, code, span)
    }

    /// Error for a parse problem: labelled at `span`, with the code's help
    /// text when it has one.
    pub fn syntax(code: DiagnosticCode, span: Span, args: Vec<SmolStr>) -> Self {
        let diag = Self::error(code, span.clone())
            .with_args(args)
            .with_primary_label(span, code.label());
        match code.help() {
            Some(help) => diag.with_help(help),
            None => diag,
        }
    }

    /// Replaces the arguments and re-renders the message.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self.message = self.code.message(&self.args);
        self
    }

    /// Points the diagnostic at `position` without changing its span.
    pub fn at(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Adds a primary label to this diagnostic.
    pub fn with_primary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagLabel::primary(span, message));
        self
    }

    /// Adds a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(DiagLabel::secondary(span, message));
        self
    }

    /// Sets the help text for this diagnostic.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Compact `line:column:code` form, handy for assertions.
    pub fn raw(&self, source: &SourceFile) -> String {
        let (line, column) = source.line_col(self.position);
        format!("{line}:{column}:{}", self.code)
    }
}

impl fmt::Display for Diag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.severity, self.message, self.code)
    }
}

/// Append-only collector of diagnostics for one parse.
///
/// While a speculative parse is active, pushes are counted but dropped.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Vec<Diag>,
    speculation_depth: u32,
    dropped: usize,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic unless a speculative parse is running.
    ///
    /// Returns true when the diagnostic was kept.
    pub fn push(&mut self, diag: Diag) -> bool {
        if self.is_speculating() {
            self.dropped += 1;
            false
        } else {
            self.diagnostics.push(diag);
            true
        }
    }

    pub fn enter_speculation(&mut self) {
        self.speculation_depth += 1;
    }

    pub fn exit_speculation(&mut self) {
        self.speculation_depth = self.speculation_depth.saturating_sub(1);
    }

    pub fn is_speculating(&self) -> bool {
        self.speculation_depth > 0
    }

    /// Number of diagnostics swallowed by speculation since the last reset.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diag> {
        self.diagnostics.iter()
    }

    /// Prepends diagnostics produced before parsing started (lexer output).
    pub fn prepend(&mut self, mut earlier: Vec<Diag>) {
        earlier.append(&mut self.diagnostics);
        self.diagnostics = earlier;
    }

    /// Hands the collected diagnostics out and leaves the sink empty.
    pub fn take(&mut self) -> Vec<Diag> {
        self.speculation_depth = 0;
        self.dropped = 0;
        std::mem::take(&mut self.diagnostics)
    }

    /// Clears all state so the sink can serve another parse.
    pub fn reset(&mut self) {
        self.diagnostics.clear();
        self.speculation_depth = 0;
        self.dropped = 0;
    }
}

/// A wrapper around source text for diagnostic rendering.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// The source text content.
    content: String,
    /// Optional filename for display purposes.
    name: Option<String>,
}

impl SourceFile {
    /// Creates a new source file from the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: None,
        }
    }

    /// Creates a new source file with a name.
    pub fn with_name(content: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            name: Some(name.into()),
        }
    }

    /// Returns the source content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the source file name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Validates that a span is within bounds of this source.
    pub fn is_valid_span(&self, span: &Span) -> bool {
        span.start <= self.content.len() && span.end <= self.content.len() && span.start <= span.end
    }

    /// Clamps a span to valid bounds within this source.
    pub fn clamp_span(&self, span: &Span) -> Span {
        let len = self.content.len();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);
        start..end
    }

    /// 1-based line and column (in characters) of a byte offset.
    ///
    /// Offsets past the end are clamped to the end of the text.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let mut offset = offset.min(self.content.len());
        while !self.content.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &self.content[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |index| index + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

/// Converts internal diagnostics to miette Reports with source context.
pub fn convert_diagnostics_to_reports(diagnostics: &[Diag], source: &SourceFile) -> Vec<Report> {
    diagnostics
        .iter()
        .map(|diag| convert_diag_to_report(diag, source))
        .collect()
}

/// Converts a single diagnostic to a miette Report.
///
/// Spans outside the source are clamped. A diagnostic without explicit labels
/// gets a primary label on its own span.
pub fn convert_diag_to_report(diag: &Diag, source: &SourceFile) -> Report {
    let diagnostic = build_diagnostic(diag, source);

    let mut report = Report::new(diagnostic);

    if let Some(name) = source.name() {
        report =
            report.with_source_code(miette::NamedSource::new(name, source.content().to_string()));
    } else {
        report = report.with_source_code(source.content().to_string());
    }

    report
}

fn build_diagnostic(diag: &Diag, source: &SourceFile) -> BuiltDiagnostic {
    let mut labels = Vec::new();
    for label in &diag.labels {
        let clamped_span = source.clamp_span(&label.span);
        let span = (clamped_span.start, clamped_span.end - clamped_span.start);
        let labeled_span = match label.role {
            LabelRole::Primary => {
                LabeledSpan::new_primary_with_span(Some(label.message.clone()), span)
            }
            LabelRole::Secondary => LabeledSpan::new_with_span(Some(label.message.clone()), span),
        };
        labels.push(labeled_span);
    }
    if labels.is_empty() {
        let clamped_span = source.clamp_span(&(diag.position..diag.position.max(diag.span.end)));
        let span = (clamped_span.start, clamped_span.end - clamped_span.start);
        labels.push(LabeledSpan::new_primary_with_span(None, span));
    }

    BuiltDiagnostic {
        message: diag.message.clone(),
        severity: match diag.severity {
            DiagSeverity::Error => Severity::Error,
            DiagSeverity::Warning => Severity::Warning,
            DiagSeverity::Note => Severity::Advice,
        },
        code: diag.code.as_str(),
        help: diag.help.clone(),
        labels,
        related: diag
            .notes
            .iter()
            .cloned()
            .map(NoteDiagnostic::new)
            .collect(),
    }
}

/// The final diagnostic type that implements miette's Diagnostic trait.
#[derive(Debug)]
struct BuiltDiagnostic {
    message: String,
    severity: Severity,
    code: &'static str,
    help: Option<String>,
    labels: Vec<LabeledSpan>,
    related: Vec<NoteDiagnostic>,
}

#[derive(Debug)]
struct NoteDiagnostic {
    message: String,
}

impl NoteDiagnostic {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for NoteDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for BuiltDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for BuiltDiagnostic {}
impl std::error::Error for NoteDiagnostic {}

impl Diagnostic for BuiltDiagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(self.severity)
    }

    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(self.labels.clone().into_iter()))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        if self.related.is_empty() {
            None
        } else {
            Some(Box::new(
                self.related.iter().map(|diag| diag as &dyn Diagnostic),
            ))
        }
    }
}

impl Diagnostic for NoteDiagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(Severity::Advice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_display() {
        assert_eq!(DiagSeverity::Error.to_string(), "error");
        assert_eq!(DiagSeverity::Warning.to_string(), "warning");
        assert_eq!(DiagSeverity::Note.to_string(), "note");
    }

    #[test]
    fn expected_messages_use_arguments() {
        let diag = Diag::error(DiagnosticCode::Expected, 4..4).with_args(["';'"]);
        assert_eq!(diag.message, "';' expected");

        let diag = Diag::error(DiagnosticCode::ExpectedOneOf, 4..4).with_args(["','", "'}'", "';'"]);
        assert_eq!(diag.message, "',', '}', or ';' expected");
        assert_eq!(diag.args.len(), 3);
    }

    #[test]
    fn code_keys_are_stable() {
        assert_eq!(DiagnosticCode::ElseWithoutIf.as_str(), "else-without-if");
        assert_eq!(DiagnosticCode::ExpectedOneOf.to_string(), "expected-one-of");
    }

    #[test]
    fn position_defaults_to_span_start() {
        let diag = Diag::error(DiagnosticCode::NotStmt, 10..15);
        assert_eq!(diag.position, 10);
        assert_eq!(diag.at(12).position, 12);
    }

    #[test]
    fn diag_builder_multi_label() {
        let diag = Diag::error(DiagnosticCode::ClassNotAllowed, 20..25)
            .with_primary_label(20..25, "declared here")
            .with_secondary_label(5..10, "inside this statement")
            .with_help("wrap the declaration in a block");

        assert_eq!(diag.labels.len(), 2);
        assert_eq!(diag.labels[0].role, LabelRole::Primary);
        assert_eq!(diag.labels[1].role, LabelRole::Secondary);
        assert_eq!(diag.help.as_deref(), Some("wrap the declaration in a block"));
    }

    #[test]
    fn syntax_diag_is_labelled() {
        let diag = Diag::syntax(DiagnosticCode::ClassNotAllowed, 20..25, Vec::new());
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.labels[0].role, LabelRole::Primary);
        assert_eq!(diag.labels[0].span, 20..25);
        assert_eq!(diag.labels[0].message, "not allowed here");
        assert_eq!(diag.help.as_deref(), Some("wrap the declaration in a block"));

        let diag = Diag::syntax(DiagnosticCode::Expected, 7..7, vec!["';'".into()]);
        assert_eq!(diag.message, "';' expected");
        assert_eq!(diag.help, None);
    }

    #[test]
    fn line_col_is_one_based() {
        let src = SourceFile::new("ab\ncd\n");
        assert_eq!(src.line_col(0), (1, 1));
        assert_eq!(src.line_col(1), (1, 2));
        assert_eq!(src.line_col(3), (2, 1));
        assert_eq!(src.line_col(100), (3, 1));
    }

    #[test]
    fn raw_form() {
        let src = SourceFile::new("class T {\n    else;\n}");
        let diag = Diag::error(DiagnosticCode::ElseWithoutIf, 14..18);
        assert_eq!(diag.raw(&src), "2:5:else-without-if");
    }

    #[test]
    fn sink_drops_while_speculating() {
        let mut sink = DiagnosticSink::new();
        sink.enter_speculation();
        assert!(!sink.push(Diag::error(DiagnosticCode::NotStmt, 0..1)));
        sink.exit_speculation();
        assert!(sink.push(Diag::error(DiagnosticCode::NotStmt, 0..1)));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.dropped(), 1);

        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        assert!(sink.is_empty());
        assert_eq!(sink.dropped(), 0);
    }

    #[test]
    fn sink_prepend_keeps_lexer_diagnostics_first() {
        let mut sink = DiagnosticSink::new();
        sink.push(Diag::error(DiagnosticCode::NotStmt, 5..6));
        sink.prepend(vec![Diag::error(DiagnosticCode::UnclosedComment, 0..3)]);
        let codes: Vec<_> = sink.iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![DiagnosticCode::UnclosedComment, DiagnosticCode::NotStmt]);
    }

    #[test]
    fn source_file_clamp_span() {
        let src = SourceFile::new("hello");
        assert_eq!(src.clamp_span(&(0..10)), 0..5);
        let inverted = std::ops::Range { start: 3, end: 2 };
        assert_eq!(src.clamp_span(&inverted), 3..3);
        assert!(src.is_valid_span(&(2..4)));
        assert!(!src.is_valid_span(&(0..6)));
    }

    #[test]
    fn convert_simple_error() {
        let source = SourceFile::with_name("class C { int m() }", "C.java");
        let diag = Diag::error(DiagnosticCode::ExpectedOneOf, 17..17).with_args(["'{'", "';'"]);

        let report = convert_diag_to_report(&diag, &source);
        assert_eq!(report.to_string(), "'{' or ';' expected");
        let built = build_diagnostic(&diag, &source);
        assert_eq!(built.code, "expected-one-of");
        assert_eq!(built.labels.len(), 1);
        assert!(built.labels[0].primary());
        assert_eq!(built.severity, Severity::Error);
    }

    #[test]
    fn convert_exposes_notes_as_related_diagnostics() {
        let source = SourceFile::new("content");
        let diag = Diag::error(DiagnosticCode::NotStmt, 0..7)
            .with_note("first note")
            .with_note("second note");

        let built = build_diagnostic(&diag, &source);
        let related = built
            .related()
            .expect("expected related diagnostics")
            .collect::<Vec<_>>();
        assert_eq!(related.len(), 2);
        assert_eq!(related[0].to_string(), "first note");
        assert_eq!(related[0].severity(), Some(Severity::Advice));
    }

    #[test]
    fn convert_with_invalid_span() {
        let source = SourceFile::new("short");
        let diag = Diag::error(DiagnosticCode::PrematureEof, 0..100)
            .with_primary_label(0..100, "out of bounds");

        let report = convert_diag_to_report(&diag, &source);
        assert_eq!(report.to_string(), "reached end of file while parsing");
    }

    #[test]
    fn convert_multiple_diagnostics() {
        let source = SourceFile::new("test source");
        let diags = vec![
            Diag::error(DiagnosticCode::NotStmt, 0..4),
            Diag::new(DiagSeverity::Warning, DiagnosticCode::IllegalChar, 5..6).with_args(["#"]),
        ];

        let reports = convert_diagnostics_to_reports(&diags, &source);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].to_string(), "not a statement");
        assert_eq!(reports[1].to_string(), "illegal character: '#'");
    }
}
