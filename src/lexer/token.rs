//! Token types and representations for Java lexical analysis.

use crate::ast::Span;
use logos::Logos;
use smol_str::SmolStr;
use std::fmt;

/// The kind of a lexical token.
///
/// Every `>` is its own token: shift operators are assembled by the parser
/// from adjacent `>` tokens so that nested type arguments close naturally.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\f]+|//[^\r\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("abstract")]
    Abstract,
    #[token("assert")]
    Assert,
    #[token("boolean")]
    Boolean,
    #[token("break")]
    Break,
    #[token("byte")]
    Byte,
    #[token("case")]
    Case,
    #[token("catch")]
    Catch,
    #[token("char")]
    Char,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("do")]
    Do,
    #[token("double")]
    Double,
    #[token("else")]
    Else,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("final")]
    Final,
    #[token("finally")]
    Finally,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("implements")]
    Implements,
    #[token("import")]
    Import,
    #[token("instanceof")]
    Instanceof,
    #[token("int")]
    Int,
    #[token("interface")]
    Interface,
    #[token("long")]
    Long,
    #[token("native")]
    Native,
    #[token("new")]
    New,
    #[token("package")]
    Package,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("return")]
    Return,
    #[token("short")]
    Short,
    #[token("static")]
    Static,
    #[token("strictfp")]
    Strictfp,
    #[token("super")]
    Super,
    #[token("switch")]
    Switch,
    #[token("synchronized")]
    Synchronized,
    #[token("this")]
    This,
    #[token("throw")]
    Throw,
    #[token("throws")]
    Throws,
    #[token("transient")]
    Transient,
    #[token("try")]
    Try,
    #[token("void")]
    Void,
    #[token("volatile")]
    Volatile,
    #[token("while")]
    While,

    // Literal keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Literals
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    #[regex(r"0[bB][01_]+")]
    #[regex(r"[0-9][0-9_]*")]
    IntLiteral,
    #[regex(r"0[xX][0-9a-fA-F_]+[lL]")]
    #[regex(r"0[bB][01_]+[lL]")]
    #[regex(r"[0-9][0-9_]*[lL]")]
    LongLiteral,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?[fF]")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fF]")]
    #[regex(r"[0-9][0-9_]*([eE][+-]?[0-9]+)?[fF]")]
    FloatLiteral,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?[dD]?")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[dD]?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+[dD]?")]
    #[regex(r"[0-9][0-9_]*[dD]")]
    DoubleLiteral,
    #[regex(r"'([^'\\\r\n]|\\u+[0-9a-fA-F]{4}|\\[0-7]{1,3}|\\[^u\r\n])'")]
    CharLiteral,
    #[regex(r#""([^"\\\r\n]|\\u+[0-9a-fA-F]{4}|\\[^u\r\n])*""#)]
    StringLiteral,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    // Separators
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("@")]
    At,
    #[token("::")]
    ColonColon,

    // Operators
    #[token("=")]
    Eq,
    #[token(">")]
    Gt,
    #[token("<")]
    Lt,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("->")]
    Arrow,
    #[token("==")]
    EqEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("!=")]
    BangEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("%")]
    Percent,
    #[token("<<")]
    LtLt,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("%=")]
    PercentEq,
    #[token("<<=")]
    LtLtEq,

    // Comments: block comments are dropped, `/** */` survives as a doc comment.
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", priority = 2)]
    BlockComment,
    DocComment,

    // Special
    /// Malformed input the lexer could not turn into a real token.
    Error,
    Eof,
}

impl TokenKind {
    /// Returns true for reserved words, including the literal keywords.
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Abstract
                | Assert
                | Boolean
                | Break
                | Byte
                | Case
                | Catch
                | Char
                | Class
                | Const
                | Continue
                | Default
                | Do
                | Double
                | Else
                | Enum
                | Extends
                | Final
                | Finally
                | Float
                | For
                | Goto
                | If
                | Implements
                | Import
                | Instanceof
                | Int
                | Interface
                | Long
                | Native
                | New
                | Package
                | Private
                | Protected
                | Public
                | Return
                | Short
                | Static
                | Strictfp
                | Super
                | Switch
                | Synchronized
                | This
                | Throw
                | Throws
                | Transient
                | Try
                | Void
                | Volatile
                | While
                | True
                | False
                | Null
        )
    }

    /// Returns true if this token kind is a literal.
    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }

    /// Returns true for keyword modifiers (annotations and `sealed` are handled separately).
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Protected
                | TokenKind::Private
                | TokenKind::Static
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Native
                | TokenKind::Synchronized
                | TokenKind::Transient
                | TokenKind::Volatile
                | TokenKind::Strictfp
                | TokenKind::Default
        )
    }

    /// Returns true for the eight primitive type keywords.
    pub fn is_primitive_type(self) -> bool {
        matches!(
            self,
            TokenKind::Boolean
                | TokenKind::Byte
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
        )
    }

    /// Returns true for `=` and the compound assignment operators.
    ///
    /// `>>=` and `>>>=` are assembled from adjacent tokens by the parser.
    pub fn is_assignment_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::StarEq
                | TokenKind::SlashEq
                | TokenKind::AmpEq
                | TokenKind::PipeEq
                | TokenKind::CaretEq
                | TokenKind::PercentEq
                | TokenKind::LtLtEq
        )
    }

    /// Returns true for comment kinds the parser never sees as syntax.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::BlockComment | TokenKind::DocComment)
    }

    /// Returns true when the kind has a single fixed spelling.
    pub fn has_fixed_spelling(self) -> bool {
        !matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::CharLiteral
                | TokenKind::StringLiteral
                | TokenKind::Identifier
                | TokenKind::BlockComment
                | TokenKind::DocComment
                | TokenKind::Error
                | TokenKind::Eof
        )
    }

    /// The source spelling of fixed tokens, or a descriptive placeholder.
    pub fn spelling(self) -> &'static str {
        use TokenKind::*;
        match self {
            Abstract => "abstract",
            Assert => "assert",
            Boolean => "boolean",
            Break => "break",
            Byte => "byte",
            Case => "case",
            Catch => "catch",
            Char => "char",
            Class => "class",
            Const => "const",
            Continue => "continue",
            Default => "default",
            Do => "do",
            Double => "double",
            Else => "else",
            Enum => "enum",
            Extends => "extends",
            Final => "final",
            Finally => "finally",
            Float => "float",
            For => "for",
            Goto => "goto",
            If => "if",
            Implements => "implements",
            Import => "import",
            Instanceof => "instanceof",
            Int => "int",
            Interface => "interface",
            Long => "long",
            Native => "native",
            New => "new",
            Package => "package",
            Private => "private",
            Protected => "protected",
            Public => "public",
            Return => "return",
            Short => "short",
            Static => "static",
            Strictfp => "strictfp",
            Super => "super",
            Switch => "switch",
            Synchronized => "synchronized",
            This => "this",
            Throw => "throw",
            Throws => "throws",
            Transient => "transient",
            Try => "try",
            Void => "void",
            Volatile => "volatile",
            While => "while",
            True => "true",
            False => "false",
            Null => "null",
            IntLiteral => "<int literal>",
            LongLiteral => "<long literal>",
            FloatLiteral => "<float literal>",
            DoubleLiteral => "<double literal>",
            CharLiteral => "<char literal>",
            StringLiteral => "<string literal>",
            Identifier => "<identifier>",
            LParen => "(",
            RParen => ")",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            Semicolon => ";",
            Comma => ",",
            Dot => ".",
            Ellipsis => "...",
            At => "@",
            ColonColon => "::",
            Eq => "=",
            Gt => ">",
            Lt => "<",
            Bang => "!",
            Tilde => "~",
            Question => "?",
            Colon => ":",
            Arrow => "->",
            EqEq => "==",
            LtEq => "<=",
            GtEq => ">=",
            BangEq => "!=",
            AmpAmp => "&&",
            PipePipe => "||",
            PlusPlus => "++",
            MinusMinus => "--",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Amp => "&",
            Pipe => "|",
            Caret => "^",
            Percent => "%",
            LtLt => "<<",
            PlusEq => "+=",
            MinusEq => "-=",
            StarEq => "*=",
            SlashEq => "/=",
            AmpEq => "&=",
            PipeEq => "|=",
            CaretEq => "^=",
            PercentEq => "%=",
            LtLtEq => "<<=",
            BlockComment => "<comment>",
            DocComment => "<doc comment>",
            Error => "<error>",
            Eof => "<EOF>",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_fixed_spelling() {
            write!(f, "'{}'", self.spelling())
        } else {
            f.write_str(self.spelling())
        }
    }
}

/// A lexical token with its kind, source text and span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in source text.
    pub span: Span,
    /// The exact source text of the token.
    pub text: SmolStr,
}

impl Token {
    /// Creates a new token.
    pub fn new(kind: TokenKind, span: Span, text: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            span,
            text: text.into(),
        }
    }

    /// Creates a token whose text is the fixed spelling of `kind`.
    pub fn fixed(kind: TokenKind, start: usize) -> Self {
        let text = kind.spelling();
        Self::new(kind, start..start + text.len(), text)
    }

    /// Returns the source slice covered by this token.
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.clone()]
    }

    /// Returns true if this is an identifier spelled exactly `word`.
    ///
    /// Contextual keywords (`var`, `yield`, `record`, `sealed`, `permits`, `when`)
    /// are identifiers at the token level.
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Error => write!(f, "'{}'", self.text),
            kind => write!(f, "{kind}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_creation() {
        let token = Token::new(TokenKind::Class, 0..5, "class");
        assert_eq!(token.kind, TokenKind::Class);
        assert_eq!(token.span, 0..5);
        assert_eq!(token.text, "class");
    }

    #[test]
    fn fixed_token_uses_spelling() {
        let token = Token::fixed(TokenKind::ColonColon, 4);
        assert_eq!(token.span, 4..6);
        assert_eq!(token.text, "::");
    }

    #[test]
    fn token_kind_is_keyword() {
        assert!(TokenKind::Class.is_keyword());
        assert!(TokenKind::Null.is_keyword());
        assert!(!TokenKind::Identifier.is_keyword());
        assert!(!TokenKind::Plus.is_keyword());
    }

    #[test]
    fn token_kind_is_literal() {
        assert!(TokenKind::StringLiteral.is_literal());
        assert!(TokenKind::IntLiteral.is_literal());
        assert!(TokenKind::True.is_literal());
        assert!(!TokenKind::Class.is_literal());
    }

    #[test]
    fn contextual_keywords_are_words() {
        let token = Token::new(TokenKind::Identifier, 0..3, "var");
        assert!(token.is_word("var"));
        assert!(!token.is_word("yield"));
    }

    #[test]
    fn token_kind_display() {
        assert_eq!(TokenKind::Semicolon.to_string(), "';'");
        assert_eq!(TokenKind::Class.to_string(), "'class'");
        assert_eq!(TokenKind::Identifier.to_string(), "<identifier>");
        assert_eq!(TokenKind::Eof.to_string(), "<EOF>");
    }
}
