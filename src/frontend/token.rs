//! Token kinds and the `Token` struct the lexer emits.
//!
//! The kind taxonomy follows spec.md §3.1 (~90 kinds across keywords,
//! punctuators, literals, template parts and regex). Contextual keywords
//! (`async`, `await`, `yield`, `of`, `from`, `as`, `let`, `get`, `set`,
//! `static`) get their own kind; the parser decides whether they behave
//! as a keyword or an ordinary identifier at a given position.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // --- literals & identifiers ---
    Identifier,
    PrivateIdentifier, // #name
    Number,
    String,
    NoSubstitutionTemplate,
    TemplateHead,
    TemplateMiddle,
    TemplateTail,
    RegExp,

    // --- reserved keywords ---
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Export,
    Extends,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    False,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,

    // --- contextual keywords ---
    Let,
    Static,
    Yield,
    Async,
    Await,
    Of,
    From,
    As,
    Get,
    Set,

    // --- punctuators ---
    LBrace,    // {
    RBrace,    // }
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Dot,       // .
    Ellipsis,  // ...
    Semicolon, // ;
    Comma,     // ,
    Lt,        // <
    Gt,        // >
    Le,        // <=
    Ge,        // >=
    EqEq,      // ==
    NotEq,     // !=
    EqEqEq,    // ===
    NotEqEq,   // !==
    Plus,      // +
    Minus,     // -
    Star,      // *
    Percent,   // %
    StarStar,  // **
    PlusPlus,  // ++
    MinusMinus, // --
    Shl,       // <<
    Shr,       // >>
    UShr,      // >>>
    Amp,       // &
    Pipe,      // |
    Caret,     // ^
    Bang,      // !
    Tilde,     // ~
    AmpAmp,    // &&
    PipePipe,  // ||
    QQ,        // ??
    QDot,      // ?.
    Question,  // ?
    Colon,     // :
    Assign,    // =
    PlusAssign,
    MinusAssign,
    StarAssign,
    PercentAssign,
    StarStarAssign,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    AmpAmpAssign,
    PipePipeAssign,
    QQAssign,
    Arrow, // =>
    Slash, // /
    SlashAssign, // /=

    Eof,
    Illegal,
}

impl TokenKind {
    /// True for token kinds that can end an expression — used by the
    /// lexer to decide whether a following `/` is divide or a regex
    /// literal start (spec.md §4.1 rule 1).
    pub fn can_end_expression(self) -> bool {
        matches!(
            self,
            TokenKind::Identifier
                | TokenKind::PrivateIdentifier
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::NoSubstitutionTemplate
                | TokenKind::TemplateTail
                | TokenKind::RegExp
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::This
                | TokenKind::Super
                | TokenKind::Null
                | TokenKind::True
                | TokenKind::False
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A single lexical token: its kind, the exact source lexeme, and its
/// 1-based line/column (spec.md §4.1 "Line/column tracking").
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn eof(line: u32, column: u32) -> Self {
        Self::new(TokenKind::Eof, "", line, column)
    }
}

/// Reserved-word lookup used by the identifier scanner.
pub fn keyword_kind(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "break" => TokenKind::Break,
        "case" => TokenKind::Case,
        "catch" => TokenKind::Catch,
        "class" => TokenKind::Class,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "debugger" => TokenKind::Debugger,
        "default" => TokenKind::Default,
        "delete" => TokenKind::Delete,
        "do" => TokenKind::Do,
        "else" => TokenKind::Else,
        "export" => TokenKind::Export,
        "extends" => TokenKind::Extends,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "in" => TokenKind::In,
        "instanceof" => TokenKind::Instanceof,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "switch" => TokenKind::Switch,
        "this" => TokenKind::This,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        "with" => TokenKind::With,
        "let" => TokenKind::Let,
        "static" => TokenKind::Static,
        "yield" => TokenKind::Yield,
        "async" => TokenKind::Async,
        "await" => TokenKind::Await,
        "of" => TokenKind::Of,
        "from" => TokenKind::From,
        "as" => TokenKind::As,
        "get" => TokenKind::Get,
        "set" => TokenKind::Set,
        _ => return None,
    })
}
