//! `logos`-generated scanner for the context-free bulk of the token
//! grammar: identifiers, numbers, (non-template) strings and the fixed
//! punctuator/operator alphabet.
//!
//! Everything that needs lookahead state beyond "match this pattern" —
//! the `/`-vs-regex and template-brace-nesting decisions spec.md §4.1
//! calls out — is handled by [`super::lexer::Lexer`], which drives this
//! scanner one token at a time and special-cases those productions
//! before ever asking `Raw` to match. Comments and ASCII/Unicode
//! horizontal whitespace are skipped here; line terminators are handled
//! by the wrapper so it can track line/column itself.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\x0B\x0C\u{00A0}\u{FEFF}]+")]
#[logos(skip r"//[^\n\r\u{2028}\u{2029}]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub(super) enum Raw {
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"#[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    PrivateIdent(String),

    #[regex(r"0[xX][0-9a-fA-F][0-9a-fA-F_]*n?", |lex| lex.slice().to_string())]
    #[regex(r"0[oO][0-7][0-7_]*n?", |lex| lex.slice().to_string())]
    #[regex(r"0[bB][01][01_]*n?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9]+)?n?", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9]+)?", |lex| lex.slice().to_string())]
    #[regex(r"[0-9][0-9_]*([eE][+-]?[0-9]+)?n?", |lex| lex.slice().to_string())]
    Number(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| lex.slice().to_string())]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| lex.slice().to_string())]
    Str(String),

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("...")]
    Ellipsis,
    #[token(".")]
    Dot,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("<<=")]
    ShlAssign,
    #[token(">>>=")]
    UShrAssign,
    #[token(">>=")]
    ShrAssign,
    #[token("<<")]
    Shl,
    #[token(">>>")]
    UShr,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("===")]
    EqEqEq,
    #[token("!==")]
    NotEqEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("=>")]
    Arrow,
    #[token("**=")]
    StarStarAssign,
    #[token("**")]
    StarStar,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("%=")]
    PercentAssign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("%")]
    Percent,
    #[token("&&=")]
    AmpAmpAssign,
    #[token("||=")]
    PipePipeAssign,
    #[token("??=")]
    QQAssign,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QQ,
    #[token("&=")]
    AmpAssign,
    #[token("|=")]
    PipeAssign,
    #[token("^=")]
    CaretAssign,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("?.")]
    QDot,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("=")]
    Assign,
}
