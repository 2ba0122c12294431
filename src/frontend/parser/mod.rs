//! Recursive-descent statement parser + Pratt expression parser (spec.md
//! §4.2). Two-token lookahead (`current`, `peek`); the lexer is fed the
//! previously-emitted token's kind so it can keep resolving the
//! regex-vs-divide ambiguity on its own (spec.md §4.1 rule 1).
//!
//! Split by concern the way the interpreter is: [`expressions`] owns the
//! Pratt precedence chain, [`statements`] owns the per-keyword statement
//! dispatch, [`patterns`] owns destructuring-pattern parsing and the
//! expr-to-pattern conversion arrow speculation needs.

mod expressions;
mod patterns;
mod statements;

use crate::frontend::ast::{Program, Span};
use crate::frontend::lexer::Lexer;
use crate::frontend::token::{Token, TokenKind};

/// A single parse diagnostic (spec.md §4.2.3). A non-empty list returned
/// from [`Parser::errors`] means the caller should treat the AST as a
/// partial, best-effort parse rather than a valid program.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

/// Saved lexer/token state for the backtracking arrow-function speculation
/// needs (spec.md §4.2.2): parse the parenthesized content permissively,
/// and if it doesn't turn out to be followed by `=>`, rewind and let the
/// ordinary expression grammar parse it instead.
struct Checkpoint<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors_len: usize,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
    /// Line of the most recently consumed (bumped-out) token, used by ASI
    /// and the break/continue/return/throw line-break checks.
    last_line: u32,
    in_generator: bool,
    in_async: bool,
    /// Suppresses `in` as a binary operator while parsing a `for(...)`
    /// head, so `for (x in y)` is recognized as ForIn (spec.md §4.2.2).
    no_in: bool,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token(TokenKind::Eof);
        let peek = lexer.next_token(current.kind);
        let last_line = current.line;
        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
            last_line,
            in_generator: false,
            in_async: false,
            no_in: false,
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn parse_program(&mut self) -> Program {
        let mut body = Vec::new();
        while !self.at(TokenKind::Eof) {
            let before = self.current.clone();
            body.push(self.parse_statement());
            // Guard against a statement parser that failed to make
            // progress (malformed input) turning into an infinite loop.
            if self.current == before && !self.at(TokenKind::Eof) {
                self.error(format!(
                    "unexpected token {:?} '{}'",
                    self.current.kind, self.current.lexeme
                ));
                self.bump();
            }
        }
        Program { body }
    }

    // --- token-stream primitives ---

    fn kind(&self) -> TokenKind {
        self.current.kind
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek.kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn span(&self) -> Span {
        Span::new(self.current.line, self.current.column)
    }

    /// True when a line terminator separates the last consumed token from
    /// the current one (used for ASI and the `break`/`continue`/`return`/
    /// `throw` optional-argument rule, spec.md §4.2.2).
    fn line_break_before_current(&self) -> bool {
        self.current.line > self.last_line
    }

    fn bump(&mut self) -> Token {
        let old_current = std::mem::replace(&mut self.current, self.peek.clone());
        self.last_line = old_current.line;
        let next = self.lexer.next_token(self.current.kind);
        self.peek = next;
        old_current
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or record a diagnostic; does not consume on mismatch
    /// so the caller's best-effort recovery can keep scanning.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Token {
        if self.at(kind) {
            self.bump()
        } else {
            self.error(format!(
                "expected {what}, found {:?} '{}'",
                self.current.kind, self.current.lexeme
            ));
            self.current.clone()
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(ParseError {
            line: self.current.line,
            column: self.current.column,
            message: message.into(),
        });
    }

    /// ASI (spec.md §4.2.2): accept a literal `;`, or its absence before
    /// EOF/`}`/a line break.
    fn consume_semicolon(&mut self) {
        if self.eat(TokenKind::Semicolon) {
            return;
        }
        if matches!(self.kind(), TokenKind::Eof | TokenKind::RBrace) {
            return;
        }
        if self.line_break_before_current() {
            return;
        }
        self.error(format!(
            "expected ';', found {:?} '{}'",
            self.current.kind, self.current.lexeme
        ));
    }

    /// Contextual keywords (`let`, `static`, `yield`, `async`, `await`,
    /// `of`, `from`, `as`, `get`, `set`) double as ordinary identifiers
    /// outside the position that gives them special meaning (spec.md
    /// §3.1).
    fn is_identifier_like(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Identifier
                | TokenKind::Let
                | TokenKind::Static
                | TokenKind::Yield
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::Of
                | TokenKind::From
                | TokenKind::As
                | TokenKind::Get
                | TokenKind::Set
        )
    }

    fn bump_identifier_name(&mut self) -> String {
        if self.is_identifier_like() {
            self.bump().lexeme
        } else {
            self.error(format!(
                "expected identifier, found {:?} '{}'",
                self.current.kind, self.current.lexeme
            ));
            self.bump().lexeme
        }
    }

    fn checkpoint(&self) -> Checkpoint<'a> {
        Checkpoint {
            lexer: self.lexer.clone(),
            current: self.current.clone(),
            peek: self.peek.clone(),
            errors_len: self.errors.len(),
        }
    }

    fn restore(&mut self, cp: Checkpoint<'a>) {
        self.lexer = cp.lexer;
        self.current = cp.current;
        self.peek = cp.peek;
        self.errors.truncate(cp.errors_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Expr, Statement};

    fn parse_ok(src: &str) -> Program {
        let mut p = Parser::new(src);
        let program = p.parse_program();
        assert!(p.errors().is_empty(), "unexpected parse errors: {:?}", p.errors());
        program
    }

    #[test]
    fn parses_arithmetic_precedence() {
        let program = parse_ok("1 + 2 * 3;");
        match &program.body[0] {
            Statement::ExpressionStatement { expr: Expr::Binary { op, .. }, .. } => {
                assert_eq!(*op, crate::frontend::ast::BinaryOp::Add);
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn parses_var_declaration() {
        let program = parse_ok("let x = 1, y = 2;");
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn parses_function_declaration() {
        let program = parse_ok("function add(a, b) { return a + b; }");
        match &program.body[0] {
            Statement::FunctionDeclaration { function, .. } => {
                assert_eq!(function.name.as_deref(), Some("add"));
                assert_eq!(function.params.len(), 2);
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn parses_arrow_function_with_single_param() {
        let program = parse_ok("const f = x => x + 1;");
        assert_eq!(program.body.len(), 1);
    }

    #[test]
    fn parses_class_with_superclass() {
        let program = parse_ok("class Dog extends Animal { bark() { return 1; } }");
        match &program.body[0] {
            Statement::ClassDeclaration { name, superclass, .. } => {
                assert_eq!(name, "Dog");
                assert!(superclass.is_some());
            }
            other => panic!("unexpected statement: {other:?}"),
        }
    }

    #[test]
    fn reports_error_on_malformed_input() {
        let mut p = Parser::new("let = ;");
        p.parse_program();
        assert!(!p.errors().is_empty());
    }
}
