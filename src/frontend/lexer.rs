//! Hand-written driver around the generated [`super::raw::Raw`] scanner.
//!
//! `logos` happily matches the context-free bulk of the grammar, but three
//! productions need state a regex automaton cannot carry (spec.md §4.1):
//!
//! 1. A bare `/` is either division or the start of a regex literal,
//!    decided by whether the previous token could end an expression
//!    ([`TokenKind::can_end_expression`]).
//! 2. Template literals recursively contain expressions inside `${ }`,
//!    so `}` is ambiguous between "close this block" and "resume
//!    scanning the template" — tracked with an explicit nesting stack.
//! 3. `?.` is not optional chaining when followed by a digit (`a ? .5 : b`
//!    must parse as a ternary, not `a` `?.` `5`).
//!
//! Everything else is delegated to `Raw::lexer` one token at a time.

use logos::Logos;

use super::raw::Raw;
use super::token::{keyword_kind, Token, TokenKind};

/// What the brace we're tracking means for template re-entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BraceContext {
    /// An ordinary `{ ... }` (block, object literal, etc.) — ignored by
    /// the template-resumption logic.
    Plain,
    /// This `{` opened a `${` substitution; the matching `}` should
    /// resume scanning the template string instead of emitting `RBrace`.
    TemplateSubstitution,
}

#[derive(Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    column: u32,
    /// Stack of brace contexts, pushed on every `{` and popped on every
    /// matching `}`, regardless of nesting source (spec.md §4.1 rule 2).
    braces: Vec<BraceContext>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            braces: Vec::new(),
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn advance_raw(&mut self, len: usize) -> &'a str {
        let text = &self.source[self.pos..self.pos + len];
        for ch in text.chars() {
            self.bump_line_col(ch);
        }
        self.pos += len;
        text
    }

    fn bump_line_col(&mut self, ch: char) {
        match ch {
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.line += 1;
                self.column = 1;
            }
            '\r' => {
                // Bare CR or CRLF: CRLF collapses to a single line break
                // because the '\n' is consumed on the next iteration and
                // intentionally does not bump the line again (see the
                // lookahead guard in `skip_trivia`).
                self.line += 1;
                self.column = 1;
            }
            _ => self.column += 1,
        }
    }

    /// Skip whitespace and comments, tracking line terminators by hand so
    /// every line-terminator form in spec.md §4.1 (LF, CR, CRLF, U+2028,
    /// U+2029) advances the line counter exactly once.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek_byte() {
                Some(b' ' | b'\t' | 0x0B | 0x0C) => {
                    self.pos += 1;
                    self.column += 1;
                }
                Some(b'\r') => {
                    self.pos += 1;
                    if self.peek_byte() == Some(b'\n') {
                        self.pos += 1;
                    }
                    self.line += 1;
                    self.column = 1;
                }
                Some(b'\n') => {
                    self.pos += 1;
                    self.line += 1;
                    self.column = 1;
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'/') => {
                    while let Some(b) = self.peek_byte() {
                        if b == b'\n' || b == b'\r' {
                            break;
                        }
                        if self.is_at_line_separator() {
                            break;
                        }
                        self.pos += 1;
                        self.column += 1;
                    }
                }
                Some(b'/') if self.peek_byte_at(1) == Some(b'*') => {
                    self.pos += 2;
                    self.column += 2;
                    loop {
                        match self.peek_byte() {
                            None => break,
                            Some(b'*') if self.peek_byte_at(1) == Some(b'/') => {
                                self.pos += 2;
                                self.column += 2;
                                break;
                            }
                            Some(_) => {
                                let ch = self.rest().chars().next().unwrap();
                                self.pos += ch.len_utf8();
                                self.bump_line_col(ch);
                            }
                        }
                    }
                }
                _ => {
                    if self.is_at_unicode_space_or_sep() {
                        let ch = self.rest().chars().next().unwrap();
                        self.pos += ch.len_utf8();
                        if ch == '\u{2028}' || ch == '\u{2029}' {
                            self.line += 1;
                            self.column = 1;
                        } else {
                            self.column += 1;
                        }
                        continue;
                    }
                    break;
                }
            }
        }
    }

    fn is_at_line_separator(&self) -> bool {
        matches!(self.rest().chars().next(), Some('\u{2028}' | '\u{2029}'))
    }

    fn is_at_unicode_space_or_sep(&self) -> bool {
        matches!(
            self.rest().chars().next(),
            Some('\u{00A0}' | '\u{FEFF}' | '\u{2028}' | '\u{2029}')
        )
    }

    fn make(&self, kind: TokenKind, lexeme: impl Into<String>, start_line: u32, start_col: u32) -> Token {
        Token::new(kind, lexeme, start_line, start_col)
    }

    /// Produce the next token. `previous_kind` is the kind of the token
    /// returned by the prior call (or `TokenKind::Eof` at the very start),
    /// and is how the regex/divide ambiguity gets resolved.
    pub fn next_token(&mut self, previous_kind: TokenKind) -> Token {
        self.skip_trivia();
        let start_line = self.line;
        let start_col = self.column;

        let Some(byte) = self.peek_byte() else {
            return Token::eof(start_line, start_col);
        };

        match byte {
            b'`' => return self.scan_template_head(start_line, start_col),
            b'/' if !previous_kind.can_end_expression() => {
                return self.scan_regex(start_line, start_col)
            }
            b'/' if self.peek_byte_at(1) == Some(b'=') => {
                self.advance_raw(2);
                return self.make(TokenKind::SlashAssign, "/=", start_line, start_col);
            }
            b'/' => {
                self.advance_raw(1);
                return self.make(TokenKind::Slash, "/", start_line, start_col);
            }
            b'}' => {
                if self.braces.pop() == Some(BraceContext::TemplateSubstitution) {
                    return self.scan_template_continuation(start_line, start_col);
                }
                self.advance_raw(1);
                return self.make(TokenKind::RBrace, "}", start_line, start_col);
            }
            b'{' => {
                self.braces.push(BraceContext::Plain);
                self.advance_raw(1);
                return self.make(TokenKind::LBrace, "{", start_line, start_col);
            }
            b'?' if self.peek_byte_at(1) == Some(b'.')
                && self.peek_byte_at(2).is_some_and(|b| b.is_ascii_digit()) =>
            {
                self.advance_raw(1);
                return self.make(TokenKind::Question, "?", start_line, start_col);
            }
            _ => {}
        }

        let mut raw_lexer = Raw::lexer(self.rest());
        match raw_lexer.next() {
            Some(Ok(raw)) => {
                let span = raw_lexer.span();
                let text = self.advance_raw(span.len());
                self.token_from_raw(raw, text, start_line, start_col)
            }
            Some(Err(())) | None => {
                let ch = self.rest().chars().next().unwrap();
                let text = self.advance_raw(ch.len_utf8());
                self.make(TokenKind::Illegal, text, start_line, start_col)
            }
        }
    }

    fn token_from_raw(&mut self, raw: Raw, text: &str, line: u32, col: u32) -> Token {
        let kind = match raw {
            Raw::Ident(_) => keyword_kind(text).unwrap_or(TokenKind::Identifier),
            Raw::PrivateIdent(_) => TokenKind::PrivateIdentifier,
            Raw::Number(_) => TokenKind::Number,
            Raw::Str(_) => TokenKind::String,
            Raw::LBrace => {
                // Reached only if '{' is ever matched via the generic
                // delegate path; the common case is intercepted earlier.
                self.braces.push(BraceContext::Plain);
                TokenKind::LBrace
            }
            Raw::RBrace => TokenKind::RBrace,
            Raw::LParen => TokenKind::LParen,
            Raw::RParen => TokenKind::RParen,
            Raw::LBracket => TokenKind::LBracket,
            Raw::RBracket => TokenKind::RBracket,
            Raw::Ellipsis => TokenKind::Ellipsis,
            Raw::Dot => TokenKind::Dot,
            Raw::Semicolon => TokenKind::Semicolon,
            Raw::Comma => TokenKind::Comma,
            Raw::Le => TokenKind::Le,
            Raw::Ge => TokenKind::Ge,
            Raw::ShlAssign => TokenKind::ShlAssign,
            Raw::UShrAssign => TokenKind::UShrAssign,
            Raw::ShrAssign => TokenKind::ShrAssign,
            Raw::Shl => TokenKind::Shl,
            Raw::UShr => TokenKind::UShr,
            Raw::Shr => TokenKind::Shr,
            Raw::Lt => TokenKind::Lt,
            Raw::Gt => TokenKind::Gt,
            Raw::EqEqEq => TokenKind::EqEqEq,
            Raw::NotEqEq => TokenKind::NotEqEq,
            Raw::EqEq => TokenKind::EqEq,
            Raw::NotEq => TokenKind::NotEq,
            Raw::Arrow => TokenKind::Arrow,
            Raw::StarStarAssign => TokenKind::StarStarAssign,
            Raw::StarStar => TokenKind::StarStar,
            Raw::PlusPlus => TokenKind::PlusPlus,
            Raw::MinusMinus => TokenKind::MinusMinus,
            Raw::PlusAssign => TokenKind::PlusAssign,
            Raw::MinusAssign => TokenKind::MinusAssign,
            Raw::StarAssign => TokenKind::StarAssign,
            Raw::PercentAssign => TokenKind::PercentAssign,
            Raw::Plus => TokenKind::Plus,
            Raw::Minus => TokenKind::Minus,
            Raw::Star => TokenKind::Star,
            Raw::Percent => TokenKind::Percent,
            Raw::AmpAmpAssign => TokenKind::AmpAmpAssign,
            Raw::PipePipeAssign => TokenKind::PipePipeAssign,
            Raw::QQAssign => TokenKind::QQAssign,
            Raw::AmpAmp => TokenKind::AmpAmp,
            Raw::PipePipe => TokenKind::PipePipe,
            Raw::QQ => TokenKind::QQ,
            Raw::AmpAssign => TokenKind::AmpAssign,
            Raw::PipeAssign => TokenKind::PipeAssign,
            Raw::CaretAssign => TokenKind::CaretAssign,
            Raw::Amp => TokenKind::Amp,
            Raw::Pipe => TokenKind::Pipe,
            Raw::Caret => TokenKind::Caret,
            Raw::Bang => TokenKind::Bang,
            Raw::Tilde => TokenKind::Tilde,
            Raw::QDot => TokenKind::QDot,
            Raw::Question => TokenKind::Question,
            Raw::Colon => TokenKind::Colon,
            Raw::Assign => TokenKind::Assign,
        };
        self.make(kind, text, line, col)
    }

    /// Scan a regex literal body: `/pattern/flags`, honouring bracket
    /// character classes (where an unescaped `/` does not terminate the
    /// literal) and backslash escapes.
    fn scan_regex(&mut self, start_line: u32, start_col: u32) -> Token {
        let bytes = &self.source.as_bytes()[self.pos..];
        let mut in_class = false;
        let mut i = 1; // skip opening '/'
        while let Some(&b) = bytes.get(i) {
            match b {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    i += 1;
                    break;
                }
                b'\n' | b'\r' => break,
                _ => {}
            }
            i += 1;
        }
        let mut len = i;
        while self
            .source
            .as_bytes()
            .get(self.pos + len)
            .is_some_and(|b| b.is_ascii_alphabetic())
        {
            len += 1;
        }
        let text = self.advance_raw(len);
        self.make(TokenKind::RegExp, text, start_line, start_col)
    }

    /// Scan a template chunk starting at the opening backtick, up to the
    /// next `${` (-> `TemplateHead`) or the closing backtick (->
    /// `NoSubstitutionTemplate`).
    fn scan_template_head(&mut self, start_line: u32, start_col: u32) -> Token {
        self.advance_raw(1); // consume '`'
        self.scan_template_chunk(start_line, start_col, true)
    }

    /// Scan a template chunk resumed after a `${ ... }` substitution, up
    /// to the next `${` (-> `TemplateMiddle`) or closing backtick (->
    /// `TemplateTail`).
    fn scan_template_continuation(&mut self, start_line: u32, start_col: u32) -> Token {
        self.advance_raw(1); // consume the '}' that closed the substitution
        self.scan_template_chunk(start_line, start_col, false)
    }

    fn scan_template_chunk(&mut self, start_line: u32, start_col: u32, is_head: bool) -> Token {
        let chunk_start = self.pos;
        loop {
            match self.peek_byte() {
                None => break,
                Some(b'`') => {
                    let text = &self.source[chunk_start..self.pos];
                    let lexeme = format!("`{text}`");
                    self.advance_raw(1);
                    let kind = if is_head {
                        TokenKind::NoSubstitutionTemplate
                    } else {
                        TokenKind::TemplateTail
                    };
                    return self.make(kind, lexeme, start_line, start_col);
                }
                Some(b'\\') => {
                    self.advance_raw(1);
                    if let Some(ch) = self.rest().chars().next() {
                        self.advance_raw(ch.len_utf8());
                    }
                    continue;
                }
                Some(b'$') if self.peek_byte_at(1) == Some(b'{') => {
                    let text = &self.source[chunk_start..self.pos];
                    let lexeme = format!("`{text}${{");
                    self.advance_raw(2); // '${'
                    self.braces.push(BraceContext::TemplateSubstitution);
                    let kind = if is_head {
                        TokenKind::TemplateHead
                    } else {
                        TokenKind::TemplateMiddle
                    };
                    return self.make(kind, lexeme, start_line, start_col);
                }
                Some(_) => {
                    let ch = self.rest().chars().next().unwrap();
                    self.advance_raw(ch.len_utf8());
                }
            }
        }
        // Unterminated template: emit what we have as a tail so the parser
        // can surface an EOF/SyntaxError at the right place.
        let text = &self.source[chunk_start..self.pos];
        let lexeme = format!("`{text}`");
        let kind = if is_head {
            TokenKind::NoSubstitutionTemplate
        } else {
            TokenKind::TemplateTail
        };
        self.make(kind, lexeme, start_line, start_col)
    }

    /// Tokenize the whole source up front. Convenience used by tests and
    /// by `ast-dump`-style tooling; the parser itself drives
    /// [`Lexer::next_token`] one token at a time so it can feed back the
    /// previous kind.
    pub fn tokenize(source: &'a str) -> Vec<Token> {
        let mut lexer = Self::new(source);
        let mut tokens = Vec::new();
        let mut previous = TokenKind::Eof;
        loop {
            let tok = lexer.next_token(previous);
            previous = tok.kind;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_simple_arithmetic() {
        let kinds = kinds("1 + 2 * 3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number,
                TokenKind::Plus,
                TokenKind::Number,
                TokenKind::Star,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_divide_from_regex() {
        assert_eq!(
            kinds("a / b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Slash,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn keywords_are_not_identifiers() {
        assert_eq!(kinds("let x = true"), vec![
            TokenKind::Let,
            TokenKind::Identifier,
            TokenKind::Assign,
            TokenKind::True,
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn template_with_substitution_splits_into_parts() {
        let kinds = kinds("`a${b}c`");
        assert_eq!(
            kinds,
            vec![
                TokenKind::TemplateHead,
                TokenKind::Identifier,
                TokenKind::TemplateTail,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn optional_chain_before_digit_is_ternary() {
        let kinds = kinds("a ? .5 : 1");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Question,
                TokenKind::Number,
                TokenKind::Colon,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn crlf_advances_line_once() {
        let tokens = Lexer::tokenize("a\r\nb");
        assert_eq!(tokens[1].line, 2);
    }
}
