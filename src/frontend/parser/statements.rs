//! Recursive-descent statement dispatch (spec.md §4.2.1): one function per
//! leading keyword, falling through to expression-statement parsing when
//! nothing else matches.

use crate::frontend::ast::{ClassMember, ForInit, MethodKind, Statement, VarKind, VariableDeclarator};
use crate::frontend::token::TokenKind;

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_statement(&mut self) -> Statement {
        match self.kind() {
            TokenKind::LBrace => self.parse_block_statement(),
            TokenKind::Var | TokenKind::Const => self.parse_variable_statement(),
            TokenKind::Let if self.starts_let_declaration() => self.parse_variable_statement(),
            TokenKind::Semicolon => {
                let span = self.span();
                self.bump();
                Statement::Empty { span }
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Do => self.parse_do_while_statement(),
            TokenKind::For => self.parse_for_statement(),
            TokenKind::Function => self.parse_function_declaration(false),
            TokenKind::Async if self.peek_kind() == TokenKind::Function => {
                self.bump();
                self.parse_function_declaration(true)
            }
            TokenKind::Class => self.parse_class_declaration(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Break => self.parse_break_statement(),
            TokenKind::Continue => self.parse_continue_statement(),
            TokenKind::Throw => self.parse_throw_statement(),
            TokenKind::Try => self.parse_try_statement(),
            TokenKind::Switch => self.parse_switch_statement(),
            TokenKind::Debugger => {
                let span = self.span();
                self.bump();
                self.consume_semicolon();
                Statement::Debugger { span }
            }
            TokenKind::With => self.parse_with_statement(),
            TokenKind::Identifier if self.peek_kind() == TokenKind::Colon => self.parse_labeled_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    /// `let` is a contextual keyword (spec.md §3.1): `let x = 1` is a
    /// declaration, but `let` alone (e.g. `let[0] = 1` indexing a variable
    /// named `let`, or `let;` as an identifier reference) is an expression.
    /// A real declaration is always followed by an identifier, `[` or `{`.
    fn starts_let_declaration(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Identifier
                | TokenKind::LBrace
                | TokenKind::LBracket
                | TokenKind::Static
                | TokenKind::Async
                | TokenKind::Await
                | TokenKind::Of
                | TokenKind::From
                | TokenKind::As
                | TokenKind::Get
                | TokenKind::Set
                | TokenKind::Yield
        )
    }

    pub(super) fn parse_block_statements(&mut self) -> Vec<Statement> {
        self.expect(TokenKind::LBrace, "'{'");
        let mut body = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            body.push(self.parse_statement());
        }
        self.expect(TokenKind::RBrace, "'}'");
        body
    }

    fn parse_block_statement(&mut self) -> Statement {
        let span = self.span();
        let body = self.parse_block_statements();
        Statement::BlockStatement { body, span }
    }

    fn var_kind(&self) -> VarKind {
        match self.kind() {
            TokenKind::Var => VarKind::Var,
            TokenKind::Const => VarKind::Const,
            TokenKind::Let => VarKind::Let,
            _ => unreachable!("var_kind called off a non-declaration token"),
        }
    }

    fn parse_variable_statement(&mut self) -> Statement {
        let span = self.span();
        let kind = self.var_kind();
        self.bump();
        let declarations = self.parse_variable_declarators();
        self.consume_semicolon();
        Statement::VariableDeclaration { kind, declarations, span }
    }

    fn parse_variable_declarators(&mut self) -> Vec<VariableDeclarator> {
        let mut declarations = Vec::new();
        loop {
            let span = self.span();
            let id = self.parse_pattern();
            let init = if self.eat(TokenKind::Assign) { Some(self.parse_assignment_expression()) } else { None };
            declarations.push(VariableDeclarator { id, init, span });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        declarations
    }

    fn parse_if_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'if'
        self.expect(TokenKind::LParen, "'('");
        let test = self.parse_expression();
        self.expect(TokenKind::RParen, "')'");
        let consequent = Box::new(self.parse_statement());
        let alternate = if self.eat(TokenKind::Else) { Some(Box::new(self.parse_statement())) } else { None };
        Statement::If { test, consequent, alternate, span }
    }

    fn parse_while_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'while'
        self.expect(TokenKind::LParen, "'('");
        let test = self.parse_expression();
        self.expect(TokenKind::RParen, "')'");
        let body = Box::new(self.parse_statement());
        Statement::While { test, body, span }
    }

    fn parse_do_while_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'do'
        let body = Box::new(self.parse_statement());
        self.expect(TokenKind::While, "'while'");
        self.expect(TokenKind::LParen, "'('");
        let test = self.parse_expression();
        self.expect(TokenKind::RParen, "')'");
        self.consume_semicolon();
        Statement::DoWhile { body, test, span }
    }

    /// Disambiguates C-style `for`, `for-in`, and `for-of` heads (spec.md
    /// §4.2.2): parse the init with `no_in` set so a bare `in` isn't eaten
    /// as a binary operator, then inspect what follows it.
    fn parse_for_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'for'
        let is_await = self.eat(TokenKind::Await);
        self.expect(TokenKind::LParen, "'('");

        if self.at(TokenKind::Semicolon) {
            if is_await {
                self.error("'for await' requires a 'for-of' loop");
            }
            return self.finish_c_style_for(span, None);
        }

        let prev_no_in = std::mem::replace(&mut self.no_in, true);
        let init = if matches!(self.kind(), TokenKind::Var | TokenKind::Const)
            || (self.at(TokenKind::Let) && self.starts_let_declaration())
        {
            let kind = self.var_kind();
            self.bump();
            let decl_span = self.span();
            let id = self.parse_pattern();
            if matches!(self.kind(), TokenKind::In | TokenKind::Of) {
                self.no_in = prev_no_in;
                let declarations = vec![VariableDeclarator { id, init: None, span: decl_span }];
                return self.finish_for_in_of(span, Box::new(ForInit::Declaration { kind, declarations }), is_await);
            }
            let first_init = if self.eat(TokenKind::Assign) { Some(self.parse_assignment_expression()) } else { None };
            let mut declarations = vec![VariableDeclarator { id, init: first_init, span: decl_span }];
            while self.eat(TokenKind::Comma) {
                let decl_span = self.span();
                let id = self.parse_pattern();
                let init = if self.eat(TokenKind::Assign) { Some(self.parse_assignment_expression()) } else { None };
                declarations.push(VariableDeclarator { id, init, span: decl_span });
            }
            Some(Box::new(ForInit::Declaration { kind, declarations }))
        } else {
            let expr = self.parse_expression();
            if matches!(self.kind(), TokenKind::In | TokenKind::Of) {
                self.no_in = prev_no_in;
                let target = self.to_assignment_target(expr);
                return self.finish_for_in_of(span, Box::new(ForInit::Expression(target)), is_await);
            }
            Some(Box::new(ForInit::Expression(expr)))
        };
        self.no_in = prev_no_in;
        if is_await {
            self.error("'for await' requires a 'for-of' loop");
        }
        self.finish_c_style_for(span, init)
    }

    fn finish_c_style_for(&mut self, span: crate::frontend::ast::Span, init: Option<Box<ForInit>>) -> Statement {
        self.expect(TokenKind::Semicolon, "';'");
        let test = if self.at(TokenKind::Semicolon) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::Semicolon, "';'");
        let update = if self.at(TokenKind::RParen) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::RParen, "')'");
        let body = Box::new(self.parse_statement());
        Statement::For { init, test, update, body, span }
    }

    fn finish_for_in_of(
        &mut self,
        span: crate::frontend::ast::Span,
        left: Box<ForInit>,
        is_await: bool,
    ) -> Statement {
        if self.eat(TokenKind::In) {
            if is_await {
                self.error("'for await' requires a 'for-of' loop");
            }
            let right = self.parse_expression();
            self.expect(TokenKind::RParen, "')'");
            let body = Box::new(self.parse_statement());
            return Statement::ForIn { left, right, body, span };
        }
        self.expect(TokenKind::Of, "'of'");
        let right = self.parse_assignment_expression();
        self.expect(TokenKind::RParen, "')'");
        let body = Box::new(self.parse_statement());
        Statement::ForOf { left, right, body, is_await, span }
    }

    fn parse_function_declaration(&mut self, is_async: bool) -> Statement {
        let span = self.span();
        self.expect(TokenKind::Function, "'function'");
        let is_generator = self.eat(TokenKind::Star);
        let name = Some(self.bump_identifier_name());
        let (params, defaults, rest) = self.parse_params();
        let prev_gen = std::mem::replace(&mut self.in_generator, is_generator);
        let prev_async = std::mem::replace(&mut self.in_async, is_async);
        let body = self.parse_function_body();
        self.in_generator = prev_gen;
        self.in_async = prev_async;
        let function = crate::frontend::ast::FunctionNode {
            name,
            params,
            defaults,
            rest,
            body,
            is_async,
            is_generator,
            span,
        };
        Statement::FunctionDeclaration { function, span }
    }

    /// Shared by `class` declarations and `class` expressions.
    pub(super) fn parse_class_tail(
        &mut self,
    ) -> (Option<String>, Option<crate::frontend::ast::Expr>, Vec<ClassMember>) {
        self.expect(TokenKind::Class, "'class'");
        let name = if self.at(TokenKind::Identifier) { Some(self.bump().lexeme) } else { None };
        let superclass = if self.eat(TokenKind::Extends) { Some(self.parse_lhs_expression_pub()) } else { None };
        let body = self.parse_class_body();
        (name, superclass, body)
    }

    fn parse_class_declaration(&mut self) -> Statement {
        let span = self.span();
        let (name, superclass, body) = self.parse_class_tail();
        let name = name.unwrap_or_else(|| {
            self.error("class declaration requires a name");
            String::new()
        });
        Statement::ClassDeclaration { name, superclass, body, span }
    }

    fn parse_class_body(&mut self) -> Vec<ClassMember> {
        self.expect(TokenKind::LBrace, "'{'");
        let mut members = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.eat(TokenKind::Semicolon) {
                continue;
            }
            members.push(self.parse_class_member());
        }
        self.expect(TokenKind::RBrace, "'}'");
        members
    }

    fn parse_class_member(&mut self) -> ClassMember {
        let is_static = self.at(TokenKind::Static)
            && !matches!(self.peek_kind(), TokenKind::LParen | TokenKind::Assign | TokenKind::Semicolon);
        if is_static {
            self.bump();
        }
        let is_async = self.at(TokenKind::Async)
            && !matches!(self.peek_kind(), TokenKind::LParen | TokenKind::Assign | TokenKind::Semicolon);
        if is_async {
            self.bump();
        }
        let is_generator = self.eat(TokenKind::Star);
        if matches!(self.kind(), TokenKind::Get | TokenKind::Set)
            && !matches!(self.peek_kind(), TokenKind::LParen | TokenKind::Assign | TokenKind::Semicolon | TokenKind::RBrace)
        {
            let kind = if self.at(TokenKind::Get) { MethodKind::Get } else { MethodKind::Set };
            self.bump();
            let key = self.parse_property_key();
            let function = self.parse_method_tail(false, false);
            return ClassMember { key, kind, is_static, function };
        }
        let key = self.parse_property_key();
        let is_constructor = !is_static
            && matches!(&key.expr, crate::frontend::ast::Expr::Identifier { name, .. } if name == "constructor");
        if self.at(TokenKind::LParen) {
            let function = self.parse_method_tail(is_async, is_generator);
            let kind = if is_constructor { MethodKind::Constructor } else { MethodKind::Method };
            return ClassMember { key, kind, is_static, function };
        }
        // Class field (`x = 1;` / `x;`), desugared into a zero-arg
        // initializer method the constructor-synthesis pass consumes.
        let span = key.expr.span();
        let init = if self.eat(TokenKind::Assign) { Some(self.parse_assignment_expression()) } else { None };
        self.consume_semicolon();
        let body = match init {
            Some(expr) => crate::frontend::ast::FunctionBody::Expression(Box::new(expr)),
            None => crate::frontend::ast::FunctionBody::Expression(Box::new(
                crate::frontend::ast::Expr::UndefinedLiteral { span },
            )),
        };
        let function = crate::frontend::ast::FunctionNode {
            name: None,
            params: Vec::new(),
            defaults: Vec::new(),
            rest: None,
            body,
            is_async: false,
            is_generator: false,
            span,
        };
        ClassMember { key, kind: MethodKind::Method, is_static, function }
    }

    fn parse_return_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'return'
        if self.line_break_before_current() || self.starts_statement_end() {
            self.consume_semicolon();
            return Statement::ReturnStatement { argument: None, span };
        }
        let argument = Some(self.parse_expression());
        self.consume_semicolon();
        Statement::ReturnStatement { argument, span }
    }

    fn starts_statement_end(&self) -> bool {
        matches!(self.kind(), TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof)
    }

    fn parse_break_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'break'
        let label = if !self.line_break_before_current() && self.at(TokenKind::Identifier) {
            Some(self.bump().lexeme)
        } else {
            None
        };
        self.consume_semicolon();
        Statement::Break { label, span }
    }

    fn parse_continue_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'continue'
        let label = if !self.line_break_before_current() && self.at(TokenKind::Identifier) {
            Some(self.bump().lexeme)
        } else {
            None
        };
        self.consume_semicolon();
        Statement::Continue { label, span }
    }

    fn parse_throw_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'throw'
        if self.line_break_before_current() {
            self.error("illegal newline after 'throw'");
        }
        let argument = self.parse_expression();
        self.consume_semicolon();
        Statement::Throw { argument, span }
    }

    fn parse_try_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'try'
        let block = Box::new(self.parse_block_statement());
        let handler = if self.eat(TokenKind::Catch) {
            let param = if self.eat(TokenKind::LParen) {
                let pat = self.parse_pattern();
                self.expect(TokenKind::RParen, "')'");
                Some(pat)
            } else {
                None
            };
            let body = Box::new(self.parse_block_statement());
            Some(crate::frontend::ast::CatchClause { param, body })
        } else {
            None
        };
        let finalizer = if self.eat(TokenKind::Finally) { Some(Box::new(self.parse_block_statement())) } else { None };
        if handler.is_none() && finalizer.is_none() {
            self.error("missing catch or finally after try");
        }
        Statement::Try { block, handler, finalizer, span }
    }

    fn parse_switch_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'switch'
        self.expect(TokenKind::LParen, "'('");
        let discriminant = self.parse_expression();
        self.expect(TokenKind::RParen, "')'");
        self.expect(TokenKind::LBrace, "'{'");
        let mut cases = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            let test = if self.eat(TokenKind::Case) {
                let test = self.parse_expression();
                self.expect(TokenKind::Colon, "':'");
                Some(test)
            } else {
                self.expect(TokenKind::Default, "'case' or 'default'");
                self.expect(TokenKind::Colon, "':'");
                None
            };
            let mut consequent = Vec::new();
            while !matches!(self.kind(), TokenKind::Case | TokenKind::Default | TokenKind::RBrace | TokenKind::Eof) {
                consequent.push(self.parse_statement());
            }
            cases.push(crate::frontend::ast::SwitchCase { test, consequent });
        }
        self.expect(TokenKind::RBrace, "'}'");
        Statement::Switch { discriminant, cases, span }
    }

    fn parse_with_statement(&mut self) -> Statement {
        let span = self.span();
        self.bump(); // 'with'
        self.expect(TokenKind::LParen, "'('");
        let object = self.parse_expression();
        self.expect(TokenKind::RParen, "')'");
        let body = Box::new(self.parse_statement());
        Statement::With { object, body, span }
    }

    fn parse_labeled_statement(&mut self) -> Statement {
        let span = self.span();
        let label = self.bump().lexeme;
        self.bump(); // ':'
        let body = Box::new(self.parse_statement());
        Statement::LabeledStatement { label, body, span }
    }

    fn parse_expression_statement(&mut self) -> Statement {
        let span = self.span();
        let expr = self.parse_expression();
        self.consume_semicolon();
        Statement::ExpressionStatement { expr, span }
    }

    /// The `extends` clause takes a `LeftHandSideExpression`, but plain
    /// assignment-expression parsing covers it (it'll never see an
    /// operator there in practice) and avoids exposing another private
    /// precedence tier across this module boundary.
    fn parse_lhs_expression_pub(&mut self) -> crate::frontend::ast::Expr {
        self.parse_assignment_expression()
    }
}
