//! Pratt (precedence-climbing) expression parser (spec.md §4.2.1). Each
//! precedence tier is one function that calls the next-tighter tier for
//! its operands; the eighteen tiers from comma down to primary expression
//! fall naturally out of the call chain instead of a table.

use crate::frontend::ast::{
    AssignOp, BinaryOp, Expr, FunctionBody, FunctionNode, LogicalOp, MethodKind, ObjectProperty,
    Pattern, PropertyKey, Span, TemplateQuasi, UnaryOp, UpdateOp,
};
use crate::frontend::token::TokenKind;

use super::patterns::expr_to_pattern;
use super::Parser;

impl<'a> Parser<'a> {
    /// Top-level entry: an expression, possibly a comma `Sequence`.
    pub(super) fn parse_expression(&mut self) -> Expr {
        let span = self.span();
        let first = self.parse_assignment_expression();
        if !self.at(TokenKind::Comma) {
            return first;
        }
        let mut expressions = vec![first];
        while self.eat(TokenKind::Comma) {
            expressions.push(self.parse_assignment_expression());
        }
        Expr::Sequence { expressions, span }
    }

    pub(super) fn parse_assignment_expression(&mut self) -> Expr {
        if self.at(TokenKind::Yield) && self.in_generator {
            return self.parse_yield_expression();
        }
        if let Some(arrow) = self.try_parse_arrow_function() {
            return arrow;
        }
        let left = self.parse_conditional_expression();
        if let Some(op) = self.assignment_operator() {
            let span = left.span();
            self.bump();
            let target = self.to_assignment_target(left);
            let value = self.parse_assignment_expression();
            return Expr::Assignment {
                op,
                target: Box::new(target),
                value: Box::new(value),
                span,
            };
        }
        left
    }

    fn assignment_operator(&self) -> Option<AssignOp> {
        Some(match self.kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Compound(BinaryOp::Add),
            TokenKind::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::StarAssign => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::SlashAssign => AssignOp::Compound(BinaryOp::Div),
            TokenKind::PercentAssign => AssignOp::Compound(BinaryOp::Mod),
            TokenKind::StarStarAssign => AssignOp::Compound(BinaryOp::Pow),
            TokenKind::ShlAssign => AssignOp::Compound(BinaryOp::Shl),
            TokenKind::ShrAssign => AssignOp::Compound(BinaryOp::Shr),
            TokenKind::UShrAssign => AssignOp::Compound(BinaryOp::UShr),
            TokenKind::AmpAssign => AssignOp::Compound(BinaryOp::BitAnd),
            TokenKind::PipeAssign => AssignOp::Compound(BinaryOp::BitOr),
            TokenKind::CaretAssign => AssignOp::Compound(BinaryOp::BitXor),
            TokenKind::AmpAmpAssign => AssignOp::LogicalCompound(LogicalOp::And),
            TokenKind::PipePipeAssign => AssignOp::LogicalCompound(LogicalOp::Or),
            TokenKind::QQAssign => AssignOp::LogicalCompound(LogicalOp::Nullish),
            _ => return None,
        })
    }

    /// Reinterpret an already-parsed expression as a destructuring
    /// assignment target (`[a, b] = rhs`, `{a} = rhs`) when it's an
    /// array/object literal, per spec.md §4.2.2; otherwise left unchanged
    /// (plain identifier/member assignment).
    pub(super) fn to_assignment_target(&mut self, expr: Expr) -> Expr {
        match expr {
            Expr::ArrayLiteral { elements, span } => {
                let elements = elements
                    .into_iter()
                    .map(|el| el.map(|e| self.to_assignment_target(e)))
                    .collect();
                Expr::ArrayPattern { elements, span }
            }
            Expr::ObjectLiteral { properties, span } => {
                let mut out = Vec::with_capacity(properties.len());
                for prop in properties {
                    match prop {
                        ObjectProperty::Data { key, value, shorthand } => {
                            out.push(crate::frontend::ast::ObjectPatternProperty {
                                key,
                                value: self.to_assignment_target(value),
                                shorthand,
                            });
                        }
                        ObjectProperty::Spread(_) | ObjectProperty::Method { .. } => {
                            self.error("invalid destructuring assignment target");
                        }
                    }
                }
                Expr::ObjectPattern { properties: out, span }
            }
            Expr::Spread { argument, span } => Expr::RestElement {
                argument: Box::new(self.to_assignment_target(*argument)),
                span,
            },
            Expr::Assignment { op: AssignOp::Assign, target, value, span } => {
                Expr::AssignmentPattern { left: target, right: value, span }
            }
            other => other,
        }
    }

    fn parse_conditional_expression(&mut self) -> Expr {
        let span = self.span();
        let test = self.parse_nullish_expression();
        if self.eat(TokenKind::Question) {
            let consequent = self.parse_assignment_expression();
            self.expect(TokenKind::Colon, "':'");
            let alternate = self.parse_assignment_expression();
            return Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
                span,
            };
        }
        test
    }

    fn parse_nullish_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_logical_or_expression();
        while self.eat(TokenKind::QQ) {
            let right = self.parse_logical_or_expression();
            left = Expr::Logical { op: LogicalOp::Nullish, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_logical_or_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_logical_and_expression();
        while self.eat(TokenKind::PipePipe) {
            let right = self.parse_logical_and_expression();
            left = Expr::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_logical_and_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_bitor_expression();
        while self.eat(TokenKind::AmpAmp) {
            let right = self.parse_bitor_expression();
            left = Expr::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_bitor_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_bitxor_expression();
        while self.eat(TokenKind::Pipe) {
            let right = self.parse_bitxor_expression();
            left = Expr::Binary { op: BinaryOp::BitOr, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_bitxor_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_bitand_expression();
        while self.eat(TokenKind::Caret) {
            let right = self.parse_bitand_expression();
            left = Expr::Binary { op: BinaryOp::BitXor, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_bitand_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_equality_expression();
        while self.eat(TokenKind::Amp) {
            let right = self.parse_equality_expression();
            left = Expr::Binary { op: BinaryOp::BitAnd, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_equality_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_relational_expression();
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::NotEqEq => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.bump();
            let right = self.parse_relational_expression();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_relational_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_shift_expression();
        loop {
            let op = match self.kind() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Ge => BinaryOp::Ge,
                TokenKind::Instanceof => BinaryOp::Instanceof,
                TokenKind::In if !self.no_in => BinaryOp::In,
                _ => break,
            };
            self.bump();
            let right = self.parse_shift_expression();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_shift_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_additive_expression();
        loop {
            let op = match self.kind() {
                TokenKind::Shl => BinaryOp::Shl,
                TokenKind::Shr => BinaryOp::Shr,
                TokenKind::UShr => BinaryOp::UShr,
                _ => break,
            };
            self.bump();
            let right = self.parse_additive_expression();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_additive_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_multiplicative_expression();
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_multiplicative_expression();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_multiplicative_expression(&mut self) -> Expr {
        let span = self.span();
        let mut left = self.parse_exponent_expression();
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.bump();
            let right = self.parse_exponent_expression();
            left = Expr::Binary { op, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    /// Right-associative, unlike every tier above it.
    fn parse_exponent_expression(&mut self) -> Expr {
        let span = self.span();
        let left = self.parse_unary_expression();
        if self.eat(TokenKind::StarStar) {
            let right = self.parse_exponent_expression();
            return Expr::Binary { op: BinaryOp::Pow, left: Box::new(left), right: Box::new(right), span };
        }
        left
    }

    fn parse_unary_expression(&mut self) -> Expr {
        let span = self.span();
        let op = match self.kind() {
            TokenKind::Minus => UnaryOp::Minus,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::Tilde => UnaryOp::BitNot,
            TokenKind::Typeof => UnaryOp::Typeof,
            TokenKind::Void => UnaryOp::Void,
            TokenKind::Delete => UnaryOp::Delete,
            TokenKind::Await if self.in_async => {
                self.bump();
                let argument = self.parse_unary_expression();
                return Expr::Await { argument: Box::new(argument), span };
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => return self.parse_prefix_update(),
            _ => return self.parse_postfix_update_expression(),
        };
        self.bump();
        let argument = self.parse_unary_expression();
        Expr::Unary { op, argument: Box::new(argument), span }
    }

    fn parse_prefix_update(&mut self) -> Expr {
        let span = self.span();
        let op = if self.at(TokenKind::PlusPlus) { UpdateOp::Increment } else { UpdateOp::Decrement };
        self.bump();
        let argument = self.parse_unary_expression();
        Expr::Update { op, argument: Box::new(argument), prefix: true, span }
    }

    fn parse_postfix_update_expression(&mut self) -> Expr {
        let span = self.span();
        let expr = self.parse_lhs_expression();
        if !self.line_break_before_current()
            && matches!(self.kind(), TokenKind::PlusPlus | TokenKind::MinusMinus)
        {
            let op = if self.at(TokenKind::PlusPlus) { UpdateOp::Increment } else { UpdateOp::Decrement };
            self.bump();
            return Expr::Update { op, argument: Box::new(expr), prefix: false, span };
        }
        expr
    }

    /// `new`, calls, member access and optional chaining (spec.md §4.3.3).
    fn parse_lhs_expression(&mut self) -> Expr {
        let mut expr = if self.at(TokenKind::New) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        loop {
            expr = match self.kind() {
                TokenKind::Dot => self.parse_member_dot(expr, false),
                TokenKind::QDot => self.parse_optional_tail(expr),
                TokenKind::LBracket => self.parse_member_bracket(expr, false),
                TokenKind::LParen => self.parse_call(expr, false),
                TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => {
                    self.parse_tagged_template(expr)
                }
                _ => break,
            };
        }
        expr
    }

    fn parse_new_expression(&mut self) -> Expr {
        let span = self.span();
        self.bump(); // 'new'
        if self.at(TokenKind::Dot) {
            // `new.target`; modeled as a plain identifier read (spec.md
            // §4.3.4 exposes it via the `new.target` binding inside calls).
            self.bump();
            self.bump_identifier_name();
            return Expr::Identifier { name: "new.target".to_string(), span };
        }
        let callee = if self.at(TokenKind::New) {
            self.parse_new_expression()
        } else {
            let mut callee = self.parse_primary_expression();
            loop {
                callee = match self.kind() {
                    TokenKind::Dot => self.parse_member_dot(callee, false),
                    TokenKind::LBracket => self.parse_member_bracket(callee, false),
                    _ => break,
                };
            }
            callee
        };
        let arguments = if self.at(TokenKind::LParen) { self.parse_arguments() } else { Vec::new() };
        Expr::New { callee: Box::new(callee), arguments, span }
    }

    fn parse_member_dot(&mut self, object: Expr, optional: bool) -> Expr {
        let span = object.span();
        self.bump(); // '.'
        let prop_span = self.span();
        let name = if self.at(TokenKind::PrivateIdentifier) {
            self.bump().lexeme
        } else {
            self.bump_identifier_name()
        };
        Expr::Member {
            object: Box::new(object),
            property: Box::new(Expr::Identifier { name, span: prop_span }),
            computed: false,
            optional,
            span,
        }
    }

    fn parse_member_bracket(&mut self, object: Expr, optional: bool) -> Expr {
        let span = object.span();
        self.bump(); // '['
        let property = self.parse_expression();
        self.expect(TokenKind::RBracket, "']'");
        Expr::Member { object: Box::new(object), property: Box::new(property), computed: true, optional, span }
    }

    fn parse_optional_tail(&mut self, object: Expr) -> Expr {
        let span = object.span();
        self.bump(); // '?.'
        match self.kind() {
            TokenKind::LParen => self.parse_call(object, true),
            TokenKind::LBracket => self.parse_member_bracket(object, true),
            _ => {
                let prop_span = self.span();
                let name = self.bump_identifier_name();
                Expr::Member {
                    object: Box::new(object),
                    property: Box::new(Expr::Identifier { name, span: prop_span }),
                    computed: false,
                    optional: true,
                    span,
                }
            }
        }
    }

    fn parse_call(&mut self, callee: Expr, optional: bool) -> Expr {
        let span = callee.span();
        let arguments = self.parse_arguments();
        Expr::Call { callee: Box::new(callee), arguments, optional, span }
    }

    fn parse_arguments(&mut self) -> Vec<Expr> {
        self.expect(TokenKind::LParen, "'('");
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Ellipsis) {
                let span = self.span();
                self.bump();
                let argument = self.parse_assignment_expression();
                args.push(Expr::Spread { argument: Box::new(argument), span });
            } else {
                args.push(self.parse_assignment_expression());
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'");
        args
    }

    fn parse_tagged_template(&mut self, tag: Expr) -> Expr {
        let span = tag.span();
        let quasi = self.parse_template_literal();
        Expr::TaggedTemplate { tag: Box::new(tag), quasi: Box::new(quasi), span }
    }

    fn parse_primary_expression(&mut self) -> Expr {
        let span = self.span();
        match self.kind() {
            TokenKind::Number => {
                let text = self.bump().lexeme;
                Expr::NumberLiteral { value: parse_number_literal(&text), span }
            }
            TokenKind::String => {
                let text = self.bump().lexeme;
                Expr::StringLiteral { value: unescape_quoted(&text), span }
            }
            TokenKind::True => {
                self.bump();
                Expr::BooleanLiteral { value: true, span }
            }
            TokenKind::False => {
                self.bump();
                Expr::BooleanLiteral { value: false, span }
            }
            TokenKind::Null => {
                self.bump();
                Expr::NullLiteral { span }
            }
            TokenKind::This => {
                self.bump();
                Expr::This { span }
            }
            TokenKind::Super => {
                self.bump();
                Expr::Super { span }
            }
            TokenKind::RegExp => {
                let text = self.bump().lexeme;
                let (pattern, flags) = split_regex_lexeme(&text);
                Expr::RegExpLiteral { pattern, flags, span }
            }
            TokenKind::NoSubstitutionTemplate | TokenKind::TemplateHead => self.parse_template_literal(),
            TokenKind::LParen => {
                self.bump();
                let expr = self.parse_expression();
                self.expect(TokenKind::RParen, "')'");
                expr
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Function => self.parse_function_expression(false),
            TokenKind::Async if self.peek_kind() == TokenKind::Function => {
                self.bump();
                self.parse_function_expression(true)
            }
            TokenKind::Class => self.parse_class_expression(),
            TokenKind::Yield => {
                // Only reached outside a generator; treated as an ordinary
                // identifier (spec.md §3.1 contextual keywords).
                let name = self.bump().lexeme;
                Expr::Identifier { name, span }
            }
            _ if self.is_identifier_like() => {
                let name = self.bump().lexeme;
                Expr::Identifier { name, span }
            }
            _ => {
                self.error(format!(
                    "unexpected token {:?} '{}' in expression",
                    self.current.kind, self.current.lexeme
                ));
                self.bump();
                Expr::UndefinedLiteral { span }
            }
        }
    }

    fn parse_yield_expression(&mut self) -> Expr {
        let span = self.span();
        self.bump(); // 'yield'
        let delegate = self.eat(TokenKind::Star);
        if self.line_break_before_current()
            || matches!(
                self.kind(),
                TokenKind::Semicolon
                    | TokenKind::RParen
                    | TokenKind::RBrace
                    | TokenKind::RBracket
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Eof
            )
        {
            return Expr::Yield { argument: None, delegate, span };
        }
        let argument = self.parse_assignment_expression();
        Expr::Yield { argument: Some(Box::new(argument)), delegate, span }
    }

    fn parse_array_literal(&mut self) -> Expr {
        let span = self.span();
        self.bump(); // '['
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBracket) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Comma) {
                elements.push(None);
                self.bump();
                continue;
            }
            if self.at(TokenKind::Ellipsis) {
                let espan = self.span();
                self.bump();
                let argument = self.parse_assignment_expression();
                elements.push(Some(Expr::Spread { argument: Box::new(argument), span: espan }));
            } else {
                elements.push(Some(self.parse_assignment_expression()));
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "']'");
        Expr::ArrayLiteral { elements, span }
    }

    pub(super) fn parse_property_key(&mut self) -> PropertyKey {
        let span = self.span();
        if self.at(TokenKind::LBracket) {
            self.bump();
            let expr = self.parse_assignment_expression();
            self.expect(TokenKind::RBracket, "']'");
            return PropertyKey {
                expr: Expr::ComputedPropertyName { expr: Box::new(expr), span },
                computed: true,
            };
        }
        if self.at(TokenKind::String) {
            let text = self.bump().lexeme;
            return PropertyKey { expr: Expr::StringLiteral { value: unescape_quoted(&text), span }, computed: false };
        }
        if self.at(TokenKind::Number) {
            let text = self.bump().lexeme;
            return PropertyKey {
                expr: Expr::StringLiteral {
                    value: crate::runtime::value::format_number(parse_number_literal(&text)),
                    span,
                },
                computed: false,
            };
        }
        let name = self.bump_identifier_name();
        PropertyKey { expr: Expr::Identifier { name, span }, computed: false }
    }

    fn parse_object_literal(&mut self) -> Expr {
        let span = self.span();
        self.bump(); // '{'
        let mut properties = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Ellipsis) {
                self.bump();
                let argument = self.parse_assignment_expression();
                properties.push(ObjectProperty::Spread(argument));
                if !self.eat(TokenKind::Comma) {
                    break;
                }
                continue;
            }
            properties.push(self.parse_object_member());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'");
        Expr::ObjectLiteral { properties, span }
    }

    fn parse_object_member(&mut self) -> ObjectProperty {
        let is_async = self.at(TokenKind::Async)
            && !matches!(self.peek_kind(), TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace | TokenKind::LParen);
        if is_async {
            self.bump();
        }
        let is_generator = self.eat(TokenKind::Star);
        if matches!(self.kind(), TokenKind::Get | TokenKind::Set)
            && !matches!(self.peek_kind(), TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace | TokenKind::LParen)
        {
            let kind = if self.at(TokenKind::Get) { MethodKind::Get } else { MethodKind::Set };
            self.bump();
            let key = self.parse_property_key();
            let function = self.parse_method_tail(false, false);
            return ObjectProperty::Method { key, kind, function: Box::new(function) };
        }
        let key = self.parse_property_key();
        if self.at(TokenKind::LParen) {
            let function = self.parse_method_tail(is_async, is_generator);
            return ObjectProperty::Method { key, kind: MethodKind::Method, function: Box::new(function) };
        }
        if self.eat(TokenKind::Colon) {
            let value = self.parse_assignment_expression();
            return ObjectProperty::Data { key, value, shorthand: false };
        }
        // Shorthand `{ x }` or `{ x = default }` (the latter only valid in
        // a destructuring target, tolerated here and resolved by
        // `to_assignment_target`/`expr_to_pattern` later).
        let name = match &key.expr {
            Expr::Identifier { name, .. } => name.clone(),
            _ => {
                self.error("invalid shorthand property");
                String::new()
            }
        };
        let span = key.expr.span();
        if self.eat(TokenKind::Assign) {
            let default = self.parse_assignment_expression();
            let left = Box::new(Expr::Identifier { name, span });
            return ObjectProperty::Data {
                key,
                value: Expr::AssignmentPattern { left, right: Box::new(default), span },
                shorthand: true,
            };
        }
        ObjectProperty::Data { key, value: Expr::Identifier { name, span }, shorthand: true }
    }

    /// Parse `(...) { ... }` once the key/`get`/`set`/`async`/`*` prefix
    /// has already been consumed — shared by object literals and classes.
    pub(super) fn parse_method_tail(&mut self, is_async: bool, is_generator: bool) -> FunctionNode {
        let span = self.span();
        let (params, defaults, rest) = self.parse_params();
        let prev_gen = std::mem::replace(&mut self.in_generator, is_generator);
        let prev_async = std::mem::replace(&mut self.in_async, is_async);
        let body = self.parse_function_body();
        self.in_generator = prev_gen;
        self.in_async = prev_async;
        FunctionNode { name: None, params, defaults, rest, body, is_async, is_generator, span }
    }

    pub(super) fn parse_params(&mut self) -> (Vec<Pattern>, Vec<Option<Expr>>, Option<Box<Pattern>>) {
        self.expect(TokenKind::LParen, "'('");
        let mut params = Vec::new();
        let mut defaults = Vec::new();
        let mut rest = None;
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Ellipsis) {
                self.bump();
                rest = Some(Box::new(self.parse_pattern()));
                break;
            }
            let pat = self.parse_pattern();
            let default = if self.eat(TokenKind::Assign) { Some(self.parse_assignment_expression()) } else { None };
            params.push(pat);
            defaults.push(default);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'");
        (params, defaults, rest)
    }

    pub(super) fn parse_function_body(&mut self) -> FunctionBody {
        let body = self.parse_block_statements();
        FunctionBody::Block(body)
    }

    fn parse_function_expression(&mut self, is_async: bool) -> Expr {
        let span = self.span();
        self.bump(); // 'function'
        let is_generator = self.eat(TokenKind::Star);
        let name = if self.is_identifier_like() { Some(self.bump_identifier_name()) } else { None };
        let (params, defaults, rest) = self.parse_params();
        let prev_gen = std::mem::replace(&mut self.in_generator, is_generator);
        let prev_async = std::mem::replace(&mut self.in_async, is_async);
        let body = self.parse_function_body();
        self.in_generator = prev_gen;
        self.in_async = prev_async;
        let function = FunctionNode { name, params, defaults, rest, body, is_async, is_generator, span };
        Expr::FunctionExpression { function: Box::new(function), span }
    }

    fn parse_class_expression(&mut self) -> Expr {
        let span = self.span();
        let (name, superclass, body) = self.parse_class_tail();
        Expr::ClassExpression { name, superclass: superclass.map(Box::new), body, span }
    }

    /// Arrow-function speculation (spec.md §4.2.2): try the three shapes
    /// (`x => ...`, `async x => ...`, `(...) => ...`/`async (...) => ...`)
    /// and roll back on anything that turns out not to be followed by
    /// `=>`. Must run before conditional-expression parsing since a bare
    /// `(` would otherwise be consumed as a parenthesized expression.
    fn try_parse_arrow_function(&mut self) -> Option<Expr> {
        if self.is_identifier_like() && self.peek_kind() == TokenKind::Arrow && self.peek.line == self.current.line {
            let span = self.span();
            let name = self.bump_identifier_name();
            self.bump(); // '=>'
            return Some(self.finish_arrow(span, vec![Pattern::Identifier(name, span)], vec![None], None, false));
        }
        if self.at(TokenKind::Async) && self.peek.line == self.current.line {
            let cp = self.checkpoint();
            let span = self.span();
            self.bump(); // 'async'
            if self.is_identifier_like() && self.peek_kind() == TokenKind::Arrow && self.peek.line == self.current.line
            {
                let name = self.bump_identifier_name();
                self.bump(); // '=>'
                return Some(self.finish_arrow(span, vec![Pattern::Identifier(name, span)], vec![None], None, true));
            }
            if self.at(TokenKind::LParen) {
                if let Some((params, defaults, rest)) = self.try_parenthesized_arrow_params() {
                    return Some(self.finish_arrow(span, params, defaults, rest, true));
                }
            }
            self.restore(cp);
            return None;
        }
        if self.at(TokenKind::LParen) {
            let span = self.span();
            if let Some((params, defaults, rest)) = self.try_parenthesized_arrow_params() {
                return Some(self.finish_arrow(span, params, defaults, rest, false));
            }
        }
        None
    }

    /// Parses `(...)` permissively as assignment expressions, and only if
    /// `=>` follows converts the collected items into parameters; restores
    /// the checkpoint and returns `None` otherwise so the caller falls
    /// back to ordinary parenthesized-expression parsing.
    fn try_parenthesized_arrow_params(&mut self) -> Option<(Vec<Pattern>, Vec<Option<Expr>>, Option<Box<Pattern>>)> {
        let cp = self.checkpoint();
        self.bump(); // '('
        let mut items: Vec<Expr> = Vec::new();
        let mut rest_item: Option<Expr> = None;
        if !self.at(TokenKind::RParen) {
            loop {
                if self.at(TokenKind::Ellipsis) {
                    let span = self.span();
                    self.bump();
                    let argument = self.parse_assignment_expression();
                    rest_item = Some(Expr::Spread { argument: Box::new(argument), span });
                    break;
                }
                items.push(self.parse_assignment_expression());
                if !self.eat(TokenKind::Comma) {
                    break;
                }
                if self.at(TokenKind::RParen) {
                    break;
                }
            }
        }
        if !self.eat(TokenKind::RParen) || !self.at(TokenKind::Arrow) {
            self.restore(cp);
            return None;
        }
        self.bump(); // '=>'
        let mut params = Vec::new();
        let mut defaults = Vec::new();
        for item in items {
            match item {
                Expr::Assignment { op: AssignOp::Assign, target, value, .. } => match expr_to_pattern(*target) {
                    Ok(pat) => {
                        params.push(pat);
                        defaults.push(Some(*value));
                    }
                    Err(msg) => self.error(msg),
                },
                other => match expr_to_pattern(other) {
                    Ok(pat) => {
                        params.push(pat);
                        defaults.push(None);
                    }
                    Err(msg) => self.error(msg),
                },
            }
        }
        let rest = match rest_item {
            Some(Expr::Spread { argument, .. }) => match expr_to_pattern(*argument) {
                Ok(pat) => Some(Box::new(pat)),
                Err(msg) => {
                    self.error(msg);
                    None
                }
            },
            _ => None,
        };
        Some((params, defaults, rest))
    }

    fn finish_arrow(
        &mut self,
        span: Span,
        params: Vec<Pattern>,
        defaults: Vec<Option<Expr>>,
        rest: Option<Box<Pattern>>,
        is_async: bool,
    ) -> Expr {
        let prev_async = std::mem::replace(&mut self.in_async, is_async);
        let prev_gen = std::mem::replace(&mut self.in_generator, false);
        let body = if self.at(TokenKind::LBrace) {
            FunctionBody::Block(self.parse_block_statements())
        } else {
            FunctionBody::Expression(Box::new(self.parse_assignment_expression()))
        };
        self.in_async = prev_async;
        self.in_generator = prev_gen;
        let function = FunctionNode { name: None, params, defaults, rest, body, is_async, is_generator: false, span };
        Expr::ArrowFunctionExpression { function: Box::new(function), span }
    }

    fn parse_template_literal(&mut self) -> Expr {
        let span = self.span();
        let mut quasis = Vec::new();
        let mut expressions = Vec::new();
        let first = self.bump();
        let tail = first.kind == TokenKind::NoSubstitutionTemplate;
        let (cooked, raw) = template_chunk_text(&first.lexeme, first.kind);
        quasis.push(TemplateQuasi { cooked, raw, tail });
        if tail {
            return Expr::TemplateLiteral { quasis, expressions, span };
        }
        loop {
            expressions.push(self.parse_expression());
            if !matches!(self.kind(), TokenKind::TemplateMiddle | TokenKind::TemplateTail) {
                self.error("unterminated template literal");
                break;
            }
            let part = self.bump();
            let tail = part.kind == TokenKind::TemplateTail;
            let (cooked, raw) = template_chunk_text(&part.lexeme, part.kind);
            quasis.push(TemplateQuasi { cooked, raw, tail });
            if tail {
                break;
            }
        }
        Expr::TemplateLiteral { quasis, expressions, span }
    }
}

/// Template chunk lexemes are always synthesized as `` `text` `` (tail) or
/// `` `text${ `` (head/middle) by the lexer regardless of which real
/// delimiter (backtick or `}`) started the chunk — see
/// `Lexer::scan_template_chunk`.
fn template_chunk_text(lexeme: &str, kind: TokenKind) -> (String, String) {
    let raw = lexeme
        .strip_prefix('`')
        .unwrap_or(lexeme)
        .strip_suffix("${")
        .or_else(|| lexeme.strip_suffix('`').map(|_| &lexeme[1..lexeme.len() - 1]))
        .unwrap_or(lexeme)
        .to_string();
    let raw = if matches!(kind, TokenKind::TemplateHead | TokenKind::TemplateMiddle) {
        lexeme
            .strip_prefix('`')
            .and_then(|s| s.strip_suffix("${"))
            .unwrap_or(&raw)
            .to_string()
    } else {
        raw
    };
    let cooked = unescape_js(&raw);
    (cooked, raw)
}

fn split_regex_lexeme(lexeme: &str) -> (String, String) {
    let body = &lexeme[1..];
    let end = body.rfind('/').unwrap_or(body.len());
    (body[..end].to_string(), body[end + 1..].to_string())
}

fn parse_number_literal(raw: &str) -> f64 {
    let trimmed = raw.strip_suffix('n').unwrap_or(raw);
    let cleaned: String = trimmed.chars().filter(|&c| c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if let Some(oct) = cleaned.strip_prefix("0o").or_else(|| cleaned.strip_prefix("0O")) {
        return u64::from_str_radix(oct, 8).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    if let Some(bin) = cleaned.strip_prefix("0b").or_else(|| cleaned.strip_prefix("0B")) {
        return u64::from_str_radix(bin, 2).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    cleaned.parse::<f64>().unwrap_or(f64::NAN)
}

fn unescape_quoted(lexeme: &str) -> String {
    let inner = &lexeme[1..lexeme.len().saturating_sub(1)];
    unescape_js(inner)
}

/// Shared escape-sequence handling for string and template literals
/// (`\n`, `\t`, hex/unicode escapes, line continuations); unrecognized
/// escapes pass the following character through literally.
fn unescape_js(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{C}'),
            Some('v') => out.push('\u{B}'),
            Some('0') if !matches!(chars.peek(), Some('0'..='9')) => out.push('\0'),
            Some('\n') => {}
            Some('\r') => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                if let Ok(code) = u32::from_str_radix(&hex, 16) {
                    if let Some(ch) = char::from_u32(code) {
                        out.push(ch);
                    }
                }
            }
            Some('u') => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    let mut hex = String::new();
                    for h in chars.by_ref() {
                        if h == '}' {
                            break;
                        }
                        hex.push(h);
                    }
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                        }
                    }
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    if let Ok(code) = u32::from_str_radix(&hex, 16) {
                        if let Some(ch) = char::from_u32(code) {
                            out.push(ch);
                        }
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
