//! Destructuring-pattern parsing (spec.md §4.2.2).
//!
//! Two entry points, matching the two contexts patterns show up in:
//! [`Parser::parse_pattern`] is used wherever the grammar already knows a
//! position is a binding (function params, `var`/`let`/`const`
//! declarators, `catch` parameters) and recurses directly.
//! [`expr_to_pattern`] converts the permissively-parsed `Expr` forms
//! arrow-function speculation produces (see [`super::expressions`]) once
//! `=>` confirms the parenthesized content really was a parameter list.

use crate::frontend::ast::{Expr, ObjectPatternEntry, ObjectProperty, Pattern};
use crate::frontend::token::TokenKind;

use super::Parser;

impl<'a> Parser<'a> {
    /// Parse a binding target: identifier, object pattern, or array
    /// pattern. Defaults (`= expr`) at this level are the caller's
    /// responsibility (e.g. function params track them in a parallel
    /// `defaults` vec rather than nesting `Pattern::Assignment`); defaults
    /// *inside* an object/array pattern element are handled here via
    /// [`Parser::parse_pattern_with_default`].
    pub(super) fn parse_pattern(&mut self) -> Pattern {
        match self.kind() {
            TokenKind::LBrace => self.parse_object_pattern(),
            TokenKind::LBracket => self.parse_array_pattern(),
            _ => {
                let span = self.span();
                let name = self.bump_identifier_name();
                Pattern::Identifier(name, span)
            }
        }
    }

    pub(super) fn parse_pattern_with_default(&mut self) -> Pattern {
        let span = self.span();
        let pat = self.parse_pattern();
        if self.eat(TokenKind::Assign) {
            let default = self.parse_assignment_expression();
            Pattern::Assignment(Box::new(pat), Box::new(default), span)
        } else {
            pat
        }
    }

    fn parse_object_pattern(&mut self) -> Pattern {
        let span = self.span();
        self.expect(TokenKind::LBrace, "'{'");
        let mut entries = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Ellipsis) {
                self.error("object rest patterns are not supported");
                self.bump();
                let _ = self.parse_pattern();
                break;
            }
            let key = self.parse_property_key();
            let value = if self.eat(TokenKind::Colon) {
                self.parse_pattern_with_default()
            } else {
                let name = match &key.expr {
                    Expr::Identifier { name, .. } => name.clone(),
                    _ => {
                        self.error("invalid shorthand destructuring target");
                        String::new()
                    }
                };
                let id = Pattern::Identifier(name, span);
                if self.eat(TokenKind::Assign) {
                    let default = self.parse_assignment_expression();
                    Pattern::Assignment(Box::new(id), Box::new(default), span)
                } else {
                    id
                }
            };
            entries.push(ObjectPatternEntry { key, value });
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'");
        Pattern::Object(entries, span)
    }

    fn parse_array_pattern(&mut self) -> Pattern {
        let span = self.span();
        self.expect(TokenKind::LBracket, "'['");
        let mut elements = Vec::new();
        while !self.at(TokenKind::RBracket) && !self.at(TokenKind::Eof) {
            if self.at(TokenKind::Comma) {
                elements.push(None);
                self.bump();
                continue;
            }
            if self.at(TokenKind::Ellipsis) {
                self.bump();
                let inner = self.parse_pattern();
                elements.push(Some(Pattern::Rest(Box::new(inner), span)));
                break;
            }
            elements.push(Some(self.parse_pattern_with_default()));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "']'");
        Pattern::Array(elements, span)
    }
}

/// Convert an arrow-parameter-speculation `Expr` into a committed
/// `Pattern`, the step spec.md §4.2.2 describes as "each item must
/// already be a valid binding pattern". Returns `Err` with a diagnostic
/// message when the expression cannot be a binding target (e.g. a member
/// expression or a literal).
pub(super) fn expr_to_pattern(expr: Expr) -> Result<Pattern, String> {
    match expr {
        Expr::Identifier { name, span } => Ok(Pattern::Identifier(name, span)),
        Expr::AssignmentPattern { left, right, span } => {
            Ok(Pattern::Assignment(Box::new(expr_to_pattern(*left)?), right, span))
        }
        Expr::Assignment { op: crate::frontend::ast::AssignOp::Assign, target, value, span } => {
            Ok(Pattern::Assignment(Box::new(expr_to_pattern(*target)?), value, span))
        }
        Expr::ArrayPattern { elements, span } | Expr::ArrayLiteral { elements, span } => {
            let mut out = Vec::with_capacity(elements.len());
            for el in elements {
                out.push(match el {
                    None => None,
                    Some(Expr::Spread { argument, span }) | Some(Expr::RestElement { argument, span }) => {
                        Some(Pattern::Rest(Box::new(expr_to_pattern(*argument)?), span))
                    }
                    Some(e) => Some(expr_to_pattern(e)?),
                });
            }
            Ok(Pattern::Array(out, span))
        }
        Expr::ObjectPattern { properties, span } => {
            let mut entries = Vec::with_capacity(properties.len());
            for prop in properties {
                entries.push(ObjectPatternEntry { key: prop.key, value: expr_to_pattern(prop.value)? });
            }
            Ok(Pattern::Object(entries, span))
        }
        Expr::ObjectLiteral { properties, span } => {
            let mut entries = Vec::with_capacity(properties.len());
            for prop in properties {
                match prop {
                    ObjectProperty::Data { key, value, .. } => {
                        entries.push(ObjectPatternEntry { key, value: expr_to_pattern(value)? });
                    }
                    ObjectProperty::Spread(_) => {
                        return Err("object rest patterns are not supported".to_string())
                    }
                    ObjectProperty::Method { .. } => {
                        return Err("invalid destructuring target".to_string())
                    }
                }
            }
            Ok(Pattern::Object(entries, span))
        }
        Expr::Spread { argument, span } | Expr::RestElement { argument, span } => {
            Ok(Pattern::Rest(Box::new(expr_to_pattern(*argument)?), span))
        }
        other => Err(format!(
            "line {}: invalid binding pattern",
            other.span().line
        )),
    }
}
