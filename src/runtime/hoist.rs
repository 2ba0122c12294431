//! Pre-execution hoisting pass (spec.md §4.4).
//!
//! Two ordinary passes — collect `var` names up to function scope, bind
//! function declarations at the current level — plus the Annex B
//! block-function pass, which is intentionally a separate function that
//! takes a precomputed set of blocking names (SPEC_FULL.md §9,
//! "Hoisting walker").

use std::collections::HashSet;

use crate::frontend::ast::{FunctionNode, Pattern, Statement, VarKind};

/// Everything the two-pass walk over a function/program body discovers.
#[derive(Debug, Default)]
pub struct HoistResult {
    /// `var` names to install as `undefined` at the current function scope.
    pub var_names: Vec<String>,
    /// Function declarations to bind at the *current* level (pass 2).
    pub functions: Vec<FunctionNode>,
}

fn collect_pattern_names(pattern: &Pattern, out: &mut Vec<String>) {
    match pattern {
        Pattern::Identifier(name, _) => out.push(name.clone()),
        Pattern::Object(entries, _) => {
            for entry in entries {
                collect_pattern_names(&entry.value, out);
            }
        }
        Pattern::Array(elements, _) => {
            for el in elements.iter().flatten() {
                collect_pattern_names(el, out);
            }
        }
        Pattern::Assignment(inner, _, _) => collect_pattern_names(inner, out),
        Pattern::Rest(inner, _) => collect_pattern_names(inner, out),
    }
}

/// Pass 1 + pass 2 over a single statement list (a function body or
/// Program). Does not descend into nested function bodies.
pub fn hoist(body: &[Statement]) -> HoistResult {
    let mut result = HoistResult::default();
    for stmt in body {
        collect_vars(stmt, &mut result.var_names);
    }
    for stmt in body {
        if let Statement::FunctionDeclaration { function, .. } = stmt {
            result.functions.push(function.clone());
        }
    }
    result
}

fn collect_vars(stmt: &Statement, out: &mut Vec<String>) {
    match stmt {
        Statement::VariableDeclaration { kind, declarations, .. } => {
            if *kind == VarKind::Var {
                for decl in declarations {
                    collect_pattern_names(&decl.id, out);
                }
            }
        }
        Statement::BlockStatement { body, .. } => {
            for s in body {
                collect_vars(s, out);
            }
        }
        Statement::If { consequent, alternate, .. } => {
            collect_vars(consequent, out);
            if let Some(alt) = alternate {
                collect_vars(alt, out);
            }
        }
        Statement::While { body, .. } | Statement::DoWhile { body, .. } => {
            collect_vars(body, out);
        }
        Statement::For { init, body, .. } => {
            if let Some(init) = init {
                collect_for_init_vars(init, out);
            }
            collect_vars(body, out);
        }
        Statement::ForIn { left, body, .. } | Statement::ForOf { left, body, .. } => {
            collect_for_init_vars(left, out);
            collect_vars(body, out);
        }
        Statement::Switch { cases, .. } => {
            for case in cases {
                for s in &case.consequent {
                    collect_vars(s, out);
                }
            }
        }
        Statement::Try { block, handler, finalizer, .. } => {
            collect_vars(block, out);
            if let Some(h) = handler {
                collect_vars(&h.body, out);
            }
            if let Some(f) = finalizer {
                collect_vars(f, out);
            }
        }
        Statement::LabeledStatement { body, .. } => collect_vars(body, out),
        Statement::With { body, .. } => collect_vars(body, out),
        // FunctionDeclaration/ClassDeclaration/Expression/Return/etc: no
        // var names, and FunctionDeclaration/FunctionExpression bodies are
        // their own scope, not descended into here.
        _ => {}
    }
}

fn collect_for_init_vars(init: &crate::frontend::ast::ForInit, out: &mut Vec<String>) {
    use crate::frontend::ast::ForInit;
    if let ForInit::Declaration { kind, declarations } = init {
        if *kind == VarKind::Var {
            for decl in declarations {
                collect_pattern_names(&decl.id, out);
            }
        }
    }
}

/// Names that block Annex B hoisting at or above a given point: any
/// `let`/`const` binding, any parameter name (including `arguments`), or
/// a shallower function declaration that already claimed the name
/// (spec.md §4.4).
pub fn lexical_blocking_names(body: &[Statement]) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in body {
        collect_lexical_names(stmt, &mut names);
    }
    names
}

fn collect_lexical_names(stmt: &Statement, out: &mut HashSet<String>) {
    match stmt {
        Statement::VariableDeclaration { kind, declarations, .. } => {
            if *kind != VarKind::Var {
                let mut names = Vec::new();
                for decl in declarations {
                    collect_pattern_names(&decl.id, &mut names);
                }
                out.extend(names);
            }
        }
        Statement::ClassDeclaration { name, .. } => {
            out.insert(name.clone());
        }
        _ => {}
    }
}

/// Recursively discover `FunctionDeclaration`s nested inside blocks,
/// if/else arms, switch cases, try/catch/finally and loop bodies, for the
/// Annex B pass (spec.md §4.4). Each entry pairs the function with the
/// set of names lexically blocking it at the point of declaration.
pub fn annex_b_candidates(body: &[Statement]) -> Vec<(FunctionNode, HashSet<String>)> {
    let mut out = Vec::new();
    let top_level_blocking = lexical_blocking_names(body);
    for stmt in body {
        walk_annex_b(stmt, &top_level_blocking, &mut out, true);
    }
    out
}

fn walk_annex_b(
    stmt: &Statement,
    inherited_blocking: &HashSet<String>,
    out: &mut Vec<(FunctionNode, HashSet<String>)>,
    top_level: bool,
) {
    match stmt {
        Statement::FunctionDeclaration { function, .. } if !top_level => {
            out.push((function.clone(), inherited_blocking.clone()));
        }
        Statement::BlockStatement { body, .. } => {
            let mut blocking = inherited_blocking.clone();
            blocking.extend(lexical_blocking_names(body));
            for s in body {
                walk_annex_b(s, &blocking, out, false);
            }
        }
        Statement::If { consequent, alternate, .. } => {
            walk_annex_b(consequent, inherited_blocking, out, false);
            if let Some(alt) = alternate {
                walk_annex_b(alt, inherited_blocking, out, false);
            }
        }
        Statement::While { body, .. } | Statement::DoWhile { body, .. } => {
            walk_annex_b(body, inherited_blocking, out, false);
        }
        Statement::For { body, .. }
        | Statement::ForIn { body, .. }
        | Statement::ForOf { body, .. } => {
            walk_annex_b(body, inherited_blocking, out, false);
        }
        Statement::Switch { cases, .. } => {
            let mut blocking = inherited_blocking.clone();
            for case in cases {
                for s in &case.consequent {
                    collect_lexical_names(s, &mut blocking);
                }
            }
            for case in cases {
                for s in &case.consequent {
                    walk_annex_b(s, &blocking, out, false);
                }
            }
        }
        Statement::Try { block, handler, finalizer, .. } => {
            walk_annex_b(block, inherited_blocking, out, false);
            if let Some(h) = handler {
                let mut blocking = inherited_blocking.clone();
                // A simple-identifier catch parameter does NOT block;
                // a destructuring one does (spec.md §4.4).
                if let Some(pattern) = &h.param {
                    if !matches!(pattern, Pattern::Identifier(_, _)) {
                        let mut names = Vec::new();
                        collect_pattern_names(pattern, &mut names);
                        blocking.extend(names);
                    }
                }
                walk_annex_b(&h.body, &blocking, out, false);
            }
            if let Some(f) = finalizer {
                walk_annex_b(f, inherited_blocking, out, false);
            }
        }
        Statement::LabeledStatement { body, .. } => {
            walk_annex_b(body, inherited_blocking, out, top_level);
        }
        _ => {}
    }
}
