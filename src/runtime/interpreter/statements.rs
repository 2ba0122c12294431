//! Statement execution (spec.md §4.3.2).

use crate::error::ErrorKind;
use crate::frontend::ast::{CatchClause, Expr, ForInit, Pattern, Statement, SwitchCase, VarKind};
use crate::runtime::environment::{BindingKind, Environment};
use crate::runtime::object::{Key, Object};
use crate::runtime::value::Value;

use super::{Interpreter, Signal};

impl Interpreter {
    /// Execute one statement. The `Option<Value>` is the statement's
    /// completion value (only `ExpressionStatement` produces one; it only
    /// matters for [`Interpreter::eval_program`]'s return value and direct
    /// `eval`, per spec.md §4.3.3 "eval").
    pub fn exec_statement(&mut self, stmt: &Statement, env: &Environment) -> (Option<Value>, Signal) {
        match stmt {
            Statement::ExpressionStatement { expr, .. } => match self.eval_expression(expr, env) {
                Ok(v) => (Some(v), Signal::None),
                Err(e) => (None, Signal::Throw(e)),
            },
            Statement::VariableDeclaration { kind, declarations, .. } => {
                for decl in declarations {
                    let value = match &decl.init {
                        Some(e) => match self.eval_expression(e, env) {
                            Ok(v) => v,
                            Err(err) => return (None, Signal::Throw(err)),
                        },
                        None => Value::Undefined,
                    };
                    if let Err(err) = self.declare_pattern(&decl.id, value, env, *kind) {
                        return (None, Signal::Throw(err));
                    }
                }
                (None, Signal::None)
            }
            Statement::BlockStatement { body, .. } => self.exec_block(body, env),
            Statement::Empty { .. } | Statement::Debugger { .. } => (None, Signal::None),
            // Bound during hoisting; nothing left to do when execution
            // reaches the declaration itself.
            Statement::FunctionDeclaration { .. } => (None, Signal::None),
            Statement::ClassDeclaration { name, superclass, body, .. } => {
                match self.eval_class(Some(name.clone()), superclass.as_ref(), body, env) {
                    Ok(v) => {
                        if let Err(err) = env.declare(name, BindingKind::Let, v) {
                            return (None, Signal::Throw(self.make_error(err.kind, err.message)));
                        }
                        (None, Signal::None)
                    }
                    Err(e) => (None, Signal::Throw(e)),
                }
            }
            Statement::ReturnStatement { argument, .. } => {
                let value = match argument {
                    Some(e) => match self.eval_expression(e, env) {
                        Ok(v) => v,
                        Err(err) => return (None, Signal::Throw(err)),
                    },
                    None => Value::Undefined,
                };
                (None, Signal::Return(value))
            }
            Statement::If { test, consequent, alternate, .. } => {
                let cond = match self.eval_expression(test, env) {
                    Ok(v) => v.to_boolean(),
                    Err(err) => return (None, Signal::Throw(err)),
                };
                if cond {
                    self.exec_statement(consequent, env)
                } else if let Some(alt) = alternate {
                    self.exec_statement(alt, env)
                } else {
                    (None, Signal::None)
                }
            }
            Statement::While { test, body, .. } => self.exec_while(test, body, env, &[]),
            Statement::DoWhile { body, test, .. } => self.exec_do_while(body, test, env, &[]),
            Statement::For { init, test, update, body, .. } => {
                self.exec_for(init.as_deref(), test.as_ref(), update.as_ref(), body, env, &[])
            }
            Statement::ForIn { left, right, body, .. } => self.exec_for_in(left, right, body, env, &[]),
            Statement::ForOf { left, right, body, .. } => self.exec_for_of(left, right, body, env, &[]),
            Statement::Break { label, .. } => (None, Signal::Break(label.clone())),
            Statement::Continue { label, .. } => (None, Signal::Continue(label.clone())),
            Statement::Switch { discriminant, cases, .. } => self.exec_switch(discriminant, cases, env),
            Statement::Throw { argument, .. } => match self.eval_expression(argument, env) {
                Ok(v) => (None, Signal::Throw(v)),
                Err(err) => (None, Signal::Throw(err)),
            },
            Statement::Try { block, handler, finalizer, .. } => {
                self.exec_try(block, handler.as_ref(), finalizer.as_deref(), env)
            }
            Statement::LabeledStatement { label, body, .. } => self.exec_labeled(label, body, env),
            Statement::With { object, body, .. } => {
                if let Err(err) = self.eval_expression(object, env) {
                    return (None, Signal::Throw(err));
                }
                // Object environment records (identifiers resolving against
                // the with-object's properties) are not modeled; the body
                // runs in an ordinary child scope.
                self.exec_statement(body, &env.child_block())
            }
        }
    }

    fn declare_pattern(
        &mut self,
        pattern: &Pattern,
        value: Value,
        env: &Environment,
        kind: VarKind,
    ) -> Result<(), Value> {
        match pattern {
            Pattern::Identifier(name, _) => {
                match kind {
                    VarKind::Var => env.declare_var(name, value),
                    VarKind::Let => env
                        .declare(name, BindingKind::Let, value)
                        .map_err(|e| self.make_error(e.kind, e.message))?,
                    VarKind::Const => env
                        .declare(name, BindingKind::Const, value)
                        .map_err(|e| self.make_error(e.kind, e.message))?,
                }
                Ok(())
            }
            Pattern::Assignment(inner, default, _) => {
                let value = if matches!(value, Value::Undefined) {
                    self.eval_expression(default, env)?
                } else {
                    value
                };
                self.declare_pattern(inner, value, env, kind)
            }
            Pattern::Rest(inner, _) => self.declare_pattern(inner, value, env, kind),
            Pattern::Array(elements, _) => {
                let items = self.iterate_to_vec(&value)?;
                for (i, el) in elements.iter().enumerate() {
                    match el {
                        None => {}
                        Some(Pattern::Rest(inner, _)) => {
                            let rest: Vec<Value> =
                                items.get(i..).map(<[Value]>::to_vec).unwrap_or_default();
                            let arr = Object::new_array(Some(self.array_proto.clone()), rest);
                            self.declare_pattern(inner, Value::Object(arr), env, kind)?;
                        }
                        Some(p) => {
                            let v = items.get(i).cloned().unwrap_or(Value::Undefined);
                            self.declare_pattern(p, v, env, kind)?;
                        }
                    }
                }
                Ok(())
            }
            Pattern::Object(entries, _) => {
                for entry in entries {
                    let key = self.property_key_value(&entry.key, env)?;
                    let v = self.get_property_value(&value, &key)?;
                    self.declare_pattern(&entry.value, v, env, kind)?;
                }
                Ok(())
            }
        }
    }

    fn exec_block(&mut self, body: &[Statement], env: &Environment) -> (Option<Value>, Signal) {
        let block_env = env.child_block();
        let hoist = crate::runtime::hoist::hoist(body);
        for function in &hoist.functions {
            let func_value = self.make_function(function, &block_env, false);
            let name = function.name.as_deref().unwrap_or("");
            if let Err(err) = block_env.declare(name, BindingKind::Function, func_value) {
                return (None, Signal::Throw(self.make_error(err.kind, err.message)));
            }
        }
        let mut last = None;
        for stmt in body {
            let (value, signal) = self.exec_statement(stmt, &block_env);
            if value.is_some() {
                last = value;
            }
            if !signal.is_none() {
                return (last, signal);
            }
        }
        (last, Signal::None)
    }

    /// Installs the Annex B var-scoped aliases for function declarations
    /// nested in blocks, once per function invocation (spec.md §4.4). A
    /// function whose name is blocked by a lexical/param binding at its
    /// declaration point is skipped.
    pub(super) fn run_annex_b(&mut self, env: &Environment, body: &[Statement]) {
        let candidates = crate::runtime::hoist::annex_b_candidates(body);
        for (function, blocking) in candidates {
            let Some(name) = function.name.clone() else { continue };
            if blocking.contains(&name) {
                continue;
            }
            if matches!(env.own_binding_kind(&name), Some(BindingKind::Param)) {
                continue;
            }
            let func_value = self.make_function(&function, env, false);
            env.declare_var(&name, func_value);
        }
    }

    fn exec_while(
        &mut self,
        test: &Expr,
        body: &Statement,
        env: &Environment,
        labels: &[String],
    ) -> (Option<Value>, Signal) {
        loop {
            match self.eval_expression(test, env) {
                Ok(v) if v.to_boolean() => {}
                Ok(_) => return (None, Signal::None),
                Err(e) => return (None, Signal::Throw(e)),
            }
            let (_, signal) = self.exec_statement(body, env);
            match loop_control(signal, labels) {
                LoopFlow::Continue => {}
                LoopFlow::Break => return (None, Signal::None),
                LoopFlow::Propagate(s) => return (None, s),
            }
        }
    }

    fn exec_do_while(
        &mut self,
        body: &Statement,
        test: &Expr,
        env: &Environment,
        labels: &[String],
    ) -> (Option<Value>, Signal) {
        loop {
            let (_, signal) = self.exec_statement(body, env);
            match loop_control(signal, labels) {
                LoopFlow::Continue => {}
                LoopFlow::Break => return (None, Signal::None),
                LoopFlow::Propagate(s) => return (None, s),
            }
            match self.eval_expression(test, env) {
                Ok(v) if v.to_boolean() => {}
                Ok(_) => return (None, Signal::None),
                Err(e) => return (None, Signal::Throw(e)),
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&ForInit>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Statement,
        env: &Environment,
        labels: &[String],
    ) -> (Option<Value>, Signal) {
        let loop_env = env.child_block();
        let mut per_iteration = false;
        if let Some(init) = init {
            match init {
                ForInit::Declaration { kind, declarations } => {
                    per_iteration = matches!(kind, VarKind::Let | VarKind::Const);
                    for decl in declarations {
                        let value = match &decl.init {
                            Some(e) => match self.eval_expression(e, &loop_env) {
                                Ok(v) => v,
                                Err(err) => return (None, Signal::Throw(err)),
                            },
                            None => Value::Undefined,
                        };
                        if let Err(err) = self.declare_pattern(&decl.id, value, &loop_env, *kind) {
                            return (None, Signal::Throw(err));
                        }
                    }
                }
                ForInit::Expression(expr) => {
                    if let Err(err) = self.eval_expression(expr, &loop_env) {
                        return (None, Signal::Throw(err));
                    }
                }
            }
        }

        // `CreatePerIterationEnvironment` (spec.md §3.5/§4.3): a `let`/`const`
        // loop variable gets a fresh frame each iteration, copied forward
        // from the previous one, so a closure made in iteration N keeps
        // seeing iteration N's value even after the loop has moved on.
        let mut current_env = if per_iteration {
            Self::per_iteration_env(&loop_env)
        } else {
            loop_env
        };

        loop {
            if let Some(test) = test {
                match self.eval_expression(test, &current_env) {
                    Ok(v) if v.to_boolean() => {}
                    Ok(_) => return (None, Signal::None),
                    Err(e) => return (None, Signal::Throw(e)),
                }
            }
            let (_, signal) = self.exec_statement(body, &current_env);
            match loop_control(signal, labels) {
                LoopFlow::Continue => {}
                LoopFlow::Break => return (None, Signal::None),
                LoopFlow::Propagate(s) => return (None, s),
            }
            if per_iteration {
                current_env = Self::per_iteration_env(&current_env);
            }
            if let Some(update) = update {
                if let Err(e) = self.eval_expression(update, &current_env) {
                    return (None, Signal::Throw(e));
                }
            }
        }
    }

    /// Copies `env`'s own bindings into a fresh sibling frame (same
    /// parent), giving each `for (let ...)` iteration its own cell for the
    /// loop variable instead of sharing one across the whole loop.
    fn per_iteration_env(env: &Environment) -> Environment {
        let parent = env.parent().unwrap_or_else(|| env.clone());
        let fresh = parent.child_block();
        for (name, kind, value) in env.own_bindings() {
            let _ = fresh.declare(&name, kind, value);
        }
        fresh
    }

    fn exec_for_in(
        &mut self,
        left: &ForInit,
        right: &Expr,
        body: &Statement,
        env: &Environment,
        labels: &[String],
    ) -> (Option<Value>, Signal) {
        let right_val = match self.eval_expression(right, env) {
            Ok(v) => v,
            Err(e) => return (None, Signal::Throw(e)),
        };
        if right_val.is_nullish() {
            return (None, Signal::None);
        }
        // Snapshot keys up front so mutations during the loop body don't
        // change the iteration set (spec.md §4.3.2 "For-in").
        let mut keys: Vec<String> = Vec::new();
        if let Value::Object(o) = &right_val {
            let mut current = Some(o.clone());
            let mut seen = std::collections::HashSet::new();
            while let Some(obj) = current {
                for s in obj.own_enumerable_string_keys() {
                    if seen.insert(s.to_string()) {
                        keys.push(s.to_string());
                    }
                }
                current = obj.prototype();
            }
        }
        for key in keys {
            let loop_env = env.child_block();
            if let Err(e) = self.bind_for_target(left, Value::string(key), &loop_env) {
                return (None, Signal::Throw(e));
            }
            let (_, signal) = self.exec_statement(body, &loop_env);
            match loop_control(signal, labels) {
                LoopFlow::Continue => {}
                LoopFlow::Break => return (None, Signal::None),
                LoopFlow::Propagate(s) => return (None, s),
            }
        }
        (None, Signal::None)
    }

    fn exec_for_of(
        &mut self,
        left: &ForInit,
        right: &Expr,
        body: &Statement,
        env: &Environment,
        labels: &[String],
    ) -> (Option<Value>, Signal) {
        let right_val = match self.eval_expression(right, env) {
            Ok(v) => v,
            Err(e) => return (None, Signal::Throw(e)),
        };
        let items = match self.iterate_to_vec(&right_val) {
            Ok(v) => v,
            Err(e) => return (None, Signal::Throw(e)),
        };
        for item in items {
            let loop_env = env.child_block();
            if let Err(e) = self.bind_for_target(left, item, &loop_env) {
                return (None, Signal::Throw(e));
            }
            let (_, signal) = self.exec_statement(body, &loop_env);
            match loop_control(signal, labels) {
                LoopFlow::Continue => {}
                LoopFlow::Break => return (None, Signal::None),
                LoopFlow::Propagate(s) => return (None, s),
            }
        }
        (None, Signal::None)
    }

    fn bind_for_target(&mut self, left: &ForInit, value: Value, env: &Environment) -> Result<(), Value> {
        match left {
            ForInit::Declaration { kind, declarations } => {
                let decl = &declarations[0];
                self.declare_pattern(&decl.id, value, env, *kind)
            }
            ForInit::Expression(expr) => self.assign_for_target(expr, value, env),
        }
    }

    fn assign_for_target(&mut self, expr: &Expr, value: Value, env: &Environment) -> Result<(), Value> {
        match expr {
            Expr::Identifier { name, .. } => {
                if env.has(name) {
                    env.set(name, value).map_err(|e| self.make_error(e.kind, e.message))
                } else {
                    env.declare_var(name, value);
                    Ok(())
                }
            }
            Expr::Member { object, property, computed, .. } => {
                let obj_val = self.eval_expression(object, env)?;
                let key = if *computed {
                    let v = self.eval_expression(property, env)?;
                    self.to_property_key(&v)?
                } else if let Expr::Identifier { name, .. } = property.as_ref() {
                    Key::str(name.clone())
                } else {
                    let v = self.eval_expression(property, env)?;
                    self.to_property_key(&v)?
                };
                self.set_property_value(&obj_val, key, value)
            }
            _ => Err(self.throw(ErrorKind::SyntaxError, "invalid for-in/for-of target")),
        }
    }

    /// First matching (or default) case runs through to the end of the
    /// statement list unless interrupted, matching JS fallthrough (spec.md
    /// §4.3.2 "Switch").
    fn exec_switch(
        &mut self,
        discriminant: &Expr,
        cases: &[SwitchCase],
        env: &Environment,
    ) -> (Option<Value>, Signal) {
        let disc = match self.eval_expression(discriminant, env) {
            Ok(v) => v,
            Err(e) => return (None, Signal::Throw(e)),
        };
        let switch_env = env.child_block();
        let mut start = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let test_val = match self.eval_expression(test, &switch_env) {
                    Ok(v) => v,
                    Err(e) => return (None, Signal::Throw(e)),
                };
                if disc.strict_eq(&test_val) {
                    start = Some(i);
                    break;
                }
            }
        }
        let start = start.or_else(|| cases.iter().position(|c| c.test.is_none()));
        let Some(start) = start else {
            return (None, Signal::None);
        };
        let (value, signal) = self.exec_case_body(&cases[start..], &switch_env);
        match signal {
            Signal::Break(None) => (value, Signal::None),
            other => (value, other),
        }
    }

    fn exec_case_body(&mut self, cases: &[SwitchCase], env: &Environment) -> (Option<Value>, Signal) {
        let mut last = None;
        for case in cases {
            for stmt in &case.consequent {
                let (value, signal) = self.exec_statement(stmt, env);
                if value.is_some() {
                    last = value;
                }
                if !signal.is_none() {
                    return (last, signal);
                }
            }
        }
        (last, Signal::None)
    }

    fn exec_try(
        &mut self,
        block: &Statement,
        handler: Option<&CatchClause>,
        finalizer: Option<&Statement>,
        env: &Environment,
    ) -> (Option<Value>, Signal) {
        let (mut value, mut signal) = self.exec_statement(block, env);
        if let Signal::Throw(thrown) = signal {
            if let Some(handler) = handler {
                let catch_env = env.child_block();
                let bind_result = match &handler.param {
                    Some(param) => self.declare_pattern(param, thrown, &catch_env, VarKind::Let),
                    None => Ok(()),
                };
                match bind_result {
                    Ok(()) => {
                        let (v, s) = self.exec_statement(&handler.body, &catch_env);
                        value = v;
                        signal = s;
                    }
                    Err(err) => {
                        value = None;
                        signal = Signal::Throw(err);
                    }
                }
            } else {
                signal = Signal::Throw(thrown);
            }
        }
        self.finalize_try(value, signal, finalizer, env)
    }

    fn finalize_try(
        &mut self,
        value: Option<Value>,
        signal: Signal,
        finalizer: Option<&Statement>,
        env: &Environment,
    ) -> (Option<Value>, Signal) {
        let Some(finalizer) = finalizer else {
            return (value, signal);
        };
        let (finally_value, finally_signal) = self.exec_statement(finalizer, env);
        // A completion from `finally` overrides whatever `try`/`catch`
        // produced, matching spec.md §4.3.2 "Try/catch/finally".
        if !finally_signal.is_none() {
            return (finally_value, finally_signal);
        }
        (value, signal)
    }

    fn exec_labeled(&mut self, label: &str, body: &Statement, env: &Environment) -> (Option<Value>, Signal) {
        let mut labels = vec![label.to_string()];
        let mut target = body;
        while let Statement::LabeledStatement { label: inner_label, body: inner_body, .. } = target {
            labels.push(inner_label.clone());
            target = inner_body;
        }
        let (value, signal) = match target {
            Statement::While { test, body, .. } => self.exec_while(test, body, env, &labels),
            Statement::DoWhile { body, test, .. } => self.exec_do_while(body, test, env, &labels),
            Statement::For { init, test, update, body, .. } => {
                self.exec_for(init.as_deref(), test.as_ref(), update.as_ref(), body, env, &labels)
            }
            Statement::ForIn { left, right, body, .. } => self.exec_for_in(left, right, body, env, &labels),
            Statement::ForOf { left, right, body, .. } => self.exec_for_of(left, right, body, env, &labels),
            other => self.exec_statement(other, env),
        };
        match signal {
            Signal::Break(Some(ref l)) if labels.contains(l) => (value, Signal::None),
            other => (value, other),
        }
    }
}

enum LoopFlow {
    Continue,
    Break,
    Propagate(Signal),
}

/// Collapse a body-statement `Signal` into what the enclosing loop should
/// do, treating `continue`/`break` labeled with one of this loop's own
/// labels as the unlabeled form (spec.md §4.3.2 "Labeled statements").
fn loop_control(signal: Signal, labels: &[String]) -> LoopFlow {
    match signal {
        Signal::None => LoopFlow::Continue,
        Signal::Continue(None) => LoopFlow::Continue,
        Signal::Continue(Some(ref l)) if labels.contains(l) => LoopFlow::Continue,
        Signal::Break(None) => LoopFlow::Break,
        Signal::Break(Some(ref l)) if labels.contains(l) => LoopFlow::Break,
        other => LoopFlow::Propagate(other),
    }
}
