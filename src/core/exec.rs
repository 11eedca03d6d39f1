use crate::core::{
    DeclarationContext, EvalError, EvalResult, Evaluated, Expr, ForInTarget, ForInit, Program, Runtime, Statement, StatementKind,
    SwitchClause, Value, get_own_property, new_declarative_environment, new_object_environment, own_keys, strict_equals, to_boolean,
};
use std::collections::HashSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionKind {
    Normal,
    Break,
    Continue,
    Return,
}

/// Outcome of a statement. Throws travel as `Err` instead.
#[derive(Clone, Debug)]
pub struct Completion<'gc> {
    pub kind: CompletionKind,
    pub value: Option<Value<'gc>>,
    pub target: Option<String>,
}

impl<'gc> Completion<'gc> {
    pub fn normal(value: Option<Value<'gc>>) -> Self {
        Completion {
            kind: CompletionKind::Normal,
            value,
            target: None,
        }
    }

    fn jump(kind: CompletionKind, target: &Option<String>) -> Self {
        Completion {
            kind,
            value: None,
            target: target.clone(),
        }
    }

    pub fn is_abrupt(&self) -> bool {
        self.kind != CompletionKind::Normal
    }

    /// Value a function call produces from its body's completion.
    pub fn return_value(self) -> Value<'gc> {
        match self.kind {
            CompletionKind::Return => self.value.unwrap_or(Value::Undefined),
            _ => Value::Undefined,
        }
    }

    fn with_default_value(mut self, value: &Option<Value<'gc>>) -> Self {
        if self.value.is_none() {
            self.value = value.clone();
        }
        self
    }
}

fn targets_this(target: &Option<String>, labels: &[String]) -> bool {
    match target {
        None => true,
        Some(label) => labels.iter().any(|l| l == label),
    }
}

/// LoopContinues (ES5 12.6).
fn loop_continues(completion: &Completion<'_>, labels: &[String]) -> bool {
    match completion.kind {
        CompletionKind::Normal => true,
        CompletionKind::Continue => targets_this(&completion.target, labels),
        _ => false,
    }
}

/// Completion of an iteration statement left through `completion`.
fn exit_loop<'gc>(completion: Completion<'gc>, value: Option<Value<'gc>>, labels: &[String]) -> Completion<'gc> {
    if completion.kind == CompletionKind::Break && targets_this(&completion.target, labels) {
        return Completion::normal(value);
    }
    completion.with_default_value(&value)
}

impl<'gc> Runtime<'gc> {
    /// Run global code in the global execution context.
    pub fn execute_program(&mut self, program: &Program) -> EvalResult<'gc, Value<'gc>> {
        let ctx = self.global_context(program.strict);
        log::trace!("program {} with {} statements (strict: {})", program.id, program.body.len(), program.strict);
        let result = self.with_context(ctx, |rt| {
            rt.declaration_binding_instantiation(&program.body, program.strict, DeclarationContext::Global)?;
            rt.execute_statements(&program.body)
        });
        Ok(result?.value.unwrap_or(Value::Undefined))
    }

    /// A statement list (ES5 12.1): the value is the last non-empty one.
    pub fn execute_statements(&mut self, statements: &[Statement]) -> EvalResult<'gc, Completion<'gc>> {
        let mut value = None;
        for statement in statements {
            let completion = self.execute(statement)?;
            if completion.is_abrupt() {
                return Ok(completion.with_default_value(&value));
            }
            if completion.value.is_some() {
                value = completion.value;
            }
        }
        Ok(Completion::normal(value))
    }

    pub fn execute(&mut self, statement: &Statement) -> EvalResult<'gc, Completion<'gc>> {
        self.execute_with_labels(statement, &[])
    }

    /// Execute `statement` whose label set is `labels`.
    pub fn execute_with_labels(&mut self, statement: &Statement, labels: &[String]) -> EvalResult<'gc, Completion<'gc>> {
        match &statement.kind {
            StatementKind::Block(body) => self.execute_statements(body),
            StatementKind::Var(decls) => {
                self.execute_var_declarations(decls)?;
                Ok(Completion::normal(None))
            }
            StatementKind::Empty | StatementKind::FunctionDeclaration(_) => Ok(Completion::normal(None)),
            StatementKind::Debugger => {
                log::debug!("debugger statement on line {}", statement.line);
                Ok(Completion::normal(None))
            }
            StatementKind::Expr(e) => Ok(Completion::normal(Some(self.evaluate_value(e)?))),
            StatementKind::If(test, consequent, alternate) => {
                let t = self.evaluate_value(test)?;
                if to_boolean(&t) {
                    self.execute(consequent)
                } else if let Some(alternate) = alternate {
                    self.execute(alternate)
                } else {
                    Ok(Completion::normal(None))
                }
            }
            StatementKind::DoWhile(body, test) => {
                let mut value = None;
                loop {
                    let completion = self.execute(body)?;
                    if completion.value.is_some() {
                        value = completion.value.clone();
                    }
                    if !loop_continues(&completion, labels) {
                        return Ok(exit_loop(completion, value, labels));
                    }
                    let t = self.evaluate_value(test)?;
                    if !to_boolean(&t) {
                        return Ok(Completion::normal(value));
                    }
                }
            }
            StatementKind::While(test, body) => self.execute_for_loop(Some(test), None, body, labels),
            StatementKind::For(init, test, update, body) => {
                match init {
                    Some(ForInit::Var(decls)) => self.execute_var_declarations(decls)?,
                    Some(ForInit::Expr(e)) => {
                        self.evaluate_value(e)?;
                    }
                    None => {}
                }
                self.execute_for_loop(test.as_ref(), update.as_ref(), body, labels)
            }
            StatementKind::ForIn(target, object, body) => self.execute_for_in(target, object, body, labels),
            StatementKind::Continue(target) => Ok(Completion::jump(CompletionKind::Continue, target)),
            StatementKind::Break(target) => Ok(Completion::jump(CompletionKind::Break, target)),
            StatementKind::Return(e) => {
                let value = match e {
                    Some(e) => self.evaluate_value(e)?,
                    None => Value::Undefined,
                };
                Ok(Completion {
                    kind: CompletionKind::Return,
                    value: Some(value),
                    target: None,
                })
            }
            StatementKind::With(object, body) => {
                let value = self.evaluate_value(object)?;
                let object = self.to_object(&value)?;
                let env = new_object_environment(self.mc, object, true, Some(self.lexical_environment()));
                self.with_lexical_environment(env, |rt| rt.execute(body))
            }
            StatementKind::Switch(discriminant, clauses) => self.execute_switch(discriminant, clauses),
            StatementKind::Labelled(label, body) => {
                let mut set = labels.to_vec();
                set.push(label.clone());
                let completion = self.execute_with_labels(body, &set)?;
                if completion.kind == CompletionKind::Break && completion.target.as_deref() == Some(label.as_str()) {
                    return Ok(Completion::normal(completion.value));
                }
                Ok(completion)
            }
            StatementKind::Throw(e) => {
                let value = self.evaluate_value(e)?;
                Err(EvalError::Throw(value))
            }
            StatementKind::Try(block, handler, finalizer) => self.execute_try(block, handler.as_ref(), finalizer.as_deref()),
        }
    }

    fn execute_var_declarations(&mut self, decls: &[(String, Option<Expr>)]) -> EvalResult<'gc, ()> {
        for (name, init) in decls {
            if let Some(init) = init {
                self.initialize_var(name, init)?;
            }
        }
        Ok(())
    }

    fn initialize_var(&mut self, name: &str, init: &Expr) -> EvalResult<'gc, ()> {
        let reference = self.get_identifier_reference(Some(self.lexical_environment()), name, self.strict());
        let value = self.evaluate_value(init)?;
        self.put_value(&reference, value)
    }

    /// `while` and the loop part of `for`.
    fn execute_for_loop(
        &mut self,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Statement,
        labels: &[String],
    ) -> EvalResult<'gc, Completion<'gc>> {
        let mut value = None;
        loop {
            if let Some(test) = test {
                let t = self.evaluate_value(test)?;
                if !to_boolean(&t) {
                    return Ok(Completion::normal(value));
                }
            }
            let completion = self.execute(body)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            if !loop_continues(&completion, labels) {
                return Ok(exit_loop(completion, value, labels));
            }
            if let Some(update) = update {
                self.evaluate_value(update)?;
            }
        }
    }

    fn execute_for_in(
        &mut self,
        target: &ForInTarget,
        object: &Expr,
        body: &Statement,
        labels: &[String],
    ) -> EvalResult<'gc, Completion<'gc>> {
        if let ForInTarget::Var(name, Some(init)) = target {
            self.initialize_var(name, init)?;
        }
        let value = self.evaluate_value(object)?;
        if value.is_nullish() {
            return Ok(Completion::normal(None));
        }
        let object = self.to_object(&value)?;
        let mut seen = HashSet::new();
        let mut value = None;
        let mut level = Some(object);
        while let Some(current) = level {
            for key in own_keys(current) {
                if !seen.insert(key.clone()) {
                    continue;
                }
                // Skip keys deleted or made non-enumerable since the snapshot.
                if !get_own_property(current, &key).is_some_and(|p| p.enumerable()) {
                    continue;
                }
                let reference = match target {
                    ForInTarget::Var(name, _) => self.get_identifier_reference(Some(self.lexical_environment()), name, self.strict()),
                    ForInTarget::Expr(e) => match self.evaluate(e)? {
                        Evaluated::Reference(r) => r,
                        Evaluated::Value(_) => {
                            return Err(crate::raise_reference_error!("Invalid left-hand side in for-in"));
                        }
                    },
                };
                self.put_value(&reference, Value::string(&key))?;
                let completion = self.execute(body)?;
                if completion.value.is_some() {
                    value = completion.value.clone();
                }
                if !loop_continues(&completion, labels) {
                    return Ok(exit_loop(completion, value, labels));
                }
            }
            level = current.borrow().prototype;
        }
        Ok(Completion::normal(value))
    }

    fn execute_switch(&mut self, discriminant: &Expr, clauses: &[SwitchClause]) -> EvalResult<'gc, Completion<'gc>> {
        let input = self.evaluate_value(discriminant)?;
        let mut start = None;
        for (index, clause) in clauses.iter().enumerate() {
            if let Some(test) = &clause.test {
                let candidate = self.evaluate_value(test)?;
                if strict_equals(&input, &candidate) {
                    start = Some(index);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| clauses.iter().position(|c| c.test.is_none())) else {
            return Ok(Completion::normal(None));
        };
        let mut value = None;
        for clause in &clauses[start..] {
            let completion = self.execute_statements(&clause.body)?;
            if completion.value.is_some() {
                value = completion.value.clone();
            }
            if completion.is_abrupt() {
                if completion.kind == CompletionKind::Break && completion.target.is_none() {
                    return Ok(Completion::normal(value));
                }
                return Ok(completion.with_default_value(&value));
            }
        }
        Ok(Completion::normal(value))
    }

    fn execute_try(
        &mut self,
        block: &[Statement],
        handler: Option<&(String, Vec<Statement>)>,
        finalizer: Option<&[Statement]>,
    ) -> EvalResult<'gc, Completion<'gc>> {
        let result = match (self.execute_statements(block), handler) {
            (Err(err), Some((param, body))) => match self.materialize_error(err) {
                Ok(exception) => self.execute_catch(param, body, exception),
                Err(host) => Err(host),
            },
            (result, _) => result,
        };
        if let Some(finalizer) = finalizer {
            let completion = self.execute_statements(finalizer)?;
            if completion.is_abrupt() {
                return Ok(completion);
            }
        }
        result
    }

    fn execute_catch(&mut self, param: &str, body: &[Statement], exception: Value<'gc>) -> EvalResult<'gc, Completion<'gc>> {
        let env = new_declarative_environment(self.mc, Some(self.lexical_environment()));
        self.create_mutable_binding(env, param, false)?;
        self.set_mutable_binding(env, param, exception, false)?;
        self.with_lexical_environment(env, |rt| rt.execute_statements(body))
    }
}
