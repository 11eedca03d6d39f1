use crate::core::{EvalResult, LexEnvPtr, MutationContext, Realm, Value};
use crate::raise_range_error;

/// Call depth allowed when the embedder does not choose one.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 500;

/// Free stack below which a call switches to a freshly allocated segment.
const STACK_RED_ZONE: usize = 256 * 1024;
/// Size of each segment allocated by [`stacker::maybe_grow`].
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct ExecutionContext<'gc> {
    pub lexical_environment: LexEnvPtr<'gc>,
    pub variable_environment: LexEnvPtr<'gc>,
    pub this_binding: Value<'gc>,
    pub strict: bool,
}

/// Mutable interpreter state for the duration of one arena mutation.
///
/// The bottom context is the global one and is never popped. Every other
/// context is pushed through [`Runtime::with_context`], which pops it again
/// on every exit path.
pub struct Runtime<'gc> {
    pub mc: &'gc MutationContext<'gc>,
    pub realm: Realm<'gc>,
    contexts: Vec<ExecutionContext<'gc>>,
    call_depth: usize,
    max_call_depth: usize,
}

impl<'gc> Runtime<'gc> {
    pub fn new(mc: &'gc MutationContext<'gc>, realm: Realm<'gc>, max_call_depth: usize) -> Self {
        let global = ExecutionContext {
            lexical_environment: realm.global_env,
            variable_environment: realm.global_env,
            this_binding: Value::Object(realm.global),
            strict: false,
        };
        Runtime {
            mc,
            realm,
            contexts: vec![global],
            call_depth: 0,
            max_call_depth,
        }
    }

    /// The global execution context, as used by global code and indirect eval.
    pub fn global_context(&self, strict: bool) -> ExecutionContext<'gc> {
        ExecutionContext {
            lexical_environment: self.realm.global_env,
            variable_environment: self.realm.global_env,
            this_binding: Value::Object(self.realm.global),
            strict,
        }
    }

    pub fn context(&self) -> ExecutionContext<'gc> {
        match self.contexts.last() {
            Some(ctx) => ctx.clone(),
            None => self.global_context(false),
        }
    }

    fn top(&self) -> Option<&ExecutionContext<'gc>> {
        self.contexts.last()
    }

    pub fn lexical_environment(&self) -> LexEnvPtr<'gc> {
        self.top().map_or(self.realm.global_env, |ctx| ctx.lexical_environment)
    }

    pub fn variable_environment(&self) -> LexEnvPtr<'gc> {
        self.top().map_or(self.realm.global_env, |ctx| ctx.variable_environment)
    }

    pub fn this_binding(&self) -> Value<'gc> {
        self.top().map_or(Value::Object(self.realm.global), |ctx| ctx.this_binding.clone())
    }

    pub fn strict(&self) -> bool {
        self.top().is_some_and(|ctx| ctx.strict)
    }

    /// Run `f` with `ctx` as the running execution context.
    pub fn with_context<T>(&mut self, ctx: ExecutionContext<'gc>, f: impl FnOnce(&mut Self) -> EvalResult<'gc, T>) -> EvalResult<'gc, T> {
        self.contexts.push(ctx);
        log::debug!("push context, depth {}", self.contexts.len());
        let result = f(self);
        self.contexts.pop();
        log::debug!("pop context, depth {}", self.contexts.len());
        result
    }

    /// Run `f` with the lexical environment of the running context replaced by `env`.
    pub fn with_lexical_environment<T>(
        &mut self,
        env: LexEnvPtr<'gc>,
        f: impl FnOnce(&mut Self) -> EvalResult<'gc, T>,
    ) -> EvalResult<'gc, T> {
        let Some(top) = self.contexts.last_mut() else {
            let mut ctx = self.global_context(false);
            ctx.lexical_environment = env;
            return self.with_context(ctx, f);
        };
        let saved = std::mem::replace(&mut top.lexical_environment, env);
        let result = f(self);
        if let Some(top) = self.contexts.last_mut() {
            top.lexical_environment = saved;
        }
        result
    }

    /// Count one level of function calls around `f`, failing with a
    /// RangeError once the configured depth is reached. The native stack is
    /// extended on demand, so the limit holds on any embedder thread.
    pub fn with_call_depth<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<'gc, T>) -> EvalResult<'gc, T> {
        if self.call_depth >= self.max_call_depth {
            log::warn!("call depth limit {} reached", self.max_call_depth);
            return Err(raise_range_error!("Maximum call stack size exceeded"));
        }
        self.call_depth += 1;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || f(self));
        self.call_depth -= 1;
        result
    }
}
