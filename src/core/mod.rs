use crate::error::JSError;
use crate::eval_error_here;
use crate::unicode::utf16_to_utf8;
pub(crate) use gc_arena::Mutation as MutationContext;
pub(crate) use gc_arena::collect::Trace as GcTrace;
pub(crate) use gc_arena::lock::RefLock as GcCell;
pub(crate) use gc_arena::{Collect, Gc};
pub(crate) type GcPtr<'gc, T> = Gc<'gc, GcCell<T>>;
use std::path::Path;

#[inline]
pub fn new_gc_cell_ptr<'gc, T: 'gc + Collect<'gc>>(mc: &MutationContext<'gc>, value: T) -> GcPtr<'gc, T> {
    Gc::new(mc, GcCell::new(value))
}

mod token;
pub use token::*;

mod scanner;
pub use scanner::*;

mod literals;
pub use literals::*;

mod statement;
pub use statement::*;

pub(crate) mod number;

mod parser;
pub use parser::*;

mod declarations;
pub use declarations::*;

mod value;
pub use value::*;

mod descriptor;
pub use descriptor::*;

mod environment;
pub use environment::*;

mod runtime;
pub use runtime::*;

mod object;
pub use object::*;

mod conversions;
pub use conversions::*;

pub mod js_error;
pub use js_error::*;

mod function;
pub use function::*;

mod arguments;

mod eval;
pub use eval::*;

mod exec;
pub use exec::*;

mod realm;
pub use realm::*;

pub type JsArena = gc_arena::Arena<gc_arena::Rootable!['gc => Realm<'gc>]>;

/// Stack size of the thread [`evaluate_script`] runs scripts on.
const SCRIPT_THREAD_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct InterpreterOptions {
    /// Nesting depth of function calls before a RangeError is thrown.
    pub max_call_depth: usize,
    /// Name reported in syntax errors when a call does not pass one.
    pub filename: Option<String>,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            filename: None,
        }
    }
}

/// Owned copy of a script value that outlives the arena mutation it came from.
#[derive(Clone, Debug, PartialEq)]
pub enum JSValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object { class: String, display: String },
}

impl std::fmt::Display for JSValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JSValue::Undefined => write!(f, "undefined"),
            JSValue::Null => write!(f, "null"),
            JSValue::Boolean(b) => write!(f, "{b}"),
            JSValue::Number(n) => write!(f, "{}", number::number_to_string(*n)),
            JSValue::String(s) => write!(f, "{s}"),
            JSValue::Object { display, .. } => write!(f, "{display}"),
        }
    }
}

impl<'gc> Runtime<'gc> {
    /// Owned copy of `value`. Objects are rendered through ToString.
    pub fn snapshot(&mut self, value: &Value<'gc>) -> JSValue {
        match value {
            Value::Undefined => JSValue::Undefined,
            Value::Null => JSValue::Null,
            Value::Boolean(b) => JSValue::Boolean(*b),
            Value::Number(n) => JSValue::Number(*n),
            Value::String(s) => JSValue::String(utf16_to_utf8(s)),
            Value::Object(o) => {
                let class = o.borrow().class_name.to_string();
                let display = self.to_rust_string(value).unwrap_or_else(|_| format!("[object {class}]"));
                JSValue::Object { class, display }
            }
        }
    }
}

/// An interpreter instance: one realm whose global state persists across
/// calls to [`Interpreter::execute_string`].
pub struct Interpreter {
    arena: JsArena,
    options: InterpreterOptions,
}

impl Interpreter {
    pub fn new() -> Result<Self, JSError> {
        Self::with_options(InterpreterOptions::default())
    }

    pub fn with_options(options: InterpreterOptions) -> Result<Self, JSError> {
        let arena = JsArena::try_new(|mc| Realm::new(mc))?;
        log::debug!("interpreter created, max call depth {}", options.max_call_depth);
        Ok(Interpreter { arena, options })
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    /// Parse and run `source` as global code, returning its completion value.
    pub fn execute_string(&mut self, source: &str, filename: Option<&str>) -> Result<JSValue, JSError> {
        let filename = filename.or(self.options.filename.as_deref());
        let program = parse_program(source, filename, false)?;
        let max_call_depth = self.options.max_call_depth;
        let result = self.arena.mutate(|mc, realm| {
            let mut rt = Runtime::new(mc, *realm, max_call_depth);
            match rt.execute_program(&program) {
                Ok(value) => Ok(rt.snapshot(&value)),
                Err(err) => Err(rt.error_to_host(err)),
            }
        });
        self.arena.collect_debt();
        log::debug!("gc debt collected after run");
        result
    }

    pub fn execute_file<P: AsRef<Path>>(&mut self, path: P) -> Result<JSValue, JSError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        self.execute_string(&source, Some(&path.display().to_string()))
    }
}

/// Run `script` in a fresh interpreter and return ToString of its
/// completion value. The script runs on its own thread with a large stack.
pub fn evaluate_script<T, P>(script: T, script_path: Option<P>) -> Result<String, JSError>
where
    T: AsRef<str>,
    P: AsRef<Path>,
{
    let source = script.as_ref().to_string();
    let filename = script_path.map(|p| p.as_ref().display().to_string());
    let handle = std::thread::Builder::new()
        .name("es5-script".to_string())
        .stack_size(SCRIPT_THREAD_STACK_SIZE)
        .spawn(move || {
            let mut interpreter = Interpreter::new()?;
            interpreter.execute_string(&source, filename.as_deref()).map(|v| v.to_string())
        })?;
    handle.join().map_err(|_| eval_error_here!("script thread panicked"))?
}
