pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod js_array;
pub(crate) mod js_boolean;
pub(crate) mod js_console;
pub(crate) mod js_date;
pub(crate) mod js_function;
pub(crate) mod js_global;
pub(crate) mod js_json;
pub(crate) mod js_math;
pub(crate) mod js_number;
pub(crate) mod js_object;
pub(crate) mod js_regexp;
pub(crate) mod js_string;
pub(crate) mod unicode;

pub use core::{
    DEFAULT_MAX_CALL_DEPTH, Interpreter, InterpreterOptions, JSValue, ParseError, Program, Token, TokenKind, TokenStream, evaluate_script,
    parse_program,
};
pub use error::JSError;
