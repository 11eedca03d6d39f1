#[derive(thiserror::Error, Debug)]
pub enum JSError {
    #[error("SyntaxError: {message}")]
    SyntaxError { message: String },

    #[error("Uncaught {display}")]
    Throw {
        /// `name` of the thrown error object, or the type of a thrown primitive.
        name: String,
        message: String,
        display: String,
    },

    #[error("Evaluation failed at {method} {file}:{line}: {message}")]
    EvaluationError {
        message: String,
        file: String,
        line: usize,
        method: String,
    },

    #[error("std::io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl JSError {
    /// Short text suitable for printing to a terminal user.
    pub fn user_message(&self) -> String {
        match self {
            JSError::SyntaxError { message } => format!("SyntaxError: {message}"),
            JSError::Throw { display, .. } => format!("Uncaught {display}"),
            JSError::EvaluationError { message, .. } => format!("InternalError: {message}"),
            JSError::IoError(e) => e.to_string(),
        }
    }

    /// Name of the error class for script level failures.
    pub fn name(&self) -> Option<&str> {
        match self {
            JSError::SyntaxError { .. } => Some("SyntaxError"),
            JSError::Throw { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<JSError> for std::io::Error {
    fn from(err: JSError) -> std::io::Error {
        match err {
            JSError::IoError(io_err) => io_err,
            _ => std::io::Error::other(err.to_string()),
        }
    }
}

// Macro that constructs an EvaluationError using the compile-time caller
// location and the provided message. A macro keeps `file!()` and `line!()`
// pointing at the invocation site.
#[macro_export]
macro_rules! eval_error_here {
    ($msg:expr) => {
        $crate::JSError::EvaluationError {
            message: $msg.to_string(),
            file: file!().to_string(),
            line: line!() as usize,
            method: $crate::function_name!().to_string(),
        }
    };
}

#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // remove the trailing "::f"
        &name[..name.len() - 3]
    }};
}

// The following build not-yet-materialised native errors. They become
// real Error objects when caught by script code or when they reach the
// embedding boundary.

#[macro_export]
macro_rules! raise_type_error {
    ($($arg:tt)*) => {
        $crate::core::EvalError::Native($crate::core::NativeErrorKind::TypeError, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! raise_range_error {
    ($($arg:tt)*) => {
        $crate::core::EvalError::Native($crate::core::NativeErrorKind::RangeError, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! raise_reference_error {
    ($($arg:tt)*) => {
        $crate::core::EvalError::Native($crate::core::NativeErrorKind::ReferenceError, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! raise_uri_error {
    ($($arg:tt)*) => {
        $crate::core::EvalError::Native($crate::core::NativeErrorKind::URIError, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! raise_js_syntax_error {
    ($($arg:tt)*) => {
        $crate::core::EvalError::Native($crate::core::NativeErrorKind::SyntaxError, format!($($arg)*))
    };
}
