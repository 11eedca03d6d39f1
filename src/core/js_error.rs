use crate::JSError;
use crate::core::{
    JSObjectDataPtr, MutationContext, ObjectKind, ParseError, Realm, Runtime, Value, create_native_function, new_js_object,
};
use crate::raise_type_error;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};

/// Abrupt outcome of evaluating script code.
#[derive(Debug)]
pub enum EvalError<'gc> {
    /// Host level failure that script code cannot catch.
    Js(JSError),
    /// A value thrown by script code.
    Throw(Value<'gc>),
    /// A native error the engine raised and has not turned into an Error object yet.
    Native(NativeErrorKind, String),
}

pub type EvalResult<'gc, T> = Result<T, EvalError<'gc>>;

impl<'gc> From<JSError> for EvalError<'gc> {
    fn from(e: JSError) -> Self {
        EvalError::Js(e)
    }
}

impl<'gc> From<ParseError> for EvalError<'gc> {
    fn from(e: ParseError) -> Self {
        EvalError::Native(NativeErrorKind::SyntaxError, e.message)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NativeErrorKind {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    URIError,
}

impl NativeErrorKind {
    pub const ALL: [NativeErrorKind; 7] = [
        NativeErrorKind::Error,
        NativeErrorKind::EvalError,
        NativeErrorKind::RangeError,
        NativeErrorKind::ReferenceError,
        NativeErrorKind::SyntaxError,
        NativeErrorKind::TypeError,
        NativeErrorKind::URIError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NativeErrorKind::Error => "Error",
            NativeErrorKind::EvalError => "EvalError",
            NativeErrorKind::RangeError => "RangeError",
            NativeErrorKind::ReferenceError => "ReferenceError",
            NativeErrorKind::SyntaxError => "SyntaxError",
            NativeErrorKind::TypeError => "TypeError",
            NativeErrorKind::URIError => "URIError",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl<'gc> Realm<'gc> {
    pub fn error_prototype_for(&self, kind: NativeErrorKind) -> JSObjectDataPtr<'gc> {
        match kind {
            NativeErrorKind::Error => self.error_prototype,
            NativeErrorKind::EvalError => self.eval_error_prototype,
            NativeErrorKind::RangeError => self.range_error_prototype,
            NativeErrorKind::ReferenceError => self.reference_error_prototype,
            NativeErrorKind::SyntaxError => self.syntax_error_prototype,
            NativeErrorKind::TypeError => self.type_error_prototype,
            NativeErrorKind::URIError => self.uri_error_prototype,
        }
    }
}

impl<'gc> Runtime<'gc> {
    pub fn new_error(&self, kind: NativeErrorKind, message: &str) -> JSObjectDataPtr<'gc> {
        let error = new_js_object(self.mc, "Error", ObjectKind::Error, Some(self.realm.error_prototype_for(kind)));
        if !message.is_empty() {
            error.borrow_mut(self.mc).insert_builtin("message", Value::String(utf8_to_utf16(message)));
        }
        error
    }

    /// The value a `catch` clause receives. Host errors stay uncatchable.
    pub fn materialize_error(&mut self, err: EvalError<'gc>) -> Result<Value<'gc>, EvalError<'gc>> {
        match err {
            EvalError::Throw(v) => Ok(v),
            EvalError::Native(kind, message) => Ok(Value::Object(self.new_error(kind, &message))),
            EvalError::Js(e) => Err(EvalError::Js(e)),
        }
    }

    /// Describe an uncaught error for the embedder.
    pub fn error_to_host(&mut self, err: EvalError<'gc>) -> JSError {
        let value = match self.materialize_error(err) {
            Ok(v) => v,
            Err(EvalError::Js(e)) => return e,
            Err(other) => return crate::eval_error_here!(format!("unexpected error state {other:?}")),
        };
        let (name, message) = match &value {
            Value::Object(o) if o.borrow().class_name == "Error" => {
                let name = self
                    .get(*o, "name")
                    .and_then(|v| self.to_rust_string(&v))
                    .unwrap_or_else(|_| "Error".to_string());
                let message = self
                    .get(*o, "message")
                    .and_then(|v| self.to_rust_string(&v))
                    .unwrap_or_default();
                (name, message)
            }
            other => {
                let message = self.to_rust_string(other).unwrap_or_else(|_| format!("{other:?}"));
                (other.type_of().to_string(), message)
            }
        };
        let display = self.to_rust_string(&value).unwrap_or_else(|_| {
            if message.is_empty() {
                name.clone()
            } else {
                format!("{name}: {message}")
            }
        });
        log::debug!("uncaught {name}: {message}");
        JSError::Throw { name, message, display }
    }
}

/// Install `Error` and the six native error constructors on the global object.
pub fn initialize_error_constructors<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    for kind in NativeErrorKind::ALL {
        let proto = realm.error_prototype_for(kind);
        let ctor = create_native_function(mc, realm, kind.name(), 1, true);
        ctor.borrow_mut(mc).insert("prototype", Value::Object(proto), false, false, false);
        {
            let mut p = proto.borrow_mut(mc);
            p.insert_builtin("constructor", Value::Object(ctor));
            p.insert_builtin("name", Value::String(utf8_to_utf16(kind.name())));
            p.insert_builtin("message", Value::String(Vec::new()));
        }
        realm.global.borrow_mut(mc).insert_builtin(kind.name(), Value::Object(ctor));
    }
    let to_string = create_native_function(mc, realm, "Error.prototype.toString", 0, false);
    realm.error_prototype.borrow_mut(mc).insert_builtin("toString", Value::Object(to_string));
    Ok(())
}

pub fn handle_error_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    if name == "Error.prototype.toString" {
        let Value::Object(o) = this else {
            return Err(raise_type_error!("Error.prototype.toString called on non-object"));
        };
        let name = match rt.get(o, "name")? {
            Value::Undefined => utf8_to_utf16("Error"),
            v => rt.to_string(&v)?,
        };
        let message = match rt.get(o, "message")? {
            Value::Undefined => Vec::new(),
            v => rt.to_string(&v)?,
        };
        if name.is_empty() {
            return Ok(Value::String(message));
        }
        if message.is_empty() {
            return Ok(Value::String(name));
        }
        let mut out = name;
        out.extend(utf8_to_utf16(": "));
        out.extend(message);
        return Ok(Value::String(out));
    }
    let Some(kind) = NativeErrorKind::from_name(name) else {
        return Err(crate::eval_error_here!(format!("unknown error built-in {name}")).into());
    };
    let error = rt.new_error(kind, "");
    if let Some(message) = args.first().filter(|v| !v.is_undefined()) {
        let message = rt.to_string(message)?;
        log::trace!("new {}: {}", kind.name(), utf16_to_utf8(&message));
        error.borrow_mut(rt.mc).insert_builtin("message", Value::String(message));
    }
    Ok(Value::Object(error))
}
