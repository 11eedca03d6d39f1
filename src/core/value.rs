use crate::core::{Collect, FunctionNode, GcPtr, GcTrace, LexEnvPtr, MutationContext, Property, new_gc_cell_ptr};
use crate::core::number::number_to_string;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};
use indexmap::IndexMap;
use std::rc::Rc;

pub type JSObjectDataPtr<'gc> = GcPtr<'gc, JSObjectData<'gc>>;

#[derive(Clone, Collect)]
#[collect(no_drop)]
pub enum Value<'gc> {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(Vec<u16>),
    Object(JSObjectDataPtr<'gc>),
}

impl<'gc> Value<'gc> {
    pub fn string(s: &str) -> Self {
        Value::String(utf8_to_utf16(s))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_object(&self) -> Option<JSObjectDataPtr<'gc>> {
        match self {
            Value::Object(o) => Some(*o),
            _ => None,
        }
    }

    /// The callable object behind this value, if any.
    pub fn as_callable(&self) -> Option<JSObjectDataPtr<'gc>> {
        self.as_object().filter(|o| o.borrow().is_callable())
    }

    /// Result of the `typeof` operator.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(o) => {
                if o.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }
}

impl std::fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", utf16_to_utf8(s)),
            Value::Object(o) => write!(f, "[object {}]", o.borrow().class_name),
        }
    }
}

/// Parsed function code shared by every closure created from it.
#[derive(Clone, Debug, Collect)]
#[collect(require_static)]
pub struct ScriptCode(pub Rc<FunctionNode>);

/// Compiled regular expression state of a RegExp object.
#[derive(Clone, Debug, Collect)]
#[collect(require_static)]
pub struct RegExpData {
    pub source: String,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub regex: Rc<regress::Regex>,
}

#[derive(Clone, Collect)]
#[collect(no_drop)]
pub enum FunctionKind<'gc> {
    Script {
        code: ScriptCode,
        scope: LexEnvPtr<'gc>,
    },
    /// Built-in dispatched by name, e.g. `"Array.prototype.push"`.
    Native {
        name: String,
        constructor: bool,
    },
    Bound {
        target: JSObjectDataPtr<'gc>,
        this: Value<'gc>,
        args: Vec<Value<'gc>>,
    },
}

/// Live link between an arguments object and the parameters of its call.
#[derive(Clone, Collect)]
#[collect(no_drop)]
pub struct ArgumentsMap<'gc> {
    pub env: LexEnvPtr<'gc>,
    /// Parameter name per argument index while the index is still mapped.
    pub names: Vec<Option<String>>,
}

#[derive(Clone, Collect)]
#[collect(no_drop)]
pub enum ObjectKind<'gc> {
    Ordinary,
    Array,
    Error,
    Function(FunctionKind<'gc>),
    String(Vec<u16>),
    Number(f64),
    Boolean(bool),
    Date(f64),
    RegExp(RegExpData),
    Arguments(Option<ArgumentsMap<'gc>>),
}

pub struct JSObjectData<'gc> {
    /// Value of [[Class]].
    pub class_name: &'static str,
    pub kind: ObjectKind<'gc>,
    pub properties: IndexMap<String, Property<'gc>>,
    pub prototype: Option<JSObjectDataPtr<'gc>>,
    pub extensible: bool,
}

unsafe impl<'gc> Collect<'gc> for JSObjectData<'gc> {
    fn trace<T: GcTrace<'gc>>(&self, cc: &mut T) {
        self.kind.trace(cc);
        for v in self.properties.values() {
            v.trace(cc);
        }
        if let Some(p) = &self.prototype {
            p.trace(cc);
        }
    }
}

impl<'gc> JSObjectData<'gc> {
    pub fn new(class_name: &'static str, kind: ObjectKind<'gc>, prototype: Option<JSObjectDataPtr<'gc>>) -> Self {
        JSObjectData {
            class_name,
            kind,
            properties: IndexMap::new(),
            prototype,
            extensible: true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        match &self.kind {
            ObjectKind::Function(FunctionKind::Native { constructor, .. }) => *constructor,
            ObjectKind::Function(FunctionKind::Bound { target, .. }) => target.borrow().is_constructor(),
            ObjectKind::Function(FunctionKind::Script { .. }) => true,
            _ => false,
        }
    }

    /// Strict mode script function (not bound, not native).
    pub fn is_strict_function(&self) -> bool {
        matches!(&self.kind, ObjectKind::Function(FunctionKind::Script { code, .. }) if code.0.strict)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, ObjectKind::Array)
    }

    /// Store a data property directly, bypassing [[DefineOwnProperty]].
    /// Only for building fresh objects.
    pub fn insert(&mut self, name: impl Into<String>, value: Value<'gc>, writable: bool, enumerable: bool, configurable: bool) {
        self.properties.insert(
            name.into(),
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            },
        );
    }

    /// Built-in method or field: writable, configurable, not enumerable.
    pub fn insert_builtin(&mut self, name: impl Into<String>, value: Value<'gc>) {
        self.insert(name, value, true, false, true);
    }
}

#[inline]
pub fn new_js_object<'gc>(
    mc: &MutationContext<'gc>,
    class_name: &'static str,
    kind: ObjectKind<'gc>,
    prototype: Option<JSObjectDataPtr<'gc>>,
) -> JSObjectDataPtr<'gc> {
    new_gc_cell_ptr(mc, JSObjectData::new(class_name, kind, prototype))
}

/// Canonical array index (`0 ..= 2^32 - 2`) named by a property key.
pub fn array_index(name: &str) -> Option<u32> {
    if name.is_empty() || name.len() > 10 || (name.len() > 1 && name.starts_with('0')) {
        return None;
    }
    if !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = name.parse().ok()?;
    if n < u32::MAX as u64 { Some(n as u32) } else { None }
}
