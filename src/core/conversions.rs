use crate::core::number::{self, number_to_string, string_to_number};
use crate::core::{EvalResult, Gc, JSObjectDataPtr, ObjectKind, PreferredType, Runtime, Value, new_js_object};
use crate::raise_type_error;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};

pub fn to_boolean(value: &Value<'_>) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => !(n.is_nan() || *n == 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) => true,
    }
}

/// The `===` operator.
pub fn strict_equals<'a>(x: &Value<'a>, y: &Value<'a>) -> bool {
    match (x, y) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => Gc::ptr_eq(*a, *b),
        _ => false,
    }
}

/// SameValue: like `===` except that NaN equals NaN and +0 differs from -0.
pub fn same_value<'a>(x: &Value<'a>, y: &Value<'a>) -> bool {
    match (x, y) {
        (Value::Number(a), Value::Number(b)) => {
            if a.is_nan() && b.is_nan() {
                return true;
            }
            a == b && a.is_sign_negative() == b.is_sign_negative()
        }
        _ => strict_equals(x, y),
    }
}

impl<'gc> Runtime<'gc> {
    pub fn to_primitive(&mut self, value: &Value<'gc>, hint: Option<PreferredType>) -> EvalResult<'gc, Value<'gc>> {
        match value {
            Value::Object(o) => self.default_value(*o, hint),
            other => Ok(other.clone()),
        }
    }

    pub fn to_number(&mut self, value: &Value<'gc>) -> EvalResult<'gc, f64> {
        Ok(match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s, !self.strict()),
            Value::Object(_) => {
                let prim = self.to_primitive(value, Some(PreferredType::Number))?;
                self.to_number(&prim)?
            }
        })
    }

    pub fn to_integer(&mut self, value: &Value<'gc>) -> EvalResult<'gc, f64> {
        Ok(number::to_integer(self.to_number(value)?))
    }

    pub fn to_int32(&mut self, value: &Value<'gc>) -> EvalResult<'gc, i32> {
        Ok(number::to_int32(self.to_number(value)?))
    }

    pub fn to_uint32(&mut self, value: &Value<'gc>) -> EvalResult<'gc, u32> {
        Ok(number::to_uint32(self.to_number(value)?))
    }

    pub fn to_uint16(&mut self, value: &Value<'gc>) -> EvalResult<'gc, u16> {
        Ok(number::to_uint16(self.to_number(value)?))
    }

    pub fn to_string(&mut self, value: &Value<'gc>) -> EvalResult<'gc, Vec<u16>> {
        Ok(match value {
            Value::Undefined => utf8_to_utf16("undefined"),
            Value::Null => utf8_to_utf16("null"),
            Value::Boolean(b) => utf8_to_utf16(if *b { "true" } else { "false" }),
            Value::Number(n) => utf8_to_utf16(&number_to_string(*n)),
            Value::String(s) => s.clone(),
            Value::Object(_) => {
                let prim = self.to_primitive(value, Some(PreferredType::String))?;
                self.to_string(&prim)?
            }
        })
    }

    /// ToString for use as a property name. Lone surrogates do not survive
    /// the conversion to a Rust string and become U+FFFD.
    pub fn to_property_key(&mut self, value: &Value<'gc>) -> EvalResult<'gc, String> {
        match value {
            Value::Number(n) => Ok(number_to_string(*n)),
            Value::String(s) => Ok(utf16_to_utf8(s)),
            _ => Ok(utf16_to_utf8(&self.to_string(value)?)),
        }
    }

    /// ToString rendered as a Rust string, for messages and host output.
    pub fn to_rust_string(&mut self, value: &Value<'gc>) -> EvalResult<'gc, String> {
        Ok(utf16_to_utf8(&self.to_string(value)?))
    }

    pub fn new_string_object(&self, s: Vec<u16>) -> JSObjectDataPtr<'gc> {
        let len = s.len();
        let obj = new_js_object(self.mc, "String", ObjectKind::String(s), Some(self.realm.string_prototype));
        obj.borrow_mut(self.mc).insert("length", Value::Number(len as f64), false, false, false);
        obj
    }

    pub fn to_object(&mut self, value: &Value<'gc>) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
        Ok(match value {
            Value::Undefined | Value::Null => {
                return Err(raise_type_error!("Cannot convert undefined or null to object"));
            }
            Value::Boolean(b) => new_js_object(self.mc, "Boolean", ObjectKind::Boolean(*b), Some(self.realm.boolean_prototype)),
            Value::Number(n) => new_js_object(self.mc, "Number", ObjectKind::Number(*n), Some(self.realm.number_prototype)),
            Value::String(s) => self.new_string_object(s.clone()),
            Value::Object(o) => *o,
        })
    }

    pub fn check_object_coercible(&self, value: &Value<'gc>) -> EvalResult<'gc, ()> {
        if value.is_nullish() {
            return Err(raise_type_error!("Cannot convert undefined or null to object"));
        }
        Ok(())
    }

    /// The `==` operator.
    pub fn abstract_equals(&mut self, x: &Value<'gc>, y: &Value<'gc>) -> EvalResult<'gc, bool> {
        Ok(match (x, y) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Number(a), Value::String(_)) => *a == self.to_number(y)?,
            (Value::String(_), Value::Number(b)) => self.to_number(x)? == *b,
            (Value::Boolean(_), _) => {
                let n = Value::Number(self.to_number(x)?);
                self.abstract_equals(&n, y)?
            }
            (_, Value::Boolean(_)) => {
                let n = Value::Number(self.to_number(y)?);
                self.abstract_equals(x, &n)?
            }
            (Value::Number(_) | Value::String(_), Value::Object(_)) => {
                let prim = self.to_primitive(y, None)?;
                self.abstract_equals(x, &prim)?
            }
            (Value::Object(_), Value::Number(_) | Value::String(_)) => {
                let prim = self.to_primitive(x, None)?;
                self.abstract_equals(&prim, y)?
            }
            _ => strict_equals(x, y),
        })
    }
}
