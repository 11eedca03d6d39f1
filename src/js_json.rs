use crate::core::{
    EvalResult, Gc, JSObjectDataPtr, MutationContext, ObjectKind, PropertyDescriptor, Realm, Runtime, Value, arg, define_native_methods,
    get_own_property, new_js_object, own_keys,
};
use crate::error::JSError;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};
use crate::{raise_js_syntax_error, raise_range_error, raise_type_error};

/// Longest array `JSON.stringify` will walk element by element.
const MAX_ARRAY_ELEMENTS: u32 = 1 << 24;

pub fn initialize_json<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let json = new_js_object(mc, "JSON", ObjectKind::Ordinary, Some(realm.object_prototype));
    define_native_methods(mc, realm, json, "JSON", &[("parse", 2), ("stringify", 3)]);
    realm.global.borrow_mut(mc).insert_builtin("JSON", Value::Object(json));
    Ok(())
}

fn json_value_to_js_value<'gc>(rt: &mut Runtime<'gc>, json_value: serde_json::Value) -> EvalResult<'gc, Value<'gc>> {
    Ok(match json_value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(utf8_to_utf16(&s)),
        serde_json::Value::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(json_value_to_js_value(rt, item)?);
            }
            Value::Object(rt.new_array(values))
        }
        serde_json::Value::Object(map) => {
            let object = rt.new_plain_object();
            for (key, value) in map {
                let value = json_value_to_js_value(rt, value)?;
                rt.create_data_property(object, &key, value)?;
            }
            Value::Object(object)
        }
    })
}

fn enumerable_own_keys(object: JSObjectDataPtr<'_>) -> Vec<String> {
    own_keys(object)
        .into_iter()
        .filter(|k| get_own_property(object, k).is_some_and(|p| p.enumerable()))
        .collect()
}

/// The reviver walk of JSON.parse: children first, then `reviver(key, value)`
/// with the holder as `this`.
fn walk<'gc>(rt: &mut Runtime<'gc>, reviver: JSObjectDataPtr<'gc>, holder: JSObjectDataPtr<'gc>, name: &str) -> EvalResult<'gc, Value<'gc>> {
    let value = rt.get(holder, name)?;
    if let Value::Object(o) = value {
        let keys = if o.borrow().is_array() {
            let len = rt.get(o, "length")?;
            (0..rt.to_uint32(&len)?).map(|i| i.to_string()).collect()
        } else {
            enumerable_own_keys(o)
        };
        for key in keys {
            let element = walk(rt, reviver, o, &key)?;
            if element.is_undefined() {
                rt.delete(o, &key, false)?;
            } else {
                rt.define_own_property(o, &key, PropertyDescriptor::new_data(element, true, true, true), false)?;
            }
        }
    }
    rt.call(reviver, Value::Object(holder), &[Value::string(name), value])
}

fn parse<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    let text = rt.to_rust_string(&arg(args, 0))?;
    let parsed: serde_json::Value = serde_json::from_str(&text).map_err(|e| raise_js_syntax_error!("JSON.parse: {e}"))?;
    let unfiltered = json_value_to_js_value(rt, parsed)?;
    match arg(args, 1).as_callable() {
        Some(reviver) => {
            let root = rt.new_plain_object();
            rt.create_data_property(root, "", unfiltered)?;
            walk(rt, reviver, root, "")
        }
        None => Ok(unfiltered),
    }
}

fn push_str(out: &mut Vec<u16>, s: &str) {
    out.extend(s.encode_utf16());
}

fn quote(out: &mut Vec<u16>, s: &[u16]) {
    out.push(u16::from(b'"'));
    for &unit in s {
        match unit {
            0x22 => push_str(out, "\\\""),
            0x5C => push_str(out, "\\\\"),
            0x08 => push_str(out, "\\b"),
            0x0C => push_str(out, "\\f"),
            0x0A => push_str(out, "\\n"),
            0x0D => push_str(out, "\\r"),
            0x09 => push_str(out, "\\t"),
            u if u < 0x20 => push_str(out, &format!("\\u{u:04x}")),
            u => out.push(u),
        }
    }
    out.push(u16::from(b'"'));
}

struct Stringifier<'gc> {
    replacer: Option<JSObjectDataPtr<'gc>>,
    property_list: Option<Vec<String>>,
    stack: Vec<JSObjectDataPtr<'gc>>,
    indent: Vec<u16>,
    gap: Vec<u16>,
}

impl<'gc> Stringifier<'gc> {
    fn serialize_property(&mut self, rt: &mut Runtime<'gc>, key: &str, holder: JSObjectDataPtr<'gc>) -> EvalResult<'gc, Option<Vec<u16>>> {
        let mut value = rt.get(holder, key)?;
        if let Value::Object(o) = value {
            let to_json = rt.get(o, "toJSON")?;
            if to_json.as_callable().is_some() {
                value = rt.call_value(&to_json, value, &[Value::string(key)])?;
            }
        }
        if let Some(replacer) = self.replacer {
            value = rt.call(replacer, Value::Object(holder), &[Value::string(key), value])?;
        }
        value = unwrap_primitive(rt, value)?;
        let mut out = Vec::new();
        match value {
            Value::Null => push_str(&mut out, "null"),
            Value::Boolean(b) => push_str(&mut out, if b { "true" } else { "false" }),
            Value::String(s) => quote(&mut out, &s),
            Value::Number(n) if n.is_finite() => out = rt.to_string(&Value::Number(n))?,
            Value::Number(_) => push_str(&mut out, "null"),
            Value::Object(o) if o.borrow().is_callable() => return Ok(None),
            Value::Object(o) if o.borrow().is_array() => out = self.serialize_array(rt, o)?,
            Value::Object(o) => out = self.serialize_object(rt, o)?,
            Value::Undefined => return Ok(None),
        }
        Ok(Some(out))
    }

    fn enter(&mut self, object: JSObjectDataPtr<'gc>) -> EvalResult<'gc, Vec<u16>> {
        if self.stack.iter().any(|o| Gc::ptr_eq(*o, object)) {
            return Err(raise_type_error!("Converting circular structure to JSON"));
        }
        self.stack.push(object);
        let stepback = self.indent.clone();
        self.indent.extend_from_slice(&self.gap);
        Ok(stepback)
    }

    fn leave(&mut self, stepback: Vec<u16>) {
        self.stack.pop();
        self.indent = stepback;
    }

    fn wrap(&self, open: u8, partial: Vec<Vec<u16>>, close: u8, stepback: &[u16]) -> Vec<u16> {
        let mut out = vec![u16::from(open)];
        if partial.is_empty() {
            out.push(u16::from(close));
            return out;
        }
        let pretty = !self.gap.is_empty();
        for (i, member) in partial.into_iter().enumerate() {
            if i > 0 {
                out.push(u16::from(b','));
            }
            if pretty {
                out.push(u16::from(b'\n'));
                out.extend_from_slice(&self.indent);
            }
            out.extend(member);
        }
        if pretty {
            out.push(u16::from(b'\n'));
            out.extend_from_slice(stepback);
        }
        out.push(u16::from(close));
        out
    }

    fn serialize_object(&mut self, rt: &mut Runtime<'gc>, object: JSObjectDataPtr<'gc>) -> EvalResult<'gc, Vec<u16>> {
        let stepback = self.enter(object)?;
        let keys = match &self.property_list {
            Some(list) => list.clone(),
            None => enumerable_own_keys(object),
        };
        let mut partial = Vec::new();
        for key in keys {
            if let Some(value) = self.serialize_property(rt, &key, object)? {
                let mut member = Vec::new();
                quote(&mut member, &utf8_to_utf16(&key));
                member.push(u16::from(b':'));
                if !self.gap.is_empty() {
                    member.push(u16::from(b' '));
                }
                member.extend(value);
                partial.push(member);
            }
        }
        let out = self.wrap(b'{', partial, b'}', &stepback);
        self.leave(stepback);
        Ok(out)
    }

    fn serialize_array(&mut self, rt: &mut Runtime<'gc>, array: JSObjectDataPtr<'gc>) -> EvalResult<'gc, Vec<u16>> {
        let stepback = self.enter(array)?;
        let len = rt.get(array, "length")?;
        let len = rt.to_uint32(&len)?;
        if len > MAX_ARRAY_ELEMENTS {
            return Err(raise_range_error!("JSON.stringify: array of length {len} is too large"));
        }
        let mut partial = Vec::new();
        for i in 0..len {
            let element = self.serialize_property(rt, &i.to_string(), array)?;
            partial.push(element.unwrap_or_else(|| utf8_to_utf16("null")));
        }
        let out = self.wrap(b'[', partial, b']', &stepback);
        self.leave(stepback);
        Ok(out)
    }
}

enum PrimitiveWrapper {
    Number,
    String,
    Boolean(bool),
}

/// Number, String and Boolean objects serialize as the primitive they wrap.
fn unwrap_primitive<'gc>(rt: &mut Runtime<'gc>, value: Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
    let Value::Object(o) = value else {
        return Ok(value);
    };
    let wrapper = match o.borrow().kind {
        ObjectKind::Number(_) => Some(PrimitiveWrapper::Number),
        ObjectKind::String(_) => Some(PrimitiveWrapper::String),
        ObjectKind::Boolean(b) => Some(PrimitiveWrapper::Boolean(b)),
        _ => None,
    };
    Ok(match wrapper {
        Some(PrimitiveWrapper::Number) => Value::Number(rt.to_number(&value)?),
        Some(PrimitiveWrapper::String) => Value::String(rt.to_string(&value)?),
        Some(PrimitiveWrapper::Boolean(b)) => Value::Boolean(b),
        None => value,
    })
}

fn property_list<'gc>(rt: &mut Runtime<'gc>, list: JSObjectDataPtr<'gc>) -> EvalResult<'gc, Vec<String>> {
    let len = rt.get(list, "length")?;
    let len = rt.to_uint32(&len)?;
    let mut names: Vec<String> = Vec::new();
    for i in 0..len {
        let item = rt.get(list, &i.to_string())?;
        let item = unwrap_primitive(rt, item)?;
        let name = match item {
            Value::String(_) | Value::Number(_) => rt.to_rust_string(&item)?,
            _ => continue,
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

fn gap_from_space<'gc>(rt: &mut Runtime<'gc>, space: Value<'gc>) -> EvalResult<'gc, Vec<u16>> {
    Ok(match unwrap_primitive(rt, space)? {
        Value::Number(n) => {
            let count = crate::core::number::to_integer(n).clamp(0.0, 10.0) as usize;
            vec![u16::from(b' '); count]
        }
        Value::String(s) => s.into_iter().take(10).collect(),
        _ => Vec::new(),
    })
}

fn stringify<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    let mut stringifier = Stringifier {
        replacer: None,
        property_list: None,
        stack: Vec::new(),
        indent: Vec::new(),
        gap: Vec::new(),
    };
    if let Value::Object(replacer) = arg(args, 1) {
        if replacer.borrow().is_callable() {
            stringifier.replacer = Some(replacer);
        } else if replacer.borrow().is_array() {
            stringifier.property_list = Some(property_list(rt, replacer)?);
        }
    }
    stringifier.gap = gap_from_space(rt, arg(args, 2))?;
    let wrapper = rt.new_plain_object();
    rt.create_data_property(wrapper, "", arg(args, 0))?;
    let result = stringifier.serialize_property(rt, "", wrapper)?;
    log::trace!("JSON.stringify produced {:?}", result.as_deref().map(utf16_to_utf8));
    Ok(result.map(Value::String).unwrap_or(Value::Undefined))
}

pub fn handle_json_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    _this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    match name {
        "JSON.parse" => parse(rt, args),
        "JSON.stringify" => stringify(rt, args),
        _ => Err(crate::eval_error_here!(format!("unknown JSON built-in {name}")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_control_characters() {
        let mut out = Vec::new();
        quote(&mut out, &utf8_to_utf16("a\"b\\c\n\u{1}"));
        assert_eq!(utf16_to_utf8(&out), "\"a\\\"b\\\\c\\n\\u0001\"");
    }
}
