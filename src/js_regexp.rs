use crate::core::{
    EvalResult, JSObjectDataPtr, MutationContext, ObjectKind, Realm, RegExpData, Runtime, Value, arg, define_constructor,
    define_native_methods, new_js_object, translate_regexp,
};
use crate::error::JSError;
use crate::unicode::{utf8_to_utf16, utf16_to_utf8};
use crate::{raise_js_syntax_error, raise_type_error};
use regress::Regex;
use std::rc::Rc;

pub fn initialize_regexp<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    // RegExp.prototype is itself a regular expression matching the empty string.
    let empty = Regex::new("").map_err(|e| crate::eval_error_here!(format!("empty pattern failed to compile: {e}")))?;
    realm.regexp_prototype.borrow_mut(mc).kind = ObjectKind::RegExp(RegExpData {
        source: "(?:)".to_string(),
        global: false,
        ignore_case: false,
        multiline: false,
        regex: Rc::new(empty),
    });
    define_constructor(mc, realm, "RegExp", 2, realm.regexp_prototype);
    define_native_methods(
        mc,
        realm,
        realm.regexp_prototype,
        "RegExp.prototype",
        &[("exec", 1), ("test", 1), ("toString", 0)],
    );
    Ok(())
}

/// One successful match: the matched range and every capture group.
#[derive(Clone, Debug)]
pub struct RegExpMatch {
    pub start: usize,
    pub end: usize,
    pub captures: Vec<Option<Vec<u16>>>,
}

impl RegExpMatch {
    pub fn capture_values<'gc>(&self) -> Vec<Value<'gc>> {
        self.captures
            .iter()
            .map(|c| c.clone().map(Value::String).unwrap_or(Value::Undefined))
            .collect()
    }
}

fn parse_flags<'gc>(flags: &str) -> EvalResult<'gc, (bool, bool, bool)> {
    let (mut global, mut ignore_case, mut multiline) = (false, false, false);
    for c in flags.chars() {
        let slot = match c {
            'g' => &mut global,
            'i' => &mut ignore_case,
            'm' => &mut multiline,
            _ => return Err(raise_js_syntax_error!("Invalid regular expression flags '{flags}'")),
        };
        if *slot {
            return Err(raise_js_syntax_error!("Invalid regular expression flags '{flags}'"));
        }
        *slot = true;
    }
    Ok((global, ignore_case, multiline))
}

fn compile<'gc>(pattern: &str, ignore_case: bool, multiline: bool) -> EvalResult<'gc, Regex> {
    let translated = translate_regexp(pattern).map_err(|e| raise_js_syntax_error!("Invalid regular expression: /{pattern}/: {e}"))?;
    let mut flags = String::new();
    if ignore_case {
        flags.push('i');
    }
    if multiline {
        flags.push('m');
    }
    Regex::from_unicode(translated.chars().map(|c| c as u32), flags.as_str())
        .map_err(|e| raise_js_syntax_error!("Invalid regular expression: /{pattern}/: {e}"))
}

/// A RegExp object for `pattern` and `flags`, as built by literals and the constructor.
pub fn new_regexp_object<'gc>(rt: &mut Runtime<'gc>, pattern: &[u16], flags: &str) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
    let (global, ignore_case, multiline) = parse_flags(flags)?;
    let pattern = utf16_to_utf8(pattern);
    let regex = compile(&pattern, ignore_case, multiline)?;
    log::trace!("compiled regexp /{pattern}/{flags}");
    let source = if pattern.is_empty() { "(?:)".to_string() } else { pattern };
    let data = RegExpData {
        source: source.clone(),
        global,
        ignore_case,
        multiline,
        regex: Rc::new(regex),
    };
    let object = new_js_object(rt.mc, "RegExp", ObjectKind::RegExp(data), Some(rt.realm.regexp_prototype));
    {
        let mut o = object.borrow_mut(rt.mc);
        o.insert("source", Value::String(utf8_to_utf16(&source)), false, false, false);
        o.insert("global", Value::Boolean(global), false, false, false);
        o.insert("ignoreCase", Value::Boolean(ignore_case), false, false, false);
        o.insert("multiline", Value::Boolean(multiline), false, false, false);
        o.insert("lastIndex", Value::Number(0.0), true, false, false);
    }
    Ok(object)
}

/// Compiled state of `value` when it is a RegExp object.
pub fn regexp_data(value: &Value<'_>) -> Option<RegExpData> {
    match value {
        Value::Object(o) => match &o.borrow().kind {
            ObjectKind::RegExp(data) => Some(data.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// Leftmost match starting at or after `from`.
pub fn find_match(data: &RegExpData, input: &[u16], from: usize) -> Option<RegExpMatch> {
    if from > input.len() {
        return None;
    }
    let m = data.regex.find_from_utf16(input, from).next()?;
    let captures = m.captures.iter().map(|c| c.clone().map(|r| input[r].to_vec())).collect();
    Some(RegExpMatch {
        start: m.range.start,
        end: m.range.end,
        captures,
    })
}

/// RegExp.prototype.exec on an already converted input string.
pub fn regexp_exec<'gc>(rt: &mut Runtime<'gc>, object: JSObjectDataPtr<'gc>, input: &[u16]) -> EvalResult<'gc, Value<'gc>> {
    let Some(data) = regexp_data(&Value::Object(object)) else {
        return Err(raise_type_error!("RegExp.prototype.exec called on incompatible receiver"));
    };
    let last_index = rt.get(object, "lastIndex")?;
    let last_index = rt.to_integer(&last_index)?;
    let start = if data.global { last_index } else { 0.0 };
    let found = if start < 0.0 || start > input.len() as f64 {
        None
    } else {
        find_match(&data, input, start as usize)
    };
    let Some(m) = found else {
        rt.put(object, "lastIndex", Value::Number(0.0), true)?;
        return Ok(Value::Null);
    };
    if data.global {
        rt.put(object, "lastIndex", Value::Number(m.end as f64), true)?;
    }
    let mut values = vec![Value::String(input[m.start..m.end].to_vec())];
    values.extend(m.capture_values());
    let result = rt.new_array(values);
    rt.create_data_property(result, "index", Value::Number(m.start as f64))?;
    rt.create_data_property(result, "input", Value::String(input.to_vec()))?;
    Ok(Value::Object(result))
}

fn regexp_constructor<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>], construct: bool) -> EvalResult<'gc, Value<'gc>> {
    let pattern = arg(args, 0);
    let flags = arg(args, 1);
    if let Some(data) = regexp_data(&pattern) {
        if !flags.is_undefined() {
            return Err(raise_type_error!("Cannot supply flags when constructing one RegExp from another"));
        }
        if !construct {
            return Ok(pattern);
        }
        let mut flag_text = String::new();
        for (set, c) in [(data.global, 'g'), (data.ignore_case, 'i'), (data.multiline, 'm')] {
            if set {
                flag_text.push(c);
            }
        }
        let source = if data.source == "(?:)" { String::new() } else { data.source };
        return Ok(Value::Object(new_regexp_object(rt, &utf8_to_utf16(&source), &flag_text)?));
    }
    let pattern = if pattern.is_undefined() { Vec::new() } else { rt.to_string(&pattern)? };
    let flags = if flags.is_undefined() { String::new() } else { rt.to_rust_string(&flags)? };
    Ok(Value::Object(new_regexp_object(rt, &pattern, &flags)?))
}

pub fn handle_regexp_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    if name == "RegExp" {
        return regexp_constructor(rt, args, construct);
    }
    let object = match &this {
        Value::Object(o) if matches!(o.borrow().kind, ObjectKind::RegExp(_)) => *o,
        _ => return Err(raise_type_error!("{name} called on incompatible receiver")),
    };
    match name {
        "RegExp.prototype.exec" | "RegExp.prototype.test" => {
            let input = rt.to_string(&arg(args, 0))?;
            let result = regexp_exec(rt, object, &input)?;
            if name.ends_with("test") {
                Ok(Value::Boolean(!matches!(result, Value::Null)))
            } else {
                Ok(result)
            }
        }
        "RegExp.prototype.toString" => {
            let mut out = String::from("/");
            if let Some(data) = regexp_data(&this) {
                out.push_str(&data.source);
                out.push('/');
                for (set, c) in [(data.global, 'g'), (data.ignore_case, 'i'), (data.multiline, 'm')] {
                    if set {
                        out.push(c);
                    }
                }
            }
            Ok(rt.new_string_value(&out))
        }
        _ => Err(crate::eval_error_here!(format!("unknown RegExp built-in {name}")).into()),
    }
}
