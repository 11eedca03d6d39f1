use crate::core::{
    EvalResult, JSObjectDataPtr, MutationContext, ObjectKind, Realm, RegExpData, Runtime, Value, arg, define_constructor,
    define_native_methods,
};
use crate::error::JSError;
use crate::js_regexp::{RegExpMatch, find_match, new_regexp_object, regexp_data, regexp_exec};
use crate::raise_type_error;
use crate::unicode::{utf16_find_from, utf16_rfind_from, utf16_to_lowercase, utf16_to_uppercase, utf16_to_utf8, utf16_trim};
use unicode_normalization::UnicodeNormalization;

pub fn initialize_string<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let string_ctor = define_constructor(mc, realm, "String", 1, realm.string_prototype);
    define_native_methods(mc, realm, string_ctor, "String", &[("fromCharCode", 1)]);
    define_native_methods(
        mc,
        realm,
        realm.string_prototype,
        "String.prototype",
        &[
            ("toString", 0),
            ("valueOf", 0),
            ("charAt", 1),
            ("charCodeAt", 1),
            ("concat", 1),
            ("indexOf", 1),
            ("lastIndexOf", 1),
            ("localeCompare", 1),
            ("match", 1),
            ("replace", 2),
            ("search", 1),
            ("slice", 2),
            ("split", 2),
            ("substring", 2),
            ("substr", 2),
            ("toLowerCase", 0),
            ("toLocaleLowerCase", 0),
            ("toUpperCase", 0),
            ("toLocaleUpperCase", 0),
            ("trim", 0),
        ],
    );
    Ok(())
}

/// `this` of `toString`/`valueOf`: a string value or a String object.
fn this_string_value<'gc>(this: &Value<'gc>, method: &str) -> EvalResult<'gc, Vec<u16>> {
    match this {
        Value::String(s) => Ok(s.clone()),
        Value::Object(o) => match &o.borrow().kind {
            ObjectKind::String(s) => Ok(s.clone()),
            _ => Err(raise_type_error!("String.prototype.{method} requires that 'this' be a String")),
        },
        _ => Err(raise_type_error!("String.prototype.{method} requires that 'this' be a String")),
    }
}

/// RegExp argument of `match` and `search`, compiling non-RegExp values.
fn coerce_regexp<'gc>(rt: &mut Runtime<'gc>, value: &Value<'gc>) -> EvalResult<'gc, (JSObjectDataPtr<'gc>, RegExpData)> {
    if let (Value::Object(o), Some(data)) = (value, regexp_data(value)) {
        return Ok((*o, data));
    }
    let pattern = if value.is_undefined() { Vec::new() } else { rt.to_string(value)? };
    let object = new_regexp_object(rt, &pattern, "")?;
    let data = regexp_data(&Value::Object(object)).ok_or_else(|| crate::eval_error_here!("fresh RegExp without data"))?;
    Ok((object, data))
}

/// Every match of a global scan, stepping past empty matches.
fn all_matches(data: &RegExpData, s: &[u16]) -> Vec<RegExpMatch> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(m) = find_match(data, s, from) {
        from = if m.end == m.start { m.end + 1 } else { m.end };
        out.push(m);
    }
    out
}

/// Expand `$$`, `$&`, `` $` ``, `$'` and `$n`/`$nn` in a replacement template.
fn expand_replacement(template: &[u16], s: &[u16], m: &RegExpMatch) -> Vec<u16> {
    let mut out = Vec::with_capacity(template.len());
    let count = m.captures.len();
    let digit = |u: u16| (b'0' as u16..=b'9' as u16).contains(&u).then(|| (u - b'0' as u16) as usize);
    let mut i = 0;
    while i < template.len() {
        let c = template[i];
        let next = match template.get(i + 1) {
            Some(&n) if c == b'$' as u16 => n,
            _ => {
                out.push(c);
                i += 1;
                continue;
            }
        };
        match next {
            0x24 => {
                out.push(b'$' as u16);
                i += 2;
            }
            0x26 => {
                out.extend_from_slice(&s[m.start..m.end]);
                i += 2;
            }
            0x60 => {
                out.extend_from_slice(&s[..m.start]);
                i += 2;
            }
            0x27 => {
                out.extend_from_slice(&s[m.end..]);
                i += 2;
            }
            _ => {
                let one = digit(next);
                let two = one.and_then(|d1| template.get(i + 2).copied().and_then(digit).map(|d2| d1 * 10 + d2));
                let (index, consumed) = match (one, two) {
                    (_, Some(nn)) if nn >= 1 && nn <= count => (nn, 3),
                    (Some(n), _) if n >= 1 && n <= count => (n, 2),
                    _ => {
                        out.push(c);
                        i += 1;
                        continue;
                    }
                };
                if let Some(Some(capture)) = m.captures.get(index - 1) {
                    out.extend_from_slice(capture);
                }
                i += consumed;
            }
        }
    }
    out
}

fn replace<'gc>(rt: &mut Runtime<'gc>, s: Vec<u16>, search: &Value<'gc>, replacement: &Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
    let matches = if let (Value::Object(rx), Some(data)) = (search, regexp_data(search)) {
        if data.global {
            rt.put(*rx, "lastIndex", Value::Number(0.0), true)?;
            all_matches(&data, &s)
        } else {
            find_match(&data, &s, 0).into_iter().collect()
        }
    } else {
        let needle = rt.to_string(search)?;
        utf16_find_from(&s, &needle, 0)
            .map(|start| RegExpMatch {
                start,
                end: start + needle.len(),
                captures: Vec::new(),
            })
            .into_iter()
            .collect()
    };
    let replacer = replacement.as_callable();
    let template = match replacer {
        Some(_) => Vec::new(),
        None => rt.to_string(replacement)?,
    };
    let mut out = Vec::with_capacity(s.len());
    let mut last = 0;
    for m in &matches {
        out.extend_from_slice(&s[last..m.start]);
        match replacer {
            Some(f) => {
                let mut call_args = vec![Value::String(s[m.start..m.end].to_vec())];
                call_args.extend(m.capture_values());
                call_args.push(Value::Number(m.start as f64));
                call_args.push(Value::String(s.clone()));
                let r = rt.call(f, Value::Undefined, &call_args)?;
                out.extend(rt.to_string(&r)?);
            }
            None => out.extend(expand_replacement(&template, &s, m)),
        }
        last = m.end;
    }
    out.extend_from_slice(&s[last..]);
    Ok(Value::String(out))
}

fn split<'gc>(rt: &mut Runtime<'gc>, s: Vec<u16>, separator: &Value<'gc>, limit: &Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
    let lim = (if limit.is_undefined() { u32::MAX } else { rt.to_uint32(limit)? }) as usize;
    let regexp = regexp_data(separator);
    let needle = match (&regexp, separator) {
        (Some(_), _) | (None, Value::Undefined) => Vec::new(),
        (None, sep) => rt.to_string(sep)?,
    };
    if lim == 0 {
        return Ok(Value::Object(rt.new_array(Vec::new())));
    }
    if separator.is_undefined() {
        return Ok(Value::Object(rt.new_array(vec![Value::String(s)])));
    }
    let find = |from: usize| -> Option<RegExpMatch> {
        match &regexp {
            Some(data) => find_match(data, &s, from),
            None => utf16_find_from(&s, &needle, from).map(|start| RegExpMatch {
                start,
                end: start + needle.len(),
                captures: Vec::new(),
            }),
        }
    };
    let size = s.len();
    if size == 0 {
        let parts = if find(0).is_some() { Vec::new() } else { vec![Value::String(s.clone())] };
        return Ok(Value::Object(rt.new_array(parts)));
    }
    let mut parts = Vec::new();
    let (mut p, mut q) = (0, 0);
    while q < size {
        let Some(m) = find(q) else { break };
        if m.start >= size {
            break;
        }
        if m.end == p {
            q = m.start + 1;
            continue;
        }
        parts.push(Value::String(s[p..m.start].to_vec()));
        if parts.len() == lim {
            return Ok(Value::Object(rt.new_array(parts)));
        }
        for capture in m.capture_values() {
            parts.push(capture);
            if parts.len() == lim {
                return Ok(Value::Object(rt.new_array(parts)));
            }
        }
        p = m.end;
        q = p;
    }
    parts.push(Value::String(s[p..].to_vec()));
    Ok(Value::Object(rt.new_array(parts)))
}

pub fn handle_string_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    match name {
        "String" => {
            let s = if args.is_empty() { Vec::new() } else { rt.to_string(&args[0])? };
            if construct {
                return Ok(Value::Object(rt.new_string_object(s)));
            }
            return Ok(Value::String(s));
        }
        "String.fromCharCode" => {
            let mut units = Vec::with_capacity(args.len());
            for a in args {
                units.push(rt.to_uint16(a)?);
            }
            return Ok(Value::String(units));
        }
        "String.prototype.toString" => return Ok(Value::String(this_string_value(&this, "toString")?)),
        "String.prototype.valueOf" => return Ok(Value::String(this_string_value(&this, "valueOf")?)),
        _ => {}
    }
    rt.check_object_coercible(&this)?;
    let s = rt.to_string(&this)?;
    let len = s.len() as f64;
    match name {
        "String.prototype.charAt" | "String.prototype.charCodeAt" => {
            let pos = rt.to_integer(&arg(args, 0))?;
            let unit = (pos >= 0.0 && pos < len).then(|| s[pos as usize]);
            Ok(match (name == "String.prototype.charCodeAt", unit) {
                (true, Some(u)) => Value::Number(u as f64),
                (true, None) => Value::Number(f64::NAN),
                (false, Some(u)) => Value::String(vec![u]),
                (false, None) => Value::String(Vec::new()),
            })
        }
        "String.prototype.concat" => {
            let mut out = s;
            for a in args {
                out.extend(rt.to_string(a)?);
            }
            Ok(Value::String(out))
        }
        "String.prototype.indexOf" => {
            let needle = rt.to_string(&arg(args, 0))?;
            let pos = rt.to_integer(&arg(args, 1))?.clamp(0.0, len) as usize;
            Ok(Value::Number(utf16_find_from(&s, &needle, pos).map(|i| i as f64).unwrap_or(-1.0)))
        }
        "String.prototype.lastIndexOf" => {
            let needle = rt.to_string(&arg(args, 0))?;
            let num_pos = rt.to_number(&arg(args, 1))?;
            let pos = if num_pos.is_nan() { len } else { crate::core::number::to_integer(num_pos).clamp(0.0, len) };
            Ok(Value::Number(utf16_rfind_from(&s, &needle, pos as usize).map(|i| i as f64).unwrap_or(-1.0)))
        }
        "String.prototype.localeCompare" => {
            let that = rt.to_string(&arg(args, 0))?;
            let (a, b) = (utf16_to_utf8(&s), utf16_to_utf8(&that));
            Ok(Value::Number(match a.nfc().cmp(b.nfc()) {
                std::cmp::Ordering::Less => -1.0,
                std::cmp::Ordering::Equal => 0.0,
                std::cmp::Ordering::Greater => 1.0,
            }))
        }
        "String.prototype.match" => {
            let (rx, data) = coerce_regexp(rt, &arg(args, 0))?;
            if !data.global {
                return regexp_exec(rt, rx, &s);
            }
            rt.put(rx, "lastIndex", Value::Number(0.0), true)?;
            let found: Vec<Value<'gc>> = all_matches(&data, &s)
                .into_iter()
                .map(|m| Value::String(s[m.start..m.end].to_vec()))
                .collect();
            if found.is_empty() {
                return Ok(Value::Null);
            }
            Ok(Value::Object(rt.new_array(found)))
        }
        "String.prototype.replace" => replace(rt, s, &arg(args, 0), &arg(args, 1)),
        "String.prototype.search" => {
            let (_, data) = coerce_regexp(rt, &arg(args, 0))?;
            Ok(Value::Number(find_match(&data, &s, 0).map(|m| m.start as f64).unwrap_or(-1.0)))
        }
        "String.prototype.slice" => {
            let start = relative(rt.to_integer(&arg(args, 0))?, len);
            let end = match arg(args, 1) {
                Value::Undefined => len,
                v => relative(rt.to_integer(&v)?, len),
            };
            Ok(Value::String(if start < end { s[start as usize..end as usize].to_vec() } else { Vec::new() }))
        }
        "String.prototype.split" => split(rt, s, &arg(args, 0), &arg(args, 1)),
        "String.prototype.substring" => {
            let start = rt.to_integer(&arg(args, 0))?.clamp(0.0, len);
            let end = match arg(args, 1) {
                Value::Undefined => len,
                v => rt.to_integer(&v)?.clamp(0.0, len),
            };
            let (from, to) = (start.min(end) as usize, start.max(end) as usize);
            Ok(Value::String(s[from..to].to_vec()))
        }
        "String.prototype.substr" => {
            let start = relative(rt.to_integer(&arg(args, 0))?, len);
            let length = match arg(args, 1) {
                Value::Undefined => f64::INFINITY,
                v => rt.to_integer(&v)?,
            };
            let count = length.max(0.0).min(len - start);
            if count <= 0.0 {
                return Ok(Value::String(Vec::new()));
            }
            Ok(Value::String(s[start as usize..(start + count) as usize].to_vec()))
        }
        "String.prototype.toLowerCase" | "String.prototype.toLocaleLowerCase" => Ok(Value::String(utf16_to_lowercase(&s))),
        "String.prototype.toUpperCase" | "String.prototype.toLocaleUpperCase" => Ok(Value::String(utf16_to_uppercase(&s))),
        "String.prototype.trim" => Ok(Value::String(utf16_trim(&s).to_vec())),
        _ => Err(crate::eval_error_here!(format!("unknown String built-in {name}")).into()),
    }
}

fn relative(rel: f64, len: f64) -> f64 {
    if rel < 0.0 { (len + rel).max(0.0) } else { rel.min(len) }
}
