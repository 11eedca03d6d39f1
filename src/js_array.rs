use crate::core::{
    EvalResult, JSObjectDataPtr, MutationContext, Realm, Runtime, Value, arg, define_constructor, define_native_methods,
    has_property, strict_equals, to_boolean,
};
use crate::error::JSError;
use crate::{raise_range_error, raise_type_error};
use std::cmp::Ordering;

pub fn initialize_array<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let array_ctor = define_constructor(mc, realm, "Array", 1, realm.array_prototype);
    define_native_methods(mc, realm, array_ctor, "Array", &[("isArray", 1)]);
    define_native_methods(
        mc,
        realm,
        realm.array_prototype,
        "Array.prototype",
        &[
            ("toString", 0),
            ("toLocaleString", 0),
            ("concat", 1),
            ("join", 1),
            ("pop", 0),
            ("push", 1),
            ("reverse", 0),
            ("shift", 0),
            ("slice", 2),
            ("sort", 1),
            ("splice", 2),
            ("unshift", 1),
            ("indexOf", 1),
            ("lastIndexOf", 1),
            ("every", 1),
            ("some", 1),
            ("forEach", 1),
            ("map", 1),
            ("filter", 1),
            ("reduce", 1),
            ("reduceRight", 1),
        ],
    );
    Ok(())
}

fn length_of<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>) -> EvalResult<'gc, u32> {
    let len = rt.get(o, "length")?;
    rt.to_uint32(&len)
}

fn set_length<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, len: f64) -> EvalResult<'gc, ()> {
    rt.put(o, "length", Value::Number(len), true)
}

/// Start or end position from a relative index argument, clamped to `0..=len`.
fn relative_index<'gc>(rt: &mut Runtime<'gc>, value: &Value<'gc>, len: f64, default: f64) -> EvalResult<'gc, f64> {
    if value.is_undefined() {
        return Ok(default);
    }
    let rel = rt.to_integer(value)?;
    Ok(if rel < 0.0 { (len + rel).max(0.0) } else { rel.min(len) })
}

fn callback_arg<'gc>(args: &[Value<'gc>], method: &str) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
    match args.first().and_then(Value::as_callable) {
        Some(f) => Ok(f),
        None => Err(raise_type_error!("Array.prototype.{method}: callback is not a function")),
    }
}

/// Array with `len` and only the given present elements.
fn sparse_array<'gc>(rt: &mut Runtime<'gc>, elements: Vec<(u32, Value<'gc>)>, len: f64) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
    let array = rt.new_array(Vec::new());
    for (i, v) in elements {
        rt.create_data_property(array, &i.to_string(), v)?;
    }
    set_length(rt, array, len)?;
    Ok(array)
}

fn array_constructor<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    if let [Value::Number(n)] = args {
        if *n < 0.0 || n.fract() != 0.0 || *n > u32::MAX as f64 {
            return Err(raise_range_error!("Invalid array length"));
        }
        let array = rt.new_array(Vec::new());
        array.borrow_mut(rt.mc).insert("length", Value::Number(*n), true, false, false);
        return Ok(Value::Object(array));
    }
    Ok(Value::Object(rt.new_array(args.to_vec())))
}

fn join<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, separator: &Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
    let len = length_of(rt, o)?;
    let sep = if separator.is_undefined() {
        vec![b',' as u16]
    } else {
        rt.to_string(separator)?
    };
    let mut out = Vec::new();
    for i in 0..len {
        if i > 0 {
            out.extend_from_slice(&sep);
        }
        let element = rt.get(o, &i.to_string())?;
        if !element.is_nullish() {
            out.extend(rt.to_string(&element)?);
        }
    }
    Ok(Value::String(out))
}

/// Default sort order: ToString of both sides compared by UTF-16 code units.
fn compare_elements<'gc>(rt: &mut Runtime<'gc>, comparefn: Option<JSObjectDataPtr<'gc>>, x: &Value<'gc>, y: &Value<'gc>) -> EvalResult<'gc, Ordering> {
    if let Some(f) = comparefn {
        let result = rt.call(f, Value::Undefined, &[x.clone(), y.clone()])?;
        let n = rt.to_number(&result)?;
        return Ok(if n < 0.0 {
            Ordering::Less
        } else if n > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        });
    }
    let xs = rt.to_string(x)?;
    let ys = rt.to_string(y)?;
    Ok(xs.cmp(&ys))
}

/// Stable merge sort whose comparator may throw.
fn merge_sort<'gc>(rt: &mut Runtime<'gc>, comparefn: Option<JSObjectDataPtr<'gc>>, mut items: Vec<Value<'gc>>) -> EvalResult<'gc, Vec<Value<'gc>>> {
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(rt, comparefn, items)?;
    let right = merge_sort(rt, comparefn, right)?;
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        if compare_elements(rt, comparefn, l, r)? == Ordering::Greater {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn sort<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, comparefn: &Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
    let comparefn = match comparefn {
        Value::Undefined => None,
        f => match f.as_callable() {
            Some(f) => Some(f),
            None => return Err(raise_type_error!("The comparison function must be either a function or undefined")),
        },
    };
    let len = length_of(rt, o)?;
    let mut values = Vec::new();
    let mut undefined_count = 0u32;
    for i in 0..len {
        let key = i.to_string();
        if !has_property(o, &key) {
            continue;
        }
        match rt.get(o, &key)? {
            Value::Undefined => undefined_count += 1,
            v => values.push(v),
        }
    }
    let sorted = merge_sort(rt, comparefn, values)?;
    let present = sorted.len() as u32 + undefined_count;
    for (i, v) in sorted.into_iter().enumerate() {
        rt.put(o, &i.to_string(), v, true)?;
    }
    for i in (present - undefined_count)..present {
        rt.put(o, &i.to_string(), Value::Undefined, true)?;
    }
    for i in present..len {
        rt.delete(o, &i.to_string(), true)?;
    }
    Ok(Value::Object(o))
}

fn splice<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    let len = length_of(rt, o)? as f64;
    let start = relative_index(rt, &arg(args, 0), len, 0.0)?;
    let delete_count = if args.len() < 2 {
        if args.is_empty() { 0.0 } else { len - start }
    } else {
        rt.to_integer(&args[1])?.max(0.0).min(len - start)
    };
    let items = args.get(2..).unwrap_or(&[]);
    let (start, delete_count, len) = (start as u32, delete_count as u32, len as u32);

    let mut removed = Vec::new();
    for k in 0..delete_count {
        let from = (start + k).to_string();
        if has_property(o, &from) {
            removed.push((k, rt.get(o, &from)?));
        }
    }
    let removed = sparse_array(rt, removed, delete_count as f64)?;

    let item_count = items.len() as u32;
    if item_count < delete_count {
        for k in start..(len - delete_count) {
            move_element(rt, o, k + delete_count, k + item_count)?;
        }
        for k in ((len - delete_count + item_count)..len).rev() {
            rt.delete(o, &k.to_string(), true)?;
        }
    } else if item_count > delete_count {
        for k in (start..(len - delete_count)).rev() {
            move_element(rt, o, k + delete_count, k + item_count)?;
        }
    }
    for (i, item) in items.iter().enumerate() {
        rt.put(o, &(start + i as u32).to_string(), item.clone(), true)?;
    }
    set_length(rt, o, len as f64 - delete_count as f64 + item_count as f64)?;
    Ok(Value::Object(removed))
}

/// Copy index `from` to `to`, deleting `to` when `from` is a hole.
fn move_element<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, from: u32, to: u32) -> EvalResult<'gc, ()> {
    let from = from.to_string();
    let to = to.to_string();
    if has_property(o, &from) {
        let v = rt.get(o, &from)?;
        rt.put(o, &to, v, true)
    } else {
        rt.delete(o, &to, true).map(|_| ())
    }
}

/// Shared loop of `every`, `some`, `forEach`, `map` and `filter`.
fn iterate<'gc>(rt: &mut Runtime<'gc>, name: &str, o: JSObjectDataPtr<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    let len = length_of(rt, o)?;
    let method = &name["Array.prototype.".len()..];
    let callback = callback_arg(args, method)?;
    let this_arg = arg(args, 1);
    let mut mapped = Vec::new();
    let mut kept = Vec::new();
    for k in 0..len {
        let key = k.to_string();
        if !has_property(o, &key) {
            continue;
        }
        let value = rt.get(o, &key)?;
        let result = rt.call(callback, this_arg.clone(), &[value.clone(), Value::Number(k as f64), Value::Object(o)])?;
        match method {
            "every" if !to_boolean(&result) => return Ok(Value::Boolean(false)),
            "some" if to_boolean(&result) => return Ok(Value::Boolean(true)),
            "map" => mapped.push((k, result)),
            "filter" if to_boolean(&result) => kept.push(value),
            _ => {}
        }
    }
    Ok(match method {
        "every" => Value::Boolean(true),
        "some" => Value::Boolean(false),
        "map" => Value::Object(sparse_array(rt, mapped, len as f64)?),
        "filter" => Value::Object(rt.new_array(kept)),
        _ => Value::Undefined,
    })
}

fn reduce<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, args: &[Value<'gc>], from_right: bool) -> EvalResult<'gc, Value<'gc>> {
    let len = length_of(rt, o)?;
    let callback = callback_arg(args, if from_right { "reduceRight" } else { "reduce" })?;
    let mut indices: Box<dyn Iterator<Item = u32>> = if from_right { Box::new((0..len).rev()) } else { Box::new(0..len) };
    let mut accumulator = if args.len() >= 2 {
        args[1].clone()
    } else {
        loop {
            let Some(k) = indices.next() else {
                return Err(raise_type_error!("Reduce of empty array with no initial value"));
            };
            let key = k.to_string();
            if has_property(o, &key) {
                break rt.get(o, &key)?;
            }
        }
    };
    for k in indices {
        let key = k.to_string();
        if !has_property(o, &key) {
            continue;
        }
        let value = rt.get(o, &key)?;
        accumulator = rt.call(callback, Value::Undefined, &[accumulator, value, Value::Number(k as f64), Value::Object(o)])?;
    }
    Ok(accumulator)
}

fn index_of<'gc>(rt: &mut Runtime<'gc>, o: JSObjectDataPtr<'gc>, args: &[Value<'gc>], last: bool) -> EvalResult<'gc, Value<'gc>> {
    let len = length_of(rt, o)? as f64;
    if len == 0.0 {
        return Ok(Value::Number(-1.0));
    }
    let target = arg(args, 0);
    let candidates: Vec<f64> = if last {
        let n = if args.len() > 1 { rt.to_integer(&args[1])? } else { len - 1.0 };
        let start = if n >= 0.0 { n.min(len - 1.0) } else { len + n };
        if start < 0.0 {
            return Ok(Value::Number(-1.0));
        }
        (0..=start as u32).rev().map(f64::from).collect()
    } else {
        let n = if args.len() > 1 { rt.to_integer(&args[1])? } else { 0.0 };
        if n >= len {
            return Ok(Value::Number(-1.0));
        }
        let start = if n >= 0.0 { n } else { (len + n).max(0.0) };
        (start as u32..len as u32).map(f64::from).collect()
    };
    for k in candidates {
        let key = (k as u32).to_string();
        if has_property(o, &key) {
            let element = rt.get(o, &key)?;
            if strict_equals(&element, &target) {
                return Ok(Value::Number(k));
            }
        }
    }
    Ok(Value::Number(-1.0))
}

pub fn handle_array_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    match name {
        "Array" => return array_constructor(rt, args),
        "Array.isArray" => {
            let is_array = matches!(args.first(), Some(Value::Object(o)) if o.borrow().is_array());
            return Ok(Value::Boolean(is_array));
        }
        _ => {}
    }
    let o = rt.to_object(&this)?;
    match name {
        "Array.prototype.toString" => {
            let f = rt.get(o, "join")?;
            match f.as_callable() {
                Some(join_fn) => rt.call(join_fn, Value::Object(o), &[]),
                None => crate::js_object::class_string(rt, &Value::Object(o)),
            }
        }
        "Array.prototype.toLocaleString" => {
            let len = length_of(rt, o)?;
            let mut out = Vec::new();
            for i in 0..len {
                if i > 0 {
                    out.push(b',' as u16);
                }
                let element = rt.get(o, &i.to_string())?;
                if element.is_nullish() {
                    continue;
                }
                let element = rt.to_object(&element)?;
                let f = rt.get(element, "toLocaleString")?;
                let s = rt.call_value(&f, Value::Object(element), &[])?;
                out.extend(rt.to_string(&s)?);
            }
            Ok(Value::String(out))
        }
        "Array.prototype.concat" => {
            let mut elements = Vec::new();
            let mut n = 0u32;
            let items = std::iter::once(Value::Object(o)).chain(args.iter().cloned());
            for item in items {
                match &item {
                    Value::Object(e) if e.borrow().is_array() => {
                        let len = length_of(rt, *e)?;
                        for k in 0..len {
                            let key = k.to_string();
                            if has_property(*e, &key) {
                                elements.push((n, rt.get(*e, &key)?));
                            }
                            n += 1;
                        }
                    }
                    _ => {
                        elements.push((n, item.clone()));
                        n += 1;
                    }
                }
            }
            Ok(Value::Object(sparse_array(rt, elements, n as f64)?))
        }
        "Array.prototype.join" => join(rt, o, &arg(args, 0)),
        "Array.prototype.pop" => {
            let len = length_of(rt, o)?;
            if len == 0 {
                set_length(rt, o, 0.0)?;
                return Ok(Value::Undefined);
            }
            let key = (len - 1).to_string();
            let element = rt.get(o, &key)?;
            rt.delete(o, &key, true)?;
            set_length(rt, o, (len - 1) as f64)?;
            Ok(element)
        }
        "Array.prototype.push" => {
            let mut n = length_of(rt, o)? as f64;
            for item in args {
                rt.put(o, &crate::core::number::number_to_string(n), item.clone(), true)?;
                n += 1.0;
            }
            set_length(rt, o, n)?;
            Ok(Value::Number(n))
        }
        "Array.prototype.reverse" => {
            let len = length_of(rt, o)?;
            let middle = len / 2;
            for lower in 0..middle {
                let upper = len - lower - 1;
                let (lower_key, upper_key) = (lower.to_string(), upper.to_string());
                let lower_exists = has_property(o, &lower_key);
                let upper_exists = has_property(o, &upper_key);
                let lower_value = if lower_exists { rt.get(o, &lower_key)? } else { Value::Undefined };
                let upper_value = if upper_exists { rt.get(o, &upper_key)? } else { Value::Undefined };
                match (lower_exists, upper_exists) {
                    (true, true) => {
                        rt.put(o, &lower_key, upper_value, true)?;
                        rt.put(o, &upper_key, lower_value, true)?;
                    }
                    (false, true) => {
                        rt.put(o, &lower_key, upper_value, true)?;
                        rt.delete(o, &upper_key, true)?;
                    }
                    (true, false) => {
                        rt.delete(o, &lower_key, true)?;
                        rt.put(o, &upper_key, lower_value, true)?;
                    }
                    (false, false) => {}
                }
            }
            Ok(Value::Object(o))
        }
        "Array.prototype.shift" => {
            let len = length_of(rt, o)?;
            if len == 0 {
                set_length(rt, o, 0.0)?;
                return Ok(Value::Undefined);
            }
            let first = rt.get(o, "0")?;
            for k in 1..len {
                move_element(rt, o, k, k - 1)?;
            }
            rt.delete(o, &(len - 1).to_string(), true)?;
            set_length(rt, o, (len - 1) as f64)?;
            Ok(first)
        }
        "Array.prototype.unshift" => {
            let len = length_of(rt, o)?;
            let count = args.len() as u32;
            for k in (0..len).rev() {
                move_element(rt, o, k, k + count)?;
            }
            for (j, item) in args.iter().enumerate() {
                rt.put(o, &j.to_string(), item.clone(), true)?;
            }
            let new_len = len as f64 + count as f64;
            set_length(rt, o, new_len)?;
            Ok(Value::Number(new_len))
        }
        "Array.prototype.slice" => {
            let len = length_of(rt, o)? as f64;
            let start = relative_index(rt, &arg(args, 0), len, 0.0)?;
            let end = relative_index(rt, &arg(args, 1), len, len)?;
            let mut elements = Vec::new();
            let mut n = 0u32;
            let mut k = start;
            while k < end {
                let key = (k as u32).to_string();
                if has_property(o, &key) {
                    elements.push((n, rt.get(o, &key)?));
                }
                k += 1.0;
                n += 1;
            }
            Ok(Value::Object(sparse_array(rt, elements, n as f64)?))
        }
        "Array.prototype.sort" => sort(rt, o, &arg(args, 0)),
        "Array.prototype.splice" => splice(rt, o, args),
        "Array.prototype.indexOf" => index_of(rt, o, args, false),
        "Array.prototype.lastIndexOf" => index_of(rt, o, args, true),
        "Array.prototype.every"
        | "Array.prototype.some"
        | "Array.prototype.forEach"
        | "Array.prototype.map"
        | "Array.prototype.filter" => iterate(rt, name, o, args),
        "Array.prototype.reduce" => reduce(rt, o, args, false),
        "Array.prototype.reduceRight" => reduce(rt, o, args, true),
        _ => Err(crate::eval_error_here!(format!("unknown Array built-in {name}")).into()),
    }
}

