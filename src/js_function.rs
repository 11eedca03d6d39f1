use crate::core::{
    EvalResult, FunctionKind, MutationContext, ObjectKind, PropertyDescriptor, Realm, Runtime, Value, arg, define_constructor,
    define_native_methods, new_js_object, parse_function_constructor,
};
use crate::error::JSError;
use crate::{raise_range_error, raise_type_error};

pub fn initialize_function<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    define_constructor(mc, realm, "Function", 1, realm.function_prototype);
    define_native_methods(
        mc,
        realm,
        realm.function_prototype,
        "Function.prototype",
        &[("toString", 0), ("apply", 2), ("call", 1), ("bind", 1)],
    );
    Ok(())
}

/// `new Function(p1, ..., pn, body)`: parameters and body are parsed as a
/// function declared in the global scope.
fn function_constructor<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
    let mut texts = Vec::with_capacity(args.len());
    for a in args {
        texts.push(rt.to_rust_string(a)?);
    }
    let body = texts.pop().unwrap_or_default();
    let params = texts.join(",");
    log::trace!("Function constructor: ({params}) {{ {} bytes }}", body.len());
    let node = parse_function_constructor(&params, &body)?;
    let f = rt.create_function(&node, rt.realm.global_env)?;
    Ok(Value::Object(f))
}

/// Largest argument list `apply` will spread.
const MAX_APPLY_ARGUMENTS: u32 = 1 << 20;

/// Arguments of `apply` from an array-like object.
fn array_like_arguments<'gc>(rt: &mut Runtime<'gc>, value: &Value<'gc>) -> EvalResult<'gc, Vec<Value<'gc>>> {
    let list = match value {
        Value::Undefined | Value::Null => return Ok(Vec::new()),
        Value::Object(o) => *o,
        _ => return Err(raise_type_error!("Function.prototype.apply: arguments list has wrong type")),
    };
    let len_value = rt.get(list, "length")?;
    let len = rt.to_uint32(&len_value)?;
    if len > MAX_APPLY_ARGUMENTS {
        return Err(raise_range_error!("Function.prototype.apply: too many arguments ({len})"));
    }
    let mut out = Vec::new();
    for i in 0..len {
        out.push(rt.get(list, &i.to_string())?);
    }
    Ok(out)
}

pub fn handle_function_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    if name == "Function" {
        return function_constructor(rt, args);
    }
    if name == "Function.prototype" {
        return Ok(Value::Undefined);
    }
    let Some(f) = this.as_callable() else {
        return Err(raise_type_error!("{name} called on a non-function"));
    };
    match name {
        "Function.prototype.toString" => {
            let text = match &f.borrow().kind {
                ObjectKind::Function(FunctionKind::Script { code, .. }) => code.0.source.clone(),
                ObjectKind::Function(FunctionKind::Native { name, .. }) => {
                    let short = name.rsplit('.').next().unwrap_or(name);
                    format!("function {short}() {{ [native code] }}")
                }
                _ => "function () { [native code] }".to_string(),
            };
            Ok(rt.new_string_value(&text))
        }
        "Function.prototype.call" => rt.call(f, arg(args, 0), args.get(1..).unwrap_or(&[])),
        "Function.prototype.apply" => {
            let list = array_like_arguments(rt, &arg(args, 1))?;
            rt.call(f, arg(args, 0), &list)
        }
        "Function.prototype.bind" => {
            let bound_args = args.get(1..).unwrap_or(&[]).to_vec();
            let target_length = match rt.get(f, "length")? {
                Value::Number(n) => n,
                _ => 0.0,
            };
            let length = (target_length - bound_args.len() as f64).max(0.0);
            let kind = FunctionKind::Bound {
                target: f,
                this: arg(args, 0),
                args: bound_args,
            };
            let bound = new_js_object(rt.mc, "Function", ObjectKind::Function(kind), Some(rt.realm.function_prototype));
            bound.borrow_mut(rt.mc).insert("length", Value::Number(length), false, false, false);
            let thrower = Value::Object(rt.realm.throw_type_error);
            for poisoned in ["caller", "arguments"] {
                let desc = PropertyDescriptor::new_accessor(thrower.clone(), thrower.clone(), false, false);
                rt.define_own_property(bound, poisoned, desc, false)?;
            }
            log::trace!("bound function of length {length}");
            Ok(Value::Object(bound))
        }
        _ => Err(crate::eval_error_here!(format!("unknown Function built-in {name}")).into()),
    }
}
