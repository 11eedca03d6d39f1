use crate::core::{
    EvalResult, MutationContext, ObjectKind, Realm, Runtime, Value, define_constructor, define_native_methods, new_js_object, to_boolean,
};
use crate::error::JSError;
use crate::raise_type_error;

pub fn initialize_boolean<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    define_constructor(mc, realm, "Boolean", 1, realm.boolean_prototype);
    define_native_methods(mc, realm, realm.boolean_prototype, "Boolean.prototype", &[("toString", 0), ("valueOf", 0)]);
    Ok(())
}

fn this_boolean_value<'gc>(this: &Value<'gc>, method: &str) -> EvalResult<'gc, bool> {
    match this {
        Value::Boolean(b) => Ok(*b),
        Value::Object(o) => match o.borrow().kind {
            ObjectKind::Boolean(b) => Ok(b),
            _ => Err(raise_type_error!("Boolean.prototype.{method} requires that 'this' be a Boolean")),
        },
        _ => Err(raise_type_error!("Boolean.prototype.{method} requires that 'this' be a Boolean")),
    }
}

pub fn handle_boolean_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    match name {
        "Boolean" => {
            let b = args.first().is_some_and(to_boolean);
            if construct {
                let object = new_js_object(rt.mc, "Boolean", ObjectKind::Boolean(b), Some(rt.realm.boolean_prototype));
                return Ok(Value::Object(object));
            }
            Ok(Value::Boolean(b))
        }
        "Boolean.prototype.toString" => {
            let b = this_boolean_value(&this, "toString")?;
            Ok(rt.new_string_value(if b { "true" } else { "false" }))
        }
        "Boolean.prototype.valueOf" => Ok(Value::Boolean(this_boolean_value(&this, "valueOf")?)),
        _ => Err(crate::eval_error_here!(format!("unknown Boolean built-in {name}")).into()),
    }
}
