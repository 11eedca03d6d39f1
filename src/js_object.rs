use crate::core::{
    EvalResult, Gc, JSObjectDataPtr, MutationContext, ObjectKind, Property, PropertyDescriptor, Realm, Runtime, Value, arg,
    create_native_function, define_native_methods, get_own_property, new_js_object, own_keys,
};
use crate::error::JSError;
use crate::raise_type_error;
use crate::unicode::utf8_to_utf16;

pub fn initialize_object<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let object_ctor = create_native_function(mc, realm, "Object", 1, true);
    object_ctor
        .borrow_mut(mc)
        .insert("prototype", Value::Object(realm.object_prototype), false, false, false);
    realm.object_prototype.borrow_mut(mc).insert_builtin("constructor", Value::Object(object_ctor));
    realm.global.borrow_mut(mc).insert_builtin("Object", Value::Object(object_ctor));

    define_native_methods(
        mc,
        realm,
        object_ctor,
        "Object",
        &[
            ("getPrototypeOf", 1),
            ("getOwnPropertyDescriptor", 2),
            ("getOwnPropertyNames", 1),
            ("create", 2),
            ("defineProperty", 3),
            ("defineProperties", 2),
            ("seal", 1),
            ("freeze", 1),
            ("preventExtensions", 1),
            ("isSealed", 1),
            ("isFrozen", 1),
            ("isExtensible", 1),
            ("keys", 1),
        ],
    );
    define_native_methods(
        mc,
        realm,
        realm.object_prototype,
        "Object.prototype",
        &[
            ("toString", 0),
            ("toLocaleString", 0),
            ("valueOf", 0),
            ("hasOwnProperty", 1),
            ("isPrototypeOf", 1),
            ("propertyIsEnumerable", 1),
        ],
    );
    Ok(())
}

/// The object argument of the `Object.*` reflection functions.
fn object_arg<'gc>(args: &[Value<'gc>], method: &str) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
    match args.first() {
        Some(Value::Object(o)) => Ok(*o),
        _ => Err(raise_type_error!("Object.{method} called on non-object")),
    }
}

/// Apply every own enumerable property of `properties` as a descriptor on
/// `target`. All descriptors are converted before any is defined.
fn define_properties<'gc>(rt: &mut Runtime<'gc>, target: JSObjectDataPtr<'gc>, properties: &Value<'gc>) -> EvalResult<'gc, ()> {
    let props = rt.to_object(properties)?;
    let mut descriptors = Vec::new();
    for key in own_keys(props) {
        if !get_own_property(props, &key).is_some_and(|p| p.enumerable()) {
            continue;
        }
        let desc_obj = rt.get(props, &key)?;
        descriptors.push((key, rt.to_property_descriptor(&desc_obj)?));
    }
    for (key, desc) in descriptors {
        rt.define_own_property(target, &key, desc, true)?;
    }
    Ok(())
}

/// Make every own property non-configurable, and data properties read-only
/// too when `freeze` is set.
fn seal_object<'gc>(rt: &mut Runtime<'gc>, object: JSObjectDataPtr<'gc>, freeze: bool) -> EvalResult<'gc, ()> {
    for key in own_keys(object) {
        let Some(prop) = get_own_property(object, &key) else { continue };
        let desc = PropertyDescriptor {
            configurable: Some(false),
            writable: (freeze && prop.is_data()).then_some(false),
            ..Default::default()
        };
        rt.define_own_property(object, &key, desc, true)?;
    }
    object.borrow_mut(rt.mc).extensible = false;
    Ok(())
}

fn test_integrity(object: JSObjectDataPtr<'_>, frozen: bool) -> bool {
    if object.borrow().extensible {
        return false;
    }
    own_keys(object).iter().all(|key| match get_own_property(object, key) {
        Some(Property::Data {
            writable, configurable, ..
        }) => !configurable && !(frozen && writable),
        Some(p) => !p.configurable(),
        None => true,
    })
}

/// `Object.prototype.toString`: `[object Class]`.
pub fn class_string<'gc>(rt: &mut Runtime<'gc>, this: &Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
    let class = match this {
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        other => rt.to_object(other)?.borrow().class_name,
    };
    Ok(Value::String(utf8_to_utf16(&format!("[object {class}]"))))
}

pub fn handle_object_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    match name {
        "Object" => match arg(args, 0) {
            Value::Undefined | Value::Null => Ok(Value::Object(rt.new_plain_object())),
            v => Ok(Value::Object(rt.to_object(&v)?)),
        },
        "Object.getPrototypeOf" => {
            let o = object_arg(args, "getPrototypeOf")?;
            let proto = o.borrow().prototype;
            Ok(proto.map(Value::Object).unwrap_or(Value::Null))
        }
        "Object.getOwnPropertyDescriptor" => {
            let o = object_arg(args, "getOwnPropertyDescriptor")?;
            let key = rt.to_property_key(&arg(args, 1))?;
            let prop = get_own_property(o, &key);
            Ok(rt.from_property_descriptor(prop))
        }
        "Object.getOwnPropertyNames" => {
            let o = object_arg(args, "getOwnPropertyNames")?;
            let names = own_keys(o).iter().map(|k| rt.new_string_value(k)).collect();
            Ok(Value::Object(rt.new_array(names)))
        }
        "Object.create" => {
            let proto = match arg(args, 0) {
                Value::Object(p) => Some(p),
                Value::Null => None,
                _ => return Err(raise_type_error!("Object prototype may only be an Object or null")),
            };
            let object = new_js_object(rt.mc, "Object", ObjectKind::Ordinary, proto);
            let properties = arg(args, 1);
            if !properties.is_undefined() {
                define_properties(rt, object, &properties)?;
            }
            Ok(Value::Object(object))
        }
        "Object.defineProperty" => {
            let o = object_arg(args, "defineProperty")?;
            let key = rt.to_property_key(&arg(args, 1))?;
            let desc = rt.to_property_descriptor(&arg(args, 2))?;
            rt.define_own_property(o, &key, desc, true)?;
            Ok(Value::Object(o))
        }
        "Object.defineProperties" => {
            let o = object_arg(args, "defineProperties")?;
            define_properties(rt, o, &arg(args, 1))?;
            Ok(Value::Object(o))
        }
        "Object.seal" | "Object.freeze" => {
            let o = object_arg(args, &name[7..])?;
            seal_object(rt, o, name == "Object.freeze")?;
            Ok(Value::Object(o))
        }
        "Object.preventExtensions" => {
            let o = object_arg(args, "preventExtensions")?;
            o.borrow_mut(rt.mc).extensible = false;
            Ok(Value::Object(o))
        }
        "Object.isSealed" => Ok(Value::Boolean(test_integrity(object_arg(args, "isSealed")?, false))),
        "Object.isFrozen" => Ok(Value::Boolean(test_integrity(object_arg(args, "isFrozen")?, true))),
        "Object.isExtensible" => Ok(Value::Boolean(object_arg(args, "isExtensible")?.borrow().extensible)),
        "Object.keys" => {
            let o = object_arg(args, "keys")?;
            let keys = own_keys(o)
                .into_iter()
                .filter(|k| get_own_property(o, k).is_some_and(|p| p.enumerable()))
                .map(|k| rt.new_string_value(&k))
                .collect();
            Ok(Value::Object(rt.new_array(keys)))
        }
        "Object.prototype.toString" => class_string(rt, &this),
        "Object.prototype.toLocaleString" => {
            let o = rt.to_object(&this)?;
            let f = rt.get(o, "toString")?;
            rt.call_value(&f, this, &[])
        }
        "Object.prototype.valueOf" => Ok(Value::Object(rt.to_object(&this)?)),
        "Object.prototype.hasOwnProperty" => {
            let key = rt.to_property_key(&arg(args, 0))?;
            let o = rt.to_object(&this)?;
            Ok(Value::Boolean(get_own_property(o, &key).is_some()))
        }
        "Object.prototype.isPrototypeOf" => {
            let Value::Object(v) = arg(args, 0) else {
                return Ok(Value::Boolean(false));
            };
            let o = rt.to_object(&this)?;
            let mut current = v.borrow().prototype;
            while let Some(p) = current {
                if Gc::ptr_eq(p, o) {
                    return Ok(Value::Boolean(true));
                }
                current = p.borrow().prototype;
            }
            Ok(Value::Boolean(false))
        }
        "Object.prototype.propertyIsEnumerable" => {
            let key = rt.to_property_key(&arg(args, 0))?;
            let o = rt.to_object(&this)?;
            Ok(Value::Boolean(get_own_property(o, &key).is_some_and(|p| p.enumerable())))
        }
        _ => Err(crate::eval_error_here!(format!("unknown Object built-in {name}")).into()),
    }
}
