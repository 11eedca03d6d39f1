use crate::core::{
    EvalResult, JSObjectDataPtr, ObjectKind, Property, PropertyDescriptor, Runtime, Value, array_index, declarative_binding_value,
    new_js_object, same_value,
};
use crate::raise_type_error;
use crate::unicode::utf8_to_utf16;

/// Hint passed to [[DefaultValue]] and ToPrimitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreferredType {
    Number,
    String,
}

/// [[GetOwnProperty]], including the synthesised index properties of String
/// objects and the live parameter values of mapped arguments objects.
pub fn get_own_property<'gc>(object: JSObjectDataPtr<'gc>, name: &str) -> Option<Property<'gc>> {
    let obj = object.borrow();
    if let Some(prop) = obj.properties.get(name) {
        if let ObjectKind::Arguments(Some(map)) = &obj.kind
            && let Some(index) = array_index(name)
            && let Some(Some(param)) = map.names.get(index as usize)
            && let Property::Data {
                writable,
                enumerable,
                configurable,
                ..
            } = prop
            && let Some(value) = declarative_binding_value(map.env, param)
        {
            return Some(Property::Data {
                value,
                writable: *writable,
                enumerable: *enumerable,
                configurable: *configurable,
            });
        }
        return Some(prop.clone());
    }
    if let ObjectKind::String(s) = &obj.kind
        && let Some(index) = array_index(name)
        && (index as usize) < s.len()
    {
        return Some(Property::Data {
            value: Value::String(vec![s[index as usize]]),
            writable: false,
            enumerable: true,
            configurable: false,
        });
    }
    None
}

/// [[GetProperty]]: own property or the nearest one along the prototype chain.
pub fn get_property<'gc>(object: JSObjectDataPtr<'gc>, name: &str) -> Option<Property<'gc>> {
    let mut current = Some(object);
    while let Some(o) = current {
        if let Some(prop) = get_own_property(o, name) {
            return Some(prop);
        }
        current = o.borrow().prototype;
    }
    None
}

pub fn has_property(object: JSObjectDataPtr<'_>, name: &str) -> bool {
    get_property(object, name).is_some()
}

/// Own property names in enumeration order: the indices of a String
/// object's value, then every stored key in insertion order.
pub fn own_keys(object: JSObjectDataPtr<'_>) -> Vec<String> {
    let obj = object.borrow();
    let mut keys = Vec::with_capacity(obj.properties.len());
    if let ObjectKind::String(s) = &obj.kind {
        keys.extend((0..s.len()).map(|i| i.to_string()));
    }
    keys.extend(obj.properties.keys().cloned());
    keys
}

fn reject<'gc>(throw: bool, name: &str) -> EvalResult<'gc, bool> {
    if throw {
        return Err(raise_type_error!("Cannot redefine property: {name}"));
    }
    Ok(false)
}

fn same_accessor<'gc>(a: &Option<JSObjectDataPtr<'gc>>, b: &Value<'gc>) -> bool {
    match (a, b) {
        (None, Value::Undefined) => true,
        (Some(x), Value::Object(y)) => gc_arena::Gc::ptr_eq(*x, *y),
        _ => false,
    }
}

/// Whether every field present in `desc` already holds the same value in `current`.
fn descriptor_matches<'gc>(current: &Property<'gc>, desc: &PropertyDescriptor<'gc>) -> bool {
    if desc.enumerable.is_some_and(|e| e != current.enumerable()) || desc.configurable.is_some_and(|c| c != current.configurable()) {
        return false;
    }
    match current {
        Property::Data { value, writable, .. } => {
            desc.get.is_none()
                && desc.set.is_none()
                && desc.value.as_ref().is_none_or(|v| same_value(v, value))
                && desc.writable.is_none_or(|w| w == *writable)
        }
        Property::Accessor { get, set, .. } => {
            desc.value.is_none()
                && desc.writable.is_none()
                && desc.get.as_ref().is_none_or(|g| same_accessor(get, g))
                && desc.set.as_ref().is_none_or(|s| same_accessor(set, s))
        }
    }
}

impl<'gc> Runtime<'gc> {
    pub fn new_plain_object(&self) -> JSObjectDataPtr<'gc> {
        new_js_object(self.mc, "Object", ObjectKind::Ordinary, Some(self.realm.object_prototype))
    }

    pub fn new_array(&self, values: Vec<Value<'gc>>) -> JSObjectDataPtr<'gc> {
        let array = new_js_object(self.mc, "Array", ObjectKind::Array, Some(self.realm.array_prototype));
        {
            let mut a = array.borrow_mut(self.mc);
            let len = values.len();
            for (i, v) in values.into_iter().enumerate() {
                a.insert(i.to_string(), v, true, true, true);
            }
            a.insert("length", Value::Number(len as f64), true, false, false);
        }
        array
    }

    pub fn new_string_value(&self, s: &str) -> Value<'gc> {
        Value::String(utf8_to_utf16(s))
    }

    /// [[Get]] with `this` bound to the object itself.
    pub fn get(&mut self, object: JSObjectDataPtr<'gc>, name: &str) -> EvalResult<'gc, Value<'gc>> {
        let value = self.get_with_receiver(object, name, Value::Object(object))?;
        if name == "caller" && object.borrow().is_callable() && value.as_object().is_some_and(|f| f.borrow().is_strict_function()) {
            return Err(raise_type_error!("'caller' may not be accessed on strict mode functions"));
        }
        Ok(value)
    }

    /// [[Get]] where a getter receives `receiver` as `this`. Property
    /// references on primitive values pass the primitive itself.
    pub fn get_with_receiver(&mut self, object: JSObjectDataPtr<'gc>, name: &str, receiver: Value<'gc>) -> EvalResult<'gc, Value<'gc>> {
        match get_property(object, name) {
            None => Ok(Value::Undefined),
            Some(Property::Data { value, .. }) => Ok(value),
            Some(Property::Accessor { get: Some(getter), .. }) => self.call(getter, receiver, &[]),
            Some(Property::Accessor { get: None, .. }) => Ok(Value::Undefined),
        }
    }

    /// [[CanPut]]
    pub fn can_put(&self, object: JSObjectDataPtr<'gc>, name: &str) -> bool {
        if let Some(prop) = get_own_property(object, name) {
            return match prop {
                Property::Accessor { set, .. } => set.is_some(),
                Property::Data { writable, .. } => writable,
            };
        }
        let (prototype, extensible) = {
            let obj = object.borrow();
            (obj.prototype, obj.extensible)
        };
        let Some(prototype) = prototype else {
            return extensible;
        };
        match get_property(prototype, name) {
            None => extensible,
            Some(Property::Accessor { set, .. }) => set.is_some(),
            Some(Property::Data { writable, .. }) => extensible && writable,
        }
    }

    /// [[Put]]
    pub fn put(&mut self, object: JSObjectDataPtr<'gc>, name: &str, value: Value<'gc>, throw: bool) -> EvalResult<'gc, ()> {
        if !self.can_put(object, name) {
            if throw {
                return Err(raise_type_error!("Cannot assign to read only property '{name}'"));
            }
            return Ok(());
        }
        if let Some(Property::Data { .. }) = get_own_property(object, name) {
            self.define_own_property(object, name, PropertyDescriptor::value_only(value), throw)?;
            return Ok(());
        }
        if let Some(Property::Accessor { set: Some(setter), .. }) = get_property(object, name) {
            self.call(setter, Value::Object(object), &[value])?;
            return Ok(());
        }
        self.define_own_property(object, name, PropertyDescriptor::new_data(value, true, true, true), throw)?;
        Ok(())
    }

    /// Define an enumerable, writable, configurable data property without
    /// going through setters. Used by built-ins that create result objects.
    pub fn create_data_property(&mut self, object: JSObjectDataPtr<'gc>, name: &str, value: Value<'gc>) -> EvalResult<'gc, bool> {
        self.define_own_property(object, name, PropertyDescriptor::new_data(value, true, true, true), false)
    }

    /// [[Delete]]
    pub fn delete(&mut self, object: JSObjectDataPtr<'gc>, name: &str, throw: bool) -> EvalResult<'gc, bool> {
        let Some(prop) = get_own_property(object, name) else {
            return Ok(true);
        };
        if prop.configurable() {
            let mut obj = object.borrow_mut(self.mc);
            obj.properties.shift_remove(name);
            if let ObjectKind::Arguments(Some(map)) = &mut obj.kind
                && let Some(index) = array_index(name)
                && let Some(slot) = map.names.get_mut(index as usize)
            {
                *slot = None;
            }
            return Ok(true);
        }
        if throw {
            return Err(raise_type_error!("Cannot delete property '{name}'"));
        }
        Ok(false)
    }

    /// [[DefaultValue]]. Without a hint, Date objects prefer String and
    /// everything else prefers Number.
    pub fn default_value(&mut self, object: JSObjectDataPtr<'gc>, hint: Option<PreferredType>) -> EvalResult<'gc, Value<'gc>> {
        let hint = hint.unwrap_or_else(|| {
            if matches!(object.borrow().kind, ObjectKind::Date(_)) {
                PreferredType::String
            } else {
                PreferredType::Number
            }
        });
        let order = match hint {
            PreferredType::String => ["toString", "valueOf"],
            PreferredType::Number => ["valueOf", "toString"],
        };
        for method in order {
            let f = self.get(object, method)?;
            if let Some(func) = f.as_callable() {
                let v = self.call(func, Value::Object(object), &[])?;
                if !matches!(v, Value::Object(_)) {
                    return Ok(v);
                }
            }
        }
        Err(raise_type_error!("Cannot convert object to primitive value"))
    }

    /// [[DefineOwnProperty]], dispatching to the Array and Arguments variants.
    pub fn define_own_property(
        &mut self,
        object: JSObjectDataPtr<'gc>,
        name: &str,
        desc: PropertyDescriptor<'gc>,
        throw: bool,
    ) -> EvalResult<'gc, bool> {
        let (is_array, mapped) = {
            let obj = object.borrow();
            let mapped = match &obj.kind {
                ObjectKind::Arguments(Some(map)) => array_index(name)
                    .and_then(|i| map.names.get(i as usize).cloned().flatten())
                    .map(|param| (map.env, param)),
                _ => None,
            };
            (obj.is_array(), mapped)
        };
        if is_array {
            return self.array_define_own_property(object, name, desc, throw);
        }
        if let Some((env, param)) = mapped {
            return self.arguments_define_own_property(object, name, desc, throw, env, &param);
        }
        self.ordinary_define_own_property(object, name, desc, throw)
    }

    /// The generic [[DefineOwnProperty]] algorithm of ES5 8.12.9.
    pub fn ordinary_define_own_property(
        &mut self,
        object: JSObjectDataPtr<'gc>,
        name: &str,
        desc: PropertyDescriptor<'gc>,
        throw: bool,
    ) -> EvalResult<'gc, bool> {
        let Some(current) = get_own_property(object, name) else {
            if !object.borrow().extensible {
                return reject(throw, name);
            }
            object.borrow_mut(self.mc).properties.insert(name.to_string(), desc.to_property());
            return Ok(true);
        };
        if desc.is_empty() || descriptor_matches(&current, &desc) {
            return Ok(true);
        }
        if !current.configurable() {
            if desc.configurable == Some(true) || desc.enumerable.is_some_and(|e| e != current.enumerable()) {
                return reject(throw, name);
            }
            if !desc.is_generic_descriptor() {
                match &current {
                    _ if current.is_data() != desc.is_data_descriptor() => return reject(throw, name),
                    Property::Data { value, writable, .. } => {
                        if !*writable
                            && (desc.writable == Some(true) || desc.value.as_ref().is_some_and(|v| !same_value(v, value)))
                        {
                            return reject(throw, name);
                        }
                    }
                    Property::Accessor { get, set, .. } => {
                        if desc.get.as_ref().is_some_and(|g| !same_accessor(get, g))
                            || desc.set.as_ref().is_some_and(|s| !same_accessor(set, s))
                        {
                            return reject(throw, name);
                        }
                    }
                }
            }
        }

        let enumerable = desc.enumerable.unwrap_or(current.enumerable());
        let configurable = desc.configurable.unwrap_or(current.configurable());
        let updated = if desc.is_generic_descriptor() {
            match current {
                Property::Data { value, writable, .. } => Property::Data {
                    value,
                    writable,
                    enumerable,
                    configurable,
                },
                Property::Accessor { get, set, .. } => Property::Accessor {
                    get,
                    set,
                    enumerable,
                    configurable,
                },
            }
        } else if desc.is_data_descriptor() {
            let (old_value, old_writable) = match current {
                Property::Data { value, writable, .. } => (value, writable),
                Property::Accessor { .. } => (Value::Undefined, false),
            };
            Property::Data {
                value: desc.value.unwrap_or(old_value),
                writable: desc.writable.unwrap_or(old_writable),
                enumerable,
                configurable,
            }
        } else {
            let (old_get, old_set) = match current {
                Property::Accessor { get, set, .. } => (get, set),
                Property::Data { .. } => (None, None),
            };
            Property::Accessor {
                get: match &desc.get {
                    Some(g) => g.as_object(),
                    None => old_get,
                },
                set: match &desc.set {
                    Some(s) => s.as_object(),
                    None => old_set,
                },
                enumerable,
                configurable,
            }
        };
        object.borrow_mut(self.mc).properties.insert(name.to_string(), updated);
        Ok(true)
    }

    fn array_length(&self, array: JSObjectDataPtr<'gc>) -> (u32, bool) {
        match array.borrow().properties.get("length") {
            Some(Property::Data {
                value: Value::Number(n),
                writable,
                ..
            }) => (*n as u32, *writable),
            _ => (0, true),
        }
    }

    fn array_define_own_property(
        &mut self,
        array: JSObjectDataPtr<'gc>,
        name: &str,
        desc: PropertyDescriptor<'gc>,
        throw: bool,
    ) -> EvalResult<'gc, bool> {
        let (old_len, length_writable) = self.array_length(array);
        if name == "length" {
            let Some(value) = desc.value.clone() else {
                return self.ordinary_define_own_property(array, "length", desc, throw);
            };
            let number = self.to_number(&value)?;
            let new_len = crate::core::number::to_uint32(number);
            if new_len as f64 != number {
                return Err(crate::raise_range_error!("Invalid array length"));
            }
            let mut new_desc = desc;
            new_desc.value = Some(Value::Number(new_len as f64));
            if new_len >= old_len {
                return self.ordinary_define_own_property(array, "length", new_desc, throw);
            }
            if !length_writable {
                return reject(throw, "length");
            }
            let new_writable = new_desc.writable != Some(false);
            if !new_writable {
                new_desc.writable = Some(true);
            }
            if !self.ordinary_define_own_property(array, "length", new_desc.clone(), throw)? {
                return Ok(false);
            }
            let mut doomed: Vec<u32> = array
                .borrow()
                .properties
                .keys()
                .filter_map(|k| array_index(k))
                .filter(|i| *i >= new_len)
                .collect();
            doomed.sort_unstable_by(|a, b| b.cmp(a));
            for index in doomed {
                if !self.delete(array, &index.to_string(), false)? {
                    new_desc.value = Some(Value::Number(index as f64 + 1.0));
                    if !new_writable {
                        new_desc.writable = Some(false);
                    }
                    self.ordinary_define_own_property(array, "length", new_desc, false)?;
                    return reject(throw, "length");
                }
            }
            if !new_writable {
                let freeze = PropertyDescriptor {
                    writable: Some(false),
                    ..Default::default()
                };
                self.ordinary_define_own_property(array, "length", freeze, false)?;
            }
            return Ok(true);
        }
        if let Some(index) = array_index(name) {
            if index >= old_len && !length_writable {
                return reject(throw, name);
            }
            if !self.ordinary_define_own_property(array, name, desc, false)? {
                return reject(throw, name);
            }
            if index >= old_len
                && let Some(Property::Data { value, .. }) = array.borrow_mut(self.mc).properties.get_mut("length")
            {
                *value = Value::Number(index as f64 + 1.0);
            }
            return Ok(true);
        }
        self.ordinary_define_own_property(array, name, desc, throw)
    }

    /// ES5 8.10.5 ToPropertyDescriptor.
    pub fn to_property_descriptor(&mut self, value: &Value<'gc>) -> EvalResult<'gc, PropertyDescriptor<'gc>> {
        let Value::Object(obj) = value else {
            return Err(raise_type_error!("Property description must be an object"));
        };
        let obj = *obj;
        let mut desc = PropertyDescriptor::default();
        if has_property(obj, "enumerable") {
            desc.enumerable = Some(crate::core::to_boolean(&self.get(obj, "enumerable")?));
        }
        if has_property(obj, "configurable") {
            desc.configurable = Some(crate::core::to_boolean(&self.get(obj, "configurable")?));
        }
        if has_property(obj, "value") {
            desc.value = Some(self.get(obj, "value")?);
        }
        if has_property(obj, "writable") {
            desc.writable = Some(crate::core::to_boolean(&self.get(obj, "writable")?));
        }
        for field in ["get", "set"] {
            if has_property(obj, field) {
                let f = self.get(obj, field)?;
                if !f.is_undefined() && f.as_callable().is_none() {
                    return Err(raise_type_error!("{} must be a function: {f:?}", if field == "get" { "Getter" } else { "Setter" }));
                }
                if field == "get" {
                    desc.get = Some(f);
                } else {
                    desc.set = Some(f);
                }
            }
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(raise_type_error!(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute"
            ));
        }
        Ok(desc)
    }

    /// ES5 8.10.4 FromPropertyDescriptor.
    pub fn from_property_descriptor(&mut self, prop: Option<Property<'gc>>) -> Value<'gc> {
        let Some(prop) = prop else {
            return Value::Undefined;
        };
        let result = self.new_plain_object();
        let mut obj = result.borrow_mut(self.mc);
        match &prop {
            Property::Data { value, writable, .. } => {
                obj.insert("value", value.clone(), true, true, true);
                obj.insert("writable", Value::Boolean(*writable), true, true, true);
            }
            Property::Accessor { get, set, .. } => {
                obj.insert("get", get.map_or(Value::Undefined, Value::Object), true, true, true);
                obj.insert("set", set.map_or(Value::Undefined, Value::Object), true, true, true);
            }
        }
        obj.insert("enumerable", Value::Boolean(prop.enumerable()), true, true, true);
        obj.insert("configurable", Value::Boolean(prop.configurable()), true, true, true);
        drop(obj);
        Value::Object(result)
    }
}
