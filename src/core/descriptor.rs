use crate::core::{Collect, JSObjectDataPtr, Value};

/// A stored, complete property: data or accessor.
#[derive(Clone, Collect)]
#[collect(no_drop)]
pub enum Property<'gc> {
    Data {
        value: Value<'gc>,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<JSObjectDataPtr<'gc>>,
        set: Option<JSObjectDataPtr<'gc>>,
        enumerable: bool,
        configurable: bool,
    },
}

impl<'gc> Property<'gc> {
    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => *configurable,
        }
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Property::Data { .. })
    }
}

/// A Rust representation of a property descriptor used by the engine.
/// Fields are optional to support "partial" descriptors (as accepted by DefineProperty).
/// `get`/`set` hold `Undefined` or a function object when present.
#[derive(Clone, Debug, Default)]
pub struct PropertyDescriptor<'gc> {
    // Data fields
    pub value: Option<Value<'gc>>,
    pub writable: Option<bool>,
    // Accessor fields
    pub get: Option<Value<'gc>>,
    pub set: Option<Value<'gc>>,
    // Common flags
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

fn accessor_value<'gc>(f: &Option<JSObjectDataPtr<'gc>>) -> Value<'gc> {
    match f {
        Some(o) => Value::Object(*o),
        None => Value::Undefined,
    }
}

impl<'gc> PropertyDescriptor<'gc> {
    /// Construct a full data descriptor from explicit values
    pub fn new_data(value: Value<'gc>, writable: bool, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            value: Some(value),
            writable: Some(writable),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Default::default()
        }
    }

    /// Descriptor that only carries a value, used by [[Put]] on an existing data property.
    pub fn value_only(value: Value<'gc>) -> Self {
        PropertyDescriptor {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn new_accessor(get: Value<'gc>, set: Value<'gc>, enumerable: bool, configurable: bool) -> Self {
        PropertyDescriptor {
            get: Some(get),
            set: Some(set),
            enumerable: Some(enumerable),
            configurable: Some(configurable),
            ..Default::default()
        }
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    pub fn is_empty(&self) -> bool {
        self.is_generic_descriptor() && self.enumerable.is_none() && self.configurable.is_none()
    }

    pub fn from_property(p: &Property<'gc>) -> Self {
        match p {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => Self::new_data(value.clone(), *writable, *enumerable, *configurable),
            Property::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => Self::new_accessor(accessor_value(get), accessor_value(set), *enumerable, *configurable),
        }
    }

    /// Complete property built from this descriptor, absent fields defaulting to false/undefined.
    pub fn to_property(&self) -> Property<'gc> {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor_descriptor() {
            Property::Accessor {
                get: self.get.as_ref().and_then(Value::as_object),
                set: self.set.as_ref().and_then(Value::as_object),
                enumerable,
                configurable,
            }
        } else {
            Property::Data {
                value: self.value.clone().unwrap_or(Value::Undefined),
                writable: self.writable.unwrap_or(false),
                enumerable,
                configurable,
            }
        }
    }
}
