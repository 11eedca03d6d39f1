use crate::core::{
    Collect, EvalResult, GcPtr, JSObjectDataPtr, MutationContext, PropertyDescriptor, Runtime, Value, has_property, new_gc_cell_ptr,
};
use crate::{raise_reference_error, raise_type_error};
use std::collections::HashMap;

pub type LexEnvPtr<'gc> = GcPtr<'gc, LexicalEnvironment<'gc>>;

#[derive(Clone, Collect)]
#[collect(no_drop)]
pub struct Binding<'gc> {
    pub value: Value<'gc>,
    pub mutable: bool,
    pub deletable: bool,
    pub initialized: bool,
}

#[derive(Collect)]
#[collect(no_drop)]
pub enum EnvironmentRecord<'gc> {
    Declarative(HashMap<String, Binding<'gc>>),
    Object {
        object: JSObjectDataPtr<'gc>,
        /// Set for `with` environments: calls through them pass the object as `this`.
        provide_this: bool,
    },
}

#[derive(Collect)]
#[collect(no_drop)]
pub struct LexicalEnvironment<'gc> {
    pub record: EnvironmentRecord<'gc>,
    pub outer: Option<LexEnvPtr<'gc>>,
}

pub fn new_declarative_environment<'gc>(mc: &MutationContext<'gc>, outer: Option<LexEnvPtr<'gc>>) -> LexEnvPtr<'gc> {
    new_gc_cell_ptr(
        mc,
        LexicalEnvironment {
            record: EnvironmentRecord::Declarative(HashMap::new()),
            outer,
        },
    )
}

pub fn new_object_environment<'gc>(
    mc: &MutationContext<'gc>,
    object: JSObjectDataPtr<'gc>,
    provide_this: bool,
    outer: Option<LexEnvPtr<'gc>>,
) -> LexEnvPtr<'gc> {
    new_gc_cell_ptr(
        mc,
        LexicalEnvironment {
            record: EnvironmentRecord::Object { object, provide_this },
            outer,
        },
    )
}

/// Current value of a declarative binding, without any checks.
pub(crate) fn declarative_binding_value<'gc>(env: LexEnvPtr<'gc>, name: &str) -> Option<Value<'gc>> {
    match &env.borrow().record {
        EnvironmentRecord::Declarative(bindings) => bindings.get(name).map(|b| b.value.clone()),
        EnvironmentRecord::Object { .. } => None,
    }
}

#[derive(Clone)]
pub enum ReferenceBase<'gc> {
    Unresolvable,
    Environment(LexEnvPtr<'gc>),
    Value(Value<'gc>),
}

#[derive(Clone)]
pub struct Reference<'gc> {
    pub base: ReferenceBase<'gc>,
    pub name: String,
    pub strict: bool,
}

impl<'gc> Reference<'gc> {
    pub fn is_unresolvable(&self) -> bool {
        matches!(self.base, ReferenceBase::Unresolvable)
    }
}

impl<'gc> Runtime<'gc> {
    pub fn has_binding(&self, env: LexEnvPtr<'gc>, name: &str) -> bool {
        match &env.borrow().record {
            EnvironmentRecord::Declarative(bindings) => bindings.contains_key(name),
            EnvironmentRecord::Object { object, .. } => has_property(*object, name),
        }
    }

    pub fn create_mutable_binding(&mut self, env: LexEnvPtr<'gc>, name: &str, deletable: bool) -> EvalResult<'gc, ()> {
        let object = match &mut env.borrow_mut(self.mc).record {
            EnvironmentRecord::Declarative(bindings) => {
                bindings.insert(
                    name.to_string(),
                    Binding {
                        value: Value::Undefined,
                        mutable: true,
                        deletable,
                        initialized: true,
                    },
                );
                return Ok(());
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        let desc = PropertyDescriptor::new_data(Value::Undefined, true, true, deletable);
        self.define_own_property(object, name, desc, true)?;
        Ok(())
    }

    pub fn create_immutable_binding(&mut self, env: LexEnvPtr<'gc>, name: &str) {
        if let EnvironmentRecord::Declarative(bindings) = &mut env.borrow_mut(self.mc).record {
            bindings.insert(
                name.to_string(),
                Binding {
                    value: Value::Undefined,
                    mutable: false,
                    deletable: false,
                    initialized: false,
                },
            );
        }
    }

    pub fn initialize_immutable_binding(&mut self, env: LexEnvPtr<'gc>, name: &str, value: Value<'gc>) {
        if let EnvironmentRecord::Declarative(bindings) = &mut env.borrow_mut(self.mc).record
            && let Some(binding) = bindings.get_mut(name)
        {
            binding.value = value;
            binding.initialized = true;
        }
    }

    pub fn set_mutable_binding(&mut self, env: LexEnvPtr<'gc>, name: &str, value: Value<'gc>, strict: bool) -> EvalResult<'gc, ()> {
        let object = match &mut env.borrow_mut(self.mc).record {
            EnvironmentRecord::Declarative(bindings) => {
                match bindings.get_mut(name) {
                    Some(binding) if binding.mutable => binding.value = value,
                    Some(_) if strict => return Err(raise_type_error!("Assignment to constant variable '{name}'")),
                    _ => {}
                }
                return Ok(());
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        self.put(object, name, value, strict)
    }

    pub fn get_binding_value(&mut self, env: LexEnvPtr<'gc>, name: &str, strict: bool) -> EvalResult<'gc, Value<'gc>> {
        let object = match &env.borrow().record {
            EnvironmentRecord::Declarative(bindings) => {
                return match bindings.get(name) {
                    Some(binding) if binding.initialized => Ok(binding.value.clone()),
                    _ if strict => Err(raise_reference_error!("{name} is not initialized")),
                    _ => Ok(Value::Undefined),
                };
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        if !has_property(object, name) {
            if strict {
                return Err(raise_reference_error!("{name} is not defined"));
            }
            return Ok(Value::Undefined);
        }
        self.get(object, name)
    }

    pub fn delete_binding(&mut self, env: LexEnvPtr<'gc>, name: &str) -> EvalResult<'gc, bool> {
        let object = match &mut env.borrow_mut(self.mc).record {
            EnvironmentRecord::Declarative(bindings) => {
                let deletable = bindings.get(name).map(|b| b.deletable);
                return Ok(match deletable {
                    None => true,
                    Some(false) => false,
                    Some(true) => {
                        bindings.remove(name);
                        true
                    }
                });
            }
            EnvironmentRecord::Object { object, .. } => *object,
        };
        self.delete(object, name, false)
    }

    pub fn implicit_this_value(&self, env: LexEnvPtr<'gc>) -> Value<'gc> {
        match &env.borrow().record {
            EnvironmentRecord::Object {
                object,
                provide_this: true,
            } => Value::Object(*object),
            _ => Value::Undefined,
        }
    }

    /// Resolve `name` along the environment chain starting at `env`.
    pub fn get_identifier_reference(&self, env: Option<LexEnvPtr<'gc>>, name: &str, strict: bool) -> Reference<'gc> {
        let mut current = env;
        while let Some(e) = current {
            if self.has_binding(e, name) {
                return Reference {
                    base: ReferenceBase::Environment(e),
                    name: name.to_string(),
                    strict,
                };
            }
            current = e.borrow().outer;
        }
        Reference {
            base: ReferenceBase::Unresolvable,
            name: name.to_string(),
            strict,
        }
    }
}
