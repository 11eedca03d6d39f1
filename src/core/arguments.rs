use crate::core::{
    ArgumentsMap, EvalResult, FunctionNode, JSObjectDataPtr, LexEnvPtr, ObjectKind, PropertyDescriptor, Runtime, Value, array_index,
    declarative_binding_value, new_js_object,
};
use crate::raise_type_error;
use std::collections::HashSet;

impl<'gc> Runtime<'gc> {
    /// The `arguments` object of a function call (ES5 10.6). In non-strict
    /// code each index that names a formal parameter stays linked to the
    /// parameter binding until it is deleted or redefined.
    pub fn create_arguments_object(
        &mut self,
        callee: JSObjectDataPtr<'gc>,
        node: &FunctionNode,
        args: &[Value<'gc>],
        env: LexEnvPtr<'gc>,
        strict: bool,
    ) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
        let object = new_js_object(self.mc, "Arguments", ObjectKind::Arguments(None), Some(self.realm.object_prototype));
        let mut names = vec![None; args.len()];
        {
            let mut obj = object.borrow_mut(self.mc);
            obj.insert("length", Value::Number(args.len() as f64), true, false, true);
            let mut mapped = HashSet::new();
            for index in (0..args.len()).rev() {
                obj.insert(index.to_string(), args[index].clone(), true, true, true);
                if !strict
                    && let Some(param) = node.params.get(index)
                    && mapped.insert(param.as_str())
                {
                    names[index] = Some(param.clone());
                }
            }
            if names.iter().any(Option::is_some) {
                obj.kind = ObjectKind::Arguments(Some(ArgumentsMap { env, names }));
            }
        }
        if strict {
            let thrower = Value::Object(self.realm.throw_type_error);
            for name in ["caller", "callee"] {
                let desc = PropertyDescriptor::new_accessor(thrower.clone(), thrower.clone(), false, false);
                self.define_own_property(object, name, desc, false)?;
            }
        } else {
            object.borrow_mut(self.mc).insert("callee", Value::Object(callee), true, false, true);
        }
        Ok(object)
    }

    /// [[DefineOwnProperty]] of an arguments object for an index that is still mapped.
    pub(crate) fn arguments_define_own_property(
        &mut self,
        object: JSObjectDataPtr<'gc>,
        name: &str,
        mut desc: PropertyDescriptor<'gc>,
        throw: bool,
        env: LexEnvPtr<'gc>,
        param: &str,
    ) -> EvalResult<'gc, bool> {
        // Freezing the index keeps the parameter's current value.
        if desc.is_data_descriptor() && desc.value.is_none() && desc.writable == Some(false) {
            desc.value = declarative_binding_value(env, param);
        }
        if !self.ordinary_define_own_property(object, name, desc.clone(), false)? {
            if throw {
                return Err(raise_type_error!("Cannot redefine property: {name}"));
            }
            return Ok(false);
        }
        if desc.is_accessor_descriptor() {
            self.unmap_argument(object, name);
            return Ok(true);
        }
        if let Some(value) = desc.value {
            self.set_mutable_binding(env, param, value, throw)?;
        }
        if desc.writable == Some(false) {
            self.unmap_argument(object, name);
        }
        Ok(true)
    }

    fn unmap_argument(&mut self, object: JSObjectDataPtr<'gc>, name: &str) {
        if let ObjectKind::Arguments(Some(map)) = &mut object.borrow_mut(self.mc).kind
            && let Some(index) = array_index(name)
            && let Some(slot) = map.names.get_mut(index as usize)
        {
            *slot = None;
        }
    }
}
