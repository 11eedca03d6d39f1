use crate::core::{
    EvalResult, ExecutionContext, FunctionKind, FunctionNode, Gc, JSObjectDataPtr, LexEnvPtr, MutationContext, ObjectKind, Property,
    PropertyDescriptor, Realm, Runtime, ScriptCode, Statement, Value, collect_declarations, get_property, new_declarative_environment, new_js_object,
    parse_program,
};
use crate::unicode::utf16_to_utf8;
use crate::{eval_error_here, raise_type_error};
use std::rc::Rc;

/// Argument `i`, or undefined when fewer were passed.
pub fn arg<'gc>(args: &[Value<'gc>], i: usize) -> Value<'gc> {
    args.get(i).cloned().unwrap_or(Value::Undefined)
}

fn new_native_function<'gc>(
    mc: &MutationContext<'gc>,
    function_prototype: JSObjectDataPtr<'gc>,
    name: &str,
    length: u32,
    constructor: bool,
) -> JSObjectDataPtr<'gc> {
    let kind = FunctionKind::Native {
        name: name.to_string(),
        constructor,
    };
    let f = new_js_object(mc, "Function", ObjectKind::Function(kind), Some(function_prototype));
    f.borrow_mut(mc).insert("length", Value::Number(length as f64), false, false, false);
    f
}

/// Built-in function object. Calls are routed by `name` through [`Runtime::call_native`].
pub fn create_native_function<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    name: &str,
    length: u32,
    constructor: bool,
) -> JSObjectDataPtr<'gc> {
    new_native_function(mc, realm.function_prototype, name, length, constructor)
}

/// Install non-enumerable built-in methods named `prefix.method` on `target`.
pub fn define_native_methods<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    target: JSObjectDataPtr<'gc>,
    prefix: &str,
    methods: &[(&str, u32)],
) {
    for (method, length) in methods {
        let f = create_native_function(mc, realm, &format!("{prefix}.{method}"), *length, false);
        target.borrow_mut(mc).insert_builtin(*method, Value::Object(f));
    }
}

/// Install a constructor on the global object and link it with its prototype.
pub fn define_constructor<'gc>(
    mc: &MutationContext<'gc>,
    realm: &Realm<'gc>,
    name: &str,
    length: u32,
    prototype: JSObjectDataPtr<'gc>,
) -> JSObjectDataPtr<'gc> {
    let ctor = create_native_function(mc, realm, name, length, true);
    ctor.borrow_mut(mc).insert("prototype", Value::Object(prototype), false, false, false);
    prototype.borrow_mut(mc).insert_builtin("constructor", Value::Object(ctor));
    realm.global.borrow_mut(mc).insert_builtin(name, Value::Object(ctor));
    ctor
}

/// The three kinds of code that go through declaration binding instantiation.
pub enum DeclarationContext<'a, 'gc> {
    Global,
    Eval,
    Function {
        callee: JSObjectDataPtr<'gc>,
        node: &'a FunctionNode,
        args: &'a [Value<'gc>],
    },
}

impl<'gc> Runtime<'gc> {
    /// Function object for a declaration or expression closing over `scope`.
    pub fn create_function(&mut self, node: &Rc<FunctionNode>, scope: LexEnvPtr<'gc>) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
        let kind = FunctionKind::Script {
            code: ScriptCode(node.clone()),
            scope,
        };
        let f = new_js_object(self.mc, "Function", ObjectKind::Function(kind), Some(self.realm.function_prototype));
        let prototype = self.new_plain_object();
        prototype.borrow_mut(self.mc).insert_builtin("constructor", Value::Object(f));
        {
            let mut func = f.borrow_mut(self.mc);
            func.insert("length", Value::Number(node.params.len() as f64), false, false, false);
            func.insert("prototype", Value::Object(prototype), true, false, false);
        }
        if node.strict {
            let thrower = Value::Object(self.realm.throw_type_error);
            for name in ["caller", "arguments"] {
                let desc = PropertyDescriptor::new_accessor(thrower.clone(), thrower.clone(), false, false);
                self.define_own_property(f, name, desc, false)?;
            }
        }
        Ok(f)
    }

    /// Function expression. A named one sees its own name through an
    /// immutable binding in an extra environment.
    pub fn create_function_expression(&mut self, node: &Rc<FunctionNode>) -> EvalResult<'gc, JSObjectDataPtr<'gc>> {
        let scope = self.lexical_environment();
        let Some(name) = &node.name else {
            return self.create_function(node, scope);
        };
        let env = new_declarative_environment(self.mc, Some(scope));
        self.create_immutable_binding(env, name);
        let closure = self.create_function(node, env)?;
        self.initialize_immutable_binding(env, name, Value::Object(closure));
        Ok(closure)
    }

    /// [[Call]]
    pub fn call(&mut self, f: JSObjectDataPtr<'gc>, this: Value<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
        let kind = match &f.borrow().kind {
            ObjectKind::Function(kind) => kind.clone(),
            _ => return Err(raise_type_error!("object is not a function")),
        };
        self.with_call_depth(|rt| match kind {
            FunctionKind::Script { code, scope } => rt.call_script_function(f, &code.0, scope, this, args),
            FunctionKind::Native { name, .. } => rt.call_native(&name, this, args, false),
            FunctionKind::Bound {
                target,
                this: bound_this,
                args: bound_args,
            } => {
                let mut all = bound_args;
                all.extend_from_slice(args);
                rt.call(target, bound_this, &all)
            }
        })
    }

    /// Call `f`, raising a TypeError when it is not callable.
    pub fn call_value(&mut self, f: &Value<'gc>, this: Value<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
        match f.as_callable() {
            Some(func) => self.call(func, this, args),
            None => Err(raise_type_error!("{f:?} is not a function")),
        }
    }

    fn call_script_function(
        &mut self,
        callee: JSObjectDataPtr<'gc>,
        node: &Rc<FunctionNode>,
        scope: LexEnvPtr<'gc>,
        this: Value<'gc>,
        args: &[Value<'gc>],
    ) -> EvalResult<'gc, Value<'gc>> {
        log::trace!("call {} ({} args)", node.name.as_deref().unwrap_or("<anonymous>"), args.len());
        let this_binding = if node.strict {
            this
        } else {
            match this {
                Value::Undefined | Value::Null => Value::Object(self.realm.global),
                Value::Object(_) => this,
                primitive => Value::Object(self.to_object(&primitive)?),
            }
        };
        let env = new_declarative_environment(self.mc, Some(scope));
        let ctx = ExecutionContext {
            lexical_environment: env,
            variable_environment: env,
            this_binding,
            strict: node.strict,
        };
        self.with_context(ctx, |rt| {
            let kind = DeclarationContext::Function { callee, node, args };
            rt.declaration_binding_instantiation(&node.body, node.strict, kind)?;
            let completion = rt.execute_statements(&node.body)?;
            Ok(completion.return_value())
        })
    }

    /// [[Construct]]
    pub fn construct(&mut self, f: JSObjectDataPtr<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
        let kind = match &f.borrow().kind {
            ObjectKind::Function(kind) => kind.clone(),
            _ => return Err(raise_type_error!("object is not a constructor")),
        };
        self.with_call_depth(|rt| match kind {
            FunctionKind::Bound {
                target, args: bound_args, ..
            } => {
                let mut all = bound_args;
                all.extend_from_slice(args);
                rt.construct(target, &all)
            }
            FunctionKind::Native { name, constructor: true } => rt.call_native(&name, Value::Undefined, args, true),
            FunctionKind::Native { name, .. } => Err(raise_type_error!("{name} is not a constructor")),
            FunctionKind::Script { code, scope } => {
                let prototype = match rt.get(f, "prototype")? {
                    Value::Object(p) => p,
                    _ => rt.realm.object_prototype,
                };
                let object = new_js_object(rt.mc, "Object", ObjectKind::Ordinary, Some(prototype));
                let result = rt.call_script_function(f, &code.0, scope, Value::Object(object), args)?;
                Ok(match result {
                    Value::Object(_) => result,
                    _ => Value::Object(object),
                })
            }
        })
    }

    /// `new f(...)` where `f` may be any value.
    pub fn construct_value(&mut self, f: &Value<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, Value<'gc>> {
        match f {
            Value::Object(o) if o.borrow().is_constructor() => self.construct(*o, args),
            _ => Err(raise_type_error!("{f:?} is not a constructor")),
        }
    }

    /// [[HasInstance]]
    pub fn has_instance(&mut self, f: JSObjectDataPtr<'gc>, value: &Value<'gc>) -> EvalResult<'gc, bool> {
        let bound_target = match &f.borrow().kind {
            ObjectKind::Function(FunctionKind::Bound { target, .. }) => Some(*target),
            _ => None,
        };
        if let Some(target) = bound_target {
            return self.has_instance(target, value);
        }
        let Value::Object(object) = value else {
            return Ok(false);
        };
        let Value::Object(prototype) = self.get(f, "prototype")? else {
            return Err(raise_type_error!("Function has non-object prototype in instanceof check"));
        };
        let mut current = object.borrow().prototype;
        while let Some(p) = current {
            if Gc::ptr_eq(p, prototype) {
                return Ok(true);
            }
            current = p.borrow().prototype;
        }
        Ok(false)
    }

    /// Route a built-in call to its family handler by the name prefix.
    pub fn call_native(&mut self, name: &str, this: Value<'gc>, args: &[Value<'gc>], construct: bool) -> EvalResult<'gc, Value<'gc>> {
        let family = name.split('.').next().unwrap_or(name);
        match family {
            "Object" => crate::js_object::handle_object_call(self, name, this, args, construct),
            "Function" => crate::js_function::handle_function_call(self, name, this, args, construct),
            "Array" => crate::js_array::handle_array_call(self, name, this, args, construct),
            "String" => crate::js_string::handle_string_call(self, name, this, args, construct),
            "Boolean" => crate::js_boolean::handle_boolean_call(self, name, this, args, construct),
            "Number" => crate::js_number::handle_number_call(self, name, this, args, construct),
            "Math" => crate::js_math::handle_math_call(self, name, this, args, construct),
            "Date" => crate::js_date::handle_date_call(self, name, this, args, construct),
            "RegExp" => crate::js_regexp::handle_regexp_call(self, name, this, args, construct),
            "JSON" => crate::js_json::handle_json_call(self, name, this, args, construct),
            "console" => crate::js_console::handle_console_call(self, name, this, args, construct),
            "global" => crate::js_global::handle_global_call(self, name, this, args, construct),
            "ThrowTypeError" => Err(raise_type_error!(
                "'caller', 'callee', and 'arguments' properties may not be accessed on strict mode functions or the arguments objects for calls to them"
            )),
            "Error" | "EvalError" | "RangeError" | "ReferenceError" | "SyntaxError" | "TypeError" | "URIError" => {
                crate::core::handle_error_call(self, name, this, args, construct)
            }
            _ => Err(eval_error_here!(format!("unknown built-in {name}")).into()),
        }
    }

    /// Declaration binding instantiation (ES5 10.5) into the running
    /// context's variable environment.
    pub fn declaration_binding_instantiation(
        &mut self,
        body: &[Statement],
        strict: bool,
        kind: DeclarationContext<'_, 'gc>,
    ) -> EvalResult<'gc, ()> {
        let env = self.variable_environment();
        let deletable = matches!(kind, DeclarationContext::Eval);
        if let DeclarationContext::Function { node, args, .. } = &kind {
            for (i, param) in node.params.iter().enumerate() {
                if !self.has_binding(env, param) {
                    self.create_mutable_binding(env, param, false)?;
                }
                self.set_mutable_binding(env, param, arg(args, i), strict)?;
            }
        }

        let scope = match &kind {
            DeclarationContext::Function { node, .. } => Rc::clone(&node.scope),
            _ => Rc::new(collect_declarations(body)),
        };
        for func in &scope.functions {
            let Some(name) = &func.name else { continue };
            let closure = self.create_function(func, env)?;
            if !self.has_binding(env, name) {
                self.create_mutable_binding(env, name, deletable)?;
            } else if Gc::ptr_eq(env, self.realm.global_env) {
                match get_property(self.realm.global, name) {
                    Some(existing) if existing.configurable() => {
                        let desc = PropertyDescriptor::new_data(Value::Undefined, true, true, deletable);
                        self.define_own_property(self.realm.global, name, desc, true)?;
                    }
                    Some(Property::Data {
                        writable: true,
                        enumerable: true,
                        ..
                    }) => {}
                    _ => return Err(raise_type_error!("Cannot redefine global function {name}")),
                }
            }
            self.set_mutable_binding(env, name, Value::Object(closure), strict)?;
        }

        if let DeclarationContext::Function { callee, node, args } = kind
            && !self.has_binding(env, "arguments")
        {
            let arguments = self.create_arguments_object(callee, node, args, env, strict)?;
            if strict {
                self.create_immutable_binding(env, "arguments");
                self.initialize_immutable_binding(env, "arguments", Value::Object(arguments));
            } else {
                self.create_mutable_binding(env, "arguments", false)?;
                self.set_mutable_binding(env, "arguments", Value::Object(arguments), false)?;
            }
        }

        for name in &scope.vars {
            if !self.has_binding(env, name) {
                self.create_mutable_binding(env, name, deletable)?;
            }
        }
        Ok(())
    }

    /// Evaluate `source` as eval code. `direct` calls run in the caller's
    /// context, indirect ones in the global context.
    pub fn perform_eval(&mut self, source: &Value<'gc>, direct: bool) -> EvalResult<'gc, Value<'gc>> {
        let Value::String(text) = source else {
            return Ok(source.clone());
        };
        let caller_strict = direct && self.strict();
        let program = parse_program(&utf16_to_utf8(text), None, caller_strict)?;
        let mut ctx = if direct { self.context() } else { self.global_context(false) };
        ctx.strict = program.strict;
        if program.strict {
            let env = new_declarative_environment(self.mc, Some(ctx.lexical_environment));
            ctx.lexical_environment = env;
            ctx.variable_environment = env;
        }
        log::trace!("eval ({}, strict: {}) of {} statements", if direct { "direct" } else { "indirect" }, program.strict, program.body.len());
        let result = self.with_context(ctx, |rt| {
            rt.declaration_binding_instantiation(&program.body, program.strict, DeclarationContext::Eval)?;
            rt.execute_statements(&program.body)
        });
        Ok(result?.value.unwrap_or(Value::Undefined))
    }
}
