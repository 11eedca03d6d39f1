use crate::JSError;
use crate::core::{
    Collect, FunctionKind, JSObjectDataPtr, LexEnvPtr, MutationContext, ObjectKind, Value, create_native_function, initialize_error_constructors,
    new_js_object, new_object_environment,
};

/// Global object, global environment and the intrinsic prototypes shared by
/// every script run in one interpreter.
#[derive(Clone, Copy, Collect)]
#[collect(no_drop)]
pub struct Realm<'gc> {
    pub global: JSObjectDataPtr<'gc>,
    pub global_env: LexEnvPtr<'gc>,
    pub object_prototype: JSObjectDataPtr<'gc>,
    pub function_prototype: JSObjectDataPtr<'gc>,
    pub array_prototype: JSObjectDataPtr<'gc>,
    pub string_prototype: JSObjectDataPtr<'gc>,
    pub boolean_prototype: JSObjectDataPtr<'gc>,
    pub number_prototype: JSObjectDataPtr<'gc>,
    pub date_prototype: JSObjectDataPtr<'gc>,
    pub regexp_prototype: JSObjectDataPtr<'gc>,
    pub error_prototype: JSObjectDataPtr<'gc>,
    pub eval_error_prototype: JSObjectDataPtr<'gc>,
    pub range_error_prototype: JSObjectDataPtr<'gc>,
    pub reference_error_prototype: JSObjectDataPtr<'gc>,
    pub syntax_error_prototype: JSObjectDataPtr<'gc>,
    pub type_error_prototype: JSObjectDataPtr<'gc>,
    pub uri_error_prototype: JSObjectDataPtr<'gc>,
    /// The built-in `eval`, compared against to detect direct eval calls.
    pub eval_function: JSObjectDataPtr<'gc>,
    /// The shared [[ThrowTypeError]] accessor of strict functions and arguments.
    pub throw_type_error: JSObjectDataPtr<'gc>,
}

impl<'gc> Realm<'gc> {
    /// Build the global object with every built-in installed.
    pub fn new(mc: &MutationContext<'gc>) -> Result<Realm<'gc>, JSError> {
        let object_prototype = new_js_object(mc, "Object", ObjectKind::Ordinary, None);
        let function_prototype = new_js_object(
            mc,
            "Function",
            ObjectKind::Function(FunctionKind::Native {
                name: "Function.prototype".to_string(),
                constructor: false,
            }),
            Some(object_prototype),
        );
        function_prototype.borrow_mut(mc).insert("length", Value::Number(0.0), false, false, false);
        let proto = |class: &'static str, kind: ObjectKind<'gc>| new_js_object(mc, class, kind, Some(object_prototype));
        let array_prototype = proto("Array", ObjectKind::Array);
        array_prototype.borrow_mut(mc).insert("length", Value::Number(0.0), true, false, false);
        let string_prototype = proto("String", ObjectKind::String(Vec::new()));
        string_prototype.borrow_mut(mc).insert("length", Value::Number(0.0), false, false, false);
        let error_prototype = proto("Error", ObjectKind::Error);
        let native_error = || new_js_object(mc, "Error", ObjectKind::Error, Some(error_prototype));
        let global = new_js_object(mc, "global", ObjectKind::Ordinary, Some(object_prototype));
        let global_env = new_object_environment(mc, global, false, None);

        let mut realm = Realm {
            global,
            global_env,
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            boolean_prototype: proto("Boolean", ObjectKind::Boolean(false)),
            number_prototype: proto("Number", ObjectKind::Number(0.0)),
            date_prototype: proto("Date", ObjectKind::Date(f64::NAN)),
            regexp_prototype: proto("Object", ObjectKind::Ordinary),
            error_prototype,
            eval_error_prototype: native_error(),
            range_error_prototype: native_error(),
            reference_error_prototype: native_error(),
            syntax_error_prototype: native_error(),
            type_error_prototype: native_error(),
            uri_error_prototype: native_error(),
            eval_function: function_prototype,
            throw_type_error: function_prototype,
        };
        realm.eval_function = create_native_function(mc, &realm, "global.eval", 1, false);
        realm.throw_type_error = create_native_function(mc, &realm, "ThrowTypeError", 0, false);
        realm.throw_type_error.borrow_mut(mc).extensible = false;

        crate::js_object::initialize_object(mc, &realm)?;
        crate::js_function::initialize_function(mc, &realm)?;
        crate::js_array::initialize_array(mc, &realm)?;
        crate::js_string::initialize_string(mc, &realm)?;
        crate::js_boolean::initialize_boolean(mc, &realm)?;
        crate::js_number::initialize_number(mc, &realm)?;
        crate::js_math::initialize_math(mc, &realm)?;
        crate::js_date::initialize_date(mc, &realm)?;
        crate::js_regexp::initialize_regexp(mc, &realm)?;
        initialize_error_constructors(mc, &realm)?;
        crate::js_json::initialize_json(mc, &realm)?;
        crate::js_console::initialize_console(mc, &realm)?;
        crate::js_global::initialize_global(mc, &realm)?;
        log::debug!("realm ready with {} global properties", global.borrow().properties.len());
        Ok(realm)
    }
}
