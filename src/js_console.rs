use crate::core::{EvalResult, MutationContext, ObjectKind, Realm, Runtime, Value, define_native_methods, new_js_object};
use crate::error::JSError;
use crate::unicode::utf16_to_utf8;
use std::io::Write;

pub fn initialize_console<'gc>(mc: &MutationContext<'gc>, realm: &Realm<'gc>) -> Result<(), JSError> {
    let console = new_js_object(mc, "Object", ObjectKind::Ordinary, Some(realm.object_prototype));
    define_native_methods(mc, realm, console, "console", &[("log", 0), ("info", 0), ("warn", 0), ("error", 0)]);
    realm.global.borrow_mut(mc).insert_builtin("console", Value::Object(console));
    Ok(())
}

/// The line `console.log` writes: ToString of every argument, space separated.
fn format_line<'gc>(rt: &mut Runtime<'gc>, args: &[Value<'gc>]) -> EvalResult<'gc, String> {
    let mut parts = Vec::with_capacity(args.len());
    for a in args {
        parts.push(utf16_to_utf8(&rt.to_string(a)?));
    }
    Ok(parts.join(" "))
}

pub fn handle_console_call<'gc>(
    rt: &mut Runtime<'gc>,
    name: &str,
    _this: Value<'gc>,
    args: &[Value<'gc>],
    _construct: bool,
) -> EvalResult<'gc, Value<'gc>> {
    let line = format_line(rt, args)?;
    let written = match name {
        "console.log" | "console.info" => writeln!(std::io::stdout().lock(), "{line}"),
        "console.warn" | "console.error" => writeln!(std::io::stderr().lock(), "{line}"),
        _ => return Err(crate::eval_error_here!(format!("unknown console built-in {name}")).into()),
    };
    if let Err(e) = written {
        log::warn!("{name} could not write its output: {e}");
    }
    Ok(Value::Undefined)
}
