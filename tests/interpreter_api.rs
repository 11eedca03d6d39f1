use es5_interp::*;

// Initialize logger for this integration test binary so `RUST_LOG` is honored.
#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    evaluate_script(script, None::<&std::path::Path>).unwrap()
}

#[cfg(test)]
mod interpreter_tests {
    use super::*;

    #[test]
    fn test_completion_values_as_js_values() {
        let mut interp = Interpreter::new().unwrap();
        assert_eq!(interp.execute_string("1 + 1", None).unwrap(), JSValue::Number(2.0));
        assert_eq!(interp.execute_string("'a' + 'b'", None).unwrap(), JSValue::String("ab".to_string()));
        assert_eq!(interp.execute_string("null", None).unwrap(), JSValue::Null);
        assert_eq!(interp.execute_string("var x = 1;", None).unwrap(), JSValue::Undefined);
        assert_eq!(interp.execute_string("1 < 2", None).unwrap(), JSValue::Boolean(true));
        assert_eq!(
            interp.execute_string("[1, 2]", None).unwrap(),
            JSValue::Object {
                class: "Array".to_string(),
                display: "1,2".to_string()
            }
        );
    }

    #[test]
    fn test_state_persists_between_calls() {
        let mut interp = Interpreter::new().unwrap();
        interp.execute_string("var counter = 0; function bump() { return ++counter; }", None).unwrap();
        interp.execute_string("bump(); bump();", None).unwrap();
        assert_eq!(interp.execute_string("bump()", None).unwrap().to_string(), "3");
    }

    #[test]
    fn test_interpreters_are_independent() {
        let mut a = Interpreter::new().unwrap();
        let mut b = Interpreter::new().unwrap();
        a.execute_string("var shared = 'a';", None).unwrap();
        assert_eq!(b.execute_string("typeof shared", None).unwrap().to_string(), "undefined");
    }

    #[test]
    fn test_error_after_error_keeps_interpreter_usable() {
        let mut interp = Interpreter::new().unwrap();
        assert!(interp.execute_string("throw new Error('x')", None).is_err());
        assert!(interp.execute_string("var = 1", None).is_err());
        assert_eq!(interp.execute_string("40 + 2", None).unwrap(), JSValue::Number(42.0));
    }

    #[test]
    fn test_syntax_errors() {
        match evaluate_script("var x = ;", None::<&std::path::Path>) {
            Err(err @ JSError::SyntaxError { .. }) => assert_eq!(err.name(), Some("SyntaxError")),
            other => panic!("expected a syntax error, got {other:?}"),
        }
        assert!(matches!(
            evaluate_script("'use strict'; with ({}) {}", None::<&std::path::Path>),
            Err(JSError::SyntaxError { .. })
        ));
        assert!(matches!(
            evaluate_script("'use strict'; var eval = 1;", None::<&std::path::Path>),
            Err(JSError::SyntaxError { .. })
        ));
        assert!(matches!(evaluate_script("return 1", None::<&std::path::Path>), Err(JSError::SyntaxError { .. })));
        assert!(matches!(evaluate_script("break;", None::<&std::path::Path>), Err(JSError::SyntaxError { .. })));
    }

    #[test]
    fn test_configured_call_depth() {
        let options = InterpreterOptions {
            max_call_depth: 20,
            ..InterpreterOptions::default()
        };
        let mut interp = Interpreter::with_options(options).unwrap();
        let result = interp.execute_string("function d(n) { return n ? d(n - 1) : 'bottom'; } d(50)", None);
        match result {
            Err(JSError::Throw { name, .. }) => assert_eq!(name, "RangeError"),
            other => panic!("expected a RangeError, got {other:?}"),
        }
        assert_eq!(interp.execute_string("d(5)", None).unwrap().to_string(), "bottom");
    }

    #[test]
    fn test_default_depth_on_a_small_thread() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let mut interp = Interpreter::new().unwrap();
                interp
                    .execute_string("function down(n) { return n ? 1 + down(n - 1) : 0; }", None)
                    .unwrap();
                let deep = interp.execute_string("down(450)", None).unwrap();
                let overflow = interp.execute_string("try { down(100000); } catch (e) { e.name }", None).unwrap();
                (deep, overflow)
            })
            .unwrap();
        let (deep, overflow) = handle.join().unwrap();
        assert_eq!(deep, JSValue::Number(450.0));
        assert_eq!(overflow, JSValue::String("RangeError".to_string()));
    }

    #[test]
    fn test_eval_created_functions_do_not_accumulate() {
        let mut interp = Interpreter::new().unwrap();
        let script = "var n = 0; for (var i = 0; i < 200; i++) { n += eval('(function () { var a = ' + i + '; return a; })')(); } n";
        assert_eq!(interp.execute_string(script, None).unwrap(), JSValue::Number(19900.0));
        assert_eq!(interp.execute_string(script, None).unwrap(), JSValue::Number(19900.0));
    }

    #[test]
    fn test_execute_file() {
        let path = std::env::temp_dir().join(format!("es5_interp_test_{}.js", std::process::id()));
        std::fs::write(&path, "var parts = ['from', 'file']; parts.join(' ')").unwrap();
        let mut interp = Interpreter::new().unwrap();
        let value = interp.execute_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(value, JSValue::String("from file".to_string()));
        assert!(matches!(interp.execute_file("/definitely/not/here.js"), Err(JSError::IoError(_))));
    }

    #[test]
    fn test_parse_program_is_exposed() {
        let program = parse_program("var a = 1; function f() {}", None, false).unwrap();
        assert_eq!(program.body.len(), 2);
        let err = parse_program("var 1a;", Some("input.js"), false).unwrap_err();
        assert!(err.line >= 1);
        assert_eq!(err.filename.as_deref(), Some("input.js"));
        assert!(err.message.contains("in input.js on line 1"), "{}", err.message);
        let anonymous = parse_program("var = 1;", None, false).unwrap_err();
        assert_eq!(anonymous.filename, None);
        assert!(anonymous.message.contains("on line 1"));
    }
}

#[cfg(test)]
mod eval_tests {
    use super::*;

    #[test]
    fn test_direct_eval_sees_local_scope() {
        assert_eq!(eval("function f() { var local = 5; return eval('local * 2'); } f()"), "10");
        assert_eq!(eval("function f() { eval('var created = 1'); return created; } f()"), "1");
    }

    #[test]
    fn test_indirect_eval_uses_global_scope() {
        let script = r#"
            var x = 'global';
            function f() { var x = 'local'; var e = eval; return e('x'); }
            f()
        "#;
        assert_eq!(eval(script), "global");
    }

    #[test]
    fn test_strict_eval_has_own_variables() {
        assert_eq!(eval("'use strict'; eval('var inner = 1'); typeof inner"), "undefined");
        assert_eq!(eval("eval('var outer = 1'); typeof outer"), "number");
    }

    #[test]
    fn test_eval_edge_cases() {
        assert_eq!(eval("eval(42)"), "42");
        assert_eq!(eval("eval('')"), "undefined");
        assert_eq!(eval("try { eval('1 +'); } catch (e) { e instanceof SyntaxError }"), "true");
        assert_eq!(eval("eval('var d = 1'); delete d"), "true");
    }
}

#[cfg(test)]
mod error_object_tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        assert_eq!(eval("new Error('m').message"), "m");
        assert_eq!(eval("Error('called').message"), "called");
        assert_eq!(eval("String(new RangeError('r'))"), "RangeError: r");
        assert_eq!(eval("String(new Error())"), "Error");
        assert_eq!(eval("new TypeError() instanceof Error"), "true");
        assert_eq!(eval("URIError.prototype.name"), "URIError");
    }

    #[test]
    fn test_error_to_string_uses_name_and_message() {
        assert_eq!(eval("var e = new Error('msg'); e.name = 'Custom'; e.toString()"), "Custom: msg");
        assert_eq!(eval("Error.prototype.toString.call({name: 'N', message: ''})"), "N");
    }
}
