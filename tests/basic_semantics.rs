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
mod arithmetic_tests {
    use super::*;

    #[test]
    fn test_operator_precedence() {
        assert_eq!(eval("1 + 2 * 3 - 4 / 2"), "5");
        assert_eq!(eval("(1 + 2) * 3"), "9");
        assert_eq!(eval("7 % 3 + -7 % 3"), "0");
    }

    #[test]
    fn test_string_concatenation_and_coercion() {
        assert_eq!(eval("'a' + 1 + 2"), "a12");
        assert_eq!(eval("1 + 2 + 'a'"), "3a");
        assert_eq!(eval("'3' * '4'"), "12");
        assert_eq!(eval("[] + {}"), "[object Object]");
        assert_eq!(eval("'5' - 2"), "3");
    }

    #[test]
    fn test_number_edge_values() {
        assert_eq!(eval("1 / 0"), "Infinity");
        assert_eq!(eval("-1 / 0"), "-Infinity");
        assert_eq!(eval("0 / 0"), "NaN");
        assert_eq!(eval("1 / -0"), "-Infinity");
        assert_eq!(eval("0.1 + 0.2"), "0.30000000000000004");
        assert_eq!(eval("1e21"), "1e+21");
        assert_eq!(eval("123456789012345680000"), "123456789012345680000");
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(eval("5 & 3"), "1");
        assert_eq!(eval("5 | 3"), "7");
        assert_eq!(eval("5 ^ 3"), "6");
        assert_eq!(eval("~5"), "-6");
        assert_eq!(eval("-16 >> 2"), "-4");
        assert_eq!(eval("-16 >>> 28"), "15");
        assert_eq!(eval("1 << 31"), "-2147483648");
    }

    #[test]
    fn test_increment_and_compound_assignment() {
        assert_eq!(eval("var i = 1; var j = i++ + ++i; j + ',' + i"), "4,3");
        assert_eq!(eval("var x = 10; x -= 3; x *= 2; x"), "14");
        assert_eq!(eval("var s = 'a'; s += 'b'; s"), "ab");
        assert_eq!(eval("var o = {n: '1'}; o.n++; typeof o.n"), "number");
    }
}

#[cfg(test)]
mod typing_tests {
    use super::*;

    #[test]
    fn test_typeof() {
        assert_eq!(eval("typeof undefined"), "undefined");
        assert_eq!(eval("typeof null"), "object");
        assert_eq!(eval("typeof 1"), "number");
        assert_eq!(eval("typeof ''"), "string");
        assert_eq!(eval("typeof function () {}"), "function");
        assert_eq!(eval("typeof notDeclared"), "undefined");
        assert_eq!(eval("typeof /x/"), "object");
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("null == undefined"), "true");
        assert_eq!(eval("null === undefined"), "false");
        assert_eq!(eval("'1' == 1"), "true");
        assert_eq!(eval("true == 1"), "true");
        assert_eq!(eval("NaN == NaN"), "false");
        assert_eq!(eval("({}) == '[object Object]'"), "true");
        assert_eq!(eval("null == 0"), "false");
    }

    #[test]
    fn test_relational_comparisons() {
        assert_eq!(eval("'b' > 'a'"), "true");
        assert_eq!(eval("'10' < '9'"), "true");
        assert_eq!(eval("'10' < 9"), "false");
        assert_eq!(eval("NaN < 1 || NaN >= 1"), "false");
        assert_eq!(eval("'a' in {a: 1}"), "true");
        assert_eq!(eval("[] instanceof Array"), "true");
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(eval("0 || 'x'"), "x");
        assert_eq!(eval("1 && 'y'"), "y");
        assert_eq!(eval("'' && 'z'"), "");
        assert_eq!(eval("!!'0'"), "true");
    }

    #[test]
    fn test_void_comma_and_conditional() {
        assert_eq!(eval("void 0"), "undefined");
        assert_eq!(eval("(1, 2, 3)"), "3");
        assert_eq!(eval("1 ? 'yes' : 'no'"), "yes");
    }
}

#[cfg(test)]
mod literal_tests {
    use super::*;

    #[test]
    fn test_string_escapes() {
        assert_eq!(eval(r#""a\tb".length"#), "3");
        assert_eq!(eval(r#""\x41B""#), "AB");
        assert_eq!(eval(r#"'line\
continued'"#), "linecontinued");
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(eval("0x1F"), "31");
        assert_eq!(eval(".5 + 1."), "1.5");
        assert_eq!(eval("1e3"), "1000");
        assert_eq!(eval("010"), "8");
        assert_eq!(eval("0x1234ABCD"), "305441741");
        assert_eq!(eval("1.e2"), "100");
        assert_eq!(eval("0.001"), "0.001");
    }

    #[test]
    fn test_octal_strings_follow_strictness() {
        assert_eq!(eval("Number('010')"), "8");
        assert_eq!(eval("'010' * 1 + ',' + Number('019')"), "8,19");
        assert_eq!(eval("(function () { 'use strict'; return Number('010'); })()"), "10");
        assert_eq!(eval("'use strict'; '0777' - 0"), "777");
    }

    #[test]
    fn test_object_and_array_literals() {
        assert_eq!(eval("var o = {a: 1, 'b': 2, 3: 'c'}; o.a + o.b + o[3]"), "3c");
        assert_eq!(eval("[1, , 3].length"), "3");
        assert_eq!(eval("[1, 2, ].length"), "2");
        assert_eq!(eval("1 in [1, , 3]"), "false");
        assert_eq!(eval("var o = { get x() { return 7; } }; o.x"), "7");
    }

    #[test]
    fn test_automatic_semicolon_insertion() {
        assert_eq!(eval("var a = 1\nvar b = 2\na + b"), "3");
        assert_eq!(eval("function f() { return\n 1 } f()"), "undefined");
        assert_eq!(eval("var i = 1\ni\n++\ni\ni"), "2");
    }
}

#[cfg(test)]
mod scoping_tests {
    use super::*;

    #[test]
    fn test_var_and_function_hoisting() {
        assert_eq!(eval("var r = typeof f; function f() {} r"), "function");
        assert_eq!(eval("var r = x; var x = 5; String(r)"), "undefined");
    }

    #[test]
    fn test_closures_capture_variables() {
        let script = r#"
            function counter() {
                var n = 0;
                return function () { return ++n; };
            }
            var c = counter();
            c(); c();
            c()
        "#;
        assert_eq!(eval(script), "3");
    }

    #[test]
    fn test_with_statement() {
        assert_eq!(eval("var o = {a: 2}; var r; with (o) { r = a * 3; a = 5; } r + ',' + o.a"), "6,5");
    }

    #[test]
    fn test_undeclared_assignment_creates_global() {
        assert_eq!(eval("function f() { leaked = 3; } f(); leaked"), "3");
    }

    #[test]
    fn test_strict_undeclared_assignment_throws() {
        assert_eq!(eval("'use strict'; try { x = 1; } catch (e) { e.name + ':' + typeof x }"), "ReferenceError:undefined");
        match evaluate_script("'use strict'; x = 1", None::<&std::path::Path>) {
            Err(JSError::Throw { name, .. }) => assert_eq!(name, "ReferenceError"),
            other => panic!("expected a ReferenceError, got {other:?}"),
        }
    }

    #[test]
    fn test_delete() {
        assert_eq!(eval("var o = {a: 1}; delete o.a; 'a' in o"), "false");
        assert_eq!(eval("var v = 1; delete v"), "false");
        assert_eq!(eval("g = 1; delete g"), "true");
    }
}
