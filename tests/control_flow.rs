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
mod loop_tests {
    use super::*;

    #[test]
    fn test_for_loop() {
        assert_eq!(eval("var sum = 0; for (var i = 1; i <= 10; i++) { sum += i; } sum"), "55");
    }

    #[test]
    fn test_while_and_do_while() {
        assert_eq!(eval("var n = 0; while (n < 5) n += 2; n"), "6");
        assert_eq!(eval("var n = 10; do { n++; } while (n < 5); n"), "11");
    }

    #[test]
    fn test_break_and_continue() {
        let script = r#"
            var out = [];
            for (var i = 0; i < 10; i++) {
                if (i % 2) continue;
                if (i > 6) break;
                out.push(i);
            }
            out.join(',')
        "#;
        assert_eq!(eval(script), "0,2,4,6");
    }

    #[test]
    fn test_labelled_break_and_continue() {
        let script = r#"
            var pairs = [];
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j === 1) continue outer;
                    if (i === 2) break outer;
                    pairs.push(i + '' + j);
                }
            }
            pairs.join(' ')
        "#;
        assert_eq!(eval(script), "00 10");
    }

    #[test]
    fn test_labelled_block() {
        assert_eq!(eval("var x = 0; block: { x = 1; break block; x = 2; } x"), "1");
    }

    #[test]
    fn test_completion_value_of_loops() {
        assert_eq!(eval("for (var i = 0; i < 3; i++) { i * 10; }"), "20");
        assert_eq!(eval("var k = 0; while (k < 2) { k++; 'done'; }"), "done");
    }

    #[test]
    fn test_for_in_enumeration_order() {
        let script = r#"
            var o = {b: 1, a: 2, 2: 'x', 1: 'y'};
            var keys = [];
            for (var k in o) keys.push(k);
            keys.join(',')
        "#;
        assert_eq!(eval(script), "b,a,2,1");
        let mixed = r#"
            var o = {b: 1};
            o[2] = 1;
            o.a = 1;
            var s = '';
            for (var k in o) s += k + ',';
            s
        "#;
        assert_eq!(eval(mixed), "b,2,a,");
        assert_eq!(eval("var s = ''; for (var k in new String('ab')) s += k; s"), "01");
    }

    #[test]
    fn test_for_in_skips_shadowed_and_non_enumerable() {
        let script = r#"
            function P() { this.own = 1; this.shared = 2; }
            P.prototype.shared = 3;
            P.prototype.inherited = 4;
            var keys = [];
            for (var k in new P()) keys.push(k);
            keys.join(',')
        "#;
        assert_eq!(eval(script), "own,shared,inherited");
        assert_eq!(eval("var n = 0; for (var k in [1, 2, 3]) n++; n"), "3");
        assert_eq!(eval("var n = 0; for (var k in null) n++; n"), "0");
    }

    #[test]
    fn test_for_in_skips_deleted_keys() {
        let script = r#"
            var o = {a: 1, b: 2, c: 3};
            var seen = [];
            for (var k in o) { seen.push(k); delete o.c; }
            seen.join(',')
        "#;
        assert_eq!(eval(script), "a,b");
    }
}

#[cfg(test)]
mod switch_tests {
    use super::*;

    #[test]
    fn test_switch_fallthrough() {
        let script = r#"
            function f(x) {
                var r = '';
                switch (x) {
                    case 1: r += 'one';
                    case 2: r += 'two'; break;
                    case 3: r += 'three';
                }
                return r;
            }
            f(1) + '|' + f(2) + '|' + f(3) + '|' + f(4)
        "#;
        assert_eq!(eval(script), "onetwo|two|three|");
    }

    #[test]
    fn test_switch_default_in_middle() {
        let script = r#"
            function f(x) {
                var r = [];
                switch (x) {
                    case 'a': r.push('a');
                    default: r.push('d');
                    case 'b': r.push('b');
                }
                return r.join('');
            }
            f('a') + ',' + f('b') + ',' + f('z')
        "#;
        assert_eq!(eval(script), "adb,b,db");
    }

    #[test]
    fn test_switch_uses_strict_equality() {
        assert_eq!(eval("var r = 'none'; switch (1) { case '1': r = 'string'; break; case 1: r = 'number'; } r"), "number");
    }
}

#[cfg(test)]
mod try_catch_tests {
    use super::*;

    #[test]
    fn test_catch_thrown_primitive() {
        assert_eq!(eval("try { throw 42; } catch (e) { e }"), "42");
        assert_eq!(eval("try { throw 'boom'; } catch (e) { e }"), "boom");
    }

    #[test]
    fn test_catch_native_errors() {
        assert_eq!(eval("try { null.x; } catch (e) { e instanceof TypeError }"), "true");
        assert_eq!(eval("try { missing; } catch (e) { e.name }"), "ReferenceError");
        assert_eq!(eval("try { new Array(-1); } catch (e) { e instanceof RangeError }"), "true");
    }

    #[test]
    fn test_finally_runs_and_overrides() {
        assert_eq!(eval("function f() { try { return 1; } finally { return 2; } } f()"), "2");
        assert_eq!(
            eval("var log = []; function f() { try { return 'r'; } finally { log.push('f'); } } f() + log.join('')"),
            "rf"
        );
        assert_eq!(eval("function f() { try { throw 1; } finally { return 'swallowed'; } } f()"), "swallowed");
    }

    #[test]
    fn test_catch_scope_is_local() {
        assert_eq!(eval("var e = 'outer'; try { throw 'inner'; } catch (e) { } e"), "outer");
        assert_eq!(eval("try { throw 1; } catch (e) { var v = e + 1; } v"), "2");
    }

    #[test]
    fn test_rethrow_from_catch() {
        let script = r#"
            var trail = [];
            try {
                try { throw new Error('first'); }
                catch (e) { trail.push(e.message); throw new Error('second'); }
                finally { trail.push('finally'); }
            } catch (e) { trail.push(e.message); }
            trail.join(',')
        "#;
        assert_eq!(eval(script), "first,finally,second");
    }

    #[test]
    fn test_uncaught_errors_reach_host() {
        match evaluate_script("throw new TypeError('bad thing')", None::<&std::path::Path>) {
            Err(JSError::Throw { name, message, display }) => {
                assert_eq!(name, "TypeError");
                assert_eq!(message, "bad thing");
                assert_eq!(display, "TypeError: bad thing");
            }
            other => panic!("expected an uncaught throw, got {other:?}"),
        }
        match evaluate_script("throw 7", None::<&std::path::Path>) {
            Err(JSError::Throw { name, display, .. }) => {
                assert_eq!(name, "number");
                assert_eq!(display, "7");
            }
            other => panic!("expected an uncaught throw, got {other:?}"),
        }
    }
}
