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
mod string_tests {
    use super::*;

    #[test]
    fn test_char_access() {
        assert_eq!(eval("'abc'.charAt(1)"), "b");
        assert_eq!(eval("'abc'.charAt(5)"), "");
        assert_eq!(eval("'abc'.charCodeAt(0)"), "97");
        assert_eq!(eval("'abc'.charCodeAt(9)"), "NaN");
        assert_eq!(eval("'abc'[2]"), "c");
        assert_eq!(eval("String.fromCharCode(72, 105)"), "Hi");
    }

    #[test]
    fn test_search_methods() {
        assert_eq!(eval("'hello world'.indexOf('o')"), "4");
        assert_eq!(eval("'hello world'.indexOf('o', 5)"), "7");
        assert_eq!(eval("'hello world'.lastIndexOf('o')"), "7");
        assert_eq!(eval("'hello'.indexOf('')"), "0");
        assert_eq!(eval("'hello'.indexOf('z')"), "-1");
        assert_eq!(eval("'abc'.search(/c/)"), "2");
    }

    #[test]
    fn test_substring_family() {
        assert_eq!(eval("'abcdef'.slice(1, -2)"), "bcd");
        assert_eq!(eval("'abcdef'.substring(4, 1)"), "bcd");
        assert_eq!(eval("'abcdef'.substring(-3)"), "abcdef");
        assert_eq!(eval("'abcdef'.substr(-3, 2)"), "de");
        assert_eq!(eval("'abc'.concat(1, 'x')"), "abc1x");
    }

    #[test]
    fn test_case_and_trim() {
        assert_eq!(eval("'MiXeD'.toLowerCase() + 'MiXeD'.toUpperCase()"), "mixedMIXED");
        assert_eq!(eval("'  padded \\n'.trim()"), "padded");
        assert_eq!(eval("'\\u00a0\\ufeffx\\t'.trim()"), "x");
    }

    #[test]
    fn test_split() {
        assert_eq!(eval("'a,b,,c'.split(',').length"), "4");
        assert_eq!(eval("'abc'.split('').join('|')"), "a|b|c");
        assert_eq!(eval("'a1b22c'.split(/\\d+/).join('|')"), "a|b|c");
        assert_eq!(eval("'a1b2c'.split(/(\\d)/).join('|')"), "a|1|b|2|c");
        assert_eq!(eval("'a,b,c'.split(',', 2).join('|')"), "a|b");
        assert_eq!(eval("'abc'.split().length"), "1");
        assert_eq!(eval("''.split(',').length"), "1");
        assert_eq!(eval("''.split('').length"), "0");
    }

    #[test]
    fn test_replace_with_strings() {
        assert_eq!(eval("'aaa'.replace('a', 'b')"), "baa");
        assert_eq!(eval("'aaa'.replace(/a/g, 'b')"), "bbb");
        assert_eq!(eval("'John Smith'.replace(/(\\w+)\\s(\\w+)/, '$2, $1')"), "Smith, John");
        assert_eq!(eval("'abc'.replace('b', '[$&|$`|$\\'|$$]')"), "a[b|a|c|$]c");
        assert_eq!(eval("'x'.replace(/(x)/, '$2$1')"), "$2x");
    }

    #[test]
    fn test_replace_with_function() {
        let script = r#"
            'a1b2'.replace(/([a-z])(\d)/g, function (m, letter, digit, offset, s) {
                return letter.toUpperCase() + (digit * 2) + offset;
            })
        "#;
        assert_eq!(eval(script), "A20B42");
    }

    #[test]
    fn test_match() {
        assert_eq!(eval("'a1b22c333'.match(/\\d+/g).join(',')"), "1,22,333");
        assert_eq!(eval("var m = 'key=value'.match(/(\\w+)=(\\w+)/); m[2] + m.index"), "value0");
        assert_eq!(eval("'abc'.match(/z/g)"), "null");
    }

    #[test]
    fn test_string_objects() {
        assert_eq!(eval("typeof new String('x')"), "object");
        assert_eq!(eval("new String('abc').length"), "3");
        assert_eq!(eval("var s = new String('ab'); s[1]"), "b");
        assert_eq!(eval("String(null) + String(undefined) + String(12.5)"), "nullundefined12.5");
        assert_eq!(eval("'abc'.length = 5; 'abc'.length"), "3");
    }

    #[test]
    fn test_locale_compare() {
        assert_eq!(eval("'a'.localeCompare('b') < 0"), "true");
        assert_eq!(eval("'b'.localeCompare('a') > 0"), "true");
        assert_eq!(eval("'\\u00e9'.localeCompare('e\\u0301')"), "0");
    }
}

#[cfg(test)]
mod regexp_tests {
    use super::*;

    #[test]
    fn test_literal_properties() {
        assert_eq!(eval("var r = /ab+c/gi; [r.source, r.global, r.ignoreCase, r.multiline, r.lastIndex].join(',')"), "ab+c,true,true,false,0");
        assert_eq!(eval("String(/a\\/b/m)"), "/a\\/b/m");
        assert_eq!(eval("new RegExp('').source"), "(?:)");
    }

    #[test]
    fn test_exec_and_captures() {
        assert_eq!(eval("var m = /(\\d+)-(\\d+)?/.exec('x 12- y'); [m[0], m[1], typeof m[2], m.index, m.input].join('|')"), "12-|12|undefined|2|x 12- y");
        assert_eq!(eval("/a/.exec('b')"), "null");
    }

    #[test]
    fn test_global_last_index() {
        let script = r#"
            var r = /o/g;
            var s = 'foo boo';
            var found = [];
            while (r.exec(s) !== null) found.push(r.lastIndex);
            found.join(',') + '|' + r.lastIndex
        "#;
        assert_eq!(eval(script), "2,3,6,7|0");
    }

    #[test]
    fn test_flags_and_errors() {
        assert_eq!(eval("/HELLO/i.test('say hello')"), "true");
        assert_eq!(eval("/^b/m.test('a\\nb')"), "true");
        assert_eq!(eval("/^b/.test('a\\nb')"), "false");
        assert_eq!(eval("try { new RegExp('a', 'gg'); } catch (e) { e.name }"), "SyntaxError");
        assert_eq!(eval("try { new RegExp('('); } catch (e) { e.name }"), "SyntaxError");
        assert_eq!(eval("try { new RegExp(/a/, 'g'); } catch (e) { e.name }"), "TypeError");
    }

    #[test]
    fn test_constructor_copies() {
        assert_eq!(eval("var r = /a/g; RegExp(r) === r"), "true");
        assert_eq!(eval("var r = /a/g; var c = new RegExp(r); (c !== r) + ',' + c.global"), "true,true");
    }

    #[test]
    fn test_literal_creates_new_object_each_evaluation() {
        assert_eq!(eval("function f() { return /x/; } f() === f()"), "false");
    }

    #[test]
    fn test_prototype_is_a_regular_expression() {
        assert_eq!(eval("Object.prototype.toString.call(RegExp.prototype)"), "[object Object]");
        assert_eq!(eval("RegExp.prototype.test('anything')"), "true");
        assert_eq!(eval("RegExp.prototype.exec('abc')[0].length"), "0");
        assert_eq!(eval("RegExp.prototype.toString()"), "/(?:)/");
    }

    #[test]
    fn test_backreferences_and_classes() {
        assert_eq!(eval("/(a)\\1/.test('aa')"), "true");
        assert_eq!(eval("/[^a-c]/.exec('abcd')[0]"), "d");
        assert_eq!(eval("/\\bfoo\\b/.test('a foo b')"), "true");
    }
}
