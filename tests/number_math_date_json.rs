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
mod number_tests {
    use super::*;

    #[test]
    fn test_number_conversion() {
        assert_eq!(eval("Number('  42  ')"), "42");
        assert_eq!(eval("Number('0x10')"), "16");
        assert_eq!(eval("Number('')"), "0");
        assert_eq!(eval("Number('12px')"), "NaN");
        assert_eq!(eval("Number(true) + Number(null)"), "1");
        assert_eq!(eval("Number(undefined)"), "NaN");
        assert_eq!(eval("+'-Infinity'"), "-Infinity");
    }

    #[test]
    fn test_number_constants() {
        assert_eq!(eval("Number.MAX_VALUE"), "1.7976931348623157e+308");
        assert_eq!(eval("Number.MIN_VALUE"), "5e-324");
        assert_eq!(eval("Number.NaN !== Number.NaN"), "true");
        assert_eq!(eval("Number.MAX_VALUE = 1; Number.MAX_VALUE > 1"), "true");
    }

    #[test]
    fn test_to_string_radix() {
        assert_eq!(eval("(255).toString(16)"), "ff");
        assert_eq!(eval("(255).toString(2)"), "11111111");
        assert_eq!(eval("(-8).toString(8)"), "-10");
        assert_eq!(eval("try { (1).toString(1); } catch (e) { e.name }"), "RangeError");
    }

    #[test]
    fn test_fixed_exponential_precision() {
        assert_eq!(eval("(1.005).toFixed(2)"), "1.00");
        assert_eq!(eval("(2.5).toFixed()"), "3");
        assert_eq!(eval("(1234.5678).toFixed(1)"), "1234.6");
        assert_eq!(eval("(123.456).toExponential(2)"), "1.23e+2");
        assert_eq!(eval("(0.00015).toExponential()"), "1.5e-4");
        assert_eq!(eval("(123.456).toPrecision(4)"), "123.5");
        assert_eq!(eval("(0.000123).toPrecision(2)"), "0.00012");
        assert_eq!(eval("(123456).toPrecision(2)"), "1.2e+5");
        assert_eq!(eval("try { (1).toFixed(21); } catch (e) { e.name }"), "RangeError");
        assert_eq!(eval("try { (1).toPrecision(0); } catch (e) { e.name }"), "RangeError");
    }

    #[test]
    fn test_number_objects() {
        assert_eq!(eval("typeof new Number(5)"), "object");
        assert_eq!(eval("new Number(5) + 1"), "6");
        assert_eq!(eval("try { Number.prototype.valueOf.call('5'); } catch (e) { e.name }"), "TypeError");
    }

    #[test]
    fn test_boolean() {
        assert_eq!(eval("Boolean('') + ',' + Boolean('0') + ',' + Boolean({})"), "false,true,true");
        assert_eq!(eval("new Boolean(false) ? 'truthy' : 'falsy'"), "truthy");
        assert_eq!(eval("new Boolean(false).toString()"), "false");
        assert_eq!(eval("true.valueOf()"), "true");
    }
}

#[cfg(test)]
mod global_function_tests {
    use super::*;

    #[test]
    fn test_parse_int_and_float() {
        assert_eq!(eval("parseInt('42px')"), "42");
        assert_eq!(eval("parseInt('0x1A')"), "26");
        assert_eq!(eval("parseInt('ff', 16)"), "255");
        assert_eq!(eval("parseInt('  -17')"), "-17");
        assert_eq!(eval("parseInt('abc')"), "NaN");
        assert_eq!(eval("parseFloat('3.25e2xyz')"), "325");
        assert_eq!(eval("parseFloat('.5')"), "0.5");
        assert_eq!(eval("parseFloat('Infinityx')"), "Infinity");
    }

    #[test]
    fn test_is_nan_is_finite() {
        assert_eq!(eval("isNaN('abc') + ',' + isNaN('12')"), "true,false");
        assert_eq!(eval("isFinite('12') + ',' + isFinite(1 / 0)"), "true,false");
    }

    #[test]
    fn test_uri_functions() {
        assert_eq!(eval("encodeURIComponent('a b&c/d')"), "a%20b%26c%2Fd");
        assert_eq!(eval("encodeURI('http://x.y/a b?q=1#f')"), "http://x.y/a%20b?q=1#f");
        assert_eq!(eval("encodeURIComponent('\\u00e9\\u20ac')"), "%C3%A9%E2%82%AC");
        assert_eq!(eval("decodeURIComponent('%C3%A9%2F')"), "\u{e9}/");
        assert_eq!(eval("decodeURI('%2F%20')"), "%2F ");
        assert_eq!(eval("try { decodeURIComponent('%E0%A4%A'); } catch (e) { e.name }"), "URIError");
        assert_eq!(eval("try { encodeURIComponent('\\ud800'); } catch (e) { e.name }"), "URIError");
    }

    #[test]
    fn test_global_value_properties() {
        assert_eq!(eval("NaN = 1; typeof NaN === 'number' && NaN !== NaN"), "true");
        assert_eq!(eval("undefined = 1; typeof undefined"), "undefined");
        assert_eq!(eval("Infinity"), "Infinity");
        assert_eq!(eval("Object.prototype.toString.call(this)"), "[object global]");
    }
}

#[cfg(test)]
mod math_tests {
    use super::*;

    #[test]
    fn test_math_functions() {
        assert_eq!(eval("Math.max(1, 5, 3)"), "5");
        assert_eq!(eval("Math.min()"), "Infinity");
        assert_eq!(eval("Math.max(1, NaN)"), "NaN");
        assert_eq!(eval("Math.round(2.5) + ',' + Math.round(-2.5) + ',' + Math.round(-2.6)"), "3,-2,-3");
        assert_eq!(eval("1 / Math.round(-0.4)"), "-Infinity");
        assert_eq!(eval("Math.pow(2, 10)"), "1024");
        assert_eq!(eval("Math.pow(1, Infinity)"), "NaN");
        assert_eq!(eval("Math.floor(-1.5) + Math.ceil(-1.5)"), "-3");
        assert_eq!(eval("Math.abs(-3) + Math.sqrt(16)"), "7");
    }

    #[test]
    fn test_math_random_range() {
        assert_eq!(eval("var ok = true; for (var i = 0; i < 100; i++) { var r = Math.random(); ok = ok && r >= 0 && r < 1; } ok"), "true");
    }

    #[test]
    fn test_math_constants_are_read_only() {
        assert_eq!(eval("Math.PI = 3; Math.PI > 3.14"), "true");
        assert_eq!(eval("Object.prototype.toString.call(Math)"), "[object Math]");
    }
}

#[cfg(test)]
mod date_tests {
    use super::*;

    #[test]
    fn test_utc_components() {
        let script = r#"
            var d = new Date(Date.UTC(2020, 1, 29, 13, 45, 30, 250));
            [d.getUTCFullYear(), d.getUTCMonth(), d.getUTCDate(), d.getUTCDay(),
             d.getUTCHours(), d.getUTCMinutes(), d.getUTCSeconds(), d.getUTCMilliseconds()].join(',')
        "#;
        assert_eq!(eval(script), "2020,1,29,6,13,45,30,250");
    }

    #[test]
    fn test_iso_string_round_trip() {
        assert_eq!(eval("new Date(0).toISOString()"), "1970-01-01T00:00:00.000Z");
        assert_eq!(eval("Date.parse('2000-01-01T00:00:00.000Z')"), "946684800000");
        assert_eq!(eval("Date.parse('2000-01-01')"), "946684800000");
        assert_eq!(eval("var d = new Date(1234567890123); Date.parse(d.toISOString()) === d.getTime()"), "true");
        assert_eq!(eval("var d = new Date(1234567890000); Date.parse(d.toString()) === d.getTime()"), "true");
        assert_eq!(eval("var d = new Date(1234567890000); Date.parse(d.toUTCString()) === d.getTime()"), "true");
    }

    #[test]
    fn test_invalid_dates() {
        assert_eq!(eval("new Date(NaN).getTime()"), "NaN");
        assert_eq!(eval("String(new Date('not a date'))"), "Invalid Date");
        assert_eq!(eval("try { new Date(NaN).toISOString(); } catch (e) { e.name }"), "RangeError");
        assert_eq!(eval("new Date(8.64e15 + 1).getTime()"), "NaN");
        assert_eq!(eval("new Date(NaN).toJSON()"), "null");
    }

    #[test]
    fn test_setters() {
        assert_eq!(eval("var d = new Date(0); d.setUTCFullYear(2001, 5, 15); d.toISOString()"), "2001-06-15T00:00:00.000Z");
        assert_eq!(eval("var d = new Date(0); d.setUTCHours(25); d.toISOString()"), "1970-01-02T01:00:00.000Z");
        assert_eq!(eval("var d = new Date(0); d.setUTCMonth(12); d.getUTCFullYear()"), "1971");
        assert_eq!(eval("var d = new Date(0); d.setTime(86400000); d.getUTCDate()"), "2");
        assert_eq!(eval("var d = new Date(0); d.setUTCSeconds(); d.getTime()"), "NaN");
    }

    #[test]
    fn test_local_components_are_consistent() {
        let script = r#"
            var d = new Date(2011, 9, 5, 8, 30);
            [d.getFullYear(), d.getMonth(), d.getDate(), d.getHours(), d.getMinutes()].join(',')
        "#;
        assert_eq!(eval(script), "2011,9,5,8,30");
        assert_eq!(eval("new Date(99, 0).getFullYear()"), "1999");
        assert_eq!(eval("var d = new Date(0); d.getTime() - d.getTimezoneOffset() * 60000 === Date.UTC(d.getFullYear(), d.getMonth(), d.getDate(), d.getHours(), d.getMinutes())"), "true");
    }

    #[test]
    fn test_call_form_and_now() {
        assert_eq!(eval("typeof Date()"), "string");
        assert_eq!(eval("typeof Date.now()"), "number");
        assert_eq!(eval("new Date(5) - new Date(2)"), "3");
        assert_eq!(eval("typeof (new Date(0) + 1)"), "string");
    }
}

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(eval("JSON.parse('{\"a\": [1, 2, {\"b\": null}]}').a[2].b"), "null");
        assert_eq!(eval("JSON.parse('\"text\"')"), "text");
        assert_eq!(eval("Object.keys(JSON.parse('{\"z\": 1, \"a\": 2}')).join(',')"), "z,a");
        assert_eq!(eval("try { JSON.parse('{bad}'); } catch (e) { e.name }"), "SyntaxError");
        assert_eq!(eval("try { JSON.parse(\"{'a': 1}\"); } catch (e) { e.name }"), "SyntaxError");
    }

    #[test]
    fn test_parse_with_reviver() {
        let script = r#"
            var o = JSON.parse('{"a": 1, "b": {"c": 2}, "d": 3}', function (k, v) {
                if (k === 'd') return undefined;
                return typeof v === 'number' ? v * 10 : v;
            });
            JSON.stringify(o)
        "#;
        assert_eq!(eval(script), r#"{"a":10,"b":{"c":20}}"#);
    }

    #[test]
    fn test_stringify_values() {
        assert_eq!(eval("JSON.stringify({a: 1, b: 'x', c: [true, null], d: undefined, e: function () {}})"), r#"{"a":1,"b":"x","c":[true,null]}"#);
        assert_eq!(eval("JSON.stringify([undefined, NaN, Infinity])"), "[null,null,null]");
        assert_eq!(eval("JSON.stringify('he said \"hi\"\\n')"), r#""he said \"hi\"\n""#);
        assert_eq!(eval("JSON.stringify(undefined)"), "undefined");
        assert_eq!(eval("JSON.stringify(new String('s')) + JSON.stringify(new Number(3))"), "\"s\"3");
    }

    #[test]
    fn test_stringify_indentation() {
        assert_eq!(eval("JSON.stringify({a: [1, 2]}, null, 2)"), "{\n  \"a\": [\n    1,\n    2\n  ]\n}");
        assert_eq!(eval("JSON.stringify({a: 1}, null, '--')"), "{\n--\"a\": 1\n}");
        assert_eq!(eval("JSON.stringify([], null, 4) + JSON.stringify({}, null, 4)"), "[]{}");
    }

    #[test]
    fn test_stringify_replacers() {
        assert_eq!(eval("JSON.stringify({a: 1, b: 2, c: 3}, ['c', 'a'])"), r#"{"c":3,"a":1}"#);
        assert_eq!(
            eval("JSON.stringify({a: 1, b: 'x'}, function (k, v) { return typeof v === 'number' ? v + 1 : v; })"),
            r#"{"a":2,"b":"x"}"#
        );
    }

    #[test]
    fn test_stringify_to_json_and_cycles() {
        assert_eq!(eval("JSON.stringify({d: new Date(0)})"), r#"{"d":"1970-01-01T00:00:00.000Z"}"#);
        assert_eq!(eval("JSON.stringify({toJSON: function (k) { return 'key:' + k; }})"), r#""key:""#);
        assert_eq!(eval("var o = {}; o.self = o; try { JSON.stringify(o); } catch (e) { e.name }"), "TypeError");
    }

    #[test]
    fn test_stringify_rejects_huge_arrays() {
        assert_eq!(eval("var a = []; a.length = 4294967295; try { JSON.stringify(a); } catch (e) { e.name }"), "RangeError");
        assert_eq!(eval("var a = []; a.length = 3; JSON.stringify(a)"), "[null,null,null]");
    }
}

#[cfg(test)]
mod console_tests {
    use super::*;

    #[test]
    fn test_console_methods_return_undefined() {
        assert_eq!(eval("typeof console.log"), "function");
        assert_eq!(eval("console.log('value', 1, {}, [2, 3])"), "undefined");
        assert_eq!(eval("console.warn('careful') === undefined"), "true");
    }
}
