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
mod object_tests {
    use super::*;

    #[test]
    fn test_define_property_and_descriptor() {
        let script = r#"
            var o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            var d = Object.getOwnPropertyDescriptor(o, 'x');
            [d.value, d.writable, d.enumerable, d.configurable].join(',')
        "#;
        assert_eq!(eval(script), "1,false,false,false");
    }

    #[test]
    fn test_non_writable_assignment_is_ignored_or_throws() {
        assert_eq!(eval("var o = {}; Object.defineProperty(o, 'x', {value: 1}); o.x = 2; o.x"), "1");
        let strict = r#"
            'use strict';
            var o = Object.freeze({x: 1});
            try { o.x = 2; 'no error'; } catch (e) { e.name }
        "#;
        assert_eq!(eval(strict), "TypeError");
    }

    #[test]
    fn test_redefine_non_configurable_throws() {
        let script = r#"
            var o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            try { Object.defineProperty(o, 'x', { value: 2 }); } catch (e) { e instanceof TypeError }
        "#;
        assert_eq!(eval(script), "true");
    }

    #[test]
    fn test_redefine_non_configurable_with_same_value() {
        let script = r#"
            var o = {};
            Object.defineProperty(o, 'n', { value: NaN });
            Object.defineProperty(o, 'n', { value: NaN });
            Object.defineProperty(o, 'n', { value: NaN, writable: false, enumerable: false, configurable: false });
            Object.defineProperty(o, 's', { value: 'same' });
            Object.defineProperty(o, 's', { value: 'same' });
            isNaN(o.n) + ',' + o.s
        "#;
        assert_eq!(eval(script), "true,same");
        let signed_zero = r#"
            var o = {};
            Object.defineProperty(o, 'z', { value: 0 });
            try { Object.defineProperty(o, 'z', { value: -0 }); 'redefined'; } catch (e) { e.name }
        "#;
        assert_eq!(eval(signed_zero), "TypeError");
    }

    #[test]
    fn test_accessor_properties() {
        let script = r#"
            var store = 0;
            var o = {};
            Object.defineProperty(o, 'v', {
                get: function () { return store * 2; },
                set: function (x) { store = x; },
                enumerable: true,
                configurable: true
            });
            o.v = 21;
            o.v
        "#;
        assert_eq!(eval(script), "42");
        assert_eq!(eval("var o = { get a() { return 1; } }; o.a = 5; o.a"), "1");
    }

    #[test]
    fn test_keys_and_own_property_names() {
        assert_eq!(eval("Object.keys({b: 1, a: 2, 0: 3}).join(',')"), "b,a,0");
        assert_eq!(eval("var o = {z: 1}; o[1] = 2; o.y = 3; Object.getOwnPropertyNames(o).join(',')"), "z,1,y");
        assert_eq!(eval("Object.getOwnPropertyNames([1, 2]).join(',')"), "0,1,length");
        assert_eq!(eval("try { Object.keys('ab'); } catch (e) { e.name }"), "TypeError");
    }

    #[test]
    fn test_create_and_get_prototype_of() {
        assert_eq!(eval("var p = {greet: 'hi'}; var o = Object.create(p); o.greet + (Object.getPrototypeOf(o) === p)"), "hitrue");
        assert_eq!(eval("var o = Object.create(null, {x: {value: 3, enumerable: true}}); o.x + Object.keys(o).length"), "4");
        assert_eq!(eval("Object.getPrototypeOf(Object.prototype)"), "null");
    }

    #[test]
    fn test_seal_freeze_prevent_extensions() {
        assert_eq!(eval("var o = Object.preventExtensions({a: 1}); o.b = 2; [Object.isExtensible(o), o.b].join(',')"), "false,");
        assert_eq!(eval("var o = Object.seal({a: 1}); delete o.a; o.a = 3; [Object.isSealed(o), o.a].join(',')"), "true,3");
        assert_eq!(eval("var o = Object.freeze({a: 1}); o.a = 3; [Object.isFrozen(o), o.a].join(',')"), "true,1");
        assert_eq!(eval("Object.isFrozen(Object.preventExtensions({}))"), "true");
    }

    #[test]
    fn test_prototype_methods() {
        assert_eq!(eval("({a: 1}).hasOwnProperty('a')"), "true");
        assert_eq!(eval("({a: 1}).hasOwnProperty('toString')"), "false");
        assert_eq!(eval("Object.prototype.isPrototypeOf([])"), "true");
        assert_eq!(eval("[1].propertyIsEnumerable('length')"), "false");
        assert_eq!(eval("Object.prototype.toString.call([])"), "[object Array]");
        assert_eq!(eval("Object.prototype.toString.call(null)"), "[object Null]");
        assert_eq!(eval("Object.prototype.toString.call(undefined)"), "[object Undefined]");
        assert_eq!(eval("Object.prototype.toString.call(new Date(0))"), "[object Date]");
        assert_eq!(eval("(function () { return Object.prototype.toString.call(arguments); })()"), "[object Arguments]");
    }

    #[test]
    fn test_object_constructor_wraps_primitives() {
        assert_eq!(eval("typeof Object(1)"), "object");
        assert_eq!(eval("Object('ab').length"), "2");
        assert_eq!(eval("var o = {}; Object(o) === o"), "true");
        assert_eq!(eval("typeof Object(null)"), "object");
    }
}

#[cfg(test)]
mod array_tests {
    use super::*;

    #[test]
    fn test_length_tracks_indices() {
        assert_eq!(eval("var a = []; a[4] = 1; a.length"), "5");
        assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = 2; a.join(',')"), "1,2");
        assert_eq!(eval("var a = [1, 2]; a.length = 4; a.join('-')"), "1-2--");
    }

    #[test]
    fn test_length_truncation_stops_at_non_configurable_element() {
        let script = r#"
            var a = [1, 2, 3, 4];
            Object.defineProperty(a, 2, { value: 'pinned', configurable: false });
            a.length = 1;
            a.length + ':' + a.join(',')
        "#;
        assert_eq!(eval(script), "3:1,2,pinned");
        let strict = r#"
            'use strict';
            var a = [1, 2, 3];
            Object.defineProperty(a, 1, { configurable: false });
            try { a.length = 0; 'no error'; } catch (e) { e.name + ':' + a.length }
        "#;
        assert_eq!(eval(strict), "TypeError:2");
    }

    #[test]
    fn test_constructor_forms() {
        assert_eq!(eval("new Array(3).length"), "3");
        assert_eq!(eval("Array(1, 2, 3).join('')"), "123");
        assert_eq!(eval("new Array('3').length"), "1");
        assert_eq!(eval("try { new Array(1.5); } catch (e) { e.name }"), "RangeError");
        assert_eq!(eval("Array.isArray([]) && !Array.isArray({length: 0})"), "true");
    }

    #[test]
    fn test_stack_and_queue_methods() {
        assert_eq!(eval("var a = [1, 2]; a.push(3, 4) + ',' + a.join('')"), "4,1234");
        assert_eq!(eval("var a = [1, 2, 3]; a.pop() + ',' + a.length"), "3,2");
        assert_eq!(eval("var a = [1, 2, 3]; a.shift() + ',' + a.join('')"), "1,23");
        assert_eq!(eval("var a = [3]; a.unshift(1, 2) + ',' + a.join('')"), "3,123");
        assert_eq!(eval("[].pop()"), "undefined");
    }

    #[test]
    fn test_concat_slice_splice() {
        assert_eq!(eval("[1, 2].concat(3, [4, 5], [[6]]).length"), "6");
        assert_eq!(eval("[1, 2, 3, 4, 5].slice(1, -1).join(',')"), "2,3,4");
        assert_eq!(eval("[1, 2, 3].slice(-2).join(',')"), "2,3");
        assert_eq!(eval("var a = [1, 2, 3, 4, 5]; var r = a.splice(1, 2, 'x', 'y', 'z'); r.join('') + '|' + a.join('')"), "23|1xyz45");
        assert_eq!(eval("var a = [1, 2, 3]; a.splice(1); a.join(',')"), "1");
    }

    #[test]
    fn test_reverse_and_join() {
        assert_eq!(eval("[1, 2, 3].reverse().join()"), "3,2,1");
        assert_eq!(eval("[1, null, undefined, 2].join('|')"), "1|||2");
        assert_eq!(eval("String([1, [2, 3]])"), "1,2,3");
    }

    #[test]
    fn test_sort() {
        assert_eq!(eval("[10, 9, 1, 100].sort().join(',')"), "1,10,100,9");
        assert_eq!(eval("[10, 9, 1, 100].sort(function (a, b) { return a - b; }).join(',')"), "1,9,10,100");
        assert_eq!(eval("var a = [3, undefined, 1, , 2]; a.sort(); a.length + ':' + a.join(',') + ':' + (4 in a)"), "5:1,2,3,,:false");
        assert_eq!(eval("try { [2, 1].sort(1); } catch (e) { e.name }"), "TypeError");
    }

    #[test]
    fn test_sort_is_stable() {
        let script = r#"
            var items = [{k: 1, v: 'a'}, {k: 0, v: 'b'}, {k: 1, v: 'c'}, {k: 0, v: 'd'}];
            items.sort(function (x, y) { return x.k - y.k; });
            items.map(function (i) { return i.v; }).join('')
        "#;
        assert_eq!(eval(script), "bdac");
    }

    #[test]
    fn test_index_of() {
        assert_eq!(eval("[1, 2, 3, 2].indexOf(2)"), "1");
        assert_eq!(eval("[1, 2, 3, 2].lastIndexOf(2)"), "3");
        assert_eq!(eval("[1, 2, 3].indexOf('2')"), "-1");
        assert_eq!(eval("[NaN].indexOf(NaN)"), "-1");
        assert_eq!(eval("[1, 2, 1].indexOf(1, 1)"), "2");
    }

    #[test]
    fn test_iteration_methods() {
        assert_eq!(eval("[1, 2, 3].map(function (x) { return x * 2; }).join(',')"), "2,4,6");
        assert_eq!(eval("[1, 2, 3, 4].filter(function (x) { return x % 2; }).join(',')"), "1,3");
        assert_eq!(eval("[1, 2, 3].every(function (x) { return x > 0; })"), "true");
        assert_eq!(eval("[1, 2, 3].some(function (x) { return x > 2; })"), "true");
        assert_eq!(eval("var s = 0; [1, 2, 3].forEach(function (x, i) { s += x * i; }); s"), "8");
        assert_eq!(eval("var n = 0; [1, , 3].forEach(function () { n++; }); n"), "2");
        assert_eq!(eval("[1, 2].map(function () { return this.k; }, {k: 'x'}).join('')"), "xx");
    }

    #[test]
    fn test_reduce() {
        assert_eq!(eval("[1, 2, 3, 4].reduce(function (a, b) { return a + b; })"), "10");
        assert_eq!(eval("['a', 'b', 'c'].reduceRight(function (a, b) { return a + b; }, '')"), "cba");
        assert_eq!(eval("try { [].reduce(function () {}); } catch (e) { e.name }"), "TypeError");
        assert_eq!(eval("[5].reduce(function () { return 0; })"), "5");
    }

    #[test]
    fn test_generic_methods_on_array_likes() {
        assert_eq!(eval("Array.prototype.join.call({0: 'a', 1: 'b', length: 2}, '+')"), "a+b");
        assert_eq!(eval("var o = {length: 0}; Array.prototype.push.call(o, 'x'); o.length + o[0]"), "1x");
        assert_eq!(eval("(function () { return Array.prototype.slice.call(arguments, 1); })(1, 2, 3).join(',')"), "2,3");
    }
}
