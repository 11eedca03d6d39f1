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
mod function_tests {
    use super::*;

    #[test]
    fn test_function_definition() {
        assert_eq!(eval("function add(a, b) { return a + b; } add(3, 4)"), "7");
    }

    #[test]
    fn test_function_without_return() {
        assert_eq!(eval("function noReturn() { var x = 42; } noReturn()"), "undefined");
    }

    #[test]
    fn test_missing_and_extra_arguments() {
        assert_eq!(eval("function f(a, b) { return typeof b; } f(1)"), "undefined");
        assert_eq!(eval("function f(a) { return arguments.length; } f(1, 2, 3)"), "3");
    }

    #[test]
    fn test_recursion() {
        assert_eq!(eval("function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); } fact(10)"), "3628800");
    }

    #[test]
    fn test_named_function_expression_binding() {
        assert_eq!(eval("var f = function g(n) { return n ? g(n - 1) + 1 : 0; }; f(4)"), "4");
        assert_eq!(eval("var f = function g() {}; typeof g"), "undefined");
    }

    #[test]
    fn test_function_length_and_prototype() {
        assert_eq!(eval("function f(a, b, c) {} f.length"), "3");
        assert_eq!(eval("function F() {} F.prototype.constructor === F"), "true");
    }

    #[test]
    fn test_constructor_and_prototype_chain() {
        let script = r#"
            function Animal(name) { this.name = name; }
            Animal.prototype.speak = function () { return this.name + ' speaks'; };
            function Dog(name) { Animal.call(this, name); }
            Dog.prototype = Object.create(Animal.prototype);
            Dog.prototype.constructor = Dog;
            var d = new Dog('Rex');
            d.speak() + ',' + (d instanceof Animal) + ',' + (d instanceof Dog)
        "#;
        assert_eq!(eval(script), "Rex speaks,true,true");
    }

    #[test]
    fn test_constructor_returning_object() {
        assert_eq!(eval("function F() { this.a = 1; return {a: 2}; } new F().a"), "2");
        assert_eq!(eval("function F() { this.a = 1; return 5; } new F().a"), "1");
    }

    #[test]
    fn test_call_apply_bind() {
        assert_eq!(eval("function f(a, b) { return this.x + a + b; } f.call({x: 1}, 2, 3)"), "6");
        assert_eq!(eval("function f(a, b) { return this.x + a + b; } f.apply({x: 1}, [2, 3])"), "6");
        assert_eq!(eval("function f(a, b) { return this.x + a + b; } var g = f.bind({x: 1}, 2); g(3)"), "6");
        assert_eq!(eval("function f(a, b, c) {} f.bind(null, 1).length"), "2");
    }

    #[test]
    fn test_bound_constructor() {
        let script = r#"
            function P(x, y) { this.x = x; this.y = y; }
            var B = P.bind(null, 1);
            var p = new B(2);
            p.x + p.y + ',' + (p instanceof P) + ',' + (p instanceof B)
        "#;
        assert_eq!(eval(script), "3,true,true");
    }

    #[test]
    fn test_this_binding() {
        assert_eq!(eval("function f() { return this; } f() === this"), "true");
        assert_eq!(eval("function f() { 'use strict'; return this; } typeof f()"), "undefined");
        assert_eq!(eval("function f() { return typeof this; } f.call(5)"), "object");
        assert_eq!(eval("function f() { 'use strict'; return typeof this; } f.call(5)"), "number");
    }

    #[test]
    fn test_arguments_mapping() {
        assert_eq!(eval("function f(a) { arguments[0] = 9; return a; } f(1)"), "9");
        assert_eq!(eval("function f(a) { a = 9; return arguments[0]; } f(1)"), "9");
        assert_eq!(eval("function f(a) { 'use strict'; arguments[0] = 9; return a; } f(1)"), "1");
        assert_eq!(eval("function f(a) { return arguments[0]; } f()"), "undefined");
    }

    #[test]
    fn test_function_constructor() {
        assert_eq!(eval("var add = new Function('a', 'b', 'return a + b'); add(2, 3)"), "5");
        assert_eq!(eval("Function('a, b', 'return a * b')(4, 5)"), "20");
        assert_eq!(eval("Function()()"), "undefined");
    }

    #[test]
    fn test_function_to_string() {
        assert_eq!(eval("function f(a) { return a; } f.toString()"), "function f(a) { return a; }");
        assert_eq!(eval("Math.max.toString()"), "function max() { [native code] }");
    }

    #[test]
    fn test_strict_mode_poison_pills() {
        let script = r#"
            function f() { 'use strict'; return arguments.callee; }
            try { f(); 'no error'; } catch (e) { e instanceof TypeError }
        "#;
        assert_eq!(eval(script), "true");
    }

    #[test]
    fn test_duplicate_parameters_last_wins() {
        assert_eq!(eval("function f(a, a) { return a; } f(1, 2) === 2"), "true");
        assert_eq!(eval("function f(a, a) { return a; } typeof f(1)"), "undefined");
    }

    #[test]
    fn test_apply_rejects_huge_argument_lists() {
        let script = r#"
            try { (function () {}).apply(null, {length: 4294967295}); 'no error'; } catch (e) { e.name }
        "#;
        assert_eq!(eval(script), "RangeError");
        assert_eq!(eval("Math.max.apply(null, {length: 2, 0: 4, 1: 9})"), "9");
    }

    #[test]
    fn test_call_depth_limit() {
        let script = r#"
            function down() { return down(); }
            try { down(); } catch (e) { e instanceof RangeError }
        "#;
        assert_eq!(eval(script), "true");
    }
}
