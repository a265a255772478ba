//! Tests for the built-in objects, run through script code and through the
//! registry directly.

extern crate jsrun;

use jsrun::runner::api::{EngineError, JsEngine};
use jsrun::runner::ds::value::{JsNumberType, JsValue};
use jsrun::runner::plugin::registry::BuiltInRegistry;
use jsrun::runner::plugin::types::{BuiltInObject, EvalContext};

fn eval(source: &str) -> JsValue {
    match JsEngine::new().run(source) {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {}", source, e),
    }
}

fn eval_err(source: &str) -> String {
    match JsEngine::new().run(source) {
        Err(EngineError::Uncaught { message, .. }) => message,
        other => panic!("expected {} to throw, got {:?}", source, other),
    }
}

fn is_nan(v: &JsValue) -> bool {
    matches!(v, JsValue::Number(JsNumberType::NaN))
}

// ============================================================================
// Math
// ============================================================================

mod math_tests {
    use super::*;

    #[test]
    fn test_math_log() {
        assert_eq!(eval("Math.log(1)"), JsValue::integer(0));
        assert!(is_nan(&eval("Math.log(NaN)")));
        assert!(is_nan(&eval("Math.log('abc')")));
        assert_eq!(eval("Math.log(0)"), JsValue::Number(JsNumberType::NegativeInfinity));
    }

    #[test]
    fn test_math_log_length() {
        assert_eq!(eval("Math.log.length"), JsValue::integer(1));
        assert_eq!(eval("Math.pow.length"), JsValue::integer(2));
    }

    #[test]
    fn test_math_rounding() {
        assert_eq!(eval("Math.floor(-1.5)"), JsValue::integer(-2));
        assert_eq!(eval("Math.ceil(1.2)"), JsValue::integer(2));
        assert_eq!(eval("Math.abs('-3')"), JsValue::integer(3));
    }

    #[test]
    fn test_math_misc() {
        assert_eq!(eval("Math.sqrt(16)"), JsValue::integer(4));
        assert_eq!(eval("Math.pow(2, 8)"), JsValue::integer(256));
        assert_eq!(eval("Math.max(1, 5, 3)"), JsValue::integer(5));
        assert_eq!(eval("Math.min(4, -2)"), JsValue::integer(-2));
        assert_eq!(eval("Math.PI > 3.14 && Math.PI < 3.15"), JsValue::Boolean(true));
    }

    #[test]
    fn test_math_constants_are_read_only() {
        assert_eq!(eval("Math.PI = 3; Math.PI > 3.1"), JsValue::Boolean(true));
    }

    #[test]
    fn test_math_is_not_callable() {
        assert!(eval_err("Math()").starts_with("TypeError"));
    }
}

// ============================================================================
// Object
// ============================================================================

mod object_tests {
    use super::*;

    #[test]
    fn test_object_keys_in_insertion_order() {
        assert_eq!(
            eval("Object.keys({z: 1, a: 2, m: 3}).join()"),
            JsValue::string("z,a,m")
        );
    }

    #[test]
    fn test_has_own_property() {
        assert_eq!(
            eval("var o = {a: 1}; o.hasOwnProperty('a') && !o.hasOwnProperty('toString')"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_define_property() {
        let source = "
            var o = {};
            Object.defineProperty(o, 'hidden', {value: 1, enumerable: false});
            Object.keys(o).length + ':' + o.hidden";
        assert_eq!(eval(source), JsValue::string("0:1"));
    }

    #[test]
    fn test_define_property_accessor() {
        let source = "
            var o = {};
            Object.defineProperty(o, 'now', {get: function () { return 'got'; }});
            o.now";
        assert_eq!(eval(source), JsValue::string("got"));
    }

    #[test]
    fn test_define_property_rejects_mixed_descriptor() {
        assert!(eval_err(
            "Object.defineProperty({}, 'x', {value: 1, get: function () {}})"
        )
        .starts_with("TypeError"));
    }

    #[test]
    fn test_freeze() {
        assert_eq!(
            eval("var o = Object.freeze({a: 1}); o.b = 2; o.a = 3; Object.isFrozen(o) + ':' + o.a + ':' + o.b"),
            JsValue::string("true:1:undefined")
        );
    }

    #[test]
    fn test_get_prototype_of() {
        assert_eq!(
            eval("Object.getPrototypeOf({}) === Object.prototype"),
            JsValue::Boolean(true)
        );
        assert_eq!(
            eval("Object.getPrototypeOf(Object.prototype)"),
            JsValue::Null
        );
    }

    #[test]
    fn test_object_to_string() {
        assert_eq!(eval("({}).toString()"), JsValue::string("[object Object]"));
        assert_eq!(eval("'' + {}"), JsValue::string("[object Object]"));
    }

    #[test]
    fn test_object_constructor() {
        assert_eq!(eval("typeof Object(null)"), JsValue::string("object"));
        assert_eq!(eval("var o = {}; Object(o) === o"), JsValue::Boolean(true));
        assert_eq!(eval("new Object() instanceof Object"), JsValue::Boolean(true));
    }
}

// ============================================================================
// Function
// ============================================================================

mod function_tests {
    use super::*;

    #[test]
    fn test_call_sets_this() {
        assert_eq!(
            eval("function who() { return this.name; } who.call({name: 'me'})"),
            JsValue::string("me")
        );
    }

    #[test]
    fn test_apply_spreads_arguments() {
        assert_eq!(
            eval("function add(a, b) { return a + b; } add.apply(null, [2, 3])"),
            JsValue::integer(5)
        );
        assert_eq!(
            eval("Math.max.apply(null, [4, 9, 1])"),
            JsValue::integer(9)
        );
    }

    #[test]
    fn test_apply_with_huge_length_is_a_range_error() {
        let source = "
            var r;
            try { Math.max.apply(null, { length: 4294967295 }); } catch (e) { r = e.name; }
            r";
        assert_eq!(eval(source), JsValue::string("RangeError"));
        assert_eq!(
            eval("Math.max.apply(null, { length: 3, 0: 1, 1: 9, 2: 4 })"),
            JsValue::integer(9)
        );
    }

    #[test]
    fn test_function_constructor() {
        assert_eq!(
            eval("var mul = new Function('a', 'b', 'return a * b'); mul(3, 4)"),
            JsValue::integer(12)
        );
        assert!(eval_err("Function('return )')").starts_with("SyntaxError"));
    }

    #[test]
    fn test_functions_inherit_from_function_prototype() {
        assert_eq!(
            eval("function f() {} f instanceof Function && f instanceof Object"),
            JsValue::Boolean(true)
        );
    }
}

// ============================================================================
// Array
// ============================================================================

mod array_tests {
    use super::*;

    #[test]
    fn test_array_literal_and_length() {
        assert_eq!(eval("[1, 2, 3].length"), JsValue::integer(3));
        assert_eq!(eval("var a = [1]; a[4] = 5; a.length"), JsValue::integer(5));
    }

    #[test]
    fn test_push_and_join() {
        assert_eq!(
            eval("var a = []; a.push(1, 2); a.push('x'); a.join('-')"),
            JsValue::string("1-2-x")
        );
    }

    #[test]
    fn test_join_of_huge_sparse_array_is_a_range_error() {
        let source = "
            var a = [];
            a.length = 4294967295;
            var r;
            try { a.join(); } catch (e) { r = e.name + ': ' + e.message; }
            r";
        assert_eq!(eval(source), JsValue::string("RangeError: Invalid string length"));
        assert_eq!(eval("var b = []; b.length = 3; b.join('-')"), JsValue::string("--"));
    }

    #[test]
    fn test_is_array() {
        assert_eq!(
            eval("Array.isArray([]) && !Array.isArray({length: 0})"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_array_constructor() {
        assert_eq!(eval("new Array(3).length"), JsValue::integer(3));
        assert_eq!(eval("Array(1, 2).join()"), JsValue::string("1,2"));
        assert!(eval_err("new Array(-1)").starts_with("RangeError"));
    }
}

// ============================================================================
// Errors and globals
// ============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_error_to_string() {
        assert_eq!(eval("new Error('bad').toString()"), JsValue::string("Error: bad"));
        assert_eq!(eval("'' + new TypeError('t')"), JsValue::string("TypeError: t"));
    }

    #[test]
    fn test_error_without_new() {
        assert_eq!(
            eval("var e = ReferenceError('r'); e instanceof ReferenceError && e.message === 'r'"),
            JsValue::Boolean(true)
        );
    }

    #[test]
    fn test_native_errors_inherit_from_error() {
        assert_eq!(
            eval("new SyntaxError('s') instanceof Error && new RangeError() instanceof Error"),
            JsValue::Boolean(true)
        );
        assert_eq!(eval("TypeError.prototype.name"), JsValue::string("TypeError"));
    }

    #[test]
    fn test_global_values() {
        assert_eq!(eval("isNaN(NaN) && isNaN('x') && !isNaN('1')"), JsValue::Boolean(true));
        assert_eq!(eval("Infinity > 1e308"), JsValue::Boolean(true));
        assert_eq!(eval("typeof undefined"), JsValue::string("undefined"));
    }
}

// ============================================================================
// Registry
// ============================================================================

mod registry_tests {
    use super::*;
    use jsrun::runner::ds::error::EvalError;
    use jsrun::runner::ds::operations::object::{call, get};

    fn shout(
        ctx: &mut EvalContext,
        _this: JsValue,
        args: Vec<JsValue>,
    ) -> Result<JsValue, EvalError> {
        let text = jsrun::runner::ds::operations::type_conversion::to_string(
            ctx,
            args.get(0).unwrap_or(&JsValue::Undefined),
        )?;
        Ok(JsValue::String(text.to_uppercase()))
    }

    #[test]
    fn test_custom_object_is_installed() {
        let mut registry = BuiltInRegistry::with_core();
        registry.register_object(BuiltInObject::new("Text").add_method("shout", &["s"], shout));
        let mut ctx = EvalContext::new();
        registry.install(&mut ctx);

        let global = ctx.global_object();
        let text = get(&mut ctx, &global, "Text").unwrap();
        let shout_fn = get(&mut ctx, text.as_object().unwrap(), "shout").unwrap();
        let r = call(&mut ctx, &shout_fn, text, vec![JsValue::string("hi")]).unwrap();
        assert_eq!(r, JsValue::string("HI"));
    }

    #[test]
    fn test_core_registry_contents() {
        let registry = BuiltInRegistry::with_core();
        for name in &["Object", "Function", "Array", "Error", "TypeError", "Math"] {
            assert!(registry.has_object(name), "{} missing", name);
        }
        assert!(registry.has_method("Function", "apply"));
        assert!(registry.has_method("Error", "toString"));
    }
}
