//! Interpreter tests: References, Completions, scoping and the strict/sloppy
//! split, run directly against an `EvalContext`.

extern crate jsrun;

#[macro_use]
extern crate assert_matches;

use jsrun::parser::JsParser;
use jsrun::parser::ast::StatementType;
use jsrun::runner::compiler::compile;
use jsrun::runner::ds::error::{EvalError, JErrorType};
use jsrun::runner::ds::lex_env::LexEnvironment;
use jsrun::runner::ds::object_property::PropertyDescriptor;
use jsrun::runner::ds::operations::object::get;
use jsrun::runner::ds::value::JsValue;
use jsrun::runner::eval::expression::evaluate_expression;
use jsrun::runner::eval::{Completion, CompletionType, CompletionValue, Reference, ReferenceBase};
use jsrun::runner::plugin::registry::BuiltInRegistry;
use jsrun::runner::plugin::types::EvalContext;

fn context() -> EvalContext {
    let mut ctx = EvalContext::new();
    ctx.install_core_builtins(BuiltInRegistry::with_core());
    ctx
}

fn exec(ctx: &mut EvalContext, source: &str) -> Completion {
    let program = compile(source, "test").expect("compiles");
    ctx.execute(&program).expect("no internal fault")
}

/// The completion value, with a trailing Reference read.
fn value_of(ctx: &mut EvalContext, source: &str) -> JsValue {
    let completion = exec(ctx, source);
    assert_eq!(
        completion.completion_type,
        CompletionType::Normal,
        "{} threw {:?}",
        source,
        completion.value
    );
    match completion.value {
        Some(CompletionValue::Reference(r)) => r.get_value(ctx).expect("readable"),
        Some(CompletionValue::Value(v)) => v,
        None => JsValue::Undefined,
    }
}

fn eval(source: &str) -> JsValue {
    value_of(&mut context(), source)
}

/// The `name` of the error a Program threw.
fn thrown_name(source: &str) -> String {
    let mut ctx = context();
    let completion = exec(&mut ctx, source);
    assert_eq!(completion.completion_type, CompletionType::Throw, "{}", source);
    let error = completion.value_or_undefined();
    let error = error.as_object().expect("error object").clone();
    match get(&mut ctx, &error, "name").unwrap() {
        JsValue::String(s) => s,
        other => panic!("unexpected name {:?}", other),
    }
}

// ============================================================================
// References
// ============================================================================

#[test]
fn test_top_level_expression_leaves_a_reference() {
    let mut ctx = context();
    let completion = exec(&mut ctx, "var o = {p: 1}; o.p");
    match completion.value {
        Some(CompletionValue::Reference(ref r)) => {
            assert_eq!(r.name, "p");
            assert!(r.is_property_reference());
        }
        ref other => panic!("expected a reference, got {:?}", other),
    }
}

#[test]
fn test_reference_round_trip() {
    let mut ctx = context();
    exec(&mut ctx, "var target = 1;");
    let env = ctx.global_env();
    let reference = Reference::resolve(&env, "target", false);
    assert!(matches!(reference.base, ReferenceBase::Environment(_)));
    reference.put_value(&mut ctx, JsValue::string("v")).unwrap();
    assert_eq!(reference.get_value(&mut ctx).unwrap(), JsValue::string("v"));
    assert_eq!(value_of(&mut ctx, "target"), JsValue::string("v"));
}

#[test]
fn test_unresolvable_reference() {
    let mut ctx = context();
    let env = ctx.global_env();
    let reference = Reference::resolve(&env, "nowhere", false);
    assert!(matches!(reference.base, ReferenceBase::Unresolvable));
    assert_matches!(
        reference.get_value(&mut ctx),
        Err(EvalError::Error(JErrorType::ReferenceError(_)))
    );
    assert_eq!(reference.type_of(&mut ctx).unwrap(), "undefined");

    let strict = Reference::resolve(&env, "nowhere", true);
    assert_matches!(
        strict.put_value(&mut ctx, JsValue::integer(1)),
        Err(EvalError::Error(JErrorType::ReferenceError(_)))
    );
    reference.put_value(&mut ctx, JsValue::integer(1)).unwrap();
    assert_eq!(value_of(&mut ctx, "nowhere"), JsValue::integer(1));
}

#[test]
fn test_resolution_is_innermost_first() {
    let source = "
        var x = 'global';
        function f() { var x = 'function'; { let x = 'block'; return x; } }
        f() + ' ' + x";
    assert_eq!(eval(source), JsValue::string("block global"));
}

#[test]
fn test_delete() {
    assert_eq!(eval("var o = {a: 1}; delete o.a"), JsValue::Boolean(true));
    assert_eq!(eval("var o = {a: 1}; delete o.a; 'a' in o"), JsValue::Boolean(false));
    assert_eq!(eval("var v = 1; delete v"), JsValue::Boolean(false));
    assert_eq!(eval("delete neverDeclared"), JsValue::Boolean(true));
    assert_eq!(eval("delete Object.prototype"), JsValue::Boolean(false));
    assert_eq!(thrown_name("'use strict'; delete Object.prototype"), "TypeError");
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof undeclared"), JsValue::string("undefined"));
    assert_eq!(eval("typeof null"), JsValue::string("object"));
    assert_eq!(eval("typeof function () {}"), JsValue::string("function"));
    assert_eq!(eval("typeof 'a'"), JsValue::string("string"));
    assert_eq!(eval("typeof 1.5"), JsValue::string("number"));
}

// ============================================================================
// Strict and sloppy code
// ============================================================================

#[test]
fn test_sloppy_undeclared_write_creates_global() {
    let mut ctx = context();
    exec(&mut ctx, "function f() { created = 5; } f();");
    let global = ctx.global_object();
    assert_eq!(get(&mut ctx, &global, "created").unwrap(), JsValue::integer(5));
}

#[test]
fn test_strict_undeclared_write_throws() {
    assert_eq!(thrown_name("'use strict'; created = 5;"), "ReferenceError");
    assert_eq!(
        thrown_name("function f() { 'use strict'; created = 5; } f();"),
        "ReferenceError"
    );
}

#[test]
fn test_read_only_writes() {
    assert_eq!(eval("var o = Object.freeze({a: 1}); o.a = 2; o.a"), JsValue::integer(1));
    assert_eq!(thrown_name("'use strict'; var o = Object.freeze({a: 1}); o.a = 2;"), "TypeError");
    assert_eq!(thrown_name("'use strict'; undefined = 1;"), "TypeError");
}

#[test]
fn test_const_assignment_throws() {
    assert_eq!(thrown_name("const c = 1; c = 2;"), "TypeError");
}

#[test]
fn test_this_binding() {
    assert_eq!(
        eval("function f() { return this; } f() === this"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval("function f() { 'use strict'; return this; } f() === undefined"),
        JsValue::Boolean(true)
    );
    assert_eq!(
        eval("var o = {m: function () { return this; }}; o.m() === o"),
        JsValue::Boolean(true)
    );
}

// ============================================================================
// Hoisting and scoping
// ============================================================================

#[test]
fn test_function_declarations_hoist() {
    assert_eq!(eval("var r = f(); function f() { return 7; } r"), JsValue::integer(7));
}

#[test]
fn test_var_hoists_as_undefined() {
    assert_eq!(eval("var t = typeof v; var v = 1; t"), JsValue::string("undefined"));
    assert_eq!(
        eval("function f() { if (false) { var inner = 1; } return inner; } typeof f()"),
        JsValue::string("undefined")
    );
}

#[test]
fn test_temporal_dead_zone() {
    assert_eq!(thrown_name("{ x; let x = 1; }"), "ReferenceError");
    assert_eq!(thrown_name("function f() { return y; } f(); let y = 1;"), "ReferenceError");
}

#[test]
fn test_block_scoping() {
    assert_eq!(
        eval("let a = 1; { let a = 2; } a"),
        JsValue::integer(1)
    );
    assert_eq!(
        eval("var fs = []; for (let i = 0; i < 3; i++) fs.push(function () { return i; }); fs[0]() + fs[2]()"),
        JsValue::integer(2)
    );
}

#[test]
fn test_closures_capture_environment() {
    let source = "
        function counter() { var n = 0; return function () { return ++n; }; }
        var c = counter(); c(); c(); c()";
    assert_eq!(eval(source), JsValue::integer(3));
}

#[test]
fn test_named_function_expression_sees_itself() {
    assert_eq!(
        eval("var f = function fact(n) { return n < 2 ? 1 : n * fact(n - 1); }; f(5)"),
        JsValue::integer(120)
    );
    assert_eq!(eval("var g = function () {}; g.name"), JsValue::string("g"));
}

#[test]
fn test_function_expression_name_binding_is_immutable() {
    assert_eq!(
        eval("(function g() { g = 1; return typeof g; })()"),
        JsValue::string("function")
    );
    assert_eq!(
        eval("var o = { get v() { return typeof h; } }; var h = function h() { h = 2; return h === h; }; o.v + ':' + h()"),
        JsValue::string("function:true")
    );
    assert_eq!(
        eval("var out; (function g() { 'use strict'; try { g = 1; } catch (e) { out = e.name; } })(); out"),
        JsValue::string("TypeError")
    );
}

#[test]
fn test_arguments_object() {
    assert_eq!(
        eval("function f() { return arguments.length + ':' + arguments[1]; } f('a', 'b', 'c')"),
        JsValue::string("3:b")
    );
}

// ============================================================================
// Completions and control flow
// ============================================================================

#[test]
fn test_labelled_break_out_of_nested_loops() {
    let source = "
        var hits = 0;
        outer: while (true) {
            while (true) { hits++; break outer; }
        }
        hits";
    assert_eq!(eval(source), JsValue::integer(1));
}

#[test]
fn test_labelled_break_of_inner_loop_keeps_outer_loop_running() {
    let source = "
        var r = 0;
        for (var i = 0; i < 3; i++) {
            b: for (var j = 0; j < 3; j++) { if (j == 1) break b; r++; }
        }
        r + ':' + i";
    assert_eq!(eval(source), JsValue::string("3:3"));
}

#[test]
fn test_labelled_continue_skips_to_outer_iteration() {
    let source = "
        var log = '';
        outer: for (var i = 0; i < 3; i++) {
            for (var j = 0; j < 3; j++) { if (j == 1) continue outer; log += i; }
        }
        log";
    assert_eq!(eval(source), JsValue::string("012"));
}

#[test]
fn test_break_carries_last_value() {
    assert_eq!(eval("do { 'x'; break; } while (false)"), JsValue::string("x"));
}

#[test]
fn test_switch_fall_through() {
    let source = "
        var out = '';
        switch (2) { case 1: out += 'a'; case 2: out += 'b'; case 3: out += 'c'; break; default: out += 'd'; }
        out";
    assert_eq!(eval(source), JsValue::string("bc"));
}

#[test]
fn test_finally_runs_on_return() {
    let source = "
        var log = [];
        function f() { try { return 'try'; } finally { log.push('finally'); } }
        f() + ',' + log.join()";
    assert_eq!(eval(source), JsValue::string("try,finally"));
}

#[test]
fn test_thrown_value_reaches_outer_catch() {
    let source = "
        function inner() { throw new TypeError('nope'); }
        function outer() { try { inner(); } catch (e) { return e.message + '/' + (e instanceof TypeError); } }
        outer()";
    assert_eq!(eval(source), JsValue::string("nope/true"));
}

#[test]
fn test_engine_errors_are_error_instances() {
    assert_eq!(
        eval("try { null.p; } catch (e) { e instanceof TypeError && e instanceof Error; }"),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_for_in_over_nullish_does_nothing() {
    assert_eq!(eval("var n = 0; for (var k in null) n++; n"), JsValue::integer(0));
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_expression_evaluation_directly() {
    let mut ctx = context();
    let ast = JsParser::parse_to_ast_from_str("1 + 2 * 3").unwrap();
    let expression = match &ast.body[0] {
        StatementType::ExpressionStatement { expression, .. } => expression,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(evaluate_expression(expression, &mut ctx).unwrap(), JsValue::integer(7));
}

#[test]
fn test_equality() {
    assert_eq!(eval("1 == '1'"), JsValue::Boolean(true));
    assert_eq!(eval("1 === '1'"), JsValue::Boolean(false));
    assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
    assert_eq!(eval("NaN == NaN"), JsValue::Boolean(false));
}

#[test]
fn test_accessor_properties() {
    let source = "
        var o = { _v: 1, get v() { return this._v * 10; }, set v(x) { this._v = x; } };
        o.v = 4;
        o.v";
    assert_eq!(eval(source), JsValue::integer(40));
}

#[test]
fn test_constructor_call() {
    let source = "
        function Point(x, y) { this.x = x; this.y = y; }
        Point.prototype.sum = function () { return this.x + this.y; };
        var p = new Point(2, 3);
        p.sum() + (p instanceof Point ? 100 : 0)";
    assert_eq!(eval(source), JsValue::integer(105));
}

#[test]
fn test_scoped_execution() {
    let mut ctx = context();
    let env = LexEnvironment::new_declarative_environment(Some(ctx.global_env()));
    let program = compile("var local = 3; local * 2", "scoped").unwrap();
    let completion = ctx.execute_in(&program, env).unwrap();
    let value = match completion.value {
        Some(CompletionValue::Reference(r)) => r.get_value(&mut ctx).unwrap(),
        Some(CompletionValue::Value(v)) => v,
        None => JsValue::Undefined,
    };
    assert_eq!(value, JsValue::integer(6));
    let global = ctx.global_object();
    assert!(!global.borrow().has_property("local"));
}

#[test]
fn test_global_var_is_a_global_property() {
    let mut ctx = context();
    exec(&mut ctx, "var g = 1;");
    let global = ctx.global_object();
    let desc = global.borrow().get_own_property("g").cloned();
    assert!(matches!(
        desc,
        Some(PropertyDescriptor::Data { enumerable: true, configurable: false, .. })
    ));
}
