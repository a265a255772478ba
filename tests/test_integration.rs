//! End-to-end tests: source text in, value or error out, through the
//! engine facade.

extern crate jsrun;

#[macro_use]
extern crate assert_matches;

use jsrun::parser::JsParser;
use jsrun::runner::api::{EngineError, JsEngine};
use jsrun::runner::compiler::Program;
use jsrun::runner::config::EngineConfig;
use jsrun::runner::ds::value::{JsNumberType, JsValue};

fn run(source: &str) -> Result<JsValue, EngineError> {
    JsEngine::new().run(source)
}

fn run_ok(source: &str) -> JsValue {
    match run(source) {
        Ok(v) => v,
        Err(e) => panic!("{} failed: {}", source, e),
    }
}

fn uncaught_message(source: &str) -> String {
    match run(source) {
        Err(EngineError::Uncaught { message, .. }) => message,
        other => panic!("expected an uncaught exception from {}, got {:?}", source, other),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_reassigned_global() {
    assert_eq!(run_ok("var x = 1; x = x + 1; x"), JsValue::integer(2));
}

#[test]
fn test_function_call() {
    assert_eq!(
        run_ok("function f(a){ return a*2; } f(21)"),
        JsValue::integer(42)
    );
}

#[test]
fn test_for_loop_sum() {
    assert_eq!(
        run_ok("for (var i=0, s=0; i<5; i++) s += i; s"),
        JsValue::integer(10)
    );
}

#[test]
fn test_caught_string() {
    assert_eq!(
        run_ok(r#"try { throw "boom"; } catch (e) { e; }"#),
        JsValue::string("boom")
    );
}

#[test]
fn test_labeled_continue_completes_normally() {
    let source = "
        var n = 0;
        outer: for (var i = 0; i < 3; i++) {
            for (var j = 0; j < 3; j++) {
                if (j == 1) continue outer;
                n++;
            }
        }
        n";
    assert_eq!(run_ok(source), JsValue::integer(3));
}

#[test]
fn test_compile_failure() {
    let err = run("function (").unwrap_err();
    assert_matches!(err, EngineError::Compile(ref e) if !e.diagnostics.is_empty());
    assert!(err.to_string().starts_with("SyntaxError"));
}

// ============================================================================
// Engine behaviour
// ============================================================================

#[test]
fn test_program_is_reexecutable() {
    let mut engine = JsEngine::new();
    let program = engine
        .compile("var count = typeof count === 'number' ? count + 1 : 1; count")
        .unwrap();
    assert_eq!(engine.run_program(&program).unwrap(), JsValue::integer(1));
    assert_eq!(engine.run_program(&program).unwrap(), JsValue::integer(2));
    assert_eq!(engine.run_program(&program).unwrap(), JsValue::integer(3));
}

#[test]
fn test_execution_is_deterministic() {
    let source = "
        var log = [];
        var o = {b: 1, a: 2, c: 3};
        for (var k in o) log.push(k + o[k]);
        log.join(' ')";
    let first = run_ok(source);
    let second = run_ok(source);
    assert_eq!(first, JsValue::string("b1 a2 c3"));
    assert_eq!(first, second);
}

#[test]
fn test_engines_do_not_share_globals() {
    let mut a = JsEngine::new();
    let mut b = JsEngine::new();
    a.run("var shared = 1;").unwrap();
    assert_eq!(b.run("typeof shared").unwrap(), JsValue::string("undefined"));
    assert_ne!(a.realm_id(), b.realm_id());
}

#[test]
fn test_globals_persist_between_runs() {
    let mut engine = JsEngine::new();
    engine.run("let counter = 10; function bump() { return ++counter; }").unwrap();
    engine.run("bump();").unwrap();
    assert_eq!(engine.run("bump()").unwrap(), JsValue::integer(12));
}

#[test]
fn test_lexical_redeclaration_across_runs_is_uncaught() {
    let mut engine = JsEngine::new();
    engine.run("let a = 1;").unwrap();
    let err = engine.run("var a = 2;").unwrap_err();
    assert_matches!(err, EngineError::Uncaught { ref message, .. } if message.starts_with("SyntaxError"));
    assert_eq!(engine.run("a").unwrap(), JsValue::integer(1));
}

#[test]
fn test_evaluate_joins_lines() {
    let mut engine = JsEngine::new();
    let v = engine
        .evaluate(&["var a = 1", "var b = 2", "a + b"])
        .unwrap();
    assert_eq!(v, JsValue::integer(3));
}

#[test]
fn test_uncaught_error_object() {
    assert_eq!(
        uncaught_message("undefinedThing + 1"),
        "ReferenceError: undefinedThing is not defined"
    );
    assert_eq!(uncaught_message("throw new RangeError('too far')"), "RangeError: too far");
}

#[test]
fn test_uncaught_value_is_kept() {
    match run("throw {code: 7}") {
        Err(EngineError::Uncaught { value, .. }) => {
            let o = value.as_object().expect("thrown object");
            assert!(o.borrow().has_property("code"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_internal_fault_is_not_uncaught() {
    // `break` at the top level is rejected by the compiler; skipping it
    // leaves a tree the interpreter cannot run.
    let ast = JsParser::parse_to_ast_from_str("break;").unwrap();
    let program = Program::from_ast_unchecked(ast, "unchecked");
    let mut engine = JsEngine::new();
    let err = engine.run_program(&program).unwrap_err();
    assert_matches!(err, EngineError::Fault(_));
    assert!(!err.is_uncaught());
}

#[test]
fn test_call_depth_limit_is_a_range_error() {
    let config = EngineConfig::new().with_max_call_depth(32);
    let mut engine = JsEngine::with_config(config);
    let source = "
        function down(n) { return down(n + 1); }
        var caught;
        try { down(0); } catch (e) { caught = e instanceof RangeError; }
        caught";
    assert_eq!(engine.run(source).unwrap(), JsValue::Boolean(true));
    assert_eq!(engine.context().call_depth(), 0);
}

#[test]
fn test_recursion_within_limit() {
    let config = EngineConfig::new().with_max_call_depth(64);
    let mut engine = JsEngine::with_config(config);
    let source = "function fact(n) { return n <= 1 ? 1 : n * fact(n - 1); } fact(10)";
    assert_eq!(engine.run(source).unwrap(), JsValue::integer(3628800));
}

#[test]
fn test_runaway_recursion_under_default_config_is_catchable() {
    let source = "
        function r() { return r(); }
        var name;
        try { r(); } catch (e) { name = e.name + ': ' + e.message; }
        name";
    assert_eq!(
        run_ok(source),
        JsValue::string("RangeError: Maximum call stack size exceeded")
    );
}

#[test]
fn test_deeply_nested_expressions_evaluate() {
    let depth = 100;
    let source = format!(
        "function id(x) {{ return x; }} var a = {}; {}",
        format!("{}0{}", "[".repeat(depth), "]".repeat(depth)),
        format!("{}42{}", "id(".repeat(depth), ")".repeat(depth))
    );
    assert_eq!(run_ok(&source), JsValue::integer(42));
}

#[test]
fn test_deeply_nested_blocks_execute() {
    let depth = 100;
    let source = format!("var n = 0; {}n = 7;{} n", "{ ".repeat(depth), " }".repeat(depth));
    assert_eq!(run_ok(&source), JsValue::integer(7));
}

#[test]
fn test_integer_literals_beyond_safe_range_round_to_doubles() {
    assert_eq!(run_ok("'' + 9007199254740993"), JsValue::string("9007199254740992"));
    assert_eq!(run_ok("9007199254740993 === 9007199254740992"), JsValue::Boolean(true));
    assert_eq!(
        run_ok("var o = {}; o[9007199254740993] = 1; Object.keys(o)[0]"),
        JsValue::string("9007199254740992")
    );
    assert_eq!(
        run_ok("var o = { 9007199254740993: 1 }; Object.keys(o)[0]"),
        JsValue::string("9007199254740992")
    );
    let value = run_ok("9007199254740993");
    assert_matches!(value, JsValue::Number(JsNumberType::Float(_)));
    assert_eq!(value, JsValue::number(9007199254740992.0));
}

#[test]
fn test_string_indexing_counts_utf16_units() {
    assert_eq!(run_ok("'h\\u00e9'[1] + 'abc'.length"), JsValue::string("\u{e9}3"));
    assert_eq!(run_ok("'\u{1F600}'.length"), JsValue::integer(2));
    assert_eq!(run_ok("'\u{1F600}'[0]"), JsValue::string("\u{FFFD}"));
    assert_eq!(run_ok("typeof 'ab'[2]"), JsValue::string("undefined"));
}

#[test]
fn test_compile_named_carries_the_source_name() {
    let mut engine = JsEngine::new();
    let program = engine.compile_named("var x = 2; x * 21", "calc.js").unwrap();
    assert_eq!(program.source_name(), "calc.js");
    assert_eq!(engine.run_program(&program).unwrap(), JsValue::integer(42));

    let err = engine.compile_named("var = ;", "broken.js").unwrap_err();
    assert_eq!(err.source_name, "broken.js");
    assert!(err.first().is_some());
    assert!(err.to_string().contains("broken.js"));

    assert_eq!(engine.compile("1").unwrap().source_name(), "<eval>");
}

#[test]
fn test_forced_strict_mode() {
    let mut engine = JsEngine::with_config(EngineConfig::new().with_strict(true));
    let err = engine.run("leaked = 1;").unwrap_err();
    assert_matches!(err, EngineError::Uncaught { ref message, .. } if message.starts_with("ReferenceError"));
}

#[test]
fn test_without_builtins() {
    let mut engine = JsEngine::with_config(EngineConfig::new().with_builtins(false));
    assert_eq!(engine.run("typeof Math").unwrap(), JsValue::string("undefined"));
    assert_eq!(engine.run("1 + 1").unwrap(), JsValue::integer(2));
}

#[test]
fn test_host_function() {
    let mut engine = JsEngine::new();
    engine.define_native_function("sum", &["a", "b"], |_ctx, _this, args| {
        let total: f64 = args
            .iter()
            .map(|v| match v {
                JsValue::Number(n) => n.to_f64(),
                _ => 0.0,
            })
            .sum();
        Ok(JsValue::number(total))
    });
    assert_eq!(engine.run("sum(1, 2, 3.5)").unwrap(), JsValue::number(6.5));
    assert_eq!(engine.run("sum.length").unwrap(), JsValue::integer(2));
}

#[test]
fn test_global_value_definition() {
    let mut engine = JsEngine::new();
    engine.define_global_value("answer", JsValue::integer(42));
    assert_eq!(engine.run("answer - 2").unwrap(), JsValue::integer(40));
    assert_eq!(engine.global("answer"), JsValue::integer(42));
    assert_eq!(engine.global("nothing"), JsValue::Undefined);
}

#[test]
fn test_number_results_are_normalized() {
    assert_eq!(run_ok("0.5 + 0.5"), JsValue::integer(1));
    assert_eq!(run_ok("1 / 0"), JsValue::Number(JsNumberType::PositiveInfinity));
    assert_eq!(run_ok("0 / 0"), JsValue::Number(JsNumberType::NaN));
}

#[test]
fn test_empty_program_is_undefined() {
    assert_eq!(run_ok(""), JsValue::Undefined);
    assert_eq!(run_ok("var x = 1;"), JsValue::Undefined);
}
