use super::api::JsParser;
use super::api::Rule;
use super::ast::*;

use pest::consumes_to;
use pest::parses_to;
use pest::Parser;

fn parse_ok(source: &str) -> ProgramData {
    match JsParser::parse_to_ast_from_str(source) {
        Ok(p) => p,
        Err(e) => panic!("failed to parse {:?}: {:?}", source, e),
    }
}

fn expression_of(statement: &StatementType) -> &ExpressionType {
    match statement {
        StatementType::ExpressionStatement { expression, .. } => expression,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_decimal_number() {
    parses_to! {
        parser: JsParser,
        input: "10",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 2)
        ]
    };
}

#[test]
fn test_number_with_exponent() {
    parses_to! {
        parser: JsParser,
        input: "1.5e+3",
        rule: Rule::numeric_literal,
        tokens: [
            numeric_literal(0, 6)
        ]
    };
}

#[test]
fn test_number_must_not_run_into_identifier() {
    assert!(JsParser::parse(Rule::numeric_literal, "3in").is_err());
}

#[test]
fn test_string_literal_keeps_raw_chars() {
    parses_to! {
        parser: JsParser,
        input: "'a\\'b'",
        rule: Rule::string_literal,
        tokens: [
            string_literal(0, 6, [
                single_string_chars(1, 5)
            ])
        ]
    };
}

#[test]
fn test_keyword_is_not_identifier() {
    assert!(JsParser::parse(Rule::identifier, "while").is_err());
    parses_to! {
        parser: JsParser,
        input: "whilex",
        rule: Rule::identifier,
        tokens: [
            identifier(0, 6)
        ]
    };
}

#[test]
fn test_break_with_label() {
    parses_to! {
        parser: JsParser,
        input: "break outer;",
        rule: Rule::break_statement,
        tokens: [
            break_statement(0, 12, [
                identifier(6, 11)
            ])
        ]
    };
}

#[test]
fn test_break_label_not_taken_across_line_break() {
    parses_to! {
        parser: JsParser,
        input: "break\nouter",
        rule: Rule::break_statement,
        tokens: [
            break_statement(0, 6)
        ]
    };
}

#[test]
fn test_asi_at_line_breaks() {
    let program = parse_ok("var a = 1\nvar b = 2\na + b");
    assert_eq!(program.body.len(), 3);
}

#[test]
fn test_asi_before_closing_brace() {
    let program = parse_ok("function f() { return 1 }");
    assert_eq!(program.body.len(), 1);
}

#[test]
fn test_return_value_not_taken_across_line_break() {
    let program = parse_ok("function f() { return\n1 }");
    let f = match &program.body[0] {
        StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => f.clone(),
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(f.body.statements.len(), 2);
    match &f.body.statements[0] {
        StatementType::ReturnStatement { argument, .. } => assert!(argument.is_none()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_missing_semicolon_on_one_line_fails() {
    assert!(JsParser::parse_to_ast_from_str("var a = 1 var b = 2").is_err());
}

#[test]
fn test_anonymous_function_declaration_fails() {
    let errors = JsParser::parse_to_ast_from_str("function (").unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line, 1);
}

#[test]
fn test_use_strict_directive() {
    assert!(parse_ok("'use strict'; var a;").is_strict());
    assert!(!parse_ok("var a; 'use strict';").is_strict());
    assert!(JsParser::parse_to_ast("var a;", true).unwrap().is_strict());

    let program = parse_ok("function f() { \"use strict\"; } function g() {}");
    let strictness: Vec<bool> = program.scope.functions.iter().map(|f| f.is_strict()).collect();
    assert_eq!(strictness, vec![true, false]);
}

#[test]
fn test_operator_precedence() {
    let program = parse_ok("1 + 2 * 3");
    match expression_of(&program.body[0]) {
        ExpressionType::BinaryExpression {
            operator, right, ..
        } => {
            assert_eq!(*operator, BinaryOperator::Add);
            assert!(matches!(
                right.as_ref(),
                ExpressionType::BinaryExpression {
                    operator: BinaryOperator::Multiply,
                    ..
                }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let program = parse_ok("a = b += 1");
    match expression_of(&program.body[0]) {
        ExpressionType::AssignmentExpression {
            operator, right, ..
        } => {
            assert_eq!(*operator, AssignmentOperator::Equals);
            assert!(matches!(
                right.as_ref(),
                ExpressionType::AssignmentExpression {
                    operator: AssignmentOperator::AddEquals,
                    ..
                }
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_member_call_chain() {
    let program = parse_ok("a.b[c](1, 2)");
    match expression_of(&program.body[0]) {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            assert!(matches!(
                callee.as_ref(),
                ExpressionType::MemberExpression(
                    MemberExpressionType::ComputedMemberExpression { .. }
                )
            ));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_new_without_arguments() {
    let program = parse_ok("new Foo");
    match expression_of(&program.body[0]) {
        ExpressionType::NewExpression { arguments, .. } => assert!(arguments.is_empty()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_string_escapes_are_decoded() {
    let program = parse_ok("'a\\n\\u0041\\x42'");
    match expression_of(&program.body[0]) {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::StringLiteral(s),
            ..
        }) => assert_eq!(s, "a\nAB"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_hex_literal() {
    let program = parse_ok("0xff");
    match expression_of(&program.body[0]) {
        ExpressionType::Literal(LiteralData {
            value: LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(n)),
            ..
        }) => assert_eq!(*n, 255),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_object_literal_accessors() {
    let program = parse_ok("({ a: 1, get b() { return 2; }, set b(v) {} })");
    match expression_of(&program.body[0]) {
        ExpressionType::ObjectExpression { properties, .. } => {
            let kinds: Vec<PropertyKind> = properties.iter().map(|p| p.kind).collect();
            assert_eq!(kinds, vec![PropertyKind::Init, PropertyKind::Get, PropertyKind::Set]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_var_hoisting_recorded_in_program_scope() {
    let program = parse_ok("{ var a; let b; } if (x) { var c; } function f() { var d; }");
    assert_eq!(program.scope.var_declared_names(), vec!["a", "c"]);
    assert!(!program.scope.is_lexically_declared("b"));
    assert_eq!(program.scope.functions.len(), 1);
    assert_eq!(
        program.scope.functions[0].body.scope.var_declared_names(),
        vec!["d"]
    );
}

#[test]
fn test_block_function_stays_in_block() {
    let program = parse_ok("{ function g() {} }");
    assert!(program.scope.functions.is_empty());
    match &program.body[0] {
        StatementType::BlockStatement(b) => assert_eq!(b.scope.functions.len(), 1),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_for_let_head_scope() {
    let program = parse_ok("for (let i = 0; i < 3; i++) {}");
    match &program.body[0] {
        StatementType::ForStatement(f) => {
            assert!(f.scope.is_lexically_declared("i"));
            assert!(matches!(f.init, Some(ForInitType::Declaration(_))));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_labelled_statement() {
    let program = parse_ok("outer: for (;;) { continue outer; }");
    match &program.body[0] {
        StatementType::LabeledStatement { label, body, .. } => {
            assert_eq!(label.name, "outer");
            assert!(body.is_iteration());
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_try_requires_handler() {
    assert!(JsParser::parse_to_ast_from_str("try {}").is_err());
    assert!(JsParser::parse_to_ast_from_str("try {} finally {}").is_ok());
}

#[test]
fn test_duplicate_default_clause() {
    assert!(JsParser::parse_to_ast_from_str("switch (x) { default: default: }").is_err());
}

#[test]
fn test_token_tree_dump() {
    let tree = JsParser::parse_to_token_tree("x;").unwrap();
    assert!(tree.starts_with("script"));
    assert!(tree.contains("identifier"));
}
