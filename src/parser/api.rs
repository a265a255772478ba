use std::iter::Peekable;
use std::rc::Rc;
use std::str::Chars;

use pest::error::{Error, ErrorVariant, InputLocation, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Position, Span};
use pest_derive::Parser;

use super::ast::*;
use super::static_semantics::{DeclarationKind, ScopeTracker};
use crate::runner::ds::operations::type_conversion::number_to_string;
use crate::stack::{ensure_sufficient_stack, with_stack_of};

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

const TAB_WIDTH: usize = 2;

/// Deepest nesting of brackets, parentheses and braces a script may use.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Stack the grammar runs with. The grammar recurses through every
/// precedence level for each nesting level of the source.
const GRAMMAR_STACK_SIZE: usize = 8 * 1024 * 1024;

type BuildResult<T> = Result<T, Error<Rule>>;

/// A syntax error positioned in the source text. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxDiagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl JsParser {
    pub fn parse_to_ast_from_str(script: &str) -> Result<ProgramData, Vec<SyntaxDiagnostic>> {
        Self::parse_to_ast(script, false)
    }

    /// Parse a script into its syntax tree. `force_strict` treats the script
    /// as if it began with a `"use strict"` directive.
    pub fn parse_to_ast(
        script: &str,
        force_strict: bool,
    ) -> Result<ProgramData, Vec<SyntaxDiagnostic>> {
        check_nesting(script).map_err(|e| vec![to_diagnostic(e, script)])?;
        let mut pairs = with_stack_of(GRAMMAR_STACK_SIZE, || JsParser::parse(Rule::script, script))
            .map_err(|e| vec![to_diagnostic(e, script)])?;
        let script_pair = pairs.next().ok_or_else(|| {
            vec![SyntaxDiagnostic {
                message: "Unexpected end of input".to_string(),
                line: 1,
                column: 1,
            }]
        })?;
        build_program(script_pair, force_strict).map_err(|e| vec![to_diagnostic(e, script)])
    }

    /// Render the raw parse tree, one rule per line. Meant for debugging the grammar.
    pub fn parse_to_token_tree(script: &str) -> Result<String, SyntaxDiagnostic> {
        check_nesting(script).map_err(|e| to_diagnostic(e, script))?;
        let pairs = with_stack_of(GRAMMAR_STACK_SIZE, || JsParser::parse(Rule::script, script))
            .map_err(|e| to_diagnostic(e, script))?;
        let mut tree = vec![];
        for pair in pairs {
            tree.push(pair_to_string(pair, 0).join("\n"));
        }
        Ok(tree.join("\n"))
    }
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    let rule_name = format!(
        "{:?} => ({},{}) #{:?}",
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    );
    tree.push(format!("{}{}", " ".repeat(level * TAB_WIDTH), rule_name));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

fn to_diagnostic(error: Error<Rule>, script: &str) -> SyntaxDiagnostic {
    let (line, column) = match error.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    let message = match &error.variant {
        ErrorVariant::CustomError { message } => message.to_string(),
        ErrorVariant::ParsingError { .. } => {
            let offset = match error.location {
                InputLocation::Pos(p) => p,
                InputLocation::Span((s, _)) => s,
            };
            match script.get(offset..).and_then(|rest| rest.chars().next()) {
                Some(c) => format!("Unexpected token '{}'", c),
                None => "Unexpected end of input".to_string(),
            }
        }
    };
    SyntaxDiagnostic {
        message,
        line,
        column,
    }
}

/// Rejects scripts nesting deeper than [`MAX_NESTING_DEPTH`] before the
/// grammar sees them. Brackets inside string literals and comments do not
/// count.
fn check_nesting(script: &str) -> BuildResult<()> {
    let mut depth = 0usize;
    let mut chars = script.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    let message = format!(
                        "Nesting exceeds the maximum depth of {}",
                        MAX_NESTING_DEPTH
                    );
                    return Err(match Position::new(script, offset) {
                        Some(pos) => Error::new_from_pos(ErrorVariant::CustomError { message }, pos),
                        None => Error::new_from_pos(
                            ErrorVariant::CustomError { message },
                            Position::from_start(script),
                        ),
                    });
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '"' | '\'' => {
                while let Some((_, s)) = chars.next() {
                    match s {
                        '\\' => {
                            chars.next();
                        }
                        '\n' => break,
                        _ if s == c => break,
                        _ => {}
                    }
                }
            }
            '/' => match chars.peek() {
                Some((_, '/')) => {
                    for (_, s) in chars.by_ref() {
                        if s == '\n' {
                            break;
                        }
                    }
                }
                Some((_, '*')) => {
                    chars.next();
                    let mut star = false;
                    for (_, s) in chars.by_ref() {
                        if star && s == '/' {
                            break;
                        }
                        star = s == '*';
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
    Ok(())
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn get_custom_error(message: &str, span: Span) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        span,
    )
}

fn next_pair<'i>(pairs: &mut Pairs<'i, Rule>, parent: &Span<'i>) -> BuildResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| get_custom_error("Unexpected end of syntax node", parent.clone()))
}

fn first_child(pair: Pair<Rule>) -> BuildResult<Pair<Rule>> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    next_pair(&mut inner, &span)
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta::new(span.start(), span.end())
}

fn get_identifier(pair: &Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(pair),
    }
}

/// True when the leading directive prologue of a script or function body
/// contains `"use strict"`.
fn has_use_strict_directive(pair: &Pair<Rule>) -> bool {
    for child in pair.clone().into_inner() {
        if child.as_rule() != Rule::expression_statement {
            return false;
        }
        let text = child.as_str().trim_end();
        let text = text.strip_suffix(';').unwrap_or(text).trim_end();
        match directive_text(text) {
            Some("use strict") => return true,
            Some(_) => {}
            None => return false,
        }
    }
    false
}

fn directive_text(text: &str) -> Option<&str> {
    let quote = text.chars().next()?;
    if (quote == '"' || quote == '\'') && text.len() >= 2 && text.ends_with(quote) {
        let inner = &text[1..text.len() - 1];
        if !inner.contains(quote) {
            return Some(inner);
        }
    }
    None
}

fn build_program(pair: Pair<Rule>, force_strict: bool) -> BuildResult<ProgramData> {
    let meta = get_meta(&pair);
    let strict = force_strict || has_use_strict_directive(&pair);
    let mut tracker = ScopeTracker::new();
    let mut program_scope = tracker.open_function(strict);
    let body = build_statement_list(pair.into_inner(), &mut program_scope)?;
    let scope = program_scope.close();
    Ok(ProgramData { meta, body, scope })
}

fn build_statement_list(pairs: Pairs<Rule>, scope: &mut ScopeTracker) -> BuildResult<Vec<StatementType>> {
    let mut statements = vec![];
    for pair in pairs {
        statements.push(build_statement(pair, scope)?);
    }
    Ok(statements)
}

fn build_statement(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<StatementType> {
    ensure_sufficient_stack(|| build_statement_node(pair, scope))
}

fn build_statement_node(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<StatementType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::function_declaration => {
            let f = Rc::new(build_function(pair, scope)?);
            scope.declare_function(f.clone());
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f))
        }
        Rule::lexical_declaration | Rule::variable_statement => StatementType::DeclarationStatement(
            DeclarationType::VariableDeclaration(build_variable_declaration(pair, scope)?),
        ),
        Rule::block => StatementType::BlockStatement(build_block(pair, scope)?),
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::debugger_statement => StatementType::DebuggerStatement { meta },
        Rule::expression_statement => StatementType::ExpressionStatement {
            meta,
            expression: Box::new(build_expression(first_child(pair)?, scope)?),
        },
        Rule::if_statement => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, &span)?, scope)?;
            let consequent = build_statement(next_pair(&mut inner, &span)?, scope)?;
            let alternate = match inner.next() {
                Some(p) => Some(Box::new(build_statement(p, scope)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate,
            }
        }
        Rule::while_statement => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, &span)?, scope)?;
            let body = build_statement(next_pair(&mut inner, &span)?, scope)?;
            StatementType::WhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::do_while_statement => {
            let mut inner = pair.into_inner();
            let body = build_statement(next_pair(&mut inner, &span)?, scope)?;
            let test = build_expression(next_pair(&mut inner, &span)?, scope)?;
            StatementType::DoWhileStatement {
                meta,
                test: Box::new(test),
                body: Box::new(body),
            }
        }
        Rule::for_statement => StatementType::ForStatement(build_for_statement(pair, scope)?),
        Rule::for_in_statement => {
            StatementType::ForInStatement(build_for_in_statement(pair, scope)?)
        }
        Rule::continue_statement => StatementType::ContinueStatement {
            meta,
            label: pair.into_inner().next().map(|p| get_identifier(&p)),
        },
        Rule::break_statement => StatementType::BreakStatement {
            meta,
            label: pair.into_inner().next().map(|p| get_identifier(&p)),
        },
        Rule::return_statement => StatementType::ReturnStatement {
            meta,
            argument: match pair.into_inner().next() {
                Some(p) => Some(Box::new(build_expression(p, scope)?)),
                None => None,
            },
        },
        Rule::throw_statement => StatementType::ThrowStatement {
            meta,
            argument: Box::new(build_expression(first_child(pair)?, scope)?),
        },
        Rule::switch_statement => {
            StatementType::SwitchStatement(build_switch_statement(pair, scope)?)
        }
        Rule::try_statement => StatementType::TryStatement(build_try_statement(pair, scope)?),
        Rule::labelled_statement => {
            let mut inner = pair.into_inner();
            let label = get_identifier(&next_pair(&mut inner, &span)?);
            let body = build_statement(next_pair(&mut inner, &span)?, scope)?;
            StatementType::LabeledStatement {
                meta,
                label,
                body: Box::new(body),
            }
        }
        _ => return Err(get_unexpected_error(1, &pair)),
    })
}

fn get_declaration_kind(pair: &Pair<Rule>) -> BuildResult<VariableDeclarationKind> {
    match pair.as_str() {
        "var" => Ok(VariableDeclarationKind::Var),
        "let" => Ok(VariableDeclarationKind::Let),
        "const" => Ok(VariableDeclarationKind::Const),
        _ => Err(get_unexpected_error(2, pair)),
    }
}

fn to_declaration_kind(kind: VariableDeclarationKind) -> DeclarationKind {
    match kind {
        VariableDeclarationKind::Var => DeclarationKind::Var,
        VariableDeclarationKind::Let => DeclarationKind::Let,
        VariableDeclarationKind::Const => DeclarationKind::Const,
    }
}

/// Handles `var`/`let`/`const` statements as well as the declaration head of a `for`.
fn build_variable_declaration(
    pair: Pair<Rule>,
    scope: &mut ScopeTracker,
) -> BuildResult<VariableDeclarationData> {
    let meta = get_meta(&pair);
    let mut kind = VariableDeclarationKind::Var;
    let mut declarations = vec![];
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::lexical_kind | Rule::for_kind => kind = get_declaration_kind(&child)?,
            Rule::variable_declaration => {
                let d_meta = get_meta(&child);
                let span = child.as_span();
                let mut inner = child.into_inner();
                let id = get_identifier(&next_pair(&mut inner, &span)?);
                scope.declare(&id, to_declaration_kind(kind));
                let init = match inner.next() {
                    Some(p) => Some(Box::new(build_expression(p, scope)?)),
                    None => None,
                };
                declarations.push(VariableDeclaratorData {
                    meta: d_meta,
                    id,
                    init,
                });
            }
            _ => return Err(get_unexpected_error(3, &child)),
        }
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_block(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<BlockStatementData> {
    let meta = get_meta(&pair);
    let mut block_scope = scope.open_block();
    let body = build_statement_list(pair.into_inner(), &mut block_scope)?;
    Ok(BlockStatementData {
        meta,
        body,
        scope: block_scope.close(),
    })
}

fn build_for_statement(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<ForStatementData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut for_scope = scope.open_block();
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::for_init => {
                let head = first_child(child)?;
                init = Some(if head.as_rule() == Rule::for_declaration {
                    ForInitType::Declaration(build_variable_declaration(head, &mut for_scope)?)
                } else {
                    ForInitType::Expression(Box::new(build_expression(head, &mut for_scope)?))
                });
            }
            Rule::for_test => {
                test = Some(Box::new(build_expression(first_child(child)?, &mut for_scope)?))
            }
            Rule::for_update => {
                update = Some(Box::new(build_expression(first_child(child)?, &mut for_scope)?))
            }
            _ => body = Some(Box::new(build_statement(child, &mut for_scope)?)),
        }
    }
    let body = body.ok_or_else(|| get_custom_error("Missing loop body", span))?;
    Ok(ForStatementData {
        meta,
        init,
        test,
        update,
        body,
        scope: for_scope.close(),
    })
}

fn build_for_in_statement(
    pair: Pair<Rule>,
    scope: &mut ScopeTracker,
) -> BuildResult<ForInStatementData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let mut for_scope = scope.open_block();
    let left_pair = next_pair(&mut inner, &span)?;
    let left = if left_pair.as_rule() == Rule::for_binding {
        let binding_span = left_pair.as_span();
        let mut binding = left_pair.into_inner();
        let kind = get_declaration_kind(&next_pair(&mut binding, &binding_span)?)?;
        let id = get_identifier(&next_pair(&mut binding, &binding_span)?);
        for_scope.declare(&id, to_declaration_kind(kind));
        ForInLeftType::Declaration { kind, id }
    } else {
        ForInLeftType::Target(Box::new(build_expression(left_pair, &mut for_scope)?))
    };
    let right = build_expression(next_pair(&mut inner, &span)?, &mut for_scope)?;
    let body = build_statement(next_pair(&mut inner, &span)?, &mut for_scope)?;
    Ok(ForInStatementData {
        meta,
        left,
        right: Box::new(right),
        body: Box::new(body),
        scope: for_scope.close(),
    })
}

fn build_switch_statement(
    pair: Pair<Rule>,
    scope: &mut ScopeTracker,
) -> BuildResult<SwitchStatementData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let discriminant = build_expression(next_pair(&mut inner, &span)?, scope)?;
    let mut case_scope = scope.open_block();
    let mut cases: Vec<SwitchCaseData> = vec![];
    for clause in inner {
        let clause_meta = get_meta(&clause);
        let clause_span = clause.as_span();
        let mut clause_inner = clause.into_inner();
        let head = next_pair(&mut clause_inner, &clause_span)?;
        let test = if head.as_rule() == Rule::case_test {
            Some(build_expression(first_child(head)?, &mut case_scope)?)
        } else {
            if cases.iter().any(|c| c.test.is_none()) {
                return Err(get_custom_error(
                    "More than one default clause in switch statement",
                    head.as_span(),
                ));
            }
            None
        };
        let consequent = build_statement_list(clause_inner, &mut case_scope)?;
        cases.push(SwitchCaseData {
            meta: clause_meta,
            test,
            consequent,
        });
    }
    Ok(SwitchStatementData {
        meta,
        discriminant: Box::new(discriminant),
        cases,
        scope: case_scope.close(),
    })
}

fn build_try_statement(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<TryStatementData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let block = build_block(next_pair(&mut inner, &span)?, scope)?;
    let mut handler = None;
    let mut finalizer = None;
    for child in inner {
        match child.as_rule() {
            Rule::catch_clause => {
                let catch_meta = get_meta(&child);
                let catch_span = child.as_span();
                let mut catch_inner = child.into_inner();
                let param = get_identifier(&next_pair(&mut catch_inner, &catch_span)?);
                let body = build_block(next_pair(&mut catch_inner, &catch_span)?, scope)?;
                handler = Some(CatchClauseData {
                    meta: catch_meta,
                    param,
                    body,
                });
            }
            Rule::finally_clause => finalizer = Some(build_block(first_child(child)?, scope)?),
            _ => return Err(get_unexpected_error(4, &child)),
        }
    }
    if handler.is_none() && finalizer.is_none() {
        return Err(get_custom_error("Missing catch or finally after try", span));
    }
    Ok(TryStatementData {
        meta,
        block,
        handler,
        finalizer,
    })
}

fn build_function(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<FunctionData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let mut id = None;
    let mut params = vec![];
    let mut body = None;
    for child in pair.into_inner() {
        match child.as_rule() {
            Rule::identifier => id = Some(get_identifier(&child)),
            Rule::formal_parameters => {
                params = child.into_inner().map(|p| get_identifier(&p)).collect()
            }
            Rule::function_body => body = Some(child),
            _ => return Err(get_unexpected_error(5, &child)),
        }
    }
    let body = body.ok_or_else(|| get_custom_error("Missing function body", span))?;
    build_function_parts(meta, id, params, body, scope)
}

fn build_function_parts(
    meta: Meta,
    id: Option<IdentifierData>,
    params: Vec<IdentifierData>,
    body_pair: Pair<Rule>,
    scope: &mut ScopeTracker,
) -> BuildResult<FunctionData> {
    let body_meta = get_meta(&body_pair);
    let mut function_scope = scope.open_function(has_use_strict_directive(&body_pair));
    for param in &params {
        function_scope.declare(param, DeclarationKind::Parameter);
    }
    let statements = build_statement_list(body_pair.into_inner(), &mut function_scope)?;
    Ok(FunctionData {
        meta,
        id,
        params,
        body: FunctionBodyData {
            meta: body_meta,
            statements,
            scope: function_scope.close(),
        },
    })
}

/// Most precedence rules wrap a single operand. Those levels are walked
/// through in a loop, so only a node carrying an operator costs a level of
/// recursion.
fn skip_precedence_levels(mut pair: Pair<Rule>) -> Pair<Rule> {
    loop {
        match pair.as_rule() {
            Rule::expression
            | Rule::assignment
            | Rule::conditional
            | Rule::logical_or
            | Rule::logical_and
            | Rule::bitwise_or
            | Rule::bitwise_xor
            | Rule::bitwise_and
            | Rule::equality
            | Rule::relational
            | Rule::shift
            | Rule::additive
            | Rule::multiplicative
            | Rule::unary_expression
            | Rule::postfix_expression
            | Rule::lhs_expression
            | Rule::member_expression
            | Rule::primary_expression => {}
            _ => return pair,
        }
        let mut inner = pair.clone().into_inner();
        match (inner.next(), inner.next()) {
            (Some(only), None) if only.as_rule() != Rule::prefix_operator => pair = only,
            _ => return pair,
        }
    }
}

fn build_expression(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<ExpressionType> {
    let pair = skip_precedence_levels(pair);
    ensure_sufficient_stack(|| build_expression_node(pair, scope))
}

fn build_expression_node(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<ExpressionType> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    Ok(match pair.as_rule() {
        Rule::expression => {
            let mut expressions = vec![];
            for child in pair.into_inner() {
                expressions.push(build_expression(child, scope)?);
            }
            if expressions.len() > 1 {
                ExpressionType::SequenceExpression { meta, expressions }
            } else {
                expressions
                    .pop()
                    .ok_or_else(|| get_custom_error("Expected an expression", span))?
            }
        }
        Rule::assignment => {
            let mut inner = pair.into_inner();
            let left = build_expression(next_pair(&mut inner, &span)?, scope)?;
            match inner.next() {
                None => left,
                Some(op_pair) => {
                    let operator = get_assignment_operator(&op_pair)?;
                    let right = build_expression(next_pair(&mut inner, &span)?, scope)?;
                    ExpressionType::AssignmentExpression {
                        meta,
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                }
            }
        }
        Rule::conditional => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, &span)?, scope)?;
            match inner.next() {
                None => test,
                Some(consequent) => {
                    let consequent = build_expression(consequent, scope)?;
                    let alternate = build_expression(next_pair(&mut inner, &span)?, scope)?;
                    ExpressionType::ConditionalExpression {
                        meta,
                        test: Box::new(test),
                        consequent: Box::new(consequent),
                        alternate: Box::new(alternate),
                    }
                }
            }
        }
        Rule::logical_or => build_logical_expression(pair, LogicalOperator::Or, scope)?,
        Rule::logical_and => build_logical_expression(pair, LogicalOperator::And, scope)?,
        Rule::bitwise_or
        | Rule::bitwise_xor
        | Rule::bitwise_and
        | Rule::equality
        | Rule::relational
        | Rule::shift
        | Rule::additive
        | Rule::multiplicative => build_binary_expression(pair, scope)?,
        Rule::unary_expression => {
            let mut inner = pair.into_inner();
            let first = next_pair(&mut inner, &span)?;
            if first.as_rule() == Rule::prefix_operator {
                let argument = Box::new(build_expression(next_pair(&mut inner, &span)?, scope)?);
                match first.as_str() {
                    "++" => ExpressionType::UpdateExpression {
                        meta,
                        operator: UpdateOperator::PlusPlus,
                        argument,
                        prefix: true,
                    },
                    "--" => ExpressionType::UpdateExpression {
                        meta,
                        operator: UpdateOperator::MinusMinus,
                        argument,
                        prefix: true,
                    },
                    _ => ExpressionType::UnaryExpression {
                        meta,
                        operator: get_unary_operator(&first)?,
                        argument,
                    },
                }
            } else {
                build_expression(first, scope)?
            }
        }
        Rule::postfix_expression => {
            let mut inner = pair.into_inner();
            let argument = build_expression(next_pair(&mut inner, &span)?, scope)?;
            match inner.next() {
                None => argument,
                Some(op) => ExpressionType::UpdateExpression {
                    meta,
                    operator: if op.as_str() == "++" {
                        UpdateOperator::PlusPlus
                    } else {
                        UpdateOperator::MinusMinus
                    },
                    argument: Box::new(argument),
                    prefix: false,
                },
            }
        }
        Rule::lhs_expression | Rule::member_expression => {
            let mut inner = pair.into_inner();
            let mut expression = build_expression(next_pair(&mut inner, &span)?, scope)?;
            for tail in inner {
                expression = build_member_or_call_tail(expression, tail, scope)?;
            }
            expression
        }
        Rule::new_with_arguments => {
            let mut inner = pair.into_inner();
            let callee = build_expression(next_pair(&mut inner, &span)?, scope)?;
            let arguments = build_arguments(next_pair(&mut inner, &span)?, scope)?;
            ExpressionType::NewExpression {
                meta,
                callee: Box::new(callee),
                arguments,
            }
        }
        Rule::new_bare => ExpressionType::NewExpression {
            meta,
            callee: Box::new(build_expression(first_child(pair)?, scope)?),
            arguments: vec![],
        },
        Rule::primary_expression => build_expression(first_child(pair)?, scope)?,
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::identifier => ExpressionType::Identifier(get_identifier(&pair)),
        Rule::literal => ExpressionType::Literal(LiteralData {
            meta,
            value: build_literal(first_child(pair)?)?,
        }),
        Rule::array_literal => {
            let mut elements = vec![];
            for slot in pair.into_inner() {
                elements.push(match slot.into_inner().next() {
                    Some(p) => Some(build_expression(p, scope)?),
                    None => None,
                });
            }
            // A trailing comma does not add a hole.
            if let Some(None) = elements.last() {
                elements.pop();
            }
            ExpressionType::ArrayExpression { meta, elements }
        }
        Rule::object_literal => {
            let mut properties = vec![];
            for property in pair.into_inner() {
                properties.push(build_property(property, scope)?);
            }
            ExpressionType::ObjectExpression { meta, properties }
        }
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_function(pair, scope)?))
        }
        _ => return Err(get_unexpected_error(6, &pair)),
    })
}

fn build_member_or_call_tail(
    object: ExpressionType,
    tail: Pair<Rule>,
    scope: &mut ScopeTracker,
) -> BuildResult<ExpressionType> {
    let meta = object.get_meta().to(&get_meta(&tail));
    Ok(match tail.as_rule() {
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(object),
            arguments: build_arguments(tail, scope)?,
        },
        Rule::member_dot => {
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                meta,
                object: Box::new(object),
                property: get_identifier(&first_child(tail)?),
            })
        }
        Rule::member_index => {
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                meta,
                object: Box::new(object),
                property: Box::new(build_expression(first_child(tail)?, scope)?),
            })
        }
        _ => return Err(get_unexpected_error(7, &tail)),
    })
}

fn build_arguments(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<Vec<ExpressionType>> {
    let mut arguments = vec![];
    for argument in pair.into_inner() {
        arguments.push(build_expression(argument, scope)?);
    }
    Ok(arguments)
}

fn build_binary_expression(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let mut left = build_expression(next_pair(&mut inner, &span)?, scope)?;
    while let Some(op_pair) = inner.next() {
        let operator = get_binary_operator(&op_pair)?;
        let right = build_expression(next_pair(&mut inner, &span)?, scope)?;
        left = ExpressionType::BinaryExpression {
            meta: left.get_meta().to(&right.get_meta()),
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn build_logical_expression(
    pair: Pair<Rule>,
    operator: LogicalOperator,
    scope: &mut ScopeTracker,
) -> BuildResult<ExpressionType> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let mut left = build_expression(next_pair(&mut inner, &span)?, scope)?;
    for right_pair in inner {
        let right = build_expression(right_pair, scope)?;
        left = ExpressionType::LogicalExpression {
            meta: left.get_meta().to(&right.get_meta()),
            operator,
            left: Box::new(left),
            right: Box::new(right),
        };
    }
    Ok(left)
}

fn get_binary_operator(pair: &Pair<Rule>) -> BuildResult<BinaryOperator> {
    Ok(match pair.as_str() {
        "==" => BinaryOperator::LooselyEqual,
        "!=" => BinaryOperator::LooselyUnequal,
        "===" => BinaryOperator::StrictlyEqual,
        "!==" => BinaryOperator::StrictlyUnequal,
        "<" => BinaryOperator::LessThan,
        "<=" => BinaryOperator::LessThanEqual,
        ">" => BinaryOperator::GreaterThan,
        ">=" => BinaryOperator::GreaterThanEqual,
        "<<" => BinaryOperator::BitwiseLeftShift,
        ">>" => BinaryOperator::BitwiseRightShift,
        ">>>" => BinaryOperator::BitwiseUnsignedRightShift,
        "+" => BinaryOperator::Add,
        "-" => BinaryOperator::Subtract,
        "*" => BinaryOperator::Multiply,
        "/" => BinaryOperator::Divide,
        "%" => BinaryOperator::Modulo,
        "|" => BinaryOperator::BitwiseOr,
        "^" => BinaryOperator::BitwiseXor,
        "&" => BinaryOperator::BitwiseAnd,
        "in" => BinaryOperator::In,
        "instanceof" => BinaryOperator::InstanceOf,
        _ => return Err(get_unexpected_error(8, pair)),
    })
}

fn get_unary_operator(pair: &Pair<Rule>) -> BuildResult<UnaryOperator> {
    Ok(match pair.as_str() {
        "-" => UnaryOperator::Minus,
        "+" => UnaryOperator::Plus,
        "!" => UnaryOperator::LogicalNot,
        "~" => UnaryOperator::BitwiseNot,
        "typeof" => UnaryOperator::TypeOf,
        "void" => UnaryOperator::Void,
        "delete" => UnaryOperator::Delete,
        _ => return Err(get_unexpected_error(9, pair)),
    })
}

fn get_assignment_operator(pair: &Pair<Rule>) -> BuildResult<AssignmentOperator> {
    Ok(match pair.as_str() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        "<<=" => AssignmentOperator::BitwiseLeftShiftEquals,
        ">>=" => AssignmentOperator::BitwiseRightShiftEquals,
        ">>>=" => AssignmentOperator::BitwiseUnsignedRightShiftEquals,
        "|=" => AssignmentOperator::BitwiseOrEquals,
        "^=" => AssignmentOperator::BitwiseXorEquals,
        "&=" => AssignmentOperator::BitwiseAndEquals,
        _ => return Err(get_unexpected_error(10, pair)),
    })
}

fn build_property(pair: Pair<Rule>, scope: &mut ScopeTracker) -> BuildResult<PropertyData> {
    let meta = get_meta(&pair);
    let span = pair.as_span();
    let rule = pair.as_rule();
    let mut inner = pair.into_inner();
    let key = build_property_name(next_pair(&mut inner, &span)?)?;
    let (kind, value) = match rule {
        Rule::data_property => (
            PropertyKind::Init,
            build_expression(next_pair(&mut inner, &span)?, scope)?,
        ),
        Rule::getter_property => {
            let body = next_pair(&mut inner, &span)?;
            let f = build_function_parts(meta, None, vec![], body, scope)?;
            (PropertyKind::Get, ExpressionType::FunctionExpression(Rc::new(f)))
        }
        Rule::setter_property => {
            let param = get_identifier(&next_pair(&mut inner, &span)?);
            let body = next_pair(&mut inner, &span)?;
            let f = build_function_parts(meta, None, vec![param], body, scope)?;
            (PropertyKind::Set, ExpressionType::FunctionExpression(Rc::new(f)))
        }
        _ => return Err(get_custom_error("Unexpected property definition", span)),
    };
    Ok(PropertyData {
        meta,
        key,
        kind,
        value,
    })
}

fn build_property_name(pair: Pair<Rule>) -> BuildResult<String> {
    let name = first_child(pair)?;
    match name.as_rule() {
        Rule::identifier_name => Ok(name.as_str().to_string()),
        Rule::string_literal => build_string_literal(name),
        Rule::numeric_literal => match parse_numeric_literal(name.as_str()) {
            Some(NumberLiteralType::IntegerLiteral(i)) => Ok(number_to_string(i as f64)),
            Some(NumberLiteralType::FloatLiteral(f)) => Ok(number_to_string(f)),
            None => Err(get_unexpected_error(11, &name)),
        },
        _ => Err(get_unexpected_error(12, &name)),
    }
}

fn build_literal(pair: Pair<Rule>) -> BuildResult<LiteralType> {
    Ok(match pair.as_rule() {
        Rule::null_literal => LiteralType::NullLiteral,
        Rule::boolean_literal => LiteralType::BooleanLiteral(pair.as_str() == "true"),
        Rule::numeric_literal => match parse_numeric_literal(pair.as_str()) {
            Some(n) => LiteralType::NumberLiteral(n),
            None => return Err(get_custom_error("Invalid numeric literal", pair.as_span())),
        },
        Rule::string_literal => LiteralType::StringLiteral(build_string_literal(pair)?),
        _ => return Err(get_unexpected_error(13, &pair)),
    })
}

fn build_string_literal(pair: Pair<Rule>) -> BuildResult<String> {
    let chars = first_child(pair)?;
    unescape_string(chars.as_str()).map_err(|m| get_custom_error(&m, chars.as_span()))
}

pub(crate) fn parse_numeric_literal(text: &str) -> Option<NumberLiteralType> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return Some(match i64::from_str_radix(hex, 16) {
            Ok(i) => NumberLiteralType::IntegerLiteral(i),
            Err(_) => NumberLiteralType::FloatLiteral(hex.chars().fold(0.0, |acc, c| {
                acc * 16.0 + c.to_digit(16).unwrap_or(0) as f64
            })),
        });
    }
    if text.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
        text.parse::<f64>().ok().map(NumberLiteralType::FloatLiteral)
    } else {
        match text.parse::<i64>() {
            Ok(i) => Some(NumberLiteralType::IntegerLiteral(i)),
            Err(_) => text.parse::<f64>().ok().map(NumberLiteralType::FloatLiteral),
        }
    }
}

fn read_hex_digits(chars: &mut Peekable<Chars>, count: usize) -> Result<u32, String> {
    let mut code = 0;
    for _ in 0..count {
        match chars.next().and_then(|c| c.to_digit(16)) {
            Some(d) => code = code * 16 + d,
            None => return Err("Invalid hexadecimal escape sequence".to_string()),
        }
    }
    Ok(code)
}

pub(crate) fn unescape_string(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some(e) => e,
            None => return Err("Invalid escape sequence".to_string()),
        };
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' if !chars.peek().map_or(false, |c| c.is_ascii_digit()) => out.push('\0'),
            'x' => {
                let code = read_hex_digits(&mut chars, 2)?;
                out.push(std::char::from_u32(code).unwrap_or('\u{FFFD}'));
            }
            'u' => {
                let code = read_hex_digits(&mut chars, 4)?;
                if (0xD800..0xDC00).contains(&code) {
                    // Join a surrogate pair written as two escapes.
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
                        if let Ok(low) = read_hex_digits(&mut lookahead, 4) {
                            if (0xDC00..0xE000).contains(&low) {
                                chars = lookahead;
                                let joined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                                out.push(std::char::from_u32(joined).unwrap_or('\u{FFFD}'));
                                continue;
                            }
                        }
                    }
                    out.push('\u{FFFD}');
                } else {
                    out.push(std::char::from_u32(code).unwrap_or('\u{FFFD}'));
                }
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }
    Ok(out)
}
