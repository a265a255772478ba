//! Program compiler.
//!
//! Turns source text into a [`Program`]: the parser builds the syntax tree
//! together with the per-scope declaration summaries, then a validation pass
//! rejects the constructs the grammar accepts but that can never run (a
//! `break` to a missing label, `return` at the top level, redeclared `let`
//! bindings, the strict-mode-only restrictions). Every problem found is
//! reported, not just the first.

use std::collections::HashSet;
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, debug_span};

use crate::parser::ast::{
    DeclarationType, ExpressionType, ForInLeftType, ForInitType, FunctionData, HasMeta,
    IdentifierData, MemberExpressionType, Meta, ProgramData, PropertyData, StatementType,
    UnaryOperator, VariableDeclarationData, VariableDeclarationKind,
};
use crate::parser::static_semantics::ScopeSummary;
use crate::parser::{JsParser, SyntaxDiagnostic};
use crate::stack::ensure_sufficient_stack;

lazy_static! {
    static ref STRICT_RESTRICTED_NAMES: HashSet<&'static str> =
        ["eval", "arguments"].iter().cloned().collect();
    static ref STRICT_RESERVED_WORDS: HashSet<&'static str> = [
        "implements",
        "interface",
        "let",
        "package",
        "private",
        "protected",
        "public",
        "static",
        "yield",
    ]
    .iter()
    .cloned()
    .collect();
}

/// A compiled, validated script. Cheap to clone; the tree is shared and never
/// mutated, so one Program can be executed any number of times.
#[derive(Clone)]
pub struct Program {
    source_name: Rc<str>,
    ast: Rc<ProgramData>,
}

impl Program {
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn ast(&self) -> &ProgramData {
        &self.ast
    }

    pub fn is_strict(&self) -> bool {
        self.ast.is_strict()
    }

    /// Wraps a tree without validating it. Executing an invalid tree ends in
    /// an internal fault instead of a compile error.
    #[doc(hidden)]
    pub fn from_ast_unchecked(ast: ProgramData, source_name: &str) -> Self {
        Program {
            source_name: Rc::from(source_name),
            ast: Rc::new(ast),
        }
    }
}

impl Debug for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("source_name", &self.source_name)
            .field("statements", &self.ast.body.len())
            .field("strict", &self.is_strict())
            .finish()
    }
}

/// SyntaxError raised while compiling. Carries every diagnostic found.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_diagnostics(.source_name, .diagnostics))]
pub struct CompileError {
    pub source_name: String,
    pub diagnostics: Vec<SyntaxDiagnostic>,
}

impl CompileError {
    /// The first diagnostic, in source order.
    pub fn first(&self) -> Option<&SyntaxDiagnostic> {
        self.diagnostics.first()
    }
}

fn render_diagnostics(source_name: &str, diagnostics: &[SyntaxDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| {
            format!(
                "SyntaxError: {} ({}:{}:{})",
                d.message, source_name, d.line, d.column
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn compile(source: &str, source_name: &str) -> Result<Program, CompileError> {
    compile_with_strictness(source, source_name, false)
}

/// Compiles `source`; `force_strict` compiles it as strict mode code even
/// without a `"use strict"` directive.
pub fn compile_with_strictness(
    source: &str,
    source_name: &str,
    force_strict: bool,
) -> Result<Program, CompileError> {
    let span = debug_span!("compile", source = %source_name);
    let _enter = span.enter();

    let ast = JsParser::parse_to_ast(source, force_strict).map_err(|diagnostics| {
        debug!(errors = diagnostics.len(), "parse failed");
        CompileError {
            source_name: source_name.to_string(),
            diagnostics,
        }
    })?;
    compile_program(ast, source, source_name)
}

/// Validates an already parsed tree. `source` is the text it was parsed from
/// and is only used to position diagnostics.
pub fn compile_program(
    ast: ProgramData,
    source: &str,
    source_name: &str,
) -> Result<Program, CompileError> {
    let mut validator = Validator::new(source, ast.is_strict());
    validator.check_scope(&ast.scope, true);
    validator.check_statements(&ast.body);
    if !validator.diagnostics.is_empty() {
        let mut diagnostics = validator.diagnostics;
        diagnostics.sort_by_key(|d| (d.line, d.column));
        debug!(errors = diagnostics.len(), "validation failed");
        return Err(CompileError {
            source_name: source_name.to_string(),
            diagnostics,
        });
    }
    debug!(
        statements = ast.body.len(),
        strict = ast.is_strict(),
        "compiled"
    );
    Ok(Program::from_ast_unchecked(ast, source_name))
}

/// 1-based line and column of a byte offset.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

struct LabelEntry {
    name: String,
    is_iteration: bool,
}

/// Walk state. Labels and loop nesting never cross a function boundary, so
/// they are saved and reset on entering a function body.
struct Validator<'a> {
    source: &'a str,
    diagnostics: Vec<SyntaxDiagnostic>,
    labels: Vec<LabelEntry>,
    breakable_depth: usize,
    iteration_depth: usize,
    in_function: bool,
    strict: bool,
}

impl<'a> Validator<'a> {
    fn new(source: &'a str, strict: bool) -> Self {
        Validator {
            source,
            diagnostics: vec![],
            labels: vec![],
            breakable_depth: 0,
            iteration_depth: 0,
            in_function: false,
            strict,
        }
    }

    fn report(&mut self, message: impl Into<String>, meta: Meta) {
        let (line, column) = line_column(self.source, meta.start_index);
        self.diagnostics.push(SyntaxDiagnostic {
            message: message.into(),
            line,
            column,
        });
    }

    fn check_binding_name(&mut self, id: &IdentifierData) {
        if !self.strict {
            return;
        }
        if STRICT_RESTRICTED_NAMES.contains(id.name.as_str()) {
            self.report("Unexpected eval or arguments in strict mode", id.meta);
        } else if STRICT_RESERVED_WORDS.contains(id.name.as_str()) {
            self.report("Unexpected strict mode reserved word", id.meta);
        }
    }

    /// Redeclaration rules of one scope's declarations.
    fn check_scope(&mut self, scope: &ScopeSummary, is_function_scope: bool) {
        let mut lexical: Vec<&str> = vec![];
        for l in &scope.lexical_names {
            let duplicate = lexical.contains(&l.name.as_str())
                || scope.var_names.iter().any(|v| v.name == l.name)
                || scope.functions.iter().any(|f| f.name() == l.name)
                || (is_function_scope && scope.parameters.iter().any(|p| p.name == l.name));
            if duplicate {
                self.report(
                    format!("Identifier '{}' has already been declared", l.name),
                    l.meta,
                );
            }
            lexical.push(&l.name);
        }
        if !is_function_scope {
            let mut functions: Vec<&str> = vec![];
            for f in &scope.functions {
                if let Some(id) = &f.id {
                    if scope.var_names.iter().any(|v| v.name == id.name)
                        || (self.strict && functions.contains(&id.name.as_str()))
                    {
                        self.report(
                            format!("Identifier '{}' has already been declared", id.name),
                            id.meta,
                        );
                    }
                    functions.push(&id.name);
                }
            }
        }
    }

    fn check_statements(&mut self, statements: &[StatementType]) {
        for s in statements {
            self.check_statement(s);
        }
    }

    fn check_statement(&mut self, statement: &StatementType) {
        ensure_sufficient_stack(|| self.check_statement_node(statement))
    }

    fn check_statement_node(&mut self, statement: &StatementType) {
        match statement {
            StatementType::ExpressionStatement { expression, .. } => {
                self.check_expression(expression)
            }
            StatementType::BlockStatement(block) => {
                self.check_scope(&block.scope, false);
                self.check_statements(&block.body);
            }
            StatementType::EmptyStatement { .. } | StatementType::DebuggerStatement { .. } => {}
            StatementType::ReturnStatement { meta, argument } => {
                if !self.in_function {
                    self.report("Illegal return statement", *meta);
                }
                if let Some(a) = argument {
                    self.check_expression(a);
                }
            }
            StatementType::BreakStatement { meta, label } => match label {
                Some(l) => {
                    if !self.labels.iter().any(|e| e.name == l.name) {
                        self.report(format!("Undefined label '{}'", l.name), l.meta);
                    }
                }
                None => {
                    if self.breakable_depth == 0 {
                        self.report("Illegal break statement", *meta);
                    }
                }
            },
            StatementType::ContinueStatement { meta, label } => match label {
                Some(l) => match self.labels.iter().rev().find(|e| e.name == l.name) {
                    None => self.report(format!("Undefined label '{}'", l.name), l.meta),
                    Some(e) if !e.is_iteration => self.report(
                        format!(
                            "Illegal continue statement: '{}' does not denote an iteration statement",
                            l.name
                        ),
                        l.meta,
                    ),
                    Some(_) => {}
                },
                None => {
                    if self.iteration_depth == 0 {
                        self.report(
                            "Illegal continue statement: no surrounding iteration statement",
                            *meta,
                        );
                    }
                }
            },
            StatementType::LabeledStatement { label, body, .. } => {
                if self.labels.iter().any(|e| e.name == label.name) {
                    self.report(
                        format!("Label '{}' has already been declared", label.name),
                        label.meta,
                    );
                }
                let mut target: &StatementType = body;
                while let StatementType::LabeledStatement { body, .. } = target {
                    target = body;
                }
                self.labels.push(LabelEntry {
                    name: label.name.to_string(),
                    is_iteration: target.is_iteration(),
                });
                self.check_statement(body);
                self.labels.pop();
            }
            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.check_expression(test);
                self.check_statement(consequent);
                if let Some(a) = alternate {
                    self.check_statement(a);
                }
            }
            StatementType::SwitchStatement(data) => {
                self.check_expression(&data.discriminant);
                self.check_scope(&data.scope, false);
                self.breakable_depth += 1;
                for case in &data.cases {
                    if let Some(t) = &case.test {
                        self.check_expression(t);
                    }
                    self.check_statements(&case.consequent);
                }
                self.breakable_depth -= 1;
            }
            StatementType::ThrowStatement { argument, .. } => self.check_expression(argument),
            StatementType::TryStatement(data) => {
                self.check_scope(&data.block.scope, false);
                self.check_statements(&data.block.body);
                if let Some(handler) = &data.handler {
                    self.check_binding_name(&handler.param);
                    if handler.body.scope.is_lexically_declared(&handler.param.name) {
                        self.report(
                            format!(
                                "Identifier '{}' has already been declared",
                                handler.param.name
                            ),
                            handler.body.meta,
                        );
                    }
                    self.check_scope(&handler.body.scope, false);
                    self.check_statements(&handler.body.body);
                }
                if let Some(finalizer) = &data.finalizer {
                    self.check_scope(&finalizer.scope, false);
                    self.check_statements(&finalizer.body);
                }
            }
            StatementType::WhileStatement { test, body, .. }
            | StatementType::DoWhileStatement { test, body, .. } => {
                self.check_expression(test);
                self.check_loop_body(body);
            }
            StatementType::ForStatement(data) => {
                self.check_scope(&data.scope, false);
                match &data.init {
                    Some(ForInitType::Declaration(d)) => self.check_variable_declaration(d),
                    Some(ForInitType::Expression(e)) => self.check_expression(e),
                    None => {}
                }
                if let Some(t) = &data.test {
                    self.check_expression(t);
                }
                if let Some(u) = &data.update {
                    self.check_expression(u);
                }
                self.check_loop_body(&data.body);
            }
            StatementType::ForInStatement(data) => {
                self.check_scope(&data.scope, false);
                match &data.left {
                    ForInLeftType::Declaration { id, .. } => self.check_binding_name(id),
                    ForInLeftType::Target(target) => {
                        self.check_assignment_target(target, "Invalid left-hand side in for-in")
                    }
                }
                self.check_expression(&data.right);
                self.check_loop_body(&data.body);
            }
            StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(f)) => {
                self.check_function(f)
            }
            StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(d)) => {
                self.check_variable_declaration(d)
            }
        }
    }

    fn check_loop_body(&mut self, body: &StatementType) {
        self.breakable_depth += 1;
        self.iteration_depth += 1;
        self.check_statement(body);
        self.iteration_depth -= 1;
        self.breakable_depth -= 1;
    }

    fn check_variable_declaration(&mut self, d: &VariableDeclarationData) {
        for declarator in &d.declarations {
            self.check_binding_name(&declarator.id);
            match &declarator.init {
                Some(init) => self.check_expression(init),
                None if d.kind == VariableDeclarationKind::Const => {
                    self.report("Missing initializer in const declaration", declarator.meta)
                }
                None => {}
            }
        }
    }

    fn check_function(&mut self, f: &FunctionData) {
        let saved_labels = std::mem::take(&mut self.labels);
        let saved_breakable = std::mem::replace(&mut self.breakable_depth, 0);
        let saved_iteration = std::mem::replace(&mut self.iteration_depth, 0);
        let saved_in_function = std::mem::replace(&mut self.in_function, true);
        let saved_strict = std::mem::replace(&mut self.strict, f.is_strict());

        if let Some(id) = &f.id {
            self.check_binding_name(id);
        }
        let mut seen: Vec<&str> = vec![];
        for p in &f.params {
            self.check_binding_name(p);
            if self.strict && seen.contains(&p.name.as_str()) {
                self.report("Duplicate parameter name not allowed in this context", p.meta);
            }
            seen.push(&p.name);
        }
        self.check_scope(&f.body.scope, true);
        self.check_statements(&f.body.statements);

        self.strict = saved_strict;
        self.in_function = saved_in_function;
        self.iteration_depth = saved_iteration;
        self.breakable_depth = saved_breakable;
        self.labels = saved_labels;
    }

    fn check_assignment_target(&mut self, target: &ExpressionType, message: &str) {
        if !target.is_valid_simple_assignment_target() {
            self.report(message, target.get_meta());
            self.check_expression(target);
            return;
        }
        match target {
            ExpressionType::Identifier(id) => {
                if self.strict && STRICT_RESTRICTED_NAMES.contains(id.name.as_str()) {
                    self.report("Unexpected eval or arguments in strict mode", id.meta);
                }
            }
            _ => self.check_expression(target),
        }
    }

    fn check_expression(&mut self, expression: &ExpressionType) {
        ensure_sufficient_stack(|| self.check_expression_node(expression))
    }

    fn check_expression_node(&mut self, expression: &ExpressionType) {
        match expression {
            ExpressionType::Literal(_)
            | ExpressionType::Identifier(_)
            | ExpressionType::ThisExpression { .. } => {}
            ExpressionType::ArrayExpression { elements, .. } => {
                for e in elements.iter().flatten() {
                    self.check_expression(e);
                }
            }
            ExpressionType::ObjectExpression { properties, .. } => {
                for PropertyData { value, .. } in properties {
                    self.check_expression(value);
                }
            }
            ExpressionType::FunctionExpression(f) => self.check_function(f),
            ExpressionType::UnaryExpression {
                operator, argument, ..
            } => {
                if *operator == UnaryOperator::Delete && self.strict {
                    if let ExpressionType::Identifier(id) = argument.as_ref() {
                        self.report(
                            "Delete of an unqualified identifier in strict mode.",
                            id.meta,
                        );
                    }
                }
                self.check_expression(argument);
            }
            ExpressionType::UpdateExpression {
                argument, prefix, ..
            } => {
                let message = if *prefix {
                    "Invalid left-hand side expression in prefix operation"
                } else {
                    "Invalid left-hand side expression in postfix operation"
                };
                self.check_assignment_target(argument, message);
            }
            ExpressionType::BinaryExpression { left, right, .. }
            | ExpressionType::LogicalExpression { left, right, .. } => {
                self.check_expression(left);
                self.check_expression(right);
            }
            ExpressionType::AssignmentExpression { left, right, .. } => {
                self.check_assignment_target(left, "Invalid left-hand side in assignment");
                self.check_expression(right);
            }
            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => {
                self.check_expression(test);
                self.check_expression(consequent);
                self.check_expression(alternate);
            }
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                ..
            }) => self.check_expression(object),
            ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                },
            ) => {
                self.check_expression(object);
                self.check_expression(property);
            }
            ExpressionType::CallExpression {
                callee, arguments, ..
            }
            | ExpressionType::NewExpression {
                callee, arguments, ..
            } => {
                self.check_expression(callee);
                for a in arguments {
                    self.check_expression(a);
                }
            }
            ExpressionType::SequenceExpression { expressions, .. } => {
                for e in expressions {
                    self.check_expression(e);
                }
            }
        }
    }
}
