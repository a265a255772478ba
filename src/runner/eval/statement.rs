//! Statement execution.
//!
//! Every statement produces a [`Completion`]; break, continue and return
//! travel outwards as abrupt completions while thrown values travel as
//! `Err(EvalError)`. Loops, `switch` and labelled statements go through
//! [`labelled_evaluation`], which owns the label set a `continue` is matched
//! against.

use tracing::debug;

use crate::parser::ast::{
    BlockStatementData, CatchClauseData, ExpressionType, ForInLeftType, ForInStatementData,
    ForInitType, ForStatementData, ProgramData, StatementType, SwitchCaseData,
    SwitchStatementData, TryStatementData, VariableDeclarationData, VariableDeclarationKind,
    DeclarationType,
};
use crate::parser::static_semantics::ScopeSummary;
use crate::runner::compiler::Program;
use crate::runner::ds::env_record::EnvironmentRecordType;
use crate::runner::ds::error::{EvalError, InternalFault, JErrorType};
use crate::runner::ds::execution_context::ExecutionContext;
use crate::runner::ds::lex_env::{JsLexEnvironmentType, LexEnvironment};
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::object::{
    define_property_or_throw, for_in_keys, is_enumerable_in_chain,
};
use crate::runner::ds::operations::test_and_comparison::strict_equality_comparison;
use crate::runner::ds::operations::type_conversion::{to_boolean, to_object};
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;
use crate::stack::ensure_sufficient_stack;

use super::expression::{
    evaluate_expression, evaluate_named_expression, evaluate_reference, is_reference_expression,
};
use super::function::instantiate_function;
use super::reference::Reference;
use super::types::{Completion, CompletionType, CompletionValue, EvalResult};

/// Runs a Program with `env` as its variable environment. Running against
/// the realm's global environment performs global declaration
/// instantiation; any other environment receives the Program's `var` and
/// function bindings directly.
///
/// Uncaught exceptions come back as a `Throw` completion. `Err` is reserved
/// for broken engine invariants.
pub fn execute_program(
    program: &Program,
    env: JsLexEnvironmentType,
    ctx: &mut EvalContext,
) -> Result<Completion, InternalFault> {
    let ast = program.ast();
    let strict = program.is_strict();
    debug!(
        source = program.source_name(),
        strict,
        statements = ast.body.len(),
        "executing program"
    );
    let depth = ctx.ctx_stack.len();
    let result = instantiate_program(ast, &env, ctx).and_then(|lex_env| {
        let this_binding = JsValue::Object(ctx.global_object());
        ctx.ctx_stack.push_execution_ctx(ExecutionContext {
            function: None,
            lex_env,
            var_env: env.clone(),
            this_binding,
            strict,
        });
        execute_top_level(&ast.body, ctx)
    });
    while ctx.ctx_stack.len() > depth {
        ctx.ctx_stack.pop_running_execution_ctx();
    }

    let completion = match result {
        Ok(c) if c.is_normal() => c,
        Ok(c) => {
            return Err(InternalFault::new(format!(
                "{:?} completion escaped the program",
                c.completion_type
            )))
        }
        Err(e) => Completion::throw(ctx.error_to_value(e)?),
    };
    debug!(
        source = program.source_name(),
        completion = ?completion.completion_type,
        "program finished"
    );
    Ok(completion)
}

fn instantiate_program(
    ast: &ProgramData,
    env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) -> Result<JsLexEnvironmentType, EvalError> {
    if std::rc::Rc::ptr_eq(env, &ctx.global_env()) {
        global_declaration_instantiation(&ast.scope, env, ctx)?;
        Ok(env.clone())
    } else {
        scoped_declaration_instantiation(&ast.scope, env, ctx)
    }
}

/// The statements of a Program. An identifier or property access as a whole
/// statement completes with its Reference; it is read before the next
/// statement runs, or by whoever receives the final completion.
fn execute_top_level(body: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut value: Option<CompletionValue> = None;
    for stmt in body {
        if let Some(CompletionValue::Reference(r)) = &value {
            value = Some(CompletionValue::Value(r.get_value(ctx)?));
        }
        let completion = match stmt {
            StatementType::ExpressionStatement { expression, .. }
                if is_reference_expression(expression) =>
            {
                Completion::normal_with_reference(evaluate_reference(expression, ctx)?)
            }
            _ => execute_statement(stmt, ctx)?,
        };
        if completion.is_abrupt() {
            return Ok(completion);
        }
        if completion.value.is_some() {
            value = completion.value;
        }
    }
    Ok(Completion {
        completion_type: CompletionType::Normal,
        value,
        target: None,
    })
}

fn already_declared(name: &str) -> EvalError {
    JErrorType::SyntaxError(format!("Identifier '{}' has already been declared", name)).into()
}

fn has_restricted_global_property(ctx: &EvalContext, name: &str) -> bool {
    match ctx.realm.global_object_env() {
        Some(env) => match &*env.borrow().inner {
            EnvironmentRecordType::Object(record) => record.has_restricted_property(name),
            EnvironmentRecordType::Declarative(_) => false,
        },
        None => false,
    }
}

/// Declarations of a Program run against the global environment. `let`
/// and `const` live in the global declarative record, `var` and functions
/// become properties of the global object. Every conflict is checked before
/// anything is created, so a rejected Program leaves no bindings behind.
fn global_declaration_instantiation(
    scope: &ScopeSummary,
    env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) -> Result<(), EvalError> {
    let global = ctx.global_object();
    {
        let env_ref = env.borrow();
        let record = env_ref.inner.as_env_record();
        for lexical in &scope.lexical_names {
            if record.has_binding(&lexical.name)
                || has_restricted_global_property(ctx, &lexical.name)
            {
                return Err(already_declared(&lexical.name));
            }
        }
        let function_names = scope.functions.iter().map(|f| f.name());
        for name in scope.var_declared_names().into_iter().chain(function_names) {
            if record.has_binding(name) {
                return Err(already_declared(name));
            }
        }
    }

    let mut declared_functions: Vec<&str> = vec![];
    for f in scope.functions.iter().rev() {
        if declared_functions.contains(&f.name()) {
            continue;
        }
        let declarable = match global.borrow().get_own_property(f.name()) {
            None => true,
            Some(d) => d.is_configurable() || (d.is_writable() && d.is_enumerable()),
        };
        if !declarable {
            return Err(JErrorType::TypeError(format!(
                "Cannot redefine global function '{}'",
                f.name()
            ))
            .into());
        }
        declared_functions.push(f.name());
    }

    // Functions are declared in reverse so the last declaration of a name wins.
    for f in scope.functions.iter().rev() {
        if !declared_functions.contains(&f.name()) {
            continue;
        }
        declared_functions.retain(|n| *n != f.name());
        let fo = JsValue::Object(instantiate_function(ctx, f, env.clone(), None));
        let configurable = global
            .borrow()
            .get_own_property(f.name())
            .map_or(true, |d| d.is_configurable());
        let desc = if configurable {
            PropertyDescriptorSetter::new_from_property_descriptor(PropertyDescriptor::Data {
                value: fo,
                writable: true,
                enumerable: true,
                configurable: false,
            })
        } else {
            PropertyDescriptorSetter::value_only(fo)
        };
        define_property_or_throw(&global, f.name(), desc)?;
    }

    if let Some(object_env) = ctx.realm.global_object_env() {
        let mut object_env = object_env.borrow_mut();
        let record = object_env.inner.as_env_record_mut();
        for name in scope.var_declared_names() {
            if global.borrow().get_own_property(name).is_none() {
                record.create_mutable_binding(name.to_string(), false)?;
            }
        }
    }

    instantiate_lexical_declarations(env, scope)
}

/// Declarations of a Program run against an environment other than the
/// global one. Returns the environment the Program's `let`/`const` live in.
fn scoped_declaration_instantiation(
    scope: &ScopeSummary,
    var_env: &JsLexEnvironmentType,
    ctx: &mut EvalContext,
) -> Result<JsLexEnvironmentType, EvalError> {
    {
        let mut env = var_env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        for name in scope.var_declared_names() {
            if !record.has_binding(name) {
                record.create_mutable_binding(name.to_string(), true)?;
                record.initialize_binding(name, JsValue::Undefined)?;
            }
        }
    }
    let lex_env = if scope.lexical_names.is_empty() {
        var_env.clone()
    } else {
        let lex_env = LexEnvironment::new_declarative_environment(Some(var_env.clone()));
        instantiate_lexical_declarations(&lex_env, scope)?;
        lex_env
    };
    for f in &scope.functions {
        let fo = JsValue::Object(instantiate_function(ctx, f, lex_env.clone(), None));
        let mut env = var_env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        if record.has_binding(f.name()) {
            record.set_mutable_binding(f.name(), fo, false)?;
        } else {
            record.create_mutable_binding(f.name().to_string(), true)?;
            record.initialize_binding(f.name(), fo)?;
        }
    }
    Ok(lex_env)
}

/// Creates the uninitialized `let`/`const` bindings of `scope` in `env`.
pub fn instantiate_lexical_declarations(
    env: &JsLexEnvironmentType,
    scope: &ScopeSummary,
) -> Result<(), EvalError> {
    let mut env = env.borrow_mut();
    let record = env.inner.as_env_record_mut();
    for lexical in &scope.lexical_names {
        if lexical.is_const {
            record.create_immutable_binding(lexical.name.to_string(), true)?;
        } else {
            record.create_mutable_binding(lexical.name.to_string(), false)?;
        }
    }
    Ok(())
}

/// Lexical bindings of a block plus its function declarations, which are
/// initialized up front so they can be called before their position.
fn block_declaration_instantiation(
    env: &JsLexEnvironmentType,
    scope: &ScopeSummary,
    ctx: &mut EvalContext,
) -> Result<(), EvalError> {
    instantiate_lexical_declarations(env, scope)?;
    for f in &scope.functions {
        let fo = JsValue::Object(instantiate_function(ctx, f, env.clone(), None));
        let mut env = env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        if !record.has_binding(f.name()) {
            record.create_mutable_binding(f.name().to_string(), false)?;
        }
        record.initialize_binding(f.name(), fo)?;
    }
    Ok(())
}

/// Runs `stmts` in order. The completion value is that of the last
/// statement that produced one.
pub fn execute_statement_list(stmts: &[StatementType], ctx: &mut EvalContext) -> EvalResult {
    let mut last: Option<JsValue> = None;
    for stmt in stmts {
        let completion = execute_statement(stmt, ctx)?;
        if completion.is_abrupt() {
            return Ok(completion.update_empty(last));
        }
        if let Some(v) = completion.get_value() {
            last = Some(v.clone());
        }
    }
    Ok(Completion::normal_with_optional_value(last))
}

/// Execute a statement and return its completion.
pub fn execute_statement(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    ensure_sufficient_stack(|| execute_statement_node(stmt, ctx))
}

fn execute_statement_node(stmt: &StatementType, ctx: &mut EvalContext) -> EvalResult {
    match stmt {
        StatementType::ExpressionStatement { expression, .. } => {
            let value = evaluate_expression(expression, ctx)?;
            Ok(Completion::normal_with_value(value))
        }

        StatementType::BlockStatement(block) => execute_block(block, ctx),

        StatementType::EmptyStatement { .. } | StatementType::DebuggerStatement { .. } => {
            Ok(Completion::normal())
        }

        StatementType::DeclarationStatement(DeclarationType::FunctionDeclaration(_)) => {
            Ok(Completion::normal())
        }

        StatementType::DeclarationStatement(DeclarationType::VariableDeclaration(decl)) => {
            execute_variable_declaration(decl, ctx)
        }

        StatementType::ReturnStatement { argument, .. } => {
            let value = match argument {
                Some(e) => evaluate_expression(e, ctx)?,
                None => JsValue::Undefined,
            };
            Ok(Completion::return_value(value))
        }

        StatementType::BreakStatement { label, .. } => Ok(Completion::break_completion(
            label.as_ref().map(|l| l.name.to_string()),
        )),

        StatementType::ContinueStatement { label, .. } => Ok(Completion::continue_completion(
            label.as_ref().map(|l| l.name.to_string()),
        )),

        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            let condition = evaluate_expression(test, ctx)?;
            let completion = if to_boolean(&condition) {
                execute_statement(consequent, ctx)?
            } else if let Some(alternate) = alternate {
                execute_statement(alternate, ctx)?
            } else {
                Completion::normal()
            };
            Ok(completion.update_empty(Some(JsValue::Undefined)))
        }

        StatementType::ThrowStatement { argument, .. } => {
            let value = evaluate_expression(argument, ctx)?;
            Err(EvalError::Throw(value))
        }

        StatementType::TryStatement(data) => execute_try_statement(data, ctx),

        StatementType::LabeledStatement { .. }
        | StatementType::WhileStatement { .. }
        | StatementType::DoWhileStatement { .. }
        | StatementType::ForStatement(_)
        | StatementType::ForInStatement(_)
        | StatementType::SwitchStatement(_) => labelled_evaluation(stmt, &mut vec![], ctx),
    }
}

/// Statements that `break` can leave, together with the labels in front of
/// them. A `break` naming one of the labels, or an unlabelled `break` out
/// of a loop or `switch`, completes normally here.
pub fn labelled_evaluation(
    stmt: &StatementType,
    label_set: &mut Vec<String>,
    ctx: &mut EvalContext,
) -> EvalResult {
    match stmt {
        StatementType::LabeledStatement { label, body, .. } => {
            label_set.push(label.name.to_string());
            let completion = labelled_evaluation(body, label_set, ctx)?;
            if completion.completion_type == CompletionType::Break
                && completion.target.as_deref() == Some(label.name.as_str())
            {
                Ok(Completion::normal_with_optional_value(
                    completion.get_value().cloned(),
                ))
            } else {
                Ok(completion)
            }
        }
        StatementType::WhileStatement { .. }
        | StatementType::DoWhileStatement { .. }
        | StatementType::ForStatement(_)
        | StatementType::ForInStatement(_)
        | StatementType::SwitchStatement(_) => {
            let completion = match stmt {
                StatementType::WhileStatement { test, body, .. } => {
                    execute_while_statement(test, body, label_set, ctx)?
                }
                StatementType::DoWhileStatement { test, body, .. } => {
                    execute_do_while_statement(test, body, label_set, ctx)?
                }
                StatementType::ForStatement(data) => execute_for_statement(data, label_set, ctx)?,
                StatementType::ForInStatement(data) => {
                    execute_for_in_statement(data, label_set, ctx)?
                }
                StatementType::SwitchStatement(data) => execute_switch_statement(data, ctx)?,
                _ => return Err(InternalFault::new("not a breakable statement").into()),
            };
            if completion.completion_type == CompletionType::Break && completion.target.is_none()
            {
                Ok(Completion::normal_with_value(completion.value_or_undefined()))
            } else {
                Ok(completion)
            }
        }
        _ => execute_statement(stmt, ctx),
    }
}

/// LoopContinues: whether an iteration's completion lets the loop go on.
fn loop_continues(completion: &Completion, label_set: &[String]) -> bool {
    match completion.completion_type {
        CompletionType::Normal => true,
        CompletionType::Continue => completion.targets(label_set),
        _ => false,
    }
}

fn execute_block(block: &BlockStatementData, ctx: &mut EvalContext) -> EvalResult {
    if !block.scope.has_lexical_declarations() {
        return execute_statement_list(&block.body, ctx);
    }
    let old_env = ctx.lex_env();
    let block_env = LexEnvironment::new_declarative_environment(Some(old_env.clone()));
    block_declaration_instantiation(&block_env, &block.scope, ctx)?;
    ctx.set_lex_env(block_env);
    let result = execute_statement_list(&block.body, ctx);
    ctx.set_lex_env(old_env);
    result
}

fn execute_variable_declaration(
    decl: &VariableDeclarationData,
    ctx: &mut EvalContext,
) -> EvalResult {
    for declarator in &decl.declarations {
        let name = &declarator.id.name;
        match decl.kind {
            VariableDeclarationKind::Var => {
                if let Some(init) = &declarator.init {
                    let reference = Reference::resolve(&ctx.lex_env(), name, ctx.is_strict());
                    let value = evaluate_named_expression(init, name, ctx)?;
                    reference.put_value(ctx, value)?;
                }
            }
            VariableDeclarationKind::Let | VariableDeclarationKind::Const => {
                let value = match &declarator.init {
                    Some(init) => evaluate_named_expression(init, name, ctx)?,
                    None => JsValue::Undefined,
                };
                ctx.lex_env()
                    .borrow_mut()
                    .inner
                    .as_env_record_mut()
                    .initialize_binding(name, value)?;
            }
        }
    }
    Ok(Completion::normal())
}

fn execute_while_statement(
    test: &ExpressionType,
    body: &StatementType,
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut v = JsValue::Undefined;
    loop {
        let condition = evaluate_expression(test, ctx)?;
        if !to_boolean(&condition) {
            return Ok(Completion::normal_with_value(v));
        }
        let completion = execute_statement(body, ctx)?;
        if !loop_continues(&completion, label_set) {
            return Ok(completion.update_empty(Some(v)));
        }
        if let Some(value) = completion.get_value() {
            v = value.clone();
        }
    }
}

fn execute_do_while_statement(
    test: &ExpressionType,
    body: &StatementType,
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut v = JsValue::Undefined;
    loop {
        let completion = execute_statement(body, ctx)?;
        if !loop_continues(&completion, label_set) {
            return Ok(completion.update_empty(Some(v)));
        }
        if let Some(value) = completion.get_value() {
            v = value.clone();
        }
        let condition = evaluate_expression(test, ctx)?;
        if !to_boolean(&condition) {
            return Ok(Completion::normal_with_value(v));
        }
    }
}

fn execute_for_statement(
    data: &ForStatementData,
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    match &data.init {
        Some(ForInitType::Declaration(decl)) if decl.kind != VariableDeclarationKind::Var => {
            let old_env = ctx.lex_env();
            let loop_env = LexEnvironment::new_declarative_environment(Some(old_env.clone()));
            instantiate_lexical_declarations(&loop_env, &data.scope)?;
            ctx.set_lex_env(loop_env);
            let per_iteration: Vec<String> = if decl.kind == VariableDeclarationKind::Let {
                decl.declarations
                    .iter()
                    .map(|d| d.id.name.to_string())
                    .collect()
            } else {
                vec![]
            };
            let result = execute_variable_declaration(decl, ctx)
                .and_then(|_| for_body_evaluation(data, &per_iteration, label_set, ctx));
            ctx.set_lex_env(old_env);
            result
        }
        Some(ForInitType::Declaration(decl)) => {
            execute_variable_declaration(decl, ctx)?;
            for_body_evaluation(data, &[], label_set, ctx)
        }
        Some(ForInitType::Expression(init)) => {
            evaluate_expression(init, ctx)?;
            for_body_evaluation(data, &[], label_set, ctx)
        }
        None => for_body_evaluation(data, &[], label_set, ctx),
    }
}

fn for_body_evaluation(
    data: &ForStatementData,
    per_iteration: &[String],
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut v = JsValue::Undefined;
    create_per_iteration_environment(per_iteration, ctx)?;
    loop {
        if let Some(test) = &data.test {
            let condition = evaluate_expression(test, ctx)?;
            if !to_boolean(&condition) {
                return Ok(Completion::normal_with_value(v));
            }
        }
        let completion = execute_statement(&data.body, ctx)?;
        if !loop_continues(&completion, label_set) {
            return Ok(completion.update_empty(Some(v)));
        }
        if let Some(value) = completion.get_value() {
            v = value.clone();
        }
        create_per_iteration_environment(per_iteration, ctx)?;
        if let Some(update) = &data.update {
            evaluate_expression(update, ctx)?;
        }
    }
}

/// Copies the loop's `let` bindings into a fresh environment, so closures
/// created in one iteration keep that iteration's values.
fn create_per_iteration_environment(
    names: &[String],
    ctx: &mut EvalContext,
) -> Result<(), EvalError> {
    if names.is_empty() {
        return Ok(());
    }
    let last = ctx.lex_env();
    let outer = last.borrow().outer.clone();
    let this_env = LexEnvironment::new_declarative_environment(outer);
    {
        let last = last.borrow();
        let mut this = this_env.borrow_mut();
        let record = this.inner.as_env_record_mut();
        for name in names {
            let value = last.inner.as_env_record().get_binding_value(name, true)?;
            record.create_mutable_binding(name.to_string(), false)?;
            record.initialize_binding(name, value)?;
        }
    }
    ctx.set_lex_env(this_env);
    Ok(())
}

fn execute_for_in_statement(
    data: &ForInStatementData,
    label_set: &[String],
    ctx: &mut EvalContext,
) -> EvalResult {
    let old_env = ctx.lex_env();
    let right = match &data.left {
        ForInLeftType::Declaration { kind, id } if *kind != VariableDeclarationKind::Var => {
            // The loop variable is in its TDZ while the object is evaluated.
            let tdz = LexEnvironment::new_declarative_environment(Some(old_env.clone()));
            tdz.borrow_mut()
                .inner
                .as_env_record_mut()
                .create_mutable_binding(id.name.to_string(), false)?;
            ctx.set_lex_env(tdz);
            let right = evaluate_expression(&data.right, ctx);
            ctx.set_lex_env(old_env.clone());
            right?
        }
        _ => evaluate_expression(&data.right, ctx)?,
    };
    if right.is_nullish() {
        return Ok(Completion::normal_with_value(JsValue::Undefined));
    }
    let object = to_object(ctx, &right)?;

    let mut v = JsValue::Undefined;
    for key in for_in_keys(&object) {
        if !is_enumerable_in_chain(&object, &key) {
            continue;
        }
        let key_value = JsValue::String(key);
        let completion = match &data.left {
            ForInLeftType::Target(target) => {
                let reference = evaluate_reference(target, ctx)?;
                reference.put_value(ctx, key_value)?;
                execute_statement(&data.body, ctx)?
            }
            ForInLeftType::Declaration {
                kind: VariableDeclarationKind::Var,
                id,
            } => {
                let reference = Reference::resolve(&ctx.lex_env(), &id.name, ctx.is_strict());
                reference.put_value(ctx, key_value)?;
                execute_statement(&data.body, ctx)?
            }
            ForInLeftType::Declaration { kind, id } => {
                let iteration_env =
                    LexEnvironment::new_declarative_environment(Some(old_env.clone()));
                {
                    let mut env = iteration_env.borrow_mut();
                    let record = env.inner.as_env_record_mut();
                    if *kind == VariableDeclarationKind::Const {
                        record.create_immutable_binding(id.name.to_string(), true)?;
                    } else {
                        record.create_mutable_binding(id.name.to_string(), false)?;
                    }
                    record.initialize_binding(&id.name, key_value)?;
                }
                ctx.set_lex_env(iteration_env);
                let completion = execute_statement(&data.body, ctx);
                ctx.set_lex_env(old_env.clone());
                completion?
            }
        };
        if !loop_continues(&completion, label_set) {
            return Ok(completion.update_empty(Some(v)));
        }
        if let Some(value) = completion.get_value() {
            v = value.clone();
        }
    }
    Ok(Completion::normal_with_value(v))
}

fn execute_switch_statement(data: &SwitchStatementData, ctx: &mut EvalContext) -> EvalResult {
    let discriminant = evaluate_expression(&data.discriminant, ctx)?;
    if !data.scope.has_lexical_declarations() {
        return case_block_evaluation(&data.cases, &discriminant, ctx);
    }
    let old_env = ctx.lex_env();
    let block_env = LexEnvironment::new_declarative_environment(Some(old_env.clone()));
    block_declaration_instantiation(&block_env, &data.scope, ctx)?;
    ctx.set_lex_env(block_env);
    let result = case_block_evaluation(&data.cases, &discriminant, ctx);
    ctx.set_lex_env(old_env);
    result
}

/// Case tests run in source order until one matches `===`; without a match
/// execution enters at `default`. From the entry clause on, clauses fall
/// through until a `break`.
fn case_block_evaluation(
    cases: &[SwitchCaseData],
    discriminant: &JsValue,
    ctx: &mut EvalContext,
) -> EvalResult {
    let mut entry = None;
    for (index, case) in cases.iter().enumerate() {
        if let Some(test) = &case.test {
            let value = evaluate_expression(test, ctx)?;
            if strict_equality_comparison(discriminant, &value) {
                entry = Some(index);
                break;
            }
        }
    }
    let entry = match entry.or_else(|| cases.iter().position(|c| c.test.is_none())) {
        Some(index) => index,
        None => return Ok(Completion::normal_with_value(JsValue::Undefined)),
    };

    let mut v = JsValue::Undefined;
    for case in &cases[entry..] {
        let completion = execute_statement_list(&case.consequent, ctx)?;
        if let Some(value) = completion.get_value() {
            v = value.clone();
        }
        if completion.is_abrupt() {
            return Ok(completion.update_empty(Some(v)));
        }
    }
    Ok(Completion::normal_with_value(v))
}

fn execute_try_statement(data: &TryStatementData, ctx: &mut EvalContext) -> EvalResult {
    let result = match (execute_block(&data.block, ctx), &data.handler) {
        (Err(e), Some(handler)) if !e.is_fault() => execute_catch_clause(handler, e, ctx),
        (result, _) => result,
    };
    let result = match &data.finalizer {
        None => result,
        Some(finalizer) => {
            if let Err(EvalError::Fault(_)) = &result {
                return result;
            }
            let finalizer_completion = execute_block(finalizer, ctx)?;
            if finalizer_completion.is_normal() {
                result
            } else {
                Ok(finalizer_completion)
            }
        }
    };
    result.map(|c| c.update_empty(Some(JsValue::Undefined)))
}

fn execute_catch_clause(
    handler: &CatchClauseData,
    error: EvalError,
    ctx: &mut EvalContext,
) -> EvalResult {
    let thrown = ctx.error_to_value(error)?;
    let old_env = ctx.lex_env();
    let catch_env = LexEnvironment::new_declarative_environment(Some(old_env.clone()));
    {
        let mut env = catch_env.borrow_mut();
        let record = env.inner.as_env_record_mut();
        record.create_mutable_binding(handler.param.name.to_string(), false)?;
        record.initialize_binding(&handler.param.name, thrown)?;
    }
    ctx.set_lex_env(catch_env);
    let result = execute_block(&handler.body, ctx);
    ctx.set_lex_env(old_env);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::compiler::compile;

    fn run(ctx: &mut EvalContext, source: &str) -> Completion {
        let program = compile(source, "test").unwrap();
        ctx.execute(&program).unwrap()
    }

    fn value_of(source: &str) -> JsValue {
        let mut ctx = EvalContext::new();
        let completion = run(&mut ctx, source);
        assert!(completion.is_normal(), "{:?}", completion);
        completion.value_or_undefined()
    }

    #[test]
    fn statement_list_keeps_last_produced_value() {
        assert_eq!(value_of("1; var a;"), JsValue::integer(1));
        assert_eq!(value_of("2; if (false) 3;"), JsValue::Undefined);
    }

    #[test]
    fn loop_value_is_last_body_value() {
        assert_eq!(value_of("var i = 0; while (i < 3) { i++; }"), JsValue::integer(2));
        assert_eq!(value_of("while (true) { 5; break; }"), JsValue::integer(5));
        assert_eq!(
            value_of("var i = 0; while (true) { i++; if (i == 3) break; i; }"),
            JsValue::Undefined
        );
    }

    #[test]
    fn labelled_continue_targets_outer_loop() {
        let source = "var n = 0;\n\
                      outer: for (var i = 0; i < 3; i++) {\n\
                        for (var j = 0; j < 3; j++) { if (j == 1) continue outer; n++; }\n\
                      }\n\
                      n;";
        let mut ctx = EvalContext::new();
        let completion = run(&mut ctx, source);
        match completion.value {
            Some(CompletionValue::Reference(r)) => {
                assert_eq!(r.get_value(&mut ctx).unwrap(), JsValue::integer(3))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn labelled_block_break() {
        assert_eq!(value_of("a: { 1; break a; 2; }"), JsValue::integer(1));
    }

    #[test]
    fn per_iteration_bindings_for_let() {
        let source = "var fs = [];\n\
                      for (let i = 0; i < 3; i++) { fs[i] = function () { return i; }; }\n\
                      fs[0]() + fs[1]() * 10 + fs[2]() * 100;";
        assert_eq!(value_of(source), JsValue::integer(210));
    }

    #[test]
    fn switch_falls_through_from_default() {
        let source = "var r = '';\n\
                      switch (5) { case 1: r += 'a'; default: r += 'd'; case 2: r += 'b'; break; case 3: r += 'c'; }\n\
                      r + '';";
        assert_eq!(value_of(source), JsValue::string("db"));
    }

    #[test]
    fn finally_overrides_only_when_abrupt() {
        let source = "function f() { try { return 1; } finally { 2; } }\n\
                      function g() { try { return 1; } finally { return 3; } }\n\
                      f() * 10 + g();";
        assert_eq!(value_of(source), JsValue::integer(13));
    }

    #[test]
    fn engine_errors_are_catchable_as_objects() {
        let source = "var r; try { undefinedName; } catch (e) { r = e.message; } r + '';";
        assert_eq!(value_of(source), JsValue::string("undefinedName is not defined"));
    }

    #[test]
    fn uncaught_throw_becomes_throw_completion() {
        let mut ctx = EvalContext::new();
        let completion = run(&mut ctx, "throw 42;");
        assert_eq!(completion.completion_type, CompletionType::Throw);
        assert_eq!(completion.value_or_undefined(), JsValue::integer(42));
        assert!(ctx.ctx_stack.is_empty());
    }

    #[test]
    fn global_lexical_redeclaration_across_programs() {
        let mut ctx = EvalContext::new();
        run(&mut ctx, "let a = 1;");
        let completion = run(&mut ctx, "var a = 2;");
        assert_eq!(completion.completion_type, CompletionType::Throw);
        assert_eq!(ctx.get_binding("a").unwrap(), JsValue::integer(1));
    }

    #[test]
    fn for_in_skips_deleted_keys() {
        let source = "var o = { a: 1, b: 2, c: 3 }; var seen = '';\n\
                      for (var k in o) { seen += k; delete o.b; }\n\
                      seen + '';";
        assert_eq!(value_of(source), JsValue::string("ac"));
    }
}
