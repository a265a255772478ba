//! Expression evaluation.
//!
//! Identifiers and property accesses evaluate to a [`Reference`] first
//! ([`evaluate_reference`]); assignment, `delete`, `typeof`, `++`/`--` and
//! calls work on that Reference, every other consumer dereferences it right
//! away through [`evaluate_expression`].

use std::rc::Rc;

use crate::parser::ast::{
    AssignmentOperator, BinaryOperator, ExpressionType, FunctionData, LiteralData, LiteralType,
    LogicalOperator, MemberExpressionType, NumberLiteralType, PropertyData, PropertyKind,
    UnaryOperator, UpdateOperator,
};
use crate::runner::ds::error::{EvalError, InternalFault, JErrorType};
use crate::runner::ds::object::ObjectType;
use crate::runner::ds::object_property::{PropertyDescriptor, PropertyDescriptorSetter};
use crate::runner::ds::operations::object::{
    call, construct, create_data_property, define_property_or_throw, object_create,
    ordinary_has_instance,
};
use crate::runner::ds::operations::test_and_comparison::{
    abstract_equality_comparison, abstract_relational_comparison, is_callable, is_constructor,
    strict_equality_comparison,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, primitive_to_string, to_boolean, to_int32, to_number, to_primitive,
    to_property_key, to_uint32, PreferredType,
};
use crate::runner::ds::realm::WellKnownIntrinsics;
use crate::runner::ds::value::JsValue;
use crate::runner::plugin::types::EvalContext;
use crate::stack::ensure_sufficient_stack;

use super::function::instantiate_function_expression;
use super::reference::Reference;
use super::types::ValueResult;

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    ensure_sufficient_stack(|| evaluate_expression_node(expr, ctx))
}

fn evaluate_expression_node(expr: &ExpressionType, ctx: &mut EvalContext) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::Identifier(_) | ExpressionType::MemberExpression(_) => {
            let reference = evaluate_reference(expr, ctx)?;
            reference.get_value(ctx)
        }

        ExpressionType::ThisExpression { .. } => Ok(ctx.this_binding()),

        ExpressionType::ArrayExpression { elements, .. } => {
            evaluate_array_expression(elements, ctx)
        }

        ExpressionType::ObjectExpression { properties, .. } => {
            evaluate_object_expression(properties, ctx)
        }

        ExpressionType::FunctionExpression(f) => Ok(JsValue::Object(
            instantiate_function_expression(ctx, f, None)?,
        )),

        ExpressionType::UnaryExpression {
            operator, argument, ..
        } => evaluate_unary_expression(*operator, argument, ctx),

        ExpressionType::UpdateExpression {
            operator,
            argument,
            prefix,
            ..
        } => evaluate_update_expression(*operator, argument, *prefix, ctx),

        ExpressionType::BinaryExpression {
            operator,
            left,
            right,
            ..
        } => {
            let lval = evaluate_expression(left, ctx)?;
            let rval = evaluate_expression(right, ctx)?;
            apply_binary_operator(*operator, &lval, &rval, ctx)
        }

        ExpressionType::LogicalExpression {
            operator,
            left,
            right,
            ..
        } => {
            let lval = evaluate_expression(left, ctx)?;
            let short_circuit = match operator {
                LogicalOperator::And => !to_boolean(&lval),
                LogicalOperator::Or => to_boolean(&lval),
            };
            if short_circuit {
                Ok(lval)
            } else {
                evaluate_expression(right, ctx)
            }
        }

        ExpressionType::AssignmentExpression {
            operator,
            left,
            right,
            ..
        } => evaluate_assignment_expression(*operator, left, right, ctx),

        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            if to_boolean(&evaluate_expression(test, ctx)?) {
                evaluate_expression(consequent, ctx)
            } else {
                evaluate_expression(alternate, ctx)
            }
        }

        ExpressionType::CallExpression {
            callee, arguments, ..
        } => evaluate_call_expression(callee, arguments, ctx),

        ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            let constructor = evaluate_expression(callee, ctx)?;
            let args = evaluate_arguments(arguments, ctx)?;
            if !is_constructor(&constructor) {
                return Err(JErrorType::TypeError(format!(
                    "{} is not a constructor",
                    describe_callee(callee)
                ))
                .into());
            }
            construct(ctx, &constructor, args)
        }

        ExpressionType::SequenceExpression { expressions, .. } => {
            let mut value = JsValue::Undefined;
            for e in expressions {
                value = evaluate_expression(e, ctx)?;
            }
            Ok(value)
        }
    }
}

/// Whether an expression evaluates to a Reference rather than a value.
pub fn is_reference_expression(expr: &ExpressionType) -> bool {
    expr.is_valid_simple_assignment_target()
}

/// Evaluate an identifier or property access to a Reference without
/// reading it.
pub fn evaluate_reference(
    expr: &ExpressionType,
    ctx: &mut EvalContext,
) -> Result<Reference, EvalError> {
    let strict = ctx.is_strict();
    match expr {
        ExpressionType::Identifier(id) => Ok(Reference::resolve(&ctx.lex_env(), &id.name, strict)),
        ExpressionType::MemberExpression(member) => {
            let (base, key) = match member {
                MemberExpressionType::SimpleMemberExpression {
                    object, property, ..
                } => (evaluate_expression(object, ctx)?, property.name.to_string()),
                MemberExpressionType::ComputedMemberExpression {
                    object, property, ..
                } => {
                    let base = evaluate_expression(object, ctx)?;
                    let key_value = evaluate_expression(property, ctx)?;
                    if base.is_nullish() {
                        return Err(cannot_read_property(&base, &primitive_to_string(&key_value)));
                    }
                    (base, to_property_key(ctx, &key_value)?)
                }
            };
            if base.is_nullish() {
                return Err(cannot_read_property(&base, &key));
            }
            Ok(Reference::property(base, key, strict))
        }
        _ => Err(InternalFault::new("expression does not denote a reference").into()),
    }
}

fn cannot_read_property(base: &JsValue, key: &str) -> EvalError {
    JErrorType::TypeError(format!(
        "Cannot read property '{}' of {}",
        key,
        primitive_to_string(base)
    ))
    .into()
}

/// Evaluates `expr`, naming an anonymous function expression after the
/// binding or property it is assigned to.
pub fn evaluate_named_expression(
    expr: &ExpressionType,
    name: &str,
    ctx: &mut EvalContext,
) -> ValueResult {
    match expr {
        ExpressionType::FunctionExpression(f) if f.id.is_none() => Ok(JsValue::Object(
            instantiate_function_expression(ctx, f, Some(name))?,
        )),
        _ => evaluate_expression(expr, ctx),
    }
}

fn evaluate_literal(lit: &LiteralData) -> JsValue {
    match &lit.value {
        LiteralType::NullLiteral => JsValue::Null,
        LiteralType::BooleanLiteral(b) => JsValue::Boolean(*b),
        LiteralType::StringLiteral(s) => JsValue::String(s.clone()),
        LiteralType::NumberLiteral(NumberLiteralType::IntegerLiteral(i)) => JsValue::integer(*i),
        LiteralType::NumberLiteral(NumberLiteralType::FloatLiteral(f)) => JsValue::number(*f),
    }
}

fn evaluate_array_expression(
    elements: &[Option<ExpressionType>],
    ctx: &mut EvalContext,
) -> ValueResult {
    let array =
        ObjectType::new_array(ctx.realm.intrinsic(WellKnownIntrinsics::ArrayPrototype)).into_ref();
    for (index, element) in elements.iter().enumerate() {
        if let Some(e) = element {
            let value = evaluate_expression(e, ctx)?;
            array
                .borrow_mut()
                .insert_property(index.to_string(), PropertyDescriptor::new_data(value));
        }
    }
    // Holes at the end still count towards the length.
    array.borrow_mut().define_own_property(
        "length".to_string(),
        PropertyDescriptorSetter::value_only(JsValue::integer(elements.len() as i64)),
    );
    Ok(JsValue::Object(array))
}

fn evaluate_object_expression(properties: &[PropertyData], ctx: &mut EvalContext) -> ValueResult {
    let object = object_create(ctx);
    for property in properties {
        match property.kind {
            PropertyKind::Init => {
                let value = evaluate_named_expression(&property.value, &property.key, ctx)?;
                create_data_property(&object, &property.key, value);
            }
            PropertyKind::Get | PropertyKind::Set => {
                let accessor = match &property.value {
                    ExpressionType::FunctionExpression(f) => {
                        instantiate_function_expression(ctx, f, Some(&property.key))?
                    }
                    _ => {
                        return Err(InternalFault::new("accessor without a function body").into())
                    }
                };
                let mut desc = PropertyDescriptorSetter {
                    enumerable: Some(true),
                    configurable: Some(true),
                    ..PropertyDescriptorSetter::default()
                };
                if property.kind == PropertyKind::Get {
                    desc.get = Some(Some(accessor));
                } else {
                    desc.set = Some(Some(accessor));
                }
                define_property_or_throw(&object, &property.key, desc)?;
            }
        }
    }
    Ok(JsValue::Object(object))
}

fn evaluate_unary_expression(
    operator: UnaryOperator,
    argument: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    match operator {
        UnaryOperator::Delete => {
            if is_reference_expression(argument) {
                let reference = evaluate_reference(argument, ctx)?;
                Ok(JsValue::Boolean(reference.delete(ctx)?))
            } else {
                evaluate_expression(argument, ctx)?;
                Ok(JsValue::Boolean(true))
            }
        }
        UnaryOperator::TypeOf => {
            let type_str = if is_reference_expression(argument) {
                evaluate_reference(argument, ctx)?.type_of(ctx)?
            } else {
                get_type(&evaluate_expression(argument, ctx)?)
            };
            Ok(JsValue::string(type_str))
        }
        UnaryOperator::Void => {
            evaluate_expression(argument, ctx)?;
            Ok(JsValue::Undefined)
        }
        UnaryOperator::Minus => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::number(-to_number(ctx, &v)?))
        }
        UnaryOperator::Plus => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::number(to_number(ctx, &v)?))
        }
        UnaryOperator::LogicalNot => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::Boolean(!to_boolean(&v)))
        }
        UnaryOperator::BitwiseNot => {
            let v = evaluate_expression(argument, ctx)?;
            Ok(JsValue::integer(!to_int32(ctx, &v)? as i64))
        }
    }
}

fn evaluate_update_expression(
    operator: UpdateOperator,
    argument: &ExpressionType,
    prefix: bool,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = evaluate_reference(argument, ctx)?;
    let old_value = reference.get_value(ctx)?;
    let old = to_number(ctx, &old_value)?;
    let new = match operator {
        UpdateOperator::PlusPlus => old + 1.0,
        UpdateOperator::MinusMinus => old - 1.0,
    };
    reference.put_value(ctx, JsValue::number(new))?;
    Ok(JsValue::number(if prefix { new } else { old }))
}

fn evaluate_assignment_expression(
    operator: AssignmentOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    ctx: &mut EvalContext,
) -> ValueResult {
    let reference = evaluate_reference(left, ctx)?;
    let value = match operator.binary_operator() {
        None => match left {
            ExpressionType::Identifier(id) => evaluate_named_expression(right, &id.name, ctx)?,
            _ => evaluate_expression(right, ctx)?,
        },
        Some(op) => {
            let lval = reference.get_value(ctx)?;
            let rval = evaluate_expression(right, ctx)?;
            apply_binary_operator(op, &lval, &rval, ctx)?
        }
    };
    reference.put_value(ctx, value.clone())?;
    Ok(value)
}

fn evaluate_arguments(
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> Result<Vec<JsValue>, EvalError> {
    let mut values = Vec::with_capacity(arguments.len());
    for a in arguments {
        values.push(evaluate_expression(a, ctx)?);
    }
    Ok(values)
}

fn evaluate_call_expression(
    callee: &ExpressionType,
    arguments: &[ExpressionType],
    ctx: &mut EvalContext,
) -> ValueResult {
    let (func, this_value) = if is_reference_expression(callee) {
        let reference = evaluate_reference(callee, ctx)?;
        let func = reference.get_value(ctx)?;
        (func, reference.get_this_value())
    } else {
        (evaluate_expression(callee, ctx)?, JsValue::Undefined)
    };
    let args = evaluate_arguments(arguments, ctx)?;
    if !is_callable(&func) {
        return Err(JErrorType::TypeError(format!(
            "{} is not a function",
            describe_callee(callee)
        ))
        .into());
    }
    call(ctx, &func, this_value, args)
}

/// Source-like rendering of a callee for error messages.
fn describe_callee(callee: &ExpressionType) -> String {
    match callee {
        ExpressionType::Identifier(id) => id.name.to_string(),
        ExpressionType::ThisExpression { .. } => "this".to_string(),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            property,
            ..
        }) => format!("{}.{}", describe_callee(object), property.name),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => format!("{}[...]", describe_callee(object)),
        ExpressionType::FunctionExpression(f) => describe_function(f),
        _ => "expression".to_string(),
    }
}

fn describe_function(f: &Rc<FunctionData>) -> String {
    match &f.id {
        Some(id) => format!("function {}", id.name),
        None => "function".to_string(),
    }
}

/// Applies a binary operator to two evaluated operands. Shared by binary
/// expressions and compound assignment.
pub fn apply_binary_operator(
    operator: BinaryOperator,
    lval: &JsValue,
    rval: &JsValue,
    ctx: &mut EvalContext,
) -> ValueResult {
    Ok(match operator {
        BinaryOperator::Add => {
            let lprim = to_primitive(ctx, lval, PreferredType::Default)?;
            let rprim = to_primitive(ctx, rval, PreferredType::Default)?;
            if let (JsValue::String(_), _) | (_, JsValue::String(_)) = (&lprim, &rprim) {
                let mut s = primitive_to_string(&lprim);
                s.push_str(&primitive_to_string(&rprim));
                JsValue::String(s)
            } else {
                JsValue::number(to_number(ctx, &lprim)? + to_number(ctx, &rprim)?)
            }
        }
        BinaryOperator::Subtract => JsValue::number(to_number(ctx, lval)? - to_number(ctx, rval)?),
        BinaryOperator::Multiply => JsValue::number(to_number(ctx, lval)? * to_number(ctx, rval)?),
        BinaryOperator::Divide => JsValue::number(to_number(ctx, lval)? / to_number(ctx, rval)?),
        BinaryOperator::Modulo => JsValue::number(to_number(ctx, lval)? % to_number(ctx, rval)?),
        BinaryOperator::BitwiseLeftShift => {
            let l = to_int32(ctx, lval)?;
            let shift = to_uint32(ctx, rval)? & 0x1F;
            JsValue::integer(l.wrapping_shl(shift) as i64)
        }
        BinaryOperator::BitwiseRightShift => {
            let l = to_int32(ctx, lval)?;
            let shift = to_uint32(ctx, rval)? & 0x1F;
            JsValue::integer((l >> shift) as i64)
        }
        BinaryOperator::BitwiseUnsignedRightShift => {
            let l = to_uint32(ctx, lval)?;
            let shift = to_uint32(ctx, rval)? & 0x1F;
            JsValue::integer((l >> shift) as i64)
        }
        BinaryOperator::BitwiseAnd => {
            JsValue::integer((to_int32(ctx, lval)? & to_int32(ctx, rval)?) as i64)
        }
        BinaryOperator::BitwiseOr => {
            JsValue::integer((to_int32(ctx, lval)? | to_int32(ctx, rval)?) as i64)
        }
        BinaryOperator::BitwiseXor => {
            JsValue::integer((to_int32(ctx, lval)? ^ to_int32(ctx, rval)?) as i64)
        }
        BinaryOperator::LessThan => JsValue::Boolean(
            abstract_relational_comparison(ctx, lval, rval, true)? == Some(true),
        ),
        BinaryOperator::GreaterThan => JsValue::Boolean(
            abstract_relational_comparison(ctx, rval, lval, false)? == Some(true),
        ),
        BinaryOperator::LessThanEqual => JsValue::Boolean(
            abstract_relational_comparison(ctx, rval, lval, false)? == Some(false),
        ),
        BinaryOperator::GreaterThanEqual => JsValue::Boolean(
            abstract_relational_comparison(ctx, lval, rval, true)? == Some(false),
        ),
        BinaryOperator::LooselyEqual => {
            JsValue::Boolean(abstract_equality_comparison(ctx, lval, rval)?)
        }
        BinaryOperator::LooselyUnequal => {
            JsValue::Boolean(!abstract_equality_comparison(ctx, lval, rval)?)
        }
        BinaryOperator::StrictlyEqual => JsValue::Boolean(strict_equality_comparison(lval, rval)),
        BinaryOperator::StrictlyUnequal => {
            JsValue::Boolean(!strict_equality_comparison(lval, rval))
        }
        BinaryOperator::InstanceOf => {
            if rval.as_object().is_none() {
                return Err(JErrorType::TypeError(
                    "Right-hand side of 'instanceof' is not an object".to_string(),
                )
                .into());
            }
            JsValue::Boolean(ordinary_has_instance(ctx, rval, lval)?)
        }
        BinaryOperator::In => {
            let target = match rval {
                JsValue::Object(o) => o.clone(),
                _ => {
                    return Err(JErrorType::TypeError(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        primitive_to_string(lval),
                        primitive_to_string(rval)
                    ))
                    .into())
                }
            };
            let key = to_property_key(ctx, lval)?;
            let found = target.borrow().has_property(&key);
            JsValue::Boolean(found)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> JsValue {
        JsValue::number(n)
    }

    #[test]
    fn addition_concatenates_when_either_side_is_a_string() {
        let mut ctx = EvalContext::new();
        let v = apply_binary_operator(BinaryOperator::Add, &JsValue::string("a"), &num(1.0), &mut ctx);
        assert_eq!(v.unwrap(), JsValue::string("a1"));
        let v = apply_binary_operator(BinaryOperator::Add, &num(1.5), &num(2.5), &mut ctx);
        assert_eq!(v.unwrap(), JsValue::integer(4));
    }

    #[test]
    fn shifts_use_int32_semantics() {
        let mut ctx = EvalContext::new();
        let v = apply_binary_operator(BinaryOperator::BitwiseLeftShift, &num(1.0), &num(33.0), &mut ctx);
        assert_eq!(v.unwrap(), JsValue::integer(2));
        let v = apply_binary_operator(
            BinaryOperator::BitwiseUnsignedRightShift,
            &num(-1.0),
            &num(0.0),
            &mut ctx,
        );
        assert_eq!(v.unwrap(), JsValue::integer(4294967295));
        let v = apply_binary_operator(BinaryOperator::BitwiseRightShift, &num(-8.0), &num(1.0), &mut ctx);
        assert_eq!(v.unwrap(), JsValue::integer(-4));
    }

    #[test]
    fn comparisons_with_nan_are_false() {
        let mut ctx = EvalContext::new();
        for op in [
            BinaryOperator::LessThan,
            BinaryOperator::LessThanEqual,
            BinaryOperator::GreaterThan,
            BinaryOperator::GreaterThanEqual,
        ]
        .iter()
        {
            let v = apply_binary_operator(*op, &num(f64::NAN), &num(1.0), &mut ctx).unwrap();
            assert_eq!(v, JsValue::Boolean(false));
        }
    }

    #[test]
    fn in_requires_an_object() {
        let mut ctx = EvalContext::new();
        let r = apply_binary_operator(BinaryOperator::In, &JsValue::string("a"), &num(1.0), &mut ctx);
        assert!(matches!(r, Err(EvalError::Error(JErrorType::TypeError(_)))));
    }
}
