// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Constant evaluation.
//!
//! [`Session::evaluate`] folds an expression to a [`JsValue`] when its value
//! is known statically: literals, operators over known operands, templates,
//! array literals, and identifiers bound to constants. Anything else
//! produces [`NotConstant`] naming the path that stopped evaluation.

use std::cmp::Ordering;
use std::fmt;

use scopewalk_ast::{Alias, Field, NodeId, NodeKind, NodeValue};
use serde::Serialize;
use thiserror::Error;

use crate::path::PathId;
use crate::scope::BindingKind;
use crate::session::Session;

// ============================================================================
// Values
// ============================================================================

/// A statically known JavaScript value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<JsValue>),
}

/// Evaluation reached something whose value is not known statically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("value at {path} is not a constant")]
pub struct NotConstant {
    /// The path that could not be evaluated.
    pub path: PathId,
}

impl JsValue {
    /// ToBoolean.
    pub fn is_truthy(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(value) => *value,
            JsValue::Number(value) => *value != 0.0 && !value.is_nan(),
            JsValue::String(value) => !value.is_empty(),
            JsValue::Array(_) => true,
        }
    }

    /// The `typeof` string.
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null | JsValue::Array(_) => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
        }
    }

    fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    /// ToPrimitive. Arrays become their string form.
    fn to_primitive(&self) -> JsValue {
        match self {
            JsValue::Array(_) => JsValue::String(self.to_js_string()),
            other => other.clone(),
        }
    }

    /// ToNumber.
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(value) => f64::from(u8::from(*value)),
            JsValue::Number(value) => *value,
            JsValue::String(value) => string_to_number(value),
            JsValue::Array(_) => self.to_primitive().to_number(),
        }
    }

    /// ToString.
    pub fn to_js_string(&self) -> String {
        match self {
            JsValue::Undefined => "undefined".to_string(),
            JsValue::Null => "null".to_string(),
            JsValue::Boolean(value) => value.to_string(),
            JsValue::Number(value) => number_to_string(*value),
            JsValue::String(value) => value.clone(),
            JsValue::Array(elements) => elements
                .iter()
                .map(|element| {
                    if element.is_nullish() {
                        String::new()
                    } else {
                        element.to_js_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::String(value) => write!(f, "{:?}", value),
            JsValue::Array(elements) => {
                f.write_str("[")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            other => f.write_str(&other.to_js_string()),
        }
    }
}

/// Number::toString with radix 10.
pub(crate) fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    // Shortest round-trip digits and exponent, e.g. "1.25e-7".
    let scientific = format!("{:e}", value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let exp_sign = if n - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, exp_sign, (n - 1).abs())
        } else {
            format!("{}.{}e{}{}", first, rest, exp_sign, (n - 1).abs())
        }
    };
    format!("{}{}", sign, body)
}

/// StringToNumber.
fn string_to_number(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix = |prefix: &[&str], radix: u32| -> Option<f64> {
        let digits = prefix.iter().find_map(|p| trimmed.strip_prefix(*p))?;
        Some(
            u64::from_str_radix(digits, radix)
                .map(|value| value as f64)
                .unwrap_or(f64::NAN),
        )
    };
    if let Some(value) = radix(&["0x", "0X"], 16)
        .or_else(|| radix(&["0o", "0O"], 8))
        .or_else(|| radix(&["0b", "0B"], 2))
    {
        return value;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let numeric = trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !numeric {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn to_uint32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn to_int32(value: f64) -> i32 {
    to_uint32(value) as i32
}

// ============================================================================
// Operators
// ============================================================================

/// IsStrictlyEqual. `None` when identity decides (two arrays).
fn strict_equals(left: &JsValue, right: &JsValue) -> Option<bool> {
    match (left, right) {
        (JsValue::Array(_), JsValue::Array(_)) => None,
        (JsValue::Number(a), JsValue::Number(b)) => Some(a == b),
        (a, b) => Some(a == b),
    }
}

/// IsLooselyEqual.
fn loose_equals(left: &JsValue, right: &JsValue) -> Option<bool> {
    use JsValue::*;
    match (left, right) {
        (Array(_), Array(_)) => None,
        (a, b) if a.is_nullish() && b.is_nullish() => Some(true),
        (a, b) if a.is_nullish() || b.is_nullish() => Some(false),
        (Array(_), _) | (_, Array(_)) => loose_equals_primitive(&left.to_primitive(), &right.to_primitive()),
        _ => loose_equals_primitive(left, right),
    }
}

fn loose_equals_primitive(left: &JsValue, right: &JsValue) -> Option<bool> {
    use JsValue::*;
    match (left, right) {
        (String(a), String(b)) => Some(a == b),
        (Boolean(a), Boolean(b)) => Some(a == b),
        (a, b) if a.is_nullish() || b.is_nullish() => Some(a.is_nullish() && b.is_nullish()),
        (a, b) => Some(a.to_number() == b.to_number()),
    }
}

/// IsLessThan; `None` stands for `undefined` (a NaN operand).
fn less_than(left: &JsValue, right: &JsValue) -> Option<bool> {
    let (left, right) = (left.to_primitive(), right.to_primitive());
    if let (JsValue::String(a), JsValue::String(b)) = (&left, &right) {
        let a: Vec<u16> = a.encode_utf16().collect();
        let b: Vec<u16> = b.encode_utf16().collect();
        return Some(a.cmp(&b) == Ordering::Less);
    }
    let (a, b) = (left.to_number(), right.to_number());
    if a.is_nan() || b.is_nan() {
        return None;
    }
    Some(a < b)
}

fn power(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() || (base.abs() == 1.0 && exponent.is_infinite()) {
        return f64::NAN;
    }
    base.powf(exponent)
}

fn binary(operator: &str, left: &JsValue, right: &JsValue) -> Option<JsValue> {
    let number = |op: fn(f64, f64) -> f64| Some(JsValue::Number(op(left.to_number(), right.to_number())));
    let int32 = |op: fn(i32, i32) -> i32| {
        Some(JsValue::Number(f64::from(op(
            to_int32(left.to_number()),
            to_int32(right.to_number()),
        ))))
    };
    let shift = right.to_number();
    match operator {
        "+" => {
            let (a, b) = (left.to_primitive(), right.to_primitive());
            if matches!(a, JsValue::String(_)) || matches!(b, JsValue::String(_)) {
                Some(JsValue::String(a.to_js_string() + &b.to_js_string()))
            } else {
                Some(JsValue::Number(a.to_number() + b.to_number()))
            }
        }
        "-" => number(|a, b| a - b),
        "*" => number(|a, b| a * b),
        "/" => number(|a, b| a / b),
        "%" => number(|a, b| a % b),
        "**" => number(power),
        "&" => int32(|a, b| a & b),
        "|" => int32(|a, b| a | b),
        "^" => int32(|a, b| a ^ b),
        "<<" => Some(JsValue::Number(f64::from(
            to_int32(left.to_number()).wrapping_shl(to_uint32(shift) & 31),
        ))),
        ">>" => Some(JsValue::Number(f64::from(
            to_int32(left.to_number()).wrapping_shr(to_uint32(shift) & 31),
        ))),
        ">>>" => Some(JsValue::Number(f64::from(
            to_uint32(left.to_number()).wrapping_shr(to_uint32(shift) & 31),
        ))),
        "===" => strict_equals(left, right).map(JsValue::Boolean),
        "!==" => strict_equals(left, right).map(|equal| JsValue::Boolean(!equal)),
        "==" => loose_equals(left, right).map(JsValue::Boolean),
        "!=" => loose_equals(left, right).map(|equal| JsValue::Boolean(!equal)),
        "<" => Some(JsValue::Boolean(less_than(left, right).unwrap_or(false))),
        ">" => Some(JsValue::Boolean(less_than(right, left).unwrap_or(false))),
        "<=" => Some(JsValue::Boolean(less_than(right, left).is_some_and(|less| !less))),
        ">=" => Some(JsValue::Boolean(less_than(left, right).is_some_and(|less| !less))),
        _ => None,
    }
}

// ============================================================================
// Evaluation
// ============================================================================

type Evaluated = Result<JsValue, NotConstant>;

impl Session {
    /// The value of the expression at `path`, if it is a compile-time
    /// constant.
    pub fn evaluate(&mut self, path: PathId) -> Result<JsValue, NotConstant> {
        let mut seen = Vec::new();
        self.evaluate_cached(path, &mut seen)
    }

    /// Truthiness of the expression at `path`, when known.
    pub fn evaluate_truthy(&mut self, path: PathId) -> Option<bool> {
        self.evaluate(path).ok().map(|value| value.is_truthy())
    }

    /// `seen` holds the nodes being evaluated further up the recursion; a
    /// revisit means a definition refers to itself.
    fn evaluate_cached(&mut self, path: PathId, seen: &mut Vec<NodeId>) -> Evaluated {
        let deopt = NotConstant { path };
        let node = self.path_node(path).ok_or(deopt)?;
        if seen.contains(&node) {
            return Err(deopt);
        }
        seen.push(node);
        let result = self.evaluate_node(path, node, seen);
        seen.pop();
        result
    }

    fn evaluate_child(&mut self, path: PathId, field: Field, seen: &mut Vec<NodeId>) -> Evaluated {
        let child = self.get_field(path, field).map_err(|_| NotConstant { path })?;
        self.evaluate_cached(child, seen)
    }

    fn evaluate_node(&mut self, path: PathId, node: NodeId, seen: &mut Vec<NodeId>) -> Evaluated {
        let deopt = NotConstant { path };
        let record = self.arena.get(node);
        match record.kind() {
            NodeKind::StringLiteral | NodeKind::NumericLiteral | NodeKind::BooleanLiteral => match &record.value {
                NodeValue::String(value) => Ok(JsValue::String(value.clone())),
                NodeValue::Number(value) => Ok(JsValue::Number(*value)),
                NodeValue::Boolean(value) => Ok(JsValue::Boolean(*value)),
                _ => Err(deopt),
            },
            NodeKind::NullLiteral => Ok(JsValue::Null),
            NodeKind::SequenceExpression => {
                let expressions = self.get_list(path, Field::Expressions).map_err(|_| deopt)?;
                let last = expressions.last().copied().ok_or(deopt)?;
                self.evaluate_cached(last, seen)
            }
            NodeKind::ParenthesizedExpression => self.evaluate_child(path, Field::Expression, seen),
            NodeKind::TemplateLiteral => self.evaluate_quasis(path, false, seen),
            NodeKind::TaggedTemplateExpression => {
                let tag = self.get_field(path, Field::Tag).map_err(|_| deopt)?;
                let tag_node = self.path_node(tag).ok_or(deopt)?;
                let scope = self.scope_of(path).map_err(|_| deopt)?;
                let raw = scopewalk_ast::validators::matches_pattern(&self.arena, tag_node, "String.raw", false)
                    && self.get_binding(scope, "String").is_none();
                if !raw {
                    return Err(deopt);
                }
                let quasi = self.get_field(path, Field::Quasi).map_err(|_| deopt)?;
                self.evaluate_quasis(quasi, true, seen)
            }
            NodeKind::ConditionalExpression => {
                let test = self.evaluate_child(path, Field::Test, seen)?;
                let branch = if test.is_truthy() {
                    Field::Consequent
                } else {
                    Field::Alternate
                };
                self.evaluate_child(path, branch, seen)
            }
            NodeKind::MemberExpression => self.evaluate_member(path, node, seen),
            NodeKind::Identifier => self.evaluate_identifier(path, node, seen),
            NodeKind::UnaryExpression => self.evaluate_unary(path, node, seen),
            NodeKind::ArrayExpression => {
                let mut values = Vec::new();
                for element in self.get_list(path, Field::Elements).map_err(|_| deopt)? {
                    if self.is_spread_element(element) {
                        return Err(NotConstant { path: element });
                    }
                    values.push(self.evaluate_cached(element, seen)?);
                }
                Ok(JsValue::Array(values))
            }
            NodeKind::LogicalExpression => {
                let operator = record.operator().unwrap_or_default().to_string();
                let left = self.evaluate_child(path, Field::Left, seen)?;
                let use_left = match operator.as_str() {
                    "||" => left.is_truthy(),
                    "&&" => !left.is_truthy(),
                    "??" => !left.is_nullish(),
                    _ => return Err(deopt),
                };
                if use_left {
                    Ok(left)
                } else {
                    self.evaluate_child(path, Field::Right, seen)
                }
            }
            NodeKind::BinaryExpression => {
                let operator = record.operator().unwrap_or_default().to_string();
                let left = self.evaluate_child(path, Field::Left, seen)?;
                let right = self.evaluate_child(path, Field::Right, seen)?;
                binary(&operator, &left, &right).ok_or(deopt)
            }
            _ => Err(deopt),
        }
    }

    fn evaluate_quasis(&mut self, path: PathId, use_raw: bool, seen: &mut Vec<NodeId>) -> Evaluated {
        let deopt = NotConstant { path };
        let quasis = self.get_list(path, Field::Quasis).map_err(|_| deopt)?;
        let expressions = self.get_list(path, Field::Expressions).map_err(|_| deopt)?;
        let mut out = String::new();
        for (index, quasi) in quasis.iter().enumerate() {
            let node = self.path_node(*quasi).ok_or(deopt)?;
            match &self.arena.get(node).value {
                NodeValue::Template { raw, .. } if use_raw => out.push_str(raw),
                NodeValue::Template {
                    cooked: Some(cooked), ..
                } => out.push_str(cooked),
                _ => return Err(NotConstant { path: *quasi }),
            }
            if let Some(expression) = expressions.get(index) {
                out.push_str(&self.evaluate_cached(*expression, seen)?.to_js_string());
            }
        }
        Ok(JsValue::String(out))
    }

    /// `"abc".length`, `"abc"[1]` and `[1, 2].length` on literal objects.
    fn evaluate_member(&mut self, path: PathId, node: NodeId, seen: &mut Vec<NodeId>) -> Evaluated {
        let deopt = NotConstant { path };
        let is_callee = self.key(path) == Some(Field::Callee)
            && self.parent_path(path).is_some_and(|parent| self.is_call_expression(parent));
        if is_callee {
            return Err(deopt);
        }
        let object = self.get_field(path, Field::Object).map_err(|_| deopt)?;
        let object_node = self.path_node(object).ok_or(deopt)?;
        if !self.arena.is(object_node, Alias::Literal) && !self.is_array_expression(object) {
            return Err(deopt);
        }
        let key = if self.arena.get(node).flags.computed {
            self.evaluate_child(path, Field::Property, seen)?
        } else {
            let property = self.arena.child(node, Field::Property).ok_or(deopt)?;
            JsValue::String(self.arena.name(property).ok_or(deopt)?.to_string())
        };
        let value = self.evaluate_cached(object, seen)?;
        match (&value, &key) {
            (JsValue::String(text), JsValue::String(name)) if name == "length" => {
                Ok(JsValue::Number(text.encode_utf16().count() as f64))
            }
            (JsValue::Array(elements), JsValue::String(name)) if name == "length" => {
                Ok(JsValue::Number(elements.len() as f64))
            }
            (JsValue::String(text), JsValue::Number(index)) => {
                let units: Vec<u16> = text.encode_utf16().collect();
                let at = index_of(*index).and_then(|index| units.get(index)).ok_or(deopt)?;
                Ok(JsValue::String(String::from_utf16_lossy(&[*at])))
            }
            (JsValue::Array(elements), JsValue::Number(index)) => index_of(*index)
                .and_then(|index| elements.get(index))
                .cloned()
                .ok_or(deopt),
            _ => Err(deopt),
        }
    }

    fn evaluate_identifier(&mut self, path: PathId, node: NodeId, seen: &mut Vec<NodeId>) -> Evaluated {
        let deopt = NotConstant { path };
        if !self.is_referenced_identifier(path) {
            return Err(deopt);
        }
        let name = self.arena.name(node).ok_or(deopt)?.to_string();
        let scope = self.scope_of(path).map_err(|_| deopt)?;
        let binding = self.get_binding(scope, &name);

        if let Some(binding) = binding {
            let record = self.binding(binding);
            if !record.constant_violations().is_empty() || self.used_before_declared(node, record.path()) {
                return Err(deopt);
            }
            if let Some(value) = record.value() {
                return Ok(value.clone());
            }
        }
        match name.as_str() {
            "undefined" | "Infinity" | "NaN" if binding.is_some() => return Err(deopt),
            "undefined" => return Ok(JsValue::Undefined),
            "Infinity" => return Ok(JsValue::Number(f64::INFINITY)),
            "NaN" => return Ok(JsValue::Number(f64::NAN)),
            _ => {}
        }

        let binding = binding.ok_or(deopt)?;
        let record = self.binding(binding);
        if !record.is_constant() || record.kind() == BindingKind::Module {
            return Err(deopt);
        }
        let declarator = record.path();
        if !self.is_variable_declarator(declarator) {
            return Err(deopt);
        }
        let id = self.get_field(declarator, Field::Id).map_err(|_| deopt)?;
        if !self.is_identifier(id) {
            return Err(deopt);
        }
        let init = self.get_field(declarator, Field::Init).map_err(|_| deopt)?;
        let value = self.evaluate_cached(init, seen)?;
        self.binding_mut(binding).set_value(value.clone());
        Ok(value)
    }

    /// A read that comes before its declaration in the source sees the
    /// hoisted or uninitialised value.
    fn used_before_declared(&self, node: NodeId, declaration: PathId) -> bool {
        let Some(declared) = self.path_node(declaration) else {
            return false;
        };
        match (self.arena.get(node).span, self.arena.get(declared).span) {
            (Some(used), Some(declared)) => used.start < declared.start,
            _ => false,
        }
    }

    fn evaluate_unary(&mut self, path: PathId, node: NodeId, seen: &mut Vec<NodeId>) -> Evaluated {
        let deopt = NotConstant { path };
        let operator = self.arena.get(node).operator().unwrap_or_default().to_string();
        if operator == "void" {
            return Ok(JsValue::Undefined);
        }
        let argument = self.get_field(path, Field::Argument).map_err(|_| deopt)?;
        if operator == "typeof" && (self.is_function(argument) || self.is_class(argument)) {
            return Ok(JsValue::String("function".to_string()));
        }
        let value = self.evaluate_cached(argument, seen)?;
        match operator.as_str() {
            "!" => Ok(JsValue::Boolean(!value.is_truthy())),
            "+" => Ok(JsValue::Number(value.to_number())),
            "-" => Ok(JsValue::Number(-value.to_number())),
            "~" => Ok(JsValue::Number(f64::from(!to_int32(value.to_number())))),
            "typeof" => Ok(JsValue::String(value.type_of().to_string())),
            _ => Err(deopt),
        }
    }
}

/// An array index from a numeric key.
fn index_of(value: f64) -> Option<usize> {
    (value >= 0.0 && value.fract() == 0.0 && value < usize::MAX as f64).then_some(value as usize)
}
