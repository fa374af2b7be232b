// Renderer expression AST
//
// Expressions are built as typed trees and serialized into the engine's
// expression-string syntax only at the boundary.

use crate::ir::{ScaleRef, SignalRef};
use serde::{Serialize, Serializer};
use std::fmt;

/// Binary operators supported in expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Mul,
    Div,
    Gt,
    StrictEq,
    And,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Gt => ">",
            BinOp::StrictEq => "===",
            BinOp::And => "&&",
        }
    }
}

/// A renderer expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Free-form expression text supplied by the caller. Not inspected.
    Raw(String),
    Num(f64),
    /// The current datum.
    Datum,
    /// `datum["field"]`
    Field(String),
    /// `object.member`
    Member(Box<Expr>, String),
    /// A named signal.
    Signal(SignalRef),
    /// `scale("name", operand)`
    ScaleLookup(ScaleRef, Box<Expr>),
    /// `bandwidth("name")`
    Bandwidth(ScaleRef),
    /// `domain("name")`
    Domain(ScaleRef),
    /// `range("name")`
    Range(ScaleRef),
    /// `timeFormat(operand, "pattern")`
    TimeFormat(Box<Expr>, String),
    /// `format(operand, "pattern")`
    NumberFormat(Box<Expr>, String),
    /// `operand[index]`
    Index(Box<Expr>, usize),
    /// Call to a built-in function such as `clamp`, `length` or `toString`.
    Call(&'static str, Vec<Expr>),
    Binary(Box<Expr>, BinOp, Box<Expr>),
    /// `test ? then : otherwise`
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    /// `{ key: value, ... }` with bare keys
    Object(Vec<(String, Expr)>),
    /// `{ "key": value, ... }` with quoted keys
    QuotedObject(Vec<(String, Expr)>),
}

impl Expr {
    pub fn raw(text: impl Into<String>) -> Self {
        Expr::Raw(text.into())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field(name.into())
    }

    pub fn num(value: f64) -> Self {
        Expr::Num(value)
    }

    pub fn signal(name: &SignalRef) -> Self {
        Expr::Signal(name.clone())
    }

    pub fn member(self, name: impl Into<String>) -> Self {
        Expr::Member(Box::new(self), name.into())
    }

    pub fn scale_lookup(scale: &ScaleRef, operand: Expr) -> Self {
        Expr::ScaleLookup(scale.clone(), Box::new(operand))
    }

    pub fn time_format(operand: Expr, pattern: impl Into<String>) -> Self {
        Expr::TimeFormat(Box::new(operand), pattern.into())
    }

    pub fn number_format(operand: Expr, pattern: impl Into<String>) -> Self {
        Expr::NumberFormat(Box::new(operand), pattern.into())
    }

    pub fn index(self, index: usize) -> Self {
        Expr::Index(Box::new(self), index)
    }

    pub fn call(name: &'static str, args: Vec<Expr>) -> Self {
        Expr::Call(name, args)
    }

    pub fn length(self) -> Self {
        Expr::call("length", vec![self])
    }

    pub fn clamp(self, min: f64, max: f64) -> Self {
        Expr::call("clamp", vec![self, Expr::Num(min), Expr::Num(max)])
    }

    pub fn binary(self, op: BinOp, rhs: Expr) -> Self {
        Expr::Binary(Box::new(self), op, Box::new(rhs))
    }

    pub fn add(self, rhs: Expr) -> Self {
        self.binary(BinOp::Add, rhs)
    }

    pub fn mul(self, rhs: Expr) -> Self {
        self.binary(BinOp::Mul, rhs)
    }

    pub fn div(self, rhs: Expr) -> Self {
        self.binary(BinOp::Div, rhs)
    }

    pub fn gt(self, rhs: Expr) -> Self {
        self.binary(BinOp::Gt, rhs)
    }

    pub fn strict_eq(self, rhs: Expr) -> Self {
        self.binary(BinOp::StrictEq, rhs)
    }

    pub fn and(self, rhs: Expr) -> Self {
        self.binary(BinOp::And, rhs)
    }

    pub fn cond(test: Expr, then: Expr, otherwise: Expr) -> Self {
        Expr::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    /// `{}`
    pub fn empty_object() -> Self {
        Expr::Object(Vec::new())
    }

    /// Visit every scale and signal referenced by this expression.
    pub fn visit_refs<F>(&self, visit: &mut F)
    where
        F: FnMut(ExprRef<'_>),
    {
        match self {
            Expr::Raw(_) | Expr::Num(_) | Expr::Datum | Expr::Field(_) => {}
            Expr::Member(inner, _) | Expr::Index(inner, _) => inner.visit_refs(visit),
            Expr::Signal(signal) => visit(ExprRef::Signal(signal)),
            Expr::ScaleLookup(scale, operand) => {
                visit(ExprRef::Scale(scale));
                operand.visit_refs(visit);
            }
            Expr::Bandwidth(scale) | Expr::Domain(scale) | Expr::Range(scale) => visit(ExprRef::Scale(scale)),
            Expr::TimeFormat(operand, _) | Expr::NumberFormat(operand, _) => operand.visit_refs(visit),
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.visit_refs(visit)),
            Expr::Binary(lhs, _, rhs) => {
                lhs.visit_refs(visit);
                rhs.visit_refs(visit);
            }
            Expr::Conditional(test, then, otherwise) => {
                test.visit_refs(visit);
                then.visit_refs(visit);
                otherwise.visit_refs(visit);
            }
            Expr::Object(entries) | Expr::QuotedObject(entries) => {
                entries.iter().for_each(|(_, value)| value.visit_refs(visit))
            }
        }
    }
}

/// A reference found inside an expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExprRef<'a> {
    Scale(&'a ScaleRef),
    Signal(&'a SignalRef),
}

/// JSON string quoting, shared by every quoted literal.
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

fn format_num(value: f64) -> String {
    if value.is_finite() {
        format!("{}", value)
    } else {
        "NaN".to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Raw(text) => write!(f, "{}", text),
            Expr::Num(value) => write!(f, "{}", format_num(*value)),
            Expr::Datum => write!(f, "datum"),
            Expr::Field(name) => write!(f, "datum[{}]", quote(name)),
            Expr::Member(inner, name) => write!(f, "{}.{}", inner, name),
            Expr::Signal(signal) => write!(f, "{}", signal.name()),
            Expr::ScaleLookup(scale, operand) => write!(f, "scale({}, {})", quote(scale.name()), operand),
            Expr::Bandwidth(scale) => write!(f, "bandwidth({})", quote(scale.name())),
            Expr::Domain(scale) => write!(f, "domain({})", quote(scale.name())),
            Expr::Range(scale) => write!(f, "range({})", quote(scale.name())),
            Expr::TimeFormat(operand, pattern) => write!(f, "timeFormat({}, {})", operand, quote(pattern)),
            Expr::NumberFormat(operand, pattern) => write!(f, "format({}, {})", operand, quote(pattern)),
            Expr::Index(inner, index) => write!(f, "{}[{}]", inner, index),
            Expr::Call(name, args) => {
                let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
                write!(f, "{}({})", name, args.join(", "))
            }
            Expr::Binary(lhs, op, rhs) => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Conditional(test, then, otherwise) => write!(f, "({} ? {} : {})", test, then, otherwise),
            Expr::Object(entries) => {
                if entries.is_empty() {
                    return write!(f, "{{}}");
                }
                let entries: Vec<String> = entries.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{ {} }}", entries.join(", "))
            }
            Expr::QuotedObject(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", quote(k), v))
                    .collect();
                write!(f, "{{ {} }}", entries.join(", "))
            }
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_and_formats() {
        let amount = Expr::number_format(Expr::field("amount"), ",");
        assert_eq!(amount.to_string(), r#"format(datum["amount"], ",")"#);

        let period = Expr::time_format(Expr::field("period"), "%b %d, %Y");
        assert_eq!(period.to_string(), r#"timeFormat(datum["period"], "%b %d, %Y")"#);
    }

    #[test]
    fn test_scale_lookup() {
        let scale = ScaleRef::new("scale_legendForBar");
        let expr = Expr::scale_lookup(&scale, Expr::field("type"));
        assert_eq!(expr.to_string(), r#"scale("scale_legendForBar", datum["type"])"#);
    }

    #[test]
    fn test_conditional_hover() {
        let hover = SignalRef::new("signal_currentHoverRect");
        let test = Expr::Datum
            .member("period")
            .strict_eq(Expr::signal(&hover).member("period"));
        let expr = Expr::cond(test, Expr::num(0.75), Expr::num(1.0));
        assert_eq!(
            expr.to_string(),
            "((datum.period === signal_currentHoverRect.period) ? 0.75 : 1)"
        );
    }

    #[test]
    fn test_objects() {
        assert_eq!(Expr::empty_object().to_string(), "{}");
        let obj = Expr::Object(vec![("value".to_string(), Expr::Datum)]);
        assert_eq!(obj.to_string(), "{ value: datum }");
        let quoted = Expr::QuotedObject(vec![("On \"day\"".to_string(), Expr::field("period"))]);
        assert_eq!(quoted.to_string(), r#"{ "On \"day\"": datum["period"] }"#);
    }

    #[test]
    fn test_clamp_and_length() {
        let scale = ScaleRef::new("scale_periodForBar");
        let expr = Expr::Domain(scale).length().add(Expr::num(0.01)).clamp(10.0, 16.0);
        assert_eq!(
            expr.to_string(),
            r#"clamp((length(domain("scale_periodForBar")) + 0.01), 10, 16)"#
        );
    }

    #[test]
    fn test_visit_refs_collects_scales_and_signals() {
        let expr = Expr::cond(
            Expr::signal(&SignalRef::new("hover")).member("type").strict_eq(Expr::Datum.member("type")),
            Expr::Bandwidth(ScaleRef::new("band")),
            Expr::raw("scale(\"ignored\", 1)"),
        );
        let mut scales = Vec::new();
        let mut signals = Vec::new();
        expr.visit_refs(&mut |r| match r {
            ExprRef::Scale(s) => scales.push(s.name().to_string()),
            ExprRef::Signal(s) => signals.push(s.name().to_string()),
        });
        assert_eq!(scales, vec!["band"]);
        assert_eq!(signals, vec!["hover"]);
    }

    #[test]
    fn test_serializes_as_string() {
        let value = serde_json::to_value(Expr::Datum).unwrap();
        assert_eq!(value, serde_json::json!("datum"));
    }
}
