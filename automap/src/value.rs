//! Runtime values passed to and returned from exposed callables.
//!
//! A [`Value`] is what a query argument becomes after coercion and what a
//! callable's return value is rendered from. Its [`Display`](fmt::Display)
//! output is the response body.
//!
//! Conversions go through two traits:
//!
//! - [`FromArg`] pulls a typed parameter out of a bound argument slot.
//! - [`IntoValue`] turns a return value (or a snapshotted attribute) into a
//!   [`Value`]; [`IntoOutput`] additionally accepts `Result<T, E>`.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::Serialize;

use crate::error::CallError;

/// A typed value flowing through a mapped endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Unit,
    Int(i64),
    Float(f64),
    Complex(Complex),
    Str(String),
    Bool(bool),
    List(Vec<Value>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "none",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
        }
    }
}

/// Renders result text the way Python's `str()` would: `None`, `True`,
/// `7.0`, `(1+2j)`, `[1, 'a']`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str("None"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write_float(f, *x),
            Value::Complex(c) => write!(f, "{c}"),
            Value::Str(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match item {
                        Value::Str(s) => write_repr(f, s)?,
                        other => write!(f, "{other}")?,
                    }
                }
                f.write_str("]")
            }
        }
    }
}

// Single quotes unless the text holds a single quote and no double quote.
fn write_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

// Whole floats keep their ".0" so they stay distinguishable from integers.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("nan")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "inf" } else { "-inf" })
    } else {
        write!(f, "{x:?}")
    }
}

/// A complex number with `f64` parts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.re == 0.0 && self.re.is_sign_positive() {
            write_float_trimmed(f, self.im)?;
            return f.write_str("j");
        }
        f.write_str("(")?;
        write_float_trimmed(f, self.re)?;
        if self.im >= 0.0 || self.im.is_nan() {
            f.write_str("+")?;
        }
        write_float_trimmed(f, self.im)?;
        f.write_str("j)")
    }
}

// Complex parts drop a trailing ".0": `(1+2j)`, not `(1.0+2.0j)`.
fn write_float_trimmed(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 {
        write!(f, "{x:.0}")
    } else {
        write_float(f, x)
    }
}

/// Error returned when a string is not a complex literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseComplexError;

impl fmt::Display for ParseComplexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("complex() arg is a malformed string")
    }
}

impl std::error::Error for ParseComplexError {}

impl FromStr for Complex {
    type Err = ParseComplexError;

    /// Accepts `2`, `3j`, `-j`, `1+2j`, `1.5e3-2j` and any of those wrapped in
    /// parentheses. `j` and `J` both mark the imaginary part.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut s = s.trim();
        if let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
            s = inner.trim();
        }
        if s.is_empty() {
            return Err(ParseComplexError);
        }

        let Some(body) = s.strip_suffix(|c: char| c == 'j' || c == 'J') else {
            return parse_part(s).map(|re| Complex::new(re, 0.0));
        };

        match split_point(body) {
            Some(at) => {
                let re = parse_part(&body[..at])?;
                let im = parse_imaginary(&body[at..])?;
                Ok(Complex::new(re, im))
            }
            None => parse_imaginary(body).map(|im| Complex::new(0.0, im)),
        }
    }
}

// Index of the sign separating the real and imaginary parts, skipping a
// leading sign and exponent signs.
fn split_point(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    (1..bytes.len())
        .rev()
        .find(|&i| matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E'))
}

fn parse_part(s: &str) -> Result<f64, ParseComplexError> {
    if s.is_empty() || s.contains(char::is_whitespace) {
        return Err(ParseComplexError);
    }
    s.parse::<f64>().map_err(|_| ParseComplexError)
}

fn parse_imaginary(s: &str) -> Result<f64, ParseComplexError> {
    match s {
        "" | "+" => Ok(1.0),
        "-" => Ok(-1.0),
        _ => parse_part(s),
    }
}

/// Converts a Rust value into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Unit
    }
}

macro_rules! int_into_value {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }
        )*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl IntoValue for u64 {
    fn into_value(self) -> Value {
        i64::try_from(self).map_or(Value::Float(self as f64), Value::Int)
    }
}

impl IntoValue for usize {
    fn into_value(self) -> Value {
        i64::try_from(self).map_or(Value::Float(self as f64), Value::Int)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl IntoValue for Complex {
    fn into_value(self) -> Value {
        Value::Complex(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Str(self.to_owned())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Unit, IntoValue::into_value)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

/// The return type of an exposed callable.
///
/// Plain values succeed; `Err` of a `Result` becomes [`CallError::Failed`]
/// carrying the error's text.
pub trait IntoOutput {
    fn into_output(self) -> Result<Value, CallError>;
}

impl<T: IntoValue> IntoOutput for T {
    fn into_output(self) -> Result<Value, CallError> {
        Ok(self.into_value())
    }
}

impl<T: IntoValue, E: fmt::Display> IntoOutput for Result<T, E> {
    fn into_output(self) -> Result<Value, CallError> {
        self.map(IntoValue::into_value).map_err(CallError::failed)
    }
}

/// Extracts a typed parameter from a bound argument slot.
///
/// `slot` is `None` when the caller supplied neither a positional nor a
/// keyword value for the parameter.
pub trait FromArg: Sized {
    /// Type name reported when the supplied value does not fit.
    const EXPECTED: &'static str;

    /// Converts a supplied value, handing it back unchanged on mismatch.
    fn from_value(value: Value) -> Result<Self, Value>;

    fn from_arg(param: &str, slot: Option<Value>) -> Result<Self, CallError> {
        let value = slot.ok_or_else(|| CallError::MissingArgument(param.to_owned()))?;
        Self::from_value(value).map_err(|found| CallError::TypeMismatch {
            param: param.to_owned(),
            expected: Self::EXPECTED,
            found: found.type_name(),
        })
    }
}

impl FromArg for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl<T: FromArg> FromArg for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Unit => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_arg(param: &str, slot: Option<Value>) -> Result<Self, CallError> {
        match slot {
            None => Ok(None),
            Some(value) => T::from_arg(param, Some(value)).map(Some),
        }
    }
}

macro_rules! int_from_arg {
    ($($ty:ty),*) => {
        $(
            impl FromArg for $ty {
                const EXPECTED: &'static str = "int";

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(i).map_err(|_| Value::Int(i)),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

int_from_arg!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromArg for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float(x) => Ok(x),
            Value::Int(i) => Ok(i as f64),
            other => Err(other),
        }
    }
}

impl FromArg for f32 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Result<Self, Value> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl FromArg for Complex {
    const EXPECTED: &'static str = "complex";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Complex(c) => Ok(c),
            other => f64::from_value(other).map(|re| Complex::new(re, 0.0)),
        }
    }
}

impl FromArg for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(other),
        }
    }
}

impl FromArg for String {
    const EXPECTED: &'static str = "str";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(s) => Ok(s),
            other => Err(other),
        }
    }
}
