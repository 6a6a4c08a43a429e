//! Parameter coercion
//!
//! Turns one line of user input into a value of the type a tool schema
//! declares. A coerced value always carries the declared type; anything that
//! does not fit is an error the caller answers by asking again.

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::mcp::{ParamSchema, ParamType};

const TRUE_WORDS: &[&str] = &["true", "yes", "y", "1"];
const FALSE_WORDS: &[&str] = &["false", "no", "n", "0"];

/// A typed parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Number(f64),
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

impl ParameterValue {
    pub fn kind(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::Boolean(_) => ParamType::Boolean,
            Self::Integer(_) => ParamType::Integer,
            Self::Number(_) => ParamType::Number,
            Self::Object(_) => ParamType::Object,
            Self::Array(_) => ParamType::Array,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Integer(i) => Value::from(*i),
            // Only finite numbers are ever constructed
            Self::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            Self::Object(map) => Value::Object(map.clone()),
            Self::Array(items) => Value::Array(items.clone()),
        }
    }

    /// Read a JSON value (e.g. a schema default) as `kind`; `None` if it does not fit
    pub fn from_json(value: &Value, kind: ParamType) -> Option<Self> {
        match (kind, value) {
            (ParamType::String, Value::String(s)) => Some(Self::String(s.clone())),
            (ParamType::Boolean, Value::Bool(b)) => Some(Self::Boolean(*b)),
            (ParamType::Integer, Value::Number(n)) => n.as_i64().map(Self::Integer),
            (ParamType::Number, Value::Number(n)) => n.as_f64().map(Self::Number),
            (ParamType::Object, Value::Object(map)) => Some(Self::Object(map.clone())),
            (ParamType::Array, Value::Array(items)) => Some(Self::Array(items.clone())),
            _ => None,
        }
    }
}

/// Why an input line was not accepted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoercionError {
    #[error("This parameter is required. Please enter a value.")]
    Required,

    #[error("'{0}' is not a boolean (use true/false, yes/no, y/n or 1/0)")]
    InvalidBoolean(String),

    #[error("'{0}' is not an integer")]
    InvalidInteger(String),

    #[error("'{0}' is not a whole number")]
    Fractional(String),

    #[error("'{0}' is out of range for an integer")]
    IntegerOutOfRange(String),

    #[error("'{0}' is not a finite number")]
    InvalidNumber(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("expected a JSON {expected}, got {found}")]
    WrongShape {
        expected: ParamType,
        found: &'static str,
    },

    #[error("'{value}' is not allowed; valid options: {options}")]
    NotAllowed { value: String, options: String },
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Coerce one line of input against one parameter.
///
/// `Ok(None)` means "leave the parameter out of the call". Blank input does
/// that for optional parameters without a usable default.
pub fn coerce(raw: &str, param: &ParamSchema) -> Result<Option<ParameterValue>, CoercionError> {
    let text = raw.trim();

    if text.is_empty() {
        if param.kind == ParamType::String && param.allow_empty && param.required {
            return Ok(Some(ParameterValue::String(raw.to_string())));
        }
        if param.required {
            return Err(CoercionError::Required);
        }
        return Ok(param
            .default
            .as_ref()
            .and_then(|d| ParameterValue::from_json(d, param.kind)));
    }

    let value = match param.kind {
        ParamType::String => ParameterValue::String(raw.to_string()),
        ParamType::Boolean => ParameterValue::Boolean(parse_bool(text)?),
        ParamType::Integer => ParameterValue::Integer(parse_integer(text)?),
        ParamType::Number => ParameterValue::Number(parse_number(text)?),
        ParamType::Object => match parse_json(text)? {
            Value::Object(map) => ParameterValue::Object(map),
            other => {
                return Err(CoercionError::WrongShape {
                    expected: ParamType::Object,
                    found: json_kind(&other),
                })
            }
        },
        ParamType::Array => match parse_json(text)? {
            Value::Array(items) => ParameterValue::Array(items),
            other => {
                return Err(CoercionError::WrongShape {
                    expected: ParamType::Array,
                    found: json_kind(&other),
                })
            }
        },
    };

    if let Some(allowed) = &param.allowed {
        check_membership(&value, allowed)?;
    }
    Ok(Some(value))
}

fn parse_bool(text: &str) -> Result<bool, CoercionError> {
    let lower = text.to_lowercase();
    if TRUE_WORDS.contains(&lower.as_str()) {
        Ok(true)
    } else if FALSE_WORDS.contains(&lower.as_str()) {
        Ok(false)
    } else {
        Err(CoercionError::InvalidBoolean(text.to_string()))
    }
}

fn parse_integer(text: &str) -> Result<i64, CoercionError> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    match text.parse::<i64>() {
        Ok(i) => Ok(i),
        Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            Err(CoercionError::IntegerOutOfRange(text.to_string()))
        }
        Err(_) if text.parse::<f64>().is_ok_and(f64::is_finite) => {
            Err(CoercionError::Fractional(text.to_string()))
        }
        Err(_) => Err(CoercionError::InvalidInteger(text.to_string())),
    }
}

fn parse_number(text: &str) -> Result<f64, CoercionError> {
    match text.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(CoercionError::InvalidNumber(text.to_string())),
    }
}

fn parse_json(text: &str) -> Result<Value, CoercionError> {
    serde_json::from_str(text).map_err(|e| CoercionError::InvalidJson(e.to_string()))
}

/// Numbers compare by value so `1` matches an allowed `1.0`
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn check_membership(value: &ParameterValue, allowed: &[Value]) -> Result<(), CoercionError> {
    let json = value.to_json();
    if allowed.iter().any(|a| same_value(a, &json)) {
        return Ok(());
    }

    let display = |v: &Value| match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Err(CoercionError::NotAllowed {
        value: display(&json),
        options: allowed.iter().map(display).collect::<Vec<_>>().join(", "),
    })
}

/// Assemble the call payload from collected values, in collection order
pub fn arguments<'a, I>(values: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a (String, ParameterValue)>,
{
    values
        .into_iter()
        .map(|(name, value)| (name.clone(), value.to_json()))
        .collect()
}
