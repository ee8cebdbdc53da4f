use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;

/// Signature assumed when nothing has been stored yet.
pub const NEVER: &str = "never";

/// Opaque version token built from the server's last-update response.
///
/// Only ever compared for equality; the contents carry no meaning on the
/// client side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(String);

impl Signature {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn never() -> Self {
        Self(NEVER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_never(&self) -> bool {
        self.0 == NEVER
    }

    /// Build the token from a last-update response body.
    ///
    /// Object values are joined with commas in the order the server sent
    /// them. The values of a bare string are its characters, so the
    /// server's pre-import `"never"` becomes `"n,e,v,e,r"`. A bare number
    /// or boolean has no values and gives an empty token.
    pub fn from_response(body: &Value) -> Result<Self, ApiError> {
        match body {
            Value::Object(map) => Ok(Self(join_values(map.values()))),
            Value::Array(items) => Ok(Self(join_values(items.iter()))),
            Value::String(s) => Ok(Self(
                s.chars().map(String::from).collect::<Vec<_>>().join(","),
            )),
            Value::Number(_) | Value::Bool(_) => Ok(Self(String::new())),
            Value::Null => Err(ApiError::InvalidResponse(
                "Unexpected last-update payload: null".to_string(),
            )),
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::never()
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn join_values<'a>(values: impl Iterator<Item = &'a Value>) -> String {
    values.map(value_token).collect::<Vec<_>>().join(",")
}

/// Render a single value the way a browser stringifies it inside a join.
fn value_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_token(n),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => join_values(items.iter()),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Numbers are doubles on the browser side, so even integers go through
/// `f64` and pick up its rounding above 2^53.
fn number_token(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) => js_number(f),
        None => n.to_string(),
    }
}

/// `Number.prototype.toString()` for a finite double: plain digits inside
/// `[1e-6, 1e21)`, exponent form (`1e+21`, `1.5e-7`) outside it.
fn js_number(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if !f.is_finite() {
        return f.to_string();
    }

    // `{:e}` gives the shortest round-tripping digits, e.g. "1.5e-7"
    let sci = format!("{:e}", f.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let exp: i32 = exp.parse().unwrap_or(0);
    let k = digits.len() as i32;
    // Position of the decimal point relative to the start of `digits`
    let n = exp + 1;

    let body = if k <= n && n <= 21 {
        format!("{}{}", digits, "0".repeat((n - k) as usize))
    } else if 0 < n && n <= 21 {
        let (int, frac) = digits.split_at(n as usize);
        format!("{}.{}", int, frac)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exp.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exp.abs())
        }
    };

    if f < 0.0 {
        format!("-{}", body)
    } else {
        body
    }
}
