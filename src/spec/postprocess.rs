//! Field postprocessing.
//!
//! A [`Postprocess`] is a value transform applied to a single field after it
//! is fetched. Configuration files refer to transforms by name; the
//! [`PostprocessRegistry`] maps those names to functions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

/// A shared, thread-safe field transform.
#[derive(Clone)]
pub struct Postprocess(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Postprocess {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn identity() -> Self {
        Self::new(|v| v)
    }

    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Postprocess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Postprocess(<fn>)")
    }
}

impl<F> From<F> for Postprocess
where
    F: Fn(Value) -> Value + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Named transforms usable from configuration (`postprocess = "trim"`).
///
/// Built-ins: `trim`, `upper`, `lower`, `int`, `float`, `bool`, `string`,
/// `null_if_empty`.
#[derive(Debug, Clone)]
pub struct PostprocessRegistry {
    transforms: HashMap<String, Postprocess>,
}

impl Default for PostprocessRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register("trim", map_str(|s| s.trim().to_string()))
            .register("upper", map_str(|s| s.to_uppercase()))
            .register("lower", map_str(|s| s.to_lowercase()))
            .register("int", Postprocess::new(to_int))
            .register("float", Postprocess::new(to_float))
            .register("bool", Postprocess::new(|v| Value::Bool(is_truthy(&v))))
            .register("string", Postprocess::new(|v| Value::String(to_display(&v))))
            .register(
                "null_if_empty",
                Postprocess::new(|v| match &v {
                    Value::String(s) if s.is_empty() => Value::Null,
                    _ => v,
                }),
            );
        registry
    }
}

impl PostprocessRegistry {
    /// A registry with no transforms at all.
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// Register (or replace) a named transform.
    pub fn register(&mut self, name: &str, transform: impl Into<Postprocess>) -> &mut Self {
        self.transforms.insert(name.to_string(), transform.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Postprocess> {
        self.transforms.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Look up a transform by name, falling back to identity for unknown
    /// names.
    pub fn resolve(&self, name: &str) -> Postprocess {
        match self.get(name) {
            Some(p) => p.clone(),
            None => {
                tracing::warn!(name, "unknown postprocess transform, using identity");
                Postprocess::identity()
            }
        }
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn map_str(f: fn(&str) -> String) -> Postprocess {
    Postprocess::new(move |v| match v {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    })
}

fn to_int(v: Value) -> Value {
    let n = match &v {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
                .unwrap_or(0)
        }
        Value::Array(_) | Value::Object(_) => return v,
    };
    Value::Number(n.into())
}

fn to_float(v: Value) -> Value {
    let f = match &v {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Array(_) | Value::Object(_) => return v,
    };
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Truthiness used by the `bool` transform and by template sections.
pub(crate) fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

fn to_display(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
