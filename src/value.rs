//! Defines [`Value`], the data type templates are rendered against, and
//! [`Context`], the string-keyed map that a single template render sees.

use std::collections::BTreeMap;
use std::fmt;

/// A template value. Page kinds convert their typed context structs into an
/// [`Value::Object`] whose keys are the names templates refer to.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    String(String),
    Array(Vec<Value>),
    Object(Context),
}

impl Value {
    /// Whether a `{{#if}}` block over this value renders its body. Absent
    /// values, `false`, `0`, empty strings and empty lists are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }
}

impl fmt::Display for Value {
    /// The text substituted for an interpolation. Lists join their elements
    /// with `,`; nil, `false` and objects render as nothing.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil | Value::Bool(false) | Value::Object(_) => Ok(()),
            Value::Bool(true) => f.write_str("true"),
            Value::Int(i) => i.fmt(f),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    item.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Value {
        Value::Int(i as i64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_owned())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Value {
        Value::String(s.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Value {
        match opt {
            Some(v) => v.into(),
            None => Value::Nil,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<Context> for Value {
    fn from(ctx: Context) -> Value {
        Value::Object(ctx)
    }
}

/// The key-value data available to one template render. Keys are kept in a
/// [`BTreeMap`] so debug output and iteration are deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    pub fn new() -> Context {
        Context::default()
    }

    /// Inserts `value` under `key`, replacing any previous value.
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`Context::insert`].
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Copies every entry of `other` over the entries of `self`.
    pub fn extend(&mut self, other: Context) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Context {
        let mut ctx = Context::new();
        for (k, v) in iter {
            ctx.insert(k, v);
        }
        ctx
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("true").is_truthy());
        assert!(!Value::from(0i64).is_truthy());
        assert!(Value::from(3usize).is_truthy());
        assert!(!Value::Array(Vec::new()).is_truthy());
        assert!(Value::from(vec!["a"]).is_truthy());
        assert!(Value::Object(Context::new()).is_truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "a,b");
        assert_eq!(Value::from(12usize).to_string(), "12");
        assert_eq!(Value::from(false).to_string(), "");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::Nil.to_string(), "");
    }

    #[test]
    fn test_extend_overrides() {
        let mut base = Context::new().with("a", 1i64).with("b", "x");
        base.extend(Context::new().with("b", "y"));
        assert_eq!(base.get("a"), Some(&Value::Int(1)));
        assert_eq!(base.get("b"), Some(&Value::from("y")));
        assert_eq!(base.len(), 2);
    }
}
