//! Property values read from and written to models by name

use serde::{Deserialize, Serialize};

/// A property value as seen through the path-addressing layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Array(Vec<f64>),
    Bool(bool),
    Text(String),
}

impl Value {
    /// Numeric view; booleans are not numbers here
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Value::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Element `index` of an array value
    pub fn index(&self, index: usize) -> Option<Value> {
        self.as_array()
            .and_then(|values| values.get(index))
            .map(|v| Value::Number(*v))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Array(_) => "array",
            Value::Bool(_) => "bool",
            Value::Text(_) => "text",
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Array(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Array(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_array() {
        let v = Value::Array(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.index(1), Some(Value::Number(2.0)));
        assert_eq!(v.index(3), None);
        assert_eq!(Value::Number(1.0).index(0), None);
    }

    #[test]
    fn test_numeric_view() {
        assert_eq!(Value::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_string(&vec![Value::Number(1.5), Value::Text("a".into())]).unwrap();
        assert_eq!(json, r#"[1.5,"a"]"#);
    }
}
