use serde::{Deserialize, Serialize};

/// Literal value carried by tokens, pins, and parameter bindings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "value")]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Json(serde_json::Value),
    /// Identity of another document entity (containers, specifications, ...)
    Reference(String),
    /// Marker carried by control-flow tokens; holds no data
    Control,
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Literal::Json(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Literal::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    pub fn is_control(&self) -> bool {
        matches!(self, Literal::Control)
    }

    /// Lower a literal into plain JSON, for embedding in computed sample data
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Literal::Null => serde_json::Value::Null,
            Literal::Bool(b) => serde_json::Value::Bool(*b),
            Literal::Number(n) => serde_json::json!(n),
            Literal::String(s) => serde_json::Value::String(s.clone()),
            Literal::Json(j) => j.clone(),
            Literal::Reference(r) => serde_json::json!({ "reference": r }),
            Literal::Control => serde_json::Value::String("control".to_string()),
        }
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(n as f64)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<serde_json::Value> for Literal {
    fn from(j: serde_json::Value) -> Self {
        Literal::Json(j)
    }
}
