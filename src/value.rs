use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Result of a call whose body never returned a value.
    Absent,
    Bool(bool),
    Int(i64),
    String(String),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Absent => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Absent => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
        }
    }

    /// Parses a line read by an `input` statement: integers when the trimmed
    /// text is one, otherwise the text unchanged.
    pub fn from_input(line: &str) -> Value {
        match line.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => Value::String(line.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Absent => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}
