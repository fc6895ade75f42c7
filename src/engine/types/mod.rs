use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value as JsonValue};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalType {
    Boolean,
    Int64,
    Float64,
    Utf8,
}

impl LogicalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalType::Boolean => "Boolean",
            LogicalType::Int64 => "Int64",
            LogicalType::Float64 => "Float64",
            LogicalType::Utf8 => "Utf8",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, LogicalType::Int64 | LogicalType::Float64)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(LogicalType::Boolean),
            "int64" | "int" | "integer" | "bigint" => Ok(LogicalType::Int64),
            "float64" | "float" | "double" => Ok(LogicalType::Float64),
            "utf8" | "string" | "varchar" | "text" => Ok(LogicalType::Utf8),
            other => Err(format!("unknown logical type '{}'", other)),
        }
    }
}

/// Logical type plus nullability, the type of one column in a row batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnType {
    pub logical: LogicalType,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnType {
    pub fn non_nullable(logical: LogicalType) -> Self {
        Self {
            logical,
            nullable: false,
        }
    }

    pub fn nullable(logical: LogicalType) -> Self {
        Self {
            logical,
            nullable: true,
        }
    }

    pub fn with_nullable(self, nullable: bool) -> Self {
        Self { nullable, ..self }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Nullable({})", self.logical)
        } else {
            write!(f, "{}", self.logical)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    /// `None` for `Null`, which fits any nullable column.
    pub fn logical_type(&self) -> Option<LogicalType> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Boolean(_) => Some(LogicalType::Boolean),
            ScalarValue::Int64(_) => Some(LogicalType::Int64),
            ScalarValue::Float64(_) => Some(LogicalType::Float64),
            ScalarValue::Utf8(_) => Some(LogicalType::Utf8),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int64(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Float64(f) => Some(*f),
            ScalarValue::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Converts the value to `target`, following the cast rules of output expressions.
    pub fn cast_to(&self, target: LogicalType) -> Result<ScalarValue, String> {
        let cast = match (self, target) {
            (ScalarValue::Null, _) => ScalarValue::Null,
            (ScalarValue::Boolean(b), LogicalType::Boolean) => ScalarValue::Boolean(*b),
            (ScalarValue::Boolean(b), LogicalType::Int64) => ScalarValue::Int64(*b as i64),
            (ScalarValue::Int64(i), LogicalType::Int64) => ScalarValue::Int64(*i),
            (ScalarValue::Int64(i), LogicalType::Float64) => ScalarValue::Float64(*i as f64),
            (ScalarValue::Int64(i), LogicalType::Boolean) => ScalarValue::Boolean(*i != 0),
            (ScalarValue::Float64(f), LogicalType::Float64) => ScalarValue::Float64(*f),
            (ScalarValue::Float64(f), LogicalType::Int64) => {
                if !f.is_finite() {
                    return Err(format!("cannot cast {} to Int64", f));
                }
                ScalarValue::Int64(f.trunc() as i64)
            }
            (ScalarValue::Utf8(s), LogicalType::Utf8) => ScalarValue::Utf8(s.clone()),
            (ScalarValue::Utf8(s), LogicalType::Int64) => s
                .trim()
                .parse::<i64>()
                .map(ScalarValue::Int64)
                .map_err(|_| format!("cannot parse '{}' as Int64", s))?,
            (ScalarValue::Utf8(s), LogicalType::Float64) => s
                .trim()
                .parse::<f64>()
                .map(ScalarValue::Float64)
                .map_err(|_| format!("cannot parse '{}' as Float64", s))?,
            (ScalarValue::Utf8(s), LogicalType::Boolean) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => ScalarValue::Boolean(true),
                    "false" | "0" => ScalarValue::Boolean(false),
                    _ => return Err(format!("cannot parse '{}' as Boolean", s)),
                }
            }
            (value, LogicalType::Utf8) => ScalarValue::Utf8(value.to_string()),
            (value, target) => {
                return Err(format!("unsupported cast from {:?} to {}", value, target));
            }
        };
        Ok(cast)
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            ScalarValue::Null => JsonValue::Null,
            ScalarValue::Boolean(b) => JsonValue::Bool(*b),
            ScalarValue::Int64(i) => JsonValue::Number(Number::from(*i)),
            ScalarValue::Float64(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ScalarValue::Utf8(s) => JsonValue::String(s.clone()),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => f.write_str("NULL"),
            ScalarValue::Boolean(b) => write!(f, "{}", b),
            ScalarValue::Int64(i) => write!(f, "{}", i),
            ScalarValue::Float64(v) => write!(f, "{}", v),
            ScalarValue::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<JsonValue> for ScalarValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => ScalarValue::Null,
            JsonValue::Bool(b) => ScalarValue::Boolean(b),
            JsonValue::Number(num) => {
                if let Some(i) = num.as_i64() {
                    ScalarValue::Int64(i)
                } else if let Some(f) = num.as_f64() {
                    ScalarValue::Float64(f)
                } else {
                    ScalarValue::Utf8(num.to_string())
                }
            }
            JsonValue::String(s) => ScalarValue::Utf8(s),
            JsonValue::Array(_) | JsonValue::Object(_) => ScalarValue::Utf8(value.to_string()),
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ScalarValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = JsonValue::deserialize(deserializer)?;
        Ok(ScalarValue::from(json))
    }
}
