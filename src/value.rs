//! Data types and runtime values shared by expressions, plans and rows.
//!
//! `DataType`/`Value` are the untyped representation the gateway works with.
//! `SqlType` and `IntoLiteral` attach a Rust type to a column so that typed
//! expressions reject mismatched literals at compile time.

use crate::error::MappingError;
use std::cmp::Ordering;
use std::fmt;

/// Declared type of a column or expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float64,
    Varchar,
}

impl DataType {
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float64)
    }

    /// Whether values of the two types can be ordered against each other.
    /// Numeric types compare across widths; everything else must match.
    pub fn comparable_with(self, other: DataType) -> bool {
        self == other || (self.is_numeric() && other.is_numeric())
    }

    /// Result type of arithmetic between two numeric types
    pub fn widen(self, other: DataType) -> Option<DataType> {
        match (self, other) {
            (DataType::Float64, b) | (b, DataType::Float64) if b.is_numeric() => {
                Some(DataType::Float64)
            }
            (DataType::Int64, b) | (b, DataType::Int64) if b.is_numeric() => Some(DataType::Int64),
            (DataType::Int32, DataType::Int32) => Some(DataType::Int32),
            _ => None,
        }
    }

    /// Whether a value of this type can be stored in a slot of `target`
    /// without loss (same type or numeric widening)
    pub fn assignable_to(self, target: DataType) -> bool {
        self == target || (self.is_numeric() && self.widen(target) == Some(target))
    }

    /// SQL spelling used by the renderer
    pub fn sql_name(self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Int32 => "INTEGER",
            DataType::Int64 => "BIGINT",
            DataType::Float64 => "DOUBLE PRECISION",
            DataType::Varchar => "VARCHAR",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// A single column value in a row or literal
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    String(String),
}

impl Value {
    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int32(_) => Some(DataType::Int32),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::Varchar),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value can be stored in a column of the given type
    pub fn is_compatible_with(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (Value::Null, _) => true,
            (Value::Boolean(_), DataType::Boolean) => true,
            (Value::Int32(_), DataType::Int32) => true,
            (Value::Int64(_), DataType::Int64) => true,
            (Value::Float64(_), DataType::Float64) => true,
            (Value::String(_), DataType::Varchar) => true,
            _ => false,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int32(v) => Some(i64::from(*v)),
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to a value of the given type where the conversion is lossless
    /// in the direction the type checker allows (integer widening).
    pub fn coerce_to(self, data_type: DataType) -> Option<Value> {
        match (self, data_type) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Int32(v), DataType::Int64) => Some(Value::Int64(i64::from(v))),
            (Value::Int32(v), DataType::Float64) => Some(Value::Float64(f64::from(v))),
            (Value::Int64(v), DataType::Float64) => Some(Value::Float64(v as f64)),
            (value, data_type) if value.is_compatible_with(data_type) => Some(value),
            _ => None,
        }
    }

    /// Compare two non-NULL values. Returns `None` for NULLs and for
    /// incomparable types.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (a, b) => match (a.as_i64(), b.as_i64()) {
                (Some(x), Some(y)) => Some(x.cmp(&y)),
                _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

/// Rust type bound to a column or typed expression.
///
/// `Option<T>` marks a nullable column; decoding NULL into a non-optional
/// type is a mapping error.
pub trait SqlType: Sized + Send + 'static {
    const DATA_TYPE: DataType;
    const NULLABLE: bool;

    /// The optional form of this type, produced by aggregates and outer joins
    type Nullable: SqlType;

    fn from_value(value: Value) -> Result<Self, MappingError>;
}

/// Literal accepted by a typed expression whose value type is `T`
pub trait IntoLiteral<T> {
    fn into_literal(self) -> Value;
}

/// Marker for text-valued expressions (`contains`, `concat`, ...)
pub trait TextType: SqlType {}

/// Marker for numeric expressions, with the type `sum()` produces
pub trait NumericType: SqlType {
    type Sum: SqlType;
}

macro_rules! impl_sql_type {
    ($ty:ty, $data_type:ident, $variant:ident) => {
        impl SqlType for $ty {
            const DATA_TYPE: DataType = DataType::$data_type;
            const NULLABLE: bool = false;
            type Nullable = Option<$ty>;

            fn from_value(value: Value) -> Result<Self, MappingError> {
                let actual = value.data_type();
                match value.coerce_to(DataType::$data_type) {
                    Some(Value::$variant(v)) => Ok(v),
                    Some(Value::Null) => Err(MappingError::UnexpectedNull {
                        expected: DataType::$data_type,
                    }),
                    _ => Err(MappingError::ValueType {
                        expected: DataType::$data_type,
                        actual,
                    }),
                }
            }
        }

        impl SqlType for Option<$ty> {
            const DATA_TYPE: DataType = DataType::$data_type;
            const NULLABLE: bool = true;
            type Nullable = Option<$ty>;

            fn from_value(value: Value) -> Result<Self, MappingError> {
                match value {
                    Value::Null => Ok(None),
                    other => <$ty as SqlType>::from_value(other).map(Some),
                }
            }
        }

        impl IntoLiteral<$ty> for $ty {
            fn into_literal(self) -> Value {
                Value::$variant(self)
            }
        }

        impl IntoLiteral<Option<$ty>> for $ty {
            fn into_literal(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_sql_type!(bool, Boolean, Boolean);
impl_sql_type!(i32, Int32, Int32);
impl_sql_type!(i64, Int64, Int64);
impl_sql_type!(f64, Float64, Float64);
impl_sql_type!(String, Varchar, String);

impl IntoLiteral<String> for &str {
    fn into_literal(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoLiteral<Option<String>> for &str {
    fn into_literal(self) -> Value {
        Value::String(self.to_string())
    }
}

// Integer literals default to i32; let them widen into wider columns.
impl IntoLiteral<i64> for i32 {
    fn into_literal(self) -> Value {
        Value::Int64(i64::from(self))
    }
}

impl IntoLiteral<Option<i64>> for i32 {
    fn into_literal(self) -> Value {
        Value::Int64(i64::from(self))
    }
}

impl IntoLiteral<f64> for i32 {
    fn into_literal(self) -> Value {
        Value::Float64(f64::from(self))
    }
}

impl IntoLiteral<Option<f64>> for i32 {
    fn into_literal(self) -> Value {
        Value::Float64(f64::from(self))
    }
}

impl TextType for String {}
impl TextType for Option<String> {}

impl NumericType for i32 {
    type Sum = Option<i64>;
}
impl NumericType for Option<i32> {
    type Sum = Option<i64>;
}
impl NumericType for i64 {
    type Sum = Option<i64>;
}
impl NumericType for Option<i64> {
    type Sum = Option<i64>;
}
impl NumericType for f64 {
    type Sum = Option<f64>;
}
impl NumericType for Option<f64> {
    type Sum = Option<f64>;
}
