//! Running state for aggregate functions.
//!
//! NULL inputs are ignored by every function. Over an empty input COUNT
//! yields 0 and every other function yields NULL.

use crate::expression::operator::AggregateFunction;
use crate::expression::{ExpressionError, ExpressionResult};
use crate::value::Value;
use std::cmp::Ordering;

/// State for one aggregate over one group
#[derive(Debug, Clone)]
pub struct Accumulator {
    function: AggregateFunction,
    /// Number of non-NULL inputs
    count: i64,
    int_sum: i64,
    float_sum: f64,
    /// Whether any input was floating point
    floating: bool,
    /// Current MIN/MAX
    extreme: Option<Value>,
}

impl Accumulator {
    pub fn new(function: AggregateFunction) -> Self {
        Self {
            function,
            count: 0,
            int_sum: 0,
            float_sum: 0.0,
            floating: false,
            extreme: None,
        }
    }

    /// Update the state with a new value
    pub fn update(&mut self, value: &Value) -> ExpressionResult<()> {
        if value.is_null() {
            return Ok(());
        }
        self.count += 1;

        match self.function {
            AggregateFunction::Count => {}
            AggregateFunction::Sum | AggregateFunction::Avg => match value {
                Value::Float64(v) => {
                    self.floating = true;
                    self.float_sum += v;
                }
                other => {
                    let n = other.as_i64().ok_or_else(|| ExpressionError::InvalidOperandTypes {
                        operator: self.function.name().to_string(),
                        left_type: other.data_type(),
                        right_type: None,
                    })?;
                    self.int_sum = self.int_sum.checked_add(n).ok_or_else(|| {
                        ExpressionError::ArithmeticOverflow {
                            operator: self.function.name().to_string(),
                        }
                    })?;
                }
            },
            AggregateFunction::Min | AggregateFunction::Max => {
                let wanted = match self.function {
                    AggregateFunction::Min => Ordering::Less,
                    _ => Ordering::Greater,
                };
                let replace = match &self.extreme {
                    None => true,
                    Some(current) => value.compare(current) == Some(wanted),
                };
                if replace {
                    self.extreme = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    /// Get the final aggregate value
    pub fn finish(self) -> Value {
        match self.function {
            AggregateFunction::Count => Value::Int64(self.count),
            _ if self.count == 0 => Value::Null,
            AggregateFunction::Sum if self.floating => {
                Value::Float64(self.float_sum + self.int_sum as f64)
            }
            AggregateFunction::Sum => Value::Int64(self.int_sum),
            AggregateFunction::Avg => {
                Value::Float64((self.float_sum + self.int_sum as f64) / self.count as f64)
            }
            AggregateFunction::Min | AggregateFunction::Max => {
                self.extreme.unwrap_or(Value::Null)
            }
        }
    }
}
