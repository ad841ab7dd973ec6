use chrono::{DateTime, NaiveDate, NaiveTime};

use tabmimic_core::{Error, OutputType, Value};

use crate::errors::GenerationError;

/// Map a draw from the real line back into the column domain.
pub fn map_output(x: f64, output: OutputType) -> Result<Value, GenerationError> {
    let value = match output {
        OutputType::Int => Value::Int(x.trunc() as i64),
        OutputType::Decimal { precision: 0 } => Value::Float(x.trunc()),
        OutputType::Decimal { precision } => {
            let factor = 10_f64.powi(precision.min(15) as i32);
            Value::Float((x * factor).round() / factor)
        }
        OutputType::Float => Value::Float(x),
        OutputType::Date => {
            let date = NaiveDate::from_num_days_from_ce_opt(x.trunc() as i32)
                .ok_or_else(|| out_of_range("date", x))?;
            Value::Date(date)
        }
        OutputType::DateTime | OutputType::DateTimeAtMidnight => {
            let timestamp = DateTime::from_timestamp(x.trunc() as i64, 0)
                .ok_or_else(|| out_of_range("timestamp", x))?
                .naive_utc();
            if output == OutputType::DateTimeAtMidnight {
                Value::Timestamp(timestamp.date().and_time(NaiveTime::MIN))
            } else {
                Value::Timestamp(timestamp)
            }
        }
    };
    Ok(value)
}

fn out_of_range(kind: &str, x: f64) -> GenerationError {
    GenerationError::Core(Error::InvalidValue(format!("{x} is outside the {kind} range")))
}
