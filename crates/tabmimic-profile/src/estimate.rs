use std::collections::HashMap;

use chrono::{Datelike, Timelike};

use tabmimic_core::Value;

use crate::errors::ProfileError;
use crate::kde::GaussianKde;

/// Normalized frequency table of a sample.
///
/// Values are ordered by descending frequency, ties broken by first
/// appearance. Nulls are an ordinary value and count toward the total.
/// Timestamps are counted at whole-second precision. An empty sample yields
/// the single value null with probability 1.
pub fn categorical_distribution(sample: &[Value]) -> (Vec<Value>, Vec<f64>) {
    if sample.is_empty() {
        return (vec![Value::Null], vec![1.0]);
    }

    let normalized: Vec<Value> = sample.iter().map(whole_seconds).collect();
    let mut index: HashMap<&Value, usize> = HashMap::new();
    let mut counts: Vec<(&Value, usize)> = Vec::new();
    for value in &normalized {
        match index.get(value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(value, counts.len());
                counts.push((value, 1));
            }
        }
    }
    // stable sort keeps first-seen order among equal counts
    counts.sort_by(|left, right| right.1.cmp(&left.1));

    let total = sample.len() as f64;
    counts
        .into_iter()
        .map(|(value, count)| (value.clone(), count as f64 / total))
        .unzip()
}

fn whole_seconds(value: &Value) -> Value {
    match value {
        Value::Timestamp(ts) => Value::Timestamp(ts.with_nanosecond(0).unwrap_or(*ts)),
        other => other.clone(),
    }
}

/// Forward mapping onto the real line used for continuous estimation.
///
/// Dates map to their proleptic Gregorian day number (0001-01-01 is 1),
/// timestamps to epoch seconds.
pub fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(value) => Some(*value as f64),
        Value::Float(value) => Some(*value),
        Value::Date(value) => Some(value.num_days_from_ce() as f64),
        Value::Timestamp(value) => Some(value.and_utc().timestamp() as f64),
        Value::Null | Value::Bool(_) | Value::Text(_) => None,
    }
}

/// Equal-width intervals over the observed range and the density mass of
/// each, renormalized to sum to one. Nulls are skipped.
pub fn continuous_distribution(
    sample: &[Value],
    number_of_intervals: usize,
) -> Result<(Vec<(f64, f64)>, Vec<f64>), ProfileError> {
    let points = sample
        .iter()
        .filter(|value| !value.is_null())
        .map(|value| {
            to_float(value)
                .filter(|point| point.is_finite())
                .ok_or_else(|| ProfileError::NotNumeric(format!("{value:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let min = points.iter().copied().fold(f64::INFINITY, f64::min);
    let max = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if points.len() < 2 || min >= max {
        let distinct = if points.is_empty() { 0 } else { 1 };
        return Err(ProfileError::DegenerateContinuous { distinct });
    }
    let number_of_intervals = number_of_intervals.max(1);

    let kde = GaussianKde::new(points)?;
    let width = (max - min) / number_of_intervals as f64;
    let intervals: Vec<(f64, f64)> = (0..number_of_intervals)
        .map(|idx| {
            let low = min + width * idx as f64;
            let high = if idx + 1 == number_of_intervals {
                max
            } else {
                min + width * (idx + 1) as f64
            };
            (low, high)
        })
        .collect();

    let masses: Vec<f64> = intervals
        .iter()
        .map(|(low, high)| kde.integrate_box(*low, *high))
        .collect();
    let total: f64 = masses.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return Err(ProfileError::ZeroMass);
    }
    let probabilities = masses.into_iter().map(|mass| mass / total).collect();
    Ok((intervals, probabilities))
}
