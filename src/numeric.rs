//! Numeric coercion and JSON sanitization of table values.
//!
//! Every stage that needs a number out of a loosely typed cell goes through
//! [`coerce_numeric_or_none`], so malformed input has exactly one behavior.

use crate::models::Cell;
use serde_json::{Number, Value};

/// Format used for timestamps in tables, exports and reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Converts a cell to a finite number, or `None` when it has no numeric meaning.
///
/// Text is trimmed and parsed; NaN and infinities count as missing.
pub fn coerce_numeric_or_none(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Null | Cell::Timestamp(_) => return None,
        Cell::Int(n) => *n as f64,
        Cell::Float(n) => *n,
        Cell::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
    };

    value.is_finite().then_some(value)
}

/// Coerces a year cell to an integer year (fractional years are truncated).
pub fn coerce_year(cell: &Cell) -> Option<i64> {
    let value = coerce_numeric_or_none(cell)?.trunc();
    fits_i64(value).then(|| value as i64)
}

fn fits_i64(value: f64) -> bool {
    value >= i64::MIN as f64 && value < i64::MAX as f64
}

/// Converts a cell into a JSON primitive. Total: never fails.
///
/// Whole-valued floats become integers, NaN/infinite floats become null and
/// timestamps become strings.
pub fn sanitize_cell(cell: &Cell) -> Value {
    match cell {
        Cell::Null => Value::Null,
        Cell::Int(n) => Value::from(*n),
        Cell::Float(n) => sanitize_float(*n),
        Cell::Text(s) => Value::String(s.clone()),
        Cell::Bool(b) => Value::Bool(*b),
        Cell::Timestamp(ts) => Value::String(ts.format(TIMESTAMP_FORMAT).to_string()),
    }
}

fn sanitize_float(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && fits_i64(n) {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Running mean over the values that were actually present.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    /// `None` when no value was pushed.
    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// The mean, or `0.0` for an empty group.
    pub fn value_or_zero(&self) -> f64 {
        self.value().filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric_or_none(&Cell::Int(3)), Some(3.0));
        assert_eq!(coerce_numeric_or_none(&Cell::Float(2.5)), Some(2.5));
        assert_eq!(coerce_numeric_or_none(&Cell::from(" 42.5 ")), Some(42.5));
        assert_eq!(coerce_numeric_or_none(&Cell::from("n/a")), None);
        assert_eq!(coerce_numeric_or_none(&Cell::from("")), None);
        assert_eq!(coerce_numeric_or_none(&Cell::Float(f64::NAN)), None);
        assert_eq!(coerce_numeric_or_none(&Cell::from("inf")), None);
        assert_eq!(coerce_numeric_or_none(&Cell::Null), None);
    }

    #[test]
    fn test_coerce_year() {
        assert_eq!(coerce_year(&Cell::Float(2021.0)), Some(2021));
        assert_eq!(coerce_year(&Cell::from("2020")), Some(2020));
        assert_eq!(coerce_year(&Cell::Float(1e300)), None);
        assert_eq!(coerce_year(&Cell::from("FY21")), None);
    }

    #[test]
    fn test_sanitize_cell() {
        assert_eq!(sanitize_cell(&Cell::Null), Value::Null);
        assert_eq!(sanitize_cell(&Cell::Float(f64::NAN)), Value::Null);
        assert_eq!(sanitize_cell(&Cell::Float(f64::INFINITY)), Value::Null);
        assert_eq!(sanitize_cell(&Cell::Float(2020.0)), json!(2020));
        assert_eq!(sanitize_cell(&Cell::Float(7.25)), json!(7.25));
        assert_eq!(sanitize_cell(&Cell::Int(-4)), json!(-4));
        assert_eq!(sanitize_cell(&Cell::from("Baner")), json!("Baner"));
        assert_eq!(sanitize_cell(&Cell::Bool(true)), json!(true));

        let ts = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        assert_eq!(
            sanitize_cell(&Cell::Timestamp(ts)),
            json!("2021-03-04 05:06:07")
        );
    }

    #[test]
    fn test_huge_whole_float_stays_float() {
        assert_eq!(sanitize_cell(&Cell::Float(1e20)), json!(1e20));
    }

    #[test]
    fn test_mean_ignores_missing() {
        let mut mean = Mean::default();
        assert_eq!(mean.value(), None);
        assert_eq!(mean.value_or_zero(), 0.0);

        mean.push(Some(10.0));
        mean.push(None);
        mean.push(Some(20.0));
        assert_eq!(mean.value(), Some(15.0));
    }
}
