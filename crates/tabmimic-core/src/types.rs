use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// Normalized column type tag.
///
/// Rendered as `int`, `decimal(p,s)`, `double`, `boolean`, `date`,
/// `timestamp`, `string` and `varchar(n)` / `varchar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeclaredType {
    Int,
    Decimal { precision: u32, scale: u32 },
    Double,
    Boolean,
    Date,
    Timestamp,
    String,
    Varchar(Option<u32>),
}

impl DeclaredType {
    /// Normalize a raw source type using the optional length/precision/scale
    /// metadata reported next to it.
    pub fn from_raw(
        raw_type: &str,
        max_length: Option<u32>,
        precision: Option<u32>,
        scale: Option<u32>,
    ) -> Result<Self> {
        let lowered = raw_type.trim().to_lowercase();
        match lowered.as_str() {
            "numeric" | "decimal" => match (precision, scale) {
                (Some(precision), Some(scale)) => Ok(Self::Decimal { precision, scale }),
                _ => Ok(Self::Double),
            },
            "character varying" | "varchar" | "character" | "char" => {
                Ok(Self::Varchar(max_length))
            }
            _ => lowered.parse(),
        }
    }

    /// Decimal-family types are never modeled as categorical.
    pub fn is_decimal_family(&self) -> bool {
        matches!(self, Self::Decimal { .. } | Self::Double)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Varchar(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Timestamp)
    }

    /// Column type used when the destination table is created.
    pub fn sql_type(&self) -> String {
        match self {
            Self::Int => "bigint".to_string(),
            Self::Decimal { precision, scale } => format!("numeric({precision},{scale})"),
            Self::Double => "double precision".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Date => "date".to_string(),
            Self::Timestamp => "timestamp".to_string(),
            Self::String => "text".to_string(),
            Self::Varchar(Some(len)) => format!("varchar({len})"),
            Self::Varchar(None) => "varchar".to_string(),
        }
    }

    /// Read a textual cell (as returned by a `::text` cast) into a value.
    pub fn parse_value(&self, raw: Option<&str>) -> Result<Value> {
        let Some(raw) = raw else {
            return Ok(Value::Null);
        };
        let invalid = || Error::InvalidValue(format!("'{raw}' is not a valid {self}"));
        match self {
            Self::Int => raw.trim().parse().map(Value::Int).map_err(|_| invalid()),
            Self::Decimal { .. } | Self::Double => {
                raw.trim().parse().map(Value::Float).map_err(|_| invalid())
            }
            Self::Boolean => match raw.trim().to_lowercase().as_str() {
                "t" | "true" | "1" | "yes" => Ok(Value::Bool(true)),
                "f" | "false" | "0" | "no" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            Self::Date => parse_date(raw).map(Value::Date).ok_or_else(invalid),
            Self::Timestamp => parse_timestamp(raw).map(Value::Timestamp).ok_or_else(invalid),
            Self::String | Self::Varchar(_) => Ok(Value::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
            Self::Double => write!(f, "double"),
            Self::Boolean => write!(f, "boolean"),
            Self::Date => write!(f, "date"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::String => write!(f, "string"),
            Self::Varchar(Some(len)) => write!(f, "varchar({len})"),
            Self::Varchar(None) => write!(f, "varchar"),
        }
    }
}

impl FromStr for DeclaredType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let lowered = value.trim().to_lowercase();
        let (base, args) = split_type_args(&lowered)?;
        let declared = match (base, args.as_slice()) {
            (
                "int" | "integer" | "smallint" | "bigint" | "tinyint" | "int2" | "int4" | "int8"
                | "serial" | "bigserial",
                [],
            ) => Self::Int,
            ("decimal" | "numeric", [precision, scale]) => Self::Decimal {
                precision: *precision,
                scale: *scale,
            },
            ("decimal" | "numeric", [precision]) => Self::Decimal {
                precision: *precision,
                scale: 0,
            },
            (
                "numeric" | "decimal" | "double" | "double precision" | "real" | "float"
                | "float4" | "float8",
                [],
            ) => Self::Double,
            ("bool" | "boolean", []) => Self::Boolean,
            ("date", []) => Self::Date,
            (
                "timestamp" | "timestamp without time zone" | "timestamp with time zone"
                | "timestamptz" | "datetime",
                [],
            ) => Self::Timestamp,
            ("string" | "text", []) => Self::String,
            ("varchar" | "character varying" | "char" | "character", []) => Self::Varchar(None),
            ("varchar" | "character varying" | "char" | "character", [len]) => {
                Self::Varchar(Some(*len))
            }
            _ => return Err(Error::UnsupportedType(value.to_string())),
        };
        Ok(declared)
    }
}

impl TryFrom<String> for DeclaredType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DeclaredType> for String {
    fn from(value: DeclaredType) -> Self {
        value.to_string()
    }
}

fn split_type_args(value: &str) -> Result<(&str, Vec<u32>)> {
    let Some((base, rest)) = value.split_once('(') else {
        return Ok((value.trim(), Vec::new()));
    };
    let inner = rest
        .strip_suffix(')')
        .ok_or_else(|| Error::UnsupportedType(value.to_string()))?;
    let args = inner
        .split(',')
        .map(|arg| {
            arg.trim()
                .parse::<u32>()
                .map_err(|_| Error::UnsupportedType(value.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((base.trim(), args))
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Timestamps are kept to whole seconds, the precision profile documents use.
pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let parsed = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| {
            chrono::DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z")
                .ok()
                .map(|dt| dt.naive_utc())
        })?;
    parsed.with_nanosecond(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_raw_postgres_types() {
        assert_eq!(
            DeclaredType::from_raw("numeric", None, Some(10), Some(2)).unwrap(),
            DeclaredType::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(
            DeclaredType::from_raw("character varying", Some(64), None, None).unwrap(),
            DeclaredType::Varchar(Some(64))
        );
        assert_eq!(
            DeclaredType::from_raw("timestamp without time zone", None, None, None).unwrap(),
            DeclaredType::Timestamp
        );
        assert_eq!(
            DeclaredType::from_raw("integer", None, Some(32), Some(0)).unwrap(),
            DeclaredType::Int
        );
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(matches!(
            "jsonb".parse::<DeclaredType>(),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            "decimal(a,b)".parse::<DeclaredType>(),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        for tag in [
            "int",
            "decimal(12,3)",
            "double",
            "boolean",
            "date",
            "timestamp",
            "string",
            "varchar(20)",
            "varchar",
        ] {
            let declared: DeclaredType = tag.parse().unwrap();
            assert_eq!(declared.to_string(), tag);
        }
    }

    #[test]
    fn parses_textual_cells() {
        assert_eq!(
            DeclaredType::Int.parse_value(Some("42")).unwrap(),
            Value::Int(42)
        );
        assert_eq!(DeclaredType::Int.parse_value(None).unwrap(), Value::Null);
        assert_eq!(
            DeclaredType::Boolean.parse_value(Some("t")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            DeclaredType::Timestamp
                .parse_value(Some("2024-03-01 10:20:30"))
                .unwrap(),
            Value::Timestamp(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(10, 20, 30)
                    .unwrap()
            )
        );
        assert!(DeclaredType::Date.parse_value(Some("tomorrow")).is_err());
    }

    #[test]
    fn timestamps_drop_fractional_seconds() {
        let expected = Value::Timestamp(
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(10, 20, 30)
                .unwrap(),
        );
        for raw in [
            "2024-03-01 10:20:30.123456",
            "2024-03-01T10:20:30.9",
        ] {
            assert_eq!(
                DeclaredType::Timestamp.parse_value(Some(raw)).unwrap(),
                expected
            );
        }
    }
}
