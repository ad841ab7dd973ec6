//! JSON profile documents.
//!
//! A document is a flat object keyed by column name, in profile order:
//!
//! ```json
//! {
//!   "city": {
//!     "data_type": "varchar(32)",
//!     "type": "CATEGORICAL",
//!     "values": ["Kazan", "Omsk", null],
//!     "probabilities": [0.5, 0.3, 0.2]
//!   },
//!   "amount": {
//!     "data_type": "decimal(10,2)",
//!     "type": "CONTINUOUS",
//!     "intervals": [[0.0, 50.0], [50.0, 100.0]],
//!     "probabilities": [0.7, 0.3],
//!     "output_type": "decimal",
//!     "precision": 2,
//!     "date_flag": false
//!   }
//! }
//! ```
//!
//! An entry without `type` is a schema-only column.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use thiserror::Error;

use crate::spec::{ColumnSpec, OutputType, Profile, SemanticKind, Strategy};
use crate::types::{DeclaredType, parse_date, parse_timestamp};
use crate::value::Value;

const TAG_CATEGORICAL: &str = "CATEGORICAL";
const TAG_CONTINUOUS: &str = "CONTINUOUS";
const TAG_STRING: &str = "STRING";
const TAG_FAKER: &str = "FAKER";
const TAG_CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";
const TAG_INCREMENTAL_ID: &str = "INCREMENTAL_ID";
const TAG_FOREIGN_KEY: &str = "FOREIGN_KEY";
const TAG_NULL: &str = "NULL";

/// Errors raised while reading or writing profile documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The document is not valid JSON or not a JSON object.
    #[error("malformed profile document: {0}")]
    Malformed(#[from] serde_json::Error),
    /// An entry carries a strategy tag the codec does not know.
    #[error("column '{column}': unknown strategy type '{tag}'")]
    UnknownStrategy { column: String, tag: String },
    /// An entry is structurally valid JSON but its fields are wrong.
    #[error("column '{column}': {message}")]
    InvalidEntry { column: String, message: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Deserialize)]
struct CategoricalFields {
    values: Vec<JsonValue>,
    probabilities: Vec<f64>,
}

#[derive(Deserialize)]
struct ContinuousFields {
    intervals: Vec<(f64, f64)>,
    probabilities: Vec<f64>,
    #[serde(default)]
    output_type: Option<String>,
    #[serde(default)]
    precision: Option<u32>,
    #[serde(default)]
    date_flag: bool,
}

#[derive(Deserialize)]
struct RegexFields {
    common_regex: String,
}

#[derive(Deserialize)]
struct FakerFields {
    kind: SemanticKind,
}

#[derive(Deserialize)]
struct ForeignKeyFields {
    table: String,
    column: String,
}

/// Serialize a profile into a pretty-printed JSON document.
pub fn encode_profile(profile: &Profile) -> Result<String, CodecError> {
    let document: Map<String, JsonValue> = profile
        .iter()
        .map(|column| (column.name.clone(), encode_column(column)))
        .collect();
    Ok(serde_json::to_string_pretty(&JsonValue::Object(document))?)
}

/// Parse a JSON document back into a profile.
pub fn decode_profile(document: &str) -> Result<Profile, CodecError> {
    let root: JsonValue = serde_json::from_str(document)?;
    let JsonValue::Object(entries) = root else {
        return Err(CodecError::Malformed(serde::de::Error::custom(
            "profile document must be a JSON object",
        )));
    };

    let mut profile = Profile::new();
    for (column, entry) in entries {
        let spec = decode_column(&column, entry)?;
        profile.insert(spec);
    }
    Ok(profile)
}

/// Write a profile document atomically.
pub fn save_profile(path: &Path, profile: &Profile) -> Result<(), CodecError> {
    let encoded = encode_profile(profile)?;
    write_atomic(path, encoded.as_bytes())
}

pub fn load_profile(path: &Path) -> Result<Profile, CodecError> {
    let content = std::fs::read_to_string(path)?;
    decode_profile(&content)
}

fn encode_column(column: &ColumnSpec) -> JsonValue {
    let mut entry = Map::new();
    entry.insert(
        "data_type".to_string(),
        JsonValue::String(column.declared_type.to_string()),
    );
    let Some(strategy) = &column.strategy else {
        return JsonValue::Object(entry);
    };

    let (tag, fields) = match strategy {
        Strategy::Categorical {
            values,
            probabilities,
        } => (
            TAG_CATEGORICAL,
            json!({
                "values": values.iter().map(encode_value).collect::<Vec<_>>(),
                "probabilities": probabilities,
            }),
        ),
        Strategy::Continuous {
            intervals,
            probabilities,
            output,
        } => {
            let mut fields = json!({
                "intervals": intervals,
                "probabilities": probabilities,
                "output_type": output_type_name(output),
            });
            if let (OutputType::Decimal { precision }, Some(map)) =
                (output, fields.as_object_mut())
            {
                map.insert("precision".to_string(), json!(precision));
            }
            if let Some(map) = fields.as_object_mut() {
                map.insert(
                    "date_flag".to_string(),
                    json!(matches!(output, OutputType::DateTimeAtMidnight)),
                );
            }
            (TAG_CONTINUOUS, fields)
        }
        Strategy::FreeTextRegex { pattern } => (TAG_STRING, json!({ "common_regex": pattern })),
        Strategy::SemanticText { kind } => (TAG_FAKER, json!({ "kind": kind })),
        Strategy::CurrentTimestamp => (TAG_CURRENT_TIMESTAMP, json!({})),
        Strategy::IncrementalId => (TAG_INCREMENTAL_ID, json!({})),
        Strategy::ForeignKey { table, column } => (
            TAG_FOREIGN_KEY,
            json!({ "table": table, "column": column }),
        ),
        Strategy::ExplicitNull => (TAG_NULL, json!({})),
    };

    entry.insert("type".to_string(), JsonValue::String(tag.to_string()));
    if let JsonValue::Object(fields) = fields {
        entry.extend(fields);
    }
    JsonValue::Object(entry)
}

fn decode_column(column: &str, entry: JsonValue) -> Result<ColumnSpec, CodecError> {
    let invalid = |message: String| CodecError::InvalidEntry {
        column: column.to_string(),
        message,
    };

    let JsonValue::Object(mut fields) = entry else {
        return Err(invalid("entry must be a JSON object".to_string()));
    };
    let declared_type: DeclaredType = match fields.remove("data_type") {
        Some(JsonValue::String(tag)) => tag.parse().map_err(|err| invalid(format!("{err}")))?,
        Some(_) => return Err(invalid("data_type must be a string".to_string())),
        None => return Err(invalid("missing data_type".to_string())),
    };
    let tag = match fields.remove("type") {
        None | Some(JsonValue::Null) => {
            return Ok(ColumnSpec::schema_only(column, declared_type));
        }
        Some(JsonValue::String(tag)) => tag,
        Some(_) => return Err(invalid("type must be a string".to_string())),
    };

    let fields = JsonValue::Object(fields);
    let strategy = match tag.as_str() {
        TAG_CATEGORICAL => {
            let parsed: CategoricalFields = parse_fields(fields).map_err(&invalid)?;
            let values = parsed
                .values
                .iter()
                .map(|value| decode_value(&declared_type, value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(&invalid)?;
            Strategy::Categorical {
                values,
                probabilities: parsed.probabilities,
            }
        }
        TAG_CONTINUOUS => {
            let parsed: ContinuousFields = parse_fields(fields).map_err(&invalid)?;
            let output = decode_output(&declared_type, &parsed).map_err(&invalid)?;
            Strategy::Continuous {
                intervals: parsed.intervals,
                probabilities: parsed.probabilities,
                output,
            }
        }
        TAG_STRING => {
            let parsed: RegexFields = parse_fields(fields).map_err(&invalid)?;
            Strategy::FreeTextRegex {
                pattern: parsed.common_regex,
            }
        }
        TAG_FAKER => {
            let parsed: FakerFields = parse_fields(fields).map_err(&invalid)?;
            Strategy::SemanticText { kind: parsed.kind }
        }
        TAG_CURRENT_TIMESTAMP => Strategy::CurrentTimestamp,
        TAG_INCREMENTAL_ID => Strategy::IncrementalId,
        TAG_FOREIGN_KEY => {
            let parsed: ForeignKeyFields = parse_fields(fields).map_err(&invalid)?;
            Strategy::ForeignKey {
                table: parsed.table,
                column: parsed.column,
            }
        }
        TAG_NULL => Strategy::ExplicitNull,
        _ => {
            return Err(CodecError::UnknownStrategy {
                column: column.to_string(),
                tag,
            });
        }
    };

    strategy
        .validate()
        .map_err(|err| invalid(err.to_string()))?;
    Ok(ColumnSpec::new(column, declared_type, strategy))
}

fn parse_fields<T: for<'de> Deserialize<'de>>(fields: JsonValue) -> Result<T, String> {
    serde_json::from_value(fields).map_err(|err| err.to_string())
}

fn output_type_name(output: &OutputType) -> &'static str {
    match output {
        OutputType::Int => "int",
        OutputType::Decimal { .. } => "decimal",
        OutputType::Float => "float",
        OutputType::Date => "date",
        OutputType::DateTime | OutputType::DateTimeAtMidnight => "datetime",
    }
}

fn decode_output(declared: &DeclaredType, fields: &ContinuousFields) -> Result<OutputType, String> {
    let Some(name) = fields.output_type.as_deref() else {
        return OutputType::for_declared(declared, fields.date_flag).map_err(|err| err.to_string());
    };
    match name {
        "int" => Ok(OutputType::Int),
        "decimal" => {
            let precision = match (fields.precision, declared) {
                (Some(precision), _) => precision,
                (None, DeclaredType::Decimal { scale, .. }) => *scale,
                (None, _) => 0,
            };
            Ok(OutputType::Decimal { precision })
        }
        "float" => Ok(OutputType::Float),
        "date" => Ok(OutputType::Date),
        "datetime" if fields.date_flag => Ok(OutputType::DateTimeAtMidnight),
        "datetime" => Ok(OutputType::DateTime),
        other => Err(format!("unknown output_type '{other}'")),
    }
}

fn encode_value(value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Bool(value) => json!(value),
        Value::Int(value) => json!(value),
        Value::Float(value) => json!(value),
        Value::Text(value) => json!(value),
        Value::Date(_) | Value::Timestamp(_) => value.render().map_or(JsonValue::Null, JsonValue::String),
    }
}

fn decode_value(declared: &DeclaredType, value: &JsonValue) -> Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || format!("value {value} does not match data_type {declared}");
    match declared {
        DeclaredType::Int => value
            .as_i64()
            .or_else(|| {
                value
                    .as_f64()
                    .filter(|number| number.fract() == 0.0)
                    .map(|number| number as i64)
            })
            .map(Value::Int)
            .ok_or_else(mismatch),
        DeclaredType::Decimal { .. } | DeclaredType::Double => {
            value.as_f64().map(Value::Float).ok_or_else(mismatch)
        }
        DeclaredType::Boolean => value.as_bool().map(Value::Bool).ok_or_else(mismatch),
        DeclaredType::Date => value
            .as_str()
            .and_then(parse_date)
            .map(Value::Date)
            .ok_or_else(mismatch),
        DeclaredType::Timestamp => value
            .as_str()
            .and_then(parse_timestamp)
            .map(Value::Timestamp)
            .ok_or_else(mismatch),
        DeclaredType::String | DeclaredType::Varchar(_) => match value {
            JsonValue::String(text) => Ok(Value::Text(text.clone())),
            JsonValue::Number(_) | JsonValue::Bool(_) => Ok(Value::Text(value.to_string())),
            _ => Err(mismatch()),
        },
    }
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CodecError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf, CodecError> {
    let file_name = path.file_name().ok_or_else(|| {
        CodecError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "invalid path for profile document",
        ))
    })?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}
