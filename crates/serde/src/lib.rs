//! JSON interop for [`csvstream_core::Record`] and [`csvstream_core::CsvOptions`].
//!
//! `Record` lives in `csvstream-core` and `Serialize` lives in `serde`, so a
//! direct `impl Serialize for Record` here would violate the orphan rule.
//! Instead this crate converts a `Record` to a `serde_json::Value` (or
//! straight to a JSON string), and re-exports `CsvOptions`'s own
//! `Serialize`/`Deserialize` impls, which are derived inside `csvstream-core`
//! behind its own `serde` feature.

pub use csvstream_core::{CsvOptions, Error};

use csvstream_core::Record;
use serde_json::{Map, Value};

/// Converts one record to a `serde_json::Value`: an `Object` record becomes a
/// JSON object keyed by header name, an `Array` record becomes a JSON array.
/// Every field value is a JSON string; the assembler never infers types.
pub fn record_to_value(record: &Record) -> Value {
    match record {
        Record::Object { .. } => {
            let mut map = Map::with_capacity(record.arity());
            for (name, value) in record.iter() {
                let key = name.unwrap_or_default().to_string();
                map.insert(key, Value::String(value.to_string()));
            }
            Value::Object(map)
        }
        Record::Array(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
    }
}

/// Converts a whole batch of records to a single JSON array value.
pub fn records_to_value(records: &[Record]) -> Value {
    Value::Array(records.iter().map(record_to_value).collect())
}

/// Serializes a batch of records to a JSON string.
pub fn to_json_string(records: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string(&records_to_value(records))
}

/// Serializes a batch of records to a pretty-printed JSON string.
pub fn to_json_string_pretty(records: &[Record]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&records_to_value(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use csvstream_core::{CsvOptions, Pipeline};

    fn parse(input: &str) -> Vec<Record> {
        let opts = CsvOptions::default();
        let mut pipeline = Pipeline::new(&opts);
        let mut records = pipeline.transform(input).unwrap();
        records.extend(pipeline.flush().unwrap());
        records
    }

    #[test]
    fn object_record_becomes_a_json_object() {
        let records = parse("a,b\n1,2\n");
        let value = record_to_value(&records[0]);
        assert_eq!(value, serde_json::json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn array_record_becomes_a_json_array() {
        let record = Record::Array(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(record_to_value(&record), serde_json::json!(["x", "y"]));
    }

    #[test]
    fn batch_round_trips_through_a_json_string() {
        let records = parse("a,b\n1,2\n3,4\n");
        let json = to_json_string(&records).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!([{"a":"1","b":"2"}, {"a":"3","b":"4"}]));
    }

    #[test]
    fn options_round_trip_through_json() {
        let opts = CsvOptions {
            delimiter: ';',
            ..CsvOptions::default()
        };
        let json = serde_json::to_string(&opts).unwrap();
        let restored: CsvOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.delimiter, ';');
    }
}
