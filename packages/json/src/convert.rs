//! Conversions between JSON values and tree scalars and sources.

use janosh_core::{Number, Source, Value};

use crate::Error;

/// Convert a JSON document into an ingestion source.
///
/// Object members keep the order `serde_json` iterates them in.
pub fn json_to_source(json: &serde_json::Value) -> Result<Source, Error> {
    Ok(match json {
        serde_json::Value::Null => Source::Scalar(Value::Null),
        serde_json::Value::Bool(b) => Source::Scalar(Value::Boolean(*b)),
        serde_json::Value::Number(n) => Source::Scalar(Value::Number(number_from_json(n)?)),
        serde_json::Value::String(s) => Source::Scalar(Value::String(s.clone())),
        serde_json::Value::Array(items) => Source::Array(
            items
                .iter()
                .map(json_to_source)
                .collect::<Result<_, _>>()?,
        ),
        serde_json::Value::Object(map) => Source::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), json_to_source(v)?)))
                .collect::<Result<_, Error>>()?,
        ),
    })
}

fn number_from_json(n: &serde_json::Number) -> Result<Number, Error> {
    let text = n.to_string();
    Number::parse(&text).map_err(|_| Error::Number { text })
}

/// Convert a stored scalar into JSON.
///
/// Container headers have no scalar form and map to an empty container of
/// the same kind.
pub fn scalar_to_json(value: &Value) -> Result<serde_json::Value, Error> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Number(n) => {
            let number: serde_json::Number =
                serde_json::from_str(n.as_str()).map_err(|_| Error::Number {
                    text: n.as_str().to_string(),
                })?;
            serde_json::Value::Number(number)
        }
        Value::Array(_) | Value::Range(janosh_core::ContainerKind::Array, _) => {
            serde_json::Value::Array(Vec::new())
        }
        Value::Object(_) | Value::Range(janosh_core::ContainerKind::Object, _) => {
            serde_json::Value::Object(serde_json::Map::new())
        }
    })
}
