use serde_json::Value;

use crate::{
    path::kind,
    projection::{Collection, ShapeError},
    record::Record,
};

/// Field holding the entries of forecast, group and search responses.
pub const LIST_FIELD: &str = "list";

/// Separate the `list` field of a response from its sibling metadata.
///
/// Works on a copy: `response` is left untouched.
pub fn split(response: &Value) -> Result<(Record, Collection), ShapeError> {
    split_field(response, LIST_FIELD)
}

pub fn split_field(response: &Value, field: &str) -> Result<(Record, Collection), ShapeError> {
    split_owned(response.clone(), field)
}

/// Consuming variant for callers that own the decoded response.
pub fn split_owned(response: Value, field: &str) -> Result<(Record, Collection), ShapeError> {
    let mut meta = match response {
        Value::Object(map) => map,
        other => {
            return Err(ShapeError::NotAnObject {
                found: kind(&other),
            });
        }
    };

    let list = match meta.remove(field) {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ShapeError::NotASequence {
                field: field.to_string(),
                found: kind(&other),
            });
        }
        None => {
            return Err(ShapeError::MissingField {
                field: field.to_string(),
            });
        }
    };

    Ok((Record::new(Value::Object(meta)), Collection::new(list)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forecast_response() -> Value {
        json!({
            "list": [
                {"dt_txt": "2015-01-01 00:00", "main": {"temp": 280.0}},
                {"dt_txt": "2015-01-01 03:00", "main": {"temp": 279.5}}
            ],
            "city": {"name": "Kassel"}
        })
    }

    #[test]
    fn split_forecast_scenario() {
        let (meta, list) = split(&forecast_response()).unwrap();

        assert_eq!(meta.as_value(), &json!({"city": {"name": "Kassel"}}));
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.select(&["dt_txt", "main/temp"]).unwrap(),
            vec![
                vec![json!("2015-01-01 00:00"), json!(280.0)],
                vec![json!("2015-01-01 03:00"), json!(279.5)],
            ]
        );
    }

    #[test]
    fn split_does_not_mutate_input() {
        let response = forecast_response();
        let _ = split(&response).unwrap();
        assert_eq!(response, forecast_response());
        assert!(response.get("list").is_some());
    }

    #[test]
    fn split_shape_errors() {
        assert_eq!(
            split(&json!({"city": {}})).unwrap_err(),
            ShapeError::MissingField {
                field: "list".into()
            }
        );
        assert_eq!(
            split(&json!({"list": {"a": 1}})).unwrap_err(),
            ShapeError::NotASequence {
                field: "list".into(),
                found: "object"
            }
        );
        assert_eq!(split(&json!([1, 2])).unwrap_err(), ShapeError::NotAnObject { found: "array" });
    }

    #[test]
    fn split_other_field() {
        let response = json!({"stations": [{"id": 1}], "count": 1});
        let (meta, list) = split_field(&response, "stations").unwrap();
        assert_eq!(meta.get_one("count").unwrap(), &json!(1));
        assert_eq!(list.len(), 1);
    }
}
