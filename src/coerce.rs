//! Turns the strings path and query parameters arrive as into the values their
//! schema expects, so they can be validated like any JSON body.

use serde_json::{Map, Number, Value};

use crate::{
    request::PathParams,
    schema::{Kind, Schema},
};

/// Coerces every field `schema` declares, in place.
///
/// Only object schemas have fields; anything else leaves `params` untouched.
/// Coercion never fails: a value that cannot be converted is kept as it was
/// and left for validation to reject.
pub fn coerce_params(params: &mut Map<String, Value>, schema: &Schema) {
    if let Kind::Object(fields) = schema.kind() {
        for (key, field) in fields {
            coerce(key, params, field);
        }
    }
}

fn coerce(key: &str, params: &mut Map<String, Value>, schema: &Schema) {
    match schema.kind() {
        Kind::Optional(inner) => coerce(key, params, inner),
        Kind::Array(item) => {
            let Some(value) = params.remove(key) else {
                return;
            };

            let values = match value {
                Value::Array(values) => values,
                // one occurrence of a repeated query key arrives alone
                single => vec![single],
            };

            let values = values
                .into_iter()
                .map(|value| coerce_scalar(value, item))
                .collect();
            params.insert(key.to_owned(), Value::Array(values));
        }
        Kind::Number { .. } | Kind::Boolean => {
            if let Some(value) = params.remove(key) {
                params.insert(key.to_owned(), coerce_scalar(value, schema));
            }
        }
        _ => {}
    }
}

fn coerce_scalar(value: Value, schema: &Schema) -> Value {
    match (schema.kind(), value) {
        (Kind::Optional(inner), value) => coerce_scalar(value, inner),
        (Kind::Number { .. }, Value::String(text)) => parse_number(&text).unwrap_or(Value::String(text)),
        (Kind::Boolean, Value::String(text)) => match text.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        (_, value) => value,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();

    if let Ok(number) = text.parse::<i64>() {
        return Some(number.into());
    }
    if let Ok(number) = text.parse::<u64>() {
        return Some(number.into());
    }

    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Decodes a raw query string. Keys that occur more than once, or that are
/// written `key[]`, become arrays of their values in order.
pub fn query_map(query: Option<&str>) -> Map<String, Value> {
    let mut map = Map::new();

    let Some(query) = query else {
        return map;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let (key, forced_array) = match key.strip_suffix("[]") {
            Some(stripped) => (stripped.to_owned(), true),
            None => (key.into_owned(), false),
        };
        let value = Value::String(value.into_owned());

        match map.get_mut(&key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if forced_array => {
                map.insert(key, Value::Array(vec![value]));
            }
            None => {
                map.insert(key, value);
            }
        }
    }

    map
}

pub fn params_map(params: &PathParams) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| (key.to_owned(), Value::String(value.to_owned())))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn coerced(params: Value, schema: &Schema) -> Value {
        let Value::Object(mut params) = params else {
            panic!("params must be an object");
        };
        coerce_params(&mut params, schema);
        Value::Object(params)
    }

    #[test]
    fn test_numbers_and_booleans() {
        let schema = Schema::object([
            ("id", Schema::integer()),
            ("ratio", Schema::number()),
            ("active", Schema::boolean()),
            ("name", Schema::string()),
        ]);

        let params = coerced(
            json!({ "id": "42", "ratio": " 0.5 ", "active": "true", "name": "7" }),
            &schema,
        );

        assert_eq!(params, json!({ "id": 42, "ratio": 0.5, "active": true, "name": "7" }));
    }

    #[test]
    fn test_unconvertible_values_are_left_for_validation() {
        let schema = Schema::object([("id", Schema::integer()), ("active", Schema::boolean())]);

        let params = coerced(json!({ "id": "abc", "active": "yes" }), &schema);

        assert_eq!(params, json!({ "id": "abc", "active": "yes" }));
        assert!(schema.parse(params).is_err());
    }

    #[test]
    fn test_optional_fields_are_coerced_when_present() {
        let schema = Schema::object([
            ("page", Schema::integer().optional()),
            ("limit", Schema::integer().optional()),
        ]);

        let params = coerced(json!({ "page": "2" }), &schema);

        assert_eq!(params, json!({ "page": 2 }));
    }

    #[test]
    fn test_arrays_map_each_element() {
        let schema = Schema::object([
            ("seasons", Schema::array(Schema::integer())),
            ("flags", Schema::array(Schema::boolean())),
        ]);

        let params = coerced(
            json!({ "seasons": ["1", "2"], "flags": ["true", "false", "maybe"] }),
            &schema,
        );

        assert_eq!(
            params,
            json!({ "seasons": [1, 2], "flags": [true, false, "maybe"] })
        );
    }

    #[test]
    fn test_single_value_becomes_one_element_array() {
        let schema = Schema::object([
            ("seasons", Schema::array(Schema::integer()).optional()),
            ("names", Schema::array(Schema::string())),
        ]);

        let params = coerced(json!({ "seasons": "3", "names": "jason" }), &schema);

        assert_eq!(params, json!({ "seasons": [3], "names": ["jason"] }));
    }

    #[test]
    fn test_absent_array_stays_absent() {
        let schema = Schema::object([("seasons", Schema::array(Schema::integer()).optional())]);

        assert_eq!(coerced(json!({}), &schema), json!({}));
    }

    #[test]
    fn test_non_object_schema_is_a_no_op() {
        let schema = Schema::integer();

        assert_eq!(coerced(json!({ "id": "1" }), &schema), json!({ "id": "1" }));
    }

    #[test]
    fn test_query_map_repeats_and_brackets() {
        let map = query_map(Some("seasons=1&name=Jason%20Scott&seasons=2&tags[]=red"));

        assert_eq!(
            Value::Object(map),
            json!({ "seasons": ["1", "2"], "name": "Jason Scott", "tags": ["red"] })
        );
        assert!(query_map(None).is_empty());
    }

    #[test]
    fn test_params_map() {
        let params = PathParams::new(vec![("id".into(), "7".into())]);

        assert_eq!(Value::Object(params_map(&params)), json!({ "id": "7" }));
    }
}
