//! Validation schemas.
//!
//! A [`Schema`] is a small tree of node kinds that is used three ways: to
//! coerce stringly-typed path and query parameters, to validate request and
//! response values, and to describe the endpoint in the OpenAPI document.
//!
//! ```
//! use vetted::schema::Schema;
//!
//! let query = Schema::object([
//!     ("name", Schema::string().optional()),
//!     ("seasons", Schema::array(Schema::integer().min(1.0)).optional()),
//! ]);
//!
//! let parsed = query
//!     .parse(serde_json::json!({ "seasons": [1, 2], "ignored": true }))
//!     .unwrap();
//! assert_eq!(parsed, serde_json::json!({ "seasons": [1, 2] }));
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// The node kinds a schema is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    String {
        min_length: Option<usize>,
        max_length: Option<usize>,
    },
    Number {
        minimum: Option<f64>,
        maximum: Option<f64>,
        integer: bool,
    },
    Boolean,
    Array(Box<Schema>),
    /// Fields keep their declaration order.
    Object(Vec<(String, Schema)>),
    /// The value may be absent. Absent is not the same as `null`.
    Optional(Box<Schema>),
    /// One of a fixed set of strings.
    Enum(Vec<String>),
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: Kind,
    description: Option<String>,
}

impl From<Kind> for Schema {
    fn from(kind: Kind) -> Self {
        Self {
            kind,
            description: None,
        }
    }
}

impl Schema {
    pub fn string() -> Self {
        Kind::String {
            min_length: None,
            max_length: None,
        }
        .into()
    }

    pub fn number() -> Self {
        Kind::Number {
            minimum: None,
            maximum: None,
            integer: false,
        }
        .into()
    }

    pub fn integer() -> Self {
        Kind::Number {
            minimum: None,
            maximum: None,
            integer: true,
        }
        .into()
    }

    pub fn boolean() -> Self {
        Kind::Boolean.into()
    }

    pub fn array(item: Schema) -> Self {
        Kind::Array(Box::new(item)).into()
    }

    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, Schema)>) -> Self {
        Kind::Object(
            fields
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        )
        .into()
    }

    pub fn enumeration<V: Into<String>>(values: impl IntoIterator<Item = V>) -> Self {
        Kind::Enum(values.into_iter().map(Into::into).collect()).into()
    }

    pub fn any() -> Self {
        Kind::Any.into()
    }

    /// The schema of a type that knows how to describe itself.
    pub fn of<T: Schematic>() -> Self {
        T::schema()
    }

    pub fn optional(self) -> Self {
        Kind::Optional(Box::new(self)).into()
    }

    /// Lower bound: minimum length for strings, minimum value for numbers.
    /// Other kinds ignore it.
    pub fn min(self, bound: f64) -> Self {
        self.bounded(|kind| match kind {
            Kind::String { min_length, .. } => *min_length = Some(bound as usize),
            Kind::Number { minimum, .. } => *minimum = Some(bound),
            _ => {}
        })
    }

    /// Upper bound: maximum length for strings, maximum value for numbers.
    /// Other kinds ignore it.
    pub fn max(self, bound: f64) -> Self {
        self.bounded(|kind| match kind {
            Kind::String { max_length, .. } => *max_length = Some(bound as usize),
            Kind::Number { maximum, .. } => *maximum = Some(bound),
            _ => {}
        })
    }

    fn bounded(mut self, apply: impl FnOnce(&mut Kind)) -> Self {
        match &mut self.kind {
            Kind::Optional(inner) => {
                let bounded = std::mem::replace(inner.as_mut(), Schema::any()).bounded(apply);
                **inner = bounded;
            }
            kind => apply(kind),
        }
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_optional(&self) -> bool {
        matches!(self.kind, Kind::Optional(_))
    }

    /// Validates `value`, returning it with unknown object keys stripped.
    ///
    /// Every problem found is reported, not only the first.
    pub fn parse(&self, value: Value) -> Result<Value, ValidationError> {
        let mut issues = Vec::new();
        let parsed = self.check(value, &mut Vec::new(), &mut issues);

        if issues.is_empty() {
            Ok(parsed)
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Whether `value` would parse. Stops at the first problem and copies
    /// nothing, so it is cheap enough to run on every response.
    pub fn is_valid(&self, value: &Value) -> bool {
        match &self.kind {
            Kind::Any => true,
            Kind::Optional(inner) => inner.is_valid(value),
            Kind::Boolean => value.is_boolean(),
            Kind::String {
                min_length,
                max_length,
            } => value.as_str().map_or(false, |text| {
                let length = text.chars().count();
                min_length.map_or(true, |min| length >= min) && max_length.map_or(true, |max| length <= max)
            }),
            Kind::Number {
                minimum,
                maximum,
                integer,
            } => value.as_f64().map_or(false, |number| {
                (!*integer || value.is_i64() || value.is_u64() || whole_number(number).is_ok())
                    && minimum.map_or(true, |min| number >= min)
                    && maximum.map_or(true, |max| number <= max)
            }),
            Kind::Enum(values) => value
                .as_str()
                .map_or(false, |text| values.iter().any(|allowed| allowed == text)),
            Kind::Array(item) => value
                .as_array()
                .map_or(false, |values| values.iter().all(|value| item.is_valid(value))),
            Kind::Object(fields) => value.as_object().map_or(false, |map| {
                fields.iter().all(|(name, field)| match map.get(name) {
                    Some(value) => field.is_valid(value),
                    None => field.is_optional(),
                })
            }),
        }
    }

    fn check(&self, value: Value, path: &mut Vec<PathSegment>, issues: &mut Vec<Issue>) -> Value {
        match &self.kind {
            Kind::Any => value,
            Kind::Optional(inner) => inner.check(value, path, issues),
            Kind::Boolean => {
                if !value.is_boolean() {
                    issues.push(Issue::expected("boolean", &value, path));
                }
                value
            }
            Kind::String {
                min_length,
                max_length,
            } => {
                let Some(text) = value.as_str() else {
                    issues.push(Issue::expected("string", &value, path));
                    return value;
                };

                let length = text.chars().count();
                if let Some(min) = min_length.filter(|min| length < *min) {
                    issues.push(Issue::new(
                        path,
                        format!("String must contain at least {min} character(s)"),
                    ));
                }
                if let Some(max) = max_length.filter(|max| length > *max) {
                    issues.push(Issue::new(
                        path,
                        format!("String must contain at most {max} character(s)"),
                    ));
                }
                value
            }
            Kind::Number {
                minimum,
                maximum,
                integer,
            } => {
                let Some(number) = value.as_f64() else {
                    issues.push(Issue::expected("number", &value, path));
                    return value;
                };

                // `1.0` and `1e0` are integers too, stored as such so they
                // deserialize into integer types
                let value = if *integer && !(value.is_i64() || value.is_u64()) {
                    match whole_number(number) {
                        Ok(whole) => whole,
                        Err(message) => {
                            issues.push(Issue::new(path, message));
                            value
                        }
                    }
                } else {
                    value
                };
                if let Some(min) = minimum.filter(|min| number < *min) {
                    issues.push(Issue::new(
                        path,
                        format!("Number must be greater than or equal to {min}"),
                    ));
                }
                if let Some(max) = maximum.filter(|max| number > *max) {
                    issues.push(Issue::new(
                        path,
                        format!("Number must be less than or equal to {max}"),
                    ));
                }
                value
            }
            Kind::Enum(values) => {
                let Some(text) = value.as_str() else {
                    issues.push(Issue::expected("string", &value, path));
                    return value;
                };

                if !values.iter().any(|allowed| allowed == text) {
                    let expected = values
                        .iter()
                        .map(|allowed| format!("'{allowed}'"))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    issues.push(Issue::new(
                        path,
                        format!("Invalid enum value. Expected {expected}, received '{text}'"),
                    ));
                }
                value
            }
            Kind::Array(item) => {
                let Value::Array(values) = value else {
                    issues.push(Issue::expected("array", &value, path));
                    return value;
                };

                let checked = values
                    .into_iter()
                    .enumerate()
                    .map(|(index, value)| {
                        path.push(PathSegment::Index(index));
                        let checked = item.check(value, path, issues);
                        path.pop();
                        checked
                    })
                    .collect();
                Value::Array(checked)
            }
            Kind::Object(fields) => {
                let Value::Object(mut map) = value else {
                    issues.push(Issue::expected("object", &value, path));
                    return value;
                };

                let mut parsed = Map::new();
                for (name, field) in fields {
                    path.push(PathSegment::Key(name.clone()));
                    match map.remove(name) {
                        Some(value) => {
                            parsed.insert(name.clone(), field.check(value, path, issues));
                        }
                        None if field.is_optional() => {}
                        None => issues.push(Issue::new(path, "Required")),
                    }
                    path.pop();
                }
                Value::Object(parsed)
            }
        }
    }
}

fn whole_number(number: f64) -> Result<Value, &'static str> {
    if number.fract() != 0.0 {
        return Err("Expected integer, received float");
    }

    if number >= i64::MIN as f64 && number < i64::MAX as f64 {
        Ok((number as i64).into())
    } else if number >= 0.0 && number < u64::MAX as f64 {
        Ok((number as u64).into())
    } else {
        Err("Integer is out of range")
    }
}

/// One step of the path to an offending value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{key}"),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    fn new(path: &[PathSegment], message: impl Into<String>) -> Self {
        Self {
            path: path.to_vec(),
            message: message.into(),
        }
    }

    fn expected(expected: &str, received: &Value, path: &[PathSegment]) -> Self {
        Self::new(
            path,
            format!("Expected {expected}, received {}", type_name(received)),
        )
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Everything that was wrong with a value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Prefixes every issue path with where the value came from
    /// (`params`, `query`, `body`).
    pub fn with_location(mut self, location: &str) -> Self {
        for issue in &mut self.issues {
            issue
                .path
                .insert(0, PathSegment::Key(location.to_owned()));
        }
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, issue) in self.issues.iter().enumerate() {
            if position > 0 {
                write!(f, "; ")?;
            }
            if issue.path.is_empty() {
                write!(f, "{}", issue.message)?;
            } else {
                let path = issue
                    .path
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(".");
                write!(f, "{path}: {}", issue.message)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Rust types that can describe their own validation schema.
pub trait Schematic {
    fn schema() -> Schema;
}

impl Schematic for bool {
    fn schema() -> Schema {
        Schema::boolean()
    }
}

impl Schematic for String {
    fn schema() -> Schema {
        Schema::string()
    }
}

macro_rules! bounded_schematic {
    ($($ty: ty),*) => {
        $(impl Schematic for $ty {
            fn schema() -> Schema {
                Schema::integer()
                    .min(<$ty>::MIN as f64)
                    .max(<$ty>::MAX as f64)
            }
        })*
    };
}

bounded_schematic!(i8, i16, i32, u8, u16, u32);

macro_rules! wide_schematic {
    ($($ty: ty => $schema: expr),*) => {
        $(impl Schematic for $ty {
            fn schema() -> Schema {
                $schema
            }
        })*
    };
}

wide_schematic!(
    i64 => Schema::integer(),
    isize => Schema::integer(),
    u64 => Schema::integer().min(0.0),
    usize => Schema::integer().min(0.0)
);

impl Schematic for f32 {
    fn schema() -> Schema {
        Schema::number()
    }
}

impl Schematic for f64 {
    fn schema() -> Schema {
        Schema::number()
    }
}

impl<T: Schematic> Schematic for Vec<T> {
    fn schema() -> Schema {
        Schema::array(T::schema())
    }
}

impl<T: Schematic> Schematic for Option<T> {
    fn schema() -> Schema {
        T::schema().optional()
    }
}
