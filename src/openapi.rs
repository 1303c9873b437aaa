//! OpenAPI 3.0 document built from the schemas controllers validate with.

use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::{
    request::Method,
    schema::{Kind, Schema},
};

const JSON_CONTENT: &str = "application/json";

/// Joins `base_path` and `path`, translating `:name` segments into `{name}`.
///
/// Paths without parameters are returned exactly as joined.
///
/// ```
/// use vetted::openapi::swagger_path;
///
/// assert_eq!(swagger_path("/user", "/:userId"), "/user/{userId}");
/// assert_eq!(swagger_path("/power-rangers", "/"), "/power-rangers/");
/// ```
pub fn swagger_path(base_path: &str, path: &str) -> String {
    let joined = format!("{base_path}{path}");

    if !joined.contains(':') {
        return joined;
    }

    joined
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if segment.contains(':') {
                format!("/{{{}}}", segment.replacen(':', "", 1))
            } else {
                format!("/{segment}")
            }
        })
        .collect()
}

impl Schema {
    /// This schema as an OpenAPI schema object.
    pub fn to_openapi(&self) -> Value {
        let mut object = match self.kind() {
            Kind::Optional(inner) => return inner.to_openapi_described(self.description()),
            Kind::Any => Map::new(),
            Kind::String {
                min_length,
                max_length,
            } => {
                let mut object = typed("string");
                if let Some(min) = min_length {
                    object.insert("minLength".into(), json!(min));
                }
                if let Some(max) = max_length {
                    object.insert("maxLength".into(), json!(max));
                }
                object
            }
            Kind::Number {
                minimum,
                maximum,
                integer,
            } => {
                let mut object = typed(if *integer { "integer" } else { "number" });
                if let Some(min) = minimum {
                    object.insert("minimum".into(), json!(min));
                }
                if let Some(max) = maximum {
                    object.insert("maximum".into(), json!(max));
                }
                object
            }
            Kind::Boolean => typed("boolean"),
            Kind::Enum(values) => {
                let mut object = typed("string");
                object.insert("enum".into(), json!(values));
                object
            }
            Kind::Array(item) => {
                let mut object = typed("array");
                object.insert("items".into(), item.to_openapi());
                object
            }
            Kind::Object(fields) => {
                let mut object = typed("object");
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.to_openapi()))
                    .collect();
                let required: Vec<&str> = fields
                    .iter()
                    .filter(|(_, field)| !field.is_optional())
                    .map(|(name, _)| name.as_str())
                    .collect();

                object.insert("properties".into(), Value::Object(properties));
                if !required.is_empty() {
                    object.insert("required".into(), json!(required));
                }
                object
            }
        };

        if let Some(description) = self.description() {
            object.insert("description".into(), json!(description));
        }
        Value::Object(object)
    }

    fn to_openapi_described(&self, outer: Option<&str>) -> Value {
        let mut value = self.to_openapi();
        if let (Some(description), Value::Object(object)) = (outer, &mut value) {
            object.insert("description".into(), json!(description));
        }
        value
    }
}

fn typed(name: &str) -> Map<String, Value> {
    let mut object = Map::new();
    object.insert("type".into(), json!(name));
    object
}

/// Shape of the body every rejected request answers with.
fn validation_error_schema() -> Schema {
    Schema::object([
        ("message", Schema::string()),
        (
            "issues",
            Schema::array(Schema::object([
                ("path", Schema::array(Schema::any())),
                ("message", Schema::string()),
            ]))
            .optional(),
        ),
    ])
}

#[derive(Debug, Clone, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bearer_format: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl SecurityScheme {
    pub fn bearer() -> Self {
        Self {
            kind: "http".into(),
            scheme: Some("bearer".into()),
            bearer_format: Some("JWT".into()),
            location: None,
            name: None,
        }
    }

    pub fn api_key_header(header: impl Into<String>) -> Self {
        Self {
            kind: "apiKey".into(),
            scheme: None,
            bearer_format: None,
            location: Some("header".into()),
            name: Some(header.into()),
        }
    }
}

/// Everything the document needs to know about one endpoint.
#[derive(Debug, Clone)]
pub struct RouteDocs {
    pub method: Method,
    /// Already translated with [`swagger_path`].
    pub path: String,
    pub tags: Vec<String>,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub params: Option<Schema>,
    pub query: Option<Schema>,
    pub body: Option<Schema>,
    pub response: Schema,
    pub status: u16,
}

impl RouteDocs {
    fn operation(&self, security: Option<&str>) -> Operation {
        let mut parameters = parameters_of(self.params.as_ref(), "path");
        parameters.extend(parameters_of(self.query.as_ref(), "query"));

        let request_body = self.body.as_ref().map(|body| RequestBody {
            required: !body.is_optional(),
            content: json_content(body),
        });

        let mut responses = BTreeMap::new();
        responses.insert(
            self.status.to_string(),
            ResponseDoc {
                description: String::new(),
                content: Some(json_content(&self.response)),
            },
        );
        if self.params.is_some() || self.query.is_some() || self.body.is_some() {
            responses.insert(
                "400".into(),
                ResponseDoc {
                    description: "Invalid request input".into(),
                    content: Some(json_content(&validation_error_schema())),
                },
            );
        }

        Operation {
            tags: self.tags.clone(),
            operation_id: self.operation_id.clone(),
            summary: self.summary.clone(),
            parameters,
            request_body,
            responses,
            security: security
                .map(|name| vec![BTreeMap::from([(name.to_owned(), Vec::new())])])
                .unwrap_or_default(),
        }
    }
}

fn json_content(schema: &Schema) -> BTreeMap<String, MediaType> {
    BTreeMap::from([(
        JSON_CONTENT.to_owned(),
        MediaType {
            schema: schema.to_openapi(),
        },
    )])
}

/// One parameter per field of an object schema.
fn parameters_of(schema: Option<&Schema>, location: &'static str) -> Vec<Parameter> {
    let Some(Kind::Object(fields)) = schema.map(Schema::kind) else {
        return Vec::new();
    };

    fields
        .iter()
        .map(|(name, field)| Parameter {
            name: name.clone(),
            location,
            required: location == "path" || !field.is_optional(),
            description: field.description().map(str::to_owned),
            schema: field.to_openapi(),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub openapi: &'static str,
    pub info: Info,
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    pub responses: BTreeMap<String, ResponseDoc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaType {
    pub schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseDoc {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

#[derive(Default)]
struct Registry {
    routes: Vec<RouteDocs>,
    security: Option<(String, SecurityScheme)>,
}

/// Shared collection of documented routes. Clones point at the same registry.
#[derive(Clone, Default)]
pub struct OpenApiRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl OpenApiRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation will require `scheme`, registered under `name`.
    pub fn with_security(self, name: impl Into<String>, scheme: SecurityScheme) -> Self {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .security = Some((name.into(), scheme));
        self
    }

    pub fn register_path(&self, route: RouteDocs) {
        tracing::debug!(method = %route.method, path = %route.path, "route documented");

        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .routes
            .push(route);
    }

    pub fn routes(&self) -> Vec<RouteDocs> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .routes
            .clone()
    }

    pub fn document(&self, info: &Info) -> Document {
        let registry = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let security = registry
            .security
            .as_ref()
            .map(|(name, _)| name.as_str());

        let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
        for route in &registry.routes {
            paths
                .entry(route.path.clone())
                .or_default()
                .insert(
                    route.method.as_str().to_ascii_lowercase(),
                    route.operation(security),
                );
        }

        let components = registry
            .security
            .as_ref()
            .map(|(name, scheme)| Components {
                security_schemes: BTreeMap::from([(name.clone(), scheme.clone())]),
            });

        Document {
            openapi: "3.0.0",
            info: info.clone(),
            paths,
            components,
        }
    }
}
