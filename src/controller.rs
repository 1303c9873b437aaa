//! One declaration per endpoint: the schemas it validates with, the handler it
//! dispatches to, and the OpenAPI entry that documents it.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use vetted::{
//!     controller::{Controller, ControllerOptions, Input, Validation},
//!     openapi::OpenApiRegistry,
//!     result::Result,
//!     schema::Schema,
//! };
//!
//! #[derive(Deserialize)]
//! struct ById {
//!     id: u64,
//! }
//!
//! #[derive(Serialize)]
//! struct Ranger {
//!     id: u64,
//!     name: String,
//! }
//!
//! async fn find(input: Input<ById>) -> Result<Ranger> {
//!     Ok(Ranger {
//!         id: input.params.id,
//!         name: "Jason".into(),
//!     })
//!     .into()
//! }
//!
//! let registry = OpenApiRegistry::new();
//! let router = Controller::new(ControllerOptions::new("Power Rangers", "/power-rangers"), &registry)
//!     .get(
//!         "/:id",
//!         Validation::new(Schema::object([("id", Schema::integer()), ("name", Schema::string())]))
//!             .params(Schema::object([("id", Schema::integer().min(0.0))])),
//!         find,
//!     )
//!     .into_router();
//! ```

use std::sync::Arc;

use futures::Future;
use serde::{de::DeserializeOwned, de::IgnoredAny, Serialize};
use serde_json::{Map, Value};

use crate::{
    coerce::{coerce_params, params_map, query_map},
    error::Error,
    openapi::{swagger_path, OpenApiRegistry, RouteDocs},
    request::{Method, Request},
    response::Response,
    result::{InternalResult, Result},
    router::Router,
    schema::{Schema, ValidationError},
};

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Tag every documented route is grouped under.
    pub name: String,
    /// Prefix of every route. Empty, or starting with `/`.
    pub base_path: String,
    /// Check handler output against the response schema and warn on mismatch.
    pub validate_responses: bool,
}

impl ControllerOptions {
    pub fn new(name: impl Into<String>, base_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_path: base_path.into(),
            validate_responses: cfg!(debug_assertions),
        }
    }

    pub fn validate_responses(mut self, enabled: bool) -> Self {
        self.validate_responses = enabled;
        self
    }
}

/// Schemas of an endpoint. Only the response one is mandatory.
#[derive(Debug, Clone)]
pub struct Validation {
    params: Option<Schema>,
    query: Option<Schema>,
    body: Option<Schema>,
    response: Schema,
    operation_id: Option<String>,
    summary: Option<String>,
}

impl Validation {
    pub fn new(response: Schema) -> Self {
        Self {
            params: None,
            query: None,
            body: None,
            response,
            operation_id: None,
            summary: None,
        }
    }

    pub fn params(mut self, schema: Schema) -> Self {
        self.params = Some(schema);
        self
    }

    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    pub fn operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// What a handler receives: the validated path parameters, query and body.
#[derive(Debug)]
pub struct Input<P = IgnoredAny, Q = IgnoredAny, B = IgnoredAny> {
    pub params: P,
    pub query: Q,
    pub body: B,
}

pub struct Controller {
    options: ControllerOptions,
    registry: OpenApiRegistry,
    router: Router,
}

macro_rules! controller_method {
    ($fn: ident, $method: expr, $status: literal) => {
        #[doc = concat!("Registers a `", stringify!($fn), "` endpoint answering `", stringify!($status), "` on success.")]
        pub fn $fn<P, Q, B, R, F, Fut>(self, path: &str, validation: Validation, handler: F) -> Self
        where
            P: DeserializeOwned + Send + 'static,
            Q: DeserializeOwned + Send + 'static,
            B: DeserializeOwned + Send + 'static,
            R: Serialize + 'static,
            F: Fn(Input<P, Q, B>) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Result<R>> + Send + 'static,
        {
            self.route($method, $status, path, validation, handler)
        }
    };
}

impl Controller {
    /// # Panics
    ///
    /// Panics if the base path is neither empty nor starting with `/`.
    pub fn new(options: ControllerOptions, registry: &OpenApiRegistry) -> Self {
        assert!(
            options.base_path.is_empty() || options.base_path.starts_with('/'),
            "base path `{}` must start with `/`",
            options.base_path
        );

        Self {
            options,
            registry: registry.clone(),
            router: Router::new(),
        }
    }

    controller_method!(get, Method::GET, 200);
    controller_method!(post, Method::POST, 201);
    controller_method!(put, Method::PUT, 200);
    controller_method!(patch, Method::PATCH, 200);
    controller_method!(delete, Method::DELETE, 200);

    /// Documents the endpoint and registers it on the controller's router.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not start with `/`.
    pub fn route<P, Q, B, R, F, Fut>(
        mut self,
        method: Method,
        status: u16,
        path: &str,
        validation: Validation,
        handler: F,
    ) -> Self
    where
        P: DeserializeOwned + Send + 'static,
        Q: DeserializeOwned + Send + 'static,
        B: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(Input<P, Q, B>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R>> + Send + 'static,
    {
        assert!(path.starts_with('/'), "route path `{path}` must start with `/`");

        self.registry.register_path(RouteDocs {
            method: method.clone(),
            path: swagger_path(&self.options.base_path, path),
            tags: vec![self.options.name.clone()],
            operation_id: validation.operation_id,
            summary: validation.summary,
            params: validation.params.clone(),
            query: validation.query.clone(),
            body: validation.body.clone(),
            response: validation.response.clone(),
            status,
        });

        let full_path = format!("{}{}", self.options.base_path, path);
        let endpoint = Arc::new(Endpoint {
            method: method.clone(),
            path: full_path.clone(),
            params: validation.params,
            query: validation.query,
            body: validation.body,
            response: validation.response,
            status,
            validate_response: self.options.validate_responses,
        });
        let handler = Arc::new(handler);

        let runner = move |req: Request<String>| {
            let endpoint = endpoint.clone();
            let handler = handler.clone();

            async move {
                let result = match endpoint.extract::<P, Q, B>(&req) {
                    Ok(input) => match (*handler)(input).await.into_inner() {
                        Ok(output) => endpoint.respond(&output),
                        Err(err) => Err(err),
                    },
                    Err(err) => Err(err),
                };

                Result::from(result)
            }
        };

        self.router = self.router.method(
            method,
            &full_path,
            runner,
            &String::with_capacity(0),
            &String::with_capacity(0),
        );
        self
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

struct Endpoint {
    method: Method,
    path: String,
    params: Option<Schema>,
    query: Option<Schema>,
    body: Option<Schema>,
    response: Schema,
    status: u16,
    validate_response: bool,
}

impl Endpoint {
    fn extract<P, Q, B>(&self, req: &Request<String>) -> InternalResult<Input<P, Q, B>>
    where
        P: DeserializeOwned,
        Q: DeserializeOwned,
        B: DeserializeOwned,
    {
        let params = self.validate_strings(params_map(req.params()), self.params.as_ref(), "params")?;
        let query = self.validate_strings(query_map(req.query()), self.query.as_ref(), "query")?;
        let body = self.validate_body(req.body())?;

        Ok(Input {
            params: typed(params, "params", self.params.is_some())?,
            query: typed(query, "query", self.query.is_some())?,
            body: typed(body, "body", self.body.is_some())?,
        })
    }

    fn validate_strings(
        &self,
        mut raw: Map<String, Value>,
        schema: Option<&Schema>,
        location: &str,
    ) -> InternalResult<Value> {
        let Some(schema) = schema else {
            return Ok(Value::Object(raw));
        };

        coerce_params(&mut raw, schema);
        schema
            .parse(Value::Object(raw))
            .map_err(|err| self.rejected(err.with_location(location)))
    }

    fn validate_body(&self, raw: &str) -> InternalResult<Value> {
        let decoded = if raw.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(raw) {
                Ok(value) => value,
                Err(err) if self.body.is_some() => {
                    tracing::debug!(method = %self.method, path = %self.path, error = %err, "malformed body");
                    return Err(Error::bad_request(format!("Malformed JSON body: {err}")));
                }
                Err(_) => Value::String(raw.to_owned()),
            }
        };

        let Some(schema) = &self.body else {
            return Ok(decoded);
        };

        schema
            .parse(decoded)
            .map_err(|err| self.rejected(err.with_location("body")))
    }

    fn rejected(&self, err: ValidationError) -> Error {
        tracing::debug!(method = %self.method, path = %self.path, issues = %err, "request rejected");
        err.into()
    }

    fn respond<R: Serialize>(&self, output: &R) -> InternalResult<Response<String>> {
        let value = serde_json::to_value(output)
            .map_err(|err| Error::internal(format!("Failed to serialize response: {err}")))?;

        if self.validate_response && !self.response.is_valid(&value) {
            if let Err(err) = self.response.parse(value.clone()) {
                tracing::warn!(
                    method = %self.method,
                    path = %self.path,
                    issues = %err,
                    "response does not match its schema"
                );
            }
        }

        Ok(Response::builder()
            .status(self.status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(value.to_string()))
    }
}

/// A value that passed its schema but does not fit the handler's type is a
/// declaration mistake, not a client one.
fn typed<T: DeserializeOwned>(value: Value, location: &str, validated: bool) -> InternalResult<T> {
    serde_json::from_value(value).map_err(|err| {
        if validated {
            tracing::error!(location, error = %err, "validated input does not fit the handler type");
            Error::internal(format!("Invalid {location} type: {err}"))
        } else {
            Error::bad_request(format!("Invalid {location}: {err}"))
        }
    })
}
