use std::fmt;

use crate::{response::Response, schema::ValidationError};

/// The error every handler, middleware and extractor speaks.
///
/// It carries the status code and the body that will be sent back if nothing
/// downstream recovers from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    body: String,
    code: u16,
    json: bool,
}

impl Error {
    /// An error with a plain text body.
    pub fn new(body: String, code: u16) -> Self {
        Self {
            body,
            code,
            json: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::json(400, serde_json::json!({ "message": message.into() }))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::json(404, serde_json::json!({ "message": message.into() }))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::json(500, serde_json::json!({ "message": message.into() }))
    }

    /// An error whose body is a JSON document, sent as `application/json`.
    pub fn json(code: u16, body: serde_json::Value) -> Self {
        Self {
            body: body.to_string(),
            code,
            json: true,
        }
    }

    pub fn body(&self) -> &String {
        &self.body
    }

    pub fn code(&self) -> &u16 {
        &self.code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.body)
    }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::json(
            400,
            serde_json::json!({
                "message": "Request validation failed",
                "issues": err.issues(),
            }),
        )
    }
}

impl From<Error> for Response<String> {
    fn from(val: Error) -> Self {
        let content_type = if val.json {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        };

        Response::builder()
            .status(val.code)
            .header(http::header::CONTENT_TYPE, content_type)
            .body(val.body)
    }
}
