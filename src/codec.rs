//! Body formats: how a raw body becomes what a handler asked for, and back.
//!
//! A format is picked by the marker passed next to the handler when it is
//! registered: [`Json<T>`] for JSON, `String` for the raw text and `()` for an
//! empty response body.

use std::marker::PhantomData;

use serde::{de::DeserializeOwned, Serialize};

use crate::{error::Error, handler::StandardBodyType, result::InternalResult};

/// Marker selecting JSON as the body format of a runner's input or output.
pub struct Json<T>(PhantomData<fn() -> T>);

impl<T> Json<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for Json<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Json<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

pub trait Codec {
    /// `content-type` of bodies written in this format, if it implies one.
    fn content_type() -> Option<&'static str> {
        None
    }
}

pub trait Decode<T>: Codec {
    fn decode(raw: &StandardBodyType) -> InternalResult<T>;
}

pub trait Encode<T>: Codec {
    fn encode(value: T) -> InternalResult<StandardBodyType>;
}

impl<T> Codec for Json<T> {
    fn content_type() -> Option<&'static str> {
        Some("application/json")
    }
}

impl<T: DeserializeOwned> Decode<T> for Json<T> {
    /// A body that is not the expected JSON is unprocessable, `422`.
    fn decode(raw: &StandardBodyType) -> InternalResult<T> {
        serde_json::from_str(raw).map_err(|err| {
            Error::json(
                422,
                serde_json::json!({ "message": format!("Unprocessable body: {err}") }),
            )
        })
    }
}

impl<T: Serialize> Encode<T> for Json<T> {
    fn encode(value: T) -> InternalResult<StandardBodyType> {
        serde_json::to_string(&value)
            .map_err(|err| Error::internal(format!("Failed to serialize response: {err}")))
    }
}

impl Codec for String {}

impl Decode<String> for String {
    fn decode(raw: &StandardBodyType) -> InternalResult<String> {
        Ok(raw.to_owned())
    }
}

impl Encode<String> for String {
    fn encode(value: String) -> InternalResult<StandardBodyType> {
        Ok(value)
    }
}

impl Codec for () {}

impl Encode<()> for () {
    fn encode(_value: ()) -> InternalResult<StandardBodyType> {
        Ok(String::with_capacity(0))
    }
}
