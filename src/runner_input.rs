use serde::de::DeserializeOwned;

use crate::{
    codec::{Decode, Json},
    handler::StandardBodyType,
    request::Request,
    result::InternalResult,
};

/// A type a runner can receive, extracted from the request with the
/// `Deserializer` format.
pub trait RunnerInput<Deserializer>: Sized {
    fn from_request(input: InternalResult<Request<StandardBodyType>>) -> InternalResult<Self>;
}

impl<BodyType> RunnerInput<Json<BodyType>> for BodyType
where
    BodyType: DeserializeOwned,
{
    fn from_request(input: InternalResult<Request<StandardBodyType>>) -> InternalResult<Self> {
        input.and_then(|req| Json::<BodyType>::decode(req.body()))
    }
}

impl<BodyType> RunnerInput<Json<BodyType>> for Request<BodyType>
where
    BodyType: DeserializeOwned,
{
    fn from_request(input: InternalResult<Request<StandardBodyType>>) -> InternalResult<Self> {
        input.and_then(|req| req.and_then(|body| Json::<BodyType>::decode(&body)))
    }
}

impl RunnerInput<String> for String {
    fn from_request(input: InternalResult<Request<StandardBodyType>>) -> InternalResult<Self> {
        input.map(Request::into_body)
    }
}

impl RunnerInput<String> for Request<String> {
    fn from_request(input: InternalResult<Request<StandardBodyType>>) -> InternalResult<Self> {
        input
    }
}
