use serde::Serialize;

use crate::{
    codec::{Encode, Json},
    handler::StandardBodyType,
    response::Response,
    result::InternalResult,
};

/// A type a runner can return, written out with the `Serializer` format.
pub trait RunnerOutput<Serializer> {
    fn into_response(self) -> InternalResult<Response<StandardBodyType>>;
}

/// Encodes the body and, unless the handler chose one, sets the format's
/// `content-type`.
fn encoded<Format, BodyType>(response: Response<BodyType>) -> InternalResult<Response<StandardBodyType>>
where
    Format: Encode<BodyType>,
{
    let mut response = response.and_then(Format::encode)?;

    if let Some(content_type) = Format::content_type() {
        response
            .headers_mut()
            .entry(http::header::CONTENT_TYPE)
            .or_insert(http::HeaderValue::from_static(content_type));
    }

    Ok(response)
}

impl<BodyType> RunnerOutput<Json<BodyType>> for BodyType
where
    BodyType: Serialize,
{
    fn into_response(self) -> InternalResult<Response<StandardBodyType>> {
        encoded::<Json<BodyType>, _>(Response::new(self))
    }
}

impl<BodyType> RunnerOutput<Json<BodyType>> for Response<BodyType>
where
    BodyType: Serialize,
{
    fn into_response(self) -> InternalResult<Response<StandardBodyType>> {
        encoded::<Json<BodyType>, _>(self)
    }
}

impl RunnerOutput<String> for String {
    fn into_response(self) -> InternalResult<Response<StandardBodyType>> {
        Ok(Response::new(self))
    }
}

impl RunnerOutput<String> for Response<String> {
    fn into_response(self) -> InternalResult<Response<StandardBodyType>> {
        Ok(self)
    }
}

impl RunnerOutput<()> for () {
    fn into_response(self) -> InternalResult<Response<StandardBodyType>> {
        encoded::<(), _>(Response::new(self))
    }
}

impl<Serializer, BasicRunnerOutput> RunnerOutput<Serializer> for crate::result::Result<BasicRunnerOutput>
where
    BasicRunnerOutput: RunnerOutput<Serializer>,
{
    fn into_response(self) -> InternalResult<Response<StandardBodyType>> {
        self.into_inner()
            .and_then(<BasicRunnerOutput as RunnerOutput<Serializer>>::into_response)
    }
}
