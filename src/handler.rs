use std::sync::Arc;

use futures::{future::BoxFuture, Future};

pub use crate::codec::Json;

use crate::{
    request::Request,
    response::Response,
    result::InternalResult,
    runner_input::RunnerInput,
    runner_output::RunnerOutput,
};

pub type StandardBodyType = String;

pub type HandlerFuture = BoxFuture<'static, InternalResult<Response<StandardBodyType>>>;

pub type BoxedHandler =
    Arc<dyn Fn(InternalResult<Request<StandardBodyType>>) -> HandlerFuture + Send + Sync>;

pub type RefHandler<'a> =
    &'a (dyn Fn(InternalResult<Request<StandardBodyType>>) -> HandlerFuture + Send + Sync);

/// Anything that can answer a request: an async function of one argument
/// whose input and output are picked by a deserializer and a serializer.
pub trait Runner<Input, Output>: Clone + Send + Sync + 'static {
    fn call_runner(&self, req: InternalResult<Request<StandardBodyType>>) -> HandlerFuture;
}

impl<F, Fut, FnIn, Deserializer, FnOut, Serializer>
    Runner<(FnIn, Deserializer), (FnOut, Serializer)> for F
where
    F: Fn(FnIn) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = FnOut> + Send + 'static,
    FnIn: RunnerInput<Deserializer> + Send + 'static,
    FnOut: RunnerOutput<Serializer>,
{
    fn call_runner(&self, req: InternalResult<Request<StandardBodyType>>) -> HandlerFuture {
        let input = <FnIn as RunnerInput<Deserializer>>::from_request(req);
        let runner = self.clone();

        Box::pin(async move {
            match input {
                Ok(input) => <FnOut as RunnerOutput<Serializer>>::into_response(runner(input).await),
                Err(err) => Err(err),
            }
        })
    }
}

pub(crate) fn encapsulate_runner<FnIn, FnOut, Deserializer, Serializer, R>(
    runner: R,
    _deserializer: &Deserializer,
    _serializer: &Serializer,
) -> BoxedHandler
where
    R: Runner<(FnIn, Deserializer), (FnOut, Serializer)>,
{
    Arc::new(move |req| runner.call_runner(req))
}
