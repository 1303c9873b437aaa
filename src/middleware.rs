use std::sync::Arc;

use futures::{future::BoxFuture, Future};

use crate::{
    handler::{BoxedHandler, HandlerFuture},
    request::Request,
    response::Response,
    result::{InternalResult, Result},
};

/// Runs before the handler. Receives the request, or the error produced by an
/// earlier middleware, and may replace either.
pub trait PreMiddleware: Send + Sync + 'static {
    fn call(&self, req: Result<Request<String>>) -> BoxFuture<'static, Result<Request<String>>>;
}

impl<MidFn, Fut> PreMiddleware for MidFn
where
    MidFn: Fn(Result<Request<String>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Request<String>>> + Send + 'static,
{
    #[inline(always)]
    fn call(&self, req: Result<Request<String>>) -> BoxFuture<'static, Result<Request<String>>> {
        Box::pin(self(req))
    }
}

/// Runs after the handler. Receives its response or its error; this is where
/// errors can be logged, rewritten or recovered from.
pub trait AfterMiddleware: Send + Sync + 'static {
    fn call(&self, res: Result<Response<String>>)
        -> BoxFuture<'static, Result<Response<String>>>;
}

impl<MidFn, Fut> AfterMiddleware for MidFn
where
    MidFn: Fn(Result<Response<String>>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<String>>> + Send + 'static,
{
    #[inline(always)]
    fn call(
        &self,
        res: Result<Response<String>>,
    ) -> BoxFuture<'static, Result<Response<String>>> {
        Box::pin(self(res))
    }
}

/// Ordered pre and after middlewares, applied around handlers as they are built.
#[derive(Clone, Default)]
pub struct MiddlewareFactory {
    pre: Vec<Arc<dyn PreMiddleware>>,
    after: Vec<Arc<dyn AfterMiddleware>>,
}

impl MiddlewareFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pre(mut self, middleware: impl PreMiddleware) -> Self {
        self.pre.push(Arc::new(middleware));
        self
    }

    pub fn after(mut self, middleware: impl AfterMiddleware) -> Self {
        self.after.push(Arc::new(middleware));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_empty() && self.after.is_empty()
    }

    pub fn build(&self, handler: BoxedHandler) -> BoxedHandler {
        if self.is_empty() {
            return handler;
        }

        let factory = self.clone();

        Arc::new(move |req: InternalResult<Request<String>>| -> HandlerFuture {
            let factory = factory.clone();
            let handler = handler.clone();

            Box::pin(async move {
                let mut req: Result<Request<String>> = req.into();
                for middleware in factory.pre.iter() {
                    req = middleware.call(req).await;
                }

                let mut res: Result<Response<String>> = handler(req.into_inner()).await.into();
                for middleware in factory.after.iter() {
                    res = middleware.call(res).await;
                }

                res.into_inner()
            })
        })
    }
}
