use std::collections::HashMap;

use crate::{
    handle_selector::HandlerSelect,
    handler::{encapsulate_runner, BoxedHandler, RefHandler, Runner},
    middleware::{AfterMiddleware, MiddlewareFactory, PreMiddleware},
    request::{Method, PathParams},
    result::InternalResult,
};

const METHODS: [Method; 9] = [
    Method::GET,
    Method::PUT,
    Method::DELETE,
    Method::POST,
    Method::TRACE,
    Method::OPTIONS,
    Method::CONNECT,
    Method::PATCH,
    Method::HEAD,
];

/// Method + path table of handlers, with the middlewares that wrap them.
///
/// Middlewares wrap the handlers registered (or merged with [`Router::router`])
/// after they were added, so declare them first.
#[derive(Default)]
pub struct Router {
    middleware_factory: MiddlewareFactory,
    routes: HashMap<Method, HandlerSelect>,
}

macro_rules! method_insert {
    ($fn: ident, $method: expr) => {
        pub fn $fn<FnIn, FnOut, Deserializer, Serializer, R>(
            self,
            path: &str,
            handler: R,
            deserializer: &Deserializer,
            serializer: &Serializer,
        ) -> Self
        where
            R: Runner<(FnIn, Deserializer), (FnOut, Serializer)>,
        {
            self.method($method, path, handler, deserializer, serializer)
        }
    };
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `router` into this one. This router's middlewares wrap the
    /// merged handlers, outside of the ones `router` already applied.
    pub fn router(mut self, router: Router) -> Self {
        for (method, select) in router.routes {
            let wrapped = select
                .into_routes()
                .into_iter()
                .map(|(pattern, handler)| (pattern, self.middleware_factory.build(handler)));

            self.routes
                .entry(method)
                .or_default()
                .extend(wrapped);
        }

        self
    }

    pub fn pre(self, middleware: impl PreMiddleware) -> Self {
        Router {
            middleware_factory: self.middleware_factory.pre(middleware),
            routes: self.routes,
        }
    }

    pub fn after(self, middleware: impl AfterMiddleware) -> Self {
        Router {
            middleware_factory: self.middleware_factory.after(middleware),
            routes: self.routes,
        }
    }

    pub fn method<FnIn, FnOut, Deserializer, Serializer, R>(
        self,
        method: Method,
        path: &str,
        handler: R,
        deserializer: &Deserializer,
        serializer: &Serializer,
    ) -> Self
    where
        R: Runner<(FnIn, Deserializer), (FnOut, Serializer)>,
    {
        let handler = encapsulate_runner(handler, deserializer, serializer);
        self.insert(method, path, handler)
    }

    fn insert(mut self, method: Method, path: &str, handler: BoxedHandler) -> Self {
        tracing::debug!(method = %method, path, "route registered");

        let handler = self.middleware_factory.build(handler);
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler);

        self
    }

    method_insert!(get, Method::GET);
    method_insert!(put, Method::PUT);
    method_insert!(delete, Method::DELETE);
    method_insert!(post, Method::POST);
    method_insert!(trace, Method::TRACE);
    method_insert!(options, Method::OPTIONS);
    method_insert!(connect, Method::CONNECT);
    method_insert!(patch, Method::PATCH);
    method_insert!(head, Method::HEAD);

    pub fn all<FnIn, FnOut, Deserializer, Serializer, R>(
        self,
        path: &str,
        handler: R,
        deserializer: &Deserializer,
        serializer: &Serializer,
    ) -> Self
    where
        R: Runner<(FnIn, Deserializer), (FnOut, Serializer)>,
    {
        let handler = encapsulate_runner(handler, deserializer, serializer);

        METHODS
            .into_iter()
            .fold(self, |router, method| router.insert(method, path, handler.clone()))
    }

    /// Resolves the handler for `method` and `path`. The parameters are an
    /// error when a captured segment does not percent-decode.
    pub fn find_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(RefHandler<'_>, InternalResult<PathParams>)> {
        self.routes
            .get(method)
            .and_then(|select| select.get(path))
    }
}
