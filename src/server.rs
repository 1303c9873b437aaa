use std::{convert::Infallible, future::Future, net::SocketAddr, sync::Arc, time::Instant};

use hyper::{
    server::{conn::AddrIncoming, Builder},
    service::{make_service_fn, service_fn},
    Body,
};

use crate::{
    error::Error,
    handler::{RefHandler, Runner},
    middleware::{AfterMiddleware, PreMiddleware},
    openapi::{Info, OpenApiRegistry},
    request::{Method, PathParams, Request},
    response::Response,
    result::{InternalResult, Result},
    router::Router,
};

/// Owns the routes and answers HTTP over hyper.
#[derive(Default)]
pub struct Server {
    router: Router,
}

macro_rules! server_method {
    ($fn: ident) => {
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
            Server {
                router: self.router.$fn(path, handler, deserializer, serializer),
            }
        }
    };
}

impl Server {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn router(self, router: Router) -> Self {
        Server {
            router: self.router.router(router),
        }
    }

    pub fn pre(self, middleware: impl PreMiddleware) -> Self {
        Server {
            router: self.router.pre(middleware),
        }
    }

    pub fn after(self, middleware: impl AfterMiddleware) -> Self {
        Server {
            router: self.router.after(middleware),
        }
    }

    server_method!(get);
    server_method!(put);
    server_method!(delete);
    server_method!(post);
    server_method!(trace);
    server_method!(options);
    server_method!(connect);
    server_method!(patch);
    server_method!(head);
    server_method!(all);

    /// Serves the OpenAPI document of `registry` as JSON on `GET path`.
    ///
    /// The document is rebuilt on every request, so routes documented after
    /// this call are included.
    pub fn docs(self, path: &str, registry: &OpenApiRegistry, info: Info) -> Self {
        let registry = registry.clone();
        let info = Arc::new(info);

        let runner = move |_req: Request<String>| {
            let registry = registry.clone();
            let info = info.clone();

            async move {
                let document: Result<Response<String>> =
                    serde_json::to_string(&registry.document(&info))
                        .map(|body| {
                            Response::builder()
                                .header(http::header::CONTENT_TYPE, "application/json")
                                .body(body)
                        })
                        .map_err(|err| Error::internal(format!("Failed to render document: {err}")))
                        .into();
                document
            }
        };

        self.get(
            path,
            runner,
            &String::with_capacity(0),
            &String::with_capacity(0),
        )
    }

    /// Runs a request through routing, middlewares and handler, without I/O.
    pub async fn dispatch(&self, mut req: Request<String>) -> Response<String> {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let response = match self.router.find_route(&method, &path) {
            Some((handler, Ok(params))) => {
                req.set_params(params);
                handler(Ok(req))
                    .await
                    .unwrap_or_else(Into::into)
            }
            // middlewares still see the rejection
            Some((handler, Err(err))) => handler(Err(err))
                .await
                .unwrap_or_else(Into::into),
            None => Error::not_found(format!("No route for {method} {path}")).into(),
        };

        tracing::info!(
            method = %method,
            path = %path,
            status = response.status().as_u16(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "request"
        );

        response
    }

    pub async fn listen(self, addr: SocketAddr) -> std::result::Result<(), hyper::Error> {
        let builder = hyper::Server::try_bind(&addr)?;
        self.run(builder, futures::future::pending()).await
    }

    /// Serves on an already bound listener. Useful with port `0`.
    pub async fn serve(self, listener: std::net::TcpListener) -> std::result::Result<(), hyper::Error> {
        self.serve_with_shutdown(listener, futures::future::pending())
            .await
    }

    /// Serves until `signal` resolves, then lets in-flight requests finish.
    pub async fn serve_with_shutdown(
        self,
        listener: std::net::TcpListener,
        signal: impl Future<Output = ()>,
    ) -> std::result::Result<(), hyper::Error> {
        let builder = hyper::Server::from_tcp(listener)?;
        self.run(builder, signal).await
    }

    async fn run(
        self,
        builder: Builder<AddrIncoming>,
        signal: impl Future<Output = ()>,
    ) -> std::result::Result<(), hyper::Error> {
        let server = Arc::new(self);
        let make_service = make_service_fn(move |_conn| {
            let server = server.clone();

            async move {
                Ok::<_, Infallible>(service_fn(move |req: hyper::Request<Body>| {
                    let server = server.clone();

                    async move { Ok::<_, Infallible>(server.handle(req).await) }
                }))
            }
        });

        let running = builder.serve(make_service);
        tracing::info!(addr = %running.local_addr(), "listening");

        running.with_graceful_shutdown(signal).await
    }

    async fn handle(&self, req: hyper::Request<Body>) -> hyper::Response<Body> {
        let (parts, body) = req.into_parts();

        let body = match hyper::body::to_bytes(body).await {
            Ok(bytes) => String::from_utf8(bytes.to_vec())
                .map_err(|_| Error::bad_request("Request body is not valid UTF-8")),
            Err(err) => Err(Error::bad_request(format!("Failed to read request body: {err}"))),
        };

        let response = match body {
            Ok(body) => {
                self.dispatch(Request::from_inner(http::Request::from_parts(parts, body)))
                    .await
            }
            Err(err) => {
                tracing::debug!(method = %parts.method, path = %parts.uri.path(), error = %err, "unreadable body");
                err.into()
            }
        };

        let (parts, body) = response.into_inner().into_parts();
        hyper::Response::from_parts(parts, Body::from(body))
    }

    pub fn find_route(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(RefHandler<'_>, InternalResult<PathParams>)> {
        self.router.find_route(method, path)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::Server;
    use crate::{
        error::Error,
        handler::Json,
        openapi::{Info, OpenApiRegistry},
        request::{Method, Request},
        result::Result,
    };

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct TestStruct {
        correct: bool,
    }

    async fn negate(req: TestStruct) -> TestStruct {
        TestStruct {
            correct: !req.correct,
        }
    }

    async fn forbidden(_req: String) -> Result<String> {
        Error::new("forbidden".into(), 403).into()
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<String> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(body.to_owned())
    }

    #[tokio::test]
    async fn test_dispatch_runs_handler() {
        let server = Server::new().post(
            "/negate",
            negate,
            &Json::<TestStruct>::new(),
            &Json::<TestStruct>::new(),
        );

        let response = server
            .dispatch(request(Method::POST, "/negate", r#"{"correct":false}"#))
            .await;

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), r#"{"correct":true}"#);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_route_is_not_found() {
        let server = Server::new().post(
            "/negate",
            negate,
            &Json::<TestStruct>::new(),
            &Json::<TestStruct>::new(),
        );

        let response = server
            .dispatch(request(Method::GET, "/negate", ""))
            .await;

        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_dispatch_turns_errors_into_responses() {
        let server = Server::new().get("/forbidden", forbidden, &String::new(), &String::new());

        let response = server
            .dispatch(request(Method::GET, "/forbidden", ""))
            .await;

        assert_eq!(response.status(), 403);
        assert_eq!(response.body(), "forbidden");
        assert_eq!(
            response.headers()[http::header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_serve_on_bound_listener_stops_on_signal() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();

        let served = Server::new()
            .serve_with_shutdown(listener, async {})
            .await;

        assert!(served.is_ok());
    }

    #[tokio::test]
    async fn test_docs_route_serves_document() {
        let registry = OpenApiRegistry::new();
        let server = Server::new().docs("/openapi.json", &registry, Info::new("Test", "0.1.0"));

        assert!(server.find_route(&Method::GET, "/openapi.json").is_some());

        let response = server
            .dispatch(request(Method::GET, "/openapi.json", ""))
            .await;
        let document: serde_json::Value = serde_json::from_str(response.body()).unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(document["info"]["title"], "Test");
        assert_eq!(document["paths"], serde_json::json!({}));
    }
}
