use http::{HeaderMap, HeaderName, HeaderValue};

use crate::result::InternalResult;

pub type Method = http::Method;
pub type Uri = http::Uri;

static NO_PARAMS: PathParams = PathParams(Vec::new());

/// Values captured by the parameter segments of a route, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(Vec<(String, String)>);

impl PathParams {
    pub fn new(params: Vec<(String, String)>) -> Self {
        Self(params)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An HTTP request whose body has been read into `T`.
///
/// Path parameters travel in the request extensions once it has been routed.
pub struct Request<T>(http::Request<T>);

impl Request<()> {
    pub fn builder() -> Builder {
        Builder(http::request::Builder::new())
    }
}

impl<T> Request<T> {
    pub fn new(value: T) -> Self {
        Self(http::Request::new(value))
    }

    pub fn from_inner(req: http::Request<T>) -> Self {
        Self(req)
    }

    pub fn body(&self) -> &T {
        self.0.body()
    }

    pub fn into_body(self) -> T {
        self.0.into_body()
    }

    /// Replaces the body, keeping method, uri, headers and path parameters.
    pub fn and_then<BodyType>(
        self,
        callback: impl FnOnce(T) -> InternalResult<BodyType>,
    ) -> InternalResult<Request<BodyType>> {
        let (parts, body) = self.0.into_parts();
        callback(body).map(|body| Request(http::Request::from_parts(parts, body)))
    }

    pub fn method(&self) -> &Method {
        self.0.method()
    }

    pub fn uri(&self) -> &Uri {
        self.0.uri()
    }

    /// Raw query string, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.0.uri().query()
    }

    pub fn headers(&self) -> &HeaderMap<HeaderValue> {
        self.0.headers()
    }

    pub fn params(&self) -> &PathParams {
        self.0
            .extensions()
            .get::<PathParams>()
            .unwrap_or(&NO_PARAMS)
    }

    pub(crate) fn set_params(&mut self, params: PathParams) {
        self.0.extensions_mut().insert(params);
    }
}

impl<T> From<Request<T>> for http::Request<T> {
    fn from(value: Request<T>) -> Self {
        value.0
    }
}

pub struct Builder(http::request::Builder);

impl Builder {
    pub fn method(self, method: Method) -> Self {
        Self(self.0.method(method))
    }

    pub fn uri<U>(self, uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<http::Error>,
    {
        Self(self.0.uri(uri))
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        Self(self.0.header(key, value))
    }

    pub fn try_body<T>(self, body: T) -> std::result::Result<Request<T>, http::Error> {
        self.0.body(body).map(Request)
    }

    /// # Panics
    ///
    /// Panics if an invalid uri, method or header was given to the builder.
    /// Use [`Builder::try_body`] to handle that case.
    pub fn body<T>(self, body: T) -> Request<T> {
        match self.try_body(body) {
            Ok(request) => request,
            Err(err) => panic!("invalid request: {err}"),
        }
    }
}
