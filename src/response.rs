use crate::result::InternalResult;

pub type HttpResponse<T> = http::Response<T>;
pub type StatusCode = http::StatusCode;

pub struct Response<T> {
    response: HttpResponse<T>,
}

impl Response<()> {
    pub fn builder() -> Builder {
        Builder {
            builder: http::response::Builder::new(),
        }
    }
}

impl<T> Response<T> {
    pub fn new(value: T) -> Self {
        Self {
            response: HttpResponse::new(value),
        }
    }

    pub fn body(&self) -> &T {
        self.response.body()
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &http::HeaderMap<http::HeaderValue> {
        self.response.headers()
    }

    pub fn headers_mut(&mut self) -> &mut http::HeaderMap<http::HeaderValue> {
        self.response.headers_mut()
    }

    pub fn and_then<BodyType>(
        self,
        callback: impl FnOnce(T) -> InternalResult<BodyType>,
    ) -> InternalResult<Response<BodyType>> {
        let (parts, body) = self.response.into_parts();
        callback(body).map(|body| Response {
            response: HttpResponse::from_parts(parts, body),
        })
    }

    pub fn into_inner(self) -> HttpResponse<T> {
        self.response
    }
}

pub struct Builder {
    builder: http::response::Builder,
}

impl Builder {
    pub fn status<S>(self, status: S) -> Self
    where
        StatusCode: TryFrom<S>,
        <StatusCode as TryFrom<S>>::Error: Into<http::Error>,
    {
        Self {
            builder: self.builder.status(status),
        }
    }

    pub fn header<K, V>(self, key: K, value: V) -> Self
    where
        http::HeaderName: TryFrom<K>,
        <http::HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        http::HeaderValue: TryFrom<V>,
        <http::HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        Self {
            builder: self.builder.header(key, value),
        }
    }

    /// Builds the response. An invalid status or header set on the builder
    /// degrades to a bare `500` carrying the same body.
    pub fn body<T>(self, body: T) -> Response<T> {
        match self.builder.body(()) {
            Ok(head) => {
                let (parts, _) = head.into_parts();
                Response {
                    response: HttpResponse::from_parts(parts, body),
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "invalid response head");
                let mut response = HttpResponse::new(body);
                *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                Response { response }
            }
        }
    }
}

impl<T> From<Response<T>> for http::Response<T> {
    fn from(value: Response<T>) -> Self {
        value.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_status_and_header() {
        let response = Response::builder()
            .status(201)
            .header("content-type", "application/json")
            .body("{}".to_string());

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.body(), "{}");
    }

    #[test]
    fn test_invalid_status_degrades_to_500() {
        let response = Response::builder().status(1000u16).body(());

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_new_defaults_to_ok() {
        assert_eq!(Response::new(()).status(), StatusCode::OK);
    }
}
