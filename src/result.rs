use std::ops::Deref;

use crate::{error::Error, schema::ValidationError};

pub(crate) type InternalResult<T> = std::result::Result<T, Error>;

/// What handlers and middlewares return: a value or the [`Error`] that will be
/// answered instead.
///
/// Kept as a newtype so conversions into responses can be implemented on it.
/// It derefs to the plain `std` result for inspection.
#[must_use]
pub struct Result<T>(InternalResult<T>);

impl<T> Result<T> {
    pub fn ok(value: T) -> Self {
        Result(Ok(value))
    }

    pub fn err(error: impl Into<Error>) -> Self {
        Result(Err(error.into()))
    }

    pub fn into_inner(self) -> InternalResult<T> {
        self.0
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Result<U> {
        Result(self.0.map(f))
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<U> {
        match self.0 {
            Ok(value) => f(value),
            Err(err) => Result(Err(err)),
        }
    }
}

impl<T> From<InternalResult<T>> for Result<T> {
    fn from(value: InternalResult<T>) -> Self {
        Result(value)
    }
}

impl<T> From<Result<T>> for InternalResult<T> {
    fn from(value: Result<T>) -> Self {
        value.0
    }
}

impl<T> From<Error> for Result<T> {
    fn from(value: Error) -> Self {
        Result(Err(value))
    }
}

impl<T> From<ValidationError> for Result<T> {
    fn from(value: ValidationError) -> Self {
        Result(Err(value.into()))
    }
}

impl<T> Deref for Result<T> {
    type Target = InternalResult<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
