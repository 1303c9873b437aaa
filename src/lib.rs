//! Validated, self-documenting HTTP endpoints.
//!
//! A [`Controller`](controller::Controller) declares each endpoint once: the
//! schemas its path parameters, query and body must satisfy, the handler that
//! receives them already typed, and the response schema. The same declaration
//! feeds the [`OpenApiRegistry`](openapi::OpenApiRegistry), which the
//! [`Server`](server::Server) can publish as an OpenAPI 3.0 document.

pub mod codec;
pub mod coerce;
pub mod config;
pub mod controller;
pub mod error;
mod handle_selector;
pub mod handler;
pub mod logging;
pub mod middleware;
pub mod openapi;
pub mod request;
pub mod response;
pub mod result;
pub mod router;
pub mod runner_input;
pub mod runner_output;
pub mod schema;
pub mod server;

pub use config::Config;
pub use controller::{Controller, ControllerOptions, Input, Validation};
pub use error::Error;
pub use openapi::{Info, OpenApiRegistry};
pub use schema::{Schema, Schematic};
pub use server::Server;
