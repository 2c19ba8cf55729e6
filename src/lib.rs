//! HTTP/1.x connection protocol engine.
//!
//! One task per accepted connection: an optional PROXY-protocol v1
//! preamble, incremental request-line and header parsing under strict
//! limits, a middleware pipeline with suspend/resume, and a keep-alive loop
//! that drains request bodies between pipelined requests.
//!
//! ```no_run
//! use gable::{Config, Env, Outcome, Request, Response, StatusCode, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gable::ServeError> {
//!     let config = Config::new().middleware(middleware::from_fn(
//!         |mut req: Request, env: Env| async move {
//!             req.respond(Response::new(StatusCode::OK).with_body(&b"hello"[..]));
//!             Outcome::Next(req, env)
//!         },
//!     ));
//!     gable::listen("0.0.0.0:3000", config).await
//! }
//! ```
#![warn(missing_debug_implementations)]

mod config;
mod connection;
mod env;
mod error;
mod headers;
mod parser;
mod proxy;
mod request;
mod response;
mod serve;
mod status;
mod transport;
mod version;

pub mod middleware;

// ===== Reexports =====

pub use config::{Config, OnFirstRequest, OnResponse};
pub use connection::Connection;
pub use env::{Env, HandlerResult};
pub use error::{ProtoError, RecvError};
pub use headers::Headers;
pub use middleware::{Middleware, Outcome};
pub use proxy::ProxyInfo;
pub use request::Request;
pub use response::Response;
pub use serve::{ServeError, listen, serve};
pub use status::StatusCode;
pub use transport::{Scheme, TcpTransport, Transport};
pub use version::Version;
