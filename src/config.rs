use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::env::Env;
use crate::middleware::Middleware;
use crate::response::Response;

/// Hook run on every outgoing response before it is written, error replies
/// included. May rewrite the response.
pub type OnResponse = Arc<dyn Fn(Response) -> Response + Send + Sync>;

/// Hook run once per connection, after the first successful read.
pub type OnFirstRequest = Arc<dyn Fn() + Send + Sync>;

/// Connection engine configuration, shared by every connection of an
/// acceptor.
#[derive(Clone)]
pub struct Config {
    pub(crate) compress: bool,
    pub(crate) env: Env,
    pub(crate) max_empty_lines: usize,
    pub(crate) max_header_name_length: usize,
    pub(crate) max_header_value_length: usize,
    pub(crate) max_headers: usize,
    pub(crate) max_keepalive: u32,
    pub(crate) max_request_line_length: usize,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    pub(crate) on_response: Option<OnResponse>,
    pub(crate) on_first_request: Option<OnFirstRequest>,
    pub(crate) timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compress: false,
            env: Env::new(),
            max_empty_lines: 5,
            max_header_name_length: 64,
            max_header_value_length: 4096,
            max_headers: 100,
            max_keepalive: 100,
            max_request_line_length: 4096,
            middlewares: Vec::new(),
            on_response: None,
            on_first_request: None,
            timeout: Duration::from_millis(5000),
        }
    }
}

impl Config {
    /// Create a configuration with the default limits and an empty
    /// middleware chain.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether requests are flagged for compression.
    #[must_use]
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Seed environment cloned for every request.
    ///
    /// The `listener` entry is always overwritten by the acceptor.
    #[must_use]
    pub fn env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// Maximum empty lines tolerated before the request line.
    #[must_use]
    pub fn max_empty_lines(mut self, max: usize) -> Self {
        self.max_empty_lines = max;
        self
    }

    /// Maximum header name length in bytes.
    #[must_use]
    pub fn max_header_name_length(mut self, max: usize) -> Self {
        self.max_header_name_length = max;
        self
    }

    /// Maximum header value length in bytes, folds flattened.
    #[must_use]
    pub fn max_header_value_length(mut self, max: usize) -> Self {
        self.max_header_value_length = max;
        self
    }

    /// Maximum number of headers per request.
    #[must_use]
    pub fn max_headers(mut self, max: usize) -> Self {
        self.max_headers = max;
        self
    }

    /// Maximum requests served per connection.
    #[must_use]
    pub fn max_keepalive(mut self, max: u32) -> Self {
        self.max_keepalive = max;
        self
    }

    /// Maximum request line length in bytes, delimiter excluded.
    #[must_use]
    pub fn max_request_line_length(mut self, max: usize) -> Self {
        self.max_request_line_length = max;
        self
    }

    /// Append a middleware to the chain.
    #[must_use]
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Replace the middleware chain.
    #[must_use]
    pub fn middlewares(mut self, middlewares: Vec<Arc<dyn Middleware>>) -> Self {
        self.middlewares = middlewares;
        self
    }

    /// Response-interception hook.
    #[must_use]
    pub fn on_response(mut self, hook: impl Fn(Response) -> Response + Send + Sync + 'static) -> Self {
        self.on_response = Some(Arc::new(hook));
        self
    }

    /// First-read hook.
    #[must_use]
    pub fn on_first_request(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_first_request = Some(Arc::new(hook));
        self
    }

    /// Idle-read budget per receive.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("compress", &self.compress)
            .field("max_empty_lines", &self.max_empty_lines)
            .field("max_header_name_length", &self.max_header_name_length)
            .field("max_header_value_length", &self.max_header_value_length)
            .field("max_headers", &self.max_headers)
            .field("max_keepalive", &self.max_keepalive)
            .field("max_request_line_length", &self.max_request_line_length)
            .field("middlewares", &self.middlewares.len())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
