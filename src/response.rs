use bytes::{Bytes, BytesMut};
use std::time::SystemTime;

use crate::status::StatusCode;
use crate::version::Version;

/// Response queued by a middleware and serialized by the connection.
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: StatusCode,
    headers: Vec<(Bytes, Bytes)>,
    body: Bytes,
}

impl Response {
    /// Create a response with an empty body.
    #[inline]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// Append a header field.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Serialize head and body into `buf`.
    ///
    /// `date` and the connection disposition are written by the engine;
    /// `content-length` is derived from the body unless a header already
    /// carries one.
    pub(crate) fn write(&self, version: Version, keep_alive: bool, buf: &mut BytesMut) {
        buf.extend_from_slice(version.as_str().as_bytes());
        buf.extend_from_slice(b" ");
        buf.extend_from_slice(self.status.as_str().as_bytes());
        buf.extend_from_slice(b"\r\ndate: ");
        buf.extend_from_slice(httpdate::fmt_http_date(SystemTime::now()).as_bytes());
        buf.extend_from_slice(b"\r\n");

        if !keep_alive {
            buf.extend_from_slice(b"connection: close\r\n");
        } else if version == Version::HTTP_10 {
            // keep-alive is not implied before 1.1
            buf.extend_from_slice(b"connection: keep-alive\r\n");
        }

        let mut has_length = false;
        for (name, value) in &self.headers {
            has_length |= name.as_ref() == b"content-length";
            buf.extend_from_slice(name);
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value);
            buf.extend_from_slice(b"\r\n");
        }
        if !has_length {
            buf.extend_from_slice(b"content-length: ");
            buf.extend_from_slice(itoa::Buffer::new().format(self.body.len()).as_bytes());
            buf.extend_from_slice(b"\r\n");
        }

        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&self.body);
    }
}
