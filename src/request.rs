use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;

use crate::headers::Headers;
use crate::proxy::ProxyInfo;
use crate::response::Response;
use crate::version::Version;

/// A parsed request moving through the middleware chain.
///
/// Owns the residual buffer, the bytes read past its own head; they feed the
/// body and, on keep-alive, the next request's parse.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Bytes,
    pub(crate) path: Bytes,
    pub(crate) query: Bytes,
    pub(crate) version: Version,
    pub(crate) headers: Headers,
    pub(crate) host: Bytes,
    pub(crate) port: u16,
    pub(crate) peer: SocketAddr,
    pub(crate) proxy: Option<ProxyInfo>,
    pub(crate) keep_alive_allowed: bool,
    pub(crate) compress: bool,
    pub(crate) buffer: BytesMut,
    pub(crate) response: Option<Response>,
}

impl Request {
    /// Method bytes, verbatim from the wire.
    #[inline]
    pub fn method(&self) -> &Bytes {
        &self.method
    }

    #[inline]
    pub fn path(&self) -> &Bytes {
        &self.path
    }

    /// Query bytes without the `?`, empty when the target carried none.
    #[inline]
    pub fn query(&self) -> &Bytes {
        &self.query
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Lower-cased host from the `Host` header, empty for a host-less
    /// HTTP/1.0 request.
    #[inline]
    pub fn host(&self) -> &Bytes {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// PROXY-protocol peer identity, when the connection carried a preamble.
    #[inline]
    pub fn proxy(&self) -> Option<&ProxyInfo> {
        self.proxy.as_ref()
    }

    /// Whether the keep-alive budget still allows another request after
    /// this one.
    #[inline]
    pub fn keep_alive_allowed(&self) -> bool {
        self.keep_alive_allowed
    }

    #[inline]
    pub fn compress(&self) -> bool {
        self.compress
    }

    /// Queue `response` to be written once the middleware chain completes.
    ///
    /// A later call replaces an earlier one; without any, a `204 No Content`
    /// is synthesized.
    #[inline]
    pub fn respond(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Returns `true` if a response has been queued.
    #[inline]
    pub fn has_response(&self) -> bool {
        self.response.is_some()
    }

    pub(crate) fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    /// Connection disposition from the request head: HTTP/1.1 defaults to
    /// keep-alive, HTTP/1.0 to close, either overridden by a `close` or
    /// `keep-alive` option in the `Connection` header. `close` wins over
    /// `keep-alive` when both appear.
    pub(crate) fn wants_keep_alive(&self) -> bool {
        let mut keep_alive = self.version == Version::HTTP_11;
        if let Some(value) = self.headers.get(b"connection") {
            for option in value.split(|&b| b == b',') {
                let option = option.trim_ascii();
                if option.eq_ignore_ascii_case(b"close") {
                    return false;
                }
                if option.eq_ignore_ascii_case(b"keep-alive") {
                    keep_alive = true;
                }
            }
        }
        keep_alive
    }

    /// Declared body length: `content-length` when it is a plain decimal,
    /// `0` when absent, `Err` on anything undecodable.
    pub(crate) fn content_length(&self) -> Result<u64, ()> {
        let Some(value) = self.headers.get(b"content-length") else {
            return Ok(0);
        };
        if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
            return Err(());
        }
        std::str::from_utf8(value)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(())
    }

    pub(crate) fn has_transfer_encoding(&self) -> bool {
        self.headers.contains(b"transfer-encoding")
    }

    #[cfg(test)]
    pub(crate) fn stub() -> Self {
        Self {
            method: Bytes::from_static(b"GET"),
            path: Bytes::from_static(b"/"),
            query: Bytes::new(),
            version: Version::HTTP_11,
            headers: Headers::new(),
            host: Bytes::new(),
            port: 80,
            peer: ([127, 0, 0, 1], 4000).into(),
            proxy: None,
            keep_alive_allowed: true,
            compress: false,
            buffer: BytesMut::new(),
            response: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Request;
    use crate::version::Version;
    use bytes::Bytes;

    fn with_header(name: &'static [u8], value: &'static [u8]) -> Request {
        let mut req = Request::stub();
        req.headers
            .append(Bytes::from_static(name), Bytes::from_static(value));
        req
    }

    #[test]
    fn test_disposition_defaults() {
        let mut req = Request::stub();
        assert!(req.wants_keep_alive());

        req.version = Version::HTTP_10;
        assert!(!req.wants_keep_alive());
    }

    #[test]
    fn test_disposition_overrides() {
        let req = with_header(b"connection", b"close");
        assert!(!req.wants_keep_alive());

        let mut req = with_header(b"connection", b"keep-alive");
        req.version = Version::HTTP_10;
        assert!(req.wants_keep_alive());

        // close wins regardless of order
        let req = with_header(b"connection", b"keep-alive, close");
        assert!(!req.wants_keep_alive());
    }

    #[test]
    fn test_content_length() {
        assert_eq!(Request::stub().content_length(), Ok(0));
        assert_eq!(with_header(b"content-length", b"42").content_length(), Ok(42));
        assert_eq!(with_header(b"content-length", b"x").content_length(), Err(()));
        assert_eq!(with_header(b"content-length", b"-1").content_length(), Err(()));
    }
}
