//! Per-connection protocol driving.
//!
//! One task owns one accepted connection and runs it sequentially: an
//! optional PROXY preamble, then per request the line and header parse
//! phases, the finalizer, the middleware chain, and the keep-alive decision.
//! Parsing always runs against the buffered bytes first; the transport is
//! only consulted when the parsers report they need more, so limit
//! violations fail before further reads.

use bytes::{Buf, Bytes, BytesMut};
use std::fmt;
use std::sync::Arc;
use std::task::Poll;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::Config;
use crate::env::{Env, HandlerResult};
use crate::error::{ProtoError, RecvError};
use crate::headers::Headers;
use crate::middleware;
use crate::parser::reqline::ReqLine;
use crate::parser::{header, host, reqline};
use crate::proxy::{self, Decode, ProxyInfo};
use crate::request::Request;
use crate::response::Response;
use crate::status::StatusCode;
use crate::transport::Transport;
use crate::version::Version;


/// Bodies larger than this are not drained for keep-alive; the connection
/// closes after the response instead.
const MAX_DRAIN_BODY: u64 = 1024 * 1024;

/// How a connection ends.
enum Exit {
    /// Protocol violation: reply with the mapped status, then close.
    Error(ProtoError),
    /// Close without a response.
    Silent,
    /// Clean end: keep-alive exhausted, handler close, or peer done.
    Done,
}

/// Per-connection protocol state.
///
/// Owns the transport for the connection's lifetime; [`Connection::run`]
/// closes it on every exit path.
pub struct Connection<T> {
    transport: T,
    config: Arc<Config>,
    buffer: BytesMut,
    /// Requests begun on this connection, the current one included.
    req_keepalive: u32,
    /// Deadline of the current read phase.
    until: Option<Instant>,
    peer_proxy_info: Option<ProxyInfo>,
    seen_first_read: bool,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, config: Arc<Config>) -> Self {
        Self {
            transport,
            config,
            buffer: BytesMut::with_capacity(1024),
            req_keepalive: 1,
            until: None,
            peer_proxy_info: None,
            seen_first_read: false,
        }
    }

    /// Serve requests until the connection terminates.
    pub async fn run(mut self) {
        match self.drive().await {
            Exit::Error(err) => {
                debug!(error = %err, status = err.status().status(), "closing on protocol error");
                self.error_reply(err.status()).await;
            }
            Exit::Silent => trace!("closing without response"),
            Exit::Done => trace!("connection done"),
        }
        self.transport.close().await;
    }

    async fn drive(&mut self) -> Exit {
        self.until = Some(Instant::now() + self.config.timeout);

        if let Err(exit) = self.proxy_preamble().await {
            return exit;
        }

        loop {
            let line = match self.read_request_line().await {
                Ok(line) => line,
                Err(exit) => return exit,
            };
            let headers = match self.read_headers().await {
                Ok(headers) => headers,
                Err(exit) => return exit,
            };
            let (req, env) = match self.finalize(line, headers) {
                Ok(ok) => ok,
                Err(exit) => return exit,
            };
            trace!(
                method = %String::from_utf8_lossy(req.method()),
                path = %String::from_utf8_lossy(req.path()),
                keepalive = self.req_keepalive,
                "request parsed"
            );

            let (req, result) = middleware::execute(&self.config.middlewares, req, env).await;

            match self.finish(req, result).await {
                Ok(()) => {}
                Err(exit) => return exit,
            }
        }
    }

    /// Append transport bytes to the buffer, honoring the current deadline.
    async fn recv_more(&mut self) -> Result<(), RecvError> {
        let received = match self.until {
            None => self
                .transport
                .recv(&mut self.buffer)
                .await
                .map_err(RecvError::Io)?,
            Some(until) => {
                if until <= Instant::now() {
                    return Err(RecvError::Timeout);
                }
                match tokio::time::timeout_at(until, self.transport.recv(&mut self.buffer)).await {
                    Ok(Ok(received)) => received,
                    Ok(Err(err)) => return Err(RecvError::Io(err)),
                    Err(_) => return Err(RecvError::Timeout),
                }
            }
        };
        if received == 0 {
            return Err(RecvError::Closed);
        }
        if !self.seen_first_read {
            self.seen_first_read = true;
            if let Some(hook) = &self.config.on_first_request {
                hook();
            }
        }
        Ok(())
    }

    /// Decode an optional PROXY v1 preamble; only the connection's very
    /// first bytes can carry one.
    async fn proxy_preamble(&mut self) -> Result<(), Exit> {
        while proxy::maybe_proxy(&self.buffer) && self.buffer.len() < proxy::SIGNATURE.len() {
            if let Err(err) = self.recv_more().await {
                return match err {
                    RecvError::Closed if self.buffer.is_empty() => Err(Exit::Done),
                    _ => Err(Exit::Silent),
                };
            }
        }
        if !proxy::maybe_proxy(&self.buffer) {
            return Ok(());
        }
        loop {
            match proxy::decode(&mut self.buffer) {
                Poll::Ready(Decode::Proxied(info)) => {
                    trace!(?info, "proxy preamble accepted");
                    self.peer_proxy_info = Some(info);
                    return Ok(());
                }
                Poll::Ready(decoded) => {
                    debug!(?decoded, "rejecting proxy preamble");
                    return Err(Exit::Silent);
                }
                Poll::Pending => {
                    if self.recv_more().await.is_err() {
                        return Err(Exit::Silent);
                    }
                }
            }
        }
    }

    /// Request-line phase. Timeouts here mean an idle peer and close the
    /// connection without a response.
    async fn read_request_line(&mut self) -> Result<ReqLine, Exit> {
        let mut empty_lines = 0;
        loop {
            match reqline::parse(
                &mut self.buffer,
                self.config.max_request_line_length,
                self.config.max_empty_lines,
                &mut empty_lines,
            ) {
                Poll::Ready(Ok(line)) => return Ok(line),
                Poll::Ready(Err(err)) => return Err(Exit::Error(err)),
                Poll::Pending => {
                    if let Err(err) = self.recv_more().await {
                        return match err {
                            RecvError::Closed if self.buffer.is_empty() => Err(Exit::Done),
                            _ => Err(Exit::Silent),
                        };
                    }
                }
            }
        }
    }

    /// Header phase. Timeouts here are worth a `408` reply.
    async fn read_headers(&mut self) -> Result<Headers, Exit> {
        self.until = Some(Instant::now() + self.config.timeout);

        let mut headers = Headers::new();
        loop {
            match header::parse(
                &mut self.buffer,
                self.config.max_header_name_length,
                self.config.max_header_value_length,
            ) {
                Poll::Ready(Ok(Some((name, value)))) => {
                    if headers.len() == self.config.max_headers {
                        return Err(Exit::Error(ProtoError::TooManyHeaders));
                    }
                    headers.append(name, value);
                }
                Poll::Ready(Ok(None)) => return Ok(headers),
                Poll::Ready(Err(err)) => return Err(Exit::Error(err)),
                Poll::Pending => {
                    if let Err(err) = self.recv_more().await {
                        return Err(match err {
                            RecvError::Timeout => Exit::Error(ProtoError::HeaderTimeout),
                            _ => Exit::Silent,
                        });
                    }
                }
            }
        }
    }

    /// Resolve host and peer, then assemble the request around the residual
    /// buffer.
    fn finalize(&mut self, line: ReqLine, headers: Headers) -> Result<(Request, Env), Exit> {
        let default_port = self.transport.scheme().default_port();
        let (host, port) = match headers.get(b"host") {
            Some(raw) => host::parse(raw, default_port).map_err(Exit::Error)?,
            None if line.version == Version::HTTP_11 => {
                return Err(Exit::Error(ProtoError::MissingHost));
            }
            None => (Bytes::new(), default_port),
        };
        let peer = match self.transport.peer_addr() {
            Ok(peer) => peer,
            // peer gone, nothing to reply to
            Err(_) => return Err(Exit::Silent),
        };

        let env = self.config.env.clone();
        let req = Request {
            method: line.method,
            path: line.path,
            query: line.query,
            version: line.version,
            headers,
            host,
            port,
            peer,
            proxy: self.peer_proxy_info.clone(),
            keep_alive_allowed: self.req_keepalive < self.config.max_keepalive,
            compress: self.config.compress,
            buffer: self.buffer.split(),
            response: None,
        };
        Ok((req, env))
    }

    /// Keep-alive handling after the middleware chain: respond, recover the
    /// residual buffer, loop or close.
    async fn finish(&mut self, mut req: Request, result: HandlerResult) -> Result<(), Exit> {
        let response = req
            .take_response()
            .unwrap_or_else(|| Response::new(StatusCode::NO_CONTENT));

        let keep_alive =
            result == HandlerResult::Ok && req.wants_keep_alive() && req.keep_alive_allowed();

        if self
            .send_response(response, req.version(), keep_alive)
            .await
            .is_err()
        {
            return Err(Exit::Silent);
        }
        if !keep_alive {
            return Err(Exit::Done);
        }

        self.buffer = std::mem::take(&mut req.buffer);
        if !self.drain_body(&req).await {
            debug!("request body not drainable, closing");
            return Err(Exit::Done);
        }

        self.req_keepalive += 1;
        self.until = Some(Instant::now() + self.config.timeout);
        Ok(())
    }

    /// Skip past the request body so the buffer starts at the next request.
    async fn drain_body(&mut self, req: &Request) -> bool {
        if req.has_transfer_encoding() {
            return false;
        }
        let length = match req.content_length() {
            Ok(length) if length <= MAX_DRAIN_BODY => length,
            _ => return false,
        };

        self.until = Some(Instant::now() + self.config.timeout);
        let mut remaining = length as usize;
        loop {
            let take = remaining.min(self.buffer.len());
            self.buffer.advance(take);
            remaining -= take;
            if remaining == 0 {
                return true;
            }
            if self.recv_more().await.is_err() {
                return false;
            }
        }
    }

    async fn send_response(
        &mut self,
        response: Response,
        version: Version,
        keep_alive: bool,
    ) -> Result<(), ()> {
        let response = match &self.config.on_response {
            Some(hook) => hook(response),
            None => response,
        };
        let mut out = BytesMut::with_capacity(256);
        response.write(version, keep_alive, &mut out);
        self.transport.send(&out).await.map_err(|err| {
            debug!(error = %err, "failed to write response");
        })
    }

    /// Reply for a request that never finished parsing: a minimal HTTP/1.1
    /// response carrying `status`, then close.
    async fn error_reply(&mut self, status: StatusCode) {
        let _ = self
            .send_response(Response::new(status), Version::HTTP_11, false)
            .await;
    }
}

impl<T> fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("req_keepalive", &self.req_keepalive)
            .finish_non_exhaustive()
    }
}
