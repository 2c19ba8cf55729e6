use bytes::{Buf, BytesMut};
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::{self, FromStr};
use std::task::Poll;

/// Peer identity conveyed by a PROXY-protocol v1 preamble.
///
/// Stored once per connection and attached to every request parsed on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyInfo {
    /// `PROXY TCP4`: original IPv4 endpoints.
    Tcp4 {
        src: Ipv4Addr,
        dst: Ipv4Addr,
        src_port: u16,
        dst_port: u16,
    },
    /// `PROXY TCP6`: original IPv6 endpoints.
    Tcp6 {
        src: Ipv6Addr,
        dst: Ipv6Addr,
        src_port: u16,
        dst_port: u16,
    },
    /// `PROXY UNKNOWN`: the proxy accepted a connection of an unknown family.
    Unknown,
}

/// Outcome of a preamble decode attempt.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Decode {
    Proxied(ProxyInfo),
    /// The line after `PROXY ` is not a v1 preamble.
    NotProxy,
    /// The line is PROXY-shaped but its fields do not parse.
    Malformed,
}

pub(crate) const SIGNATURE: &[u8] = b"PROXY ";

/// Largest possible v1 preamble line, delimiter included.
const MAX_PREAMBLE: usize = 107;

/// Whether `buf` could still begin with the v1 signature.
///
/// `true` for any prefix of `PROXY `, including the empty buffer.
pub(crate) fn maybe_proxy(buf: &[u8]) -> bool {
    let n = buf.len().min(SIGNATURE.len());
    buf[..n] == SIGNATURE[..n]
}

/// Decode the preamble line at the start of `buf`.
///
/// The caller has established that `buf` starts with `PROXY `. On a decode
/// the line including its CRLF is consumed; whatever follows stays in `buf`
/// for the request parser. `Pending` consumes nothing.
pub(crate) fn decode(buf: &mut BytesMut) -> Poll<Decode> {
    debug_assert!(buf.len() >= SIGNATURE.len() && buf.starts_with(SIGNATURE));

    let Some(end) = buf.windows(2).position(|w| w == b"\r\n") else {
        if buf.len() > MAX_PREAMBLE {
            return Poll::Ready(Decode::Malformed);
        }
        return Poll::Pending;
    };

    let decoded = decode_line(&buf[SIGNATURE.len()..end]);
    buf.advance(end + 2);
    Poll::Ready(decoded)
}

fn decode_line(line: &[u8]) -> Decode {
    if line == b"UNKNOWN" || line.starts_with(b"UNKNOWN ") {
        return Decode::Proxied(ProxyInfo::Unknown);
    }

    let family = match line {
        _ if line.starts_with(b"TCP4 ") => 4,
        _ if line.starts_with(b"TCP6 ") => 6,
        _ => return Decode::NotProxy,
    };

    let Ok(rest) = str::from_utf8(&line[b"TCP4 ".len()..]) else {
        return Decode::Malformed;
    };

    let mut fields = rest.split_ascii_whitespace();
    let (Some(src), Some(dst), Some(src_port), Some(dst_port), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Decode::Malformed;
    };

    let (Some(src_port), Some(dst_port)) = (parse_port(src_port), parse_port(dst_port)) else {
        return Decode::Malformed;
    };

    let info = match family {
        4 => match (Ipv4Addr::from_str(src), Ipv4Addr::from_str(dst)) {
            (Ok(src), Ok(dst)) => ProxyInfo::Tcp4 { src, dst, src_port, dst_port },
            _ => return Decode::Malformed,
        },
        _ => match (Ipv6Addr::from_str(src), Ipv6Addr::from_str(dst)) {
            (Ok(src), Ok(dst)) => ProxyInfo::Tcp6 { src, dst, src_port, dst_port },
            _ => return Decode::Malformed,
        },
    };
    Decode::Proxied(info)
}

/// Decimal port in `0..=65535`, digits only.
fn parse_port(field: &str) -> Option<u16> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
