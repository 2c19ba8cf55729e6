use bytes::Bytes;

use crate::error::ProtoError;

/// Split a `Host` header value into lower-cased host bytes and a port.
///
/// Accepts `host`, `host:port` and the `[..]` / `[..]:port` IPv6 forms;
/// brackets are stripped. `default_port` applies when the value carries
/// none. An empty value yields an empty host, matching a missing header on
/// HTTP/1.0.
pub(crate) fn parse(raw: &[u8], default_port: u16) -> Result<(Bytes, u16), ProtoError> {
    if raw.is_empty() {
        return Ok((Bytes::new(), default_port));
    }

    let (host, port) = if raw[0] == b'[' {
        let Some(close) = raw.iter().position(|&b| b == b']') else {
            return Err(ProtoError::BadHost);
        };
        let host = &raw[1..close];
        if host.is_empty() {
            return Err(ProtoError::BadHost);
        }
        match &raw[close + 1..] {
            [] => (host, default_port),
            [b':', port @ ..] => (host, parse_port(port)?),
            _ => return Err(ProtoError::BadHost),
        }
    } else {
        match raw.iter().position(|&b| b == b':') {
            Some(0) => return Err(ProtoError::BadHost),
            Some(colon) => (&raw[..colon], parse_port(&raw[colon + 1..])?),
            None => (raw, default_port),
        }
    };

    Ok((Bytes::from(host.to_ascii_lowercase()), port))
}

/// Decimal port in `0..=65535`, digits only.
fn parse_port(bytes: &[u8]) -> Result<u16, ProtoError> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(ProtoError::BadHost);
    }
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(ProtoError::BadHost)
}
