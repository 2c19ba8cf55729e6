use bytes::{Buf, Bytes, BytesMut};
use std::task::Poll;

use crate::error::ProtoError;
use crate::version::Version;

/// Parsed request line.
#[derive(Debug)]
pub(crate) struct ReqLine {
    /// Method bytes, verbatim.
    pub method: Bytes,
    pub path: Bytes,
    /// Query bytes without the `?`, empty when absent.
    pub query: Bytes,
    pub version: Version,
}

/// Parse the request line at the start of `buf`.
///
/// Empty `CRLF` preamble lines are consumed and counted against
/// `max_empty`; the line itself is only consumed once complete.
pub(crate) fn parse(
    buf: &mut BytesMut,
    max_line: usize,
    max_empty: usize,
    empty_lines: &mut usize,
) -> Poll<Result<ReqLine, ProtoError>> {
    loop {
        let Some(lf) = buf.iter().position(|&b| b == b'\n') else {
            // the longest unfinished prefix of a legal line is the content
            // plus its CR
            if buf.len() > max_line + 1 {
                return Poll::Ready(Err(ProtoError::RequestLineTooLong));
            }
            return Poll::Pending;
        };

        if lf == 1 && buf[0] == b'\r' {
            if *empty_lines == max_empty {
                return Poll::Ready(Err(ProtoError::TooManyEmptyLines));
            }
            buf.advance(2);
            *empty_lines += 1;
            continue;
        }

        if lf + 1 > max_line + 2 {
            return Poll::Ready(Err(ProtoError::RequestLineTooLong));
        }

        let line = buf.split_to(lf + 1).freeze();
        return Poll::Ready(parse_line(line));
    }
}

/// Parse one complete line, trailing `LF` included.
fn parse_line(line: Bytes) -> Result<ReqLine, ProtoError> {
    let method_end = match scan_method(&line)? {
        Some(end) => end,
        // no separator before end of line
        None => return Err(ProtoError::BadRequestLine),
    };
    let method = line.slice(..method_end);

    let mut at = method_end + 1;
    let (path, query) = parse_target(&line, &mut at)?;

    let version = match &line[at..] {
        b"HTTP/1.1\r\n" => Version::HTTP_11,
        b"HTTP/1.0\r\n" => Version::HTTP_10,
        _ => return Err(ProtoError::UnsupportedVersion),
    };

    Ok(ReqLine { method, path, query, version })
}

/// Offset of the `SP` ending the method, `None` if the line has none.
fn scan_method(line: &[u8]) -> Result<Option<usize>, ProtoError> {
    for (i, &b) in line.iter().enumerate() {
        match b {
            b' ' if i == 0 => return Err(ProtoError::BadRequestLine),
            b' ' => return Ok(Some(i)),
            b'\r' | b'\n' => return Err(ProtoError::BadRequestLine),
            _ => {}
        }
    }
    Ok(None)
}

/// Parse the request target starting at `at`, leaving `at` on the version.
fn parse_target(line: &Bytes, at: &mut usize) -> Result<(Bytes, Bytes), ProtoError> {
    const ROOT: Bytes = Bytes::from_static(b"/");

    if line[*at..].starts_with(b"* ") {
        *at += 2;
        return Ok((Bytes::from_static(b"*"), Bytes::new()));
    }

    // absolute form: the authority is skipped, the Host header is
    // authoritative
    for scheme in [&b"http://"[..], &b"https://"[..], &b"HTTP://"[..], &b"HTTPS://"[..]] {
        if line[*at..].starts_with(scheme) {
            *at += scheme.len();
            loop {
                match line.get(*at) {
                    Some(b'/') => return parse_origin(line, at),
                    Some(b'?') => {
                        *at += 1;
                        let query = parse_query(line, at)?;
                        return Ok((ROOT, query));
                    }
                    Some(b'#') => {
                        *at += 1;
                        skip_fragment(line, at)?;
                        return Ok((ROOT, Bytes::new()));
                    }
                    Some(b' ') => {
                        *at += 1;
                        return Ok((ROOT, Bytes::new()));
                    }
                    Some(b'\r' | b'\n') | None => return Err(ProtoError::BadRequestLine),
                    Some(_) => *at += 1,
                }
            }
        }
    }

    parse_origin(line, at)
}

/// Origin form: path, then optional query and discarded fragment.
fn parse_origin(line: &Bytes, at: &mut usize) -> Result<(Bytes, Bytes), ProtoError> {
    let start = *at;
    loop {
        match line.get(*at) {
            Some(b' ' | b'?' | b'#') => break,
            Some(b'\r' | b'\n') | None => return Err(ProtoError::BadRequestLine),
            Some(_) => *at += 1,
        }
    }
    if *at == start {
        return Err(ProtoError::BadRequestLine);
    }
    let path = line.slice(start..*at);

    let query = match line[*at] {
        b'?' => {
            *at += 1;
            parse_query(line, at)?
        }
        b'#' => {
            *at += 1;
            skip_fragment(line, at)?;
            Bytes::new()
        }
        _ => {
            *at += 1;
            Bytes::new()
        }
    };
    Ok((path, query))
}

/// Query up to `SP` or a discarded `#` fragment.
fn parse_query(line: &Bytes, at: &mut usize) -> Result<Bytes, ProtoError> {
    let start = *at;
    loop {
        match line.get(*at) {
            Some(b' ') => {
                let query = line.slice(start..*at);
                *at += 1;
                return Ok(query);
            }
            Some(b'#') => {
                let query = line.slice(start..*at);
                *at += 1;
                skip_fragment(line, at)?;
                return Ok(query);
            }
            Some(b'\r' | b'\n') | None => return Err(ProtoError::BadRequestLine),
            Some(_) => *at += 1,
        }
    }
}

/// Discard the fragment up to `SP`.
fn skip_fragment(line: &Bytes, at: &mut usize) -> Result<(), ProtoError> {
    loop {
        match line.get(*at) {
            Some(b' ') => {
                *at += 1;
                return Ok(());
            }
            Some(b'\r' | b'\n') | None => return Err(ProtoError::BadRequestLine),
            Some(_) => *at += 1,
        }
    }
}
