use bytes::{Buf, Bytes, BytesMut};
use std::task::Poll;

use crate::error::ProtoError;

/// Parse the header line at the start of `buf`.
///
/// `Ready(Some(..))` yields one `(name, value)` field with the name
/// lower-cased and the value right-trimmed of `SP`/`HTAB`; `Ready(None)`
/// means the empty-line terminator was consumed and the header block is
/// complete.
///
/// Obs-folded continuation lines are part of the field: a `CRLF` followed by
/// `SP`/`HTAB` contributes that one whitespace byte to the value. A `LF` at
/// the end of the buffer stays uncommitted until the lookahead byte arrives,
/// since it could be either a fold or the field terminator.
pub(crate) fn parse(
    buf: &mut BytesMut,
    max_name: usize,
    max_value: usize,
) -> Poll<Result<Option<(Bytes, Bytes)>, ProtoError>> {
    // terminator: empty line closing the header block
    match buf.first() {
        None => return Poll::Pending,
        Some(b'\r') => match buf.get(1) {
            None => return Poll::Pending,
            Some(b'\n') => {
                buf.advance(2);
                return Poll::Ready(Ok(None));
            }
            Some(_) => return Poll::Ready(Err(ProtoError::BadHeader)),
        },
        Some(b'\n') => return Poll::Ready(Err(ProtoError::BadHeader)),
        Some(_) => {}
    }

    // name, everything until whitespace or the colon
    let mut at = 0;
    let name_end = loop {
        if at > max_name {
            return Poll::Ready(Err(ProtoError::HeaderTooLong));
        }
        match buf.get(at) {
            None => return Poll::Pending,
            Some(b':' | b' ' | b'\t') if at == 0 => {
                return Poll::Ready(Err(ProtoError::BadHeader));
            }
            Some(b':' | b' ' | b'\t') => break at,
            Some(b'\r' | b'\n') => return Poll::Ready(Err(ProtoError::BadHeader)),
            Some(_) => at += 1,
        }
    };

    // whitespace between name and colon is tolerated, within the name limit
    loop {
        if at > name_end + max_name {
            return Poll::Ready(Err(ProtoError::HeaderTooLong));
        }
        match buf.get(at) {
            None => return Poll::Pending,
            Some(b' ' | b'\t') => at += 1,
            Some(b':') => {
                at += 1;
                break;
            }
            Some(_) => return Poll::Ready(Err(ProtoError::BadHeader)),
        }
    }

    // leading value whitespace counts against the value limit
    let value_start = at;
    loop {
        if at - value_start > max_value {
            return Poll::Ready(Err(ProtoError::HeaderTooLong));
        }
        match buf.get(at) {
            None => return Poll::Pending,
            Some(b' ' | b'\t') => at += 1,
            Some(_) => break,
        }
    }

    // value, folds flattened as accumulated
    let mut value = Vec::new();
    let consumed = loop {
        if value.len() > max_value {
            return Poll::Ready(Err(ProtoError::HeaderTooLong));
        }
        match buf.get(at) {
            None => return Poll::Pending,
            Some(b'\r') => match buf.get(at + 1) {
                None => return Poll::Pending,
                Some(b'\n') => match buf.get(at + 2) {
                    // fold or terminator is decided by the lookahead byte
                    None => return Poll::Pending,
                    Some(&ws) if ws == b' ' || ws == b'\t' => {
                        value.push(ws);
                        at += 3;
                    }
                    Some(_) => break at + 2,
                },
                Some(_) => return Poll::Ready(Err(ProtoError::BadHeader)),
            },
            Some(&b) => {
                value.push(b);
                at += 1;
            }
        }
    };

    while let Some(b' ' | b'\t') = value.last() {
        value.pop();
    }

    let name = Bytes::from(buf[..name_end].to_ascii_lowercase());
    buf.advance(consumed);
    Poll::Ready(Ok(Some((name, Bytes::from(value)))))
}
