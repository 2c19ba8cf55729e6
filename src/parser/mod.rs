//! Incremental request head parsing.
//!
//! Parse functions take the connection's growable buffer and return
//! `Poll<Result<..>>`: `Pending` means more bytes are needed and nothing was
//! consumed. Limit checks run on every attempt, before any further read, so
//! an over-limit element fails identically for every fragmentation of the
//! stream.

pub(crate) mod header;
pub(crate) mod host;
pub(crate) mod reqline;
