use std::fmt;

/// HTTP Version.
///
/// Only the two wire versions this engine accepts are representable.
#[derive(Copy, Clone, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct Version(Inner);

impl Version {
    /// `HTTP/1.0`
    pub const HTTP_10: Version = Version(Inner::Http10);

    /// `HTTP/1.1`
    pub const HTTP_11: Version = Version(Inner::Http11);

    /// Returns the version as it appears on the wire, e.g: `"HTTP/1.1"`.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Inner::Http10 => "HTTP/1.0",
            Inner::Http11 => "HTTP/1.1",
        }
    }
}

#[derive(PartialEq, PartialOrd, Copy, Clone, Eq, Ord, Hash)]
enum Inner {
    Http10,
    Http11,
}

impl Default for Version {
    #[inline]
    fn default() -> Version {
        Version::HTTP_11
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
