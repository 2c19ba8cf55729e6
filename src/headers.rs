use bytes::Bytes;
use std::fmt;
use std::slice;

/// Ordered collection of request header fields.
///
/// Names are stored lower-cased by the parser; values keep their bytes with
/// trailing whitespace already stripped. Lookup is first-match, preserving
/// arrival order for repeated names.
#[derive(Clone, Default)]
pub struct Headers {
    entries: Vec<(Bytes, Bytes)>,
}

impl Headers {
    /// Create a new empty [`Headers`].
    #[inline]
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Returns the number of header fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no header fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a field.
    ///
    /// `name` must already be lower-cased.
    #[inline]
    pub fn append(&mut self, name: Bytes, value: Bytes) {
        debug_assert!(!name.iter().any(u8::is_ascii_uppercase));
        self.entries.push((name, value));
    }

    /// Returns the value of the first field named `name`.
    ///
    /// `name` is matched byte-exact against the stored lower-cased names.
    pub fn get(&self, name: &[u8]) -> Option<&Bytes> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Returns `true` if a field named `name` exists.
    #[inline]
    pub fn contains(&self, name: &[u8]) -> bool {
        self.get(name).is_some()
    }

    /// Iterate over `(name, value)` pairs in arrival order.
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, (Bytes, Bytes)> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a (Bytes, Bytes);
    type IntoIter = slice::Iter<'a, (Bytes, Bytes)>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.entries {
            map.entry(
                &String::from_utf8_lossy(name),
                &String::from_utf8_lossy(value),
            );
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Headers;
    use bytes::Bytes;

    #[test]
    fn test_first_match_lookup() {
        let mut headers = Headers::new();
        headers.append(Bytes::from_static(b"accept"), Bytes::from_static(b"text/*"));
        headers.append(Bytes::from_static(b"host"), Bytes::from_static(b"a"));
        headers.append(Bytes::from_static(b"host"), Bytes::from_static(b"b"));

        assert_eq!(headers.len(), 3);
        assert_eq!(headers.get(b"host").unwrap().as_ref(), b"a");
        assert!(headers.contains(b"accept"));
        assert!(!headers.contains(b"connection"));
    }
}
