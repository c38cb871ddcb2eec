//! Header field storage and incremental header-block parsing.
//!
//! # Responsibilities
//! - Store fields under their lower-cased name, in first-seen order
//! - Merge repeated fields into one value joined by `", "`
//! - Parse complete header lines out of a partially received buffer
//!
//! # Design Decisions
//! - Backed by an insertion-ordered map so serialization is deterministic
//! - Values are trimmed but never interpreted here (`Content-Length` is the
//!   request parser's job)
//! - Any malformed line aborts the whole header block

use indexmap::IndexMap;
use thiserror::Error;

use crate::http::{find_crlf, CRLF};

/// Errors raised while parsing or mutating a header store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The line has no colon, or whitespace sits between name and colon.
    #[error("malformed header field line")]
    MalformedLine,

    /// The field name is empty or contains non-token characters.
    #[error("malformed header field name {0:?}")]
    InvalidName(String),

    /// The field value would break the line framing.
    #[error("header field value for {0:?} contains a line break or is not valid UTF-8")]
    InvalidValue(String),
}

/// Ordered, case-insensitive collection of header fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    fields: IndexMap<String, String>,
}

impl Headers {
    /// Create an empty header store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(&name.to_ascii_lowercase())
    }

    /// Add a field. If the name already exists the value is appended to the
    /// existing one, separated by `", "`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let key = normalize_name(name)?;
        check_value(&key, value)?;
        self.merge(key, value);
        Ok(())
    }

    /// Overwrite a field, discarding any previous value.
    pub fn replace(&mut self, name: &str, value: &str) -> Result<(), HeaderError> {
        let key = normalize_name(name)?;
        check_value(&key, value)?;
        self.fields.insert(key, value.to_string());
        Ok(())
    }

    /// Remove a field, returning its value. Order of the remaining fields is kept.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.shift_remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(name, value)` pairs in insertion order. Names are lower-case.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Parse as many complete header lines as `data` holds.
    ///
    /// Returns the number of bytes consumed and whether the blank line ending
    /// the header block was reached. `Ok((0, false))` means no complete line
    /// is available yet and the caller must supply more bytes.
    pub fn parse(&mut self, data: &[u8]) -> Result<(usize, bool), HeaderError> {
        let mut read = 0;

        loop {
            let Some(end) = find_crlf(&data[read..]) else {
                return Ok((read, false));
            };
            if end == 0 {
                return Ok((read + CRLF.len(), true));
            }

            let (name, value) = parse_field_line(&data[read..read + end])?;
            self.merge(name, &value);
            read += end + CRLF.len();
        }
    }

    /// Insert or append without validation; `key` must already be a
    /// lower-case token and `value` free of line breaks.
    pub(crate) fn merge(&mut self, key: String, value: &str) {
        match self.fields.get_mut(&key) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                self.fields.insert(key, value.to_string());
            }
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a String, &'a String);
    type IntoIter = indexmap::map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// RFC 9110 `tchar`.
pub(crate) fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#'
                | b'$'
                | b'%'
                | b'&'
                | b'\''
                | b'*'
                | b'+'
                | b'-'
                | b'.'
                | b'^'
                | b'_'
                | b'`'
                | b'|'
                | b'~'
        )
}

/// Wire casing for a field name: `content-type` becomes `Content-Type`.
pub fn canonical_name(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            canonical.push(c.to_ascii_uppercase());
        } else {
            canonical.push(c.to_ascii_lowercase());
        }
        upper = c == '-';
    }
    canonical
}

fn parse_field_line(line: &[u8]) -> Result<(String, String), HeaderError> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or(HeaderError::MalformedLine)?;
    if colon > 0 && matches!(line[colon - 1], b' ' | b'\t') {
        return Err(HeaderError::MalformedLine);
    }

    let name = line[..colon].trim_ascii();
    if name.is_empty() || !name.iter().copied().all(is_token_byte) {
        return Err(HeaderError::InvalidName(
            String::from_utf8_lossy(name).into_owned(),
        ));
    }
    let name: String = name
        .iter()
        .map(|b| char::from(b.to_ascii_lowercase()))
        .collect();
    let value = match std::str::from_utf8(line[colon + 1..].trim_ascii()) {
        Ok(value) => value.to_owned(),
        Err(_) => return Err(HeaderError::InvalidValue(name)),
    };

    Ok((name, value))
}

fn normalize_name(name: &str) -> Result<String, HeaderError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(is_token_byte) {
        return Err(HeaderError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

fn check_value(key: &str, value: &str) -> Result<(), HeaderError> {
    if value.bytes().any(|b| b == b'\r' || b == b'\n') {
        return Err(HeaderError::InvalidValue(key.to_string()));
    }
    Ok(())
}
