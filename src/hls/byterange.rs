use crate::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A sub-range of a resource, as declared by `EXT-X-BYTERANGE`, the
/// `BYTERANGE` attribute of `EXT-X-MAP`/`EXT-X-PART`, or a preload hint.
///
/// Ranges stored on the manifest always carry an offset; an omitted offset is
/// only seen on freshly tokenized values, before the parser resolves it
/// against its cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ByteRange {
    pub length: u64,
    pub offset: Option<u64>,
}

impl ByteRange {
    pub fn new(length: u64, offset: Option<u64>) -> Self {
        Self { length, offset }
    }

    /// Parse from "length@offset" or "length" format.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidByteRange(s.to_string());

        if let Some((len, off)) = s.split_once('@') {
            Ok(Self {
                length: len.trim().parse().map_err(|_| invalid())?,
                offset: Some(off.trim().parse().map_err(|_| invalid())?),
            })
        } else {
            Ok(Self {
                length: s.parse().map_err(|_| invalid())?,
                offset: None,
            })
        }
    }

    /// End offset, or `None` without an offset or when it would overflow.
    pub fn end_offset(&self) -> Option<u64> {
        self.offset.and_then(|o| o.checked_add(self.length))
    }

    /// Fill an omitted offset from the end of the previous range.
    ///
    /// Fails when the resolved range ends past `u64::MAX`.
    pub fn with_continuation(&self, previous_end: u64) -> Result<Self> {
        let resolved = Self {
            length: self.length,
            offset: Some(self.offset.unwrap_or(previous_end)),
        };

        resolved
            .end_offset()
            .map(|_| resolved)
            .ok_or_else(|| Error::InvalidByteRange(resolved.to_string()))
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{}@{}", self.length, offset),
            None => write!(f, "{}", self.length),
        }
    }
}
