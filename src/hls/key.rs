use super::Attributes;
use crate::{Error, Result};
use serde::{Serialize, Serializer};

/// Represents an HLS encryption method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum KeyMethod {
    None,
    #[default]
    Aes128,
    SampleAes,
    SampleAesCtr,
    SampleAesCenc,
    Unknown(String),
}

impl KeyMethod {
    /// Parse from EXT-X-KEY METHOD attribute value.
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "NONE" => Self::None,
            "AES-128" => Self::Aes128,
            "SAMPLE-AES" => Self::SampleAes,
            "SAMPLE-AES-CTR" => Self::SampleAesCtr,
            "SAMPLE-AES-CENC" => Self::SampleAesCenc,
            _ => Self::Unknown(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "NONE",
            Self::Aes128 => "AES-128",
            Self::SampleAes => "SAMPLE-AES",
            Self::SampleAesCtr => "SAMPLE-AES-CTR",
            Self::SampleAesCenc => "SAMPLE-AES-CENC",
            Self::Unknown(s) => s.as_str(),
        }
    }
}

impl Serialize for KeyMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Encryption parameters from an `EXT-X-KEY` tag.
///
/// Segments share one `Key` through an `Arc`; a key is never modified once
/// the parser has made it active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Key {
    pub method: KeyMethod,
    pub uri: String,
    /// Lowercase hex, without the `0x` prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyformat: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyformatversions: Option<String>,
}

impl Key {
    /// Build a key from an attribute list. Returns `None` without a `URI`.
    ///
    /// `METHOD` defaults to AES-128. `IV` is expected to be normalized
    /// already (see [`Key::normalize_iv`]).
    pub fn from_attributes(attrs: &Attributes) -> Option<Self> {
        let uri = attrs.get("URI")?.to_string();

        Some(Self {
            method: attrs.get("METHOD").map(KeyMethod::parse).unwrap_or_default(),
            uri,
            iv: attrs.get("IV").map(str::to_string),
            keyformat: attrs.get("KEYFORMAT").map(str::to_string),
            keyformatversions: attrs.get("KEYFORMATVERSIONS").map(str::to_string),
        })
    }

    /// Normalize an IV from hex string (with or without 0x prefix).
    pub fn normalize_iv(s: &str) -> Result<String> {
        let s = s.trim();
        let s = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.is_empty() {
            return Err(Error::InvalidIv(s.to_string()));
        }
        Ok(hex::encode(bytes))
    }

    /// The declared IV as 16 bytes, when it has exactly that length.
    pub fn iv_bytes(&self) -> Option<[u8; 16]> {
        let bytes = hex::decode(self.iv.as_deref()?).ok()?;
        bytes.try_into().ok()
    }

    /// IV to use for the segment with the given media sequence number.
    ///
    /// Without a declared IV, AES-128 uses the sequence number as a
    /// big-endian 128-bit integer.
    pub fn effective_iv(&self, media_sequence: u64) -> [u8; 16] {
        self.iv_bytes().unwrap_or_else(|| {
            let mut iv = [0u8; 16];
            iv[8..16].copy_from_slice(&media_sequence.to_be_bytes());
            iv
        })
    }
}
