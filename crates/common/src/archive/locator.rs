use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;

use super::ArchiveError;

/// URL-safe alphabet, padded on encode, padding optional on decode so
/// hand-trimmed tokens still resolve.
const LOCATOR_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Transport-safe token naming one entry inside an archive.
///
/// The token is the URL-safe base64 of the entry's full internal name, so it
/// can ride in a query string without further escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn encode(entry_name: &str) -> Self {
        Self(LOCATOR_ENGINE.encode(entry_name.as_bytes()))
    }

    /// Wrap a token received from a client. Validation happens in [`Locator::decode`].
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Recover the entry name this locator was built from.
    pub fn decode(&self) -> Result<String, ArchiveError> {
        let raw = LOCATOR_ENGINE
            .decode(self.0.trim())
            .map_err(|e| ArchiveError::InvalidLocator(e.to_string()))?;
        String::from_utf8(raw).map_err(|e| ArchiveError::InvalidLocator(e.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl serde::Serialize for Locator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}
