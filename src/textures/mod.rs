//! Texture metadata carried in signed profile properties.

mod signature;

pub use signature::ProfileSignatureKey;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::uuid_compact;

/// The kinds of appearance texture a profile can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Skin,
    Cape,
    Elytra,
}

impl TextureKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TextureKind::Skin => "SKIN",
            TextureKind::Cape => "CAPE",
            TextureKind::Elytra => "ELYTRA",
        }
    }

    /// Look up a kind by wire name, case-insensitively. Payloads produced
    /// by different service versions disagree on casing.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("SKIN") {
            Some(TextureKind::Skin)
        } else if name.eq_ignore_ascii_case("CAPE") {
            Some(TextureKind::Cape)
        } else if name.eq_ignore_ascii_case("ELYTRA") {
            Some(TextureKind::Elytra)
        } else {
            None
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TextureKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TextureKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TextureKind::from_name(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown texture kind '{s}'")))
    }
}

/// One texture entry: its download URL plus optional metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileTexture {
    url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<HashMap<String, String>>,
}

impl ProfileTexture {
    /// Create a texture entry.
    pub fn new(url: impl Into<String>, metadata: Option<HashMap<String, String>>) -> Self {
        Self {
            url: url.into(),
            metadata,
        }
    }

    /// Returns the texture's download URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns a metadata value, if present.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key).map(String::as_str)
    }

    /// The content hash: the URL's final path segment. Texture URLs are
    /// content-addressed, so this doubles as a cache key.
    pub fn hash(&self) -> &str {
        self.url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.url)
    }
}

/// The decoded payload of a `"textures"` property value.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TexturesPayload {
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, with = "uuid_compact::option")]
    pub profile_id: Option<Uuid>,
    #[serde(default)]
    pub profile_name: Option<String>,
    #[serde(default, rename = "isPublic")]
    pub is_public: bool,
    #[serde(default)]
    pub textures: HashMap<TextureKind, ProfileTexture>,
}
