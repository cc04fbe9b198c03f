//! Serde helper for the identity service's compact UUID form.
//!
//! The service writes UUIDs without hyphens on the wire. Parsing accepts
//! either form, since stored snapshots historically carry the hyphenated one.

use serde::{Deserialize, Deserializer, Serializer};
use uuid::Uuid;

use crate::error::{Error, InvalidInputError};

/// Parse a UUID from either the compact or the hyphenated text form.
pub fn parse(s: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(s).map_err(|e| {
        InvalidInputError::Uuid {
            value: s.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Format a UUID in the compact wire form.
pub fn format(id: &Uuid) -> String {
    id.simple().to_string()
}

pub fn serialize<S>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format(id))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse(&s).map_err(serde::de::Error::custom)
}

/// Variant of the helper for `Option<Uuid>` fields.
pub mod option {
    use super::*;

    pub fn serialize<S>(id: &Option<Uuid>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match id {
            Some(id) => serializer.serialize_some(&super::format(id)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s {
            Some(s) => super::parse(&s).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
