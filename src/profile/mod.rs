//! Game profiles: player identities asserted by the identity service.

mod properties;

pub use properties::{Property, PropertyMap};

use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

use crate::error::Error;

/// The kind of account backing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    /// A pre-migration account, identified by username only.
    Legacy,
    /// A migrated account with a proper user id.
    Mojang,
}

impl UserType {
    /// The wire name of this user type.
    pub fn name(&self) -> &'static str {
        match self {
            UserType::Legacy => "legacy",
            UserType::Mojang => "mojang",
        }
    }

    /// Look up a user type by its wire name, case-insensitively.
    pub fn by_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("legacy") {
            Some(UserType::Legacy)
        } else if name.eq_ignore_ascii_case("mojang") {
            Some(UserType::Mojang)
        } else {
            None
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A player identity: a profile id, a display name, and a property bag.
///
/// At least one of id and name must be present at construction. Two profiles
/// are equal iff their id and name are equal; the property bag is excluded
/// from equality, so an enriched profile still compares equal to the bare
/// identity it was enriched from.
#[derive(Debug, Clone)]
pub struct GameProfile {
    id: Option<Uuid>,
    name: Option<String>,
    legacy: bool,
    properties: PropertyMap,
}

impl GameProfile {
    /// Create a profile from an optional id and an optional name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the id is absent and the name
    /// is absent or blank.
    pub fn new(id: Option<Uuid>, name: Option<String>) -> Result<Self, Error> {
        let name_blank = name.as_deref().is_none_or(|n| n.trim().is_empty());
        if id.is_none() && name_blank {
            return Err(Error::InvalidArgument(
                "name and id cannot both be blank".to_string(),
            ));
        }

        Ok(Self {
            id,
            name,
            legacy: false,
            properties: PropertyMap::new(),
        })
    }

    /// Convenience constructor for a complete profile.
    pub fn complete(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: Some(name.into()),
            legacy: false,
            properties: PropertyMap::new(),
        }
    }

    pub(crate) fn set_legacy(&mut self, legacy: bool) {
        self.legacy = legacy;
    }

    /// Returns the profile id, if known.
    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Returns the display name, if known.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this profile belongs to a pre-migration account.
    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    /// Whether both id and a non-blank name are present.
    pub fn is_complete(&self) -> bool {
        self.id.is_some() && self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Returns the property bag.
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Returns the property bag for in-place modification.
    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }
}

impl PartialEq for GameProfile {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Eq for GameProfile {}

impl Hash for GameProfile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Display for GameProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.id, &self.name) {
            (Some(id), Some(name)) => write!(f, "{name} ({id})"),
            (Some(id), None) => write!(f, "({id})"),
            (None, Some(name)) => f.write_str(name),
            (None, None) => f.write_str("(unknown)"),
        }
    }
}
