//! Typed credential snapshots for persisting login state.
//!
//! The snapshot is an explicit struct with optional fields rather than an
//! untyped key/value map; absent fields are omitted on save and treated as
//! "not present" on load. Where the snapshot lives (disk, keyring, ...) is
//! the caller's concern.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, InvalidInputError};
use crate::profile::{GameProfile, Property, PropertyMap};
use crate::types::uuid_compact;

use super::AccountSession;

/// A persistable snapshot of an [`AccountSession`]'s credentials.
///
/// The serde field names are the historical storage keys, so snapshots
/// written by older launchers load unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, rename = "userid", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, rename = "userProperties", skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Vec<StoredProperty>>,
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, rename = "profileProperties", skip_serializing_if = "Option::is_none")]
    pub profile_properties: Option<Vec<StoredProperty>>,
    #[serde(default, rename = "accessToken", skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// One stored property record.
///
/// Fields are optional so that one malformed record can be skipped on load
/// without rejecting the whole snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProperty {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl StoredProperty {
    fn from_property(property: &Property) -> Self {
        Self {
            name: Some(property.name().to_string()),
            value: Some(property.value().to_string()),
            signature: property.signature().map(str::to_string),
        }
    }

    fn into_property(self) -> Option<Property> {
        let (name, value) = (self.name?, self.value?);
        Some(match self.signature {
            Some(signature) => Property::new_signed(name, value, signature),
            None => Property::new(name, value),
        })
    }
}

fn collect_lenient(entries: Vec<StoredProperty>, which: &str) -> PropertyMap {
    let mut map = PropertyMap::new();
    for entry in entries {
        match entry.into_property() {
            Some(property) => map.put(property),
            None => warn!(which, "skipping malformed stored property"),
        }
    }
    map
}

fn store_properties(map: &PropertyMap) -> Option<Vec<StoredProperty>> {
    if map.is_empty() {
        return None;
    }
    Some(map.iter().map(StoredProperty::from_property).collect())
}

impl AccountSession {
    /// Export the current credentials as a snapshot. Absent fields are
    /// omitted rather than written as empty values.
    pub fn save_for_storage(&self) -> StoredCredentials {
        let mut stored = StoredCredentials {
            username: self.username().map(str::to_string),
            user_id: self
                .user_id()
                .or(self.username())
                .map(str::to_string),
            user_properties: store_properties(&self.user_properties()),
            ..StoredCredentials::default()
        };

        if let Some(profile) = self.selected_profile() {
            stored.display_name = profile.name().map(str::to_string);
            stored.uuid = profile.id().map(|id| id.to_string());
            stored.profile_properties = store_properties(profile.properties());
        }

        stored.access_token = self
            .access_token()
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);

        stored
    }

    /// Import a snapshot, replacing the session's state.
    ///
    /// Always logs out first so a partial snapshot never layers on top of a
    /// live session. Malformed property entries are skipped with a warning;
    /// a snapshot without a username, or with an unparseable profile UUID,
    /// fails loudly.
    pub fn load_from_storage(&mut self, stored: &StoredCredentials) -> Result<(), Error> {
        self.log_out();

        let username = stored
            .username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| InvalidInputError::Storage {
                reason: "snapshot has no username".to_string(),
            })?
            .to_string();

        let user_properties = stored
            .user_properties
            .clone()
            .map(|entries| collect_lenient(entries, "user"))
            .unwrap_or_default();

        let selected_profile = match (&stored.display_name, &stored.uuid) {
            (Some(display_name), Some(uuid)) => {
                let id = uuid_compact::parse(uuid)?;
                let mut profile = GameProfile::new(Some(id), Some(display_name.clone()))?;
                if let Some(entries) = stored.profile_properties.clone() {
                    profile
                        .properties_mut()
                        .extend(collect_lenient(entries, "profile"));
                }
                Some(profile)
            }
            _ => None,
        };

        self.set_stored_state(
            username,
            stored.user_id.clone(),
            user_properties,
            selected_profile,
            stored.access_token.clone(),
        );

        Ok(())
    }
}
