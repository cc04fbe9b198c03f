//! Signed property records attached to accounts and profiles.

use serde::{Deserialize, Serialize};

/// A named value with an optional detached signature.
///
/// Properties carry metadata the identity service asserts about an account
/// or a profile. The best-known one is the `"textures"` property on a game
/// profile. The signature, when present, is a base64 RSA signature over the
/// raw value bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

impl Property {
    /// Create an unsigned property.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            signature: None,
        }
    }

    /// Create a signed property. The signature is base64 text as delivered
    /// by the service; it is not validated here.
    pub fn new_signed(
        name: impl Into<String>,
        value: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            signature: Some(signature.into()),
        }
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the property value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns the base64 signature, if any.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// Whether this property carries a signature at all.
    pub fn has_signature(&self) -> bool {
        self.signature.is_some()
    }
}

/// An insertion-ordered multimap of [`Property`] records.
///
/// Multiple values per name are legal (e.g. several texture entries), and
/// both the order of values within a name and the overall insertion order
/// are preserved. The serde representation is the wire's property list:
/// a JSON array of `{name, value, signature?}` objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyMap(Vec<Property>);

impl PropertyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no properties are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of property records (counting duplicates per name).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append a property, preserving insertion order.
    pub fn put(&mut self, property: Property) {
        self.0.push(property);
    }

    /// Append every property from `iter`, preserving order.
    pub fn extend(&mut self, iter: impl IntoIterator<Item = Property>) {
        self.0.extend(iter);
    }

    /// Remove all properties.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// All properties with the given name, in insertion order.
    pub fn get<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.0.iter().filter(move |p| p.name() == name)
    }

    /// The first property with the given name, if any.
    pub fn first(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name() == name)
    }

    /// All properties in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }
}

impl IntoIterator for PropertyMap {
    type Item = Property;
    type IntoIter = std::vec::IntoIter<Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Property> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
