//! Grant records and attribute sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Action, Attribute, Resource, Role};

/// Deduplicated set of attributes a grant (or a resolved query) applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeSet<Attribute>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The set containing only `"*"`.
    pub fn wildcard() -> Self {
        Self(BTreeSet::from([Attribute::WILDCARD]))
    }

    pub fn insert(&mut self, attribute: Attribute) -> bool {
        self.0.insert(attribute)
    }

    pub fn extend_from(&mut self, other: &AttributeSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn contains(&self, attribute: &Attribute) -> bool {
        self.0.contains(attribute)
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.iter().any(Attribute::is_wildcard)
    }

    /// Literal membership, or any attribute if the set holds the wildcard.
    pub fn covers(&self, attribute: &Attribute) -> bool {
        self.is_wildcard() || self.contains(attribute)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    pub fn is_superset(&self, other: &AttributeSet) -> bool {
        self.0.is_superset(&other.0)
    }
}

impl FromIterator<Attribute> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AttributeSet {
    type Item = &'a Attribute;
    type IntoIter = std::collections::btree_set::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A single (role, resource, action, attribute-set) permission record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub role: Role,
    pub resource: Resource,
    pub action: Action,
    pub attributes: AttributeSet,
}

impl Grant {
    pub fn new(
        role: Role,
        resource: Resource,
        action: Action,
        attributes: impl IntoIterator<Item = Attribute>,
    ) -> Self {
        Self {
            role,
            resource,
            action,
            attributes: attributes.into_iter().collect(),
        }
    }
}
