use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authorize::AuthzError;

/// A protected noun of the portal (e.g. "announcements").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Cow<'static, str>);

impl Resource {
    pub const APPLICATIONS: Resource = Resource::from_static("applications");
    pub const ANNOUNCEMENTS: Resource = Resource::from_static("announcements");
    pub const EVENTS: Resource = Resource::from_static("events");
    pub const USERS: Resource = Resource::from_static("users");
    pub const TEAMS: Resource = Resource::from_static("teams");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Resource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named sub-field or tag of a resource that a grant may be scoped to.
///
/// The special attribute `"*"` stands for every field of the resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attribute(Cow<'static, str>);

impl Attribute {
    pub const WILDCARD: Attribute = Attribute::from_static("*");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Attribute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Create,
    Read,
    Update,
    Delete,
}

/// Whether an action targets any record or only the caller's own records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Possession {
    Any,
    Own,
}

/// A verb qualified by possession, written `"<verb>:<possession>"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Action {
    pub verb: Verb,
    pub possession: Possession,
}

impl Action {
    pub const CREATE_ANY: Action = Action::new(Verb::Create, Possession::Any);
    pub const CREATE_OWN: Action = Action::new(Verb::Create, Possession::Own);
    pub const READ_ANY: Action = Action::new(Verb::Read, Possession::Any);
    pub const READ_OWN: Action = Action::new(Verb::Read, Possession::Own);
    pub const UPDATE_ANY: Action = Action::new(Verb::Update, Possession::Any);
    pub const UPDATE_OWN: Action = Action::new(Verb::Update, Possession::Own);
    pub const DELETE_ANY: Action = Action::new(Verb::Delete, Possession::Any);
    pub const DELETE_OWN: Action = Action::new(Verb::Delete, Possession::Own);

    pub const fn new(verb: Verb, possession: Possession) -> Self {
        Self { verb, possession }
    }

    /// Every action, in declaration order.
    pub fn all() -> [Action; 8] {
        [
            Self::CREATE_ANY,
            Self::CREATE_OWN,
            Self::READ_ANY,
            Self::READ_OWN,
            Self::UPDATE_ANY,
            Self::UPDATE_OWN,
            Self::DELETE_ANY,
            Self::DELETE_OWN,
        ]
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let verb = match self.verb {
            Verb::Create => "create",
            Verb::Read => "read",
            Verb::Update => "update",
            Verb::Delete => "delete",
        };
        let possession = match self.possession {
            Possession::Any => "any",
            Possession::Own => "own",
        };
        write!(f, "{verb}:{possession}")
    }
}

impl FromStr for Action {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (verb, possession) = s
            .split_once(':')
            .ok_or_else(|| AuthzError::InvalidAction(s.to_string()))?;

        let verb = match verb {
            "create" => Verb::Create,
            "read" => Verb::Read,
            "update" => Verb::Update,
            "delete" => Verb::Delete,
            _ => return Err(AuthzError::InvalidAction(s.to_string())),
        };
        let possession = match possession {
            "any" => Possession::Any,
            "own" => Possession::Own,
            _ => return Err(AuthzError::InvalidAction(s.to_string())),
        };

        Ok(Self::new(verb, possession))
    }
}

impl Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_display_and_parse_agree() {
        for action in Action::all() {
            assert_eq!(action.to_string().parse::<Action>().unwrap(), action);
        }
        assert_eq!(Action::UPDATE_OWN.to_string(), "update:own");
    }

    #[test]
    fn malformed_actions_are_rejected() {
        assert!("read".parse::<Action>().is_err());
        assert!("read:some".parse::<Action>().is_err());
        assert!("list:any".parse::<Action>().is_err());
    }

    #[test]
    fn action_serializes_as_string() {
        let json = serde_json::to_string(&Action::READ_ANY).unwrap();
        assert_eq!(json, "\"read:any\"");
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Action::READ_ANY);
    }
}
