//! Environment tags and subject references.
//!
//! A [`ContextSet`] scopes permissions, parents and options: data stored
//! under `{world=nether}` only applies while the active contexts include
//! `world=nether`. The empty set is the global scope.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{PermissionError, Result};

/// A single `key=value` environment tag.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
    key: String,
    value: String,
}

impl Context {
    pub const WORLD_KEY: &'static str = "world";
    pub const DIMENSION_KEY: &'static str = "dimension";
    pub const REMOTE_IP_KEY: &'static str = "remoteip";
    pub const LOCAL_HOST_KEY: &'static str = "localhost";
    pub const LOCAL_IP_KEY: &'static str = "localip";
    pub const LOCAL_PORT_KEY: &'static str = "localport";

    /// Creates a context; the key is lowercased.
    pub fn new(key: impl AsRef<str>, value: impl Into<String>) -> Self {
        Self {
            key: key.as_ref().to_lowercase(),
            value: value.into(),
        }
    }

    pub fn world(name: impl Into<String>) -> Self {
        Self::new(Self::WORLD_KEY, name)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for Context {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.is_empty() => {
                Ok(Self::new(key.trim(), value))
            }
            _ => Err(PermissionError::MalformedContext(s.to_string())),
        }
    }
}

/// An unordered set of contexts, usable as a map key.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ContextSet(BTreeSet<Context>);

impl ContextSet {
    /// The empty, global scope.
    pub fn global() -> Self {
        Self::default()
    }

    pub fn is_global(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, context: &Context) -> bool {
        self.0.contains(context)
    }

    /// Returns a copy of this set with `context` added.
    #[must_use]
    pub fn with(mut self, context: Context) -> Self {
        self.0.insert(context);
        self
    }

    /// True when every context of `self` is also in `other`.
    pub fn is_subset_of(&self, other: &ContextSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.0.iter()
    }
}

impl FromIterator<Context> for ContextSet {
    fn from_iter<I: IntoIterator<Item = Context>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Context> for ContextSet {
    fn from(context: Context) -> Self {
        Self::global().with(context)
    }
}

impl fmt::Display for ContextSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            return f.write_str("global");
        }
        f.write_str("{")?;
        for (i, context) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{context}")?;
        }
        f.write_str("}")
    }
}

/// A pointer to a subject: `collection:identifier`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubjectReference {
    collection: String,
    identifier: String,
}

impl SubjectReference {
    /// Creates a reference; the collection name is lowercased.
    pub fn new(collection: impl AsRef<str>, identifier: impl Into<String>) -> Result<Self> {
        let collection = collection.as_ref().trim().to_lowercase();
        let identifier = identifier.into();
        if collection.is_empty() {
            return Err(PermissionError::Empty("collection name"));
        }
        if identifier.is_empty() {
            return Err(PermissionError::Empty("subject identifier"));
        }
        Ok(Self {
            collection,
            identifier,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for SubjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection, self.identifier)
    }
}

impl FromStr for SubjectReference {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self> {
        let (collection, identifier) = s
            .split_once(':')
            .ok_or_else(|| PermissionError::MalformedReference(s.to_string()))?;
        Self::new(collection, identifier)
            .map_err(|_| PermissionError::MalformedReference(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keys_are_case_insensitive() {
        assert_eq!(Context::new("World", "nether"), Context::world("nether"));
        assert_ne!(Context::world("Nether"), Context::world("nether"));
    }

    #[test]
    fn context_parses_key_value() {
        let ctx: Context = "world=the_end".parse().unwrap();
        assert_eq!(ctx.key(), "world");
        assert_eq!(ctx.value(), "the_end");
        assert!("world".parse::<Context>().is_err());
        assert!("=nether".parse::<Context>().is_err());
        assert!("world=".parse::<Context>().is_err());
    }

    #[test]
    fn context_sets_are_unordered() {
        let a: ContextSet = [Context::world("nether"), Context::new("server", "lobby")]
            .into_iter()
            .collect();
        let b: ContextSet = [Context::new("server", "lobby"), Context::world("nether")]
            .into_iter()
            .collect();
        assert_eq!(a, b);
        assert!(ContextSet::global().is_subset_of(&a));
        assert!(ContextSet::from(Context::world("nether")).is_subset_of(&a));
        assert!(!a.is_subset_of(&ContextSet::from(Context::world("nether"))));
    }

    #[test]
    fn reference_round_trips_through_text() {
        let reference: SubjectReference = "User:alice".parse().unwrap();
        assert_eq!(reference.collection(), "user");
        assert_eq!(reference.identifier(), "alice");
        assert_eq!(reference.to_string(), "user:alice");
        assert!("alice".parse::<SubjectReference>().is_err());
        assert!("user:".parse::<SubjectReference>().is_err());
    }

    #[test]
    fn malformed_input_names_the_problem() {
        assert_eq!(
            "world".parse::<Context>(),
            Err(PermissionError::MalformedContext("world".into()))
        );
        assert_eq!(
            "alice".parse::<SubjectReference>(),
            Err(PermissionError::MalformedReference("alice".into()))
        );
        assert_eq!(
            SubjectReference::new("user", ""),
            Err(PermissionError::Empty("subject identifier"))
        );
    }
}
