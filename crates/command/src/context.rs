//! Arguments bound during a parse.

use std::any::Any;

use crate::value::{FromValue, Value};

/// Saved length of a [`CommandContext`], restored when a branch fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextSnapshot(usize);

/// Multimap from argument key to the values bound under it.
///
/// Entries only ever get appended during a parse, so rolling back a failed
/// branch is a truncation to the length recorded before it ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandContext {
    entries: Vec<(String, Value)>,
}

impl CommandContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds another value under `key`.
    pub fn put_arg(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Every value bound under `key`, in binding order.
    pub fn all<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let key = key.to_owned();
        self.entries
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    /// The value under `key`, only if exactly one is bound.
    pub fn one(&self, key: &str) -> Option<&Value> {
        let mut values = self.all(key);
        let first = values.next()?;
        values.next().is_none().then_some(first)
    }

    /// Like [`CommandContext::one`], converted to `T`.
    pub fn one_as<T: FromValue>(&self, key: &str) -> Option<T> {
        self.one(key).and_then(T::from_value)
    }

    /// Every value under `key` that converts to `T`.
    pub fn all_as<T: FromValue>(&self, key: &str) -> Vec<T> {
        self.all(key).filter_map(T::from_value).collect()
    }

    /// Borrows the single type-erased payload under `key` as `T`.
    pub fn one_any<T: Any>(&self, key: &str) -> Option<&T> {
        self.one(key).and_then(Value::downcast_ref::<T>)
    }

    pub fn has_any(&self, key: &str) -> bool {
        self.all(key).next().is_some()
    }

    pub fn count(&self, key: &str) -> usize {
        self.all(key).count()
    }

    /// Distinct keys in first-bound order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (key, _) in &self.entries {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot(self.entries.len())
    }

    /// Drops every value bound after `snapshot` was taken.
    pub fn restore(&mut self, snapshot: ContextSnapshot) {
        self.entries.truncate(snapshot.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_requires_exactly_one_value() {
        let mut context = CommandContext::new();
        assert_eq!(context.one("player"), None);

        context.put_arg("player", "alice");
        assert_eq!(context.one_as::<String>("player").as_deref(), Some("alice"));

        context.put_arg("player", "bob");
        assert_eq!(context.one("player"), None);
        assert_eq!(context.all_as::<String>("player"), ["alice", "bob"]);
        assert_eq!(context.count("player"), 2);
    }

    #[test]
    fn lookups_outlive_the_key() {
        let mut context = CommandContext::new();
        context.put_arg("player", "alice");

        let found = {
            let key = String::from("player");
            context.one(&key)
        };
        assert_eq!(found.and_then(Value::as_str), Some("alice"));

        let values: Vec<&Value> = {
            let key = String::from("player");
            context.all(&key).collect()
        };
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn restore_drops_later_bindings() {
        let mut context = CommandContext::new();
        context.put_arg("a", 1);
        let snapshot = context.snapshot();
        context.put_arg("b", true);
        context.put_arg("a", 2);

        context.restore(snapshot);
        assert!(!context.has_any("b"));
        assert_eq!(context.one_as::<i32>("a"), Some(1));
    }

    #[test]
    fn any_payloads_downcast() {
        #[derive(Debug, PartialEq)]
        struct Gamemode(&'static str);

        let mut context = CommandContext::new();
        context.put_arg("mode", Value::any(Gamemode("creative")));
        assert_eq!(context.one_any::<Gamemode>("mode"), Some(&Gamemode("creative")));
        assert_eq!(context.one_any::<String>("mode"), None);
        assert_eq!(context.keys(), ["mode"]);
    }
}
