//! Generic named-entry collection: validate, normalize, store.

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::{Mapping, Value};

use crate::config::ConfigValidator;
use crate::error::{Error, Result};

/// Per-collection entry processing.
pub trait EntryProcessor {
    /// Normalized form stored in the collection.
    type Entry: Clone + fmt::Debug;

    /// Config section this collection is built from.
    const SECTION: &'static str;

    /// Human-readable collection name for logs.
    const LABEL: &'static str;

    /// Validates and normalizes one raw entry.
    fn process_config(&self, raw: &Value, validator: &ConfigValidator) -> Result<Self::Entry>;
}

/// Treats a bare entry as a one-element list. Sequences are returned item by item.
pub fn as_entry_list(raw: &Value) -> Vec<&Value> {
    match raw {
        Value::Sequence(items) => items.iter().collect(),
        single => vec![single],
    }
}

/// Container of processed entries keyed by name.
#[derive(Debug, Clone)]
pub struct Collection<P: EntryProcessor> {
    processor: P,
    entries: BTreeMap<String, P::Entry>,
}

impl<P: EntryProcessor> Collection<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            entries: BTreeMap::new(),
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Processes every entry of a config section and stores it by name.
    ///
    /// Stops at the first failing entry and returns its error wrapped with the
    /// entry name. Entries processed before the failure stay stored. A name
    /// that is already present is replaced.
    pub fn create_entries(&mut self, section: &Mapping, validator: &ConfigValidator) -> Result<usize> {
        let mut created = 0;
        for (key, raw) in section {
            let name = key.as_str().ok_or_else(|| {
                Error::ConfigValidation(
                    P::SECTION.to_string(),
                    format!("Entry names must be strings, got {:?}", key),
                )
            })?;

            let entry = self
                .processor
                .process_config(raw, validator)
                .map_err(|e| Error::CollectionEntry {
                    collection: P::SECTION,
                    entry: name.to_string(),
                    source: Box::new(e),
                })?;

            self.insert(name, entry);
            created += 1;
        }

        tracing::debug!("{}: processed {} entries", P::LABEL, created);
        Ok(created)
    }

    /// Stores an entry, returning the one it replaced.
    pub fn insert(&mut self, name: &str, entry: P::Entry) -> Option<P::Entry> {
        let previous = self.entries.insert(name.to_string(), entry);
        if previous.is_some() {
            tracing::debug!("{}: entry '{}' replaced an earlier definition", P::LABEL, name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<&P::Entry> {
        self.entries.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut P::Entry> {
        self.entries.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &P::Entry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut P::Entry)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts integers, rejects everything else.
    struct Numbers;

    impl EntryProcessor for Numbers {
        type Entry = i64;
        const SECTION: &'static str = "numbers";
        const LABEL: &'static str = "Numbers";

        fn process_config(&self, raw: &Value, _validator: &ConfigValidator) -> Result<i64> {
            raw.as_i64()
                .ok_or_else(|| Error::ConfigValidation("numbers".to_string(), "not a number".to_string()))
        }
    }

    fn section(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_as_entry_list() {
        let single: Value = serde_yaml::from_str("{a: 1}").unwrap();
        assert_eq!(as_entry_list(&single).len(), 1);

        let list: Value = serde_yaml::from_str("[{a: 1}, {a: 2}, fade]").unwrap();
        assert_eq!(as_entry_list(&list).len(), 3);
    }

    #[test]
    fn test_create_entries_stores_by_name() {
        let validator = ConfigValidator::new();
        let mut numbers = Collection::new(Numbers);
        let created = numbers
            .create_entries(&section("one: 1\ntwo: 2\n"), &validator)
            .unwrap();

        assert_eq!(created, 2);
        assert_eq!(numbers.get("two"), Some(&2));
        assert_eq!(numbers.names(), vec!["one", "two"]);
    }

    #[test]
    fn test_failure_wraps_name_and_keeps_earlier_entries() {
        let validator = ConfigValidator::new();
        let mut numbers = Collection::new(Numbers);
        let err = numbers
            .create_entries(&section("a: 1\nb: nope\nc: 3\n"), &validator)
            .unwrap_err();

        match err {
            Error::CollectionEntry { collection, entry, .. } => {
                assert_eq!(collection, "numbers");
                assert_eq!(entry, "b");
            }
            other => panic!("unexpected error: {other}"),
        }
        // Stored before the failure; entries after it were never reached.
        assert!(numbers.contains("a"));
        assert!(!numbers.contains("c"));
    }

    #[test]
    fn test_duplicate_name_silently_replaces() {
        let validator = ConfigValidator::new();
        let mut numbers = Collection::new(Numbers);
        numbers.create_entries(&section("a: 1\n"), &validator).unwrap();
        numbers.create_entries(&section("a: 5\n"), &validator).unwrap();

        assert_eq!(numbers.len(), 1);
        assert_eq!(numbers.get("a"), Some(&5));
    }

    #[test]
    fn test_non_string_key_rejected() {
        let validator = ConfigValidator::new();
        let mut numbers = Collection::new(Numbers);
        let result = numbers.create_entries(&section("7: 1\n"), &validator);
        assert!(matches!(result, Err(Error::ConfigValidation(_, _))));
    }
}
