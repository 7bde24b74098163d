pub mod errors;
pub mod settings;

pub use errors::{SpecFitError, SpecFitErrorCategory, StageResult};
pub use settings::{ConfidenceSettings, FitSettings, NanPolicy, ReportSettings, SolverOptions};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// String-keyed map that preserves insertion order.
///
/// Report variables, error-bar flags, and correlation entries are all keyed
/// mappings whose iteration order is part of the output contract, so a
/// hash-ordered map is not an option here.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert a value; replacing an existing key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(slot) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| *existing == key)
        {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(String, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
            type Value = OrderedMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a string-keyed map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = OrderedMap::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::OrderedMap;

    #[test]
    fn insertion_order_is_preserved_through_serialization() {
        let mut map = OrderedMap::new();
        map.insert("zeta", 1.0);
        map.insert("alpha", 2.0);
        map.insert("mid", 3.0);

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);

        let json = serde_json::to_string(&map).expect("map should serialize");
        assert_eq!(json, r#"{"zeta":1.0,"alpha":2.0,"mid":3.0}"#);
    }

    #[test]
    fn replacing_a_key_keeps_its_position() {
        let mut map = OrderedMap::new();
        map.insert("first", 1);
        map.insert("second", 2);

        let previous = map.insert("first", 10);
        assert_eq!(previous, Some(1));

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["first", "second"]);
        assert_eq!(map.get("first"), Some(&10));
    }

    #[test]
    fn deserialization_keeps_document_order() {
        let map: OrderedMap<i64> =
            serde_json::from_str(r#"{"b": 2, "a": 1, "c": 3}"#).expect("map should deserialize");
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["b", "a", "c"]);
        assert_eq!(map.len(), 3);
        assert!(map.contains_key("a"));
        assert!(!map.contains_key("d"));
    }
}
