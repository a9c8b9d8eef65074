use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;

/// Map keyed by role that keeps insertion (roster) order, including when
/// serialized as a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> RoleMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts or replaces. A replaced entry keeps its original position.
    pub fn insert(&mut self, role: impl Into<String>, value: V) -> Option<V> {
        let role = role.into();
        match self.entries.iter_mut().find(|(r, _)| *r == role) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((role, value));
                None
            }
        }
    }

    pub fn get(&self, role: &str) -> Option<&V> {
        self.entries.iter().find(|(r, _)| r == role).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, role: &str) -> Option<&mut V> {
        self.entries
            .iter_mut()
            .find(|(r, _)| r == role)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, role: &str) -> Option<V> {
        let index = self.entries.iter().position(|(r, _)| r == role)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.get(role).is_some()
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(r, _)| r.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(r, v)| (r.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut V)> {
        self.entries.iter_mut().map(|(r, v)| (r.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for RoleMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> FromIterator<(String, V)> for RoleMap<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        let mut map = RoleMap::new();
        for (role, value) in iter {
            map.insert(role, value);
        }
        map
    }
}

impl<V> IntoIterator for RoleMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V: Serialize> Serialize for RoleMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (role, value) in &self.entries {
            map.serialize_entry(role, value)?;
        }
        map.end()
    }
}

struct RoleMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for RoleMapVisitor<V> {
    type Value = RoleMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map keyed by role")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = RoleMap::new();
        while let Some((role, value)) = access.next_entry::<String, V>()? {
            map.insert(role, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for RoleMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RoleMapVisitor(PhantomData))
    }
}
