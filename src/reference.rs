use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The entity kinds the model can hold. Used wherever a lookup, skip or
/// violation needs to say what kind of thing it is talking about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Coworker,
    Organization,
    Person,
    Deal,
    Note,
    Document,
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Coworker => "coworker",
            EntityKind::Organization => "organization",
            EntityKind::Person => "person",
            EntityKind::Deal => "deal",
            EntityKind::Note => "note",
            EntityKind::Document => "document",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Anything addressable by the source system's primary key.
pub trait HasIntegrationId {
    fn integration_id(&self) -> &str;
}

/// Whether a registration created a new entry or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Created,
    Updated,
}

/// An insertion-ordered registry of entities keyed by integration id.
///
/// Registering an id twice silently replaces the earlier entity while
/// keeping its original position, which is what makes re-running an import
/// converge instead of duplicating. Serializes as a plain array in
/// registration order.
#[derive(Debug, Clone)]
pub struct ReferenceMap<T> {
    entries: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T: HasIntegrationId> ReferenceMap<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Adds the entity, replacing any earlier one with the same id in place.
    pub fn register(&mut self, entity: T) -> Registered {
        match self.index.get(entity.integration_id()) {
            Some(&slot) => {
                self.entries[slot] = entity;
                Registered::Updated
            }
            None => {
                self.index
                    .insert(entity.integration_id().to_string(), self.entries.len());
                self.entries.push(entity);
                Registered::Created
            }
        }
    }

    pub fn find(&self, integration_id: &str) -> Option<&T> {
        self.index
            .get(integration_id)
            .map(|&slot| &self.entries[slot])
    }

    pub fn find_mut(&mut self, integration_id: &str) -> Option<&mut T> {
        self.index
            .get(integration_id)
            .map(|&slot| &mut self.entries[slot])
    }

    pub fn contains(&self, integration_id: &str) -> bool {
        self.index.contains_key(integration_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: HasIntegrationId> Default for ReferenceMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T> IntoIterator for &'a ReferenceMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: Serialize> Serialize for ReferenceMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for ReferenceMap<T>
where
    T: Deserialize<'de> + HasIntegrationId,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<T>::deserialize(deserializer)?;
        let mut map = ReferenceMap::new();
        for entry in entries {
            map.register(entry);
        }
        Ok(map)
    }
}
