//! Tree vertices.

use crate::concept::{ConceptId, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Stable, structure-independent vertex identity.
///
/// Identity survives `DiTreeBuilder` copies, so two versions of a definition
/// that were derived from one another share ids for unchanged vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VertexId(Uuid);

impl VertexId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for VertexId {
    fn default() -> Self {
        Self::new_v4()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One vertex of a `DiTree`: identity + meaning + typed properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vertex {
    id: VertexId,
    index: usize,
    meaning: ConceptId,
    properties: BTreeMap<ConceptId, PropertyValue>,
}

impl Vertex {
    pub(crate) fn new(
        id: VertexId,
        index: usize,
        meaning: ConceptId,
        properties: BTreeMap<ConceptId, PropertyValue>,
    ) -> Self {
        Self {
            id,
            index,
            meaning,
            properties,
        }
    }

    pub(crate) fn reindexed(&self, index: usize) -> Self {
        Self {
            index,
            ..self.clone()
        }
    }

    pub(crate) fn with_id(&self, id: VertexId) -> Self {
        Self {
            id,
            ..self.clone()
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn meaning(&self) -> ConceptId {
        self.meaning
    }

    pub fn properties(&self) -> &BTreeMap<ConceptId, PropertyValue> {
        &self.properties
    }

    pub fn property(&self, key: ConceptId) -> Option<&PropertyValue> {
        self.properties.get(&key)
    }

    /// Concept ids referenced by concept-valued properties, in key order.
    pub fn concept_references(&self) -> impl Iterator<Item = ConceptId> + '_ {
        self.properties.values().filter_map(PropertyValue::as_concept)
    }

    /// Content equivalence: same meaning and same concept-valued properties.
    ///
    /// Identity, index and literal-valued properties are ignored.
    pub fn equivalent(&self, other: &Vertex) -> bool {
        if self.meaning != other.meaning {
            return false;
        }
        let mine = self
            .properties
            .iter()
            .filter_map(|(k, v)| v.as_concept().map(|c| (*k, c)));
        let theirs = other
            .properties
            .iter()
            .filter_map(|(k, v)| v.as_concept().map(|c| (*k, c)));
        mine.eq(theirs)
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.index, self.meaning)?;
        if !self.properties.is_empty() {
            let props: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, " {{{}}}", props.join(", "))?;
        }
        Ok(())
    }
}
