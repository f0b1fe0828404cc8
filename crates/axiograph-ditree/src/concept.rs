//! Concept references and property values.
//!
//! A `ConceptId` is an opaque reference to a concept. This crate never
//! resolves ids to terminology content; the only ids it knows by name are the
//! structural meanings in [`well_known`], which shape a definition tree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque concept reference (4 bytes, copyable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ConceptId(u32);

impl ConceptId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Name of a structural meaning or property key, if this id is one.
    pub fn well_known_name(self) -> Option<&'static str> {
        well_known::name_of(self)
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.well_known_name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "concept#{}", self.0),
        }
    }
}

/// Structural meanings and property keys used by definition trees.
///
/// Ids below [`well_known::FIRST_USER_ID`] are reserved for this catalogue.
pub mod well_known {
    use super::ConceptId;

    pub const FIRST_USER_ID: u32 = 1_000;

    // Grouping meanings.
    pub const DEFINITION_ROOT: ConceptId = ConceptId::new(1);
    pub const NECESSARY_SET: ConceptId = ConceptId::new(2);
    pub const SUFFICIENT_SET: ConceptId = ConceptId::new(3);
    pub const PROPERTY_SET: ConceptId = ConceptId::new(4);
    pub const DATA_PROPERTY_SET: ConceptId = ConceptId::new(5);
    pub const INTERVAL_PROPERTY_SET: ConceptId = ConceptId::new(6);
    pub const INCLUSION_SET: ConceptId = ConceptId::new(7);

    // Connectives.
    pub const AND: ConceptId = ConceptId::new(10);
    pub const OR: ConceptId = ConceptId::new(11);
    pub const DISJOINT_WITH: ConceptId = ConceptId::new(12);

    // Axiom meanings.
    pub const ROLE_SOME: ConceptId = ConceptId::new(20);
    pub const ROLE_ALL: ConceptId = ConceptId::new(21);
    pub const CONCEPT: ConceptId = ConceptId::new(22);
    pub const FEATURE: ConceptId = ConceptId::new(23);
    pub const PROPERTY_SEQUENCE_IMPLICATION: ConceptId = ConceptId::new(24);

    // Property keys.
    pub const ROLE_TYPE: ConceptId = ConceptId::new(100);
    pub const CONCEPT_REFERENCE: ConceptId = ConceptId::new(101);
    pub const FEATURE_TYPE: ConceptId = ConceptId::new(102);
    pub const CONCRETE_DOMAIN_OPERATOR: ConceptId = ConceptId::new(103);
    pub const LITERAL_VALUE: ConceptId = ConceptId::new(104);
    pub const PROPERTY_IMPLICATION: ConceptId = ConceptId::new(105);

    const NAMES: &[(ConceptId, &str)] = &[
        (DEFINITION_ROOT, "DEFINITION_ROOT"),
        (NECESSARY_SET, "NECESSARY_SET"),
        (SUFFICIENT_SET, "SUFFICIENT_SET"),
        (PROPERTY_SET, "PROPERTY_SET"),
        (DATA_PROPERTY_SET, "DATA_PROPERTY_SET"),
        (INTERVAL_PROPERTY_SET, "INTERVAL_PROPERTY_SET"),
        (INCLUSION_SET, "INCLUSION_SET"),
        (AND, "AND"),
        (OR, "OR"),
        (DISJOINT_WITH, "DISJOINT_WITH"),
        (ROLE_SOME, "ROLE_SOME"),
        (ROLE_ALL, "ROLE_ALL"),
        (CONCEPT, "CONCEPT"),
        (FEATURE, "FEATURE"),
        (PROPERTY_SEQUENCE_IMPLICATION, "PROPERTY_SEQUENCE_IMPLICATION"),
        (ROLE_TYPE, "ROLE_TYPE"),
        (CONCEPT_REFERENCE, "CONCEPT_REFERENCE"),
        (FEATURE_TYPE, "FEATURE_TYPE"),
        (CONCRETE_DOMAIN_OPERATOR, "CONCRETE_DOMAIN_OPERATOR"),
        (LITERAL_VALUE, "LITERAL_VALUE"),
        (PROPERTY_IMPLICATION, "PROPERTY_IMPLICATION"),
    ];

    pub(super) fn name_of(id: ConceptId) -> Option<&'static str> {
        NAMES
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, name)| *name)
    }
}

/// Typed value of a vertex property.
///
/// Only `Concept` values are concept references; literals never take part in
/// hashing, equivalence or set-element keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PropertyValue {
    Concept(ConceptId),
    Text(String),
    Integer(i64),
    Boolean(bool),
}

impl PropertyValue {
    pub fn as_concept(&self) -> Option<ConceptId> {
        match self {
            PropertyValue::Concept(id) => Some(*id),
            _ => None,
        }
    }
}

impl From<ConceptId> for PropertyValue {
    fn from(value: ConceptId) -> Self {
        PropertyValue::Concept(value)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Concept(id) => write!(f, "{id}"),
            PropertyValue::Text(s) => write!(f, "{s:?}"),
            PropertyValue::Integer(v) => write!(f, "{v}"),
            PropertyValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}
