//! Convenience builders for logical-definition shapes.
//!
//! These helpers only fix the meaning and property keys of new vertices; they
//! do not check that the resulting tree is a sensible definition.

use crate::builder::DiTreeBuilder;
use crate::concept::well_known::*;
use crate::concept::{ConceptId, PropertyValue};
use crate::error::TreeError;

impl DiTreeBuilder {
    /// Add a `DEFINITION_ROOT` vertex; it becomes the root if none is set yet.
    pub fn definition_root(&mut self) -> usize {
        let index = self.add_vertex(DEFINITION_ROOT, []);
        if self.root().is_none() {
            // index was just allocated by this builder
            let _ = self.set_root(index);
        }
        index
    }

    pub fn necessary_set(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, NECESSARY_SET, [])
    }

    pub fn sufficient_set(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, SUFFICIENT_SET, [])
    }

    pub fn property_set(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, PROPERTY_SET, [])
    }

    pub fn data_property_set(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, DATA_PROPERTY_SET, [])
    }

    pub fn interval_property_set(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, INTERVAL_PROPERTY_SET, [])
    }

    pub fn inclusion_set(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, INCLUSION_SET, [])
    }

    pub fn and(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, AND, [])
    }

    pub fn or(&mut self, parent: usize) -> Result<usize, TreeError> {
        self.add_child(parent, OR, [])
    }

    /// Existential restriction (`∃ role_type . …`); the filler goes underneath.
    pub fn some_role(&mut self, parent: usize, role_type: ConceptId) -> Result<usize, TreeError> {
        self.add_child(parent, ROLE_SOME, [(ROLE_TYPE, PropertyValue::Concept(role_type))])
    }

    /// Universal restriction (`∀ role_type . …`).
    pub fn all_role(&mut self, parent: usize, role_type: ConceptId) -> Result<usize, TreeError> {
        self.add_child(parent, ROLE_ALL, [(ROLE_TYPE, PropertyValue::Concept(role_type))])
    }

    pub fn concept(&mut self, parent: usize, concept: ConceptId) -> Result<usize, TreeError> {
        self.add_child(
            parent,
            CONCEPT,
            [(CONCEPT_REFERENCE, PropertyValue::Concept(concept))],
        )
    }

    /// Concrete-domain feature: `feature_type operator literal`.
    pub fn feature(
        &mut self,
        parent: usize,
        feature_type: ConceptId,
        operator: ConceptId,
        literal: PropertyValue,
    ) -> Result<usize, TreeError> {
        self.add_child(
            parent,
            FEATURE,
            [
                (FEATURE_TYPE, PropertyValue::Concept(feature_type)),
                (CONCRETE_DOMAIN_OPERATOR, PropertyValue::Concept(operator)),
                (LITERAL_VALUE, literal),
            ],
        )
    }

    /// Property chain implication (`property_set` members).
    pub fn property_sequence_implication(
        &mut self,
        parent: usize,
        implication: ConceptId,
    ) -> Result<usize, TreeError> {
        self.add_child(
            parent,
            PROPERTY_SEQUENCE_IMPLICATION,
            [(PROPERTY_IMPLICATION, PropertyValue::Concept(implication))],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_root_becomes_root_once() {
        let mut b = DiTreeBuilder::new();
        let first = b.definition_root();
        let second = b.add_vertex(DEFINITION_ROOT, []);
        assert_eq!(b.root(), Some(first));
        assert_ne!(b.root(), Some(second));
    }

    #[test]
    fn feature_stores_literal_outside_references() {
        let mut b = DiTreeBuilder::new();
        let root = b.definition_root();
        let ns = b.necessary_set(root).unwrap();
        let and = b.and(ns).unwrap();
        let f = b
            .feature(
                and,
                ConceptId::new(3001),
                ConceptId::new(3002),
                PropertyValue::Integer(250),
            )
            .unwrap();
        let tree = b.build().unwrap();
        let refs: Vec<ConceptId> = tree.vertex(f).unwrap().concept_references().collect();
        assert_eq!(refs, vec![ConceptId::new(3001), ConceptId::new(3002)]);
    }
}
