//! Entity and relation symbol tables.
//!
//! Populated once from the memory store's enumeration and immutable afterwards.
//! Relation ids are laid out as the forward block `0..R` followed by the
//! inverse block `R..2R`, so `id(r_inv) = id(r) + R`.

use rustc_hash::FxHashMap;

use crate::error::{QuadnetError, Result};

/// Suffix of the synthetic inverse relation names.
pub const INVERSE_SUFFIX: &str = "_inv";

/// Dense string <-> id table.
#[derive(Debug, Clone, Default)]
struct SymbolTable {
    ids: FxHashMap<String, u32>,
    names: Vec<String>,
}

impl SymbolTable {
    fn insert(&mut self, name: String) -> Result<u32> {
        if self.ids.contains_key(&name) {
            return Err(QuadnetError::DuplicateSymbol(name));
        }
        let id = self.names.len() as u32;
        self.ids.insert(name.clone(), id);
        self.names.push(name);
        Ok(id)
    }

    fn get(&self, name: &str) -> Option<u32> {
        self.ids.get(name).copied()
    }

    fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(|s| s.as_str())
    }

    fn len(&self) -> usize {
        self.names.len()
    }
}

/// Fixed vocabulary of a model: entities plus base and inverse relations.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    entities: SymbolTable,
    relations: SymbolTable,
    num_base_relations: usize,
}

impl Vocabulary {
    /// Build the vocabulary. Every base relation gets an `<name>_inv` partner.
    pub fn new<E, R>(entities: E, relations: R) -> Result<Self>
    where
        E: IntoIterator,
        E::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let mut entity_table = SymbolTable::default();
        for name in entities {
            entity_table.insert(name.into())?;
        }

        let mut relation_table = SymbolTable::default();
        for name in relations {
            relation_table.insert(name.into())?;
        }
        let num_base_relations = relation_table.len();
        for id in 0..num_base_relations as u32 {
            let inverse = format!("{}{}", relation_table.names[id as usize], INVERSE_SUFFIX);
            relation_table.insert(inverse)?;
        }

        Ok(Self {
            entities: entity_table,
            relations: relation_table,
            num_base_relations,
        })
    }

    /// Id of an entity.
    pub fn entity_id(&self, name: &str) -> Result<u32> {
        self.entities
            .get(name)
            .ok_or_else(|| QuadnetError::UnknownEntity(name.to_string()))
    }

    /// Id of a relation (base or `_inv`).
    pub fn relation_id(&self, name: &str) -> Result<u32> {
        self.relations
            .get(name)
            .ok_or_else(|| QuadnetError::UnknownRelation(name.to_string()))
    }

    /// Id of the inverse of a base relation given by name.
    pub fn inverse_relation_id(&self, name: &str) -> Result<u32> {
        let id = self.relation_id(name)?;
        if (id as usize) >= self.num_base_relations {
            // `r_inv_inv` does not exist
            return Err(QuadnetError::UnknownRelation(format!("{}{}", name, INVERSE_SUFFIX)));
        }
        Ok(id + self.num_base_relations as u32)
    }

    pub fn entity_name(&self, id: u32) -> Option<&str> {
        self.entities.name(id)
    }

    pub fn relation_name(&self, id: u32) -> Option<&str> {
        self.relations.name(id)
    }

    pub fn num_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of relations supplied at construction.
    pub fn num_base_relations(&self) -> usize {
        self.num_base_relations
    }

    /// Rows of the relation table (forward and inverse).
    pub fn num_relations(&self) -> usize {
        self.relations.len()
    }
}
