//! Encoding of one working-memory sample into index lists.

use super::quadruple::{Quadruple, AGENT, CURRENT_TIME};
use super::vocab::Vocabulary;
use crate::error::Result;

/// A qualifier reified as (qualifier relation, qualifier entity, edge position).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualifierTriple {
    pub relation: u32,
    pub entity: u32,
    pub edge: u32,
}

/// Index lists of a single sample, positions local to the sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleEncoding {
    /// (head, tail) per quadruple
    pub edges: Vec<(u32, u32)>,
    pub edge_types: Vec<u32>,
    pub quals: Vec<QualifierTriple>,
    /// (tail, head) per quadruple
    pub edges_inv: Vec<(u32, u32)>,
    pub edge_types_inv: Vec<u32>,
    /// Same edge positions as `quals`; they index the forward list.
    pub quals_inv: Vec<QualifierTriple>,
    /// Positions of quadruples carrying `current_time`
    pub short_memory_idx: Vec<u32>,
    pub agent_entity: Option<u32>,
}

impl SampleEncoding {
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }
}

/// Encode one sample. Any unknown entity or relation aborts the encoding.
pub fn encode_sample(vocab: &Vocabulary, sample: &[Quadruple]) -> Result<SampleEncoding> {
    let mut enc = SampleEncoding {
        edges: Vec::with_capacity(sample.len()),
        edge_types: Vec::with_capacity(sample.len()),
        edges_inv: Vec::with_capacity(sample.len()),
        edge_types_inv: Vec::with_capacity(sample.len()),
        ..Default::default()
    };

    for (i, quadruple) in sample.iter().enumerate() {
        let position = i as u32;
        let head = vocab.entity_id(&quadruple.head)?;
        let tail = vocab.entity_id(&quadruple.tail)?;

        if quadruple.head == AGENT {
            enc.agent_entity = Some(head);
        }
        if quadruple.tail == AGENT {
            enc.agent_entity = Some(tail);
        }

        enc.edges.push((head, tail));
        enc.edge_types.push(vocab.relation_id(&quadruple.relation)?);
        enc.edges_inv.push((tail, head));
        enc.edge_types_inv.push(vocab.inverse_relation_id(&quadruple.relation)?);

        for (key, value) in &quadruple.qualifiers {
            let triple = QualifierTriple {
                relation: vocab.relation_id(key)?,
                entity: vocab.entity_id(&value.entity_name(key)?)?,
                edge: position,
            };
            enc.quals.push(triple);
            enc.quals_inv.push(triple);

            if key == CURRENT_TIME {
                enc.short_memory_idx.push(position);
            }
        }
    }

    Ok(enc)
}
