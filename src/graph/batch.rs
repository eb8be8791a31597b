//! Merging per-sample encodings into one global graph.
//!
//! Edges are laid out as `[forward block | inverse block]` and qualifier
//! triples as `[forward quals | inverse quals]`. Edge positions in qualifier
//! triples and short-term indices are shifted by a running offset so that each
//! sample only ever references its own slice of a block.

use candle_core::{Device, Tensor};
use tracing::debug;

use super::quadruple::Quadruple;
use super::sample::{encode_sample, QualifierTriple, SampleEncoding};
use super::vocab::Vocabulary;
use crate::error::{QuadnetError, Result};

/// Running edge counts threaded through the fold over samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EdgeOffsets {
    forward: u32,
    inverse: u32,
}

impl EdgeOffsets {
    fn advance(self, sample: &SampleEncoding) -> Self {
        Self {
            forward: self.forward + sample.edges.len() as u32,
            inverse: self.inverse + sample.edges_inv.len() as u32,
        }
    }
}

/// Host-side index lists of a whole batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedBatch {
    /// Source column of the merged edge index (forward block then inverse block)
    pub edge_src: Vec<u32>,
    /// Target column of the merged edge index
    pub edge_dst: Vec<u32>,
    pub edge_types: Vec<u32>,
    /// Forward qualifier triples followed by inverse ones
    pub quals: Vec<QualifierTriple>,
    /// Global forward-edge positions of short-term memories
    pub short_memory_idx: Vec<u32>,
    /// Agent entity per sample
    pub agent_entity_idx: Vec<Option<u32>>,
    /// Short-term memories per sample
    pub num_short_memories: Vec<usize>,
    num_forward_edges: usize,
    num_forward_quals: usize,
}

impl EncodedBatch {
    /// Encode a batch of samples in order.
    pub fn encode<S: AsRef<[Quadruple]>>(vocab: &Vocabulary, samples: &[S]) -> Result<Self> {
        let mut edges = Vec::new();
        let mut edges_inv = Vec::new();
        let mut edge_types = Vec::new();
        let mut edge_types_inv = Vec::new();
        let mut quals = Vec::new();
        let mut quals_inv = Vec::new();
        let mut short_memory_idx = Vec::new();
        let mut agent_entity_idx = Vec::with_capacity(samples.len());
        let mut num_short_memories = Vec::with_capacity(samples.len());

        let mut offsets = EdgeOffsets::default();
        for sample in samples {
            let enc = encode_sample(vocab, sample.as_ref())?;

            quals.extend(enc.quals.iter().map(|q| QualifierTriple {
                edge: q.edge + offsets.forward,
                ..*q
            }));
            quals_inv.extend(enc.quals_inv.iter().map(|q| QualifierTriple {
                edge: q.edge + offsets.inverse,
                ..*q
            }));
            short_memory_idx.extend(enc.short_memory_idx.iter().map(|i| i + offsets.forward));
            num_short_memories.push(enc.short_memory_idx.len());
            agent_entity_idx.push(enc.agent_entity);

            offsets = offsets.advance(&enc);

            edges.extend_from_slice(&enc.edges);
            edges_inv.extend_from_slice(&enc.edges_inv);
            edge_types.extend_from_slice(&enc.edge_types);
            edge_types_inv.extend_from_slice(&enc.edge_types_inv);
        }

        let num_forward_edges = edges.len();
        let num_forward_quals = quals.len();

        let (edge_src, edge_dst): (Vec<u32>, Vec<u32>) = edges.into_iter().chain(edges_inv).unzip();
        edge_types.extend(edge_types_inv);
        quals.extend(quals_inv);

        debug!(
            samples = samples.len(),
            edges = edge_src.len(),
            quals = quals.len(),
            short_memories = short_memory_idx.len(),
            "encoded batch"
        );

        Ok(Self {
            edge_src,
            edge_dst,
            edge_types,
            quals,
            short_memory_idx,
            agent_entity_idx,
            num_short_memories,
            num_forward_edges,
            num_forward_quals,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.agent_entity_idx.len()
    }

    /// Edges in the forward block (equal to the inverse block).
    pub fn num_forward_edges(&self) -> usize {
        self.num_forward_edges
    }

    pub fn num_edges(&self) -> usize {
        self.edge_src.len()
    }

    /// Check that per-sample short-term counts add up to the flat index length.
    pub fn check_short_memory_counts(&self) -> Result<()> {
        let expected: usize = self.num_short_memories.iter().sum();
        let got = self.short_memory_idx.len();
        if expected != got {
            return Err(QuadnetError::Consistency { expected, got });
        }
        Ok(())
    }

    /// Row range of each sample in the flattened short-term output.
    pub fn short_memory_segments(&self) -> Vec<(usize, usize)> {
        self.num_short_memories
            .iter()
            .scan(0usize, |start, &count| {
                let segment = (*start, count);
                *start += count;
                Some(segment)
            })
            .collect()
    }

    /// Forward block: edges `0..E` and the first half of the qualifiers.
    pub fn forward_block(&self) -> EdgeBlock<'_> {
        EdgeBlock {
            src: &self.edge_src[..self.num_forward_edges],
            dst: &self.edge_dst[..self.num_forward_edges],
            types: &self.edge_types[..self.num_forward_edges],
            quals: &self.quals[..self.num_forward_quals],
        }
    }

    /// Inverse block: edges `E..2E` and the second half of the qualifiers.
    ///
    /// Qualifier edge positions carry forward offsets, which coincide with the
    /// positions inside this block.
    pub fn inverse_block(&self) -> EdgeBlock<'_> {
        EdgeBlock {
            src: &self.edge_src[self.num_forward_edges..],
            dst: &self.edge_dst[self.num_forward_edges..],
            types: &self.edge_types[self.num_forward_edges..],
            quals: &self.quals[self.num_forward_quals..],
        }
    }
}

/// One direction of the merged graph, positions local to the block.
#[derive(Debug, Clone, Copy)]
pub struct EdgeBlock<'a> {
    pub src: &'a [u32],
    pub dst: &'a [u32],
    pub types: &'a [u32],
    pub quals: &'a [QualifierTriple],
}

impl<'a> EdgeBlock<'a> {
    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Symmetric normalisation `deg(src)^-1/2 * deg(dst)^-1/2` per edge, where
    /// a node's degree counts its incidences (either endpoint) in this block.
    pub fn degree_norm(&self, num_nodes: usize) -> Vec<f32> {
        let mut degree = vec![0f32; num_nodes];
        for (&s, &d) in self.src.iter().zip(self.dst) {
            degree[s as usize] += 1.0;
            degree[d as usize] += 1.0;
        }
        let inv_sqrt: Vec<f32> = degree
            .iter()
            .map(|&d| if d > 0.0 { d.powf(-0.5) } else { 0.0 })
            .collect();
        self.src
            .iter()
            .zip(self.dst)
            .map(|(&s, &d)| inv_sqrt[s as usize] * inv_sqrt[d as usize])
            .collect()
    }

    /// Index tensors `(src, dst, types)` on the device.
    pub fn tensors(&self, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
        Ok((
            u32_tensor(self.src, device)?,
            u32_tensor(self.dst, device)?,
            u32_tensor(self.types, device)?,
        ))
    }

    /// Qualifier tensors `(relation, entity, edge)` on the device.
    pub fn qualifier_tensors(&self, device: &Device) -> Result<(Tensor, Tensor, Tensor)> {
        let relation: Vec<u32> = self.quals.iter().map(|q| q.relation).collect();
        let entity: Vec<u32> = self.quals.iter().map(|q| q.entity).collect();
        let edge: Vec<u32> = self.quals.iter().map(|q| q.edge).collect();
        Ok((
            u32_tensor(&relation, device)?,
            u32_tensor(&entity, device)?,
            u32_tensor(&edge, device)?,
        ))
    }
}

pub(crate) fn u32_tensor(values: &[u32], device: &Device) -> Result<Tensor> {
    Ok(Tensor::from_slice(values, (values.len(),), device)?)
}
