//! Device-side index tensors of an encoded batch, built once per forward pass.

use candle_core::{Device, Tensor};

use crate::error::Result;
use crate::graph::{EdgeBlock, EncodedBatch};

/// Qualifier index tensors of one block.
#[derive(Debug, Clone)]
pub struct QualifierTensors {
    pub relation: Tensor,
    pub entity: Tensor,
    /// Edge position inside the block
    pub edge: Tensor,
}

/// Index tensors of one edge direction.
#[derive(Debug, Clone)]
pub struct BlockTensors {
    pub num_edges: usize,
    pub src: Tensor,
    pub dst: Tensor,
    pub types: Tensor,
    /// `[num_edges, 1]` symmetric degree normalisation
    pub norm: Tensor,
    pub quals: Option<QualifierTensors>,
}

impl BlockTensors {
    fn new(block: &EdgeBlock<'_>, num_entities: usize, device: &Device) -> Result<Self> {
        let (src, dst, types) = block.tensors(device)?;
        let norm = Tensor::from_vec(block.degree_norm(num_entities), (block.len(), 1), device)?;
        let quals = if block.quals.is_empty() {
            None
        } else {
            let (relation, entity, edge) = block.qualifier_tensors(device)?;
            Some(QualifierTensors { relation, entity, edge })
        };
        Ok(Self {
            num_edges: block.len(),
            src,
            dst,
            types,
            norm,
            quals,
        })
    }
}

/// Everything the message-passing stack reads from a batch.
#[derive(Debug, Clone)]
pub struct GraphTensors {
    pub num_entities: usize,
    pub forward: BlockTensors,
    pub inverse: BlockTensors,
}

impl GraphTensors {
    pub fn new(batch: &EncodedBatch, num_entities: usize, device: &Device) -> Result<Self> {
        Ok(Self {
            num_entities,
            forward: BlockTensors::new(&batch.forward_block(), num_entities, device)?,
            inverse: BlockTensors::new(&batch.inverse_block(), num_entities, device)?,
        })
    }

    /// Forward block, then inverse block.
    pub fn blocks(&self) -> [&BlockTensors; 2] {
        [&self.forward, &self.inverse]
    }

    pub fn num_edges(&self) -> usize {
        self.forward.num_edges + self.inverse.num_edges
    }
}
